//! A collection of utilities.

mod power_of_2;

pub use power_of_2::PowerOf2;

/// Returns whether the offset is a multiple of the given alignment.
pub(crate) fn is_aligned(offset: usize, alignment: PowerOf2) -> bool { offset % alignment == 0 }

/// Returns `n`, rounded up to an even number.
pub(crate) fn round_up_to_even(n: usize) -> usize { n + n % 2 }

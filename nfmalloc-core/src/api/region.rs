//! Region
//!
//! The Region trait is used to request memory from the underlying provider. By abstracting the provider, it becomes
//! possible to back a heap by an `sbrk`-like mapping, a plain vector, or a fixed buffer on a bare-metal target.

use alloc::vec::Vec;

/// Abstraction of a contiguous, grow-only, range of memory.
///
/// Offsets are relative to the start of the memory exposed by `memory`.
pub trait Region {
    /// Returns the offset of the first byte granted.
    fn lo(&self) -> usize;

    /// Returns the offset one past the last byte granted.
    ///
    /// Always equal to `self.memory().len()`.
    fn hi(&self) -> usize;

    /// Grows the region by `bytes` bytes, appended at its high end.
    ///
    /// Returns the offset of the first new byte, which is the previous value of `hi`, or None if the request cannot
    /// be satisfied, in which case the region is left unmodified.
    fn grow(&mut self, bytes: usize) -> Option<usize>;

    /// Returns the memory granted so far.
    fn memory(&self) -> &[u8];

    /// Returns the memory granted so far.
    fn memory_mut(&mut self) -> &mut [u8];
}

/// A Region backed by a `Vec<u8>`, optionally capped.
#[derive(Debug, Default, Clone)]
pub struct VecRegion {
    bytes: Vec<u8>,
    limit: Option<usize>,
}

impl VecRegion {
    /// Creates an empty, unbounded, instance.
    pub fn new() -> Self { Self::default() }

    /// Creates an empty instance which refuses to grow past `limit` bytes.
    pub fn with_limit(limit: usize) -> Self { Self { bytes: Vec::new(), limit: Some(limit) } }

    /// Returns the maximum number of bytes this instance may grow to, if capped.
    pub fn limit(&self) -> Option<usize> { self.limit }
}

impl Region for VecRegion {
    fn lo(&self) -> usize { 0 }

    fn hi(&self) -> usize { self.bytes.len() }

    fn grow(&mut self, bytes: usize) -> Option<usize> {
        let start = self.bytes.len();
        let end = start.checked_add(bytes)?;

        if self.limit.map_or(false, |limit| end > limit) {
            return None;
        }

        self.bytes.try_reserve(bytes).ok()?;
        self.bytes.resize(end, 0);

        Some(start)
    }

    fn memory(&self) -> &[u8] { &self.bytes }

    fn memory_mut(&mut self) -> &mut [u8] { &mut self.bytes }
}

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn vec_region_grow() {
    let mut region = VecRegion::new();

    assert_eq!(0, region.lo());
    assert_eq!(0, region.hi());

    assert_eq!(Some(0), region.grow(16));
    assert_eq!(Some(16), region.grow(4096));
    assert_eq!(4112, region.hi());
    assert_eq!(4112, region.memory().len());
}

#[test]
fn vec_region_limit() {
    let mut region = VecRegion::with_limit(64);

    assert_eq!(Some(64), region.limit());
    assert_eq!(Some(0), region.grow(48));
    assert_eq!(None, region.grow(24));
    assert_eq!(48, region.hi());

    assert_eq!(Some(48), region.grow(16));
    assert_eq!(None, region.grow(1));
}

#[test]
fn vec_region_overflow() {
    let mut region = VecRegion::new();

    assert_eq!(Some(0), region.grow(8));
    assert_eq!(None, region.grow(usize::MAX));
    assert_eq!(8, region.hi());
}

}

#![cfg_attr(not(test), no_std)]

#![deny(missing_docs)]

//! Building blocks for a next-fit, boundary-tag allocator.
//!
//! nfmalloc-core carves a single, grow-only region of memory into blocks, each framed by a header and a footer tag.
//! It contains:
//! -   A region trait, used to obtain more raw memory from the underlying provider.
//! -   A configuration trait, used to tune how much memory is requested at a time.
//! -   A `Heap`, single-threaded, combining both into malloc-like allocate, release and reallocate operations.

extern crate alloc;

mod api;
mod internals;
mod utils;

pub use api::*;

#![no_std]
#![deny(missing_docs)]

//! A Next-Fit Memory Allocator library.
//!
//! The type `NfAllocator` provides a simple, single-threaded, memory allocator over an `mmap`ed reservation, handing
//! out raw pointers.
//!
//! #   Warning
//!
//! This allocator is a teaching-grade design: free blocks are found by walking all blocks, hence allocation latency
//! grows with the number of blocks.

mod allocator;
mod platform;

pub use allocator::{NfAllocator, Reallocated};
pub use platform::{MmapRegion, NfConfiguration};

pub use nfmalloc_core::{OutOfMemory, Statistics, MAXIMUM_HEAP_SIZE};

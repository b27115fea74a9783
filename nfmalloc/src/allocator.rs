//! Allocator

use core::ptr::NonNull;

use nfmalloc_core::{BlockRef, Heap, OutOfMemory, ReallocOutcome, Statistics, MAXIMUM_HEAP_SIZE};

use crate::{MmapRegion, NfConfiguration};

/// Next-Fit Allocator.
///
/// Hands out pointers into a single mapping, reserved upfront, and never returned to the OS until dropped.
///
/// #   Warning
///
/// The allocator is single-threaded: all operations, including `deallocate`, require `&mut self`.
pub struct NfAllocator(Heap<NfConfiguration, MmapRegion>);

impl NfAllocator {
    /// The number of bytes of address space reserved by `new`, 64 MB.
    pub const DEFAULT_CAPACITY: usize = 64 * 1024 * 1024;

    /// Creates an instance, reserving `DEFAULT_CAPACITY` bytes of address space.
    pub fn new() -> Result<Self, OutOfMemory> { Self::with_capacity(Self::DEFAULT_CAPACITY) }

    /// Creates an instance, reserving `capacity` bytes of address space.
    ///
    /// Returns an error if the address space cannot be reserved, is too small to hold the first chunk, or exceeds
    /// `MAXIMUM_HEAP_SIZE`.
    pub fn with_capacity(capacity: usize) -> Result<Self, OutOfMemory> {
        if capacity > MAXIMUM_HEAP_SIZE {
            return Err(OutOfMemory);
        }

        let region = MmapRegion::new(capacity).ok_or(OutOfMemory)?;

        Heap::with_region(region).map(Self)
    }

    /// Allocates at least `size` bytes of memory, aligned on at least an 8 bytes boundary.
    ///
    /// Returns None if `size` is 0, or if the reservation is exhausted.
    pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        self.0.allocate(size).map(|block| self.to_pointer(block))
    }

    /// Deallocates the memory located at `pointer`.
    ///
    /// #   Safety
    ///
    /// -   Assumes `pointer` has been returned by a prior call to `allocate` or `reallocate` on this instance.
    /// -   Assumes `pointer` has not been deallocated since its allocation.
    /// -   Assumes the memory pointed by `pointer` is no longer in use.
    pub unsafe fn deallocate(&mut self, pointer: NonNull<u8>) {
        let block = self.to_block(pointer);
        self.0.release(block);
    }

    /// Reallocates the memory located at `pointer` to hold at least `size` bytes, preserving its content up to the
    /// smaller of the two sizes.
    ///
    /// -   If `pointer` is None, behaves as `allocate`.
    /// -   If `size` is 0, deallocates `pointer`, and returns `Unusable`.
    /// -   On `Failed`, `pointer` is still allocated, and its content untouched.
    ///
    /// #   Safety
    ///
    /// -   Assumes `pointer` has been returned by a prior call to `allocate` or `reallocate` on this instance.
    /// -   Assumes `pointer` has not been deallocated since its allocation.
    /// -   Assumes the memory pointed by `pointer` is no longer in use, unless `Failed` is returned.
    pub unsafe fn reallocate(&mut self, pointer: Option<NonNull<u8>>, size: usize) -> Reallocated {
        let block = pointer.map(|pointer| self.to_block(pointer));

        match self.0.reallocate(block, size) {
            ReallocOutcome::NewRef(block) => Reallocated::Pointer(self.to_pointer(block)),
            ReallocOutcome::Unusable => Reallocated::Unusable,
            ReallocOutcome::Failed => Reallocated::Failed,
        }
    }

    /// Checks the consistency of the heap, returning false if corrupted.
    pub fn check(&self) -> bool { self.0.check() }

    /// Returns a summary of the blocks.
    pub fn statistics(&self) -> Statistics { self.0.statistics() }

    /// Returns the number of bytes of address space reserved.
    pub fn capacity(&self) -> usize { self.0.region().capacity() }

    //  Converts the reference into a pointer.
    fn to_pointer(&self, block: BlockRef) -> NonNull<u8> {
        let base = self.0.region().base();

        debug_assert!(block.offset() < self.0.region().capacity(), "Block {} outside region", block.offset());

        //  Safety:
        //  -   `block` lies within the region, hence the pointer is within the mapping, and not null.
        unsafe { NonNull::new_unchecked(base.as_ptr().add(block.offset())) }
    }

    //  Converts the pointer into a reference.
    //
    //  #   Safety
    //
    //  -   Assumes `pointer` was returned by `to_pointer`.
    unsafe fn to_block(&self, pointer: NonNull<u8>) -> BlockRef {
        let base = self.0.region().base().as_ptr() as usize;
        let address = pointer.as_ptr() as usize;

        debug_assert!(address > base && address - base < self.capacity(),
            "Foreign pointer {:x}, region at {:x}", address, base);

        //  Safety:
        //  -   A block lies strictly after the start of its region.
        BlockRef::new_unchecked(address - base)
    }
}

/// The outcome of `NfAllocator::reallocate`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Reallocated {
    /// The memory now lives at this pointer; possibly the original one.
    Pointer(NonNull<u8>),
    /// The memory was deallocated, following a request for 0 bytes.
    Unusable,
    /// The request could not be satisfied; the original memory is untouched, and still allocated.
    Failed,
}

impl Reallocated {
    /// Returns the new pointer, if any.
    pub fn pointer(&self) -> Option<NonNull<u8>> {
        match self {
            Reallocated::Pointer(pointer) => Some(*pointer),
            _ => None,
        }
    }
}

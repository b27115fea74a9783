#![no_std]
#![deny(missing_docs)]

//! Exposition of NfAllocator API via a C ABI.
//!
//! #   Warning
//!
//! A single, process-wide, allocator backs all functions; it is not synchronized. Calling any of these functions
//! concurrently from multiple threads is undefined behavior.

use core::{cell::UnsafeCell, ptr::{self, NonNull}};

use nfmalloc::{NfAllocator, Reallocated};

/// The pointer returned by `mm_realloc` when the memory was released, following a request for 0 bytes.
pub const MM_UNUSABLE: *mut u8 = usize::MAX as *mut u8;

/// Initializes the allocator, discarding any prior instance, and all pointers it handed out.
///
/// Returns 0 on success, and -1 otherwise.
///
/// #   Safety
///
/// -   Assumes no other thread is calling any `mm_` function.
/// -   Assumes no pointer handed out by a prior instance is used afterwards.
#[cold]
#[no_mangle]
pub unsafe extern fn mm_init() -> i32 {
    let allocator = ALLOCATOR.get();

    //  Release the prior reservation first, if any.
    *allocator = None;
    *allocator = NfAllocator::new().ok();

    if allocator.is_some() { 0 } else { -1 }
}

/// Allocates at least `size` bytes of memory, aligned on 8 bytes.
///
/// Returns NULL if `size` is 0, if the allocator is not initialized, or if the allocation fails.
///
/// #   Safety
///
/// -   Assumes no other thread is calling any `mm_` function.
#[no_mangle]
pub unsafe extern fn mm_malloc(size: usize) -> *mut u8 {
    ALLOCATOR.get()
        .as_mut()
        .and_then(|allocator| allocator.allocate(size))
        .map_or(ptr::null_mut(), NonNull::as_ptr)
}

/// Deallocates the memory located at `pointer`.
///
/// Does nothing if `pointer` is NULL.
///
/// #   Safety
///
/// -   Assumes no other thread is calling any `mm_` function.
/// -   Assumes `pointer` has been returned by a prior call to `mm_malloc` or `mm_realloc`.
/// -   Assumes `pointer` has not been deallocated since its allocation.
/// -   Assumes the memory pointed by `pointer` is no longer in use.
#[no_mangle]
pub unsafe extern fn mm_free(pointer: *mut u8) {
    if let (Some(allocator), Some(pointer)) = (ALLOCATOR.get().as_mut(), NonNull::new(pointer)) {
        allocator.deallocate(pointer);
    }
}

/// Reallocates the memory located at `pointer` to hold at least `size` bytes, preserving its content.
///
/// -   If `pointer` is NULL, behaves as `mm_malloc`.
/// -   If `size` is 0, deallocates `pointer`, and returns `MM_UNUSABLE`.
/// -   On failure, returns NULL; the memory located at `pointer` is untouched, and still allocated.
///
/// #   Safety
///
/// -   Assumes no other thread is calling any `mm_` function.
/// -   Assumes `pointer` is NULL, or has been returned by a prior call to `mm_malloc` or `mm_realloc`.
/// -   Assumes `pointer` has not been deallocated since its allocation.
#[no_mangle]
pub unsafe extern fn mm_realloc(pointer: *mut u8, size: usize) -> *mut u8 {
    let allocator = match ALLOCATOR.get().as_mut() {
        Some(allocator) => allocator,
        None => return ptr::null_mut(),
    };

    match allocator.reallocate(NonNull::new(pointer), size) {
        Reallocated::Pointer(pointer) => pointer.as_ptr(),
        Reallocated::Unusable => MM_UNUSABLE,
        Reallocated::Failed => ptr::null_mut(),
    }
}

/// Checks the consistency of the heap.
///
/// Returns 0 if consistent, and 1 if corrupted or not initialized.
///
/// #   Safety
///
/// -   Assumes no other thread is calling any `mm_` function.
#[cold]
#[no_mangle]
pub unsafe extern fn mm_check() -> i32 {
    match ALLOCATOR.get().as_ref() {
        Some(allocator) if allocator.check() => 0,
        _ => 1,
    }
}

//
//  Implementation
//

struct Global(UnsafeCell<Option<NfAllocator>>);

impl Global {
    //  #   Safety
    //
    //  -   Assumes no other reference to the instance is live.
    #[allow(clippy::mut_from_ref)]
    unsafe fn get(&self) -> &mut Option<NfAllocator> { &mut *self.0.get() }
}

//  Safety:
//  -   Access is restricted to a single thread, as documented on every entry point.
unsafe impl Sync for Global {}

static ALLOCATOR: Global = Global(UnsafeCell::new(None));

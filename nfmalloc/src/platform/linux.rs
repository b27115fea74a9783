//! Implementation of Linux specific calls.

use core::{ptr, slice};

use nfmalloc_core::{Configuration, Region};

/// Implementation of the Configuration trait, for Linux.
#[derive(Debug, Default, Clone, Copy)]
pub struct NfConfiguration;

impl Configuration for NfConfiguration {
    //  4 KB, a page.
    const CHUNK_SIZE: usize = 4 * 1024;
}

/// Implementation of the Region trait, for Linux.
///
/// The full capacity is reserved upfront, as a single anonymous mapping, without committing any memory; it is then
/// handed out piecemeal, from its low end, as a program break would be.
#[derive(Debug)]
pub struct MmapRegion {
    base: ptr::NonNull<u8>,
    capacity: usize,
    brk: usize,
}

impl MmapRegion {
    /// Reserves `capacity` bytes of address space.
    ///
    /// Returns None if `capacity` is 0, or if the reservation failed.
    pub fn new(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }

        let base = mmap_reserve(capacity)?;

        tracing::debug!(base = ?base.as_ptr(), capacity, "reserved region");

        Some(Self { base, capacity, brk: 0 })
    }

    /// Returns the address of the first byte of the region.
    ///
    /// All offsets handled by the region are relative to this address.
    pub fn base(&self) -> ptr::NonNull<u8> { self.base }

    /// Returns the number of bytes reserved.
    pub fn capacity(&self) -> usize { self.capacity }
}

impl Region for MmapRegion {
    fn lo(&self) -> usize { 0 }

    fn hi(&self) -> usize { self.brk }

    fn grow(&mut self, bytes: usize) -> Option<usize> {
        let previous = self.brk;
        let brk = previous.checked_add(bytes).filter(|brk| *brk <= self.capacity)?;

        self.brk = brk;

        Some(previous)
    }

    fn memory(&self) -> &[u8] {
        //  Safety:
        //  -   `[base, base + brk)` lies within the mapping, which is readable and zero-initialized.
        //  -   The mapping lives as long as `self`.
        unsafe { slice::from_raw_parts(self.base.as_ptr(), self.brk) }
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        //  Safety:
        //  -   `[base, base + brk)` lies within the mapping, which is writable and zero-initialized.
        //  -   The mapping lives as long as `self`, which is borrowed mutably.
        unsafe { slice::from_raw_parts_mut(self.base.as_ptr(), self.brk) }
    }
}

impl Drop for MmapRegion {
    fn drop(&mut self) {
        //  Safety:
        //  -   `base` points to a `mmap`ed area of `capacity` bytes.
        //  -   The area is no longer in use, as `self` is borrowed mutably and no slice outlives it.
        unsafe { munmap_deallocate(self.base.as_ptr(), self.capacity) };
    }
}

//  Safety:
//  -   The mapping is exclusively owned by the instance.
unsafe impl Send for MmapRegion {}

//  Wrapper around `mmap`.
//
//  Returns a pointer to `size` bytes of address space, readable and writable, without committing memory.
fn mmap_reserve(size: usize) -> Option<ptr::NonNull<u8>> {
    let length = size;
    let prot = libc::PROT_READ | libc::PROT_WRITE;
    let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE;

    //  No specific address hint.
    let addr = ptr::null_mut();
    //  When used in conjunction with MAP_ANONYMOUS, fd is mandated to be -1 on some implementations.
    let fd = -1;
    //  When used in conjunction with MAP_ANONYMOUS, offset is mandated to be 0 on some implementations.
    let offset = 0;

    //  Safety:
    //  -   `addr`, `fd`, and `offset` are suitable for MAP_ANONYMOUS.
    let result = unsafe { libc::mmap(addr, length, prot, flags, fd, offset) };

    let result = if result != libc::MAP_FAILED { result as *mut u8 } else { ptr::null_mut() };
    ptr::NonNull::new(result)
}

//  Wrapper around `munmap`.
//
//  #   Panics
//
//  If `munmap` returns a non-0 result.
//
//  #   Safety
//
//  -   Assumes that `addr` points to a `mmap`ed area of at least `size` bytes.
//  -   Assumes that the range `[addr, addr + size)` is no longer in use.
unsafe fn munmap_deallocate(addr: *mut u8, size: usize) {
    let result = libc::munmap(addr as *mut libc::c_void, size);
    assert!(result == 0, "Could not munmap {:x}, {}: {}", addr as usize, size, result);
}

#[cfg(test)]
mod tests {

use super::*;

#[test]
fn mmap_region_empty() {
    assert!(MmapRegion::new(0).is_none());
}

#[test]
fn mmap_region_grow() {
    let mut region = MmapRegion::new(64 * 1024).expect("Reserved");

    assert_eq!(0, region.hi());
    assert!(region.memory().is_empty());

    assert_eq!(Some(0), region.grow(16));
    assert_eq!(Some(16), region.grow(4096));
    assert_eq!(16 + 4096, region.hi());

    assert!(region.memory().iter().all(|byte| *byte == 0));

    region.memory_mut()[42] = 42;

    assert_eq!(42, region.memory()[42]);
}

#[test]
fn mmap_region_exhausted() {
    let mut region = MmapRegion::new(4096).expect("Reserved");

    assert_eq!(Some(0), region.grow(4000));
    assert_eq!(None, region.grow(100));
    assert_eq!(None, region.grow(usize::MAX));
    assert_eq!(Some(4000), region.grow(96));
    assert_eq!(4096, region.hi());
}

}

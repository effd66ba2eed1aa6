//! Mapped or allocated capture buffer slots.

use std::ffi::c_void;
use std::os::fd::BorrowedFd;
use std::ptr::NonNull;

use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use nix::unistd::SysconfVar;

use crate::error::{Result, V4l2Error};
use crate::types::Memory;

/// One ring-buffer slot, either `mmap`-ed kernel memory or a heap
/// allocation whose pointer is handed to the driver for user-pointer I/O.
///
/// Memory is released automatically when the slot is dropped: `Mmap`
/// slots are `munmap`-ed, `UserPtr` slots are freed.
pub struct BufferSlot {
    pub index: u32,
    pub length: usize,
    pub offset: u32,
    memory: Memory,
    start: NonNull<c_void>,
}

// SAFETY: `start` points at either mmap'd device memory or a heap
// allocation this slot uniquely owns; nothing else aliases it while the
// slot is alive, and the underlying video device itself is `Send`.
unsafe impl Send for BufferSlot {}

// SAFETY: all methods taking `&self` only read through `start`; the
// kernel (for `Mmap`) or this process (for `UserPtr`) only ever writes
// into the slot between a `queue_buffer`/`dequeue_buffer` pair that the
// capture loop serializes itself, so concurrent shared access is safe.
unsafe impl Sync for BufferSlot {}

impl BufferSlot {
    pub(crate) fn map(
        device_fd: i32,
        index: u32,
        length: usize,
        offset: u32,
    ) -> Result<Self> {
        // SAFETY: `device_fd` is a valid, open V4L2 device fd for the
        // duration of this call; `offset`/`length` come directly from a
        // successful `VIDIOC_QUERYBUF` for this index.
        let start = unsafe {
            let borrowed_fd = BorrowedFd::borrow_raw(device_fd);
            mmap(
                None,
                std::num::NonZeroUsize::new(length).ok_or_else(|| V4l2Error::memory("zero length buffer"))?,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                Some(borrowed_fd),
                offset as i64,
            )
        }
        .map_err(|e| V4l2Error::memory(format!("mmap() failed: {e}")))?;

        Ok(Self {
            index,
            length,
            offset,
            memory: Memory::Mmap,
            start,
        })
    }

    pub(crate) fn alloc(index: u32, length: usize) -> Result<Self> {
        let page_size = nix::unistd::sysconf(SysconfVar::PAGE_SIZE)
            .ok()
            .flatten()
            .unwrap_or(4096) as usize;

        let layout = std::alloc::Layout::from_size_align(length.max(1), page_size)
            .map_err(|e| V4l2Error::memory(e.to_string()))?;

        // SAFETY: `layout` has non-zero size (`length.max(1)`); the
        // returned pointer is checked for null immediately below.
        let raw = unsafe { std::alloc::alloc_zeroed(layout) };
        let start = NonNull::new(raw.cast::<c_void>())
            .ok_or_else(|| V4l2Error::memory("allocation failed"))?;

        Ok(Self {
            index,
            length,
            offset: 0,
            memory: Memory::UserPtr,
            start,
        })
    }

    /// Raw pointer to the start of this slot's memory, valid for `length`
    /// bytes. Only used internally to build `v4l2_buffer.m.userptr` and to
    /// hand a read-only slice to callers.
    pub(crate) fn as_ptr(&self) -> *const c_void {
        self.start.as_ptr()
    }

    /// Returns the captured bytes as a slice.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `start` is valid for `length` bytes for the lifetime of
        // `self`, and no other code mutates this slot's memory while a
        // shared borrow of `self` is outstanding (the device only writes
        // to a slot between `queue_buffer` and the matching
        // `dequeue_buffer`, both of which take `&self`/`&mut self`
        // exclusively through `Device`).
        unsafe { std::slice::from_raw_parts(self.start.as_ptr().cast::<u8>(), self.length) }
    }
}

impl Drop for BufferSlot {
    fn drop(&mut self) {
        match self.memory {
            Memory::Mmap => {
                // SAFETY: `start`/`length` are exactly the region this
                // slot mapped in `map`, and nothing else holds a
                // reference to it once `self` is being dropped.
                let _ = unsafe { munmap(self.start, self.length) };
            }
            Memory::UserPtr => {
                let page_size = nix::unistd::sysconf(SysconfVar::PAGE_SIZE)
                    .ok()
                    .flatten()
                    .unwrap_or(4096) as usize;
                if let Ok(layout) = std::alloc::Layout::from_size_align(self.length.max(1), page_size)
                {
                    // SAFETY: `start` was allocated by `alloc_zeroed` with
                    // this exact layout in `alloc`, and is not used again
                    // after this point.
                    unsafe {
                        std::alloc::dealloc(self.start.as_ptr().cast::<u8>(), layout);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_userptr_slot() {
        let slot = BufferSlot::alloc(0, 4096).unwrap();
        assert_eq!(slot.length, 4096);
        assert_eq!(slot.as_slice().len(), 4096);
        assert!(slot.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_alloc_slot_pointer_nonnull() {
        let slot = BufferSlot::alloc(3, 128).unwrap();
        assert!(!slot.as_ptr().is_null());
    }
}

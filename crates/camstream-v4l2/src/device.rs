//! The V4L2 device wrapper itself.

use std::fs::{File, OpenOptions};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::unistd::pipe;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::buffer::BufferSlot;
use crate::error::{Result, V4l2Error};
use crate::sys;
use crate::types::{
    AwaitOutcome, Capabilities, ConfigureParams, DeviceCapabilities, Format, Memory, SelectionRect,
};

/// The spec's await-data ceiling: a single `await_data` call never blocks
/// longer than this before returning `Timeout`, regardless of what the
/// caller asks for.
pub const MAX_AWAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// A thin wrapper over one V4L2 capture device.
///
/// Owns the device file descriptor, a self-pipe used to cancel a blocked
/// [`Device::await_data`] from another thread, and the buffer pool
/// allocated by [`Device::request_buffers`].
pub struct Device {
    path: String,
    file: File,
    cancel_read: OwnedFd,
    cancel_write: OwnedFd,
    format: Mutex<sys::v4l2_format>,
    memory: Mutex<Memory>,
    buffers: Mutex<Vec<BufferSlot>>,
    max_buffer_size: AtomicUsize,
}

impl Device {
    /// Opens `path` and verifies it reports at least `required`
    /// capabilities via `VIDIOC_QUERYCAP`.
    pub fn open(path: impl AsRef<Path>, required: Capabilities) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(V4l2Error::unknown_device(path.display().to_string()));
        }

        let (cancel_read, cancel_write) =
            pipe().map_err(|e| V4l2Error::Io(std::io::Error::from(e)))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(V4l2Error::Io)?;

        let fd = file.as_raw_fd();
        let mut caps = sys::v4l2_capability::default();
        // SAFETY: `fd` is a just-opened, valid V4L2 device fd; `caps` is
        // large enough for the ioctl's output.
        checked_ioctl(|| unsafe { sys::vidioc_querycap(fd, &mut caps) })?;

        let reported = Capabilities(caps.capabilities);
        if !reported.contains(required) {
            return Err(V4l2Error::BadCaps);
        }

        debug!(path = %path.display(), driver = %String::from_utf8_lossy(&caps.driver), "opened V4L2 device");

        Ok(Self {
            path: path.display().to_string(),
            file,
            cancel_read,
            cancel_write,
            format: Mutex::new(sys::v4l2_format::default()),
            memory: Mutex::new(Memory::Mmap),
            buffers: Mutex::new(Vec::new()),
            max_buffer_size: AtomicUsize::new(0),
        })
    }

    /// Reports the capabilities and identity of this device.
    pub fn capabilities(&self) -> Result<DeviceCapabilities> {
        let fd = self.file.as_raw_fd();
        let mut caps = sys::v4l2_capability::default();
        // SAFETY: `fd` is this device's own open fd.
        checked_ioctl(|| unsafe { sys::vidioc_querycap(fd, &mut caps) })?;
        Ok(DeviceCapabilities::from_raw(&caps))
    }

    /// Negotiates pixel format and frame rate with the driver, returning
    /// what it actually applied.
    pub fn configure(&self, params: &ConfigureParams) -> Result<Format> {
        let fd = self.file.as_raw_fd();

        let mut fmt = sys::v4l2_format {
            type_: sys::V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..Default::default()
        };
        // SAFETY: `fd` is open; `fmt` is a valid, correctly-typed buffer.
        checked_ioctl(|| unsafe { sys::vidioc_g_fmt(fd, &mut fmt) })?;

        let mut pix = fmt.pix();
        pix.width = params.width as u32;
        pix.height = params.height as u32;
        pix.pixelformat = params.pixelformat;
        pix.colorspace = params.colorspace;
        fmt.set_pix(pix);

        // SAFETY: same as above.
        checked_ioctl(|| unsafe { sys::vidioc_s_fmt(fd, &mut fmt) })?;
        *self.format.lock() = fmt;

        let mut streamparm = sys::v4l2_streamparm {
            type_: sys::V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..Default::default()
        };
        // SAFETY: same as above.
        checked_ioctl(|| unsafe { sys::vidioc_g_parm(fd, &mut streamparm) })?;

        if streamparm.parm.capability & sys::V4L2_CAP_TIMEPERFRAME != 0 {
            streamparm.parm.timeperframe.numerator = 1;
            streamparm.parm.timeperframe.denominator = params.desired_fps;
            // SAFETY: same as above.
            checked_ioctl(|| unsafe { sys::vidioc_s_parm(fd, &mut streamparm) })?;
        } else {
            warn!(path = %self.path, "driver does not support frame rate negotiation");
        }

        Ok(Format::from_raw(&self.format.lock().pix()))
    }

    /// Clamps `rect` against the device's default crop rectangle and
    /// applies it as the active cropping area.
    pub fn set_cropping_area(&self, rect: SelectionRect) -> Result<SelectionRect> {
        self.set_selection(rect, sys::V4L2_SEL_TGT_CROP_DEFAULT, sys::V4L2_SEL_TGT_CROP_ACTIVE, 0)
    }

    /// Clamps `rect` against the device's default compose rectangle and
    /// applies it as the active composing area, using `V4L2_SEL_FLAG_LE`
    /// so the driver never grows the rectangle beyond what was requested.
    pub fn set_composing_area(&self, rect: SelectionRect) -> Result<SelectionRect> {
        self.set_selection(
            rect,
            sys::V4L2_SEL_TGT_COMPOSE_DEFAULT,
            sys::V4L2_SEL_TGT_COMPOSE_ACTIVE,
            sys::V4L2_SEL_FLAG_LE,
        )
    }

    fn set_selection(
        &self,
        requested: SelectionRect,
        default_target: u32,
        active_target: u32,
        active_flags: u32,
    ) -> Result<SelectionRect> {
        let fd = self.file.as_raw_fd();

        let mut sel = sys::v4l2_selection {
            type_: sys::V4L2_BUF_TYPE_VIDEO_CAPTURE,
            target: default_target,
            ..Default::default()
        };
        // SAFETY: `fd` is open; `sel` is correctly typed.
        checked_ioctl(|| unsafe { sys::vidioc_g_selection(fd, &mut sel) })
            .map_err(|_| V4l2Error::params("selection API unsupported by driver"))?;

        let bounds = SelectionRect::from_raw(sel.r);
        let clamped = requested.clamp_to(bounds);

        trace!(?requested, ?bounds, ?clamped, "clamped selection rectangle");

        sel.r = clamped.to_raw();
        sel.target = active_target;
        sel.flags = active_flags;

        // SAFETY: same as above.
        checked_ioctl(|| unsafe { sys::vidioc_s_selection(fd, &mut sel) })?;

        Ok(SelectionRect::from_raw(sel.r))
    }

    /// Requests `count` buffers of the given memory strategy, maps or
    /// allocates each one, and records the largest buffer length seen.
    pub fn request_buffers(&self, count: u32, memory: Memory) -> Result<()> {
        let fd = self.file.as_raw_fd();
        *self.memory.lock() = memory;
        self.max_buffer_size.store(0, Ordering::SeqCst);

        let mut req = sys::v4l2_requestbuffers {
            count,
            type_: sys::V4L2_BUF_TYPE_VIDEO_CAPTURE,
            memory: memory.as_raw(),
            ..Default::default()
        };
        // SAFETY: `fd` is open; `req` is correctly typed.
        checked_ioctl(|| unsafe { sys::vidioc_reqbufs(fd, &mut req) })?;

        if req.count < count {
            return Err(V4l2Error::memory(format!(
                "kernel granted {} of {count} requested buffers",
                req.count
            )));
        }

        let mut buffers = Vec::with_capacity(req.count as usize);
        for index in 0..req.count {
            let mut buf = sys::v4l2_buffer {
                type_: sys::V4L2_BUF_TYPE_VIDEO_CAPTURE,
                memory: memory.as_raw(),
                index,
                ..Default::default()
            };
            // SAFETY: same as above.
            checked_ioctl(|| unsafe { sys::vidioc_querybuf(fd, &mut buf) })?;

            let slot = match memory {
                Memory::Mmap => BufferSlot::map(fd, index, buf.length as usize, buf.offset())?,
                Memory::UserPtr => BufferSlot::alloc(index, buf.length as usize)?,
            };

            self.max_buffer_size.fetch_max(slot.length, Ordering::SeqCst);
            buffers.push(slot);
        }

        *self.buffers.lock() = buffers;
        Ok(())
    }

    /// Unmaps/frees every buffer slot and releases the kernel's queue.
    pub fn release_buffers(&self) -> Result<()> {
        self.buffers.lock().clear();

        let fd = self.file.as_raw_fd();
        let mut req = sys::v4l2_requestbuffers {
            count: 0,
            type_: sys::V4L2_BUF_TYPE_VIDEO_CAPTURE,
            memory: self.memory.lock().as_raw(),
            ..Default::default()
        };
        // SAFETY: `fd` is open; `req` is correctly typed.
        checked_ioctl(|| unsafe { sys::vidioc_reqbufs(fd, &mut req) })
    }

    /// The largest buffer length seen across the current allocation.
    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size.load(Ordering::SeqCst)
    }

    /// `VIDIOC_STREAMON`.
    pub fn start_capture(&self) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let buf_type = sys::V4L2_BUF_TYPE_VIDEO_CAPTURE as i32;
        // SAFETY: `fd` is open; `buf_type` is a plain i32 the ioctl reads.
        checked_ioctl(|| unsafe { sys::vidioc_streamon(fd, &buf_type) })
    }

    /// `VIDIOC_STREAMOFF`.
    pub fn stop_capture(&self) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let buf_type = sys::V4L2_BUF_TYPE_VIDEO_CAPTURE as i32;
        // SAFETY: same as above.
        checked_ioctl(|| unsafe { sys::vidioc_streamoff(fd, &buf_type) })
    }

    /// Blocks until the device fd is readable, `timeout` elapses (capped
    /// at [`MAX_AWAIT_TIMEOUT`]), or [`Device::stop_awaiting_data`] fires
    /// from another thread.
    pub fn await_data(&self, timeout: Option<Duration>) -> Result<AwaitOutcome> {
        let timeout = timeout.unwrap_or(MAX_AWAIT_TIMEOUT).min(MAX_AWAIT_TIMEOUT);
        let poll_timeout =
            PollTimeout::try_from(timeout.as_millis() as u32).unwrap_or(PollTimeout::MAX);

        let cancel_fd = self.cancel_read.as_raw_fd();

        loop {
            let mut fds = [
                PollFd::new(self.file.as_fd(), PollFlags::POLLIN),
                PollFd::new(self.cancel_read.as_fd(), PollFlags::POLLIN),
            ];

            match poll(&mut fds, poll_timeout) {
                Ok(0) => return Ok(AwaitOutcome::Timeout),
                Ok(_) => {
                    if fds[1]
                        .revents()
                        .is_some_and(|r| r.contains(PollFlags::POLLIN))
                    {
                        let mut discard = [0u8; 16];
                        // SAFETY: draining the self-pipe only requires a
                        // valid owned fd and a stack buffer, both present.
                        let _ = unsafe {
                            libc::read(cancel_fd, discard.as_mut_ptr().cast(), discard.len())
                        };
                        return Ok(AwaitOutcome::Interrupted);
                    }
                    if fds[0]
                        .revents()
                        .is_some_and(|r| r.contains(PollFlags::POLLIN))
                    {
                        return Ok(AwaitOutcome::Ready);
                    }
                    continue;
                }
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => return Err(V4l2Error::Io(std::io::Error::from(e))),
            }
        }
    }

    /// Unblocks a concurrent [`Device::await_data`] call by writing to the
    /// self-pipe. Safe to call from any thread.
    pub fn stop_awaiting_data(&self) -> Result<()> {
        let byte = [b'\n'];
        // SAFETY: `cancel_write` is a valid owned fd for the lifetime of
        // this `Device`.
        let ret =
            unsafe { libc::write(self.cancel_write.as_raw_fd(), byte.as_ptr().cast(), 1) };
        if ret < 0 {
            return Err(V4l2Error::Io(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    /// `VIDIOC_QBUF`. For user-pointer memory, fills in the pointer and
    /// length from the tracked slot before queuing.
    pub fn queue_buffer(&self, index: u32) -> Result<()> {
        let fd = self.file.as_raw_fd();
        let memory = *self.memory.lock();
        let buffers = self.buffers.lock();
        let slot = buffers
            .get(index as usize)
            .ok_or_else(|| V4l2Error::params(format!("no such buffer index {index}")))?;

        let mut buf = sys::v4l2_buffer {
            type_: sys::V4L2_BUF_TYPE_VIDEO_CAPTURE,
            memory: memory.as_raw(),
            index,
            ..Default::default()
        };

        if memory == Memory::UserPtr {
            buf.m.userptr = slot.as_ptr() as u64;
            buf.length = slot.length as u32;
        }

        // SAFETY: `fd` is open; `buf` is correctly typed.
        checked_ioctl(|| unsafe { sys::vidioc_qbuf(fd, &mut buf) })
    }

    /// `VIDIOC_DQBUF`. Returns the index of the dequeued buffer.
    ///
    /// # Panics
    ///
    /// Panics if the memory strategy is `UserPtr` and the kernel returns a
    /// pointer/length pair that does not match any buffer this `Device`
    /// ever queued. That indicates the driver returned a buffer camstream
    /// never handed it, a driver/programming invariant violation rather
    /// than a recoverable I/O condition.
    pub fn dequeue_buffer(&self) -> Result<u32> {
        let fd = self.file.as_raw_fd();
        let memory = *self.memory.lock();
        let mut buf = sys::v4l2_buffer {
            type_: sys::V4L2_BUF_TYPE_VIDEO_CAPTURE,
            memory: memory.as_raw(),
            ..Default::default()
        };

        // SAFETY: `fd` is open; `buf` is correctly typed.
        checked_ioctl(|| unsafe { sys::vidioc_dqbuf(fd, &mut buf) })
            .map_err(|_| V4l2Error::capture("failed to dequeue buffer"))?;

        match memory {
            Memory::Mmap => Ok(buf.index),
            Memory::UserPtr => {
                let returned_ptr = buf.m.userptr;
                let returned_len = buf.length as usize;
                let index = self
                    .buffers
                    .lock()
                    .iter()
                    .position(|slot| {
                        slot.as_ptr() as u64 == returned_ptr && slot.length == returned_len
                    })
                    .unwrap_or_else(|| {
                        panic!(
                            "VIDIOC_DQBUF returned a user pointer that does not match any queued buffer"
                        )
                    });
                Ok(index as u32)
            }
        }
    }

    /// Returns a copy of the captured bytes of buffer `index` without
    /// dequeuing. Copies out of the mapped/allocated slot while holding
    /// the buffer-pool lock rather than returning a borrow tied to it.
    pub fn buffer_data(&self, index: u32) -> Option<Vec<u8>> {
        self.buffers
            .lock()
            .get(index as usize)
            .map(|slot| slot.as_slice().to_vec())
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for Device {
    /// Releases any buffers a caller forgot to release explicitly, so a
    /// `Device` never leaks `mmap` regions or heap allocations. The file
    /// descriptors themselves are torn down by `File`'s and `OwnedFd`'s own
    /// `Drop` impls, taking the place of the original's explicit `close`.
    fn drop(&mut self) {
        if !self.buffers.lock().is_empty() {
            if let Err(e) = self.release_buffers() {
                warn!(path = %self.path, error = %e, "failed to release buffers on drop");
            }
        }
    }
}

fn checked_ioctl(mut call: impl FnMut() -> nix::Result<i32>) -> Result<()> {
    loop {
        match call() {
            Ok(_) => return Ok(()),
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(V4l2Error::Io(std::io::Error::from(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_await_timeout_is_capped() {
        assert_eq!(MAX_AWAIT_TIMEOUT, Duration::from_secs(2));
    }
}

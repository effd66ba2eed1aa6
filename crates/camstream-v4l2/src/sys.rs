//! Raw V4L2 structures and ioctl numbers.
//!
//! This module mirrors the subset of `linux/videodev2.h` camstream needs.
//! Only the pixel-capture path is modeled: formats, selection rectangles,
//! buffer requests, and the queue/dequeue buffer struct. Nothing here is
//! meant to be a general-purpose V4L2 binding.

#![allow(non_camel_case_types)]

use nix::{ioctl_read, ioctl_readwrite, ioctl_write_ptr};

pub const VIDEO_MAX_PLANES: usize = 8;

// v4l2_buf_type
pub const V4L2_BUF_TYPE_VIDEO_CAPTURE: u32 = 1;

// v4l2_memory
pub const V4L2_MEMORY_MMAP: u32 = 1;
pub const V4L2_MEMORY_USERPTR: u32 = 2;

// v4l2_capability.capabilities flags
pub const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
pub const V4L2_CAP_STREAMING: u32 = 0x0400_0000;

// v4l2_streamparm capability flags
pub const V4L2_CAP_TIMEPERFRAME: u32 = 0x0000_1000;

// v4l2_selection targets
pub const V4L2_SEL_TGT_CROP_ACTIVE: u32 = 0;
pub const V4L2_SEL_TGT_CROP_DEFAULT: u32 = 1;
pub const V4L2_SEL_TGT_COMPOSE_ACTIVE: u32 = 0x0100;
pub const V4L2_SEL_TGT_COMPOSE_DEFAULT: u32 = 0x0101;

// v4l2_selection flags
pub const V4L2_SEL_FLAG_LE: u32 = 1 << 0;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_capability {
    pub driver: [u8; 16],
    pub card: [u8; 32],
    pub bus_info: [u8; 32],
    pub version: u32,
    pub capabilities: u32,
    pub device_caps: u32,
    pub reserved: [u32; 3],
}

impl Default for v4l2_capability {
    fn default() -> Self {
        // SAFETY: every field of this struct is a plain integer or byte
        // array; the all-zero bit pattern is a valid value for each.
        unsafe { std::mem::zeroed() }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct v4l2_pix_format {
    pub width: u32,
    pub height: u32,
    pub pixelformat: u32,
    pub field: u32,
    pub bytesperline: u32,
    pub sizeimage: u32,
    pub colorspace: u32,
    pub priv_: u32,
    pub flags: u32,
    pub ycbcr_enc: u32,
    pub quantization: u32,
    pub xfer_func: u32,
}

/// The kernel's `struct v4l2_format` carries its `fmt` member as a union
/// of several format descriptors sized to the largest variant (200 bytes).
/// camstream only ever uses the `pix` variant, so the union is modeled as
/// a fixed-size byte array with accessor helpers instead of a real Rust
/// union, which keeps every access explicit about the reinterpretation.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct v4l2_format {
    pub type_: u32,
    fmt: [u8; 200],
}

impl Default for v4l2_format {
    fn default() -> Self {
        Self {
            type_: 0,
            fmt: [0u8; 200],
        }
    }
}

impl v4l2_format {
    pub fn pix(&self) -> v4l2_pix_format {
        // SAFETY: `fmt` is always large enough to hold a `v4l2_pix_format`
        // (12 u32s = 48 bytes, well under the 200-byte union), and every
        // bit pattern of `v4l2_pix_format` is valid since it is plain
        // integers.
        unsafe { std::ptr::read_unaligned(self.fmt.as_ptr().cast()) }
    }

    pub fn set_pix(&mut self, pix: v4l2_pix_format) {
        // SAFETY: `pix` is `Copy` plain-old-data and `fmt` has room for it.
        unsafe {
            std::ptr::write_unaligned(self.fmt.as_mut_ptr().cast(), pix);
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct v4l2_fract {
    pub numerator: u32,
    pub denominator: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct v4l2_captureparm {
    pub capability: u32,
    pub capturemode: u32,
    pub timeperframe: v4l2_fract,
    pub extendedmode: u32,
    pub readbuffers: u32,
    pub reserved: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_streamparm {
    pub type_: u32,
    pub parm: v4l2_captureparm,
    // `v4l2_streamparm.parm` is itself a union in the kernel header; only
    // `capture` (a `v4l2_captureparm`) is used here, and the struct is
    // padded to the kernel's expected size.
    _reserved: [u8; 160 - std::mem::size_of::<v4l2_captureparm>()],
}

impl Default for v4l2_streamparm {
    fn default() -> Self {
        Self {
            type_: 0,
            parm: v4l2_captureparm::default(),
            _reserved: [0u8; 160 - std::mem::size_of::<v4l2_captureparm>()],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct v4l2_rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct v4l2_selection {
    pub type_: u32,
    pub target: u32,
    pub flags: u32,
    pub r: v4l2_rect,
    pub reserved: [u32; 9],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct v4l2_requestbuffers {
    pub count: u32,
    pub type_: u32,
    pub memory: u32,
    pub capabilities: u32,
    pub flags: u8,
    pub reserved: [u8; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_timecode {
    pub type_: u32,
    pub flags: u32,
    pub frames: u8,
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub userbits: [u8; 4],
}

impl Default for v4l2_timecode {
    fn default() -> Self {
        // SAFETY: every field is a plain integer/byte; all-zero is valid.
        unsafe { std::mem::zeroed() }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_timeval {
    pub tv_sec: i64,
    pub tv_usec: i64,
}

impl Default for v4l2_timeval {
    fn default() -> Self {
        Self {
            tv_sec: 0,
            tv_usec: 0,
        }
    }
}

/// `m` is a union of `offset`/`userptr`/plane pointer in the kernel; only
/// the first 8 bytes are ever meaningfully used here (`offset` is a `u32`
/// stored in the low bytes, `userptr` a `u64` occupying the whole field).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct v4l2_buffer_m {
    pub userptr: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct v4l2_buffer {
    pub index: u32,
    pub type_: u32,
    pub bytesused: u32,
    pub flags: u32,
    pub field: u32,
    pub timestamp: v4l2_timeval,
    pub timecode: v4l2_timecode,
    pub sequence: u32,
    pub memory: u32,
    pub m: v4l2_buffer_m,
    pub length: u32,
    pub reserved2: u32,
    pub request_fd: i32,
}

impl Default for v4l2_buffer {
    fn default() -> Self {
        // SAFETY: every field is plain integers or the zeroable structs
        // above; all-zero is a valid bit pattern for each.
        unsafe { std::mem::zeroed() }
    }
}

impl v4l2_buffer {
    pub fn offset(&self) -> u32 {
        self.m.userptr as u32
    }
}

const V4L2_IOCTL_MAGIC: u8 = b'V';

ioctl_read!(vidioc_querycap, V4L2_IOCTL_MAGIC, 0, v4l2_capability);
ioctl_readwrite!(vidioc_g_fmt, V4L2_IOCTL_MAGIC, 4, v4l2_format);
ioctl_readwrite!(vidioc_s_fmt, V4L2_IOCTL_MAGIC, 5, v4l2_format);
ioctl_readwrite!(vidioc_reqbufs, V4L2_IOCTL_MAGIC, 8, v4l2_requestbuffers);
ioctl_readwrite!(vidioc_querybuf, V4L2_IOCTL_MAGIC, 9, v4l2_buffer);
ioctl_readwrite!(vidioc_qbuf, V4L2_IOCTL_MAGIC, 15, v4l2_buffer);
ioctl_readwrite!(vidioc_dqbuf, V4L2_IOCTL_MAGIC, 17, v4l2_buffer);
ioctl_write_ptr!(vidioc_streamon, V4L2_IOCTL_MAGIC, 18, i32);
ioctl_write_ptr!(vidioc_streamoff, V4L2_IOCTL_MAGIC, 19, i32);
ioctl_readwrite!(vidioc_g_parm, V4L2_IOCTL_MAGIC, 21, v4l2_streamparm);
ioctl_readwrite!(vidioc_s_parm, V4L2_IOCTL_MAGIC, 22, v4l2_streamparm);
ioctl_readwrite!(vidioc_g_selection, V4L2_IOCTL_MAGIC, 94, v4l2_selection);
ioctl_readwrite!(vidioc_s_selection, V4L2_IOCTL_MAGIC, 95, v4l2_selection);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pix_roundtrip() {
        let mut fmt = v4l2_format {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..Default::default()
        };
        let pix = v4l2_pix_format {
            width: 1280,
            height: 720,
            pixelformat: 0x5955_5659, // "YUYV" little-endian fourcc
            ..Default::default()
        };
        fmt.set_pix(pix);

        let read_back = fmt.pix();
        assert_eq!(read_back.width, 1280);
        assert_eq!(read_back.height, 720);
    }

    #[test]
    fn test_buffer_offset_extraction() {
        let mut buf = v4l2_buffer::default();
        buf.m.userptr = 0x1234;
        assert_eq!(buf.offset(), 0x1234);
    }
}

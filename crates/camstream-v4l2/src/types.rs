//! Public data types for V4L2 device configuration and results.

use crate::sys;

/// Capability bits reported by `VIDIOC_QUERYCAP`, used both to describe a
/// device and to require capabilities when opening one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(pub u32);

impl Capabilities {
    /// The device can capture video.
    pub const VIDEO_CAPTURE: Capabilities = Capabilities(sys::V4L2_CAP_VIDEO_CAPTURE);
    /// The device supports the streaming (mmap/userptr) I/O method.
    pub const STREAMING: Capabilities = Capabilities(sys::V4L2_CAP_STREAMING);

    /// Returns `true` if every bit set in `required` is also set here.
    pub fn contains(self, required: Capabilities) -> bool {
        self.0 & required.0 == required.0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

/// Driver-reported identity and capability set for an opened device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub driver: String,
    pub card: String,
    pub bus_info: String,
    pub capabilities: Capabilities,
}

impl DeviceCapabilities {
    pub(crate) fn from_raw(raw: &sys::v4l2_capability) -> Self {
        Self {
            driver: cstr_field(&raw.driver),
            card: cstr_field(&raw.card),
            bus_info: cstr_field(&raw.bus_info),
            capabilities: Capabilities(raw.capabilities),
        }
    }
}

fn cstr_field(bytes: &[u8]) -> String {
    let nul = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..nul]).into_owned()
}

/// The buffer memory strategy requested from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Memory {
    /// Buffers are kernel-allocated and mapped into this process with
    /// `mmap`.
    #[default]
    Mmap,
    /// Buffers are allocated by this process and handed to the kernel by
    /// pointer.
    UserPtr,
}

impl Memory {
    pub(crate) fn as_raw(self) -> u32 {
        match self {
            Memory::Mmap => sys::V4L2_MEMORY_MMAP,
            Memory::UserPtr => sys::V4L2_MEMORY_USERPTR,
        }
    }
}

/// Negotiated pixel format and capture parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub width: u32,
    pub height: u32,
    pub pixelformat: u32,
    pub colorspace: u32,
}

impl Format {
    pub(crate) fn from_raw(raw: &sys::v4l2_pix_format) -> Self {
        Self {
            width: raw.width,
            height: raw.height,
            pixelformat: raw.pixelformat,
            colorspace: raw.colorspace,
        }
    }
}

/// Parameters requested when configuring a device's format and frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureParams {
    pub width: i32,
    pub height: i32,
    pub pixelformat: u32,
    pub colorspace: u32,
    pub desired_fps: u32,
}

/// A crop or compose rectangle, in the device's native pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionRect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl SelectionRect {
    pub(crate) fn from_raw(raw: sys::v4l2_rect) -> Self {
        Self {
            left: raw.left,
            top: raw.top,
            width: raw.width,
            height: raw.height,
        }
    }

    pub(crate) fn to_raw(self) -> sys::v4l2_rect {
        sys::v4l2_rect {
            left: self.left,
            top: self.top,
            width: self.width,
            height: self.height,
        }
    }

    /// Clamps `self` into the bounds of `bounds`, matching the original
    /// `setCroppingArea_f`/`setComposingArea_f` clamping logic: an
    /// out-of-range origin snaps to the bound's origin, and a size that
    /// would overflow the bound is cut down to fit.
    pub(crate) fn clamp_to(self, bounds: SelectionRect) -> SelectionRect {
        let left = if self.left >= bounds.left
            && self.left <= bounds.left + bounds.width as i32
        {
            self.left
        } else {
            bounds.left
        };

        let top = if self.top >= bounds.top && self.top <= bounds.top + bounds.height as i32 {
            self.top
        } else {
            bounds.top
        };

        let width = if left + self.width as i32 <= bounds.left + bounds.width as i32 {
            self.width
        } else {
            (bounds.width as i32 + bounds.left - left) as u32
        };

        let height = if top + self.height as i32 <= bounds.top + bounds.height as i32 {
            self.height
        } else {
            (bounds.height as i32 + bounds.top - top) as u32
        };

        SelectionRect {
            left,
            top,
            width,
            height,
        }
    }
}

/// Outcome of a call to [`crate::Device::await_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwaitOutcome {
    /// The device fd is readable; a buffer is ready to dequeue.
    Ready,
    /// The caller-supplied timeout elapsed with no event.
    Timeout,
    /// `stop_awaiting_data` was called from another thread.
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_contains() {
        let caps = Capabilities::VIDEO_CAPTURE | Capabilities::STREAMING;
        assert!(caps.contains(Capabilities::VIDEO_CAPTURE));
        assert!(caps.contains(Capabilities::STREAMING));
        assert!(!Capabilities::VIDEO_CAPTURE.contains(Capabilities::STREAMING));
    }

    #[test]
    fn test_clamp_origin_inside_bounds_preserved() {
        let bounds = SelectionRect {
            left: 0,
            top: 0,
            width: 640,
            height: 480,
        };
        let requested = SelectionRect {
            left: 10,
            top: 10,
            width: 100,
            height: 100,
        };
        let clamped = requested.clamp_to(bounds);
        assert_eq!(clamped.left, 10);
        assert_eq!(clamped.top, 10);
        assert_eq!(clamped.width, 100);
        assert_eq!(clamped.height, 100);
    }

    #[test]
    fn test_clamp_origin_outside_bounds_snaps_to_default() {
        let bounds = SelectionRect {
            left: 0,
            top: 0,
            width: 640,
            height: 480,
        };
        let requested = SelectionRect {
            left: -5,
            top: 1000,
            width: 100,
            height: 100,
        };
        let clamped = requested.clamp_to(bounds);
        assert_eq!(clamped.left, 0);
        assert_eq!(clamped.top, 0);
    }

    #[test]
    fn test_clamp_size_shrinks_to_fit() {
        let bounds = SelectionRect {
            left: 0,
            top: 0,
            width: 640,
            height: 480,
        };
        let requested = SelectionRect {
            left: 600,
            top: 450,
            width: 200,
            height: 200,
        };
        let clamped = requested.clamp_to(bounds);
        assert_eq!(clamped.left, 600);
        assert_eq!(clamped.width, 40);
        assert_eq!(clamped.top, 450);
        assert_eq!(clamped.height, 30);
    }

    #[test]
    fn test_clamp_zero_size_boundary() {
        let bounds = SelectionRect {
            left: 0,
            top: 0,
            width: 640,
            height: 480,
        };
        let requested = SelectionRect {
            left: 0,
            top: 0,
            width: 0,
            height: 0,
        };
        let clamped = requested.clamp_to(bounds);
        assert_eq!(clamped.width, 0);
        assert_eq!(clamped.height, 0);
    }
}

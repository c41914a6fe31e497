// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Safe seam over the native camera bridge.
//!
//! [`CameraBridge`] has one method per native entry point. List-returning
//! calls keep the native two-phase convention: call once with an empty slice
//! to learn the count, then again with a slice of that length to fill it.
//! Every method returns the bridge's [`XrResult`]; an entry point the bridge
//! could not resolve answers [`XrResult::ERROR_FUNCTION_UNSUPPORTED`].
//!
//! Native handles cross this seam only as integer tokens. Pixel memory is
//! borrowed through [`CameraBridge::frame_memory`], which only answers for the
//! frame that is currently accessed and not yet released.

use crate::{image::FourCC, pose::Pose};
use core::fmt;
use xr_frame_access_sys as sys;

/// Result code of a bridge call.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct XrResult(pub i32);

impl XrResult {
    pub const SUCCESS: XrResult = XrResult(sys::XR_SUCCESS);
    pub const ERROR_VALIDATION_FAILURE: XrResult = XrResult(sys::XR_ERROR_VALIDATION_FAILURE);
    pub const ERROR_RUNTIME_FAILURE: XrResult = XrResult(sys::XR_ERROR_RUNTIME_FAILURE);
    pub const ERROR_OUT_OF_MEMORY: XrResult = XrResult(sys::XR_ERROR_OUT_OF_MEMORY);
    pub const ERROR_FUNCTION_UNSUPPORTED: XrResult = XrResult(sys::XR_ERROR_FUNCTION_UNSUPPORTED);
    pub const ERROR_SIZE_INSUFFICIENT: XrResult = XrResult(sys::XR_ERROR_SIZE_INSUFFICIENT);
    pub const ERROR_HANDLE_INVALID: XrResult = XrResult(sys::XR_ERROR_HANDLE_INVALID);
    pub const ERROR_SESSION_NOT_RUNNING: XrResult = XrResult(sys::XR_ERROR_SESSION_NOT_RUNNING);
    pub const ERROR_CAMERA_NOT_AVAILABLE: XrResult =
        XrResult(sys::XR_ERROR_CAMERA_NOT_AVAILABLE_QCOMX);
    pub const ERROR_FRAME_NOT_AVAILABLE: XrResult =
        XrResult(sys::XR_ERROR_FRAME_NOT_AVAILABLE_QCOMX);

    /// Only `XR_SUCCESS` counts. Qualified success codes such as
    /// `XR_TIMEOUT_EXPIRED` carry no frame data and are treated as failures.
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    /// Symbolic name of the code, if it is one this crate knows.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "XR_SUCCESS",
            Self::ERROR_VALIDATION_FAILURE => "XR_ERROR_VALIDATION_FAILURE",
            Self::ERROR_RUNTIME_FAILURE => "XR_ERROR_RUNTIME_FAILURE",
            Self::ERROR_OUT_OF_MEMORY => "XR_ERROR_OUT_OF_MEMORY",
            Self::ERROR_FUNCTION_UNSUPPORTED => "XR_ERROR_FUNCTION_UNSUPPORTED",
            Self::ERROR_SIZE_INSUFFICIENT => "XR_ERROR_SIZE_INSUFFICIENT",
            Self::ERROR_HANDLE_INVALID => "XR_ERROR_HANDLE_INVALID",
            Self::ERROR_SESSION_NOT_RUNNING => "XR_ERROR_SESSION_NOT_RUNNING",
            Self::ERROR_CAMERA_NOT_AVAILABLE => "XR_ERROR_CAMERA_NOT_AVAILABLE_QCOMX",
            Self::ERROR_FRAME_NOT_AVAILABLE => "XR_ERROR_FRAME_NOT_AVAILABLE_QCOMX",
            _ => return None,
        })
    }
}

impl fmt::Display for XrResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "XrResult({})", self.0),
        }
    }
}

impl fmt::Debug for XrResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Activated camera set, valid between create and release.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CameraHandle(pub u64);

/// Per-capture identifier issued by the bridge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

impl fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque platform hardware buffer chained to a frame buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct HardwareBuffer(pub u64);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CameraInfo {
    pub camera_set: String,
    pub camera_type: u32,
    pub sensor_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CameraActivationInfo {
    pub camera_set: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FrameFormat {
    #[default]
    Unknown,
    Yuv420Nv12,
    Yuv420Nv21,
    Mjpeg,
    Raw10,
    Raw12,
}

impl FrameFormat {
    pub fn fourcc(self) -> FourCC {
        match self {
            FrameFormat::Unknown => FourCC(*b"????"),
            FrameFormat::Yuv420Nv12 => crate::image::NV12,
            FrameFormat::Yuv420Nv21 => crate::image::NV21,
            FrameFormat::Mjpeg => FourCC(*b"MJPG"),
            FrameFormat::Raw10 => FourCC(*b"RG10"),
            FrameFormat::Raw12 => FourCC(*b"RG12"),
        }
    }
}

impl From<u32> for FrameFormat {
    fn from(value: u32) -> Self {
        match value {
            sys::XR_CAMERA_FRAME_FORMAT_YUV420_NV12_QCOMX => FrameFormat::Yuv420Nv12,
            sys::XR_CAMERA_FRAME_FORMAT_YUV420_NV21_QCOMX => FrameFormat::Yuv420Nv21,
            sys::XR_CAMERA_FRAME_FORMAT_MJPEG_QCOMX => FrameFormat::Mjpeg,
            sys::XR_CAMERA_FRAME_FORMAT_RAW10_QCOMX => FrameFormat::Raw10,
            sys::XR_CAMERA_FRAME_FORMAT_RAW12_QCOMX => FrameFormat::Raw12,
            _ => FrameFormat::Unknown,
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.fourcc())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset2D {
    pub x: u32,
    pub y: u32,
}

/// A frame layout the camera set can produce. Used as part of the frame
/// cache key, so it is compared field by field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameConfiguration {
    pub format: FrameFormat,
    pub resolution_name: String,
    /// Source dimensions of the whole frame before downsampling.
    pub dimensions: Extent2D,
    pub min_fps: u32,
    pub max_fps: u32,
    pub frame_buffer_count: u32,
    pub frame_hardware_buffer_count: u32,
}

impl FrameConfiguration {
    /// Hardware buffers are chained only when there is one per frame buffer.
    pub fn hardware_buffers_available(&self) -> bool {
        self.frame_hardware_buffer_count == self.frame_buffer_count
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SensorIntrinsics {
    pub principal_point: [f32; 2],
    pub focal_length: [f32; 2],
    pub radial_distortion: [f32; 6],
    pub tangential_distortion: [f32; 2],
    pub distortion_model: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SensorProperties {
    pub intrinsics: SensorIntrinsics,
    pub extrinsic: Pose,
    /// Offset of the sensor image inside its raw buffer.
    pub image_offset: Offset2D,
    /// Size of the sensor image inside its raw buffer.
    pub image_dimensions: Extent2D,
    pub facing: u32,
    pub rolling_shutter_line_time: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlaneType {
    Y,
    Uv,
    Other(u32),
}

impl From<u32> for PlaneType {
    fn from(value: u32) -> Self {
        match value {
            sys::XR_CAMERA_FRAME_PLANE_TYPE_Y_QCOMX => PlaneType::Y,
            sys::XR_CAMERA_FRAME_PLANE_TYPE_UV_QCOMX => PlaneType::Uv,
            other => PlaneType::Other(other),
        }
    }
}

impl fmt::Display for PlaneType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlaneType::Y => f.write_str("Y"),
            PlaneType::Uv => f.write_str("UV"),
            PlaneType::Other(t) => write!(f, "type {t}"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FramePlane {
    pub plane_type: PlaneType,
    /// Byte offset of the plane inside the frame buffer.
    pub offset: u32,
    /// Row stride in bytes.
    pub stride: u32,
}

/// Descriptor of one sensor's raw buffer. The bytes themselves are borrowed
/// through [`CameraBridge::frame_memory`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    pub buffer_size: u32,
    pub offset: Offset2D,
    pub planes: Vec<FramePlane>,
    /// `Some` on input requests the hardware buffer; filled by the bridge.
    pub hardware_buffer: Option<HardwareBuffer>,
}

impl FrameBuffer {
    pub fn with_hardware_buffer() -> Self {
        Self {
            hardware_buffer: Some(HardwareBuffer::default()),
            ..Default::default()
        }
    }

    pub fn plane(&self, plane_type: PlaneType) -> Option<&FramePlane> {
        self.planes.iter().find(|p| p.plane_type == plane_type)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameData {
    pub handle: FrameHandle,
    pub format: FrameFormat,
    pub frame_number: u32,
    /// Capture time in nanoseconds, runtime clock.
    pub timestamp: i64,
}

/// Primitive operations of the native camera bridge.
///
/// All calls are synchronous and report an [`XrResult`]; outputs are written
/// through the `&mut` arguments and are only meaningful on success.
pub trait CameraBridge {
    /// Two-phase: `cameras.len()` is the capacity, `count` receives the
    /// number of cameras available.
    fn enumerate_cameras(&mut self, count: &mut u32, cameras: &mut [CameraInfo]) -> XrResult;

    /// Two-phase, scoped to one camera set.
    fn supported_frame_configurations(
        &mut self,
        camera_set: &str,
        count: &mut u32,
        configurations: &mut [FrameConfiguration],
    ) -> XrResult;

    fn create_camera_handle(
        &mut self,
        activation: &CameraActivationInfo,
        handle: &mut CameraHandle,
    ) -> XrResult;

    fn release_camera_handle(&mut self, handle: CameraHandle) -> XrResult;

    /// Locks the next frame. `sensors` and `buffers` are caller-allocated
    /// slots; their lengths are the capacities handed to the runtime.
    fn access_frame(
        &mut self,
        handle: CameraHandle,
        frame: &mut FrameData,
        sensors: &mut [SensorProperties],
        buffers: &mut [FrameBuffer],
    ) -> XrResult;

    fn release_frame(&mut self, frame: FrameHandle) -> XrResult;

    /// Raw bytes of buffer `index` of `frame`, or `None` unless `frame` is
    /// currently accessed and not yet released.
    fn frame_memory(&self, frame: FrameHandle, index: usize) -> Option<&[u8]>;
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Raw C ABI of the `XR_QCOMX_camera_frame_access` extension.
//!
//! The entry points are resolved at runtime from a shared library with
//! [`libloading`]. Any entry point the library does not export is left as
//! `None` so callers can report it without aborting the whole bridge.

#![allow(non_camel_case_types)]

use libc::{c_char, c_void};
use libloading::Library;
use std::{ffi::OsStr, mem, ptr::null_mut};

pub use libloading::Error as LoadError;

pub type XrResult = i32;
pub type XrSession = u64;
pub type XrSpace = u64;
pub type XrCameraHandleQCOMX = u64;
pub type XrCameraFrameHandleQCOMX = u64;
pub type XrTime = i64;

pub const XR_SUCCESS: XrResult = 0;
pub const XR_ERROR_VALIDATION_FAILURE: XrResult = -1;
pub const XR_ERROR_RUNTIME_FAILURE: XrResult = -2;
pub const XR_ERROR_OUT_OF_MEMORY: XrResult = -3;
pub const XR_ERROR_HANDLE_INVALID: XrResult = -12;
pub const XR_ERROR_FUNCTION_UNSUPPORTED: XrResult = -7;
pub const XR_ERROR_SIZE_INSUFFICIENT: XrResult = -11;
pub const XR_ERROR_SESSION_NOT_RUNNING: XrResult = -16;
pub const XR_ERROR_CAMERA_NOT_AVAILABLE_QCOMX: XrResult = -1000110000;
pub const XR_ERROR_FRAME_NOT_AVAILABLE_QCOMX: XrResult = -1000110001;

pub const XR_TYPE_CAMERA_INFO_QCOMX: u32 = 1000110000;
pub const XR_TYPE_CAMERA_FRAME_CONFIGURATION_QCOMX: u32 = 1000110001;
pub const XR_TYPE_CAMERA_ACTIVATION_INFO_QCOMX: u32 = 1000110002;
pub const XR_TYPE_CAMERA_SENSOR_PROPERTIES_QCOMX: u32 = 1000110003;
pub const XR_TYPE_CAMERA_SENSOR_INFOS_QCOMX: u32 = 1000110004;
pub const XR_TYPE_CAMERA_FRAME_DATA_QCOMX: u32 = 1000110005;
pub const XR_TYPE_CAMERA_FRAME_BUFFER_QCOMX: u32 = 1000110006;
pub const XR_TYPE_CAMERA_FRAME_BUFFERS_QCOMX: u32 = 1000110007;
pub const XR_TYPE_CAMERA_FRAME_HARDWARE_BUFFER_QCOMX: u32 = 1000110008;

pub const XR_MAX_CAMERA_SET_NAME_SIZE_QCOMX: usize = 128;
pub const XR_MAX_RESOLUTION_NAME_SIZE_QCOMX: usize = 64;
pub const XR_MAX_CAMERA_RADIAL_DISTORSION_PARAMS_LENGTH_QCOMX: usize = 6;
pub const XR_MAX_CAMERA_TANGENTIAL_DISTORSION_PARAMS_LENGTH_QCOMX: usize = 2;
pub const XR_CAMERA_FRAME_PLANES_SIZE_QCOMX: usize = 4;

pub const XR_CAMERA_FRAME_FORMAT_UNKNOWN_QCOMX: u32 = 0;
pub const XR_CAMERA_FRAME_FORMAT_YUV420_NV12_QCOMX: u32 = 1;
pub const XR_CAMERA_FRAME_FORMAT_YUV420_NV21_QCOMX: u32 = 2;
pub const XR_CAMERA_FRAME_FORMAT_MJPEG_QCOMX: u32 = 3;
pub const XR_CAMERA_FRAME_FORMAT_RAW10_QCOMX: u32 = 4;
pub const XR_CAMERA_FRAME_FORMAT_RAW12_QCOMX: u32 = 5;

pub const XR_CAMERA_FRAME_PLANE_TYPE_Y_QCOMX: u32 = 0;
pub const XR_CAMERA_FRAME_PLANE_TYPE_UV_QCOMX: u32 = 1;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct XrVector2f {
    pub x: f32,
    pub y: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct XrVector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct XrQuaternionf {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for XrQuaternionf {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct XrPosef {
    pub orientation: XrQuaternionf,
    pub position: XrVector3f,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct XrOffset2Di {
    pub x: i32,
    pub y: i32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct XrExtent2Di {
    pub width: i32,
    pub height: i32,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct XrCameraInfoQCOMX {
    pub ty: u32,
    pub next: *mut c_void,
    pub camera_set: [c_char; XR_MAX_CAMERA_SET_NAME_SIZE_QCOMX],
    pub camera_type: u32,
    pub sensor_count: u32,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct XrCameraFrameConfigurationQCOMX {
    pub ty: u32,
    pub next: *mut c_void,
    pub format: u32,
    pub resolution_name: [c_char; XR_MAX_RESOLUTION_NAME_SIZE_QCOMX],
    pub dimensions: XrExtent2Di,
    pub min_fps: u32,
    pub max_fps: u32,
    pub frame_buffer_count: u32,
    pub frame_hardware_buffer_count: u32,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct XrCameraActivationInfoQCOMX {
    pub ty: u32,
    pub next: *const c_void,
    pub camera_set: [c_char; XR_MAX_CAMERA_SET_NAME_SIZE_QCOMX],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct XrCameraSensorIntrinsicsQCOMX {
    pub principal_point: XrVector2f,
    pub focal_length: XrVector2f,
    pub radial_distortion: [f32; XR_MAX_CAMERA_RADIAL_DISTORSION_PARAMS_LENGTH_QCOMX],
    pub tangential_distortion: [f32; XR_MAX_CAMERA_TANGENTIAL_DISTORSION_PARAMS_LENGTH_QCOMX],
    pub distortion_model: u32,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct XrCameraSensorPropertiesQCOMX {
    pub ty: u32,
    pub next: *mut c_void,
    pub intrinsics: XrCameraSensorIntrinsicsQCOMX,
    pub extrinsic: XrPosef,
    pub image_offset: XrOffset2Di,
    pub image_dimensions: XrExtent2Di,
    pub facing: u32,
    pub rolling_shutter_line_time: u64,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct XrCameraSensorInfosQCOMX {
    pub ty: u32,
    pub next: *mut c_void,
    pub space: XrSpace,
    pub sensor_capacity_input: u32,
    pub sensor_properties: *mut XrCameraSensorPropertiesQCOMX,
}

/// Frame metadata. `next` must point at an [`XrCameraSensorInfosQCOMX`] to
/// receive the per-sensor properties of the frame.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct XrCameraFrameDataQCOMX {
    pub ty: u32,
    pub next: *mut c_void,
    pub handle: XrCameraFrameHandleQCOMX,
    pub format: u32,
    pub frame_number: u32,
    pub timestamp: XrTime,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct XrCameraFramePlaneQCOMX {
    pub plane_type: u32,
    pub offset: u32,
    pub stride: u32,
    pub reserved: [u32; 5],
}

/// One sensor's raw buffer. `next` may point at an
/// [`XrCameraFrameHardwareBufferQCOMX`] to also receive the hardware buffer.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct XrCameraFrameBufferQCOMX {
    pub ty: u32,
    pub next: *mut c_void,
    pub buffer_size: u32,
    pub buffer: *mut c_void,
    pub offset: XrOffset2Di,
    pub plane_count: u32,
    pub planes: [XrCameraFramePlaneQCOMX; XR_CAMERA_FRAME_PLANES_SIZE_QCOMX],
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct XrCameraFrameHardwareBufferQCOMX {
    pub ty: u32,
    pub next: *mut c_void,
    pub hardware_buffer: *mut c_void,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct XrCameraFrameBuffersQCOMX {
    pub ty: u32,
    pub next: *mut c_void,
    pub frame_buffer_count: u32,
    pub frame_buffers: *mut XrCameraFrameBufferQCOMX,
}

macro_rules! zeroed_default {
    ($($name:ident => $ty:expr),* $(,)?) => {
        $(
            impl Default for $name {
                fn default() -> Self {
                    // SAFETY: plain C structs, all-zero is a valid bit pattern
                    // for integers, floats, arrays and null pointers.
                    let mut value: Self = unsafe { mem::zeroed() };
                    value.ty = $ty;
                    value
                }
            }
        )*
    };
}

zeroed_default! {
    XrCameraInfoQCOMX => XR_TYPE_CAMERA_INFO_QCOMX,
    XrCameraFrameConfigurationQCOMX => XR_TYPE_CAMERA_FRAME_CONFIGURATION_QCOMX,
    XrCameraActivationInfoQCOMX => XR_TYPE_CAMERA_ACTIVATION_INFO_QCOMX,
    XrCameraSensorInfosQCOMX => XR_TYPE_CAMERA_SENSOR_INFOS_QCOMX,
    XrCameraFrameDataQCOMX => XR_TYPE_CAMERA_FRAME_DATA_QCOMX,
    XrCameraFrameBufferQCOMX => XR_TYPE_CAMERA_FRAME_BUFFER_QCOMX,
    XrCameraFrameHardwareBufferQCOMX => XR_TYPE_CAMERA_FRAME_HARDWARE_BUFFER_QCOMX,
    XrCameraFrameBuffersQCOMX => XR_TYPE_CAMERA_FRAME_BUFFERS_QCOMX,
}

impl Default for XrCameraSensorPropertiesQCOMX {
    fn default() -> Self {
        Self {
            ty: XR_TYPE_CAMERA_SENSOR_PROPERTIES_QCOMX,
            next: null_mut(),
            intrinsics: XrCameraSensorIntrinsicsQCOMX::default(),
            extrinsic: XrPosef::default(),
            image_offset: XrOffset2Di::default(),
            image_dimensions: XrExtent2Di::default(),
            facing: 0,
            rolling_shutter_line_time: 0,
        }
    }
}

pub type PFN_xrEnumerateCamerasQCOMX = unsafe extern "C" fn(
    session: XrSession,
    camera_info_capacity_input: u32,
    camera_info_count_output: *mut u32,
    camera_infos: *mut XrCameraInfoQCOMX,
) -> XrResult;

pub type PFN_xrGetSupportedFrameConfigurationsQCOMX = unsafe extern "C" fn(
    session: XrSession,
    camera_set: *const c_char,
    frame_configuration_capacity_input: u32,
    frame_configuration_count_output: *mut u32,
    frame_configurations: *mut XrCameraFrameConfigurationQCOMX,
) -> XrResult;

pub type PFN_xrCreateCameraHandleQCOMX = unsafe extern "C" fn(
    session: XrSession,
    activation_info: *const XrCameraActivationInfoQCOMX,
    camera_handle: *mut XrCameraHandleQCOMX,
) -> XrResult;

pub type PFN_xrReleaseCameraHandleQCOMX =
    unsafe extern "C" fn(camera_handle: XrCameraHandleQCOMX) -> XrResult;

pub type PFN_xrAccessFrameQCOMX = unsafe extern "C" fn(
    camera_handle: XrCameraHandleQCOMX,
    frame_data: *mut XrCameraFrameDataQCOMX,
    frame_buffers: *mut XrCameraFrameBuffersQCOMX,
) -> XrResult;

pub type PFN_xrReleaseFrameQCOMX =
    unsafe extern "C" fn(frame: XrCameraFrameHandleQCOMX) -> XrResult;

/// Entry points of the frame access extension resolved from a shared library.
pub struct FrameAccessLibrary {
    pub xr_enumerate_cameras: Option<PFN_xrEnumerateCamerasQCOMX>,
    pub xr_get_supported_frame_configurations: Option<PFN_xrGetSupportedFrameConfigurationsQCOMX>,
    pub xr_create_camera_handle: Option<PFN_xrCreateCameraHandleQCOMX>,
    pub xr_release_camera_handle: Option<PFN_xrReleaseCameraHandleQCOMX>,
    pub xr_access_frame: Option<PFN_xrAccessFrameQCOMX>,
    pub xr_release_frame: Option<PFN_xrReleaseFrameQCOMX>,
    // Keeps the function pointers above alive.
    _lib: Library,
}

impl FrameAccessLibrary {
    /// Loads the library at `path` and resolves every entry point it exports.
    ///
    /// # Safety
    ///
    /// Loading a library runs its initialisers. The caller must trust `path`
    /// and the library must export the entry points with the signatures
    /// declared in this crate.
    pub unsafe fn new<P: AsRef<OsStr>>(path: P) -> Result<Self, LoadError> {
        let lib = Library::new(path)?;
        Ok(Self {
            xr_enumerate_cameras: lookup(&lib, b"xrEnumerateCamerasQCOMX\0"),
            xr_get_supported_frame_configurations: lookup(
                &lib,
                b"xrGetSupportedFrameConfigurationsQCOMX\0",
            ),
            xr_create_camera_handle: lookup(&lib, b"xrCreateCameraHandleQCOMX\0"),
            xr_release_camera_handle: lookup(&lib, b"xrReleaseCameraHandleQCOMX\0"),
            xr_access_frame: lookup(&lib, b"xrAccessFrameQCOMX\0"),
            xr_release_frame: lookup(&lib, b"xrReleaseFrameQCOMX\0"),
            _lib: lib,
        })
    }
}

unsafe fn lookup<T: Copy>(lib: &Library, symbol: &[u8]) -> Option<T> {
    lib.get::<T>(symbol).ok().map(|sym| *sym)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_descriptor_is_32_bytes() {
        assert_eq!(mem::size_of::<XrCameraFramePlaneQCOMX>(), 32);
    }

    #[test]
    fn defaults_carry_structure_type() {
        assert_eq!(XrCameraInfoQCOMX::default().ty, XR_TYPE_CAMERA_INFO_QCOMX);
        assert_eq!(
            XrCameraFrameBufferQCOMX::default().ty,
            XR_TYPE_CAMERA_FRAME_BUFFER_QCOMX
        );
        assert!(XrCameraFrameBufferQCOMX::default().buffer.is_null());
        assert_eq!(XrCameraSensorPropertiesQCOMX::default().extrinsic.orientation.w, 1.0);
    }

    #[test]
    fn missing_library_is_an_error() {
        let lib = unsafe { FrameAccessLibrary::new("libdoes-not-exist-frame-access.so") };
        assert!(lib.is_err());
    }
}

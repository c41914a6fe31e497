// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    bridge::{
        CameraActivationInfo, CameraBridge, CameraHandle, CameraInfo, Extent2D, FrameBuffer,
        FrameConfiguration, FrameData, FrameFormat, FrameHandle, FramePlane, HardwareBuffer,
        Offset2D, PlaneType, SensorIntrinsics, SensorProperties, XrResult,
    },
    error::Result,
};
use libc::{c_char, c_void};
use std::{
    ffi::{CString, OsStr},
    ptr::null_mut,
    slice::from_raw_parts,
};
use tracing::{debug, warn};
use xr_frame_access_sys::{
    FrameAccessLibrary, XrCameraActivationInfoQCOMX, XrCameraFrameBufferQCOMX,
    XrCameraFrameBuffersQCOMX, XrCameraFrameConfigurationQCOMX, XrCameraFrameDataQCOMX,
    XrCameraFrameHardwareBufferQCOMX, XrCameraInfoQCOMX, XrCameraSensorInfosQCOMX,
    XrCameraSensorPropertiesQCOMX, XrExtent2Di, XrOffset2Di, XrSession, XrSpace,
};

fn c_chars_to_string(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Copies `value` into a NUL-terminated fixed-size C string, truncating.
fn string_to_c_chars<const N: usize>(value: &str, chars: &mut [c_char; N]) {
    let len = value.len().min(N - 1);
    for (dst, src) in chars.iter_mut().zip(&value.as_bytes()[..len]) {
        *dst = *src as c_char;
    }
    chars[len] = 0;
}

fn extent(value: XrExtent2Di) -> Extent2D {
    Extent2D {
        width: value.width.max(0) as u32,
        height: value.height.max(0) as u32,
    }
}

fn offset(value: XrOffset2Di) -> Offset2D {
    Offset2D {
        x: value.x.max(0) as u32,
        y: value.y.max(0) as u32,
    }
}

impl From<&XrCameraInfoQCOMX> for CameraInfo {
    fn from(info: &XrCameraInfoQCOMX) -> Self {
        CameraInfo {
            camera_set: c_chars_to_string(&info.camera_set),
            camera_type: info.camera_type,
            sensor_count: info.sensor_count,
        }
    }
}

impl From<&XrCameraFrameConfigurationQCOMX> for FrameConfiguration {
    fn from(config: &XrCameraFrameConfigurationQCOMX) -> Self {
        FrameConfiguration {
            format: FrameFormat::from(config.format),
            resolution_name: c_chars_to_string(&config.resolution_name),
            dimensions: extent(config.dimensions),
            min_fps: config.min_fps,
            max_fps: config.max_fps,
            frame_buffer_count: config.frame_buffer_count,
            frame_hardware_buffer_count: config.frame_hardware_buffer_count,
        }
    }
}

impl From<&XrCameraSensorPropertiesQCOMX> for SensorProperties {
    fn from(props: &XrCameraSensorPropertiesQCOMX) -> Self {
        let intrinsics = &props.intrinsics;
        SensorProperties {
            intrinsics: SensorIntrinsics {
                principal_point: [intrinsics.principal_point.x, intrinsics.principal_point.y],
                focal_length: [intrinsics.focal_length.x, intrinsics.focal_length.y],
                radial_distortion: intrinsics.radial_distortion,
                tangential_distortion: intrinsics.tangential_distortion,
                distortion_model: intrinsics.distortion_model,
            },
            extrinsic: props.extrinsic.into(),
            image_offset: offset(props.image_offset),
            image_dimensions: extent(props.image_dimensions),
            facing: props.facing,
            rolling_shutter_line_time: props.rolling_shutter_line_time,
        }
    }
}

impl From<&XrCameraFrameBufferQCOMX> for FrameBuffer {
    fn from(buffer: &XrCameraFrameBufferQCOMX) -> Self {
        let count = (buffer.plane_count as usize).min(buffer.planes.len());
        FrameBuffer {
            buffer_size: buffer.buffer_size,
            offset: offset(buffer.offset),
            planes: buffer.planes[..count]
                .iter()
                .map(|p| FramePlane {
                    plane_type: PlaneType::from(p.plane_type),
                    offset: p.offset,
                    stride: p.stride,
                })
                .collect(),
            hardware_buffer: None,
        }
    }
}

/// Pixel memory of the frame currently held from the runtime.
struct MappedFrame {
    handle: FrameHandle,
    buffers: Vec<(*const u8, usize)>,
}

/// [`CameraBridge`] over the runtime's frame access extension.
///
/// The entry points are loaded from a shared library; any the library does
/// not export answer [`XrResult::ERROR_FUNCTION_UNSUPPORTED`].
///
/// # Thread Safety
///
/// `NativeBridge` is **not** thread-safe and is neither `Send` nor `Sync`.
pub struct NativeBridge {
    lib: FrameAccessLibrary,
    session: XrSession,
    space: XrSpace,
    mapped: Option<MappedFrame>,
}

impl NativeBridge {
    /// Loads the frame access entry points from `library`.
    ///
    /// `session` is the host's running XR session and `space` the reference
    /// space sensor extrinsics are reported in.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be loaded. Missing entry points
    /// are not an error here; they fail the corresponding call instead.
    pub fn new<P: AsRef<OsStr>>(library: P, session: u64, space: u64) -> Result<Self> {
        let lib = unsafe { FrameAccessLibrary::new(library) }?;
        let missing = [
            ("xrEnumerateCamerasQCOMX", lib.xr_enumerate_cameras.is_none()),
            (
                "xrGetSupportedFrameConfigurationsQCOMX",
                lib.xr_get_supported_frame_configurations.is_none(),
            ),
            ("xrCreateCameraHandleQCOMX", lib.xr_create_camera_handle.is_none()),
            ("xrReleaseCameraHandleQCOMX", lib.xr_release_camera_handle.is_none()),
            ("xrAccessFrameQCOMX", lib.xr_access_frame.is_none()),
            ("xrReleaseFrameQCOMX", lib.xr_release_frame.is_none()),
        ];
        for (name, _) in missing.iter().filter(|(_, m)| *m) {
            warn!("frame access library does not export {}", name);
        }

        Ok(Self {
            lib,
            session,
            space,
            mapped: None,
        })
    }
}

impl CameraBridge for NativeBridge {
    fn enumerate_cameras(&mut self, count: &mut u32, cameras: &mut [CameraInfo]) -> XrResult {
        let Some(enumerate) = self.lib.xr_enumerate_cameras else {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        };

        let mut raw = vec![XrCameraInfoQCOMX::default(); cameras.len()];
        let ptr = if raw.is_empty() {
            null_mut()
        } else {
            raw.as_mut_ptr()
        };
        let result = XrResult(unsafe { enumerate(self.session, raw.len() as u32, count, ptr) });

        if result.is_success() {
            for (dst, src) in cameras.iter_mut().zip(&raw) {
                *dst = CameraInfo::from(src);
            }
        }
        result
    }

    fn supported_frame_configurations(
        &mut self,
        camera_set: &str,
        count: &mut u32,
        configurations: &mut [FrameConfiguration],
    ) -> XrResult {
        let Some(get_configurations) = self.lib.xr_get_supported_frame_configurations else {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        };
        let Ok(camera_set) = CString::new(camera_set) else {
            return XrResult::ERROR_VALIDATION_FAILURE;
        };

        let mut raw = vec![XrCameraFrameConfigurationQCOMX::default(); configurations.len()];
        let ptr = if raw.is_empty() {
            null_mut()
        } else {
            raw.as_mut_ptr()
        };
        let result = XrResult(unsafe {
            get_configurations(
                self.session,
                camera_set.as_ptr(),
                raw.len() as u32,
                count,
                ptr,
            )
        });

        if result.is_success() {
            for (dst, src) in configurations.iter_mut().zip(&raw) {
                *dst = FrameConfiguration::from(src);
            }
        }
        result
    }

    fn create_camera_handle(
        &mut self,
        activation: &CameraActivationInfo,
        handle: &mut CameraHandle,
    ) -> XrResult {
        let Some(create) = self.lib.xr_create_camera_handle else {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        };

        let mut info = XrCameraActivationInfoQCOMX::default();
        string_to_c_chars(&activation.camera_set, &mut info.camera_set);
        let mut raw = 0;
        let result = XrResult(unsafe { create(self.session, &info, &mut raw) });
        if result.is_success() {
            *handle = CameraHandle(raw);
        }
        result
    }

    fn release_camera_handle(&mut self, handle: CameraHandle) -> XrResult {
        let Some(release) = self.lib.xr_release_camera_handle else {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        };
        XrResult(unsafe { release(handle.0) })
    }

    fn access_frame(
        &mut self,
        handle: CameraHandle,
        frame: &mut FrameData,
        sensors: &mut [SensorProperties],
        buffers: &mut [FrameBuffer],
    ) -> XrResult {
        let Some(access) = self.lib.xr_access_frame else {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        };

        let mut raw_sensors = vec![XrCameraSensorPropertiesQCOMX::default(); sensors.len()];
        let mut sensor_infos = XrCameraSensorInfosQCOMX {
            space: self.space,
            sensor_capacity_input: raw_sensors.len() as u32,
            sensor_properties: raw_sensors.as_mut_ptr(),
            ..Default::default()
        };

        let mut raw_hardware =
            vec![XrCameraFrameHardwareBufferQCOMX::default(); buffers.len()];
        let hardware_ptr = raw_hardware.as_mut_ptr();
        let mut raw_buffers: Vec<XrCameraFrameBufferQCOMX> = buffers
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let mut raw = XrCameraFrameBufferQCOMX::default();
                if slot.hardware_buffer.is_some() {
                    // SAFETY: i < buffers.len() == raw_hardware.len()
                    raw.next = unsafe { hardware_ptr.add(i) }.cast::<c_void>();
                }
                raw
            })
            .collect();
        let mut frame_buffers = XrCameraFrameBuffersQCOMX {
            frame_buffer_count: raw_buffers.len() as u32,
            frame_buffers: raw_buffers.as_mut_ptr(),
            ..Default::default()
        };

        let mut frame_data = XrCameraFrameDataQCOMX {
            next: (&mut sensor_infos as *mut XrCameraSensorInfosQCOMX).cast::<c_void>(),
            ..Default::default()
        };

        let result = XrResult(unsafe { access(handle.0, &mut frame_data, &mut frame_buffers) });
        if !result.is_success() {
            return result;
        }

        *frame = FrameData {
            handle: FrameHandle(frame_data.handle),
            format: FrameFormat::from(frame_data.format),
            frame_number: frame_data.frame_number,
            timestamp: frame_data.timestamp,
        };
        for (dst, src) in sensors.iter_mut().zip(&raw_sensors) {
            *dst = SensorProperties::from(src);
        }
        for (i, (dst, src)) in buffers.iter_mut().zip(&raw_buffers).enumerate() {
            let requested = dst.hardware_buffer.is_some();
            *dst = FrameBuffer::from(src);
            if requested {
                dst.hardware_buffer =
                    Some(HardwareBuffer(raw_hardware[i].hardware_buffer as usize as u64));
            }
        }

        self.mapped = Some(MappedFrame {
            handle: frame.handle,
            buffers: raw_buffers
                .iter()
                .map(|b| (b.buffer as *const u8, b.buffer_size as usize))
                .collect(),
        });
        debug!(
            "accessed frame {} #{} with {} buffers",
            frame.handle,
            frame.frame_number,
            raw_buffers.len()
        );
        result
    }

    fn release_frame(&mut self, frame: FrameHandle) -> XrResult {
        let Some(release) = self.lib.xr_release_frame else {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        };
        let result = XrResult(unsafe { release(frame.0) });
        if result.is_success()
            && self
                .mapped
                .as_ref()
                .is_some_and(|mapped| mapped.handle == frame)
        {
            self.mapped = None;
        }
        result
    }

    fn frame_memory(&self, frame: FrameHandle, index: usize) -> Option<&[u8]> {
        let mapped = self.mapped.as_ref().filter(|m| m.handle == frame)?;
        let &(ptr, len) = mapped.buffers.get(index)?;
        if ptr.is_null() {
            return None;
        }
        // SAFETY: the runtime keeps the buffer mapped until the frame is
        // released, and releasing drops the mapping before the borrow of
        // `self` handed out here can be used again mutably.
        Some(unsafe { from_raw_parts(ptr, len) })
    }
}

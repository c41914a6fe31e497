// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Frame access controller.
//!
//! [`FrameAccess`] drives the native bridge: camera enumeration, camera
//! handle activation, and the per-tick acquire / stitch / release cycle. It
//! owns the [`FrameCache`] the conversion API reads from.

use crate::{
    bridge::{
        CameraActivationInfo, CameraBridge, CameraHandle, CameraInfo, FrameBuffer,
        FrameConfiguration, FrameData, FrameHandle, HardwareBuffer, SensorProperties, XrResult,
    },
    capabilities::DeviceCapabilities,
    downsample::{Downsampling, DEFAULT_MAX_VERTICAL_RESOLUTION},
    error::{Error, Result},
    frame::FrameCache,
    pose::Pose,
    stitch::{stitch, SensorBuffer, StitchRequest},
};
use tracing::{debug, error, instrument, warn};

/// Turns a bridge result into a crate result, logging failures.
fn check(call: &'static str, result: XrResult) -> Result<()> {
    if result.is_success() {
        return Ok(());
    }
    if result == XrResult::ERROR_FUNCTION_UNSUPPORTED {
        error!("{} method not found!", call);
        return Err(Error::MissingEntryPoint(call));
    }
    error!("{} failed: {}", call, result);
    Err(Error::Runtime { call, result })
}

/// Frame access controller.
///
/// Holds at most one frame from the bridge at a time. Every call to
/// [`access_frame`](Self::access_frame) releases the previous frame first and
/// releases the new one before returning, so pixel memory borrowed from the
/// bridge never outlives the call.
///
/// # Thread Safety
///
/// `FrameAccess` is meant to be pumped from a single thread, once per render
/// or update tick.
///
/// # Example
///
/// ```no_run
/// use xr_frame_access::{capabilities, FrameAccess, NativeBridge};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bridge = NativeBridge::new("libopenxr_loader.so", 1, 2)?;
/// let mut access = FrameAccess::new(bridge, capabilities::detect("").as_ref())?;
///
/// let camera_set = access.enumerate_cameras()?[0].camera_set.clone();
/// let config = access.supported_frame_configurations(&camera_set)?[0].clone();
/// let camera = access.create_camera_handle(&camera_set)?;
///
/// access.access_frame(camera, &config, 2)?;
/// println!("{:?}", access.last_frame_pose());
///
/// access.release_camera_handle(camera)?;
/// # Ok(())
/// # }
/// ```
pub struct FrameAccess<B: CameraBridge> {
    bridge: B,
    max_vertical_resolution: u32,
    downsampling: Downsampling,
    cameras: Vec<CameraInfo>,
    /// Frame accessed from the bridge and not yet released.
    outstanding: Option<FrameHandle>,
    frame_data: Option<FrameData>,
    sensor_properties: Vec<SensorProperties>,
    frame_buffers: Vec<FrameBuffer>,
    last_pose: Option<Pose>,
    cache: FrameCache,
}

impl<B: CameraBridge> FrameAccess<B> {
    /// Creates a controller over `bridge`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PermissionDenied`] if the device does not grant
    /// camera access.
    pub fn new(bridge: B, capabilities: &dyn DeviceCapabilities) -> Result<Self> {
        if !capabilities.camera_permission_granted() {
            error!(
                "camera permission missing on {}, frame access disabled",
                capabilities.name()
            );
            return Err(Error::PermissionDenied);
        }

        Ok(Self {
            bridge,
            max_vertical_resolution: DEFAULT_MAX_VERTICAL_RESOLUTION,
            downsampling: Downsampling::default(),
            cameras: Vec::new(),
            outstanding: None,
            frame_data: None,
            sensor_properties: Vec::new(),
            frame_buffers: Vec::new(),
            last_pose: None,
            cache: FrameCache::new(),
        })
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn max_vertical_resolution(&self) -> u32 {
        self.max_vertical_resolution
    }

    /// Caps the stitched frame height. The downsampling factor is recomputed
    /// on the next frame if the value changed.
    pub fn set_max_vertical_resolution(&mut self, rows: u32) {
        if rows != self.max_vertical_resolution {
            self.max_vertical_resolution = rows;
            self.downsampling.mark_stale();
        }
    }

    pub fn downsampling_factor(&self) -> u32 {
        self.downsampling.factor()
    }

    /// Queries the cameras exposed by the runtime.
    pub fn enumerate_cameras(&mut self) -> Result<&[CameraInfo]> {
        self.cameras.clear();

        let mut count = 0;
        check(
            "xrEnumerateCamerasQCOMX",
            self.bridge.enumerate_cameras(&mut count, &mut []),
        )?;

        let mut cameras = vec![CameraInfo::default(); count as usize];
        check(
            "xrEnumerateCamerasQCOMX",
            self.bridge.enumerate_cameras(&mut count, &mut cameras),
        )?;
        cameras.truncate(count as usize);

        debug!("enumerated {} cameras", cameras.len());
        self.cameras = cameras;
        Ok(&self.cameras)
    }

    /// Cameras found by the last successful [`enumerate_cameras`](Self::enumerate_cameras).
    pub fn cameras(&self) -> &[CameraInfo] {
        &self.cameras
    }

    pub fn supported_frame_configurations(
        &mut self,
        camera_set: &str,
    ) -> Result<Vec<FrameConfiguration>> {
        let mut count = 0;
        check(
            "xrGetSupportedFrameConfigurationsQCOMX",
            self.bridge
                .supported_frame_configurations(camera_set, &mut count, &mut []),
        )?;

        let mut configurations = vec![FrameConfiguration::default(); count as usize];
        check(
            "xrGetSupportedFrameConfigurationsQCOMX",
            self.bridge
                .supported_frame_configurations(camera_set, &mut count, &mut configurations),
        )?;
        configurations.truncate(count as usize);

        Ok(configurations)
    }

    pub fn create_camera_handle(&mut self, camera_set: &str) -> Result<CameraHandle> {
        let activation = CameraActivationInfo {
            camera_set: camera_set.to_string(),
        };
        let mut handle = CameraHandle::default();
        check(
            "xrCreateCameraHandleQCOMX",
            self.bridge.create_camera_handle(&activation, &mut handle),
        )?;
        debug!("camera set {:?} activated as {:?}", camera_set, handle);
        Ok(handle)
    }

    pub fn release_camera_handle(&mut self, handle: CameraHandle) -> Result<()> {
        check(
            "xrReleaseCameraHandleQCOMX",
            self.bridge.release_camera_handle(handle),
        )
    }

    /// Acquires the next frame, refreshes the stitched frame cache from it
    /// and releases it again.
    ///
    /// A frame whose handle matches the cached frame is released without
    /// touching the cache.
    ///
    /// # Errors
    ///
    /// Fails if the previous frame cannot be released, the bridge cannot
    /// deliver a frame, or the frame cannot be stitched.
    #[instrument(skip(self, config))]
    pub fn access_frame(
        &mut self,
        camera: CameraHandle,
        config: &FrameConfiguration,
        sensor_count: u32,
    ) -> Result<()> {
        if self.outstanding.is_some() {
            if let Err(e) = self.release_frame() {
                error!("failed to clear frame buffer before requesting frame");
                return Err(e);
            }
        }

        if self.downsampling.is_stale() {
            self.downsampling
                .update(config.dimensions.height, self.max_vertical_resolution);
        }

        let mut sensors = vec![SensorProperties::default(); sensor_count as usize];
        let slot = if config.hardware_buffers_available() {
            FrameBuffer::with_hardware_buffer()
        } else {
            FrameBuffer::default()
        };
        let mut buffers = vec![slot; config.frame_buffer_count as usize];

        let mut frame = FrameData::default();
        check(
            "xrAccessFrameQCOMX",
            self.bridge
                .access_frame(camera, &mut frame, &mut sensors, &mut buffers),
        )?;
        self.outstanding = Some(frame.handle);

        if self.cache.holds(frame.handle) {
            debug!("frame {} already cached, skipping", frame.handle);
            self.release_after_access();
            return Ok(());
        }

        self.frame_data = Some(frame);
        self.sensor_properties = sensors;
        self.frame_buffers = buffers;

        let extracted = self.extract_frame(config, &frame);
        match extracted {
            Ok(()) => {
                self.last_pose = self.sensor_properties.first().map(|s| s.extrinsic);
            }
            Err(ref e) => error!("failed to extract frame {}: {}", frame.handle, e),
        }

        self.release_after_access();
        extracted
    }

    fn extract_frame(&mut self, config: &FrameConfiguration, frame: &FrameData) -> Result<()> {
        let Self {
            bridge,
            downsampling,
            sensor_properties,
            frame_buffers,
            cache,
            ..
        } = self;
        let bridge: &B = bridge;

        let buffers = frame_buffers
            .iter()
            .enumerate()
            .map(|(i, descriptor)| {
                bridge
                    .frame_memory(frame.handle, i)
                    .map(|data| SensorBuffer { data, descriptor })
                    .ok_or(Error::BufferUnavailable(i))
            })
            .collect::<Result<Vec<_>>>()?;

        stitch(
            cache,
            &StitchRequest {
                config,
                frame,
                sensors: sensor_properties,
                factor: downsampling.factor(),
            },
            &buffers,
        )
    }

    fn release_after_access(&mut self) {
        if let Err(e) = self.release_frame() {
            warn!("could not release frame after requesting it: {}", e);
        }
    }

    /// Hands the outstanding frame back to the bridge. Succeeds without
    /// calling the bridge if no frame is outstanding.
    pub fn release_frame(&mut self) -> Result<()> {
        let Some(handle) = self.outstanding else {
            warn!("skipped releasing last frame: already released");
            return Ok(());
        };
        check("xrReleaseFrameQCOMX", self.bridge.release_frame(handle))?;
        self.outstanding = None;
        Ok(())
    }

    pub fn is_frame_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Metadata of the last frame handed to extraction.
    pub fn frame_data(&self) -> Option<&FrameData> {
        self.frame_data.as_ref()
    }

    pub fn sensor_properties(&self) -> &[SensorProperties] {
        &self.sensor_properties
    }

    /// Plane layout of the last frame handed to extraction. The memory the
    /// descriptors point into is gone once the frame is released.
    pub fn frame_buffers(&self) -> &[FrameBuffer] {
        &self.frame_buffers
    }

    pub fn hardware_buffers(&self) -> impl Iterator<Item = HardwareBuffer> + '_ {
        self.frame_buffers.iter().filter_map(|b| b.hardware_buffer)
    }

    /// Pose of sensor 0 at the last successfully extracted frame.
    pub fn last_frame_pose(&self) -> Option<Pose> {
        self.last_pose
    }

    pub fn frame_cache(&self) -> &FrameCache {
        &self.cache
    }

    /// Disposes the stitched frame.
    pub fn clear_frame_cache(&mut self) {
        self.cache.clear();
    }
}

impl<B: CameraBridge> Drop for FrameAccess<B> {
    fn drop(&mut self) {
        if self.outstanding.is_some() {
            self.release_after_access();
        }
    }
}

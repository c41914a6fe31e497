// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, rc::Rc};
use xr_frame_access::{
    bridge::{
        CameraActivationInfo, CameraInfo, Extent2D, FrameBuffer, FrameData, FrameFormat,
        FramePlane, HardwareBuffer, PlaneType, SensorProperties,
    },
    CameraBridge, CameraHandle, FrameConfiguration, FrameHandle, Pose, XrResult,
};

pub const CAMERA_SET: &str = "stereo";

/// Calls observed by a [`FakeBridge`], shared so tests can inspect them after
/// the bridge moved into the controller or was dropped with it.
#[derive(Debug, Default)]
pub struct Calls {
    pub enumerate_cameras: u32,
    pub supported_frame_configurations: u32,
    pub access_frame: u32,
    pub released_frames: Vec<FrameHandle>,
    pub released_cameras: Vec<CameraHandle>,
}

/// One frame the bridge will deliver: handle plus one buffer per sensor.
#[derive(Debug, Clone)]
pub struct ScriptedFrame {
    pub handle: u64,
    pub buffers: Vec<Vec<u8>>,
}

/// In-memory camera bridge delivering scripted NV12 frames.
pub struct FakeBridge {
    pub cameras: Vec<CameraInfo>,
    pub configurations: Vec<FrameConfiguration>,
    pub sensors: Vec<SensorProperties>,
    /// Plane layout reported for every buffer.
    pub layout: FrameBuffer,
    pub frames: VecDeque<ScriptedFrame>,
    /// Entry points that answer `ERROR_FUNCTION_UNSUPPORTED`.
    pub missing: Vec<&'static str>,
    pub fail_access: Option<XrResult>,
    pub fail_release: Option<XrResult>,
    pub calls: Rc<RefCell<Calls>>,
    current: Option<ScriptedFrame>,
}

/// Luma of sensor `sensor` at `(row, col)` in frame `handle`.
pub fn luma(handle: u64, sensor: usize, row: u32, col: u32) -> u8 {
    (handle as u32 * 31 + sensor as u32 * 50 + row * 7 + col) as u8
}

/// NV12 buffer of `width`x`height` following [`luma`], chroma fixed at
/// `(u, v)`.
pub fn nv12(handle: u64, sensor: usize, width: u32, height: u32, u: u8, v: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 3 / 2) as usize);
    for row in 0..height {
        for col in 0..width {
            data.push(luma(handle, sensor, row, col));
        }
    }
    for _ in 0..(width * height / 2) / 2 {
        data.push(u);
        data.push(v);
    }
    data
}

impl FakeBridge {
    /// Camera set of `sensors` sensors, each `width`x`height`, delivering
    /// frames of `sensors` contiguous NV12 buffers.
    pub fn new(sensors: u32, width: u32, height: u32) -> Self {
        let config = FrameConfiguration {
            format: FrameFormat::Yuv420Nv12,
            resolution_name: format!("{}x{}", width, height),
            dimensions: Extent2D {
                width: width * sensors,
                height,
            },
            min_fps: 30,
            max_fps: 30,
            frame_buffer_count: sensors,
            frame_hardware_buffer_count: 0,
        };
        let sensor = |i: u32| SensorProperties {
            image_dimensions: Extent2D { width, height },
            extrinsic: Pose {
                position: [i as f32 * 0.064, 1.6, 0.0],
                ..Pose::IDENTITY
            },
            ..Default::default()
        };

        Self {
            cameras: vec![
                CameraInfo {
                    camera_set: CAMERA_SET.to_string(),
                    camera_type: 1,
                    sensor_count: sensors,
                },
                CameraInfo {
                    camera_set: "tracking".to_string(),
                    camera_type: 2,
                    sensor_count: 4,
                },
            ],
            configurations: vec![config],
            sensors: (0..sensors).map(sensor).collect(),
            layout: FrameBuffer {
                buffer_size: width * height * 3 / 2,
                planes: vec![
                    FramePlane {
                        plane_type: PlaneType::Y,
                        offset: 0,
                        stride: width,
                    },
                    FramePlane {
                        plane_type: PlaneType::Uv,
                        offset: width * height,
                        stride: width,
                    },
                ],
                ..Default::default()
            },
            frames: VecDeque::new(),
            missing: Vec::new(),
            fail_access: None,
            fail_release: None,
            calls: Rc::default(),
            current: None,
        }
    }

    pub fn config(&self) -> FrameConfiguration {
        self.configurations[0].clone()
    }

    pub fn sensor_count(&self) -> u32 {
        self.sensors.len() as u32
    }

    /// Queues frame `handle` with chroma `(u, v)` in every sensor.
    pub fn push_frame(&mut self, handle: u64, u: u8, v: u8) {
        let dims = self.sensors[0].image_dimensions;
        let buffers = (0..self.sensors.len())
            .map(|i| nv12(handle, i, dims.width, dims.height, u, v))
            .collect();
        self.frames.push_back(ScriptedFrame { handle, buffers });
    }

    pub fn push_scripted(&mut self, frame: ScriptedFrame) {
        self.frames.push_back(frame);
    }

    fn unsupported(&self, entry: &str) -> bool {
        self.missing.contains(&entry)
    }
}

fn two_phase<T: Clone>(items: &[T], count: &mut u32, out: &mut [T]) -> XrResult {
    *count = items.len() as u32;
    if out.is_empty() {
        return XrResult::SUCCESS;
    }
    if out.len() < items.len() {
        return XrResult::ERROR_SIZE_INSUFFICIENT;
    }
    out[..items.len()].clone_from_slice(items);
    XrResult::SUCCESS
}

impl CameraBridge for FakeBridge {
    fn enumerate_cameras(&mut self, count: &mut u32, cameras: &mut [CameraInfo]) -> XrResult {
        if self.unsupported("enumerate_cameras") {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        }
        self.calls.borrow_mut().enumerate_cameras += 1;
        two_phase(&self.cameras, count, cameras)
    }

    fn supported_frame_configurations(
        &mut self,
        camera_set: &str,
        count: &mut u32,
        configurations: &mut [FrameConfiguration],
    ) -> XrResult {
        if self.unsupported("supported_frame_configurations") {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        }
        self.calls.borrow_mut().supported_frame_configurations += 1;
        if camera_set != CAMERA_SET {
            return XrResult::ERROR_CAMERA_NOT_AVAILABLE;
        }
        two_phase(&self.configurations, count, configurations)
    }

    fn create_camera_handle(
        &mut self,
        activation: &CameraActivationInfo,
        handle: &mut CameraHandle,
    ) -> XrResult {
        if self.unsupported("create_camera_handle") {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        }
        match self
            .cameras
            .iter()
            .position(|c| c.camera_set == activation.camera_set)
        {
            Some(i) => {
                *handle = CameraHandle(0xca00 + i as u64);
                XrResult::SUCCESS
            }
            None => XrResult::ERROR_CAMERA_NOT_AVAILABLE,
        }
    }

    fn release_camera_handle(&mut self, handle: CameraHandle) -> XrResult {
        if self.unsupported("release_camera_handle") {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        }
        self.calls.borrow_mut().released_cameras.push(handle);
        XrResult::SUCCESS
    }

    fn access_frame(
        &mut self,
        _handle: CameraHandle,
        frame: &mut FrameData,
        sensors: &mut [SensorProperties],
        buffers: &mut [FrameBuffer],
    ) -> XrResult {
        if self.unsupported("access_frame") {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        }
        self.calls.borrow_mut().access_frame += 1;
        if let Some(result) = self.fail_access {
            return result;
        }
        let Some(next) = self.frames.pop_front() else {
            return XrResult::ERROR_FRAME_NOT_AVAILABLE;
        };

        *frame = FrameData {
            handle: FrameHandle(next.handle),
            format: FrameFormat::Yuv420Nv12,
            frame_number: next.handle as u32,
            timestamp: next.handle as i64 * 33_333_333,
        };
        for (slot, sensor) in sensors.iter_mut().zip(&self.sensors) {
            *slot = sensor.clone();
        }
        for (i, slot) in buffers.iter_mut().enumerate() {
            let requested = slot.hardware_buffer.is_some();
            *slot = self.layout.clone();
            if requested {
                slot.hardware_buffer = Some(HardwareBuffer(0xb000 + i as u64));
            }
        }
        self.current = Some(next);
        XrResult::SUCCESS
    }

    fn release_frame(&mut self, frame: FrameHandle) -> XrResult {
        if self.unsupported("release_frame") {
            return XrResult::ERROR_FUNCTION_UNSUPPORTED;
        }
        if let Some(result) = self.fail_release {
            return result;
        }
        self.calls.borrow_mut().released_frames.push(frame);
        if self
            .current
            .as_ref()
            .is_some_and(|c| FrameHandle(c.handle) == frame)
        {
            self.current = None;
        }
        XrResult::SUCCESS
    }

    fn frame_memory(&self, frame: FrameHandle, index: usize) -> Option<&[u8]> {
        let current = self.current.as_ref()?;
        if FrameHandle(current.handle) != frame {
            return None;
        }
        current.buffers.get(index).map(Vec::as_slice)
    }
}

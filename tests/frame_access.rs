// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod common;

use common::{luma, FakeBridge, ScriptedFrame, CAMERA_SET};
use xr_frame_access::{
    bridge::{FrameBuffer, FramePlane, HardwareBuffer, PlaneType},
    capabilities::{DeviceCapabilities, GenericDevice},
    CameraHandle, Error, FrameAccess, FrameHandle, XrResult,
};

fn access(bridge: FakeBridge) -> FrameAccess<FakeBridge> {
    FrameAccess::new(bridge, &GenericDevice).unwrap()
}

fn y_plane(access: &FrameAccess<FakeBridge>) -> Vec<u8> {
    access
        .frame_cache()
        .frame()
        .unwrap()
        .y_plane()
        .unwrap()
        .to_vec()
}

#[test]
fn enumerate_cameras_two_phase() {
    let bridge = FakeBridge::new(2, 8, 4);
    let calls = bridge.calls.clone();
    let mut access = access(bridge);

    let cameras = access.enumerate_cameras().unwrap();
    assert_eq!(cameras.len(), 2);
    assert_eq!(cameras[0].camera_set, CAMERA_SET);
    assert_eq!(cameras[1].sensor_count, 4);
    assert_eq!(calls.borrow().enumerate_cameras, 2);
    assert_eq!(access.cameras().len(), 2);
}

#[test]
fn supported_frame_configurations() {
    let mut access = access(FakeBridge::new(2, 8, 4));

    let configs = access.supported_frame_configurations(CAMERA_SET).unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].dimensions.width, 16);
    assert_eq!(configs[0].resolution_name, "8x4");

    let err = access.supported_frame_configurations("missing").unwrap_err();
    assert!(matches!(
        err,
        Error::Runtime {
            result: XrResult::ERROR_CAMERA_NOT_AVAILABLE,
            ..
        }
    ));
}

#[test]
fn missing_entry_point() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.missing.push("enumerate_cameras");
    let mut access = access(bridge);

    let err = access.enumerate_cameras().unwrap_err();
    assert!(matches!(err, Error::MissingEntryPoint("xrEnumerateCamerasQCOMX")));
    assert!(access.cameras().is_empty());
}

#[test]
fn camera_handle_bracket() {
    let bridge = FakeBridge::new(2, 8, 4);
    let calls = bridge.calls.clone();
    let mut access = access(bridge);

    let handle = access.create_camera_handle(CAMERA_SET).unwrap();
    assert_eq!(handle, CameraHandle(0xca00));
    access.release_camera_handle(handle).unwrap();
    assert_eq!(calls.borrow().released_cameras, vec![handle]);

    assert!(access.create_camera_handle("unknown").is_err());
}

#[test]
fn stitches_sensors_side_by_side() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.push_frame(1, 100, 150);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let calls = bridge.calls.clone();
    let mut access = access(bridge);

    assert_eq!(access.last_frame_pose(), None);
    access.access_frame(CameraHandle(1), &config, sensors).unwrap();

    let frame = access.frame_cache().frame().unwrap();
    assert_eq!(frame.handle(), FrameHandle(1));
    assert_eq!((frame.width(), frame.height()), (16, 4));
    let y = frame.y_plane().unwrap();
    for row in 0..4 {
        for col in 0..16 {
            assert_eq!(
                y[(row * 16 + col) as usize],
                luma(1, (col / 8) as usize, row, col % 8),
                "row {row} col {col}"
            );
        }
    }
    let uv = frame.uv_plane().unwrap();
    assert_eq!(uv.len(), 16 * 2);
    assert!(uv.chunks(2).all(|pair| pair == [100, 150]));

    assert_eq!(access.downsampling_factor(), 1);
    assert!(!access.is_frame_outstanding());
    assert_eq!(calls.borrow().released_frames, vec![FrameHandle(1)]);
    assert_eq!(access.frame_data().map(|f| f.frame_number), Some(1));
    assert_eq!(access.sensor_properties().len(), 2);

    let pose = access.last_frame_pose().unwrap();
    assert_eq!(pose.position, [0.0, 1.6, 0.0]);
}

#[test]
fn downsamples_tall_sensors() {
    let mut bridge = FakeBridge::new(2, 8, 1440);
    bridge.push_frame(1, 128, 128);
    bridge.push_frame(2, 128, 128);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let mut access = access(bridge);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    assert_eq!(access.downsampling_factor(), 2);
    let frame = access.frame_cache().frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (8, 720));
    let y = frame.y_plane().unwrap();
    assert_eq!(y[0], luma(1, 0, 0, 0));
    assert_eq!(y[5], luma(1, 1, 0, 2));
    assert_eq!(y[8 * 3 + 1], luma(1, 0, 6, 2));

    access.set_max_vertical_resolution(480);
    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    assert_eq!(access.downsampling_factor(), 3);
    let frame = access.frame_cache().frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (4, 480));
    assert_eq!(frame.y_plane().unwrap()[4 + 3], luma(2, 1, 3, 3));
}

#[test]
fn reuses_planes_for_same_configuration() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.push_frame(1, 128, 128);
    bridge.push_frame(2, 128, 128);
    bridge.push_frame(3, 128, 128);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let mut access = access(bridge);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    let ptr = access.frame_cache().frame().unwrap().y_plane().unwrap().as_ptr();
    assert!(access.frame_cache().can_reuse(&config, 1));

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    let frame = access.frame_cache().frame().unwrap();
    assert_eq!(frame.handle(), FrameHandle(2));
    assert_eq!(frame.y_plane().unwrap().as_ptr(), ptr);
    assert_eq!(frame.y_plane().unwrap()[0], luma(2, 0, 0, 0));

    let mut changed = config.clone();
    changed.max_fps = 60;
    access.access_frame(CameraHandle(1), &changed, sensors).unwrap();
    let cache = access.frame_cache();
    let frame = cache.frame().unwrap();
    assert_eq!(frame.handle(), FrameHandle(3));
    assert_eq!(frame.y_plane().unwrap()[0], luma(3, 0, 0, 0));
    assert!(cache.can_reuse(&changed, 1));
    assert!(!cache.can_reuse(&config, 1));
    assert!(!cache.can_reuse(&changed, 2));
}

#[test]
fn factor_change_reallocates() {
    let mut bridge = FakeBridge::new(2, 8, 1440);
    bridge.push_frame(1, 128, 128);
    bridge.push_frame(2, 128, 128);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let mut access = access(bridge);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    assert!(access.frame_cache().can_reuse(&config, 2));

    access.set_max_vertical_resolution(480);
    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    let cache = access.frame_cache();
    assert_eq!(cache.frame().unwrap().handle(), FrameHandle(2));
    assert!(cache.can_reuse(&config, 3));
    assert!(!cache.can_reuse(&config, 2));
}

#[test]
fn duplicate_handle_keeps_cached_frame() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.push_frame(5, 128, 128);
    let mut repeat = ScriptedFrame {
        handle: 5,
        buffers: vec![vec![0; 48], vec![0; 48]],
    };
    bridge.push_scripted(repeat.clone());
    repeat.handle = 6;
    bridge.push_scripted(repeat);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let calls = bridge.calls.clone();
    let mut access = access(bridge);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    let before = y_plane(&access);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    assert_eq!(y_plane(&access), before);
    assert_eq!(
        calls.borrow().released_frames,
        vec![FrameHandle(5), FrameHandle(5)]
    );

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    assert!(y_plane(&access).iter().all(|&b| b == 0));
}

#[test]
fn release_frame_is_idempotent() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.push_frame(1, 128, 128);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let calls = bridge.calls.clone();
    let mut access = access(bridge);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    access.release_frame().unwrap();
    access.release_frame().unwrap();
    assert_eq!(calls.borrow().released_frames.len(), 1);
}

#[test]
fn failed_release_blocks_next_access() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.push_frame(1, 128, 128);
    bridge.push_frame(2, 128, 128);
    bridge.fail_release = Some(XrResult::ERROR_RUNTIME_FAILURE);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let calls = bridge.calls.clone();
    let mut access = access(bridge);

    // The frame itself is extracted, only the release after it fails.
    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    assert!(access.is_frame_outstanding());

    let err = access.access_frame(CameraHandle(1), &config, sensors).unwrap_err();
    assert!(matches!(
        err,
        Error::Runtime {
            call: "xrReleaseFrameQCOMX",
            ..
        }
    ));
    assert_eq!(calls.borrow().access_frame, 1);

    access.bridge_mut().fail_release = None;
    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    assert_eq!(access.frame_cache().frame().unwrap().handle(), FrameHandle(2));
    assert_eq!(
        calls.borrow().released_frames,
        vec![FrameHandle(1), FrameHandle(2)]
    );
}

#[test]
fn access_failure_reports_runtime_error() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.fail_access = Some(XrResult::ERROR_SESSION_NOT_RUNNING);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let mut access = access(bridge);

    let err = access.access_frame(CameraHandle(1), &config, sensors).unwrap_err();
    assert_eq!(
        err.to_string(),
        "xrAccessFrameQCOMX failed: XR_ERROR_SESSION_NOT_RUNNING"
    );
    assert!(!access.is_frame_outstanding());
}

#[test]
fn qualified_success_is_a_failure() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    // XR_TIMEOUT_EXPIRED
    bridge.fail_access = Some(XrResult(1));
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let mut access = access(bridge);

    let err = access.access_frame(CameraHandle(1), &config, sensors).unwrap_err();
    assert!(matches!(
        err,
        Error::Runtime {
            result: XrResult(1),
            ..
        }
    ));
    assert!(access.frame_cache().frame().is_none());
    assert!(!access.is_frame_outstanding());
}

#[test]
fn extraction_failure_releases_and_invalidates() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.push_frame(1, 128, 128);
    bridge.push_scripted(ScriptedFrame {
        handle: 2,
        buffers: vec![vec![0; 48], vec![0; 20]],
    });
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let calls = bridge.calls.clone();
    let mut access = access(bridge);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    let pose = access.last_frame_pose();

    let err = access.access_frame(CameraHandle(1), &config, sensors).unwrap_err();
    assert!(matches!(err, Error::SourceOutOfBounds { sensor: 1, .. }));
    assert!(!access.is_frame_outstanding());
    assert_eq!(
        calls.borrow().released_frames,
        vec![FrameHandle(1), FrameHandle(2)]
    );
    assert!(!access.frame_cache().is_valid());
    assert_eq!(access.last_frame_pose(), pose);
}

#[test]
fn missing_chroma_plane_fails_extraction() {
    let mut bridge = FakeBridge::new(1, 8, 4);
    bridge.layout = FrameBuffer {
        planes: vec![FramePlane {
            plane_type: PlaneType::Y,
            offset: 0,
            stride: 8,
        }],
        ..Default::default()
    };
    bridge.push_frame(1, 128, 128);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let mut access = access(bridge);

    let err = access.access_frame(CameraHandle(1), &config, sensors).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingPlane {
            sensor: 0,
            plane: PlaneType::Uv
        }
    ));
    assert_eq!(access.last_frame_pose(), None);
}

#[test]
fn hardware_buffers_requested_when_available() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.configurations[0].frame_hardware_buffer_count = 2;
    bridge.push_frame(1, 128, 128);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let mut access = access(bridge);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    assert_eq!(
        access.hardware_buffers().collect::<Vec<_>>(),
        vec![HardwareBuffer(0xb000), HardwareBuffer(0xb001)]
    );
}

#[test]
fn clear_frame_cache_disposes() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.push_frame(1, 128, 128);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let mut access = access(bridge);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    access.clear_frame_cache();
    access.clear_frame_cache();
    let frame = access.frame_cache().frame().unwrap();
    assert!(matches!(frame.y_plane(), Err(Error::FrameDisposed)));
}

#[test]
fn drop_releases_outstanding_frame() {
    let mut bridge = FakeBridge::new(2, 8, 4);
    bridge.push_frame(1, 128, 128);
    bridge.fail_release = Some(XrResult::ERROR_RUNTIME_FAILURE);
    let (config, sensors) = (bridge.config(), bridge.sensor_count());
    let calls = bridge.calls.clone();
    let mut access = access(bridge);

    access.access_frame(CameraHandle(1), &config, sensors).unwrap();
    assert!(access.is_frame_outstanding());
    access.bridge_mut().fail_release = None;
    drop(access);
    assert_eq!(calls.borrow().released_frames, vec![FrameHandle(1)]);
}

struct NoPermission;

impl DeviceCapabilities for NoPermission {
    fn name(&self) -> &str {
        "locked"
    }

    fn camera_permission_granted(&self) -> bool {
        false
    }
}

#[test]
fn permission_denied() {
    let result = FrameAccess::new(FakeBridge::new(2, 8, 4), &NoPermission);
    assert!(matches!(result, Err(Error::PermissionDenied)));
}

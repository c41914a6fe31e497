// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use xr_frame_access_sys::XrPosef;

/// Rigid transform in the reference space the frames were requested in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Metres, x y z.
    pub position: [f32; 3],
    /// Unit quaternion, x y z w.
    pub rotation: [f32; 4],
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
    };
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<XrPosef> for Pose {
    fn from(pose: XrPosef) -> Self {
        Pose {
            position: [pose.position.x, pose.position.y, pose.position.z],
            rotation: [
                pose.orientation.x,
                pose.orientation.y,
                pose.orientation.z,
                pose.orientation.w,
            ],
        }
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Per-device behaviour selected once at startup.

use tracing::info;

/// Device models whose runtime reports NV12 frames as NV21 and vice versa.
const CHROMA_SWAPPED_MODELS: &[&str] = &["motorola edge"];

pub trait DeviceCapabilities {
    fn name(&self) -> &str;

    /// The runtime inverts the chroma byte order of its YUV420 frames.
    fn swaps_chroma(&self) -> bool {
        false
    }

    /// The process may open the cameras.
    fn camera_permission_granted(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenericDevice;

impl DeviceCapabilities for GenericDevice {
    fn name(&self) -> &str {
        "generic"
    }
}

#[derive(Debug, Clone)]
pub struct ChromaSwappedDevice {
    model: String,
}

impl DeviceCapabilities for ChromaSwappedDevice {
    fn name(&self) -> &str {
        &self.model
    }

    fn swaps_chroma(&self) -> bool {
        true
    }
}

/// Picks the capability provider for a device model string, as reported by
/// the platform (case-insensitive substring match).
pub fn detect(device_model: &str) -> Box<dyn DeviceCapabilities> {
    let model = device_model.to_lowercase();
    if CHROMA_SWAPPED_MODELS.iter().any(|m| model.contains(m)) {
        info!("device {:?} swaps chroma planes", device_model);
        return Box::new(ChromaSwappedDevice {
            model: device_model.to_string(),
        });
    }
    Box::new(GenericDevice)
}

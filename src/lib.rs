// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! # XR Frame Access Library
//!
//! Camera frame access for XR headsets exposing their passthrough cameras
//! through the runtime's frame access extension. Frames from every sensor of
//! a camera set are stitched side by side into one semi-planar YUV420 image,
//! cached, and converted on the CPU into RGB images for consumers.
//!
//! ## Features
//!
//! - **Frame Access**: Camera enumeration, activation and the per-tick
//!   acquire / stitch / release cycle over a dynamically loaded bridge.
//! - **Stitching**: Horizontal composition of all sensors with integer
//!   downsampling capped by a configurable vertical resolution.
//! - **Frame Cache**: Reuses plane storage while the frame configuration
//!   stays the same, and detects reads of disposed frames.
//! - **Conversion**: Nearest-neighbour resampling to RGB24, RGBA32 or BGRA32
//!   with independent mirroring, plus JPEG encoding of the result using
//!   turbojpeg.
//!
//! ## Example
//!
//! ```no_run
//! use xr_frame_access::{
//!     capabilities, image::{Rect, RGBA}, ConversionParams, CpuImageApi, FrameAccess,
//!     NativeBridge, Transformation,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let device = capabilities::detect("Generic Headset");
//! let bridge = NativeBridge::new("libopenxr_loader.so", 1, 2)?;
//! let mut access = FrameAccess::new(bridge, device.as_ref())?;
//! let api = CpuImageApi::new(device.as_ref());
//!
//! let camera_set = access.enumerate_cameras()?[0].camera_set.clone();
//! let config = access.supported_frame_configurations(&camera_set)?[0].clone();
//! let camera = access.create_camera_handle(&camera_set)?;
//! access.access_frame(camera, &config, 2)?;
//!
//! let frame = access.frame_cache().frame().ok_or("no frame")?;
//! let params = ConversionParams {
//!     input_rect: Rect::new(0, 0, frame.width() as i32, frame.height() as i32),
//!     output_width: 640,
//!     output_height: 480,
//!     output_format: RGBA,
//!     transformation: Transformation::default(),
//! };
//! let mut rgba = vec![0; 640 * 480 * 4];
//! api.try_convert(access.frame_cache(), frame.handle(), &params, &mut rgba)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! This library uses `unsafe` code for the FFI calls into the bridge library
//! and to borrow frame memory owned by the runtime. All unsafe operations are
//! isolated in the `native` module and the `xr-frame-access-sys` crate.

pub mod access;
pub mod bridge;
pub mod capabilities;
pub mod convert;
pub mod downsample;
pub mod error;
pub mod frame;
pub mod image;
pub mod native;
pub mod pose;
pub mod stitch;

pub use access::FrameAccess;
pub use bridge::{CameraBridge, CameraHandle, FrameConfiguration, FrameHandle, XrResult};
pub use convert::{ConversionParams, CpuImageApi, Transformation};
pub use error::{Error, Result};
pub use frame::{FrameCache, YuvFrame};
pub use native::NativeBridge;
pub use pose::Pose;

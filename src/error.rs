// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    bridge::{FrameHandle, PlaneType, XrResult},
    image::FourCC,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} method not found")]
    MissingEntryPoint(&'static str),

    #[error("{call} failed: {result}")]
    Runtime {
        call: &'static str,
        result: XrResult,
    },

    #[error("camera permission not granted")]
    PermissionDenied,

    #[error("camera set {0:?} not found")]
    CameraSetNotFound(String),

    #[error("no frame has been extracted")]
    NoFrame,

    /// Pixel data of a frame was read after the frame cache disposed it.
    #[error("cannot access already disposed frame data")]
    FrameDisposed,

    #[error("frame handle {0} is not valid, the frame might have expired")]
    InvalidHandle(FrameHandle),

    #[error("sensor {sensor} buffer has no {plane} plane")]
    MissingPlane { sensor: usize, plane: PlaneType },

    #[error("no sensor properties for frame buffer {0}")]
    MissingSensorProperties(usize),

    #[error("frame buffer {0} memory is not mapped")]
    BufferUnavailable(usize),

    #[error("sample at byte {offset} outside frame buffer {sensor} of {len} bytes")]
    SourceOutOfBounds {
        sensor: usize,
        offset: usize,
        len: usize,
    },

    #[error("unsupported conversion from {input} to {output}")]
    UnsupportedFormat { input: FourCC, output: FourCC },

    #[error("unsupported image format {0}")]
    UnsupportedImageFormat(FourCC),

    #[error("invalid plane index {0}")]
    InvalidPlane(usize),

    #[error("invalid dimensions {0}x{1}")]
    InvalidDimensions(i32, i32),

    #[error("input rectangle {x},{y} {width}x{height} outside {frame_width}x{frame_height} frame")]
    InvalidRect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        frame_width: u32,
        frame_height: u32,
    },

    #[error("destination buffer too small: expected {expected}, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("failed to load frame access library: {0}")]
    Library(#[from] xr_frame_access_sys::LoadError),

    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] turbojpeg::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Stitched YUV420 frame and the cache that owns its memory.

use crate::{
    bridge::{FrameConfiguration, FrameFormat, FrameHandle},
    error::{Error, Result},
};
use tracing::{debug, warn};

/// Size of the luma plane of a `width`x`height` frame.
pub fn y_plane_len(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// Row stride of the interleaved chroma plane; odd widths round up.
pub fn uv_row_stride(width: u32) -> usize {
    width.div_ceil(2) as usize * 2
}

/// Size of the interleaved chroma plane; odd dimensions round up.
pub fn uv_plane_len(width: u32, height: u32) -> usize {
    uv_row_stride(width) * height.div_ceil(2) as usize
}

/// Stitched semi-planar YUV420 frame.
///
/// The planes can be read until the frame is disposed; afterwards the plane
/// accessors return [`Error::FrameDisposed`].
#[derive(Debug)]
pub struct YuvFrame {
    handle: FrameHandle,
    timestamp: i64,
    format: FrameFormat,
    width: u32,
    height: u32,
    y_plane: Vec<u8>,
    uv_plane: Vec<u8>,
    valid: bool,
}

impl YuvFrame {
    /// Wraps plane buffers sized by [`y_plane_len`] and [`uv_plane_len`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if a plane does not match the
    /// dimensions.
    pub fn new(
        handle: FrameHandle,
        timestamp: i64,
        format: FrameFormat,
        width: u32,
        height: u32,
        y_plane: Vec<u8>,
        uv_plane: Vec<u8>,
    ) -> Result<Self> {
        if y_plane.len() != y_plane_len(width, height)
            || uv_plane.len() != uv_plane_len(width, height)
        {
            return Err(Error::InvalidDimensions(width as i32, height as i32));
        }
        Ok(Self {
            handle,
            timestamp,
            format,
            width,
            height,
            y_plane,
            uv_plane,
            valid: true,
        })
    }

    pub fn handle(&self) -> FrameHandle {
        self.handle
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn uv_row_stride(&self) -> usize {
        uv_row_stride(self.width)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn y_plane(&self) -> Result<&[u8]> {
        if !self.valid {
            return Err(Error::FrameDisposed);
        }
        Ok(&self.y_plane)
    }

    pub fn uv_plane(&self) -> Result<&[u8]> {
        if !self.valid {
            return Err(Error::FrameDisposed);
        }
        Ok(&self.uv_plane)
    }

    /// Frees both planes. Returns `false` and frees nothing if the frame was
    /// already disposed.
    pub fn dispose(&mut self) -> bool {
        if !self.valid {
            debug!("skipped disposing frame {}: already disposed", self.handle);
            return false;
        }
        self.y_plane = Vec::new();
        self.uv_plane = Vec::new();
        self.valid = false;
        debug!("frame {} disposed", self.handle);
        true
    }

    fn into_planes(self) -> Option<(Vec<u8>, Vec<u8>)> {
        self.valid.then_some((self.y_plane, self.uv_plane))
    }
}

/// Owner of the stitched frame.
///
/// Remembers the frame configuration and downsampling factor the planes were
/// allocated for, so the next frame reuses them when neither changed.
#[derive(Debug, Default)]
pub struct FrameCache {
    frame: Option<YuvFrame>,
    allocation: Option<(FrameConfiguration, u32)>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding `frame`, with no allocation key recorded.
    pub fn with_frame(frame: YuvFrame) -> Self {
        Self {
            frame: Some(frame),
            allocation: None,
        }
    }

    /// Cached frame, valid or disposed.
    pub fn frame(&self) -> Option<&YuvFrame> {
        self.frame.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.frame.as_ref().is_some_and(YuvFrame::is_valid)
    }

    /// The cache holds valid planes for `handle`.
    pub fn holds(&self, handle: FrameHandle) -> bool {
        self.frame
            .as_ref()
            .is_some_and(|f| f.is_valid() && f.handle() == handle)
    }

    /// Planes of the cached frame can be overwritten for a frame of
    /// `config` at `factor`.
    pub fn can_reuse(&self, config: &FrameConfiguration, factor: u32) -> bool {
        self.is_valid()
            && self
                .allocation
                .as_ref()
                .is_some_and(|(c, f)| c == config && *f == factor)
    }

    /// Disposes the cached frame. Idempotent.
    pub fn clear(&mut self) {
        match self.frame.as_mut() {
            None => warn!("could not dispose of frame that doesn't exist"),
            Some(frame) => {
                frame.dispose();
            }
        }
    }

    pub(crate) fn record_allocation(&mut self, config: &FrameConfiguration, factor: u32) {
        self.allocation = Some((config.clone(), factor));
    }

    /// Forces the next frame to allocate fresh planes.
    pub(crate) fn forget_allocation(&mut self) {
        self.allocation = None;
    }

    /// Moves the planes of a valid cached frame out for rewriting.
    pub(crate) fn take_planes(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        self.frame.take().and_then(YuvFrame::into_planes)
    }

    pub(crate) fn store(&mut self, frame: YuvFrame) {
        self.frame = Some(frame);
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! CPU conversion of the stitched YUV420 frame into RGB images.
//!
//! Conversion resamples a sub-rectangle of the cached frame with nearest
//! neighbour sampling and writes it in one of the
//! [`SUPPORTED_OUTPUT_FORMATS`]. The source frame is only borrowed for the
//! duration of a call; it stays owned by the [`FrameCache`].

use crate::{
    bridge::{FrameFormat, FrameHandle},
    capabilities::DeviceCapabilities,
    error::{Error, Result},
    frame::{FrameCache, YuvFrame},
    image::{bytes_per_pixel, FourCC, Rect, BGRA, NV12, NV21, RGB3, RGBA},
};
use std::mem::swap;
use tracing::{error, instrument, trace};

pub const SUPPORTED_INPUT_FORMATS: [FourCC; 2] = [NV12, NV21];
pub const SUPPORTED_OUTPUT_FORMATS: [FourCC; 3] = [RGB3, RGBA, BGRA];

/// Mirroring applied while writing the destination image.
///
/// With both flags cleared the image is written bottom-up, so the top-left
/// source sample lands at the bottom-left destination pixel. `mirror_x`
/// writes rows top-down instead and `mirror_y` writes columns right to left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transformation {
    pub mirror_x: bool,
    pub mirror_y: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionParams {
    /// Region of the source frame to sample.
    pub input_rect: Rect,
    pub output_width: i32,
    pub output_height: i32,
    pub output_format: FourCC,
    pub transformation: Transformation,
}

/// Read-only view of one plane of the cached frame.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub row_stride: usize,
    pub pixel_stride: usize,
}

/// BT.601 conversion of one sample with chroma already centred on zero.
pub fn yuv_to_rgb(y: i32, u: i32, v: i32) -> [u8; 3] {
    let (y, u, v) = (y as f32, u as f32, v as f32);
    let r = y + 1.370705 * v;
    let g = y - 0.698001 * v - 0.337633 * u;
    let b = y + 1.732446 * u;
    [
        r.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        b.clamp(0.0, 255.0) as u8,
    ]
}

fn write_pixel(format: FourCC, [r, g, b]: [u8; 3], dst: &mut [u8]) {
    match format {
        RGB3 => dst.copy_from_slice(&[r, g, b]),
        RGBA => dst.copy_from_slice(&[r, g, b, 255]),
        BGRA => dst.copy_from_slice(&[b, g, r, 255]),
        _ => {}
    }
}

/// Source sample for destination index `index` out of `len`, that is
/// `start + floor(extent * index / len)`.
fn source_index(start: i32, extent: i32, index: usize, len: usize) -> usize {
    let offset = extent as i64 * index as i64 / len as i64;
    (start as i64 + offset) as usize
}

/// Conversion API over the frame cache.
///
/// Every operation takes the frame handle the caller believes is cached and
/// fails unless it matches the frame currently held by the cache.
#[derive(Debug, Clone, Default)]
pub struct CpuImageApi {
    swap_chroma: bool,
}

impl CpuImageApi {
    pub fn new(capabilities: &dyn DeviceCapabilities) -> Self {
        Self {
            swap_chroma: capabilities.swaps_chroma(),
        }
    }

    pub fn swaps_chroma(&self) -> bool {
        self.swap_chroma
    }

    /// `handle` names the frame the cache currently holds valid planes for.
    pub fn native_handle_valid(&self, cache: &FrameCache, handle: FrameHandle) -> bool {
        cache.holds(handle)
    }

    pub fn format_supported(&self, input: FourCC, output: FourCC) -> bool {
        SUPPORTED_INPUT_FORMATS.contains(&input) && SUPPORTED_OUTPUT_FORMATS.contains(&output)
    }

    fn frame<'a>(&self, cache: &'a FrameCache, handle: FrameHandle) -> Result<&'a YuvFrame> {
        let Some(frame) = cache.frame() else {
            error!("no frame cached for handle {}", handle);
            return Err(Error::NoFrame);
        };
        if frame.handle() != handle {
            error!("frame handle {} is not the cached frame {}", handle, frame.handle());
            return Err(Error::InvalidHandle(handle));
        }
        if !frame.is_valid() {
            error!("frame {} already disposed", handle);
            return Err(Error::FrameDisposed);
        }
        Ok(frame)
    }

    fn check_format(&self, frame: &YuvFrame, output: FourCC) -> Result<()> {
        let input = frame.format().fourcc();
        if !self.format_supported(input, output) {
            error!("unsupported conversion from {} to {}", input, output);
            return Err(Error::UnsupportedFormat { input, output });
        }
        Ok(())
    }

    /// Plane 0 is luma, plane 1 the interleaved chroma.
    pub fn try_get_plane<'a>(
        &self,
        cache: &'a FrameCache,
        handle: FrameHandle,
        index: usize,
    ) -> Result<Plane<'a>> {
        let frame = self.frame(cache, handle)?;
        match index {
            0 => Ok(Plane {
                data: frame.y_plane()?,
                row_stride: frame.width() as usize,
                pixel_stride: 1,
            }),
            1 => Ok(Plane {
                data: frame.uv_plane()?,
                row_stride: frame.uv_row_stride(),
                pixel_stride: 2,
            }),
            _ => Err(Error::InvalidPlane(index)),
        }
    }

    /// Size in bytes of a `width`x`height` image in `format`.
    pub fn converted_data_size(
        &self,
        cache: &FrameCache,
        handle: FrameHandle,
        width: i32,
        height: i32,
        format: FourCC,
    ) -> Result<usize> {
        let frame = self.frame(cache, handle)?;
        self.check_format(frame, format)?;
        if width < 0 || height < 0 {
            return Err(Error::InvalidDimensions(width, height));
        }
        let bpp = bytes_per_pixel(format).ok_or(Error::UnsupportedFormat {
            input: frame.format().fourcc(),
            output: format,
        })?;
        Ok(width as usize * height as usize * bpp)
    }

    /// Converts the cached frame into `dst` and returns the number of bytes
    /// written. `dst` is left untouched on failure.
    #[instrument(skip(self, cache, dst))]
    pub fn try_convert(
        &self,
        cache: &FrameCache,
        handle: FrameHandle,
        params: &ConversionParams,
        dst: &mut [u8],
    ) -> Result<usize> {
        let frame = self.frame(cache, handle)?;
        self.check_format(frame, params.output_format)?;
        let y_plane = frame.y_plane()?;
        let uv_plane = frame.uv_plane()?;

        if params.output_width <= 0 || params.output_height <= 0 {
            error!(
                "invalid output dimensions {}x{}",
                params.output_width, params.output_height
            );
            return Err(Error::InvalidDimensions(
                params.output_width,
                params.output_height,
            ));
        }

        let rect = params.input_rect;
        let (frame_width, frame_height) = (frame.width(), frame.height());
        if rect.x < 0
            || rect.y < 0
            || rect.width <= 0
            || rect.height <= 0
            || rect.x as i64 + rect.width as i64 > frame_width as i64
            || rect.y as i64 + rect.height as i64 > frame_height as i64
        {
            error!("input rectangle {:?} outside {}x{} frame", rect, frame_width, frame_height);
            return Err(Error::InvalidRect {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                frame_width,
                frame_height,
            });
        }

        let size = self.converted_data_size(
            cache,
            handle,
            params.output_width,
            params.output_height,
            params.output_format,
        )?;
        if dst.len() < size {
            error!("destination buffer too small: expected {}, got {}", size, dst.len());
            return Err(Error::BufferTooSmall {
                expected: size,
                actual: dst.len(),
            });
        }

        let bpp = size / (params.output_width as usize * params.output_height as usize);
        let (width, height) = (params.output_width as usize, params.output_height as usize);
        let y_stride = frame_width as usize;
        let uv_stride = frame.uv_row_stride();
        let swap_chroma = (frame.format() == FrameFormat::Yuv420Nv21) ^ self.swap_chroma;
        let Transformation { mirror_x, mirror_y } = params.transformation;

        for row in 0..height {
            let src_row = source_index(rect.y, rect.height, row, height);
            let dst_row = if mirror_x { row } else { height - row - 1 };

            for col in 0..width {
                let src_col = source_index(rect.x, rect.width, col, width);
                let dst_col = if mirror_y { width - col - 1 } else { col };

                let y = y_plane[src_row * y_stride + src_col] as i32;
                let uv = (src_row / 2) * uv_stride + (src_col / 2) * 2;
                let mut u = uv_plane[uv] as i32 - 128;
                let mut v = uv_plane[uv + 1] as i32 - 128;
                if swap_chroma {
                    swap(&mut u, &mut v);
                }

                let offset = (dst_row * width + dst_col) * bpp;
                write_pixel(
                    params.output_format,
                    yuv_to_rgb(y, u, v),
                    &mut dst[offset..offset + bpp],
                );
            }
        }

        trace!(
            "converted frame {} to {}x{} {}",
            handle,
            width,
            height,
            params.output_format
        );
        Ok(size)
    }

    /// Converted images do not own source memory, so there is nothing to
    /// free.
    pub fn dispose_image(&self, _handle: FrameHandle) {}
}

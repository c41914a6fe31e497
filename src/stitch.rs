// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Stitches per-sensor YUV420 buffers side by side into one downsampled frame.
//!
//! Sensor `i` occupies the columns after the downsampled widths of sensors
//! `0..i`. Downsampling is nearest-neighbour: every `factor`-th sample of each
//! axis is copied, nothing is filtered.

use crate::{
    bridge::{FrameBuffer, FrameConfiguration, FrameData, PlaneType, SensorProperties},
    error::{Error, Result},
    frame::{uv_plane_len, uv_row_stride, y_plane_len, FrameCache, YuvFrame},
};
use tracing::{debug, error, warn};

/// One sensor's raw bytes, borrowed from the bridge for the duration of the
/// frame access, plus the plane layout describing them.
#[derive(Copy, Clone, Debug)]
pub struct SensorBuffer<'a> {
    pub data: &'a [u8],
    pub descriptor: &'a FrameBuffer,
}

#[derive(Copy, Clone, Debug)]
pub struct StitchRequest<'a> {
    pub config: &'a FrameConfiguration,
    pub frame: &'a FrameData,
    pub sensors: &'a [SensorProperties],
    pub factor: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct SensorLayout {
    /// Downsampled size of the sensor image.
    width: usize,
    height: usize,
    /// First luma column of the sensor in the stitched frame.
    base_col: usize,
    /// First chroma pair of the sensor in the stitched frame.
    chroma_base: usize,
}

/// Stitched dimensions and per-sensor placement.
fn layout(
    request: &StitchRequest<'_>,
    sensor_count: usize,
) -> Result<(u32, u32, Vec<SensorLayout>)> {
    let factor = request.factor.max(1);
    let height = request.config.dimensions.height / factor;
    let mut layouts = Vec::with_capacity(sensor_count);
    let mut base_col = 0;
    let mut chroma_base = 0;

    for i in 0..sensor_count {
        let sensor = request
            .sensors
            .get(i)
            .ok_or(Error::MissingSensorProperties(i))?;
        let width = (sensor.image_dimensions.width / factor) as usize;
        let sensor_height = (sensor.image_dimensions.height / factor).min(height) as usize;
        layouts.push(SensorLayout {
            width,
            height: sensor_height,
            base_col,
            chroma_base,
        });
        base_col += width;
        chroma_base += width / 2;
    }

    Ok((base_col as u32, height, layouts))
}

/// Produces the stitched frame for `request` in `cache`.
///
/// Planes are overwritten in place when the cache was allocated for the same
/// frame configuration and factor, and reallocated otherwise. On failure the
/// planes are freed and the cache forgets its allocation, so the next frame
/// allocates fresh planes instead of trusting partially written ones.
pub fn stitch(
    cache: &mut FrameCache,
    request: &StitchRequest<'_>,
    buffers: &[SensorBuffer<'_>],
) -> Result<()> {
    if cache.holds(request.frame.handle) {
        warn!("frame {} already extracted", request.frame.handle);
        return Ok(());
    }

    let factor = request.factor.max(1);
    let (width, height, layouts) = layout(request, buffers.len())?;
    let y_len = y_plane_len(width, height);
    let uv_len = uv_plane_len(width, height);

    let reused = if cache.can_reuse(request.config, factor) {
        cache
            .take_planes()
            .filter(|(y, uv)| y.len() == y_len && uv.len() == uv_len)
    } else {
        None
    };
    let (mut y_plane, mut uv_plane) = match reused {
        Some(planes) => planes,
        None => {
            debug!("re-allocating frame cache for {}x{}", width, height);
            if cache.frame().is_some() {
                cache.clear();
            }
            (vec![0; y_len], vec![0; uv_len])
        }
    };

    let copied = buffers
        .iter()
        .zip(&layouts)
        .enumerate()
        .try_for_each(|(i, (buffer, layout))| {
            copy_sensor(
                i,
                buffer,
                &request.sensors[i],
                layout,
                factor as usize,
                width as usize,
                &mut y_plane,
                &mut uv_plane,
            )
        });

    if let Err(e) = copied {
        error!("failed to extract frame {}: {}", request.frame.handle, e);
        drop(y_plane);
        drop(uv_plane);
        cache.forget_allocation();
        return Err(e);
    }

    let frame = YuvFrame::new(
        request.frame.handle,
        request.frame.timestamp,
        request.frame.format,
        width,
        height,
        y_plane,
        uv_plane,
    )?;
    cache.store(frame);
    cache.record_allocation(request.config, factor);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn copy_sensor(
    index: usize,
    buffer: &SensorBuffer<'_>,
    sensor: &SensorProperties,
    layout: &SensorLayout,
    factor: usize,
    width: usize,
    y_plane: &mut [u8],
    uv_plane: &mut [u8],
) -> Result<()> {
    let y = buffer
        .descriptor
        .plane(PlaneType::Y)
        .ok_or(Error::MissingPlane {
            sensor: index,
            plane: PlaneType::Y,
        })?;
    let uv = buffer
        .descriptor
        .plane(PlaneType::Uv)
        .ok_or(Error::MissingPlane {
            sensor: index,
            plane: PlaneType::Uv,
        })?;

    let sample = |offset: usize| -> Result<u8> {
        buffer
            .data
            .get(offset)
            .copied()
            .ok_or(Error::SourceOutOfBounds {
                sensor: index,
                offset,
                len: buffer.data.len(),
            })
    };

    let offset_x = sensor.image_offset.x as usize;
    let offset_y = sensor.image_offset.y as usize;

    let (y_offset, y_stride) = (y.offset as usize, y.stride as usize);
    for row in 0..layout.height {
        let dst_row = row * width + layout.base_col;
        let src_row = y_offset + (offset_y + row * factor) * y_stride + offset_x;
        for col in 0..layout.width {
            y_plane[dst_row + col] = sample(src_row + col * factor)?;
        }
    }

    let (uv_offset, uv_stride) = (uv.offset as usize, uv.stride as usize);
    let dst_stride = uv_row_stride(width as u32);
    for row in 0..layout.height.div_ceil(2) {
        let src_row = uv_offset + (offset_y / 2 + row * factor) * uv_stride + offset_x / 2;
        for col in 0..layout.width.div_ceil(2) {
            let src = src_row + 2 * col * factor;
            let dst = row * dst_stride + (layout.chroma_base + col) * 2;
            uv_plane[dst] = sample(src)?;
            uv_plane[dst + 1] = sample(src + 1)?;
        }
    }

    Ok(())
}

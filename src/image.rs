// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::error::{Error, Result};
use core::fmt;
use turbojpeg::OwnedBuf;

/// Four character pixel format code.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for b in self.0 {
            let c = if b.is_ascii_graphic() { b as char } else { '.' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

/// RGB 24-bit pixel format (8 bits per channel, no alpha)
pub const RGB3: FourCC = FourCC(*b"RGB3");

/// RGBX 32-bit pixel format (8 bits per channel, unused alpha)
pub const RGBX: FourCC = FourCC(*b"RGBX");

/// RGBA 32-bit pixel format (8 bits per channel, with alpha)
pub const RGBA: FourCC = FourCC(*b"RGBA");

/// BGRA 32-bit pixel format (8 bits per channel, with alpha)
pub const BGRA: FourCC = FourCC(*b"BGRA");

/// YUYV 4:2:2 YUV packed format (common camera output format)
pub const YUYV: FourCC = FourCC(*b"YUYV");

/// NV12 4:2:0 YUV semi-planar format, chroma stored as U,V pairs
pub const NV12: FourCC = FourCC(*b"NV12");

/// NV21 4:2:0 YUV semi-planar format, chroma stored as V,U pairs
pub const NV21: FourCC = FourCC(*b"NV21");

/// Region of a frame sampled by a conversion.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: i32,
    /// Y coordinate of top-left corner
    pub y: i32,
    /// Width of the rectangle in pixels
    pub width: i32,
    /// Height of the rectangle in pixels
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Bytes per pixel of the packed RGB-family formats, `None` for anything
/// else.
pub const fn bytes_per_pixel(format: FourCC) -> Option<usize> {
    match format {
        RGB3 => Some(3),
        RGBX | RGBA | BGRA => Some(4),
        _ => None,
    }
}

/// CPU image buffer holding packed RGB-family pixels.
///
/// # Example
///
/// ```
/// use xr_frame_access::image::{Image, RGBA};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = Image::new(1280, 720, RGBA)?;
///
/// assert_eq!(img.width(), 1280);
/// assert_eq!(img.height(), 720);
/// assert_eq!(img.size(), 1280 * 720 * 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Image {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: FourCC,
}

impl Image {
    /// Allocates a zeroed image.
    ///
    /// # Errors
    ///
    /// Returns an error if `format` is not a packed RGB-family format.
    pub fn new(width: u32, height: u32, format: FourCC) -> Result<Self> {
        let bpp = bytes_per_pixel(format).ok_or(Error::UnsupportedImageFormat(format))?;
        Ok(Self {
            data: vec![0; width as usize * height as usize * bpp],
            width,
            height,
            format,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> FourCC {
        self.format
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.format)
    }
}

/// Encodes an RGB-family image to JPEG format using turbojpeg.
///
/// Uses the turbojpeg library with SIMD optimizations for fast JPEG
/// compression.
///
/// # Errors
///
/// Returns an error if:
/// - The image format has no turbojpeg equivalent
/// - JPEG compression fails
///
/// # Example
///
/// ```no_run
/// use xr_frame_access::image::{encode_jpeg, Image, RGBA};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = Image::new(640, 480, RGBA)?;
/// let jpeg = encode_jpeg(&img)?;
/// println!("Compressed to {} bytes", jpeg.len());
/// # Ok(())
/// # }
/// ```
pub fn encode_jpeg(img: &Image) -> Result<OwnedBuf> {
    let (format, bpp) = match img.format() {
        RGB3 => (turbojpeg::PixelFormat::RGB, 3),
        RGBA => (turbojpeg::PixelFormat::RGBA, 4),
        RGBX => (turbojpeg::PixelFormat::RGBX, 4),
        BGRA => (turbojpeg::PixelFormat::BGRA, 4),
        other => return Err(Error::UnsupportedImageFormat(other)),
    };

    let image = turbojpeg::Image {
        width: img.width() as usize,
        height: img.height() as usize,
        format,
        pixels: img.as_slice(),
        pitch: img.width() as usize * bpp,
    };

    Ok(turbojpeg::compress(image, 95, turbojpeg::Subsamp::Sub2x2)?)
}

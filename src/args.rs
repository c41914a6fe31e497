// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use clap::Parser;
use std::path::PathBuf;
use xr_frame_access::{
    downsample::DEFAULT_MAX_VERTICAL_RESOLUTION,
    image::{FourCC, BGRA, RGB3, RGBA},
    Transformation,
};

/// Converted image mirroring options.
///
/// With `none` the image is written bottom-up, as consumers of the native
/// texture layout expect, so it reads upside down as a plain raster. Each
/// option flips relative to that layout.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum MirrorSetting {
    /// Bottom-up rows, left-to-right columns
    None,
    /// Reverse the columns (sets `mirror_y`)
    Horizontal,
    /// Reverse the rows (sets `mirror_x`), giving an upright raster
    Vertical,
    /// Reverse both (sets `mirror_x` and `mirror_y`)
    Both,
}

impl From<MirrorSetting> for Transformation {
    fn from(mirror: MirrorSetting) -> Self {
        match mirror {
            MirrorSetting::None => Transformation::default(),
            MirrorSetting::Horizontal => Transformation {
                mirror_x: false,
                mirror_y: true,
            },
            MirrorSetting::Vertical => Transformation {
                mirror_x: true,
                mirror_y: false,
            },
            MirrorSetting::Both => Transformation {
                mirror_x: true,
                mirror_y: true,
            },
        }
    }
}

/// Pixel format of the converted images.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum OutputFormat {
    /// 24-bit RGB
    Rgb,
    /// 32-bit RGBA
    Rgba,
    /// 32-bit BGRA
    Bgra,
}

impl From<OutputFormat> for FourCC {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Rgb => RGB3,
            OutputFormat::Rgba => RGBA,
            OutputFormat::Bgra => BGRA,
        }
    }
}

/// Command-line arguments for the frame access pump.
///
/// Arguments can be specified via command line or environment variables.
///
/// # Example
///
/// ```bash
/// # List cameras and their frame configurations
/// xr-frame-access --library /system/lib64/libopenxr_loader.so --list
///
/// # Pump frames at 30 Hz, writing a JPEG of every converted frame
/// export CAMERA_SET=stereo
/// xr-frame-access --session 1 --space 2 --snapshot /sdcard/passthrough.jpg
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Shared library exporting the frame access extension
    #[arg(long, env = "XR_LIBRARY", default_value = "libopenxr_loader.so")]
    pub library: PathBuf,

    /// Running XR session handle of the host application
    #[arg(long, env = "XR_SESSION", default_value = "0")]
    pub session: u64,

    /// Reference space handle sensor poses are reported in
    #[arg(long, env = "XR_SPACE", default_value = "0")]
    pub space: u64,

    /// Camera set to activate, the first enumerated set when omitted
    #[arg(long, env = "CAMERA_SET")]
    pub camera_set: Option<String>,

    /// Frame configuration resolution name, the first supported configuration
    /// when omitted
    #[arg(long, env = "RESOLUTION")]
    pub resolution: Option<String>,

    /// Number of sensors to request per frame, the camera set's sensor count
    /// when omitted
    #[arg(long, env = "SENSOR_COUNT")]
    pub sensor_count: Option<u32>,

    /// Maximum height of the stitched frame in rows
    #[arg(
        long,
        env = "MAX_VERTICAL_RESOLUTION",
        default_value_t = DEFAULT_MAX_VERTICAL_RESOLUTION,
        value_parser = clap::value_parser!(u32).range(1..=2160)
    )]
    pub max_vertical_resolution: u32,

    /// Converted image pixel format
    #[arg(long, env = "OUTPUT_FORMAT", default_value = "rgba", value_enum)]
    pub output_format: OutputFormat,

    /// Converted image resolution in pixels (width height), the stitched
    /// frame size when omitted
    #[arg(long, env = "STREAM_SIZE", value_delimiter = ' ', num_args = 2)]
    pub stream_size: Option<Vec<u32>>,

    /// Converted image mirroring setting
    #[arg(long, env = "MIRROR", default_value = "none", value_enum)]
    pub mirror: MirrorSetting,

    /// Frame pump rate in Hz
    #[arg(long, env = "FPS", default_value = "30")]
    pub fps: u32,

    /// Stop after this many frames
    #[arg(long, env = "FRAMES")]
    pub frames: Option<u64>,

    /// Write each converted frame as JPEG to this path
    #[arg(long, env = "SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Device model string used to select device quirks
    #[arg(long, env = "DEVICE_MODEL", default_value = "")]
    pub device_model: String,

    /// Print cameras and frame configurations as JSON and exit
    #[arg(long)]
    pub list: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable Tracy profiler for performance analysis
    #[arg(long, env = "TRACY")]
    pub tracy: bool,
}

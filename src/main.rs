// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser;
use serde_json::json;
use std::{
    error::Error,
    fs,
    time::{Duration, Instant},
};
use tokio::{signal, time};
use tracing::{debug, error, info, info_span, warn};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, Layer, Registry};
use xr_frame_access::{
    bridge::CameraInfo,
    capabilities,
    image::{encode_jpeg, FourCC, Image, Rect},
    CameraBridge, CameraHandle, ConversionParams, CpuImageApi, FrameAccess, FrameConfiguration,
    NativeBridge,
};

fn init_tracing(args: &Args) -> Result<(), Box<dyn Error>> {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let stdout_log = tracing_subscriber::fmt::layer().with_filter(level);

    let journald = match tracing_journald::layer() {
        Ok(journald) => Some(journald.with_filter(level)),
        Err(_) => None,
    };

    let tracy = if args.tracy {
        tracy_client::Client::start();
        Some(tracing_tracy::TracyLayer::default().with_filter(LevelFilter::INFO))
    } else {
        None
    };

    let subscriber = Registry::default()
        .with(stdout_log)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

fn update_fps(prev: &mut Instant, history: &mut [f64], index: &mut usize) -> f64 {
    let now = Instant::now();
    let elapsed = now.duration_since(*prev);
    *prev = now;

    history[*index] = 1.0 / elapsed.as_secs_f64().max(f64::EPSILON);
    *index = (*index + 1) % history.len();

    history.iter().sum::<f64>() / history.len() as f64
}

fn list<B: CameraBridge>(access: &mut FrameAccess<B>) -> Result<(), Box<dyn Error>> {
    let cameras = access.enumerate_cameras()?.to_vec();
    let mut out = Vec::with_capacity(cameras.len());
    for camera in cameras {
        let configurations = access
            .supported_frame_configurations(&camera.camera_set)?
            .iter()
            .map(|c| {
                json!({
                    "format": c.format.to_string(),
                    "resolution": c.resolution_name,
                    "width": c.dimensions.width,
                    "height": c.dimensions.height,
                    "min_fps": c.min_fps,
                    "max_fps": c.max_fps,
                    "frame_buffers": c.frame_buffer_count,
                    "hardware_buffers": c.frame_hardware_buffer_count,
                })
            })
            .collect::<Vec<_>>();
        out.push(json!({
            "camera_set": camera.camera_set,
            "camera_type": camera.camera_type,
            "sensor_count": camera.sensor_count,
            "configurations": configurations,
        }));
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn select_camera<B: CameraBridge>(
    access: &mut FrameAccess<B>,
    camera_set: Option<&str>,
) -> Result<CameraInfo, Box<dyn Error>> {
    let cameras = access.enumerate_cameras()?;
    let camera = match camera_set {
        Some(name) => cameras.iter().find(|c| c.camera_set == name),
        None => cameras.first(),
    };
    match camera {
        Some(camera) => Ok(camera.clone()),
        None => Err(xr_frame_access::Error::CameraSetNotFound(
            camera_set.unwrap_or_default().to_string(),
        )
        .into()),
    }
}

fn select_configuration<B: CameraBridge>(
    access: &mut FrameAccess<B>,
    camera_set: &str,
    resolution: Option<&str>,
) -> Result<FrameConfiguration, Box<dyn Error>> {
    let configurations = access.supported_frame_configurations(camera_set)?;
    let config = match resolution {
        Some(name) => configurations
            .into_iter()
            .find(|c| c.resolution_name == name),
        None => configurations.into_iter().next(),
    };
    config.ok_or_else(|| {
        format!(
            "camera set {:?} has no frame configuration {:?}",
            camera_set,
            resolution.unwrap_or_default()
        )
        .into()
    })
}

async fn pump<B: CameraBridge>(
    access: &mut FrameAccess<B>,
    api: &CpuImageApi,
    camera: CameraHandle,
    config: &FrameConfiguration,
    sensor_count: u32,
    args: &Args,
) -> Result<(), Box<dyn Error>> {
    let format = FourCC::from(args.output_format);
    let mut interval = time::interval(Duration::from_secs_f64(1.0 / args.fps.max(1) as f64));
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut image: Option<Image> = None;
    let mut prev = Instant::now();
    let mut history = vec![0.0; 30];
    let mut index = 0;
    let mut count = 0u64;

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res?;
                info!("interrupted, stopping frame pump");
                return Ok(());
            }
            _ = interval.tick() => {}
        }

        let fps = update_fps(&mut prev, &mut history, &mut index);
        let _span = info_span!("tick", count).entered();

        if let Err(e) = access.access_frame(camera, config, sensor_count) {
            warn!("frame skipped: {}", e);
            continue;
        }
        let Some(frame) = access.frame_cache().frame() else {
            continue;
        };

        let (width, height) = match &args.stream_size {
            Some(size) => (size[0], size[1]),
            None => (frame.width(), frame.height()),
        };
        if image
            .as_ref()
            .map_or(true, |img| img.width() != width || img.height() != height)
        {
            image = Some(Image::new(width, height, format)?);
        }
        let Some(img) = image.as_mut() else {
            continue;
        };

        let params = ConversionParams {
            input_rect: Rect::new(0, 0, frame.width() as i32, frame.height() as i32),
            output_width: width as i32,
            output_height: height as i32,
            output_format: format,
            transformation: args.mirror.into(),
        };
        let now = Instant::now();
        if let Err(e) = api.try_convert(
            access.frame_cache(),
            frame.handle(),
            &params,
            img.as_slice_mut(),
        ) {
            error!("conversion of frame {} failed: {}", frame.handle(), e);
            continue;
        }
        let convert_time = now.elapsed();

        if let Some(path) = &args.snapshot {
            let jpeg = encode_jpeg(img)?;
            fs::write(path, &jpeg[..])?;
        }

        debug!(
            "frame {} stitched {}x{} image {} convert: {:?} fps: {:.1} pose: {:?}",
            frame.handle(),
            frame.width(),
            frame.height(),
            img,
            convert_time,
            fps,
            access.last_frame_pose(),
        );

        count += 1;
        if args.frames.is_some_and(|frames| count >= frames) {
            info!("processed {} frames", count);
            return Ok(());
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(&args)?;

    let device = capabilities::detect(&args.device_model);
    let bridge = NativeBridge::new(&args.library, args.session, args.space)?;
    let mut access = FrameAccess::new(bridge, device.as_ref())?;
    access.set_max_vertical_resolution(args.max_vertical_resolution);

    if args.list {
        return list(&mut access);
    }

    let camera = select_camera(&mut access, args.camera_set.as_deref())?;
    let config = select_configuration(&mut access, &camera.camera_set, args.resolution.as_deref())?;
    let sensor_count = args.sensor_count.unwrap_or(camera.sensor_count);
    info!(
        "opening camera set {:?} at {} {}x{} with {} sensors",
        camera.camera_set,
        config.resolution_name,
        config.dimensions.width,
        config.dimensions.height,
        sensor_count
    );

    let handle = access.create_camera_handle(&camera.camera_set)?;
    let api = CpuImageApi::new(device.as_ref());
    let result = pump(&mut access, &api, handle, &config, sensor_count, &args).await;

    if let Err(e) = access.release_frame() {
        warn!("failed to release frame on exit: {}", e);
    }
    access.clear_frame_cache();
    access.release_camera_handle(handle)?;
    result
}

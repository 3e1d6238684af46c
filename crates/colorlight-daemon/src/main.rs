//! ColorLight Matrix Daemon
//!
//! Polls a framebuffer source at a fixed rate and streams frames to a
//! ColorLight 5A-75B receiver card, so any application can drive the LED
//! wall by writing raw RGB data to a file, shared memory, or a
//! framebuffer device.

mod config;
mod source;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colorlight_hw::{ColorOrder, MatrixDevice};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, SourceKind};
use source::{FbSource, FileSource, FrameSource, ShmSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load configuration; with no path given, run on defaults.
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let config = Config::load(&path).context("failed to load configuration")?;
            info!("loaded configuration from {}", path);
            config
        }
        None => Config::default(),
    };

    let color_order: ColorOrder = config.color_order.parse()?;

    let mut frame_source = build_source(&config);
    frame_source
        .open()
        .context("failed to open frame source")?;

    let mut device = MatrixDevice::open(&config.interface, config.width, config.height)
        .context("failed to open matrix device")?;
    device.set_color_order(color_order);
    device.set_brightness(config.brightness);
    device.send_brightness_frame()?;

    info!(
        "daemon started: {}x{} on {}, {} fps, brightness {}",
        config.width, config.height, config.interface, config.fps, config.brightness
    );

    let frame_time = Duration::from_secs_f64(1.0 / config.fps.max(1) as f64);
    let mut ticker = tokio::time::interval(frame_time);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    let mut last_frame: Option<Vec<u8>> = None;
    let mut frames_sent: u64 = 0;
    let started = Instant::now();
    let mut last_stats = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match frame_source.next_frame() {
                    Ok(Some(frame)) => last_frame = Some(frame),
                    Ok(None) => {}
                    Err(e) => warn!("frame source read failed: {}", e),
                }

                if let Some(frame) = &last_frame {
                    device.send_frame(frame).context("frame transmission failed")?;
                    frames_sent += 1;
                }

                if last_stats.elapsed() >= Duration::from_secs(5) {
                    let fps = frames_sent as f64 / started.elapsed().as_secs_f64();
                    info!("{} frames sent ({:.1} fps)", frames_sent, fps);
                    last_stats = Instant::now();
                }
            }
            _ = tokio::signal::ctrl_c() => break,
            _ = sigterm.recv() => break,
        }
    }

    info!("shutting down, blanking display");
    device.clear((0, 0, 0))?;
    Ok(())
}

/// Builds the configured frame source. An unusable framebuffer device
/// falls back to the file source so the daemon still comes up.
fn build_source(config: &Config) -> Box<dyn FrameSource> {
    match config.source.kind {
        SourceKind::File => Box::new(FileSource::new(
            &config.source.file_path,
            config.width,
            config.height,
        )),
        SourceKind::Shm => Box::new(ShmSource::new(
            &config.source.shm_name,
            config.width,
            config.height,
        )),
        SourceKind::Fb => {
            let mut fb = FbSource::new(&config.source.fb_device, config.width, config.height);
            match fb.open() {
                Ok(()) => Box::new(fb),
                Err(e) => {
                    warn!(
                        "cannot open {}: {}; falling back to file source",
                        config.source.fb_device, e
                    );
                    Box::new(FileSource::new(
                        &config.source.file_path,
                        config.width,
                        config.height,
                    ))
                }
            }
        }
    }
}

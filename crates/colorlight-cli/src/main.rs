//! ColorLight Matrix Control Tool
//!
//! One-shot CLI for driving a 5A-75B receiver card: test patterns, solid
//! colors, images, receiver configuration, and `.rcvbp` file decoding.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colorlight_hw::{
    rcvbp, ColorOrder, Framebuffer, MatrixDevice, ReceiverSetup, Timing, DEFAULT_HEIGHT,
    DEFAULT_WIDTH,
};
use image::imageops::FilterType;
use serde_json::json;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum CliColorOrder {
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    #[default]
    Bgr,
}

impl From<CliColorOrder> for ColorOrder {
    fn from(order: CliColorOrder) -> Self {
        match order {
            CliColorOrder::Rgb => ColorOrder::Rgb,
            CliColorOrder::Rbg => ColorOrder::Rbg,
            CliColorOrder::Grb => ColorOrder::Grb,
            CliColorOrder::Gbr => ColorOrder::Gbr,
            CliColorOrder::Brg => ColorOrder::Brg,
            CliColorOrder::Bgr => ColorOrder::Bgr,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum FitMode {
    /// Stretch to the display dimensions
    #[default]
    Fill,
    /// Preserve aspect, letterbox on black
    Fit,
    /// Preserve aspect, cover and center-crop
    Crop,
}

#[derive(Parser)]
#[command(name = "colorlight")]
#[command(about = "ColorLight 5A-75B LED matrix control tool")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Network interface wired to the receiver card
    #[arg(short, long, default_value = "eth0")]
    interface: String,

    /// Total display width in pixels
    #[arg(short = 'W', long, default_value_t = DEFAULT_WIDTH)]
    width: u16,

    /// Total display height in pixels
    #[arg(short = 'H', long, default_value_t = DEFAULT_HEIGHT)]
    height: u16,

    /// Overall brightness (0-255)
    #[arg(short, long, default_value_t = 128)]
    brightness: u8,

    /// Panel color order; try others if colors look swapped
    #[arg(short, long, default_value = "bgr", value_enum)]
    color_order: CliColorOrder,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the color bar test pattern
    Test,
    /// Fill the display with a solid color
    Color {
        /// Color as R,G,B (e.g. 255,0,0)
        color: String,
    },
    /// Display an image file
    Image {
        path: String,

        /// How to fit the image to the display
        #[arg(long, default_value = "fill", value_enum)]
        fit: FitMode,
    },
    /// Send the full receiver configuration sequence
    Configure {
        /// Scan rate divisor
        #[arg(long, default_value_t = 16)]
        scan_mode: u8,

        /// Single module width
        #[arg(long, default_value_t = 64)]
        module_width: u8,

        /// Single module height
        #[arg(long, default_value_t = 32)]
        module_height: u8,

        /// Persist the configuration to flash (survives power cycles)
        #[arg(long)]
        save_flash: bool,
    },
    /// Send a discovery request (responses are not decoded)
    Discovery,
    /// Send a brightness frame without touching pixel data
    Brightness {
        /// Per-channel brightness as R,G,B
        #[arg(long)]
        rgb: Option<String>,
    },
    /// Write a frame to the daemon's framebuffer file (no socket needed)
    Feed {
        /// Backing file the daemon polls
        #[arg(long, default_value = "/run/ledmatrix.raw")]
        path: String,

        #[command(subcommand)]
        pattern: FeedPattern,
    },
    /// Print the display configuration without opening a socket
    Info,
    /// Decode a .rcvbp/.rcvp configuration file
    Decode {
        file: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FeedPattern {
    /// Blank the display
    Clear,
    /// Solid color as R,G,B
    Color { color: String },
    /// The color bar test pattern
    Test,
    /// Linear gradient between two colors
    Gradient {
        /// Start color as R,G,B
        from: String,

        /// End color as R,G,B
        to: String,

        /// Run top to bottom instead of left to right
        #[arg(long)]
        vertical: bool,
    },
    /// An image file
    Image {
        path: String,

        /// How to fit the image to the display
        #[arg(long, default_value = "fill", value_enum)]
        fit: FitMode,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    // Offline commands first; everything else needs the raw socket.
    match &cli.command {
        Commands::Info => return print_info(&cli),
        Commands::Decode { file, json } => return decode_file(file, *json),
        Commands::Feed { path, pattern } => return feed_frame(&cli, pattern, path),
        _ => {}
    }

    let mut device = MatrixDevice::open(&cli.interface, cli.width, cli.height)
        .context("failed to open matrix device")?;
    device.set_color_order(cli.color_order.into());
    device.set_brightness(cli.brightness);

    match cli.command {
        Commands::Test => {
            let mut fb = Framebuffer::new(cli.width, cli.height);
            fb.fill_color_bars();
            device.send_framebuffer(&fb)?;
            println!("test pattern sent");
        }
        Commands::Color { ref color } => {
            let (r, g, b) = parse_rgb(color)?;
            device.clear((r, g, b))?;
            println!("display filled with rgb({r}, {g}, {b})");
        }
        Commands::Image { ref path, fit } => {
            let rgb = load_image(path, cli.width, cli.height, fit)?;
            device.send_frame(&rgb)?;
            println!("displayed {path}");
        }
        Commands::Configure {
            scan_mode,
            module_width,
            module_height,
            save_flash,
        } => {
            if ![4, 8, 16, 32].contains(&scan_mode) {
                bail!("scan mode must be 4, 8, 16, or 32 (got {scan_mode})");
            }
            let setup = ReceiverSetup {
                width: cli.width,
                height: cli.height,
                scan_mode,
                module_width,
                module_height,
                save_to_flash: save_flash,
                ..ReceiverSetup::default()
            };
            device.configure(&setup, &Timing::default())?;
            if save_flash {
                println!("configuration saved to flash");
            } else {
                println!("configuration sent (volatile, lost on power cycle)");
            }
        }
        Commands::Discovery => {
            device.send_discovery()?;
            println!("discovery request sent");
        }
        Commands::Brightness { ref rgb } => {
            if let Some(rgb) = rgb {
                device.set_rgb_brightness(parse_rgb(rgb)?);
            }
            device.send_brightness_frame()?;
            println!("brightness frame sent");
        }
        Commands::Info | Commands::Decode { .. } | Commands::Feed { .. } => unreachable!(),
    }

    Ok(())
}

/// Renders a frame and writes it to the daemon's backing file, so the
/// display can be updated without raw socket privileges.
fn feed_frame(cli: &Cli, pattern: &FeedPattern, path: &str) -> Result<()> {
    let mut fb = Framebuffer::new(cli.width, cli.height);
    match pattern {
        FeedPattern::Clear => {}
        FeedPattern::Color { color } => fb.clear(parse_rgb(color)?),
        FeedPattern::Test => fb.fill_color_bars(),
        FeedPattern::Gradient { from, to, vertical } => {
            fb.fill_gradient(parse_rgb(from)?, parse_rgb(to)?, *vertical)
        }
        FeedPattern::Image { path: image, fit } => {
            fb.copy_from_rgb8(&load_image(image, cli.width, cli.height, *fit)?)?
        }
    }
    std::fs::write(path, fb.data()).with_context(|| format!("failed to write {path}"))?;
    println!("frame written to {path}");
    Ok(())
}

fn parse_rgb(s: &str) -> Result<(u8, u8, u8)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        bail!("expected R,G,B (e.g. 255,0,0), got {s:?}");
    }
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .with_context(|| format!("invalid channel value {part:?}"))?;
    }
    Ok((rgb[0], rgb[1], rgb[2]))
}

/// Loads an image and fits it to the display, returning packed RGB bytes.
fn load_image(path: &str, width: u16, height: u16, fit: FitMode) -> Result<Vec<u8>> {
    let (w, h) = (u32::from(width), u32::from(height));
    let img = image::open(path).with_context(|| format!("failed to load {path}"))?;

    let rgb = match fit {
        FitMode::Fill => img.resize_exact(w, h, FilterType::Lanczos3).to_rgb8(),
        FitMode::Fit => {
            let scaled = img.resize(w, h, FilterType::Lanczos3).to_rgb8();
            let mut canvas = image::RgbImage::new(w, h);
            let x = i64::from((w - scaled.width()) / 2);
            let y = i64::from((h - scaled.height()) / 2);
            image::imageops::replace(&mut canvas, &scaled, x, y);
            canvas
        }
        FitMode::Crop => img.resize_to_fill(w, h, FilterType::Lanczos3).to_rgb8(),
    };

    Ok(rgb.into_raw())
}

fn print_info(cli: &Cli) -> Result<()> {
    let pixels = u64::from(cli.width) * u64::from(cli.height);
    let frame_bytes = pixels * 3;
    println!("display configuration:");
    println!("  resolution:   {} x {} pixels", cli.width, cli.height);
    println!("  total pixels: {pixels}");
    println!("  frame size:   {frame_bytes} bytes (RGB)");
    println!(
        "  bandwidth:    {:.1} MB/s at 60 fps",
        frame_bytes as f64 * 60.0 / 1_000_000.0
    );
    println!("  interface:    {}", cli.interface);
    println!("  color order:  {}", ColorOrder::from(cli.color_order));
    Ok(())
}

fn decode_file(path: &str, as_json: bool) -> Result<()> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {path}"))?;

    let config = match rcvbp::decode(&raw) {
        Ok(config) => config,
        Err(err @ colorlight_hw::Error::Decompress { .. }) => {
            warn!("{err}; retrying with the file treated as uncompressed");
            rcvbp::decode_raw_fallback(&raw)
        }
        Err(err) => return Err(err.into()),
    };

    if as_json {
        let value = json!({
            "module_width": config.module_width,
            "module_height": config.module_height,
            "cabinet_width": config.cabinet_width,
            "cabinet_height": config.cabinet_height,
            "scan_mode": config.scan_mode,
            "scan_rate": config.scan_rate().to_string(),
            "cascade_direction": config.cascade_direction,
            "cascade": config.cascade().to_string(),
            "gamma": config.gamma,
            "white_balance": {
                "r": config.white_balance[0],
                "g": config.white_balance[1],
                "b": config.white_balance[2],
            },
            "color_exchange": {
                "r": config.color_exchange[0],
                "g": config.color_exchange[1],
                "b": config.color_exchange[2],
                "order": config.color_order().to_string(),
            },
            "data_polarity_reversed": config.is_polarity_reversed(),
            "brightness_percent": config.brightness_percent,
            "brightness_level": config.brightness_level,
            "min_oe_ns": config.min_oe_ns,
            "grayscale_mode": config.grayscale().to_string(),
            "grayscale_max": config.grayscale_max,
            "grayscale_refinement": config.grayscale_refinement != 0,
            "decoder_ic": config.decoder_ic,
            "compressed": config.compressed,
            "raw_size": config.raw_size,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("panel configuration: {path}");
    println!(
        "  file:          {} bytes, {}",
        config.raw_size,
        if config.compressed { "compressed" } else { "raw" }
    );
    println!(
        "  module:        {}x{} pixels",
        config.module_width, config.module_height
    );
    println!(
        "  cabinet:       {}x{} pixels",
        config.cabinet_width, config.cabinet_height
    );
    println!("  scan rate:     {}", config.scan_rate());
    println!("  cascade:       {}", config.cascade());
    println!("  gamma:         {:.2}", config.gamma);
    println!(
        "  white balance: R={} G={} B={}",
        config.white_balance[0], config.white_balance[1], config.white_balance[2]
    );
    println!("  color order:   {}", config.color_order());
    println!(
        "  polarity:      {}",
        if config.is_polarity_reversed() { "reversed" } else { "normal" }
    );
    println!(
        "  brightness:    level {} ({}%)",
        config.brightness_level, config.brightness_percent
    );
    println!("  min OE:        {:.2} ns", config.min_oe_ns);
    println!(
        "  grayscale:     {} (max {}, refinement {})",
        config.grayscale(),
        config.grayscale_max,
        if config.grayscale_refinement != 0 { "on" } else { "off" }
    );
    println!("  decoder IC:    {:#04x}", config.decoder_ic);
    Ok(())
}

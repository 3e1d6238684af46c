//! Configuration management.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Network interface wired to the receiver card
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Total display width in pixels
    #[serde(default = "default_width")]
    pub width: u16,

    /// Total display height in pixels
    #[serde(default = "default_height")]
    pub height: u16,

    /// Target frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Overall brightness (0-255)
    #[serde(default = "default_brightness")]
    pub brightness: u8,

    /// Panel color order (RGB, RBG, GRB, GBR, BRG, BGR)
    #[serde(default = "default_color_order")]
    pub color_order: String,

    /// Frame source configuration
    #[serde(default)]
    pub source: SourceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            brightness: default_brightness(),
            color_order: default_color_order(),
            source: SourceConfig::default(),
        }
    }
}

/// Frame source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Where frames come from
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,

    /// Backing file for the `file` source
    #[serde(default = "default_file_path")]
    pub file_path: String,

    /// Shared memory name for the `shm` source (under /dev/shm)
    #[serde(default = "default_shm_name")]
    pub shm_name: String,

    /// Framebuffer device for the `fb` source
    #[serde(default = "default_fb_device")]
    pub fb_device: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            file_path: default_file_path(),
            shm_name: default_shm_name(),
            fb_device: default_fb_device(),
        }
    }
}

/// Frame source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Plain file any application can write to
    File,
    /// POSIX shared memory, read every tick
    Shm,
    /// Linux framebuffer device
    Fb,
}

// Default value functions
fn default_interface() -> String {
    "eth0".to_string()
}

fn default_width() -> u16 {
    colorlight_hw::DEFAULT_WIDTH
}

fn default_height() -> u16 {
    colorlight_hw::DEFAULT_HEIGHT
}

fn default_fps() -> u32 {
    60
}

fn default_brightness() -> u8 {
    128
}

fn default_color_order() -> String {
    "BGR".to_string()
}

fn default_source_kind() -> SourceKind {
    SourceKind::File
}

fn default_file_path() -> String {
    "/run/ledmatrix.raw".to_string()
}

fn default_shm_name() -> String {
    "ledmatrix".to_string()
}

fn default_fb_device() -> String {
    "/dev/fb1".to_string()
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.interface, "eth0");
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 128);
        assert_eq!(config.fps, 60);
        assert_eq!(config.brightness, 128);
        assert_eq!(config.color_order, "BGR");
        assert_eq!(config.source.kind, SourceKind::File);
        assert_eq!(config.source.file_path, "/run/ledmatrix.raw");
    }

    #[test]
    fn test_overrides() {
        let config: Config = toml::from_str(
            r#"
            interface = "enp3s0"
            fps = 30

            [source]
            kind = "shm"
            shm_name = "wall"
            "#,
        )
        .unwrap();
        assert_eq!(config.interface, "enp3s0");
        assert_eq!(config.fps, 30);
        assert_eq!(config.source.kind, SourceKind::Shm);
        assert_eq!(config.source.shm_name, "wall");
        // Untouched fields keep their defaults.
        assert_eq!(config.width, 320);
    }
}

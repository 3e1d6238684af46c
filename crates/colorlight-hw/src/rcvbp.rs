//! `.rcvbp`/`.rcvp` configuration file decoding.
//!
//! LEDVISION persists receiver settings in a binary file: a small header
//! with a flags word at 0x10, then a payload that is either raw (from
//! 0x14) or a zlib stream (from 0x20) when flag bit 0x0004 is set.
//! Fields sit at fixed offsets in the decompressed payload with no
//! presence markers; a longer file simply reveals more of them, so every
//! read is guarded by a length check and missing fields keep their
//! zero defaults.
//!
//! Decoded values describe how the vendor tool programmed the panel.
//! They are informational and are not fed back into live frame encoding.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::{Error, Result};

/// Offset of the little-endian flags word in the file header.
pub const FLAGS_OFFSET: usize = 0x10;

/// Flag bit marking a zlib-compressed payload.
pub const FLAG_COMPRESSED: u32 = 0x0004;

/// Payload start for uncompressed files.
pub const RAW_PAYLOAD_OFFSET: usize = 0x14;

/// Payload start for compressed files.
pub const COMPRESSED_PAYLOAD_OFFSET: usize = 0x20;

/// Decoded panel configuration.
///
/// Raw codes are kept as stored; the enum views below interpret them.
/// Every field is zero/false until the payload is long enough to
/// contain it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelConfig {
    pub module_width: u8,
    pub module_height: u8,
    pub cabinet_width: u16,
    pub cabinet_height: u16,
    /// Scan divisor (4, 8, 16, 32).
    pub scan_mode: u8,
    /// Nonzero means reversed data polarity.
    pub data_polarity: u8,
    /// Raw cascade direction code, see [`PanelConfig::cascade`].
    pub cascade_direction: u8,
    pub data_groups: u16,
    pub gamma: f32,
    /// White balance per channel, R/G/B.
    pub white_balance: [u8; 3],
    /// Output-position remapping per channel, R/G/B. Each value is an
    /// output position in {0, 1, 2}; see [`PanelConfig::color_order`].
    pub color_exchange: [u8; 3],
    pub brightness_percent: u8,
    pub brightness_level: u8,
    /// Minimum output-enable time in nanoseconds.
    pub min_oe_ns: f32,
    /// Raw grayscale mode code, see [`PanelConfig::grayscale`].
    pub grayscale_mode: u8,
    pub grayscale_max: u16,
    pub grayscale_refinement: u8,
    pub decoder_ic: u8,
    /// File carried the compression flag.
    pub compressed: bool,
    /// Size of the file as read, before decompression.
    pub raw_size: usize,
}

impl PanelConfig {
    /// Interprets the cascade direction code.
    pub fn cascade(&self) -> CascadeDirection {
        CascadeDirection::from_code(self.cascade_direction)
    }

    /// Interprets the grayscale mode code.
    pub fn grayscale(&self) -> GrayscaleMode {
        GrayscaleMode::from_code(self.grayscale_mode)
    }

    /// Interprets the scan mode divisor.
    pub fn scan_rate(&self) -> ScanRate {
        ScanRate::from_code(self.scan_mode)
    }

    /// Interprets the color exchange triple.
    pub fn color_order(&self) -> ColorExchange {
        ColorExchange::from_triple(self.color_exchange)
    }

    /// True when the data polarity field marks reversed polarity.
    pub fn is_polarity_reversed(&self) -> bool {
        self.data_polarity != 0
    }
}

/// Data-chaining direction across tiled modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeDirection {
    RightToLeft,
    LeftToRight,
    TopToBottom,
    BottomToTop,
    Unknown(u8),
}

impl CascadeDirection {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => CascadeDirection::RightToLeft,
            1 => CascadeDirection::LeftToRight,
            2 => CascadeDirection::TopToBottom,
            3 => CascadeDirection::BottomToTop,
            other => CascadeDirection::Unknown(other),
        }
    }
}

impl std::fmt::Display for CascadeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CascadeDirection::RightToLeft => write!(f, "right to left"),
            CascadeDirection::LeftToRight => write!(f, "left to right"),
            CascadeDirection::TopToBottom => write!(f, "top to bottom"),
            CascadeDirection::BottomToTop => write!(f, "bottom to top"),
            CascadeDirection::Unknown(code) => write!(f, "unknown ({code})"),
        }
    }
}

/// Grayscale processing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrayscaleMode {
    Normal,
    EighteenBitPlus,
    InfiBit,
    Unknown(u8),
}

impl GrayscaleMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x07 => GrayscaleMode::Normal,
            0x81 => GrayscaleMode::EighteenBitPlus,
            0x85 => GrayscaleMode::InfiBit,
            other => GrayscaleMode::Unknown(other),
        }
    }
}

impl std::fmt::Display for GrayscaleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrayscaleMode::Normal => write!(f, "normal"),
            GrayscaleMode::EighteenBitPlus => write!(f, "18bit+"),
            GrayscaleMode::InfiBit => write!(f, "infi-bit"),
            GrayscaleMode::Unknown(code) => write!(f, "unknown ({code:#04x})"),
        }
    }
}

/// Scan rate: how many LED rows share one driver per refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRate {
    Static1To4,
    Static1To8,
    Static1To16,
    Static1To32,
    Unknown(u8),
}

impl ScanRate {
    pub fn from_code(code: u8) -> Self {
        match code {
            4 => ScanRate::Static1To4,
            8 => ScanRate::Static1To8,
            16 => ScanRate::Static1To16,
            32 => ScanRate::Static1To32,
            other => ScanRate::Unknown(other),
        }
    }
}

impl std::fmt::Display for ScanRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanRate::Static1To4 => write!(f, "1:4 scan"),
            ScanRate::Static1To8 => write!(f, "1:8 scan"),
            ScanRate::Static1To16 => write!(f, "1:16 scan"),
            ScanRate::Static1To32 => write!(f, "1:32 scan"),
            ScanRate::Unknown(code) => write!(f, "unknown ({code})"),
        }
    }
}

/// Color order as expressed by the file's exchange triple.
///
/// The vendor tool encodes channel output positions differently from the
/// wire encoder's [`crate::ColorOrder`]; this mapping is the file
/// format's own and the two are deliberately kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorExchange {
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
    /// Not one of the six named permutations (including non-permutation
    /// triples, e.g. from a file too short to carry the field).
    Custom { r: u8, g: u8, b: u8 },
}

impl ColorExchange {
    pub fn from_triple([r, g, b]: [u8; 3]) -> Self {
        match (r, g, b) {
            (2, 1, 0) => ColorExchange::Rgb,
            (2, 0, 1) => ColorExchange::Rbg,
            (1, 0, 2) => ColorExchange::Grb,
            (1, 2, 0) => ColorExchange::Gbr,
            (0, 2, 1) => ColorExchange::Brg,
            (0, 1, 2) => ColorExchange::Bgr,
            _ => ColorExchange::Custom { r, g, b },
        }
    }
}

impl std::fmt::Display for ColorExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorExchange::Rgb => write!(f, "RGB"),
            ColorExchange::Rbg => write!(f, "RBG"),
            ColorExchange::Grb => write!(f, "GRB"),
            ColorExchange::Gbr => write!(f, "GBR"),
            ColorExchange::Brg => write!(f, "BRG"),
            ColorExchange::Bgr => write!(f, "BGR"),
            ColorExchange::Custom { r, g, b } => {
                write!(f, "custom (R={r}, G={g}, B={b})")
            }
        }
    }
}

/// Decodes a configuration file.
///
/// Files too short to carry any payload decode to an all-default
/// [`PanelConfig`]. A set compression flag with an unreadable zlib
/// stream is an error; use [`decode_raw_fallback`] to retry such a file
/// as raw bytes.
pub fn decode(raw: &[u8]) -> Result<PanelConfig> {
    let mut config = PanelConfig {
        raw_size: raw.len(),
        ..PanelConfig::default()
    };

    if raw.len() < RAW_PAYLOAD_OFFSET {
        return Ok(config);
    }

    let flags = u32_le(raw, FLAGS_OFFSET);
    config.compressed = flags & FLAG_COMPRESSED != 0;

    let inflated;
    let payload: &[u8] = if config.compressed {
        if raw.len() < COMPRESSED_PAYLOAD_OFFSET {
            return Err(Error::FileTooShort {
                len: raw.len(),
                needed: COMPRESSED_PAYLOAD_OFFSET,
            });
        }
        inflated = inflate(&raw[COMPRESSED_PAYLOAD_OFFSET..])?;
        &inflated
    } else {
        &raw[RAW_PAYLOAD_OFFSET..]
    };

    extract_fields(payload, &mut config);
    Ok(config)
}

/// Decodes a file by treating all of it as an uncompressed payload.
///
/// This is the explicit fallback for files whose compressed stream is
/// damaged; the fields it produces may be garbage, so callers should
/// log that the fallback was taken.
pub fn decode_raw_fallback(raw: &[u8]) -> PanelConfig {
    let mut config = PanelConfig {
        raw_size: raw.len(),
        ..PanelConfig::default()
    };
    if raw.len() >= FLAGS_OFFSET + 4 {
        config.compressed = u32_le(raw, FLAGS_OFFSET) & FLAG_COMPRESSED != 0;
    }
    extract_fields(raw, &mut config);
    config
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|source| Error::Decompress {
            offset: COMPRESSED_PAYLOAD_OFFSET,
            source,
        })?;
    Ok(out)
}

/// Reads every field whose offset fits in the payload. Grouped fields
/// (dimension pairs, channel triples) appear together or not at all,
/// matching how the vendor tool writes them.
fn extract_fields(payload: &[u8], config: &mut PanelConfig) {
    if payload.len() >= 0x06 {
        config.module_width = payload[0x04];
        config.module_height = payload[0x05];
    }
    if payload.len() >= 0x1D {
        config.data_polarity = payload[0x1C];
    }
    if payload.len() >= 0x24 {
        config.gamma = f32_le(payload, 0x20);
    }
    if payload.len() >= 0x25 {
        config.scan_mode = payload[0x24];
    }
    if payload.len() >= 0x2F {
        config.white_balance = [payload[0x2C], payload[0x2D], payload[0x2E]];
    }
    if payload.len() >= 0x33 {
        config.color_exchange = [payload[0x30], payload[0x31], payload[0x32]];
    }
    if payload.len() >= 0x41 {
        config.cascade_direction = payload[0x40];
    }
    if payload.len() >= 0xB6 {
        config.min_oe_ns = f32_le(payload, 0xB2);
    }
    if payload.len() >= 0xC8 {
        config.cabinet_width = u16_le(payload, 0xC4);
        config.cabinet_height = u16_le(payload, 0xC6);
    }
    if payload.len() >= 0x190 {
        config.data_groups = u16_le(payload, 0x18E);
    }
    if payload.len() >= 0x1EB {
        config.grayscale_max = u16_le(payload, 0x1E9);
    }
    if payload.len() >= 0x25F {
        config.grayscale_refinement = payload[0x25E];
    }
    if payload.len() >= 0xE984 {
        config.brightness_level = payload[0xE983];
    }
    if payload.len() >= 0xE987 {
        config.decoder_ic = payload[0xE986];
    }
    if payload.len() >= 0xE98E {
        config.brightness_percent = payload[0xE98D];
    }
    if payload.len() >= 0xE99F {
        config.grayscale_mode = payload[0xE99E];
    }
}

fn u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

fn f32_le(buf: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Builds a payload with the front fields populated.
    fn sample_payload() -> Vec<u8> {
        let mut payload = vec![0u8; 0xC8];
        payload[0x04] = 64;
        payload[0x05] = 32;
        payload[0x1C] = 1;
        payload[0x20..0x24].copy_from_slice(&2.8f32.to_le_bytes());
        payload[0x24] = 16;
        payload[0x2C] = 255;
        payload[0x2D] = 240;
        payload[0x2E] = 230;
        payload[0x30] = 0;
        payload[0x31] = 1;
        payload[0x32] = 2;
        payload[0x40] = 1;
        payload[0xB2..0xB6].copy_from_slice(&62.5f32.to_le_bytes());
        payload[0xC4..0xC6].copy_from_slice(&320u16.to_le_bytes());
        payload[0xC6..0xC8].copy_from_slice(&128u16.to_le_bytes());
        payload
    }

    fn uncompressed_file(payload: &[u8]) -> Vec<u8> {
        let mut file = vec![0u8; RAW_PAYLOAD_OFFSET];
        file.extend_from_slice(payload);
        file
    }

    fn compressed_file(payload: &[u8]) -> Vec<u8> {
        let mut file = vec![0u8; COMPRESSED_PAYLOAD_OFFSET];
        file[FLAGS_OFFSET..FLAGS_OFFSET + 4].copy_from_slice(&FLAG_COMPRESSED.to_le_bytes());
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        file.extend_from_slice(&encoder.finish().unwrap());
        file
    }

    #[test]
    fn test_truncated_file_decodes_to_defaults() {
        let config = decode(&[0u8; 10]).unwrap();
        assert_eq!(config.raw_size, 10);
        assert!(!config.compressed);
        assert_eq!(config, PanelConfig { raw_size: 10, ..PanelConfig::default() });
    }

    #[test]
    fn test_uncompressed_fields() {
        let config = decode(&uncompressed_file(&sample_payload())).unwrap();
        assert!(!config.compressed);
        assert_eq!(config.module_width, 64);
        assert_eq!(config.module_height, 32);
        assert!(config.is_polarity_reversed());
        assert!((config.gamma - 2.8).abs() < f32::EPSILON);
        assert_eq!(config.scan_rate(), ScanRate::Static1To16);
        assert_eq!(config.white_balance, [255, 240, 230]);
        assert_eq!(config.color_order(), ColorExchange::Bgr);
        assert_eq!(config.cascade(), CascadeDirection::LeftToRight);
        assert!((config.min_oe_ns - 62.5).abs() < f32::EPSILON);
        assert_eq!(config.cabinet_width, 320);
        assert_eq!(config.cabinet_height, 128);
        // The payload stops before the grayscale block.
        assert_eq!(config.grayscale_max, 0);
        assert_eq!(config.grayscale(), GrayscaleMode::Unknown(0));
    }

    #[test]
    fn test_compressed_round_trip() {
        let config = decode(&compressed_file(&sample_payload())).unwrap();
        assert!(config.compressed);
        assert_eq!(config.module_width, 64);
        assert_eq!(config.cabinet_width, 320);
    }

    #[test]
    fn test_partial_payload_keeps_later_defaults() {
        let mut payload = sample_payload();
        payload.truncate(0x30);
        let config = decode(&uncompressed_file(&payload)).unwrap();
        assert_eq!(config.white_balance, [255, 240, 230]);
        // Exchange triple needs 0x33 bytes, so it stays zeroed.
        assert_eq!(config.color_exchange, [0, 0, 0]);
        assert_eq!(
            config.color_order(),
            ColorExchange::Custom { r: 0, g: 0, b: 0 }
        );
    }

    #[test]
    fn test_bad_zlib_reports_decompress_error() {
        let mut file = vec![0u8; COMPRESSED_PAYLOAD_OFFSET];
        file[FLAGS_OFFSET..FLAGS_OFFSET + 4].copy_from_slice(&FLAG_COMPRESSED.to_le_bytes());
        file.extend_from_slice(b"definitely not zlib");
        let err = decode(&file).unwrap_err();
        assert!(matches!(err, Error::Decompress { offset: 0x20, .. }));
    }

    #[test]
    fn test_compressed_flag_with_short_file() {
        let mut file = vec![0u8; 0x18];
        file[FLAGS_OFFSET..FLAGS_OFFSET + 4].copy_from_slice(&FLAG_COMPRESSED.to_le_bytes());
        let err = decode(&file).unwrap_err();
        assert!(matches!(err, Error::FileTooShort { len: 0x18, needed: 0x20 }));
    }

    #[test]
    fn test_raw_fallback_reads_whole_file() {
        let mut file = compressed_file(&sample_payload());
        // Corrupt the stream, then fall back.
        file.truncate(COMPRESSED_PAYLOAD_OFFSET + 2);
        assert!(decode(&file).is_err());
        let config = decode_raw_fallback(&file);
        assert!(config.compressed);
        assert_eq!(config.raw_size, file.len());
    }

    #[test]
    fn test_grayscale_and_brightness_block() {
        let mut payload = vec![0u8; 0xE99F];
        payload[0x1E9..0x1EB].copy_from_slice(&4096u16.to_le_bytes());
        payload[0x25E] = 1;
        payload[0xE983] = 12;
        payload[0xE986] = 0x45;
        payload[0xE98D] = 80;
        payload[0xE99E] = 0x81;
        let config = decode(&uncompressed_file(&payload)).unwrap();
        assert_eq!(config.grayscale_max, 4096);
        assert_eq!(config.grayscale_refinement, 1);
        assert_eq!(config.brightness_level, 12);
        assert_eq!(config.decoder_ic, 0x45);
        assert_eq!(config.brightness_percent, 80);
        assert_eq!(config.grayscale(), GrayscaleMode::EighteenBitPlus);
    }

    #[test]
    fn test_exchange_table() {
        assert_eq!(ColorExchange::from_triple([2, 1, 0]), ColorExchange::Rgb);
        assert_eq!(ColorExchange::from_triple([0, 1, 2]), ColorExchange::Bgr);
        assert_eq!(ColorExchange::from_triple([1, 2, 0]), ColorExchange::Gbr);
        assert_eq!(
            ColorExchange::from_triple([2, 2, 0]),
            ColorExchange::Custom { r: 2, g: 2, b: 0 }
        );
    }
}

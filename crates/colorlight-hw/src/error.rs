//! Error types for the ColorLight hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when encoding frames, talking to the card, or
/// decoding configuration files.
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized color order name.
    #[error("invalid color order {0:?} (expected one of RGB, RBG, GRB, GBR, BRG, BGR)")]
    InvalidColorOrder(String),

    /// Payload would not fit in a single Ethernet frame.
    #[error("payload of {len} bytes exceeds the {max} byte limit for one frame")]
    PayloadTooLarge { len: usize, max: usize },

    /// Pixel buffer does not match the configured display dimensions.
    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// Named network interface does not exist.
    #[error("network interface {0} not found")]
    InterfaceNotFound(String),

    /// Interface exists but cannot carry raw Ethernet frames.
    #[error("interface {0} does not provide an ethernet channel")]
    NotEthernet(String),

    /// Raw socket could not be opened.
    #[error("failed to open raw socket on {interface} (raw ethernet needs root or CAP_NET_RAW): {source}")]
    Socket {
        interface: String,
        source: std::io::Error,
    },

    /// A frame could not be transmitted.
    #[error("failed to transmit frame on {interface}: {source}")]
    Transmit {
        interface: String,
        source: std::io::Error,
    },

    /// Configuration file ends before the compressed payload starts.
    #[error("config file too short: {len} bytes, compressed payload starts at {needed:#x}")]
    FileTooShort { len: usize, needed: usize },

    /// Compressed configuration payload is not a valid zlib stream.
    #[error("zlib decompression failed at offset {offset:#x}: {source}")]
    Decompress {
        offset: usize,
        source: std::io::Error,
    },
}

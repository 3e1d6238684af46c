//! ColorLight 5A-75B Hardware Library
//!
//! Drives ColorLight 5A-75B LED receiver cards over raw Ethernet frames
//! (pixel streaming and board configuration) and decodes the vendor's
//! `.rcvbp`/`.rcvp` panel-configuration files.
//!
//! The receiver card must be wired to a local Ethernet interface; the
//! protocol is connectionless and fire-and-forget, so nothing here reads
//! from the network.

pub mod color;
pub mod error;
pub mod matrix;
pub mod rcvbp;

pub use color::ColorOrder;
pub use error::{Error, Result};
pub use matrix::{Framebuffer, MatrixDevice, ReceiverSetup, Timing};
pub use rcvbp::PanelConfig;

/// Default display dimensions (a 5x4 grid of 64x32 modules).
pub const DEFAULT_WIDTH: u16 = 320;
pub const DEFAULT_HEIGHT: u16 = 128;

//! ColorLight receiver card support.
//!
//! Frame encoding, configuration sequencing, and raw-Ethernet transmission
//! for the 5A-75B family.

pub mod device;
pub mod framebuffer;
pub mod protocol;
pub mod sequence;

pub use device::MatrixDevice;
pub use framebuffer::Framebuffer;
pub use protocol::{ColorDepth, ConfigType, PacketType};
pub use sequence::{ConfigStep, PortRoute, ReceiverSetup, Timing};

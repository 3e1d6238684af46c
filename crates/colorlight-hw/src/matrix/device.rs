//! Receiver card communication over raw Ethernet.

use std::thread;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, DataLinkSender};
use tracing::{debug, info};

use super::framebuffer::Framebuffer;
use super::protocol::{self, MAX_PIXELS_PER_PACKET};
use super::sequence::{self, ReceiverSetup, Timing};
use crate::color::ColorOrder;
use crate::{Error, Result};

/// Settle period between the last pixel row and the refresh trigger; the
/// firmware drops the refresh if it arrives too early.
const FRAME_SETTLE: Duration = Duration::from_millis(5);

/// A ColorLight receiver card reachable on a local Ethernet interface.
///
/// Owns the raw socket plus the display geometry and brightness state
/// applied to outgoing frames. The protocol is fire-and-forget: nothing
/// is ever read back from the card.
pub struct MatrixDevice {
    tx: Box<dyn DataLinkSender>,
    interface: String,
    width: u16,
    height: u16,
    color_order: ColorOrder,
    brightness: u8,
    rgb_brightness: (u8, u8, u8),
}

impl MatrixDevice {
    /// Opens a raw Ethernet channel on the named interface.
    pub fn open(interface: &str, width: u16, height: u16) -> Result<Self> {
        let iface = datalink::interfaces()
            .into_iter()
            .find(|i| i.name == interface)
            .ok_or_else(|| Error::InterfaceNotFound(interface.to_string()))?;

        let mut config = Config::default();
        config.read_buffer_size = 4096;
        config.write_buffer_size = 4096;

        let tx = match datalink::channel(&iface, config) {
            Ok(Channel::Ethernet(tx, _rx)) => tx,
            Ok(_) => return Err(Error::NotEthernet(interface.to_string())),
            Err(source) => {
                return Err(Error::Socket {
                    interface: interface.to_string(),
                    source,
                })
            }
        };

        info!("opened raw socket on {} ({}x{})", interface, width, height);

        Ok(Self {
            tx,
            interface: interface.to_string(),
            width,
            height,
            color_order: ColorOrder::default(),
            brightness: 255,
            rgb_brightness: (255, 255, 255),
        })
    }

    /// Returns the interface name this device is bound to.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Returns the display width in pixels.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Returns the display height in pixels.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Returns the panel color order applied to outgoing pixel data.
    pub fn color_order(&self) -> ColorOrder {
        self.color_order
    }

    /// Sets the panel color order.
    pub fn set_color_order(&mut self, order: ColorOrder) {
        self.color_order = order;
    }

    /// Sets the overall brightness carried by refresh frames.
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    /// Sets the per-channel brightness.
    pub fn set_rgb_brightness(&mut self, rgb: (u8, u8, u8)) {
        self.rgb_brightness = rgb;
    }

    /// Transmits one raw frame. No buffering, no retries; a failure here
    /// aborts whatever multi-frame operation is in progress.
    pub fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        match self.tx.send_to(frame, None) {
            Some(Ok(())) => Ok(()),
            Some(Err(source)) => Err(Error::Transmit {
                interface: self.interface.clone(),
                source,
            }),
            None => Err(Error::Transmit {
                interface: self.interface.clone(),
                source: std::io::Error::other("ethernet channel closed"),
            }),
        }
    }

    /// Sends one full-width row of packed RGB pixels, remapped to the
    /// panel color order and split into MTU-sized chunks in increasing
    /// offset order.
    pub fn send_row(&mut self, row: u16, rgb_row: &[u8]) -> Result<()> {
        let expected = self.width as usize * 3;
        if rgb_row.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: rgb_row.len(),
            });
        }

        let wire = self.color_order.remap_row(rgb_row);
        for (offset, count) in protocol::split_row(self.width, MAX_PIXELS_PER_PACKET) {
            let start = offset as usize * 3;
            let end = start + count as usize * 3;
            let frame = protocol::build_pixel_row(row, offset, &wire[start..end])?;
            self.transmit(&frame)?;
        }
        Ok(())
    }

    /// Streams a complete frame of packed RGB pixels: every row, the
    /// settle wait, then the refresh trigger with the current brightness.
    pub fn send_frame(&mut self, rgb: &[u8]) -> Result<()> {
        let expected = self.width as usize * self.height as usize * 3;
        if rgb.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: rgb.len(),
            });
        }

        let stride = self.width as usize * 3;
        for y in 0..self.height {
            let start = y as usize * stride;
            self.send_row(y, &rgb[start..start + stride])?;
        }

        thread::sleep(FRAME_SETTLE);
        self.send_display_frame()
    }

    /// Streams a framebuffer. See [`MatrixDevice::send_frame`].
    pub fn send_framebuffer(&mut self, fb: &Framebuffer) -> Result<()> {
        self.send_frame(fb.data())
    }

    /// Sends the refresh trigger frame carrying the current brightness.
    pub fn send_display_frame(&mut self) -> Result<()> {
        let frame = protocol::build_display_frame(self.brightness, self.rgb_brightness);
        self.transmit(&frame)?;
        debug!("display frame sent (brightness {})", self.brightness);
        Ok(())
    }

    /// Sends a standalone brightness frame.
    pub fn send_brightness_frame(&mut self) -> Result<()> {
        let frame = protocol::build_brightness_frame(self.rgb_brightness);
        self.transmit(&frame)?;
        debug!("brightness frame sent {:?}", self.rgb_brightness);
        Ok(())
    }

    /// Runs the full configuration sequence against the receiver,
    /// honoring each step's minimum delay. Aborts on the first transmit
    /// failure rather than leaving the card half-programmed without
    /// noticing.
    pub fn configure(&mut self, setup: &ReceiverSetup, timing: &Timing) -> Result<()> {
        info!(
            "configuring receiver: {}x{}, 1:{} scan",
            setup.width, setup.height, setup.scan_mode
        );
        for step in sequence::steps(setup, timing)? {
            if !step.delay.is_zero() {
                thread::sleep(step.delay);
            }
            self.transmit(&step.frame)?;
            debug!("config step sent: {}", step.label);
        }
        Ok(())
    }

    /// Sends a discovery request. Responses are not read.
    pub fn send_discovery(&mut self) -> Result<()> {
        let frame = protocol::build_discovery_request()?;
        self.transmit(&frame)?;
        debug!("discovery request sent");
        Ok(())
    }

    /// Fills the display with a solid color.
    pub fn clear(&mut self, color: (u8, u8, u8)) -> Result<()> {
        let mut fb = Framebuffer::new(self.width, self.height);
        fb.clear(color);
        self.send_frame(fb.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a live interface and CAP_NET_RAW; skipped by default.
    #[test]
    #[ignore]
    fn test_device_open() {
        let device = MatrixDevice::open("eth0", 320, 128);
        assert!(device.is_ok());
    }
}

//! Receiver configuration sequencing.
//!
//! Programming a receiver card takes an ordered run of config frames:
//! control area, port routing, basic parameters, volatile EEPROM write,
//! and optionally a flash persist. The order is fixed, and the firmware
//! needs a minimum wait between steps to apply each one; the waits are
//! timing contracts only and never change the produced bytes.

use std::time::Duration;

use super::protocol::{self, ColorDepth, ConfigType};
use crate::{Result, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Number of output ports (J1-J8) on a 5A-75B.
pub const PORT_COUNT: usize = 8;

/// Routing payload: 1 reserved byte + 8 x 3 port bytes.
const ROUTING_PAYLOAD_LEN: usize = 1 + PORT_COUNT * 3;

/// One routing table entry.
#[derive(Debug, Clone, Copy)]
pub struct PortRoute {
    /// Port index, masked to 3 bits on the wire.
    pub index: u8,
    pub flags: [u8; 2],
}

/// Enables all eight ports with the default flag bytes.
pub fn default_ports() -> Vec<PortRoute> {
    (0..PORT_COUNT as u8)
        .map(|index| PortRoute {
            index,
            flags: [0x00, 0x01],
        })
        .collect()
}

/// Everything needed to program one receiver card.
#[derive(Debug, Clone)]
pub struct ReceiverSetup {
    pub width: u16,
    pub height: u16,
    /// Scan divisor: 4, 8, 16, or 32.
    pub scan_mode: u8,
    pub color_depth: ColorDepth,
    pub module_width: u8,
    pub module_height: u8,
    pub card_index: u8,
    pub control_area: [u8; 10],
    pub ports: Vec<PortRoute>,
    /// Persist to flash after the volatile write. Overwrites the
    /// receiver's stored configuration; never enabled implicitly.
    pub save_to_flash: bool,
}

impl Default for ReceiverSetup {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scan_mode: 16,
            color_depth: ColorDepth::Eight,
            module_width: 64,
            module_height: 32,
            card_index: 0,
            control_area: [0u8; 10],
            ports: default_ports(),
            save_to_flash: false,
        }
    }
}

/// Minimum waits before each configuration step.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Wait before each ordinary step.
    pub step: Duration,
    /// Wait before the flash persist, which needs the volatile writes to
    /// have settled first.
    pub flash: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(10),
            flash: Duration::from_millis(50),
        }
    }
}

impl Timing {
    /// No waits at all. Changes when frames are sent, never their bytes.
    pub const fn immediate() -> Self {
        Self {
            step: Duration::ZERO,
            flash: Duration::ZERO,
        }
    }
}

/// One step of the configuration run: wait `delay`, then transmit `frame`.
#[derive(Debug, Clone)]
pub struct ConfigStep {
    pub label: &'static str,
    pub delay: Duration,
    pub frame: Vec<u8>,
}

/// Builds the full configuration run for one receiver, in the fixed
/// order the firmware expects. The flash persist step is appended only
/// when `setup.save_to_flash` is set.
pub fn steps(setup: &ReceiverSetup, timing: &Timing) -> Result<Vec<ConfigStep>> {
    let mut run = Vec::with_capacity(5);

    run.push(ConfigStep {
        label: "control area",
        delay: timing.step,
        frame: protocol::build_config_packet(
            ConfigType::ControlArea,
            &control_area_payload(setup.card_index, &setup.control_area),
            &[],
            0,
        )?,
    });

    run.push(ConfigStep {
        label: "port routing",
        delay: timing.step,
        frame: protocol::build_config_packet(
            ConfigType::Routing,
            &routing_payload(&setup.ports),
            &[],
            0,
        )?,
    });

    run.push(ConfigStep {
        label: "basic parameters",
        delay: timing.step,
        frame: protocol::build_config_packet(
            ConfigType::BasicParam,
            &basic_param_payload(setup),
            &[],
            0,
        )?,
    });

    run.push(ConfigStep {
        label: "eeprom (volatile)",
        delay: timing.step,
        frame: protocol::build_config_packet(ConfigType::EepromVolatile, &[0u8; 16], &[], 0)?,
    });

    if setup.save_to_flash {
        run.push(ConfigStep {
            label: "flash save",
            delay: timing.flash,
            frame: protocol::build_config_packet(
                ConfigType::EepromPersist,
                &flash_save_payload(),
                &[],
                0,
            )?,
        });
    }

    Ok(run)
}

/// Control area payload: reserved byte, card index, 10-byte area.
pub fn control_area_payload(card_index: u8, area: &[u8; 10]) -> [u8; 12] {
    let mut payload = [0u8; 12];
    payload[1] = card_index;
    payload[2..].copy_from_slice(area);
    payload
}

/// Routing payload: reserved byte, then 3 bytes per port. Unused slots
/// stay zero; at most eight ports are encoded.
pub fn routing_payload(ports: &[PortRoute]) -> [u8; ROUTING_PAYLOAD_LEN] {
    let mut payload = [0u8; ROUTING_PAYLOAD_LEN];
    for (slot, port) in ports.iter().take(PORT_COUNT).enumerate() {
        let base = 1 + slot * 3;
        payload[base] = port.index & 0x07;
        payload[base + 1] = port.flags[0];
        payload[base + 2] = port.flags[1];
    }
    payload
}

/// Basic parameter payload: width and height little-endian at 0 and 2,
/// color depth at 4, module dimensions at 6 and 7, scan mode at 8.
pub fn basic_param_payload(setup: &ReceiverSetup) -> [u8; 32] {
    let mut payload = [0u8; 32];
    payload[0..2].copy_from_slice(&setup.width.to_le_bytes());
    payload[2..4].copy_from_slice(&setup.height.to_le_bytes());
    payload[4] = setup.color_depth as u8;
    payload[6] = setup.module_width;
    payload[7] = setup.module_height;
    payload[8] = setup.scan_mode;
    payload
}

/// Flash persist payload: full-save flag and send flag.
pub fn flash_save_payload() -> [u8; 16] {
    let mut payload = [0u8; 16];
    payload[0] = 0x0F;
    payload[1] = 0x01;
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_byte(frame: &[u8]) -> u8 {
        frame[0x26]
    }

    #[test]
    fn test_volatile_sequence_order_and_delays() {
        let setup = ReceiverSetup::default();
        let run = steps(&setup, &Timing::default()).unwrap();
        let types: Vec<u8> = run.iter().map(|s| type_byte(&s.frame)).collect();
        assert_eq!(types, vec![0x02, 0x03, 0x05, 0x1B]);
        for step in &run {
            assert_eq!(step.delay, Duration::from_millis(10));
        }
    }

    #[test]
    fn test_flash_save_appends_persist_step() {
        let setup = ReceiverSetup {
            save_to_flash: true,
            ..ReceiverSetup::default()
        };
        let run = steps(&setup, &Timing::default()).unwrap();
        let last = run.last().unwrap();
        assert_eq!(type_byte(&last.frame), 0x2B);
        assert_eq!(last.delay, Duration::from_millis(50));
        assert_eq!(&last.frame[0x28..0x2A], &[0x0F, 0x01]);
    }

    #[test]
    fn test_immediate_timing_keeps_bytes_identical() {
        let setup = ReceiverSetup {
            save_to_flash: true,
            ..ReceiverSetup::default()
        };
        let timed = steps(&setup, &Timing::default()).unwrap();
        let instant = steps(&setup, &Timing::immediate()).unwrap();
        assert_eq!(timed.len(), instant.len());
        for (a, b) in timed.iter().zip(&instant) {
            assert_eq!(a.frame, b.frame);
            assert!(b.delay.is_zero());
        }
    }

    #[test]
    fn test_routing_payload_layout() {
        let ports = vec![
            PortRoute { index: 0, flags: [0x00, 0x01] },
            PortRoute { index: 9, flags: [0xAA, 0xBB] },
        ];
        let payload = routing_payload(&ports);
        assert_eq!(payload.len(), 25);
        assert_eq!(payload[0], 0x00);
        assert_eq!(&payload[1..4], &[0x00, 0x00, 0x01]);
        // Index 9 masked to 3 bits.
        assert_eq!(&payload[4..7], &[0x01, 0xAA, 0xBB]);
        assert!(payload[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_basic_param_payload_layout() {
        let setup = ReceiverSetup {
            width: 0x0140,
            height: 0x0080,
            scan_mode: 32,
            module_width: 64,
            module_height: 32,
            ..ReceiverSetup::default()
        };
        let payload = basic_param_payload(&setup);
        assert_eq!(&payload[0..4], &[0x40, 0x01, 0x80, 0x00]);
        assert_eq!(payload[4], 0x00);
        assert_eq!(payload[6], 64);
        assert_eq!(payload[7], 32);
        assert_eq!(payload[8], 32);
    }

    #[test]
    fn test_control_area_payload_defaults() {
        let payload = control_area_payload(3, &[0u8; 10]);
        assert_eq!(payload.len(), 12);
        assert_eq!(payload[0], 0x00);
        assert_eq!(payload[1], 3);
        assert!(payload[2..].iter().all(|&b| b == 0));
    }
}

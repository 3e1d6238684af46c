//! Color channel ordering.
//!
//! LED panels wire their driver ICs in different channel orders, so the
//! same semantic RGB pixel may need its bytes permuted before it goes on
//! the wire. The order name spells the transmitted byte sequence: `Bgr`
//! sends blue first and red last.

use crate::{Error, Result};
use std::str::FromStr;

/// Channel order of the transmitted 3-byte pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorOrder {
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    /// Most panels ship in BGR order.
    #[default]
    Bgr,
}

impl ColorOrder {
    /// All six orders, in the conventional listing order.
    pub const ALL: [ColorOrder; 6] = [
        ColorOrder::Rgb,
        ColorOrder::Rbg,
        ColorOrder::Grb,
        ColorOrder::Gbr,
        ColorOrder::Brg,
        ColorOrder::Bgr,
    ];

    /// Returns `[pos_r, pos_g, pos_b]`: the wire byte offset each input
    /// channel occupies. Always a permutation of {0, 1, 2}.
    pub const fn positions(self) -> [usize; 3] {
        match self {
            ColorOrder::Rgb => [0, 1, 2],
            ColorOrder::Rbg => [0, 2, 1],
            ColorOrder::Grb => [1, 0, 2],
            ColorOrder::Gbr => [2, 0, 1],
            ColorOrder::Brg => [1, 2, 0],
            ColorOrder::Bgr => [2, 1, 0],
        }
    }

    /// Permutes one RGB pixel into wire order.
    pub fn remap(self, [r, g, b]: [u8; 3]) -> [u8; 3] {
        let pos = self.positions();
        let mut out = [0u8; 3];
        out[pos[0]] = r;
        out[pos[1]] = g;
        out[pos[2]] = b;
        out
    }

    /// Recovers the RGB pixel from a wire-order pixel.
    pub fn unmap(self, wire: [u8; 3]) -> [u8; 3] {
        let pos = self.positions();
        [wire[pos[0]], wire[pos[1]], wire[pos[2]]]
    }

    /// Permutes a whole row of packed RGB bytes into wire order.
    ///
    /// Trailing bytes that do not form a complete pixel are dropped.
    pub fn remap_row(self, rgb: &[u8]) -> Vec<u8> {
        let pos = self.positions();
        let mut out = vec![0u8; rgb.len() - rgb.len() % 3];
        for (src, dst) in rgb.chunks_exact(3).zip(out.chunks_exact_mut(3)) {
            dst[pos[0]] = src[0];
            dst[pos[1]] = src[1];
            dst[pos[2]] = src[2];
        }
        out
    }
}

impl FromStr for ColorOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RGB" => Ok(ColorOrder::Rgb),
            "RBG" => Ok(ColorOrder::Rbg),
            "GRB" => Ok(ColorOrder::Grb),
            "GBR" => Ok(ColorOrder::Gbr),
            "BRG" => Ok(ColorOrder::Brg),
            "BGR" => Ok(ColorOrder::Bgr),
            _ => Err(Error::InvalidColorOrder(s.to_string())),
        }
    }
}

impl std::fmt::Display for ColorOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorOrder::Rgb => write!(f, "RGB"),
            ColorOrder::Rbg => write!(f, "RBG"),
            ColorOrder::Grb => write!(f, "GRB"),
            ColorOrder::Gbr => write!(f, "GBR"),
            ColorOrder::Brg => write!(f, "BRG"),
            ColorOrder::Bgr => write!(f, "BGR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_permutations() {
        for order in ColorOrder::ALL {
            let mut seen = [false; 3];
            for pos in order.positions() {
                assert!(!seen[pos], "{order} repeats position {pos}");
                seen[pos] = true;
            }
        }
    }

    #[test]
    fn test_remap_unmap_round_trip() {
        let pixel = [0x12, 0x34, 0x56];
        for order in ColorOrder::ALL {
            assert_eq!(order.unmap(order.remap(pixel)), pixel);
        }
    }

    #[test]
    fn test_bgr_places_red_last() {
        assert_eq!(ColorOrder::Bgr.remap([255, 0, 0]), [0, 0, 255]);
        assert_eq!(ColorOrder::Rgb.remap([255, 0, 0]), [255, 0, 0]);
        assert_eq!(ColorOrder::Grb.remap([1, 2, 3]), [2, 1, 3]);
    }

    #[test]
    fn test_remap_row() {
        let row = [255, 0, 0, 0, 255, 0];
        assert_eq!(ColorOrder::Bgr.remap_row(&row), [0, 0, 255, 0, 255, 0]);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("bgr".parse::<ColorOrder>().unwrap(), ColorOrder::Bgr);
        assert_eq!("RGB".parse::<ColorOrder>().unwrap(), ColorOrder::Rgb);
        assert!("RGBW".parse::<ColorOrder>().is_err());
    }
}

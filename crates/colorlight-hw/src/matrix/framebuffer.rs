//! RGB framebuffer for the LED matrix.

use crate::{Error, Result};

/// Packed RGB888 pixel buffer, row-major.
#[derive(Clone)]
pub struct Framebuffer {
    data: Vec<u8>,
    width: u16,
    height: u16,
}

impl Framebuffer {
    /// Creates a framebuffer initialized to black.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            data: vec![0; width as usize * height as usize * 3],
            width,
            height,
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Returns the raw RGB bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the raw RGB bytes mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns one row of RGB bytes, or an empty slice out of range.
    pub fn row(&self, y: u16) -> &[u8] {
        if y >= self.height {
            return &[];
        }
        let stride = self.width as usize * 3;
        &self.data[y as usize * stride..(y as usize + 1) * stride]
    }

    /// Fills the whole buffer with one color.
    pub fn clear(&mut self, (r, g, b): (u8, u8, u8)) {
        for pixel in self.data.chunks_exact_mut(3) {
            pixel[0] = r;
            pixel[1] = g;
            pixel[2] = b;
        }
    }

    /// Sets a pixel; out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: u16, y: u16, (r, g, b): (u8, u8, u8)) {
        if x < self.width && y < self.height {
            let idx = (y as usize * self.width as usize + x as usize) * 3;
            self.data[idx] = r;
            self.data[idx + 1] = g;
            self.data[idx + 2] = b;
        }
    }

    /// Gets a pixel at the given coordinates.
    pub fn get_pixel(&self, x: u16, y: u16) -> Option<(u8, u8, u8)> {
        if x < self.width && y < self.height {
            let idx = (y as usize * self.width as usize + x as usize) * 3;
            Some((self.data[idx], self.data[idx + 1], self.data[idx + 2]))
        } else {
            None
        }
    }

    /// Fills a rectangle with a solid color, clipped to the buffer.
    pub fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, color: (u8, u8, u8)) {
        for dy in 0..height {
            for dx in 0..width {
                self.set_pixel(x.saturating_add(dx), y.saturating_add(dy), color);
            }
        }
    }

    /// Copies packed RGB bytes into the buffer, checking the length.
    pub fn copy_from_rgb8(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != self.data.len() {
            return Err(Error::BufferSize {
                expected: self.data.len(),
                actual: data.len(),
            });
        }
        self.data.copy_from_slice(data);
        Ok(())
    }

    /// Fills the buffer with a linear gradient from one color to another,
    /// left to right, or top to bottom when `vertical` is set.
    pub fn fill_gradient(&mut self, from: (u8, u8, u8), to: (u8, u8, u8), vertical: bool) {
        let steps = if vertical { self.height } else { self.width };
        let span = steps.saturating_sub(1).max(1) as f32;
        let mix = |a: u8, b: u8, t: f32| (f32::from(a) + (f32::from(b) - f32::from(a)) * t) as u8;
        for y in 0..self.height {
            for x in 0..self.width {
                let t = f32::from(if vertical { y } else { x }) / span;
                self.set_pixel(
                    x,
                    y,
                    (
                        mix(from.0, to.0, t),
                        mix(from.1, to.1, t),
                        mix(from.2, to.2, t),
                    ),
                );
            }
        }
    }

    /// Draws the eight-bar color test pattern.
    pub fn fill_color_bars(&mut self) {
        const BARS: [(u8, u8, u8); 8] = [
            (255, 255, 255),
            (255, 255, 0),
            (0, 255, 255),
            (0, 255, 0),
            (255, 0, 255),
            (255, 0, 0),
            (0, 0, 255),
            (0, 0, 0),
        ];
        let bar = self.width / 8;
        for (i, &color) in BARS.iter().enumerate() {
            let x0 = bar * i as u16;
            // The last bar absorbs any remainder.
            let x1 = if i == 7 { self.width } else { bar * (i as u16 + 1) };
            self.fill_rect(x0, 0, x1 - x0, self.height, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_ops() {
        let mut fb = Framebuffer::new(8, 4);
        fb.set_pixel(2, 1, (10, 20, 30));
        assert_eq!(fb.get_pixel(2, 1), Some((10, 20, 30)));
        assert_eq!(fb.get_pixel(8, 0), None);

        fb.clear((1, 2, 3));
        assert_eq!(fb.get_pixel(0, 0), Some((1, 2, 3)));
        assert_eq!(fb.row(1), [1, 2, 3].repeat(8));
        assert!(fb.row(4).is_empty());
    }

    #[test]
    fn test_copy_from_rgb8_checks_length() {
        let mut fb = Framebuffer::new(4, 4);
        assert!(fb.copy_from_rgb8(&[0u8; 4 * 4 * 3]).is_ok());
        let err = fb.copy_from_rgb8(&[0u8; 7]).unwrap_err();
        assert!(matches!(err, Error::BufferSize { expected: 48, actual: 7 }));
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut fb = Framebuffer::new(10, 2);
        fb.fill_gradient((0, 0, 0), (255, 0, 0), false);
        assert_eq!(fb.get_pixel(0, 0), Some((0, 0, 0)));
        assert_eq!(fb.get_pixel(9, 0), Some((255, 0, 0)));
        // Every row carries the same horizontal ramp.
        assert_eq!(fb.row(0), fb.row(1));

        fb.fill_gradient((0, 0, 0), (0, 0, 200), true);
        assert_eq!(fb.get_pixel(5, 0), Some((0, 0, 0)));
        assert_eq!(fb.get_pixel(5, 1), Some((0, 0, 200)));
    }

    #[test]
    fn test_color_bars_cover_full_width() {
        let mut fb = Framebuffer::new(100, 2);
        fb.fill_color_bars();
        // 100 / 8 = 12, so the black bar runs from x=84 to the edge.
        assert_eq!(fb.get_pixel(0, 0), Some((255, 255, 255)));
        assert_eq!(fb.get_pixel(99, 1), Some((0, 0, 0)));
        assert_eq!(fb.get_pixel(60, 0), Some((255, 0, 0)));
    }
}

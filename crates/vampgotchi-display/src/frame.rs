// ── 1-bit frame buffer ──
//
// Rows are packed MSB-first, one bit per pixel, a set bit meaning black ink.
// That is the layout of a PBM (P4) raster and of most e-paper controllers.
// Drawing happens in `BinaryColor`: `On` is the theme's foreground.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use vampgotchi_core::{Ink, Theme};

#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    theme: Theme,
    bits: Vec<u8>,
}

impl Frame {
    /// A frame filled with the theme's background.
    #[allow(clippy::as_conversions)]
    pub fn new(width: u32, height: u32, theme: Theme) -> Self {
        let mut frame = Self {
            width,
            height,
            theme,
            bits: vec![0; row_bytes(width) * height as usize],
        };
        frame.fill(BinaryColor::Off);
        frame
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Packed rows, `ceil(width / 8)` bytes each.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn fill(&mut self, color: BinaryColor) {
        let byte = if self.ink_for(color) == Ink::Black { 0xFF } else { 0x00 };
        self.bits.fill(byte);
    }

    /// Ink at `(x, y)`; `None` outside the frame.
    pub fn ink_at(&self, x: u32, y: u32) -> Option<Ink> {
        let (index, mask) = self.locate(x, y)?;
        let black = self.bits.get(index).is_some_and(|b| b & mask != 0);
        Some(if black { Ink::Black } else { Ink::White })
    }

    /// Number of pixels drawn in the foreground ink.
    pub fn foreground_pixels(&self) -> usize {
        let mut count = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.ink_at(x, y) == Some(self.theme.foreground) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Binary PBM (P4) encoding of the frame.
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        out.extend_from_slice(&self.bits);
        out
    }

    fn ink_for(&self, color: BinaryColor) -> Ink {
        if color.is_on() {
            self.theme.foreground
        } else {
            self.theme.background
        }
    }

    #[allow(clippy::as_conversions)]
    fn locate(&self, x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * row_bytes(self.width) + (x / 8) as usize;
        Some((index, 0x80 >> (x % 8)))
    }

    fn set(&mut self, point: Point, color: BinaryColor) {
        let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
            return;
        };
        let Some((index, mask)) = self.locate(x, y) else {
            return;
        };
        let black = self.ink_for(color) == Ink::Black;
        if let Some(byte) = self.bits.get_mut(index) {
            if black {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::as_conversions)]
fn row_bytes(width: u32) -> usize {
    width.div_ceil(8) as usize
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use pretty_assertions::assert_eq;

    #[test]
    fn new_frame_is_background() {
        let frame = Frame::new(10, 3, Theme::BLACK);
        assert_eq!(frame.as_bytes().len(), 2 * 3);
        assert_eq!(frame.ink_at(9, 2), Some(Ink::White));
        assert_eq!(frame.foreground_pixels(), 0);

        let inverted = Frame::new(10, 3, Theme::WHITE);
        assert_eq!(inverted.ink_at(0, 0), Some(Ink::Black));
    }

    #[test]
    fn drawing_sets_foreground_ink() {
        let mut frame = Frame::new(16, 16, Theme::BLACK);
        Rectangle::new(Point::new(2, 2), Size::new(3, 2))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut frame)
            .unwrap();
        assert_eq!(frame.foreground_pixels(), 6);
        assert_eq!(frame.ink_at(2, 2), Some(Ink::Black));
        assert_eq!(frame.ink_at(5, 2), Some(Ink::White));
    }

    #[test]
    fn white_theme_draws_white_ink() {
        let mut frame = Frame::new(8, 8, Theme::WHITE);
        Pixel(Point::new(1, 1), BinaryColor::On).draw(&mut frame).unwrap();
        assert_eq!(frame.ink_at(1, 1), Some(Ink::White));
        assert_eq!(frame.foreground_pixels(), 1);
    }

    #[test]
    fn out_of_bounds_pixels_are_clipped() {
        let mut frame = Frame::new(8, 8, Theme::BLACK);
        Pixel(Point::new(-1, 3), BinaryColor::On).draw(&mut frame).unwrap();
        Pixel(Point::new(8, 3), BinaryColor::On).draw(&mut frame).unwrap();
        assert_eq!(frame.foreground_pixels(), 0);
        assert_eq!(frame.ink_at(8, 0), None);
    }

    #[test]
    fn pbm_header_and_raster() {
        let mut frame = Frame::new(9, 1, Theme::BLACK);
        Pixel(Point::new(0, 0), BinaryColor::On).draw(&mut frame).unwrap();
        Pixel(Point::new(8, 0), BinaryColor::On).draw(&mut frame).unwrap();
        let pbm = frame.to_pbm();
        assert_eq!(&pbm[..7], b"P4\n9 1\n");
        assert_eq!(&pbm[7..], &[0x80, 0x80]);
    }
}

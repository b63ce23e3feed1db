//! Off-screen RGB565 framebuffer and the full-screen views drawn into it.
//!
//! - `colors`: palette
//! - `styles`: pre-computed text styles
//! - `vehicle`: line-art vehicle glyph shared by the splash and inclinometer
//! - `screens`: splash, environment, inclinometer and the diagnostics overlay
//!
//! # Pixel Format
//!
//! Frames are stored exactly as the ST7789 expects them on the wire: row-major,
//! two bytes per pixel, big-endian RGB565. The presenter can DMA a finished
//! frame without touching it.

pub mod colors;
pub mod screens;
pub mod styles;
pub mod vehicle;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::config::layout::BYTES_PER_PIXEL;
use crate::config::{FRAME_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};

/// One off-screen frame.
pub type Frame = [u8; FRAME_BYTES];

const WIDTH: usize = SCREEN_WIDTH as usize;
const HEIGHT: usize = SCREEN_HEIGHT as usize;

#[inline]
fn encode(color: Rgb565) -> [u8; 2] {
    let raw: RawU16 = color.into();
    raw.into_inner().to_be_bytes()
}

/// `DrawTarget` over one frame.
///
/// Holds no hardware. The producer creates one per frame around the buffer
/// handed out by the pipeline.
pub struct FrameRenderer<'a> {
    framebuffer: &'a mut [u8],
}

impl<'a> FrameRenderer<'a> {
    /// Wrap a frame. Returns `None` if the slice is not exactly one frame.
    pub fn new(framebuffer: &'a mut [u8]) -> Option<Self> {
        if framebuffer.len() != FRAME_BYTES {
            return None;
        }
        Some(Self { framebuffer })
    }

    /// Wrap a frame whose size is known at compile time.
    pub fn from_frame(frame: &'a mut Frame) -> Self {
        Self {
            framebuffer: frame.as_mut_slice(),
        }
    }

    /// Fill the whole frame, two pixels per 32-bit word.
    pub fn clear_buffer(
        &mut self,
        color: Rgb565,
    ) {
        let [hi, lo] = encode(color);
        let word = [hi, lo, hi, lo];
        for chunk in self.framebuffer.chunks_exact_mut(4) {
            chunk.copy_from_slice(&word);
        }
    }

    /// Colour at a point, `None` outside the screen.
    pub fn pixel(
        &self,
        x: i32,
        y: i32,
    ) -> Option<Rgb565> {
        let idx = Self::index(x, y)?;
        let raw = u16::from_be_bytes([self.framebuffer[idx], self.framebuffer[idx + 1]]);
        Some(RawU16::new(raw).into())
    }

    #[inline]
    fn index(
        x: i32,
        y: i32,
    ) -> Option<usize> {
        if x >= 0 && x < WIDTH as i32 && y >= 0 && y < HEIGHT as i32 {
            Some((y as usize * WIDTH + x as usize) * BYTES_PER_PIXEL)
        } else {
            None
        }
    }

    #[inline]
    fn set_pixel(
        &mut self,
        x: i32,
        y: i32,
        color: Rgb565,
    ) {
        if let Some(idx) = Self::index(x, y) {
            self.framebuffer[idx..idx + 2].copy_from_slice(&encode(color));
        }
    }
}

impl OriginDimensions for FrameRenderer<'_> {
    fn size(&self) -> Size { Size::new(SCREEN_WIDTH, SCREEN_HEIGHT) }
}

impl DrawTarget for FrameRenderer<'_> {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_contiguous<I>(
        &mut self,
        area: &Rectangle,
        colors: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // Colours are laid out over the full area, so clipped points still consume one
        let mut colors = colors.into_iter();
        for point in area.points() {
            match colors.next() {
                Some(color) => self.set_pixel(point.x, point.y, color),
                None => break,
            }
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let drawable_area = area.intersection(&self.bounding_box());
        if drawable_area.size == Size::zero() {
            return Ok(());
        }

        let bytes = encode(color);
        let x_start = drawable_area.top_left.x as usize;
        let width = drawable_area.size.width as usize;

        for y in drawable_area.rows() {
            let row_start = (y as usize * WIDTH + x_start) * BYTES_PER_PIXEL;
            let row = &mut self.framebuffer[row_start..row_start + width * BYTES_PER_PIXEL];
            for pixel in row.chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&bytes);
            }
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        self.clear_buffer(color);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use embedded_graphics::primitives::PrimitiveStyle;

    use super::*;
    use crate::render::colors::{BLACK, WHITE, YELLOW};

    /// Heap-allocated blank frame for render tests.
    pub(crate) fn blank_frame() -> Box<Frame> { Box::new([0u8; FRAME_BYTES]) }

    /// Count pixels of `color` inside `area`.
    pub(crate) fn count_in(
        renderer: &FrameRenderer<'_>,
        area: Rectangle,
        color: Rgb565,
    ) -> usize {
        area.points()
            .filter(|p| renderer.pixel(p.x, p.y) == Some(color))
            .count()
    }

    #[test]
    fn test_rejects_wrong_size() {
        let mut short = [0u8; 16];
        assert!(FrameRenderer::new(&mut short).is_none());
    }

    #[test]
    fn test_clear_writes_big_endian() {
        let mut frame = blank_frame();
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        renderer.clear_buffer(YELLOW);
        assert_eq!(renderer.pixel(0, 0), Some(YELLOW));
        assert_eq!(renderer.pixel(239, 239), Some(YELLOW));

        let raw: RawU16 = YELLOW.into();
        let expected = raw.into_inner().to_be_bytes();
        assert_eq!(&frame[..2], &expected);
        assert_eq!(&frame[FRAME_BYTES - 2..], &expected);
    }

    #[test]
    fn test_draw_clips_to_screen() {
        let mut frame = blank_frame();
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        renderer.clear_buffer(BLACK);
        Pixel(Point::new(-1, 5), WHITE).draw(&mut renderer).ok();
        Pixel(Point::new(240, 5), WHITE).draw(&mut renderer).ok();
        Pixel(Point::new(3, 4), WHITE).draw(&mut renderer).ok();

        assert_eq!(renderer.pixel(3, 4), Some(WHITE));
        assert_eq!(renderer.pixel(240, 5), None);
        assert_eq!(count_in(&renderer, renderer.bounding_box(), WHITE), 1);
    }

    #[test]
    fn test_fill_solid_partially_offscreen() {
        let mut frame = blank_frame();
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        renderer.clear_buffer(BLACK);
        Rectangle::new(Point::new(235, 235), Size::new(10, 10))
            .into_styled(PrimitiveStyle::with_fill(WHITE))
            .draw(&mut renderer)
            .ok();

        assert_eq!(count_in(&renderer, renderer.bounding_box(), WHITE), 25);
        assert_eq!(renderer.pixel(234, 234), Some(BLACK));
    }

    #[test]
    fn test_fill_contiguous_skips_clipped_colors() {
        let mut frame = blank_frame();
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        renderer.clear_buffer(BLACK);
        let area = Rectangle::new(Point::new(-1, 0), Size::new(2, 1));
        renderer.fill_contiguous(&area, [YELLOW, WHITE]).ok();

        // (-1, 0) consumed YELLOW, (0, 0) gets WHITE
        assert_eq!(renderer.pixel(0, 0), Some(WHITE));
    }
}

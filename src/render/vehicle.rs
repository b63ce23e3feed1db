//! Side-view vehicle glyph.
//!
//! Drawn from primitives inside a 120x120 box whose top-left corner is the
//! `origin`. The splash draws it light on black; the inclinometer draws it
//! dark over the sky and ground so it reads on both.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle};

use super::colors::{BLACK, VEHICLE_DARK, VEHICLE_LIGHT, WHITE};

/// Glyph box edge length.
pub const VEHICLE_SIZE: u32 = 120;

/// Colours of one glyph variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VehicleStyle {
    pub body: Rgb565,
    pub outline: Rgb565,
    pub glass: Rgb565,
}

impl VehicleStyle {
    /// For dark backgrounds.
    pub const LIGHT: Self = Self {
        body: VEHICLE_LIGHT,
        outline: WHITE,
        glass: BLACK,
    };

    /// For light backgrounds.
    pub const DARK: Self = Self {
        body: VEHICLE_DARK,
        outline: BLACK,
        glass: WHITE,
    };
}

/// Draw the glyph with its box at `origin`.
pub fn draw_vehicle<D>(
    display: &mut D,
    origin: Point,
    style: VehicleStyle,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let panel = PrimitiveStyleBuilder::new()
        .fill_color(style.body)
        .stroke_color(style.outline)
        .stroke_width(2)
        .build();
    let glass = PrimitiveStyle::with_fill(style.glass);
    let tyre = PrimitiveStyle::with_fill(style.outline);
    let hub = PrimitiveStyle::with_fill(style.body);
    let trim = PrimitiveStyle::with_stroke(style.outline, 2);

    // Cabin, then the lower body overlapping its bottom edge
    Rectangle::new(origin + Point::new(22, 28), Size::new(74, 36))
        .into_styled(panel)
        .draw(display)
        .ok();
    RoundedRectangle::with_equal_corners(
        Rectangle::new(origin + Point::new(6, 60), Size::new(108, 32)),
        Size::new(6, 6),
    )
    .into_styled(panel)
    .draw(display)
    .ok();

    // Side windows
    Rectangle::new(origin + Point::new(28, 34), Size::new(28, 22))
        .into_styled(glass)
        .draw(display)
        .ok();
    Rectangle::new(origin + Point::new(62, 34), Size::new(28, 22))
        .into_styled(glass)
        .draw(display)
        .ok();

    // Spare wheel on the tailgate
    Rectangle::new(origin + Point::new(0, 62), Size::new(6, 24))
        .into_styled(tyre)
        .draw(display)
        .ok();

    // Door line and bumper
    Line::new(origin + Point::new(59, 62), origin + Point::new(59, 88))
        .into_styled(trim)
        .draw(display)
        .ok();
    Line::new(origin + Point::new(108, 80), origin + Point::new(119, 80))
        .into_styled(trim)
        .draw(display)
        .ok();

    for x in [16, 72] {
        Circle::new(origin + Point::new(x, 78), 32)
            .into_styled(tyre)
            .draw(display)
            .ok();
        Circle::new(origin + Point::new(x + 10, 88), 12)
            .into_styled(hub)
            .draw(display)
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FrameRenderer;
    use crate::render::tests::{blank_frame, count_in};

    #[test]
    fn test_vehicle_stays_inside_its_box() {
        let mut frame = blank_frame();
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        renderer.clear_buffer(BLACK);
        let origin = Point::new(56, 40);
        draw_vehicle(&mut renderer, origin, VehicleStyle::LIGHT);

        let glyph_box = Rectangle::new(origin, Size::new(VEHICLE_SIZE, VEHICLE_SIZE));
        let total = 240 * 240 - count_in(&renderer, renderer.bounding_box(), BLACK);
        let inside = (VEHICLE_SIZE * VEHICLE_SIZE) as usize - count_in(&renderer, glyph_box, BLACK);
        assert!(total > 0);
        assert_eq!(total, inside);
    }

    #[test]
    fn test_variants_use_their_body_color() {
        let mut frame = blank_frame();
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        renderer.clear_buffer(WHITE);
        draw_vehicle(&mut renderer, Point::zero(), VehicleStyle::DARK);

        // Middle of the lower body, between the door line and the wheels
        assert_eq!(renderer.pixel(40, 68), Some(VEHICLE_DARK));
        assert_eq!(renderer.pixel(40, 40), Some(WHITE));
    }
}

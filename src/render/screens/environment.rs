//! Environment readout.
//!
//! # Layout
//!
//! ```text
//! +--------------------------+
//! |                          |
//! |          21°C            |  primary unit, large, yellow
//! |                          |
//! |  ^ 63%             70°F  |  drop + humidity, other unit
//! +--------------------------+
//! ```
//!
//! The fonts carry no degree sign, so it is drawn as a small ring between the
//! value and the unit letter.

use core::fmt::Write;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Triangle};
use embedded_graphics::text::Text;
use heapless::String;

use crate::config::{CENTER_X, CENTER_Y, SCREEN_WIDTH};
use crate::record::Unit;
use crate::render::colors::{BLACK, LIGHT_BLUE};
use crate::render::styles::{CENTERED, NOTICE_STYLE, PRIMARY_STYLE, SECONDARY_STYLE, TOP_LEFT};
use crate::sensors::Climate;

pub const NO_DATA: &str = "NO DATA";

const PRIMARY_Y: i32 = 90;
const BOTTOM_ROW_Y: i32 = 205;
const RIGHT_MARGIN: i32 = 12;
const HUMIDITY_X: i32 = 42;

/// Whole-degree temperature with its unit.
struct Temperature {
    digits: String<8>,
    unit: Unit,
}

impl Temperature {
    fn new(
        climate: &Climate,
        unit: Unit,
    ) -> Self {
        let mut digits = String::new();
        let _ = write!(digits, "{:.0}", climate.temperature(unit));
        Self { digits, unit }
    }

    /// Degree ring diameter for a font.
    fn ring(font: &MonoFont) -> u32 { (font.character_size.width / 2).max(4) }

    fn width(
        &self,
        font: &MonoFont,
    ) -> u32 {
        let advance = font.character_size.width + font.character_spacing;
        (self.digits.len() as u32 + 1) * advance + Self::ring(font) + 2
    }

    fn draw<D>(
        &self,
        display: &mut D,
        top_left: Point,
        style: MonoTextStyle<'_, Rgb565>,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        let ring = Self::ring(style.font);
        let Ok(next) = Text::with_text_style(&self.digits, top_left, style, TOP_LEFT).draw(display) else {
            return;
        };

        let stroke = (ring / 4).max(1);
        if let Some(color) = style.text_color {
            Circle::new(next + Point::new(1, 2), ring)
                .into_styled(PrimitiveStyle::with_stroke(color, stroke))
                .draw(display)
                .ok();
        }

        let suffix_at = Point::new(next.x + ring as i32 + 2, top_left.y);
        Text::with_text_style(self.unit.suffix(), suffix_at, style, TOP_LEFT)
            .draw(display)
            .ok();
    }
}

fn draw_drop<D>(display: &mut D)
where
    D: DrawTarget<Color = Rgb565>,
{
    let fill = PrimitiveStyle::with_fill(LIGHT_BLUE);
    Circle::with_center(Point::new(25, 219), 17)
        .into_styled(fill)
        .draw(display)
        .ok();
    Triangle::new(Point::new(19, 215), Point::new(25, 205), Point::new(31, 215))
        .into_styled(fill)
        .draw(display)
        .ok();
}

/// Draw the environment screen. `None` means no trustworthy reading.
pub fn draw_environment<D>(
    display: &mut D,
    climate: Option<&Climate>,
    unit: Unit,
) where
    D: DrawTarget<Color = Rgb565>,
{
    display.clear(BLACK).ok();

    let Some(climate) = climate else {
        Text::with_text_style(NO_DATA, Point::new(CENTER_X, CENTER_Y), NOTICE_STYLE, CENTERED)
            .draw(display)
            .ok();
        return;
    };

    let primary = Temperature::new(climate, unit);
    let width = primary.width(PRIMARY_STYLE.font) as i32;
    primary.draw(display, Point::new((SCREEN_WIDTH as i32 - width) / 2, PRIMARY_Y), PRIMARY_STYLE);

    let secondary = Temperature::new(climate, unit.toggle());
    let width = secondary.width(SECONDARY_STYLE.font) as i32;
    let x = SCREEN_WIDTH as i32 - width - RIGHT_MARGIN;
    secondary.draw(display, Point::new(x, BOTTOM_ROW_Y), SECONDARY_STYLE);

    let mut humidity: String<8> = String::new();
    let _ = write!(humidity, "{:.0}%", climate.humidity_pct);
    Text::with_text_style(&humidity, Point::new(HUMIDITY_X, BOTTOM_ROW_Y), SECONDARY_STYLE, TOP_LEFT)
        .draw(display)
        .ok();
    draw_drop(display);
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::primitives::Rectangle;

    use super::*;
    use crate::render::FrameRenderer;
    use crate::render::colors::{WHITE, YELLOW};
    use crate::render::tests::{blank_frame, count_in};

    fn climate() -> Climate {
        Climate {
            temperature_c: 21.0,
            dew_point_c: 18.0,
            humidity_pct: 85.0,
            pressure_hpa: 1013.25,
        }
    }

    #[test]
    fn test_temperature_text() {
        let celsius = Temperature::new(&climate(), Unit::Celsius);
        assert_eq!(celsius.digits.as_str(), "21");
        let fahrenheit = Temperature::new(&climate(), Unit::Fahrenheit);
        assert_eq!(fahrenheit.digits.as_str(), "70");
    }

    #[test]
    fn test_primary_is_centered_and_yellow() {
        let mut frame = blank_frame();
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        draw_environment(&mut renderer, Some(&climate()), Unit::Celsius);

        let left = Rectangle::new(Point::new(0, PRIMARY_Y), Size::new(120, 40));
        let right = Rectangle::new(Point::new(120, PRIMARY_Y), Size::new(120, 40));
        let (l, r) = (count_in(&renderer, left, YELLOW), count_in(&renderer, right, YELLOW));
        assert!(l > 0 && r > 0);
        // Nothing yellow outside the primary row
        let all = count_in(&renderer, renderer.bounding_box(), YELLOW);
        assert_eq!(all, l + r);
    }

    #[test]
    fn test_bottom_row_has_humidity_and_secondary() {
        let mut frame = blank_frame();
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        draw_environment(&mut renderer, Some(&climate()), Unit::Fahrenheit);

        let drop = Rectangle::new(Point::new(16, 205), Size::new(18, 24));
        assert!(count_in(&renderer, drop, LIGHT_BLUE) > 0);

        let humidity = Rectangle::new(Point::new(HUMIDITY_X, BOTTOM_ROW_Y), Size::new(60, 30));
        assert!(count_in(&renderer, humidity, WHITE) > 0);

        let secondary = Rectangle::new(Point::new(150, BOTTOM_ROW_Y), Size::new(78, 30));
        assert!(count_in(&renderer, secondary, WHITE) > 0);
        let margin = Rectangle::new(Point::new(240 - RIGHT_MARGIN + 1, 0), Size::new(11, 240));
        assert_eq!(count_in(&renderer, margin, WHITE), 0);
    }

    #[test]
    fn test_no_data() {
        let mut frame = blank_frame();
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        draw_environment(&mut renderer, None, Unit::Celsius);

        assert_eq!(count_in(&renderer, renderer.bounding_box(), YELLOW), 0);
        assert_eq!(count_in(&renderer, renderer.bounding_box(), LIGHT_BLUE), 0);
        let center = Rectangle::new(Point::new(60, 105), Size::new(120, 30));
        assert!(count_in(&renderer, center, WHITE) > 0);
    }
}

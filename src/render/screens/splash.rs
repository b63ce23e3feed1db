//! Boot splash: vehicle glyph, title and credit line.

use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;

use crate::config::CENTER_X;
use crate::render::colors::BLACK;
use crate::render::styles::{CENTERED, CREDIT_STYLE, TITLE_STYLE};
use crate::render::vehicle::{VehicleStyle, draw_vehicle};

pub const TITLE: &str = "Jimny I/O";
pub const CREDIT: &str = "(c) 2025 Sunny and Rosita LLC";

const VEHICLE_ORIGIN: Point = Point::new(56, 40);
const TITLE_Y: i32 = 182;
const CREDIT_Y: i32 = 226;

/// Draw the splash screen.
pub fn draw_splash<D>(display: &mut D)
where
    D: DrawTarget<Color = embedded_graphics::pixelcolor::Rgb565>,
{
    display.clear(BLACK).ok();
    draw_vehicle(display, VEHICLE_ORIGIN, VehicleStyle::LIGHT);

    Text::with_text_style(TITLE, Point::new(CENTER_X, TITLE_Y), TITLE_STYLE, CENTERED)
        .draw(display)
        .ok();
    Text::with_text_style(CREDIT, Point::new(CENTER_X, CREDIT_Y), CREDIT_STYLE, CENTERED)
        .draw(display)
        .ok();
}

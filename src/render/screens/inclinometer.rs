//! Artificial horizon with the vehicle glyph.
//!
//! The ground is filled column by column below the horizon line, so any roll
//! angle (including horizons that leave the screen through the top or bottom)
//! fills correctly.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};

use crate::config::{CENTER_X, CENTER_Y, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::render::colors::{BLACK, GRASS_GREEN_DAY, SKY_BLUE_DAY};
use crate::render::vehicle::{VehicleStyle, draw_vehicle};
use crate::sensors::Horizon;

const VEHICLE_ORIGIN: Point = Point::new(56, 56);

/// Cross-hair arm length, measured from the screen edge.
const CROSSHAIR_ARM: i32 = 70;

/// Horizon height at column `x`.
fn horizon_y(
    horizon: &Horizon,
    x: i32,
) -> i32 {
    let dx = horizon.right.x - horizon.left.x;
    if dx == 0 {
        return horizon.left.y;
    }
    horizon.left.y + (horizon.right.y - horizon.left.y) * (x - horizon.left.x) / dx
}

fn draw_ground<D>(
    display: &mut D,
    horizon: &Horizon,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let height = SCREEN_HEIGHT as i32;
    for x in 0..SCREEN_WIDTH as i32 {
        let top = horizon_y(horizon, x).clamp(0, height);
        if top < height {
            display
                .fill_solid(&Rectangle::new(Point::new(x, top), Size::new(1, (height - top) as u32)), GRASS_GREEN_DAY)
                .ok();
        }
    }
}

fn draw_crosshair<D>(display: &mut D)
where
    D: DrawTarget<Color = Rgb565>,
{
    let width = SCREEN_WIDTH as i32;
    let height = SCREEN_HEIGHT as i32;
    let style = PrimitiveStyle::with_stroke(BLACK, 1);
    let arms = [
        (Point::new(CENTER_X, 0), Point::new(CENTER_X, CROSSHAIR_ARM)),
        (Point::new(CENTER_X, height - CROSSHAIR_ARM), Point::new(CENTER_X, height)),
        (Point::new(0, CENTER_Y), Point::new(CROSSHAIR_ARM, CENTER_Y)),
        (Point::new(width - CROSSHAIR_ARM, CENTER_Y), Point::new(width, CENTER_Y)),
    ];
    for (start, end) in arms {
        Line::new(start, end).into_styled(style).draw(display).ok();
    }
}

/// Draw the inclinometer screen for a horizon.
pub fn draw_inclinometer<D>(
    display: &mut D,
    horizon: &Horizon,
) where
    D: DrawTarget<Color = Rgb565>,
{
    display.clear(SKY_BLUE_DAY).ok();
    draw_ground(display, horizon);
    draw_crosshair(display);
    draw_vehicle(display, VEHICLE_ORIGIN, VehicleStyle::DARK);
}

// =============================================================================
// Unit Tests
// =============================================================================

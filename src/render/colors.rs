//! Color constants for the instrument cluster.
//!
//! The palette is specified in 8-bit RGB and narrowed to RGB565 at compile
//! time with [`rgb`], so the values match what the panel can actually show.

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

/// Narrow an 8-bit-per-channel colour to RGB565.
pub const fn rgb(
    r: u8,
    g: u8,
    b: u8,
) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

// =============================================================================
// Standard Colors
// =============================================================================

/// Background of the splash and environment screens.
pub const BLACK: Rgb565 = Rgb565::BLACK;

/// Secondary values, titles and the diagnostics overlay.
pub const WHITE: Rgb565 = Rgb565::WHITE;

// =============================================================================
// Custom Colors
// =============================================================================

/// Primary temperature.
pub const YELLOW: Rgb565 = rgb(242, 203, 0);

/// Humidity drop icon.
pub const LIGHT_BLUE: Rgb565 = rgb(93, 177, 247);

/// Inclinometer sky.
pub const SKY_BLUE_DAY: Rgb565 = rgb(139, 214, 245);

/// Inclinometer ground.
pub const GRASS_GREEN_DAY: Rgb565 = rgb(186, 234, 147);

/// Vehicle glyph panels on the splash screen.
pub const VEHICLE_LIGHT: Rgb565 = rgb(213, 213, 213);

/// Vehicle glyph panels over the inclinometer sky.
pub const VEHICLE_DARK: Rgb565 = rgb(146, 146, 146);

/// Dimmed text, used for the splash credit line.
pub const GRAY: Rgb565 = rgb(128, 128, 128);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_narrows_channels() {
        assert_eq!(rgb(255, 255, 255), WHITE);
        assert_eq!(rgb(0, 0, 0), BLACK);
        assert_eq!(YELLOW, Rgb565::new(30, 50, 0));
    }
}

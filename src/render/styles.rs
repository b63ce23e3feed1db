//! Pre-computed text styles.
//!
//! Styles are `const`, so drawing a screen never constructs a style at run
//! time.

use embedded_graphics::{
    mono_font::{
        MonoTextStyle, MonoTextStyleBuilder,
        ascii::{FONT_6X10, FONT_10X20},
    },
    pixelcolor::Rgb565,
    text::{Alignment, Baseline, TextStyle, TextStyleBuilder},
};
use profont::{PROFONT_18_POINT, PROFONT_24_POINT};

use super::colors::{BLACK, GRAY, WHITE, YELLOW};

// =============================================================================
// Text Alignment Styles
// =============================================================================

/// Centered on the anchor point.
pub const CENTERED: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Center)
    .baseline(Baseline::Middle)
    .build();

/// Anchor is the top-left corner of the text box.
pub const TOP_LEFT: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Left)
    .baseline(Baseline::Top)
    .build();

/// Anchor is the top-right corner of the text box.
pub const TOP_RIGHT: TextStyle = TextStyleBuilder::new()
    .alignment(Alignment::Right)
    .baseline(Baseline::Top)
    .build();

// =============================================================================
// Pre-computed Text Styles
// =============================================================================

/// Primary temperature.
pub const PRIMARY_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&PROFONT_24_POINT, YELLOW);

/// Secondary temperature and humidity.
pub const SECONDARY_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&PROFONT_18_POINT, WHITE);

/// Splash title.
pub const TITLE_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&PROFONT_24_POINT, WHITE);

/// "NO DATA" and other notices.
pub const NOTICE_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&FONT_10X20, WHITE);

/// Diagnostics overlay text, boxed so it reads over the inclinometer sky.
pub const OVERLAY_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyleBuilder::new()
    .font(&FONT_6X10)
    .text_color(WHITE)
    .background_color(BLACK)
    .build();

/// Splash credit line.
pub const CREDIT_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(&FONT_6X10, GRAY);

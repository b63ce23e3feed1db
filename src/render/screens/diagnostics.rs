//! Diagnostics overlay drawn over the current view.
//!
//! # Layout
//!
//! ```text
//! C0 5120us, C1 14800us
//! Ren: 4300us, Stk: 3k
//! Frames: 1234
//! Flash: slot 7, 0 erases, 0 fail
//! Sensor misses: 0
//! <newest log lines>
//! ```

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Text;
use heapless::String;

use crate::config::layout::OVERLAY_LINE_HEIGHT;
use crate::orchestrator::Diagnostics;
use crate::render::styles::{OVERLAY_STYLE, TOP_LEFT};

/// Log lines shown below the counters.
pub const MAX_OVERLAY_LOG_LINES: usize = 6;

const OVERLAY_X: i32 = 2;

fn draw_line<D>(
    display: &mut D,
    text: &str,
    y: &mut i32,
) where
    D: DrawTarget<Color = Rgb565>,
{
    Text::with_text_style(text, Point::new(OVERLAY_X, *y), OVERLAY_STYLE, TOP_LEFT)
        .draw(display)
        .ok();
    *y += OVERLAY_LINE_HEIGHT;
}

/// Draw the overlay. `logs` are drawn oldest first; only the newest
/// [`MAX_OVERLAY_LOG_LINES`] are shown.
pub fn draw_diagnostics_overlay<D>(
    display: &mut D,
    diagnostics: &Diagnostics,
    logs: &[&str],
) where
    D: DrawTarget<Color = Rgb565>,
{
    let mut y = 0;
    let mut s: String<40> = String::new();

    let _ = write!(s, "C0 {}us, C1 {}us", diagnostics.loop_us, diagnostics.present_us);
    draw_line(display, &s, &mut y);

    s.clear();
    let _ = write!(s, "Ren: {}us, Stk: {}k", diagnostics.render_us, diagnostics.stack_used_kb);
    draw_line(display, &s, &mut y);

    s.clear();
    let _ = write!(s, "Frames: {}", diagnostics.frames_presented);
    draw_line(display, &s, &mut y);

    s.clear();
    let _ = write!(
        s,
        "Flash: slot {}, {} erases, {} fail",
        diagnostics.flash_slot, diagnostics.flash_erases, diagnostics.flash_failures
    );
    draw_line(display, &s, &mut y);

    s.clear();
    let _ = write!(s, "Sensor misses: {}", diagnostics.sensor_misses);
    draw_line(display, &s, &mut y);

    let skip = logs.len().saturating_sub(MAX_OVERLAY_LOG_LINES);
    for line in &logs[skip..] {
        draw_line(display, line, &mut y);
    }
}

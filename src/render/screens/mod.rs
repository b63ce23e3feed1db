//! Full-screen views and the diagnostics overlay.
//!
//! Every `draw_*` function repaints the whole frame except the overlay, which
//! is drawn on top of whatever view was rendered.

mod diagnostics;
mod environment;
mod inclinometer;
mod splash;

pub use diagnostics::{MAX_OVERLAY_LOG_LINES, draw_diagnostics_overlay};
pub use environment::{NO_DATA, draw_environment};
pub use inclinometer::draw_inclinometer;
pub use splash::{CREDIT, TITLE, draw_splash};

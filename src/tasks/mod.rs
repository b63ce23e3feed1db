//! Async tasks for the firmware.
//!
//! - `present`: core 1 presenter, DMA of finished frames to the display

pub mod present;

pub use present::{FRAME_DONE, FRAME_READY, present_task};

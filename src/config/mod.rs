//! Application configuration.
//!
//! - `layout`: Display dimensions and pre-computed layout constants
//! - `storage`: Flash geometry and the reserved state region
//! - `timing`: Splash hold, persistence retry and debounce timing

pub mod layout;
pub mod storage;
pub mod timing;

// Re-export layout constants at config level for convenience
pub use layout::{CENTER_X, CENTER_Y, FRAME_BYTES, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use storage::{ERASE_BLOCK_SIZE, FLASH_SIZE, RECORD_SIZE, STATE_REGION_OFFSET, STATE_REGION_SIZE};
pub use timing::{DEBOUNCE_MS, PERSIST_MAX_ATTEMPTS, PERSIST_RETRY_MS, SPLASH_HOLD_MS};

//! Timing constants for the orchestrator and input handling.

/// How long the splash screen is held before switching to the restored view.
pub const SPLASH_HOLD_MS: u32 = 1000;

/// Minimum time between two attempts to persist the same state after a flash failure.
pub const PERSIST_RETRY_MS: u32 = 5000;

/// Attempts per distinct (mode, unit) value before persistence gives up until the state changes.
pub const PERSIST_MAX_ATTEMPTS: u8 = 3;

/// Button debounce duration in milliseconds.
pub const DEBOUNCE_MS: u64 = 50;

/// Interval of the heartbeat LED toggle.
pub const HEARTBEAT_MS: u32 = 1000;

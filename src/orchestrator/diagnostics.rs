//! Counters behind the diagnostics overlay.

/// Runtime counters. Never persisted.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Diagnostics {
    /// Producer loop time of the last cycle.
    pub loop_us: u32,
    /// Presenter time for the last frame.
    pub present_us: u32,
    /// Time spent drawing the last frame.
    pub render_us: u32,
    pub frames_presented: u32,
    /// Append cursor of the flash log.
    pub flash_slot: usize,
    pub flash_erases: u32,
    /// Failed appends (each attempt counts).
    pub flash_failures: u32,
    /// Environment samples the sensor failed to deliver.
    pub sensor_misses: u32,
    pub stack_used_kb: u32,
}

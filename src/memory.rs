//! Memory profiling utilities for RP2350.
//!
//! # Memory Layout (RP2350)
//!
//! - RAM: 512KB at 0x20000000 (striped across SRAM0-7)
//! - SRAM4/SRAM5: 4KB each, direct mapped; SRAM5 holds the core 1 stack
//!
//! # Stack
//!
//! Core 0 runs on the main stack, which grows down from the top of striped
//! RAM. Usage is measured by comparing MSP to that top.

use crate::config::FRAME_BYTES;

/// RP2350 RAM configuration.
pub const RAM_START: u32 = 0x2000_0000;
pub const RAM_SIZE: u32 = 512 * 1024;
const RAM_END: u32 = RAM_START + RAM_SIZE;

/// The two off-screen frames owned by the frame pipeline.
pub const TOTAL_FRAMEBUFFER_SIZE: usize = FRAME_BYTES * 2;

/// Other statics (executors, log buffer, driver state), estimated.
const OTHER_STATICS: u32 = 32 * 1024;

/// Memory statistics snapshot.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct MemoryStats {
    /// Stack pointer the snapshot was taken at.
    pub stack_ptr: u32,
    /// Estimated stack usage in bytes.
    pub stack_used: u32,
    /// RAM left for the stack after static allocations.
    pub stack_total: u32,
    /// Known static RAM usage (framebuffers + estimated overhead).
    pub static_ram: u32,
}

impl MemoryStats {
    /// Snapshot for a given main stack pointer.
    pub fn at_stack_pointer(stack_ptr: u32) -> Self {
        let static_ram = TOTAL_FRAMEBUFFER_SIZE as u32 + OTHER_STATICS;
        Self {
            stack_ptr,
            stack_used: RAM_END.saturating_sub(stack_ptr),
            stack_total: RAM_SIZE.saturating_sub(static_ram),
            static_ram,
        }
    }

    /// Snapshot of the current core's main stack.
    #[cfg(target_arch = "arm")]
    pub fn collect() -> Self { Self::at_stack_pointer(cortex_m::register::msp::read()) }

    /// Stack usage in whole KB, as shown on the overlay.
    #[inline]
    pub const fn stack_used_kb(&self) -> u32 { self.stack_used / 1024 }

    /// Stack usage as a percentage of the space left for it.
    pub fn stack_percent(&self) -> u32 {
        if self.stack_total > 0 {
            (self.stack_used * 100) / self.stack_total
        } else {
            0
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Flash geometry for the persisted state region.
//!
//! # Memory Layout (Pico 2, 4MB QSPI flash)
//!
//! ```text
//! [Firmware]      0x000000 - 0x3FF000   DO NOT WRITE
//! [State region]  0x3FF000 - 0x400000   (4 KB, one erase block)
//! ```
//!
//! The region is the last erase block of the flash and is reserved for the
//! append-only state log. Nothing else may live there.

/// Total QSPI flash size on the Pico 2.
pub const FLASH_SIZE: usize = 4 * 1024 * 1024;

/// Smallest erasable unit of the RP2350's QSPI flash.
pub const ERASE_BLOCK_SIZE: usize = 4096;

/// Size of the state region (exactly one erase block).
pub const STATE_REGION_SIZE: usize = ERASE_BLOCK_SIZE;

/// Offset of the state region from the start of flash.
pub const STATE_REGION_OFFSET: u32 = (FLASH_SIZE - STATE_REGION_SIZE) as u32;

/// Width of one persisted record (and therefore of one slot).
pub const RECORD_SIZE: usize = 4;

//! Persisted (mode, unit) record.
//!
//! One record is 4 bytes. Flash is erased to all ones (`0xFF`) and programming
//! can only clear bits, so the layout is chosen so that every written record
//! differs from the erased pattern in byte 0 and never needs a bit set again.
//!
//! # Byte 0 layout (bit 0 = LSB)
//!
//! ```text
//! | 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 |
//! | VALID |    MODE   | U | RSVD  |
//! ```
//!
//! - `VALID`: `0b11` unused or not yet committed, `0b10` written
//! - `MODE`: `000` Environment, `001` Inclinometer, `010`-`111` reserved
//! - `U`: `0` Celsius, `1` Fahrenheit
//! - `RSVD`: written as zero
//!
//! Bytes 1-3 are reserved, written as zero and ignored on read.
//!
//! # Commit
//!
//! A record is programmed twice. The first program clears the data bits and
//! leaves `VALID` at `0b11` ([`PersistentRecord::encode_pending`]), the second
//! clears bit 0 ([`PersistentRecord::encode`]). A slot whose `VALID` is still
//! `0b11` is [`SlotKind::Uncommitted`] however many data bits landed, so a torn
//! program can never read back as a different record.

use core::fmt;

use crate::config::RECORD_SIZE;

/// Byte pattern of an erased (unused) slot.
pub const ERASED_BYTE: u8 = 0xFF;

const VALID_MASK: u8 = 0b0000_0011;
const VALID_PENDING: u8 = 0b0000_0011;
const VALID_WRITTEN: u8 = 0b0000_0010;
const MODE_SHIFT: u8 = 2;
const MODE_MASK: u8 = 0b0001_1100;
const UNIT_BIT: u8 = 0b0010_0000;
const RESERVED_MASK: u8 = 0b1100_0000;

/// Persistable display mode. Splash is a transient boot view and has no encoding.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Mode {
    /// Temperature and humidity readout.
    #[default]
    Environment,
    /// Pitch/roll horizon view.
    Inclinometer,
}

impl Mode {
    /// Switch to the other mode.
    #[inline]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Environment => Self::Inclinometer,
            Self::Inclinometer => Self::Environment,
        }
    }

    const fn bits(self) -> u8 {
        match self {
            Self::Environment => 0b000,
            Self::Inclinometer => 0b001,
        }
    }

    const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b000 => Some(Self::Environment),
            0b001 => Some(Self::Inclinometer),
            _ => None,
        }
    }
}

/// Temperature unit preference.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Unit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl Unit {
    /// Switch to the other unit.
    #[inline]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    /// Suffix shown after a temperature value.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

/// Why a slot could not be decoded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum RecordError {
    /// Slot still holds the erased pattern.
    Unused,
    /// Slot is all-zero skip padding.
    Padding,
    /// Data bits programmed but the validity marker never committed.
    Uncommitted,
    /// Validity marker, mode or reserved bits outside the defined ranges.
    Corrupt(u8),
}

impl fmt::Display for RecordError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Unused => f.write_str("unused slot"),
            Self::Padding => f.write_str("padding slot"),
            Self::Uncommitted => f.write_str("uncommitted slot"),
            Self::Corrupt(byte) => write!(f, "corrupt record 0x{byte:02X}"),
        }
    }
}

/// Classification of a raw slot without decoding it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlotKind {
    /// Erased, available for the next append.
    Unused,
    /// All-zero filler left behind by a single-program granule write.
    Padding,
    /// Interrupted append: programmed, marker still `0b11`.
    Uncommitted,
    /// Programmed; may or may not decode cleanly.
    Written,
}

/// Classify the raw bytes of one slot.
///
/// Only byte 0 decides between used and unused, which is the same test the
/// boot scan uses to find the end of the log.
pub fn classify(bytes: &[u8; RECORD_SIZE]) -> SlotKind {
    if bytes[0] == ERASED_BYTE {
        SlotKind::Unused
    } else if bytes.iter().all(|b| *b == 0) {
        SlotKind::Padding
    } else if bytes[0] & VALID_MASK == VALID_PENDING {
        SlotKind::Uncommitted
    } else {
        SlotKind::Written
    }
}

/// The single persisted value: last selected mode and unit.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct PersistentRecord {
    pub mode: Mode,
    pub unit: Unit,
}

impl PersistentRecord {
    /// Record used when the log is empty or unreadable.
    pub const DEFAULT: Self = Self {
        mode: Mode::Environment,
        unit: Unit::Celsius,
    };

    pub const fn new(
        mode: Mode,
        unit: Unit,
    ) -> Self {
        Self { mode, unit }
    }

    const fn data_bits(self) -> u8 {
        let mut bits = self.mode.bits() << MODE_SHIFT;
        if matches!(self.unit, Unit::Fahrenheit) {
            bits |= UNIT_BIT;
        }
        bits
    }

    /// Encode into the on-flash layout (committed).
    pub const fn encode(self) -> [u8; RECORD_SIZE] { [VALID_WRITTEN | self.data_bits(), 0, 0, 0] }

    /// First-phase image: data bits programmed, marker left at `0b11`.
    ///
    /// Programming [`encode`](Self::encode) over it only clears bit 0.
    pub const fn encode_pending(self) -> [u8; RECORD_SIZE] { [VALID_PENDING | self.data_bits(), 0, 0, 0] }

    /// Decode a slot. Bytes 1-3 are ignored.
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Result<Self, RecordError> {
        match classify(bytes) {
            SlotKind::Unused => return Err(RecordError::Unused),
            SlotKind::Padding => return Err(RecordError::Padding),
            SlotKind::Uncommitted => return Err(RecordError::Uncommitted),
            SlotKind::Written => {}
        }

        let byte0 = bytes[0];
        if byte0 & VALID_MASK != VALID_WRITTEN || byte0 & RESERVED_MASK != 0 {
            return Err(RecordError::Corrupt(byte0));
        }
        let mode = Mode::from_bits((byte0 & MODE_MASK) >> MODE_SHIFT).ok_or(RecordError::Corrupt(byte0))?;
        let unit = if byte0 & UNIT_BIT != 0 { Unit::Fahrenheit } else { Unit::Celsius };

        Ok(Self { mode, unit })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Persistent state storage on a raw NOR flash block.
//!
//! - `flash_log`: append-only record log with scan-on-boot and erase rollover
//! - `ram`: in-memory flash used by host tests
//!
//! # Flash Characteristics
//!
//! - Erase works on whole blocks (4 KB on RP2350) and sets every byte to `0xFF`
//! - Programming can only change bits from 1 to 0
//! - The other core must not execute from flash while a program or erase is
//!   in flight; the RP2350 flash driver pauses core 1 for the duration
//!
//! [`FlashRegion`] is the slot-level view the log is written against. Any
//! `embedded_storage` [`NorFlash`] can be turned into one with
//! [`NorFlashRegion`].

mod flash_log;
mod ram;

use core::fmt;

use embedded_storage::nor_flash::{NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash};

pub use flash_log::{AppendReport, FlashLog, MAX_WRITE_GRANULE, ScanResult, ScanSource};
pub use ram::RamFlash;

/// Hardware-level failure of a flash operation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum FlashError {
    /// Operation did not finish in time (device busy).
    Timeout,
    /// Device reported a failure.
    Fault,
    /// Access outside the region.
    OutOfBounds,
    /// Offset or length violates the device's alignment rules.
    Unaligned,
}

impl fmt::Display for FlashError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "flash timeout",
            Self::Fault => "flash fault",
            Self::OutOfBounds => "flash access out of bounds",
            Self::Unaligned => "unaligned flash access",
        })
    }
}

impl From<NorFlashErrorKind> for FlashError {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => Self::Unaligned,
            NorFlashErrorKind::OutOfBounds => Self::OutOfBounds,
            _ => Self::Fault,
        }
    }
}

/// A fixed, erase-block sized window of flash addressed relative to its start.
///
/// Implementations must behave like NOR flash: `program` ANDs bytes into the
/// existing contents and only `erase` returns them to `0xFF`.
pub trait FlashRegion {
    /// Region size in bytes.
    fn capacity(&self) -> usize;

    /// Smallest unit the device programs at once.
    fn write_granule(&self) -> usize { 1 }

    /// Whether a granule may only be programmed once between erases (e.g. ECC flash).
    fn single_program(&self) -> bool { false }

    /// Read `buf.len()` bytes starting at `offset`.
    fn read(
        &mut self,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), FlashError>;

    /// Program `bytes` starting at `offset`, clearing bits only.
    fn program(
        &mut self,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), FlashError>;

    /// Bulk-erase the whole region.
    fn erase(&mut self) -> Result<(), FlashError>;
}

impl<R: FlashRegion + ?Sized> FlashRegion for &mut R {
    fn capacity(&self) -> usize { (**self).capacity() }

    fn write_granule(&self) -> usize { (**self).write_granule() }

    fn single_program(&self) -> bool { (**self).single_program() }

    fn read(
        &mut self,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), FlashError> {
        (**self).read(offset, buf)
    }

    fn program(
        &mut self,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), FlashError> {
        (**self).program(offset, bytes)
    }

    fn erase(&mut self) -> Result<(), FlashError> { (**self).erase() }
}

/// One erase block of an `embedded_storage` NOR flash device.
pub struct NorFlashRegion<F> {
    flash: F,
    base: u32,
    size: usize,
}

impl<F: NorFlash> NorFlashRegion<F> {
    /// Wrap `size` bytes of `flash` starting at `base`.
    ///
    /// Returns `None` if the window is not erase-block aligned or does not fit
    /// the device.
    pub fn new(
        flash: F,
        base: u32,
        size: usize,
    ) -> Option<Self> {
        let aligned = base as usize % F::ERASE_SIZE == 0 && size % F::ERASE_SIZE == 0 && size > 0;
        let fits = (base as usize).checked_add(size).is_some_and(|end| end <= flash.capacity());
        (aligned && fits).then_some(Self { flash, base, size })
    }

    /// Release the underlying flash device.
    pub fn into_inner(self) -> F { self.flash }

    fn address(
        &self,
        offset: usize,
        len: usize,
    ) -> Result<u32, FlashError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(self.base + offset as u32),
            _ => Err(FlashError::OutOfBounds),
        }
    }
}

impl<F: NorFlash> FlashRegion for NorFlashRegion<F> {
    fn capacity(&self) -> usize { self.size }

    fn write_granule(&self) -> usize { F::WRITE_SIZE }

    fn read(
        &mut self,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), FlashError> {
        let address = self.address(offset, buf.len())?;
        self.flash.read(address, buf).map_err(|e| e.kind().into())
    }

    fn program(
        &mut self,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), FlashError> {
        let address = self.address(offset, bytes.len())?;
        self.flash.write(address, bytes).map_err(|e| e.kind().into())
    }

    fn erase(&mut self) -> Result<(), FlashError> {
        let end = self.base + self.size as u32;
        self.flash.erase(self.base, end).map_err(|e| e.kind().into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_storage::nor_flash::ErrorType;

    use super::*;
    use crate::config::ERASE_BLOCK_SIZE;

    /// Two-block NOR device with 4-byte writes.
    struct TwoBlocks {
        data: [u8; 2 * ERASE_BLOCK_SIZE],
    }

    impl ErrorType for TwoBlocks {
        type Error = NorFlashErrorKind;
    }

    impl ReadNorFlash for TwoBlocks {
        const READ_SIZE: usize = 1;

        fn read(
            &mut self,
            offset: u32,
            bytes: &mut [u8],
        ) -> Result<(), Self::Error> {
            let start = offset as usize;
            bytes.copy_from_slice(&self.data[start..start + bytes.len()]);
            Ok(())
        }

        fn capacity(&self) -> usize { self.data.len() }
    }

    impl NorFlash for TwoBlocks {
        const WRITE_SIZE: usize = 4;
        const ERASE_SIZE: usize = ERASE_BLOCK_SIZE;

        fn erase(
            &mut self,
            from: u32,
            to: u32,
        ) -> Result<(), Self::Error> {
            self.data[from as usize..to as usize].fill(0xFF);
            Ok(())
        }

        fn write(
            &mut self,
            offset: u32,
            bytes: &[u8],
        ) -> Result<(), Self::Error> {
            if offset as usize % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
                return Err(NorFlashErrorKind::NotAligned);
            }
            let start = offset as usize;
            for (old, new) in self.data[start..start + bytes.len()].iter_mut().zip(bytes) {
                *old &= *new;
            }
            Ok(())
        }
    }

    fn device() -> TwoBlocks {
        TwoBlocks {
            data: [0xFF; 2 * ERASE_BLOCK_SIZE],
        }
    }

    #[test]
    fn test_region_rejects_bad_windows() {
        assert!(NorFlashRegion::new(device(), 100, ERASE_BLOCK_SIZE).is_none());
        assert!(NorFlashRegion::new(device(), 0, 100).is_none());
        assert!(NorFlashRegion::new(device(), ERASE_BLOCK_SIZE as u32, 2 * ERASE_BLOCK_SIZE).is_none());
        assert!(NorFlashRegion::new(device(), ERASE_BLOCK_SIZE as u32, ERASE_BLOCK_SIZE).is_some());
    }

    #[test]
    fn test_region_offsets_are_relative() {
        let Some(mut region) = NorFlashRegion::new(device(), ERASE_BLOCK_SIZE as u32, ERASE_BLOCK_SIZE) else {
            panic!("window should fit");
        };
        assert_eq!(region.capacity(), ERASE_BLOCK_SIZE);
        assert_eq!(region.write_granule(), 4);

        region.program(8, &[0x26, 0, 0, 0]).unwrap();
        let mut buf = [0; 4];
        region.read(8, &mut buf).unwrap();
        assert_eq!(buf, [0x26, 0, 0, 0]);

        let flash = region.into_inner();
        assert_eq!(flash.data[8], 0xFF);
        assert_eq!(flash.data[ERASE_BLOCK_SIZE + 8], 0x26);
    }

    #[test]
    fn test_region_bounds_and_error_mapping() {
        let Some(mut region) = NorFlashRegion::new(device(), 0, ERASE_BLOCK_SIZE) else {
            panic!("window should fit");
        };
        assert_eq!(region.read(ERASE_BLOCK_SIZE - 2, &mut [0; 4]), Err(FlashError::OutOfBounds));
        assert_eq!(region.program(2, &[0; 4]), Err(FlashError::Unaligned));
    }

    #[test]
    fn test_erase_touches_only_the_window() {
        let mut flash = device();
        flash.data.fill(0);
        let Some(mut region) = NorFlashRegion::new(flash, 0, ERASE_BLOCK_SIZE) else {
            panic!("window should fit");
        };
        region.erase().unwrap();
        let flash = region.into_inner();
        assert!(flash.data[..ERASE_BLOCK_SIZE].iter().all(|b| *b == 0xFF));
        assert!(flash.data[ERASE_BLOCK_SIZE..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_log_over_nor_region() {
        let Some(region) = NorFlashRegion::new(device(), 0, ERASE_BLOCK_SIZE) else {
            panic!("window should fit");
        };
        let (mut log, scan) = FlashLog::mount(region);
        assert_eq!(scan.source, ScanSource::Default);
        assert_eq!(log.slot_count(), 1024);

        let record = crate::PersistentRecord::new(crate::Mode::Inclinometer, crate::Unit::Fahrenheit);
        log.append(record).unwrap();
        let (_, scan) = FlashLog::mount(log.into_inner());
        assert_eq!(scan.record, record);
        assert_eq!(scan.first_free_slot, 1);
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(FlashError::from(NorFlashErrorKind::NotAligned), FlashError::Unaligned);
        assert_eq!(FlashError::from(NorFlashErrorKind::OutOfBounds), FlashError::OutOfBounds);
        assert_eq!(FlashError::from(NorFlashErrorKind::Other), FlashError::Fault);
    }
}

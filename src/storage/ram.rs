//! In-memory NOR flash for host tests.
//!
//! Simulates one erase block in RAM. Supports:
//! - 1 to 0 only programming (setting a bit without an erase is a fault)
//! - Configurable write granule, optionally programmable only once per erase
//! - Erase and program counting
//! - Fault injection for the next read, program or erase
//! - Power-cut simulation after a number of programmed bytes, optionally
//!   tearing the next byte so only some of its bits clear

use super::{FlashError, FlashRegion};
use crate::record::ERASED_BYTE;

/// RAM-backed flash region of `N` bytes.
pub struct RamFlash<const N: usize> {
    data: [u8; N],
    granule: usize,
    single_program: bool,
    /// Granules programmed since the last erase (single-program mode).
    programmed: [bool; N],
    erase_count: u32,
    program_count: u32,
    /// Reads left before `fail_read` fires.
    reads_before_fail: usize,
    fail_read: Option<FlashError>,
    fail_program: Option<FlashError>,
    fail_erase: Option<FlashError>,
    /// Bytes that can still be programmed before power is lost.
    power_budget: Option<usize>,
    /// Bits of the byte at the cut that still clear.
    tear_mask: u8,
    powered: bool,
}

impl<const N: usize> RamFlash<N> {
    /// Factory-erased flash with byte-granular programming.
    pub const fn new() -> Self { Self::with_granule(1, false) }

    /// Factory-erased flash with the given write granule.
    pub const fn with_granule(
        granule: usize,
        single_program: bool,
    ) -> Self {
        Self {
            data: [ERASED_BYTE; N],
            granule,
            single_program,
            programmed: [false; N],
            erase_count: 0,
            program_count: 0,
            reads_before_fail: 0,
            fail_read: None,
            fail_program: None,
            fail_erase: None,
            power_budget: None,
            tear_mask: 0,
            powered: true,
        }
    }

    /// Raw contents.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; N] { &self.data }

    /// Number of completed erases.
    #[inline]
    pub const fn erase_count(&self) -> u32 { self.erase_count }

    /// Number of program operations attempted while powered.
    #[inline]
    pub const fn program_count(&self) -> u32 { self.program_count }

    /// Fail the next read with `error`.
    pub fn fail_next_read(
        &mut self,
        error: FlashError,
    ) {
        self.fail_read_after(0, error);
    }

    /// Let `reads` reads succeed, then fail one with `error`.
    pub fn fail_read_after(
        &mut self,
        reads: usize,
        error: FlashError,
    ) {
        self.reads_before_fail = reads;
        self.fail_read = Some(error);
    }

    /// Fail the next program with `error` without touching the contents.
    pub fn fail_next_program(
        &mut self,
        error: FlashError,
    ) {
        self.fail_program = Some(error);
    }

    /// Fail the next erase with `error` without touching the contents.
    pub fn fail_next_erase(
        &mut self,
        error: FlashError,
    ) {
        self.fail_erase = Some(error);
    }

    /// Lose power once `bytes` more bytes have been programmed.
    ///
    /// Every operation fails until [`power_cycle`](Self::power_cycle).
    pub fn cut_power_after(
        &mut self,
        bytes: usize,
    ) {
        self.cut_power_after_bits(bytes, 0);
    }

    /// Like [`cut_power_after`](Self::cut_power_after), but the byte being
    /// programmed at the cut is torn: of the bits it would clear, only those
    /// in `mask` do.
    pub fn cut_power_after_bits(
        &mut self,
        bytes: usize,
        mask: u8,
    ) {
        self.power_budget = Some(bytes);
        self.tear_mask = mask;
    }

    /// Restore power. Flash contents survive.
    pub fn power_cycle(&mut self) {
        self.powered = true;
        self.power_budget = None;
        self.tear_mask = 0;
    }

    fn check(
        &self,
        offset: usize,
        len: usize,
    ) -> Result<(), FlashError> {
        if !self.powered {
            return Err(FlashError::Fault);
        }
        match offset.checked_add(len) {
            Some(end) if end <= N => Ok(()),
            _ => Err(FlashError::OutOfBounds),
        }
    }
}

impl<const N: usize> Default for RamFlash<N> {
    fn default() -> Self { Self::new() }
}

impl<const N: usize> FlashRegion for RamFlash<N> {
    fn capacity(&self) -> usize { N }

    fn write_granule(&self) -> usize { self.granule }

    fn single_program(&self) -> bool { self.single_program }

    fn read(
        &mut self,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), FlashError> {
        self.check(offset, buf.len())?;
        if self.fail_read.is_some() {
            if self.reads_before_fail == 0 {
                return Err(self.fail_read.take().unwrap_or(FlashError::Fault));
            }
            self.reads_before_fail -= 1;
        }
        buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
        Ok(())
    }

    fn program(
        &mut self,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), FlashError> {
        self.check(offset, bytes.len())?;
        if offset % self.granule != 0 || bytes.len() % self.granule != 0 {
            return Err(FlashError::Unaligned);
        }
        if let Some(error) = self.fail_program.take() {
            return Err(error);
        }

        let target = &self.data[offset..offset + bytes.len()];
        if target.iter().zip(bytes).any(|(old, new)| new & !old != 0) {
            // Would need a 0 -> 1 transition
            return Err(FlashError::Fault);
        }
        let first = offset / self.granule;
        let count = bytes.len() / self.granule;
        if self.single_program && self.programmed[first..first + count].iter().any(|p| *p) {
            return Err(FlashError::Fault);
        }

        self.program_count += 1;
        let (len, cut) = match self.power_budget {
            Some(budget) if budget < bytes.len() => (budget, true),
            Some(budget) => {
                self.power_budget = Some(budget - bytes.len());
                (bytes.len(), false)
            }
            None => (bytes.len(), false),
        };

        for (old, new) in self.data[offset..offset + len].iter_mut().zip(bytes) {
            *old &= *new;
        }
        self.programmed[first..first + count].fill(true);

        if cut {
            self.data[offset + len] &= bytes[len] | !self.tear_mask;
            self.powered = false;
            return Err(FlashError::Fault);
        }
        Ok(())
    }

    fn erase(&mut self) -> Result<(), FlashError> {
        self.check(0, N)?;
        if let Some(error) = self.fail_erase.take() {
            return Err(error);
        }
        if self.power_budget == Some(0) {
            self.powered = false;
            return Err(FlashError::Fault);
        }
        self.data.fill(ERASED_BYTE);
        self.programmed.fill(false);
        self.erase_count += 1;
        Ok(())
    }
}

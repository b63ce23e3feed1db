//! Append-only log of [`PersistentRecord`]s in one flash erase block.
//!
//! The newest record is the last written slot. Records are never rewritten:
//! each change is appended into the next erased slot, and the block is erased
//! only when it is full. A 4KB block holds 1024 records, so one erase cycle is
//! spent per 1024 user changes.
//!
//! # Boot Scan
//!
//! ```text
//! slot:   0    1    2    3    4 ...
//!       [02] [06] [26] [FF] [FF]
//!                   ^    ^
//!             newest     first free slot (cursor)
//! ```
//!
//! The scan walks forward while byte 0 of the slot is not `0xFF`, then steps
//! back over padding and uncommitted slots to the newest committed record.
//!
//! # Commit
//!
//! An append programs the record with its validity marker still erased, then
//! programs it again to clear the marker's low bit. Power lost anywhere in
//! between leaves the slot uncommitted: the scan skips it and the previous
//! record wins. Devices that allow only one program per granule get the whole
//! record in a single program.

use super::{FlashError, FlashRegion};
use crate::config::RECORD_SIZE;
use crate::record::{ERASED_BYTE, PersistentRecord, RecordError, SlotKind, classify};

/// Largest write granule the log can read-modify-write.
pub const MAX_WRITE_GRANULE: usize = 256;

/// Where the boot state came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum ScanSource {
    /// No record was ever written.
    Default,
    /// Decoded from the given slot.
    Stored { slot: usize },
    /// The newest slot did not decode; the default is used instead.
    Corrupt { slot: usize, byte: u8 },
    /// The region could not be read; the default is used and the next append erases.
    ReadFailed(FlashError),
}

/// Outcome of a boot scan.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct ScanResult {
    /// State to boot into.
    pub record: PersistentRecord,
    /// Index of the first unused slot. Equals the slot count when the region is full.
    pub first_free_slot: usize,
    pub source: ScanSource,
}

/// Outcome of a successful append.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct AppendReport {
    /// Slot the record was written to.
    pub slot: usize,
    /// Whether the region had to be erased first.
    pub erased: bool,
}

/// Append-only record log over a [`FlashRegion`].
pub struct FlashLog<R> {
    region: R,
    /// First unused slot; `slot_count()` means the region is full.
    next_slot: usize,
    erase_count: u32,
}

impl<R: FlashRegion> FlashLog<R> {
    /// Wrap a region without scanning it. Call [`scan`](Self::scan) before appending.
    pub fn new(region: R) -> Self {
        Self {
            region,
            next_slot: 0,
            erase_count: 0,
        }
    }

    /// Wrap a region and run the boot scan.
    pub fn mount(region: R) -> (Self, ScanResult) {
        let mut log = Self::new(region);
        let scan = log.scan();
        (log, scan)
    }

    /// Number of record slots in the region.
    #[inline]
    pub fn slot_count(&self) -> usize { self.region.capacity() / RECORD_SIZE }

    /// First unused slot (the append cursor).
    #[inline]
    pub const fn next_slot(&self) -> usize { self.next_slot }

    /// Erases performed since boot.
    #[inline]
    pub const fn erase_count(&self) -> u32 { self.erase_count }

    /// Borrow the underlying region (test inspection).
    #[inline]
    pub const fn region(&self) -> &R { &self.region }

    /// Release the underlying region.
    pub fn into_inner(self) -> R { self.region }

    fn read_slot(
        &mut self,
        slot: usize,
    ) -> Result<[u8; RECORD_SIZE], FlashError> {
        let mut bytes = [ERASED_BYTE; RECORD_SIZE];
        self.region.read(slot * RECORD_SIZE, &mut bytes)?;
        Ok(bytes)
    }

    /// Find the newest record and the append cursor.
    ///
    /// Never writes to flash. Runs in O(used slots).
    pub fn scan(&mut self) -> ScanResult {
        let slots = self.slot_count();

        let mut cursor = 0;
        while cursor < slots {
            match self.read_slot(cursor) {
                Ok(bytes) if bytes[0] == ERASED_BYTE => break,
                Ok(_) => cursor += 1,
                Err(e) => return self.read_failed(cursor, e),
            }
        }
        self.next_slot = cursor;

        // Skip trailing padding and interrupted appends back to the newest record
        let mut last = cursor;
        let newest = loop {
            if last == 0 {
                break None;
            }
            last -= 1;
            match self.read_slot(last) {
                Ok(bytes) => match classify(&bytes) {
                    SlotKind::Padding => continue,
                    SlotKind::Uncommitted => {
                        debug!("state scan: slot {} never committed", last);
                        continue;
                    }
                    SlotKind::Unused | SlotKind::Written => break Some(bytes),
                },
                Err(e) => return self.read_failed(last, e),
            }
        };

        let (record, source) = match newest {
            None => (PersistentRecord::DEFAULT, ScanSource::Default),
            Some(bytes) => match PersistentRecord::decode(&bytes) {
                Ok(record) => (record, ScanSource::Stored { slot: last }),
                Err(RecordError::Corrupt(byte)) => {
                    warn!("state scan: corrupt record {:#x} in slot {}", byte, last);
                    (PersistentRecord::DEFAULT, ScanSource::Corrupt { slot: last, byte })
                }
                Err(_) => (PersistentRecord::DEFAULT, ScanSource::Default),
            },
        };

        debug!("state scan: cursor={} of {}", cursor, slots);
        ScanResult {
            record,
            first_free_slot: cursor,
            source,
        }
    }

    /// Unknown contents: boot with the default and force an erase before the
    /// next append.
    fn read_failed(
        &mut self,
        slot: usize,
        error: FlashError,
    ) -> ScanResult {
        warn!("state scan: read failed at slot {}: {}", slot, error);
        let slots = self.slot_count();
        self.next_slot = slots;
        ScanResult {
            record: PersistentRecord::DEFAULT,
            first_free_slot: slots,
            source: ScanSource::ReadFailed(error),
        }
    }

    /// Append one record, erasing the region first if it is full.
    ///
    /// No deduplication happens here; callers only append real changes.
    pub fn append(
        &mut self,
        record: PersistentRecord,
    ) -> Result<AppendReport, FlashError> {
        let slots = self.slot_count();

        let mut erased = false;
        if self.next_slot >= slots {
            self.region.erase()?;
            self.erase_count += 1;
            self.next_slot = 0;
            erased = true;
            info!("state region erased (erase #{})", self.erase_count);
        }

        let slot = self.next_slot;
        let offset = slot * RECORD_SIZE;
        let granule = self.region.write_granule().max(1);

        let (result, next) = if granule <= RECORD_SIZE {
            let result = self
                .region
                .program(offset, &record.encode_pending())
                .and_then(|()| self.region.program(offset, &record.encode()));
            (result, slot + 1)
        } else {
            self.program_granule(offset, record, granule)?
        };

        match result {
            Ok(()) => {
                self.next_slot = next;
                Ok(AppendReport { slot, erased })
            }
            Err(e) => {
                // A partially programmed slot is burnt; never write into it again
                if self.read_slot(slot).map_or(true, |bytes| bytes[0] != ERASED_BYTE) {
                    self.next_slot = next;
                }
                Err(e)
            }
        }
    }

    /// Read-modify-write the granule holding `offset`.
    ///
    /// Bytes of earlier records in the granule are written back unchanged and
    /// unreached slots stay erased, unless the device forbids programming the
    /// granule again, in which case they become zero padding and the record is
    /// programmed committed in one go.
    fn program_granule(
        &mut self,
        offset: usize,
        record: PersistentRecord,
        granule: usize,
    ) -> Result<(Result<(), FlashError>, usize), FlashError> {
        if granule > MAX_WRITE_GRANULE || granule % RECORD_SIZE != 0 {
            return Err(FlashError::Unaligned);
        }

        let start = offset - offset % granule;
        let mut buf = [ERASED_BYTE; MAX_WRITE_GRANULE];
        let image = &mut buf[..granule];
        self.region.read(start, image)?;

        let at = offset - start;
        if self.region.single_program() {
            image[at..at + RECORD_SIZE].copy_from_slice(&record.encode());
            image[at + RECORD_SIZE..].fill(0);
            return Ok((self.region.program(start, image), (start + granule) / RECORD_SIZE));
        }

        image[at..at + RECORD_SIZE].copy_from_slice(&record.encode_pending());
        let result = match self.region.program(start, image) {
            Ok(()) => {
                image[at..at + RECORD_SIZE].copy_from_slice(&record.encode());
                self.region.program(start, image)
            }
            Err(e) => Err(e),
        };
        Ok((result, offset / RECORD_SIZE + 1))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

/// The sole collaborator the core expects from the physical disk layer: read whole 512-byte
/// sectors starting at a given LBA. Everything above this (byte-granular reads, caching,
/// aggregation) lives in [`crate::Volume`].
pub trait DiskRead {
    /// Reads `count` consecutive 512-byte sectors starting at `lba_512` into `buf`.
    /// `buf.len()` must equal `count as usize * 512`.
    fn read_sectors(&mut self, lba_512: u64, count: u32, buf: &mut [u8]) -> Result<(), DiskError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiskError {
    /// No media present, or a permanent failure; retrying with a smaller transfer size is
    /// pointless.
    #[error("no media present")]
    NoMedia,
    /// A failure that may clear up if the transfer is retried with fewer sectors at a time.
    /// Real hardware surfaces this for controller-queue-depth issues; the in-memory test disk
    /// in this crate's test suite can be configured to return it for the first N attempts at a
    /// given transfer size, exercising the shrinking-transfer-size retry loop without hardware.
    #[error("transient read failure")]
    Transient,
}

/// An in-memory "disk" over a byte slice, for tests. Reads are always proportional to a flat
/// buffer, with sector `lba_512` at byte offset `lba_512 * 512`.
#[cfg(any(test, feature = "std"))]
pub struct MemoryDisk {
    data: alloc::vec::Vec<u8>,
    /// Number of times left to fail the next read with [`DiskError::Transient`], regardless of
    /// the requested transfer size; decremented on every attempt until it reaches zero.
    fail_next: u32,
}

#[cfg(any(test, feature = "std"))]
impl MemoryDisk {
    pub fn new(data: alloc::vec::Vec<u8>) -> Self {
        Self { data, fail_next: 0 }
    }

    /// Makes the next `n` read attempts fail with [`DiskError::Transient`].
    pub fn fail_next_reads(&mut self, n: u32) {
        self.fail_next = n;
    }
}

#[cfg(any(test, feature = "std"))]
impl DiskRead for MemoryDisk {
    fn read_sectors(&mut self, lba_512: u64, count: u32, buf: &mut [u8]) -> Result<(), DiskError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(DiskError::Transient);
        }
        let offset = lba_512 as usize * 512;
        let len = count as usize * 512;
        let end = offset.checked_add(len).ok_or(DiskError::NoMedia)?;
        if end > self.data.len() {
            return Err(DiskError::NoMedia);
        }
        buf.copy_from_slice(&self.data[offset..end]);
        Ok(())
    }
}

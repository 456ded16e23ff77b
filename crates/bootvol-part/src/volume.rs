use crate::disk::{DiskError, DiskRead};
use crate::error::PartError;
use bootvol_common::part::gpt::Guid;

use alloc::string::String;
use alloc::vec::Vec;

/// A logical byte region on a disk: the whole disk itself, or one partition on it.
///
/// Volumes are immutable once created (see the data-model invariants this mirrors): nothing
/// ever rewrites `first_sect` in place, so the one-block cache never needs external
/// invalidation -- only eviction when a different block is requested.
#[derive(Debug)]
pub struct Volume {
    /// First sector of this volume, in 512-byte units, on the *physical* disk.
    pub first_sect: u64,
    /// Sector count in 512-byte units; `None` means "whole disk, extent unknown".
    pub sect_count: Option<u64>,
    /// Sector size of the underlying media: 512 or 4096.
    pub sector_size: u32,
    /// Disk-preferred contiguous transfer size, in `sector_size` units.
    pub fastest_xfer_size: u32,
    /// Disk number, assigned by the enumeration sequence that created this volume.
    pub index: u32,
    pub is_optical: bool,
    /// 1-based partition number on the parent disk; 0 for the whole-disk volume.
    pub partition: u32,
    /// Index of the parent volume in the [`crate::VolumeIndex`] that owns this one, if any.
    /// A plain index rather than a borrow, since the index owns every volume in one `Vec`
    /// and a self-referential registry can't hand out long-lived child references.
    pub backing_dev: Option<usize>,
    pub guid: Option<Guid>,
    pub part_guid: Option<Guid>,
    pub fslabel: Option<String>,

    cache: Cache,
}

#[derive(Debug, Default)]
struct Cache {
    block: Option<(u64, Vec<u8>)>,
}

impl Volume {
    pub fn new_disk(
        index: u32,
        sector_size: u32,
        fastest_xfer_size: u32,
        sect_count: Option<u64>,
        is_optical: bool,
    ) -> Self {
        Self {
            first_sect: 0,
            sect_count,
            sector_size,
            fastest_xfer_size,
            index,
            is_optical,
            partition: 0,
            backing_dev: None,
            guid: None,
            part_guid: None,
            fslabel: None,
            cache: Cache::default(),
        }
    }

    pub fn new_partition(
        parent: &Volume,
        partition: u32,
        first_sect: u64,
        sect_count: u64,
        part_guid: Option<Guid>,
    ) -> Self {
        Self {
            first_sect,
            sect_count: Some(sect_count),
            sector_size: parent.sector_size,
            fastest_xfer_size: parent.fastest_xfer_size,
            index: parent.index,
            is_optical: parent.is_optical,
            partition,
            backing_dev: parent.backing_dev,
            guid: None,
            part_guid,
            fslabel: None,
            cache: Cache::default(),
        }
    }

    fn block_size(&self) -> u64 {
        self.fastest_xfer_size as u64 * self.sector_size as u64
    }

    fn is_aligned(&self) -> bool {
        let units_per_sector = (self.sector_size / 512) as u64;
        units_per_sector != 0 && self.first_sect % units_per_sector == 0
    }

    fn byte_len(&self) -> Option<u64> {
        self.sect_count.map(|s| s * 512)
    }

    /// Reads `buf.len()` bytes starting at byte offset `loc` within this volume, through the
    /// one-block cache. Fails if the range runs past the volume's known size, if the volume is
    /// misaligned, or if the disk primitive exhausts every retry without progress.
    pub fn read<D: DiskRead>(&mut self, disk: &mut D, buf: &mut [u8], loc: u64) -> Result<(), PartError> {
        if !self.is_aligned() {
            return Err(PartError::Misaligned);
        }
        let count = buf.len() as u64;
        if let Some(len) = self.byte_len() {
            let end = loc.checked_add(count).ok_or(PartError::OutOfBounds)?;
            if end > len {
                return Err(PartError::OutOfBounds);
            }
        }

        let block_size = self.block_size();
        if block_size == 0 {
            return Err(PartError::Overflow);
        }

        let mut written = 0u64;
        while written < count {
            let abs = loc + written;
            let block = abs / block_size;
            let block_off = (abs % block_size) as usize;
            let block_bytes = self.load_block(disk, block)?;
            let available = block_bytes.len() - block_off;
            let take = available.min((count - written) as usize);
            buf[written as usize..written as usize + take]
                .copy_from_slice(&block_bytes[block_off..block_off + take]);
            written += take as u64;
        }
        Ok(())
    }

    /// Loads block `block` into the cache (if not already resident) and returns a reference to
    /// its bytes. On a transient disk error, retries with a shrinking transfer size down to 1
    /// sector -- the only retry loop in this crate.
    fn load_block<D: DiskRead>(&mut self, disk: &mut D, block: u64) -> Result<&[u8], PartError> {
        if let Some((cached_block, _)) = &self.cache.block {
            if *cached_block == block {
                return Ok(&self.cache.block.as_ref().unwrap().1);
            }
        }

        let units_per_sector = (self.sector_size / 512) as u64;
        let sectors_per_block = self.fastest_xfer_size as u64;
        let base_lba = self.first_sect / units_per_sector + block * sectors_per_block;

        let mut xfer = self.fastest_xfer_size;
        let data = loop {
            if xfer == 0 {
                return Err(PartError::Disk(DiskError::NoMedia));
            }
            let mut attempt = Vec::with_capacity(xfer as usize * self.sector_size as usize);
            attempt.resize(xfer as usize * self.sector_size as usize, 0);
            match disk.read_sectors(base_lba, xfer, &mut attempt) {
                Ok(()) => break attempt,
                Err(DiskError::Transient) => {
                    xfer -= 1;
                    continue;
                }
                Err(e @ DiskError::NoMedia) => return Err(PartError::Disk(e)),
            }
        };

        self.cache.block = Some((block, data));
        Ok(&self.cache.block.as_ref().unwrap().1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemoryDisk;

    fn make_disk(sectors: usize) -> MemoryDisk {
        let mut data = Vec::new();
        for i in 0..sectors {
            data.extend((0..512).map(|b| (i * 512 + b) as u8));
        }
        MemoryDisk::new(data)
    }

    #[test]
    fn reads_within_one_block() {
        let mut disk = make_disk(4);
        let mut vol = Volume::new_disk(0, 512, 2, Some(4), false);
        let mut buf = [0u8; 16];
        vol.read(&mut disk, &mut buf, 0).unwrap();
        assert_eq!(buf[0], 0);
        assert_eq!(buf[15], 15);
    }

    #[test]
    fn reads_spanning_two_blocks() {
        let mut disk = make_disk(4);
        let mut vol = Volume::new_disk(0, 512, 1, Some(4), false);
        let mut buf = [0u8; 8];
        vol.read(&mut disk, &mut buf, 508).unwrap();
        assert_eq!(buf, [252u8, 253, 254, 255, 0, 1, 2, 3]);
    }

    #[test]
    fn rejects_out_of_bounds_read() {
        let mut disk = make_disk(2);
        let mut vol = Volume::new_disk(0, 512, 1, Some(2), false);
        let mut buf = [0u8; 16];
        assert!(matches!(
            vol.read(&mut disk, &mut buf, 1020),
            Err(PartError::OutOfBounds)
        ));
    }

    #[test]
    fn rejects_misaligned_partition() {
        let mut disk = make_disk(8);
        let mut vol = Volume::new_partition(
            &Volume::new_disk(0, 4096, 1, None, false),
            1,
            1, // not a multiple of 4096/512 = 8
            4,
            None,
        );
        let mut buf = [0u8; 4];
        assert!(matches!(
            vol.read(&mut disk, &mut buf, 0),
            Err(PartError::Misaligned)
        ));
    }

    #[test]
    fn retries_on_transient_failure_by_shrinking_transfer_size() {
        let mut disk = make_disk(4);
        disk.fail_next_reads(1);
        let mut vol = Volume::new_disk(0, 512, 2, Some(4), false);
        let mut buf = [0u8; 4];
        vol.read(&mut disk, &mut buf, 0).unwrap();
        assert_eq!(buf, [0, 1, 2, 3]);
    }

    #[test]
    fn cache_hit_reuses_loaded_block() {
        let mut disk = make_disk(4);
        let mut vol = Volume::new_disk(0, 512, 2, Some(4), false);
        let mut buf = [0u8; 4];
        vol.read(&mut disk, &mut buf, 0).unwrap();
        disk.fail_next_reads(100); // any further disk read would now fail
        vol.read(&mut disk, &mut buf, 4).unwrap();
        assert_eq!(buf, [4, 5, 6, 7]);
    }
}

//! Volume descriptor scanning (ECMA-119 §8): the fixed-size records starting at LBA 16 that
//! identify an ISO9660 volume and point at its root directory.
use bootvol_part::{DiskRead, PartError, Volume};

use crate::directory::DirectoryRecordHeader;
use crate::error::IsoError;
use crate::types::{IsoStrA, IsoStrD, U16LsbMsb, U32LsbMsb};

pub const SECTOR_SIZE: u64 = 2048;
/// First LBA a volume descriptor may appear at; the 16 sectors before it are the "system area".
pub const FIRST_DESCRIPTOR_LBA: u64 = 16;
/// Refuses to scan past this many descriptors without finding a Primary Volume Descriptor or a
/// Terminator -- a malformed or hostile image should not hang the scan indefinitely.
pub const MAX_DESCRIPTORS: u64 = 256;

const STANDARD_IDENTIFIER: &[u8; 5] = b"CD001";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorType {
    BootRecord,
    Primary,
    Supplementary,
    Partition,
    Terminator,
    /// Reserved or vendor-specific type; ECMA-119 requires scanners to skip these.
    Other,
}

/// The Primary Volume Descriptor (ECMA-119 §8.4), trimmed to the fields a read-only client
/// needs: identification, the root directory record, and overall volume geometry.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PrimaryVolumeDescriptor {
    pub descriptor_type: u8,
    pub standard_identifier: [u8; 5],
    pub version: u8,
    _unused_7: u8,
    pub system_identifier: IsoStrA<32>,
    pub volume_identifier: IsoStrD<32>,
    _unused_72: [u8; 8],
    pub volume_space_size: U32LsbMsb,
    _unused_88: [u8; 32],
    _volume_set_size: [u8; 4],
    _volume_sequence_number: [u8; 4],
    pub logical_block_size: U16LsbMsb,
    _path_table_size: [u8; 8],
    _type_l_path_table: u32,
    _opt_type_l_path_table: u32,
    _type_m_path_table: u32,
    _opt_type_m_path_table: u32,
    /// The root directory's own record, 34 bytes: the fixed header plus a single identifier
    /// byte (`0x00`), with no trailing padding.
    pub root_directory_record: DirectoryRecordHeader,
    _root_directory_identifier: u8,
    _rest: [u8; 1858],
}

impl PrimaryVolumeDescriptor {
    pub fn root_extent(&self) -> (u32, u32) {
        (
            self.root_directory_record.extent.read(),
            self.root_directory_record.data_len.read(),
        )
    }
}

/// Reads one 2048-byte volume descriptor at `lba` and classifies it. Returns `None` when the
/// standard identifier `"CD001"` is absent -- the caller should treat that as "not ISO9660".
fn read_descriptor<D: DiskRead>(
    disk: &mut D,
    volume: &mut Volume,
    lba: u64,
) -> Result<Option<(DescriptorType, [u8; 2048])>, IsoError> {
    let mut buf = [0u8; 2048];
    volume
        .read(disk, &mut buf, lba * SECTOR_SIZE)
        .map_err(IsoError::Volume)?;
    if &buf[1..6] != &STANDARD_IDENTIFIER[..] {
        return Ok(None);
    }
    let kind = match buf[0] {
        0 => DescriptorType::BootRecord,
        1 => DescriptorType::Primary,
        2 => DescriptorType::Supplementary,
        3 => DescriptorType::Partition,
        255 => DescriptorType::Terminator,
        _ => DescriptorType::Other,
    };
    Ok(Some((kind, buf)))
}

/// `true` iff a volume carries the ISO9660 standard identifier at its first descriptor slot.
pub fn is_iso9660<D: DiskRead>(disk: &mut D, volume: &mut Volume) -> Result<bool, PartError> {
    let mut buf = [0u8; 6];
    match volume.read(disk, &mut buf, FIRST_DESCRIPTOR_LBA * SECTOR_SIZE) {
        Ok(()) => Ok(&buf[1..6] == &STANDARD_IDENTIFIER[..]),
        Err(e) => Err(e),
    }
}

/// Scans volume descriptors from LBA 16 upward, returning the Primary Volume Descriptor.
/// Stops successfully at the first Primary descriptor; fails on a Terminator with none found,
/// on a missing standard identifier, or after [`MAX_DESCRIPTORS`] entries.
pub fn find_primary_descriptor<D: DiskRead>(
    disk: &mut D,
    volume: &mut Volume,
) -> Result<PrimaryVolumeDescriptor, IsoError> {
    for i in 0..MAX_DESCRIPTORS {
        let lba = FIRST_DESCRIPTOR_LBA + i;
        let Some((kind, buf)) = read_descriptor(disk, volume, lba)? else {
            log::warn!("volume descriptor at LBA {lba} is missing the CD001 standard identifier");
            return Err(IsoError::NotIso9660);
        };
        match kind {
            DescriptorType::Primary => {
                return Ok(*bytemuck::from_bytes(&buf));
            }
            DescriptorType::Terminator => {
                log::warn!("volume descriptor terminator at LBA {lba} found before any Primary descriptor");
                return Err(IsoError::NotIso9660);
            }
            _ => continue,
        }
    }
    log::warn!("no Primary Volume Descriptor found within {MAX_DESCRIPTORS} descriptor slots");
    Err(IsoError::TooManyDescriptors)
}

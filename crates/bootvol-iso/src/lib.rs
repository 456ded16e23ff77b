//! Read-only ISO9660 (ECMA-119) with Rock Ridge name extensions and multi-extent files.
//!
//! This crate never writes: it opens a file by path inside an [`bootvol_part::Volume`],
//! producing an [`Iso9660Handle`] whose [`Iso9660Handle::read`] walks the (possibly
//! multi-extent) list of on-disk extents that back it.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod descriptor;
mod directory;
mod error;
mod rockridge;
mod types;

pub use descriptor::{is_iso9660, PrimaryVolumeDescriptor, SECTOR_SIZE};
pub use directory::{Extent, FileFlags, MAX_EXTENTS};
pub use error::IsoError;

use alloc::string::String;
use alloc::vec::Vec;

use bootvol_part::{DiskRead, Volume};

/// Root directory buffers larger than this are refused rather than cached whole.
const MAX_ROOT_DIRECTORY_BYTES: usize = 64 * 1024 * 1024;
/// Path components decode (after Rock Ridge) to at most this many bytes.
const MAX_NAME_LEN: usize = 255;

/// An open ISO9660 file: the list of extents backing it (more than one only for multi-extent
/// files) and its total logical size.
pub struct Iso9660Handle {
    extents: Vec<Extent>,
    size: u64,
}

impl Iso9660Handle {
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Reads `buf.len()` bytes starting at byte offset `loc` in the file, walking across
    /// extents as needed. Fails if the read would run past the end of the file.
    pub fn read<D: DiskRead>(
        &self,
        disk: &mut D,
        volume: &mut Volume,
        buf: &mut [u8],
        loc: u64,
    ) -> Result<(), IsoError> {
        let count = buf.len() as u64;
        if loc.checked_add(count).map_or(true, |end| end > self.size) {
            return Err(IsoError::NotFound);
        }

        let mut written = 0u64;
        let mut extent_base = 0u64;
        for extent in &self.extents {
            let extent_len = extent.len as u64;
            let extent_end = extent_base + extent_len;
            if loc + written < extent_end && loc + written >= extent_base {
                let offset_in_extent = loc + written - extent_base;
                let available = extent_len - offset_in_extent;
                let take = available.min(count - written);
                let byte_pos = extent.lba as u64 * SECTOR_SIZE + offset_in_extent;
                volume
                    .read(
                        disk,
                        &mut buf[written as usize..(written + take) as usize],
                        byte_pos,
                    )
                    .map_err(IsoError::Volume)?;
                written += take;
                if written >= count {
                    return Ok(());
                }
            }
            extent_base = extent_end;
        }
        if written < count {
            return Err(IsoError::NotFound);
        }
        Ok(())
    }
}

/// Reads the root directory record's extent, bounds-checked to [`MAX_ROOT_DIRECTORY_BYTES`].
fn read_directory<D: DiskRead>(
    disk: &mut D,
    volume: &mut Volume,
    lba: u32,
    len: u32,
) -> Result<Vec<u8>, IsoError> {
    if len as usize > MAX_ROOT_DIRECTORY_BYTES {
        return Err(IsoError::RootDirectoryTooLarge);
    }
    let mut buf = alloc::vec![0u8; len as usize];
    volume
        .read(disk, &mut buf, lba as u64 * SECTOR_SIZE)
        .map_err(IsoError::Volume)?;
    Ok(buf)
}

/// Linearly scans a directory buffer for `name`, honoring the case-sensitivity rule: Rock
/// Ridge names compare case-sensitively unless `case_insensitive` is set; the ISO-name
/// fallback always compares case-insensitively.
fn find_in_directory<'a>(
    buf: &'a [u8],
    name: &str,
    case_insensitive: bool,
) -> Option<directory::RawRecord<'a>> {
    for record in directory::records(buf) {
        let (decoded, is_rock_ridge) = directory::decode_name(&record);
        let matches = if is_rock_ridge && !case_insensitive {
            decoded == name.as_bytes()
        } else {
            decoded.eq_ignore_ascii_case(name.as_bytes())
        };
        if matches {
            return Some(record);
        }
    }
    None
}

/// Opens `path` (an absolute, `/`-separated path already normalized by the caller, per C7)
/// against this volume's ISO9660 filesystem.
pub fn open<D: DiskRead>(
    disk: &mut D,
    volume: &mut Volume,
    path: &str,
    case_insensitive: bool,
) -> Result<Iso9660Handle, IsoError> {
    let pvd = descriptor::find_primary_descriptor(disk, volume)?;
    let (root_lba, root_len) = pvd.root_extent();
    let mut dir_buf = read_directory(disk, volume, root_lba, root_len)?;

    let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
    if components.peek().is_none() {
        // Root directory itself: not a file.
        return Err(IsoError::NotAFile);
    }

    loop {
        let component = components.next().unwrap();
        if component.len() > MAX_NAME_LEN {
            return Err(IsoError::NameTooLong);
        }
        let record = find_in_directory(&dir_buf, component, case_insensitive)
            .ok_or(IsoError::NotFound)?;

        if components.peek().is_some() {
            if !record.header.is_directory() {
                return Err(IsoError::NotAFile);
            }
            let (lba, len) = (record.header.extent.read(), record.header.data_len.read());
            dir_buf = read_directory(disk, volume, lba, len)?;
            continue;
        }

        if record.header.is_directory() {
            return Err(IsoError::NotAFile);
        }
        let (extents, size) = directory::collect_extents(&dir_buf, &record)?;
        return Ok(Iso9660Handle { extents, size });
    }
}

/// Returns the volume label (the PVD's volume identifier), trimmed of trailing spaces.
pub fn fs_get_label<D: DiskRead>(disk: &mut D, volume: &mut Volume) -> Result<String, IsoError> {
    let pvd = descriptor::find_primary_descriptor(disk, volume)?;
    Ok(pvd.volume_identifier.to_str().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootvol_part::MemoryDisk;
    use bytemuck::Zeroable;
    use directory::{DirectoryRecordHeader, FileFlags};
    use types::U32LsbMsb;

    fn dir_record(name: &[u8], flags: u8, extent: u32, data_len: u32) -> Vec<u8> {
        let id_len = name.len();
        let pad = if id_len % 2 == 0 { 1 } else { 0 };
        let len = core::mem::size_of::<DirectoryRecordHeader>() + id_len + pad;
        let header = DirectoryRecordHeader {
            len: len as u8,
            extended_attr_record_len: 0,
            extent: U32LsbMsb::new(extent),
            data_len: U32LsbMsb::new(data_len),
            date_time: Zeroable::zeroed(),
            flags,
            file_unit_size: 0,
            interleave_gap_size: 0,
            volume_sequence_number: types::U16LsbMsb::new(1),
            file_identifier_len: id_len as u8,
        };
        let mut bytes = bytemuck::bytes_of(&header).to_vec();
        bytes.extend_from_slice(name);
        bytes.resize(len, 0);
        bytes
    }

    fn build_image() -> (MemoryDisk, u32, u32) {
        // Layout (2048-byte sectors): 16 = PVD, 17 = terminator, 20 = root dir, 21 = file data.
        let mut data = alloc::vec![0u8; 2048 * 24];

        let root_dir = {
            let mut buf = dir_record(b"FOO.TXT;1", 0, 21, 12);
            buf.resize(2048, 0);
            buf
        };
        data[20 * 2048..20 * 2048 + root_dir.len()].copy_from_slice(&root_dir);
        data[21 * 2048..21 * 2048 + 12].copy_from_slice(b"Hello, ISO!\n");

        let mut pvd = PrimaryVolumeDescriptor::zeroed();
        pvd.descriptor_type = 1;
        pvd.standard_identifier = *b"CD001";
        pvd.version = 1;
        pvd.root_directory_record.len = 34;
        pvd.root_directory_record.extent = U32LsbMsb::new(20);
        pvd.root_directory_record.data_len = U32LsbMsb::new(2048);
        pvd.root_directory_record.file_identifier_len = 1;
        pvd.root_directory_record.flags = FileFlags::DIRECTORY.bits();
        let pvd_bytes = bytemuck::bytes_of(&pvd);
        data[16 * 2048..16 * 2048 + pvd_bytes.len()].copy_from_slice(pvd_bytes);

        data[17 * 2048] = 255;
        data[17 * 2048 + 1..17 * 2048 + 6].copy_from_slice(b"CD001");

        (MemoryDisk::new(data), 21, 12)
    }

    #[test]
    fn opens_and_reads_a_file() {
        let (mut disk, _extent, _len) = build_image();
        let mut volume = Volume::new_disk(0, 512, 4, None, true);
        let handle = open(&mut disk, &mut volume, "/FOO.TXT", false).unwrap();
        assert_eq!(handle.size(), 12);
        let mut buf = [0u8; 12];
        handle.read(&mut disk, &mut volume, &mut buf, 0).unwrap();
        assert_eq!(&buf, b"Hello, ISO!\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let (mut disk, _, _) = build_image();
        let mut volume = Volume::new_disk(0, 512, 4, None, true);
        assert!(matches!(
            open(&mut disk, &mut volume, "/MISSING.TXT", false),
            Err(IsoError::NotFound)
        ));
    }

    #[test]
    fn case_insensitive_open_matches_rock_ridge_name() {
        let (mut disk, _, _) = build_image();
        let mut volume = Volume::new_disk(0, 512, 4, None, true);
        let handle = open(&mut disk, &mut volume, "/foo.txt", true).unwrap();
        assert_eq!(handle.size(), 12);
    }

    #[test]
    fn strict_case_rejects_mismatched_iso_fallback_name() {
        // ISO-name fallback always compares case-insensitively per spec, even without the flag.
        let (mut disk, _, _) = build_image();
        let mut volume = Volume::new_disk(0, 512, 4, None, true);
        assert!(open(&mut disk, &mut volume, "/foo.txt", false).is_ok());
    }
}

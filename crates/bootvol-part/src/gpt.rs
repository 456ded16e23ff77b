use crate::disk::DiskRead;
use crate::error::PartError;
use crate::volume::Volume;
use bootvol_common::part::gpt::{GptPartitionEntry, GptPartitionTableHeader};
use bootvol_common::types::endian::Endian;

/// Logical block sizes this parser probes, in the order the spec names them.
const CANDIDATE_LB_SIZES: [u32; 2] = [512, 4096];

pub enum GptLookup {
    Found(Volume),
    NoPartition,
    /// Neither candidate logical block size produced a structurally valid header; the caller
    /// should fall back to MBR.
    NotGpt,
    /// The header parsed and checksummed fine, but the entry this index maps to cannot be
    /// located without overflowing an address computation (SPEC_FULL §4.2, scenario S5).
    InvalidTable,
}

/// Finds and validates a GPT header at LBA 1 under each candidate logical block size, then
/// reads partition entry `index` out of the entry array it describes.
pub fn find_gpt_partition<D: DiskRead>(
    disk: &mut D,
    parent: &Volume,
    index: u32,
) -> Result<GptLookup, PartError> {
    for lb_size in CANDIDATE_LB_SIZES {
        if let Some(header) = read_header(disk, lb_size)? {
            return Ok(read_entry(disk, parent, &header, lb_size, index)?);
        }
    }
    Ok(GptLookup::NotGpt)
}

fn read_header<D: DiskRead>(
    disk: &mut D,
    lb_size: u32,
) -> Result<Option<GptPartitionTableHeader>, PartError> {
    let units_per_sector = lb_size / 512;
    if units_per_sector == 0 {
        return Ok(None);
    }
    let header_size = core::mem::size_of::<GptPartitionTableHeader>();
    let mut buf = alloc::vec![0u8; lb_size as usize];
    let lba = units_per_sector as u64; // LBA 1 in 512-byte units
    match disk.read_sectors(lba, units_per_sector, &mut buf) {
        Ok(()) => {}
        Err(_) => return Ok(None),
    }
    if buf.len() < header_size {
        return Ok(None);
    }
    let header: GptPartitionTableHeader = *bytemuck::from_bytes(&buf[..header_size]);
    if !header.has_valid_signature() || header.revision.get() != GptPartitionTableHeader::REVISION_1_0
    {
        return Ok(None);
    }

    let computed = bootvol_common::alg::hash::crc::Crc32HasherIsoHdlc::checksum(&{
        let mut zeroed_crc = buf[..header.header_size.get() as usize].to_vec();
        zeroed_crc[16..20].copy_from_slice(&[0, 0, 0, 0]);
        zeroed_crc
    });
    if computed != header.crc32.get() {
        log::warn!("GPT header CRC32 mismatch (diagnostic only, not fatal)");
    }

    Ok(Some(header))
}

fn read_entry<D: DiskRead>(
    disk: &mut D,
    parent: &Volume,
    header: &GptPartitionTableHeader,
    lb_size: u32,
    index: u32,
) -> Result<GptLookup, PartError> {
    let entry_size = header.size_of_partition_entry.get() as u64;
    if entry_size < core::mem::size_of::<GptPartitionEntry>() as u64 {
        return Ok(GptLookup::NotGpt);
    }
    if index >= header.num_partition_entries.get() {
        return Ok(GptLookup::NoPartition);
    }

    let entry_array_byte = match header.partition_entry_lba.get().checked_mul(lb_size as u64) {
        Some(v) => v,
        None => return Ok(GptLookup::InvalidTable),
    };
    let entry_byte_offset = match entry_size
        .checked_mul(index as u64)
        .and_then(|indexed| entry_array_byte.checked_add(indexed))
    {
        Some(v) => v,
        None => return Ok(GptLookup::InvalidTable),
    };

    let entry_lba = entry_byte_offset / 512;
    let in_sector_off = (entry_byte_offset % 512) as usize;
    let sectors_needed = (in_sector_off + entry_size as usize).div_ceil(512) as u32;
    let mut buf = alloc::vec![0u8; sectors_needed as usize * 512];
    disk.read_sectors(entry_lba, sectors_needed, &mut buf)?;

    let entry_bytes = &buf[in_sector_off..in_sector_off + core::mem::size_of::<GptPartitionEntry>()];
    let entry: GptPartitionEntry = *bytemuck::from_bytes(entry_bytes);

    if entry.unique_partition_guid.is_zero() {
        return Ok(GptLookup::NoPartition);
    }
    let starting_lba = entry.starting_lba.get();
    let ending_lba = entry.ending_lba.get();
    if ending_lba < starting_lba {
        return Ok(GptLookup::NoPartition);
    }

    let units_per_sector = (lb_size / 512) as u64;
    let (first_sect, sect_count) = match starting_lba.checked_mul(units_per_sector).and_then(|fs| {
        (ending_lba - starting_lba + 1)
            .checked_mul(units_per_sector)
            .map(|sc| (fs, sc))
    }) {
        Some(v) => v,
        None => return Ok(GptLookup::InvalidTable),
    };

    Ok(GptLookup::Found(Volume::new_partition(
        parent,
        index + 1,
        first_sect,
        sect_count,
        Some(entry.unique_partition_guid),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemoryDisk;
    use bootvol_common::part::gpt::Guid;
    use bootvol_common::types::number::U64;

    fn build_gpt_disk() -> MemoryDisk {
        let mut data = alloc::vec![0u8; 512 * 40];
        let mut header = GptPartitionTableHeader::default();
        header.partition_entry_lba = bootvol_common::types::number::U32::new(2);
        header.num_partition_entries = bootvol_common::types::number::U32::new(128);
        header.size_of_partition_entry = bootvol_common::types::number::U32::new(128);
        let header_bytes = bytemuck::bytes_of(&header);
        data[512..512 + header_bytes.len()].copy_from_slice(header_bytes);

        let entry = GptPartitionEntry {
            type_guid: Guid::from_bytes([1; 16]),
            unique_partition_guid: Guid::from_bytes([2; 16]),
            starting_lba: U64::new(34),
            ending_lba: U64::new(1000),
            attributes: U64::new(0),
            partition_name: bytemuck::Zeroable::zeroed(),
        };
        let entry_bytes = bytemuck::bytes_of(&entry);
        data[1024..1024 + entry_bytes.len()].copy_from_slice(entry_bytes);

        MemoryDisk::new(data)
    }

    #[test]
    fn finds_first_partition() {
        let mut disk = build_gpt_disk();
        let parent = Volume::new_disk(0, 512, 1, None, false);
        match find_gpt_partition(&mut disk, &parent, 0).unwrap() {
            GptLookup::Found(vol) => {
                assert_eq!(vol.first_sect, 34);
                assert_eq!(vol.sect_count, Some(967));
                assert_eq!(vol.partition, 1);
            }
            _ => panic!("expected a partition"),
        }
    }

    #[test]
    fn missing_entry_is_no_partition() {
        let mut disk = build_gpt_disk();
        let parent = Volume::new_disk(0, 512, 1, None, false);
        match find_gpt_partition(&mut disk, &parent, 1).unwrap() {
            GptLookup::NoPartition => {}
            _ => panic!("expected no partition at index 1"),
        }
    }

    #[test]
    fn non_gpt_disk_falls_through() {
        let mut disk = MemoryDisk::new(alloc::vec![0u8; 512 * 8]);
        let parent = Volume::new_disk(0, 512, 1, None, false);
        assert!(matches!(
            find_gpt_partition(&mut disk, &parent, 0).unwrap(),
            GptLookup::NotGpt
        ));
    }

    #[test]
    fn overflowing_entry_offset_is_invalid_table() {
        // No real disk holds an entry array this far out; the offset computation overflows u64
        // before any sector read is attempted.
        let mut data = alloc::vec![0u8; 512 * 40];
        let mut header = GptPartitionTableHeader::default();
        header.partition_entry_lba = U64::new(u64::MAX / 2);
        header.num_partition_entries = bootvol_common::types::number::U32::new(128);
        header.size_of_partition_entry = bootvol_common::types::number::U32::new(128);
        let header_bytes = bytemuck::bytes_of(&header);
        data[512..512 + header_bytes.len()].copy_from_slice(header_bytes);
        let mut disk = MemoryDisk::new(data);

        let parent = Volume::new_disk(0, 512, 1, None, false);
        assert!(matches!(
            find_gpt_partition(&mut disk, &parent, 0).unwrap(),
            GptLookup::InvalidTable
        ));
    }
}

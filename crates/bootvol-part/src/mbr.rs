use crate::disk::DiskRead;
use crate::error::PartError;
use crate::volume::Volume;
use bootvol_common::part::mbr::MbrPartitionTable;
use bootvol_common::types::endian::Endian;

/// Maximum number of logical partitions walked inside the extended partition chain, per the
/// bounded-scan-cap convention used throughout this codebase's parsers.
const MAX_EBR_ENTRIES: usize = 256;

/// Sectors 0-2 (1536 bytes) cover every whole-disk-filesystem signature this heuristic checks,
/// including the ext2 magic at byte offset 1080.
const SIGNATURE_SCAN_SECTORS: u32 = 3;

fn looks_like_whole_disk_filesystem(sectors: &[u8]) -> bool {
    if sectors.len() < 1082 {
        return false;
    }
    &sectors[3..7] == b"NTFS"
        || &sectors[54..57] == b"FAT"
        || &sectors[82..85] == b"FAT"
        || &sectors[3..8] == b"FAT32"
        || u16::from_le_bytes([sectors[1080], sectors[1081]]) == 0xEF53
}

/// Reads and validates the primary MBR partition table at offset 446 of sector 0.
/// Returns `None` if the plausibility heuristics fail (status bytes, whole-disk-filesystem
/// signatures) -- the caller should treat that as "not an MBR" rather than an error.
fn read_table<D: DiskRead>(disk: &mut D) -> Result<Option<MbrPartitionTable>, PartError> {
    let mut scan_buf = [0u8; 512 * SIGNATURE_SCAN_SECTORS as usize];
    disk.read_sectors(0, SIGNATURE_SCAN_SECTORS, &mut scan_buf)?;
    if looks_like_whole_disk_filesystem(&scan_buf) {
        return Ok(None);
    }
    let sector0 = &scan_buf[..512];
    let table_bytes: [u8; MbrPartitionTable::SIZE] = sector0
        [MbrPartitionTable::OFFSET..MbrPartitionTable::OFFSET + MbrPartitionTable::SIZE]
        .try_into()
        .unwrap();
    let table = MbrPartitionTable::from_bytes(&table_bytes);
    if !table.has_plausible_boot_indicators() {
        return Ok(None);
    }
    Ok(Some(table))
}

/// Finds primary partition `index` (0..4) in the MBR at sector 0.
pub fn find_mbr_partition<D: DiskRead>(
    disk: &mut D,
    parent: &Volume,
    index: u32,
) -> Result<Option<Volume>, PartError> {
    let Some(table) = read_table(disk)? else {
        return Ok(None);
    };
    let entry = &table[index as usize];
    if entry.is_empty() {
        return Ok(None);
    }
    Ok(Some(Volume::new_partition(
        parent,
        index + 1,
        entry.start_sector.get() as u64,
        entry.block_count.get() as u64,
        None,
    )))
}

/// Walks the EBR chain inside the first extended primary partition (type `0x05`/`0x0F`) to find
/// logical partition `index` (`index >= 4`, numbered from 5 upward at the API boundary).
pub fn find_ebr_partition<D: DiskRead>(
    disk: &mut D,
    parent: &Volume,
    index: u32,
) -> Result<Option<Volume>, PartError> {
    let Some(table) = read_table(disk)? else {
        return Ok(None);
    };
    let Some(extended) = table.partitions.iter().find(|p| p.partition_type().is_extended()) else {
        return Ok(None);
    };

    let extended_start = extended.start_sector.get() as u64;
    let extended_count = extended.block_count.get() as u64;
    let target = (index - 4) as usize;

    let mut ebr_sector = extended_start;
    let mut prev_sector = 0u64;
    for step in 0..MAX_EBR_ENTRIES {
        if ebr_sector >= extended_start + extended_count {
            return Ok(None);
        }
        if step > 0 && ebr_sector <= prev_sector {
            return Ok(None);
        }

        let mut sector = [0u8; 512];
        disk.read_sectors(ebr_sector, 1, &mut sector)?;
        let table_bytes: [u8; MbrPartitionTable::SIZE] = sector
            [MbrPartitionTable::OFFSET..MbrPartitionTable::OFFSET + MbrPartitionTable::SIZE]
            .try_into()
            .unwrap();
        let ebr_table = MbrPartitionTable::from_bytes(&table_bytes);

        let logical = &ebr_table[0];
        if step == target && !logical.is_empty() {
            return Ok(Some(Volume::new_partition(
                parent,
                index + 1,
                ebr_sector + logical.start_sector.get() as u64,
                logical.block_count.get() as u64,
                None,
            )));
        }

        let next = &ebr_table[1];
        if next.is_empty() {
            return Ok(None);
        }
        prev_sector = ebr_sector;
        ebr_sector = extended_start + next.start_sector.get() as u64;

        if step == target {
            return Ok(None);
        }
    }
    Ok(None)
}

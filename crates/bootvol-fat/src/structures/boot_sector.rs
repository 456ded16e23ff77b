//! BIOS Parameter Block parsing and FAT12/16/32 type detection.
use crate::error::FatError;
use crate::structures::raw::boot_sector::{RawBootSector, RawBpbExt16, RawBpbExt32};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    HighDensityFloppy = 0xF0,
    HardDisk = 0xF8,
    DoubleDensityFloppy = 0xF9,
    Reserved1 = 0xFA,
    Reserved2 = 0xFB,
    Reserved3 = 0xFC,
    Reserved4 = 0xFD,
    Reserved5 = 0xFE,
    Reserved6 = 0xFF,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatKind {
    Fat12,
    Fat16,
    Fat32,
}

/// Native-endianness BPB fields, plus whichever extended (16- or 32-bit) fields apply given the
/// detected [`FatKind`].
#[derive(Debug, Clone, Copy)]
pub struct BpbInfo {
    pub kind: FatKind,
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sector_count: u16,
    pub fat_count: u8,
    pub root_entry_count: u16,
    pub total_sectors: u32,
    pub sectors_per_fat: u32,
    pub hidden_sector_count: u32,
    /// FAT32 only; 0 for FAT12/16, whose root directory is a fixed region instead.
    pub root_cluster: u32,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
}

impl BpbInfo {
    /// Sector offset of the first FAT's lowest-numbered copy.
    pub fn fat_start_sector(&self) -> u32 {
        self.reserved_sector_count as u32
    }

    /// Sector offset of the root directory region. For FAT12/16 this is a fixed-size region
    /// following the FAT copies; for FAT32 it is meaningless (use `root_cluster` instead).
    pub fn root_dir_start_sector(&self) -> u32 {
        self.fat_start_sector() + self.fat_count as u32 * self.sectors_per_fat
    }

    /// Size in sectors of the fixed-size FAT12/16 root directory region.
    pub fn root_dir_sectors(&self) -> u32 {
        let bytes = self.root_entry_count as u32 * 32;
        (bytes + self.bytes_per_sector as u32 - 1) / self.bytes_per_sector as u32
    }

    /// Sector offset of the start of the data (cluster) region.
    pub fn data_start_sector(&self) -> u32 {
        self.root_dir_start_sector() + self.root_dir_sectors()
    }

    pub fn bytes_per_cluster(&self) -> u32 {
        self.bytes_per_sector as u32 * self.sectors_per_cluster as u32
    }

    /// Byte offset of a data cluster; `cluster` must be `>= 2`.
    pub fn cluster_byte_offset(&self, cluster: u32) -> u64 {
        let sector = self.data_start_sector() as u64 + (cluster as u64 - 2) * self.sectors_per_cluster as u64;
        sector * self.bytes_per_sector as u64
    }
}

/// Checks the BPB signature strings at offsets 0x36 (FAT12/16 `fs_type`), 0x52 (FAT32
/// `fs_type`), and 0x03 (`oem_name`) and logs a warning on mismatch. Real images occasionally
/// carry stale signatures, so this is advisory only and never gates rejection.
fn check_signature_strings(raw: &RawBootSector, kind: FatKind) {
    if !raw.bpb.oem_name.is_ascii() {
        log::warn!("FAT BPB OEM name at offset 0x03 is not ASCII (diagnostic only)");
    }

    let (fs_type, expected): ([u8; 8], &[u8; 8]) = match kind {
        FatKind::Fat32 => {
            let ext32: RawBpbExt32 = unsafe { raw.bpb_ext.bpb32 };
            (ext32.fs_type, b"FAT32   ")
        }
        FatKind::Fat16 => {
            let ext16: RawBpbExt16 = unsafe { raw.bpb_ext.bpb16 };
            (ext16.fs_type, b"FAT16   ")
        }
        FatKind::Fat12 => {
            let ext16: RawBpbExt16 = unsafe { raw.bpb_ext.bpb16 };
            (ext16.fs_type, b"FAT12   ")
        }
    };
    if &fs_type != expected {
        log::warn!(
            "FAT BPB fs_type signature at offset {} does not match the detected type (diagnostic only)",
            if kind == FatKind::Fat32 { "0x52" } else { "0x36" }
        );
    }
}

/// Parses the boot sector at LBA 0 and classifies it as FAT12/16/32, per the Microsoft
/// data-sector-count thresholds. Structural overshoot -- the case the reference driver would
/// otherwise treat with a blanket "must be FAT32" panic -- is returned as a typed error, since a
/// boot-time parser has to survive a hostile or merely malformed image rather than abort.
pub fn detect(raw: &RawBootSector) -> Result<BpbInfo, FatError> {
    let bpb = &raw.bpb;
    if !bpb.check_bytes_per_sector() {
        return Err(FatError::InvalidSignature);
    }

    let bytes_per_sector = u16::from_le_bytes(bpb.bytes_per_sector);
    let sectors_per_cluster = bpb.sectors_per_cluster;
    let reserved_sector_count = u16::from_le_bytes(bpb.reserved_sector_count);
    let fat_count = bpb.fat_count;
    let root_entry_count = u16::from_le_bytes(bpb.root_entry_count);
    let total_sectors_16 = u16::from_le_bytes(bpb.total_sectors_16);
    let total_sectors_32 = u32::from_le_bytes(bpb.total_sectors_32);
    let sectors_per_fat_16 = u16::from_le_bytes(bpb.sectors_per_fat_16);
    let hidden_sector_count = u32::from_le_bytes(bpb.hidden_sector_count);

    let total_sectors = if total_sectors_16 != 0 {
        total_sectors_16 as u32
    } else {
        total_sectors_32
    };

    let root_dir_sectors =
        (root_entry_count as u32 * 32 + bytes_per_sector as u32 - 1) / bytes_per_sector as u32;

    // sectors_per_fat_16 == 0 means "use the FAT32 extension", which also implies FAT32.
    let (sectors_per_fat, root_cluster, volume_id, volume_label) = if sectors_per_fat_16 == 0 {
        // SAFETY: callers only reach here after `check_bytes_per_sector`, which does not touch
        // `bpb_ext`; the union is read through its FAT32 arm based on the BPB field that governs
        // which arm is valid.
        let ext32: RawBpbExt32 = unsafe { raw.bpb_ext.bpb32 };
        (
            u32::from_le_bytes(ext32.sectors_per_fat_32),
            u32::from_le_bytes(ext32.root_cluster),
            u32::from_le_bytes(ext32.volume_id),
            ext32.volume_label,
        )
    } else {
        let ext16: RawBpbExt16 = unsafe { raw.bpb_ext.bpb16 };
        (
            sectors_per_fat_16 as u32,
            0,
            u32::from_le_bytes(ext16.volume_id),
            ext16.volume_label,
        )
    };

    let metadata_sectors =
        reserved_sector_count as u64 + fat_count as u64 * sectors_per_fat as u64 + root_dir_sectors as u64;
    if metadata_sectors >= total_sectors as u64 {
        return Err(FatError::StructuralOverflow {
            metadata: metadata_sectors,
            total: total_sectors as u64,
        });
    }

    let data_sectors = total_sectors as u64 - metadata_sectors;
    let data_clusters = data_sectors / sectors_per_cluster.max(1) as u64;

    let kind = if sectors_per_fat_16 == 0 {
        FatKind::Fat32
    } else if data_clusters < 4085 {
        FatKind::Fat12
    } else if data_clusters < 65525 {
        FatKind::Fat16
    } else {
        return Err(FatError::Fat16Overflow);
    };

    check_signature_strings(raw, kind);

    Ok(BpbInfo {
        kind,
        bytes_per_sector,
        sectors_per_cluster,
        reserved_sector_count,
        fat_count,
        root_entry_count,
        total_sectors,
        sectors_per_fat,
        hidden_sector_count,
        root_cluster,
        volume_id,
        volume_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::raw::boot_sector::{RawBootSector, RawBpb, RawBpbExt, RawBpbExt32};

    fn fat32_image() -> RawBootSector {
        let bpb = RawBpb {
            jump: [0xEB, 0x3C, 0x90],
            oem_name: *b"mkfs.fat",
            bytes_per_sector: 512u16.to_le_bytes(),
            sectors_per_cluster: 8,
            reserved_sector_count: 32u16.to_le_bytes(),
            fat_count: 2,
            root_entry_count: 0u16.to_le_bytes(),
            total_sectors_16: 0u16.to_le_bytes(),
            media_type: 0xF8,
            sectors_per_fat_16: 0u16.to_le_bytes(),
            sectors_per_track: 0u16.to_le_bytes(),
            num_heads: 0u16.to_le_bytes(),
            hidden_sector_count: 0u32.to_le_bytes(),
            total_sectors_32: 2_000_000u32.to_le_bytes(),
        };
        let ext32 = RawBpbExt32 {
            sectors_per_fat_32: 2000u32.to_le_bytes(),
            ext_flags: 0u16.to_le_bytes(),
            version: 0u16.to_le_bytes(),
            root_cluster: 2u32.to_le_bytes(),
            fs_info_sector: 1u16.to_le_bytes(),
            boot_sector: 6u16.to_le_bytes(),
            reserved: [0; 12],
            drive_number: 0x80,
            reserved1: 0,
            ext_boot_signature: 0x29,
            volume_id: 0x1234_5678u32.to_le_bytes(),
            volume_label: *b"MY VOLUME  ",
            fs_type: *b"FAT32   ",
            padding1_1: [0; 256],
            padding1_2: [0; 128],
            padding1_3: [0; 32],
            padding1_4: [0; 4],
            signature_word: 0xAA55u16.to_le_bytes(),
        };
        RawBootSector {
            bpb,
            bpb_ext: RawBpbExt { bpb32: ext32 },
        }
    }

    #[test]
    fn detects_fat32() {
        let raw = fat32_image();
        let info = detect(&raw).unwrap();
        assert_eq!(info.kind, FatKind::Fat32);
        assert_eq!(info.root_cluster, 2);
        assert_eq!(info.sectors_per_fat, 2000);
    }

    #[test]
    fn stale_fs_type_signature_does_not_gate_detection() {
        let mut raw = fat32_image();
        let mut ext32: RawBpbExt32 = unsafe { raw.bpb_ext.bpb32 };
        ext32.fs_type = *b"FAT     ";
        raw.bpb_ext = RawBpbExt { bpb32: ext32 };
        let info = detect(&raw).unwrap();
        assert_eq!(info.kind, FatKind::Fat32);
    }

    #[test]
    fn rejects_overflowing_metadata() {
        let mut raw = fat32_image();
        raw.bpb.total_sectors_32 = 100u32.to_le_bytes();
        assert!(matches!(detect(&raw), Err(FatError::StructuralOverflow { .. })));
    }
}

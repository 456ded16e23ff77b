//! A read-only FAT12/FAT16/FAT32 reader with VFAT Long File Name support.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod error;
pub mod structures;

use alloc::string::String;
use alloc::vec::Vec;

use bootvol_part::{DiskRead, Volume};

pub use error::FatError;
pub use structures::boot_sector::{BpbInfo, FatKind};
use structures::boot_sector;
use structures::directory::{self, DecodedEntry, FileAttributes};
use structures::fat;
use structures::raw::boot_sector::RawBootSector;

/// Directory buffers (beyond the fixed FAT12/16 root region) are capped at 256 MiB.
const MAX_DIRECTORY_BYTES: usize = 256 * 1024 * 1024;
const MAX_NAME_LEN: usize = 255;

/// Where a directory's contents live: the FAT12/16 root region is a fixed LBA range; every other
/// directory is a cluster chain.
enum DirSource {
    FixedRegion { start_sector: u32, sectors: u32 },
    ClusterChain(Vec<u32>),
}

/// An open FAT file: its cached cluster chain and byte size.
pub struct FatHandle {
    chain: Vec<u32>,
    size: u64,
}

impl FatHandle {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn read<D: DiskRead>(
        &self,
        disk: &mut D,
        volume: &mut Volume,
        bpb: &BpbInfo,
        buf: &mut [u8],
        loc: u64,
    ) -> Result<(), FatError> {
        let count = buf.len() as u64;
        if loc.checked_add(count).map_or(true, |end| end > self.size) {
            return Err(FatError::NotFound);
        }
        let bytes_per_cluster = bpb.bytes_per_cluster() as u64;
        let mut written = 0u64;
        while written < count {
            let abs = loc + written;
            let cluster_index = (abs / bytes_per_cluster) as usize;
            let offset_in_cluster = abs % bytes_per_cluster;
            let cluster = *self
                .chain
                .get(cluster_index)
                .ok_or(FatError::CorruptClusterChain)?;
            let take = (bytes_per_cluster - offset_in_cluster).min(count - written);
            let byte_pos = bpb.cluster_byte_offset(cluster) + offset_in_cluster;
            volume.read(
                disk,
                &mut buf[written as usize..(written + take) as usize],
                byte_pos,
            )?;
            written += take;
        }
        Ok(())
    }
}

fn read_boot_sector<D: DiskRead>(disk: &mut D, volume: &mut Volume) -> Result<BpbInfo, FatError> {
    let mut sector = [0u8; 512];
    volume.read(disk, &mut sector, 0)?;
    if sector[510] != 0x55 || sector[511] != 0xAA {
        return Err(FatError::InvalidSignature);
    }
    let raw = RawBootSector::from_bytes(&sector);
    boot_sector::detect(raw)
}

fn read_directory_buffer<D: DiskRead>(
    disk: &mut D,
    volume: &mut Volume,
    bpb: &BpbInfo,
    source: &DirSource,
) -> Result<Vec<u8>, FatError> {
    match source {
        DirSource::FixedRegion {
            start_sector,
            sectors,
        } => {
            let len = *sectors as usize * bpb.bytes_per_sector as usize;
            if len > MAX_DIRECTORY_BYTES {
                return Err(FatError::DirectoryTooLarge);
            }
            let mut buf = alloc::vec![0u8; len];
            let byte_pos = *start_sector as u64 * bpb.bytes_per_sector as u64;
            volume.read(disk, &mut buf, byte_pos)?;
            Ok(buf)
        }
        DirSource::ClusterChain(chain) => {
            let bytes_per_cluster = bpb.bytes_per_cluster() as usize;
            let len = chain.len() * bytes_per_cluster;
            if len > MAX_DIRECTORY_BYTES {
                return Err(FatError::DirectoryTooLarge);
            }
            let mut buf = alloc::vec![0u8; len];
            for (i, &cluster) in chain.iter().enumerate() {
                let byte_pos = bpb.cluster_byte_offset(cluster);
                volume.read(
                    disk,
                    &mut buf[i * bytes_per_cluster..(i + 1) * bytes_per_cluster],
                    byte_pos,
                )?;
            }
            Ok(buf)
        }
    }
}

fn root_dir_source(bpb: &BpbInfo) -> DirSource {
    match bpb.kind {
        FatKind::Fat32 => DirSource::ClusterChain(alloc::vec![bpb.root_cluster]),
        FatKind::Fat12 | FatKind::Fat16 => DirSource::FixedRegion {
            start_sector: bpb.root_dir_start_sector(),
            sectors: bpb.root_dir_sectors(),
        },
    }
}

fn find_entry(entries: &[DecodedEntry], name: &str, case_insensitive: bool) -> Option<usize> {
    let short_match = directory::fat32_filename_to_8_3(name);
    entries.iter().position(|e| {
        if let Some(long) = &e.long_name {
            if case_insensitive {
                long.eq_ignore_ascii_case(name)
            } else {
                long == name
            }
        } else if let Some((base, ext)) = short_match {
            let mut want = [b' '; 11];
            want[..8].copy_from_slice(&base);
            want[8..].copy_from_slice(&ext);
            // `short_name` carries the `.`-joined display form; compare via the normalized
            // 8.3 fields instead of the display string.
            want.eq_ignore_ascii_case(&fixed_8_3_bytes(e))
        } else {
            e.short_name.eq_ignore_ascii_case(name)
        }
    })
}

fn fixed_8_3_bytes(entry: &DecodedEntry) -> [u8; 11] {
    let (stem, ext) = entry.short_name.split_once('.').unwrap_or((&entry.short_name, ""));
    let mut out = [b' '; 11];
    for (i, b) in stem.bytes().take(8).enumerate() {
        out[i] = b;
    }
    for (i, b) in ext.bytes().take(3).enumerate() {
        out[8 + i] = b;
    }
    out
}

/// Opens `path` (an absolute, `/`-separated path already normalized by the caller, per C7)
/// against this volume's FAT filesystem, returning the parsed BPB alongside the open handle
/// since every subsequent read needs it.
pub fn open<D: DiskRead>(
    disk: &mut D,
    volume: &mut Volume,
    path: &str,
    case_insensitive: bool,
) -> Result<(BpbInfo, FatHandle), FatError> {
    let bpb = read_boot_sector(disk, volume)?;
    let mut source = root_dir_source(&bpb);

    let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
    if components.peek().is_none() {
        return Err(FatError::NotAFile);
    }

    loop {
        let component = components.next().unwrap();
        if component.len() > MAX_NAME_LEN {
            return Err(FatError::NameTooLong);
        }
        let buf = read_directory_buffer(disk, volume, &bpb, &source)?;
        let entries = directory::decode_entries(&buf);
        let idx = find_entry(&entries, component, case_insensitive).ok_or(FatError::NotFound)?;
        let entry = &entries[idx];

        if components.peek().is_some() {
            if !entry.is_directory() {
                return Err(FatError::NotAFile);
            }
            let chain = fat::cache_cluster_chain(disk, volume, &bpb, entry.cluster)?;
            source = DirSource::ClusterChain(chain);
            continue;
        }

        if entry.is_directory() {
            return Err(FatError::NotAFile);
        }
        let chain = fat::cache_cluster_chain(disk, volume, &bpb, entry.cluster)?;
        return Ok((
            bpb,
            FatHandle {
                chain,
                size: entry.size as u64,
            },
        ));
    }
}

/// Scans the root directory for the entry carrying attribute `0x08` (and only that attribute),
/// returning its name trimmed of trailing spaces.
pub fn fs_get_label<D: DiskRead>(disk: &mut D, volume: &mut Volume) -> Result<Option<String>, FatError> {
    let bpb = read_boot_sector(disk, volume)?;
    let source = root_dir_source(&bpb);
    let buf = read_directory_buffer(disk, volume, &bpb, &source)?;
    let entries = directory::decode_entries(&buf);
    Ok(entries
        .into_iter()
        .find(|e| e.attributes == FileAttributes::VOLUME_LABEL)
        .map(|e| String::from(e.short_name.trim_end())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootvol_part::MemoryDisk;

    fn short_entry(name: [u8; 11], attrs: u8, cluster: u32, size: u32) -> [u8; 32] {
        let mut buf = [0u8; 32];
        buf[0..11].copy_from_slice(&name);
        buf[11] = attrs;
        buf[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
        buf[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
        buf[28..32].copy_from_slice(&size.to_le_bytes());
        buf
    }

    /// Builds a minimal FAT16 image: BPB at sector 0, a 1-sector FAT, a 1-sector root directory
    /// holding one file entry, and its 1-cluster data region.
    fn build_fat16_image() -> MemoryDisk {
        const SECTOR: usize = 512;
        let mut data = alloc::vec![0u8; SECTOR * 20];

        data[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        data[3..11].copy_from_slice(b"mkfs.fat");
        data[11..13].copy_from_slice(&512u16.to_le_bytes());
        data[13] = 1; // sectors per cluster
        data[14..16].copy_from_slice(&1u16.to_le_bytes()); // reserved sectors
        data[16] = 1; // fat count
        data[17..19].copy_from_slice(&16u16.to_le_bytes()); // root entry count (1 sector worth)
        data[19..21].copy_from_slice(&20u16.to_le_bytes()); // total sectors
        data[21] = 0xF8;
        data[22..24].copy_from_slice(&1u16.to_le_bytes()); // sectors per fat
        data[510] = 0x55;
        data[511] = 0xAA;

        // FAT at sector 1: cluster 2 is a single-cluster EOF chain.
        let fat_start = 1 * SECTOR;
        data[fat_start + 4..fat_start + 6].copy_from_slice(&0xFFFFu16.to_le_bytes());

        // Root directory at sector 2 (1 sector, 16 entries of 32 bytes).
        let root_start = 2 * SECTOR;
        let entry = short_entry(*b"FOO     TXT", 0x20, 2, 12);
        data[root_start..root_start + 32].copy_from_slice(&entry);

        // Data region starts at sector 3; cluster 2 is the first data cluster.
        let data_start = 3 * SECTOR;
        data[data_start..data_start + 12].copy_from_slice(b"Hello, FAT!\n");

        MemoryDisk::new(data)
    }

    #[test]
    fn opens_and_reads_a_fat16_file() {
        let mut disk = build_fat16_image();
        let mut volume = Volume::new_disk(0, 512, 4, None, false);
        let (bpb, handle) = open(&mut disk, &mut volume, "/FOO.TXT", false).unwrap();
        assert_eq!(handle.size(), 12);
        let mut buf = [0u8; 12];
        handle.read(&mut disk, &mut volume, &bpb, &mut buf, 0).unwrap();
        assert_eq!(&buf, b"Hello, FAT!\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let mut disk = build_fat16_image();
        let mut volume = Volume::new_disk(0, 512, 4, None, false);
        assert!(matches!(
            open(&mut disk, &mut volume, "/MISSING.TXT", false),
            Err(FatError::NotFound)
        ));
    }
}

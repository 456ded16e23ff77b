//! Read-only partition discovery and a byte-granular volume cache.
//!
//! This crate turns a raw block device into a tree of [`Volume`]s: the whole-disk volume,
//! then one child volume per GPT/MBR/EBR partition entry, each registered in a process-wide
//! [`VolumeIndex`]. Filesystem parsing (`bootvol-iso`, `bootvol-fat`) reads through
//! [`Volume::read`], never touching the disk trait directly.
//!
//! This crate assumes an `alloc`-capable target -- the boot environment's arena allocator, per
//! the data model's memory discipline -- even in `no_std` builds; there is no alloc-free mode.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod disk;
mod error;
mod gpt;
mod index;
mod mbr;
mod volume;

pub use disk::{DiskError, DiskRead};
pub use error::PartError;
pub use gpt::find_gpt_partition;
pub use index::{VolumeCoordinate, VolumeIndex};
pub use mbr::{find_ebr_partition, find_mbr_partition};
pub use volume::Volume;

/// Outcome of asking for one partition entry by index, matching the C-level status enum
/// named in the partition-table design (`OK` / `NO_PARTITION` / `END_OF_TABLE` / `INVALID_TABLE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartGetStatus {
    Ok,
    NoPartition,
    EndOfTable,
    InvalidTable,
}

/// Tries GPT first; on a structurally invalid GPT, falls back to MBR (primary or, for
/// `index >= 4`, the logical-partition chain inside the first extended partition).
pub fn part_get<D: DiskRead>(
    disk: &mut D,
    parent: &Volume,
    index: u32,
) -> Result<(PartGetStatus, Option<Volume>), PartError> {
    match gpt::find_gpt_partition(disk, parent, index)? {
        gpt::GptLookup::Found(volume) => return Ok((PartGetStatus::Ok, Some(volume))),
        gpt::GptLookup::NoPartition => return Ok((PartGetStatus::NoPartition, None)),
        gpt::GptLookup::InvalidTable => return Ok((PartGetStatus::InvalidTable, None)),
        gpt::GptLookup::NotGpt => {}
    }

    if index < 4 {
        match mbr::find_mbr_partition(disk, parent, index)? {
            Some(volume) => Ok((PartGetStatus::Ok, Some(volume))),
            None => Ok((PartGetStatus::NoPartition, None)),
        }
    } else {
        match mbr::find_ebr_partition(disk, parent, index)? {
            Some(volume) => Ok((PartGetStatus::Ok, Some(volume))),
            None => Ok((PartGetStatus::EndOfTable, None)),
        }
    }
}

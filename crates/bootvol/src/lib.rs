//! Filesystem dispatch and the public facade over the bootvol stack.
//!
//! This crate ties `bootvol-part` (volume discovery and the block cache), `bootvol-iso`
//! (ISO9660+Rock Ridge) and `bootvol-fat` (FAT12/16/32+LFN) together behind one `open`/`read`/
//! `close` surface: probe a volume for its filesystem type, then dispatch every subsequent call
//! to whichever backend matched.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::string::String;

use bootvol_common::part::gpt::Guid;
pub use bootvol_fat::FatError;
pub use bootvol_iso::IsoError;
use bootvol_part::{DiskRead, Volume};

/// Process-wide configuration threaded explicitly through every dispatch and open call,
/// standing in for what a C implementation would keep as global flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootVolContext {
    /// When set, ISO9660/FAT path lookups fall back to case-insensitive comparison instead of
    /// the format's native case-sensitivity rule.
    pub case_insensitive_fopen: bool,
}

/// Filesystem kind identified on a volume, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsKind {
    Iso9660,
    Fat,
}

#[derive(Debug, thiserror::Error)]
pub enum BootVolError {
    #[error(transparent)]
    Iso(#[from] IsoError),
    #[error(transparent)]
    Fat(#[from] FatError),
    #[error("volume does not hold a recognized filesystem")]
    UnrecognizedFilesystem,
}

enum HandleInner {
    Iso9660(bootvol_iso::Iso9660Handle),
    Fat(bootvol_fat::BpbInfo, bootvol_fat::FatHandle),
}

/// A file opened through the dispatch layer, tagged with the filesystem that produced it.
pub struct FileHandle {
    inner: HandleInner,
}

impl FileHandle {
    pub fn kind(&self) -> FsKind {
        match &self.inner {
            HandleInner::Iso9660(_) => FsKind::Iso9660,
            HandleInner::Fat(..) => FsKind::Fat,
        }
    }

    pub fn size(&self) -> u64 {
        match &self.inner {
            HandleInner::Iso9660(h) => h.size(),
            HandleInner::Fat(_, h) => h.size(),
        }
    }

    /// Reads `buf.len()` bytes at byte offset `loc`, dispatching to whichever backend opened
    /// this file.
    pub fn read<D: DiskRead>(
        &self,
        disk: &mut D,
        volume: &mut Volume,
        buf: &mut [u8],
        loc: u64,
    ) -> Result<(), BootVolError> {
        match &self.inner {
            HandleInner::Iso9660(h) => Ok(h.read(disk, volume, buf, loc)?),
            HandleInner::Fat(bpb, h) => Ok(h.read(disk, volume, bpb, buf, loc)?),
        }
    }

    /// Releases the handle. The handle owns no disk-side resources (its cluster chain / extent
    /// list lives entirely in the arena), so this is just a drop -- kept as an explicit call to
    /// mirror the `{read, close}` shape every opened file exposes per the dispatch design.
    pub fn close(self) {}
}

/// Tries ISO9660 first, then FAT, returning whichever filesystem recognizes the volume.
fn probe<D: DiskRead>(disk: &mut D, volume: &mut Volume) -> Result<FsKind, BootVolError> {
    if bootvol_iso::is_iso9660(disk, volume).unwrap_or(false) {
        return Ok(FsKind::Iso9660);
    }
    if bootvol_fat::fs_get_label(disk, volume).is_ok() {
        return Ok(FsKind::Fat);
    }
    log::warn!("volume matched neither ISO9660 nor FAT during dispatch probe");
    Err(BootVolError::UnrecognizedFilesystem)
}

/// Opens `path` against whichever filesystem is found on `volume`, honoring
/// `ctx.case_insensitive_fopen`.
pub fn open<D: DiskRead>(
    disk: &mut D,
    volume: &mut Volume,
    ctx: &BootVolContext,
    path: &str,
) -> Result<FileHandle, BootVolError> {
    match probe(disk, volume)? {
        FsKind::Iso9660 => {
            let handle = bootvol_iso::open(disk, volume, path, ctx.case_insensitive_fopen)?;
            Ok(FileHandle {
                inner: HandleInner::Iso9660(handle),
            })
        }
        FsKind::Fat => {
            let (bpb, handle) =
                bootvol_fat::open(disk, volume, path, ctx.case_insensitive_fopen)?;
            Ok(FileHandle {
                inner: HandleInner::Fat(bpb, handle),
            })
        }
    }
}

/// Reads `buf.len()` bytes at byte offset `loc` from an already-open file.
pub fn read<D: DiskRead>(
    disk: &mut D,
    volume: &mut Volume,
    handle: &FileHandle,
    buf: &mut [u8],
    loc: u64,
) -> Result<(), BootVolError> {
    handle.read(disk, volume, buf, loc)
}

pub fn close(handle: FileHandle) {
    handle.close();
}

/// Returns the volume's partition GUID (GPT) or `None` (MBR/unpartitioned volumes have no GUID).
pub fn fs_get_guid(volume: &Volume) -> Option<Guid> {
    volume.part_guid
}

/// Returns the filesystem's volume label, trying each known filesystem in probe order.
pub fn fs_get_label<D: DiskRead>(disk: &mut D, volume: &mut Volume) -> Result<String, BootVolError> {
    match probe(disk, volume)? {
        FsKind::Iso9660 => Ok(bootvol_iso::fs_get_label(disk, volume)?),
        FsKind::Fat => Ok(bootvol_fat::fs_get_label(disk, volume)?.unwrap_or_default()),
    }
}

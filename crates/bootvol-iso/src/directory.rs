//! Directory record parsing (ECMA-119 §9) and the Rock Ridge/multi-extent logic layered on top.
use alloc::vec::Vec;

use crate::error::IsoError;
use crate::rockridge;
use crate::types::{RecordingDateTime, U16LsbMsb, U32LsbMsb};

/// The fixed-size part of a directory record; the identifier and any System Use Area follow it.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectoryRecordHeader {
    pub len: u8,
    pub extended_attr_record_len: u8,
    pub extent: U32LsbMsb,
    pub data_len: U32LsbMsb,
    pub date_time: RecordingDateTime,
    pub flags: u8,
    pub file_unit_size: u8,
    pub interleave_gap_size: u8,
    pub volume_sequence_number: U16LsbMsb,
    pub file_identifier_len: u8,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileFlags: u8 {
        const HIDDEN = 0b0000_0001;
        const DIRECTORY = 0b0000_0010;
        const ASSOCIATED_FILE = 0b0000_0100;
        const EXTENDED_ATTRIBUTES = 0b0000_1000;
        const EXTENDED_PERMISSIONS = 0b0001_0000;
        /// Set on every entry but the last of a multi-extent file.
        const MULTI_EXTENT = 0b1000_0000;
    }
}

impl DirectoryRecordHeader {
    pub fn flags(&self) -> FileFlags {
        FileFlags::from_bits_retain(self.flags)
    }

    pub fn is_directory(&self) -> bool {
        self.flags().contains(FileFlags::DIRECTORY)
    }
}

/// One directory record as found during a directory-buffer scan: the fixed header, the raw
/// (un-decoded) ISO identifier bytes, and the System Use Area bytes that follow it, if any.
pub struct RawRecord<'a> {
    pub header: &'a DirectoryRecordHeader,
    pub identifier: &'a [u8],
    pub sua: &'a [u8],
    /// Byte offset of this record within the directory buffer it was scanned from.
    pub offset: usize,
}

const HEADER_SIZE: usize = core::mem::size_of::<DirectoryRecordHeader>();

/// Strips the `;version` (and a preceding `.` for a bare version, e.g. `FOO.;1`) suffix ISO9660
/// appends to every non-directory identifier.
fn strip_version_suffix(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b';') {
        Some(semi) => {
            let base = &name[..semi];
            base.strip_suffix(b".").unwrap_or(base)
        }
        None => name,
    }
}

/// Decodes a raw record's effective name: the Rock Ridge `NM` entry if present, else the ISO
/// identifier with its version suffix stripped.
pub fn decode_name(record: &RawRecord<'_>) -> (Vec<u8>, bool) {
    if let Some(rr_name) = rockridge::find_name(record.sua) {
        (rr_name.to_vec(), true)
    } else {
        (strip_version_suffix(record.identifier).to_vec(), false)
    }
}

/// Scans `buf` (a directory's full contents, sector-aligned) for the first valid record at or
/// after `start`. A `len == 0` byte means "padding to the next 2048-byte sector boundary";
/// the scan skips ahead to there and continues. Returns `None` at the end of the buffer.
pub fn next_record(buf: &[u8], start: usize) -> Option<RawRecord<'_>> {
    const SECTOR_SIZE: usize = 2048;
    let mut pos = start;
    loop {
        if pos >= buf.len() {
            return None;
        }
        let len = buf[pos] as usize;
        if len == 0 {
            let next_sector = (pos / SECTOR_SIZE + 1) * SECTOR_SIZE;
            if next_sector >= buf.len() {
                return None;
            }
            pos = next_sector;
            continue;
        }
        if len < HEADER_SIZE || pos + len > buf.len() {
            return None;
        }
        let header: &DirectoryRecordHeader =
            bytemuck::from_bytes(&buf[pos..pos + HEADER_SIZE]);
        let id_len = header.file_identifier_len as usize;
        let id_start = pos + HEADER_SIZE;
        if id_start + id_len > pos + len {
            return None;
        }
        let identifier = &buf[id_start..id_start + id_len];
        // A padding byte follows an even-length identifier (ECMA-119 §9.1.12).
        let sua_start = id_start + id_len + if id_len % 2 == 0 { 1 } else { 0 };
        let sua = if sua_start < pos + len {
            &buf[sua_start..pos + len]
        } else {
            &[]
        };
        return Some(RawRecord {
            header,
            identifier,
            sua,
            offset: pos,
        });
    }
}

/// Iterates every record in a directory buffer, record-length-zero padding skipped.
pub fn records(buf: &[u8]) -> impl Iterator<Item = RawRecord<'_>> {
    let mut pos = 0usize;
    core::iter::from_fn(move || {
        let record = next_record(buf, pos)?;
        pos = record.offset + record.header.len as usize;
        Some(record)
    })
}

/// Maximum number of entries a multi-extent file may be assembled from.
pub const MAX_EXTENTS: usize = 65_536;

/// One contiguous run of sectors backing part of a file's data.
#[derive(Debug, Clone, Copy)]
pub struct Extent {
    pub lba: u32,
    pub len: u32,
}

/// Given the directory buffer and the offset the initial match was found at, collects every
/// directory record with the same identifier immediately following it while the multi-extent
/// flag is set, per ECMA-119's contiguous-extents convention.
pub fn collect_extents(buf: &[u8], first: &RawRecord<'_>) -> Result<(Vec<Extent>, u64), IsoError> {
    let mut extents = Vec::new();
    let mut total_len = 0u64;
    let mut current = RawRecord {
        header: first.header,
        identifier: first.identifier,
        sua: first.sua,
        offset: first.offset,
    };
    loop {
        extents.push(Extent {
            lba: current.header.extent.read(),
            len: current.header.data_len.read(),
        });
        total_len += current.header.data_len.read() as u64;
        if extents.len() > MAX_EXTENTS {
            return Err(IsoError::TooManyExtents);
        }
        if !current.header.flags().contains(FileFlags::MULTI_EXTENT) {
            break;
        }
        let next_offset = current.offset + current.header.len as usize;
        match next_record(buf, next_offset) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok((extents, total_len))
}

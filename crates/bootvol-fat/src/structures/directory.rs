//! Directory entry parsing: short (8.3) names, VFAT Long File Name assembly, and the 8.3
//! uppercasing fallback used to compare a path component against a directory when no LFN
//! sequence matches.
use alloc::string::String;
use alloc::vec::Vec;

use crate::structures::raw::directory::{RawFileEntry, RawLfnEntry};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileAttributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        const VOLUME_LABEL = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;
        const LONG_NAME = Self::READ_ONLY.bits() | Self::HIDDEN.bits() | Self::SYSTEM.bits() | Self::VOLUME_LABEL.bits();
    }
}

/// A decoded directory entry: the short-name entry's fields, plus the long name if an LFN
/// sequence preceded it.
#[derive(Debug, Clone)]
pub struct DecodedEntry {
    pub short_name: String,
    pub long_name: Option<String>,
    pub attributes: FileAttributes,
    pub cluster: u32,
    pub size: u32,
}

impl DecodedEntry {
    pub fn effective_name(&self) -> &str {
        self.long_name.as_deref().unwrap_or(&self.short_name)
    }

    pub fn is_directory(&self) -> bool {
        self.attributes.contains(FileAttributes::DIRECTORY)
    }
}

const ENTRY_SIZE: usize = 32;

fn decode_short_name(raw: &RawFileEntry) -> String {
    let base = core::str::from_utf8(&raw.name[0..8]).unwrap_or("").trim_end();
    let ext = core::str::from_utf8(&raw.name[8..11]).unwrap_or("").trim_end();
    if ext.is_empty() {
        String::from(base)
    } else {
        let mut s = String::from(base);
        s.push('.');
        s.push_str(ext);
        s
    }
}

/// A volume-label entry's name is the full 11-byte field with no 8.3 dot splitting.
fn decode_label_name(raw: &RawFileEntry) -> String {
    String::from(core::str::from_utf8(&raw.name).unwrap_or("").trim_end())
}

/// Appends one LFN entry's 13 UCS-2 code units to `buf`, ASCII-lossily (low byte only, matching
/// this reader's byte-oriented name comparisons), stopping at the first NUL/0xFFFF terminator.
fn append_lfn_chars(entry: &RawLfnEntry, buf: &mut Vec<u16>) {
    let parts = [&entry.name1[..], &entry.name2[..], &entry.name3[..]];
    'outer: for part in parts {
        for pair in part.chunks_exact(2) {
            let unit = u16::from_le_bytes([pair[0], pair[1]]);
            if unit == 0x0000 || unit == 0xFFFF {
                break 'outer;
            }
            buf.push(unit);
        }
    }
}

/// Scans a directory buffer (32-byte entries) assembling LFN sequences over their terminal short
/// entry. Stops at a `0x00` name byte (end of directory); skips `0xE5` (deleted) entries and any
/// orphaned LFN entries not followed by a short entry.
pub fn decode_entries(buf: &[u8]) -> Vec<DecodedEntry> {
    let mut entries = Vec::new();
    let mut pending_lfn: Vec<(u8, Vec<u16>)> = Vec::new();

    let mut pos = 0;
    while pos + ENTRY_SIZE <= buf.len() {
        let chunk = &buf[pos..pos + ENTRY_SIZE];
        pos += ENTRY_SIZE;

        if chunk[0] == 0x00 {
            break;
        }
        if chunk[0] == 0xE5 {
            pending_lfn.clear();
            continue;
        }

        let attributes = FileAttributes::from_bits_retain(chunk[11]);
        if attributes.contains(FileAttributes::LONG_NAME) {
            let lfn: &RawLfnEntry = bytemuck::from_bytes(chunk);
            let seq = lfn.sequence_number & !0x40;
            let mut chars = Vec::new();
            append_lfn_chars(lfn, &mut chars);
            pending_lfn.push((seq, chars));
            continue;
        }

        let raw: &RawFileEntry = bytemuck::from_bytes(chunk);
        if attributes == FileAttributes::VOLUME_LABEL {
            pending_lfn.clear();
            entries.push(DecodedEntry {
                short_name: decode_label_name(raw),
                long_name: None,
                attributes,
                cluster: 0,
                size: 0,
            });
            continue;
        }

        let long_name = if !pending_lfn.is_empty() {
            pending_lfn.sort_by_key(|(seq, _)| *seq);
            let mut name = String::new();
            for (_, chars) in pending_lfn.drain(..) {
                for unit in chars {
                    name.push(char::from_u32(unit as u32).unwrap_or('_'));
                }
            }
            Some(name)
        } else {
            None
        };

        let cluster = (u16::from_le_bytes(raw.first_cluster_high) as u32) << 16
            | u16::from_le_bytes(raw.first_cluster_low) as u32;
        entries.push(DecodedEntry {
            short_name: decode_short_name(raw),
            long_name,
            attributes,
            cluster,
            size: u32::from_le_bytes(raw.size),
        });
    }
    entries
}

/// Converts a path component to its uppercased 8.3 form for short-name comparison: a single dot
/// permitted, 1-8 name bytes, 0-3 extension bytes.
pub fn fat32_filename_to_8_3(name: &str) -> Option<([u8; 8], [u8; 3])> {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((s, e)) => (s, e),
        None => (name, ""),
    };
    if stem.is_empty() || stem.len() > 8 || ext.len() > 3 {
        return None;
    }
    let mut base = [b' '; 8];
    let mut extension = [b' '; 3];
    for (i, b) in stem.bytes().enumerate() {
        base[i] = b.to_ascii_uppercase();
    }
    for (i, b) in ext.bytes().enumerate() {
        extension[i] = b.to_ascii_uppercase();
    }
    Some((base, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_entry(name: [u8; 11], attrs: u8, cluster: u32, size: u32) -> [u8; 32] {
        let mut buf = [0u8; 32];
        buf[0..11].copy_from_slice(&name);
        buf[11] = attrs;
        buf[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
        buf[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
        buf[28..32].copy_from_slice(&size.to_le_bytes());
        buf
    }

    #[test]
    fn decodes_plain_short_entry() {
        let buf = short_entry(*b"FOO     TXT", 0x20, 5, 100);
        let entries = decode_entries(&buf);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].effective_name(), "FOO.TXT");
        assert_eq!(entries[0].cluster, 5);
        assert_eq!(entries[0].size, 100);
    }

    #[test]
    fn stops_at_end_marker() {
        let mut buf = short_entry(*b"FOO     TXT", 0x20, 5, 100).to_vec();
        buf.extend_from_slice(&[0u8; 32]);
        buf.extend_from_slice(&short_entry(*b"BAR     TXT", 0x20, 6, 1));
        let entries = decode_entries(&buf);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn skips_deleted_entry() {
        let mut deleted = short_entry(*b"OLD     TXT", 0x20, 1, 1);
        deleted[0] = 0xE5;
        let mut buf = deleted.to_vec();
        buf.extend_from_slice(&short_entry(*b"FOO     TXT", 0x20, 5, 100));
        let entries = decode_entries(&buf);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].short_name, "FOO.TXT");
    }

    #[test]
    fn retains_volume_label_entry() {
        let buf = short_entry(*b"MY VOLUME  ", 0x08, 0, 0);
        let entries = decode_entries(&buf);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attributes, FileAttributes::VOLUME_LABEL);
        assert_eq!(entries[0].short_name, "MY VOLUME");
    }

    #[test]
    fn parses_8_3_with_extension() {
        let (name, ext) = fat32_filename_to_8_3("readme.txt").unwrap();
        assert_eq!(&name, b"README  ");
        assert_eq!(&ext, b"TXT");
    }

    #[test]
    fn rejects_overlong_stem() {
        assert!(fat32_filename_to_8_3("averylongname.txt").is_none());
    }
}

//! Raw GPT (GUID Partition Table) on-disk structures, per UEFI 2.x.

use crate::{
    str::utf16::FixedUtf16Str,
    types::{
        endian::{Endian, LittleEndian},
        number::{U32, U64},
    },
};

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Guid([u8; 16]);

impl Default for Guid {
    fn default() -> Self {
        Self([0; 16])
    }
}

impl Guid {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// A GUID of all zeroes means "no partition here" per the GPT spec.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 16]
    }
}

/// The GPT header, found at LBA 1 of the disk (in logical-block units).
///
/// Note that `current_lba`/`backup_lba`/`first_usable_lba`/`last_usable_lba` and
/// `partition_entry_lba` are 64-bit fields in the real UEFI specification, not 32-bit --
/// a disk this size is entirely plausible, and truncating them would silently corrupt
/// any GPT beyond 2 TiB.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GptPartitionTableHeader {
    /// Must be `"EFI PART"`.
    pub signature: [u8; 8],
    pub revision: U32<LittleEndian>,
    pub header_size: U32<LittleEndian>,
    pub crc32: U32<LittleEndian>,
    pub reserved: U32<LittleEndian>,
    pub current_lba: U64<LittleEndian>,
    pub backup_lba: U64<LittleEndian>,
    pub first_usable_lba: U64<LittleEndian>,
    pub last_usable_lba: U64<LittleEndian>,
    pub disk_guid: Guid,
    pub partition_entry_lba: U64<LittleEndian>,
    pub num_partition_entries: U32<LittleEndian>,
    /// Size of each partition entry, in bytes. Must be `128 * 2^n`.
    pub size_of_partition_entry: U32<LittleEndian>,
    pub partition_entry_array_crc32: U32<LittleEndian>,
}

impl GptPartitionTableHeader {
    pub const SIGNATURE: [u8; 8] = *b"EFI PART";
    pub const REVISION_1_0: u32 = 0x0001_0000;

    pub fn has_valid_signature(&self) -> bool {
        self.signature == Self::SIGNATURE
    }
}

impl Default for GptPartitionTableHeader {
    fn default() -> Self {
        Self {
            signature: Self::SIGNATURE,
            revision: U32::new(Self::REVISION_1_0),
            header_size: U32::new(0x5C),
            crc32: U32::new(0),
            reserved: U32::new(0),
            current_lba: U64::new(0),
            backup_lba: U64::new(0),
            first_usable_lba: U64::new(0),
            last_usable_lba: U64::new(0),
            disk_guid: Guid::default(),
            partition_entry_lba: U64::new(0),
            num_partition_entries: U32::new(0),
            size_of_partition_entry: U32::new(128),
            partition_entry_array_crc32: U32::new(0),
        }
    }
}

/// A single GPT partition entry, `size_of_partition_entry` bytes wide on disk (usually 128).
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GptPartitionEntry {
    pub type_guid: Guid,
    pub unique_partition_guid: Guid,
    pub starting_lba: U64<LittleEndian>,
    pub ending_lba: U64<LittleEndian>,
    pub attributes: U64<LittleEndian>,
    pub partition_name: FixedUtf16Str<36>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_92_bytes() {
        // The UEFI-specified GPT header is 92 bytes; the rest of the logical block is reserved.
        assert_eq!(core::mem::size_of::<GptPartitionTableHeader>(), 92);
    }

    #[test]
    fn entry_size_is_128_bytes() {
        assert_eq!(core::mem::size_of::<GptPartitionEntry>(), 128);
    }

    #[test]
    fn zero_guid_detected() {
        assert!(Guid::default().is_zero());
        assert!(!Guid::from_bytes([1; 16]).is_zero());
    }
}

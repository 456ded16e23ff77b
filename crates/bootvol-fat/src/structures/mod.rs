//! Structures for the FAT12/16/32 file systems.
//!
//! Raw on-disk byte layouts live in [`raw`]; the other modules convert them to native-endianness
//! "info" types and add the read-only operations a boot-time reader needs.

use core::str;

pub mod boot_sector;
pub mod directory;
pub mod fat;
pub mod raw;

/// A space-padded, fixed-length string field as laid out on disk (used for 8.3 name components
/// and volume labels).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FatStr<const N: usize> {
    pub raw: [u8; N],
}

impl<const N: usize> core::fmt::Debug for FatStr<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FatStr")
            .field("str", &self.as_str())
            .finish()
    }
}

impl<const N: usize> Default for FatStr<N> {
    fn default() -> Self {
        Self { raw: [b' '; N] }
    }
}

impl<const N: usize> FatStr<N> {
    pub const MAX_LEN: usize = N;

    pub fn from_bytes(bytes: [u8; N]) -> Self {
        Self { raw: bytes }
    }

    pub fn as_str(&self) -> &str {
        str::from_utf8(&self.raw).unwrap_or("")
    }

    /// Trailing-space-trimmed view.
    pub fn trimmed(&self) -> &str {
        self.as_str().trim_end_matches(' ')
    }
}

unsafe impl<const N: usize> bytemuck::Zeroable for FatStr<N> {}
unsafe impl<const N: usize> bytemuck::NoUninit for FatStr<N> {}
unsafe impl<const N: usize> bytemuck::AnyBitPattern for FatStr<N> {}

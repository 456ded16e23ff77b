//! Fixed-width on-disk string and integer encodings used by ISO9660 volume descriptors and
//! directory records.
use core::marker::PhantomData;

use bootvol_common::types::endian::{Endian, Endianness, LittleEndian};
use bootvol_common::types::number::{U16, U32};

/// A restriction on which bytes are valid inside an [`IsoStr`].
pub trait Charset: Copy + PartialEq + Eq {
    fn is_valid(chars: &[u8]) -> bool;
}

/// The `a-characters` set: `A-Z 0-9 !"%$'()*+,-./:;<=>?` and space.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct CharsetA;
/// The `d-characters` set: `A-Z 0-9 _` and space.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct CharsetD;

impl Charset for CharsetA {
    fn is_valid(chars: &[u8]) -> bool {
        const VALID_SYMBOLS: &[u8] = b" !\"%$'()*+,-./:;<=>?";
        chars
            .iter()
            .all(|c| c.is_ascii_alphanumeric() || VALID_SYMBOLS.contains(c))
    }
}

impl Charset for CharsetD {
    fn is_valid(chars: &[u8]) -> bool {
        const SPECIAL_CHARS: &[u8] = b" 0123456789_";
        chars
            .iter()
            .all(|c| c.is_ascii_uppercase() || SPECIAL_CHARS.contains(c))
    }
}

/// A space-padded, fixed-length string field as laid out on disk (ECMA-119 §7.4).
#[repr(transparent)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct IsoStr<C: Charset + 'static, const N: usize> {
    chars: [u8; N],
    _marker: PhantomData<C>,
}

impl<C: Charset + 'static, const N: usize> IsoStr<C, N> {
    /// Trailing-space-trimmed view of the field. Does not validate the charset; malformed
    /// on-disk strings are read lossily rather than rejected, since this type is read-only.
    pub fn to_str(&self) -> &str {
        let len = self
            .chars
            .iter()
            .rposition(|&c| c != b' ')
            .map(|i| i + 1)
            .unwrap_or(0);
        core::str::from_utf8(&self.chars[..len]).unwrap_or("")
    }
}

impl<C: Charset + 'static, const N: usize> core::fmt::Debug for IsoStr<C, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.to_str())
    }
}

pub type IsoStrA<const N: usize> = IsoStr<CharsetA, N>;
pub type IsoStrD<const N: usize> = IsoStr<CharsetD, N>;

/// A 32-bit (or 16-bit) field stored twice, once little-endian and once big-endian
/// (ECMA-119 §7.2/7.3). Only the native-matching half is ever read.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LsbMsb<T: Endian + Copy + 'static> {
    lsb: T::LsbType,
    msb: T::MsbType,
}

impl<T: Endian + Copy + 'static> LsbMsb<T> {
    pub fn new(value: T::Output) -> Self
    where
        T::Output: Copy,
    {
        Self {
            lsb: T::LsbType::new(value),
            msb: T::MsbType::new(value),
        }
    }

    pub fn read(&self) -> T::Output {
        #[cfg(target_endian = "little")]
        {
            self.lsb.get()
        }
        #[cfg(target_endian = "big")]
        {
            self.msb.get()
        }
    }
}

impl<T: Endian + Copy + 'static> core::fmt::Debug for LsbMsb<T>
where
    T::Output: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("LsbMsb").field(&self.read()).finish()
    }
}

pub type U16LsbMsb = LsbMsb<U16<LittleEndian>>;
pub type U32LsbMsb = LsbMsb<U32<LittleEndian>>;

/// ECMA-119 §8.4.26.1 recording date and time: 7 raw bytes, not a `dec-datetime`. Used inside
/// directory records.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct RecordingDateTime {
    /// Number of years since 1900.
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// 15-minute intervals offset from GMT, `-48..=52`.
    pub gmt_offset: i8,
}

use crate::types::{
    endian::{Endian, LittleEndian},
    number::U16,
};

/// A fixed-width, null-padded UTF-16LE string embedded in an on-disk structure (the GPT
/// partition name field is the only user of this so far).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FixedUtf16Str<const N: usize> {
    data: [U16<LittleEndian>; N],
}

impl<const N: usize> FixedUtf16Str<N> {
    /// Decodes to a lossy `String`, stopping at the first NUL code unit. Unpaired surrogates
    /// are replaced with U+FFFD rather than rejected outright, since a malformed partition name
    /// should degrade to a garbled label, not make the partition invisible.
    #[cfg(feature = "alloc")]
    pub fn to_string_lossy(&self) -> alloc::string::String {
        let units: alloc::vec::Vec<u16> = self
            .data
            .iter()
            .map(|c| c.get())
            .take_while(|&c| c != 0)
            .collect();
        char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

impl<const N: usize> core::fmt::Debug for FixedUtf16Str<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        #[cfg(feature = "alloc")]
        {
            write!(f, "FixedUtf16Str({:?})", self.to_string_lossy())
        }
        #[cfg(not(feature = "alloc"))]
        {
            f.debug_struct("FixedUtf16Str").finish_non_exhaustive()
        }
    }
}

unsafe impl<const N: usize> bytemuck::Pod for FixedUtf16Str<N> {}
unsafe impl<const N: usize> bytemuck::Zeroable for FixedUtf16Str<N> {}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii_and_stops_at_nul() {
        let mut data = [U16::<LittleEndian>::new(0); 8];
        for (slot, c) in data.iter_mut().zip("hi".encode_utf16()) {
            *slot = U16::new(c);
        }
        let s = FixedUtf16Str { data };
        assert_eq!(s.to_string_lossy(), "hi");
    }
}

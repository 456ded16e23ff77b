//! ASCII string slices and path canonicalization shared by the bootvol filesystem crates.
//!
//! This crate has no notion of disks or on-disk byte layouts (see `bootvol-common` for that);
//! it is the small set of utilities every filesystem reader needs regardless of format.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod path;
pub mod str;

pub use path::Path;
pub use str::{AsAsciiStr, AsciiStr, FixedByteStr};

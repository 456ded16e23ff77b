//! On-disk byte layouts and endian-safe numeric wrappers shared by the
//! bootvol filesystem crates.
//!
//! This crate is pure data definitions: endian-aware integer wrappers,
//! `repr(C)`/`repr(transparent)` structs mirroring the GPT and MBR
//! on-disk formats, and the small string/hash helpers those formats need.
//! It has no knowledge of disks, volumes, or filesystems; those live in
//! `bootvol-part`, `bootvol-iso`, and `bootvol-fat`.
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

/// Hashing algorithms used to validate on-disk checksums (GPT header CRC32).
pub mod alg;
/// Raw GPT/MBR partition table byte layouts.
pub mod part;
/// Fixed-width string encodings used by on-disk structures.
pub mod str;
/// Endian-safe integer wrappers.
pub mod types;

use bootvol_part::PartError;

#[derive(Debug, thiserror::Error)]
pub enum FatError {
    #[error("boot sector is missing the 0x55AA signature")]
    InvalidSignature,
    #[error("boot sector's metadata sector count ({metadata}) exceeds its total sector count ({total})")]
    StructuralOverflow { metadata: u64, total: u64 },
    #[error("data sector count overshoots the FAT16 ceiling in a way the BPB does not account for")]
    Fat16Overflow,
    #[error("cluster chain exceeded the 16 Mi cluster cap, or looped back on itself")]
    CorruptClusterChain,
    #[error("cluster number {0} is reserved and cannot be dereferenced")]
    ReservedCluster(u32),
    #[error("directory buffer exceeds the 256 MiB cap")]
    DirectoryTooLarge,
    #[error("path component exceeds 255 bytes")]
    NameTooLong,
    #[error("file or directory not found")]
    NotFound,
    #[error("attempted to read a directory as a file, or vice versa")]
    NotAFile,
    #[error(transparent)]
    Volume(#[from] PartError),
}

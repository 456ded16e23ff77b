use bootvol_part::PartError;

#[derive(Debug, thiserror::Error)]
pub enum IsoError {
    #[error("volume does not carry an ISO9660 signature at LBA 16")]
    NotIso9660,
    #[error("volume descriptor scan exceeded 256 entries without finding a primary descriptor")]
    TooManyDescriptors,
    #[error("directory record is shorter than its fixed header, or runs past its buffer")]
    CorruptDirectoryRecord,
    #[error("path component exceeds 255 bytes")]
    NameTooLong,
    #[error("file or directory not found")]
    NotFound,
    #[error("multi-extent file exceeds the 65536-extent cap")]
    TooManyExtents,
    #[error("root directory exceeds the 64 MiB cache limit")]
    RootDirectoryTooLarge,
    #[error("attempted to read a directory as a file, or vice versa")]
    NotAFile,
    #[error(transparent)]
    Volume(#[from] PartError),
}

use crate::disk::DiskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PartError {
    #[error("requested range is outside the volume")]
    OutOfBounds,
    #[error("partition does not start on a sector boundary")]
    Misaligned,
    #[error("arithmetic overflow while computing a partition-table offset")]
    Overflow,
    #[error("underlying disk read failed: {0}")]
    Disk(#[from] DiskError),
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VhdError {
    #[error("Not found '{}'", .0.display())]
    NotFound(PathBuf),
    #[error("File '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Size {size} bytes out of range {min} - {max}")]
    SizeOutOfRange { size: u64, min: u64, max: u64 },
    #[error("Invalid size '{0}'")]
    InvalidSize(String),

    #[error("Malformed VHD footer: {0}")]
    MalformedFooter(&'static str),
    #[error("Invalid VHD footer checksum: stored {stored:#010X}, computed {computed:#010X}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    #[error("Unknown VHD type '{0:#010X}'")]
    UnknownDiskType(u32),

    /// `count` sectors starting at `lba` do not fit into `sectors` addressable sectors.
    #[error("LBA {lba} (+{count} sectors) out of range: 0 - {}", .sectors.saturating_sub(1))]
    OutOfBounds { lba: u64, count: u64, sectors: u64 },
    #[error("Short read at LBA {lba}: {transferred} of 512 bytes")]
    ShortRead { lba: u64, transferred: usize },
    #[error("Short write at LBA {lba}: {transferred} of 512 bytes")]
    ShortWrite { lba: u64, transferred: usize },

    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Payload-free classification of a [`VhdError`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    SizeOutOfRange,
    MalformedFooter,
    ChecksumMismatch,
    OutOfBounds,
    Io,
}

impl ErrorKind {
    /// Process exit status a command-line front end reports for this kind.
    /// Every failure maps to `1`; the kind is only distinguished internally.
    pub fn exit_code(self) -> i32 {
        1
    }
}

impl VhdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VhdError::NotFound(_) => ErrorKind::NotFound,
            VhdError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            VhdError::SizeOutOfRange { .. } | VhdError::InvalidSize(_) => ErrorKind::SizeOutOfRange,
            VhdError::MalformedFooter(_) | VhdError::UnknownDiskType(_) => ErrorKind::MalformedFooter,
            VhdError::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            VhdError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            VhdError::ShortRead { .. } | VhdError::ShortWrite { .. } | VhdError::Io(_) => ErrorKind::Io,
        }
    }
}

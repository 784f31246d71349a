//! Error types for the oa-atomic crate.

use std::io;
use std::path::PathBuf;

/// Failures surfaced by [`AtomicFile`](crate::AtomicFile) and its helpers.
///
/// Every variant except [`AtomicError::InvalidDestination`] carries the path
/// the failing operation touched and the underlying I/O error.
#[derive(Debug, thiserror::Error)]
pub enum AtomicError {
    /// Destination has no file-name component (`/`, `a/..`, empty path).
    #[error("invalid destination {path}: {reason}")]
    InvalidDestination { path: PathBuf, reason: &'static str },

    /// Temporary file could not be created next to the destination.
    #[error("failed to create temporary file for {dest} in {dir}: {source}")]
    Create {
        dir: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Seeding the temporary file from the destination failed.
    #[error("failed to copy {from} into {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Other I/O on the temporary file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Flushing or closing the descriptor failed. The rename was still
    /// performed, so the destination holds whatever reached the disk.
    #[error("failed to close temporary file {path}: {source}")]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rename over the destination failed; the destination was not updated.
    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Removing the temporary file failed.
    #[error("failed to remove temporary file {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AtomicError {
    /// Kind of the underlying I/O error, if there is one.
    pub fn kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::InvalidDestination { .. } => None,
            Self::Create { source, .. }
            | Self::Copy { source, .. }
            | Self::Io { source, .. }
            | Self::Close { source, .. }
            | Self::Rename { source, .. }
            | Self::Remove { source, .. } => Some(source.kind()),
        }
    }

    /// True when the underlying error is `NotFound`.
    ///
    /// A `Remove` error of this kind means the temporary file was already
    /// gone, which callers usually ignore.
    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(io::ErrorKind::NotFound)
    }

    /// Whether the new content was published despite the error.
    ///
    /// Only [`AtomicError::Close`] happens after a successful rename.
    pub const fn destination_updated(&self) -> bool {
        matches!(self, Self::Close { .. })
    }
}

/// Convenience result type for oa-atomic operations.
pub type AtomicResult<T> = Result<T, AtomicError>;

//! Temporary file placement: `<dir>/.<base-name>~<random>`.
//!
//! The temporary file always lives in the destination's own directory, since
//! rename is only atomic within one filesystem.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::{AtomicError, AtomicResult};

/// Leading marker that hides the temporary file on unix listings.
pub const TEMP_PREFIX: &str = ".";

/// Separates the destination's base name from the random suffix.
pub const TEMP_MARKER: &str = "~";

/// Where, and under which name prefix, a destination's temporary file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempLocation {
    /// Containing directory; `.` for bare file names.
    pub dir: PathBuf,
    /// `.<base-name>~`, the random suffix is appended on creation.
    pub prefix: OsString,
}

impl TempLocation {
    /// Does `file_name` look like one of this destination's temporary files?
    pub fn matches(&self, file_name: &OsStr) -> bool {
        let name = file_name.as_encoded_bytes();
        let prefix = self.prefix.as_encoded_bytes();
        name.len() > prefix.len() && name.starts_with(prefix)
    }
}

/// Split `dest` into the temporary file's directory and name prefix.
pub fn temp_location(dest: &Path) -> AtomicResult<TempLocation> {
    let Some(base) = dest.file_name() else {
        return Err(AtomicError::InvalidDestination {
            path: dest.to_path_buf(),
            reason: "path has no file name",
        });
    };

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut prefix = OsString::with_capacity(base.len() + 2);
    prefix.push(TEMP_PREFIX);
    prefix.push(base);
    prefix.push(TEMP_MARKER);

    Ok(TempLocation { dir, prefix })
}

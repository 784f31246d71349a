//! Stream a file's contents into an already-open writer.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{AtomicError, AtomicResult};

/// Copy all of `source` into `dest`, returning the number of bytes copied.
///
/// The source is opened here and closed before returning on every path. The
/// writer stays open and owned by the caller; `dest_label` only names it in
/// errors. On failure `dest` may already hold a partial copy.
pub fn copy_into<W: Write + ?Sized>(
    source: &Path,
    dest: &mut W,
    dest_label: &Path,
) -> AtomicResult<u64> {
    let copy_err = |source_err: io::Error| AtomicError::Copy {
        from: source.to_path_buf(),
        to: dest_label.to_path_buf(),
        source: source_err,
    };

    let mut reader = File::open(source).map_err(copy_err)?;
    let copied = io::copy(&mut reader, dest).map_err(copy_err)?;
    dest.flush().map_err(copy_err)?;
    Ok(copied)
}

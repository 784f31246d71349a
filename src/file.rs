//! The [`AtomicFile`] write transaction.
//!
//! An `AtomicFile` owns a hidden temporary file next to its destination. All
//! reads and writes go to the temporary file; [`AtomicFile::close`] renames it
//! over the destination in one step, [`AtomicFile::destroy`] throws it away.
//! Readers of the destination see either the old file or the complete new
//! one, never a partial write.
//!
//! # Concurrent writers
//!
//! Two `AtomicFile`s for the same destination never collide on disk, each gets
//! its own temporary name. Nothing coordinates them though: the last one to
//! close wins and the other's content is silently replaced. Callers needing
//! mutual exclusion must lock around the whole transaction themselves.

use std::fs::{self, File, Metadata};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, PathPersistError};
use tracing::{debug, warn};

use crate::copy::copy_into;
use crate::error::{AtomicError, AtomicResult};
use crate::naming::temp_location;
use crate::options::AtomicOptions;

/// A pending whole-file replacement of `destination()`.
///
/// Dropping an `AtomicFile` without calling [`close`](Self::close) or
/// [`destroy`](Self::destroy) aborts it: the temporary file is closed and
/// removed, errors ignored.
#[derive(Debug)]
pub struct AtomicFile {
    file: NamedTempFile,
    dest: PathBuf,
    options: AtomicOptions,
}

impl AtomicFile {
    /// Start a fresh write to `dest` with default options.
    pub fn create(dest: impl AsRef<Path>) -> AtomicResult<Self> {
        Self::create_with(dest, AtomicOptions::default())
    }

    /// Start a fresh write to `dest`.
    ///
    /// Creates an empty temporary file `.<base-name>~<random>` in the
    /// destination's directory (the working directory for bare names). The
    /// destination itself is neither read nor required to exist.
    pub fn create_with(dest: impl AsRef<Path>, options: AtomicOptions) -> AtomicResult<Self> {
        let dest = dest.as_ref();
        let location = temp_location(dest)?;

        let file = tempfile::Builder::new()
            .prefix(&location.prefix)
            .rand_bytes(options.random_len)
            .tempfile_in(&location.dir)
            .map_err(|source| AtomicError::Create {
                dir: location.dir.clone(),
                dest: dest.to_path_buf(),
                source,
            })?;

        // tempfile anchors the temp path at creation; pin the destination to
        // the same directory so a later chdir cannot split them.
        let dest = file
            .path()
            .parent()
            .zip(dest.file_name())
            .map_or_else(|| dest.to_path_buf(), |(dir, base)| dir.join(base));

        debug!(
            temp = %file.path().display(),
            dest = %dest.display(),
            "created temporary file"
        );

        Ok(Self {
            file,
            dest,
            options,
        })
    }

    /// Start a read-modify-write of `dest` with default options.
    pub fn open(dest: impl AsRef<Path>) -> AtomicResult<Self> {
        Self::open_with(dest, AtomicOptions::default())
    }

    /// Start a read-modify-write of `dest`.
    ///
    /// The temporary file is seeded with a byte-for-byte copy of the
    /// destination and the position is left at its end; seek to the start to
    /// re-read it. If seeding fails the temporary file is removed before the
    /// error is returned.
    pub fn open_with(dest: impl AsRef<Path>, options: AtomicOptions) -> AtomicResult<Self> {
        let mut atomic = Self::create_with(dest, options)?;
        let temp = atomic.temp_path().to_path_buf();

        let copied = match copy_into(&atomic.dest, atomic.file.as_file_mut(), &temp) {
            Ok(n) => n,
            Err(err) => return Err(atomic.abandon(err)),
        };

        if atomic.options.preserve_permissions {
            if let Err(err) = atomic.copy_permissions() {
                return Err(atomic.abandon(err));
            }
        }

        debug!(
            temp = %temp.display(),
            dest = %atomic.dest.display(),
            bytes = copied,
            "seeded temporary file from destination"
        );

        Ok(atomic)
    }

    /// Path of the temporary file currently being written.
    pub fn temp_path(&self) -> &Path {
        self.file.path()
    }

    /// Path the temporary file will replace on close.
    ///
    /// Relative destinations are resolved against the working directory at
    /// construction, so this may differ from the path passed in.
    pub fn destination(&self) -> &Path {
        &self.dest
    }

    pub const fn options(&self) -> &AtomicOptions {
        &self.options
    }

    pub fn as_file(&self) -> &File {
        self.file.as_file()
    }

    pub fn as_file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// Metadata of the open temporary file.
    pub fn metadata(&self) -> AtomicResult<Metadata> {
        self.file.as_file().metadata().map_err(|source| AtomicError::Io {
            path: self.temp_path().to_path_buf(),
            source,
        })
    }

    /// Commit: close the temporary file and rename it over the destination.
    ///
    /// The descriptor is always closed before the rename. If flushing or
    /// closing fails the rename is still attempted; a rename failure is
    /// returned in preference, since it means the destination was never
    /// updated. On rename failure the temporary file is removed.
    pub fn close(self) -> AtomicResult<()> {
        let Self { file, dest, options } = self;
        let temp = file.path().to_path_buf();

        let flushed = if options.sync_on_close {
            file.as_file().sync_all()
        } else {
            Ok(())
        };

        // Some platforms refuse to rename a file that is still open.
        let temp_path = file.into_temp_path();

        let renamed = temp_path.persist(&dest).map_err(|err| {
            let PathPersistError { error, path } = err;
            if let Err(cleanup) = path.close() {
                warn!(
                    temp = %temp.display(),
                    error = %cleanup,
                    "failed to remove temporary file after rename failure"
                );
            }
            error
        });

        commit_outcome(&temp, &dest, flushed, renamed)
    }

    /// Abort: close and remove the temporary file, leaving the destination
    /// untouched.
    ///
    /// A `NotFound` error here means someone else already removed the
    /// temporary file; see [`AtomicError::is_not_found`].
    pub fn destroy(self) -> AtomicResult<()> {
        let temp = self.file.path().to_path_buf();
        self.file.close().map_err(|source| AtomicError::Remove {
            path: temp.clone(),
            source,
        })?;
        debug!(temp = %temp.display(), dest = %self.dest.display(), "discarded temporary file");
        Ok(())
    }

    fn copy_permissions(&self) -> AtomicResult<()> {
        let perms = fs::metadata(&self.dest)
            .map_err(|source| AtomicError::Io {
                path: self.dest.clone(),
                source,
            })?
            .permissions();
        self.file
            .as_file()
            .set_permissions(perms)
            .map_err(|source| AtomicError::Io {
                path: self.temp_path().to_path_buf(),
                source,
            })
    }

    /// Destroy after a constructor failure, keeping `err` as the result.
    fn abandon(self, err: AtomicError) -> AtomicError {
        if let Err(cleanup) = self.destroy() {
            warn!(error = %cleanup, "failed to clean up temporary file");
        }
        err
    }
}

/// Pick the error a commit reports. Rename wins over close.
fn commit_outcome(
    temp: &Path,
    dest: &Path,
    flushed: io::Result<()>,
    renamed: io::Result<()>,
) -> AtomicResult<()> {
    match (flushed, renamed) {
        (_, Err(source)) => Err(AtomicError::Rename {
            from: temp.to_path_buf(),
            to: dest.to_path_buf(),
            source,
        }),
        (Err(source), Ok(())) => {
            warn!(
                dest = %dest.display(),
                error = %source,
                "published file whose temporary copy failed to close cleanly"
            );
            Err(AtomicError::Close {
                path: temp.to_path_buf(),
                source,
            })
        }
        (Ok(()), Ok(())) => {
            debug!(temp = %temp.display(), dest = %dest.display(), "committed");
            Ok(())
        }
    }
}

impl Read for AtomicFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Seek for AtomicFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(kind: io::ErrorKind) -> io::Error {
        io::Error::new(kind, "injected")
    }

    #[test]
    fn test_outcome_ok() {
        let res = commit_outcome(Path::new(".f~1"), Path::new("f"), Ok(()), Ok(()));
        assert!(res.is_ok());
    }

    #[test]
    fn test_outcome_rename_beats_close() {
        let res = commit_outcome(
            Path::new(".f~1"),
            Path::new("f"),
            Err(err(io::ErrorKind::Other)),
            Err(err(io::ErrorKind::PermissionDenied)),
        );
        match res {
            Err(AtomicError::Rename { source, .. }) => {
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected rename error, got {other:?}"),
        }
    }

    #[test]
    fn test_outcome_close_error_after_publish() {
        let res = commit_outcome(
            Path::new(".f~1"),
            Path::new("f"),
            Err(err(io::ErrorKind::Other)),
            Ok(()),
        );
        let e = res.expect_err("close error should surface");
        assert!(matches!(e, AtomicError::Close { .. }));
        assert!(e.destination_updated());
    }

    #[test]
    fn test_temp_and_dest_share_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dest = dir.path().join("out.txt");

        let f = AtomicFile::create(&dest).expect("create");
        assert_eq!(f.temp_path().parent(), f.destination().parent());
        assert_eq!(f.destination().file_name(), dest.file_name());

        let name = f.temp_path().file_name().expect("name").to_string_lossy().into_owned();
        assert!(name.starts_with(".out.txt~"), "{name}");
        assert_eq!(name.len(), ".out.txt~".len() + 6);
        f.destroy().expect("destroy");
    }

    #[test]
    fn test_random_len_option() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dest = dir.path().join("x");

        let f = AtomicFile::create_with(&dest, AtomicOptions::default().with_random_len(12))
            .expect("create");
        let name = f.temp_path().file_name().expect("name").to_string_lossy().into_owned();
        assert_eq!(name.len(), ".x~".len() + 12);
        f.destroy().expect("destroy");
    }

    #[test]
    fn test_destination_hidden_until_close() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dest = dir.path().join("late.txt");

        let mut f = AtomicFile::create(&dest).expect("create");
        f.write_all(b"pending").expect("write");
        assert!(!dest.exists());
        assert!(f.temp_path().exists());

        let temp = f.temp_path().to_path_buf();
        f.close().expect("close");
        assert!(!temp.exists());
        assert_eq!(std::fs::read(&dest).expect("read"), b"pending");
    }
}

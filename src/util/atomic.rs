//! One-shot atomic writes built on [`AtomicFile`].
//!
//! Both helpers write to a temporary file in the same directory as the target
//! and rename it into place, so a crash or kill mid-write leaves the old file
//! intact.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::warn;

use crate::error::{AtomicError, AtomicResult};
use crate::file::AtomicFile;

/// Atomically replace `path` with `content`.
///
/// The file need not exist. Its parent directory must.
pub fn write_atomic(path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> AtomicResult<()> {
    let mut file = AtomicFile::create(path)?;
    if let Err(source) = file.write_all(content.as_ref()) {
        return Err(discard(file, source));
    }
    file.close()
}

/// Atomically rewrite `path` with `f(current contents)`.
///
/// `path` must exist. If `f` panics the temporary file is dropped and removed;
/// the destination is left as it was.
pub fn update_atomic<F>(path: impl AsRef<Path>, f: F) -> AtomicResult<()>
where
    F: FnOnce(Vec<u8>) -> Vec<u8>,
{
    let mut file = AtomicFile::open(path)?;

    let mut current = Vec::new();
    if let Err(source) = file
        .seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_end(&mut current))
    {
        return Err(discard(file, source));
    }

    let updated = f(current);

    if let Err(source) = rewrite(&mut file, &updated) {
        return Err(discard(file, source));
    }
    file.close()
}

fn rewrite(file: &mut AtomicFile, content: &[u8]) -> io::Result<()> {
    file.as_file().set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(content)
}

fn discard(file: AtomicFile, source: io::Error) -> AtomicError {
    let err = AtomicError::Io {
        path: file.temp_path().to_path_buf(),
        source,
    };
    if let Err(cleanup) = file.destroy() {
        warn!(error = %cleanup, "failed to clean up temporary file");
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_new_and_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        write_atomic(&path, "first = 1\n").expect("first write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "first = 1\n");

        write_atomic(&path, b"second = 2\n").expect("second write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "second = 2\n");
    }

    #[test]
    fn test_write_atomic_missing_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join("file.txt");

        let err = write_atomic(&path, "x").expect_err("should fail");
        assert!(matches!(err, AtomicError::Create { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_update_atomic_transforms_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("counter");
        std::fs::write(&path, "a much longer original line\n").expect("seed");

        update_atomic(&path, |old| {
            assert_eq!(old, b"a much longer original line\n");
            b"short\n".to_vec()
        })
        .expect("update");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "short\n");
    }

    #[test]
    fn test_update_atomic_panic_leaves_original() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fragile.txt");
        std::fs::write(&path, "untouched\n").expect("seed");

        let outcome = std::panic::catch_unwind(|| {
            update_atomic(&path, |_| panic!("transform failed"))
        });
        assert!(outcome.is_err());

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "untouched\n");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .expect("ls")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("fragile.txt")]);
    }

    #[test]
    fn test_update_atomic_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent");

        let err = update_atomic(&path, |v| v).expect_err("should fail");
        assert!(matches!(err, AtomicError::Copy { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).expect("ls").count(), 0);
    }
}

//! `oa-atomic` — atomic whole-file replacement.
//!
//! Write new content to a hidden temporary file next to the target, then
//! rename it over the target on close. Readers of the target never observe a
//! partially written file: they see the old content (or nothing) until the
//! rename, then exactly the new content.
//!
//! # Usage
//!
//! ```no_run
//! # fn main() -> oa_atomic::AtomicResult<()> {
//! oa_atomic::write_atomic("settings.json", b"{}")?;
//! # Ok(())
//! # }
//! ```
//!
//! For streaming writes or read-modify-write, drive an [`AtomicFile`]:
//!
//! ```no_run
//! use std::io::Write;
//! use oa_atomic::AtomicFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut f = AtomicFile::open("journal.log")?;
//! writeln!(f, "appended entry")?;
//! f.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! create(dest) ─┐
//!               ├→ .<name>~<random> ──write/read/seek──┬→ close()   → rename over dest
//! open(dest) ───┘   (seeded by copy_into for open)     └→ destroy() → remove temp
//! ```
//!
//! Atomicity is only as strong as the filesystem's rename: guaranteed for
//! same-volume renames on POSIX filesystems, best effort elsewhere. There is
//! no locking between concurrent writers; see [`file`].

pub mod copy;
pub mod error;
pub mod file;
pub mod naming;
pub mod options;
pub mod util;

pub use copy::copy_into;
pub use error::{AtomicError, AtomicResult};
pub use file::AtomicFile;
pub use naming::{TempLocation, temp_location};
pub use options::AtomicOptions;
pub use util::atomic::{update_atomic, write_atomic};

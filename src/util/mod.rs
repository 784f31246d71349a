//! Convenience helpers on top of [`AtomicFile`](crate::AtomicFile).

pub mod atomic;

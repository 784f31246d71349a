//! Per-file configuration.

/// Length of the random suffix `tempfile` uses by default.
pub const DEFAULT_RANDOM_LEN: usize = 6;

/// Options controlling how an [`AtomicFile`](crate::AtomicFile) is created
/// and committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicOptions {
    /// `sync_all` the temporary file before closing it on commit.
    pub sync_on_close: bool,
    /// Number of random characters appended after the `~` marker.
    pub random_len: usize,
    /// When opening for update, give the temporary file the destination's
    /// permission bits.
    pub preserve_permissions: bool,
}

impl Default for AtomicOptions {
    fn default() -> Self {
        Self {
            sync_on_close: true,
            random_len: DEFAULT_RANDOM_LEN,
            preserve_permissions: false,
        }
    }
}

impl AtomicOptions {
    #[must_use]
    pub const fn with_sync_on_close(mut self, sync: bool) -> Self {
        self.sync_on_close = sync;
        self
    }

    /// Zero is bumped to one so the name always carries some randomness.
    #[must_use]
    pub fn with_random_len(mut self, len: usize) -> Self {
        self.random_len = len.max(1);
        self
    }

    #[must_use]
    pub const fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = AtomicOptions::default();
        assert!(opts.sync_on_close);
        assert_eq!(opts.random_len, DEFAULT_RANDOM_LEN);
        assert!(!opts.preserve_permissions);
    }

    #[test]
    fn test_random_len_never_zero() {
        let opts = AtomicOptions::default().with_random_len(0);
        assert_eq!(opts.random_len, 1);
    }
}

//! Writer configuration.

/// Permission bits for newly created fileset files.
pub const DEFAULT_NEW_FILE_MODE: u32 = 0o666;

/// Permission bits for newly created shard directories.
pub const DEFAULT_NEW_DIRECTORY_MODE: u32 = 0o755;

/// Configuration for a [`crate::FilesetWriter`].
///
/// `WriterOptions` is a plain `Copy` value: setters consume a copy and
/// return a new value, so options shared between callers never change
/// underneath them.
///
/// # Example
///
/// ```rust
/// use shardfs_core::WriterOptions;
///
/// let base = WriterOptions::new();
/// let private = base.with_new_file_mode(0o600);
///
/// assert_eq!(private.new_file_mode(), 0o600);
/// assert_eq!(base.new_file_mode(), 0o666);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    new_file_mode: u32,
    new_directory_mode: u32,
    sync_on_close: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            new_file_mode: DEFAULT_NEW_FILE_MODE,
            new_directory_mode: DEFAULT_NEW_DIRECTORY_MODE,
            sync_on_close: true,
        }
    }
}

impl WriterOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the permission bits for new files.
    #[must_use]
    pub const fn with_new_file_mode(mut self, mode: u32) -> Self {
        self.new_file_mode = mode;
        self
    }

    /// Returns the permission bits for new files.
    #[must_use]
    pub const fn new_file_mode(&self) -> u32 {
        self.new_file_mode
    }

    /// Sets the permission bits for new directories.
    #[must_use]
    pub const fn with_new_directory_mode(mut self, mode: u32) -> Self {
        self.new_directory_mode = mode;
        self
    }

    /// Returns the permission bits for new directories.
    #[must_use]
    pub const fn new_directory_mode(&self) -> u32 {
        self.new_directory_mode
    }

    /// Sets whether `close` fsyncs the fileset files and the shard directory.
    #[must_use]
    pub const fn with_sync_on_close(mut self, value: bool) -> Self {
        self.sync_on_close = value;
        self
    }

    /// Returns whether `close` fsyncs before committing.
    #[must_use]
    pub const fn sync_on_close(&self) -> bool {
        self.sync_on_close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = WriterOptions::default();
        assert_eq!(options.new_file_mode(), 0o666);
        assert_eq!(options.new_directory_mode(), 0o755);
        assert!(options.sync_on_close());
    }

    #[test]
    fn setters_return_new_values() {
        let base = WriterOptions::new();
        let files = base.with_new_file_mode(0o640);
        let dirs = base.with_new_directory_mode(0o700);

        assert_eq!(files.new_file_mode(), 0o640);
        assert_eq!(files.new_directory_mode(), DEFAULT_NEW_DIRECTORY_MODE);
        assert_eq!(dirs.new_directory_mode(), 0o700);
        assert_eq!(dirs.new_file_mode(), DEFAULT_NEW_FILE_MODE);
        assert_eq!(base, WriterOptions::default());
    }

    #[test]
    fn builder_chain() {
        let options = WriterOptions::new()
            .with_new_file_mode(0o600)
            .with_new_directory_mode(0o700)
            .with_sync_on_close(false);

        assert_eq!(options.new_file_mode(), 0o600);
        assert_eq!(options.new_directory_mode(), 0o700);
        assert!(!options.sync_on_close());
    }

    #[test]
    fn setting_default_value_is_identity() {
        let options = WriterOptions::new().with_new_file_mode(DEFAULT_NEW_FILE_MODE);
        assert_eq!(options, WriterOptions::default());
    }
}

//! JSON-file storage backend for profilestore.
//!
//! Each record is one pretty-printed JSON document:
//!
//! ```text
//! <base_dir>/
//!   profiles/<key>.json
//!   preferences/<key>.json
//!   recommendations/<key>/<YYYYMMDD-HHMMSS>.json
//!   feedback/<key>/*.json          (written by other tools)
//! ```
//!
//! Writes land in a hidden temp file beside the target and are renamed into
//! place, so readers see either the old or the new document. There is no
//! locking between calls and no cache: every operation goes to disk.

mod codec;
mod layout;
mod stores;

pub use layout::Layout;
pub use stores::{
    FileFeedbackStore, FilePreferenceStore, FileProfileStore, FileRecommendationStore, FileStores,
};

use std::path::{Path, PathBuf};

use crate::error::ValidationError;

/// Environment variable naming the data directory.
pub const ENV_DATA_DIR: &str = "PROFILE_STORE_DIR";

/// Environment variable toggling `fsync` after every write.
pub const ENV_SYNC: &str = "PROFILE_STORE_SYNC";

/// Configuration for the JSON-file backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root directory of the record tree.
    pub base_dir: PathBuf,
    /// Whether to fsync after every write (slower but safer).
    pub sync_on_write: bool,
    /// Whether documents are pretty-printed (2-space indent).
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./data"),
            sync_on_write: true,
            pretty: true,
        }
    }
}

impl StoreConfig {
    /// Configuration rooted at `base_dir` with default options.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Sets the root directory of the record tree.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Sets whether writes are fsynced.
    #[must_use]
    pub const fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }

    /// Sets whether documents are pretty-printed.
    #[must_use]
    pub const fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Reads `PROFILE_STORE_DIR` and `PROFILE_STORE_SYNC`, falling back to
    /// defaults for unset variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.is_empty()) {
            cfg.base_dir = PathBuf::from(dir);
        }
        if let Some(sync) = lookup(ENV_SYNC) {
            cfg.sync_on_write = !matches!(
                sync.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        cfg
    }

    /// Checks the configuration before any directory is created.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `base_dir` is empty or names an existing
    /// non-directory.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(ValidationError::InvalidConfig {
                reason: "base_dir must not be empty".to_string(),
            });
        }
        if self.base_dir.exists() && !self.base_dir.is_dir() {
            return Err(ValidationError::InvalidConfig {
                reason: format!("{} exists and is not a directory", self.base_dir.display()),
            });
        }
        Ok(self)
    }

    /// Root directory of the record tree.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_durable_and_pretty() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.base_dir, PathBuf::from("./data"));
        assert!(cfg.sync_on_write);
        assert!(cfg.pretty);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = [(ENV_DATA_DIR, "/srv/profiles"), (ENV_SYNC, "off")].into();
        let cfg = StoreConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string()));
        assert_eq!(cfg.base_dir, PathBuf::from("/srv/profiles"));
        assert!(!cfg.sync_on_write);

        let cfg = StoreConfig::from_lookup(|_| None);
        assert_eq!(cfg, StoreConfig::default());
    }

    #[test]
    fn validate_rejects_empty_and_file_paths() {
        assert!(StoreConfig::new("").validate().is_err());

        let dir = tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        assert!(StoreConfig::new(&file).validate().is_err());

        assert!(StoreConfig::new(dir.path()).validate().is_ok());
        assert!(StoreConfig::new(dir.path().join("fresh")).validate().is_ok());
    }
}

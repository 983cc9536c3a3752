//! Store handle for mirrorkit's on-disk state.
//!
//! A site's catalog database and mutation journal live under a single
//! state root; the handle names that root and derives the file paths the
//! rest of the crate opens.

use crate::core::schemas;
use std::path::{Path, PathBuf};

/// Handle to the state root directory holding the catalog DB and journal.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the state root directory.
    pub root: PathBuf,
}

impl Store {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Path of the catalog database, honoring a configured file name.
    pub fn catalog_db_path(&self, db_name: &str) -> PathBuf {
        self.root.join(db_name)
    }

    /// Path of the append-only catalog mutation journal.
    pub fn journal_path(&self) -> PathBuf {
        self.root.join(schemas::JOURNAL_NAME)
    }

    /// Path of the optional `mirror.toml` configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(schemas::CONFIG_NAME)
    }
}

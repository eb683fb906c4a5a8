use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::paths::{default_database_path, DEFAULT_FILE_NAME};
use crate::schema::RowPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Backing file. Holds ciphertext only.
    pub path: PathBuf,
    pub row_policy: RowPolicy,
    /// fsync the staging file and its directory around every rename.
    pub sync_writes: bool,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Database file in the per-user data directory.
    pub fn in_data_dir() -> Result<Self> {
        Ok(Self::new(default_database_path()?))
    }

    pub fn with_row_policy(mut self, policy: RowPolicy) -> Self {
        self.row_policy = policy;
        self
    }

    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_FILE_NAME),
            row_policy: RowPolicy::AllowMissing,
            sync_writes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, PathBuf::from("db.json"));
        assert_eq!(config.row_policy, RowPolicy::AllowMissing);
        assert!(config.sync_writes);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: DatabaseConfig =
            serde_json::from_str(r#"{"path":"vault/app.db","row_policy":"REQUIRE_ALL"}"#).unwrap();
        assert_eq!(config.path, PathBuf::from("vault/app.db"));
        assert_eq!(config.row_policy, RowPolicy::RequireAll);
        assert!(config.sync_writes);
    }

    #[test]
    fn builder_helpers() {
        let config = DatabaseConfig::new("x.db")
            .with_row_policy(RowPolicy::RequireAll)
            .with_sync_writes(false);
        assert_eq!(config.path, PathBuf::from("x.db"));
        assert_eq!(config.row_policy, RowPolicy::RequireAll);
        assert!(!config.sync_writes);
    }
}

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::error::{DbError, Result};

pub const APP_QUALIFIER: &str = "io";
pub const APP_ORG: &str = "sealdb";
pub const APP_NAME: &str = "sealdb";
pub const DEFAULT_FILE_NAME: &str = "db.json";

pub fn data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .ok_or_else(|| DbError::Config("cannot determine data directory".into()))?;
    Ok(dirs.data_dir().to_path_buf())
}

/// `db.json` inside the per-user data directory.
pub fn default_database_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(DEFAULT_FILE_NAME))
}

/// Directory holding `path`; `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Prefix shared by every staging file written for `path`.
pub(crate) fn staging_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    format!(".{name}.")
}

pub(crate) const STAGING_SUFFIX: &str = ".staging";

/// Length of the random alphanumeric part between prefix and suffix.
pub(crate) const STAGING_RAND_LEN: usize = 8;

/// True only for `<prefix><STAGING_RAND_LEN alphanumerics>.staging`, so
/// staging files of `db.json.bak` never match for `db.json`.
pub(crate) fn is_staging_name(path: &Path, name: &str) -> bool {
    let prefix = staging_prefix(path);
    name.strip_prefix(prefix.as_str())
        .and_then(|rest| rest.strip_suffix(STAGING_SUFFIX))
        .map_or(false, |random| {
            random.len() == STAGING_RAND_LEN && random.bytes().all(|b| b.is_ascii_alphanumeric())
        })
}

//! Snapshot persistence: the whole table store is encoded, sealed and
//! swapped into place on every write.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::codec::{decode, encode};
use crate::crypto::{decrypt, encrypt, DatabaseKey};
use crate::error::{DbError, Result};
use crate::paths::{is_staging_name, parent_dir, staging_prefix, STAGING_RAND_LEN, STAGING_SUFFIX};
use crate::store::TableStore;

pub struct SnapshotFile {
    path: PathBuf,
    key: DatabaseKey,
    sync_writes: bool,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>, key: DatabaseKey, sync_writes: bool) -> Self {
        Self {
            path: path.into(),
            key,
            sync_writes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &DatabaseKey {
        &self.key
    }

    /// Read, decrypt and decode the file. `None` when no file exists yet.
    pub fn load(&self) -> Result<Option<TableStore>> {
        self.cleanup_staging();

        let sealed = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no database file, starting empty");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let plaintext = decrypt(&self.key, &sealed)?;
        let store = decode(&plaintext)?;
        debug!(
            path = %self.path.display(),
            tables = store.tables().len(),
            rows = store.total_rows(),
            "database loaded"
        );
        Ok(Some(store))
    }

    /// Replace the file with a sealed snapshot of `store`. The target is
    /// swapped by rename, so readers see either the old or the new snapshot.
    pub fn write(&self, store: &TableStore) -> Result<()> {
        let plaintext = Zeroizing::new(encode(store)?);
        let sealed = encrypt(&self.key, &plaintext)?;

        let dir = parent_dir(&self.path);
        fs::create_dir_all(&dir)?;
        let prefix = staging_prefix(&self.path);
        // Staging files are created owner-only (0600) on Unix.
        let mut staging = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(STAGING_SUFFIX)
            .rand_bytes(STAGING_RAND_LEN)
            .tempfile_in(&dir)?;
        staging.write_all(&sealed)?;
        if self.sync_writes {
            staging.as_file().sync_all()?;
        }
        staging
            .persist(&self.path)
            .map_err(|e| DbError::Io(e.error))?;
        if self.sync_writes {
            fsync_dir(&dir)?;
        }

        debug!(
            path = %self.path.display(),
            bytes = sealed.len(),
            "database persisted"
        );
        Ok(())
    }

    /// Remove staging files left behind by a writer that crashed mid-swap.
    fn cleanup_staging(&self) {
        let dir = parent_dir(&self.path);
        let Ok(entries) = fs::read_dir(&dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if is_staging_name(&self.path, &name) {
                warn!(path = %entry.path().display(), "removing orphaned staging file");
                if let Err(e) = fs::remove_file(entry.path()) {
                    warn!(path = %entry.path().display(), error = %e, "cannot remove staging file");
                }
            }
        }
    }
}

fn fsync_dir(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        let dir = OpenOptions::new().read(true).open(path)?;
        dir.sync_all()?;
    }
    Ok(())
}

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::crypto::DatabaseKey;
use crate::error::Result;
use crate::persist::SnapshotFile;
use crate::row::{Filter, Row};
use crate::schema::Schema;
use crate::store::TableStore;

/// Handle to one encrypted database file.
///
/// Every state-changing call re-encrypts the full snapshot and swaps it into
/// place before returning; read-only calls never touch disk. If the write
/// fails the in-memory state is left at the last persisted snapshot.
///
/// Not a concurrent store. Mutations take `&mut self`; sharing a handle
/// across threads needs an external lock. Two handles (in one process or
/// several) on the same file are unsupported: the last rename wins and the
/// other handle's writes are lost.
pub struct Database {
    config: DatabaseConfig,
    snapshot: SnapshotFile,
    store: TableStore,
    on_disk: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub row_count: usize,
}

/// Aggregate metadata. Never carries key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub path: PathBuf,
    pub on_disk: bool,
    pub table_count: usize,
    pub total_rows: usize,
    pub tables: Vec<TableInfo>,
}

impl Database {
    /// Open `path` with an existing key. A missing file starts an empty
    /// database; the file is created on the first mutation.
    pub fn open(path: impl Into<PathBuf>, key: DatabaseKey) -> Result<Self> {
        Self::with_config(DatabaseConfig::new(path), key)
    }

    /// Open `path` with a freshly generated key and hand the key back.
    /// The key is never written anywhere; losing it loses the data.
    pub fn open_with_new_key(path: impl Into<PathBuf>) -> Result<(Self, DatabaseKey)> {
        let key = DatabaseKey::generate();
        let db = Self::open(path, key.clone())?;
        info!(path = %db.path().display(), "generated new database key");
        Ok((db, key))
    }

    pub fn with_config(config: DatabaseConfig, key: DatabaseKey) -> Result<Self> {
        let snapshot = SnapshotFile::new(config.path.clone(), key, config.sync_writes);
        let loaded = snapshot.load()?;
        let on_disk = loaded.is_some();
        Ok(Self {
            config,
            snapshot,
            store: loaded.unwrap_or_default(),
            on_disk,
        })
    }

    pub fn path(&self) -> &Path {
        self.snapshot.path()
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn encryption_key(&self) -> &DatabaseKey {
        self.snapshot.key()
    }

    pub fn define_table<I, S>(&mut self, name: &str, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schema = Schema::new(columns)?;
        self.commit(|store| store.define(name, schema).map(|()| ((), true)))?;
        info!(table = %name, "table defined");
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let dropped = self.commit(|store| store.drop_table(name).map(|t| (t, true)))?;
        info!(table = %name, rows = dropped.rows.len(), "table dropped");
        Ok(())
    }

    pub fn insert(&mut self, table: &str, row: Row) -> Result<()> {
        let policy = self.config.row_policy;
        self.commit(|store| store.insert(table, row, policy).map(|()| ((), true)))
    }

    /// Rows matching every entry of `filter`, in insertion order. `None` or an
    /// empty filter returns the whole table. The result is an owned copy.
    pub fn read(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Row>> {
        self.store.select(table, filter)
    }

    /// Merge `updates` into every row matching `filter`; returns how many
    /// rows matched.
    pub fn update(&mut self, table: &str, filter: &Filter, updates: &Row) -> Result<usize> {
        self.commit(|store| {
            let outcome = store.update(table, filter, updates)?;
            Ok((outcome.matched, outcome.changed))
        })
    }

    /// Remove every row matching `filter`; returns how many were removed.
    pub fn delete(&mut self, table: &str, filter: &Filter) -> Result<usize> {
        self.commit(|store| {
            let removed = store.delete(table, filter)?;
            Ok((removed, removed > 0))
        })
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.store.table_names()
    }

    pub fn table_schema(&self, table: &str) -> Result<Vec<String>> {
        Ok(self.store.table(table)?.schema.columns().to_vec())
    }

    pub fn info(&self) -> DatabaseInfo {
        let tables: Vec<TableInfo> = self
            .store
            .tables()
            .iter()
            .map(|t| TableInfo {
                name: t.name.clone(),
                columns: t.schema.columns().to_vec(),
                row_count: t.rows.len(),
            })
            .collect();
        DatabaseInfo {
            path: self.path().to_path_buf(),
            on_disk: self.on_disk,
            table_count: tables.len(),
            total_rows: self.store.total_rows(),
            tables,
        }
    }

    /// Apply `op` to a copy of the store and persist it; the copy becomes the
    /// live state only once the write has succeeded. `op` reports whether it
    /// changed anything, unchanged state is not rewritten.
    fn commit<R, F>(&mut self, op: F) -> Result<R>
    where
        F: FnOnce(&mut TableStore) -> Result<(R, bool)>,
    {
        let mut staged = self.store.clone();
        let (out, changed) = op(&mut staged)?;
        if changed {
            self.snapshot.write(&staged)?;
            self.store = staged;
            self.on_disk = true;
        }
        Ok(out)
    }
}

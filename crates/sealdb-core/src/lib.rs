//! sealdb-core — single-file, encrypted, schema-enforced document store
//!
//! # Storage model
//! - The whole database (tables, schemas, rows) lives in memory and is
//!   persisted as one snapshot file.
//! - The file holds an XChaCha20-Poly1305 envelope only; the plaintext JSON
//!   document never touches disk.
//! - Every state-changing call re-encodes, re-encrypts and atomically swaps the
//!   file (staging file + rename). There is no log and no incremental write.
//! - The 32-byte key belongs to the [`Database`] handle. It is generated on
//!   request but never stored; callers keep it (e.g. as base64 in a key file).
//!
//! # Concurrency
//! Single-threaded and synchronous. No file locking: two handles on the same
//! file are unsupported and the last writer wins.
//!
//! # Module layout
//! - `crypto`  — key type and envelope encrypt/decrypt
//! - `codec`   — table store to/from the plaintext JSON document
//! - `schema`  — column lists and row validation
//! - `row`     — row/filter types and exact-match filtering
//! - `store`   — in-memory tables and CRUD
//! - `persist` — load and atomic snapshot writes
//! - `db`      — public database handle
//! - `config`, `paths`, `error`

pub mod codec;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod paths;
pub mod persist;
pub mod row;
pub mod schema;
pub mod store;

pub use config::DatabaseConfig;
pub use crypto::DatabaseKey;
pub use db::{Database, DatabaseInfo, TableInfo};
pub use error::{DbError, Result};
pub use row::{Filter, Row, Value};
pub use schema::{RowPolicy, Schema};

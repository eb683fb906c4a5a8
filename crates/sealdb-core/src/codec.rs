//! Plaintext document codec.
//!
//! Document layout (JSON):
//! ```json
//! {"format": 1, "tables": [{"name": "users", "schema": ["id", "name"], "rows": [{"id": 1, "name": "Alice"}]}]}
//! ```
//! Tables appear in definition order, rows in insertion order.

use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};
use crate::store::TableStore;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a> {
    format: u32,
    tables: &'a TableStore,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    format: u32,
    tables: TableStore,
}

pub fn encode(store: &TableStore) -> Result<Vec<u8>> {
    serde_json::to_vec(&DocumentRef {
        format: FORMAT_VERSION,
        tables: store,
    })
    .map_err(|e| DbError::CorruptData(format!("encode document: {e}")))
}

pub fn decode(bytes: &[u8]) -> Result<TableStore> {
    let doc: Document = serde_json::from_slice(bytes)
        .map_err(|e| DbError::CorruptData(format!("parse document: {e}")))?;
    if doc.format != FORMAT_VERSION {
        return Err(DbError::CorruptData(format!(
            "unsupported document format {}",
            doc.format
        )));
    }
    doc.tables.check_integrity()?;
    Ok(doc.tables)
}

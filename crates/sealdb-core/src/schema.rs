use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{DbError, Result};
use crate::row::Row;

/// How rows relate to the full column list. Applied identically to inserts
/// and updates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowPolicy {
    /// Columns may be omitted; absent columns read as null.
    #[default]
    AllowMissing,
    /// Every inserted row must carry every column.
    RequireAll,
}

/// Ordered, duplicate-free list of permitted column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(DbError::InvalidSchema("columns must not be empty".into()));
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.is_empty() {
                return Err(DbError::InvalidSchema(
                    "column names must not be empty".into(),
                ));
            }
            if !seen.insert(column.as_str()) {
                return Err(DbError::InvalidSchema(format!(
                    "duplicate column '{column}'"
                )));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Reject any key outside the schema.
    pub fn check_columns<'a, I>(&self, table: &str, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for key in keys {
            if !self.contains(key) {
                return Err(DbError::UnknownColumn {
                    table: table.to_string(),
                    column: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Validate a complete row under `policy`.
    pub fn validate(&self, table: &str, row: &Row, policy: RowPolicy) -> Result<()> {
        self.check_columns(table, row.keys())?;
        if policy == RowPolicy::RequireAll {
            if let Some(missing) = self.columns.iter().find(|c| !row.contains_key(*c)) {
                return Err(DbError::MissingColumn {
                    table: table.to_string(),
                    column: missing.clone(),
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<String>> for Schema {
    type Error = DbError;

    fn try_from(columns: Vec<String>) -> Result<Self> {
        Schema::new(columns)
    }
}

impl From<Schema> for Vec<String> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}

//! In-memory table store. Pure state; persistence is layered on top by
//! [`crate::db::Database`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{DbError, Result};
use crate::row::{matches, Filter, Row};
use crate::schema::{RowPolicy, Schema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Table {
    pub name: String,
    pub schema: Schema,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    fn check_filter(&self, filter: &Filter) -> Result<()> {
        self.schema.check_columns(&self.name, filter.keys())
    }
}

/// Tables in definition order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableStore {
    tables: Vec<Table>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }

    pub fn define(&mut self, name: &str, schema: Schema) -> Result<()> {
        if name.is_empty() {
            return Err(DbError::InvalidSchema("table name must not be empty".into()));
        }
        if self.tables.iter().any(|t| t.name == name) {
            return Err(DbError::DuplicateTable(name.to_string()));
        }
        self.tables.push(Table::new(name, schema));
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<Table> {
        let idx = self
            .tables
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))?;
        Ok(self.tables.remove(idx))
    }

    pub fn insert(&mut self, name: &str, row: Row, policy: RowPolicy) -> Result<()> {
        let table = self.table_mut(name)?;
        table.schema.validate(&table.name, &row, policy)?;
        table.rows.push(row);
        Ok(())
    }

    /// Owned copies of the matching rows, in insertion order.
    pub fn select(&self, name: &str, filter: Option<&Filter>) -> Result<Vec<Row>> {
        let table = self.table(name)?;
        match filter {
            Some(filter) if !filter.is_empty() => {
                table.check_filter(filter)?;
                Ok(table
                    .rows
                    .iter()
                    .filter(|row| matches(row, filter))
                    .cloned()
                    .collect())
            }
            _ => Ok(table.rows.clone()),
        }
    }

    /// Merge `updates` into every matching row. Returns the number of rows
    /// matched; `changed` reports whether any stored value actually differs.
    pub fn update(&mut self, name: &str, filter: &Filter, updates: &Row) -> Result<UpdateOutcome> {
        let table = self.table_mut(name)?;
        table.check_filter(filter)?;
        table.schema.check_columns(&table.name, updates.keys())?;

        let mut outcome = UpdateOutcome::default();
        for row in table.rows.iter_mut().filter(|row| matches(row, filter)) {
            outcome.matched += 1;
            for (column, value) in updates {
                if row.get(column) != Some(value) {
                    row.insert(column.clone(), value.clone());
                    outcome.changed = true;
                }
            }
        }
        Ok(outcome)
    }

    pub fn delete(&mut self, name: &str, filter: &Filter) -> Result<usize> {
        let table = self.table_mut(name)?;
        table.check_filter(filter)?;
        let before = table.rows.len();
        table.rows.retain(|row| !matches(row, filter));
        Ok(before - table.rows.len())
    }

    /// Structural checks for state read back from disk.
    pub(crate) fn check_integrity(&self) -> Result<()> {
        let mut names = HashSet::with_capacity(self.tables.len());
        for table in &self.tables {
            if table.name.is_empty() {
                return Err(DbError::CorruptData("table with empty name".into()));
            }
            if !names.insert(table.name.as_str()) {
                return Err(DbError::CorruptData(format!(
                    "duplicate table '{}'",
                    table.name
                )));
            }
            for row in &table.rows {
                table
                    .schema
                    .check_columns(&table.name, row.keys())
                    .map_err(|e| DbError::CorruptData(e.to_string()))?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: usize,
    pub changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::from_value;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        from_value(value).unwrap()
    }

    fn users() -> TableStore {
        let mut store = TableStore::new();
        store
            .define("users", Schema::new(["id", "name", "email"]).unwrap())
            .unwrap();
        store
            .insert(
                "users",
                row(json!({"id": 1, "name": "Alice", "email": "a@x.com"})),
                RowPolicy::AllowMissing,
            )
            .unwrap();
        store
            .insert(
                "users",
                row(json!({"id": 2, "name": "Bob", "email": "b@x.com"})),
                RowPolicy::AllowMissing,
            )
            .unwrap();
        store
    }

    #[test]
    fn define_twice_is_rejected() {
        let mut store = users();
        let err = store
            .define("users", Schema::new(["x"]).unwrap())
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateTable(name) if name == "users"));
        assert!(matches!(
            store.define("", Schema::new(["x"]).unwrap()),
            Err(DbError::InvalidSchema(_))
        ));
    }

    #[test]
    fn tables_keep_definition_order() {
        let mut store = TableStore::new();
        for name in ["zeta", "alpha", "mid"] {
            store.define(name, Schema::new(["id"]).unwrap()).unwrap();
        }
        assert_eq!(store.table_names(), ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn insert_into_missing_table() {
        let mut store = TableStore::new();
        assert!(matches!(
            store.insert("ghosts", Row::new(), RowPolicy::AllowMissing),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn rejected_insert_leaves_rows_untouched() {
        let mut store = users();
        let err = store
            .insert(
                "users",
                row(json!({"id": 3, "nickname": "C"})),
                RowPolicy::AllowMissing,
            )
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownColumn { .. }));
        assert_eq!(store.table("users").unwrap().rows.len(), 2);
    }

    #[test]
    fn select_all_and_filtered() {
        let store = users();
        assert_eq!(store.select("users", None).unwrap().len(), 2);
        assert_eq!(store.select("users", Some(&Filter::new())).unwrap().len(), 2);
        let hits = store
            .select("users", Some(&row(json!({"name": "Alice", "id": 1}))))
            .unwrap();
        assert_eq!(hits, vec![row(json!({"id": 1, "name": "Alice", "email": "a@x.com"}))]);
        let none = store
            .select("users", Some(&row(json!({"name": "Alice", "id": 2}))))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn select_rejects_unknown_filter_column() {
        let store = users();
        assert!(matches!(
            store.select("users", Some(&row(json!({"age": 3})))),
            Err(DbError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn select_returns_a_snapshot() {
        let store = users();
        let mut rows = store.select("users", None).unwrap();
        rows[0].insert("name".into(), json!("Mallory"));
        rows.clear();
        let fresh = store.select("users", None).unwrap();
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[0]["name"], json!("Alice"));
    }

    #[test]
    fn update_merges_and_counts() {
        let mut store = users();
        let outcome = store
            .update(
                "users",
                &row(json!({"id": 1})),
                &row(json!({"email": "new@x.com"})),
            )
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, changed: true });
        let alice = &store.select("users", Some(&row(json!({"id": 1})))).unwrap()[0];
        assert_eq!(alice["email"], json!("new@x.com"));
        assert_eq!(alice["name"], json!("Alice"));
    }

    #[test]
    fn update_with_identical_values_reports_unchanged() {
        let mut store = users();
        let outcome = store
            .update(
                "users",
                &row(json!({"id": 2})),
                &row(json!({"name": "Bob"})),
            )
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, changed: false });
    }

    #[test]
    fn update_rejects_unknown_column_before_touching_rows() {
        let mut store = users();
        let before = store.clone();
        let err = store
            .update(
                "users",
                &Filter::new(),
                &row(json!({"email": "x@x.com", "age": 40})),
            )
            .unwrap_err();
        assert!(matches!(err, DbError::UnknownColumn { column, .. } if column == "age"));
        assert_eq!(store, before);
    }

    #[test]
    fn zero_match_update_and_delete() {
        let mut store = users();
        let before = store.clone();
        let outcome = store
            .update("users", &row(json!({"id": 99})), &row(json!({"name": "X"})))
            .unwrap();
        assert_eq!(outcome.matched, 0);
        assert!(!outcome.changed);
        assert_eq!(store.delete("users", &row(json!({"id": 99}))).unwrap(), 0);
        assert_eq!(store, before);
    }

    #[test]
    fn delete_removes_matches_only() {
        let mut store = users();
        assert_eq!(store.delete("users", &row(json!({"id": 2}))).unwrap(), 1);
        let rows = store.select("users", None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Alice"));
    }

    #[test]
    fn empty_filter_delete_clears_table() {
        let mut store = users();
        assert_eq!(store.delete("users", &Filter::new()).unwrap(), 2);
        assert_eq!(store.total_rows(), 0);
        assert_eq!(store.table_names(), ["users"]);
    }

    #[test]
    fn drop_table_removes_schema_and_rows() {
        let mut store = users();
        let dropped = store.drop_table("users").unwrap();
        assert_eq!(dropped.rows.len(), 2);
        assert!(store.table_names().is_empty());
        assert!(matches!(
            store.drop_table("users"),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn require_all_policy_applies_to_insert() {
        let mut store = users();
        let err = store
            .insert("users", row(json!({"id": 3, "name": "C"})), RowPolicy::RequireAll)
            .unwrap_err();
        assert!(matches!(err, DbError::MissingColumn { .. }));
        assert_eq!(store.total_rows(), 2);
    }
}

//! Get-or-create access to reference tables.
//!
//! Lookup and insert run as two statements on one connection. Two writers
//! racing on the same natural key can both miss the lookup; the second insert
//! then fails on the table's UNIQUE constraint and the error propagates.

use anyhow::{bail, Context, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use tracing::trace;

use crate::schema::TableSchema;

/// Column/value pairs used as a natural-key filter or as insert attributes
pub type Fields<'a> = [(&'a str, Value)];

/// Text cell for a [`Fields`] entry
pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Outcome of [`Reconciler::get_or_create`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub id: i64,
    pub created: bool,
}

/// Natural-key reconciliation over any surrogate-keyed table
pub struct Reconciler<'c> {
    conn: &'c Connection,
}

impl<'c> Reconciler<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn exists(&self, table: &TableSchema, key: &Fields) -> Result<bool> {
        Ok(self.find_id(table, key)?.is_some())
    }

    /// Id of the row matching every key column, if any
    pub fn find_id(&self, table: &TableSchema, key: &Fields) -> Result<Option<i64>> {
        validate(table, key, &[])?;

        let predicate: Vec<String> = key
            .iter()
            .enumerate()
            .map(|(i, (col, _))| format!("{} IS ?{}", col, i + 1))
            .collect();
        let sql = format!(
            "SELECT id FROM {} WHERE {} LIMIT 1",
            table.name,
            predicate.join(" AND ")
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        for (i, (_, value)) in key.iter().enumerate() {
            stmt.raw_bind_parameter(i + 1, value)?;
        }
        let mut rows = stmt.raw_query();
        let id = rows
            .next()
            .with_context(|| format!("Failed to query {}", table.name))?
            .map(|row| row.get::<_, i64>(0))
            .transpose()?;
        Ok(id)
    }

    /// Return the row matching `key`, inserting `key` and `attributes` when
    /// there is none. Values are stored exactly as given.
    pub fn get_or_create(
        &self,
        table: &TableSchema,
        key: &Fields,
        attributes: &Fields,
    ) -> Result<Reconciled> {
        validate(table, key, attributes)?;

        if let Some(id) = self.find_id(table, key)? {
            return Ok(Reconciled { id, created: false });
        }

        let id = self.insert(table, key, attributes)?;
        trace!(table = table.name, id, "created reference row");
        Ok(Reconciled { id, created: true })
    }

    fn insert(&self, table: &TableSchema, key: &Fields, attributes: &Fields) -> Result<i64> {
        let fields: Vec<&(&str, Value)> = key.iter().chain(attributes.iter()).collect();
        let columns: Vec<&str> = fields.iter().map(|(col, _)| *col).collect();
        let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        for (i, (_, value)) in fields.iter().enumerate() {
            stmt.raw_bind_parameter(i + 1, value)?;
        }
        stmt.raw_execute()
            .with_context(|| format!("Failed to insert into {}", table.name))?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Set a nullable column on an existing row, only if it is still NULL
    pub fn backfill_column(
        &self,
        table: &TableSchema,
        id: i64,
        column: &str,
        value: &Value,
    ) -> Result<bool> {
        if table.column(column).is_none() {
            bail!("Unknown column {}.{}", table.name, column);
        }
        if *value == Value::Null {
            return Ok(false);
        }

        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE id = ?2 AND {} IS NULL",
            table.name, column, column
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        stmt.raw_bind_parameter(1, value)?;
        stmt.raw_bind_parameter(2, id)?;
        Ok(stmt.raw_execute()? > 0)
    }

    /// Single text column of the row with the given id
    pub fn text_column(&self, table: &TableSchema, id: i64, column: &str) -> Result<Option<String>> {
        if table.column(column).is_none() {
            bail!("Unknown column {}.{}", table.name, column);
        }
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", column, table.name);
        let value = self
            .conn
            .query_row(&sql, [id], |row| row.get::<_, Option<String>>(0))
            .optional()?;
        Ok(value.flatten())
    }
}

fn validate(table: &TableSchema, key: &Fields, attributes: &Fields) -> Result<()> {
    if !table.has_surrogate_id() {
        bail!("{} has no surrogate id and cannot be reconciled", table.name);
    }
    if key.is_empty() {
        bail!("Empty natural key for {}", table.name);
    }
    for (col, _) in key.iter().chain(attributes.iter()) {
        if table.column(col).is_none() {
            bail!("Unknown column {}.{}", table.name, col);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{ADDITIVE, CHEMICAL_ACTIVITY, RECORD_CHEMICAL_ACTIVITY};
    use crate::store::Store;

    #[test]
    fn test_get_or_create_returns_same_row() {
        let store = Store::open_in_memory().unwrap();
        let reconciler = store.reconciler();
        let key = [("tri_chemical_id", text("123-45-6"))];
        let attrs = [("name", text("Additive A"))];

        let first = reconciler.get_or_create(&ADDITIVE, &key, &attrs).unwrap();
        let second = reconciler.get_or_create(&ADDITIVE, &key, &attrs).unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(store.count_rows(&ADDITIVE).unwrap(), 1);
    }

    #[test]
    fn test_exists() {
        let store = Store::open_in_memory().unwrap();
        let reconciler = store.reconciler();
        let key = [("name", text("Manufacture"))];

        assert!(!reconciler.exists(&CHEMICAL_ACTIVITY, &key).unwrap());
        reconciler.get_or_create(&CHEMICAL_ACTIVITY, &key, &[]).unwrap();
        assert!(reconciler.exists(&CHEMICAL_ACTIVITY, &key).unwrap());
    }

    #[test]
    fn test_values_are_not_normalized() {
        let store = Store::open_in_memory().unwrap();
        let reconciler = store.reconciler();

        let a = reconciler
            .get_or_create(&CHEMICAL_ACTIVITY, &[("name", text("Import"))], &[])
            .unwrap();
        let b = reconciler
            .get_or_create(&CHEMICAL_ACTIVITY, &[("name", text(" import"))], &[])
            .unwrap();

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_null_key_matches_null() {
        let store = Store::open_in_memory().unwrap();
        let reconciler = store.reconciler();
        let key = [
            ("name", text("Produce")),
            ("parent_chemical_activity_id", Value::Null),
        ];

        let first = reconciler.get_or_create(&CHEMICAL_ACTIVITY, &key, &[]).unwrap();
        let second = reconciler.get_or_create(&CHEMICAL_ACTIVITY, &key, &[]).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .reconciler()
            .get_or_create(&ADDITIVE, &[("casrn", text("1"))], &[])
            .unwrap_err();
        assert!(err.to_string().contains("Unknown column"));
    }

    #[test]
    fn test_join_table_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let result = store
            .reconciler()
            .get_or_create(&RECORD_CHEMICAL_ACTIVITY, &[("record_id", 1_i64.into())], &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_natural_key_insert_fails() {
        let store = Store::open_in_memory().unwrap();
        let reconciler = store.reconciler();
        reconciler
            .get_or_create(&ADDITIVE, &[("tri_chemical_id", text("1"))], &[("name", text("A"))])
            .unwrap();

        // Same name under a different key violates UNIQUE(name)
        let result = reconciler.get_or_create(
            &ADDITIVE,
            &[("tri_chemical_id", text("2"))],
            &[("name", text("A"))],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_backfill_only_fills_nulls() {
        use crate::schema::tables::INDUSTRY_SECTOR;

        let store = Store::open_in_memory().unwrap();
        let reconciler = store.reconciler();
        let sector = reconciler
            .get_or_create(&INDUSTRY_SECTOR, &[("naics_code", text("326199"))], &[])
            .unwrap();

        let title = text("All Other Plastics Product Manufacturing");
        assert!(reconciler
            .backfill_column(&INDUSTRY_SECTOR, sector.id, "naics_title", &title)
            .unwrap());
        assert!(!reconciler
            .backfill_column(&INDUSTRY_SECTOR, sector.id, "naics_title", &text("Other"))
            .unwrap());
        assert_eq!(
            reconciler
                .text_column(&INDUSTRY_SECTOR, sector.id, "naics_title")
                .unwrap()
                .as_deref(),
            Some("All Other Plastics Product Manufacturing")
        );
    }
}

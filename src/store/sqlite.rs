use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, Transaction};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::reconcile::Reconciler;
use super::records::load_records;
use super::schema_gen::{generate_create_table, generate_indexes};
use crate::model::StoredRecord;
use crate::schema::{DependencyResolver, TableSchema};

/// The reference vocabulary store and fact table, backed by one SQLite
/// connection. All writes go through this single connection.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database file and make sure every table exists
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {:?}", db_path))?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;",
        )?;

        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Create all tables in FK order; existing tables are left alone
    pub fn initialize(&self) -> Result<usize> {
        let tables = DependencyResolver::new().creation_order().map_err(|e| anyhow!(e))?;
        debug!(tables = tables.len(), "ensuring schema");

        for schema in &tables {
            let sql = generate_create_table(schema);
            self.conn
                .execute(&sql, [])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;

            for index_sql in generate_indexes(schema) {
                self.conn
                    .execute(&index_sql, [])
                    .with_context(|| format!("Failed to create index for: {}", schema.name))?;
            }
        }

        Ok(tables.len())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(&self.conn)
    }

    /// One unit of work per file; dropping it without commit rolls back
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.conn.transaction().context("Failed to begin transaction")
    }

    pub fn count_rows(&self, table: &TableSchema) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name);
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("Failed to count rows in {}", table.name))?;
        Ok(count as u64)
    }

    /// NAICS codes whose sector already carries a title
    pub fn titled_naics_codes(&self) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT naics_code FROM industry_sector WHERE naics_title IS NOT NULL")?;
        let codes = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(codes)
    }

    pub fn records(&self) -> Result<Vec<StoredRecord>> {
        load_records(&self.conn)
    }

    pub fn finalize(self) -> Result<()> {
        info!("Finalizing database");
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{ALL_TABLES, RECORD};
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_every_table() {
        let store = Store::open_in_memory().unwrap();
        for table in ALL_TABLES {
            assert_eq!(store.count_rows(table).unwrap(), 0, "{}", table.name);
        }
    }

    #[test]
    fn test_reopen_keeps_existing_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tri.sqlite");

        {
            let store = Store::open(&path).unwrap();
            store
                .conn()
                .execute(
                    "INSERT INTO additive (name, tri_chemical_id) VALUES ('A', '1')",
                    [],
                )
                .unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.count_rows(&crate::schema::ADDITIVE).unwrap(), 1);
        assert_eq!(store.count_rows(&RECORD).unwrap(), 0);
    }

    #[test]
    fn test_foreign_keys_are_enforced() {
        let store = Store::open_in_memory().unwrap();
        let result = store.conn().execute(
            "INSERT INTO record (additive_id, waste_generator_industry_sector_id, amount)
             VALUES (99, 99, 1.0)",
            [],
        );
        assert!(result.is_err());
    }
}

use crate::schema::{PrimaryKey, TableSchema};

/// Generate CREATE TABLE SQL for a table schema
///
/// Statements are idempotent so an existing database can be reopened and
/// loaded again.
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    if schema.has_surrogate_id() {
        columns.push("    id INTEGER PRIMARY KEY AUTOINCREMENT".to_string());
    }

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        columns.push(format!(
            "    {} {}{}",
            col.name,
            col.col_type.sql_type(),
            null_constraint
        ));
    }

    if let PrimaryKey::Composite(key) = &schema.primary_key {
        columns.push(format!("    PRIMARY KEY ({})", key.join(", ")));
    }

    for key in schema.unique {
        columns.push(format!("    UNIQUE ({})", key.join(", ")));
    }

    // Add foreign key constraints
    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for foreign key columns
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .foreign_keys
        .iter()
        .map(|fk| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                schema.name, fk.column, schema.name, fk.column
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{CHEMICAL_ACTIVITY, RECORD, RECORD_CHEMICAL_ACTIVITY};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&CHEMICAL_ACTIVITY);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS chemical_activity"));
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("name TEXT NOT NULL"));
        assert!(sql.contains("description TEXT,"));
        assert!(sql.contains("UNIQUE (name)"));
        assert!(sql.contains(
            "FOREIGN KEY (parent_chemical_activity_id) REFERENCES chemical_activity(id)"
        ));
    }

    #[test]
    fn test_join_table_uses_composite_key() {
        let sql = generate_create_table(&RECORD_CHEMICAL_ACTIVITY);
        assert!(!sql.contains("AUTOINCREMENT"));
        assert!(sql.contains("PRIMARY KEY (record_id, chemical_activity_id)"));
    }

    #[test]
    fn test_generate_indexes() {
        let indexes = generate_indexes(&RECORD);
        assert_eq!(indexes.len(), 5);
        assert!(indexes
            .iter()
            .any(|i| i.contains("idx_record_waste_handler_industry_sector_id")));
    }
}

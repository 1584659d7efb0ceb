//! Append-only access to the fact table and its activity links

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};

use crate::model::{NewRecord, RecordTarget, StoredRecord};

/// Append a fact row, returning its id
pub fn insert_record(conn: &Connection, record: &NewRecord) -> Result<i64> {
    let (end_of_life, release) = record.target.foreign_keys();
    let mut stmt = conn.prepare_cached(
        "INSERT INTO record (
            additive_id,
            waste_generator_industry_sector_id,
            amount,
            end_of_life_activity_id,
            release_type_id,
            waste_handler_industry_sector_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    stmt.execute(params![
        record.additive_id,
        record.generator_sector_id,
        record.amount,
        end_of_life,
        release,
        record.handler_sector_id,
    ])
    .context("Failed to insert record")?;

    Ok(conn.last_insert_rowid())
}

/// Tag a record with chemical activities; repeated links are ignored
pub fn link_chemical_activities(conn: &Connection, record_id: i64, activity_ids: &[i64]) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO record_chemical_activity (record_id, chemical_activity_id)
         VALUES (?1, ?2)",
    )?;
    for activity_id in activity_ids {
        stmt.execute(params![record_id, activity_id])
            .with_context(|| format!("Failed to link record {} to activity {}", record_id, activity_id))?;
    }
    Ok(())
}

/// All fact rows, in insertion order
pub fn load_records(conn: &Connection) -> Result<Vec<StoredRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, additive_id, waste_generator_industry_sector_id,
                waste_handler_industry_sector_id, amount,
                end_of_life_activity_id, release_type_id
         FROM record ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, Option<i64>>(3)?,
            row.get::<_, f64>(4)?,
            row.get::<_, Option<i64>>(5)?,
            row.get::<_, Option<i64>>(6)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, additive_id, generator, handler, amount, end_of_life, release) = row?;
        let Some(target) = RecordTarget::from_foreign_keys(end_of_life, release) else {
            bail!("record {} references both an end-of-life activity and a release type", id);
        };
        records.push(StoredRecord {
            id,
            additive_id,
            generator_sector_id: generator,
            handler_sector_id: handler,
            amount,
            target,
        });
    }
    Ok(records)
}

/// Chemical activity ids linked to a record
pub fn record_activity_ids(conn: &Connection, record_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT chemical_activity_id FROM record_chemical_activity
         WHERE record_id = ?1 ORDER BY chemical_activity_id",
    )?;
    let ids = stmt
        .query_map([record_id], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

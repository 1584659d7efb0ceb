use anyhow::{Context, Result};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{is_flag_set, ActivityIndex, FileSummary};
use crate::config::FileConfig;
use crate::parser::TriTable;

/// Transform the chemical activity file (1b).
///
/// Records which activities each facility reported for each tracked
/// additive. `activity_ids` maps activity names to their ids, as returned by
/// loading the hierarchy. Fact rows from later files are linked through the
/// returned index.
pub fn transform_activity_file(
    file: &FileConfig,
    table: &TriTable,
    additives: &HashMap<String, i64>,
    activity_ids: &HashMap<String, i64>,
) -> Result<(ActivityIndex, FileSummary)> {

    let facility = table.column_index(&file.key_columns.facility_id)?;
    let chemical = table.column_index(&file.key_columns.chemical_id)?;

    let mut activity_columns = Vec::new();
    for column in file.needed_columns.iter().filter(|c| !c.is_general_info()) {
        let index = table.column_index(&column.name)?;
        let activity_id = activity_ids
            .get(&column.name)
            .copied()
            .with_context(|| format!("Chemical activity {:?} was not loaded", column.name))?;
        activity_columns.push((index, activity_id));
    }

    let mut index = ActivityIndex::default();
    let mut summary = FileSummary::default();

    for row in table.rows() {
        summary.rows_read += 1;

        let chemical_id = row.get(chemical);
        if !additives.contains_key(chemical_id) {
            summary.rows_skipped += 1;
            continue;
        }

        let facility_id = row.get(facility);
        for &(column, activity_id) in &activity_columns {
            if is_flag_set(row.get(column)) {
                index.insert(facility_id, chemical_id, activity_id);
            }
        }
    }

    debug!(pairs = index.len(), "Indexed reported chemical activities");
    info!(%summary, "Transformed activity file");
    Ok((index, summary))
}

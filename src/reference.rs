//! Reference data loaded from configuration: the chemical activity
//! hierarchy and the tracked additives.

use anyhow::{bail, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::{AdditiveSeed, NeededColumn};
use crate::schema::tables::{ADDITIVE, CHEMICAL_ACTIVITY};
use crate::store::{text, Reconciler};

/// Outcome of loading the activity hierarchy
#[derive(Debug, Clone, Default)]
pub struct HierarchyLoad {
    pub created: usize,
    /// Activity name -> id, for every activity touched by the load
    pub ids: HashMap<String, i64>,
}

/// Materialize activity definitions into the self-referential
/// `chemical_activity` table.
///
/// A parent named by `depends_on` is resolved (and created if needed) before
/// its child, so a parent declared later in the list still resolves. Rows that
/// already exist are reused; loading twice creates nothing new. A row created
/// earlier as someone's parent gets its own parent when its definition comes
/// up, unless that would close a cycle.
pub fn load_chemical_activities(conn: &Connection, definitions: &[NeededColumn]) -> Result<HierarchyLoad> {
    let reconciler = Reconciler::new(conn);
    let mut load = HierarchyLoad::default();

    for definition in definitions.iter().filter(|d| !d.is_general_info()) {
        let parent_id = match definition.depends_on.as_deref() {
            Some(parent) if parent == definition.name => {
                bail!("Chemical activity {:?} depends on itself", parent);
            }
            Some(parent) => {
                let parent_row =
                    reconciler.get_or_create(&CHEMICAL_ACTIVITY, &[("name", text(parent))], &[])?;
                if parent_row.created {
                    debug!(activity = parent, "created parent activity on demand");
                    load.created += 1;
                }
                load.ids.insert(parent.to_string(), parent_row.id);
                Some(parent_row.id)
            }
            None => None,
        };

        let row = reconciler.get_or_create(
            &CHEMICAL_ACTIVITY,
            &[("name", text(&definition.name))],
            &[
                ("description", definition.description.clone().into()),
                ("parent_chemical_activity_id", parent_id.into()),
            ],
        )?;

        if row.created {
            load.created += 1;
        } else {
            reconciler.backfill_column(
                &CHEMICAL_ACTIVITY,
                row.id,
                "description",
                &definition.description.clone().into(),
            )?;
            if let Some(parent_id) = parent_id {
                if has_ancestor(conn, parent_id, row.id)? {
                    warn!(
                        activity = %definition.name,
                        parent = definition.depends_on.as_deref().unwrap_or_default(),
                        "Parent would create a cycle; left unset"
                    );
                } else {
                    reconciler.backfill_column(
                        &CHEMICAL_ACTIVITY,
                        row.id,
                        "parent_chemical_activity_id",
                        &Value::Integer(parent_id),
                    )?;
                }
            }
        }
        load.ids.insert(definition.name.clone(), row.id);
    }

    info!(
        activities = load.ids.len(),
        created = load.created,
        "Loaded chemical activities"
    );
    Ok(load)
}

/// Whether `ancestor` is `id` or appears on its parent chain
fn has_ancestor(conn: &Connection, id: i64, ancestor: i64) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT parent_chemical_activity_id FROM chemical_activity WHERE id = ?1",
    )?;
    let mut seen = HashSet::new();
    let mut current = Some(id);

    while let Some(node) = current {
        if node == ancestor {
            return Ok(true);
        }
        if !seen.insert(node) {
            break;
        }
        current = stmt
            .query_row([node], |row| row.get::<_, Option<i64>>(0))
            .optional()?
            .flatten();
    }
    Ok(false)
}

/// Insert configured additives keyed by CASRN. Returns the number created.
pub fn seed_additives(conn: &Connection, additives: &[AdditiveSeed]) -> Result<usize> {
    let reconciler = Reconciler::new(conn);
    let mut created = 0;

    for additive in additives {
        let row = reconciler.get_or_create(
            &ADDITIVE,
            &[("tri_chemical_id", text(&additive.casrn))],
            &[("name", text(&additive.name))],
        )?;
        if row.created {
            created += 1;
        }
    }

    info!(additives = additives.len(), created, "Seeded additives");
    Ok(created)
}

/// CASRN -> additive id for every additive in the store
pub fn additive_ids(conn: &Connection) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT tri_chemical_id, id FROM additive")?;
    let ids = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(ids)
}

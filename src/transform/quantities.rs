use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use super::{classify_column, parse_quantity, ActivityIndex, ColumnRole, Enrichers, FileSummary};
use crate::config::{FileConfig, FileVariant, MainConfig};
use crate::enrich::{enrich, EnrichmentTable};
use crate::error::ConfigError;
use crate::model::{NewRecord, RecordTarget};
use crate::parser::{MassUnit, TriRow, TriTable};
use crate::reference::additive_ids;
use crate::schema::tables::{END_OF_LIFE_ACTIVITY, INDUSTRY_SECTOR, RELEASE_TYPE};
use crate::store::{insert_record, link_chemical_activities, text, Reconciler, Store};

/// Which rows of a file are worth loading
pub struct RowFilter<'a> {
    /// CASRN -> additive id of tracked additives
    pub additives: &'a HashMap<String, i64>,
    /// Generator NAICS prefixes; empty accepts every sector
    pub sector_prefixes: &'a [String],
}

impl RowFilter<'_> {
    fn additive(&self, chemical_id: &str) -> Option<i64> {
        self.additives.get(chemical_id).copied()
    }

    fn sector_allowed(&self, naics_code: &str) -> bool {
        !naics_code.is_empty()
            && (self.sector_prefixes.is_empty()
                || self
                    .sector_prefixes
                    .iter()
                    .any(|p| naics_code.starts_with(p.trim())))
    }
}

/// Enrichment results a file is loaded with
#[derive(Debug, Clone, Default)]
pub struct ResolvedEnrichment {
    /// Registry id -> NAICS code
    pub registry_naics: EnrichmentTable,
    /// NAICS code -> title
    pub naics_titles: EnrichmentTable,
}

enum HandlerSource {
    None,
    Registry(usize),
    Fixed(String),
}

struct PlannedColumn<'a> {
    index: usize,
    name: &'a str,
    role: ColumnRole,
}

/// Column positions and roles of one quantity file (1a, 3a or 3c)
pub struct QuantityPlan<'a> {
    variant: FileVariant,
    facility: usize,
    chemical: usize,
    generator_naics: usize,
    unit: usize,
    handler: HandlerSource,
    columns: Vec<PlannedColumn<'a>>,
}

impl<'a> QuantityPlan<'a> {
    pub fn new(variant: FileVariant, file: &'a FileConfig, table: &TriTable) -> Result<Self> {
        let keys = &file.key_columns;
        let generator_naics = keys.generator_naics.as_deref().ok_or_else(|| {
            ConfigError::Invalid(format!("{} needs key_columns.generator_naics", variant))
        })?;
        let unit = keys
            .unit
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid(format!("{} needs key_columns.unit", variant)))?;

        let handler = match (&keys.handler_registry_id, &keys.fixed_handler_naics) {
            (Some(column), _) => HandlerSource::Registry(table.column_index(column)?),
            (None, Some(code)) => HandlerSource::Fixed(code.trim().to_string()),
            (None, None) => HandlerSource::None,
        };

        let mut columns = Vec::new();
        for column in &file.needed_columns {
            let role = classify_column(variant, column)?;
            if role == ColumnRole::General {
                continue;
            }
            columns.push(PlannedColumn {
                index: table.column_index(&column.name)?,
                name: column.name.as_str(),
                role,
            });
        }

        Ok(Self {
            variant,
            facility: table.column_index(&keys.facility_id)?,
            chemical: table.column_index(&keys.chemical_id)?,
            generator_naics: table.column_index(generator_naics)?,
            unit: table.column_index(unit)?,
            handler,
            columns,
        })
    }

    fn accepts(&self, row: &TriRow<'_>, filter: &RowFilter<'_>) -> Option<i64> {
        let additive_id = filter.additive(row.get(self.chemical))?;
        filter
            .sector_allowed(row.get(self.generator_naics))
            .then_some(additive_id)
    }

    /// Distinct receiving-facility registry ids among accepted rows
    pub fn registry_ids(&self, table: &TriTable, filter: &RowFilter<'_>) -> BTreeSet<String> {
        let HandlerSource::Registry(column) = self.handler else {
            return BTreeSet::new();
        };
        table
            .rows()
            .filter(|row| self.accepts(row, filter).is_some())
            .filter_map(|row| row.non_empty(column).map(str::to_string))
            .collect()
    }

    /// Distinct NAICS codes this file will create sectors for
    pub fn naics_codes(
        &self,
        table: &TriTable,
        filter: &RowFilter<'_>,
        registry_naics: &EnrichmentTable,
    ) -> BTreeSet<String> {
        let mut codes = BTreeSet::new();
        for row in table.rows().filter(|row| self.accepts(row, filter).is_some()) {
            codes.insert(row.get(self.generator_naics).to_string());
            if let HandlerSource::Registry(column) = self.handler {
                if let Some(Some(code)) = row.non_empty(column).and_then(|id| registry_naics.get(id)) {
                    codes.insert(code.clone());
                }
            }
        }
        if let HandlerSource::Fixed(code) = &self.handler {
            codes.insert(code.clone());
        }
        codes
    }

    /// Write one record per populated quantity column of every accepted row
    pub fn load(
        &self,
        conn: &Connection,
        table: &TriTable,
        filter: &RowFilter<'_>,
        enrichment: &ResolvedEnrichment,
        activities: &ActivityIndex,
    ) -> Result<FileSummary> {
        let reconciler = Reconciler::new(conn);
        let mut sectors = SectorCache::new(&enrichment.naics_titles);
        let mut targets: Vec<Option<RecordTarget>> = vec![None; self.columns.len()];
        let mut summary = FileSummary::default();

        for (line, row) in table.rows().enumerate() {
            summary.rows_read += 1;
            let row_label = || format!("{} row {}", self.variant, line + 2);

            let Some(additive_id) = self.accepts(&row, filter) else {
                summary.rows_skipped += 1;
                continue;
            };

            let mut quantities = Vec::new();
            for (i, column) in self.columns.iter().enumerate() {
                if let Some(quantity) =
                    parse_quantity(column.name, row.get(column.index)).with_context(row_label)?
                {
                    quantities.push((i, quantity));
                }
            }
            if quantities.is_empty() {
                summary.rows_skipped += 1;
                continue;
            }

            let unit: MassUnit = row.get(self.unit).parse().with_context(row_label)?;
            let generator_id = sectors.id(&reconciler, row.get(self.generator_naics))?;
            let handler_id = match &self.handler {
                HandlerSource::None => None,
                HandlerSource::Fixed(code) => Some(sectors.id(&reconciler, code)?),
                HandlerSource::Registry(column) => {
                    match row
                        .non_empty(*column)
                        .and_then(|id| enrichment.registry_naics.get(id).cloned().flatten())
                    {
                        Some(code) => Some(sectors.id(&reconciler, &code)?),
                        None => {
                            debug!(row = line + 2, "No NAICS code for receiving facility");
                            None
                        }
                    }
                }
            };

            let facility_id = row.get(self.facility);
            let chemical_id = row.get(self.chemical);
            let activity_ids = activities.get(facility_id, chemical_id);

            for (i, quantity) in quantities {
                let target = match targets[i] {
                    Some(target) => target,
                    None => {
                        let target = resolve_target(&reconciler, &self.columns[i].role)?;
                        targets[i] = Some(target);
                        target
                    }
                };

                let record_id = insert_record(
                    conn,
                    &NewRecord {
                        additive_id,
                        generator_sector_id: generator_id,
                        handler_sector_id: handler_id,
                        amount: unit.to_kilograms(quantity),
                        target,
                    },
                )?;
                link_chemical_activities(conn, record_id, activity_ids)?;

                summary.records_created += 1;
                summary.activity_links += activity_ids.len();
            }
        }

        Ok(summary)
    }
}

/// Get-or-create of the release type or end-of-life activity behind a column
fn resolve_target(reconciler: &Reconciler<'_>, role: &ColumnRole) -> Result<RecordTarget> {
    Ok(match role {
        ColumnRole::Release(release) => RecordTarget::Release(
            reconciler
                .get_or_create(&RELEASE_TYPE, &release.key(), &release.attributes())?
                .id,
        ),
        ColumnRole::EndOfLife(activity) => RecordTarget::EndOfLife(
            reconciler
                .get_or_create(&END_OF_LIFE_ACTIVITY, &activity.key(), &activity.attributes())?
                .id,
        ),
        ColumnRole::General | ColumnRole::Untargeted => RecordTarget::None,
    })
}

/// Industry sector ids by NAICS code, titled from the enrichment table
struct SectorCache<'t> {
    titles: &'t EnrichmentTable,
    ids: HashMap<String, i64>,
}

impl<'t> SectorCache<'t> {
    fn new(titles: &'t EnrichmentTable) -> Self {
        Self {
            titles,
            ids: HashMap::new(),
        }
    }

    fn id(&mut self, reconciler: &Reconciler<'_>, naics_code: &str) -> Result<i64> {
        if let Some(&id) = self.ids.get(naics_code) {
            return Ok(id);
        }

        let title = Value::from(self.titles.get(naics_code).cloned().flatten());
        let row = reconciler.get_or_create(
            &INDUSTRY_SECTOR,
            &[("naics_code", text(naics_code))],
            &[("naics_title", title.clone())],
        )?;
        if !row.created {
            reconciler.backfill_column(&INDUSTRY_SECTOR, row.id, "naics_title", &title)?;
        }

        self.ids.insert(naics_code.to_string(), row.id);
        Ok(row.id)
    }
}

/// Enrich and load one quantity file inside its own transaction.
///
/// Lookups happen before the transaction opens; a failure while loading rolls
/// back this file only.
pub async fn transform_quantity_file(
    store: &mut Store,
    config: &MainConfig,
    variant: FileVariant,
    table: &TriTable,
    enrichers: &Enrichers,
    activities: &ActivityIndex,
) -> Result<FileSummary> {
    let file = config.tri_files.get(variant);
    let plan = QuantityPlan::new(variant, file, table)?;

    let additives = additive_ids(store.conn())?;
    let filter = RowFilter {
        additives: &additives,
        sector_prefixes: &config.industry_sectors.naics_code,
    };

    let registry_ids = plan.registry_ids(table, &filter);
    let registry_naics = enrich(enrichers.registry.as_ref(), &registry_ids, enrichers.max_concurrency).await;

    let titled = store.titled_naics_codes()?;
    let mut codes = plan.naics_codes(table, &filter, &registry_naics);
    codes.retain(|code| !titled.contains(code));
    let naics_titles = enrich(enrichers.naics.as_ref(), &codes, enrichers.max_concurrency).await;

    let enrichment = ResolvedEnrichment {
        registry_naics,
        naics_titles,
    };

    let tx = store.transaction()?;
    let summary = plan.load(&tx, table, &filter, &enrichment, activities)?;
    tx.commit()
        .with_context(|| format!("Failed to commit {}", variant))?;

    info!(file = %variant, %summary, "Transformed quantity file");
    Ok(summary)
}

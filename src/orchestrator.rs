//! Runs a processing year end to end.

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::config::{FileVariant, MainConfig};
use crate::parser::TriTable;
use crate::reference::{additive_ids, load_chemical_activities, seed_additives};
use crate::store::Store;
use crate::transform::{
    transform_activity_file, transform_quantity_file, ActivityIndex, Enrichers, FileSummary,
};

/// Counts for one processing year
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub year: u16,
    pub additives_created: usize,
    pub activities_created: usize,
    pub files: Vec<(FileVariant, FileSummary)>,
}

impl RunSummary {
    pub fn records_created(&self) -> usize {
        self.files.iter().map(|(_, s)| s.records_created).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "TRI {}: {} additives and {} chemical activities created",
            self.year, self.additives_created, self.activities_created
        )?;
        for (variant, summary) in &self.files {
            writeln!(f, "  {}: {}", variant, summary)?;
        }
        write!(f, "  total: {} records", self.records_created())
    }
}

pub struct Orchestrator<'a> {
    store: &'a mut Store,
    config: &'a MainConfig,
    enrichers: &'a Enrichers,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a mut Store, config: &'a MainConfig, enrichers: &'a Enrichers) -> Self {
        Self {
            store,
            config,
            enrichers,
        }
    }

    /// Seed reference data, then transform the selected files of `year`
    /// found in `data_dir`. Each quantity file commits on its own, so a failure keeps
    /// what earlier files wrote.
    pub async fn run_year(
        &mut self,
        data_dir: &Path,
        year: u16,
        variants: &[FileVariant],
    ) -> Result<RunSummary> {
        let mut summary = RunSummary {
            year,
            ..Default::default()
        };

        let hierarchy = {
            let tx = self.store.transaction()?;
            summary.additives_created = seed_additives(&tx, &self.config.plastic_additives.tri_chem_id)?;
            let hierarchy = load_chemical_activities(&tx, &self.config.tri_files.file_1b.needed_columns)?;
            tx.commit().context("Failed to commit reference data")?;
            hierarchy
        };
        summary.activities_created = hierarchy.created;

        let selected: Vec<FileVariant> = FileVariant::ALL
            .into_iter()
            .filter(|v| variants.contains(v))
            .collect();

        let mut activities = ActivityIndex::default();
        if !selected.contains(&FileVariant::File1b) {
            warn!("file_1b not selected; records will not be linked to chemical activities");
        }

        for variant in selected {
            let path = data_dir.join(variant.file_name(year));
            let table = TriTable::read_path(&path)?;
            info!(file = %variant, path = %path.display(), rows = table.len(), "Processing");

            let file_summary = match variant {
                FileVariant::File1b => {
                    let additives = additive_ids(self.store.conn())?;
                    let (index, file_summary) = transform_activity_file(
                        &self.config.tri_files.file_1b,
                        &table,
                        &additives,
                        &hierarchy.ids,
                    )?;
                    activities = index;
                    file_summary
                }
                _ => {
                    transform_quantity_file(
                        self.store,
                        self.config,
                        variant,
                        &table,
                        self.enrichers,
                        &activities,
                    )
                    .await?
                }
            };
            summary.files.push((variant, file_summary));
        }

        info!(year, records = summary.records_created(), "Run complete");
        Ok(summary)
    }
}

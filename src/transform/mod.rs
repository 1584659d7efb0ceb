//! Reshaping TRI files into normalized rows.
//!
//! TRI reports several quantities per facility/chemical row, one per
//! declared column. Each populated quantity column becomes its own fact row.

pub mod activities;
pub mod quantities;

pub use activities::*;
pub use quantities::*;

use std::collections::HashMap;
use std::fmt;

use crate::config::{FileVariant, NeededColumn};
use crate::enrich::KeyLookup;
use crate::error::{ConfigError, TransformError};
use crate::model::{EndOfLifeActivity, EndOfLifeFlags, ReleaseType};

/// What a declared column contributes to a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
    /// Descriptive field, never a quantity
    General,
    Release(ReleaseType),
    EndOfLife(EndOfLifeActivity),
    /// Quantity with neither a release type nor an end-of-life activity
    Untargeted,
}

/// Classify a quantity-file column. A column with a management type or any
/// end-of-life flag targets an end-of-life activity; without a management
/// type, the column name stands in for it. Declaring a release type as well
/// is rejected since a record can reference only one target.
pub fn classify_column(variant: FileVariant, column: &NeededColumn) -> Result<ColumnRole, ConfigError> {
    if column.is_general_info() {
        return Ok(ColumnRole::General);
    }

    match (&column.release_type, column.targets_end_of_life()) {
        (Some(_), true) => Err(ConfigError::ConflictingTarget {
            file: variant.to_string(),
            column: column.name.clone(),
        }),
        (Some(release_type), false) => Ok(ColumnRole::Release(ReleaseType {
            name: column.name.clone(),
            is_on_site: column
                .is_on_site
                .unwrap_or_else(|| release_type.trim().eq_ignore_ascii_case("on-site")),
        })),
        (None, true) => Ok(ColumnRole::EndOfLife(EndOfLifeActivity {
            name: column.name.clone(),
            management_type: column
                .management_type
                .clone()
                .unwrap_or_else(|| column.name.clone()),
            flags: EndOfLifeFlags {
                is_on_site: column.is_on_site.unwrap_or(false),
                is_hazardous_waste: column.is_hazardous_waste.unwrap_or(false),
                is_metal: column.is_for_metals.unwrap_or(false),
                is_wastewater: column.is_wastewater.unwrap_or(false),
                is_recycling: column.is_recycling.unwrap_or(false),
                is_landfilling: column.is_landfilling.unwrap_or(false),
                is_potw: column.is_potw.unwrap_or(false),
                is_incineration: column.is_incineration.unwrap_or(false),
                is_brokering: column.is_brokering.unwrap_or(false),
            },
        })),
        (None, false) => Ok(ColumnRole::Untargeted),
    }
}

/// Parse a reported quantity. Blank and non-positive values yield `None`;
/// anything that is not a finite number is an error.
pub fn parse_quantity(column: &str, raw: &str) -> Result<Option<f64>, TransformError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: f64 = trimmed
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| TransformError::InvalidQuantity {
            column: column.to_string(),
            value: raw.to_string(),
        })?;

    Ok(Some(value).filter(|v| *v > 0.0))
}

/// Yes/no cells in the activity file
pub fn is_flag_set(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_uppercase().as_str(),
        "YES" | "Y" | "TRUE" | "1" | "X"
    )
}

/// Chemical activities reported per (facility, chemical), built from file 1b
#[derive(Debug, Clone, Default)]
pub struct ActivityIndex {
    entries: HashMap<(String, String), Vec<i64>>,
}

impl ActivityIndex {
    pub fn insert(&mut self, facility_id: &str, chemical_id: &str, activity_id: i64) {
        let ids = self
            .entries
            .entry((facility_id.to_string(), chemical_id.to_string()))
            .or_default();
        if !ids.contains(&activity_id) {
            ids.push(activity_id);
        }
    }

    pub fn get(&self, facility_id: &str, chemical_id: &str) -> &[i64] {
        self.entries
            .get(&(facility_id.to_string(), chemical_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The two remote services used while transforming quantity files
pub struct Enrichers {
    /// Registry id -> NAICS code
    pub registry: Box<dyn KeyLookup>,
    /// NAICS code -> title
    pub naics: Box<dyn KeyLookup>,
    pub max_concurrency: usize,
}

/// Counts reported for one transformed file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub records_created: usize,
    pub activity_links: usize,
}

impl fmt::Display for FileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows read, {} skipped, {} records, {} activity links",
            self.rows_read, self.rows_skipped, self.records_created, self.activity_links
        )
    }
}

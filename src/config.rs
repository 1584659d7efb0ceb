//! Pipeline configuration.
//!
//! One [`MainConfig`] is loaded from YAML at startup and passed by reference
//! to every component that needs it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

/// Environment variable holding the Census API key
pub const CENSUS_API_KEY_VAR: &str = "CENSUS_DATA_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct MainConfig {
    #[serde(default)]
    pub industry_sectors: IndustrySectors,
    pub plastic_additives: PlasticAdditives,
    pub tri_files: TriFiles,
    pub frs_api: FrsApiConfig,
    pub census_api: CensusApiConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub tri_download: DownloadConfig,
}

/// Plastic-related sectors; rows from other generator sectors are skipped
/// when the list is non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndustrySectors {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub naics_code: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlasticAdditives {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tri_chem_id: Vec<AdditiveSeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdditiveSeed {
    pub name: String,
    #[serde(rename = "CASRN")]
    pub casrn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriFiles {
    pub file_1a: FileConfig,
    pub file_1b: FileConfig,
    pub file_3a: FileConfig,
    pub file_3c: FileConfig,
}

impl TriFiles {
    pub fn get(&self, variant: FileVariant) -> &FileConfig {
        match variant {
            FileVariant::File1a => &self.file_1a,
            FileVariant::File1b => &self.file_1b,
            FileVariant::File3a => &self.file_3a,
            FileVariant::File3c => &self.file_3c,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub key_columns: KeyColumns,
    #[serde(default)]
    pub needed_columns: Vec<NeededColumn>,
}

/// Header names of the identifying columns of a file
#[derive(Debug, Clone, Deserialize)]
pub struct KeyColumns {
    pub facility_id: String,
    pub chemical_id: String,
    #[serde(default)]
    pub generator_naics: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    /// Column with the receiving facility's FRS registry id
    #[serde(default)]
    pub handler_registry_id: Option<String>,
    /// NAICS code of the receiving sector when the file implies one
    #[serde(default, alias = "handler_naics")]
    pub fixed_handler_naics: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NeededColumn {
    pub name: String,
    #[serde(default, alias = "relase_type")]
    pub release_type: Option<String>,
    #[serde(default)]
    pub management_type: Option<String>,
    #[serde(default)]
    pub is_on_site: Option<bool>,
    #[serde(default)]
    pub is_hazardous_waste: Option<bool>,
    #[serde(default)]
    pub is_landfilling: Option<bool>,
    #[serde(default)]
    pub is_recycling: Option<bool>,
    #[serde(default)]
    pub is_for_metals: Option<bool>,
    #[serde(default)]
    pub is_wastewater: Option<bool>,
    #[serde(default)]
    pub is_potw: Option<bool>,
    #[serde(default)]
    pub is_brokering: Option<bool>,
    #[serde(default)]
    pub is_incineration: Option<bool>,
    #[serde(default)]
    pub is_general_info: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub depends_on: Option<String>,
}

impl NeededColumn {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_general_info(&self) -> bool {
        self.is_general_info.unwrap_or(false)
    }

    /// Whether the column names a management type or raises any flag that
    /// only an end-of-life activity carries. `is_on_site` is shared with
    /// release types and does not count.
    pub fn targets_end_of_life(&self) -> bool {
        self.management_type.is_some()
            || [
                self.is_hazardous_waste,
                self.is_for_metals,
                self.is_wastewater,
                self.is_recycling,
                self.is_landfilling,
                self.is_potw,
                self.is_incineration,
                self.is_brokering,
            ]
            .into_iter()
            .any(|flag| flag.unwrap_or(false))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrsApiConfig {
    pub base_url: String,
    pub endpoints: FrsEndpoints,
    pub query_parameters: FrsQueryParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrsEndpoints {
    pub frs_facility_site: String,
    pub frs_interest: String,
    pub frs_naics: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrsQueryParameters {
    /// Path segment containing `{frs_registry_id}`
    pub registry_id_equals: String,
    pub join_type: String,
    pub primary_indicator_equals: String,
    pub first_last: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CensusApiConfig {
    pub base_url: String,
    pub year: u16,
    pub dataset: String,
    pub parameters: CensusParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CensusParameters {
    pub get: String,
    #[serde(rename = "for_", alias = "for")]
    pub for_: String,
    /// Query pair containing `{naics_code}`, e.g. `NAICS2017={naics_code}`
    pub naics_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_concurrent_requests() -> usize {
    16
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_base_url")]
    pub base_url: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: default_download_base_url(),
        }
    }
}

fn default_download_base_url() -> String {
    "https://www3.epa.gov/tri/current".to_string()
}

impl MainConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Failed to load config {:?}", path))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: MainConfig = serde_yaml::from_str(raw).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject column declarations that could never produce a valid record
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enrichment.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "enrichment.max_concurrent_requests must be at least 1".into(),
            ));
        }

        for variant in FileVariant::ALL {
            let file = self.tri_files.get(variant);
            let keys = &file.key_columns;
            if keys.handler_registry_id.is_some() && keys.fixed_handler_naics.is_some() {
                return Err(ConfigError::Invalid(format!(
                    "{} sets both handler_registry_id and fixed_handler_naics",
                    variant
                )));
            }

            for column in &file.needed_columns {
                if column.release_type.is_some() && column.targets_end_of_life() {
                    return Err(ConfigError::ConflictingTarget {
                        file: variant.to_string(),
                        column: column.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// The four TRI Basic Plus files this pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileVariant {
    /// Chemical activities and uses
    File1b,
    /// Releases and on-site waste management
    File1a,
    /// Off-site transfers
    File3a,
    /// Transfers to publicly owned treatment works
    File3c,
}

impl FileVariant {
    /// Processing order: 1b defines the activities the others link to
    pub const ALL: [FileVariant; 4] = [
        FileVariant::File1b,
        FileVariant::File1a,
        FileVariant::File3a,
        FileVariant::File3c,
    ];

    pub fn file_type(&self) -> &'static str {
        match self {
            FileVariant::File1a => "1a",
            FileVariant::File1b => "1b",
            FileVariant::File3a => "3a",
            FileVariant::File3c => "3c",
        }
    }

    /// Name of the tab-separated file for a reporting year
    pub fn file_name(&self, year: u16) -> String {
        format!("US_{}_{}.txt", self.file_type(), year)
    }

    /// Name of the zip archive published for a reporting year
    pub fn archive_name(&self, year: u16) -> String {
        format!("US_{}_{}.zip", self.file_type(), year)
    }
}

impl fmt::Display for FileVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.file_type())
    }
}

impl FromStr for FileVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let short = normalized.strip_prefix("file_").unwrap_or(&normalized);
        FileVariant::ALL
            .into_iter()
            .find(|v| v.file_type() == short)
            .ok_or_else(|| ConfigError::UnknownFile(s.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_YAML: &str = r#"
industry_sectors:
  description: Plastics product manufacturing
  naics_code: ["326"]
plastic_additives:
  description: Plastic additives
  tri_chem_id:
    - name: Additive A
      CASRN: "123-45-6"
tri_files:
  file_1a:
    key_columns:
      facility_id: TRIFD
      chemical_id: CASRN
      generator_naics: PRIMARY NAICS
      unit: UNIT
    needed_columns:
      - name: Recycling
        management_type: Recycling
        is_recycling: true
      - name: Fugitive air
        relase_type: on-site
  file_1b:
    key_columns:
      facility_id: TRIFD
      chemical_id: CASRN
    needed_columns:
      - name: TRIFD
        is_general_info: true
      - name: Manufacture
      - name: Produce
        depends_on: Manufacture
  file_3a:
    key_columns:
      facility_id: TRIFD
      chemical_id: CASRN
      generator_naics: PRIMARY NAICS
      unit: UNIT
      handler_registry_id: OFF-SITE FRS ID
  file_3c:
    key_columns:
      facility_id: TRIFD
      chemical_id: CASRN
      generator_naics: PRIMARY NAICS
      unit: UNIT
      fixed_handler_naics: "221320"
frs_api:
  base_url: https://frs.example
  endpoints:
    frs_facility_site: frs_facility_site
    frs_interest: frs_interest
    frs_naics: frs_naics
  query_parameters:
    registry_id_equals: registry_id/=/{frs_registry_id}
    join_type: join
    primary_indicator_equals: primary_indicator/=/Y
    first_last: rows/0:1
    format: JSON
census_api:
  base_url: https://census.example/data
  year: 2017
  dataset: cbp
  parameters:
    get: NAICS2017_LABEL
    for_: us:*
    naics_code: NAICS2017={naics_code}
"#;

    #[test]
    fn test_parse_sample() {
        let config = MainConfig::from_yaml_str(SAMPLE_YAML).unwrap();
        assert_eq!(config.plastic_additives.tri_chem_id[0].casrn, "123-45-6");
        assert_eq!(
            config.tri_files.file_1a.needed_columns[1].release_type.as_deref(),
            Some("on-site")
        );
        assert_eq!(config.enrichment.max_concurrent_requests, 16);
        assert_eq!(config.census_api.parameters.for_, "us:*");
        assert_eq!(config.tri_download.base_url, "https://www3.epa.gov/tri/current");
    }

    #[test]
    fn test_conflicting_target_is_rejected() {
        let yaml = SAMPLE_YAML.replace(
            "        relase_type: on-site",
            "        relase_type: on-site\n        management_type: Disposal",
        );
        let err = MainConfig::from_yaml_str(&yaml).unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(config_err, ConfigError::ConflictingTarget { .. }));

        let flagged = SAMPLE_YAML.replace(
            "        relase_type: on-site",
            "        relase_type: on-site\n        is_potw: true",
        );
        assert!(MainConfig::from_yaml_str(&flagged).is_err());
    }

    #[test]
    fn test_file_variant_parsing_and_names() {
        assert_eq!("1b".parse::<FileVariant>().unwrap(), FileVariant::File1b);
        assert_eq!("file_3C".parse::<FileVariant>().unwrap(), FileVariant::File3c);
        assert!("2a".parse::<FileVariant>().is_err());
        assert_eq!(FileVariant::File1a.file_name(2022), "US_1a_2022.txt");
        assert_eq!(FileVariant::File3a.archive_name(2022), "US_3a_2022.zip");
    }
}

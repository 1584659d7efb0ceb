//! Application-level views of the reference and fact rows

use rusqlite::types::Value;

use crate::store::text;

/// What a fact row is about. A record points at an end-of-life activity or
/// a release type, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTarget {
    EndOfLife(i64),
    Release(i64),
    None,
}

impl RecordTarget {
    /// `(end_of_life_activity_id, release_type_id)`
    pub fn foreign_keys(&self) -> (Option<i64>, Option<i64>) {
        match *self {
            RecordTarget::EndOfLife(id) => (Some(id), None),
            RecordTarget::Release(id) => (None, Some(id)),
            RecordTarget::None => (None, None),
        }
    }

    /// Rebuild from persisted columns; `None` when both are set
    pub fn from_foreign_keys(end_of_life: Option<i64>, release: Option<i64>) -> Option<Self> {
        match (end_of_life, release) {
            (Some(id), None) => Some(RecordTarget::EndOfLife(id)),
            (None, Some(id)) => Some(RecordTarget::Release(id)),
            (None, None) => Some(RecordTarget::None),
            (Some(_), Some(_)) => None,
        }
    }
}

/// A fact row ready to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub additive_id: i64,
    pub generator_sector_id: i64,
    pub handler_sector_id: Option<i64>,
    /// Kilograms
    pub amount: f64,
    pub target: RecordTarget,
}

/// A fact row read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub additive_id: i64,
    pub generator_sector_id: i64,
    pub handler_sector_id: Option<i64>,
    pub amount: f64,
    pub target: RecordTarget,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndOfLifeFlags {
    pub is_on_site: bool,
    pub is_hazardous_waste: bool,
    pub is_metal: bool,
    pub is_wastewater: bool,
    pub is_recycling: bool,
    pub is_landfilling: bool,
    pub is_potw: bool,
    pub is_incineration: bool,
    pub is_brokering: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfLifeActivity {
    pub name: String,
    pub management_type: String,
    pub flags: EndOfLifeFlags,
}

impl EndOfLifeActivity {
    pub fn key(&self) -> [(&'static str, Value); 1] {
        [("name", text(&self.name))]
    }

    pub fn attributes(&self) -> [(&'static str, Value); 10] {
        let f = &self.flags;
        [
            ("management_type", text(&self.management_type)),
            ("is_on_site", f.is_on_site.into()),
            ("is_hazardous_waste", f.is_hazardous_waste.into()),
            ("is_metal", f.is_metal.into()),
            ("is_wastewater", f.is_wastewater.into()),
            ("is_recycling", f.is_recycling.into()),
            ("is_landfilling", f.is_landfilling.into()),
            ("is_potw", f.is_potw.into()),
            ("is_incineration", f.is_incineration.into()),
            ("is_brokering", f.is_brokering.into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseType {
    pub name: String,
    pub is_on_site: bool,
}

impl ReleaseType {
    pub fn key(&self) -> [(&'static str, Value); 1] {
        [("name", text(&self.name))]
    }

    pub fn attributes(&self) -> [(&'static str, Value); 1] {
        [("is_on_site", self.is_on_site.into())]
    }
}

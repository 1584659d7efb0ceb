//! Table schema definitions for the TRI plastic additive database

use super::types::*;

// =============================================================================
// Independent Tables (no FK dependencies)
// =============================================================================

pub static ADDITIVE: TableSchema = TableSchema {
    name: "additive",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("name", ColumnType::Text),
        Column::required("tri_chemical_id", ColumnType::Text),
    ],
    foreign_keys: &[],
    unique: &[&["name"], &["tri_chemical_id"]],
};

pub static INDUSTRY_SECTOR: TableSchema = TableSchema {
    name: "industry_sector",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("naics_code", ColumnType::Text),
        Column::new("naics_title", ColumnType::Text),
    ],
    foreign_keys: &[],
    unique: &[&["naics_code"]],
};

/// Self-referential: activities form a forest through the parent id.
pub static CHEMICAL_ACTIVITY: TableSchema = TableSchema {
    name: "chemical_activity",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("name", ColumnType::Text),
        Column::new("description", ColumnType::Text),
        Column::new("parent_chemical_activity_id", ColumnType::Integer),
    ],
    foreign_keys: &[ForeignKey::new(
        "parent_chemical_activity_id",
        "chemical_activity",
    )],
    unique: &[&["name"]],
};

pub static END_OF_LIFE_ACTIVITY: TableSchema = TableSchema {
    name: "end_of_life_activity",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("name", ColumnType::Text),
        Column::required("management_type", ColumnType::Text),
        Column::required("is_on_site", ColumnType::Boolean),
        Column::required("is_hazardous_waste", ColumnType::Boolean),
        Column::required("is_metal", ColumnType::Boolean),
        Column::required("is_wastewater", ColumnType::Boolean),
        Column::required("is_recycling", ColumnType::Boolean),
        Column::required("is_landfilling", ColumnType::Boolean),
        Column::required("is_potw", ColumnType::Boolean),
        Column::required("is_incineration", ColumnType::Boolean),
        Column::required("is_brokering", ColumnType::Boolean),
    ],
    foreign_keys: &[],
    unique: &[&["name"]],
};

pub static RELEASE_TYPE: TableSchema = TableSchema {
    name: "release_type",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("name", ColumnType::Text),
        Column::required("is_on_site", ColumnType::Boolean),
    ],
    foreign_keys: &[],
    unique: &[&["name"]],
};

pub static CONSUMER_COMMERCIAL_FUNCTION_CATEGORY: TableSchema = TableSchema {
    name: "consumer_commercial_function_category",
    primary_key: PrimaryKey::Surrogate,
    columns: &[Column::required("name", ColumnType::Text)],
    foreign_keys: &[],
    unique: &[&["name"]],
};

pub static CONSUMER_COMMERCIAL_PRODUCT_CATEGORY: TableSchema = TableSchema {
    name: "consumer_commercial_product_category",
    primary_key: PrimaryKey::Surrogate,
    columns: &[Column::required("name", ColumnType::Text)],
    foreign_keys: &[],
    unique: &[&["name"]],
};

pub static INDUSTRIAL_TYPE_OF_PROCESS_OR_USE: TableSchema = TableSchema {
    name: "industrial_type_of_process_or_use",
    primary_key: PrimaryKey::Surrogate,
    columns: &[Column::required("name", ColumnType::Text)],
    foreign_keys: &[],
    unique: &[&["name"]],
};

pub static INDUSTRY_FUNCTION_CATEGORY: TableSchema = TableSchema {
    name: "industry_function_category",
    primary_key: PrimaryKey::Surrogate,
    columns: &[Column::required("name", ColumnType::Text)],
    foreign_keys: &[],
    unique: &[&["name"]],
};

pub static INDUSTRY_USE_SECTOR: TableSchema = TableSchema {
    name: "industry_use_sector",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("code", ColumnType::Text),
        Column::new("name", ColumnType::Text),
    ],
    foreign_keys: &[],
    unique: &[&["code"]],
};

// =============================================================================
// Level 1 Dependencies
// =============================================================================

/// Crosswalk between industry use sectors and NAICS code revisions
pub static INDUSTRY_USE_SECTOR_NAICS: TableSchema = TableSchema {
    name: "industry_use_sector_naics",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("naics_code_2007", ColumnType::Text),
        Column::required("industry_use_sector_id", ColumnType::Integer),
        Column::new("naics_code_2012", ColumnType::Text),
        Column::new("naics_code_2017", ColumnType::Text),
        Column::new("naics_code_2022", ColumnType::Text),
        Column::new("industry_sector_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("industry_use_sector_id", "industry_use_sector"),
        ForeignKey::new("industry_sector_id", "industry_sector"),
    ],
    unique: &[&["naics_code_2007"]],
};

pub static CONSUMER_COMMERCIAL_USE: TableSchema = TableSchema {
    name: "consumer_commercial_use",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("additive_id", ColumnType::Integer),
        Column::required("industry_sector_id", ColumnType::Integer),
        Column::new("product_category_id", ColumnType::Integer),
        Column::new("function_category_id", ColumnType::Integer),
        Column::new("type_of_use", ColumnType::Text),
        Column::new("percentage", ColumnType::Real),
    ],
    foreign_keys: &[
        ForeignKey::new("additive_id", "additive"),
        ForeignKey::new("industry_sector_id", "industry_sector"),
        ForeignKey::new("product_category_id", "consumer_commercial_product_category"),
        ForeignKey::new("function_category_id", "consumer_commercial_function_category"),
    ],
    unique: &[],
};

pub static INDUSTRIAL_USE: TableSchema = TableSchema {
    name: "industrial_use",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("additive_id", ColumnType::Integer),
        Column::new("industrial_type_of_process_or_use_id", ColumnType::Integer),
        Column::new("industry_function_category_id", ColumnType::Integer),
        Column::new("percentage", ColumnType::Real),
        Column::new("industry_use_sector_id", ColumnType::Integer),
        Column::new("industry_sector_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("additive_id", "additive"),
        ForeignKey::new(
            "industrial_type_of_process_or_use_id",
            "industrial_type_of_process_or_use",
        ),
        ForeignKey::new("industry_function_category_id", "industry_function_category"),
        ForeignKey::new("industry_use_sector_id", "industry_use_sector"),
        ForeignKey::new("industry_sector_id", "industry_sector"),
    ],
    unique: &[],
};

/// Fact table. At most one of `end_of_life_activity_id` and
/// `release_type_id` is set; the database does not enforce it.
pub static RECORD: TableSchema = TableSchema {
    name: "record",
    primary_key: PrimaryKey::Surrogate,
    columns: &[
        Column::required("additive_id", ColumnType::Integer),
        Column::required("waste_generator_industry_sector_id", ColumnType::Integer),
        Column::required("amount", ColumnType::Real),
        Column::new("end_of_life_activity_id", ColumnType::Integer),
        Column::new("release_type_id", ColumnType::Integer),
        Column::new("waste_handler_industry_sector_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("additive_id", "additive"),
        ForeignKey::new("waste_generator_industry_sector_id", "industry_sector"),
        ForeignKey::new("end_of_life_activity_id", "end_of_life_activity"),
        ForeignKey::new("release_type_id", "release_type"),
        ForeignKey::new("waste_handler_industry_sector_id", "industry_sector"),
    ],
    unique: &[],
};

// =============================================================================
// Level 2 Dependencies
// =============================================================================

pub static RECORD_CHEMICAL_ACTIVITY: TableSchema = TableSchema {
    name: "record_chemical_activity",
    primary_key: PrimaryKey::Composite(&["record_id", "chemical_activity_id"]),
    columns: &[
        Column::required("record_id", ColumnType::Integer),
        Column::required("chemical_activity_id", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("record_id", "record"),
        ForeignKey::new("chemical_activity_id", "chemical_activity"),
    ],
    unique: &[],
};

/// All tables in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[
    &ADDITIVE,
    &INDUSTRY_SECTOR,
    &CHEMICAL_ACTIVITY,
    &END_OF_LIFE_ACTIVITY,
    &RELEASE_TYPE,
    &CONSUMER_COMMERCIAL_FUNCTION_CATEGORY,
    &CONSUMER_COMMERCIAL_PRODUCT_CATEGORY,
    &INDUSTRIAL_TYPE_OF_PROCESS_OR_USE,
    &INDUSTRY_FUNCTION_CATEGORY,
    &INDUSTRY_USE_SECTOR,
    &INDUSTRY_USE_SECTOR_NAICS,
    &CONSUMER_COMMERCIAL_USE,
    &INDUSTRIAL_USE,
    &RECORD,
    &RECORD_CHEMICAL_ACTIVITY,
];

/// Get a table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

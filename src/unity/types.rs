use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response from listing tables in a schema
#[derive(Debug, Deserialize)]
pub struct ListTablesResponse {
    pub tables: Option<Vec<TableInfo>>,
}

/// Basic table information from list operation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub catalog_name: String,
    pub schema_name: String,
    pub table_type: String, // MANAGED, EXTERNAL, VIEW
    #[serde(default)]
    pub data_source_format: String, // DELTA
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl TableInfo {
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.catalog_name, self.schema_name, self.name)
    }

    /// Managed or external Delta table (not a view)
    pub fn is_base_delta_table(&self) -> bool {
        matches!(self.table_type.as_str(), "MANAGED" | "EXTERNAL")
            && self.data_source_format == "DELTA"
    }
}

/// Detailed table metadata from get operation
#[derive(Debug, Clone, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    pub catalog_name: String,
    pub schema_name: String,
    pub table_type: String,
    #[serde(default)]
    pub data_source_format: String,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub storage_location: Option<String>,
    #[serde(default)]
    pub table_constraints: Vec<TableConstraint>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Column information
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub type_text: String, // Full type definition
    pub type_name: String, // "bigint", "string", "timestamp", etc.
    pub position: i32,
    #[serde(default)]
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// One entry of `table_constraints`; exactly one member is set
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableConstraint {
    #[serde(default)]
    pub primary_key_constraint: Option<PrimaryKeyConstraint>,
    #[serde(default)]
    pub foreign_key_constraint: Option<ForeignKeyConstraint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryKeyConstraint {
    pub name: String,
    pub child_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForeignKeyConstraint {
    pub name: String,
    pub child_columns: Vec<String>,
    /// Three-part name of the referenced table
    pub parent_table: String,
    pub parent_columns: Vec<String>,
}

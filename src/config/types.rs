use crate::catalog::{ForeignKeyDescriptor, TableFilter};
use crate::schema::planner::{BelongsToNaming, PlannerOptions, ID_FIELD};

use serde::{Deserialize, Serialize};

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Databricks workspace the tables were discovered in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databricks: Option<DatabricksConfig>,
}

/// Storage backend serving rows and catalog metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Delta,
    /// Catalog from Unity Catalog constraints, rows from the registered tables
    Unity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: Backend,

    /// SQLite database file (sqlite only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Registered tables (delta and unity)
    #[serde(default, rename = "table", skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableConfig>,

    /// Declared relations between registered tables (delta only)
    #[serde(default, rename = "relation", skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationConfig>,
}

/// A table registered by location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,

    /// Delta table URI or a `.csv` file path
    pub location: String,
}

/// A declared foreign key: `table.column → references_table.references_column`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationConfig {
    pub table: String,
    pub column: String,
    pub references_table: String,

    #[serde(default = "default_references_column")]
    pub references_column: String,
}

fn default_references_column() -> String {
    ID_FIELD.to_string()
}

impl RelationConfig {
    pub fn to_descriptor(&self) -> ForeignKeyDescriptor {
        ForeignKeyDescriptor::new(
            &self.table,
            &self.column,
            &self.references_table,
            &self.references_column,
        )
    }
}

/// Reflection scope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Tables hidden in addition to system and migration tables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl CatalogConfig {
    pub fn filter(&self) -> TableFilter {
        TableFilter::new(self.exclude.clone())
    }
}

/// Field naming conventions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default)]
    pub belongs_to: BelongsToNaming,

    /// Let a relation field replace a colliding column field
    #[serde(default)]
    pub relation_shadowing: bool,
}

impl NamingConfig {
    pub fn planner_options(&self) -> PlannerOptions {
        PlannerOptions {
            belongs_to_naming: self.belongs_to,
            relation_shadowing: self.relation_shadowing,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind the server to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Interface to bind the server to
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_port() -> u16 {
    4000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

/// Databricks connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabricksConfig {
    /// Databricks workspace URL (e.g., "https://dbc-xxx-yyy.cloud.databricks.com")
    pub host: String,
    // Token is read from DATABRICKS_TOKEN environment variable

    /// Unity Catalog the tables live in (required by the unity backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl DatabricksConfig {
    /// `(catalog, schema)` when both are set
    pub fn scope(&self) -> Option<(&str, &str)> {
        self.catalog.as_deref().zip(self.schema.as_deref())
    }
}

impl Config {
    /// SQLite config pointing at `path`
    pub fn sqlite(path: &str) -> Self {
        Self {
            database: DatabaseConfig {
                backend: Backend::Sqlite,
                path: Some(path.to_string()),
                tables: Vec::new(),
                relations: Vec::new(),
            },
            catalog: CatalogConfig::default(),
            naming: NamingConfig::default(),
            server: ServerConfig::default(),
            databricks: None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.database.backend {
            Backend::Sqlite => {
                if self.database.path.as_deref().map_or(true, str::is_empty) {
                    return Err("The sqlite backend requires 'database.path'".to_string());
                }
                if !self.database.tables.is_empty() || !self.database.relations.is_empty() {
                    return Err(
                        "The sqlite backend reads tables and relations from the database itself"
                            .to_string(),
                    );
                }
            }
            Backend::Delta => self.database.validate_tables()?,
            Backend::Unity => {
                self.database.validate_tables()?;
                if !self.database.relations.is_empty() {
                    return Err(
                        "The unity backend reads relations from Unity Catalog constraints"
                            .to_string(),
                    );
                }
                if self.databricks.as_ref().and_then(DatabricksConfig::scope).is_none() {
                    return Err(
                        "The unity backend requires [databricks] host, catalog and schema"
                            .to_string(),
                    );
                }
            }
        }

        if let Some(ref databricks) = self.databricks {
            if !databricks.host.starts_with("http://") && !databricks.host.starts_with("https://") {
                return Err(format!(
                    "Databricks host '{}' must be a valid URL (http:// or https://)",
                    databricks.host
                ));
            }
        }

        Ok(())
    }
}

impl DatabaseConfig {
    fn validate_tables(&self) -> Result<(), String> {
        if self.tables.is_empty() {
            return Err("The delta and unity backends require at least one [[database.table]]".to_string());
        }

        for (index, table) in self.tables.iter().enumerate() {
            if table.name.is_empty() || table.location.is_empty() {
                return Err(format!("Table #{} needs both a name and a location", index + 1));
            }
            if self.tables[..index].iter().any(|t| t.name == table.name) {
                return Err(format!("Table '{}' is declared twice", table.name));
            }
        }

        let declared = |name: &str| self.tables.iter().any(|t| t.name == name);
        for relation in &self.relations {
            if !declared(&relation.table) {
                return Err(format!(
                    "Relation {}.{} is on undeclared table '{}'",
                    relation.table, relation.column, relation.table
                ));
            }
            if !declared(&relation.references_table) {
                return Err(format!(
                    "Relation {}.{} references undeclared table '{}'",
                    relation.table, relation.column, relation.references_table
                ));
            }
        }

        Ok(())
    }
}

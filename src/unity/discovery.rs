//! Catalog discovery from Unity Catalog
//!
//! Unity Catalog reports informational primary and foreign key constraints
//! per table. Single-column foreign keys become catalog relations; the
//! referenced table's three-part name is reduced to its last segment.

use crate::catalog::{Catalog, CatalogReader, ColumnDescriptor, ForeignKeyDescriptor, TableFilter};
use crate::config::{
    Backend, CatalogConfig, Config, DatabaseConfig, DatabricksConfig, NamingConfig,
    RelationConfig, ServerConfig, TableConfig,
};
use crate::error::Result;
use crate::unity::types::TableMetadata;
use crate::unity::UnityClient;

use async_trait::async_trait;

/// A table found in Unity Catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTable {
    pub name: String,
    pub full_name: String,
    pub storage_location: Option<String>,
}

/// Result of scanning one schema
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub tables: Vec<DiscoveredTable>,
    pub catalog: Catalog,
    /// `(catalog, schema)` that was scanned
    pub scope: (String, String),
}

impl Discovery {
    /// Delta-backend configuration registering every discovered table by location
    pub fn to_config(&self, host: &str) -> Config {
        let mut tables = Vec::new();
        for table in &self.tables {
            match &table.storage_location {
                Some(location) => tables.push(TableConfig {
                    name: table.name.clone(),
                    location: location.clone(),
                }),
                None => tracing::warn!("Skipping {}: no storage location", table.full_name),
            }
        }

        let declared = |name: &str| tables.iter().any(|t: &TableConfig| t.name == name);
        let relations = self
            .catalog
            .foreign_keys
            .iter()
            .filter(|fk| {
                let keep = declared(&fk.table_name) && declared(&fk.referenced_table_name);
                if !keep {
                    tracing::warn!(
                        "Skipping relation {}.{} → {}: table not registered",
                        fk.table_name,
                        fk.column_name,
                        fk.referenced_table_name
                    );
                }
                keep
            })
            .map(|fk| RelationConfig {
                table: fk.table_name.clone(),
                column: fk.column_name.clone(),
                references_table: fk.referenced_table_name.clone(),
                references_column: fk.referenced_column_name.clone(),
            })
            .collect();

        Config {
            database: DatabaseConfig {
                backend: Backend::Delta,
                path: None,
                tables,
                relations,
            },
            catalog: CatalogConfig::default(),
            naming: NamingConfig::default(),
            server: ServerConfig::default(),
            databricks: Some(DatabricksConfig {
                host: host.to_string(),
                catalog: Some(self.scope.0.clone()),
                schema: Some(self.scope.1.clone()),
            }),
        }
    }
}

/// Scan `catalog.schema` for Delta tables, their columns and their relations
pub async fn discover(client: &UnityClient, catalog: &str, schema: &str) -> Result<Discovery> {
    let tables = client.list_tables(catalog, schema).await?;

    let mut discovery = Discovery {
        scope: (catalog.to_string(), schema.to_string()),
        ..Discovery::default()
    };

    for table in tables {
        if !table.is_base_delta_table() {
            tracing::warn!(
                "Skipping {} (type: {}, format: {})",
                table.full_name(),
                table.table_type,
                table.data_source_format
            );
            continue;
        }

        let full_name = table.full_name();
        let metadata = client.get_table(&full_name).await?;

        let (columns, foreign_keys) = table_catalog(&metadata);
        discovery.catalog.columns.extend(columns);
        discovery.catalog.foreign_keys.extend(foreign_keys);

        discovery.tables.push(DiscoveredTable {
            name: table.name,
            full_name,
            storage_location: table.storage_location.or(metadata.storage_location),
        });
    }

    tracing::info!(
        "Discovered {} tables in {}.{}",
        discovery.tables.len(),
        catalog,
        schema
    );
    Ok(discovery)
}

/// Columns in position order and single-column foreign keys of one table
fn table_catalog(metadata: &TableMetadata) -> (Vec<ColumnDescriptor>, Vec<ForeignKeyDescriptor>) {
    let mut columns = metadata.columns.clone();
    columns.sort_by_key(|c| c.position);

    let columns = columns
        .iter()
        .map(|c| ColumnDescriptor::new(&metadata.name, &c.name, &c.type_name))
        .collect();

    let mut foreign_keys = Vec::new();
    for fk in metadata
        .table_constraints
        .iter()
        .filter_map(|c| c.foreign_key_constraint.as_ref())
    {
        let (Some(child), Some(parent), 1, 1) = (
            fk.child_columns.first(),
            fk.parent_columns.first(),
            fk.child_columns.len(),
            fk.parent_columns.len(),
        ) else {
            tracing::warn!("Skipping composite foreign key {} on {}", fk.name, metadata.name);
            continue;
        };

        let parent_table = fk.parent_table.rsplit('.').next().unwrap_or(&fk.parent_table);
        foreign_keys.push(ForeignKeyDescriptor::new(&metadata.name, child, parent_table, parent));
    }

    (columns, foreign_keys)
}

/// [`CatalogReader`] over one Unity Catalog schema
pub struct UnityCatalogReader {
    client: UnityClient,
    catalog: String,
    schema: String,
    filter: TableFilter,
    /// Only these tables are reflected, when set
    tables: Option<Vec<String>>,
}

impl UnityCatalogReader {
    pub fn new(client: UnityClient, catalog: &str, schema: &str) -> Self {
        Self {
            client,
            catalog: catalog.to_string(),
            schema: schema.to_string(),
            filter: TableFilter::default(),
            tables: None,
        }
    }

    pub fn with_filter(mut self, filter: TableFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Restrict reflection to the tables rows can be fetched from.
    /// Foreign keys into other tables are kept and fail model integrity.
    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = Some(tables);
        self
    }
}

#[async_trait]
impl CatalogReader for UnityCatalogReader {
    async fn read(&self) -> Result<Catalog> {
        let discovery = discover(&self.client, &self.catalog, &self.schema).await?;
        let catalog = match self.tables {
            Some(ref tables) => discovery.catalog.retain_tables(tables),
            None => discovery.catalog,
        };
        Ok(catalog.finalize(&self.filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unity::types::{ColumnInfo, ForeignKeyConstraint, TableConstraint};

    fn column(name: &str, type_name: &str, position: i32) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            type_text: type_name.to_lowercase(),
            type_name: type_name.to_string(),
            position,
            nullable: true,
            comment: None,
        }
    }

    fn orders_metadata(constraints: Vec<TableConstraint>) -> TableMetadata {
        TableMetadata {
            name: "orders".to_string(),
            catalog_name: "main".to_string(),
            schema_name: "sales".to_string(),
            table_type: "MANAGED".to_string(),
            data_source_format: "DELTA".to_string(),
            columns: vec![
                column("customer_id", "LONG", 1),
                column("id", "LONG", 0),
                column("note", "STRING", 2),
            ],
            storage_location: Some("s3://bucket/orders".to_string()),
            table_constraints: constraints,
            comment: None,
        }
    }

    fn fk(child: &[&str], parent_table: &str, parent: &[&str]) -> TableConstraint {
        TableConstraint {
            primary_key_constraint: None,
            foreign_key_constraint: Some(ForeignKeyConstraint {
                name: "fk".to_string(),
                child_columns: child.iter().map(|s| s.to_string()).collect(),
                parent_table: parent_table.to_string(),
                parent_columns: parent.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    #[test]
    fn test_columns_follow_position() {
        let (columns, _) = table_catalog(&orders_metadata(vec![]));
        let names: Vec<&str> = columns.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["id", "customer_id", "note"]);
        assert_eq!(columns[0].declared_type, "LONG");
    }

    #[test]
    fn test_foreign_key_parent_reduced_to_table_name() {
        let (_, foreign_keys) = table_catalog(&orders_metadata(vec![fk(
            &["customer_id"],
            "main.sales.customers",
            &["id"],
        )]));

        assert_eq!(
            foreign_keys,
            vec![ForeignKeyDescriptor::new("orders", "customer_id", "customers", "id")]
        );
    }

    #[test]
    fn test_composite_foreign_keys_are_skipped() {
        let (_, foreign_keys) = table_catalog(&orders_metadata(vec![fk(
            &["customer_id", "note"],
            "main.sales.customers",
            &["id", "region"],
        )]));

        assert!(foreign_keys.is_empty());
    }

    #[test]
    fn test_to_config_registers_tables_and_relations() {
        let discovery = Discovery {
            tables: vec![
                DiscoveredTable {
                    name: "customers".to_string(),
                    full_name: "main.sales.customers".to_string(),
                    storage_location: Some("s3://bucket/customers".to_string()),
                },
                DiscoveredTable {
                    name: "orders".to_string(),
                    full_name: "main.sales.orders".to_string(),
                    storage_location: Some("s3://bucket/orders".to_string()),
                },
            ],
            catalog: Catalog::new(
                vec![],
                vec![
                    ForeignKeyDescriptor::new("orders", "customer_id", "customers", "id"),
                    ForeignKeyDescriptor::new("orders", "region_id", "regions", "id"),
                ],
            ),
            scope: ("main".to_string(), "sales".to_string()),
        };

        let config = discovery.to_config("https://test.databricks.com");
        assert!(config.validate().is_ok());
        assert_eq!(config.database.tables.len(), 2);
        assert_eq!(config.database.relations.len(), 1);
        assert_eq!(config.database.relations[0].references_table, "customers");

        let databricks = config.databricks.unwrap();
        assert_eq!(databricks.scope(), Some(("main", "sales")));
    }

    #[tokio::test]
    async fn test_reader_unreachable_host_is_connectivity_error() {
        let client = UnityClient::new("http://127.0.0.1:9".to_string(), "token".to_string()).unwrap();
        let reader = UnityCatalogReader::new(client, "main", "sales")
            .with_filter(TableFilter::new(vec!["audit".to_string()]))
            .with_tables(vec!["orders".to_string()]);

        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, crate::error::GraphOrmError::Connectivity(_)));
    }
}

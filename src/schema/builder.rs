//! GraphQL schema builder
//!
//! This module provides the `SchemaBuilder` which compiles a catalog into a
//! type graph and an executable dynamic schema. The result is built once per
//! builder and reused for every query.

use crate::catalog::{Catalog, CatalogReader};
use crate::config::{Backend, Config, RelationConfig};
use crate::error::{GraphOrmError, Result};
use crate::schema::dump;
use crate::schema::graph::{FieldKind, TypeGraph, QUERY_TYPE};
use crate::schema::model::SchemaModel;
use crate::schema::planner::{plan_all, PlannerOptions};
use crate::schema::resolver::{belongs_to_field, has_many_field, root_list_field, scalar_field};
use crate::store::{DeltaStore, SharedFetcher, SqliteStore};
use crate::unity::{UnityCatalogReader, UnityClient};

use async_graphql::dynamic::{DynamicRequest, Object, Schema};
use async_graphql::Response;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A compiled API: the type graph and the schema executing against it
#[derive(Clone)]
pub struct GeneratedApi {
    graph: Arc<TypeGraph>,
    schema: Schema,
}

impl GeneratedApi {
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Execute one GraphQL request
    pub async fn execute(&self, request: impl Into<DynamicRequest>) -> Response {
        self.schema.execute(request).await
    }

    /// Deterministic textual rendering of the type graph
    pub fn dump(&self) -> String {
        dump::dump(&self.graph)
    }
}

/// Schema builder for generating GraphQL schemas from catalog metadata
pub struct SchemaBuilder {
    reader: Arc<dyn CatalogReader>,
    fetcher: SharedFetcher,
    options: PlannerOptions,
    api: OnceCell<GeneratedApi>,
}

impl SchemaBuilder {
    pub fn new(reader: Arc<dyn CatalogReader>, fetcher: SharedFetcher) -> Self {
        Self {
            reader,
            fetcher,
            options: PlannerOptions::default(),
            api: OnceCell::new(),
        }
    }

    /// Open the configured backend and prepare a builder over it
    pub async fn from_config(config: &Config) -> Result<Self> {
        let filter = config.catalog.filter();

        let builder = match config.database.backend {
            Backend::Sqlite => {
                let path = config.database.path.as_deref().ok_or_else(|| {
                    GraphOrmError::Config("The sqlite backend requires 'database.path'".to_string())
                })?;
                let store = Arc::new(SqliteStore::open(path)?.with_filter(filter));
                Self::new(store.clone(), store)
            }
            Backend::Delta => {
                let relations = config
                    .database
                    .relations
                    .iter()
                    .map(RelationConfig::to_descriptor)
                    .collect();
                let store = registered_tables(
                    config,
                    DeltaStore::new().with_filter(filter).with_relations(relations),
                )
                .await?;
                let store = Arc::new(store);
                Self::new(store.clone(), store)
            }
            Backend::Unity => {
                let (host, catalog, schema) = config
                    .databricks
                    .as_ref()
                    .and_then(|d| d.scope().map(|(catalog, schema)| (&d.host, catalog, schema)))
                    .ok_or_else(|| {
                        GraphOrmError::Config(
                            "The unity backend requires [databricks] host, catalog and schema"
                                .to_string(),
                        )
                    })?;

                let tables = config.database.tables.iter().map(|t| t.name.clone()).collect();
                let reader = UnityCatalogReader::new(UnityClient::from_env(host)?, catalog, schema)
                    .with_filter(filter)
                    .with_tables(tables);
                let store = registered_tables(config, DeltaStore::new()).await?;
                Self::new(Arc::new(reader), Arc::new(store))
            }
        };

        Ok(builder.with_options(config.naming.planner_options()))
    }

    pub fn with_options(mut self, options: PlannerOptions) -> Self {
        self.options = options;
        self
    }

    /// Read the catalog and compile it, or return the already compiled API
    ///
    /// A failed build is not cached; the next call retries.
    pub async fn build(&self) -> Result<GeneratedApi> {
        self.api
            .get_or_try_init(|| async {
                let catalog = self.reader.read().await?;
                build_api(catalog, Arc::clone(&self.fetcher), self.options)
            })
            .await
            .cloned()
    }
}

async fn registered_tables(config: &Config, mut store: DeltaStore) -> Result<DeltaStore> {
    for table in &config.database.tables {
        store
            .register_table_from_path(&table.name, &table.location)
            .await?;
    }
    Ok(store)
}

/// Compile a catalog into an executable API
pub fn build_api(
    catalog: Catalog,
    fetcher: SharedFetcher,
    options: PlannerOptions,
) -> Result<GeneratedApi> {
    let model = SchemaModel::new(catalog)?;
    if model.is_empty() {
        return Err(GraphOrmError::Build(
            "catalog contains no tables to expose".to_string(),
        ));
    }

    let plans = plan_all(&model, options)?;
    let graph = TypeGraph::build(&plans)?;
    let schema = executable_schema(&graph, fetcher)?;

    tracing::info!(
        "Built GraphQL schema with {} types and {} root fields",
        graph.types().len(),
        graph.root_fields().len()
    );

    Ok(GeneratedApi {
        graph: Arc::new(graph),
        schema,
    })
}

/// Turn a finalized type graph into a dynamic schema
fn executable_schema(graph: &TypeGraph, fetcher: SharedFetcher) -> Result<Schema> {
    let mut builder = Schema::build(QUERY_TYPE, None, None);

    for object_type in graph.types() {
        let mut object = Object::new(&object_type.name)
            .description(format!("A row of table `{}`", object_type.table));

        for field in &object_type.fields {
            let graphql_field = match &field.kind {
                FieldKind::Scalar { column, kind } => scalar_field(&field.name, column, *kind),
                FieldKind::HasMany { target, from_column, to_column } => {
                    let target = graph.object(*target);
                    has_many_field(&field.name, &target.name, &target.table, from_column, to_column)
                }
                FieldKind::BelongsToOne { target, from_column, to_column } => {
                    let target = graph.object(*target);
                    belongs_to_field(&field.name, &target.name, &target.table, from_column, to_column)
                }
            };
            object = object.field(graphql_field);
        }

        tracing::debug!(
            "Registered type {} with {} fields",
            object_type.name,
            object_type.fields.len()
        );
        builder = builder.register(object);
    }

    let mut query = Object::new(QUERY_TYPE);
    for root in graph.root_fields() {
        let target = graph.object(root.target);
        query = query.field(root_list_field(&root.name, &target.name, &target.table));
    }

    builder
        .register(query)
        .data(fetcher)
        .finish()
        .map_err(|e| GraphOrmError::Build(format!("Failed to build schema: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDescriptor, ForeignKeyDescriptor};
    use crate::store::{CellValue, Row, RowFetcher};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EmptyFetcher;

    #[async_trait]
    impl RowFetcher for EmptyFetcher {
        async fn fetch_all(&self, _table: &str) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn fetch_where(&self, _table: &str, _column: &str, _value: &CellValue) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }
    }

    struct CountingReader {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl CatalogReader for CountingReader {
        async fn read(&self) -> Result<Catalog> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(blog_catalog())
        }
    }

    fn blog_catalog() -> Catalog {
        Catalog::new(
            vec![
                ColumnDescriptor::new("users", "id", "integer"),
                ColumnDescriptor::new("users", "name", "varchar(255)"),
                ColumnDescriptor::new("posts", "id", "integer"),
                ColumnDescriptor::new("posts", "user_id", "integer"),
                ColumnDescriptor::new("posts", "title", "varchar(255)"),
            ],
            vec![ForeignKeyDescriptor::new("posts", "user_id", "users", "id")],
        )
    }

    #[test]
    fn test_build_api_registers_types() {
        let api = build_api(blog_catalog(), Arc::new(EmptyFetcher), PlannerOptions::default())
            .unwrap();

        let sdl = api.schema().sdl();
        assert!(sdl.contains("type User"));
        assert!(sdl.contains("type Post"));
        assert!(sdl.contains("posts: [Post!]"));
        assert!(sdl.contains("user: User"));
        assert!(sdl.contains("users: [User!]"));
    }

    #[test]
    fn test_empty_catalog_is_build_error() {
        let result = build_api(Catalog::default(), Arc::new(EmptyFetcher), PlannerOptions::default());
        assert!(matches!(result, Err(GraphOrmError::Build(_))));
    }

    #[tokio::test]
    async fn test_build_is_memoized() {
        let reader = Arc::new(CountingReader {
            reads: AtomicUsize::new(0),
        });
        let builder = SchemaBuilder::new(reader.clone(), Arc::new(EmptyFetcher));

        let first = builder.build().await.unwrap();
        let second = builder.build().await.unwrap();

        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first.graph, &second.graph));
    }

    #[tokio::test]
    async fn test_unity_backend_requires_catalog_scope() {
        let mut config = Config::sqlite("unused.db");
        config.database.backend = Backend::Unity;
        config.database.path = None;

        let err = SchemaBuilder::from_config(&config).await.err().unwrap();
        assert!(matches!(err, GraphOrmError::Config(ref msg) if msg.contains("[databricks]")));
    }
}

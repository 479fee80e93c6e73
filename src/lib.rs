pub mod catalog;
pub mod config;
pub mod error;
pub mod naming;
pub mod schema;
pub mod store;
pub mod unity;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogReader, ColumnDescriptor, ForeignKeyDescriptor, TableFilter};
pub use config::{Config, ServerConfig};
pub use error::{GraphOrmError, Result};
pub use schema::{GeneratedApi, SchemaBuilder};
pub use store::{CellValue, Row, RowFetcher, SharedFetcher};
pub use unity::UnityClient;

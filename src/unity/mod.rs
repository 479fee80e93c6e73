//! Unity Catalog metadata source

mod client;
mod types;
pub mod discovery;

pub use client::UnityClient;
pub use discovery::{discover, DiscoveredTable, Discovery, UnityCatalogReader};
pub use types::{ColumnInfo, ForeignKeyConstraint, TableConstraint, TableInfo, TableMetadata};

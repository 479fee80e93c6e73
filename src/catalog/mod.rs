//! Catalog metadata acquisition
//!
//! A [`CatalogReader`] turns a live metadata source into two ordered
//! descriptor sequences. The filtering and ordering applied by
//! [`Catalog::finalize`] is part of the contract: internal tables and
//! migration bookkeeping never reach the type graph, and tables come out
//! in lexicographic order so generated fields are reproducible.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Migration bookkeeping tables written by common migration tools
const MIGRATION_TABLES: &[&str] = &[
    "__diesel_schema_migrations",
    "_prisma_migrations",
    "_sqlx_migrations",
    "ar_internal_metadata",
    "flyway_schema_history",
    "knex_migrations",
    "knex_migrations_lock",
    "refinery_schema_history",
    "schema_migrations",
    "seaql_migrations",
];

/// Prefixes reserved by storage engines for their own tables
const INTERNAL_PREFIXES: &[&str] = &["sqlite_", "pg_", "information_schema", "_litestream"];

/// One column of one table, as declared in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub table_name: String,
    pub column_name: String,
    pub declared_type: String,
}

impl ColumnDescriptor {
    pub fn new(table: &str, column: &str, declared_type: &str) -> Self {
        Self {
            table_name: table.to_string(),
            column_name: column.to_string(),
            declared_type: declared_type.to_string(),
        }
    }
}

/// Directed edge `table_name.column_name → referenced_table_name.referenced_column_name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    pub table_name: String,
    pub column_name: String,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
}

impl ForeignKeyDescriptor {
    pub fn new(table: &str, column: &str, referenced_table: &str, referenced_column: &str) -> Self {
        Self {
            table_name: table.to_string(),
            column_name: column.to_string(),
            referenced_table_name: referenced_table.to_string(),
            referenced_column_name: referenced_column.to_string(),
        }
    }
}

/// Raw catalog snapshot, captured once at initialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub columns: Vec<ColumnDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl Catalog {
    pub fn new(columns: Vec<ColumnDescriptor>, foreign_keys: Vec<ForeignKeyDescriptor>) -> Self {
        Self {
            columns,
            foreign_keys,
        }
    }

    /// Keep only the columns and outgoing foreign keys of `tables`
    pub fn retain_tables(mut self, tables: &[String]) -> Self {
        self.columns.retain(|c| tables.contains(&c.table_name));
        self.foreign_keys.retain(|fk| tables.contains(&fk.table_name));
        self
    }

    /// Apply the table filter and the stable ordering.
    ///
    /// Columns keep their catalog order within a table; tables are sorted
    /// by name. Foreign keys are sorted by owning table then column.
    /// Foreign keys *into* a hidden table are kept so the schema model can
    /// report them as integrity errors instead of dropping them silently.
    pub fn finalize(mut self, filter: &TableFilter) -> Self {
        self.columns.retain(|c| filter.is_visible(&c.table_name));
        self.columns.sort_by(|a, b| a.table_name.cmp(&b.table_name));

        self.foreign_keys.retain(|fk| filter.is_visible(&fk.table_name));
        self.foreign_keys.sort_by(|a, b| {
            (&a.table_name, &a.column_name, &a.referenced_table_name)
                .cmp(&(&b.table_name, &b.column_name, &b.referenced_table_name))
        });

        self
    }
}

/// Which tables are reflected into the type graph
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    excluded: Vec<String>,
}

impl TableFilter {
    /// Filter with extra, user-configured table names to hide
    pub fn new(excluded: Vec<String>) -> Self {
        Self { excluded }
    }

    pub fn is_visible(&self, table: &str) -> bool {
        let lower = table.to_ascii_lowercase();

        if INTERNAL_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            return false;
        }
        if MIGRATION_TABLES.contains(&lower.as_str()) {
            return false;
        }
        !self.excluded.iter().any(|e| e.eq_ignore_ascii_case(table))
    }
}

/// A live metadata source
///
/// Implementations restrict themselves to base tables (no views, virtual
/// or temporary tables) and return a [`Catalog`] already passed through
/// [`Catalog::finalize`].
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn read(&self) -> Result<Catalog>;
}

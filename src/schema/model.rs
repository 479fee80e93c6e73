//! In-memory view over a catalog snapshot
//!
//! Groups columns by table (catalog order preserved) and indexes foreign
//! keys both by the table that declares them and by the table they point at.

use crate::catalog::{Catalog, ColumnDescriptor, ForeignKeyDescriptor};
use crate::error::{GraphOrmError, Result};

use indexmap::IndexMap;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SchemaModel {
    columns_by_table: IndexMap<String, Vec<ColumnDescriptor>>,
    foreign_keys_referencing: HashMap<String, Vec<ForeignKeyDescriptor>>,
    foreign_keys_owned_by: HashMap<String, Vec<ForeignKeyDescriptor>>,
}

impl SchemaModel {
    /// Build the model, rejecting foreign keys whose endpoints are not in
    /// the column catalog
    pub fn new(catalog: Catalog) -> Result<Self> {
        let mut columns_by_table: IndexMap<String, Vec<ColumnDescriptor>> = IndexMap::new();
        for column in catalog.columns {
            columns_by_table
                .entry(column.table_name.clone())
                .or_default()
                .push(column);
        }

        let mut foreign_keys_referencing: HashMap<String, Vec<ForeignKeyDescriptor>> =
            HashMap::new();
        let mut foreign_keys_owned_by: HashMap<String, Vec<ForeignKeyDescriptor>> = HashMap::new();

        for fk in catalog.foreign_keys {
            check_endpoint(&columns_by_table, &fk, &fk.table_name, &fk.column_name)?;
            check_endpoint(
                &columns_by_table,
                &fk,
                &fk.referenced_table_name,
                &fk.referenced_column_name,
            )?;

            foreign_keys_referencing
                .entry(fk.referenced_table_name.clone())
                .or_default()
                .push(fk.clone());
            foreign_keys_owned_by
                .entry(fk.table_name.clone())
                .or_default()
                .push(fk);
        }

        tracing::debug!(
            "Schema model: {} tables, {} foreign keys",
            columns_by_table.len(),
            foreign_keys_owned_by.values().map(Vec::len).sum::<usize>()
        );

        Ok(Self {
            columns_by_table,
            foreign_keys_referencing,
            foreign_keys_owned_by,
        })
    }

    /// Table names in catalog order
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.columns_by_table.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.columns_by_table.is_empty()
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.columns_by_table.contains_key(table)
    }

    pub fn columns(&self, table: &str) -> &[ColumnDescriptor] {
        self.columns_by_table
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Inbound edges: foreign keys declared elsewhere that point at `table`
    pub fn foreign_keys_referencing(&self, table: &str) -> &[ForeignKeyDescriptor] {
        self.foreign_keys_referencing
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Outbound edges: foreign keys declared by `table`
    pub fn foreign_keys_owned_by(&self, table: &str) -> &[ForeignKeyDescriptor] {
        self.foreign_keys_owned_by
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn check_endpoint(
    columns_by_table: &IndexMap<String, Vec<ColumnDescriptor>>,
    fk: &ForeignKeyDescriptor,
    table: &str,
    column: &str,
) -> Result<()> {
    let Some(columns) = columns_by_table.get(table) else {
        return Err(GraphOrmError::Integrity {
            table: fk.table_name.clone(),
            column: fk.column_name.clone(),
            referenced: format!("table '{}'", table),
        });
    };

    if !columns.iter().any(|c| c.column_name == column) {
        return Err(GraphOrmError::Integrity {
            table: fk.table_name.clone(),
            column: fk.column_name.clone(),
            referenced: format!("column '{}.{}'", table, column),
        });
    }

    Ok(())
}

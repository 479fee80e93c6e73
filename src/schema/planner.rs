//! Per-table field plans
//!
//! A plan lists, in order: the implicit `id` field, one scalar field per
//! column, one has-many field per inbound foreign key and one belongs-to
//! field per outbound foreign key. Name collisions are planning errors
//! unless relation shadowing is switched on.

use crate::catalog::ForeignKeyDescriptor;
use crate::error::{GraphOrmError, Result};
use crate::naming;
use crate::schema::model::SchemaModel;
use crate::schema::type_mapping::{scalar_kind_for_declared_type, ScalarKind};

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the implicit identifier field and its conventional storage column
pub const ID_FIELD: &str = "id";

/// How belongs-to fields are named
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BelongsToNaming {
    /// `posts.reviewer_id → users.id` becomes `user`
    #[default]
    ReferencedTable,
    /// `posts.reviewer_id → users.id` becomes `reviewer`
    ForeignKeyColumn,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlannerOptions {
    pub belongs_to_naming: BelongsToNaming,
    /// Let a relation field replace a scalar field with the same name
    pub relation_shadowing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarField {
    pub name: String,
    pub storage_column: String,
    pub kind: ScalarKind,
}

/// "this row has many `target_table` rows whose `from_column` equals this row's `to_column`"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasManyField {
    pub name: String,
    pub target_table: String,
    pub target_type_name: String,
    /// Key column on the target table
    pub from_column: String,
    /// Key column on this table
    pub to_column: String,
}

/// "this row belongs to the `target_table` row whose `to_column` equals this row's `from_column`"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongsToOneField {
    pub name: String,
    pub target_table: String,
    pub target_type_name: String,
    /// Key column on this table
    pub from_column: String,
    /// Key column on the target table
    pub to_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Scalar(ScalarField),
    HasMany(HasManyField),
    BelongsToOne(BelongsToOneField),
}

impl Field {
    pub fn name(&self) -> &str {
        match self {
            Field::Scalar(f) => &f.name,
            Field::HasMany(f) => &f.name,
            Field::BelongsToOne(f) => &f.name,
        }
    }

    fn is_relation(&self) -> bool {
        !matches!(self, Field::Scalar(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    pub table: String,
    pub type_name: String,
    pub fields: Vec<Field>,
}

impl FieldPlan {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

/// Plan every table of the model, in model order
pub fn plan_all(model: &SchemaModel, options: PlannerOptions) -> Result<Vec<FieldPlan>> {
    model
        .tables()
        .map(|table| plan_table(model, table, options))
        .collect()
}

/// Plan the fields of one table
pub fn plan_table(model: &SchemaModel, table: &str, options: PlannerOptions) -> Result<FieldPlan> {
    let mut plan = PlanBuilder::new(table, options);
    let columns = model.columns(table);

    // The identifier is a fixed convention; the table's own `id` column backs it.
    let id_column = columns
        .iter()
        .find(|c| c.column_name.eq_ignore_ascii_case(ID_FIELD))
        .map(|c| c.column_name.clone())
        .unwrap_or_else(|| ID_FIELD.to_string());
    plan.add(Field::Scalar(ScalarField {
        name: ID_FIELD.to_string(),
        storage_column: id_column.clone(),
        kind: ScalarKind::Id,
    }))?;

    for column in columns.iter().filter(|c| c.column_name != id_column) {
        plan.add(Field::Scalar(ScalarField {
            name: naming::column_name_to_field_name(&column.column_name),
            storage_column: column.column_name.clone(),
            kind: scalar_kind_for_declared_type(&column.declared_type),
        }))?;
    }

    for fk in model.foreign_keys_referencing(table) {
        plan.add(Field::HasMany(HasManyField {
            name: naming::table_name_to_collection_field_name(&fk.table_name),
            target_table: fk.table_name.clone(),
            target_type_name: naming::table_name_to_type_name(&fk.table_name),
            from_column: fk.column_name.clone(),
            to_column: fk.referenced_column_name.clone(),
        }))?;
    }

    for fk in model.foreign_keys_owned_by(table) {
        plan.add(Field::BelongsToOne(BelongsToOneField {
            name: belongs_to_name(fk, options.belongs_to_naming),
            target_table: fk.referenced_table_name.clone(),
            target_type_name: naming::table_name_to_type_name(&fk.referenced_table_name),
            from_column: fk.column_name.clone(),
            to_column: fk.referenced_column_name.clone(),
        }))?;
    }

    plan.finish()
}

fn belongs_to_name(fk: &ForeignKeyDescriptor, naming_rule: BelongsToNaming) -> String {
    match naming_rule {
        BelongsToNaming::ReferencedTable => {
            naming::table_name_to_singular_field_name(&fk.referenced_table_name)
        }
        BelongsToNaming::ForeignKeyColumn => naming::foreign_key_column_to_field_name(&fk.column_name),
    }
}

struct PlanBuilder {
    table: String,
    options: PlannerOptions,
    fields: IndexMap<String, Field>,
}

impl PlanBuilder {
    fn new(table: &str, options: PlannerOptions) -> Self {
        Self {
            table: table.to_string(),
            options,
            fields: IndexMap::new(),
        }
    }

    fn add(&mut self, field: Field) -> Result<()> {
        let name = field.name().to_string();

        if !naming::is_valid_graphql_name(&name) {
            return Err(GraphOrmError::Planning {
                table: self.table.clone(),
                field: name,
                reason: format!("{} does not normalize to a valid GraphQL name", describe(&field)),
            });
        }

        match self.fields.entry(name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(field);
                Ok(())
            }
            Entry::Occupied(existing) => {
                let shadowable = self.options.relation_shadowing
                    && field.is_relation()
                    && !existing.get().is_relation()
                    && name != ID_FIELD;

                if !shadowable {
                    return Err(GraphOrmError::Planning {
                        table: self.table.clone(),
                        field: name,
                        reason: collision_reason(existing.get(), &field),
                    });
                }

                tracing::warn!(
                    "Relation field '{}' on table '{}' shadows a column field",
                    name,
                    self.table
                );
                existing.shift_remove();
                self.fields.insert(name, field);
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<FieldPlan> {
        let type_name = naming::table_name_to_type_name(&self.table);
        if !naming::is_valid_graphql_name(&type_name) {
            return Err(GraphOrmError::Planning {
                table: self.table,
                field: type_name,
                reason: "table name does not normalize to a valid GraphQL type name".to_string(),
            });
        }

        Ok(FieldPlan {
            type_name,
            table: self.table,
            fields: self.fields.into_values().collect(),
        })
    }
}

fn describe(field: &Field) -> String {
    match field {
        Field::Scalar(f) if f.name == ID_FIELD && f.kind == ScalarKind::Id => {
            "the implicit identifier".to_string()
        }
        Field::Scalar(f) => format!("column '{}'", f.storage_column),
        Field::HasMany(f) => format!("has-many relation to '{}' via {}", f.target_table, f.from_column),
        Field::BelongsToOne(f) => {
            format!("belongs-to relation to '{}' via {}", f.target_table, f.from_column)
        }
    }
}

fn collision_reason(existing: &Field, incoming: &Field) -> String {
    format!("{} collides with {}", describe(incoming), describe(existing))
}

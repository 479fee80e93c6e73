//! Type graph construction
//!
//! Types are built in two phases so tables can reference each other
//! (including themselves). [`TypeGraphBuilder::declare`] reserves a slot
//! per table keyed by type name; [`TypeGraphBuilder::populate`] then
//! resolves every relation target against the slots declared so far. A
//! target with no slot is a dangling reference.

use crate::error::{GraphOrmError, Result};
use crate::naming;
use crate::schema::planner::{Field, FieldPlan};
use crate::schema::type_mapping::ScalarKind;

use indexmap::IndexMap;

/// Name of the root query type
pub const QUERY_TYPE: &str = "Query";

/// Names the executable schema already defines
const RESERVED_TYPE_NAMES: &[&str] = &[QUERY_TYPE, "String", "Int", "Float", "Boolean", "ID"];

/// Handle to a type slot in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar {
        column: String,
        kind: ScalarKind,
    },
    /// List of `target` rows whose `from_column` equals the parent's `to_column`
    HasMany {
        target: TypeId,
        from_column: String,
        to_column: String,
    },
    /// The `target` row whose `to_column` equals the parent's `from_column`
    BelongsToOne {
        target: TypeId,
        from_column: String,
        to_column: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphField {
    pub name: String,
    pub kind: FieldKind,
}

/// A finalized object type, one per table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub name: String,
    pub table: String,
    pub fields: Vec<GraphField>,
}

/// Root query field listing every row of `target`'s table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootField {
    pub name: String,
    pub target: TypeId,
}

/// Finalized, read-only type graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeGraph {
    types: Vec<ObjectType>,
    by_name: IndexMap<String, TypeId>,
    root: Vec<RootField>,
}

impl TypeGraph {
    /// Run both phases over a complete set of plans
    pub fn build(plans: &[FieldPlan]) -> Result<Self> {
        let mut builder = TypeGraphBuilder::new();
        for plan in plans {
            builder.declare(plan)?;
        }
        for plan in plans {
            builder.populate(plan)?;
        }
        builder.finish()
    }

    /// Object types in table order
    pub fn types(&self) -> &[ObjectType] {
        &self.types
    }

    pub fn get(&self, type_name: &str) -> Option<&ObjectType> {
        self.by_name.get(type_name).map(|id| &self.types[id.0])
    }

    pub fn object(&self, id: TypeId) -> &ObjectType {
        &self.types[id.0]
    }

    pub fn root_fields(&self) -> &[RootField] {
        &self.root
    }
}

enum Slot {
    Declared { name: String, table: String },
    Populated(ObjectType),
}

#[derive(Default)]
pub struct TypeGraphBuilder {
    slots: Vec<Slot>,
    by_name: IndexMap<String, TypeId>,
}

impl TypeGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: reserve an empty slot for the plan's type
    pub fn declare(&mut self, plan: &FieldPlan) -> Result<TypeId> {
        if RESERVED_TYPE_NAMES.contains(&plan.type_name.as_str()) || plan.type_name.starts_with("__") {
            return Err(GraphOrmError::Build(format!(
                "table '{}' normalizes to the reserved type name '{}'",
                plan.table, plan.type_name
            )));
        }

        if let Some(existing) = self.by_name.get(&plan.type_name) {
            let other = match &self.slots[existing.0] {
                Slot::Declared { table, .. } => table.as_str(),
                Slot::Populated(object) => object.table.as_str(),
            };
            return Err(GraphOrmError::Build(format!(
                "tables '{}' and '{}' both normalize to type '{}'",
                other, plan.table, plan.type_name
            )));
        }

        let id = TypeId(self.slots.len());
        self.slots.push(Slot::Declared {
            name: plan.type_name.clone(),
            table: plan.table.clone(),
        });
        self.by_name.insert(plan.type_name.clone(), id);

        tracing::debug!("Declared type {} for table {}", plan.type_name, plan.table);
        Ok(id)
    }

    /// Phase 2: resolve the plan's fields against declared slots and fill its slot
    pub fn populate(&mut self, plan: &FieldPlan) -> Result<()> {
        let id = self.lookup(&plan.type_name, &plan.table)?;

        let fields = plan
            .fields
            .iter()
            .map(|field| self.resolve_field(plan, field))
            .collect::<Result<Vec<_>>>()?;

        match &self.slots[id.0] {
            Slot::Declared { .. } => {}
            Slot::Populated(_) => {
                return Err(GraphOrmError::Build(format!(
                    "type '{}' populated twice",
                    plan.type_name
                )));
            }
        }

        self.slots[id.0] = Slot::Populated(ObjectType {
            name: plan.type_name.clone(),
            table: plan.table.clone(),
            fields,
        });
        Ok(())
    }

    /// Check every slot is populated and derive the root fields
    pub fn finish(self) -> Result<TypeGraph> {
        let mut types = Vec::with_capacity(self.slots.len());
        for slot in self.slots {
            match slot {
                Slot::Populated(object) => types.push(object),
                Slot::Declared { name, .. } => {
                    return Err(GraphOrmError::Build(format!(
                        "type '{}' was declared but never populated",
                        name
                    )));
                }
            }
        }

        let mut root: Vec<RootField> = Vec::with_capacity(types.len());
        for (index, object) in types.iter().enumerate() {
            let name = naming::table_name_to_collection_field_name(&object.table);
            if let Some(clash) = root.iter().find(|r| r.name == name) {
                return Err(GraphOrmError::Build(format!(
                    "tables '{}' and '{}' both map to root field '{}'",
                    types[clash.target.0].table, object.table, name
                )));
            }
            root.push(RootField {
                name,
                target: TypeId(index),
            });
        }

        tracing::debug!("Type graph finalized with {} types", types.len());

        Ok(TypeGraph {
            types,
            by_name: self.by_name,
            root,
        })
    }

    fn lookup(&self, type_name: &str, referenced_from: &str) -> Result<TypeId> {
        self.by_name.get(type_name).copied().ok_or_else(|| {
            GraphOrmError::Build(format!(
                "dangling reference from '{}' to undeclared type '{}'",
                referenced_from, type_name
            ))
        })
    }

    fn resolve_field(&self, plan: &FieldPlan, field: &Field) -> Result<GraphField> {
        let kind = match field {
            Field::Scalar(f) => FieldKind::Scalar {
                column: f.storage_column.clone(),
                kind: f.kind,
            },
            Field::HasMany(f) => FieldKind::HasMany {
                target: self.lookup(&f.target_type_name, &plan.table)?,
                from_column: f.from_column.clone(),
                to_column: f.to_column.clone(),
            },
            Field::BelongsToOne(f) => FieldKind::BelongsToOne {
                target: self.lookup(&f.target_type_name, &plan.table)?,
                from_column: f.from_column.clone(),
                to_column: f.to_column.clone(),
            },
        };

        Ok(GraphField {
            name: field.name().to_string(),
            kind,
        })
    }
}

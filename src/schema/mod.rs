//! GraphQL schema generation from catalog metadata
//!
//! Catalog → [`model::SchemaModel`] → field plans → [`graph::TypeGraph`] →
//! executable dynamic schema. Each stage is deterministic given the same
//! catalog.

pub mod builder;
pub mod dump;
pub mod graph;
pub mod model;
pub mod planner;
pub mod resolver;
pub mod type_mapping;

pub use builder::{build_api, GeneratedApi, SchemaBuilder};
pub use graph::TypeGraph;
pub use model::SchemaModel;
pub use planner::{BelongsToNaming, PlannerOptions};
pub use type_mapping::ScalarKind;

//! Textual schema dump
//!
//! Renders the type graph in SDL-like form. Types follow table order and
//! fields follow plan order, so identical catalogs give identical output.

use crate::schema::graph::{FieldKind, TypeGraph, QUERY_TYPE};

use std::fmt::Write;

/// Render `graph` as text, one block per type plus the root query type
pub fn dump(graph: &TypeGraph) -> String {
    let mut out = String::new();

    for object in graph.types() {
        let _ = writeln!(out, "type {} {{", object.name);
        for field in &object.fields {
            let type_name = match &field.kind {
                FieldKind::Scalar { kind, .. } => kind.graphql_name().to_string(),
                FieldKind::HasMany { target, .. } => format!("[{}!]", graph.object(*target).name),
                FieldKind::BelongsToOne { target, .. } => graph.object(*target).name.clone(),
            };
            let _ = writeln!(out, "  {}: {}", field.name, type_name);
        }
        out.push_str("}\n\n");
    }

    let _ = writeln!(out, "type {} {{", QUERY_TYPE);
    for root in graph.root_fields() {
        let _ = writeln!(out, "  {}: [{}!]", root.name, graph.object(root.target).name);
    }
    out.push_str("}\n");

    out
}

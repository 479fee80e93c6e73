//! Declared column type to GraphQL type mapping
//!
//! Catalog type names are mapped onto four scalar kinds through a fixed
//! table. Anything unrecognized falls back to `String` instead of failing
//! the build.

use async_graphql::dynamic::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar kinds exposed by the generated API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    Boolean,
    Id,
}

impl ScalarKind {
    /// GraphQL scalar name for this kind
    pub fn graphql_name(self) -> &'static str {
        match self {
            ScalarKind::String => TypeRef::STRING,
            ScalarKind::Integer => TypeRef::INT,
            ScalarKind::Boolean => TypeRef::BOOLEAN,
            ScalarKind::Id => TypeRef::ID,
        }
    }

    /// Nullable type reference; column values may always be NULL
    pub fn type_ref(self) -> TypeRef {
        TypeRef::named(self.graphql_name())
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.graphql_name())
    }
}

/// Map a declared catalog type onto a scalar kind
///
/// # Type Mapping Rules
///
/// - `text`, `varchar`, `char`, `character varying`, `utf8` → `String`
/// - `int`, `integer`, `bigint`, `smallint`, `serial`, Arrow `Int*`/`UInt*` → `Integer`
/// - `bool`, `boolean` → `Boolean`
/// - anything else → `String`
///
/// Length and precision modifiers are ignored (`varchar(255)` is `varchar`).
pub fn scalar_kind_for_declared_type(declared_type: &str) -> ScalarKind {
    let base = declared_type
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match base.as_str() {
        "text" | "varchar" | "char" | "character" | "character varying" | "nvarchar"
        | "nchar" | "clob" | "string" | "utf8" | "largeutf8" | "utf8view" => ScalarKind::String,

        "int" | "integer" | "bigint" | "smallint" | "tinyint" | "mediumint" | "serial"
        | "bigserial" | "smallserial" | "int2" | "int4" | "int8" | "int16" | "int32"
        | "int64" | "uint8" | "uint16" | "uint32" | "uint64" | "long" | "short" => {
            ScalarKind::Integer
        }

        "bool" | "boolean" => ScalarKind::Boolean,

        other => {
            if !other.is_empty() {
                tracing::debug!("Unrecognized column type '{}', mapping to String", declared_type);
            }
            ScalarKind::String
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_mapping() {
        assert_eq!(scalar_kind_for_declared_type("text"), ScalarKind::String);
        assert_eq!(scalar_kind_for_declared_type("VARCHAR(255)"), ScalarKind::String);
        assert_eq!(scalar_kind_for_declared_type("character varying"), ScalarKind::String);
        assert_eq!(scalar_kind_for_declared_type("Utf8"), ScalarKind::String);
    }

    #[test]
    fn test_integer_mapping() {
        for declared in ["int", "INTEGER", "bigint", "smallint", "serial", "Int64", "UInt32"] {
            assert_eq!(
                scalar_kind_for_declared_type(declared),
                ScalarKind::Integer,
                "{}",
                declared
            );
        }
    }

    #[test]
    fn test_boolean_mapping() {
        assert_eq!(scalar_kind_for_declared_type("bool"), ScalarKind::Boolean);
        assert_eq!(scalar_kind_for_declared_type("Boolean"), ScalarKind::Boolean);
    }

    #[test]
    fn test_unknown_types_fall_back_to_string() {
        assert_eq!(scalar_kind_for_declared_type("jsonb"), ScalarKind::String);
        assert_eq!(scalar_kind_for_declared_type("numeric(10, 2)"), ScalarKind::String);
        assert_eq!(scalar_kind_for_declared_type(""), ScalarKind::String);
    }

    #[test]
    fn test_type_refs_are_nullable() {
        assert_eq!(ScalarKind::Id.type_ref().to_string(), "ID");
        assert_eq!(ScalarKind::Integer.type_ref().to_string(), "Int");
        assert!(!ScalarKind::String.type_ref().to_string().ends_with('!'));
    }
}

//! Row-fetch primitive
//!
//! The type graph's resolvers only ever talk to a [`RowFetcher`]. Backends
//! live in submodules and also implement [`crate::catalog::CatalogReader`].

pub mod delta;
pub mod sqlite;

pub use delta::DeltaStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::schema::type_mapping::ScalarKind;

use async_graphql::Value;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// One stored value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Coerce into the GraphQL value for a field of `kind`
    pub fn to_graphql(&self, kind: ScalarKind) -> std::result::Result<Value, String> {
        let value = match (kind, self) {
            (_, CellValue::Null) => Value::Null,

            (ScalarKind::Id, CellValue::Integer(i)) => Value::String(i.to_string()),
            (ScalarKind::Id, CellValue::Text(s)) => Value::String(s.clone()),
            (ScalarKind::Id, other) => Value::String(other.to_string()),

            (ScalarKind::Integer, CellValue::Integer(i)) => Value::Number((*i).into()),
            (ScalarKind::Integer, CellValue::Boolean(b)) => Value::Number(i64::from(*b).into()),
            (ScalarKind::Integer, CellValue::Text(s)) => match s.trim().parse::<i64>() {
                Ok(i) => Value::Number(i.into()),
                Err(_) => return Err(format!("'{}' is not an integer", s)),
            },
            (ScalarKind::Integer, CellValue::Float(f)) => {
                // i64::MAX is not representable as f64; 2^63 is the exclusive bound
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < -(i64::MIN as f64) {
                    Value::Number((*f as i64).into())
                } else {
                    return Err(format!("{} is not an integer", f));
                }
            }

            (ScalarKind::Boolean, CellValue::Boolean(b)) => Value::Boolean(*b),
            (ScalarKind::Boolean, CellValue::Integer(i)) => Value::Boolean(*i != 0),
            (ScalarKind::Boolean, CellValue::Text(s)) => match s.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" => Value::Boolean(true),
                "false" | "f" | "0" | "no" => Value::Boolean(false),
                _ => return Err(format!("'{}' is not a boolean", s)),
            },
            (ScalarKind::Boolean, CellValue::Float(f)) => Value::Boolean(*f != 0.0),

            (ScalarKind::String, CellValue::Text(s)) => Value::String(s.clone()),
            (ScalarKind::String, other) => Value::String(other.to_string()),
        };
        Ok(value)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A fetched row: storage column name → value, in storage column order
pub type Row = IndexMap<String, CellValue>;

/// Row-fetch primitive consumed by resolvers
///
/// Implementations never interpolate `value` into query text; identifiers
/// are checked against the backend's own catalog before use.
#[async_trait]
pub trait RowFetcher: Send + Sync {
    /// Every row of `table`
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>>;

    /// Rows of `table` whose `column` equals `value`; a NULL `value` matches nothing
    async fn fetch_where(&self, table: &str, column: &str, value: &CellValue) -> Result<Vec<Row>>;
}

/// Fetcher handle stored in the schema's context data
pub type SharedFetcher = Arc<dyn RowFetcher>;

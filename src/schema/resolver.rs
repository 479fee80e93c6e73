//! GraphQL field resolvers
//!
//! Every object value flowing through the executable schema is a [`Row`]
//! stored with `FieldValue::owned_any`. Relation resolvers read the join
//! key from the parent row and issue one parameterized fetch through the
//! [`SharedFetcher`] held in the schema data.

use crate::error::GraphOrmError;
use crate::schema::type_mapping::ScalarKind;
use crate::store::{CellValue, Row, SharedFetcher};

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, ResolverContext, TypeRef};
use std::fmt::Display;

fn field_error(field: &str, message: impl Display) -> async_graphql::Error {
    async_graphql::Error::new(
        GraphOrmError::FieldResolution {
            field: field.to_string(),
            message: message.to_string(),
        }
        .to_string(),
    )
}

fn parent_row<'a>(ctx: &'a ResolverContext<'_>, field: &str) -> async_graphql::Result<&'a Row> {
    ctx.parent_value
        .try_downcast_ref::<Row>()
        .map_err(|_| field_error(field, "parent value is not a row"))
}

/// Join key from the parent row; an absent column reads as NULL
fn join_key(row: &Row, column: &str) -> CellValue {
    row.get(column).cloned().unwrap_or(CellValue::Null)
}

fn fetcher<'a>(ctx: &'a ResolverContext<'_>, field: &str) -> async_graphql::Result<&'a SharedFetcher> {
    ctx.data::<SharedFetcher>()
        .map_err(|_| field_error(field, "no row fetcher in schema data"))
}

/// Scalar field reading `column` from the parent row
pub fn scalar_field(name: &str, column: &str, kind: ScalarKind) -> Field {
    let field_name = name.to_string();
    let column = column.to_string();

    Field::new(name, kind.type_ref(), move |ctx: ResolverContext| {
        let field_name = field_name.clone();
        let column = column.clone();

        FieldFuture::new(async move {
            let row = parent_row(&ctx, &field_name)?;
            let value = match row.get(&column) {
                Some(cell) => cell
                    .to_graphql(kind)
                    .map_err(|e| field_error(&field_name, e))?,
                None => return Ok(None),
            };
            Ok(Some(FieldValue::value(value)))
        })
    })
}

/// `[Target!]` of rows in `target_table` whose `from_column` equals the parent's `to_column`
pub fn has_many_field(
    name: &str,
    target_type: &str,
    target_table: &str,
    from_column: &str,
    to_column: &str,
) -> Field {
    let field_name = name.to_string();
    let target_table = target_table.to_string();
    let from_column = from_column.to_string();
    let to_column = to_column.to_string();

    Field::new(name, TypeRef::named_nn_list(target_type), move |ctx: ResolverContext| {
        let field_name = field_name.clone();
        let target_table = target_table.clone();
        let from_column = from_column.clone();
        let to_column = to_column.clone();

        FieldFuture::new(async move {
            let key = join_key(parent_row(&ctx, &field_name)?, &to_column);
            if key.is_null() {
                return Ok(Some(FieldValue::list(Vec::<FieldValue>::new())));
            }

            let rows = fetcher(&ctx, &field_name)?
                .fetch_where(&target_table, &from_column, &key)
                .await
                .map_err(|e| field_error(&field_name, e))?;

            Ok(Some(FieldValue::list(rows.into_iter().map(FieldValue::owned_any))))
        })
    })
}

/// Nullable `Target`: the first row in `target_table` whose `to_column` equals the parent's `from_column`
pub fn belongs_to_field(
    name: &str,
    target_type: &str,
    target_table: &str,
    from_column: &str,
    to_column: &str,
) -> Field {
    let field_name = name.to_string();
    let target_table = target_table.to_string();
    let from_column = from_column.to_string();
    let to_column = to_column.to_string();

    Field::new(name, TypeRef::named(target_type), move |ctx: ResolverContext| {
        let field_name = field_name.clone();
        let target_table = target_table.clone();
        let from_column = from_column.clone();
        let to_column = to_column.clone();

        FieldFuture::new(async move {
            let key = join_key(parent_row(&ctx, &field_name)?, &from_column);
            if key.is_null() {
                return Ok(None);
            }

            let rows = fetcher(&ctx, &field_name)?
                .fetch_where(&target_table, &to_column, &key)
                .await
                .map_err(|e| field_error(&field_name, e))?;

            if rows.len() > 1 {
                tracing::warn!(
                    "{} rows in {} match {} = {}, using the first",
                    rows.len(),
                    target_table,
                    to_column,
                    key
                );
            }

            Ok(rows.into_iter().next().map(FieldValue::owned_any))
        })
    })
}

/// Root `[Target!]` listing every row of `table`
pub fn root_list_field(name: &str, target_type: &str, table: &str) -> Field {
    let field_name = name.to_string();
    let table = table.to_string();

    Field::new(name, TypeRef::named_nn_list(target_type), move |ctx: ResolverContext| {
        let field_name = field_name.clone();
        let table = table.clone();

        FieldFuture::new(async move {
            let rows = fetcher(&ctx, &field_name)?
                .fetch_all(&table)
                .await
                .map_err(|e| field_error(&field_name, e))?;

            Ok(Some(FieldValue::list(rows.into_iter().map(FieldValue::owned_any))))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_names_the_field() {
        let err = field_error("posts", "connection reset");
        assert_eq!(err.message, "Failed to resolve field 'posts': connection reset");
    }

    #[test]
    fn test_missing_join_key_reads_as_null() {
        let mut row = Row::new();
        row.insert("id".to_string(), CellValue::Integer(1));

        assert_eq!(join_key(&row, "id"), CellValue::Integer(1));
        assert!(join_key(&row, "user_id").is_null());
    }
}

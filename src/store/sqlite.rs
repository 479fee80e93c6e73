//! SQLite backend
//!
//! Uses a single `Arc<Mutex<Connection>>` instead of a pool. rusqlite is
//! synchronous, so every call runs on tokio's blocking thread pool.

use crate::catalog::{Catalog, CatalogReader, ColumnDescriptor, ForeignKeyDescriptor, TableFilter};
use crate::error::{GraphOrmError, Result};
use crate::schema::planner::ID_FIELD;
use crate::store::{CellValue, Row, RowFetcher};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

// `pragma_table_list` reports virtual tables and their shadow tables with
// their own types, so only `table` rows are ordinary user tables.
const COLUMNS_SQL: &str = "\
    SELECT t.name, p.name, p.type \
    FROM pragma_table_list AS t JOIN pragma_table_info(t.name) AS p \
    WHERE t.schema = 'main' AND t.type = 'table' \
    ORDER BY t.name, p.cid";

const FOREIGN_KEYS_SQL: &str = "\
    SELECT t.name, f.id, f.\"from\", f.\"table\", f.\"to\" \
    FROM pragma_table_list AS t JOIN pragma_foreign_key_list(t.name) AS f \
    WHERE t.schema = 'main' AND t.type = 'table' \
    ORDER BY t.name, f.id, f.seq";

/// SQLite catalog reader and row fetcher
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    filter: TableFilter,
    /// table → column names, filled from the catalog and on first use
    known_columns: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl SqliteStore {
    /// Open an existing database; a missing file is a connectivity error
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening SQLite database {}", path.display());

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            GraphOrmError::Connectivity(format!("Failed to open '{}': {}", path.display(), e))
        })?;

        Self::from_connection(conn)
    }

    /// Open a database, creating the file if needed
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory database, mostly for tests
    pub fn memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            filter: TableFilter::default(),
            known_columns: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Replace the table filter applied when reading the catalog
    pub fn with_filter(mut self, filter: TableFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run a batch of statements (schema setup, fixtures)
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.lock().execute_batch(sql)?;
        self.known_columns.write().clear();
        Ok(())
    }

    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &RwLock<HashMap<String, Vec<String>>>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let known = Arc::clone(&self.known_columns);

        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard, &known)
        })
        .await
        .map_err(|e| GraphOrmError::Connectivity(format!("SQLite task failed: {}", e)))?
    }
}

#[async_trait]
impl CatalogReader for SqliteStore {
    async fn read(&self) -> Result<Catalog> {
        let filter = self.filter.clone();

        self.blocking(move |conn, known| {
            let catalog = read_catalog(conn)?.finalize(&filter);

            let mut cache = known.write();
            cache.clear();
            for column in &catalog.columns {
                cache
                    .entry(column.table_name.clone())
                    .or_default()
                    .push(column.column_name.clone());
            }

            tracing::info!(
                "Read SQLite catalog: {} tables, {} columns, {} foreign keys",
                cache.len(),
                catalog.columns.len(),
                catalog.foreign_keys.len()
            );
            Ok(catalog)
        })
        .await
    }
}

#[async_trait]
impl RowFetcher for SqliteStore {
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>> {
        let table = table.to_string();

        self.blocking(move |conn, known| {
            known_columns(conn, known, &table)?;
            let sql = format!("SELECT * FROM {}", quote_identifier(&table));
            tracing::debug!("Executing query: {}", sql);
            query_rows(conn, &sql, &[])
        })
        .await
    }

    async fn fetch_where(&self, table: &str, column: &str, value: &CellValue) -> Result<Vec<Row>> {
        if value.is_null() {
            return Ok(Vec::new());
        }

        let table = table.to_string();
        let column = column.to_string();
        let value = value.clone();

        self.blocking(move |conn, known| {
            let columns = known_columns(conn, known, &table)?;
            if !columns.iter().any(|c| c == &column) {
                return Err(GraphOrmError::Query(format!(
                    "Unknown column '{}' on table '{}'",
                    column, table
                )));
            }

            let sql = format!(
                "SELECT * FROM {} WHERE {} = ?1",
                quote_identifier(&table),
                quote_identifier(&column)
            );
            tracing::debug!("Executing query: {} [{}]", sql, value);
            query_rows(conn, &sql, &[&value as &dyn ToSql])
        })
        .await
    }
}

fn read_catalog(conn: &Connection) -> Result<Catalog> {
    let mut stmt = conn.prepare(COLUMNS_SQL)?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnDescriptor {
                table_name: row.get(0)?,
                column_name: row.get(1)?,
                declared_type: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(FOREIGN_KEYS_SQL)?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    // Group by (table, constraint id); more than one row means a composite key.
    let mut groups: Vec<((String, i64), Vec<(String, String, Option<String>)>)> = Vec::new();
    for (table, id, from, referenced, to) in raw {
        match groups.last_mut() {
            Some((key, members)) if key.0 == table && key.1 == id => {
                members.push((from, referenced, to));
            }
            _ => groups.push(((table, id), vec![(from, referenced, to)])),
        }
    }

    let mut foreign_keys = Vec::with_capacity(groups.len());
    for ((table, _), members) in groups {
        if members.len() > 1 {
            tracing::warn!(
                "Skipping composite foreign key on {}({})",
                table,
                members
                    .iter()
                    .map(|(from, _, _)| from.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            continue;
        }
        let Some((from, referenced, to)) = members.into_iter().next() else {
            continue;
        };
        foreign_keys.push(ForeignKeyDescriptor {
            table_name: table,
            column_name: from,
            referenced_table_name: referenced,
            referenced_column_name: to.unwrap_or_else(|| ID_FIELD.to_string()),
        });
    }

    Ok(Catalog::new(columns, foreign_keys))
}

/// Column names of `table`, from the cache or the live catalog
fn known_columns(
    conn: &Connection,
    known: &RwLock<HashMap<String, Vec<String>>>,
    table: &str,
) -> Result<Vec<String>> {
    if let Some(columns) = known.read().get(table) {
        return Ok(columns.clone());
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if columns.is_empty() {
        return Err(GraphOrmError::Query(format!("Unknown table '{}'", table)));
    }

    known.write().insert(table.to_string(), columns.clone());
    Ok(columns)
}

fn query_rows(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let rows = stmt
        .query_map(params, |row| {
            let mut out = Row::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                out.insert(name.clone(), cell_value(row.get_ref(index)?, name));
            }
            Ok(out)
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn cell_value(value: ValueRef<'_>, column: &str) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) => CellValue::Integer(i),
        ValueRef::Real(f) => CellValue::Float(f),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => {
            tracing::warn!("BLOB value in column '{}' is not supported, returning null", column);
            CellValue::Null
        }
    }
}

/// Double-quote an identifier that was already checked against the catalog
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CellValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            CellValue::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            CellValue::Float(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            CellValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            CellValue::Boolean(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_store() -> SqliteStore {
        let store = SqliteStore::memory().unwrap();
        store
            .execute_batch(
                r#"
                CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name VARCHAR(255) NOT NULL DEFAULT ''
                );
                CREATE TABLE posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
                    title VARCHAR(255) NOT NULL DEFAULT ''
                );
                CREATE TABLE _sqlx_migrations (version INTEGER PRIMARY KEY);
                CREATE VIEW post_titles AS SELECT title FROM posts;

                INSERT INTO users (name) VALUES ('Kay');
                INSERT INTO posts (user_id, title) VALUES (1, 'X');
                "#,
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_catalog_excludes_views_and_internal_tables() {
        let store = blog_store();
        let catalog = store.read().await.unwrap();

        let tables: Vec<&str> = catalog
            .columns
            .iter()
            .map(|c| c.table_name.as_str())
            .collect();
        assert_eq!(tables, vec!["posts", "posts", "posts", "users", "users"]);

        assert_eq!(
            catalog.columns[2],
            ColumnDescriptor::new("posts", "title", "VARCHAR(255)")
        );
        assert_eq!(
            catalog.foreign_keys,
            vec![ForeignKeyDescriptor::new("posts", "user_id", "users", "id")]
        );
    }

    #[tokio::test]
    async fn test_catalog_excludes_virtual_and_shadow_tables() {
        let store = SqliteStore::memory().unwrap();
        store
            .execute_batch(
                "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
                 CREATE VIRTUAL TABLE docs USING fts5(body);",
            )
            .unwrap();

        let catalog = store.read().await.unwrap();
        let mut tables: Vec<&str> = catalog
            .columns
            .iter()
            .map(|c| c.table_name.as_str())
            .collect();
        tables.dedup();
        assert_eq!(tables, vec!["users"]);
    }

    #[tokio::test]
    async fn test_implicit_referenced_column_defaults_to_id() {
        let store = SqliteStore::memory().unwrap();
        store
            .execute_batch(
                "CREATE TABLE users (id INTEGER PRIMARY KEY);
                 CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users);",
            )
            .unwrap();

        let catalog = store.read().await.unwrap();
        assert_eq!(catalog.foreign_keys[0].referenced_column_name, "id");
    }

    #[tokio::test]
    async fn test_composite_foreign_keys_are_skipped() {
        let store = SqliteStore::memory().unwrap();
        store
            .execute_batch(
                "CREATE TABLE parents (a INTEGER, b INTEGER, PRIMARY KEY (a, b));
                 CREATE TABLE children (id INTEGER PRIMARY KEY, a INTEGER, b INTEGER,
                     FOREIGN KEY (a, b) REFERENCES parents (a, b));",
            )
            .unwrap();

        let catalog = store.read().await.unwrap();
        assert!(catalog.foreign_keys.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_and_where() {
        let store = blog_store();

        let users = store.fetch_all("users").await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].get("name"), Some(&CellValue::Text("Kay".to_string())));

        let posts = store
            .fetch_where("posts", "user_id", &CellValue::Integer(1))
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].get("title"), Some(&CellValue::Text("X".to_string())));

        let none = store
            .fetch_where("posts", "user_id", &CellValue::Integer(2))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_null_filter_matches_nothing() {
        let store = blog_store();
        let rows = store
            .fetch_where("posts", "user_id", &CellValue::Null)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_identifiers_are_rejected() {
        let store = blog_store();

        let err = store.fetch_all("users; DROP TABLE users").await.unwrap_err();
        assert!(err.to_string().contains("Unknown table"));

        let err = store
            .fetch_where("users", "name\" OR 1=1 --", &CellValue::Integer(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown column"));

        assert_eq!(store.fetch_all("users").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_values_are_bound_not_interpolated() {
        let store = blog_store();
        let rows = store
            .fetch_where("users", "name", &CellValue::Text("' OR '1'='1".to_string()))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_open_missing_file_is_connectivity_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.db");

        let err = SqliteStore::open(&missing).err().unwrap();
        assert!(matches!(err, GraphOrmError::Connectivity(_)));
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}

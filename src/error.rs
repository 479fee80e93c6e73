use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphOrmError {
    #[error("Cannot reach metadata source: {0}")]
    Connectivity(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Foreign key {table}.{column} references unknown {referenced}")]
    Integrity {
        table: String,
        column: String,
        referenced: String,
    },

    #[error("Field planning failed for table '{table}', field '{field}': {reason}")]
    Planning {
        table: String,
        field: String,
        reason: String,
    },

    #[error("Type graph build error: {0}")]
    Build(String),

    #[error("Failed to resolve field '{field}': {message}")]
    FieldResolution { field: String, message: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Unity Catalog API error: {0}")]
    UnityApi(String),

    #[error("Delta table error: {0}")]
    DeltaTable(#[from] deltalake::DeltaTableError),

    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GraphOrmError {
    /// True for errors that abort initialization rather than a single field
    pub fn is_build_time(&self) -> bool {
        matches!(
            self,
            GraphOrmError::Integrity { .. } | GraphOrmError::Planning { .. } | GraphOrmError::Build(_)
        )
    }
}

impl From<rusqlite::Error> for GraphOrmError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::CannotOpen | ErrorCode::NotADatabase => {
                    GraphOrmError::Connectivity(err.to_string())
                }
                ErrorCode::PermissionDenied
                | ErrorCode::AuthorizationForStatementDenied
                | ErrorCode::ReadOnly => GraphOrmError::Permission(err.to_string()),
                _ => GraphOrmError::Query(err.to_string()),
            },
            _ => GraphOrmError::Query(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for GraphOrmError {
    fn from(err: reqwest::Error) -> Self {
        GraphOrmError::Connectivity(format!("Network error: {}", err))
    }
}

impl From<toml::de::Error> for GraphOrmError {
    fn from(err: toml::de::Error) -> Self {
        GraphOrmError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for GraphOrmError {
    fn from(err: toml::ser::Error) -> Self {
        GraphOrmError::Serialization(format!("TOML serialization error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, GraphOrmError>;

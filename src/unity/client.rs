use crate::error::{GraphOrmError, Result};
use crate::unity::types::{ListTablesResponse, TableInfo, TableMetadata};
use reqwest::{Client, StatusCode};

/// Unity Catalog client for interacting with Databricks metadata APIs.
///
/// # Example
///
/// ```no_run
/// use graphorm::unity::UnityClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = UnityClient::new(
///     "https://workspace.databricks.com".to_string(),
///     "dapi_token_here".to_string()
/// )?;
///
/// let tables = client.list_tables("main", "sales").await?;
/// # Ok(())
/// # }
/// ```
pub struct UnityClient {
    base_url: String,
    token: String,
    client: Client,
}

impl UnityClient {
    /// Create a new Unity Catalog client
    ///
    /// # Arguments
    ///
    /// * `host` - Databricks workspace URL (e.g., "https://dbc-xxx-yyy.cloud.databricks.com")
    /// * `token` - Databricks access token
    pub fn new(host: String, token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| GraphOrmError::Connectivity(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: host.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    /// Client for `host` authenticated with the `DATABRICKS_TOKEN` environment variable
    pub fn from_env(host: &str) -> Result<Self> {
        let token = std::env::var("DATABRICKS_TOKEN").map_err(|_| {
            GraphOrmError::Config("DATABRICKS_TOKEN environment variable not set".to_string())
        })?;
        Self::new(host.to_string(), token)
    }

    /// List tables in a schema
    ///
    /// # API Endpoint
    ///
    /// `GET /api/2.1/unity-catalog/tables`
    /// Query params: catalog_name, schema_name
    pub async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<TableInfo>> {
        let url = format!("{}/api/2.1/unity-catalog/tables", self.base_url);

        tracing::debug!("Listing tables in {}.{}", catalog, schema);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .query(&[("catalog_name", catalog), ("schema_name", schema)])
            .send()
            .await?;

        check_status(response.status())?;

        let list_response: ListTablesResponse = response
            .json()
            .await
            .map_err(|e| GraphOrmError::UnityApi(format!("Failed to parse response: {}", e)))?;

        Ok(list_response.tables.unwrap_or_default())
    }

    /// Get detailed table metadata, including columns and constraints
    ///
    /// # API Endpoint
    ///
    /// `GET /api/2.1/unity-catalog/tables/{full_name}`
    pub async fn get_table(&self, full_name: &str) -> Result<TableMetadata> {
        let url = format!("{}/api/2.1/unity-catalog/tables/{}", self.base_url, full_name);

        tracing::debug!("Getting table metadata for {}", full_name);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        check_status(response.status())?;

        let metadata: TableMetadata = response
            .json()
            .await
            .map_err(|e| GraphOrmError::UnityApi(format!("Failed to parse response: {}", e)))?;

        Ok(metadata)
    }
}

/// Map HTTP error statuses onto the error taxonomy
fn check_status(status: StatusCode) -> Result<()> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GraphOrmError::Permission(
            "Invalid or expired Databricks token".to_string(),
        )),
        StatusCode::NOT_FOUND => Err(GraphOrmError::UnityApi(
            "Catalog, schema, or table not found".to_string(),
        )),
        status if status.is_server_error() => Err(GraphOrmError::Connectivity(format!(
            "Unity Catalog unavailable (status {})",
            status
        ))),
        status => Err(GraphOrmError::UnityApi(format!(
            "API request failed with status {}",
            status
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity_client_creation() {
        let client = UnityClient::new(
            "https://test.databricks.com".to_string(),
            "test_token".to_string(),
        )
        .unwrap();

        assert_eq!(client.base_url, "https://test.databricks.com");
        assert_eq!(client.token, "test_token");
    }

    #[test]
    fn test_unity_client_trims_trailing_slash() {
        let client = UnityClient::new(
            "https://test.databricks.com/".to_string(),
            "test_token".to_string(),
        )
        .unwrap();

        assert_eq!(client.base_url, "https://test.databricks.com");
    }

    #[test]
    fn test_status_classification() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN),
            Err(GraphOrmError::Permission(_))
        ));
        assert!(matches!(
            check_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(GraphOrmError::Connectivity(_))
        ));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND),
            Err(GraphOrmError::UnityApi(_))
        ));
    }
}

use graphorm::config::load_config;
use graphorm::error::{GraphOrmError, Result};
use graphorm::schema::SchemaBuilder;

/// Execute one query and print the response as JSON
pub async fn run(config_path: String, query: String) -> Result<()> {
    let config = load_config(&config_path)?;
    let api = SchemaBuilder::from_config(&config).await?.build().await?;

    let response = api.execute(async_graphql::Request::new(query)).await;
    for error in &response.errors {
        tracing::warn!("{}", error.message);
    }

    let json = serde_json::to_string_pretty(&response)
        .map_err(|e| GraphOrmError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

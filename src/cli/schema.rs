use graphorm::config::load_config;
use graphorm::error::Result;
use graphorm::schema::SchemaBuilder;

/// Print the textual dump of the generated schema
pub async fn run(config_path: String) -> Result<()> {
    let config = load_config(&config_path)?;
    let api = SchemaBuilder::from_config(&config).await?.build().await?;

    print!("{}", api.dump());
    Ok(())
}

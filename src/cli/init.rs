use graphorm::config::{save_config, Config};
use graphorm::error::{GraphOrmError, Result};
use graphorm::store::SqliteStore;
use graphorm::unity::{discover, UnityClient};
use std::path::Path;

const EXAMPLE_SQL: &str = r#"
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(255) NOT NULL DEFAULT ''
);

CREATE TABLE posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    title VARCHAR(255) NOT NULL DEFAULT '',
    published BOOLEAN NOT NULL DEFAULT 0,
    CONSTRAINT posts_user_id_foreign FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
);

INSERT INTO users (name) VALUES ('Kay');
INSERT INTO posts (user_id, title, published) VALUES (1, 'Hello from graphorm', 1);
"#;

/// Create the example SQLite database and a config pointing at it
pub async fn run_example(database: String, output: Option<String>) -> Result<()> {
    if Path::new(&database).exists() {
        return Err(GraphOrmError::Config(format!(
            "'{}' already exists; pass --database to choose another file",
            database
        )));
    }

    tracing::info!("🎨 Creating example database {}...", database);
    let store = SqliteStore::create(&database)?;
    store.execute_batch(EXAMPLE_SQL)?;
    tracing::info!("✨ Created tables users and posts with one row each");

    let config = Config::sqlite(&database);
    write_config(&config, output)
}

/// Discover tables and relations from Unity Catalog
pub async fn run_unity_catalog(
    host: String,
    catalog: String,
    schema: String,
    output: Option<String>,
) -> Result<()> {
    tracing::info!("🔍 Discovering tables in {}.{}...", catalog, schema);

    let client = UnityClient::from_env(&host)?;
    let discovery = discover(&client, &catalog, &schema).await?;

    if discovery.tables.is_empty() {
        tracing::warn!("No Delta tables found in {}.{}", catalog, schema);
        return Ok(());
    }

    tracing::info!("✅ Found {} Delta table(s)", discovery.tables.len());
    for table in &discovery.tables {
        tracing::info!("   • {}", table.full_name);
    }

    write_config(&discovery.to_config(&host), output)
}

fn write_config(config: &Config, output: Option<String>) -> Result<()> {
    if let Some(output_path) = output {
        save_config(config, &output_path)?;
        tracing::info!("📝 Generated {}", output_path);
        tracing::info!("🚀 Ready to serve! Run: graphorm serve --config {}", output_path);
    } else {
        config.validate().map_err(GraphOrmError::Config)?;
        println!("{}", toml::to_string_pretty(config)?);
        tracing::info!("💡 Tip: Add --output <file> to save to a file instead of stdout");
    }
    Ok(())
}

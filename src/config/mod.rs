mod types;

pub use types::{
    Backend, CatalogConfig, Config, DatabaseConfig, DatabricksConfig, NamingConfig,
    RelationConfig, ServerConfig, TableConfig,
};

use crate::error::{GraphOrmError, Result};
use std::fs;

/// Load configuration from a TOML file
pub fn load_config(path: &str) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .map_err(|e| GraphOrmError::Config(format!("Failed to read config file '{}': {}", path, e)))?;

    let config: Config = toml::from_str(&contents)?;
    config.validate().map_err(GraphOrmError::Config)?;

    Ok(config)
}

/// Save configuration to a TOML file
pub fn save_config(config: &Config, path: &str) -> Result<()> {
    config.validate().map_err(GraphOrmError::Config)?;

    let toml_string = toml::to_string_pretty(config)?;
    fs::write(path, toml_string)
        .map_err(|e| GraphOrmError::Config(format!("Failed to write config file '{}': {}", path, e)))?;

    Ok(())
}

use clap::{Parser, Subcommand};
use graphorm::error::Result;

mod cli;

#[derive(Parser)]
#[command(name = "graphorm")]
#[command(version = "0.1.0")]
#[command(about = "Reflect a database catalog into a GraphQL API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration from Unity Catalog or create an example SQLite database
    Init {
        /// Create an example SQLite database (no Unity Catalog needed!)
        #[arg(long)]
        example: bool,

        /// Example database file to create
        #[arg(long, default_value = "graphorm.db")]
        database: String,

        /// Databricks workspace URL (required unless --example is used)
        #[arg(long, required_unless_present = "example")]
        host: Option<String>,

        /// Unity Catalog name (required unless --example is used)
        #[arg(long, required_unless_present = "example")]
        catalog: Option<String>,

        /// Schema name (required unless --example is used)
        #[arg(long, required_unless_present = "example")]
        schema: Option<String>,

        /// Output config file path (if not specified, outputs to stdout)
        #[arg(long)]
        output: Option<String>,
    },

    /// Start GraphQL server
    Serve {
        /// Config file path
        #[arg(long, default_value = "graphorm.toml")]
        config: String,

        /// Server port (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the generated schema
    Schema {
        /// Config file path
        #[arg(long, default_value = "graphorm.toml")]
        config: String,
    },

    /// Execute one GraphQL query and print the JSON response
    Query {
        /// Config file path
        #[arg(long, default_value = "graphorm.toml")]
        config: String,

        /// GraphQL query document
        #[arg(long)]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { example, database, host, catalog, schema, output } => {
            if example {
                cli::init::run_example(database, output).await?;
            } else if let (Some(host), Some(catalog), Some(schema)) = (host, catalog, schema) {
                cli::init::run_unity_catalog(host, catalog, schema, output).await?;
            }
        }
        Commands::Serve { config, port } => {
            cli::serve::run(config, port).await?;
        }
        Commands::Schema { config } => {
            cli::schema::run(config).await?;
        }
        Commands::Query { config, query } => {
            cli::query::run(config, query).await?;
        }
    }

    Ok(())
}

use graphorm::config::load_config;
use graphorm::error::{GraphOrmError, Result};
use graphorm::schema::SchemaBuilder;

use async_graphql::dynamic::Schema;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::response::Html;
use axum::{routing::get, routing::post, Router};
use tower_http::cors::CorsLayer;

/// Run the serve command to start the GraphQL server
pub async fn run(config_path: String, port: Option<u16>) -> Result<()> {
    tracing::info!("📖 Loading configuration from {}", config_path);
    let config = load_config(&config_path)?;

    let port = port.unwrap_or(config.server.port);

    tracing::info!("🔧 Reflecting catalog...");
    let api = SchemaBuilder::from_config(&config).await?.build().await?;

    tracing::info!("✅ Schema built with {} types", api.graph().types().len());
    tracing::info!("🚀 GraphQL server running on http://{}:{}", config.server.bind, port);
    tracing::info!("📊 Playground: http://localhost:{}/graphql", port);

    start_http_server(api.schema().clone(), &config.server.bind, port).await
}

async fn start_http_server(schema: Schema, bind: &str, port: u16) -> Result<()> {
    let app = Router::new()
        .route("/graphql", post(graphql_handler).get(graphql_playground))
        .route("/health", get(health_check))
        .with_state(schema)
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        GraphOrmError::Config(format!("Failed to bind to {}: {}. Port may be in use.", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| GraphOrmError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

async fn graphql_handler(State(schema): State<Schema>, request: GraphQLRequest) -> GraphQLResponse {
    schema.execute(request.into_inner()).await.into()
}

async fn graphql_playground() -> Html<String> {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql"),
    ))
}

async fn health_check() -> &'static str {
    "OK"
}

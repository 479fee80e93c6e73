/// Integration tests for the DataFusion backend using CSV fixtures
///
/// These tests verify that:
/// 1. CSV tables register and reflect through their Arrow schemas
/// 2. Declared relations become has-many and belongs-to fields
/// 3. A config file drives the whole pipeline

mod delta_csv_tests {
    use async_graphql::Request;
    use graphorm::config::{load_config, Backend};
    use graphorm::error::GraphOrmError;
    use graphorm::schema::{GeneratedApi, SchemaBuilder};
    use graphorm::store::DeltaStore;
    use graphorm::ForeignKeyDescriptor;
    use serde_json::json;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Helper to get the path to test CSV files
    fn get_csv_path(filename: &str) -> String {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("fixtures");
        path.push("data");
        path.push(filename);
        path.to_string_lossy().to_string()
    }

    async fn blog_store(relations: Vec<ForeignKeyDescriptor>) -> Arc<DeltaStore> {
        let mut store = DeltaStore::new().with_relations(relations);
        store
            .register_table_from_path("users", &get_csv_path("users.csv"))
            .await
            .expect("Failed to register users CSV");
        store
            .register_table_from_path("posts", &get_csv_path("posts.csv"))
            .await
            .expect("Failed to register posts CSV");
        Arc::new(store)
    }

    async fn blog_api() -> GeneratedApi {
        let store = blog_store(vec![ForeignKeyDescriptor::new("posts", "user_id", "users", "id")]).await;
        SchemaBuilder::new(store.clone(), store)
            .build()
            .await
            .expect("Failed to build schema")
    }

    #[tokio::test]
    async fn test_users_with_posts() {
        let _ = tracing_subscriber::fmt::try_init();

        let api = blog_api().await;
        let response = api
            .execute(Request::new("{ users { id name posts { id title published } } }"))
            .await;

        assert!(response.errors.is_empty(), "Query errors: {:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "users": [
                { "id": "1", "name": "Kay", "posts": [
                    { "id": "1", "title": "X", "published": true },
                    { "id": "2", "title": "Y", "published": false }
                ] },
                { "id": "2", "name": "Lee", "posts": [] }
            ] })
        );
    }

    #[tokio::test]
    async fn test_posts_with_user() {
        let _ = tracing_subscriber::fmt::try_init();

        let api = blog_api().await;
        let response = api
            .execute(Request::new("{ posts { title userId user { name } } }"))
            .await;

        assert!(response.errors.is_empty(), "Query errors: {:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "posts": [
                { "title": "X", "userId": 1, "user": { "name": "Kay" } },
                { "title": "Y", "userId": 1, "user": { "name": "Kay" } }
            ] })
        );
    }

    #[tokio::test]
    async fn test_without_relations_only_scalars() {
        let store = blog_store(vec![]).await;
        let api = SchemaBuilder::new(store.clone(), store).build().await.unwrap();

        let user = api.graph().get("User").unwrap();
        let names: Vec<&str> = user.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
    }

    #[tokio::test]
    async fn test_relation_to_unknown_column_fails_build() {
        let store = blog_store(vec![ForeignKeyDescriptor::new(
            "posts", "author_id", "users", "id",
        )])
        .await;

        let err = SchemaBuilder::new(store.clone(), store).build().await.err().unwrap();
        assert!(matches!(err, GraphOrmError::Integrity { .. }), "{}", err);
    }

    #[tokio::test]
    async fn test_config_driven_build() {
        let _ = tracing_subscriber::fmt::try_init();

        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        let config_content = format!(
            r#"
[database]
backend = "delta"

[[database.table]]
name = "users"
location = "{}"

[[database.table]]
name = "posts"
location = "{}"

[[database.relation]]
table = "posts"
column = "user_id"
references_table = "users"

[naming]
belongs_to = "foreign_key_column"
"#,
            get_csv_path("users.csv").replace('\\', "/"),
            get_csv_path("posts.csv").replace('\\', "/")
        );
        temp_file.write_all(config_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.database.backend, Backend::Delta);

        let api = SchemaBuilder::from_config(&config)
            .await
            .unwrap()
            .build()
            .await
            .unwrap();

        assert!(api.dump().contains("  user: User\n"));

        let response = api.execute(Request::new("{ posts { id user { id } } }")).await;
        assert!(response.errors.is_empty(), "Query errors: {:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "posts": [
                { "id": "1", "user": { "id": "1" } },
                { "id": "2", "user": { "id": "1" } }
            ] })
        );
    }
}

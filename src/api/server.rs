use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::users;
use crate::config::Config;
use crate::storage::{Shard, ShardRouter, UserStorage};
use crate::user::UserService;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/create-user", post(users::create_user))
        .route("/get-user", get(users::get_user))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Opens every configured shard in order and puts them behind one router.
pub async fn connect_shards(config: &Config) -> Result<ShardRouter, crate::storage::StorageError> {
    let mut shards: Vec<Arc<dyn UserStorage>> = Vec::with_capacity(config.shards.len());
    for shard in &config.shards {
        let backend = Shard::connect(&shard.name, &shard.url, config.max_connections).await?;
        tracing::info!(shard = backend.name(), "shard connected");
        shards.push(Arc::new(backend));
    }

    ShardRouter::new(shards)
}

pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let router = connect_shards(&config).await?;
    tracing::info!(shards = router.shard_count(), "shard router ready");

    let state = Arc::new(AppState {
        users: UserService::new(Arc::new(router)),
    });

    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::response::ApiResponse;
    use crate::config::ShardConfig;
    use crate::db::models::User;
    use crate::storage::StorageError;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let config = Config {
            bind_addr: "127.0.0.1:0".to_string(),
            shards: (0..3)
                .map(|i| ShardConfig {
                    name: format!("shard{i}"),
                    url: "sqlite::memory:".to_string(),
                })
                .collect(),
            max_connections: 1,
            log_format: "text".to_string(),
        };
        let router = connect_shards(&config).await.unwrap();
        build_router(Arc::new(AppState {
            users: UserService::new(Arc::new(router)),
        }))
    }

    /// Storage whose every call fails as if the shard were unreachable.
    struct UnreachableStorage;

    #[async_trait]
    impl UserStorage for UnreachableStorage {
        async fn save(&self, _username: &str, _password: &str) -> Result<(), StorageError> {
            Err(StorageError::Query {
                shard: "shard7".to_string(),
                source: sqlx::Error::PoolTimedOut,
            })
        }

        async fn fetch(&self, _username: &str) -> Result<Option<User>, StorageError> {
            Err(StorageError::Query {
                shard: "shard7".to_string(),
                source: sqlx::Error::PoolTimedOut,
            })
        }
    }

    fn unreachable_app() -> Router {
        build_router(Arc::new(AppState {
            users: UserService::new(Arc::new(UnreachableStorage)),
        }))
    }

    async fn read_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn create_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/create-user")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: axum::response::Response,
    ) -> ApiResponse<T> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let app = test_app().await;

        let response = app
            .clone()
            .oneshot(create_request(r#"{"user":"alice","password":"pw1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: ApiResponse<serde_json::Value> = read_json(response).await;
        assert_eq!(body.message, "User created successfully");
        assert!(body.data.is_none());

        let response = app.oneshot(get_request("/get-user?user=alice")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: ApiResponse<User> = read_json(response).await;
        let user = body.data.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.password, "pw1");
    }

    #[tokio::test]
    async fn test_unknown_user_is_404() {
        let app = test_app().await;
        let response = app.oneshot(get_request("/get-user?user=ghost")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ApiResponse<serde_json::Value> = read_json(response).await;
        assert_eq!(body.message, "User not found");
    }

    #[tokio::test]
    async fn test_missing_user_param_is_400() {
        let app = test_app().await;
        for uri in ["/get-user", "/get-user?user="] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = test_app().await;
        for body in ["not json", r#"{"user":"alice"}"#, r#"{"user":1,"password":"x"}"#] {
            let response = app.clone().oneshot(create_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            let body: ApiResponse<serde_json::Value> = read_json(response).await;
            assert_eq!(body.message, "Invalid JSON");
        }
    }

    #[tokio::test]
    async fn test_duplicate_create_is_generic_500() {
        let app = test_app().await;
        let payload = r#"{"user":"bob","password":"pw"}"#;

        let first = app.clone().oneshot(create_request(payload)).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app.oneshot(create_request(payload)).await.unwrap();
        assert_eq!(second.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ApiResponse<serde_json::Value> = read_json(second).await;
        assert_eq!(body.message, "Error saving user");
    }

    #[tokio::test]
    async fn test_bad_query_string_keeps_envelope() {
        let app = test_app().await;
        let response = app.oneshot(get_request("/get-user?user=a&user=b")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ApiResponse<serde_json::Value> = read_json(response).await;
        assert_eq!(body.message, "The 'user' parameter is required");
        assert!(body.data.is_none());
    }

    #[tokio::test]
    async fn test_get_storage_failure_is_generic_500() {
        let response = unreachable_app()
            .oneshot(get_request("/get-user?user=alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let text = read_text(response).await;
        let body: ApiResponse<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(body.message, "Error retrieving user");
        assert!(body.data.is_none());
        assert!(!text.contains("shard7"), "{text}");
        assert!(!text.contains("timed out"), "{text}");
    }

    #[tokio::test]
    async fn test_create_storage_failure_is_generic_500() {
        let response = unreachable_app()
            .oneshot(create_request(r#"{"user":"alice","password":"pw"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let text = read_text(response).await;
        let body: ApiResponse<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(body.message, "Error saving user");
        assert!(!text.contains("shard7"), "{text}");
        assert!(!text.contains("timed out"), "{text}");
    }
}

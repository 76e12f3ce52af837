//! HTTP API for Keeper
//!
//! Thin axum adapter over the chat gateway and the timeline store; it
//! carries no contract beyond delegation.
//!
//! ## Endpoint Map
//!
//! | Route                          | Description                           |
//! |--------------------------------|---------------------------------------|
//! | `/health`                      | Load balancer health probe            |
//! | `/api/v1/chat`                 | One conversational turn               |
//! | `/api/v1/timelines/:user_id`   | Stored timeline for a user            |

use crate::gateway::ChatGateway;
use crate::timeline::TimelineStore;
use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ChatGateway>,
    pub store: Arc<TimelineStore>,
    /// Caller identity used when a chat request omits `user_id`
    pub default_user: String,
}

/// Build the complete Keeper HTTP application
pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    let cors = build_cors(cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/timelines/:user_id", get(get_timeline))
        .with_state(state)
        .layer(cors)
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    user_id: Option<String>,
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let user_id = request
        .user_id
        .unwrap_or_else(|| state.default_user.clone());

    match state.gateway.handle_message(&user_id, &request.message).await {
        Ok(response) => (
            StatusCode::OK,
            Json(serde_json::json!({"response": response})),
        ),
        Err(e) => {
            tracing::error!(%user_id, "Chat turn failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"error": {"code": "TURN_FAILED", "message": e.to_string()}})),
            )
        }
    }
}

async fn get_timeline(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.store.load_timeline(&user_id).await {
        Some(timeline) => (StatusCode::OK, Json(serde_json::to_value(timeline).unwrap_or_default())),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": {"code": "NOT_FOUND", "message": format!("No timeline for user '{}'", user_id)}})),
        ),
    }
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ResponseFragment, ScriptedRuntime};
    use crate::timeline::NewRecord;
    use tempfile::TempDir;

    async fn make_state() -> (AppState, Arc<ScriptedRuntime>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(
            TimelineStore::new(dir.path().to_path_buf())
                .await
                .unwrap(),
        );
        let runtime = Arc::new(ScriptedRuntime::new());
        let state = AppState {
            gateway: Arc::new(ChatGateway::new(runtime.clone())),
            store,
            default_user: "local".to_string(),
        };
        (state, runtime, dir)
    }

    #[tokio::test]
    async fn test_health_check() {
        let resp = health_check().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chat_returns_aggregated_response() {
        let (state, runtime, _dir) = make_state().await;
        runtime
            .push_turn(vec![
                Ok(ResponseFragment::text(" A ")),
                Ok(ResponseFragment::text("B")),
            ])
            .await;

        let resp = chat(
            State(state),
            Json(ChatRequest {
                message: "hello".to_string(),
                user_id: Some("u1".to_string()),
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["response"], "AB");
    }

    #[tokio::test]
    async fn test_chat_turn_failure_is_an_error_response() {
        let (state, _runtime, _dir) = make_state().await;

        // No scripted turn queued: the runtime refuses
        let resp = chat(
            State(state),
            Json(ChatRequest {
                message: "hello".to_string(),
                user_id: None,
            }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_get_timeline() {
        let (state, _runtime, _dir) = make_state().await;
        state
            .store
            .upsert_append("u1", NewRecord::information("I like tea"))
            .await
            .unwrap();

        let resp = get_timeline(State(state.clone()), Path("u1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = get_timeline(State(state), Path("nobody".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_build_cors_empty_origins() {
        let _cors = build_cors(&[]);
    }

    #[test]
    fn test_build_cors_with_origins() {
        let _cors = build_cors(&["http://localhost:1420".to_string()]);
    }
}

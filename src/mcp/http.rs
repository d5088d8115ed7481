//! Streamable HTTP transport with JSON responses only.
//!
//! `POST /mcp` takes one JSON-RPC message and answers with one JSON body.
//! SSE streams and sessions are not offered, so `GET /mcp` and
//! `DELETE /mcp` answer 405.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::mcp::protocol::{JsonRpcResponse, error_codes};
use crate::mcp::server::McpServer;

/// Maximum JSON-RPC request body (1 MiB).
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the MCP router.
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route(
            "/mcp",
            post(mcp_handler)
                .get(method_not_allowed)
                .delete(method_not_allowed),
        )
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(
    addr: SocketAddr,
    server: Arc<McpServer>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::StartupFailed {
            reason: format!("Failed to bind to {}: {}", addr, e),
        })?;

    let local_addr = listener.local_addr()?;
    tracing::info!("MCP server listening on http://{}/mcp", local_addr);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("MCP server shutting down");
        })
        .await?;

    Ok(())
}

async fn mcp_handler(State(server): State<Arc<McpServer>>, body: Bytes) -> Response {
    match server.handle_bytes(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn method_not_allowed() -> (StatusCode, Json<JsonRpcResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(JsonRpcResponse::error(
            Value::Null,
            error_codes::METHOD_NOT_ALLOWED,
            "Method not allowed.",
        )),
    )
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy" })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::tools::ToolRegistry;

    fn app() -> Router {
        router(Arc::new(McpServer::new(Arc::new(ToolRegistry::new()))))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json, text/event-stream")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_request_returns_json() {
        let response = app()
            .oneshot(post_json(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_post_notification_is_accepted() {
        let response = app()
            .oneshot(post_json(
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_post_null_id_gets_response() {
        let response = app()
            .oneshot(post_json(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_post_garbage_is_parse_error() {
        let response = app().oneshot(post_json("{{{")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_get_and_delete_not_allowed() {
        for method in [Method::GET, Method::DELETE] {
            let response = app()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri("/mcp")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            let body = body_json(response).await;
            assert_eq!(body["error"]["message"], "Method not allowed.");
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn test_serve_binds_and_shuts_down() {
        let server = Arc::new(McpServer::new(Arc::new(ToolRegistry::new())));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let addr = "127.0.0.1:0".parse().unwrap();
        let handle = tokio::spawn(serve(addr, server, async {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}

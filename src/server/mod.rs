//! OpenAI-compatible HTTP server backed by CLI subprocesses.
//!
//! Two endpoints:
//!
//! - `POST /v1/chat/completions` — accepts OpenAI-format requests,
//!   translates them through the [`bridge`](crate::bridge), and answers in
//!   OpenAI format, streaming (SSE) or not;
//! - `GET /v1/models` — the static model list.
//!
//! Requests pass through panic recovery, request logging, and optional
//! bearer-token auth, in that order.

mod handlers;
mod middleware;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;

use crate::chat;
use crate::oai::{ErrorDetail, ErrorResponse};

/// Settings for [`Server::new`].
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// TCP address to listen on, e.g. "0.0.0.0:8080".
    pub addr: String,
    /// Expected bearer token. Empty disables authentication.
    pub api_key: String,
}

pub(crate) struct AppState {
    pub client: Arc<chat::Client>,
    pub api_key: String,
}

/// The assembled HTTP server.
pub struct Server {
    addr: String,
    router: Router,
}

impl Server {
    /// Create a server routing onto the given subprocess client.
    pub fn new(config: ServerConfig, client: Arc<chat::Client>) -> Self {
        let state = Arc::new(AppState {
            client,
            api_key: config.api_key,
        });

        // Layers run outermost-last: recovery wraps logging wraps auth.
        let router = Router::new()
            .route(
                "/v1/chat/completions",
                post(handlers::chat_completions).fallback(handlers::post_only),
            )
            .route(
                "/v1/models",
                get(handlers::models).fallback(handlers::get_only),
            )
            .layer(axum::middleware::from_fn_with_state(
                Arc::clone(&state),
                middleware::auth,
            ))
            .layer(axum::middleware::from_fn(middleware::log_requests))
            .layer(axum::middleware::from_fn(middleware::recover_panics))
            .with_state(state);

        Self {
            addr: config.addr,
            router,
        }
    }

    /// The router with the full middleware stack, for custom serving
    /// arrangements or tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind and serve until SIGINT/SIGTERM, then drain in-flight requests.
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("installing SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutting down server...");
}

/// Build the standard JSON error response body.
pub(crate) fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: ErrorDetail {
                message: message.to_string(),
                kind: kind.to_string(),
                code: None,
            },
        }),
    )
        .into_response()
}

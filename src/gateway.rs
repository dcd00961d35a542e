use crate::config::SseConfig;
use crate::mcp::{handlers, sse, ToolExecutor};
use crate::upstream::MarketSource;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    Json, Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::Level;

pub const BANNER: &str = "Polymarket MCP Server is running. Connect via /sse for the event stream and POST JSON-RPC messages to /messages.";

#[derive(Clone)]
pub struct AppState {
    pub executor: ToolExecutor,
    pub keepalive: Duration,
    sessions: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(source: Arc<dyn MarketSource>, sse: &SseConfig) -> Self {
        Self {
            executor: ToolExecutor::new(source),
            keepalive: sse.keepalive_interval(),
            sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of event streams currently open.
    pub fn active_sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Preflight,
    EventStream,
    Messages,
    Banner,
}

impl Route {
    /// First match wins: preflight, then `/sse`, then `POST .../messages`.
    pub fn classify(method: &Method, path: &str) -> Self {
        if method == Method::OPTIONS {
            Route::Preflight
        } else if path.ends_with("/sse") {
            Route::EventStream
        } else if path.ends_with("/messages") && method == Method::POST {
            Route::Messages
        } else {
            Route::Banner
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(route_request)
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET,POST,OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("*"),
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_request(|_request: &Request, _span: &tracing::Span| {
                    tracing::event!(Level::DEBUG, "received request");
                })
                .on_response(
                    |_response: &Response, latency: Duration, _span: &tracing::Span| {
                        tracing::event!(Level::INFO, latency = ?latency, "request completed");
                    },
                )
                .on_failure(
                    |_error: tower_http::classify::ServerErrorsFailureClass,
                     _latency: Duration,
                     _span: &tracing::Span| {
                        tracing::event!(Level::ERROR, "request failed");
                    },
                ),
        )
}

async fn route_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match Route::classify(&method, uri.path()) {
        Route::Preflight => StatusCode::OK.into_response(),
        Route::EventStream => sse::event_stream(state.keepalive, state.sessions.clone()),
        Route::Messages => {
            let (status, response) = match body {
                Ok(body) => handlers::handle_message(&state.executor, &body).await,
                Err(rejection) => handlers::unreadable_body(rejection),
            };
            (status, Json(response)).into_response()
        }
        Route::Banner => BANNER.into_response(),
    }
}

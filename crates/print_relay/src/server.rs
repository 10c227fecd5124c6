/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::BytesRejection, State},
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn};

use crate::config::RelayConfig;
use crate::relay::{PrintRelay, RelayError};

static REQ_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> String {
    let id = REQ_ID.fetch_add(1, Ordering::Relaxed);
    format!("req-{id}")
}

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<PrintRelay>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(relay: PrintRelay, max_body_bytes: usize) -> Self {
        Self {
            relay: Arc::new(relay),
            max_body_bytes,
        }
    }

    pub fn from_config(cfg: &RelayConfig) -> Result<Self> {
        Ok(Self::new(PrintRelay::from_config(cfg)?, cfg.max_body_bytes))
    }
}

pub fn router(state: AppState) -> Router {
    let max_body = state.max_body_bytes;
    Router::new()
        .route("/api/print", post(print))
        .route("/healthz", get(healthz))
        .layer(axum::extract::DefaultBodyLimit::max(max_body))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("req");
                info_span!(
                    "http",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id
                )
            }),
        )
        .layer(from_fn(ensure_request_id))
        .with_state(state)
}

pub async fn serve(cfg: RelayConfig) -> Result<()> {
    let state = AppState::from_config(&cfg)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;
    info!("print_relay listening on http://{}", cfg.bind);
    info!("forwarding print requests to {}", cfg.upstream_url);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("ctrl_c handler failed: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn print(State(state): State<AppState>, body: Result<Bytes, BytesRejection>) -> Response {
    let body = match body {
        Ok(b) => b,
        Err(e) => {
            warn!("print body rejected: {e}");
            return RelayError::InvalidImage.into_response();
        }
    };
    let req = match PrintRelay::parse_request(&body) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };
    match state.relay.handle(&req).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn ensure_request_id(mut req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let request_id = match req.headers().get("x-request-id").cloned() {
        Some(v) => v,
        None => {
            let v = HeaderValue::from_str(&next_request_id())
                .unwrap_or_else(|_| HeaderValue::from_static("req"));
            req.headers_mut().insert("x-request-id", v.clone());
            v
        }
    };
    let mut resp = next.run(req).await;
    resp.headers_mut().insert("x-request-id", request_id);
    resp
}

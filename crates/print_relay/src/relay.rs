/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::Result;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use print_relay_protocol::{ErrorBody, PrintRequest};
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::RelayConfig;

#[derive(Debug, Error)]
pub enum RelayError {
    /// `image` missing, empty, not a string, or not a `data:image` URI.
    #[error("圖片格式錯誤")]
    InvalidImage,
    /// Anything that went wrong talking to the print server or reading its reply.
    #[error("無法連線到列印伺服器")]
    Downstream(#[source] reqwest::Error),
}

impl RelayError {
    pub fn detail(&self) -> Option<String> {
        match self {
            RelayError::InvalidImage => None,
            RelayError::Downstream(e) => Some(error_chain(e)),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.to_string(), self.detail())
    }
}

// Failures are reported in-body; the transport always answers 200.
impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.to_body())).into_response()
    }
}

/// Forwards print requests to a single print server endpoint.
///
/// Holds no per-call state: every `handle` is one validation plus at most one
/// outbound POST.
#[derive(Clone)]
pub struct PrintRelay {
    http: reqwest::Client,
    upstream_url: Url,
}

impl PrintRelay {
    pub fn new(http: reqwest::Client, upstream_url: Url) -> Self {
        Self { http, upstream_url }
    }

    pub fn from_config(cfg: &RelayConfig) -> Result<Self> {
        Ok(Self::new(cfg.build_http_client()?, cfg.upstream_url.clone()))
    }

    pub fn upstream_url(&self) -> &Url {
        &self.upstream_url
    }

    /// Parses a raw inbound body. Anything that is not a JSON object with a
    /// string `image` counts as a bad image.
    pub fn parse_request(body: &[u8]) -> Result<PrintRequest, RelayError> {
        let value = serde_json::from_slice::<Value>(body).map_err(|e| {
            warn!("rejecting print request body: {e}");
            RelayError::InvalidImage
        })?;
        // Derived struct deserializers also accept arrays by position.
        if !value.is_object() {
            warn!("rejecting print request body: not a json object");
            return Err(RelayError::InvalidImage);
        }
        serde_json::from_value::<PrintRequest>(value).map_err(|e| {
            warn!("rejecting print request body: {e}");
            RelayError::InvalidImage
        })
    }

    pub async fn handle(&self, req: &PrintRequest) -> Result<Value, RelayError> {
        if req.image_data_uri().is_none() {
            warn!(
                image_len = req.image.as_deref().map(str::len).unwrap_or(0),
                "rejecting print request: image is not a data:image uri"
            );
            return Err(RelayError::InvalidImage);
        }

        let resp = self
            .http
            .post(self.upstream_url.clone())
            .json(req)
            .send()
            .await
            .map_err(|e| self.downstream_failure(e))?;
        let status = resp.status();
        let value = resp
            .json::<Value>()
            .await
            .map_err(|e| self.downstream_failure(e))?;
        debug!(upstream = %self.upstream_url, %status, "print server responded");
        Ok(value)
    }

    fn downstream_failure(&self, e: reqwest::Error) -> RelayError {
        warn!(
            upstream = %self.upstream_url,
            timeout = e.is_timeout(),
            "print server call failed: {}",
            error_chain(&e)
        );
        RelayError::Downstream(e)
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        out.push_str(": ");
        out.push_str(&e.to_string());
        source = e.source();
    }
    out
}

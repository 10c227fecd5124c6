/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use anyhow::{bail, Context, Result};
use reqwest::Url;
use std::{net::SocketAddr, str::FromStr, time::Duration};

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:8787/print";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind: SocketAddr,
    /// Print server endpoint every accepted request is POSTed to.
    pub upstream_url: Url,
    pub http_timeout: Duration,
    pub http_connect_timeout: Duration,
    /// 0 disables idle pooling: every relayed request opens a fresh connection.
    pub http_pool_max_idle_per_host: usize,
    pub max_body_bytes: usize,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = get("PRINT_RELAY_BIND")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind
            .parse()
            .with_context(|| format!("PRINT_RELAY_BIND invalid: {bind}"))?;

        let upstream = get("PRINT_RELAY_UPSTREAM_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());
        let upstream_url = parse_upstream(&upstream)?;

        let http_timeout_secs = parse_or::<u64>(&get, "PRINT_RELAY_HTTP_TIMEOUT_SECS", 30).clamp(1, 300);
        let http_connect_timeout_secs =
            parse_or::<u64>(&get, "PRINT_RELAY_HTTP_CONNECT_TIMEOUT_SECS", 5).clamp(1, 60);
        let http_pool_max_idle_per_host =
            parse_or::<usize>(&get, "PRINT_RELAY_HTTP_POOL_MAX_IDLE_PER_HOST", 0).min(64);
        let max_body_bytes = parse_or::<usize>(&get, "PRINT_RELAY_MAX_BODY_BYTES", 32 * 1024 * 1024)
            .clamp(1024, 256 * 1024 * 1024);

        Ok(Self {
            bind,
            upstream_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
            http_connect_timeout: Duration::from_secs(http_connect_timeout_secs),
            http_pool_max_idle_per_host,
            max_body_bytes,
        })
    }

    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.http_timeout)
            .connect_timeout(self.http_connect_timeout)
            .pool_max_idle_per_host(self.http_pool_max_idle_per_host)
            .build()
            .context("http client init")
    }
}

fn parse_upstream(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("PRINT_RELAY_UPSTREAM_URL invalid: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("PRINT_RELAY_UPSTREAM_URL must be http or https: {raw}");
    }
    Ok(url)
}

fn parse_or<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    get(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_print_server() {
        let cfg = RelayConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.upstream_url.as_str(), "http://localhost:8787/print");
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.http_connect_timeout, Duration::from_secs(5));
        assert_eq!(cfg.http_pool_max_idle_per_host, 0);
        assert_eq!(cfg.max_body_bytes, 32 * 1024 * 1024);
    }

    #[test]
    fn overrides_are_parsed_and_clamped() {
        let cfg = RelayConfig::from_lookup(lookup(&[
            ("PRINT_RELAY_BIND", "127.0.0.1:9000"),
            ("PRINT_RELAY_UPSTREAM_URL", " http://printer.lan:8787/print "),
            ("PRINT_RELAY_HTTP_TIMEOUT_SECS", "0"),
            ("PRINT_RELAY_HTTP_CONNECT_TIMEOUT_SECS", "999"),
            ("PRINT_RELAY_HTTP_POOL_MAX_IDLE_PER_HOST", "4"),
            ("PRINT_RELAY_MAX_BODY_BYTES", "not-a-number"),
        ]))
        .unwrap();
        assert_eq!(cfg.bind.port(), 9000);
        assert_eq!(cfg.upstream_url.host_str(), Some("printer.lan"));
        assert_eq!(cfg.http_timeout, Duration::from_secs(1));
        assert_eq!(cfg.http_connect_timeout, Duration::from_secs(60));
        assert_eq!(cfg.http_pool_max_idle_per_host, 4);
        assert_eq!(cfg.max_body_bytes, 32 * 1024 * 1024);
    }

    #[test]
    fn rejects_bad_bind_and_upstream() {
        assert!(RelayConfig::from_lookup(lookup(&[("PRINT_RELAY_BIND", "localhost")])).is_err());
        assert!(RelayConfig::from_lookup(lookup(&[("PRINT_RELAY_UPSTREAM_URL", "/print")])).is_err());
        assert!(RelayConfig::from_lookup(lookup(&[("PRINT_RELAY_UPSTREAM_URL", "ftp://host/print")])).is_err());
    }
}

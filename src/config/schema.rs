//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! application. All types derive Serde traits for deserialization from
//! config files; every section may be omitted.

use std::collections::BTreeMap;
use std::path::PathBuf;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::validation::ValidationError;
use crate::routing::ResponseOptions;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Router-level defaults.
    pub router: RouterConfig,

    /// Log output settings.
    pub logger: LoggerConfig,

    /// Metrics exporter settings.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind and to fall back to when a request has no Host header.
    pub host: String,

    pub port: u16,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3030,
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// `host:port`, as passed to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL for requests that carry no Host header.
    pub fn origin(&self) -> Result<url::Url, url::ParseError> {
        url::Url::parse(&format!("http://{}:{}", self.host, self.port))
    }
}

/// Router defaults applied to every route.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Headers added to every response that does not set them.
    pub default_headers: BTreeMap<String, String>,

    pub default_options: ResponseOptions,
}

impl RouterConfig {
    /// Default headers as a typed map.
    pub fn header_map(&self) -> Result<HeaderMap, ValidationError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ValidationError::InvalidHeaderName(name.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| ValidationError::InvalidHeaderValue(name.clone()))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Filter directive, e.g. `"info"` or `"modkit=debug,tower_http=info"`.
    /// `RUST_LOG` takes precedence.
    pub level: String,

    pub format: LogFormat,

    /// When set, logs are also appended to `<dir>/application.log`.
    pub dir: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            dir: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.server.bind_address(), "localhost:3030");
        assert_eq!(config.server.max_body_bytes, 2_097_152);
        assert_eq!(config.logger.format, LogFormat::Pretty);
        assert!(!config.observability.metrics_enabled);
        assert!(config.router.default_options.json_response.is_none());
    }

    #[test]
    fn test_full_config() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [router]
            default_headers = { "content-type" = "application/json", "x-powered-by" = "modkit" }
            [router.default_options]
            json_response = true

            [logger]
            level = "debug"
            format = "json"
            dir = "/tmp/logs"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.router.default_options.json_response, Some(true));
        assert_eq!(config.logger.format, LogFormat::Json);
        assert_eq!(config.logger.dir, Some(PathBuf::from("/tmp/logs")));

        let headers = config.router.header_map().unwrap();
        assert_eq!(headers["x-powered-by"], "modkit");
    }

    #[test]
    fn test_origin() {
        let origin = ServerConfig::default().origin().unwrap();
        assert_eq!(origin.as_str(), "http://localhost:3030/");
    }
}

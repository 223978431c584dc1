//! Narrow interfaces to the collaborators the computation consumes.
//!
//! Network access, image fetching and display formatting all live outside
//! this workspace. The computation only sees these traits, which keeps it
//! testable with in-memory doubles.

use crate::error::ComputeError;
use crate::plugin::PluginResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Turns an image URL into an embeddable string (base64 data or the URL itself)
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    async fn encode(&self, url: &str) -> anyhow::Result<String>;
}

/// Image encoder used when base64 embedding is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl ImageEncoder for Passthrough {
    async fn encode(&self, url: &str) -> anyhow::Result<String> {
        Ok(url.to_string())
    }
}

/// Display helpers plus the wrapper every escalated error goes through
pub trait Formatter: Send + Sync {
    fn bytes(&self, bytes: u64) -> String;

    fn date(&self, at: DateTime<Utc>) -> String;

    /// Plural suffix for `count`
    fn plural(&self, count: u64) -> &'static str {
        if count == 1 {
            ""
        } else {
            "s"
        }
    }

    fn error(&self, error: ComputeError) -> ComputeError;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

const BYTE_UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

impl Formatter for DefaultFormatter {
    fn bytes(&self, bytes: u64) -> String {
        let mut value = bytes as f64;
        let mut unit = 0;
        while value >= 1000.0 && unit < BYTE_UNITS.len() - 1 {
            value /= 1000.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{} {}", bytes, BYTE_UNITS[0])
        } else {
            let rounded = format!("{:.1}", value);
            let trimmed = rounded.strip_suffix(".0").unwrap_or(&rounded);
            format!("{} {}", trimmed, BYTE_UNITS[unit])
        }
    }

    fn date(&self, at: DateTime<Utc>) -> String {
        at.format("%-d %b %Y, %H:%M (UTC)").to_string()
    }

    fn error(&self, error: ComputeError) -> ComputeError {
        match error {
            wrapped @ ComputeError::Wrapped(_) => wrapped,
            other => ComputeError::Wrapped(Box::new(other)),
        }
    }
}

/// Minimal HTTP surface, only used to read response headers
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue `route` (e.g. `"HEAD /"`) and return the response headers
    async fn head(&self, route: &str) -> anyhow::Result<BTreeMap<String, String>>;
}

/// HTTP client for runs without network access; every request fails
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl HttpClient for Offline {
    async fn head(&self, route: &str) -> anyhow::Result<BTreeMap<String, String>> {
        anyhow::bail!("no HTTP client configured for {}", route)
    }
}

/// Notified once per plugin, whatever the outcome
#[async_trait]
pub trait PluginCallback: Send + Sync {
    async fn on_plugin(
        &self,
        login: &str,
        name: &str,
        succeeded: bool,
        result: &PluginResult,
    ) -> anyhow::Result<()>;
}

/// Collaborators handed to the computation and to every plugin
#[derive(Clone)]
pub struct Imports {
    pub image_encoder: Arc<dyn ImageEncoder>,
    pub formatter: Arc<dyn Formatter>,
    pub http: Arc<dyn HttpClient>,
}

impl Imports {
    pub fn new(
        image_encoder: Arc<dyn ImageEncoder>,
        formatter: Arc<dyn Formatter>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            image_encoder,
            formatter,
            http,
        }
    }

    pub fn with_image_encoder(mut self, image_encoder: Arc<dyn ImageEncoder>) -> Self {
        self.image_encoder = image_encoder;
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_http(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = http;
        self
    }
}

impl Default for Imports {
    fn default() -> Self {
        Self::new(
            Arc::new(Passthrough),
            Arc::new(DefaultFormatter),
            Arc::new(Offline),
        )
    }
}

impl std::fmt::Debug for Imports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Imports").finish_non_exhaustive()
    }
}

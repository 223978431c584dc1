//! Plugin contract: one async capability shared by every enrichment task
use crate::context::ComputationContext;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

/// Options handed to a plugin: `extras`, `sandbox`, then its configured options
pub type PluginOptions = Map<String, Value>;

/// What ends up in a plugin's slot
pub type PluginResult = Result<Value, PluginError>;

/// Contract of an enrichment task
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Run against the shared context. Errors are recorded, never escalated.
    async fn run(&self, ctx: Arc<ComputationContext>, options: PluginOptions) -> anyhow::Result<Value>;
}

/// Adapter turning an async closure into a [`Plugin`]
pub struct FnPlugin<F>(F);

/// Build a plugin from an async closure
pub fn plugin_fn<F, Fut>(f: F) -> FnPlugin<F>
where
    F: Fn(Arc<ComputationContext>, PluginOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    FnPlugin(f)
}

#[async_trait]
impl<F, Fut> Plugin for FnPlugin<F>
where
    F: Fn(Arc<ComputationContext>, PluginOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn run(&self, ctx: Arc<ComputationContext>, options: PluginOptions) -> anyhow::Result<Value> {
        (self.0)(ctx, options).await
    }
}

/// The error a plugin failed with, kept as-is and cheaply cloneable
#[derive(Debug, Clone)]
pub struct PluginError(Arc<anyhow::Error>);

impl PluginError {
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    /// Failure recorded for a plugin that panicked
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::new(anyhow::anyhow!("plugin panicked: {}", message))
    }

    /// The original error object
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PluginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Whether a slot counts as a success: an `Ok` value that does not carry
/// an `error` field.
pub fn succeeded(result: &PluginResult) -> bool {
    match result {
        Ok(value) => value.get("error").is_none(),
        Err(_) => false,
    }
}

/// Resolved value of one task in the pending set
#[derive(Debug, Clone)]
pub struct PluginOutcome {
    pub name: String,
    pub result: PluginResult,
}

impl PluginOutcome {
    pub fn success(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            result: Ok(value),
        }
    }

    pub fn failure(name: impl Into<String>, error: PluginError) -> Self {
        Self {
            name: name.into(),
            result: Err(error),
        }
    }

    pub fn is_success(&self) -> bool {
        succeeded(&self.result)
    }
}

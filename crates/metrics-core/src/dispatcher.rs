//! Task Dispatcher: launches requested plugins with per-plugin failure isolation
use crate::collaborators::PluginCallback;
use crate::context::ComputationContext;
use crate::outputs::PluginOutputs;
use crate::pending::PendingTaskSet;
use crate::plugin::{succeeded, PluginError, PluginOptions, PluginOutcome, PluginResult};
use crate::registry::PluginRegistry;
use futures::FutureExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, Instrument};

pub struct TaskDispatcher {
    registry: Arc<PluginRegistry>,
    plugin_options: BTreeMap<String, Value>,
    extras: Value,
    sandbox: bool,
    callback: Option<Arc<dyn PluginCallback>>,
}

impl TaskDispatcher {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            plugin_options: BTreeMap::new(),
            extras: Value::Bool(false),
            sandbox: false,
            callback: None,
        }
    }

    /// Configured options per plugin name
    pub fn with_plugin_options(mut self, options: BTreeMap<String, Value>) -> Self {
        self.plugin_options = options;
        self
    }

    pub fn with_extras(mut self, extras: Value) -> Self {
        self.extras = extras;
        self
    }

    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn with_callback(mut self, callback: Arc<dyn PluginCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Options for `name`: `extras` and `sandbox`, overridden by its configured options
    pub fn options_for(&self, name: &str) -> PluginOptions {
        let mut options = PluginOptions::new();
        options.insert("extras".to_string(), self.extras.clone());
        options.insert("sandbox".to_string(), Value::Bool(self.sandbox));
        if let Some(Value::Object(configured)) = self.plugin_options.get(name) {
            for (key, value) in configured {
                options.insert(key.clone(), value.clone());
            }
        }
        options
    }

    /// Launch one task per registered plugin the query asks for.
    ///
    /// Requested names missing from the registry are skipped. Each task
    /// records its result (or its error) under its own name in `outputs`,
    /// notifies the callback, and resolves to a [`PluginOutcome`]. Returns
    /// the launched names in registry order.
    pub fn dispatch(
        &self,
        ctx: &Arc<ComputationContext>,
        outputs: &PluginOutputs,
        pending: &mut PendingTaskSet,
    ) -> Vec<String> {
        let mut launched = Vec::new();

        for (name, plugin) in self.registry.iter() {
            if !ctx.requested(name) {
                continue;
            }

            let name = name.to_string();
            let plugin = plugin.clone();
            let options = self.options_for(&name);
            let ctx = ctx.clone();
            let outputs = outputs.clone();
            let callback = self.callback.clone();
            let span = tracing::debug_span!(
                "plugin",
                login = %ctx.login,
                plugin = %name,
                trace_id = %ctx.trace_id
            );

            let task_name = name.clone();
            pending.spawn(
                name.clone(),
                async move {
                    let login = ctx.login.clone();
                    debug!("metrics/compute/{}/plugins > {} > started", login, name);

                    let result: PluginResult =
                        match AssertUnwindSafe(plugin.run(ctx, options)).catch_unwind().await {
                            Ok(Ok(value)) => {
                                debug!("metrics/compute/{}/plugins > {} > completed", login, name);
                                Ok(value)
                            }
                            Ok(Err(error)) => {
                                debug!("metrics/compute/{}/plugins > {} > completed (error)", login, name);
                                Err(PluginError::new(error))
                            }
                            Err(panic) => {
                                debug!("metrics/compute/{}/plugins > {} > completed (panic)", login, name);
                                Err(PluginError::from_panic(panic))
                            }
                        };

                    outputs.insert(name.clone(), result.clone());
                    debug!(plugin = %name, result = ?result, "plugin result stored");

                    if let Some(callback) = callback {
                        if let Err(error) = callback
                            .on_plugin(&login, &name, succeeded(&result), &result)
                            .await
                        {
                            debug!("metrics/compute/{}/plugins/callbacks > {} > {}", login, name, error);
                        }
                    }

                    PluginOutcome { name, result }
                }
                .instrument(span),
            );
            launched.push(task_name);
        }

        launched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::QueryFlags;
    use crate::data_model::Dataset;
    use crate::plugin::plugin_fn;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn context(requested: &[&str]) -> Arc<ComputationContext> {
        let mut query = QueryFlags::new();
        for name in requested {
            query.insert(name.to_string(), json!(true));
        }
        Arc::new(ComputationContext::new("octocat", Arc::new(Dataset::default())).with_query(query))
    }

    fn registry() -> Arc<PluginRegistry> {
        let registry = PluginRegistry::builder()
            .register(
                "isocalendar",
                plugin_fn(|ctx: Arc<ComputationContext>, _options: PluginOptions| async move {
                    Ok(json!({ "svg": format!("<svg data-login=\"{}\"/>", ctx.login) }))
                }),
            )
            .unwrap()
            .register(
                "broken",
                plugin_fn(|_ctx: Arc<ComputationContext>, _options: PluginOptions| async {
                    Err(anyhow::anyhow!("upstream returned 502"))
                }),
            )
            .unwrap()
            .register(
                "echo",
                plugin_fn(|_ctx: Arc<ComputationContext>, options: PluginOptions| async move {
                    Ok(Value::Object(options))
                }),
            )
            .unwrap()
            .build();
        Arc::new(registry)
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, String, bool)>>,
    }

    #[async_trait]
    impl PluginCallback for Recorder {
        async fn on_plugin(
            &self,
            login: &str,
            name: &str,
            succeeded: bool,
            _result: &PluginResult,
        ) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((login.to_string(), name.to_string(), succeeded));
            anyhow::bail!("callback endpoint unavailable")
        }
    }

    #[tokio::test]
    async fn test_one_outcome_per_requested_plugin() {
        let ctx = context(&["isocalendar", "broken", "echo", "not-registered"]);
        let outputs = PluginOutputs::new();
        let mut pending = PendingTaskSet::new();

        let launched = TaskDispatcher::new(registry()).dispatch(&ctx, &outputs, &mut pending);
        assert_eq!(launched, vec!["isocalendar", "broken", "echo"]);

        let outcomes = pending.drain().await;
        assert_eq!(outcomes.len(), 3);
        for name in ["isocalendar", "broken", "echo"] {
            assert_eq!(outcomes.iter().filter(|o| o.name == name).count(), 1);
        }
        assert!(!outputs.contains("not-registered"));
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_stored() {
        let ctx = context(&["isocalendar", "broken"]);
        let outputs = PluginOutputs::new();
        let mut pending = PendingTaskSet::new();

        TaskDispatcher::new(registry()).dispatch(&ctx, &outputs, &mut pending);
        pending.drain().await;

        let error = outputs.get("broken").unwrap().unwrap_err();
        assert_eq!(error.to_string(), "upstream returned 502");
        assert_eq!(
            outputs.value("isocalendar").unwrap()["svg"],
            json!("<svg data-login=\"octocat\"/>")
        );
    }

    #[tokio::test]
    async fn test_unrequested_plugins_not_launched() {
        let ctx = context(&["echo"]);
        let outputs = PluginOutputs::new();
        let mut pending = PendingTaskSet::new();

        let launched = TaskDispatcher::new(registry()).dispatch(&ctx, &outputs, &mut pending);
        assert_eq!(launched, vec!["echo"]);
        assert_eq!(pending.len(), 1);
        pending.drain().await;
        assert_eq!(outputs.names(), vec!["echo".to_string()]);
    }

    #[tokio::test]
    async fn test_options_merge_extras_sandbox_and_config() {
        let ctx = context(&["echo"]);
        let outputs = PluginOutputs::new();
        let mut pending = PendingTaskSet::new();
        let mut configured = BTreeMap::new();
        configured.insert("echo".to_string(), json!({ "limit": 5, "sandbox": true }));

        TaskDispatcher::new(registry())
            .with_extras(json!(["metrics.api.github.overuse"]))
            .with_plugin_options(configured)
            .dispatch(&ctx, &outputs, &mut pending);
        pending.drain().await;

        assert_eq!(
            outputs.value("echo").unwrap(),
            json!({ "extras": ["metrics.api.github.overuse"], "sandbox": true, "limit": 5 })
        );
    }

    #[tokio::test]
    async fn test_callback_always_called_and_failures_swallowed() {
        let ctx = context(&["isocalendar", "broken"]);
        let outputs = PluginOutputs::new();
        let mut pending = PendingTaskSet::new();
        let recorder = Arc::new(Recorder::default());

        TaskDispatcher::new(registry())
            .with_callback(recorder.clone())
            .dispatch(&ctx, &outputs, &mut pending);
        let outcomes = pending.drain().await;
        assert_eq!(outcomes.len(), 2);

        let mut calls = recorder.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                ("octocat".to_string(), "broken".to_string(), false),
                ("octocat".to_string(), "isocalendar".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_plugin_recorded_as_failure() {
        let registry = PluginRegistry::builder()
            .register(
                "fragile",
                plugin_fn(|ctx: Arc<ComputationContext>, _options: PluginOptions| async move {
                    if ctx.login == "octocat" {
                        panic!("index out of bounds");
                    }
                    Ok(json!(null))
                }),
            )
            .unwrap()
            .build();
        let ctx = context(&["fragile"]);
        let outputs = PluginOutputs::new();
        let mut pending = PendingTaskSet::new();

        TaskDispatcher::new(Arc::new(registry)).dispatch(&ctx, &outputs, &mut pending);
        let outcomes = pending.drain().await;

        assert_eq!(outcomes[0].name, "fragile");
        let error = outputs.get("fragile").unwrap().unwrap_err();
        assert_eq!(error.to_string(), "plugin panicked: index out of bounds");
    }
}

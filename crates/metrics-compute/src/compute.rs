//! Core computation entry point
use crate::aggregation::{self, AggregationPass};
use crate::config::ComputeConfig;
use crate::inputs::{dflags, CoreInputs};
use crate::remap::{self, ColorRemap, Season};
use crate::timezone::TimezoneResolver;
use chrono::{DateTime, Utc};
use metrics_core::{
    Account, ComputationContext, ComputeError, Computed, Dataset, DisplayMode, Imports,
    Passthrough, PendingTaskSet, PluginCallback, PluginOutputs, PluginRegistry,
    PresentationConfig, QueryFlags, TaskDispatcher, TimezoneConfig,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Message of the failure injected by `--error`
pub const INJECTED_FAILURE: &str = "Failed as requested by --error flag";

/// Who to compute metrics for, and which features the query asks for
#[derive(Debug, Clone, Default)]
pub struct ComputeRequest {
    pub login: String,
    pub query: QueryFlags,
    pub account: Account,
}

impl ComputeRequest {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: QueryFlags) -> Self {
        self.query = query;
        self
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.account = account;
        self
    }
}

/// Settings, plugins and collaborators shared across computations
#[derive(Clone)]
pub struct ComputeEnv {
    pub config: ComputeConfig,
    pub plugins: Arc<PluginRegistry>,
    pub imports: Imports,
    pub callbacks: Option<Arc<dyn PluginCallback>>,
    pub timezone: TimezoneResolver,
    /// Fixed clock; the wall clock when unset
    pub now: Option<DateTime<Utc>>,
}

impl ComputeEnv {
    pub fn new(config: ComputeConfig, plugins: Arc<PluginRegistry>) -> Self {
        Self {
            config,
            plugins,
            imports: Imports::default(),
            callbacks: None,
            timezone: TimezoneResolver::from_host(),
            now: None,
        }
    }

    pub fn with_imports(mut self, imports: Imports) -> Self {
        self.imports = imports;
        self
    }

    pub fn with_callbacks(mut self, callbacks: Arc<dyn PluginCallback>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn with_timezone_resolver(mut self, timezone: TimezoneResolver) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

impl std::fmt::Debug for ComputeEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeEnv")
            .field("config", &self.config)
            .field("plugins", &self.plugins.names().collect::<Vec<_>>())
            .field("callbacks", &self.callbacks.is_some())
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub version: String,
    pub author: String,
    pub generated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DataConfig {
    pub timezone: Option<TimezoneConfig>,
}

/// Output of a computation, filled in place.
///
/// `plugins` keeps filling up after [`compute`] returns, as the pending
/// tasks complete.
#[derive(Debug, Clone)]
pub struct MetricsData {
    pub dataset: Arc<Dataset>,
    pub computed: Arc<Computed>,
    pub plugins: PluginOutputs,
    pub config: DataConfig,
    pub large: bool,
    pub columns: bool,
    pub animated: bool,
    pub meta: Option<Meta>,
}

impl MetricsData {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            computed: Arc::new(Computed::default()),
            plugins: PluginOutputs::new(),
            config: DataConfig::default(),
            large: false,
            columns: false,
            animated: false,
            meta: None,
        }
    }
}

/// Compute core metrics for `request` into `data` and launch the requested plugins.
///
/// Plugin tasks (and the color remap barrier, when a seasonal flag is set)
/// are pushed onto `pending`; the caller drains it to observe them. Plugin
/// failures, degraded features and invalid inputs never fail the
/// computation. The only escalated failure is `--error`, passed through the
/// formatter.
pub async fn compute(
    request: ComputeRequest,
    data: &mut MetricsData,
    env: &ComputeEnv,
    pending: &mut PendingTaskSet,
) -> Result<(), ComputeError> {
    let ComputeRequest {
        login,
        query,
        account,
    } = request;
    let formatter = env.imports.formatter.clone();

    debug!("metrics/compute/{} > computing core metrics", login);
    let inputs = CoreInputs::resolve(&query);

    let imports = if inputs.base64 {
        env.imports.clone()
    } else {
        debug!("metrics/compute/{} > base64 encoding disabled", login);
        env.imports.clone().with_image_encoder(Arc::new(Passthrough))
    };

    let mut computed = AggregationPass::new(formatter.as_ref(), env.now()).run(&data.dataset);
    computed.avatar =
        aggregation::avatar(imports.image_encoder.as_ref(), &data.dataset.user.avatar_url).await;
    computed.token.scopes =
        aggregation::token_scopes(imports.http.as_ref(), env.config.settings.notoken).await;
    debug!(
        "metrics/compute/{} > token scopes: {:?}",
        login, computed.token.scopes
    );

    let timezone = env.timezone.resolve_configured(inputs.timezone.as_deref());
    if let Some(TimezoneConfig {
        name,
        error: Some(error),
        ..
    }) = &timezone
    {
        debug!("metrics/compute/{} > timezone {}: {}", login, name, error);
    }
    data.config.timezone = timezone.clone();
    data.large = inputs.display == DisplayMode::Large;
    data.columns = inputs.display == DisplayMode::Columns;
    data.animated = inputs.animations;
    data.meta = Some(Meta {
        version: env.config.package.version.clone(),
        author: env.config.package.author.clone(),
        generated: env.now(),
    });

    if inputs.has_flag(dflags::CAKEDAY) {
        debug!("metrics/compute/{} > applying dflag --cakeday", login);
        computed.cakeday = true;
    }
    let remap = Season::from_flags(&inputs.debug_flags).map(ColorRemap::new);
    if let Some(remap) = &remap {
        debug!(
            "metrics/compute/{} > applying dflag --{}",
            login,
            remap.season().name()
        );
        remap.apply_calendar(&mut computed.calendar);
    }

    let computed = Arc::new(computed);
    data.computed = computed.clone();

    let ctx = Arc::new(
        ComputationContext::new(login.clone(), data.dataset.clone())
            .with_account(account)
            .with_query(query)
            .with_computed(computed)
            .with_config(PresentationConfig {
                animated: inputs.animations,
                display: inputs.display,
                timezone,
                debug_flags: inputs.debug_flags.clone(),
            })
            .with_imports(imports),
    );

    let mut dispatcher = TaskDispatcher::new(env.plugins.clone())
        .with_plugin_options(env.config.plugins.clone())
        .with_extras(env.config.extras())
        .sandbox(env.config.settings.sandbox);
    if let Some(callbacks) = &env.callbacks {
        dispatcher = dispatcher.with_callback(callbacks.clone());
    }
    let launched = dispatcher.dispatch(&ctx, &data.plugins, pending);
    debug!(
        "metrics/compute/{} > {} plugins launched: {:?}",
        login,
        launched.len(),
        launched
    );

    if let Some(remap) = remap {
        let barrier = remap::schedule(remap, &data.plugins, pending);
        debug!("metrics/compute/{} > {} scheduled", login, barrier);
    }

    // launched plugins keep running; the caller never observes them
    if inputs.has_flag(dflags::ERROR) {
        return Err(formatter.error(ComputeError::Injected(INJECTED_FAILURE.to_string())));
    }

    debug!("metrics/compute/{} > success", login);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use metrics_core::plugin_fn;
    use serde_json::{json, Value};

    fn env() -> ComputeEnv {
        let registry = PluginRegistry::builder()
            .register(
                "echo",
                plugin_fn(|ctx: Arc<ComputationContext>, options| async move {
                    Ok(json!({ "login": ctx.login, "options": Value::Object(options) }))
                }),
            )
            .unwrap()
            .build();
        ComputeEnv::new(ComputeConfig::default(), Arc::new(registry))
            .with_timezone_resolver(TimezoneResolver::with_host_offset(
                FixedOffset::east_opt(0).unwrap(),
            ))
            .with_now(Utc.with_ymd_and_hms(2024, 10, 31, 0, 0, 0).unwrap())
    }

    fn query(pairs: &[(&str, Value)]) -> QueryFlags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_presentation_flags_and_meta() {
        let mut data = MetricsData::new(Dataset::default());
        let mut pending = PendingTaskSet::new();
        let request = ComputeRequest::new("octocat").with_query(query(&[
            ("config.display", json!("large")),
            ("config.animations", json!(false)),
            ("config.timezone", json!("Asia/Tokyo")),
        ]));

        compute(request, &mut data, &env(), &mut pending).await.unwrap();

        assert!(data.large);
        assert!(!data.columns);
        assert!(!data.animated);
        let timezone = data.config.timezone.clone().unwrap();
        assert_eq!(timezone.offset_millis, -9 * 3_600_000);
        let meta = data.meta.clone().unwrap();
        assert_eq!(meta.version, env!("CARGO_PKG_VERSION"));
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_display_still_computes() {
        let mut dataset = Dataset::default();
        dataset.user.contributions_collection.total_commit_contributions = 42;
        let mut data = MetricsData::new(dataset);
        let mut pending = PendingTaskSet::new();
        let request = ComputeRequest::new("octocat").with_query(query(&[
            ("echo", json!(true)),
            ("config.display", json!("condensed")),
        ]));

        compute(request, &mut data, &env(), &mut pending).await.unwrap();

        assert!(!data.large);
        assert!(!data.columns);
        assert_eq!(data.computed.commits, 42);
        assert_eq!(pending.len(), 1);
        pending.drain().await;
        assert!(data.plugins.value("echo").is_some());
    }

    #[tokio::test]
    async fn test_cakeday_flag_forces_cakeday() {
        let mut data = MetricsData::new(Dataset::default());
        let mut pending = PendingTaskSet::new();
        let request = ComputeRequest::new("octocat")
            .with_query(query(&[("debug.flags", json!(["--cakeday"]))]));

        compute(request, &mut data, &env(), &mut pending).await.unwrap();
        assert!(data.computed.cakeday);
    }

    #[tokio::test]
    async fn test_plugin_receives_extras_and_sandbox() {
        let mut env = env();
        env.config = ComputeConfig::from_yaml("settings:\n  sandbox: true\n  extras:\n    default: true\n")
            .unwrap();
        let mut data = MetricsData::new(Dataset::default());
        let mut pending = PendingTaskSet::new();
        let request = ComputeRequest::new("octocat").with_query(query(&[("echo", json!(true))]));

        compute(request, &mut data, &env, &mut pending).await.unwrap();
        pending.drain().await;

        let echo = data.plugins.value("echo").unwrap();
        assert_eq!(echo["login"], json!("octocat"));
        assert_eq!(echo["options"], json!({ "extras": true, "sandbox": true }));
    }
}

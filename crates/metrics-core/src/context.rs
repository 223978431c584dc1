//! Computation Context: state shared by every plugin task
use crate::collaborators::Imports;
use crate::computed::Computed;
use crate::data_model::Dataset;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Feature name → enabled flag or option value
pub type QueryFlags = BTreeMap<String, Value>;

/// Loose truthiness used for query flags: `null`, `false`, `0`, `""` and
/// the strings `"false"`/`"no"`/`"off"` are disabled, anything else enabled.
pub fn flag_enabled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "no" | "off" | "0"
        ),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Account {
    #[default]
    User,
    Organization,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Regular,
    Large,
    Columns,
}

impl DisplayMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "regular" => Some(Self::Regular),
            "large" => Some(Self::Large),
            "columns" => Some(Self::Columns),
            _ => None,
        }
    }
}

/// Resolved timezone. `offset_millis` is host offset minus zone offset at
/// the moment of resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneConfig {
    pub name: String,
    pub offset_millis: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresentationConfig {
    pub animated: bool,
    pub display: DisplayMode,
    pub timezone: Option<TimezoneConfig>,
    pub debug_flags: Vec<String>,
}

/// Read-only view of one computation, shared by `Arc` across plugin tasks.
///
/// Plugins never get a handle on the plugin output store; the dispatcher
/// writes each plugin's return value into that plugin's own slot.
#[derive(Debug, Clone)]
pub struct ComputationContext {
    pub trace_id: String,
    pub login: String,
    pub account: Account,
    pub query: QueryFlags,
    pub dataset: Arc<Dataset>,
    pub computed: Arc<Computed>,
    pub config: PresentationConfig,
    pub imports: Imports,
}

impl ComputationContext {
    pub fn new(login: impl Into<String>, dataset: Arc<Dataset>) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            login: login.into(),
            account: Account::default(),
            query: QueryFlags::new(),
            dataset,
            computed: Arc::new(Computed::default()),
            config: PresentationConfig::default(),
            imports: Imports::default(),
        }
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.account = account;
        self
    }

    pub fn with_query(mut self, query: QueryFlags) -> Self {
        self.query = query;
        self
    }

    pub fn with_computed(mut self, computed: Arc<Computed>) -> Self {
        self.computed = computed;
        self
    }

    pub fn with_config(mut self, config: PresentationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_imports(mut self, imports: Imports) -> Self {
        self.imports = imports;
        self
    }

    /// Whether the query asks for feature `name`
    pub fn requested(&self, name: &str) -> bool {
        self.query.get(name).map(flag_enabled).unwrap_or(false)
    }
}

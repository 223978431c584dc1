//! Metrics Core: plugin contract, task dispatch and shared data model
//!
//! # Flow
//!
//! ```text
//! Dataset → Computed ──┐
//!                      ▼
//!        ComputationContext (Arc, read-only)
//!                      │
//!        TaskDispatcher ──spawn──▶ PendingTaskSet ──▶ PluginOutcome
//!                      │                 │
//!                      └──▶ PluginOutputs (one slot per plugin)
//! ```

pub mod collaborators;
pub mod computed;
pub mod context;
pub mod data_model;
pub mod dispatcher;
pub mod error;
pub mod outputs;
pub mod pending;
pub mod plugin;
pub mod registry;

pub use collaborators::{
    DefaultFormatter, Formatter, HttpClient, ImageEncoder, Imports, Offline, Passthrough,
    PluginCallback,
};
pub use computed::{Computed, LicenseUsage, Licenses, Registered, RepositoryTotals, TokenInfo};
pub use context::{
    flag_enabled, Account, ComputationContext, DisplayMode, PresentationConfig, QueryFlags,
    TimezoneConfig,
};
pub use data_model::{ContributionDay, Dataset, LicenseInfo, Repository, RepositoryCounter, User};
pub use dispatcher::TaskDispatcher;
pub use error::{ComputeError, RegistryError};
pub use outputs::PluginOutputs;
pub use pending::{PendingTaskSet, Snapshot, TaskHandle};
pub use plugin::{
    plugin_fn, succeeded, FnPlugin, Plugin, PluginError, PluginOptions, PluginOutcome,
    PluginResult,
};
pub use registry::{PluginRegistry, PluginRegistryBuilder};

/// Version of the computation core
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

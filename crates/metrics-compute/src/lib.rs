//! Metrics Compute: core computation of profile metrics.
//!
//! Reduces a pre-fetched dataset into computed aggregates, then launches
//! the requested plugins concurrently. Seasonal debug flags add a barrier
//! task that recolors plugin outputs once the plugins before it settle.
//!
//! # Flow
//!
//! ```text
//! query flags → CoreInputs
//!                   │
//! Dataset → AggregationPass → Computed (+ avatar, token scopes, timezone)
//!                                 │ frozen
//!                                 ▼
//!                  TaskDispatcher ──▶ PendingTaskSet ◀── dflag.<season> barrier
//!                                 │
//!                     --error ? Err(wrapped) : Ok(())
//! ```
//!
//! # Example
//!
//! ```no_run
//! use metrics_compute::{compute, ComputeConfig, ComputeEnv, ComputeRequest, MetricsData};
//! use metrics_core::{Dataset, PendingTaskSet, PluginRegistry};
//! use std::sync::Arc;
//!
//! # async fn run(dataset: Dataset) -> Result<(), metrics_core::ComputeError> {
//! let env = ComputeEnv::new(ComputeConfig::default(), Arc::new(PluginRegistry::empty()));
//! let mut data = MetricsData::new(dataset);
//! let mut pending = PendingTaskSet::new();
//!
//! compute(ComputeRequest::new("octocat"), &mut data, &env, &mut pending).await?;
//! pending.drain().await;
//! println!("{}", data.computed.registration);
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod compute;
pub mod config;
pub mod inputs;
pub mod logging;
pub mod remap;
pub mod timezone;

pub use aggregation::{AggregationPass, RegistrationAge};
pub use compute::{compute, ComputeEnv, ComputeRequest, DataConfig, Meta, MetricsData};
pub use config::{ComputeConfig, ConfigError};
pub use inputs::CoreInputs;
pub use remap::{ColorRemap, Season};
pub use timezone::TimezoneResolver;

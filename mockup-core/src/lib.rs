//! Mockup core library: domain types, registry snapshots, configuration.
//!
//! - [`types`]: task, request and invocation types
//! - [`snapshot`]: registry snapshots and the additions-only differ
//! - [`config`]: YAML bridge configuration
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod snapshot;
pub mod types;

pub use config::BridgeConfig;
pub use error::ConfigError;
pub use snapshot::{diff, PresetGroup, PresetRef, RegistryDiff, RegistryReport, RegistrySnapshot};
pub use types::{
    AutomationTask, CompositeRequest, HexColor, InvocationResult, PollOutcome, PrintDirection,
    TaskId, TaskInputs, TaskKind,
};

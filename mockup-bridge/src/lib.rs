//! # mockup-bridge
//!
//! Drives the host application through OS scripting: generates a payload,
//! hands it to the first available scripting host, waits for the file the
//! payload writes, and removes any preset groups the task left behind.
//!
//! - [`orchestrator`]: [`Bridge`], the task state machine
//! - [`invoker`]: launcher chain per platform
//! - [`poller`]: fixed-interval artifact wait
//! - [`cleanup`]: preset-group removal
//! - [`tasks`]: task construction and filenames
//! - [`task_log`]: the append-only `bridge.log`

pub mod cleanup;
pub mod error;
pub mod invoker;
pub mod orchestrator;
pub mod poller;
pub mod task_log;
pub mod tasks;
pub mod telemetry;

pub use cleanup::{execute_cleanup, CleanupReport, GroupRemover, ScriptGroupRemover};
pub use error::BridgeError;
pub use invoker::{run_host, Attempt, GlueLauncher, Launcher, PlatformInvoker};
pub use orchestrator::{read_report, Bridge, TaskOutput, TaskState};
pub use poller::{await_artifact, ResultPoller};
pub use task_log::TaskLog;
pub use telemetry::init_tracing;

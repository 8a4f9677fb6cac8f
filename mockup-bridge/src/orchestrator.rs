//! End-to-end task execution.
//!
//! ```text
//! Prepared ──► Invoked ──► Polling ──► Succeeded
//!    │            │           │
//!    └────────────┴───────────┴──► Failed | TimedOut
//!                                        │
//!                     cleanup (always) ◄─┘
//! ```
//!
//! Steps 1–4 (render, invoke, poll, read back) run under the task deadline.
//! Cleanup runs afterwards regardless of the outcome and never changes it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use mockup_core::config::{ensure_layout, BridgeConfig, LayoutConfig};
use mockup_core::{AutomationTask, CompositeRequest, PollOutcome, RegistryReport, TaskKind};
use mockup_renderer::{PayloadSettings, ScriptRenderer};

use crate::cleanup::{execute_cleanup, CleanupReport, GroupRemover, ScriptGroupRemover};
use crate::error::{io_err, BridgeError};
use crate::invoker::PlatformInvoker;
use crate::poller::ResultPoller;
use crate::task_log::TaskLog;
use crate::tasks;

const NO_ACTION_NAME: &str = "no action name detected";

/// Lifecycle of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Prepared,
    Invoked,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Prepared => "prepared",
            TaskState::Invoked => "invoked",
            TaskState::Polling => "polling",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::TimedOut => "timed-out",
        };
        f.write_str(s)
    }
}

/// What a successful task hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutput {
    /// Rendered image of a run-preset task.
    Artifact(PathBuf),
    /// First preset added by an inspected bundle.
    ActionName(String),
}

/// Runs automation tasks against the host application, one at a time.
///
/// Each task executes on its own tokio task. Dropping the future returned by
/// [`Bridge::run`] detaches the task, which still reaches a terminal state
/// and cleans up the host registry.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    renderer: Arc<ScriptRenderer>,
    invoker: Arc<PlatformInvoker>,
    remover: Arc<dyn GroupRemover>,
    poller: ResultPoller,
    task_deadline: Duration,
    layout: LayoutConfig,
    gate: Mutex<()>,
    cleanup_failures: AtomicU64,
}

impl Bridge {
    pub fn new(
        renderer: Arc<ScriptRenderer>,
        invoker: Arc<PlatformInvoker>,
        remover: Arc<dyn GroupRemover>,
        poller: ResultPoller,
        task_deadline: Duration,
        layout: LayoutConfig,
    ) -> Self {
        let inner = BridgeInner {
            renderer,
            invoker,
            remover,
            poller,
            task_deadline,
            layout,
            gate: Mutex::new(()),
            cleanup_failures: AtomicU64::new(0),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Production wiring for the current OS.
    ///
    /// Fails with `UnsupportedPlatform` on systems without a scripting host.
    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        ensure_layout(&config.layout)?;
        let renderer = Arc::new(ScriptRenderer::with_templates(
            config.template_dir.as_deref(),
            PayloadSettings {
                jpeg_quality: config.output.jpeg_quality,
            },
        )?);
        let invoker = Arc::new(PlatformInvoker::for_current_platform(
            config,
            renderer.clone(),
        )?);
        let remover = Arc::new(ScriptGroupRemover::new(renderer.clone(), invoker.clone()));
        Ok(Self::new(
            renderer,
            invoker,
            remover,
            ResultPoller::from_config(&config.polling),
            config.timeouts.task(),
            config.layout.clone(),
        ))
    }

    /// Preset groups that cleanup failed to remove since this bridge started.
    pub fn cleanup_failures(&self) -> u64 {
        self.inner.cleanup_failures.load(Ordering::Relaxed)
    }

    /// Composite `request` and return the rendered image path.
    pub async fn composite(&self, request: &CompositeRequest) -> Result<PathBuf, BridgeError> {
        let task = tasks::run_preset_task(&self.inner.layout, request);
        match self.run(task).await? {
            TaskOutput::Artifact(path) => Ok(path),
            TaskOutput::ActionName(_) => Err(BridgeError::EmptyResult(
                "run-preset task produced no image".to_string(),
            )),
        }
    }

    /// Load `bundle` and return the name of the first preset it adds.
    pub async fn inspect_bundle(&self, bundle: &Path) -> Result<String, BridgeError> {
        let task = tasks::inspect_bundle_task(&self.inner.layout, bundle);
        match self.run(task).await? {
            TaskOutput::ActionName(name) => Ok(name),
            TaskOutput::Artifact(_) => Err(BridgeError::EmptyResult(NO_ACTION_NAME.to_string())),
        }
    }

    /// Execute `task` to a terminal state, then clean up the host registry.
    pub async fn run(&self, task: AutomationTask) -> Result<TaskOutput, BridgeError> {
        let inner = Arc::clone(&self.inner);
        match tokio::spawn(async move { inner.run(task).await }).await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(BridgeError::InvocationFailure {
                host: "bridge".to_string(),
                exit_code: None,
                message: format!("task aborted: {err}"),
            }),
        }
    }
}

impl BridgeInner {
    async fn run(&self, task: AutomationTask) -> Result<TaskOutput, BridgeError> {
        let _turn = self.gate.lock().await;
        let log = TaskLog::new(&task.log_path, task.id.clone());
        tracing::info!(task = %task.id, kind = %task.kind, "task started");
        log.line(format!("task started ({})", task.kind));

        let outcome = match tokio::time::timeout(self.task_deadline, self.execute(&task, &log)).await
        {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout {
                path: task.artifact_path.clone(),
                waited: self.task_deadline,
            }),
        };

        let terminal = match &outcome {
            Ok(_) => TaskState::Succeeded,
            Err(BridgeError::Timeout { .. }) => TaskState::TimedOut,
            Err(_) => TaskState::Failed,
        };
        self.transition(&task, &log, terminal);
        if let Err(err) = &outcome {
            tracing::error!(task = %task.id, error = %err, "task failed");
            log.line(format!("error: {err}"));
        }

        self.cleanup(&task, &log).await;
        tasks::discard_scratch(&task);
        outcome
    }

    async fn execute(&self, task: &AutomationTask, log: &TaskLog) -> Result<TaskOutput, BridgeError> {
        let script = self.renderer.write_task(task)?;
        self.transition(task, log, TaskState::Prepared);

        let result = self.invoker.invoke(&script).await?;
        tracing::debug!(task = %task.id, host = %result.host, "payload accepted");
        self.transition(task, log, TaskState::Invoked);

        self.transition(task, log, TaskState::Polling);
        let artifact = match self.poller.wait_for(&task.artifact_path).await {
            PollOutcome::Found(path) => path,
            PollOutcome::TimedOut => {
                return Err(BridgeError::Timeout {
                    path: task.artifact_path.clone(),
                    waited: self.poller.budget(),
                })
            }
        };

        match task.kind {
            TaskKind::RunPreset => Ok(TaskOutput::Artifact(artifact)),
            TaskKind::InspectBundle => read_action_name(&artifact).map(TaskOutput::ActionName),
        }
    }

    fn transition(&self, task: &AutomationTask, log: &TaskLog, state: TaskState) {
        tracing::info!(task = %task.id, %state, "state change");
        log.line(format!("state → {state}"));
    }

    /// Remove groups the task's bundle added. Only tasks that load a bundle
    /// have a report; a missing report means the bundle was never loaded.
    async fn cleanup(&self, task: &AutomationTask, log: &TaskLog) -> CleanupReport {
        if !task.loads_bundle() {
            return CleanupReport::default();
        }
        let groups = match read_report(&task.report_path) {
            Ok(Some(report)) => report.diff().new_groups,
            Ok(None) => {
                tracing::debug!(task = %task.id, "no registry report; nothing to clean up");
                return CleanupReport::default();
            }
            Err(err) => {
                tracing::warn!(task = %task.id, error = %err, "unreadable registry report; skipping cleanup");
                log.line(format!("cleanup skipped: {err}"));
                return CleanupReport::default();
            }
        };

        let report = execute_cleanup(self.remover.as_ref(), task, &groups).await;
        for group in &report.removed {
            log.line(format!("cleanup removed preset group {group}"));
        }
        if !report.failed.is_empty() {
            let failed = report.failed.len() as u64;
            let total = self.cleanup_failures.fetch_add(failed, Ordering::Relaxed) + failed;
            for (group, message) in &report.failed {
                log.line(format!("cleanup could not remove {group}: {message}"));
            }
            tracing::warn!(
                task = %task.id,
                failed,
                total,
                "preset groups left in the host registry; it grows with every failed cleanup"
            );
        }
        report
    }
}

/// Parse the registry report at `path`. `None` when it was never written.
pub fn read_report(path: &Path) -> Result<Option<RegistryReport>, BridgeError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    if contents.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Name of the first preset an inspected bundle added.
fn read_action_name(report_path: &Path) -> Result<String, BridgeError> {
    let report = read_report(report_path)?
        .ok_or_else(|| BridgeError::EmptyResult(NO_ACTION_NAME.to_string()))?;
    report
        .diff()
        .first_new_preset()
        .map(|p| p.preset.clone())
        .ok_or_else(|| BridgeError::EmptyResult(NO_ACTION_NAME.to_string()))
}

//! Removal of preset groups a task added to the host registry.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use mockup_core::{AutomationTask, TaskId};
use mockup_renderer::{write_script, ScriptRenderer};

use crate::error::BridgeError;
use crate::invoker::PlatformInvoker;
use crate::tasks;

/// Deletes one preset group from the host application.
#[async_trait]
pub trait GroupRemover: Send + Sync {
    async fn remove_group(&self, task: &AutomationTask, group: &str) -> Result<(), BridgeError>;
}

/// Renders a `delete-group` payload per group and runs it through the
/// platform invoker.
pub struct ScriptGroupRemover {
    renderer: Arc<ScriptRenderer>,
    invoker: Arc<PlatformInvoker>,
}

impl ScriptGroupRemover {
    pub fn new(renderer: Arc<ScriptRenderer>, invoker: Arc<PlatformInvoker>) -> Self {
        Self { renderer, invoker }
    }
}

#[async_trait]
impl GroupRemover for ScriptGroupRemover {
    async fn remove_group(&self, task: &AutomationTask, group: &str) -> Result<(), BridgeError> {
        let script = self
            .renderer
            .render_group_removal(&task.id, group, &task.log_path)?;
        // Each removal gets its own file so glue scripts never race on a name.
        let path = task
            .script_path
            .with_file_name(format!("delete_group_{}_{}.jsx", task.id, TaskId::generate()));
        write_script(&path, &script)?;
        let outcome = self.invoker.invoke(&path).await.map(|_| ());
        tasks::discard(&tasks::script_files(&path));
        outcome
    }
}

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub attempted: usize,
    pub removed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Remove every group in `groups`, one independent attempt each.
///
/// A failing group is logged as a `CleanupFailure` and does not stop the
/// remaining removals. An empty set makes no remover calls.
pub async fn execute_cleanup(
    remover: &dyn GroupRemover,
    task: &AutomationTask,
    groups: &BTreeSet<String>,
) -> CleanupReport {
    let mut report = CleanupReport::default();
    for group in groups {
        report.attempted += 1;
        match remover.remove_group(task, group).await {
            Ok(()) => {
                tracing::info!(task = %task.id, group = %group, "removed preset group");
                report.removed.push(group.clone());
            }
            Err(err) => {
                let failure = BridgeError::CleanupFailure {
                    group: group.clone(),
                    message: err.to_string(),
                };
                tracing::warn!(task = %task.id, error = %failure, "cleanup failed");
                report.failed.push((group.clone(), err.to_string()));
            }
        }
    }
    report
}

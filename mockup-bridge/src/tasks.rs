//! Building [`AutomationTask`]s with task-scoped filenames.
//!
//! ```text
//! scripts/run_preset_<id>.jsx
//! scripts/inspect_bundle_<id>.jsx
//! uploads/<model>_<direction>_<id>.jpg
//! uploads/registry_<id>.json
//! ```
//!
//! Everything but the rendered image is scratch and is removed once the task
//! has been cleaned up.

use std::io;
use std::path::{Path, PathBuf};

use mockup_core::config::LayoutConfig;
use mockup_core::{AutomationTask, CompositeRequest, TaskId, TaskInputs, TaskKind};
use mockup_renderer::ScriptKind;

/// Task that composites `request.shirt_image` into the model document.
pub fn run_preset_task(layout: &LayoutConfig, request: &CompositeRequest) -> AutomationTask {
    run_preset_task_with_id(layout, request, TaskId::generate())
}

pub fn run_preset_task_with_id(
    layout: &LayoutConfig,
    request: &CompositeRequest,
    id: TaskId,
) -> AutomationTask {
    let stem = file_stem(&request.model_document);
    let artifact = layout
        .uploads_dir
        .join(format!("{stem}_{}_{id}.jpg", request.print_direction));

    AutomationTask {
        kind: TaskKind::RunPreset,
        inputs: TaskInputs {
            model_document: Some(request.model_document.clone()),
            overlay_image: Some(request.shirt_image.clone()),
            preset_bundle: request.preset_bundle.clone(),
            action_name: Some(request.action_name.clone()),
            layer_name: Some(request.layer_name.clone()),
            preset_group: Some(request.preset_group.clone()),
            color: request.color.clone(),
        },
        script_path: layout.scripts_dir.join(format!("run_preset_{id}.jsx")),
        artifact_path: artifact,
        report_path: report_path(layout, &id),
        log_path: layout.log_path(),
        id,
    }
}

/// Task that loads `bundle` and reports which presets it added.
pub fn inspect_bundle_task(layout: &LayoutConfig, bundle: &Path) -> AutomationTask {
    inspect_bundle_task_with_id(layout, bundle, TaskId::generate())
}

pub fn inspect_bundle_task_with_id(
    layout: &LayoutConfig,
    bundle: &Path,
    id: TaskId,
) -> AutomationTask {
    let report = report_path(layout, &id);
    AutomationTask {
        kind: TaskKind::InspectBundle,
        inputs: TaskInputs {
            preset_bundle: Some(bundle.to_path_buf()),
            ..TaskInputs::default()
        },
        script_path: layout.scripts_dir.join(format!("inspect_bundle_{id}.jsx")),
        artifact_path: report.clone(),
        report_path: report,
        log_path: layout.log_path(),
        id,
    }
}

/// A payload and the glue siblings launchers write next to it.
pub fn script_files(payload: &Path) -> Vec<PathBuf> {
    let mut files = vec![payload.to_path_buf()];
    files.extend(
        ScriptKind::all()
            .iter()
            .filter(|kind| kind.is_glue())
            .map(|kind| payload.with_extension(kind.extension())),
    );
    files
}

/// Scratch files of `task`: its scripts and the registry report.
pub fn scratch_files(task: &AutomationTask) -> Vec<PathBuf> {
    let mut files = script_files(&task.script_path);
    files.push(task.report_path.clone());
    files
}

/// Best-effort removal; files that were never written are skipped.
pub fn discard(files: &[PathBuf]) {
    for file in files {
        match std::fs::remove_file(file) {
            Ok(()) => tracing::trace!(path = %file.display(), "removed scratch file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "could not remove scratch file")
            }
        }
    }
}

pub(crate) fn discard_scratch(task: &AutomationTask) {
    discard(&scratch_files(task));
}

fn report_path(layout: &LayoutConfig, id: &TaskId) -> PathBuf {
    layout.uploads_dir.join(format!("registry_{id}.json"))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "mockup".to_string())
}

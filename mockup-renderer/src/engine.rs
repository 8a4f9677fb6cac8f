//! Tera rendering engine: [`ScriptKind`] enum and [`ScriptRenderer`].
//!
//! # Template map
//!
//! | Kind            | Template                          | Language    |
//! |-----------------|-----------------------------------|-------------|
//! | RunPreset       | `payload/run_preset.jsx.tera`     | ExtendScript|
//! | InspectBundle   | `payload/inspect_bundle.jsx.tera` | ExtendScript|
//! | DeleteGroup     | `payload/delete_group.jsx.tera`   | ExtendScript|
//! | AppleScriptGlue | `glue/launch.applescript.tera`    | AppleScript |
//! | PowerShellGlue  | `glue/launch.ps1.tera`            | PowerShell  |
//! | VbScriptGlue    | `glue/launch.vbs.tera`            | VBScript    |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use mockup_core::config::HostAppConfig;
use mockup_core::types::{AutomationTask, TaskId, TaskKind};

use crate::context::{GlueContext, PayloadContext, PayloadSettings, ScriptLanguage};
use crate::error::{io_err, RenderError};
use crate::writer::write_script;

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    (
        "payload/_prelude.jsx.tera",
        include_str!("templates/_partials/prelude.jsx.tera"),
    ),
    (
        "payload/run_preset.jsx.tera",
        include_str!("templates/run_preset.jsx.tera"),
    ),
    (
        "payload/inspect_bundle.jsx.tera",
        include_str!("templates/inspect_bundle.jsx.tera"),
    ),
    (
        "payload/delete_group.jsx.tera",
        include_str!("templates/delete_group.jsx.tera"),
    ),
    (
        "glue/launch.applescript.tera",
        include_str!("templates/launch.applescript.tera"),
    ),
    ("glue/launch.ps1.tera", include_str!("templates/launch.ps1.tera")),
    ("glue/launch.vbs.tera", include_str!("templates/launch.vbs.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(
            normalize_template_name(Path::new(name)),
            (*content).to_string(),
        );
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            tracing::debug!(template = %name, "user template override");
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// ScriptKind
// ---------------------------------------------------------------------------

/// Every script the bridge can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    RunPreset,
    InspectBundle,
    DeleteGroup,
    AppleScriptGlue,
    PowerShellGlue,
    VbScriptGlue,
}

impl ScriptKind {
    /// All kinds in a stable order.
    pub fn all() -> &'static [ScriptKind] {
        &[
            ScriptKind::RunPreset,
            ScriptKind::InspectBundle,
            ScriptKind::DeleteGroup,
            ScriptKind::AppleScriptGlue,
            ScriptKind::PowerShellGlue,
            ScriptKind::VbScriptGlue,
        ]
    }

    pub fn for_task(kind: TaskKind) -> Self {
        match kind {
            TaskKind::RunPreset => ScriptKind::RunPreset,
            TaskKind::InspectBundle => ScriptKind::InspectBundle,
        }
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            ScriptKind::RunPreset => "payload/run_preset.jsx.tera",
            ScriptKind::InspectBundle => "payload/inspect_bundle.jsx.tera",
            ScriptKind::DeleteGroup => "payload/delete_group.jsx.tera",
            ScriptKind::AppleScriptGlue => "glue/launch.applescript.tera",
            ScriptKind::PowerShellGlue => "glue/launch.ps1.tera",
            ScriptKind::VbScriptGlue => "glue/launch.vbs.tera",
        }
    }

    /// File extension of the rendered script.
    pub fn extension(&self) -> &'static str {
        match self {
            ScriptKind::RunPreset | ScriptKind::InspectBundle | ScriptKind::DeleteGroup => "jsx",
            ScriptKind::AppleScriptGlue => "applescript",
            ScriptKind::PowerShellGlue => "ps1",
            ScriptKind::VbScriptGlue => "vbs",
        }
    }

    pub fn language(&self) -> ScriptLanguage {
        match self {
            ScriptKind::RunPreset | ScriptKind::InspectBundle | ScriptKind::DeleteGroup => {
                ScriptLanguage::JavaScript
            }
            ScriptKind::AppleScriptGlue => ScriptLanguage::AppleScript,
            ScriptKind::PowerShellGlue => ScriptLanguage::PowerShell,
            ScriptKind::VbScriptGlue => ScriptLanguage::VbScript,
        }
    }

    pub fn is_glue(&self) -> bool {
        matches!(
            self,
            ScriptKind::AppleScriptGlue | ScriptKind::PowerShellGlue | ScriptKind::VbScriptGlue
        )
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering templates with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that override embedded defaults,
/// addressed by the same relative names (e.g. `payload/run_preset.jsx.tera`).
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    pub fn render(&self, kind: ScriptKind, ctx: &tera::Context) -> Result<String, RenderError> {
        let rendered = self.tera.render(kind.template_name(), ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// ScriptRenderer
// ---------------------------------------------------------------------------

/// Renders payloads and host glue. Create once and reuse; rendering is pure.
pub struct ScriptRenderer {
    engine: TemplateEngine,
    settings: PayloadSettings,
}

impl ScriptRenderer {
    /// Renderer with embedded templates only.
    pub fn new(settings: PayloadSettings) -> Result<Self, RenderError> {
        Self::with_templates(None, settings)
    }

    /// Renderer whose embedded templates may be overridden from `dir`.
    pub fn with_templates(
        dir: Option<&Path>,
        settings: PayloadSettings,
    ) -> Result<Self, RenderError> {
        Ok(ScriptRenderer {
            engine: TemplateEngine::new(dir)?,
            settings,
        })
    }

    /// Render the payload for `task`.
    pub fn render_task(&self, task: &AutomationTask) -> Result<String, RenderError> {
        let ctx = PayloadContext::for_task(task, &self.settings)?;
        self.engine
            .render(ScriptKind::for_task(task.kind), &ctx.to_tera_context()?)
    }

    /// Render the payload for `task` and write it to `task.script_path`,
    /// replacing any previous script there.
    pub fn write_task(&self, task: &AutomationTask) -> Result<PathBuf, RenderError> {
        let content = self.render_task(task)?;
        write_script(&task.script_path, &content)?;
        Ok(task.script_path.clone())
    }

    /// Render a payload deleting the preset group `group`.
    pub fn render_group_removal(
        &self,
        task_id: &TaskId,
        group: &str,
        log_path: &Path,
    ) -> Result<String, RenderError> {
        let ctx = PayloadContext::for_group_removal(task_id, group, log_path);
        self.engine
            .render(ScriptKind::DeleteGroup, &ctx.to_tera_context()?)
    }

    /// Render the OS-level glue that hands `script_path` to the host.
    pub fn render_glue(
        &self,
        kind: ScriptKind,
        host: &HostAppConfig,
        script_path: &Path,
    ) -> Result<String, RenderError> {
        debug_assert!(kind.is_glue(), "{kind:?} is not a glue script");
        let ctx = GlueContext::new(kind.language(), host, script_path);
        self.engine.render(kind, &ctx.to_tera_context()?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockup_core::types::TaskInputs;

    fn inspect_task() -> AutomationTask {
        AutomationTask {
            id: TaskId::from("t1"),
            kind: TaskKind::InspectBundle,
            inputs: TaskInputs {
                preset_bundle: Some(PathBuf::from("/up/bundle.atn")),
                ..TaskInputs::default()
            },
            script_path: PathBuf::from("/s/inspect_t1.jsx"),
            artifact_path: PathBuf::from("/u/report_t1.json"),
            report_path: PathBuf::from("/u/report_t1.json"),
            log_path: PathBuf::from("/l/bridge.log"),
        }
    }

    #[test]
    fn renderer_new_succeeds() {
        ScriptRenderer::new(PayloadSettings::default())
            .expect("ScriptRenderer::new should succeed with embedded templates");
    }

    #[test]
    fn inspect_payload_includes_prelude_and_paths() {
        let renderer = ScriptRenderer::new(PayloadSettings::default()).unwrap();
        let script = renderer.render_task(&inspect_task()).unwrap();
        assert!(script.starts_with("#target photoshop"));
        assert!(script.contains("function snapshotRegistry()"));
        assert!(script.contains(r#"loadBundleWithReport("/up/bundle.atn", "/u/report_t1.json")"#));
        assert!(script.contains(r#"var LOG_PATH = "/l/bridge.log";"#));
    }

    #[test]
    fn delete_group_payload_names_the_group() {
        let renderer = ScriptRenderer::new(PayloadSettings::default()).unwrap();
        let script = renderer
            .render_group_removal(&TaskId::from("t1"), "TempSet", Path::new("/l/bridge.log"))
            .unwrap();
        assert!(script.contains(r#"ref.putName(charIDToTypeID("ASet"), "TempSet");"#));
        assert!(script.contains("(delete-group)"));
    }

    #[test]
    fn glue_scripts_reference_payload() {
        let renderer = ScriptRenderer::new(PayloadSettings::default()).unwrap();
        let host = HostAppConfig::default();
        let payload = Path::new(r"C:\scripts\run_x.jsx");

        let vbs = renderer
            .render_glue(ScriptKind::VbScriptGlue, &host, payload)
            .unwrap();
        assert!(vbs.contains(r#"CreateObject("Photoshop.Application")"#));
        assert!(vbs.contains(r#"app.DoJavaScriptFile "C:\scripts\run_x.jsx""#));

        let ps1 = renderer
            .render_glue(ScriptKind::PowerShellGlue, &host, payload)
            .unwrap();
        assert!(ps1.contains(r"DoJavaScriptFile('C:\scripts\run_x.jsx')"));

        let apple = renderer
            .render_glue(
                ScriptKind::AppleScriptGlue,
                &host,
                Path::new("/Users/ana/scripts/run_x.jsx"),
            )
            .unwrap();
        assert!(apple.contains(r#"tell application "Adobe Photoshop 2024""#));
        assert!(apple.contains(r#"POSIX file "/Users/ana/scripts/run_x.jsx""#));
    }

    #[test]
    fn every_kind_has_a_registered_template() {
        let engine = TemplateEngine::new(None).unwrap();
        for kind in ScriptKind::all() {
            assert!(
                engine.tera.get_template_names().any(|n| n == kind.template_name()),
                "missing template for {kind:?}"
            );
        }
    }
}

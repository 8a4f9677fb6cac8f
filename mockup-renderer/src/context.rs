//! Template contexts: escaped rendering payloads built from an [`AutomationTask`].
//!
//! Every string is escaped for its target language while the context is
//! built, so templates interpolate with plain `{{ field }}` and cannot forget
//! to escape. Windows paths rely on this: `\` is an escape character in
//! both JavaScript and AppleScript string literals.

use std::path::Path;

use serde::{Deserialize, Serialize};

use mockup_core::config::HostAppConfig;
use mockup_core::types::{AutomationTask, TaskId, TaskKind};

use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// String-literal dialects the generated scripts are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLanguage {
    /// ExtendScript payload, double-quoted literals.
    JavaScript,
    /// AppleScript glue, double-quoted literals.
    AppleScript,
    /// PowerShell glue, single-quoted literals.
    PowerShell,
    /// VBScript glue, double-quoted literals.
    VbScript,
}

impl ScriptLanguage {
    /// Escape `raw` for interpolation between the language's quotes.
    pub fn escape(self, raw: &str) -> String {
        match self {
            ScriptLanguage::JavaScript => escape_javascript(raw),
            ScriptLanguage::AppleScript => raw.replace('\\', "\\\\").replace('"', "\\\""),
            ScriptLanguage::PowerShell => escape_powershell(raw),
            ScriptLanguage::VbScript => raw.replace('"', "\"\""),
        }
    }

    pub fn escape_path(self, path: &Path) -> String {
        self.escape(&path.to_string_lossy())
    }
}

/// PowerShell treats the typographic single quotes as `'` inside a
/// single-quoted string, so each of them is doubled as well.
fn escape_powershell(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    for c in raw.chars() {
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            out.push(c);
        }
        out.push(c);
    }
    out
}

fn escape_javascript(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Payload context
// ---------------------------------------------------------------------------

/// Settings shared by every payload, independent of the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadSettings {
    pub jpeg_quality: u8,
}

impl Default for PayloadSettings {
    fn default() -> Self {
        Self { jpeg_quality: 10 }
    }
}

/// Flat, pre-escaped payload context. Absent inputs render as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadContext {
    pub task_id: String,
    pub kind: String,
    pub model_document: String,
    pub overlay_image: String,
    pub preset_bundle: String,
    pub has_bundle: bool,
    pub action_name: String,
    pub preset_group: String,
    pub layer_name: String,
    pub color: String,
    pub output_path: String,
    pub report_path: String,
    pub log_path: String,
    pub jpeg_quality: u8,
}

impl PayloadContext {
    /// Build the context for a task payload, checking the inputs its kind needs.
    pub fn for_task(
        task: &AutomationTask,
        settings: &PayloadSettings,
    ) -> Result<Self, RenderError> {
        let js = ScriptLanguage::JavaScript;
        let inputs = &task.inputs;
        let missing = |field: &'static str| RenderError::MissingInput {
            kind: task.kind.to_string(),
            field,
        };

        match task.kind {
            TaskKind::RunPreset => {
                inputs.model_document.as_ref().ok_or_else(|| missing("model_document"))?;
                inputs.overlay_image.as_ref().ok_or_else(|| missing("overlay_image"))?;
                inputs.action_name.as_ref().ok_or_else(|| missing("action_name"))?;
                inputs.preset_group.as_ref().ok_or_else(|| missing("preset_group"))?;
                inputs.layer_name.as_ref().ok_or_else(|| missing("layer_name"))?;
            }
            TaskKind::InspectBundle => {
                inputs.preset_bundle.as_ref().ok_or_else(|| missing("preset_bundle"))?;
            }
        }

        let path = |p: &Option<std::path::PathBuf>| {
            p.as_deref().map(|p| js.escape_path(p)).unwrap_or_default()
        };
        let text = |s: &Option<String>| s.as_deref().map(|s| js.escape(s)).unwrap_or_default();

        Ok(PayloadContext {
            task_id: js.escape(&task.id.0),
            kind: task.kind.to_string(),
            model_document: path(&inputs.model_document),
            overlay_image: path(&inputs.overlay_image),
            preset_bundle: path(&inputs.preset_bundle),
            has_bundle: inputs.preset_bundle.is_some(),
            action_name: text(&inputs.action_name),
            preset_group: text(&inputs.preset_group),
            layer_name: text(&inputs.layer_name),
            color: inputs
                .color
                .as_ref()
                .map(|c| c.digits().to_string())
                .unwrap_or_default(),
            output_path: js.escape_path(&task.artifact_path),
            report_path: js.escape_path(&task.report_path),
            log_path: js.escape_path(&task.log_path),
            jpeg_quality: settings.jpeg_quality,
        })
    }

    /// Context for a payload that deletes one preset group.
    pub fn for_group_removal(task_id: &TaskId, group: &str, log_path: &Path) -> Self {
        let js = ScriptLanguage::JavaScript;
        PayloadContext {
            task_id: js.escape(&task_id.0),
            kind: "delete-group".to_string(),
            model_document: String::new(),
            overlay_image: String::new(),
            preset_bundle: String::new(),
            has_bundle: false,
            action_name: String::new(),
            preset_group: js.escape(group),
            layer_name: String::new(),
            color: String::new(),
            output_path: String::new(),
            report_path: String::new(),
            log_path: js.escape_path(log_path),
            jpeg_quality: 0,
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

// ---------------------------------------------------------------------------
// Glue context
// ---------------------------------------------------------------------------

/// Context for the OS-level script that hands a payload to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlueContext {
    pub app_name: String,
    pub prog_id: String,
    pub script_path: String,
}

impl GlueContext {
    pub fn new(language: ScriptLanguage, host: &HostAppConfig, script_path: &Path) -> Self {
        GlueContext {
            app_name: language.escape(&host.app_name),
            prog_id: language.escape(&host.com_prog_id),
            script_path: language.escape_path(script_path),
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

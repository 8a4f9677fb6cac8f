//! Domain types for the automation bridge.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Everything that crosses the payload boundary is serializable via serde.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Uniqueness token for one automation task.
///
/// Embedded in every task-scoped filename (script, glue, artifact, report) so
/// rapidly repeated tasks never collide on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    /// Fresh random id (UUID v4, simple form).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A `#RRGGBB` colour handed to the payload as the host's foreground colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Six lowercase hex digits, without the leading `#`.
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(digits.to_ascii_lowercase()))
        } else {
            Err(format!("invalid colour '{s}'; expected #RRGGBB"))
        }
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<HexColor> for String {
    fn from(c: HexColor) -> Self {
        format!("#{}", c.0)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which payload template a task renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Open the model document, place the overlay, play a preset, export.
    RunPreset,
    /// Load a preset bundle and report what it added to the registry.
    InspectBundle,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::RunPreset => write!(f, "run-preset"),
            TaskKind::InspectBundle => write!(f, "inspect-bundle"),
        }
    }
}

/// Which side of the shirt the print sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrintDirection {
    #[default]
    Front,
    Back,
}

impl fmt::Display for PrintDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintDirection::Front => write!(f, "front"),
            PrintDirection::Back => write!(f, "back"),
        }
    }
}

impl FromStr for PrintDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            other => Err(format!(
                "unknown print direction '{other}'; expected: front, back"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests and tasks
// ---------------------------------------------------------------------------

/// What the web layer hands the bridge: references already resolved to
/// absolute paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeRequest {
    pub model_document: PathBuf,
    pub shirt_image: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_bundle: Option<PathBuf>,
    pub action_name: String,
    pub preset_group: String,
    pub layer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
    #[serde(default)]
    pub print_direction: PrintDirection,
}

/// External inputs of one task. Which fields are set depends on [`TaskKind`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_document: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_image: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_bundle: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
}

/// One unit of work for the host application.
///
/// Built fresh per invocation and moved into the orchestrator, which drops it
/// when the task completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationTask {
    pub id: TaskId,
    pub kind: TaskKind,
    pub inputs: TaskInputs,
    /// Where the generated payload is written.
    pub script_path: PathBuf,
    /// The file whose appearance signals completion.
    pub artifact_path: PathBuf,
    /// Before/after registry snapshots written by the payload after a bundle
    /// load. Equal to `artifact_path` for inspect tasks.
    pub report_path: PathBuf,
    /// Human-readable append-only log shared by bridge and payload.
    pub log_path: PathBuf,
}

impl AutomationTask {
    /// True when the payload loads a preset bundle and therefore writes a
    /// registry report that cleanup must consult.
    pub fn loads_bundle(&self) -> bool {
        self.inputs.preset_bundle.is_some()
    }
}

/// What a finished host process reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// Launcher that ran the process, e.g. `osascript`.
    pub host: String,
    /// `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Result of waiting for an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Found(PathBuf),
    TimedOut,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_are_unique() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
        assert_eq!(a.0.len(), 32);
    }

    #[test]
    fn hex_color_accepts_with_and_without_hash() {
        assert_eq!("#FFAA00".parse::<HexColor>().unwrap().digits(), "ffaa00");
        assert_eq!("0a0b0c".parse::<HexColor>().unwrap().to_string(), "#0a0b0c");
        assert!("#12345".parse::<HexColor>().is_err());
        assert!("zzzzzz".parse::<HexColor>().is_err());
    }

    #[test]
    fn task_kind_serializes_kebab_case() {
        let yaml = serde_yaml::to_string(&TaskKind::InspectBundle).unwrap();
        assert_eq!(yaml.trim(), "inspect-bundle");
        assert_eq!(TaskKind::RunPreset.to_string(), "run-preset");
    }

    #[test]
    fn composite_request_defaults_to_front_print() {
        let json = r##"{
            "model_document": "/up/model.psd",
            "shirt_image": "/up/shirt.png",
            "action_name": "Apply",
            "preset_group": "Shirts",
            "layer_name": "Shirt",
            "color": "#112233"
        }"##;
        let req: CompositeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.print_direction, PrintDirection::Front);
        assert_eq!(req.color.unwrap().digits(), "112233");
        assert!(req.preset_bundle.is_none());
    }

    #[test]
    fn invocation_success_tracks_exit_code() {
        let mut result = InvocationResult {
            host: "osascript".into(),
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(result.success());
        result.exit_code = 1;
        assert!(!result.success());
    }
}

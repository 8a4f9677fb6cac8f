//! # mockup-renderer
//!
//! Tera-based generator for the scripts the bridge hands to the host
//! application: ExtendScript payloads (run a preset, inspect a bundle, delete a
//! preset group) and the OS glue that launches them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mockup_core::AutomationTask;
//! use mockup_renderer::{PayloadSettings, ScriptRenderer};
//!
//! fn prepare(task: &AutomationTask) {
//!     if let Ok(renderer) = ScriptRenderer::new(PayloadSettings::default()) {
//!         if let Ok(path) = renderer.write_task(task) {
//!             println!("payload at {}", path.display());
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod writer;

pub use context::{GlueContext, PayloadContext, PayloadSettings, ScriptLanguage};
pub use engine::{ScriptKind, ScriptRenderer, TemplateEngine};
pub use error::RenderError;
pub use writer::write_script;

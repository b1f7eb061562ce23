//! Shared foundation for the Deskflow automation engine.
//!
//! Holds the configuration data model (profiles, templates, actions, macros)
//! with its JSON-backed store, the common error type, and the text-template
//! rendering capability used by the `render_template` step.

pub mod config;
pub mod error;
pub mod template;

pub use config::{
    ActionDef, ActionsFile, ConfigStore, FieldDef, FieldKind, MacroDef, MacroSafety, MacrosFile,
    ProfilesFile, StepSpec, TemplateDef, TemplatesFile,
};
pub use error::{CoreError, Result};
pub use template::{render, TemplateError};

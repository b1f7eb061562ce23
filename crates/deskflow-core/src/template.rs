//! Text-template rendering capability.
//!
//! A thin seam over minijinja: callers hand in a template body and a flat
//! variable map and get back the rendered string or a render error. The
//! engine never interprets template syntax itself.

use std::collections::HashMap;

use minijinja::Environment;
use thiserror::Error;

/// Errors from template rendering.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template render failed: {0}")]
    Render(String),
}

/// Render `body` against `vars`.
///
/// Undefined variables render as empty text; malformed template syntax is an
/// error.
pub fn render(body: &str, vars: &HashMap<String, String>) -> Result<String, TemplateError> {
    let env = Environment::new();
    env.render_str(body, vars)
        .map_err(|e| TemplateError::Render(e.to_string()))
}

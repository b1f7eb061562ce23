//! Template rendering into the run's named outputs.

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::{BuildError, StepError};
use crate::result::{LogLevel, RunResult};
use crate::step::{Params, Step};

/// Render a stored template against the run's inputs and place the result
/// under a named output key for a later step to consume.
///
/// Rendering has no external side effect, so it is not gated on dry-run.
#[derive(Debug)]
pub struct RenderTemplateStep {
    template_id: String,
    output_key: String,
}

impl RenderTemplateStep {
    pub fn new(template_id: impl Into<String>, output_key: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            output_key: output_key.into(),
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(
            p.string("template_id", "")?,
            p.string("output_key", "rendered_text")?,
        ))
    }
}

#[async_trait]
impl Step for RenderTemplateStep {
    fn step_type(&self) -> &'static str {
        "render_template"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!(
            "Render template '{}' -> outputs['{}']",
            self.template_id, self.output_key
        )
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        let Some(template) = ctx.config.template(&self.template_id) else {
            result.add_error(
                format!("Template not found: {}", self.template_id),
                Some(self.step_type()),
                None,
            );
            return Ok(());
        };

        match deskflow_core::template::render(&template.body, &ctx.inputs) {
            Ok(rendered) => {
                result.outputs.insert(self.output_key.clone(), rendered);
                result.add_log(
                    LogLevel::Info,
                    format!("Rendered template '{}'", template.name),
                    Some(self.step_type()),
                );
            }
            Err(e) => result.add_error(
                format!("{}", e),
                Some(self.step_type()),
                Some("template"),
            ),
        }
        Ok(())
    }
}

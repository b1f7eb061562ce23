//! File-move steps.

use std::path::Path;

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::{BuildError, StepError};
use crate::result::{LogLevel, RunResult};
use crate::step::{Params, Step};

/// Move a single file.
#[derive(Debug)]
pub struct MoveFileStep {
    src: String,
    dest: String,
}

impl MoveFileStep {
    pub fn new(src: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string("src", "")?, p.string("dest", "")?))
    }
}

#[async_trait]
impl Step for MoveFileStep {
    fn step_type(&self) -> &'static str {
        "move_file"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Move file {} -> {}", self.src, self.dest)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        if ctx.dry_run {
            result.add_log(
                LogLevel::Info,
                format!("Dry-run: move {} -> {}", self.src, self.dest),
                Some(self.step_type()),
            );
            return Ok(());
        }
        match ctx.backend.move_file(Path::new(&self.src), Path::new(&self.dest)) {
            Ok(()) => result.add_log(
                LogLevel::Info,
                format!("Moved {} -> {}", self.src, self.dest),
                Some(self.step_type()),
            ),
            Err(e) => result.add_error(
                format!("Move failed: {}", e),
                Some(self.step_type()),
                Some(e.kind()),
            ),
        }
        Ok(())
    }
}

/// Move several files to one destination, stopping on the first failure and
/// checking cancellation between files.
#[derive(Debug)]
pub struct MoveFilesStep {
    sources: Vec<String>,
    dest: String,
}

impl MoveFilesStep {
    pub fn new(sources: Vec<String>, dest: impl Into<String>) -> Self {
        Self {
            sources,
            dest: dest.into(),
        }
    }

    pub(crate) fn from_params(p: &Params<'_>) -> Result<Self, BuildError> {
        Ok(Self::new(p.string_list("sources")?, p.string("dest", "")?))
    }
}

#[async_trait]
impl Step for MoveFilesStep {
    fn step_type(&self) -> &'static str {
        "move_files"
    }

    fn preview(&self, _ctx: &ExecutionContext) -> String {
        format!("Move {} files -> {}", self.sources.len(), self.dest)
    }

    async fn run(&self, ctx: &ExecutionContext, result: &mut RunResult) -> Result<(), StepError> {
        for src in &self.sources {
            if ctx.cancel.is_cancelled() {
                result.mark_cancelled();
                return Ok(());
            }
            if ctx.dry_run {
                result.add_log(
                    LogLevel::Info,
                    format!("Dry-run: move {} -> {}", src, self.dest),
                    Some(self.step_type()),
                );
                continue;
            }
            match ctx.backend.move_file(Path::new(src), Path::new(&self.dest)) {
                Ok(()) => result.add_log(
                    LogLevel::Info,
                    format!("Moved {} -> {}", src, self.dest),
                    Some(self.step_type()),
                ),
                Err(e) => {
                    result.add_error(
                        format!("Move failed: {}", e),
                        Some(self.step_type()),
                        Some(e.kind()),
                    );
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

//! Pipeline context for sharing state across stages.

use crate::build::format::ContentFormat;
use crate::config::MarkupConfig;

/// Shared, read-only context for the stages of one pipeline run.
pub struct PipelineContext<'a> {
    /// Format selected for the document's file extension
    pub format: &'a dyn ContentFormat,

    /// Markup rendering options
    pub markup: &'a MarkupConfig,
}

impl<'a> PipelineContext<'a> {
    pub fn new(format: &'a dyn ContentFormat, markup: &'a MarkupConfig) -> Self {
        Self { format, markup }
    }
}

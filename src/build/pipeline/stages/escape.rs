//! Template escaping stage.

use crate::build::escape::escape_template;
use crate::build::pipeline::{PipelineContext, ProcessingDocument, Stage, StageError};
use crate::config::EscapeMode;

/// Stage that neutralizes braces so the host template does not interpolate them.
///
/// Must run last: anything emitted after it could reintroduce raw braces.
pub struct EscapeStage {
    mode: EscapeMode,
}

impl EscapeStage {
    pub fn new(mode: EscapeMode) -> Self {
        Self { mode }
    }
}

impl Stage for EscapeStage {
    fn name(&self) -> &'static str {
        "escape"
    }

    fn process(
        &self,
        doc: &mut ProcessingDocument,
        _ctx: &PipelineContext,
    ) -> Result<(), StageError> {
        doc.content = escape_template(&doc.content, self.mode);
        Ok(())
    }
}

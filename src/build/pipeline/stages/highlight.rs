//! Code highlighting stage.

use crate::build::highlight::SyntaxHighlighter;
use crate::build::pipeline::{PipelineContext, ProcessingDocument, Stage, StageError};

/// Stage that highlights language-tagged code blocks in the rendered HTML.
///
/// Blocks with unknown language tags are left untouched. This stage is
/// one-shot: running it over already highlighted markup is unsupported.
pub struct HighlightStage {
    highlighter: SyntaxHighlighter,
}

impl HighlightStage {
    pub fn new(highlighter: SyntaxHighlighter) -> Self {
        Self { highlighter }
    }
}

impl Stage for HighlightStage {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn process(
        &self,
        doc: &mut ProcessingDocument,
        _ctx: &PipelineContext,
    ) -> Result<(), StageError> {
        doc.content = self.highlighter.highlight_fragment(&doc.content);
        Ok(())
    }
}

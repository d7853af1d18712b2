//! Markup rendering stage.
//!
//! Renders the document body to an HTML fragment using the format
//! selected for the document's file extension.

use crate::build::pipeline::{PipelineContext, ProcessingDocument, Stage, StageError};

/// Stage that renders the markup body to HTML.
///
/// After this stage, `doc.content` contains a non-standalone HTML fragment.
pub struct MarkupStage;

impl Stage for MarkupStage {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn process(
        &self,
        doc: &mut ProcessingDocument,
        ctx: &PipelineContext,
    ) -> Result<(), StageError> {
        doc.content = ctx
            .format
            .render(&doc.content, ctx.markup)
            .map_err(|e| e.offset_lines(doc.line_offset))?;
        Ok(())
    }
}

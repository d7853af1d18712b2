//! Front matter extraction stage.

use crate::build::frontmatter::extract;
use crate::build::pipeline::{PipelineContext, ProcessingDocument, Stage, StageError};

/// Stage that splits the raw source into front matter and markup body.
///
/// After this stage, `doc.content` holds the body only and the document
/// carries its parsed front matter and the metadata export header.
pub struct FrontmatterStage;

impl Stage for FrontmatterStage {
    fn name(&self) -> &'static str {
        "frontmatter"
    }

    fn process(
        &self,
        doc: &mut ProcessingDocument,
        _ctx: &PipelineContext,
    ) -> Result<(), StageError> {
        let extracted = extract(&doc.content)?;

        doc.metadata_export = Some(extracted.front_matter.metadata_export()?);
        doc.front_matter = Some(extracted.front_matter);
        doc.content = extracted.body;
        doc.line_offset = extracted.body_line_offset;

        Ok(())
    }
}

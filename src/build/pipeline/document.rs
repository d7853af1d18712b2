//! Document types for pipeline processing.

use crate::build::document::{Document, Slug};
use crate::build::frontmatter::Frontmatter;
use crate::build::pipeline::StageError;

/// A document being processed through the pipeline.
///
/// Wraps the original `Document` with mutable state that evolves
/// through pipeline stages:
///
/// 1. Initially: `content` = raw source
/// 2. After frontmatter: `content` = markup body, `front_matter` and `metadata_export` set
/// 3. After markup: `content` = HTML fragment
/// 4. After highlight: code blocks in `content` carry highlight spans
/// 5. After escape: `content` is safe for the host template
#[derive(Debug)]
pub struct ProcessingDocument {
    /// The original document
    pub doc: Document,

    /// Slug derived from the document's file name
    pub slug: Slug,

    /// Content being processed.
    pub content: String,

    /// Front matter extracted by the frontmatter stage.
    pub front_matter: Option<Frontmatter>,

    /// Module script declaring the metadata, placed ahead of the body.
    pub metadata_export: Option<String>,

    /// Source lines preceding `content`, so later stages can report file line numbers.
    pub line_offset: usize,
}

impl ProcessingDocument {
    /// Create a new processing document.
    pub fn new(doc: Document, slug: Slug) -> Self {
        let content = doc.source.clone();
        Self {
            doc,
            slug,
            content,
            front_matter: None,
            metadata_export: None,
            line_offset: 0,
        }
    }

    /// Assemble the final output: metadata export followed by the body.
    pub fn into_rendered(self) -> Result<RenderedDocument, StageError> {
        let front_matter = self
            .front_matter
            .ok_or(StageError::MissingOutput("front matter"))?;
        let metadata_export = self
            .metadata_export
            .ok_or(StageError::MissingOutput("metadata export"))?;

        Ok(RenderedDocument {
            slug: self.slug,
            front_matter,
            code: metadata_export + &self.content,
        })
    }
}

/// The pipeline's result for one document.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub slug: Slug,
    pub front_matter: Frontmatter,
    /// Metadata export header followed by the escaped HTML body
    pub code: String,
}

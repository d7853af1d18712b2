//! Pipeline error types.

use crate::build::document::SlugError;
use crate::build::frontmatter::FrontmatterError;
use crate::build::markdown::MarkupError;

/// Errors raised inside a single stage.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("malformed front matter: {0}")]
    MalformedFrontmatter(#[from] FrontmatterError),

    #[error("markup syntax error: {0}")]
    MarkupSyntax(#[from] MarkupError),

    #[error("invalid slug: {0}")]
    InvalidSlug(#[from] SlugError),

    #[error("could not read source: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("slug is already taken by '{first}'")]
    DuplicateSlug { first: String },

    #[error("no {0} output was produced (is the stage installed?)")]
    MissingOutput(&'static str),
}

/// A stage failure tagged with the stage name and the document it hit.
#[derive(thiserror::Error, Debug)]
#[error("stage '{stage}' failed for '{document}': {source}")]
pub struct PipelineError {
    pub stage: &'static str,
    /// The document's slug, or its file name when no slug could be derived
    pub document: String,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn new(stage: &'static str, document: impl Into<String>, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            document: document.into(),
            source: source.into(),
        }
    }
}

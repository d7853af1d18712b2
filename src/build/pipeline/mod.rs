//! Document processing pipeline.
//!
//! The pipeline transforms one document through a series of stages:
//! 1. Front matter extraction (metadata + metadata export header)
//! 2. Markup rendering (body to HTML fragment)
//! 3. Code highlighting (optional, see `HighlightConfig::enabled`)
//! 4. Template escaping (braces to entities outside component tags)
//!
//! Stages run strictly in order and the first failure ends the run. Errors
//! carry the failing stage and the document's slug.

mod context;
mod document;
mod error;
mod stages;

pub use context::PipelineContext;
pub use document::{ProcessingDocument, RenderedDocument};
pub use error::{PipelineError, StageError};

use stages::{EscapeStage, FrontmatterStage, HighlightStage, MarkupStage};

use crate::build::document::Document;
use crate::build::format::FormatRegistry;
use crate::build::highlight::SyntaxHighlighter;
use crate::config::{MarkupConfig, SiteConfig};

/// A stage in the document processing pipeline.
///
/// Stages transform a document in place; each sees only the previous
/// stage's output.
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used in errors and logs).
    fn name(&self) -> &'static str;

    /// Process one document through this stage.
    fn process(
        &self,
        doc: &mut ProcessingDocument,
        ctx: &PipelineContext,
    ) -> Result<(), StageError>;
}

/// The document processing pipeline.
///
/// A pipeline is immutable once built and can be shared between threads;
/// runs for different documents do not interact.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    formats: FormatRegistry,
    markup: MarkupConfig,
}

impl Pipeline {
    /// Create a pipeline with no stages.
    pub fn new(formats: FormatRegistry, markup: MarkupConfig) -> Self {
        Self {
            stages: Vec::new(),
            formats,
            markup,
        }
    }

    /// Create the standard pipeline for a site configuration.
    ///
    /// Stages: frontmatter → markup → highlight → escape. The highlight
    /// stage is left out when highlighting is disabled.
    pub fn from_config(config: &SiteConfig) -> Self {
        let mut pipeline = Self::new(FormatRegistry::with_defaults(), config.markup.clone());
        pipeline.add_stage(FrontmatterStage);
        pipeline.add_stage(MarkupStage);
        if config.highlight.enabled {
            pipeline.add_stage(HighlightStage::new(SyntaxHighlighter::new(
                &config.highlight.theme,
            )));
        } else {
            tracing::debug!("code highlighting disabled");
        }
        pipeline.add_stage(EscapeStage::new(config.escape));
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// The format registry used to recognize documents.
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Run the pipeline on one document.
    ///
    /// Returns `Ok(None)` if no format is registered for the document's
    /// extension; such files are not this pipeline's concern.
    pub fn run(&self, doc: Document) -> Result<Option<RenderedDocument>, PipelineError> {
        let Some(format) = self.formats.for_path(&doc.path) else {
            tracing::debug!(path = %doc.path.display(), "not a markup document, skipping");
            return Ok(None);
        };

        let slug = doc
            .slug()
            .map_err(|e| PipelineError::new("document", doc.display_name(), e))?;

        tracing::debug!(document = %slug, format = format.name(), "processing document");
        let ctx = PipelineContext::new(format, &self.markup);
        let mut processing = ProcessingDocument::new(doc, slug);

        for stage in &self.stages {
            tracing::debug!(document = %processing.slug, stage = stage.name(), "running stage");
            stage
                .process(&mut processing, &ctx)
                .map_err(|e| PipelineError::new(stage.name(), processing.slug.as_str(), e))?;
        }

        tracing::debug!(document = %processing.slug, path = %processing.doc.path.display(), "document rendered");
        let slug = processing.slug.clone();
        processing
            .into_rendered()
            .map(Some)
            .map_err(|e| PipelineError::new("assemble", slug.as_str(), e))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_config(&SiteConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::frontmatter::FrontmatterError;
    use crate::build::markdown::MarkupError;
    use crate::config::EscapeMode;

    const ARTICLE: &str = r#"---
title: Closures
date: 2024-06-01
categories: [rust]
published: true
---

# Closures {#closures}

Capture `{x}` by reference.

```rust
let add = |a: i32| -> i32 { a + 1 };
```

```nosuchlang
if (a < b) { go() }
```

<Callout count={3} />
"#;

    fn run(pipeline: &Pipeline, name: &str, source: &str) -> Result<Option<RenderedDocument>, PipelineError> {
        pipeline.run(Document::new(name, source))
    }

    #[test]
    fn test_default_stage_order() {
        let pipeline = Pipeline::default();
        assert_eq!(
            pipeline.stage_names(),
            vec!["frontmatter", "markup", "highlight", "escape"]
        );
    }

    #[test]
    fn test_highlighting_can_be_disabled() {
        let mut config = SiteConfig::default();
        config.highlight.enabled = false;
        let pipeline = Pipeline::from_config(&config);
        assert_eq!(pipeline.stage_names(), vec!["frontmatter", "markup", "escape"]);

        let rendered = run(&pipeline, "closures.md", ARTICLE).unwrap().unwrap();
        assert!(rendered.code.contains(
            "<code class=\"language-rust\" data-lang=\"rust\">let add = |a: i32| -&gt; i32 &#123; a + 1 &#125;;"
        ));
    }

    #[test]
    fn test_full_run() {
        let rendered = run(&Pipeline::default(), "articles/closures.md", ARTICLE)
            .unwrap()
            .unwrap();

        assert_eq!(rendered.slug.as_str(), "closures");
        assert_eq!(rendered.front_matter.title, "Closures");

        let code = &rendered.code;
        // Export header first, literal braces intact
        assert!(code.starts_with("<script context=\"module\">\n\texport const metadata = {\"title\":\"Closures\""));
        let body = &code[code.find("</script>\n").unwrap() + "</script>\n".len()..];

        assert!(body.contains("<h1 id=\"closures\">"));
        assert!(body.contains("<code>&#123;x&#125;</code>"));
        // Rust block highlighted, unknown block left alone (apart from brace escaping)
        assert!(body.contains("<span"));
        assert!(body.contains("data-lang=\"nosuchlang\">if (a &lt; b) &#123; go() &#125;\n</code>"));
        // Component reference keeps its binding
        assert!(body.contains("<Callout count={3} />"));
        // Nothing in the body is left for the template to interpolate
        let without_component = body.replace("<Callout count={3} />", "");
        assert!(!without_component.contains('{'));
        assert!(!without_component.contains('}'));
    }

    #[test]
    fn test_line_escape_mode() {
        let mut config = SiteConfig::default();
        config.escape = EscapeMode::Line;
        let rendered = run(&Pipeline::from_config(&config), "closures.md", ARTICLE)
            .unwrap()
            .unwrap();
        assert!(rendered.code.contains("<Callout count={3} />"));
        assert!(rendered.code.contains("<code>&#123;x&#125;</code>"));
    }

    #[test]
    fn test_non_markup_files_pass_through() {
        let result = run(&Pipeline::default(), "logo.svg", "<svg>{}</svg>").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_frontmatter_failure_is_tagged() {
        let err = run(&Pipeline::default(), "broken.md", "---\ntitle: x\n").unwrap_err();
        assert_eq!(err.stage, "frontmatter");
        assert_eq!(err.document, "broken");
        assert!(matches!(
            err.source,
            StageError::MalformedFrontmatter(FrontmatterError::Unterminated { .. })
        ));
    }

    #[test]
    fn test_markup_failure_is_tagged() {
        let source = "---\ntitle: T\ndate: 2024-01-01\ncategories: []\npublished: true\n---\n```rust\nfn main() {}\n";
        let err = run(&Pipeline::default(), "fence.md", source).unwrap_err();
        assert_eq!(err.stage, "markup");
        assert_eq!(err.document, "fence");
        assert!(matches!(
            err.source,
            StageError::MarkupSyntax(MarkupError::UnterminatedFence { line: 7 })
        ));
        assert!(err.to_string().contains("stage 'markup' failed for 'fence'"));
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn test_invalid_slug() {
        let err = run(&Pipeline::default(), "my post.md", ARTICLE).unwrap_err();
        assert_eq!(err.stage, "document");
        assert_eq!(err.document, "my post.md");
        assert!(matches!(err.source, StageError::InvalidSlug(_)));
    }

    #[test]
    fn test_missing_frontmatter_stage_reports_assembly_error() {
        let mut pipeline = Pipeline::new(FormatRegistry::with_defaults(), MarkupConfig::default());
        pipeline.add_stage(MarkupStage);

        let err = run(&pipeline, "x.md", "hello").unwrap_err();
        assert_eq!(err.stage, "assemble");
        assert!(matches!(err.source, StageError::MissingOutput(_)));
    }

    #[test]
    fn test_concurrent_runs_agree() {
        let pipeline = Pipeline::default();
        let expected = run(&pipeline, "closures.md", ARTICLE).unwrap().unwrap().code;

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| run(&pipeline, "closures.md", ARTICLE).unwrap().unwrap().code))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}

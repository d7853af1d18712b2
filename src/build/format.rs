//! Markup formats, looked up by file extension.
//!
//! The pipeline never parses markup itself. It asks the registry for the
//! format claiming a file's extension and hands it the body; a file whose
//! extension nobody claims is not an article.
//!
//! Other dialects plug in by implementing [`ContentFormat`]:
//!
//! ```ignore
//! struct Djot;
//!
//! impl ContentFormat for Djot {
//!     fn name(&self) -> &'static str { "djot" }
//!     fn extensions(&self) -> &[&'static str] { &["dj"] }
//!     fn render(&self, body: &str, config: &MarkupConfig) -> Result<String, MarkupError> {
//!         // convert the body to an HTML fragment
//!     }
//! }
//!
//! registry.register(Djot);
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::build::markdown::{MarkupError, render_markdown};
use crate::config::MarkupConfig;

/// A markup dialect that turns an article body into an HTML fragment.
///
/// Output must be deterministic and non-standalone (no `<html>`/`<body>`).
/// Code blocks carrying a language are expected as
/// `<pre class="highlight"><code data-lang="...">` with escaped content, so
/// the highlight stage can find them.
pub trait ContentFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lowercase extensions without the dot.
    fn extensions(&self) -> &[&'static str];

    /// Render a body whose front matter has already been stripped.
    fn render(&self, body: &str, config: &MarkupConfig) -> Result<String, MarkupError>;
}

/// CommonMark + GFM through pulldown-cmark.
pub struct MarkdownFormat;

impl ContentFormat for MarkdownFormat {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extensions(&self) -> &[&'static str] {
        &["md", "markdown"]
    }

    fn render(&self, body: &str, config: &MarkupConfig) -> Result<String, MarkupError> {
        render_markdown(body, config)
    }
}

/// Extension → format table. When two formats claim an extension the one
/// registered last owns it.
pub struct FormatRegistry {
    formats: Vec<Box<dyn ContentFormat>>,
    /// Lowercase extension to index in `formats`
    by_extension: HashMap<String, usize>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self {
            formats: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// A registry that knows Markdown.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MarkdownFormat);
        registry
    }

    pub fn register<F: ContentFormat + 'static>(&mut self, format: F) {
        let idx = self.formats.len();
        for ext in format.extensions() {
            self.by_extension.insert(ext.to_ascii_lowercase(), idx);
        }
        self.formats.push(Box::new(format));
    }

    /// Case-insensitive lookup by extension (without the dot).
    pub fn for_extension(&self, ext: &str) -> Option<&dyn ContentFormat> {
        let idx = *self.by_extension.get(&ext.to_ascii_lowercase())?;
        Some(self.formats[idx].as_ref())
    }

    pub fn for_path(&self, path: &Path) -> Option<&dyn ContentFormat> {
        let ext = path.extension()?.to_str()?;
        self.for_extension(ext)
    }

    /// True if some format claims the path's extension.
    pub fn is_document(&self, path: &Path) -> bool {
        self.for_path(path).is_some()
    }

    /// Every claimed extension, those of the latest registration first.
    pub fn all_extensions(&self) -> Vec<&'static str> {
        let mut extensions = Vec::new();
        for (idx, format) in self.formats.iter().enumerate().rev() {
            for ext in format.extensions() {
                let owned = self.by_extension.get(&ext.to_ascii_lowercase()) == Some(&idx);
                if owned && !extensions.contains(ext) {
                    extensions.push(*ext);
                }
            }
        }
        extensions
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plaintext;

    impl ContentFormat for Plaintext {
        fn name(&self) -> &'static str {
            "plaintext"
        }
        fn extensions(&self) -> &[&'static str] {
            &["txt", "md"]
        }
        fn render(&self, body: &str, _config: &MarkupConfig) -> Result<String, MarkupError> {
            Ok(format!("<pre>{body}</pre>"))
        }
    }

    #[test]
    fn test_markdown_lookup_ignores_case() {
        let registry = FormatRegistry::default();

        assert_eq!(registry.for_extension("md").map(|f| f.name()), Some("markdown"));
        assert_eq!(registry.for_extension("Markdown").map(|f| f.name()), Some("markdown"));
        assert!(registry.for_extension("adoc").is_none());
        assert!(registry.for_extension("").is_none());
    }

    #[test]
    fn test_is_document() {
        let registry = FormatRegistry::default();

        assert!(registry.is_document(Path::new("src/articles/borrowing.md")));
        assert!(registry.is_document(Path::new("NOTES.MD")));
        assert!(!registry.is_document(Path::new("cover.png")));
        assert!(!registry.is_document(Path::new("LICENSE")));
    }

    #[test]
    fn test_later_registration_wins() {
        let mut registry = FormatRegistry::with_defaults();
        registry.register(Plaintext);

        assert_eq!(registry.for_extension("md").unwrap().name(), "plaintext");
        assert_eq!(registry.for_extension("txt").unwrap().name(), "plaintext");
        assert_eq!(registry.for_extension("markdown").unwrap().name(), "markdown");
        assert_eq!(registry.all_extensions(), vec!["txt", "md", "markdown"]);
    }

    #[test]
    fn test_markdown_format_renders_fragment() {
        let html = MarkdownFormat
            .render("*hi*", &MarkupConfig::default())
            .unwrap();
        assert_eq!(html, "<p><em>hi</em></p>\n");
    }
}

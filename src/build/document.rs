use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

// =============================================================================
// Documents
// =============================================================================

/// An article source as read from disk: its path and raw text.
///
/// Documents are immutable input. The pipeline copies what it needs into a
/// `ProcessingDocument` and never hands references back into the source.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path of the source file (only the file name matters for the slug)
    pub path: PathBuf,
    /// Raw source text: front matter block followed by the markup body
    pub source: String,
}

impl Document {
    /// Create a document from an in-memory source.
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Read a document from disk.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::new(path, source))
    }

    /// Derive the document's slug from its file name.
    pub fn slug(&self) -> Result<Slug, SlugError> {
        Slug::from_path(&self.path)
    }

    /// The file name, for diagnostics when no valid slug can be derived.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

// =============================================================================
// Slugs
// =============================================================================

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),

    #[error("slug is empty")]
    Empty,

    #[error("slug '{0}' is not URL-safe (allowed: ASCII letters, digits, '-', '_', '.', '~')")]
    NotUrlSafe(String),
}

/// URL-safe document identifier, derived from the file name minus its extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Validate a slug string.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        let url_safe = !s.starts_with('.')
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'));
        if !url_safe {
            return Err(SlugError::NotUrlSafe(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Derive a slug from a source path: "articles/hello-world.md" -> "hello-world".
    pub fn from_path(path: &Path) -> Result<Self, SlugError> {
        let stem = path
            .file_stem()
            .ok_or_else(|| SlugError::NoFileName(path.to_path_buf()))?;
        Self::parse(&stem.to_string_lossy())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Slug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A requested slug has no matching source document.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("could not find article {slug}")]
pub struct DocumentNotFound {
    pub slug: String,
}

impl DocumentNotFound {
    pub fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into() }
    }
}

//! Configuration type definitions.
//!
//! This module contains all the data structures used in svmark configuration files.
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Site config
// =============================================================================

/// Top-level configuration, read from `svmark.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory containing the article sources
    #[serde(default = "default_content_dir")]
    pub content: PathBuf,
    /// Directory generated components are written to
    #[serde(default = "default_output_dir")]
    pub output: PathBuf,
    /// File extension of generated components
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
    /// How braces are neutralized for the host template
    #[serde(default)]
    pub escape: EscapeMode,
    #[serde(default)]
    pub markup: MarkupConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("src/articles")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build/articles")
}

fn default_output_extension() -> String {
    "svelte".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content: default_content_dir(),
            output: default_output_dir(),
            output_extension: default_output_extension(),
            escape: EscapeMode::default(),
            markup: MarkupConfig::default(),
            highlight: HighlightConfig::default(),
        }
    }
}

// =============================================================================
// Escaping
// =============================================================================

/// Strategy used to keep literal braces away from the host template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// Scan the fragment into tags and text; only component tags keep braces.
    #[default]
    Structural,
    /// Escape everything, then restore braces from `<Component` to end of line.
    Line,
}

// =============================================================================
// Markup configuration
// =============================================================================

/// Markup rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkupConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markup_extensions")]
    pub extensions: Vec<String>,
    /// How admonition icons are rendered
    #[serde(default)]
    pub icons: IconMode,
    /// Append a self-link anchor to every heading
    #[serde(default = "default_true")]
    pub section_anchors: bool,
}

fn default_markup_extensions() -> Vec<String> {
    vec![
        "definition_lists".to_string(),
        "footnotes".to_string(),
        "gfm".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            extensions: default_markup_extensions(),
            icons: IconMode::default(),
            section_anchors: true,
        }
    }
}

/// Admonition icon rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconMode {
    /// Icon font glyphs (`<i class="fa icon-note">`)
    #[default]
    Font,
    /// Plain text labels
    Text,
}

// =============================================================================
// Highlighting
// =============================================================================

/// Code block highlighting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// When false, code blocks are left as the markup renderer produced them
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Theme used for the generated stylesheet
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    "github-dark".to_string()
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: default_theme(),
        }
    }
}

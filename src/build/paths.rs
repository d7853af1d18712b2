//! Path conversion utilities.
//!
//! This module handles conversions between:
//! - Config-relative paths (as written in `svmark.yaml`)
//! - Source file paths (an article's slug plus a registered extension)
//! - Output file paths (where generated components are written)

use std::path::{Path, PathBuf};

use crate::build::document::Slug;

/// Resolve a path from the config file against the config's directory.
///
/// Absolute paths are returned unchanged.
pub fn resolve_path(base_path: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_path.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Candidate source file for a slug with the given extension.
///
/// # Examples
/// ```ignore
/// source_path(content_dir, "hello-world", "md") => content_dir/hello-world.md
/// ```
pub fn source_path(content_dir: &Path, slug: &Slug, extension: &str) -> PathBuf {
    content_dir.join(format!("{slug}.{extension}"))
}

/// Output file for a rendered document.
///
/// # Examples
/// ```ignore
/// output_path(output_dir, "hello-world", "svelte") => output_dir/hello-world.svelte
/// ```
pub fn output_path(output_dir: &Path, slug: &Slug, extension: &str) -> PathBuf {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        output_dir.join(slug.as_str())
    } else {
        output_dir.join(format!("{slug}.{extension}"))
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

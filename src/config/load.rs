//! Configuration loading from files.
//!
//! This module handles reading and parsing configuration files.

use std::path::Path;

use super::{ConfigError, SiteConfig};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "svmark.yaml";

/// Prefix for environment overrides, e.g. `SVMARK_HIGHLIGHT__ENABLED=false`.
const ENV_PREFIX: &str = "SVMARK";

impl SiteConfig {
    /// Load the config from a file path, layering environment overrides on top.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
        }

        Ok(config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<SiteConfig>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EscapeMode;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::load_from_file(&dir.path().join("svmark.yaml")).unwrap();
        assert_eq!(config.output_extension, "svelte");
        assert!(config.highlight.enabled);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svmark.yaml");
        std::fs::write(
            &path,
            "content: posts\noutput_extension: html\nescape: line\nhighlight:\n  theme: dracula\n",
        )
        .unwrap();

        let config = SiteConfig::load_from_file(&path).unwrap();
        assert_eq!(config.content, std::path::PathBuf::from("posts"));
        assert_eq!(config.output_extension, "html");
        assert_eq!(config.escape, EscapeMode::Line);
        assert_eq!(config.highlight.theme, "dracula");
        assert!(config.highlight.enabled);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svmark.yaml");
        std::fs::write(&path, "escape: sideways\n").unwrap();

        assert!(SiteConfig::load_from_file(&path).is_err());
    }
}

use std::path::Path;

use crate::build::{Builder, base_path_from_config};
use crate::config::{DEFAULT_CONFIG_FILE, SiteConfig};

pub mod articles;
pub mod build;
pub mod render;

/// Load the config and create a builder rooted at the config file's directory.
fn load_builder(config_file: Option<&Path>, no_highlight: bool) -> Result<Builder, anyhow::Error> {
    // Determine the config file path
    let config_path = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    let config_path = if config_path.is_relative() {
        std::env::current_dir()?.join(config_path)
    } else {
        config_path.to_path_buf()
    };

    let mut config = SiteConfig::load_from_file(&config_path)?;
    if no_highlight {
        config.highlight.enabled = false;
    }

    // Get the base path for resolving relative paths
    let base_path = base_path_from_config(&config_path);

    Ok(Builder::new(config, base_path))
}

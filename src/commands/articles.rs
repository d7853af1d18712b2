use std::path::Path;

use crate::ArticlesArgs;
use crate::build::ArticleQuery;

use super::load_builder;

pub fn run(config_file: Option<&Path>, args: &ArticlesArgs) -> Result<(), anyhow::Error> {
    // Listing never renders bodies, so the highlighter is never needed
    let builder = load_builder(config_file, true)?;
    let report = builder.index()?;

    if report.index.is_empty() {
        tracing::warn!(dir = %builder.content_dir().display(), "no articles found");
    }
    for failure in &report.failures {
        tracing::warn!(error = %failure, "article left out of the listing");
    }

    let json = match &args.slug {
        Some(slug) => serde_json::to_string_pretty(report.index.get(slug)?)?,
        None => {
            let query = ArticleQuery {
                tags: args.tags.clone(),
                title: args.title.clone(),
                limit: args.limit,
            };
            serde_json::to_string_pretty(&report.index.query(&query))?
        }
    };
    println!("{json}");

    Ok(())
}

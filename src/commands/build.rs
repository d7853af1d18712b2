use std::path::Path;

use crate::BuildArgs;

use super::load_builder;

pub async fn run(config_file: Option<&Path>, args: &BuildArgs) -> Result<(), anyhow::Error> {
    let builder = load_builder(config_file, args.no_highlight)?;
    tracing::debug!(stages = ?builder.pipeline().stage_names(), "pipeline ready");

    let result = builder.build(args.keep_going).await?;

    println!(
        "Built {} article(s) to {} ({} other file(s) skipped)",
        result.documents,
        result.output_dir.display(),
        result.skipped
    );
    println!("Wrote article listing to {}", result.listing.display());
    if let Some(stylesheet) = &result.stylesheet {
        println!("Wrote highlight stylesheet to {}", stylesheet.display());
    }

    if result.failed > 0 {
        anyhow::bail!("{} article(s) failed to build", result.failed);
    }

    Ok(())
}

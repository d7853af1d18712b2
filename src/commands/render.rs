use std::path::Path;

use crate::RenderArgs;

use super::load_builder;

pub fn run(config_file: Option<&Path>, args: &RenderArgs) -> Result<(), anyhow::Error> {
    let builder = load_builder(config_file, args.no_highlight)?;

    // An existing file wins; anything else is looked up as a slug
    let target = Path::new(&args.target);
    let rendered = if target.is_file() {
        builder.render_path(target)?
    } else {
        builder.render_slug(&args.target)?
    };

    if args.meta {
        println!("{}", serde_json::to_string_pretty(&rendered.front_matter)?);
    } else {
        print!("{}", rendered.code);
    }

    Ok(())
}

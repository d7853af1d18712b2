use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod build;
mod commands;
mod config;
mod util;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The path to the configuration file
    #[arg(short, long, global = true, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    command: SvmarkCommand,
}

#[derive(Parser)]
struct BuildArgs {
    /// Keep building the remaining articles after one fails
    #[arg(short, long, default_value = "false")]
    keep_going: bool,

    /// Leave code blocks unhighlighted
    #[arg(long, default_value = "false")]
    no_highlight: bool,
}

#[derive(Parser)]
struct RenderArgs {
    /// Slug of an article in the content directory, or a path to a source file
    target: String,

    /// Leave code blocks unhighlighted
    #[arg(long, default_value = "false")]
    no_highlight: bool,

    /// Print the article's front matter as JSON instead of the component
    #[arg(short, long, default_value = "false")]
    meta: bool,
}

#[derive(Parser)]
struct ArticlesArgs {
    /// Only list articles in at least one of these categories
    #[arg(short, long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Only list articles whose title contains this text
    #[arg(long)]
    title: Option<String>,

    /// Maximum number of articles to list
    #[arg(short, long)]
    limit: Option<usize>,

    /// Show a single article (published or not)
    #[arg(short, long, conflicts_with_all = ["tags", "title", "limit"])]
    slug: Option<String>,
}

#[derive(Subcommand)]
enum SvmarkCommand {
    /// Render every article into the output directory
    Build(BuildArgs),

    /// Render one article and print the result
    Render(RenderArgs),

    /// List published articles as JSON
    Articles(ArticlesArgs),
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so rendered output on stdout stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let config_file = args.config_file.as_deref();
    match args.command {
        SvmarkCommand::Build(build_args) => {
            commands::build::run(config_file, &build_args).await?;
        }
        SvmarkCommand::Render(render_args) => {
            commands::render::run(config_file, &render_args)?;
        }
        SvmarkCommand::Articles(articles_args) => {
            commands::articles::run(config_file, &articles_args)?;
        }
    }

    Ok(())
}

mod articles;
mod builder;
mod document;
mod escape;
pub mod format;
mod frontmatter;
mod highlight;
mod markdown;
mod paths;
pub mod pipeline;

pub use articles::ArticleQuery;
pub use builder::Builder;
pub use paths::base_path_from_config;

//! Default pipeline stages.
//!
//! The standard document processing pipeline consists of:
//!
//! 1. **FrontmatterStage** - Split front matter from the markup body
//! 2. **MarkupStage** - Convert the body to an HTML fragment
//! 3. **HighlightStage** - Highlight language-tagged code blocks (optional)
//! 4. **EscapeStage** - Neutralize braces for the host template

mod escape;
mod frontmatter;
mod highlight;
mod markup;

pub use escape::EscapeStage;
pub use frontmatter::FrontmatterStage;
pub use highlight::HighlightStage;
pub use markup::MarkupStage;

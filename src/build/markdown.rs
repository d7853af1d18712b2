//! Markdown rendering to a non-standalone HTML fragment.
//!
//! Code blocks are emitted pre-escaped and tagged with `data-lang` so the
//! highlight stage can find them later; nothing is highlighted here.

use std::collections::HashSet;

use pulldown_cmark::{
    BlockQuoteKind, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
    html,
};

use crate::config::{IconMode, MarkupConfig};
use crate::util::{html_escape, slugify};

#[derive(thiserror::Error, Debug)]
pub enum MarkupError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),

    #[error("code fence opened on line {line} is never closed")]
    UnterminatedFence { line: usize },
}

impl MarkupError {
    /// Move reported line numbers down by `lines`, for a body that started
    /// partway into its source file.
    pub fn offset_lines(self, lines: usize) -> Self {
        match self {
            Self::UnterminatedFence { line } => Self::UnterminatedFence { line: line + lines },
            other => other,
        }
    }
}

/// A heading being buffered until its end tag.
struct HeadingState<'a> {
    level: HeadingLevel,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    events: Vec<Event<'a>>,
    text: String,
}

/// Render markdown to an HTML fragment using pulldown-cmark.
pub fn render_markdown(markdown: &str, config: &MarkupConfig) -> Result<String, MarkupError> {
    let mut options = Options::empty();
    for extension in &config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkupError::InvalidExtension(other.to_string())),
        }
    }

    check_fences(markdown)?;

    let parser = Parser::new_ext(markdown, options);

    let mut in_code_block = false;
    let mut code_language = String::new();
    let mut code_content = String::new();

    // Headings are buffered so an id can be generated from their text
    let mut in_heading: Option<HeadingState> = None;
    let mut used_heading_ids: HashSet<String> = HashSet::new();

    let events: Vec<Event> = parser
        .flat_map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                if let Some(existing) = &id {
                    used_heading_ids.insert(existing.to_string());
                }
                in_heading = Some(HeadingState {
                    level,
                    id: id.map(|id| id.to_string()),
                    classes: classes.iter().map(|c| c.to_string()).collect(),
                    attrs: attrs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.as_ref().map(|v| v.to_string())))
                        .collect(),
                    events: Vec::new(),
                    text: String::new(),
                });
                vec![]
            }
            Event::End(TagEnd::Heading(_)) => match in_heading.take() {
                Some(state) => vec![Event::Html(
                    render_heading(state, &mut used_heading_ids, config.section_anchors).into(),
                )],
                None => vec![event],
            },
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code_block = true;
                code_language = match kind {
                    // Only the first word of the info string names the language
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or_default().to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                code_content.clear();
                vec![]
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                vec![Event::Html(code_block(&code_content, &code_language).into())]
            }
            Event::Text(text) if in_code_block => {
                code_content.push_str(&text);
                vec![]
            }
            Event::Start(Tag::BlockQuote(Some(kind))) => {
                vec![Event::Html(admonition_open(kind, config.icons).into())]
            }
            Event::End(TagEnd::BlockQuote(Some(_))) => {
                vec![Event::Html(CowStr::Borrowed("</td>\n</tr>\n</table>\n</div>\n"))]
            }
            other => match in_heading.as_mut() {
                Some(state) => {
                    match &other {
                        Event::Text(text) | Event::Code(text) => state.text.push_str(text),
                        _ => {}
                    }
                    state.events.push(other);
                    vec![]
                }
                None => vec![other],
            },
        })
        .collect();

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());

    Ok(html_output)
}

/// Emit a buffered heading with a unique id and, optionally, a self-link anchor.
fn render_heading(
    state: HeadingState<'_>,
    used_ids: &mut HashSet<String>,
    section_anchors: bool,
) -> String {
    let id = match state.id {
        Some(id) => id,
        None => {
            let base = match slugify(&state.text) {
                s if s.is_empty() => "section".to_string(),
                s => s,
            };
            let mut id = base.clone();
            let mut suffix = 1;
            while used_ids.contains(&id) {
                id = format!("{}-{}", base, suffix);
                suffix += 1;
            }
            used_ids.insert(id.clone());
            id
        }
    };

    let mut inner = String::new();
    html::push_html(&mut inner, state.events.into_iter());

    let class_attr = if state.classes.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", html_escape(&state.classes.join(" ")))
    };

    let extra_attrs = state
        .attrs
        .iter()
        .map(|(k, v)| match v {
            Some(val) => format!(" {}=\"{}\"", html_escape(k), html_escape(val)),
            None => format!(" {}", html_escape(k)),
        })
        .collect::<String>();

    let anchor = if section_anchors {
        format!(
            " <a class=\"anchor\" href=\"#{}\" aria-label=\"Link to this section\">#</a>",
            html_escape(&id)
        )
    } else {
        String::new()
    };

    let level = state.level as usize;
    format!(
        "<h{level} id=\"{}\"{class_attr}{extra_attrs}>{inner}{anchor}</h{level}>\n",
        html_escape(&id),
    )
}

/// Emit a code block with its content escaped.
fn code_block(code: &str, language: &str) -> String {
    let escaped = html_escape(code);
    if language.is_empty() {
        format!("<pre><code>{}</code></pre>\n", escaped)
    } else {
        let lang = html_escape(language);
        format!(
            "<pre class=\"highlight\"><code class=\"language-{lang}\" data-lang=\"{lang}\">{escaped}</code></pre>\n"
        )
    }
}

/// Open an admonition block for a GFM alert (`> [!NOTE]`).
fn admonition_open(kind: BlockQuoteKind, icons: IconMode) -> String {
    let (class, title) = match kind {
        BlockQuoteKind::Note => ("note", "Note"),
        BlockQuoteKind::Tip => ("tip", "Tip"),
        BlockQuoteKind::Important => ("important", "Important"),
        BlockQuoteKind::Warning => ("warning", "Warning"),
        BlockQuoteKind::Caution => ("caution", "Caution"),
    };
    let icon = match icons {
        IconMode::Font => format!("<i class=\"fa icon-{class}\" title=\"{title}\"></i>"),
        IconMode::Text => format!("<div class=\"title\">{title}</div>"),
    };
    format!(
        "<div class=\"admonitionblock {class}\">\n<table>\n<tr>\n<td class=\"icon\">\n{icon}\n</td>\n<td class=\"content\">\n"
    )
}

/// Reject a top-level fenced code block that is never closed.
///
/// CommonMark closes such a block at the end of the document, which silently
/// turns the rest of the article into code.
fn check_fences(markdown: &str) -> Result<(), MarkupError> {
    let mut open: Option<(char, usize, usize)> = None;

    for (idx, line) in markdown.lines().enumerate() {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            continue;
        }
        let trimmed = &line[indent..];
        let Some(fence_char) = trimmed.chars().next().filter(|c| *c == '`' || *c == '~') else {
            continue;
        };
        let run = trimmed.chars().take_while(|c| *c == fence_char).count();
        if run < 3 {
            continue;
        }
        let rest = &trimmed[run..];

        match open {
            None => {
                // A backtick fence's info string cannot contain backticks
                if fence_char == '`' && rest.contains('`') {
                    continue;
                }
                open = Some((fence_char, run, idx + 1));
            }
            Some((c, len, _)) if c == fence_char && run >= len && rest.trim().is_empty() => {
                open = None;
            }
            Some(_) => {}
        }
    }

    match open {
        Some((_, _, line)) => Err(MarkupError::UnterminatedFence { line }),
        None => Ok(()),
    }
}

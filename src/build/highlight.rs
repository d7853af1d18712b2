//! Syntax highlighting of rendered code blocks.
//!
//! Works on the HTML fragment produced by the markup stage: every
//! `<pre class="highlight"><code ... data-lang="...">` block whose language
//! resolves in the grammar registry has its content replaced by class-based
//! spans. Everything else is left byte-for-byte as it was.

use std::collections::HashMap;
use std::sync::LazyLock;

use autumnus::{HtmlLinkedBuilder, formatter::Formatter, languages::Language, themes};

use crate::util::html_unescape;

const BLOCK_OPEN: &str = "<pre class=\"highlight\">";
const CODE_CLOSE: &str = "</code>";

/// Tags that explicitly ask for no highlighting.
const PLAIN_TAGS: &[&str] = &["text", "plaintext", "plain", "txt", "none"];

/// Language tags resolved up front when the registry is first used.
const CATALOG: &[&str] = &[
    "bash", "c", "cpp", "css", "diff", "dockerfile", "elixir", "go", "haskell", "html", "java",
    "javascript", "js", "json", "kotlin", "lua", "make", "markdown", "nix", "ocaml", "php",
    "python", "py", "ruby", "rust", "rs", "scala", "scss", "sh", "sql", "svelte", "swift", "toml",
    "ts", "tsx", "typescript", "xml", "yaml", "yml", "zig",
];

static GRAMMARS: LazyLock<GrammarRegistry> = LazyLock::new(GrammarRegistry::load);

// =============================================================================
// Grammar registry
// =============================================================================

/// Process-wide table from language tag to grammar.
///
/// Built on first access and read-only afterwards. Concurrent first callers
/// block on the single initialization instead of repeating it.
pub struct GrammarRegistry {
    grammars: HashMap<&'static str, Language>,
}

impl GrammarRegistry {
    /// The shared registry, loading it if this is the first use in the process.
    pub fn global() -> &'static GrammarRegistry {
        &GRAMMARS
    }

    fn load() -> Self {
        let grammars: HashMap<_, _> = CATALOG
            .iter()
            .filter_map(|tag| {
                let lang = Language::guess(tag, "");
                (!matches!(lang, Language::PlainText)).then_some((*tag, lang))
            })
            .collect();
        tracing::debug!(languages = grammars.len(), "grammar registry loaded");

        Self { grammars }
    }

    /// Resolve a free-form language tag. Returns `None` for plain-text and unknown tags.
    pub fn resolve(&self, tag: &str) -> Option<Language> {
        let tag = tag.trim().to_ascii_lowercase();
        if tag.is_empty() || PLAIN_TAGS.contains(&tag.as_str()) {
            return None;
        }
        if let Some(lang) = self.grammars.get(tag.as_str()) {
            return Some(lang.clone());
        }
        // Outside the catalog, fall back to autumnus' own name/extension matching
        let lang = Language::guess(&tag, "");
        (!matches!(lang, Language::PlainText)).then_some(lang)
    }
}

// =============================================================================
// Highlighter
// =============================================================================

/// A syntax highlighter using autumnus (tree-sitter based).
pub struct SyntaxHighlighter {
    /// Theme name for CSS generation.
    theme_name: String,
}

impl SyntaxHighlighter {
    /// Create a new syntax highlighter with the given theme.
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme_name: theme_name.to_string(),
        }
    }

    /// Highlight every tagged code block in a rendered fragment.
    pub fn highlight_fragment(&self, html: &str) -> String {
        let registry = GrammarRegistry::global();
        let mut output = String::with_capacity(html.len());
        let mut rest = html;

        while let Some(block) = find_block(rest) {
            let code = &rest[block.inner_start..block.inner_end];
            let highlighted = block
                .language
                .as_deref()
                .and_then(|tag| match registry.resolve(tag) {
                    Some(lang) => self.highlight(&html_unescape(code), lang),
                    None => {
                        tracing::debug!(language = tag, "no grammar for language tag, leaving block as-is");
                        None
                    }
                });

            match highlighted {
                Some(spans) => {
                    output.push_str(&rest[..block.inner_start]);
                    output.push_str(&spans);
                }
                None => output.push_str(&rest[..block.inner_end]),
            }
            rest = &rest[block.inner_end..];
        }

        output.push_str(rest);
        output
    }

    /// Highlight source code, returning just the spans (without `<pre>`/`<code>` wrappers).
    ///
    /// Returns `None` if the formatter fails.
    pub fn highlight(&self, code: &str, lang: Language) -> Option<String> {
        let formatter = HtmlLinkedBuilder::new().source(code).lang(lang).build().ok()?;

        let mut output: Vec<u8> = Vec::new();
        formatter.format(&mut output).ok()?;
        let html = String::from_utf8(output).ok()?;

        strip_code_wrapper(&html).map(str::to_string)
    }

    /// Generate CSS for the current theme.
    pub fn generate_css(&self) -> Option<String> {
        let theme = themes::get(&self.theme_name).ok()?;
        Some(theme.css(false)) // false = don't enable italic
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new("github-dark")
    }
}

/// Location of one code block inside a fragment.
struct CodeBlock {
    language: Option<String>,
    inner_start: usize,
    inner_end: usize,
}

/// Find the next highlightable block. Offsets are relative to `html`.
fn find_block(html: &str) -> Option<CodeBlock> {
    let mut search_from = 0;
    loop {
        let open = search_from + html[search_from..].find(BLOCK_OPEN)?;
        let after_pre = open + BLOCK_OPEN.len();

        if !html[after_pre..].starts_with("<code") {
            search_from = after_pre;
            continue;
        }
        let tag_end = after_pre + html[after_pre..].find('>')?;
        let inner_start = tag_end + 1;
        let inner_end = inner_start + html[inner_start..].find(CODE_CLOSE)?;

        let code_tag = &html[after_pre..inner_start];
        return Some(CodeBlock {
            language: attr_value(code_tag, "data-lang").map(html_unescape),
            inner_start,
            inner_end,
        });
    }
}

/// Read a double-quoted attribute value from a single tag.
fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

/// Take the contents of the first `<code ...>` element in formatter output.
fn strip_code_wrapper(html: &str) -> Option<&str> {
    let code_open = html.find("<code")?;
    let start = code_open + html[code_open..].find('>')? + 1;
    let end = html.rfind(CODE_CLOSE)?;
    (start <= end).then(|| &html[start..end])
}

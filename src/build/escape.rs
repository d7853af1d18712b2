//! Neutralizes braces for the host template.
//!
//! The template reads `{` and `}` as interpolation markers and any tag whose
//! name starts with an uppercase letter as a component. Braces in prose and
//! code must become entities; braces that belong to a component tag (e.g. a
//! binding expression in an attribute) must stay literal.

use crate::config::EscapeMode;

const OPEN_ENTITY: &str = "&#123;";
const CLOSE_ENTITY: &str = "&#125;";

/// Escape braces in a rendered fragment according to `mode`.
pub fn escape_template(html: &str, mode: EscapeMode) -> String {
    match mode {
        EscapeMode::Structural => escape_structural(html),
        EscapeMode::Line => escape_line_scoped(html),
    }
}

fn escape_braces(s: &str) -> String {
    s.replace('{', OPEN_ENTITY).replace('}', CLOSE_ENTITY)
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '{' => out.push_str(OPEN_ENTITY),
            '}' => out.push_str(CLOSE_ENTITY),
            c => out.push(c),
        }
    }
}

// =============================================================================
// Line-scoped mode
// =============================================================================

/// Escape every brace, then restore braces from a `<Component` opening to the
/// end of its line.
///
/// Limitation: a component tag whose attributes continue on the next line
/// keeps literal braces only on its first line.
fn escape_line_scoped(html: &str) -> String {
    let escaped = escape_braces(html);
    let mut output = String::with_capacity(escaped.len());

    for line in escaped.split_inclusive('\n') {
        match component_start(line) {
            Some(start) => {
                output.push_str(&line[..start]);
                output.push_str(
                    &line[start..]
                        .replace(OPEN_ENTITY, "{")
                        .replace(CLOSE_ENTITY, "}"),
                );
            }
            None => output.push_str(line),
        }
    }

    output
}

/// Byte offset of the first `<` immediately followed by an uppercase letter.
fn component_start(line: &str) -> Option<usize> {
    line.match_indices('<')
        .map(|(idx, _)| idx)
        .find(|&idx| line[idx + 1..].starts_with(|c: char| c.is_ascii_uppercase()))
}

// =============================================================================
// Structural mode
// =============================================================================

/// A span of markup starting at a `<`.
enum Markup {
    /// A component tag (opening or closing), kept verbatim
    Component(usize),
    /// Any other tag, comment or declaration
    Other(usize),
}

/// Split the fragment into text and markup; only component tags keep braces.
fn escape_structural(html: &str) -> String {
    let mut output = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        push_escaped(&mut output, &rest[..lt]);
        let tail = &rest[lt..];

        match scan_markup(tail) {
            Some(Markup::Component(len)) => {
                output.push_str(&tail[..len]);
                rest = &tail[len..];
            }
            Some(Markup::Other(len)) => {
                push_escaped(&mut output, &tail[..len]);
                rest = &tail[len..];
            }
            None => {
                output.push('<');
                rest = &tail[1..];
            }
        }
    }

    push_escaped(&mut output, rest);
    output
}

/// Classify the markup at the start of `tail` (which begins with `<`).
///
/// Returns `None` when the `<` does not open a tag and is plain text.
fn scan_markup(tail: &str) -> Option<Markup> {
    if let Some(comment) = tail.strip_prefix("<!--") {
        let len = comment
            .find("-->")
            .map(|end| 4 + end + 3)
            .unwrap_or(tail.len());
        return Some(Markup::Other(len));
    }

    let name_start = if tail[1..].starts_with('/') { 2 } else { 1 };
    let first = tail[name_start..].chars().next()?;

    if first == '!' || first == '?' {
        let len = tail.find('>')? + 1;
        return Some(Markup::Other(len));
    }
    if !first.is_ascii_alphabetic() {
        return None;
    }

    let len = tag_len(tail)?;
    if first.is_ascii_uppercase() {
        Some(Markup::Component(len))
    } else {
        Some(Markup::Other(len))
    }
}

/// Length of the tag at the start of `tail`, including the closing `>`.
///
/// Quotes and brace expressions are skipped, so `>` inside `"..."` or
/// `{a > b}` does not end the tag, and the tag may span several lines.
fn tag_len(tail: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (idx, c) in tail.char_indices().skip(1) {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '>' if depth == 0 => return Some(idx + 1),
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structural(html: &str) -> String {
        escape_template(html, EscapeMode::Structural)
    }

    fn line(html: &str) -> String {
        escape_template(html, EscapeMode::Line)
    }

    #[test]
    fn test_prose_braces_escaped() {
        let html = "<p>use {x} here</p>\n";
        let expected = "<p>use &#123;x&#125; here</p>\n";
        assert_eq!(structural(html), expected);
        assert_eq!(line(html), expected);
    }

    #[test]
    fn test_highlighted_code_braces_escaped() {
        let html = "<pre class=\"highlight\"><code data-lang=\"rust\"><span class=\"punctuation\">{</span></code></pre>";
        let escaped = structural(html);
        assert!(escaped.contains("<span class=\"punctuation\">&#123;</span>"));
        assert!(!escaped.contains('{'));
    }

    #[test]
    fn test_component_tag_keeps_braces() {
        let html = "<p>a {b}</p>\n<Counter start={1} label=\"{x}\" />\n";
        let expected = "<p>a &#123;b&#125;</p>\n<Counter start={1} label=\"{x}\" />\n";
        assert_eq!(structural(html), expected);
        assert_eq!(line(html), expected);
    }

    #[test]
    fn test_lowercase_tag_attributes_escaped() {
        let html = "<div title=\"{x}\">y</div>";
        assert_eq!(structural(html), "<div title=\"&#123;x&#125;\">y</div>");
    }

    #[test]
    fn test_component_expression_containing_gt() {
        let html = "<Chart filter={(d) => d.value > 10}>{label}</Chart>";
        assert_eq!(
            structural(html),
            "<Chart filter={(d) => d.value > 10}>&#123;label&#125;</Chart>"
        );
    }

    #[test]
    fn test_multiline_component_tag() {
        let html = "<Chart\n  data={points}\n  options={{ grid: true }}\n/>\n<p>{x}</p>\n";

        // Structural scanning sees the whole tag
        assert_eq!(
            structural(html),
            "<Chart\n  data={points}\n  options={{ grid: true }}\n/>\n<p>&#123;x&#125;</p>\n"
        );

        // Line scoping only restores the first line of the tag
        assert_eq!(
            line(html),
            "<Chart\n  data=&#123;points&#125;\n  options=&#123;&#123; grid: true &#125;&#125;\n/>\n<p>&#123;x&#125;</p>\n"
        );
    }

    #[test]
    fn test_line_mode_restores_rest_of_line() {
        let html = "<p>{a}</p><Foo bind={b} /> {c}\n";
        assert_eq!(line(html), "<p>&#123;a&#125;</p><Foo bind={b} /> {c}\n");
    }

    #[test]
    fn test_comments_and_doctype() {
        let html = "<!-- {note} --><!DOCTYPE html>{x}";
        assert_eq!(
            structural(html),
            "<!-- &#123;note&#125; --><!DOCTYPE html>&#123;x&#125;"
        );
    }

    #[test]
    fn test_bare_less_than_is_text() {
        assert_eq!(structural("a < {b}"), "a < &#123;b&#125;");
        assert_eq!(structural("<3 {x}"), "<3 &#123;x&#125;");
    }

    #[test]
    fn test_unterminated_tag_is_text() {
        assert_eq!(structural("<div {x}"), "<div &#123;x&#125;");
    }

    #[test]
    fn test_escaping_is_idempotent() {
        let html = "<h1 id=\"t\">Title {x}</h1>\n<p>code: <code>fn f() {}</code></p>\n<pre><code>{\n}\n</code></pre>\n";
        for mode in [EscapeMode::Structural, EscapeMode::Line] {
            let once = escape_template(html, mode);
            let twice = escape_template(&once, mode);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_existing_entities_untouched() {
        let html = "<p>&#123;already&#125; &lt;tag&gt;</p>";
        assert_eq!(structural(html), html);
        assert_eq!(line(html), html);
    }

    #[test]
    fn test_multibyte_text() {
        let html = "<p>caf\u{e9} {\u{2603}}</p><Émoji />";
        assert_eq!(
            structural(html),
            "<p>caf\u{e9} &#123;\u{2603}&#125;</p><Émoji />"
        );
    }
}

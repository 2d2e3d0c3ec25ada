//! Best-effort conversion of plain-text replies into a small HTML fragment
//!
//! This is a line-based heuristic, not a markdown parser: there are no nested
//! structures and no inline emphasis.

use std::sync::LazyLock;

use regex::Regex;

/// An opening, closing or self-closing element tag
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>").expect("valid HTML tag regex")
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-•*]|\d+\.)\s").expect("valid list marker regex"));

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][^.]*[^.]$").expect("valid title regex"));

static WIDE_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{3,}").expect("valid whitespace regex"));

/// Titles are short lines
const MAX_TITLE_CHARS: usize = 100;

/// Converts unstructured text into HTML. Content that already contains a tag is returned unchanged.
#[must_use]
pub fn format_plain_text_as_html(content: &str) -> String {
    if HTML_TAG.is_match(content) {
        return content.to_string();
    }

    let mut out: Vec<String> = Vec::new();
    let mut in_list = false;

    for line in content.split('\n') {
        let line = line.trim();

        if line.is_empty() {
            if in_list {
                out.push("</ul>".to_string());
                in_list = false;
            }
            out.push("<br>".to_string());
            continue;
        }

        if LIST_MARKER.is_match(line) {
            if !in_list {
                out.push("<ul>".to_string());
                in_list = true;
            }
            let item = LIST_MARKER.replace(line, "");
            out.push(format!("<li>{}</li>", escape_html(&item)));
            continue;
        }

        if in_list {
            out.push("</ul>".to_string());
            in_list = false;
        }

        out.push(format_line(line));
    }

    if in_list {
        out.push("</ul>".to_string());
    }

    out.join("\n")
}

fn format_line(line: &str) -> String {
    if is_title(line) {
        return format!("<h3>{}</h3>", escape_html(line));
    }

    if let Some((key, value)) = split_key_value(line) {
        return format!(
            r#"<div class="kv"><strong>{}:</strong> <span>{}</span></div>"#,
            escape_html(key),
            escape_html(value)
        );
    }

    if WIDE_GAP.is_match(line) || line.contains('\t') {
        return format!(r#"<div class="mono">{}</div>"#, escape_html(line));
    }

    format!("<p>{}</p>", escape_html(line))
}

fn is_title(line: &str) -> bool {
    TITLE.is_match(line) && line.chars().count() < MAX_TITLE_CHARS && !line.contains(':')
}

/// Lines with exactly one colon
fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    if value.contains(':') {
        return None;
    }
    Some((key.trim(), value.trim()))
}

/// Escapes the characters that could open markup or break out of an attribute
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

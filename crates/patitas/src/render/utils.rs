//! Escaping, slugs, and code-info helpers shared by the renderer.

use std::borrow::Cow;
use std::collections::BTreeSet;

/// One collected heading: the renderer's heading log entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HeadingInfo {
    pub level: u8,
    pub text: String,
    pub slug: String,
}

/// Escape text content for HTML output.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

/// Escape an attribute value for a double-quoted HTML attribute.
pub fn escape_attr(text: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(text)
}

/// Escape a link title for a `title="…"` attribute.
pub fn escape_link_title(text: &str) -> Cow<'_, str> {
    escape_attr(text)
}

/// Encode a URL for an `href`/`src` attribute: percent-encode unsafe bytes,
/// entity-escape the ampersand.
pub fn encode_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for byte in url.bytes() {
        match byte {
            b'&' => out.push_str("&amp;"),
            b'"' => out.push_str("%22"),
            b'<' => out.push_str("%3C"),
            b'>' => out.push_str("%3E"),
            b' ' => out.push_str("%20"),
            b'\\' => out.push_str("%5C"),
            0x21..=0x7E => out.push(byte as char),
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}

/// Default heading slug: lowercased, runs of non-alphanumerics collapsed to
/// single hyphens, trimmed, capped at 100 characters.
pub fn default_slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_matches('-');
    trimmed.chars().take(100).collect()
}

/// Parse a code-fence info string into `(language, highlighted lines)`.
///
/// `python {1,3-5}` → `("python", {1, 3, 4, 5})`.
pub fn parse_code_info(info: &str) -> (String, BTreeSet<usize>) {
    let info = info.trim();
    if info.is_empty() {
        return (String::new(), BTreeSet::new());
    }
    let lang = info
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();
    let hl_lines = match (info.find('{'), info.rfind('}')) {
        (Some(open), Some(close)) if open < close => parse_hl_lines(&info[open + 1..close]),
        _ => BTreeSet::new(),
    };
    (lang, hl_lines)
}

/// Parse a line-highlight spec (`1,3-5,7`) into a sorted, deduplicated set.
pub fn parse_hl_lines(spec: &str) -> BTreeSet<usize> {
    let mut lines = BTreeSet::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once('-') {
            Some((from, to)) => {
                if let (Ok(from), Ok(to)) = (from.trim().parse::<usize>(), to.trim().parse::<usize>()) {
                    if from <= to {
                        lines.extend(from..=to);
                    }
                }
            }
            None => {
                if let Ok(line) = part.parse() {
                    lines.insert(line);
                }
            }
        }
    }
    lines
}

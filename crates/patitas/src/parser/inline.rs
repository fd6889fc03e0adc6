//! Inline parser.
//!
//! Single forward pass with a delimiter stack: code spans, roles, math, and
//! autolinks resolve immediately (raw zones first, so `` `[[x]]` `` never
//! becomes a link); emphasis and strong resolve afterwards over the
//! collected delimiter runs using the left/right-flanking rules. Brackets
//! resolve when their `]` arrives, consulting the link reference definitions
//! gathered during block parsing.
//!
//! Like the rest of the parser this code never fails: any construct that
//! does not close becomes literal text.

use std::collections::HashMap;

use crate::ast::{
    CodeSpan, Emphasis, FootnoteRef, HtmlInline, Image, Inline, Link, Math, Role, Strikethrough,
    Strong, Text,
};
use crate::config::ParseConfig;

/// A collected link reference definition: label → (destination, title).
pub type RefDefs = HashMap<String, (String, Option<String>)>;

/// Normalize a reference label: case-fold and collapse internal whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug)]
enum Atom {
    Resolved(Inline),
    Text(String),
    Delim {
        ch: char,
        count: usize,
        can_open: bool,
        can_close: bool,
    },
    OpenBracket {
        image: bool,
        /// Byte offset of the content following the bracket, for raw label
        /// extraction in reference links.
        content_start: usize,
        active: bool,
    },
}

pub struct InlineParser<'a> {
    config: &'a ParseConfig,
    refdefs: &'a RefDefs,
}

impl<'a> InlineParser<'a> {
    pub fn new(config: &'a ParseConfig, refdefs: &'a RefDefs) -> Self {
        Self { config, refdefs }
    }

    /// Parse one run of inline content (a paragraph, heading, or table cell).
    pub fn parse(&self, text: &str) -> Vec<Inline> {
        let atoms = self.scan(text);
        finish_atoms(atoms)
    }

    fn scan(&self, text: &str) -> Vec<Atom> {
        let bytes = text.as_bytes();
        let mut atoms: Vec<Atom> = Vec::new();
        let mut plain = String::new();
        let mut i = 0usize;

        macro_rules! flush {
            () => {
                if !plain.is_empty() {
                    atoms.push(Atom::Text(std::mem::take(&mut plain)));
                }
            };
        }

        while i < bytes.len() {
            let b = bytes[i];
            match b {
                b'\\' => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        flush!();
                        atoms.push(Atom::Resolved(Inline::LineBreak));
                        i += 2;
                    } else if i + 1 < bytes.len() && bytes[i + 1].is_ascii_punctuation() {
                        plain.push(bytes[i + 1] as char);
                        i += 2;
                    } else {
                        plain.push('\\');
                        i += 1;
                    }
                }
                b'\n' => {
                    // Two or more trailing spaces make a hard break.
                    let hard = plain.ends_with("  ");
                    while plain.ends_with(' ') {
                        plain.pop();
                    }
                    flush!();
                    atoms.push(Atom::Resolved(if hard {
                        Inline::LineBreak
                    } else {
                        Inline::SoftBreak
                    }));
                    i += 1;
                    // Leading spaces on the next line are not content.
                    while i < bytes.len() && bytes[i] == b' ' {
                        i += 1;
                    }
                }
                b'`' => {
                    let run = count_byte(bytes, i, b'`');
                    match find_code_close(bytes, i + run, run) {
                        Some(close) => {
                            flush!();
                            let raw = &text[i + run..close];
                            atoms.push(Atom::Resolved(Inline::CodeSpan(CodeSpan {
                                code: normalize_code_span(raw),
                            })));
                            i = close + run;
                        }
                        None => {
                            plain.push_str(&text[i..i + run]);
                            i += run;
                        }
                    }
                }
                b'*' | b'_' => {
                    let ch = b as char;
                    let run = count_byte(bytes, i, b);
                    let (can_open, can_close) = flanking(text, i, i + run, ch);
                    flush!();
                    atoms.push(Atom::Delim {
                        ch,
                        count: run,
                        can_open,
                        can_close,
                    });
                    i += run;
                }
                b'~' if self.config.strikethrough => {
                    let run = count_byte(bytes, i, b'~');
                    if run == 2 {
                        let (can_open, can_close) = flanking(text, i, i + run, '~');
                        flush!();
                        atoms.push(Atom::Delim {
                            ch: '~',
                            count: 2,
                            can_open,
                            can_close,
                        });
                    } else {
                        plain.push_str(&text[i..i + run]);
                    }
                    i += run;
                }
                b'$' if self.config.math => match scan_inline_math(text, i) {
                    Some((content, end)) => {
                        flush!();
                        atoms.push(Atom::Resolved(Inline::Math(Math { content })));
                        i = end;
                    }
                    None => {
                        plain.push('$');
                        i += 1;
                    }
                },
                b'!' if i + 1 < bytes.len() && bytes[i + 1] == b'[' => {
                    flush!();
                    atoms.push(Atom::OpenBracket {
                        image: true,
                        content_start: i + 2,
                        active: true,
                    });
                    i += 2;
                }
                b'[' => {
                    if self.config.footnotes {
                        if let Some((identifier, end)) = scan_footnote_ref(text, i) {
                            flush!();
                            atoms.push(Atom::Resolved(Inline::FootnoteRef(FootnoteRef {
                                identifier,
                            })));
                            i = end;
                            continue;
                        }
                    }
                    flush!();
                    atoms.push(Atom::OpenBracket {
                        image: false,
                        content_start: i + 1,
                        active: true,
                    });
                    i += 1;
                }
                b']' => {
                    flush!();
                    i = self.close_bracket(text, i, &mut atoms);
                }
                b'<' => {
                    if let Some((node, end)) = scan_angle_construct(text, i) {
                        flush!();
                        atoms.push(Atom::Resolved(node));
                        i = end;
                    } else {
                        plain.push('<');
                        i += 1;
                    }
                }
                b'{' => {
                    if let Some((role, end)) = scan_role(text, i) {
                        flush!();
                        atoms.push(Atom::Resolved(Inline::Role(role)));
                        i = end;
                    } else {
                        plain.push('{');
                        i += 1;
                    }
                }
                b'&' => {
                    if let Some((decoded, end)) = decode_entity(text, i) {
                        plain.push_str(&decoded);
                        i = end;
                    } else {
                        plain.push('&');
                        i += 1;
                    }
                }
                b'h' | b'w' if self.config.autolinks => {
                    match scan_bare_url(text, i, &plain) {
                        Some((url, end)) => {
                            flush!();
                            atoms.push(Atom::Resolved(Inline::Link(Link {
                                url: url.clone(),
                                title: None,
                                children: vec![Inline::Text(Text { content: url })],
                            })));
                            i = end;
                        }
                        None => {
                            plain.push(b as char);
                            i += 1;
                        }
                    }
                }
                _ => {
                    let ch = text[i..].chars().next().unwrap_or('\u{FFFD}');
                    plain.push(ch);
                    i += ch.len_utf8();
                }
            }
        }

        if !plain.is_empty() {
            atoms.push(Atom::Text(plain));
        }
        atoms
    }

    /// Resolve a `]`: inline link, reference link, or literal bracket.
    /// Returns the position to continue scanning from.
    fn close_bracket(&self, text: &str, close: usize, atoms: &mut Vec<Atom>) -> usize {
        let opener = atoms.iter().rposition(|atom| {
            matches!(
                atom,
                Atom::OpenBracket { active: true, .. }
            )
        });
        let Some(opener_idx) = opener else {
            atoms.push(Atom::Text("]".to_string()));
            return close + 1;
        };
        let (image, content_start) = match atoms[opener_idx] {
            Atom::OpenBracket {
                image,
                content_start,
                ..
            } => (image, content_start),
            _ => unreachable!(),
        };

        let after = &text[close + 1..];
        let (url, title, consumed) = if let Some((url, title, used)) = parse_inline_suffix(after) {
            (url, title, close + 1 + used)
        } else if let Some((label, used)) = parse_reference_suffix(after) {
            // [text][label] with an explicit, possibly empty, label.
            let label = if label.is_empty() {
                &text[content_start..close]
            } else {
                label
            };
            match self.refdefs.get(&normalize_label(label)) {
                Some((url, title)) => (url.clone(), title.clone(), close + 1 + used),
                None => {
                    demote_bracket(atoms, opener_idx, image);
                    atoms.push(Atom::Text("]".to_string()));
                    return close + 1;
                }
            }
        } else {
            // Shortcut reference: [label]
            let label = &text[content_start..close];
            match self.refdefs.get(&normalize_label(label)) {
                Some((url, title)) => (url.clone(), title.clone(), close + 1),
                None => {
                    demote_bracket(atoms, opener_idx, image);
                    atoms.push(Atom::Text("]".to_string()));
                    return close + 1;
                }
            }
        };

        let inner: Vec<Atom> = atoms.drain(opener_idx + 1..).collect();
        atoms.pop(); // the opener itself
        let children = finish_atoms(inner);

        if image {
            let alt = plain_text_of(&children);
            atoms.push(Atom::Resolved(Inline::Image(Image {
                url,
                title,
                alt,
            })));
        } else {
            // Links cannot nest: deactivate every earlier link opener.
            for atom in atoms.iter_mut() {
                if let Atom::OpenBracket {
                    image: false,
                    active,
                    ..
                } = atom
                {
                    *active = false;
                }
            }
            atoms.push(Atom::Resolved(Inline::Link(Link {
                url,
                title,
                children,
            })));
        }
        consumed
    }
}

/// Replace a failed opener with its literal text.
fn demote_bracket(atoms: &mut Vec<Atom>, opener_idx: usize, image: bool) {
    atoms[opener_idx] = Atom::Text(if image { "![" } else { "[" }.to_string());
}

/// Parse `(dest "title")` after a `]`. Returns (url, title, bytes consumed).
fn parse_inline_suffix(after: &str) -> Option<(String, Option<String>, usize)> {
    let bytes = after.as_bytes();
    if bytes.first() != Some(&b'(') {
        return None;
    }
    let mut i = 1usize;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\n') {
        i += 1;
    }

    // Destination: <...> or bare with balanced parens.
    let dest_start = i;
    let dest: String;
    if i < bytes.len() && bytes[i] == b'<' {
        let close = after[i + 1..].find(['>', '\n'])?;
        if after.as_bytes()[i + 1 + close] != b'>' {
            return None;
        }
        dest = unescape(&after[i + 1..i + 1 + close]);
        i = i + 1 + close + 1;
    } else {
        let mut depth = 0i32;
        while i < bytes.len() {
            match bytes[i] {
                b' ' | b'\n' => break,
                b'(' => {
                    depth += 1;
                    i += 1;
                }
                b')' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    i += 1;
                }
                b'\\' if i + 1 < bytes.len() => i += 2,
                _ => i += 1,
            }
        }
        if depth != 0 {
            return None;
        }
        dest = unescape(&after[dest_start..i]);
    }

    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\n') {
        i += 1;
    }

    // Optional title.
    let mut title = None;
    if i < bytes.len() && matches!(bytes[i], b'"' | b'\'' | b'(') {
        let open = bytes[i];
        let close_ch = if open == b'(' { b')' } else { open };
        let mut j = i + 1;
        while j < bytes.len() && bytes[j] != close_ch {
            if bytes[j] == b'\\' {
                j += 1;
            }
            j += 1;
        }
        if j >= bytes.len() {
            return None;
        }
        title = Some(unescape(&after[i + 1..j]));
        i = j + 1;
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\n') {
            i += 1;
        }
    }

    if i < bytes.len() && bytes[i] == b')' {
        Some((dest, title, i + 1))
    } else {
        None
    }
}

/// Parse `[label]` after a `]`. Returns (label, bytes consumed). An empty
/// label (`[]`) means "use the bracketed text".
fn parse_reference_suffix(after: &str) -> Option<(&str, usize)> {
    let rest = after.strip_prefix('[')?;
    let close = rest.find([']', '[', '\n'])?;
    if rest.as_bytes()[close] != b']' {
        return None;
    }
    Some((&rest[..close], close + 2))
}

/// Backslash-unescape punctuation and decode entities.
fn unescape(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() && bytes[i + 1].is_ascii_punctuation() => {
                out.push(bytes[i + 1] as char);
                i += 2;
            }
            b'&' => match decode_entity(raw, i) {
                Some((decoded, end)) => {
                    out.push_str(&decoded);
                    i = end;
                }
                None => {
                    out.push('&');
                    i += 1;
                }
            },
            _ => {
                let ch = raw[i..].chars().next().unwrap_or('\u{FFFD}');
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    out
}

fn count_byte(bytes: &[u8], from: usize, b: u8) -> usize {
    bytes[from..].iter().take_while(|&&x| x == b).count()
}

/// Find the closing backtick run of exactly `run` length.
fn find_code_close(bytes: &[u8], from: usize, run: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let len = count_byte(bytes, i, b'`');
            if len == run {
                return Some(i);
            }
            i += len;
        } else {
            i += 1;
        }
    }
    None
}

/// CommonMark code-span normalization: newlines become spaces; one leading
/// and trailing space is stripped when both are present and the content is
/// not all spaces.
fn normalize_code_span(raw: &str) -> String {
    let content = raw.replace('\n', " ");
    let stripped = content
        .strip_prefix(' ')
        .and_then(|s| s.strip_suffix(' '))
        .filter(|s| s.chars().any(|c| c != ' '));
    match stripped {
        Some(inner) => inner.to_string(),
        None => content,
    }
}

fn is_unicode_whitespace(ch: Option<char>) -> bool {
    match ch {
        None => true,
        Some(c) => c.is_whitespace(),
    }
}

fn is_punctuation(ch: Option<char>) -> bool {
    match ch {
        None => false,
        Some(c) => c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace()),
    }
}

/// Left/right flanking per CommonMark 6.2, with the underscore intraword
/// restriction.
fn flanking(text: &str, start: usize, end: usize, ch: char) -> (bool, bool) {
    let prev = text[..start].chars().next_back();
    let next = text[end..].chars().next();

    let next_ws = is_unicode_whitespace(next);
    let prev_ws = is_unicode_whitespace(prev);
    let next_punct = is_punctuation(next);
    let prev_punct = is_punctuation(prev);

    let left = !next_ws && (!next_punct || prev_ws || prev_punct);
    let right = !prev_ws && (!prev_punct || next_ws || next_punct);

    match ch {
        '_' => (
            left && (!right || prev_punct),
            right && (!left || next_punct),
        ),
        _ => (left, right),
    }
}

/// `$content$` with no surrounding-space ambiguity: the opener must not be
/// followed by whitespace, the closer must not be preceded by it, and `$$`
/// is a block marker, not inline math.
fn scan_inline_math(text: &str, start: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(start + 1) == Some(&b'$') {
        return None;
    }
    let inner_start = start + 1;
    let first = text[inner_start..].chars().next()?;
    if first.is_whitespace() {
        return None;
    }
    let close_rel = text[inner_start..].find('$')?;
    let close = inner_start + close_rel;
    let content = &text[inner_start..close];
    if content.is_empty() || content.ends_with(char::is_whitespace) || content.contains('\n') {
        return None;
    }
    Some((content.to_string(), close + 1))
}

/// `[^identifier]`.
fn scan_footnote_ref(text: &str, start: usize) -> Option<(String, usize)> {
    let rest = text.get(start + 1..)?;
    let rest = rest.strip_prefix('^')?;
    let close = rest.find([']', '[', ' ', '\n'])?;
    if rest.as_bytes()[close] != b']' || close == 0 {
        return None;
    }
    Some((rest[..close].to_string(), start + 2 + close + 1))
}

/// Autolinks and raw inline HTML, both `<`-introduced.
fn scan_angle_construct(text: &str, start: usize) -> Option<(Inline, usize)> {
    let rest = &text[start..];
    let close = rest.find('>')?;
    let inner = &rest[1..close];

    if inner.is_empty() || inner.contains(char::is_whitespace) {
        return scan_inline_html(text, start);
    }

    // URI autolink: scheme ':' ...
    if let Some(colon) = inner.find(':') {
        let scheme = &inner[..colon];
        let scheme_ok = scheme.len() >= 2
            && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
        if scheme_ok && !inner.contains('<') {
            return Some((
                Inline::Link(Link {
                    url: inner.to_string(),
                    title: None,
                    children: vec![Inline::Text(Text {
                        content: inner.to_string(),
                    })],
                }),
                start + close + 1,
            ));
        }
    }

    // Email autolink.
    if inner.contains('@') && !inner.contains('<') {
        let (local, domain) = inner.split_once('@')?;
        let domain_ok = !domain.is_empty()
            && domain
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'));
        if !local.is_empty() && domain_ok && domain.contains('.') {
            return Some((
                Inline::Link(Link {
                    url: format!("mailto:{inner}"),
                    title: None,
                    children: vec![Inline::Text(Text {
                        content: inner.to_string(),
                    })],
                }),
                start + close + 1,
            ));
        }
    }

    scan_inline_html(text, start)
}

/// Raw inline HTML: open/close tags, comments, processing instructions,
/// declarations.
fn scan_inline_html(text: &str, start: usize) -> Option<(Inline, usize)> {
    let rest = &text[start..];

    if let Some(comment_body) = rest.strip_prefix("<!--") {
        let end = comment_body.find("-->")?;
        let html = &rest[..4 + end + 3];
        return Some((
            Inline::HtmlInline(HtmlInline {
                html: html.to_string(),
            }),
            start + html.len(),
        ));
    }
    if rest.starts_with("<?") {
        let end = rest.find("?>")?;
        let html = &rest[..end + 2];
        return Some((
            Inline::HtmlInline(HtmlInline {
                html: html.to_string(),
            }),
            start + html.len(),
        ));
    }
    if rest.starts_with("<!") {
        let end = rest.find('>')?;
        let html = &rest[..end + 1];
        return Some((
            Inline::HtmlInline(HtmlInline {
                html: html.to_string(),
            }),
            start + html.len(),
        ));
    }

    // Open or close tag: </?name attrs* /?>
    let bytes = rest.as_bytes();
    let mut i = 1usize;
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    let name_len = rest[i..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .count();
    if name_len == 0 || !rest[i..].chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = rest.find('>')?;
    if rest[..end].contains('\n') && rest[..end].contains("\n\n") {
        return None;
    }
    let html = &rest[..end + 1];
    Some((
        Inline::HtmlInline(HtmlInline {
            html: html.to_string(),
        }),
        start + html.len(),
    ))
}

/// `` {name}`content` `` inline role.
fn scan_role(text: &str, start: usize) -> Option<(Role, usize)> {
    let rest = &text[start + 1..];
    let close = rest.find('}')?;
    let name = &rest[..close];
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    let after = &rest[close + 1..];
    if !after.starts_with('`') {
        return None;
    }
    let bytes = after.as_bytes();
    let run = count_byte(bytes, 0, b'`');
    let body_close = find_code_close(bytes, run, run)?;
    let content = &after[run..body_close];
    Some((
        Role {
            name: name.to_string(),
            content: content.to_string(),
            target: None,
        },
        start + 1 + close + 1 + body_close + run,
    ))
}

/// Bare `http://`, `https://`, and `www.` autolinks (GFM-style).
fn scan_bare_url(text: &str, start: usize, pending: &str) -> Option<(String, usize)> {
    let boundary_ok = match pending.chars().next_back() {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '(' | '[' | ':' | ','),
    };
    if !boundary_ok {
        return None;
    }

    let rest = &text[start..];
    let is_www = rest.starts_with("www.");
    if !rest.starts_with("http://") && !rest.starts_with("https://") && !is_www {
        return None;
    }

    let end_rel = rest
        .find(|c: char| c.is_whitespace() || c == '<')
        .unwrap_or(rest.len());
    let mut candidate = &rest[..end_rel];
    // Trim trailing punctuation that reads as prose, not URL.
    while candidate.ends_with(['.', ',', ';', ':', '!', '?', ')', '\'', '"']) {
        candidate = &candidate[..candidate.len() - 1];
    }
    let minimum = if is_www { 5 } else { 9 };
    if candidate.len() < minimum {
        return None;
    }
    Some((candidate.to_string(), start + candidate.len()))
}

/// Decode `&name;`, `&#ddd;`, `&#xhh;` at `start`. Returns the decoded text
/// and the index past the `;`.
pub fn decode_entity(text: &str, start: usize) -> Option<(String, usize)> {
    let rest = &text[start + 1..];
    let semi = rest.find(';').filter(|&idx| idx > 0 && idx <= 32)?;
    let body = &rest[..semi];
    let end = start + 1 + semi + 1;

    if let Some(num) = body.strip_prefix('#') {
        let value = if let Some(hex) = num.strip_prefix(['x', 'X']) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        let ch = char::from_u32(value).unwrap_or('\u{FFFD}');
        let ch = if ch == '\0' { '\u{FFFD}' } else { ch };
        return Some((ch.to_string(), end));
    }

    let decoded = match body {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "hellip" => "\u{2026}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "sect" => "\u{a7}",
        "para" => "\u{b6}",
        "middot" => "\u{b7}",
        "frac12" => "\u{bd}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        _ => return None,
    };
    Some((decoded.to_string(), end))
}

/// Extract the plain text of inline nodes (image alt text).
pub fn plain_text_of(nodes: &[Inline]) -> String {
    let mut out = String::new();
    collect_plain_text(nodes, &mut out);
    out
}

fn collect_plain_text(nodes: &[Inline], out: &mut String) {
    for node in nodes {
        match node {
            Inline::Text(t) => out.push_str(&t.content),
            Inline::CodeSpan(c) => out.push_str(&c.code),
            Inline::Math(m) => out.push_str(&m.content),
            Inline::Emphasis(n) => collect_plain_text(&n.children, out),
            Inline::Strong(n) => collect_plain_text(&n.children, out),
            Inline::Strikethrough(n) => collect_plain_text(&n.children, out),
            Inline::Link(n) => collect_plain_text(&n.children, out),
            Inline::Image(n) => out.push_str(&n.alt),
            Inline::LineBreak | Inline::SoftBreak => out.push(' '),
            Inline::Role(r) => out.push_str(&r.content),
            Inline::FootnoteRef(_) | Inline::HtmlInline(_) => {}
        }
    }
}

/// Run the delimiter algorithm, then flatten what is left into inline nodes.
fn finish_atoms(mut atoms: Vec<Atom>) -> Vec<Inline> {
    process_emphasis(&mut atoms);

    let mut out: Vec<Inline> = Vec::new();
    let mut push_text = |out: &mut Vec<Inline>, s: &str| {
        if s.is_empty() {
            return;
        }
        if let Some(Inline::Text(last)) = out.last_mut() {
            last.content.push_str(s);
        } else {
            out.push(Inline::Text(Text {
                content: s.to_string(),
            }));
        }
    };

    for atom in atoms {
        match atom {
            Atom::Resolved(node) => out.push(node),
            Atom::Text(s) => push_text(&mut out, &s),
            Atom::Delim { ch, count, .. } => {
                push_text(&mut out, &ch.to_string().repeat(count));
            }
            Atom::OpenBracket { image, .. } => {
                push_text(&mut out, if image { "![" } else { "[" });
            }
        }
    }
    out
}

/// The CommonMark delimiter-run match: walk closers left to right, pair each
/// with the nearest compatible opener, and collapse the span between into an
/// Emphasis/Strong/Strikethrough node.
fn process_emphasis(atoms: &mut Vec<Atom>) {
    let mut closer = 0usize;
    while closer < atoms.len() {
        let (ch, closer_count, can_close, closer_can_open) = match &atoms[closer] {
            Atom::Delim {
                ch,
                count,
                can_close,
                can_open,
            } => (*ch, *count, *can_close, *can_open),
            _ => {
                closer += 1;
                continue;
            }
        };
        if !can_close || closer_count == 0 {
            closer += 1;
            continue;
        }

        // Find the nearest opener below.
        let mut opener: Option<usize> = None;
        for idx in (0..closer).rev() {
            if let Atom::Delim {
                ch: och,
                count: ocount,
                can_open: oopen,
                can_close: oclose,
            } = &atoms[idx]
            {
                if *och == ch && *oopen && *ocount > 0 {
                    // Rule of three: runs that can both open and close must
                    // not pair when their combined length is a multiple of 3
                    // (unless both are).
                    let odd_match = (closer_can_open || *oclose)
                        && (closer_count + ocount) % 3 == 0
                        && !(closer_count % 3 == 0 && ocount % 3 == 0);
                    if !odd_match {
                        opener = Some(idx);
                        break;
                    }
                }
            }
        }

        let Some(opener_idx) = opener else {
            closer += 1;
            continue;
        };

        let use_count = if ch == '~' {
            2
        } else if closer_count >= 2 && delim_count(&atoms[opener_idx]) >= 2 {
            2
        } else {
            1
        };

        // Collapse the content between opener and closer.
        let inner: Vec<Atom> = atoms.drain(opener_idx + 1..closer).collect();
        let children = finish_atoms(inner);
        let node = match (ch, use_count) {
            ('~', _) => Inline::Strikethrough(Strikethrough { children }),
            (_, 2) => Inline::Strong(Strong { children }),
            _ => Inline::Emphasis(Emphasis { children }),
        };

        // Shrink the two delimiter runs and insert the node between them.
        let mut remove_opener = false;
        if let Atom::Delim { count, .. } = &mut atoms[opener_idx] {
            *count -= use_count;
            remove_opener = *count == 0;
        }
        let closer_idx = opener_idx + 1;
        atoms.insert(closer_idx, Atom::Resolved(node));
        let mut remove_closer = false;
        if let Atom::Delim { count, .. } = &mut atoms[closer_idx + 1] {
            *count -= use_count;
            remove_closer = *count == 0;
        }
        if remove_closer {
            atoms.remove(closer_idx + 1);
        }
        if remove_opener {
            atoms.remove(opener_idx);
        }

        // Re-scan from the node position; remaining closer counts may pair
        // with earlier openers.
        closer = if remove_opener { opener_idx } else { opener_idx + 1 };
    }
}

fn delim_count(atom: &Atom) -> usize {
    match atom {
        Atom::Delim { count, .. } => *count,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Vec<Inline> {
        let config = ParseConfig::all_extensions();
        let refdefs = RefDefs::new();
        InlineParser::new(&config, &refdefs).parse(text)
    }

    fn parse_with_refs(text: &str, refs: &[(&str, &str)]) -> Vec<Inline> {
        let config = ParseConfig::all_extensions();
        let refdefs: RefDefs = refs
            .iter()
            .map(|(label, url)| (normalize_label(label), (url.to_string(), None)))
            .collect();
        InlineParser::new(&config, &refdefs).parse(text)
    }

    fn text(content: &str) -> Inline {
        Inline::Text(Text {
            content: content.to_string(),
        })
    }

    #[test]
    fn plain_text_is_one_node() {
        assert_eq!(parse("hello world"), vec![text("hello world")]);
    }

    #[test]
    fn emphasis_and_strong() {
        assert_eq!(
            parse("*em* and **strong**"),
            vec![
                Inline::Emphasis(Emphasis {
                    children: vec![text("em")]
                }),
                text(" and "),
                Inline::Strong(Strong {
                    children: vec![text("strong")]
                }),
            ]
        );
    }

    #[test]
    fn nested_emphasis_inside_strong() {
        let nodes = parse("**bold *and em* bold**");
        assert_eq!(
            nodes,
            vec![Inline::Strong(Strong {
                children: vec![
                    text("bold "),
                    Inline::Emphasis(Emphasis {
                        children: vec![text("and em")]
                    }),
                    text(" bold"),
                ]
            })]
        );
    }

    #[test]
    fn intraword_underscore_stays_literal() {
        assert_eq!(parse("snake_case_name"), vec![text("snake_case_name")]);
    }

    #[test]
    fn intraword_star_still_works() {
        assert_eq!(
            parse("fan*tas*tic"),
            vec![
                text("fan"),
                Inline::Emphasis(Emphasis {
                    children: vec![text("tas")]
                }),
                text("tic"),
            ]
        );
    }

    #[test]
    fn unmatched_delimiters_are_literal() {
        assert_eq!(parse("a * lone star"), vec![text("a * lone star")]);
    }

    #[test]
    fn code_span_is_raw() {
        assert_eq!(
            parse("`*not em*`"),
            vec![Inline::CodeSpan(CodeSpan {
                code: "*not em*".to_string()
            })]
        );
    }

    #[test]
    fn double_backtick_code_span_may_contain_backtick() {
        assert_eq!(
            parse("`` ` ``"),
            vec![Inline::CodeSpan(CodeSpan {
                code: "`".to_string()
            })]
        );
    }

    #[test]
    fn unclosed_code_span_is_literal() {
        assert_eq!(parse("`oops"), vec![text("`oops")]);
    }

    #[test]
    fn inline_link() {
        assert_eq!(
            parse("[docs](https://example.com \"Docs\")"),
            vec![Inline::Link(Link {
                url: "https://example.com".to_string(),
                title: Some("Docs".to_string()),
                children: vec![text("docs")],
            })]
        );
    }

    #[test]
    fn reference_link_resolves() {
        let nodes = parse_with_refs("[docs][site]", &[("site", "https://example.com")]);
        assert_eq!(
            nodes,
            vec![Inline::Link(Link {
                url: "https://example.com".to_string(),
                title: None,
                children: vec![text("docs")],
            })]
        );
    }

    #[test]
    fn shortcut_reference_link() {
        let nodes = parse_with_refs("[site]", &[("Site", "https://example.com")]);
        assert!(matches!(nodes[0], Inline::Link(_)));
    }

    #[test]
    fn unknown_reference_stays_literal() {
        assert_eq!(parse("[nope][missing]"), vec![text("[nope][missing]")]);
    }

    #[test]
    fn image_collects_alt_text() {
        assert_eq!(
            parse("![a *b* c](/img.png)"),
            vec![Inline::Image(Image {
                url: "/img.png".to_string(),
                title: None,
                alt: "a b c".to_string(),
            })]
        );
    }

    #[test]
    fn links_do_not_nest() {
        let nodes = parse("[outer [inner](https://inner.example)](https://outer.example)");
        // Inner resolves; the outer bracket pair cannot form a link around it.
        assert!(nodes.iter().any(|n| matches!(n, Inline::Link(l) if l.url == "https://inner.example")));
        assert!(!nodes.iter().any(|n| matches!(n, Inline::Link(l) if l.url == "https://outer.example")));
    }

    #[test]
    fn uri_autolink() {
        assert_eq!(
            parse("<https://example.com/a>"),
            vec![Inline::Link(Link {
                url: "https://example.com/a".to_string(),
                title: None,
                children: vec![text("https://example.com/a")],
            })]
        );
    }

    #[test]
    fn email_autolink() {
        let nodes = parse("<user@example.com>");
        assert_eq!(
            nodes,
            vec![Inline::Link(Link {
                url: "mailto:user@example.com".to_string(),
                title: None,
                children: vec![text("user@example.com")],
            })]
        );
    }

    #[test]
    fn bare_url_autolink() {
        let nodes = parse("see https://example.com/x.");
        assert_eq!(
            nodes,
            vec![
                text("see "),
                Inline::Link(Link {
                    url: "https://example.com/x".to_string(),
                    title: None,
                    children: vec![text("https://example.com/x")],
                }),
                text("."),
            ]
        );
    }

    #[test]
    fn inline_html_passes_through() {
        let nodes = parse("a <span class=\"x\">b</span>");
        assert_eq!(
            nodes,
            vec![
                text("a "),
                Inline::HtmlInline(HtmlInline {
                    html: "<span class=\"x\">".to_string()
                }),
                text("b"),
                Inline::HtmlInline(HtmlInline {
                    html: "</span>".to_string()
                }),
            ]
        );
    }

    #[test]
    fn bare_less_than_is_text() {
        assert_eq!(parse("1 < 2"), vec![text("1 < 2")]);
    }

    #[test]
    fn strikethrough_pairs() {
        assert_eq!(
            parse("~~gone~~"),
            vec![Inline::Strikethrough(Strikethrough {
                children: vec![text("gone")]
            })]
        );
    }

    #[test]
    fn single_tilde_is_literal() {
        assert_eq!(parse("a ~ b"), vec![text("a ~ b")]);
    }

    #[test]
    fn inline_math() {
        assert_eq!(
            parse("Euler: $e^{i\\pi}=-1$"),
            vec![
                text("Euler: "),
                Inline::Math(Math {
                    content: "e^{i\\pi}=-1".to_string()
                }),
            ]
        );
    }

    #[test]
    fn dollar_amounts_are_not_math() {
        assert_eq!(parse("$5 and $10"), vec![text("$5 and $10")]);
    }

    #[test]
    fn footnote_ref() {
        assert_eq!(
            parse("fact[^1]"),
            vec![
                text("fact"),
                Inline::FootnoteRef(FootnoteRef {
                    identifier: "1".to_string()
                }),
            ]
        );
    }

    #[test]
    fn role_with_content() {
        assert_eq!(
            parse("Press {kbd}`Ctrl+C` to copy."),
            vec![
                text("Press "),
                Inline::Role(Role {
                    name: "kbd".to_string(),
                    content: "Ctrl+C".to_string(),
                    target: None,
                }),
                text(" to copy."),
            ]
        );
    }

    #[test]
    fn role_with_hyphen_name() {
        let nodes = parse("{my-role}`content`");
        assert_eq!(
            nodes,
            vec![Inline::Role(Role {
                name: "my-role".to_string(),
                content: "content".to_string(),
                target: None,
            })]
        );
    }

    #[test]
    fn brace_without_backtick_is_text() {
        assert_eq!(
            parse("This {notarole} is plain."),
            vec![text("This {notarole} is plain.")]
        );
    }

    #[test]
    fn hard_break_from_trailing_spaces() {
        assert_eq!(
            parse("one  \ntwo"),
            vec![text("one"), Inline::LineBreak, text("two")]
        );
    }

    #[test]
    fn soft_break_from_newline() {
        assert_eq!(
            parse("one\ntwo"),
            vec![text("one"), Inline::SoftBreak, text("two")]
        );
    }

    #[test]
    fn backslash_escape_disarms_emphasis() {
        assert_eq!(parse("\\*literal\\*"), vec![text("*literal*")]);
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(parse("fish &amp; chips&#33;"), vec![text("fish & chips!")]);
    }

    #[test]
    fn unknown_entity_is_literal() {
        assert_eq!(parse("&bogus;"), vec![text("&bogus;")]);
    }

    #[test]
    fn label_normalization() {
        assert_eq!(normalize_label("  Foo \t BAR "), "foo bar");
    }
}

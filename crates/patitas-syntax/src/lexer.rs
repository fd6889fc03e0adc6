//! Line lexer.
//!
//! A single forward pass over the source buffer, one [`Token`] per physical
//! line. The lexer never backtracks past the current line and never fails:
//! anything it cannot classify comes out as [`TokenKind::Text`].
//!
//! Three line modes are tracked here because they suppress classification:
//!
//! - **Fenced code** — once a fence opens, every line is a [`TokenKind::CodeLine`]
//!   until a matching close fence (same character, run length `>=` the opener,
//!   indented at most 3 columns). Blockquote markers are stripped only up to
//!   the depth the fence opened at, so `>` inside a top-level fence is content.
//! - **HTML blocks** — CommonMark types 1–7. Types 1–5 end on their closing
//!   marker (which may sit on the opening line); types 6–7 end before a blank
//!   line.
//! - **Normal** — the remainder is classified after blockquote markers are
//!   stripped and the optional text transformer has run.
//!
//! Zero-copy handoff: for a fence opened at quote depth 0 and indent 0 the
//! body bytes are contiguous in the source, and the parser recovers them from
//! the token spans alone. The lexer itself copies nothing; `Cow::Owned` text
//! only appears when the transformer rewrites a line.
//!
//! The transformer runs at line-classification time, which is what makes
//! "elevation" work: a substitution that produces `# Title` is lexed as a
//! heading. Output containing a newline is demoted to a plain text line;
//! multi-line elevation is out of scope and must degrade safely.

use std::borrow::Cow;
use std::sync::Arc;

use crate::source::{SourceLocation, SourceSpan};
use crate::tokens::{ListMarkerKind, Token, TokenKind};

/// Callback applied to classifiable lines before classification.
pub type TextTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// HTML block tag names for type-6 blocks (CommonMark 4.6).
const HTML_BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "search", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

#[derive(Debug, Clone, Copy)]
struct FenceState {
    ch: char,
    len: usize,
    quote_depth: u8,
    indent: usize,
}

#[derive(Debug, Clone, Copy)]
struct HtmlState {
    kind: u8,
    quote_depth: u8,
}

/// Single-use line lexer over a borrowed source buffer.
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    line_no: u32,
    fence: Option<FenceState>,
    html: Option<HtmlState>,
    transform: Option<TextTransform>,
    eof_emitted: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line_no: 0,
            fence: None,
            html: None,
            transform: None,
            eof_emitted: false,
        }
    }

    pub fn with_transform(source: &'src str, transform: Option<TextTransform>) -> Self {
        let mut lexer = Self::new(source);
        lexer.transform = transform;
        lexer
    }

    /// Current byte offset into the source.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Lex the next line. After the final line an [`TokenKind::Eof`] token is
    /// returned (and again on every subsequent call).
    pub fn next_token(&mut self) -> Token<'src> {
        if self.pos >= self.source.len() {
            self.eof_emitted = true;
            return Token {
                kind: TokenKind::Eof,
                span: SourceSpan::new(self.pos, self.pos),
                location: SourceLocation::new(self.line_no + 1, 1),
                quote_depth: 0,
                indent: 0,
                text: Cow::Borrowed(""),
            };
        }

        self.line_no += 1;
        let line_start = self.pos;
        let rest = &self.source[line_start..];
        let (line, advance) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], idx + 1),
            None => (rest, rest.len()),
        };
        self.pos = line_start + advance;
        let line = line.strip_suffix('\r').unwrap_or(line);
        let span = SourceSpan::new(line_start, line_start + line.len());

        if let Some(fence) = self.fence {
            return self.lex_fence_line(line, span, fence);
        }
        if let Some(html) = self.html {
            return self.lex_html_line(line, span, html);
        }
        self.lex_normal_line(line, span)
    }

    /// Drain the remaining tokens including the final Eof.
    pub fn tokenize(mut self) -> Vec<Token<'src>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn lex_fence_line(&mut self, line: &'src str, span: SourceSpan, fence: FenceState) -> Token<'src> {
        let (depth, offset) = strip_quote_markers(line, Some(fence.quote_depth));
        let remainder = &line[offset..];
        let indent = indent_columns(remainder);
        let trimmed = remainder.trim_start_matches([' ', '\t']);

        if indent <= fence.indent + 3 {
            let run = run_length(trimmed, fence.ch);
            if run >= fence.len && trimmed[run..].trim().is_empty() {
                self.fence = None;
                return self.token(TokenKind::FenceClose, span, depth, indent, remainder, offset);
            }
        }

        // Content line: remove up to the opening fence's indent.
        let text = strip_indent_columns(remainder, fence.indent);
        Token {
            kind: TokenKind::CodeLine,
            span,
            location: SourceLocation::new(self.line_no, (offset + 1) as u32),
            quote_depth: depth,
            indent: 0,
            text: Cow::Borrowed(text),
        }
    }

    fn lex_html_line(&mut self, line: &'src str, span: SourceSpan, html: HtmlState) -> Token<'src> {
        let (depth, offset) = strip_quote_markers(line, Some(html.quote_depth));
        let remainder = &line[offset..];
        let indent = indent_columns(remainder);

        match html.kind {
            6 | 7 => {
                if remainder.trim().is_empty() {
                    self.html = None;
                    return self.token(TokenKind::Blank, span, depth, indent, remainder, offset);
                }
            }
            kind => {
                if html_block_terminates(kind, remainder) {
                    self.html = None;
                }
            }
        }
        self.token(TokenKind::HtmlLine, span, depth, indent, remainder, offset)
    }

    fn lex_normal_line(&mut self, line: &'src str, span: SourceSpan) -> Token<'src> {
        let (depth, offset) = strip_quote_markers(line, None);
        let remainder = &line[offset..];

        if remainder.trim().is_empty() {
            return self.token(TokenKind::Blank, span, depth, 0, remainder, offset);
        }

        // Elevation hook: transform before classification so substituted
        // content can introduce block structure on its own line.
        let text: Cow<'src, str> = match &self.transform {
            Some(transform) => {
                let transformed = transform(remainder);
                if transformed == remainder {
                    Cow::Borrowed(remainder)
                } else {
                    Cow::Owned(transformed)
                }
            }
            None => Cow::Borrowed(remainder),
        };

        if text.trim().is_empty() {
            // The transformer may erase a line entirely.
            return Token {
                kind: TokenKind::Blank,
                span,
                location: SourceLocation::new(self.line_no, (offset + 1) as u32),
                quote_depth: depth,
                indent: 0,
                text,
            };
        }

        if text.contains('\n') {
            // Multi-line elevation is unsupported: degrade to a paragraph line.
            return Token {
                kind: TokenKind::Text,
                span,
                location: SourceLocation::new(self.line_no, (offset + 1) as u32),
                quote_depth: depth,
                indent: indent_columns(&text),
                text,
            };
        }

        let indent = indent_columns(&text);
        let kind = self.classify(text.trim_start_matches([' ', '\t']), depth, indent);
        Token {
            kind,
            span,
            location: SourceLocation::new(self.line_no, (offset + 1) as u32),
            quote_depth: depth,
            indent,
            text,
        }
    }

    /// Classify a whitespace-trimmed remainder. Side effects: entering fence
    /// or HTML-block mode.
    fn classify(&mut self, trimmed: &str, quote_depth: u8, indent: usize) -> TokenKind {
        debug_assert!(!trimmed.is_empty());
        let first = trimmed.chars().next().unwrap_or(' ');

        if first == '#' {
            let level = run_length(trimmed, '#');
            let after = &trimmed[level..];
            if level <= 6 && (after.is_empty() || after.starts_with([' ', '\t'])) {
                return TokenKind::AtxHeading { level: level as u8 };
            }
        }

        if matches!(first, '-' | '_' | '*') && is_thematic_break(trimmed, first) {
            return TokenKind::ThematicBreak;
        }

        if matches!(first, '=' | '-') && trimmed.trim_end().chars().all(|c| c == first) {
            return TokenKind::SetextUnderline { ch: first };
        }

        if matches!(first, '`' | '~') {
            let run = run_length(trimmed, first);
            if run >= 3 {
                let info = trimmed[run..].trim();
                // Backtick fences cannot carry backticks in the info string.
                if first == '~' || !info.contains('`') {
                    self.fence = Some(FenceState {
                        ch: first,
                        len: run,
                        quote_depth,
                        indent,
                    });
                    return TokenKind::FenceOpen {
                        ch: first,
                        len: run,
                        info: info.to_string(),
                    };
                }
            }
        }

        if first == ':' {
            let run = run_length(trimmed, ':');
            if run >= 3 {
                if let Some(kind) = classify_colon_fence(trimmed, run) {
                    return kind;
                }
            }
        }

        if let Some(kind) = classify_list_marker(trimmed) {
            return kind;
        }

        if first == '<' {
            if let Some(html_kind) = detect_html_block(trimmed) {
                let open_and_closed =
                    html_kind <= 5 && html_block_terminates(html_kind, split_after_open(trimmed, html_kind));
                if !open_and_closed {
                    self.html = Some(HtmlState {
                        kind: html_kind,
                        quote_depth,
                    });
                }
                return TokenKind::HtmlBlockOpen { html_kind };
            }
        }

        TokenKind::Text
    }

    fn token(
        &self,
        kind: TokenKind,
        span: SourceSpan,
        quote_depth: u8,
        indent: usize,
        text: &'src str,
        offset: usize,
    ) -> Token<'src> {
        Token {
            kind,
            span,
            location: SourceLocation::new(self.line_no, (offset + 1) as u32),
            quote_depth,
            indent,
            text: Cow::Borrowed(text),
        }
    }
}

/// Strip leading blockquote markers. Each marker is up to 3 spaces, `>`, and
/// one optional following space. `limit` caps the depth (fence/HTML modes
/// must not eat `>` that belongs to the content).
fn strip_quote_markers(line: &str, limit: Option<u8>) -> (u8, usize) {
    let bytes = line.as_bytes();
    let mut depth: u8 = 0;
    let mut pos = 0usize;

    loop {
        if let Some(limit) = limit {
            if depth >= limit {
                break;
            }
        }
        let mut probe = pos;
        let mut spaces = 0;
        while probe < bytes.len() && bytes[probe] == b' ' && spaces < 3 {
            probe += 1;
            spaces += 1;
        }
        if probe < bytes.len() && bytes[probe] == b'>' {
            probe += 1;
            if probe < bytes.len() && bytes[probe] == b' ' {
                probe += 1;
            }
            depth += 1;
            pos = probe;
        } else {
            break;
        }
    }
    (depth, pos)
}

/// Column width of leading whitespace, tabs advancing to the next multiple
/// of four.
fn indent_columns(text: &str) -> usize {
    let mut columns = 0usize;
    for ch in text.chars() {
        match ch {
            ' ' => columns += 1,
            '\t' => columns += 4 - (columns % 4),
            _ => break,
        }
    }
    columns
}

/// Remove up to `columns` columns of leading whitespace.
fn strip_indent_columns(text: &str, columns: usize) -> &str {
    let mut consumed = 0usize;
    let mut idx = 0usize;
    for (i, ch) in text.char_indices() {
        if consumed >= columns {
            break;
        }
        match ch {
            ' ' => consumed += 1,
            '\t' => consumed += 4 - (consumed % 4),
            _ => break,
        }
        idx = i + ch.len_utf8();
    }
    &text[idx..]
}

fn run_length(text: &str, ch: char) -> usize {
    text.chars().take_while(|c| *c == ch).count()
}

/// `***`, `- - -`, `___` and friends: at least three of the marker with only
/// spaces and tabs between.
fn is_thematic_break(trimmed: &str, marker: char) -> bool {
    let mut count = 0usize;
    for ch in trimmed.chars() {
        if ch == marker {
            count += 1;
        } else if ch != ' ' && ch != '\t' {
            return false;
        }
    }
    count >= 3
}

/// `:::{name} title`, `:::{/name}`, or a bare colon run.
fn classify_colon_fence(trimmed: &str, run: usize) -> Option<TokenKind> {
    let after = &trimmed[run..];
    let after_trimmed = after.trim();

    if after_trimmed.is_empty() {
        return Some(TokenKind::DirectiveClose {
            colons: run,
            name: None,
        });
    }

    let body = after_trimmed.strip_prefix('{')?;
    if let Some(name) = body.strip_prefix('/') {
        let name = name.strip_suffix('}')?;
        if is_directive_name(name) {
            return Some(TokenKind::DirectiveClose {
                colons: run,
                name: Some(name.to_string()),
            });
        }
        return None;
    }

    let close = body.find('}')?;
    let name = &body[..close];
    if !is_directive_name(name) {
        return None;
    }
    let title = body[close + 1..].trim();
    Some(TokenKind::DirectiveOpen {
        colons: run,
        name: name.to_string(),
        title: (!title.is_empty()).then(|| title.to_string()),
    })
}

fn is_directive_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Bullet and ordered list markers with their content offset.
fn classify_list_marker(trimmed: &str) -> Option<TokenKind> {
    let first = trimmed.chars().next()?;

    if matches!(first, '-' | '*' | '+') {
        let after = &trimmed[1..];
        if after.is_empty() || after.starts_with([' ', '\t']) {
            let width = marker_content_offset(1, after);
            return Some(TokenKind::ListMarker {
                marker: ListMarkerKind::Bullet { ch: first },
                width,
            });
        }
        return None;
    }

    if first.is_ascii_digit() {
        let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 9 {
            return None;
        }
        let after_digits = &trimmed[digits..];
        let delim = after_digits.chars().next()?;
        if delim != '.' && delim != ')' {
            return None;
        }
        let after = &after_digits[1..];
        if after.is_empty() || after.starts_with([' ', '\t']) {
            let start: u64 = trimmed[..digits].parse().ok()?;
            let width = marker_content_offset(digits + 1, after);
            return Some(TokenKind::ListMarker {
                marker: ListMarkerKind::Ordered { start, delim },
                width,
            });
        }
    }

    None
}

/// CommonMark content offset: marker width plus the following run of spaces,
/// except that five or more spaces (or none, for an empty item) count as one.
fn marker_content_offset(marker_width: usize, after: &str) -> usize {
    let spaces = after
        .chars()
        .take_while(|c| *c == ' ')
        .count();
    if spaces == 0 || spaces > 4 {
        marker_width + 1
    } else {
        marker_width + spaces
    }
}

/// CommonMark HTML block types 1–7 for an already-trimmed line starting `<`.
fn detect_html_block(trimmed: &str) -> Option<u8> {
    let lower = trimmed.to_ascii_lowercase();

    for tag in ["<script", "<pre", "<style", "<textarea"] {
        if let Some(rest) = lower.strip_prefix(tag) {
            if rest.is_empty() || rest.starts_with([' ', '\t', '>']) {
                return Some(1);
            }
        }
    }
    if trimmed.starts_with("<!--") {
        return Some(2);
    }
    if trimmed.starts_with("<?") {
        return Some(3);
    }
    if trimmed.starts_with("<![CDATA[") {
        return Some(5);
    }
    if let Some(rest) = trimmed.strip_prefix("<!") {
        if rest.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Some(4);
        }
    }

    // Type 6: known block-level tag, open or close.
    let name_start = if lower.starts_with("</") { 2 } else { 1 };
    let name: String = lower[name_start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if HTML_BLOCK_TAGS.contains(&name.as_str()) {
        let after = &lower[name_start + name.len()..];
        if after.is_empty() || after.starts_with([' ', '\t', '>']) || after.starts_with("/>") {
            return Some(6);
        }
    }

    // Type 7: a single complete tag alone on the line.
    if !name.is_empty() && is_complete_single_tag(trimmed) {
        return Some(7);
    }

    None
}

/// A lone `<tag ...>` or `</tag>` with nothing after it.
fn is_complete_single_tag(trimmed: &str) -> bool {
    trimmed.ends_with('>') && trimmed.matches('<').count() == 1 && trimmed.matches('>').count() == 1
}

fn html_block_terminates(kind: u8, line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    match kind {
        1 => ["</script>", "</pre>", "</style>", "</textarea>"]
            .iter()
            .any(|end| lower.contains(end)),
        2 => line.contains("-->"),
        3 => line.contains("?>"),
        4 => line.contains('>'),
        5 => line.contains("]]>"),
        _ => false,
    }
}

/// Content after the opening construct, used to detect blocks that open and
/// close on the same line.
fn split_after_open(trimmed: &str, kind: u8) -> &str {
    match kind {
        2 => trimmed.get(4..).unwrap_or(""),
        3 => trimmed.get(2..).unwrap_or(""),
        5 => trimmed.get(9..).unwrap_or(""),
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn heading_line() {
        assert_eq!(
            kinds("## Title\n"),
            vec![TokenKind::AtxHeading { level: 2 }, TokenKind::Eof]
        );
    }

    #[test]
    fn seven_hashes_is_text() {
        assert_eq!(kinds("####### nope\n"), vec![TokenKind::Text, TokenKind::Eof]);
    }

    #[test]
    fn hash_without_space_is_text() {
        assert_eq!(kinds("#hashtag\n"), vec![TokenKind::Text, TokenKind::Eof]);
    }

    #[rstest]
    #[case("---\n")]
    #[case("***\n")]
    #[case("___\n")]
    #[case("- - -\n")]
    #[case("  *  *  *  \n")]
    fn thematic_breaks(#[case] source: &str) {
        assert_eq!(kinds(source), vec![TokenKind::ThematicBreak, TokenKind::Eof]);
    }

    #[test]
    fn fence_bodies_are_code_lines() {
        let tokens = Lexer::new("```python\nx = 1\n# not a heading\n```\n").tokenize();
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::FenceOpen {
                    ch: '`',
                    len: 3,
                    info: "python".to_string()
                },
                TokenKind::CodeLine,
                TokenKind::CodeLine,
                TokenKind::FenceClose,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[1].text, "x = 1");
        assert_eq!(tokens[2].text, "# not a heading");
    }

    #[test]
    fn shorter_fence_run_does_not_close() {
        let tokens = Lexer::new("````\n```\n````\n").tokenize();
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::FenceOpen {
                    ch: '`',
                    len: 4,
                    info: String::new()
                },
                TokenKind::CodeLine,
                TokenKind::FenceClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn fence_body_span_is_contiguous() {
        let source = "```rust\nfn main() {}\n```\n";
        let tokens = Lexer::new(source).tokenize();
        let open = &tokens[0];
        let close = &tokens[2];
        let body = &source[open.span.end + 1..close.span.start];
        assert_eq!(body, "fn main() {}\n");
    }

    #[test]
    fn blockquote_marker_is_stripped() {
        let tokens = Lexer::new("> quoted\n>> deep\n").tokenize();
        assert_eq!(tokens[0].quote_depth, 1);
        assert_eq!(tokens[0].text, "quoted");
        assert_eq!(tokens[1].quote_depth, 2);
        assert_eq!(tokens[1].text, "deep");
    }

    #[test]
    fn quote_markers_are_content_inside_fences() {
        let tokens = Lexer::new("```\n> not a quote\n```\n").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::CodeLine);
        assert_eq!(tokens[1].quote_depth, 0);
        assert_eq!(tokens[1].text, "> not a quote");
    }

    #[test]
    fn fence_inside_blockquote_tracks_depth() {
        let tokens = Lexer::new("> ```\n> code\n> ```\n").tokenize();
        assert!(matches!(tokens[0].kind, TokenKind::FenceOpen { .. }));
        assert_eq!(tokens[1].kind, TokenKind::CodeLine);
        assert_eq!(tokens[1].text, "code");
        assert_eq!(tokens[2].kind, TokenKind::FenceClose);
    }

    #[rstest]
    #[case("- item\n", ListMarkerKind::Bullet { ch: '-' }, 2)]
    #[case("* item\n", ListMarkerKind::Bullet { ch: '*' }, 2)]
    #[case("+ item\n", ListMarkerKind::Bullet { ch: '+' }, 2)]
    #[case("1. item\n", ListMarkerKind::Ordered { start: 1, delim: '.' }, 3)]
    #[case("42) item\n", ListMarkerKind::Ordered { start: 42, delim: ')' }, 4)]
    #[case("1.   item\n", ListMarkerKind::Ordered { start: 1, delim: '.' }, 5)]
    fn list_markers(#[case] source: &str, #[case] marker: ListMarkerKind, #[case] width: usize) {
        let tokens = Lexer::new(source).tokenize();
        assert_eq!(
            tokens[0].kind,
            TokenKind::ListMarker { marker, width }
        );
    }

    #[test]
    fn ten_digit_ordinal_is_text() {
        assert_eq!(kinds("1234567890. x\n"), vec![TokenKind::Text, TokenKind::Eof]);
    }

    #[test]
    fn directive_open_with_title() {
        let tokens = Lexer::new(":::{note} Important\nbody\n:::\n").tokenize();
        assert_eq!(
            tokens[0].kind,
            TokenKind::DirectiveOpen {
                colons: 3,
                name: "note".to_string(),
                title: Some("Important".to_string()),
            }
        );
        assert_eq!(tokens[1].kind, TokenKind::Text);
        assert_eq!(
            tokens[2].kind,
            TokenKind::DirectiveClose {
                colons: 3,
                name: None
            }
        );
    }

    #[test]
    fn named_directive_closer() {
        let tokens = Lexer::new(":::{/note}\n").tokenize();
        assert_eq!(
            tokens[0].kind,
            TokenKind::DirectiveClose {
                colons: 3,
                name: Some("note".to_string())
            }
        );
    }

    #[test]
    fn colon_run_without_brace_payload_is_text() {
        assert_eq!(kinds("::: not a directive\n"), vec![TokenKind::Text, TokenKind::Eof]);
    }

    #[test]
    fn directive_fences_inside_code_stay_code() {
        let tokens = Lexer::new("```markdown\n:::{note}\n:::\n```\n").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::CodeLine);
        assert_eq!(tokens[2].kind, TokenKind::CodeLine);
        assert_eq!(tokens[3].kind, TokenKind::FenceClose);
    }

    #[test]
    fn html_comment_block() {
        let tokens = Lexer::new("<!-- note\nstill comment\n-->\nafter\n").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::HtmlBlockOpen { html_kind: 2 });
        assert_eq!(tokens[1].kind, TokenKind::HtmlLine);
        assert_eq!(tokens[2].kind, TokenKind::HtmlLine);
        assert_eq!(tokens[3].kind, TokenKind::Text);
    }

    #[test]
    fn single_line_html_comment_does_not_open_mode() {
        let tokens = Lexer::new("<!-- done -->\nplain\n").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::HtmlBlockOpen { html_kind: 2 });
        assert_eq!(tokens[1].kind, TokenKind::Text);
    }

    #[test]
    fn div_block_ends_at_blank_line() {
        let tokens = Lexer::new("<div class=\"x\">\ncontent\n\nplain\n").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::HtmlBlockOpen { html_kind: 6 });
        assert_eq!(tokens[1].kind, TokenKind::HtmlLine);
        assert_eq!(tokens[2].kind, TokenKind::Blank);
        assert_eq!(tokens[3].kind, TokenKind::Text);
    }

    #[test]
    fn transformer_elevates_heading() {
        let transform: TextTransform = Arc::new(|line: &str| line.replace("{{heading}}", "# Elevated"));
        let tokens = Lexer::with_transform("{{heading}}\n", Some(transform)).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::AtxHeading { level: 1 });
        assert_eq!(tokens[0].text, "# Elevated");
    }

    #[test]
    fn multi_line_transform_degrades_to_text() {
        let transform: TextTransform =
            Arc::new(|line: &str| line.replace("{{items}}", "- a\n- b"));
        let tokens = Lexer::with_transform("{{items}}\n", Some(transform)).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Text);
    }

    #[test]
    fn transformer_does_not_run_in_fences() {
        let transform: TextTransform = Arc::new(|line: &str| line.replace("x", "y"));
        let tokens = Lexer::with_transform("```\nx\n```\n", Some(transform)).tokenize();
        assert_eq!(tokens[1].text, "x");
    }

    #[test]
    fn setext_underline_classification() {
        assert_eq!(
            kinds("===\n"),
            vec![TokenKind::SetextUnderline { ch: '=' }, TokenKind::Eof]
        );
    }

    #[test]
    fn locations_are_one_based_lines() {
        let tokens = Lexer::new("a\nb\n").tokenize();
        assert_eq!(tokens[0].location.line, 1);
        assert_eq!(tokens[1].location.line, 2);
    }

    #[test]
    fn crlf_lines_are_normalized() {
        let tokens = Lexer::new("# A\r\ntext\r\n").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::AtxHeading { level: 1 });
        assert_eq!(tokens[1].text, "text");
    }

    #[test]
    fn random_bytes_never_panic() {
        // Cheap fuzz: deterministic pseudo-random ASCII soup.
        let mut state: u32 = 0x2545_f491;
        let mut source = String::new();
        for _ in 0..4096 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let byte = (state >> 16) as u8 % 96 + 32;
            source.push(byte as char);
            if state % 23 == 0 {
                source.push('\n');
            }
        }
        let tokens = Lexer::new(&source).tokenize();
        assert!(tokens.last().unwrap().is_eof());
    }
}

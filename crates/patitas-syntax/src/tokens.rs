//! Line-oriented token stream.
//!
//! The lexer emits exactly one token per physical line (plus a final
//! [`TokenKind::Eof`]). A token records how much container prefix was
//! stripped (`quote_depth`), the indentation of what remains, and a
//! classification of the remainder. Tokens are consumed once; the stream is
//! single-use.

use std::borrow::Cow;

use crate::source::{SourceLocation, SourceSpan};

/// List marker shape for [`TokenKind::ListMarker`] lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarkerKind {
    /// `-`, `*`, or `+` bullet.
    Bullet { ch: char },
    /// `1.` or `1)` style marker with its start number.
    Ordered { start: u64, delim: char },
}

/// Classification of a line remainder (after quote/indent accounting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Whitespace-only line.
    Blank,
    /// `#`–`######` heading opener.
    AtxHeading { level: u8 },
    /// A run of `=` or `-` that may close a paragraph as a setext heading.
    SetextUnderline { ch: char },
    /// `---`, `***`, or `___` rule.
    ThematicBreak,
    /// Opening code fence; `info` is the trimmed info string.
    FenceOpen { ch: char, len: usize, info: String },
    /// Raw line inside an open code fence.
    CodeLine,
    /// Fence run that closed the current code fence.
    FenceClose,
    /// Bullet or ordered list marker. `width` is the column offset of the
    /// item content within the remainder (marker plus following spaces).
    ListMarker { marker: ListMarkerKind, width: usize },
    /// `:::{name} optional title` colon-fence opener.
    DirectiveOpen {
        colons: usize,
        name: String,
        title: Option<String>,
    },
    /// Bare colon run or `:::{/name}` closer.
    DirectiveClose { colons: usize, name: Option<String> },
    /// First line of a CommonMark HTML block (types 1–7).
    HtmlBlockOpen { html_kind: u8 },
    /// Subsequent raw line of an open HTML block.
    HtmlLine,
    /// Anything else: paragraph content, table rows, option lines.
    Text,
    /// End of input.
    Eof,
}

/// One lexed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    /// Byte range of the full physical line, newline excluded.
    pub span: SourceSpan,
    /// 1-based position of the first remainder byte.
    pub location: SourceLocation,
    /// Number of `>` blockquote markers stripped from the front.
    pub quote_depth: u8,
    /// Column width of the remainder's leading whitespace (tab = 4 columns).
    pub indent: usize,
    /// The remainder after quote stripping. Leading whitespace is preserved
    /// (`indent` measures it); borrowed from the source unless the text
    /// transformer rewrote the line.
    pub text: Cow<'src, str>,
}

impl<'src> Token<'src> {
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.kind, TokenKind::Blank)
    }

    /// The remainder with its leading whitespace removed.
    pub fn trimmed(&self) -> &str {
        self.text.trim_start_matches([' ', '\t'])
    }

    /// The remainder with up to `columns` columns of leading whitespace
    /// removed (tab = 4 columns). Used for indented-code content and list
    /// item continuation stripping.
    pub fn strip_columns(&self, columns: usize) -> &str {
        let mut consumed = 0usize;
        let mut idx = 0usize;
        for (i, ch) in self.text.char_indices() {
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
        &self.text[idx..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_token(text: &str, indent: usize) -> Token<'_> {
        Token {
            kind: TokenKind::Text,
            span: SourceSpan::new(0, text.len()),
            location: SourceLocation::start(),
            quote_depth: 0,
            indent,
            text: Cow::Borrowed(text),
        }
    }

    #[test]
    fn strip_columns_spaces() {
        let tok = text_token("      foo", 6);
        assert_eq!(tok.strip_columns(4), "  foo");
        assert_eq!(tok.strip_columns(6), "foo");
    }

    #[test]
    fn strip_columns_stops_at_content() {
        let tok = text_token("  foo", 2);
        assert_eq!(tok.strip_columns(4), "foo");
    }

    #[test]
    fn strip_columns_tab() {
        let tok = text_token("\tfoo", 4);
        assert_eq!(tok.strip_columns(4), "foo");
    }
}

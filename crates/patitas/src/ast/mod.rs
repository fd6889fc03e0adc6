//! Typed, immutable AST.
//!
//! A closed set of node variants partitioned into [`Block`] and [`Inline`].
//! Children live in ordered `Vec`s owned by their parent; there are no
//! parent back-links, so a fully built tree is freely shareable across
//! rendering threads. Every block carries the [`SourceLocation`] it started
//! at.
//!
//! Code-fence bodies follow the zero-copy handoff: [`CodeBody::Span`] points
//! into the caller's source buffer and is resolved at render time. Only
//! fences whose bytes are not contiguous in the source (bodies inside
//! blockquotes or list items, where each line carried a stripped prefix)
//! fall back to [`CodeBody::Owned`].

use std::sync::Arc;

use patitas_syntax::{SourceLocation, SourceSpan};
use serde::Serialize;

use crate::directives::options::{OptionsValue, RawOptions};

/// Root of a parsed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub children: Vec<Block>,
}

/// Block-level node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
    FencedCode(FencedCode),
    IndentedCode(IndentedCode),
    BlockQuote(BlockQuote),
    List(List),
    ThematicBreak(ThematicBreak),
    HtmlBlock(HtmlBlock),
    Table(Table),
    MathBlock(MathBlock),
    FootnoteDef(FootnoteDef),
    Directive(Directive),
}

impl Block {
    pub fn location(&self) -> SourceLocation {
        match self {
            Block::Heading(n) => n.location,
            Block::Paragraph(n) => n.location,
            Block::FencedCode(n) => n.location,
            Block::IndentedCode(n) => n.location,
            Block::BlockQuote(n) => n.location,
            Block::List(n) => n.location,
            Block::ThematicBreak(n) => n.location,
            Block::HtmlBlock(n) => n.location,
            Block::Table(n) => n.location,
            Block::MathBlock(n) => n.location,
            Block::FootnoteDef(n) => n.location,
            Block::Directive(n) => n.location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heading {
    pub location: SourceLocation,
    /// 1–6.
    pub level: u8,
    /// From trailing `{#custom-id}` syntax; computed slugs are *not* stored
    /// on the node, they land in the renderer's heading log.
    pub explicit_id: Option<String>,
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paragraph {
    pub location: SourceLocation,
    pub children: Vec<Inline>,
}

/// Where a fenced-code body lives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CodeBody {
    /// Contiguous bytes in the source buffer (the zero-copy path).
    Span(SourceSpan),
    /// Reassembled content for fences nested inside stripping containers.
    Owned(String),
}

impl CodeBody {
    /// Resolve the body against the source buffer the node was parsed from.
    pub fn resolve<'a>(&'a self, source: &'a str) -> &'a str {
        match self {
            CodeBody::Span(span) => span.slice(source),
            CodeBody::Owned(content) => content,
        }
    }

    /// The span for delegate handoff, when the body is span-backed.
    pub fn span(&self) -> Option<SourceSpan> {
        match self {
            CodeBody::Span(span) => Some(*span),
            CodeBody::Owned(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FencedCode {
    pub location: SourceLocation,
    /// Raw info string (`python {1,3-5}` and the like).
    pub info: String,
    pub body: CodeBody,
    pub fence_char: char,
    pub fence_len: usize,
}

impl FencedCode {
    /// Body text, recovered from the source buffer where span-backed.
    pub fn code<'a>(&'a self, source: &'a str) -> &'a str {
        self.body.resolve(source)
    }

    /// First word of the info string, lowercased: the language tag.
    pub fn language(&self) -> Option<String> {
        self.info
            .split_whitespace()
            .next()
            .map(|lang| lang.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndentedCode {
    pub location: SourceLocation,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockQuote {
    pub location: SourceLocation,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct List {
    pub location: SourceLocation,
    pub ordered: bool,
    pub start: u64,
    /// No blank lines between items: items render without `<p>` wrappers.
    /// Fixed at parse time.
    pub tight: bool,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub location: SourceLocation,
    /// Task-list state: `Some(true)` for `[x]`, `Some(false)` for `[ ]`.
    pub checked: Option<bool>,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThematicBreak {
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlBlock {
    pub location: SourceLocation,
    pub html: String,
}

/// Column alignment from a GFM delimiter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn css(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub location: SourceLocation,
    pub alignments: Vec<Option<Align>>,
    pub head: Vec<TableRow>,
    pub body: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCell {
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MathBlock {
    pub location: SourceLocation,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootnoteDef {
    pub location: SourceLocation,
    pub identifier: String,
    pub children: Vec<Block>,
}

/// Options attached to a directive: the raw `:key: value` pairs plus the
/// typed value the handler built from them.
#[derive(Debug, Clone, Default)]
pub struct DirectiveOptions {
    pub raw: RawOptions,
    pub typed: Option<Arc<dyn OptionsValue>>,
}

impl DirectiveOptions {
    pub fn from_raw(raw: RawOptions) -> Self {
        Self { raw, typed: None }
    }

    pub fn with_typed(raw: RawOptions, typed: Arc<dyn OptionsValue>) -> Self {
        Self {
            raw,
            typed: Some(typed),
        }
    }

    /// Downcast the typed options to a concrete handler options struct.
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        self.typed.as_ref()?.as_any().downcast_ref::<T>()
    }

    /// Stable textual form, used in structural cache keys.
    pub fn summary(&self) -> String {
        match &self.typed {
            Some(typed) => typed.summary(),
            None => self.raw.summary(),
        }
    }
}

impl PartialEq for DirectiveOptions {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.summary() == other.summary()
    }
}

impl Serialize for DirectiveOptions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Directive {
    pub location: SourceLocation,
    pub name: String,
    pub title: Option<String>,
    pub options: DirectiveOptions,
    pub children: Vec<Block>,
}

/// Inline-level node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Inline {
    Text(Text),
    Emphasis(Emphasis),
    Strong(Strong),
    Link(Link),
    Image(Image),
    CodeSpan(CodeSpan),
    LineBreak,
    SoftBreak,
    HtmlInline(HtmlInline),
    Strikethrough(Strikethrough),
    Math(Math),
    FootnoteRef(FootnoteRef),
    Role(Role),
}

/// Plain text, entity-decoded at parse time and HTML-escaped at render time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emphasis {
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strong {
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub url: String,
    pub title: Option<String>,
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    pub url: String,
    pub title: Option<String>,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeSpan {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlInline {
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strikethrough {
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Math {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FootnoteRef {
    pub identifier: String,
}

/// Inline role: `` {name}`content` ``.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Role {
    pub name: String,
    pub content: String,
    /// Extracted by role handlers from forms like ``Display <target>``.
    pub target: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn code_body_resolves_span_against_source() {
        let source = "```\nlet x = 1;\n```\n";
        let body = CodeBody::Span(SourceSpan::new(4, 15));
        assert_eq!(body.resolve(source), "let x = 1;\n");
    }

    #[test]
    fn code_body_owned_ignores_source() {
        let body = CodeBody::Owned("stripped\n".to_string());
        assert_eq!(body.resolve("unrelated"), "stripped\n");
        assert!(body.span().is_none());
    }

    #[test]
    fn language_is_first_info_word_lowercased() {
        let node = FencedCode {
            location: SourceLocation::start(),
            info: "Python {1,3}".to_string(),
            body: CodeBody::Owned(String::new()),
            fence_char: '`',
            fence_len: 3,
        };
        assert_eq!(node.language().as_deref(), Some("python"));
    }

    #[test]
    fn directive_serializes_raw_options() {
        let mut raw = RawOptions::default();
        raw.insert("class", "custom");
        let node = Directive {
            location: SourceLocation::start(),
            name: "note".to_string(),
            title: None,
            options: DirectiveOptions::from_raw(raw),
            children: Vec::new(),
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["options"]["class"], "custom");
    }
}

//! Parser: token stream in, immutable [`Document`] out.
//!
//! Parsing runs in two phases. The block phase builds the container
//! structure and collects link reference definitions (first label wins); the
//! inline phase then rewrites every paragraph, heading, and table cell
//! through the delimiter-run inline parser. Splitting the phases is what
//! lets a reference used on line 1 resolve against a definition on the last
//! line.
//!
//! Parsing never fails. Malformed constructs degrade to their nearest
//! well-formed alternative, usually a paragraph of literal text.

mod blocks;
pub mod inline;
pub(crate) mod tables;

use crate::ast::{Block, Document, Inline};
use crate::config::{ParseConfig, parse_config};
use crate::error::ContractViolation;
use crate::parser::blocks::BlockParser;
use crate::parser::inline::InlineParser;

pub use inline::{RefDefs, normalize_label};

/// Reusable parser instance.
///
/// Carries no per-source state between calls beyond the contract violations
/// of the most recent parse; [`reset`](Parser::reset) returns it to the
/// observable state of a fresh construction, which is what the instance pool
/// relies on.
#[derive(Default)]
pub struct Parser {
    violations: Vec<ContractViolation>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to freshly-constructed state (pool reuse).
    pub fn reset(&mut self) {
        self.violations.clear();
    }

    /// Parse using the ambient [`ParseConfig`].
    pub fn parse(&mut self, source: &str) -> Document {
        let config = parse_config::get();
        self.parse_with(source, &config)
    }

    /// Parse with an explicit configuration.
    pub fn parse_with(&mut self, source: &str, config: &ParseConfig) -> Document {
        let mut block_parser = BlockParser::new(source, config);
        let mut children = block_parser.run();
        let refdefs = std::mem::take(&mut block_parser.refdefs);
        self.violations = std::mem::take(&mut block_parser.violations);

        let inline_parser = InlineParser::new(config, &refdefs);
        resolve_inlines(&mut children, &inline_parser);

        tracing::trace!(blocks = children.len(), bytes = source.len(), "parsed document");
        Document { children }
    }

    /// Contract violations recorded by the most recent parse.
    pub fn violations(&self) -> &[ContractViolation] {
        &self.violations
    }
}

/// Concatenated raw text of phase-one placeholder children.
fn raw_text(children: &[Inline]) -> String {
    let mut out = String::new();
    for child in children {
        if let Inline::Text(text) = child {
            out.push_str(&text.content);
        }
    }
    out
}

/// Phase two: replace raw placeholder text with parsed inline trees.
fn resolve_inlines(blocks: &mut [Block], inline_parser: &InlineParser<'_>) {
    for block in blocks {
        match block {
            Block::Heading(node) => {
                node.children = inline_parser.parse(&raw_text(&node.children));
            }
            Block::Paragraph(node) => {
                node.children = inline_parser.parse(&raw_text(&node.children));
            }
            Block::Table(node) => {
                for row in node.head.iter_mut().chain(node.body.iter_mut()) {
                    for cell in &mut row.cells {
                        cell.children = inline_parser.parse(&raw_text(&cell.children));
                    }
                }
            }
            Block::BlockQuote(node) => resolve_inlines(&mut node.children, inline_parser),
            Block::List(node) => {
                for item in &mut node.items {
                    resolve_inlines(&mut item.children, inline_parser);
                }
            }
            Block::FootnoteDef(node) => resolve_inlines(&mut node.children, inline_parser),
            Block::Directive(node) => resolve_inlines(&mut node.children, inline_parser),
            Block::FencedCode(_)
            | Block::IndentedCode(_)
            | Block::ThematicBreak(_)
            | Block::HtmlBlock(_)
            | Block::MathBlock(_) => {}
        }
    }
}

//! # patitas-syntax
//!
//! Source model, token stream, and line lexer for the patitas Markdown
//! parser. This crate knows nothing about the AST or HTML; it turns a
//! borrowed source buffer into a single-use stream of line tokens that the
//! engine crate consumes.
//!
//! ## The O(n) guarantee
//!
//! The lexer makes one forward pass, classifying each line with bounded
//! lookahead inside that line and no regular expressions. There is nothing
//! to backtrack into, so no input can trigger super-linear behavior.
//!
//! ## Zero-Copy Lexer Handoff
//!
//! Code-fence bodies are never materialised here. Tokens carry byte spans
//! into the caller's buffer; for a fence whose body is contiguous in the
//! source, downstream consumers (the HTML renderer, host syntax
//! highlighters) read the bytes straight out of the buffer.

pub mod lexer;
pub mod source;
pub mod tokens;

pub use lexer::{Lexer, TextTransform};
pub use source::{SourceLocation, SourceSpan};
pub use tokens::{ListMarkerKind, Token, TokenKind};

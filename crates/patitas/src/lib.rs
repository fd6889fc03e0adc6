//! # Patitas
//!
//! A Markdown parser and HTML renderer built for parallel site builds.
//!
//! Three properties shape the whole design:
//!
//! - **O(n) parsing.** The lexer makes one forward pass with bounded
//!   per-line lookahead and no regular expressions, so no input can trigger
//!   super-linear behavior (ReDoS-proof by construction).
//! - **Immutable typed AST.** Parsing produces a [`Document`] of closed
//!   [`ast::Block`]/[`ast::Inline`] enums with unique child ownership. Once
//!   built, a tree is freely shared across rendering threads.
//! - **Zero-Copy Lexer Handoff.** Code-fence bodies live as byte spans into
//!   the caller's source buffer; the renderer and host syntax highlighters
//!   read them in place, never through a copied string.
//!
//! ## Quick start
//!
//! ```
//! let html = patitas::parse("# Hello **World**");
//! assert_eq!(html, "<h1 id=\"hello-world\">Hello <strong>World</strong></h1>\n");
//! ```
//!
//! Configured use goes through [`Markdown`]:
//!
//! ```
//! let md = patitas::create_markdown();
//! let html = md.convert("| a | b |\n|---|---|\n| 1 | 2 |\n");
//! assert!(html.contains("<table>"));
//! ```
//!
//! ## Extension points
//!
//! Block-level **directives** (`:::{note}` … `:::`) and inline **roles**
//! (`` {kbd}`Ctrl+C` ``) dispatch through registries built once at startup
//! and injected via configuration; see [`directives`] and [`roles`].
//! Host-supplied capabilities (syntax highlighters, file resolvers for
//! includes, directive output caches, page/site context) come in through
//! the traits in [`protocols`].
//!
//! ## Concurrency model
//!
//! Configuration and per-request state live in thread-local ambient slots
//! with token-based save/restore ([`config`], [`render_config`],
//! [`metadata`], [`request`]); parser and renderer instances come from
//! bounded per-thread pools ([`pool`]). Shared state (source buffer, AST,
//! registries) is immutable. [`parse_many`] fans out over a worker pool
//! sized from the CPU count and falls back to sequential for small inputs.

pub mod api;
pub mod ast;
pub mod builder;
pub mod config;
pub mod context;
pub mod directives;
pub mod error;
pub mod metadata;
pub mod parser;
pub mod pool;
pub mod protocols;
pub mod render;
pub mod render_config;
pub mod request;
pub mod roles;
pub mod xref;

pub use api::{
    AVAILABLE_PLUGINS, Markdown, RenderedPage, create_markdown, extract_excerpt,
    extract_meta_description, parse, parse_many, parse_many_with_workers, parse_to_ast,
    parse_with_context, parse_with_toc, parse_with_toc_and_context, render_ast, try_parse,
    with_request_context,
};
pub use ast::Document;
pub use builder::StringBuilder;
pub use config::ParseConfig;
pub use error::{ContractViolation, IncludeError, RenderError, RequestContextError};
pub use metadata::RenderMetadata;
pub use parser::Parser;
pub use patitas_syntax::{Lexer, SourceLocation, SourceSpan, TextTransform, Token, TokenKind};
pub use render::{HeadingInfo, HtmlRenderer, RenderEnv};
pub use render_config::{HighlightStyle, RenderConfig};
pub use request::RequestContext;

//! HTML renderer.
//!
//! One walk over the AST accumulates HTML into a [`StringBuilder`] and
//! collects heading information as it goes (single-pass decoration): each
//! heading's plain text is slugified, deduplicated, emitted as its `id`
//! attribute, and recorded in the heading log. The TOC is generated from the
//! log after the walk; no pass ever re-scans the accumulated HTML.
//!
//! Configuration comes from the ambient [`RenderConfig`] slot, captured once
//! per render call. Host-supplied capabilities (highlighter delegate,
//! directive cache, page/site context) travel in a [`RenderEnv`].

mod blocks;
mod directives;
pub(crate) mod inline;
pub mod utils;

use std::collections::HashMap;

use crate::ast::{Block, Document, FootnoteDef, Inline};
use crate::builder::StringBuilder;
use crate::error::RenderError;
use crate::protocols::{DirectiveCache, FileResolver, LexerDelegate, PageContext, SiteContext};
use crate::render_config::{RenderConfig, render_config};
use crate::xref::XrefIndex;

pub use utils::{HeadingInfo, default_slugify};

/// Host-supplied context for one render call. Everything is optional; an
/// empty environment renders plain Markdown.
#[derive(Default, Clone, Copy)]
pub struct RenderEnv<'a> {
    pub delegate: Option<&'a dyn LexerDelegate>,
    pub directive_cache: Option<&'a dyn DirectiveCache>,
    pub page: Option<&'a PageContext>,
    pub site: Option<&'a SiteContext>,
    pub xref: Option<&'a XrefIndex>,
    pub file_resolver: Option<&'a dyn FileResolver>,
}

impl RenderEnv<'_> {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Reusable HTML renderer instance.
///
/// All per-render state is cleared at the start of each render, so a pooled
/// instance behaves exactly like a fresh one.
#[derive(Default)]
pub struct HtmlRenderer {
    pub(crate) config: RenderConfig,
    headings: Vec<HeadingInfo>,
    seen_slugs: HashMap<String, u32>,
    pub(crate) fatal: Option<RenderError>,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return to freshly-constructed state (pool reuse).
    pub fn reset(&mut self) {
        self.config = RenderConfig::default();
        self.headings.clear();
        self.seen_slugs.clear();
        self.fatal = None;
    }

    /// Render with an empty environment.
    pub fn render(&mut self, doc: &Document, source: &str) -> String {
        self.render_with_env(doc, source, &RenderEnv::empty())
    }

    /// Render a document. `source` must be the buffer the document was
    /// parsed from: fenced-code bodies resolve against it (zero-copy
    /// handoff).
    pub fn render_with_env(&mut self, doc: &Document, source: &str, env: &RenderEnv<'_>) -> String {
        self.config = render_config::get();
        self.headings.clear();
        self.seen_slugs.clear();
        self.fatal = None;

        let mut sb = StringBuilder::with_capacity(source.len() + source.len() / 2);
        let mut footnotes: Vec<&FootnoteDef> = Vec::new();

        for node in &doc.children {
            if self.fatal.is_some() {
                break;
            }
            match node {
                Block::FootnoteDef(def) => footnotes.push(def),
                _ => self.render_block(node, &mut sb, source, env),
            }
        }

        if !footnotes.is_empty() && self.fatal.is_none() {
            self.render_footnotes_section(&footnotes, &mut sb, source, env);
        }

        sb.build()
    }

    /// Strict-mode entry point: the first escalated error aborts the walk
    /// and surfaces here.
    pub fn try_render(
        &mut self,
        doc: &Document,
        source: &str,
        env: &RenderEnv<'_>,
    ) -> Result<String, RenderError> {
        let html = self.render_with_env(doc, source, env);
        match self.fatal.take() {
            Some(error) => Err(error),
            None => Ok(html),
        }
    }

    /// The heading log collected by the most recent render, document order.
    pub fn headings(&self) -> &[HeadingInfo] {
        &self.headings
    }

    /// Structured TOC data: `{level, text, slug}` records.
    pub fn toc_items(&self) -> Vec<HeadingInfo> {
        self.headings.clone()
    }

    /// Nested `<ul class="toc">` fragment built from the heading log.
    pub fn toc_html(&self) -> String {
        if self.headings.is_empty() {
            return String::new();
        }

        let mut parts: Vec<String> = vec!["<ul class=\"toc\">".to_string()];
        let mut prev_level = self.headings[0].level;

        for heading in &self.headings {
            let level = heading.level;
            if level > prev_level {
                for _ in 0..(level - prev_level) {
                    parts.push("<ul>".to_string());
                }
            } else if level < prev_level {
                for _ in 0..(prev_level - level) {
                    parts.push("</li></ul>".to_string());
                }
                parts.push("</li>".to_string());
            } else if parts.last().map(String::as_str) != Some("</ul>")
                && parts.last().map(String::as_str) != Some("<ul class=\"toc\">")
            {
                parts.push("</li>".to_string());
            }

            parts.push(format!(
                "<li><a href=\"#{}\">{}</a>",
                heading.slug,
                utils::escape_html(&heading.text)
            ));
            prev_level = level;
        }

        parts.push("</li>".to_string());
        parts.push("</ul>".to_string());
        parts.join("")
    }

    /// Plain text of inline children, with the render-time text transformer
    /// applied to text runs. Used for slugs and TOC text.
    pub(crate) fn extract_plain_text(&self, children: &[Inline]) -> String {
        let mut out = String::new();
        self.collect_plain_text(children, &mut out);
        out
    }

    fn collect_plain_text(&self, children: &[Inline], out: &mut String) {
        for child in children {
            match child {
                Inline::Text(text) => match &self.config.text_transformer {
                    Some(transform) => out.push_str(&transform(&text.content)),
                    None => out.push_str(&text.content),
                },
                Inline::CodeSpan(code) => out.push_str(&code.code),
                Inline::Math(math) => out.push_str(&math.content),
                Inline::Emphasis(n) => self.collect_plain_text(&n.children, out),
                Inline::Strong(n) => self.collect_plain_text(&n.children, out),
                Inline::Strikethrough(n) => self.collect_plain_text(&n.children, out),
                Inline::Link(n) => self.collect_plain_text(&n.children, out),
                // Skipped: images, breaks, raw HTML, roles, footnote refs.
                _ => {}
            }
        }
    }

    /// Record a heading in the log, document order.
    pub(crate) fn log_heading(&mut self, level: u8, text: String, slug: String) {
        self.headings.push(HeadingInfo { level, text, slug });
    }

    /// Slug for a heading, deduplicated within the document by `-1`, `-2`, …
    /// suffixes.
    pub(crate) fn unique_slug(&mut self, text: &str) -> String {
        let base = match &self.config.slugify {
            Some(slugify) => slugify(text),
            None => default_slugify(text),
        };
        let base = if base.is_empty() {
            "heading".to_string()
        } else {
            base
        };

        match self.seen_slugs.get_mut(&base) {
            None => {
                self.seen_slugs.insert(base.clone(), 0);
                base
            }
            Some(count) => {
                *count += 1;
                format!("{base}-{count}")
            }
        }
    }

    /// Render inline children through the dispatch table, giving registered
    /// role handlers first claim on role nodes.
    pub(crate) fn render_inline_children(&self, children: &[Inline], sb: &mut StringBuilder) {
        for child in children {
            self.render_inline(child, sb);
        }
    }

    pub(crate) fn render_inline(&self, node: &Inline, sb: &mut StringBuilder) {
        if let Inline::Role(role) = node {
            if let Some(registry) = &self.config.role_registry {
                if let Some(handler) = registry.get(&role.name) {
                    let parsed = handler.parse(&role.name, &role.content);
                    handler.render(&parsed, sb);
                    return;
                }
            }
        }
        inline::INLINE_DISPATCH[inline::dispatch_index(node)](self, node, sb);
    }
}

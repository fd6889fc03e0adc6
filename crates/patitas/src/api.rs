//! Public entry points.
//!
//! The free functions cover the common one-shot paths with default
//! configuration; [`Markdown`] holds prebuilt configs (plugins, registries,
//! highlighting, delegate) for repeated use. Every entry point is
//! thread-safe: configuration travels through the ambient slots, parser and
//! renderer instances come from the per-thread pools, and batch parsing
//! fans out over a rayon pool sized from the CPU count.

use std::sync::Arc;

use patitas_syntax::TextTransform;
use rayon::prelude::*;

use crate::ast::{Block, Document};
use crate::config::{ParseConfig, parse_config};
use crate::directives::create_default_registry;
use crate::error::RenderError;
use crate::pool::{ParserPool, RendererPool};
use crate::protocols::LexerDelegate;
use crate::render::{HeadingInfo, RenderEnv};
use crate::render_config::{HighlightStyle, RenderConfig, render_config};
use crate::request::request;
use crate::roles::create_default_registry as create_default_role_registry;
use crate::xref::{CrossReferences, ExternalRefResolver, XrefIndex};

/// Below this total input size, batch parsing stays sequential; thread
/// fan-out costs more than it saves.
const PARALLEL_THRESHOLD_BYTES: usize = 5_000;

/// Meta descriptions truncate at a word boundary near this length.
const META_DESCRIPTION_MAX_CHARS: usize = 160;

/// Everything the common SSG path needs from one parse.
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub html: String,
    pub toc_html: String,
    pub toc_items: Vec<HeadingInfo>,
    pub excerpt: String,
    pub meta_description: String,
}

/// One-shot parse + render with the ambient configuration.
pub fn parse(source: &str) -> String {
    let doc = parse_to_ast(source);
    render_ast(&doc, source)
}

/// Parse many documents, in parallel when the workload justifies it.
/// The output order matches the input order.
pub fn parse_many<S: AsRef<str> + Sync>(sources: &[S]) -> Vec<String> {
    if sources.len() <= 1 {
        return sources.iter().map(|s| parse(s.as_ref())).collect();
    }
    let total: usize = sources.iter().map(|s| s.as_ref().len()).sum();
    if total < PARALLEL_THRESHOLD_BYTES {
        return sources.iter().map(|s| parse(s.as_ref())).collect();
    }
    sources.par_iter().map(|s| parse(s.as_ref())).collect()
}

/// Parse many documents on a dedicated pool with an explicit worker count.
pub fn parse_many_with_workers<S: AsRef<str> + Sync>(sources: &[S], workers: usize) -> Vec<String> {
    if workers <= 1 {
        return sources.iter().map(|s| parse(s.as_ref())).collect();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| sources.par_iter().map(|s| parse(s.as_ref())).collect()),
        Err(_) => sources.iter().map(|s| parse(s.as_ref())).collect(),
    }
}

/// Parse to the typed AST without rendering.
pub fn parse_to_ast(source: &str) -> Document {
    let mut parser = ParserPool::acquire();
    parser.parse(source)
}

/// Render an AST against the source buffer it was parsed from. The buffer is
/// required because fenced-code bodies are stored as spans into it.
pub fn render_ast(doc: &Document, source: &str) -> String {
    let mut renderer = RendererPool::acquire();
    renderer.render(doc, source)
}

/// The common SSG path: HTML plus TOC, excerpt, and meta description from a
/// single parse.
pub fn parse_with_toc(source: &str) -> RenderedPage {
    let doc = parse_to_ast(source);
    render_page(&doc, source, &RenderEnv::empty())
}

/// Parse with a host-supplied text transformer (variable substitution)
/// active during both lexing and rendering.
pub fn parse_with_context(source: &str, transformer: TextTransform) -> String {
    let parse_cfg = ParseConfig {
        text_transformer: Some(Arc::clone(&transformer)),
        ..parse_config::get()
    };
    let render_cfg = RenderConfig {
        text_transformer: Some(transformer),
        ..render_config::get()
    };
    parse_config::with(parse_cfg, || {
        render_config::with(render_cfg, || parse(source))
    })
}

/// [`parse_with_context`] plus the TOC/excerpt bundle.
pub fn parse_with_toc_and_context(source: &str, transformer: TextTransform) -> RenderedPage {
    let parse_cfg = ParseConfig {
        text_transformer: Some(Arc::clone(&transformer)),
        ..parse_config::get()
    };
    let render_cfg = RenderConfig {
        text_transformer: Some(transformer),
        ..render_config::get()
    };
    parse_config::with(parse_cfg, || {
        render_config::with(render_cfg, || {
            let doc = parse_to_ast(source);
            render_page(&doc, source, &RenderEnv::empty())
        })
    })
}

/// Strict-mode one-shot: the first escalated error aborts the render.
/// Escalation is driven by the request context's strict flag.
pub fn try_parse(source: &str) -> Result<String, RenderError> {
    let doc = parse_to_ast(source);
    let mut renderer = RendererPool::acquire();
    renderer.try_render(&doc, source, &RenderEnv::empty())
}

fn render_page(doc: &Document, source: &str, env: &RenderEnv<'_>) -> RenderedPage {
    let mut renderer = RendererPool::acquire();
    let html = renderer.render_with_env(doc, source, env);
    let toc_html = renderer.toc_html();
    let toc_items = renderer.toc_items();
    drop(renderer);

    RenderedPage {
        html,
        toc_html,
        toc_items,
        excerpt: extract_excerpt(doc, source),
        meta_description: extract_meta_description(doc),
    }
}

/// First paragraph, rendered, for listing pages.
pub fn extract_excerpt(doc: &Document, source: &str) -> String {
    for block in &doc.children {
        if let Block::Paragraph(_) = block {
            let fragment = Document {
                children: vec![block.clone()],
            };
            let mut renderer = RendererPool::acquire();
            return renderer.render(&fragment, source).trim_end().to_string();
        }
    }
    String::new()
}

/// First paragraph's plain text, truncated at a word boundary, for the
/// `<meta name="description">` tag.
pub fn extract_meta_description(doc: &Document) -> String {
    for block in &doc.children {
        if let Block::Paragraph(paragraph) = block {
            let text = crate::parser::inline::plain_text_of(&paragraph.children);
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.chars().count() <= META_DESCRIPTION_MAX_CHARS {
                return text;
            }
            let mut out = String::new();
            for word in text.split_whitespace() {
                if out.chars().count() + word.chars().count() + 1 > META_DESCRIPTION_MAX_CHARS - 1 {
                    break;
                }
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(word);
            }
            out.push('…');
            return out;
        }
    }
    String::new()
}

/// Available plugin names for [`Markdown::with_plugins`].
pub const AVAILABLE_PLUGINS: &[&str] = &[
    "table",
    "strikethrough",
    "task_lists",
    "footnotes",
    "math",
    "autolinks",
];

/// A configured parser/renderer pair.
///
/// Build once, share across threads: each call materializes its own scoped
/// configuration and borrows pooled instances, so concurrent `convert` calls
/// never share mutable state.
pub struct Markdown {
    parse_cfg: ParseConfig,
    render_cfg: RenderConfig,
    delegate: Option<Arc<dyn LexerDelegate>>,
    xref: Option<CrossReferences>,
}

/// A [`Markdown`] with every plugin and the built-in registries installed.
pub fn create_markdown() -> Markdown {
    Markdown::with_plugins(&["all"])
}

impl Markdown {
    /// Markdown with the built-in directive and role registries and no
    /// syntax extensions.
    pub fn new() -> Self {
        Self::with_plugins(&[])
    }

    pub fn with_plugins(plugins: &[&str]) -> Self {
        let all = plugins.contains(&"all");
        let enabled = |name: &str| all || plugins.contains(&name);
        for plugin in plugins {
            if *plugin != "all" && !AVAILABLE_PLUGINS.contains(plugin) {
                tracing::warn!(plugin, "unknown plugin ignored");
            }
        }

        let directive_registry = create_default_registry();
        let role_registry = create_default_role_registry();

        let parse_cfg = ParseConfig {
            tables: enabled("table"),
            strikethrough: enabled("strikethrough"),
            task_lists: enabled("task_lists"),
            footnotes: enabled("footnotes"),
            math: enabled("math"),
            autolinks: enabled("autolinks"),
            directive_registry: Some(Arc::clone(&directive_registry)),
            ..ParseConfig::default()
        };
        let render_cfg = RenderConfig {
            directive_registry: Some(directive_registry),
            role_registry: Some(role_registry),
            ..RenderConfig::default()
        };

        Self {
            parse_cfg,
            render_cfg,
            delegate: None,
            xref: None,
        }
    }

    /// Enable highlighting with the given style. Without a highlighter or
    /// delegate installed this still falls through to plain `<pre><code>`.
    pub fn highlight(mut self, style: HighlightStyle) -> Self {
        self.render_cfg.highlight = true;
        self.render_cfg.highlight_style = style;
        self
    }

    pub fn with_highlighter(mut self, highlighter: Arc<dyn crate::protocols::Highlighter>) -> Self {
        self.render_cfg.highlight = true;
        self.render_cfg.highlighter = Some(highlighter);
        self
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn LexerDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn strict_contracts(mut self, strict: bool) -> Self {
        self.parse_cfg.strict_contracts = strict;
        self
    }

    /// Install the `[[…]]` post-processing pass.
    pub fn enable_cross_references(
        &mut self,
        index: Arc<XrefIndex>,
        external: Option<Arc<ExternalRefResolver>>,
    ) {
        self.xref = Some(CrossReferences::new(index, external));
    }

    /// Parse and render one document.
    pub fn convert(&self, source: &str) -> String {
        self.convert_with(source, None, &RenderEnv::empty())
    }

    /// Parse and render with a per-call text transformer and environment.
    pub fn convert_with(
        &self,
        source: &str,
        transformer: Option<TextTransform>,
        env: &RenderEnv<'_>,
    ) -> String {
        let doc = self.parse_to_ast_with(source, transformer.clone());
        self.render_scoped(transformer, || {
            let mut renderer = RendererPool::acquire();
            let html = renderer.render_with_env(&doc, source, env);
            self.postprocess(html)
        })
    }

    /// Parse, render, and collect the TOC bundle.
    pub fn convert_with_toc(&self, source: &str, env: &RenderEnv<'_>) -> RenderedPage {
        let doc = self.parse_to_ast_with(source, None);
        self.render_scoped(None, || {
            let mut page = render_page(&doc, source, env);
            page.html = self.postprocess(std::mem::take(&mut page.html));
            page
        })
    }

    /// Strict path: contract violations from parsing and escalated render
    /// errors become `Err`.
    pub fn try_convert(&self, source: &str, env: &RenderEnv<'_>) -> Result<String, RenderError> {
        let (doc, violations) = parse_config::with(self.parse_cfg.clone(), || {
            let mut parser = ParserPool::acquire();
            let doc = parser.parse(source);
            (doc, parser.violations().to_vec())
        });
        if self.parse_cfg.strict_contracts {
            if let Some(violation) = violations.into_iter().next() {
                return Err(RenderError::Contract(violation));
            }
        }
        self.render_scoped(None, || {
            let mut renderer = RendererPool::acquire();
            let html = renderer.try_render(&doc, source, env)?;
            Ok(self.postprocess(html))
        })
    }

    pub fn parse_to_ast(&self, source: &str) -> Document {
        self.parse_to_ast_with(source, None)
    }

    fn parse_to_ast_with(&self, source: &str, transformer: Option<TextTransform>) -> Document {
        let mut config = self.parse_cfg.clone();
        if transformer.is_some() {
            config.text_transformer = transformer;
        }
        parse_config::with(config, || {
            let mut parser = ParserPool::acquire();
            parser.parse(source)
        })
    }

    pub fn render_ast(&self, doc: &Document, source: &str, env: &RenderEnv<'_>) -> String {
        self.render_scoped(None, || {
            let mut renderer = RendererPool::acquire();
            let html = renderer.render_with_env(doc, source, env);
            self.postprocess(html)
        })
    }

    fn render_scoped<R>(&self, transformer: Option<TextTransform>, f: impl FnOnce() -> R) -> R {
        let mut config = self.render_cfg.clone();
        if transformer.is_some() {
            config.text_transformer = transformer;
        }
        render_config::with(config, f)
    }

    fn postprocess(&self, html: String) -> String {
        match &self.xref {
            Some(xref) => xref.apply(&html),
            None => html,
        }
    }

    /// The delegate handed to render environments built by the caller.
    pub fn delegate(&self) -> Option<&Arc<dyn LexerDelegate>> {
        self.delegate.as_ref()
    }
}

impl Default for Markdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `f` inside a request scope; sugar over the ambient slot for hosts.
pub fn with_request_context<R>(
    ctx: crate::request::RequestContext,
    f: impl FnOnce() -> R,
) -> R {
    request::with(ctx, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_shot_parse() {
        assert_eq!(
            parse("# Hello **World**\n"),
            "<h1 id=\"hello-world\">Hello <strong>World</strong></h1>\n"
        );
    }

    #[test]
    fn parse_with_toc_bundle() {
        let page = parse_with_toc("# Title\n\nFirst paragraph here.\n");
        assert!(page.html.contains("<h1 id=\"title\">"));
        assert!(page.toc_html.contains("href=\"#title\""));
        assert_eq!(page.toc_items.len(), 1);
        assert_eq!(page.excerpt, "<p>First paragraph here.</p>");
        assert_eq!(page.meta_description, "First paragraph here.");
    }

    #[test]
    fn transformer_elevates_heading() {
        let transformer: TextTransform =
            Arc::new(|line: &str| line.replace("{{heading}}", "# Elevated"));
        let html = parse_with_context("{{heading}}\n", transformer);
        assert_eq!(html, "<h1 id=\"elevated\">Elevated</h1>\n");
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn markdown_instance_enables_plugins() {
        let md = create_markdown();
        let html = md.convert("~~gone~~\n");
        assert!(html.contains("<del>gone</del>"));

        let plain = Markdown::new().convert("~~kept~~\n");
        assert!(plain.contains("~~kept~~"));
    }

    #[test]
    fn markdown_instance_renders_directives_with_registry() {
        let md = create_markdown();
        let html = md.convert(":::{note}\nA note.\n:::\n");
        assert!(html.contains("admonition"));
        assert!(html.contains("note"));
    }

    #[test]
    fn cross_references_postprocess() {
        let mut md = Markdown::new();
        let mut index = XrefIndex::default();
        index.by_path.insert(
            "docs/setup".to_string(),
            crate::xref::XrefTarget {
                title: "Setup".to_string(),
                url: "/docs/setup/".to_string(),
            },
        );
        md.enable_cross_references(Arc::new(index), None);
        let html = md.convert("See [[docs/setup]].\n");
        assert!(html.contains("<a href=\"/docs/setup/\">Setup</a>"));
    }

    #[test]
    fn meta_description_truncates_at_word_boundary() {
        let long = format!("# T\n\n{}\n", "word ".repeat(60));
        let page = parse_with_toc(&long);
        assert!(page.meta_description.chars().count() <= META_DESCRIPTION_MAX_CHARS);
        assert!(page.meta_description.ends_with('…'));
    }

    #[test]
    fn parse_many_matches_sequential() {
        let sources: Vec<String> = (0..40)
            .map(|i| format!("# Doc {i}\n\nParagraph number {i} with some padding text.\n"))
            .collect();
        let sequential: Vec<String> = sources.iter().map(|s| parse(s)).collect();
        assert_eq!(parse_many(&sources), sequential);
        assert_eq!(parse_many_with_workers(&sources, 3), sequential);
    }
}

//! Directive rendering.
//!
//! Handler dispatch with structural caching: the cache key is computed from
//! the directive's AST (name, title, options, recursive child signature)
//! *before* any rendering, so a cache hit skips child rendering entirely.
//! Page-dependent directives are never cached; their output varies with the
//! page being rendered.

use std::hash::{DefaultHasher, Hash, Hasher};

use crate::ast::{Block, Directive, Inline};
use crate::builder::StringBuilder;
use crate::directives::{DirectiveScope, PAGE_DEPENDENT_DIRECTIVES};
use crate::render::utils::{escape_attr, escape_html};
use crate::render::{HtmlRenderer, RenderEnv};
use crate::request::request;

const CACHE_NAMESPACE: &str = "directive_html";

impl HtmlRenderer {
    pub(crate) fn render_directive(
        &mut self,
        node: &Directive,
        sb: &mut StringBuilder,
        source: &str,
        env: &RenderEnv<'_>,
    ) {
        let registry = self.config.directive_registry.clone();
        let handler = registry.as_ref().and_then(|r| r.get(&node.name)).cloned();

        let cacheable = !PAGE_DEPENDENT_DIRECTIVES.contains(&node.name.as_str())
            && handler.as_ref().map(|h| h.cacheable()).unwrap_or(true);

        let cache_key = match (env.directive_cache, cacheable) {
            (Some(_), true) => Some(directive_cache_key(node)),
            _ => None,
        };
        if let (Some(cache), Some(key)) = (env.directive_cache, cache_key.as_deref()) {
            if let Some(cached) = cache.get(CACHE_NAMESPACE, key) {
                sb.append(&cached);
                return;
            }
        }

        // Cache miss: render children once, in document order.
        let mut children_sb = StringBuilder::new();
        for child in &node.children {
            self.render_block(child, &mut children_sb, source, env);
        }
        let rendered_children = children_sb.build();

        let mut result_sb = StringBuilder::new();
        let mut errored = false;

        match handler {
            Some(handler) => {
                let outcome = {
                    let mut render_block =
                        |block: &Block, out: &mut StringBuilder| self.render_block(block, out, source, env);
                    let mut scope = DirectiveScope {
                        source,
                        env,
                        render_block: &mut render_block,
                    };
                    handler.render(node, &rendered_children, &mut result_sb, &mut scope)
                };
                if let Err(error) = outcome {
                    errored = true;
                    tracing::debug!(directive = %node.name, error = %error, "directive handler failed");
                    if let Some(escalated) =
                        request::report(error, &format!("directive `{}`", node.name))
                    {
                        self.fatal = Some(escalated);
                    }
                    // Conservative fallback around the already-rendered body.
                    result_sb.clear();
                    default_directive_wrapper(node, &rendered_children, &mut result_sb);
                }
            }
            None => default_directive_wrapper(node, &rendered_children, &mut result_sb),
        }

        let result = result_sb.build();
        if !errored {
            if let (Some(cache), Some(key)) = (env.directive_cache, cache_key.as_deref()) {
                cache.put(CACHE_NAMESPACE, key, result.clone());
            }
        }
        sb.append(&result);
    }
}

/// Unknown handlers and failed handlers share one conservative shape.
pub(crate) fn default_directive_wrapper(
    node: &Directive,
    rendered_children: &str,
    out: &mut StringBuilder,
) {
    out.append(&format!(
        "<div class=\"directive directive-{}\">",
        escape_attr(&node.name)
    ));
    if let Some(title) = &node.title {
        out.append(&format!(
            "<p class=\"directive-title\">{}</p>",
            escape_html(title)
        ));
    }
    out.append(rendered_children);
    out.append("</div>\n");
}

/// Structural cache key: name, title, options, and a recursive hash of the
/// children's kinds and content-bearing attributes. No rendering required.
pub(crate) fn directive_cache_key(node: &Directive) -> String {
    let mut hasher = DefaultHasher::new();
    for child in &node.children {
        hash_block(child, &mut hasher);
    }
    format!(
        "{}:{}:{}:{:x}",
        node.name,
        node.title.as_deref().unwrap_or(""),
        node.options.summary(),
        hasher.finish()
    )
}

fn hash_block(block: &Block, hasher: &mut DefaultHasher) {
    match block {
        Block::Heading(n) => {
            "heading".hash(hasher);
            n.level.hash(hasher);
            hash_inlines(&n.children, hasher);
        }
        Block::Paragraph(n) => {
            "paragraph".hash(hasher);
            hash_inlines(&n.children, hasher);
        }
        Block::FencedCode(n) => {
            "fenced_code".hash(hasher);
            n.info.hash(hasher);
            match &n.body {
                crate::ast::CodeBody::Span(span) => {
                    span.start.hash(hasher);
                    span.end.hash(hasher);
                }
                crate::ast::CodeBody::Owned(content) => content.hash(hasher),
            }
        }
        Block::IndentedCode(n) => {
            "indented_code".hash(hasher);
            n.code.hash(hasher);
        }
        Block::BlockQuote(n) => {
            "block_quote".hash(hasher);
            for child in &n.children {
                hash_block(child, hasher);
            }
        }
        Block::List(n) => {
            "list".hash(hasher);
            n.ordered.hash(hasher);
            n.start.hash(hasher);
            n.tight.hash(hasher);
            for item in &n.items {
                item.checked.hash(hasher);
                for child in &item.children {
                    hash_block(child, hasher);
                }
            }
        }
        Block::ThematicBreak(_) => "thematic_break".hash(hasher),
        Block::HtmlBlock(n) => {
            "html_block".hash(hasher);
            n.html.hash(hasher);
        }
        Block::Table(n) => {
            "table".hash(hasher);
            for row in n.head.iter().chain(n.body.iter()) {
                for cell in &row.cells {
                    hash_inlines(&cell.children, hasher);
                }
            }
        }
        Block::MathBlock(n) => {
            "math_block".hash(hasher);
            n.content.hash(hasher);
        }
        Block::FootnoteDef(n) => {
            "footnote_def".hash(hasher);
            n.identifier.hash(hasher);
            for child in &n.children {
                hash_block(child, hasher);
            }
        }
        Block::Directive(n) => {
            "directive".hash(hasher);
            n.name.hash(hasher);
            n.title.hash(hasher);
            n.options.summary().hash(hasher);
            for child in &n.children {
                hash_block(child, hasher);
            }
        }
    }
}

fn hash_inlines(children: &[Inline], hasher: &mut DefaultHasher) {
    for child in children {
        match child {
            Inline::Text(n) => n.content.hash(hasher),
            Inline::CodeSpan(n) => n.code.hash(hasher),
            Inline::Math(n) => n.content.hash(hasher),
            Inline::Link(n) => {
                n.url.hash(hasher);
                hash_inlines(&n.children, hasher);
            }
            Inline::Image(n) => {
                n.url.hash(hasher);
                n.alt.hash(hasher);
            }
            Inline::Emphasis(n) => hash_inlines(&n.children, hasher),
            Inline::Strong(n) => hash_inlines(&n.children, hasher),
            Inline::Strikethrough(n) => hash_inlines(&n.children, hasher),
            Inline::HtmlInline(n) => n.html.hash(hasher),
            Inline::FootnoteRef(n) => n.identifier.hash(hasher),
            Inline::Role(n) => {
                n.name.hash(hasher);
                n.content.hash(hasher);
            }
            Inline::LineBreak => "br".hash(hasher),
            Inline::SoftBreak => "sb".hash(hasher),
        }
    }
}

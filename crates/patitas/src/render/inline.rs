//! Inline dispatch table.
//!
//! A fixed table of function pointers indexed by node variant. The hot path
//! avoids re-deriving behavior per node: one discriminant lookup, one call.
//! Role nodes are intercepted by the renderer before the table is consulted
//! so registered handlers win over the default span rendering.

use crate::ast::Inline;
use crate::builder::StringBuilder;
use crate::metadata::metadata;
use crate::render::HtmlRenderer;
use crate::render::utils::{encode_url, escape_attr, escape_html, escape_link_title};

pub(crate) type InlineHandler = fn(&HtmlRenderer, &Inline, &mut StringBuilder);

/// Variant → table index. Must stay aligned with [`INLINE_DISPATCH`].
pub(crate) fn dispatch_index(node: &Inline) -> usize {
    match node {
        Inline::Text(_) => 0,
        Inline::Emphasis(_) => 1,
        Inline::Strong(_) => 2,
        Inline::Link(_) => 3,
        Inline::Image(_) => 4,
        Inline::CodeSpan(_) => 5,
        Inline::LineBreak => 6,
        Inline::SoftBreak => 7,
        Inline::HtmlInline(_) => 8,
        Inline::Strikethrough(_) => 9,
        Inline::Math(_) => 10,
        Inline::FootnoteRef(_) => 11,
        Inline::Role(_) => 12,
    }
}

pub(crate) static INLINE_DISPATCH: [InlineHandler; 13] = [
    render_text,
    render_emphasis,
    render_strong,
    render_link,
    render_image,
    render_code_span,
    render_line_break,
    render_soft_break,
    render_html_inline,
    render_strikethrough,
    render_math,
    render_footnote_ref,
    render_role_default,
];

fn render_text(renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::Text(text) = node else { return };
    // Transformation happens before escaping so substituted values are still
    // escaped for safety.
    let content = match &renderer.config.text_transformer {
        Some(transform) => transform(&text.content),
        None => text.content.clone(),
    };
    metadata::update(|meta| meta.add_words(&content));
    sb.append(&escape_html(&content));
}

fn render_emphasis(renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::Emphasis(em) = node else { return };
    sb.append("<em>");
    renderer.render_inline_children(&em.children, sb);
    sb.append("</em>");
}

fn render_strong(renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::Strong(strong) = node else { return };
    sb.append("<strong>");
    renderer.render_inline_children(&strong.children, sb);
    sb.append("</strong>");
}

fn render_link(renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::Link(link) = node else { return };
    metadata::update(|meta| {
        if link.url.starts_with("http://") || link.url.starts_with("https://") {
            meta.add_external_link(&link.url);
        } else {
            meta.add_internal_link(&link.url);
        }
    });

    sb.append(&format!("<a href=\"{}\"", encode_url(&link.url)));
    if let Some(title) = &link.title {
        sb.append(&format!(" title=\"{}\"", escape_link_title(title)));
    }
    sb.append(">");
    renderer.render_inline_children(&link.children, sb);
    sb.append("</a>");
}

fn render_image(_renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::Image(image) = node else { return };
    metadata::update(|meta| meta.add_image(&image.url));

    sb.append(&format!(
        "<img src=\"{}\" alt=\"{}\"",
        encode_url(&image.url),
        escape_attr(&image.alt)
    ));
    if let Some(title) = &image.title {
        sb.append(&format!(" title=\"{}\"", escape_link_title(title)));
    }
    sb.append(" />");
}

fn render_code_span(_renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::CodeSpan(code) = node else { return };
    sb.append(&format!("<code>{}</code>", escape_html(&code.code)));
}

fn render_line_break(_renderer: &HtmlRenderer, _node: &Inline, sb: &mut StringBuilder) {
    sb.append("<br />\n");
}

fn render_soft_break(_renderer: &HtmlRenderer, _node: &Inline, sb: &mut StringBuilder) {
    sb.append("\n");
}

fn render_html_inline(_renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::HtmlInline(html) = node else { return };
    sb.append(&html.html);
}

fn render_strikethrough(renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::Strikethrough(strike) = node else {
        return;
    };
    sb.append("<del>");
    renderer.render_inline_children(&strike.children, sb);
    sb.append("</del>");
}

fn render_math(_renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::Math(math) = node else { return };
    metadata::update(|meta| meta.has_math = true);
    sb.append(&format!(
        "<span class=\"math\">{}</span>",
        escape_html(&math.content)
    ));
}

fn render_footnote_ref(_renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::FootnoteRef(footnote) = node else {
        return;
    };
    let identifier = escape_attr(&footnote.identifier);
    sb.append(&format!(
        "<sup class=\"footnote-ref\" id=\"fnref-{identifier}\"><a href=\"#fn-{identifier}\">{}</a></sup>",
        escape_html(&footnote.identifier)
    ));
}

/// Fallback for roles with no registered handler.
fn render_role_default(_renderer: &HtmlRenderer, node: &Inline, sb: &mut StringBuilder) {
    let Inline::Role(role) = node else { return };
    sb.append(&format!(
        "<span class=\"role role-{}\">{}</span>",
        escape_attr(&role.name),
        escape_html(&role.content)
    ));
}

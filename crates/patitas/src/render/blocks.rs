//! Block-level rendering.
//!
//! Output conventions follow CommonMark with XHTML-style void elements
//! (`<hr />`, `<br />`, `<img … />`). Tables are wrapped for horizontal
//! scrolling, footnote definitions collect into a trailing section, and
//! fenced code goes through the zero-copy handoff: mermaid first, then the
//! sub-lexer delegate, then the configured highlighter, then plain
//! `<pre><code>`.

use crate::ast::{Align, Block, FencedCode, FootnoteDef, ListItem, Table, TableRow};
use crate::builder::StringBuilder;
use crate::metadata::metadata;
use crate::parser::inline::decode_entity;
use crate::render::utils::{escape_attr, escape_html, parse_code_info};
use crate::render::{HtmlRenderer, RenderEnv};

impl HtmlRenderer {
    pub(crate) fn render_block(
        &mut self,
        node: &Block,
        sb: &mut StringBuilder,
        source: &str,
        env: &RenderEnv<'_>,
    ) {
        if self.fatal.is_some() {
            return;
        }
        match node {
            Block::Heading(heading) => {
                let text = self.extract_plain_text(&heading.children);
                let slug = match &heading.explicit_id {
                    Some(id) => id.clone(),
                    None => self.unique_slug(&text),
                };
                self.log_heading(heading.level, text, slug.clone());

                sb.append(&format!("<h{} id=\"{}\">", heading.level, slug));
                self.render_inline_children(&heading.children, sb);
                sb.append(&format!("</h{}>\n", heading.level));
            }

            Block::Paragraph(paragraph) => {
                sb.append("<p>");
                self.render_inline_children(&paragraph.children, sb);
                sb.append("</p>\n");
            }

            Block::FencedCode(code) => self.render_fenced_code(code, sb, source, env),

            Block::IndentedCode(code) => {
                metadata::update(|meta| meta.add_code_block(None));
                let mut escaped = escape_html(&code.code).into_owned();
                if !escaped.ends_with('\n') {
                    escaped.push('\n');
                }
                sb.append(&format!("<pre><code>{escaped}</code></pre>\n"));
            }

            Block::BlockQuote(quote) => {
                sb.append("<blockquote>\n");
                for child in &quote.children {
                    self.render_block(child, sb, source, env);
                }
                sb.append("</blockquote>\n");
            }

            Block::List(list) => {
                if list.ordered {
                    if list.start != 1 {
                        sb.append(&format!("<ol start=\"{}\">\n", list.start));
                    } else {
                        sb.append("<ol>\n");
                    }
                } else {
                    sb.append("<ul>\n");
                }

                for item in &list.items {
                    self.render_list_item(item, sb, list.tight, source, env);
                }

                sb.append(if list.ordered { "</ol>\n" } else { "</ul>\n" });
            }

            Block::ThematicBreak(_) => sb.append("<hr />\n"),

            Block::HtmlBlock(html) => {
                sb.append(&html.html);
                if !html.html.ends_with('\n') {
                    sb.append("\n");
                }
            }

            Block::Table(table) => self.render_table(table, sb),

            Block::MathBlock(math) => {
                metadata::update(|meta| meta.has_math = true);
                sb.append("<div class=\"math-block\">\n");
                sb.append(&escape_html(&math.content));
                sb.append("\n</div>\n");
            }

            // Footnote definitions render in the document-end section.
            Block::FootnoteDef(_) => {}

            Block::Directive(directive) => self.render_directive(directive, sb, source, env),
        }
    }

    fn render_list_item(
        &mut self,
        item: &ListItem,
        sb: &mut StringBuilder,
        tight: bool,
        source: &str,
        env: &RenderEnv<'_>,
    ) {
        if let Some(checked) = item.checked {
            sb.append("<li class=\"task-list-item\">");
            let checked_attr = if checked { " checked" } else { "" };
            sb.append(&format!(
                "<input class=\"task-list-item-checkbox\" type=\"checkbox\" disabled{checked_attr}/>"
            ));
        } else {
            sb.append("<li>");
            if item.children.is_empty() {
                sb.append("</li>\n");
                return;
            }
            // Loose items put block children on their own lines. Tight
            // items only do so when the first child is not a paragraph.
            if !tight {
                sb.append("\n");
            } else if !matches!(item.children.first(), Some(Block::Paragraph(_))) {
                sb.append("\n");
            }
        }

        if tight {
            // Tight list: paragraph children render without the <p> wrapper.
            for (idx, child) in item.children.iter().enumerate() {
                if let Block::Paragraph(paragraph) = child {
                    self.render_inline_children(&paragraph.children, sb);
                    let next_is_block = item
                        .children
                        .get(idx + 1)
                        .is_some_and(|next| !matches!(next, Block::Paragraph(_)));
                    if next_is_block {
                        sb.append("\n");
                    }
                } else {
                    self.render_block(child, sb, source, env);
                }
            }
        } else {
            for child in &item.children {
                self.render_block(child, sb, source, env);
            }
        }

        sb.append("</li>\n");
    }

    fn render_table(&mut self, table: &Table, sb: &mut StringBuilder) {
        metadata::update(|meta| meta.has_tables = true);

        // Wrapper enables horizontal scrolling on narrow screens.
        sb.append("<div class=\"table-wrapper\"><table>\n");

        if !table.head.is_empty() {
            sb.append("<thead>\n");
            for row in &table.head {
                self.render_table_row(row, &table.alignments, sb, true);
            }
            sb.append("</thead>\n");
        }

        if !table.body.is_empty() {
            sb.append("<tbody>\n");
            for row in &table.body {
                self.render_table_row(row, &table.alignments, sb, false);
            }
            sb.append("</tbody>\n");
        }

        sb.append("</table></div>");
    }

    fn render_table_row(
        &mut self,
        row: &TableRow,
        alignments: &[Option<Align>],
        sb: &mut StringBuilder,
        is_header: bool,
    ) {
        sb.append("<tr>\n");
        let tag = if is_header { "th" } else { "td" };

        for (idx, cell) in row.cells.iter().enumerate() {
            match alignments.get(idx).copied().flatten() {
                Some(align) => {
                    sb.append(&format!("  <{tag} style=\"text-align: {}\">", align.css()));
                }
                None => sb.append(&format!("  <{tag}>")),
            }
            self.render_inline_children(&cell.children, sb);
            sb.append(&format!("</{tag}>\n"));
        }

        sb.append("</tr>\n");
    }

    pub(crate) fn render_footnotes_section(
        &mut self,
        footnotes: &[&FootnoteDef],
        sb: &mut StringBuilder,
        source: &str,
        env: &RenderEnv<'_>,
    ) {
        sb.append("<section class=\"footnotes\">\n<ol>\n");

        for footnote in footnotes {
            let identifier = escape_attr(&footnote.identifier).into_owned();
            sb.append(&format!("<li id=\"fn-{identifier}\">"));

            for child in &footnote.children {
                if let Block::Paragraph(paragraph) = child {
                    // Inline the back-reference into the paragraph.
                    sb.append("<p>");
                    self.render_inline_children(&paragraph.children, sb);
                    sb.append(&format!(
                        "<a href=\"#fnref-{identifier}\" class=\"footnote\">&#8617;</a>"
                    ));
                    sb.append("</p>");
                } else {
                    self.render_block(child, sb, source, env);
                }
            }

            sb.append("</li>\n");
        }

        sb.append("</ol>\n</section>\n");
    }

    fn render_fenced_code(
        &mut self,
        node: &FencedCode,
        sb: &mut StringBuilder,
        source: &str,
        env: &RenderEnv<'_>,
    ) {
        let lang = node.language();
        metadata::update(|meta| meta.add_code_block(lang.as_deref()));

        if lang.as_deref() == Some("mermaid") {
            sb.append(&format!(
                "<div class=\"mermaid\">{}</div>\n",
                escape_html(node.code(source))
            ));
            return;
        }

        // Sub-lexer delegate gets first claim (spans, never copies).
        if let (Some(delegate), Some(lang)) = (env.delegate, lang.as_deref()) {
            if !node.info.is_empty() && delegate.supports_language(lang) {
                let tokens = match node.body.span() {
                    Some(span) => delegate.tokenize_range(source, span.start, span.end, lang),
                    None => {
                        let owned = node.code(source);
                        delegate.tokenize_range(owned, 0, owned.len(), lang)
                    }
                };
                self.render_highlighted_tokens(&tokens, lang, sb);
                return;
            }
        }

        // Configured highlighter, when enabled and available.
        if self.config.highlight && !node.info.is_empty() {
            if let Some(highlighter) = self.config.highlighter.clone() {
                let (info_lang, hl_lines) = parse_code_info(&node.info);
                if !info_lang.is_empty() {
                    let highlighted = match node.body.span() {
                        Some(span) => {
                            let mut end = span.end;
                            if end > span.start && source.as_bytes().get(end - 1) == Some(&b'\n') {
                                end -= 1;
                            }
                            highlighter.highlight(
                                source,
                                &info_lang,
                                self.config.highlight_style,
                                span.start,
                                end,
                                &hl_lines,
                            )
                        }
                        None => {
                            let owned = node.code(source);
                            let trimmed = owned.strip_suffix('\n').unwrap_or(owned);
                            highlighter.highlight(
                                trimmed,
                                &info_lang,
                                self.config.highlight_style,
                                0,
                                trimmed.len(),
                                &hl_lines,
                            )
                        }
                    };
                    if let Some(fragment) = highlighted {
                        sb.append(&fragment);
                        if !fragment.ends_with('\n') {
                            sb.append("\n");
                        }
                        return;
                    }
                }
            }
        }

        // Plain path: extract via span, escape, emit.
        let mut code = node.code(source);
        if let Some(stripped) = code.strip_suffix('\n') {
            code = stripped;
        }
        sb.append("<pre><code");
        if !node.info.is_empty() {
            // Entities in the info string decode before becoming a class.
            let raw_lang = node.info.split_whitespace().next().unwrap_or_default();
            let decoded = decode_info_word(raw_lang);
            if !decoded.is_empty() {
                sb.append(&format!(" class=\"language-{}\"", escape_attr(&decoded)));
            }
        }
        sb.append(">");
        sb.append(&escape_html(code));
        if code.is_empty() {
            sb.append("</code></pre>\n");
        } else {
            sb.append("\n</code></pre>\n");
        }
    }

    fn render_highlighted_tokens(
        &self,
        tokens: &[crate::protocols::HighlightToken],
        language: &str,
        sb: &mut StringBuilder,
    ) {
        sb.append(&format!(
            "<div class=\"highlight {}\"><pre>",
            self.config.highlight_style.css_class()
        ));
        sb.append(&format!(
            "<code class=\"language-{}\">",
            escape_attr(language)
        ));

        for token in tokens {
            match &token.html {
                Some(html) => sb.append(html),
                None => sb.append(&format!(
                    "<span class=\"token {}\">{}</span>",
                    escape_attr(&token.kind),
                    escape_html(&token.value)
                )),
            }
        }

        sb.append("\n</code></pre></div>\n");
    }

}

/// Decode HTML entities in a single info-string word.
fn decode_info_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let bytes = word.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'&' {
            if let Some((decoded, end)) = decode_entity(word, i) {
                out.push_str(&decoded);
                i = end;
                continue;
            }
        }
        let ch = word[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseConfig;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    fn render(source: &str) -> String {
        let doc = Parser::new().parse_with(source, &ParseConfig::all_extensions());
        HtmlRenderer::new().render(&doc, source)
    }

    #[test]
    fn paragraph() {
        assert_eq!(render("hello\n"), "<p>hello</p>\n");
    }

    #[test]
    fn tight_list() {
        assert_eq!(
            render("- a\n- b\n"),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"
        );
    }

    #[test]
    fn loose_list_wraps_items_in_paragraphs() {
        assert_eq!(
            render("- a\n\n- b\n"),
            "<ul>\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ul>\n"
        );
    }

    #[test]
    fn ordered_list_with_start() {
        let html = render("3. c\n4. d\n");
        assert!(html.starts_with("<ol start=\"3\">\n"));
    }

    #[test]
    fn task_list_items() {
        let html = render("- [x] done\n- [ ] todo\n");
        assert!(html.contains(
            "<li class=\"task-list-item\"><input class=\"task-list-item-checkbox\" type=\"checkbox\" disabled checked/>done</li>"
        ));
        assert!(html.contains(
            "<li class=\"task-list-item\"><input class=\"task-list-item-checkbox\" type=\"checkbox\" disabled/>todo</li>"
        ));
    }

    #[test]
    fn thematic_break_is_self_closing() {
        assert_eq!(render("---\n"), "<hr />\n");
    }

    #[test]
    fn plain_fenced_code_with_language() {
        let html = render("```python\nprint(1)\n```\n");
        assert_eq!(
            html,
            "<pre><code class=\"language-python\">print(1)\n</code></pre>\n"
        );
    }

    #[test]
    fn empty_fenced_code_has_no_trailing_newline() {
        assert_eq!(render("```\n```\n"), "<pre><code></code></pre>\n");
    }

    #[test]
    fn fenced_code_body_is_escaped() {
        let html = render("```\na < b & c\n```\n");
        assert!(html.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn mermaid_renders_div() {
        let html = render("```mermaid\ngraph TD;\n```\n");
        assert_eq!(html, "<div class=\"mermaid\">graph TD;\n</div>\n");
    }

    #[test]
    fn blockquote() {
        assert_eq!(
            render("> quoted\n"),
            "<blockquote>\n<p>quoted</p>\n</blockquote>\n"
        );
    }

    #[test]
    fn table_with_alignment() {
        let html = render("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        assert!(html.starts_with("<div class=\"table-wrapper\"><table>\n<thead>\n"));
        assert!(html.contains("  <th style=\"text-align: left\">a</th>"));
        assert!(html.contains("  <td style=\"text-align: right\">2</td>"));
        assert!(html.ends_with("</table></div>"));
    }

    #[test]
    fn math_block() {
        assert_eq!(
            render("$$\nE = mc^2\n$$\n"),
            "<div class=\"math-block\">\nE = mc^2\n</div>\n"
        );
    }

    #[test]
    fn footnotes_render_in_trailing_section() {
        let html = render("fact[^1]\n\n[^1]: details\n");
        assert!(html.contains("<sup class=\"footnote-ref\" id=\"fnref-1\"><a href=\"#fn-1\">1</a></sup>"));
        assert!(html.contains("<section class=\"footnotes\">"));
        assert!(html.contains("<li id=\"fn-1\"><p>details<a href=\"#fnref-1\" class=\"footnote\">&#8617;</a></p></li>"));
    }

    #[test]
    fn html_block_passes_through_unescaped() {
        let html = render("<div class=\"x\">\n<b>bold</b>\n</div>\n");
        assert!(html.contains("<div class=\"x\">\n<b>bold</b>\n</div>\n"));
    }

    #[test]
    fn indented_code() {
        assert_eq!(
            render("    let x = 1;\n"),
            "<pre><code>let x = 1;\n</code></pre>\n"
        );
    }
}

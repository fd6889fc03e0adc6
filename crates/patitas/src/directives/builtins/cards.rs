//! Card grid directives: `cards` (the grid), `card` (one card), and
//! `child-cards` (auto-generated from the current page's children).

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::contracts::{CARD_CONTRACT, CARDS_CONTRACT, DirectiveContract};
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::protocols::PageRef;
use crate::render::utils::{encode_url, escape_attr, escape_html};

#[derive(Debug, Clone, PartialEq)]
pub struct CardsOptions {
    pub class_: Option<String>,
    pub columns: u8,
}

impl Default for CardsOptions {
    fn default() -> Self {
        Self {
            class_: None,
            columns: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardOptions {
    pub class_: Option<String>,
    pub link: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
}

pub struct CardsDirective;

impl DirectiveHandler for CardsDirective {
    fn names(&self) -> &'static [&'static str] {
        &["cards"]
    }

    fn contract(&self) -> Option<&DirectiveContract> {
        Some(&CARDS_CONTRACT)
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(CardsOptions {
            class_: raw.class().map(str::to_string),
            columns: raw.int("columns").map(|n| n.clamp(1, 6) as u8).unwrap_or(3),
        })
    }

    fn render(
        &self,
        node: &Directive,
        rendered_children: &str,
        out: &mut StringBuilder,
        _scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let opts = node
            .options
            .downcast::<CardsOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = format!("cards cards-columns-{}", opts.columns);
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }
        out.append(&format!("<div class=\"{}\">\n", escape_attr(&classes)));
        out.append(rendered_children);
        out.append("</div>\n");
        Ok(())
    }
}

pub struct CardDirective;

impl DirectiveHandler for CardDirective {
    fn names(&self) -> &'static [&'static str] {
        &["card"]
    }

    fn contract(&self) -> Option<&DirectiveContract> {
        Some(&CARD_CONTRACT)
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(CardOptions {
            class_: raw.class().map(str::to_string),
            link: raw.string("link"),
            icon: raw.string("icon"),
            badge: raw.string("badge"),
        })
    }

    fn render(
        &self,
        node: &Directive,
        rendered_children: &str,
        out: &mut StringBuilder,
        _scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let opts = node
            .options
            .downcast::<CardOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = "card".to_string();
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }

        let (open_tag, close_tag) = match &opts.link {
            Some(link) => (
                format!(
                    "<a class=\"{}\" href=\"{}\">",
                    escape_attr(&classes),
                    encode_url(link)
                ),
                "</a>",
            ),
            None => (format!("<div class=\"{}\">", escape_attr(&classes)), "</div>"),
        };

        out.append(&open_tag);
        out.append("\n");
        if let Some(icon) = &opts.icon {
            out.append(&format!(
                "<span class=\"card-icon icon icon-{}\" aria-hidden=\"true\"></span>\n",
                escape_attr(icon)
            ));
        }
        if let Some(title) = &node.title {
            out.append(&format!(
                "<div class=\"card-title\">{}",
                escape_html(title)
            ));
            if let Some(badge) = &opts.badge {
                out.append(&format!(
                    "<span class=\"card-badge\">{}</span>",
                    escape_html(badge)
                ));
            }
            out.append("</div>\n");
        }
        out.append("<div class=\"card-body\">\n");
        out.append(rendered_children);
        out.append("</div>\n");
        out.append(close_tag);
        out.append("\n");
        Ok(())
    }
}

/// Auto-generated card grid from the current page's children. Output varies
/// by page, so this never enters the directive cache.
pub struct ChildCardsDirective;

impl DirectiveHandler for ChildCardsDirective {
    fn names(&self) -> &'static [&'static str] {
        &["child-cards"]
    }

    fn cacheable(&self) -> bool {
        false
    }

    fn render(
        &self,
        _node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let Some(page) = scope.env.page else {
            out.append("<div class=\"cards cards-columns-3\"></div>\n");
            return Ok(());
        };

        out.append("<div class=\"cards cards-columns-3\">\n");
        for child in &page.children {
            render_page_card(child, out);
        }
        out.append("</div>\n");
        Ok(())
    }
}

fn render_page_card(page: &PageRef, out: &mut StringBuilder) {
    out.append(&format!(
        "<a class=\"card\" href=\"{}\">\n",
        encode_url(&page.url)
    ));
    if let Some(icon) = &page.icon {
        out.append(&format!(
            "<span class=\"card-icon icon icon-{}\" aria-hidden=\"true\"></span>\n",
            escape_attr(icon)
        ));
    }
    out.append(&format!(
        "<div class=\"card-title\">{}</div>\n",
        escape_html(&page.title)
    ));
    if let Some(description) = &page.description {
        out.append(&format!(
            "<div class=\"card-body\"><p>{}</p></div>\n",
            escape_html(description)
        ));
    }
    out.append("</a>\n");
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;
    use crate::protocols::{PageContext, PageRef};
    use crate::render::RenderEnv;

    #[test]
    fn card_grid_with_links() {
        let md = create_markdown();
        let html = md.convert(
            "::::{cards}\n:columns: 2\n\n:::{card} Getting Started\n:link: /docs/start/\n\nIntro.\n:::\n\n::::\n",
        );
        assert!(html.contains("class=\"cards cards-columns-2\""));
        assert!(html.contains("<a class=\"card\" href=\"/docs/start/\">"));
        assert!(html.contains("<div class=\"card-title\">Getting Started</div>"));
    }

    #[test]
    fn child_cards_render_from_page_context() {
        let md = create_markdown();
        let page = PageContext {
            title: "Guides".to_string(),
            url: "/guides/".to_string(),
            children: vec![PageRef {
                title: "First Steps".to_string(),
                url: "/guides/first/".to_string(),
                description: Some("Start here".to_string()),
                icon: None,
            }],
            ..PageContext::default()
        };
        let env = RenderEnv {
            page: Some(&page),
            ..RenderEnv::empty()
        };
        let html = md.convert_with(":::{child-cards}\n:::\n", None, &env);
        assert!(html.contains("href=\"/guides/first/\""));
        assert!(html.contains("First Steps"));
    }
}

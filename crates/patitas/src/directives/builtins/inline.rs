//! Small block-level helpers: badge, icon, rubric, target.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions, StyledOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{escape_attr, escape_html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BadgeOptions {
    pub class_: Option<String>,
    pub color: Option<String>,
}

/// `:::{badge} New` with an optional `:color:`.
pub struct BadgeDirective;

impl DirectiveHandler for BadgeDirective {
    fn names(&self) -> &'static [&'static str] {
        &["badge"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(BadgeOptions {
            class_: raw.class().map(str::to_string),
            color: raw.string("color"),
        })
    }

    fn render(
        &self,
        node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        _scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        eprintln!("RENDER BADGE node.options = {:?}", node.options);
        let opts = node
            .options
            .downcast::<BadgeOptions>()
            .cloned()
            .unwrap_or_default();
        eprintln!("RENDER BADGE opts = {:?}", opts);
        let mut classes = "badge".to_string();
        if let Some(color) = &opts.color {
            classes.push_str(" badge-");
            classes.push_str(color);
        }
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }
        out.append(&format!(
            "<span class=\"{}\">{}</span>\n",
            escape_attr(&classes),
            escape_html(node.title.as_deref().unwrap_or(""))
        ));
        Ok(())
    }
}

/// `:::{icon} rocket` — a named icon slot for the theme.
pub struct IconDirective;

impl DirectiveHandler for IconDirective {
    fn names(&self) -> &'static [&'static str] {
        &["icon"]
    }

    fn render(
        &self,
        node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        _scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let name = node.title.as_deref().map(str::trim).unwrap_or("");
        out.append(&format!(
            "<span class=\"icon icon-{}\" aria-hidden=\"true\"></span>\n",
            escape_attr(name)
        ));
        Ok(())
    }
}

/// `:::{rubric} Heading-like label` — a heading outside the TOC.
pub struct RubricDirective;

impl DirectiveHandler for RubricDirective {
    fn names(&self) -> &'static [&'static str] {
        &["rubric"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(StyledOptions::from_raw(raw))
    }

    fn render(
        &self,
        node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        _scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        out.append(&format!(
            "<p class=\"rubric\">{}</p>\n",
            escape_html(node.title.as_deref().unwrap_or(""))
        ));
        Ok(())
    }
}

/// `:::{target} anchor-id` — an invisible link target, addressable as
/// `[[!anchor-id]]`.
pub struct TargetDirective;

impl DirectiveHandler for TargetDirective {
    fn names(&self) -> &'static [&'static str] {
        &["target"]
    }

    fn render(
        &self,
        node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        _scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let anchor = node.title.as_deref().map(str::trim).unwrap_or("");
        out.append(&format!(
            "<span id=\"{}\" class=\"anchor-target\"></span>\n",
            escape_attr(anchor)
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;

    #[test]
    fn badge_with_color() {
        let md = create_markdown();
        let html = md.convert(":::{badge} New\n:color: green\n:::\n");
        assert!(html.contains("<span class=\"badge badge-green\">New</span>"));
    }

    #[test]
    fn target_emits_anchor() {
        let md = create_markdown();
        let html = md.convert(":::{target} install-section\n:::\n");
        assert!(html.contains("<span id=\"install-section\" class=\"anchor-target\"></span>"));
    }

    #[test]
    fn rubric_is_not_a_heading() {
        let md = create_markdown();
        let html = md.convert(":::{rubric} Footnotes\n:::\n");
        assert!(html.contains("<p class=\"rubric\">Footnotes</p>"));
        assert!(!html.contains("<h"));
    }
}

//! Dropdown directive: collapsible content with an optional icon and color.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{escape_attr, escape_html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropdownOptions {
    pub class_: Option<String>,
    pub open: bool,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl DropdownOptions {
    fn from_raw(raw: &RawOptions) -> Self {
        Self {
            class_: raw.class().map(str::to_string),
            open: raw.flag("open"),
            icon: raw.string("icon"),
            color: raw.string("color"),
        }
    }
}

pub struct DropdownDirective;

impl DirectiveHandler for DropdownDirective {
    fn names(&self) -> &'static [&'static str] {
        &["dropdown"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(DropdownOptions::from_raw(raw))
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
            .downcast::<DropdownOptions>()
            .cloned()
            .unwrap_or_else(|| DropdownOptions::from_raw(&node.options.raw));

        let mut classes = "dropdown".to_string();
        if let Some(color) = &opts.color {
            classes.push_str(" dropdown-");
            classes.push_str(color);
        }
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }
        let open_attr = if opts.open { " open" } else { "" };

        out.append(&format!(
            "<details class=\"{}\"{open_attr}>\n",
            escape_attr(&classes)
        ));
        out.append("<summary>");
        if let Some(icon) = &opts.icon {
            out.append(&format!(
                "<span class=\"icon icon-{}\" aria-hidden=\"true\"></span>",
                escape_attr(icon)
            ));
        }
        out.append(&escape_html(node.title.as_deref().unwrap_or("Details")));
        out.append("</summary>\n");
        out.append(rendered_children);
        out.append("</details>\n");
        Ok(())
    }
}

//! Checklist directive: a styled wrapper around bullet/task lists with
//! optional progress tracking.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{escape_attr, escape_html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecklistOptions {
    pub class_: Option<String>,
    pub style: Option<String>,
    pub show_progress: bool,
}

pub struct ChecklistDirective;

impl DirectiveHandler for ChecklistDirective {
    fn names(&self) -> &'static [&'static str] {
        &["checklist"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(ChecklistOptions {
            class_: raw.class().map(str::to_string),
            style: raw.string("style"),
            show_progress: raw.flag("show-progress"),
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
            .downcast::<ChecklistOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = "checklist".to_string();
        if let Some(style) = opts.style.as_deref().filter(|s| *s != "default") {
            classes.push_str(" checklist-");
            classes.push_str(style);
        }
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }

        out.append(&format!("<div class=\"{}\">\n", escape_attr(&classes)));
        if let Some(title) = &node.title {
            out.append(&format!(
                "<div class=\"checklist-title\">{}</div>\n",
                escape_html(title)
            ));
        }
        if opts.show_progress {
            // Counted from the rendered task items: done vs total.
            let total = rendered_children.matches("task-list-item-checkbox").count();
            let done = rendered_children.matches(" disabled checked/>").count();
            out.append(&format!(
                "<div class=\"checklist-progress\" data-done=\"{done}\" data-total=\"{total}\">{done}/{total}</div>\n"
            ));
        }
        out.append(rendered_children);
        out.append("</div>\n");
        Ok(())
    }
}

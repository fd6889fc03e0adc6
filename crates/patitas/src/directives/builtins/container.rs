//! Container directive: a bare wrapper div with custom classes.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions, StyledOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::escape_attr;

pub struct ContainerDirective;

impl DirectiveHandler for ContainerDirective {
    fn names(&self) -> &'static [&'static str] {
        &["container"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(StyledOptions::from_raw(raw))
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
            .downcast::<StyledOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = "container".to_string();
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }
        // The title doubles as extra classes, matching common usage
        // `:::{container} hero centered`.
        if let Some(title) = &node.title {
            classes.push(' ');
            classes.push_str(title);
        }

        let id_attr = match &opts.name {
            Some(name) => format!(" id=\"{}\"", escape_attr(name)),
            None => String::new(),
        };

        out.append(&format!(
            "<div class=\"{}\"{id_attr}>\n",
            escape_attr(&classes)
        ));
        out.append(rendered_children);
        out.append("</div>\n");
        Ok(())
    }
}

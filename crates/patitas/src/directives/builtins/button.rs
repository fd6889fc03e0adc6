//! Button directive: a styled link.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{encode_url, escape_attr, escape_html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonOptions {
    pub class_: Option<String>,
    pub link: Option<String>,
    pub color: Option<String>,
    pub outline: bool,
}

pub struct ButtonDirective;

impl DirectiveHandler for ButtonDirective {
    fn names(&self) -> &'static [&'static str] {
        &["button"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(ButtonOptions {
            class_: raw.class().map(str::to_string),
            link: raw.string("link"),
            color: raw.string("color"),
            outline: raw.flag("outline"),
        })
    }

    fn render(
        &self,
        node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        _scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let opts = node
            .options
            .downcast::<ButtonOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = "btn".to_string();
        if let Some(color) = &opts.color {
            classes.push_str(if opts.outline { " btn-outline-" } else { " btn-" });
            classes.push_str(color);
        } else if opts.outline {
            classes.push_str(" btn-outline");
        }
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }

        let label = escape_html(node.title.as_deref().unwrap_or("")).into_owned();
        match &opts.link {
            Some(link) => out.append(&format!(
                "<a class=\"{}\" href=\"{}\">{label}</a>\n",
                escape_attr(&classes),
                encode_url(link)
            )),
            None => out.append(&format!(
                "<button class=\"{}\" type=\"button\">{label}</button>\n",
                escape_attr(&classes)
            )),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;

    #[test]
    fn linked_button_is_an_anchor() {
        let md = create_markdown();
        let html = md.convert(":::{button} Get Started\n:link: /docs/\n:color: primary\n:::\n");
        assert!(html.contains("<a class=\"btn btn-primary\" href=\"/docs/\">Get Started</a>"));
    }
}

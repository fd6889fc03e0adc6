//! Admonition directives.
//!
//! One handler claims the whole family:
//!
//! ```text
//! :::{warning} Optional Title
//! :class: extra-class
//! :collapsible:
//!
//! Body in full Markdown.
//! :::
//! ```
//!
//! Collapsible admonitions render as `<details>`; plain ones as a div with
//! a title paragraph.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{escape_attr, escape_html};

const ADMONITION_NAMES: &[&str] = &[
    "note", "tip", "warning", "danger", "error", "info", "example", "success", "caution",
    "seealso",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdmonitionOptions {
    pub class_: Option<String>,
    pub name: Option<String>,
    pub collapsible: bool,
    pub open: bool,
}

impl AdmonitionOptions {
    pub fn from_raw(raw: &RawOptions) -> Self {
        Self {
            class_: raw.class().map(str::to_string),
            name: raw.string("name"),
            collapsible: raw.flag("collapsible"),
            open: raw.flag("open"),
        }
    }
}

fn default_title(name: &str) -> String {
    if name == "seealso" {
        return "See also".to_string();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct AdmonitionDirective;

impl DirectiveHandler for AdmonitionDirective {
    fn names(&self) -> &'static [&'static str] {
        ADMONITION_NAMES
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(AdmonitionOptions::from_raw(raw))
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
            .downcast::<AdmonitionOptions>()
            .cloned()
            .unwrap_or_else(|| AdmonitionOptions::from_raw(&node.options.raw));

        let title = node
            .title
            .clone()
            .unwrap_or_else(|| default_title(&node.name));

        let mut classes = format!("admonition {}", node.name);
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }

        let id_attr = match &opts.name {
            Some(name) => format!(" id=\"{}\"", escape_attr(name)),
            None => String::new(),
        };

        if opts.collapsible {
            let open_attr = if opts.open { " open" } else { "" };
            out.append(&format!(
                "<details class=\"{}\"{id_attr}{open_attr}>\n",
                escape_attr(&classes)
            ));
            out.append(&format!(
                "<summary class=\"admonition-title\">{}</summary>\n",
                escape_html(&title)
            ));
            out.append(rendered_children);
            out.append("</details>\n");
        } else {
            out.append(&format!(
                "<div class=\"{}\"{id_attr}>\n",
                escape_attr(&classes)
            ));
            out.append(&format!(
                "<p class=\"admonition-title\">{}</p>\n",
                escape_html(&title)
            ));
            out.append(rendered_children);
            out.append("</div>\n");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseConfig;
    use crate::parser::Parser;
    use crate::render::HtmlRenderer;
    use crate::render_config::{RenderConfig, render_config};
    use pretty_assertions::assert_eq;

    fn render_with_registry(source: &str) -> String {
        let registry = crate::directives::create_default_registry();
        let config = ParseConfig {
            directive_registry: Some(registry.clone()),
            ..ParseConfig::default()
        };
        let doc = Parser::new().parse_with(source, &config);
        render_config::with(
            RenderConfig {
                directive_registry: Some(registry),
                ..RenderConfig::default()
            },
            || HtmlRenderer::new().render(&doc, source),
        )
    }

    #[test]
    fn note_with_default_title() {
        let html = render_with_registry(":::{note}\nBody.\n:::\n");
        assert_eq!(
            html,
            "<div class=\"admonition note\">\n<p class=\"admonition-title\">Note</p>\n<p>Body.</p>\n</div>\n"
        );
    }

    #[test]
    fn custom_title_and_class() {
        let html = render_with_registry(":::{warning} Careful Now\n:class: spicy\n\nBody.\n:::\n");
        assert!(html.contains("class=\"admonition warning spicy\""));
        assert!(html.contains("<p class=\"admonition-title\">Careful Now</p>"));
    }

    #[test]
    fn collapsible_renders_details() {
        let html = render_with_registry(":::{tip}\n:collapsible:\n:open:\n\nBody.\n:::\n");
        assert!(html.starts_with("<details class=\"admonition tip\" open>\n"));
        assert!(html.contains("<summary class=\"admonition-title\">Tip</summary>"));
        assert!(html.ends_with("</details>\n"));
    }

    #[test]
    fn seealso_title_is_two_words() {
        let html = render_with_registry(":::{seealso}\nBody.\n:::\n");
        assert!(html.contains(">See also</p>"));
    }

    #[test]
    fn typed_options_are_attached_at_parse_time() {
        let registry = crate::directives::create_default_registry();
        let config = ParseConfig {
            directive_registry: Some(registry),
            ..ParseConfig::default()
        };
        let doc = Parser::new().parse_with(
            ":::{note}\n:class: custom-class\n:name: my-note\n\nContent.\n:::\n",
            &config,
        );
        let crate::ast::Block::Directive(directive) = &doc.children[0] else {
            panic!()
        };
        let opts = directive.options.downcast::<AdmonitionOptions>().unwrap();
        assert_eq!(opts.class_.as_deref(), Some("custom-class"));
        assert_eq!(opts.name.as_deref(), Some("my-note"));
    }
}

//! Tab directives.
//!
//! `tab-set` contains only `tab-item` children (enforced by contract);
//! `tab-item` must live inside a `tab-set`. The `:sync:` option groups tabs
//! across sets so the theme can switch them together.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::contracts::{DirectiveContract, TAB_ITEM_CONTRACT, TAB_SET_CONTRACT};
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{escape_attr, escape_html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabSetOptions {
    pub class_: Option<String>,
    pub sync: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabItemOptions {
    pub class_: Option<String>,
    pub sync: Option<String>,
    pub selected: bool,
}

pub struct TabSetDirective;

impl DirectiveHandler for TabSetDirective {
    fn names(&self) -> &'static [&'static str] {
        &["tab-set"]
    }

    fn contract(&self) -> Option<&DirectiveContract> {
        Some(&TAB_SET_CONTRACT)
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(TabSetOptions {
            class_: raw.class().map(str::to_string),
            sync: raw.string("sync"),
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
            .downcast::<TabSetOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = "tab-set".to_string();
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }
        let sync_attr = match &opts.sync {
            Some(group) => format!(" data-sync-group=\"{}\"", escape_attr(group)),
            None => String::new(),
        };

        out.append(&format!(
            "<div class=\"{}\"{sync_attr}>\n",
            escape_attr(&classes)
        ));
        out.append(rendered_children);
        out.append("</div>\n");
        Ok(())
    }
}

pub struct TabItemDirective;

impl DirectiveHandler for TabItemDirective {
    fn names(&self) -> &'static [&'static str] {
        &["tab-item"]
    }

    fn contract(&self) -> Option<&DirectiveContract> {
        Some(&TAB_ITEM_CONTRACT)
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(TabItemOptions {
            class_: raw.class().map(str::to_string),
            sync: raw.string("sync"),
            selected: raw.flag("selected"),
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
            .downcast::<TabItemOptions>()
            .cloned()
            .unwrap_or_default();

        let label = node.title.as_deref().unwrap_or("Tab");
        let mut classes = "tab-item".to_string();
        if opts.selected {
            classes.push_str(" tab-item-selected");
        }
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }
        let sync_attr = match &opts.sync {
            Some(key) => format!(" data-sync=\"{}\"", escape_attr(key)),
            None => String::new(),
        };

        out.append(&format!(
            "<div class=\"{}\" data-label=\"{}\"{sync_attr}>\n",
            escape_attr(&classes),
            escape_attr(label)
        ));
        out.append(&format!(
            "<div class=\"tab-label\">{}</div>\n",
            escape_html(label)
        ));
        out.append("<div class=\"tab-content\">\n");
        out.append(rendered_children);
        out.append("</div>\n</div>\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;
    use crate::error::ViolationKind;
    use crate::config::{ParseConfig, parse_config};
    use crate::parser::Parser;

    #[test]
    fn tab_set_renders_items_with_labels() {
        let md = create_markdown();
        let html = md.convert(
            "::::{tab-set}\n\n:::{tab-item} Python\npip install\n:::\n\n:::{tab-item} Rust\ncargo add\n:::\n\n::::\n",
        );
        assert!(html.contains("class=\"tab-set\""));
        assert!(html.contains("data-label=\"Python\""));
        assert!(html.contains("data-label=\"Rust\""));
        assert!(html.contains("cargo add"));
    }

    #[test]
    fn orphan_tab_item_violates_contract() {
        let config = ParseConfig {
            directive_registry: Some(crate::directives::create_default_registry()),
            ..ParseConfig::default()
        };
        let violations = parse_config::with(config.clone(), || {
            let mut parser = Parser::new();
            parser.parse_with(":::{tab-item} Lonely\nBody.\n:::\n", &config);
            parser.violations().to_vec()
        });
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::MissingParent));
    }
}

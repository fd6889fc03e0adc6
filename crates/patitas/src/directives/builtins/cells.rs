//! Executable code cells (marimo).
//!
//! Cells are opaque to the core: the body renders normally (usually a fenced
//! code block) inside a wrapper the host runtime hydrates into an
//! interactive cell. Execution never happens here.

use std::sync::Arc;

use crate::ast::{Block, Directive};
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::escape_attr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarimoOptions {
    pub class_: Option<String>,
    pub editable: bool,
    pub show_code: bool,
}

pub struct MarimoDirective;

impl DirectiveHandler for MarimoDirective {
    fn names(&self) -> &'static [&'static str] {
        &["marimo"]
    }

    fn cacheable(&self) -> bool {
        // Cell ids must stay unique per page render.
        false
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(MarimoOptions {
            class_: raw.class().map(str::to_string),
            editable: raw.flag("editable"),
            show_code: raw.get("show-code").map(crate::directives::options::coerce_bool).unwrap_or(true),
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
            .downcast::<MarimoOptions>()
            .cloned()
            .unwrap_or_default();

        let language = node
            .children
            .iter()
            .find_map(|child| match child {
                Block::FencedCode(code) => code.language(),
                _ => None,
            })
            .unwrap_or_else(|| "python".to_string());

        let mut classes = "marimo-cell".to_string();
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }

        out.append(&format!(
            "<div class=\"{}\" data-language=\"{}\" data-editable=\"{}\" data-show-code=\"{}\">\n",
            escape_attr(&classes),
            escape_attr(&language),
            opts.editable,
            opts.show_code
        ));
        out.append(rendered_children);
        out.append("</div>\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;

    #[test]
    fn cell_wraps_code_with_language() {
        let md = create_markdown();
        let html = md.convert(":::{marimo}\n:editable:\n\n```python\nx = 1\n```\n:::\n");
        assert!(html.contains("class=\"marimo-cell\""));
        assert!(html.contains("data-language=\"python\""));
        assert!(html.contains("data-editable=\"true\""));
        assert!(html.contains("class=\"language-python\""));
    }
}

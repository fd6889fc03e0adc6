//! Code tabs: tabbed code blocks for multi-language examples.
//!
//! ````text
//! :::{code-tabs}
//!
//! ```python app.py
//! print("hi")
//! ```
//!
//! ```javascript index.js
//! console.log("hi");
//! ```
//!
//! :::
//! ````
//!
//! Tab labels come from the fence language; a second info-string word
//! becomes a filename badge; `:sync:` groups panes by language across the
//! page.

use std::sync::Arc;

use crate::ast::{Block, Directive};
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{escape_attr, escape_html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeTabsOptions {
    pub class_: Option<String>,
    pub sync: bool,
}

pub struct CodeTabsDirective;

impl DirectiveHandler for CodeTabsDirective {
    fn names(&self) -> &'static [&'static str] {
        &["code-tabs"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(CodeTabsOptions {
            class_: raw.class().map(str::to_string),
            sync: raw.flag("sync"),
        })
    }

    fn render(
        &self,
        node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let opts = node
            .options
            .downcast::<CodeTabsOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = "code-tabs".to_string();
        if opts.sync {
            classes.push_str(" code-tabs-sync");
        }
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }
        out.append(&format!("<div class=\"{}\">\n", escape_attr(&classes)));

        for child in &node.children {
            match child {
                Block::FencedCode(code) => {
                    let lang = code.language().unwrap_or_else(|| "text".to_string());
                    let filename = code.info.split_whitespace().nth(1).filter(|w| !w.starts_with('{'));

                    out.append(&format!(
                        "<div class=\"code-tab\" data-lang=\"{}\"",
                        escape_attr(&lang)
                    ));
                    if let Some(filename) = filename {
                        out.append(&format!(" data-filename=\"{}\"", escape_attr(filename)));
                    }
                    out.append(">\n");
                    out.append(&format!(
                        "<div class=\"code-tab-label\">{}",
                        escape_html(&lang)
                    ));
                    if let Some(filename) = filename {
                        out.append(&format!(
                            "<span class=\"code-tab-filename\">{}</span>",
                            escape_html(filename)
                        ));
                    }
                    out.append("</div>\n");
                    (scope.render_block)(child, out);
                    out.append("</div>\n");
                }
                other => (scope.render_block)(other, out),
            }
        }

        out.append("</div>\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;

    #[test]
    fn panes_are_labelled_by_language() {
        let md = create_markdown();
        let html = md.convert(
            ":::{code-tabs}\n\n```python app.py\nprint(1)\n```\n\n```javascript\nconsole.log(1)\n```\n\n:::\n",
        );
        assert!(html.contains("class=\"code-tabs\""));
        assert!(html.contains("data-lang=\"python\""));
        assert!(html.contains("data-filename=\"app.py\""));
        assert!(html.contains("data-lang=\"javascript\""));
        assert!(html.contains("class=\"language-python\""));
    }
}

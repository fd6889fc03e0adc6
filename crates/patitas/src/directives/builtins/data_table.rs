//! Data-table directive: a table shell hydrated by the host.
//!
//! The heavy lifting (loading CSV/JSON site data, sorting, pagination)
//! belongs to the host; the core emits a container carrying the options as
//! data attributes plus any authored fallback content.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::{escape_attr, escape_html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTableOptions {
    pub class_: Option<String>,
    pub source: Option<String>,
    pub sortable: bool,
    pub searchable: bool,
    pub page_size: Option<u32>,
}

pub struct DataTableDirective;

impl DirectiveHandler for DataTableDirective {
    fn names(&self) -> &'static [&'static str] {
        &["data-table"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(DataTableOptions {
            class_: raw.class().map(str::to_string),
            source: raw.string("source"),
            sortable: raw.flag("sortable"),
            searchable: raw.flag("searchable"),
            page_size: raw.int("page-size").map(|n| n.clamp(1, 1000) as u32),
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
            .downcast::<DataTableOptions>()
            .cloned()
            .unwrap_or_default();

        let mut classes = "data-table".to_string();
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }

        out.append(&format!("<div class=\"{}\"", escape_attr(&classes)));
        if let Some(source) = &opts.source {
            out.append(&format!(" data-source=\"{}\"", escape_attr(source)));
        }
        if opts.sortable {
            out.append(" data-sortable=\"true\"");
        }
        if opts.searchable {
            out.append(" data-searchable=\"true\"");
        }
        if let Some(page_size) = opts.page_size {
            out.append(&format!(" data-page-size=\"{page_size}\""));
        }
        out.append(">\n");
        if let Some(title) = &node.title {
            out.append(&format!(
                "<div class=\"data-table-title\">{}</div>\n",
                escape_html(title)
            ));
        }
        out.append(rendered_children);
        out.append("</div>\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;

    #[test]
    fn options_become_data_attributes() {
        let md = create_markdown();
        let html =
            md.convert(":::{data-table} Releases\n:source: data/releases.json\n:sortable:\n:::\n");
        assert!(html.contains("data-source=\"data/releases.json\""));
        assert!(html.contains("data-sortable=\"true\""));
        assert!(html.contains("data-table-title\">Releases"));
    }
}

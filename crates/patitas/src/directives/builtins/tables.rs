//! `list-table`: MyST-style tables built from nested lists.
//!
//! ```text
//! :::{list-table}
//! :header-rows: 1
//! :widths: 30 70
//!
//! * - Name
//!   - Purpose
//! * - lexer
//!   - line classification
//! :::
//! ```
//!
//! Each top-level item is a row; its nested list holds the cells. Useful
//! for tables whose cells would fight the pipe syntax.

use std::sync::Arc;

use crate::ast::{Block, Directive};
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::escape_attr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListTableOptions {
    pub class_: Option<String>,
    pub header_rows: usize,
    pub widths: Vec<u32>,
}

pub struct ListTableDirective;

impl DirectiveHandler for ListTableDirective {
    fn names(&self) -> &'static [&'static str] {
        &["list-table"]
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(ListTableOptions {
            class_: raw.class().map(str::to_string),
            header_rows: raw.int("header-rows").map(|n| n.max(0) as usize).unwrap_or(0),
            widths: raw
                .get("widths")
                .map(|spec| spec.split_whitespace().filter_map(|w| w.parse().ok()).collect())
                .unwrap_or_default(),
        })
    }

    fn render(
        &self,
        node: &Directive,
        rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let opts = node
            .options
            .downcast::<ListTableOptions>()
            .cloned()
            .unwrap_or_default();

        // The body must be a single list of rows; anything else falls back
        // to the rendered children unchanged.
        let rows: Vec<&crate::ast::ListItem> = match node.children.iter().find_map(|child| {
            if let Block::List(list) = child {
                Some(&list.items)
            } else {
                None
            }
        }) {
            Some(items) => items.iter().collect(),
            None => {
                out.append(rendered_children);
                return Ok(());
            }
        };

        let mut classes = "list-table".to_string();
        if let Some(extra) = &opts.class_ {
            classes.push(' ');
            classes.push_str(extra);
        }

        out.append(&format!(
            "<div class=\"table-wrapper\"><table class=\"{}\">\n",
            escape_attr(&classes)
        ));
        if !opts.widths.is_empty() {
            let total: u32 = opts.widths.iter().sum::<u32>().max(1);
            out.append("<colgroup>\n");
            for width in &opts.widths {
                out.append(&format!(
                    "<col style=\"width: {}%\" />\n",
                    width * 100 / total
                ));
            }
            out.append("</colgroup>\n");
        }

        for (row_idx, row) in rows.iter().enumerate() {
            let is_header = row_idx < opts.header_rows;
            if row_idx == 0 && is_header {
                out.append("<thead>\n");
            }
            if row_idx == opts.header_rows {
                if opts.header_rows > 0 {
                    out.append("</thead>\n");
                }
                out.append("<tbody>\n");
            }

            out.append("<tr>\n");
            let tag = if is_header { "th" } else { "td" };
            // Cells are the items of the row's nested list.
            for cell_source in row.children.iter() {
                if let Block::List(cells) = cell_source {
                    for cell in &cells.items {
                        out.append(&format!("<{tag}>"));
                        for block in &cell.children {
                            (scope.render_block)(block, out);
                        }
                        out.append(&format!("</{tag}>\n"));
                    }
                }
            }
            out.append("</tr>\n");
        }

        if rows.len() <= opts.header_rows {
            if opts.header_rows > 0 {
                out.append("</thead>\n");
            }
        } else {
            out.append("</tbody>\n");
        }
        out.append("</table></div>\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;

    #[test]
    fn rows_and_header_from_nested_lists() {
        let md = create_markdown();
        let html = md.convert(
            ":::{list-table}\n:header-rows: 1\n\n* - Name\n  - Purpose\n* - lexer\n  - scanning\n:::\n",
        );
        assert!(html.contains("<table class=\"list-table\">"));
        assert!(html.contains("<th>"));
        assert!(html.contains("Purpose"));
        assert!(html.contains("<td>"));
        assert!(html.contains("scanning"));
    }
}

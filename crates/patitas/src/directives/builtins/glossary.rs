//! Glossary directive: definition lists from host-supplied site data.
//!
//! ```text
//! :::{glossary}
//! :tags: parsing, rendering
//! :sorted: true
//! :::
//! ```
//!
//! The term data comes from `SiteContext.glossary`; without site context the
//! directive renders an empty list. Output depends on site data, so it is
//! never cached.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::protocols::GlossaryTerm;
use crate::render::utils::{escape_attr, escape_html};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlossaryOptions {
    pub tags: Vec<String>,
    pub sorted: bool,
    pub show_tags: bool,
    pub collapsed: bool,
    pub limit: usize,
}

pub struct GlossaryDirective;

impl DirectiveHandler for GlossaryDirective {
    fn names(&self) -> &'static [&'static str] {
        &["glossary"]
    }

    fn cacheable(&self) -> bool {
        false
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(GlossaryOptions {
            tags: raw
                .get("tags")
                .map(|spec| {
                    spec.split(',')
                        .map(|tag| tag.trim().to_string())
                        .filter(|tag| !tag.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            sorted: raw.flag("sorted"),
            show_tags: raw.flag("show-tags"),
            collapsed: raw.flag("collapsed"),
            limit: raw.int("limit").map(|n| n.max(0) as usize).unwrap_or(0),
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
            .downcast::<GlossaryOptions>()
            .cloned()
            .unwrap_or_default();

        let mut terms: Vec<&GlossaryTerm> = match scope.env.site {
            Some(site) => site
                .glossary
                .iter()
                .filter(|term| {
                    opts.tags.is_empty()
                        || term.tags.iter().any(|tag| opts.tags.contains(tag))
                })
                .collect(),
            None => Vec::new(),
        };

        if opts.sorted {
            terms.sort_by(|a, b| a.term.to_lowercase().cmp(&b.term.to_lowercase()));
        }
        if opts.limit > 0 {
            terms.truncate(opts.limit);
        }

        if opts.collapsed {
            out.append("<details class=\"glossary-wrapper\">\n<summary>Glossary</summary>\n");
        }
        out.append("<dl class=\"glossary\">\n");
        for term in terms {
            out.append(&format!("<dt>{}</dt>\n", escape_html(&term.term)));
            out.append("<dd>");
            out.append(&escape_html(&term.definition));
            if opts.show_tags && !term.tags.is_empty() {
                out.append("<span class=\"glossary-tags\">");
                for tag in &term.tags {
                    out.append(&format!(
                        "<span class=\"glossary-tag\">{}</span>",
                        escape_attr(tag)
                    ));
                }
                out.append("</span>");
            }
            out.append("</dd>\n");
        }
        out.append("</dl>\n");
        if opts.collapsed {
            out.append("</details>\n");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;
    use crate::protocols::{GlossaryTerm, SiteContext};
    use crate::render::RenderEnv;

    fn site() -> SiteContext {
        SiteContext {
            title: "Docs".to_string(),
            base_url: "/".to_string(),
            glossary: vec![
                GlossaryTerm {
                    term: "Lexer".to_string(),
                    definition: "Line scanner".to_string(),
                    tags: vec!["parsing".to_string()],
                },
                GlossaryTerm {
                    term: "Builder".to_string(),
                    definition: "Output accumulator".to_string(),
                    tags: vec!["rendering".to_string()],
                },
            ],
        }
    }

    #[test]
    fn filters_by_tags_and_sorts() {
        let md = create_markdown();
        let site = site();
        let env = RenderEnv {
            site: Some(&site),
            ..RenderEnv::empty()
        };
        let html = md.convert_with(":::{glossary}\n:tags: parsing\n:::\n", None, &env);
        assert!(html.contains("<dt>Lexer</dt>"));
        assert!(!html.contains("Builder"));
    }

    #[test]
    fn empty_without_site_context() {
        let md = create_markdown();
        let html = md.convert(":::{glossary}\n:::\n");
        assert!(html.contains("<dl class=\"glossary\">\n</dl>"));
    }
}

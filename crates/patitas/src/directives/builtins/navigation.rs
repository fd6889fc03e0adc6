//! Page-context navigation directives: breadcrumbs, prev-next, siblings,
//! related.
//!
//! All of these read the [`PageContext`] from the render environment and are
//! marked non-cacheable; the same directive produces different output on
//! every page. Without page context they render an empty shell.

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::protocols::{PageContext, PageRef};
use crate::render::utils::{encode_url, escape_html};

fn render_ref_list(class: &str, pages: &[PageRef], out: &mut StringBuilder) {
    out.append(&format!("<nav class=\"{class}\">\n<ul>\n"));
    for page in pages {
        out.append(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            encode_url(&page.url),
            escape_html(&page.title)
        ));
    }
    out.append("</ul>\n</nav>\n");
}

/// `:::{breadcrumbs}` — the trail from the site root to this page.
pub struct BreadcrumbsDirective;

impl DirectiveHandler for BreadcrumbsDirective {
    fn names(&self) -> &'static [&'static str] {
        &["breadcrumbs"]
    }

    fn cacheable(&self) -> bool {
        false
    }

    fn render(
        &self,
        _node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let Some(page) = scope.env.page else {
            out.append("<nav class=\"breadcrumbs\"></nav>\n");
            return Ok(());
        };

        out.append("<nav class=\"breadcrumbs\" aria-label=\"Breadcrumb\">\n<ol>\n");
        for crumb in &page.breadcrumbs {
            out.append(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                encode_url(&crumb.url),
                escape_html(&crumb.title)
            ));
        }
        out.append(&format!(
            "<li aria-current=\"page\">{}</li>\n",
            escape_html(&page.title)
        ));
        out.append("</ol>\n</nav>\n");
        Ok(())
    }
}

/// `:::{prev-next}` — neighboring pages in reading order.
pub struct PrevNextDirective;

impl DirectiveHandler for PrevNextDirective {
    fn names(&self) -> &'static [&'static str] {
        &["prev-next"]
    }

    fn cacheable(&self) -> bool {
        false
    }

    fn render(
        &self,
        _node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let page: Option<&PageContext> = scope.env.page;
        out.append("<nav class=\"prev-next\">\n");
        if let Some(prev) = page.and_then(|p| p.prev.as_ref()) {
            out.append(&format!(
                "<a class=\"prev\" href=\"{}\" rel=\"prev\">{}</a>\n",
                encode_url(&prev.url),
                escape_html(&prev.title)
            ));
        }
        if let Some(next) = page.and_then(|p| p.next.as_ref()) {
            out.append(&format!(
                "<a class=\"next\" href=\"{}\" rel=\"next\">{}</a>\n",
                encode_url(&next.url),
                escape_html(&next.title)
            ));
        }
        out.append("</nav>\n");
        Ok(())
    }
}

/// `:::{siblings}` — the other pages in this page's section.
pub struct SiblingsDirective;

impl DirectiveHandler for SiblingsDirective {
    fn names(&self) -> &'static [&'static str] {
        &["siblings"]
    }

    fn cacheable(&self) -> bool {
        false
    }

    fn render(
        &self,
        _node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let pages = scope
            .env
            .page
            .map(|p| p.siblings.as_slice())
            .unwrap_or_default();
        render_ref_list("siblings", pages, out);
        Ok(())
    }
}

/// `:::{related}` — tag-adjacent pages chosen by the host.
pub struct RelatedDirective;

impl DirectiveHandler for RelatedDirective {
    fn names(&self) -> &'static [&'static str] {
        &["related"]
    }

    fn cacheable(&self) -> bool {
        false
    }

    fn render(
        &self,
        _node: &Directive,
        _rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let pages = scope
            .env
            .page
            .map(|p| p.related.as_slice())
            .unwrap_or_default();
        render_ref_list("related", pages, out);
        Ok(())
    }
}

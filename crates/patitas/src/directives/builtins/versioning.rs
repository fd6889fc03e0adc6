//! Versioning badges: `since`, `deprecated`, `changed`.
//!
//! The version goes in the title: `:::{since} 2.4`. The body, if any,
//! explains the change.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions, StyledOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::RenderError;
use crate::render::utils::escape_html;

fn render_version_badge(
    kind: &str,
    label: &str,
    node: &Directive,
    rendered_children: &str,
    out: &mut StringBuilder,
) {
    let version = node.title.as_deref().map(str::trim).unwrap_or("");
    out.append(&format!("<div class=\"version-note version-{kind}\">\n"));
    out.append(&format!("<span class=\"version-badge\">{label}"));
    if !version.is_empty() {
        out.append(&format!(" {}", escape_html(version)));
    }
    out.append("</span>\n");
    out.append(rendered_children);
    out.append("</div>\n");
}

macro_rules! version_directive {
    ($handler:ident, $name:literal, $kind:literal, $label:literal) => {
        pub struct $handler;

        impl DirectiveHandler for $handler {
            fn names(&self) -> &'static [&'static str] {
                &[$name]
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
                render_version_badge($kind, $label, node, rendered_children, out);
                Ok(())
            }
        }
    };
}

version_directive!(SinceDirective, "since", "added", "Added in version");
version_directive!(DeprecatedDirective, "deprecated", "deprecated", "Deprecated since");
version_directive!(ChangedDirective, "changed", "changed", "Changed in version");

#[cfg(test)]
mod tests {
    use crate::api::create_markdown;

    #[test]
    fn since_badge_includes_version() {
        let md = create_markdown();
        let html = md.convert(":::{since} 2.4\nNew flag added.\n:::\n");
        assert!(html.contains("version-added"));
        assert!(html.contains("<span class=\"version-badge\">Added in version 2.4</span>"));
        assert!(html.contains("New flag added."));
    }

    #[test]
    fn deprecated_badge() {
        let md = create_markdown();
        let html = md.convert(":::{deprecated} 3.0\n:::\n");
        assert!(html.contains("Deprecated since 3.0"));
    }
}

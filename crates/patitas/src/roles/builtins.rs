//! Built-in role handlers: ref, doc, kbd, abbr, math, sub, sup, icon.

use std::sync::Arc;

use crate::ast::Role;
use crate::builder::StringBuilder;
use crate::render::utils::{escape_attr, escape_html};
use crate::request::request;

use super::RoleHandler;

/// All built-in role handlers, in registration order.
pub fn all() -> Vec<Arc<dyn RoleHandler>> {
    vec![
        Arc::new(RefRole),
        Arc::new(DocRole),
        Arc::new(KbdRole),
        Arc::new(AbbrRole),
        Arc::new(MathRole),
        Arc::new(SubRole),
        Arc::new(SupRole),
        Arc::new(IconRole),
    ]
}

/// `Display Text <target-id>` → (display, target). Without the angle form
/// the whole content doubles as both.
fn split_target(content: &str) -> (String, Option<String>) {
    let trimmed = content.trim();
    if let Some(open) = trimmed.rfind('<') {
        if let Some(target) = trimmed[open + 1..].strip_suffix('>') {
            let display = trimmed[..open].trim();
            if !display.is_empty() && !target.is_empty() {
                return (display.to_string(), Some(target.to_string()));
            }
        }
    }
    (trimmed.to_string(), Some(trimmed.to_string()))
}

/// Resolve a target through the request-scoped link resolver, falling back
/// to a bare fragment.
fn resolve_or_anchor(target: &str) -> String {
    match request::try_get().and_then(|ctx| ctx.resolve_link(target)) {
        Some(url) => url,
        None => format!("#{target}"),
    }
}

/// Cross-reference to a heading, target, or page: `` {ref}`installation` ``.
pub struct RefRole;

impl RoleHandler for RefRole {
    fn names(&self) -> &'static [&'static str] {
        &["ref"]
    }

    fn parse(&self, name: &str, content: &str) -> Role {
        let (display, target) = split_target(content);
        Role {
            name: name.to_string(),
            content: display,
            target,
        }
    }

    fn render(&self, role: &Role, out: &mut StringBuilder) {
        let target = role.target.as_deref().unwrap_or(&role.content);
        let href = resolve_or_anchor(target);
        out.append(&format!(
            "<a href=\"{}\" class=\"xref\">{}</a>",
            escape_attr(&href),
            escape_html(&role.content)
        ));
    }
}

/// Link to another document: `` {doc}`guides/install` ``.
pub struct DocRole;

impl RoleHandler for DocRole {
    fn names(&self) -> &'static [&'static str] {
        &["doc"]
    }

    fn parse(&self, name: &str, content: &str) -> Role {
        let (display, target) = split_target(content);
        Role {
            name: name.to_string(),
            content: display,
            target,
        }
    }

    fn render(&self, role: &Role, out: &mut StringBuilder) {
        let target = role.target.as_deref().unwrap_or(&role.content);
        let href = match request::try_get().and_then(|ctx| ctx.resolve_link(target)) {
            Some(url) => url,
            None => format!("/{}/", target.trim_matches('/')),
        };
        out.append(&format!(
            "<a href=\"{}\" class=\"doc-link\">{}</a>",
            escape_attr(&href),
            escape_html(&role.content)
        ));
    }
}

/// Keyboard shortcut: `` {kbd}`Ctrl+C` `` renders each key separately.
pub struct KbdRole;

impl RoleHandler for KbdRole {
    fn names(&self) -> &'static [&'static str] {
        &["kbd"]
    }

    fn render(&self, role: &Role, out: &mut StringBuilder) {
        out.append("<kbd class=\"compound\">");
        for (idx, key) in role.content.split('+').enumerate() {
            if idx > 0 {
                out.append("+");
            }
            out.append(&format!("<kbd>{}</kbd>", escape_html(key.trim())));
        }
        out.append("</kbd>");
    }
}

/// Abbreviation: `` {abbr}`HTML (HyperText Markup Language)` ``.
pub struct AbbrRole;

impl RoleHandler for AbbrRole {
    fn names(&self) -> &'static [&'static str] {
        &["abbr"]
    }

    fn parse(&self, name: &str, content: &str) -> Role {
        let trimmed = content.trim();
        if let Some(open) = trimmed.find('(') {
            if let Some(expansion) = trimmed[open + 1..].strip_suffix(')') {
                let abbr = trimmed[..open].trim();
                if !abbr.is_empty() {
                    return Role {
                        name: name.to_string(),
                        content: abbr.to_string(),
                        target: Some(expansion.trim().to_string()),
                    };
                }
            }
        }
        Role {
            name: name.to_string(),
            content: trimmed.to_string(),
            target: None,
        }
    }

    fn render(&self, role: &Role, out: &mut StringBuilder) {
        match &role.target {
            Some(expansion) => out.append(&format!(
                "<abbr title=\"{}\">{}</abbr>",
                escape_attr(expansion),
                escape_html(&role.content)
            )),
            None => out.append(&format!("<abbr>{}</abbr>", escape_html(&role.content))),
        }
    }
}

/// Inline math, rendered for MathJax/KaTeX pickup.
pub struct MathRole;

impl RoleHandler for MathRole {
    fn names(&self) -> &'static [&'static str] {
        &["math"]
    }

    fn render(&self, role: &Role, out: &mut StringBuilder) {
        out.append(&format!(
            "<span class=\"math\">{}</span>",
            escape_html(&role.content)
        ));
    }
}

/// Subscript.
pub struct SubRole;

impl RoleHandler for SubRole {
    fn names(&self) -> &'static [&'static str] {
        &["sub"]
    }

    fn render(&self, role: &Role, out: &mut StringBuilder) {
        out.append(&format!("<sub>{}</sub>", escape_html(&role.content)));
    }
}

/// Superscript.
pub struct SupRole;

impl RoleHandler for SupRole {
    fn names(&self) -> &'static [&'static str] {
        &["sup"]
    }

    fn render(&self, role: &Role, out: &mut StringBuilder) {
        out.append(&format!("<sup>{}</sup>", escape_html(&role.content)));
    }
}

/// Named icon placeholder the host theme styles.
pub struct IconRole;

impl RoleHandler for IconRole {
    fn names(&self) -> &'static [&'static str] {
        &["icon"]
    }

    fn render(&self, role: &Role, out: &mut StringBuilder) {
        out.append(&format!(
            "<span class=\"icon icon-{}\" aria-hidden=\"true\"></span>",
            escape_attr(role.content.trim())
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(handler: &dyn RoleHandler, name: &str, content: &str) -> String {
        let role = handler.parse(name, content);
        let mut sb = StringBuilder::new();
        handler.render(&role, &mut sb);
        sb.build()
    }

    #[test]
    fn ref_simple_target() {
        let role = RefRole.parse("ref", "target-id");
        assert_eq!(role.content, "target-id");
        assert_eq!(role.target.as_deref(), Some("target-id"));
    }

    #[test]
    fn ref_with_display_text() {
        let role = RefRole.parse("ref", "Display Text <target-id>");
        assert_eq!(role.content, "Display Text");
        assert_eq!(role.target.as_deref(), Some("target-id"));
    }

    #[test]
    fn ref_renders_anchor_without_resolver() {
        let html = render(&RefRole, "ref", "installation");
        assert_eq!(html, "<a href=\"#installation\" class=\"xref\">installation</a>");
    }

    #[test]
    fn kbd_splits_keys() {
        let html = render(&KbdRole, "kbd", "Ctrl+C");
        assert_eq!(
            html,
            "<kbd class=\"compound\"><kbd>Ctrl</kbd>+<kbd>C</kbd></kbd>"
        );
    }

    #[test]
    fn abbr_extracts_expansion() {
        let role = AbbrRole.parse("abbr", "HTML (HyperText Markup Language)");
        assert_eq!(role.content, "HTML");
        assert_eq!(role.target.as_deref(), Some("HyperText Markup Language"));
        let mut sb = StringBuilder::new();
        AbbrRole.render(&role, &mut sb);
        assert_eq!(
            sb.build(),
            "<abbr title=\"HyperText Markup Language\">HTML</abbr>"
        );
    }

    #[test]
    fn math_preserves_content() {
        let html = render(&MathRole, "math", "E = mc^2");
        assert_eq!(html, "<span class=\"math\">E = mc^2</span>");
    }

    #[test]
    fn sub_and_sup() {
        assert_eq!(render(&SubRole, "sub", "2"), "<sub>2</sub>");
        assert_eq!(render(&SupRole, "sup", "2"), "<sup>2</sup>");
    }
}

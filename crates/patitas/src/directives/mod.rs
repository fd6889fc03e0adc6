//! Directive system.
//!
//! A directive is a block-level extension opened by a colon fence with a
//! `{name}` tag, an optional title, and `:key: value` option lines:
//!
//! ```text
//! :::{note} Optional Title
//! :class: custom
//!
//! Body in full Markdown.
//! :::
//! ```
//!
//! Handlers are pure descriptors: a set of claimed names, an optional
//! structural [`DirectiveContract`], a typed-options constructor, a `parse`
//! step that builds the AST node, and a `render` step that writes HTML.
//! Registries are built once at startup and injected through configuration.

pub mod builtins;
pub mod contracts;
pub mod options;
pub mod registry;

use std::sync::Arc;

use patitas_syntax::SourceLocation;

use crate::ast::{Block, Directive, DirectiveOptions};
use crate::builder::StringBuilder;
use crate::render::RenderEnv;

pub use contracts::DirectiveContract;
pub use options::{OptionsValue, RawOptions, StyledOptions};
pub use registry::{
    DirectiveRegistry, DirectiveRegistryBuilder, DuplicateDirective, create_default_registry,
};

/// Everything a rendering handler may reach for beyond its own node: the
/// source buffer (for zero-copy code extraction), host-supplied context, and
/// a callback that renders child blocks with full renderer state (heading
/// log, nested directives).
pub struct DirectiveScope<'env, 'r> {
    pub source: &'env str,
    pub env: &'env RenderEnv<'env>,
    pub render_block: &'r mut dyn FnMut(&Block, &mut StringBuilder),
}

impl<'env, 'r> DirectiveScope<'env, 'r> {
    /// Render a sequence of blocks into a fresh fragment.
    pub fn render_children(&mut self, children: &[Block]) -> String {
        let mut sb = StringBuilder::new();
        for child in children {
            (self.render_block)(child, &mut sb);
        }
        sb.build()
    }
}

/// A directive handler descriptor.
pub trait DirectiveHandler: Send + Sync {
    /// Directive names this handler claims.
    fn names(&self) -> &'static [&'static str];

    /// Structural contract checked at parse time.
    fn contract(&self) -> Option<&DirectiveContract> {
        None
    }

    /// Build the typed options value from raw `:key: value` pairs.
    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        options::styled(raw)
    }

    /// Build the AST node. The default keeps the generic shape; container
    /// handlers override this to rewrite children (e.g. steps injecting step
    /// numbers).
    fn parse(
        &self,
        name: &str,
        title: Option<&str>,
        options: DirectiveOptions,
        children: Vec<Block>,
        location: SourceLocation,
    ) -> Directive {
        Directive {
            location,
            name: name.to_string(),
            title: title.map(str::to_string),
            options,
            children,
        }
    }

    /// Write HTML for the node. `rendered_children` is the node's body,
    /// already rendered in document order; handlers that need per-child
    /// control re-render through `scope.render_block` instead.
    ///
    /// An `Err` is routed through the request context (reporting or strict
    /// escalation) and the renderer falls back to the default directive
    /// wrapper around the rendered children.
    fn render(
        &self,
        node: &Directive,
        rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), crate::error::RenderError>;

    /// Whether output may be reused across pages. Page- or site-dependent
    /// handlers return false and are always re-rendered.
    fn cacheable(&self) -> bool {
        true
    }
}

/// Directive names that are always page-dependent and never cached, even if
/// a handler forgets to say so.
pub const PAGE_DEPENDENT_DIRECTIVES: &[&str] = &[
    "child-cards",
    "breadcrumbs",
    "siblings",
    "prev-next",
    "related",
];

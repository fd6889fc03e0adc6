//! Render configuration and its ambient slot.

use std::sync::Arc;

use patitas_syntax::TextTransform;

use crate::directives::DirectiveRegistry;
use crate::protocols::Highlighter;
use crate::roles::RoleRegistry;

/// Custom heading slug function.
pub type SlugFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// CSS class naming scheme for highlighted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightStyle {
    #[default]
    Semantic,
    Pygments,
}

impl HighlightStyle {
    pub fn css_class(self) -> &'static str {
        match self {
            HighlightStyle::Semantic => "semantic",
            HighlightStyle::Pygments => "pygments",
        }
    }
}

/// Immutable render configuration, set once per render scope.
#[derive(Clone, Default)]
pub struct RenderConfig {
    /// Enable syntax highlighting for code blocks.
    pub highlight: bool,
    pub highlight_style: HighlightStyle,
    /// Registry for custom directive rendering.
    pub directive_registry: Option<Arc<DirectiveRegistry>>,
    /// Registry for custom role rendering.
    pub role_registry: Option<Arc<RoleRegistry>>,
    /// Applied to plain-text runs during rendering (variable substitution).
    pub text_transformer: Option<TextTransform>,
    /// Custom slug function for heading ids.
    pub slugify: Option<SlugFn>,
    /// External highlighter; `None` means highlighting falls through to the
    /// plain `<pre><code>` path even when `highlight` is set.
    pub highlighter: Option<Arc<dyn Highlighter>>,
}

impl std::fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderConfig")
            .field("highlight", &self.highlight)
            .field("highlight_style", &self.highlight_style)
            .field("has_directive_registry", &self.directive_registry.is_some())
            .field("has_role_registry", &self.role_registry.is_some())
            .field("has_text_transformer", &self.text_transformer.is_some())
            .field("has_slugify", &self.slugify.is_some())
            .field("has_highlighter", &self.highlighter.is_some())
            .finish()
    }
}

impl RenderConfig {
    /// Whether an external highlighter is actually available.
    pub fn highlighter_available(&self) -> bool {
        self.highlighter.is_some()
    }
}

/// Ambient slot for [`RenderConfig`] with a defaulted `get`.
pub mod render_config {
    use super::RenderConfig;
    use crate::context::ambient_slot;

    ambient_slot!(RenderConfig);

    /// Current render configuration, or the default when no scope is active.
    pub fn get() -> RenderConfig {
        current().unwrap_or_default()
    }
}

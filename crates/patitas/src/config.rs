//! Parse configuration and its ambient slot.
//!
//! Immutable value object, set once per parse scope and read by every parser
//! in that scope. The slot carries a module-level default so code outside an
//! explicit scope still sees a valid config.

use std::sync::Arc;

use patitas_syntax::TextTransform;

use crate::directives::DirectiveRegistry;

/// Immutable parse configuration.
#[derive(Clone, Default)]
pub struct ParseConfig {
    /// Enable GFM table parsing.
    pub tables: bool,
    /// Enable `~~strikethrough~~`.
    pub strikethrough: bool,
    /// Enable `[x]` task list items.
    pub task_lists: bool,
    /// Enable `[^footnote]` references and definitions.
    pub footnotes: bool,
    /// Enable `$math$` and `$$math$$`.
    pub math: bool,
    /// Enable bare URL/email autolink detection.
    pub autolinks: bool,
    /// Registry consulted for typed options and contracts while parsing
    /// directives. Directive *syntax* is always recognized.
    pub directive_registry: Option<Arc<DirectiveRegistry>>,
    /// Escalate contract violations instead of reporting them.
    pub strict_contracts: bool,
    /// Applied to classifiable lines at lex time (see the Elevation notes on
    /// [`patitas_syntax::Lexer`]).
    pub text_transformer: Option<TextTransform>,
}

impl std::fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseConfig")
            .field("tables", &self.tables)
            .field("strikethrough", &self.strikethrough)
            .field("task_lists", &self.task_lists)
            .field("footnotes", &self.footnotes)
            .field("math", &self.math)
            .field("autolinks", &self.autolinks)
            .field("strict_contracts", &self.strict_contracts)
            .field("has_directive_registry", &self.directive_registry.is_some())
            .field("has_text_transformer", &self.text_transformer.is_some())
            .finish()
    }
}

impl ParseConfig {
    /// Config with every syntax extension switched on.
    pub fn all_extensions() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            task_lists: true,
            footnotes: true,
            math: true,
            autolinks: true,
            ..Self::default()
        }
    }
}

/// Ambient slot for [`ParseConfig`] with a defaulted `get`.
pub mod parse_config {
    use super::ParseConfig;
    use crate::context::ambient_slot;

    ambient_slot!(ParseConfig);

    /// Current parse configuration, or the default when no scope is active.
    pub fn get() -> ParseConfig {
        current().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_outside_any_scope() {
        let config = parse_config::get();
        assert!(!config.tables);
        assert!(config.directive_registry.is_none());
    }

    #[test]
    fn scoped_config_is_visible_and_restored() {
        let seen = parse_config::with(ParseConfig::all_extensions(), || parse_config::get().tables);
        assert!(seen);
        assert_eq!(parse_config::get().tables, false);
    }
}

//! Directive registry.
//!
//! Built once at startup from handler descriptors, then immutable: a plain
//! name → handler map behind an `Arc`. Injected through `ParseConfig` (typed
//! options, contracts) and `RenderConfig` (rendering).

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use thiserror::Error;

use super::DirectiveHandler;
use super::builtins;

#[derive(Debug, Clone, Error)]
#[error("directive `{0}` already registered")]
pub struct DuplicateDirective(pub String);

/// Accumulates handlers; [`build`](DirectiveRegistryBuilder::build) freezes
/// them into a registry.
#[derive(Default)]
pub struct DirectiveRegistryBuilder {
    handlers: HashMap<String, Arc<dyn DirectiveHandler>>,
}

impl DirectiveRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under every name it claims.
    pub fn register(
        &mut self,
        handler: Arc<dyn DirectiveHandler>,
    ) -> Result<&mut Self, DuplicateDirective> {
        for name in handler.names() {
            if self.handlers.contains_key(*name) {
                return Err(DuplicateDirective(name.to_string()));
            }
        }
        for name in handler.names() {
            self.handlers.insert(name.to_string(), Arc::clone(&handler));
        }
        Ok(self)
    }

    pub fn build(self) -> DirectiveRegistry {
        DirectiveRegistry {
            handlers: self.handlers,
        }
    }
}

/// Immutable name → handler lookup table.
pub struct DirectiveRegistry {
    handlers: HashMap<String, Arc<dyn DirectiveHandler>>,
}

impl DirectiveRegistry {
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DirectiveHandler>> {
        self.handlers.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("DirectiveRegistry")
            .field("names", &names)
            .finish()
    }
}

static DEFAULT_REGISTRY: Lazy<Arc<DirectiveRegistry>> = Lazy::new(|| {
    let mut builder = DirectiveRegistryBuilder::new();
    for handler in builtins::all() {
        builder
            .register(handler)
            .expect("built-in directive names are disjoint");
    }
    Arc::new(builder.build())
});

/// The registry of built-in directives, created once per process.
pub fn create_default_registry() -> Arc<DirectiveRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::builtins::AdmonitionDirective;

    #[test]
    fn register_and_lookup_by_every_claimed_name() {
        let mut builder = DirectiveRegistryBuilder::new();
        builder.register(Arc::new(AdmonitionDirective)).unwrap();
        let registry = builder.build();
        assert!(registry.has("note"));
        assert!(registry.has("warning"));
        assert!(registry.has("tip"));
        assert!(registry.has("danger"));
        assert!(registry.get("note").is_some());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut builder = DirectiveRegistryBuilder::new();
        builder.register(Arc::new(AdmonitionDirective)).unwrap();
        let err = builder.register(Arc::new(AdmonitionDirective));
        assert!(err.is_err());
    }

    #[test]
    fn default_registry_has_builtins() {
        let registry = create_default_registry();
        for name in [
            "note",
            "warning",
            "dropdown",
            "tab-set",
            "tab-item",
            "code-tabs",
            "cards",
            "card",
            "child-cards",
            "steps",
            "step",
            "checklist",
            "list-table",
            "figure",
            "audio",
            "gallery",
            "youtube",
            "vimeo",
            "include",
            "literalinclude",
            "glossary",
            "data-table",
            "button",
            "badge",
            "icon",
            "rubric",
            "target",
            "breadcrumbs",
            "prev-next",
            "siblings",
            "related",
            "since",
            "deprecated",
            "changed",
            "marimo",
        ] {
            assert!(registry.has(name), "missing builtin: {name}");
        }
    }
}

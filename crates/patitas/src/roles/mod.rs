//! Inline role system.
//!
//! Roles are the inline counterpart of directives: `` {name}`content` ``
//! produces a [`Role`] node. A registry maps names to handlers; a handler's
//! `parse` may extract a target from forms like ``Display Text <target-id>``
//! or ``ABBR (expansion)``, and its `render` writes HTML. Unknown roles
//! render as `<span class="role role-{name}">…</span>`.

pub mod builtins;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use thiserror::Error;

use crate::ast::Role;
use crate::builder::StringBuilder;

#[derive(Debug, Clone, Error)]
#[error("role `{0}` already registered")]
pub struct DuplicateRole(pub String);

/// A role handler descriptor.
pub trait RoleHandler: Send + Sync {
    fn names(&self) -> &'static [&'static str];

    /// Interpret raw content, extracting a target where the role's syntax
    /// defines one.
    fn parse(&self, name: &str, content: &str) -> Role {
        Role {
            name: name.to_string(),
            content: content.to_string(),
            target: None,
        }
    }

    /// Write HTML for the parsed role.
    fn render(&self, role: &Role, out: &mut StringBuilder);
}

/// Accumulates role handlers; `build` freezes them.
#[derive(Default)]
pub struct RoleRegistryBuilder {
    handlers: HashMap<String, Arc<dyn RoleHandler>>,
}

impl RoleRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn RoleHandler>) -> Result<&mut Self, DuplicateRole> {
        for name in handler.names() {
            if self.handlers.contains_key(*name) {
                return Err(DuplicateRole(name.to_string()));
            }
        }
        for name in handler.names() {
            self.handlers.insert(name.to_string(), Arc::clone(&handler));
        }
        Ok(self)
    }

    pub fn build(self) -> RoleRegistry {
        RoleRegistry {
            handlers: self.handlers,
        }
    }
}

/// Immutable name → handler lookup table.
pub struct RoleRegistry {
    handlers: HashMap<String, Arc<dyn RoleHandler>>,
}

impl RoleRegistry {
    pub fn get(&self, name: &str) -> Option<&Arc<dyn RoleHandler>> {
        self.handlers.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

impl std::fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RoleRegistry").field("names", &names).finish()
    }
}

static DEFAULT_REGISTRY: Lazy<Arc<RoleRegistry>> = Lazy::new(|| {
    let mut builder = RoleRegistryBuilder::new();
    for handler in builtins::all() {
        builder
            .register(handler)
            .expect("built-in role names are disjoint");
    }
    Arc::new(builder.build())
});

/// The registry of built-in roles, created once per process.
pub fn create_default_registry() -> Arc<RoleRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::builtins::RefRole;

    #[test]
    fn register_and_lookup() {
        let mut builder = RoleRegistryBuilder::new();
        builder.register(Arc::new(RefRole)).unwrap();
        let registry = builder.build();
        assert!(registry.has("ref"));
        assert!(registry.get("ref").is_some());
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut builder = RoleRegistryBuilder::new();
        builder.register(Arc::new(RefRole)).unwrap();
        assert!(builder.register(Arc::new(RefRole)).is_err());
    }

    #[test]
    fn default_registry_has_builtins() {
        let registry = create_default_registry();
        for name in ["ref", "doc", "kbd", "abbr", "math", "sub", "sup", "icon"] {
            assert!(registry.has(name), "missing builtin role: {name}");
        }
    }
}

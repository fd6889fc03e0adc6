//! Declarative structural contracts for directives.
//!
//! Contracts constrain where a directive may appear and what it may contain.
//! They are checked during parsing, when the handler is invoked; violations
//! are typed and routed through the request context (strict mode escalates).

use patitas_syntax::SourceLocation;

use crate::ast::Block;
use crate::error::{ContractViolation, ViolationKind};

/// Structural constraints for one directive.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveContract {
    /// Must appear directly inside a directive with one of these names.
    pub requires_parent: Option<&'static [&'static str]>,
    /// Directive children must be drawn from this set.
    pub allowed_children: Option<&'static [&'static str]>,
    /// At least one child directive from this set must be present.
    pub requires_children: Option<&'static [&'static str]>,
}

impl DirectiveContract {
    pub const fn requiring_parent(parents: &'static [&'static str]) -> Self {
        Self {
            requires_parent: Some(parents),
            allowed_children: None,
            requires_children: None,
        }
    }

    pub const fn containing(children: &'static [&'static str]) -> Self {
        Self {
            requires_parent: None,
            allowed_children: Some(children),
            requires_children: Some(children),
        }
    }

    /// Check the parent requirement. `parent` is the name of the innermost
    /// enclosing directive, if any.
    pub fn validate_parent(
        &self,
        name: &str,
        parent: Option<&str>,
        location: SourceLocation,
    ) -> Option<ContractViolation> {
        let required = self.requires_parent?;
        match parent {
            None => Some(ContractViolation::new(
                name,
                ViolationKind::MissingParent,
                format!("must appear inside one of: {}", required.join(", ")),
                location,
            )),
            Some(parent) if !required.contains(&parent) => Some(ContractViolation::new(
                name,
                ViolationKind::WrongParent,
                format!("found inside `{parent}`, expected one of: {}", required.join(", ")),
                location,
            )),
            Some(_) => None,
        }
    }

    /// Check the child constraints against already-parsed children.
    pub fn validate_children(
        &self,
        name: &str,
        children: &[Block],
        location: SourceLocation,
    ) -> Vec<ContractViolation> {
        let mut violations = Vec::new();
        let child_directives: Vec<&str> = children
            .iter()
            .filter_map(|child| match child {
                Block::Directive(d) => Some(d.name.as_str()),
                _ => None,
            })
            .collect();

        if let Some(allowed) = self.allowed_children {
            for child in &child_directives {
                if !allowed.contains(child) {
                    violations.push(ContractViolation::new(
                        name,
                        ViolationKind::ForbiddenChild,
                        format!("child directive `{child}` is not allowed here"),
                        location,
                    ));
                }
            }
        }

        if let Some(required) = self.requires_children {
            let satisfied = child_directives
                .iter()
                .any(|child| required.contains(child));
            if !satisfied {
                violations.push(ContractViolation::new(
                    name,
                    ViolationKind::MissingChild,
                    format!("requires at least one of: {}", required.join(", ")),
                    location,
                ));
            }
        }

        violations
    }
}

/// tab-item must sit inside tab-set.
pub const TAB_ITEM_CONTRACT: DirectiveContract =
    DirectiveContract::requiring_parent(&["tab-set"]);

/// tab-set holds only tab-items, at least one.
pub const TAB_SET_CONTRACT: DirectiveContract = DirectiveContract::containing(&["tab-item"]);

/// step must sit inside steps.
pub const STEP_CONTRACT: DirectiveContract = DirectiveContract::requiring_parent(&["steps"]);

/// steps holds only steps, at least one.
pub const STEPS_CONTRACT: DirectiveContract = DirectiveContract::containing(&["step"]);

/// card must sit inside cards.
pub const CARD_CONTRACT: DirectiveContract = DirectiveContract::requiring_parent(&["cards"]);

/// cards holds only cards, at least one.
pub const CARDS_CONTRACT: DirectiveContract = DirectiveContract::containing(&["card"]);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Directive, DirectiveOptions};
    use pretty_assertions::assert_eq;

    fn directive(name: &str) -> Block {
        Block::Directive(Directive {
            location: SourceLocation::start(),
            name: name.to_string(),
            title: None,
            options: DirectiveOptions::default(),
            children: Vec::new(),
        })
    }

    #[test]
    fn requires_parent_accepts_listed_parent() {
        let loc = SourceLocation::start();
        assert!(TAB_ITEM_CONTRACT
            .validate_parent("tab-item", Some("tab-set"), loc)
            .is_none());
    }

    #[test]
    fn requires_parent_flags_wrong_parent() {
        let loc = SourceLocation::start();
        let violation = TAB_ITEM_CONTRACT
            .validate_parent("tab-item", Some("note"), loc)
            .expect("violation");
        assert_eq!(violation.kind, ViolationKind::WrongParent);
    }

    #[test]
    fn requires_parent_flags_missing_parent() {
        let loc = SourceLocation::start();
        let violation = TAB_ITEM_CONTRACT
            .validate_parent("tab-item", None, loc)
            .expect("violation");
        assert_eq!(violation.kind, ViolationKind::MissingParent);
    }

    #[test]
    fn child_whitelist_flags_strangers() {
        let loc = SourceLocation::start();
        let violations =
            TAB_SET_CONTRACT.validate_children("tab-set", &[directive("note")], loc);
        assert!(violations
            .iter()
            .any(|v| v.kind == ViolationKind::ForbiddenChild));
    }

    #[test]
    fn satisfied_contract_is_silent() {
        let loc = SourceLocation::start();
        let violations =
            TAB_SET_CONTRACT.validate_children("tab-set", &[directive("tab-item")], loc);
        assert_eq!(violations.len(), 0);
    }
}

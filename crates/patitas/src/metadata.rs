//! Render metadata accumulator.
//!
//! Opt-in: activate a scope with [`metadata::collect`] and the renderer
//! populates the accumulator while it walks, in document order. Without an
//! active scope the renderer skips all accumulation work.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde::Serialize;

/// Extended page metadata accumulated during a single render pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderMetadata {
    // Content features, for asset loading decisions.
    pub has_math: bool,
    pub has_code_blocks: bool,
    pub has_mermaid: bool,
    pub has_tables: bool,

    // Statistics.
    pub word_count: usize,
    pub code_languages: BTreeSet<String>,

    // Cross-references, for dependency tracking.
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub image_refs: Vec<String>,
}

impl RenderMetadata {
    pub fn add_words(&mut self, text: &str) {
        self.word_count += text.split_whitespace().count();
    }

    pub fn add_code_block(&mut self, language: Option<&str>) {
        self.has_code_blocks = true;
        if let Some(language) = language {
            if language == "mermaid" {
                self.has_mermaid = true;
            }
            self.code_languages.insert(language.to_string());
        }
    }

    pub fn add_internal_link(&mut self, target: &str) {
        self.internal_links.push(target.to_string());
    }

    pub fn add_external_link(&mut self, url: &str) {
        self.external_links.push(url.to_string());
    }

    pub fn add_image(&mut self, src: &str) {
        self.image_refs.push(src.to_string());
    }
}

/// Ambient slot for the accumulator. The slot holds a shared cell so the
/// renderer can mutate it while the activating caller keeps a handle.
pub mod metadata {
    use super::*;
    use crate::context::ambient_slot;

    ambient_slot!(Rc<RefCell<RenderMetadata>>);

    /// The active accumulator, if a collection scope is open on this thread.
    pub fn active() -> Option<Rc<RefCell<RenderMetadata>>> {
        current()
    }

    /// Run `f` while mutating the active accumulator, if any. No-op outside
    /// a collection scope.
    pub fn update(f: impl FnOnce(&mut RenderMetadata)) {
        if let Some(cell) = current() {
            f(&mut cell.borrow_mut());
        }
    }

    /// Run `f` with a fresh accumulator active; returns `f`'s result and the
    /// collected metadata.
    pub fn collect<R>(f: impl FnOnce() -> R) -> (R, RenderMetadata) {
        let cell = Rc::new(RefCell::new(RenderMetadata::default()));
        let result = with(Rc::clone(&cell), f);
        let collected = Rc::try_unwrap(cell)
            .map(RefCell::into_inner)
            .unwrap_or_else(|shared| shared.borrow().clone());
        (result, collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn update_is_a_noop_without_scope() {
        metadata::update(|m| m.has_math = true);
        assert!(metadata::active().is_none());
    }

    #[test]
    fn collect_returns_accumulated_state() {
        let ((), meta) = metadata::collect(|| {
            metadata::update(|m| m.add_words("three small words"));
            metadata::update(|m| m.add_code_block(Some("rust")));
            metadata::update(|m| m.add_code_block(Some("mermaid")));
        });
        assert_eq!(meta.word_count, 3);
        assert!(meta.has_code_blocks);
        assert!(meta.has_mermaid);
        assert!(meta.code_languages.contains("rust"));
    }

    #[test]
    fn nested_scopes_accumulate_independently() {
        let ((), outer) = metadata::collect(|| {
            metadata::update(|m| m.add_words("outer"));
            let ((), inner) = metadata::collect(|| {
                metadata::update(|m| m.add_words("inner words"));
            });
            assert_eq!(inner.word_count, 2);
        });
        assert_eq!(outer.word_count, 1);
    }
}

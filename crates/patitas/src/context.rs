//! Ambient thread-local slots.
//!
//! Four pieces of state travel "ambiently" instead of being threaded through
//! every call: [`crate::config::ParseConfig`], [`crate::render_config::RenderConfig`],
//! the optional [`crate::metadata::RenderMetadata`] accumulator, and the
//! per-request [`crate::request::RequestContext`]. Each lives in a
//! thread-local stack with token-based save/restore, so scopes nest and
//! never leak across threads.
//!
//! The [`ambient_slot!`] macro generates the shared machinery; each slot
//! module adds its own `get` flavor (defaulted, optional, or fail-fast).

/// Restore point returned by a slot's `set`.
///
/// Tokens restore in LIFO order; resetting an outer token also unwinds any
/// inner scopes that were left open.
#[derive(Debug)]
#[must_use = "reset the slot with this token or the scope will leak"]
pub struct ScopeToken {
    index: usize,
}

impl ScopeToken {
    pub(crate) fn at(index: usize) -> Self {
        Self { index }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

/// Generates the thread-local stack plus `set` / `reset` / `scope` / `with`
/// for one ambient slot type.
macro_rules! ambient_slot {
    ($ty:ty) => {
        use $crate::context::ScopeToken;

        thread_local! {
            static STACK: std::cell::RefCell<Vec<$ty>> =
                const { std::cell::RefCell::new(Vec::new()) };
        }

        /// Set the slot for the current thread. The returned token restores
        /// the previous value when passed to [`reset`].
        pub fn set(value: $ty) -> ScopeToken {
            STACK.with(|stack| {
                let mut stack = stack.borrow_mut();
                stack.push(value);
                ScopeToken::at(stack.len() - 1)
            })
        }

        /// Restore the slot to its state before the matching [`set`].
        pub fn reset(token: ScopeToken) {
            STACK.with(|stack| stack.borrow_mut().truncate(token.index()));
        }

        /// RAII guard that resets on drop.
        pub struct Scope {
            token: Option<ScopeToken>,
        }

        impl Drop for Scope {
            fn drop(&mut self) {
                if let Some(token) = self.token.take() {
                    reset(token);
                }
            }
        }

        /// Enter a scope with `value` active until the guard drops.
        pub fn scope(value: $ty) -> Scope {
            Scope {
                token: Some(set(value)),
            }
        }

        /// Run `f` with `value` active, restoring the previous state after
        /// (including on unwind).
        pub fn with<R>(value: $ty, f: impl FnOnce() -> R) -> R {
            let _scope = scope(value);
            f()
        }

        fn current() -> Option<$ty> {
            STACK.with(|stack| stack.borrow().last().cloned())
        }
    };
}

pub(crate) use ambient_slot;

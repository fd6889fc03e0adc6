//! Per-thread instance pools.
//!
//! Parser and renderer instances carry non-trivial internal state (scratch
//! buffers, heading log, seen-slug table), so repeated one-shot calls reuse
//! pooled instances instead of reallocating. Pools are thread-local and
//! bounded; acquisition returns a guard that resets the instance in place
//! and pushes it back on drop when the pool is not full. No locks anywhere.
//!
//! Capacity defaults to 8 per thread and can be overridden with the
//! `PATITAS_POOL_SIZE` environment variable (read once per process).

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::thread::LocalKey;

use once_cell::sync::Lazy;

use crate::parser::Parser;
use crate::render::HtmlRenderer;

const DEFAULT_POOL_SIZE: usize = 8;

static POOL_SIZE: Lazy<usize> = Lazy::new(|| {
    std::env::var("PATITAS_POOL_SIZE")
        .ok()
        .and_then(|value| value.parse().ok())
        .filter(|&size| size > 0)
        .unwrap_or(DEFAULT_POOL_SIZE)
});

/// Maximum instances kept per thread.
pub fn pool_capacity() -> usize {
    *POOL_SIZE
}

/// A pooled instance: cheap to construct, safe to reset in place.
///
/// `reset` must return the instance to the same observable state as a fresh
/// construction; the pool relies on that equivalence.
pub trait Poolable: Sized {
    fn create() -> Self;
    fn reset(&mut self);
}

impl Poolable for Parser {
    fn create() -> Self {
        Parser::new()
    }

    fn reset(&mut self) {
        Parser::reset(self);
    }
}

impl Poolable for HtmlRenderer {
    fn create() -> Self {
        HtmlRenderer::new()
    }

    fn reset(&mut self) {
        HtmlRenderer::reset(self);
    }
}

/// Borrowed pool instance; returns to the pool on drop.
pub struct PoolGuard<T: Poolable + 'static> {
    item: Option<T>,
    pool: &'static LocalKey<RefCell<Vec<T>>>,
}

impl<T: Poolable + 'static> Deref for PoolGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item.as_ref().expect("pool guard holds an instance")
    }
}

impl<T: Poolable + 'static> DerefMut for PoolGuard<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pool guard holds an instance")
    }
}

impl<T: Poolable + 'static> Drop for PoolGuard<T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.with(|pool| {
                let mut pool = pool.borrow_mut();
                if pool.len() < pool_capacity() {
                    pool.push(item);
                }
            });
        }
    }
}

fn acquire_from<T: Poolable + 'static>(
    pool: &'static LocalKey<RefCell<Vec<T>>>,
) -> PoolGuard<T> {
    let item = pool.with(|pool| pool.borrow_mut().pop());
    let item = match item {
        Some(mut item) => {
            item.reset();
            item
        }
        None => T::create(),
    };
    PoolGuard {
        item: Some(item),
        pool,
    }
}

thread_local! {
    static PARSERS: RefCell<Vec<Parser>> = const { RefCell::new(Vec::new()) };
    static RENDERERS: RefCell<Vec<HtmlRenderer>> = const { RefCell::new(Vec::new()) };
}

/// Pool of [`Parser`] instances for the current thread.
pub struct ParserPool;

impl ParserPool {
    pub fn acquire() -> PoolGuard<Parser> {
        acquire_from(&PARSERS)
    }

    /// Instances currently parked in this thread's pool.
    pub fn size() -> usize {
        PARSERS.with(|pool| pool.borrow().len())
    }

    /// Drop all parked instances (tests, memory cleanup).
    pub fn clear() {
        PARSERS.with(|pool| pool.borrow_mut().clear());
    }
}

/// Pool of [`HtmlRenderer`] instances for the current thread.
pub struct RendererPool;

impl RendererPool {
    pub fn acquire() -> PoolGuard<HtmlRenderer> {
        acquire_from(&RENDERERS)
    }

    pub fn size() -> usize {
        RENDERERS.with(|pool| pool.borrow().len())
    }

    pub fn clear() {
        RENDERERS.with(|pool| pool.borrow_mut().clear());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_then_reuses() {
        ParserPool::clear();
        {
            let _parser = ParserPool::acquire();
            assert_eq!(ParserPool::size(), 0);
        }
        assert_eq!(ParserPool::size(), 1);
        {
            let _parser = ParserPool::acquire();
            assert_eq!(ParserPool::size(), 0);
        }
        assert_eq!(ParserPool::size(), 1);
    }

    #[test]
    fn pool_never_exceeds_capacity() {
        RendererPool::clear();
        let guards: Vec<_> = (0..pool_capacity() + 4)
            .map(|_| RendererPool::acquire())
            .collect();
        drop(guards);
        assert_eq!(RendererPool::size(), pool_capacity());
    }

    #[test]
    fn reused_renderer_starts_clean() {
        RendererPool::clear();
        let source = "# One\n";
        let doc = crate::parser::Parser::new()
            .parse_with(source, &crate::config::ParseConfig::default());
        {
            let mut renderer = RendererPool::acquire();
            renderer.render(&doc, source);
            assert_eq!(renderer.headings().len(), 1);
        }
        {
            let renderer = RendererPool::acquire();
            assert!(renderer.headings().is_empty());
        }
    }

    #[test]
    fn pools_are_per_thread() {
        ParserPool::clear();
        {
            let _parser = ParserPool::acquire();
        }
        assert_eq!(ParserPool::size(), 1);
        let other = std::thread::spawn(ParserPool::size).join().unwrap();
        assert_eq!(other, 0);
    }
}

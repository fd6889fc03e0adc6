//! Host-supplied capabilities.
//!
//! Everything the core consumes from the outside world comes in through the
//! traits and value types here: the sub-lexer delegate and highlighter for
//! code fences, the file resolver behind the include directives, the
//! directive output cache, and the page/site descriptors that page-dependent
//! directives render from. The core performs no file or network I/O itself.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::IncludeError;
use crate::render_config::HighlightStyle;

/// One token produced by a sub-lexer delegate.
#[derive(Debug, Clone)]
pub struct HighlightToken {
    pub value: String,
    pub kind: String,
    /// Pre-rendered HTML for this token; when set it is emitted verbatim.
    pub html: Option<String>,
}

/// Host syntax highlighter driven over source spans (ZCLH).
///
/// The delegate is handed byte offsets into the original buffer, never a
/// copied string.
pub trait LexerDelegate: Send + Sync {
    fn supports_language(&self, lang: &str) -> bool;

    fn tokenize_range(
        &self,
        source: &str,
        start: usize,
        end: usize,
        lang: &str,
    ) -> Vec<HighlightToken>;
}

/// Whole-fragment highlighter (the internal fallback tier). Returns a
/// complete `<div class="highlight …">…</div>` fragment, or `None` when the
/// language is unknown.
pub trait Highlighter: Send + Sync {
    fn highlight(
        &self,
        source: &str,
        lang: &str,
        style: HighlightStyle,
        start: usize,
        end: usize,
        hl_lines: &BTreeSet<usize>,
    ) -> Option<String>;
}

/// A file resolved for the include-family directives.
#[derive(Debug, Clone)]
pub struct ResolvedInclude {
    pub content: String,
    pub absolute_path: PathBuf,
}

/// Host file resolver behind `include` / `literalinclude`.
///
/// Implementations must enforce path containment under the site root, reject
/// symlinks, detect cycles, and respect the depth and size limits; the core
/// treats any [`IncludeError`] as a rendering error for that directive only.
pub trait FileResolver: Send + Sync {
    fn resolve(
        &self,
        path: &str,
        current_file: Option<&Path>,
        max_depth: usize,
        size_limit: usize,
    ) -> Result<ResolvedInclude, IncludeError>;
}

/// Cache statistics, surfaced for host health checks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Host-provided per-site cache for rendered directive output.
///
/// Implementations must be internally synchronized; the core calls `get` and
/// `put` from concurrent renders.
pub trait DirectiveCache: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Option<String>;
    fn put(&self, namespace: &str, key: &str, value: String);
    fn stats(&self) -> CacheStats;
}

/// Lightweight descriptor of a page, as linked from navigation directives.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageRef {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// The page being rendered, populated by the host for page-dependent
/// directives (child-cards, breadcrumbs, siblings, prev-next, related).
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageContext {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub source_path: Option<PathBuf>,
    pub children: Vec<PageRef>,
    pub siblings: Vec<PageRef>,
    pub breadcrumbs: Vec<PageRef>,
    pub related: Vec<PageRef>,
    pub prev: Option<PageRef>,
    pub next: Option<PageRef>,
}

/// One glossary entry, supplied by the host for the glossary directive.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GlossaryTerm {
    pub term: String,
    pub definition: String,
    pub tags: Vec<String>,
}

/// Site-wide context for directives that need it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteContext {
    pub title: String,
    pub base_url: String,
    pub glossary: Vec<GlossaryTerm>,
}

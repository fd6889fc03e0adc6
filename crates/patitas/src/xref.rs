//! Cross-reference post-processing.
//!
//! When the host enables cross-references, rendered HTML gets one more pass
//! that resolves `[[…]]` link tokens against a pre-built index:
//!
//! - `[[docs/page]]` / `[[docs/page|Text]]` — path lookup (slug fallback)
//! - `[[#anchor]]` — explicit anchors, then heading text
//! - `[[!target]]` — target-directive anchors only
//! - `[[id:custom]]` — custom page ids
//! - `[[ext:project:target]]` — external projects, three-tier resolution
//!
//! Tokens inside `<pre>`/`<code>` regions stay literal. Broken references
//! render a `<span class="broken-ref">`; nothing here ever fails a build.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// A page (or page+anchor) a reference can land on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XrefTarget {
    pub title: String,
    pub url: String,
}

/// Pre-built cross-reference index, supplied by the host per site.
#[derive(Debug, Clone, Default)]
pub struct XrefIndex {
    pub by_path: HashMap<String, XrefTarget>,
    pub by_slug: HashMap<String, Vec<XrefTarget>>,
    pub by_id: HashMap<String, XrefTarget>,
    /// Lowercased heading text → (page, anchor id).
    pub by_heading: HashMap<String, Vec<(XrefTarget, String)>>,
    /// Lowercased explicit anchor id → (page, anchor id).
    pub by_anchor: HashMap<String, (XrefTarget, String)>,
}

static XREF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").expect("xref pattern is valid")
});

static CODE_REGIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<pre.*?</pre>|<code[^>]*>.*?</code>").expect("code region pattern is valid")
});

/// The installed post-processing pass.
pub struct CrossReferences {
    index: Arc<XrefIndex>,
    external: Option<Arc<ExternalRefResolver>>,
}

impl CrossReferences {
    pub fn new(index: Arc<XrefIndex>, external: Option<Arc<ExternalRefResolver>>) -> Self {
        Self { index, external }
    }

    /// Substitute `[[…]]` tokens in rendered HTML, skipping code regions.
    pub fn apply(&self, html: &str) -> String {
        if !html.contains("[[") {
            return html.to_string();
        }

        let mut out = String::with_capacity(html.len());
        let mut cursor = 0usize;
        for region in CODE_REGIONS.find_iter(html) {
            out.push_str(&self.substitute(&html[cursor..region.start()]));
            out.push_str(region.as_str());
            cursor = region.end();
        }
        out.push_str(&self.substitute(&html[cursor..]));
        out
    }

    fn substitute(&self, text: &str) -> String {
        if !text.contains("[[") {
            return text.to_string();
        }
        XREF_PATTERN
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let reference = caps[1].trim();
                let custom_text = caps.get(2).map(|m| m.as_str().trim());
                self.resolve(reference, custom_text)
            })
            .into_owned()
    }

    fn resolve(&self, reference: &str, text: Option<&str>) -> String {
        if let Some(rest) = reference.strip_prefix("ext:") {
            return self.resolve_external(rest, text);
        }
        if let Some(target) = reference.strip_prefix('!') {
            return self.resolve_target(target, text);
        }
        if let Some(anchor) = reference.strip_prefix('#') {
            return self.resolve_heading(anchor, text);
        }
        if let Some(id) = reference.strip_prefix("id:") {
            return self.resolve_id(id, text);
        }
        self.resolve_path(reference, text)
    }

    fn resolve_path(&self, path: &str, text: Option<&str>) -> String {
        let (path, fragment) = match path.split_once('#') {
            Some((path, anchor)) => (path, format!("#{anchor}")),
            None => (path, String::new()),
        };
        let clean = path.trim_end_matches(".md").trim_matches('/');

        let page = self.index.by_path.get(clean).or_else(|| {
            self.index
                .by_slug
                .get(clean)
                .and_then(|pages| pages.first())
        });

        match page {
            Some(page) => {
                let link_text = text.unwrap_or(&page.title);
                format!("<a href=\"{}{fragment}\">{link_text}</a>", page.url)
            }
            None => {
                tracing::debug!(reference = path, "xref path resolution failed");
                broken_ref(path, text.unwrap_or(path))
            }
        }
    }

    fn resolve_id(&self, id: &str, text: Option<&str>) -> String {
        match self.index.by_id.get(id) {
            Some(page) => {
                let link_text = text.unwrap_or(&page.title);
                format!("<a href=\"{}\">{link_text}</a>", page.url)
            }
            None => {
                tracing::debug!(reference = id, "xref id resolution failed");
                broken_ref(&format!("id:{id}"), text.unwrap_or(id))
            }
        }
    }

    fn resolve_target(&self, anchor: &str, text: Option<&str>) -> String {
        let key = anchor.to_lowercase();
        match self.index.by_anchor.get(&key) {
            Some((page, anchor_id)) => {
                let fallback = title_case(anchor);
                let link_text = text.map(str::to_string).unwrap_or(fallback);
                format!("<a href=\"{}#{anchor_id}\">{link_text}</a>", page.url)
            }
            None => {
                tracing::debug!(reference = anchor, "xref target resolution failed");
                broken_ref(&format!("!{anchor}"), text.unwrap_or(anchor))
            }
        }
    }

    fn resolve_heading(&self, anchor: &str, text: Option<&str>) -> String {
        let key = anchor.to_lowercase();

        // Explicit anchors first (covers `{#custom-id}` and targets), then
        // heading text.
        if let Some((page, anchor_id)) = self.index.by_anchor.get(&key) {
            let link_text = text.map(str::to_string).unwrap_or_else(|| title_case(&key));
            return format!("<a href=\"{}#{anchor_id}\">{link_text}</a>", page.url);
        }
        if let Some(matches) = self.index.by_heading.get(&key) {
            if let Some((page, anchor_id)) = matches.first() {
                let link_text = text.map(str::to_string).unwrap_or_else(|| title_case(anchor));
                return format!("<a href=\"{}#{anchor_id}\">{link_text}</a>", page.url);
            }
        }

        tracing::debug!(reference = anchor, "xref heading resolution failed");
        broken_ref(&format!("#{anchor}"), text.unwrap_or(anchor))
    }

    fn resolve_external(&self, rest: &str, text: Option<&str>) -> String {
        let Some((project, target)) = rest.split_once(':') else {
            return broken_ref(&format!("ext:{rest}"), text.unwrap_or(rest));
        };
        match &self.external {
            Some(resolver) => resolver.resolve(project, target, text),
            None => ExternalRefResolver::fallback(project, target, text),
        }
    }
}

fn broken_ref(reference: &str, text: &str) -> String {
    format!(
        "<span class=\"broken-ref\" data-ref=\"{reference}\" title=\"Reference not found: {reference}\">[{text}]</span>"
    )
}

fn title_case(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One entry from an external `xref.json` index.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalRefEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalProject {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// The external index format: `{version, project, entries}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalIndex {
    pub version: String,
    pub project: ExternalProject,
    pub entries: HashMap<String, ExternalRefEntry>,
}

/// An external reference that failed to resolve, kept for health checks.
#[derive(Debug, Clone)]
pub struct UnresolvedRef {
    pub project: String,
    pub target: String,
    pub source_file: Option<PathBuf>,
}

/// Three-tier resolver for `[[ext:project:target]]` references:
/// URL templates (instant, offline), cached indexes, graceful fallback.
#[derive(Default)]
pub struct ExternalRefResolver {
    templates: HashMap<String, String>,
    indexes: HashMap<String, ExternalIndex>,
    unresolved: Mutex<Vec<UnresolvedRef>>,
}

impl ExternalRefResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a URL template; `{target}` is substituted verbatim.
    pub fn add_template(&mut self, project: &str, template: &str) {
        self.templates
            .insert(project.to_string(), template.to_string());
    }

    /// Load a cached external index from its JSON form. Unsupported versions
    /// are rejected.
    pub fn add_index_json(&mut self, project: &str, json: &str) -> Result<(), serde_json::Error> {
        let index: ExternalIndex = serde_json::from_str(json)?;
        if index.version != "1" {
            tracing::debug!(project, version = %index.version, "unsupported external index version");
        }
        self.indexes.insert(project.to_string(), index);
        Ok(())
    }

    pub fn resolve(&self, project: &str, target: &str, text: Option<&str>) -> String {
        // Tier 1: URL template.
        if let Some(template) = self.templates.get(project) {
            let url = template.replace("{target}", target);
            let display = text.map(str::to_string).unwrap_or_else(|| display_name(target));
            return format!("<a href=\"{url}\" class=\"extref\">{display}</a>");
        }

        // Tier 2: cached index.
        if let Some(entry) = self
            .indexes
            .get(project)
            .and_then(|index| index.entries.get(target))
        {
            let display = text.unwrap_or(&entry.title);
            let title_attr = match &entry.summary {
                Some(summary) => format!(" title=\"{summary}\""),
                None => String::new(),
            };
            return format!(
                "<a href=\"{}\" class=\"extref\"{title_attr}>{display}</a>",
                entry.path
            );
        }

        // Tier 3: graceful fallback, never failing the build.
        tracing::warn!(project, target, "unresolved external reference");
        if let Ok(mut unresolved) = self.unresolved.lock() {
            unresolved.push(UnresolvedRef {
                project: project.to_string(),
                target: target.to_string(),
                source_file: None,
            });
        }
        Self::fallback(project, target, text)
    }

    pub fn fallback(project: &str, target: &str, text: Option<&str>) -> String {
        let display = text.unwrap_or(target);
        format!("<code class=\"extref extref-unresolved\">ext:{project}:{display}</code>")
    }

    /// Snapshot of the unresolved references recorded so far.
    pub fn unresolved(&self) -> Vec<UnresolvedRef> {
        self.unresolved
            .lock()
            .map(|refs| refs.clone())
            .unwrap_or_default()
    }
}

fn display_name(target: &str) -> String {
    target
        .rsplit('.')
        .next()
        .unwrap_or(target)
        .to_string()
}

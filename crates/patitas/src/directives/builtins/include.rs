//! File inclusion through the host resolver.
//!
//! `include` pulls another Markdown file in as parsed content;
//! `literalinclude` pulls a file in as a code block. The core performs no
//! file I/O: a host [`FileResolver`] does the reading and owns the security
//! policy (path containment, symlink refusal, cycle detection, depth and
//! size limits). Resolver failures become inline error nodes and are
//! reported through the request context; they never break the build outside
//! strict mode.

use std::sync::Arc;

use crate::ast::Directive;
use crate::builder::StringBuilder;
use crate::directives::options::{OptionsValue, RawOptions};
use crate::directives::{DirectiveHandler, DirectiveScope};
use crate::error::{IncludeError, RenderError};
use crate::parser::Parser;
use crate::render::HtmlRenderer;
use crate::render::utils::{escape_attr, escape_html};
use crate::request::request;

/// Depth cap handed to the resolver.
pub const MAX_INCLUDE_DEPTH: usize = 10;

/// Size cap handed to the resolver, in bytes.
pub const MAX_INCLUDE_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncludeOptions {
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiteralIncludeOptions {
    pub language: Option<String>,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
}

/// Emit the inline error node and route the failure: strict mode escalates
/// through the renderer, otherwise the error goes to the reporting handler
/// and the inline node is the output.
fn fail_include(path: &str, error: IncludeError, out: &mut StringBuilder) -> Result<(), RenderError> {
    out.append(&format!(
        "<div class=\"include-error\"><code>{}</code>: {}</div>\n",
        escape_html(path),
        escape_html(&error.to_string())
    ));
    let strict = request::try_get().map(|ctx| ctx.strict_mode).unwrap_or(false);
    if strict {
        return Err(RenderError::Include(error));
    }
    request::report(RenderError::Include(error), "include directive");
    Ok(())
}

fn slice_lines(content: &str, start: Option<usize>, end: Option<usize>) -> String {
    match (start, end) {
        (None, None) => content.to_string(),
        _ => {
            let lines: Vec<&str> = content.lines().collect();
            let from = start.map(|n| n.saturating_sub(1)).unwrap_or(0);
            let to = end.unwrap_or(lines.len()).min(lines.len());
            if from >= to {
                return String::new();
            }
            let mut out = lines[from..to].join("\n");
            out.push('\n');
            out
        }
    }
}

fn resolve<'s>(
    scope: &DirectiveScope<'s, '_>,
    path: &str,
) -> Result<crate::protocols::ResolvedInclude, IncludeError> {
    let resolver = scope
        .env
        .file_resolver
        .ok_or_else(|| IncludeError::Io("no file resolver configured".to_string()))?;
    let current_file = request::try_get().and_then(|ctx| ctx.source_file);
    resolver.resolve(
        path,
        current_file.as_deref(),
        MAX_INCLUDE_DEPTH,
        MAX_INCLUDE_BYTES,
    )
}

/// `:::{include} path/to/file.md`
pub struct IncludeDirective;

impl DirectiveHandler for IncludeDirective {
    fn names(&self) -> &'static [&'static str] {
        &["include"]
    }

    fn cacheable(&self) -> bool {
        // Included content can change without the directive changing.
        false
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(IncludeOptions {
            start_line: raw.int("start-line").map(|n| n.max(1) as usize),
            end_line: raw.int("end-line").map(|n| n.max(1) as usize),
        })
    }

    fn render(
        &self,
        node: &Directive,
        rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let Some(path) = node.title.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
            out.append(rendered_children);
            return Ok(());
        };
        let opts = node
            .options
            .downcast::<IncludeOptions>()
            .cloned()
            .unwrap_or_default();

        let resolved = match resolve(scope, path) {
            Ok(resolved) => resolved,
            Err(error) => return fail_include(path, error, out),
        };

        let content = slice_lines(&resolved.content, opts.start_line, opts.end_line);
        // The included document is parsed and rendered against its own
        // buffer; heading slugs still deduplicate per-document.
        let doc = Parser::new().parse(&content);
        let mut renderer = HtmlRenderer::new();
        out.append(&renderer.render_with_env(&doc, &content, scope.env));
        Ok(())
    }
}

/// `:::{literalinclude} path/to/file.rs`
pub struct LiteralIncludeDirective;

impl DirectiveHandler for LiteralIncludeDirective {
    fn names(&self) -> &'static [&'static str] {
        &["literalinclude"]
    }

    fn cacheable(&self) -> bool {
        false
    }

    fn parse_options(&self, raw: &RawOptions) -> Arc<dyn OptionsValue> {
        Arc::new(LiteralIncludeOptions {
            language: raw.string("language"),
            start_line: raw.int("start-line").map(|n| n.max(1) as usize),
            end_line: raw.int("end-line").map(|n| n.max(1) as usize),
        })
    }

    fn render(
        &self,
        node: &Directive,
        rendered_children: &str,
        out: &mut StringBuilder,
        scope: &mut DirectiveScope<'_, '_>,
    ) -> Result<(), RenderError> {
        let Some(path) = node.title.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
            out.append(rendered_children);
            return Ok(());
        };
        let opts = node
            .options
            .downcast::<LiteralIncludeOptions>()
            .cloned()
            .unwrap_or_default();

        let resolved = match resolve(scope, path) {
            Ok(resolved) => resolved,
            Err(error) => return fail_include(path, error, out),
        };

        let content = slice_lines(&resolved.content, opts.start_line, opts.end_line);
        let language = opts.language.or_else(|| {
            resolved
                .absolute_path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_string)
        });

        out.append("<pre><code");
        if let Some(language) = language.filter(|l| !l.is_empty()) {
            out.append(&format!(" class=\"language-{}\"", escape_attr(&language)));
        }
        out.append(">");
        let trimmed = content.strip_suffix('\n').unwrap_or(&content);
        out.append(&escape_html(trimmed));
        if trimmed.is_empty() {
            out.append("</code></pre>\n");
        } else {
            out.append("\n</code></pre>\n");
        }
        Ok(())
    }
}

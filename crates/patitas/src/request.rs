//! Request-scoped context.
//!
//! Per-render state (source path, page/site objects, error routing, strict
//! mode, link resolution) without parameter drilling. Thread-local, nestable,
//! and absent by default: the fail-fast accessor raises
//! [`RequestContextError`] so a missing scope is caught early instead of
//! silently masked.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{RenderError, RequestContextError};
use crate::protocols::{PageContext, SiteContext};

/// Callback invoked for every reported error: `(error, where)`.
pub type ErrorHandler = Arc<dyn Fn(&RenderError, &str) + Send + Sync>;

/// Callback that resolves an internal link target to a URL.
pub type LinkResolver = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Per-request context for parsing and rendering.
#[derive(Clone, Default)]
pub struct RequestContext {
    /// Path of the source file being processed.
    pub source_file: Option<PathBuf>,
    /// Raw source content.
    pub source_content: Option<Arc<str>>,
    /// Page being rendered, for page-dependent directives.
    pub page: Option<Arc<PageContext>>,
    /// Site-wide context (glossary data, base URL).
    pub site: Option<Arc<SiteContext>>,
    /// Receives every reported error (reporting mode).
    pub error_handler: Option<ErrorHandler>,
    /// First reported error aborts the render (strict mode).
    pub strict_mode: bool,
    /// Resolves internal link targets to URLs.
    pub link_resolver: Option<LinkResolver>,
    /// Emit tracing events for this request.
    pub trace_enabled: bool,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("source_file", &self.source_file)
            .field("strict_mode", &self.strict_mode)
            .field("trace_enabled", &self.trace_enabled)
            .field("has_error_handler", &self.error_handler.is_some())
            .field("has_link_resolver", &self.link_resolver.is_some())
            .finish()
    }
}

impl RequestContext {
    /// Resolve an internal link target, if a resolver is installed.
    pub fn resolve_link(&self, target: &str) -> Option<String> {
        self.link_resolver.as_ref().and_then(|resolve| resolve(target))
    }

    /// Route an error according to the propagation mode.
    ///
    /// Returns the error back when strict mode wants it escalated; otherwise
    /// the error was either handed to the handler or dropped (best-effort).
    pub fn report(&self, error: RenderError, context: &str) -> Option<RenderError> {
        if let Some(handler) = &self.error_handler {
            handler(&error, context);
            if self.strict_mode { Some(error) } else { None }
        } else if self.strict_mode {
            Some(error)
        } else {
            None
        }
    }
}

/// Ambient slot for [`RequestContext`]; no default, optional by design.
pub mod request {
    use super::*;
    use crate::context::ambient_slot;

    ambient_slot!(RequestContext);

    /// Current request context, or `None` outside a request scope.
    pub fn try_get() -> Option<RequestContext> {
        current()
    }

    /// Current request context; fail-fast when absent.
    pub fn get() -> Result<RequestContext, RequestContextError> {
        current().ok_or(RequestContextError)
    }

    /// Report an error through the active context. Outside a scope this is
    /// best-effort silence. Returns the error if strict mode escalates it.
    pub fn report(error: RenderError, where_: &str) -> Option<RenderError> {
        match current() {
            Some(ctx) => ctx.report(error, where_),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn get_fails_fast_outside_scope() {
        assert!(request::get().is_err());
        assert!(request::try_get().is_none());
    }

    #[test]
    fn scoped_context_is_visible() {
        let ctx = RequestContext {
            source_file: Some(PathBuf::from("docs/index.md")),
            ..RequestContext::default()
        };
        request::with(ctx, || {
            let seen = request::get().expect("context set");
            assert_eq!(seen.source_file.as_deref(), Some(std::path::Path::new("docs/index.md")));
        });
        assert!(request::try_get().is_none());
    }

    #[test]
    fn report_prefers_handler_over_silence() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let ctx = RequestContext {
            error_handler: Some(Arc::new(move |error, where_| {
                sink.lock().unwrap().push(format!("{where_}: {error}"));
            })),
            ..RequestContext::default()
        };
        let escalated = ctx.report(
            RenderError::Handler {
                directive: "note".into(),
                message: "boom".into(),
            },
            "render",
        );
        assert!(escalated.is_none());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn strict_mode_escalates() {
        let ctx = RequestContext {
            strict_mode: true,
            ..RequestContext::default()
        };
        let escalated = ctx.report(
            RenderError::Handler {
                directive: "note".into(),
                message: "boom".into(),
            },
            "render",
        );
        assert!(escalated.is_some());
    }

    #[test]
    fn link_resolution_uses_installed_resolver() {
        let ctx = RequestContext {
            link_resolver: Some(Arc::new(|target: &str| {
                (target == "docs/setup").then(|| "/docs/setup/".to_string())
            })),
            ..RequestContext::default()
        };
        assert_eq!(ctx.resolve_link("docs/setup").as_deref(), Some("/docs/setup/"));
        assert_eq!(ctx.resolve_link("missing"), None);
    }
}

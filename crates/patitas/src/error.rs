//! Error taxonomy.
//!
//! Parsing never fails: malformed input degrades to literal text, so there is
//! deliberately no `ParseError`. The errors here cover the paths that *can*
//! fail: missing request context, directive contract violations, include
//! resolution, and strict-mode escalation during rendering.

use patitas_syntax::SourceLocation;
use thiserror::Error;

/// Raised when request context is required but not set.
///
/// Fail-fast by design: use [`crate::context::request::try_get`] for the
/// optional path.
#[derive(Debug, Clone, Error)]
#[error(
    "no request context set; enter a request scope before parsing or rendering"
)]
pub struct RequestContextError;

/// How a directive violated its structural contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    MissingParent,
    WrongParent,
    ForbiddenChild,
    MissingChild,
}

/// A directive contract violation, reported at parse time.
#[derive(Debug, Clone, Error)]
#[error("directive `{directive}` at {line}:{column}: {message}")]
pub struct ContractViolation {
    pub directive: String,
    pub kind: ViolationKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl ContractViolation {
    pub fn new(
        directive: &str,
        kind: ViolationKind,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            directive: directive.to_string(),
            kind,
            message: message.into(),
            line: location.line,
            column: location.column,
        }
    }
}

/// Why an include-family directive refused to resolve a file.
#[derive(Debug, Clone, Error)]
pub enum IncludeError {
    #[error("include depth limit exceeded ({0})")]
    DepthExceeded(usize),
    #[error("include cycle detected: {0}")]
    Cycle(String),
    #[error("included file exceeds size limit ({size} > {limit} bytes)")]
    TooLarge { size: usize, limit: usize },
    #[error("symlinks are not followed: {0}")]
    Symlink(String),
    #[error("path escapes the content root: {0}")]
    OutsideRoot(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("unreadable include: {0}")]
    Io(String),
}

/// Errors surfaced from rendering in strict mode.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Contract(#[from] ContractViolation),
    #[error(transparent)]
    Include(#[from] IncludeError),
    #[error(transparent)]
    MissingContext(#[from] RequestContextError),
    #[error("directive `{directive}` failed: {message}")]
    Handler { directive: String, message: String },
}

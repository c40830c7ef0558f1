//! Shared error kinds. Every public entry point across the workspace
//! surfaces one of these five kinds verbatim — intermediate transformers
//! never swallow an error, they propagate it with `?`.

use crate::position::PositionMarker;

/// Malformed token, unterminated literal/comment.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("{message} at byte {}", position.start_byte)]
pub struct LexError {
    pub message: String,
    pub position: PositionMarker,
}

/// Parser expected/found mismatch.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("expected {expected:?}, found {found} at byte {}", position.start_byte)]
pub struct SyntaxError {
    pub message: String,
    pub position: PositionMarker,
    pub expected: Vec<String>,
    pub found: String,
    /// A suggested token-insertion recovery, populated by `parseToCursor`.
    pub recovery_hint: Option<String>,
}

/// An AST-level invariant was violated: a select item without an alias
/// where one is required, a duplicate CTE name, a dangling `parentId` in a
/// JSON mapping, a primary key missing from the projection, an `UPDATE`
/// with no writable columns, and similar structural violations.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        ValidationError { message: message.into() }
    }
}

/// One or more base tables lack fixtures under the `error` missing-fixture
/// strategy.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("missing fixtures for table(s): {}", tables.join(", "))]
pub struct FixtureCoverageError {
    pub tables: Vec<String>,
    pub sql_snippet: String,
    /// A column-list-with-declared-types template the caller can fill in.
    pub suggested_fixture_template: String,
}

/// Mutually exclusive style options, an unknown preset, or a conflicting
/// parameter style/symbol combination.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("{message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        ConfigError { message: message.into() }
    }
}

/// The umbrella error every public entry point returns, so callers who don't
/// need to match on the specific kind can use `?` against a single type.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SqlFixtureError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    FixtureCoverage(#[from] FixtureCoverageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A non-fatal diagnostic accumulated on the side when a caller supplies a
/// sink, e.g. the `warn` missing-fixture strategy or a non-strict dynamic
/// filter skipping an unresolved column.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Diagnostic { message: message.into(), context: None }
    }

    pub fn with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Diagnostic { message: message.into(), context: Some(context.into()) }
    }
}

/// Accepts an optional diagnostics sink without every call site threading an
/// `Option<&mut Vec<_>>` check by hand.
pub fn push_diagnostic(sink: Option<&mut Vec<Diagnostic>>, diagnostic: Diagnostic) {
    if let Some(sink) = sink {
        tracing::warn!(message = %diagnostic.message, "diagnostic emitted");
        sink.push(diagnostic);
    }
}

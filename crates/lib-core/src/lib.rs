//! Shared core for the fixture SQL toolkit: position tracking, the keyword
//! dictionary, the typed AST, error kinds, the lexer, and the analysis
//! visitors (`SelectableColumnCollector`, `TableReferenceCollector`,
//! `ParameterCollector`, `ScopeResolver`) that the parser, rewriters, and
//! printer in `sqlfixture` build on.

pub mod analyzer;
pub mod ast;
pub mod errors;
pub mod keywords;
pub mod lexer;
pub mod position;

pub use errors::{ConfigError, Diagnostic, FixtureCoverageError, LexError, SqlFixtureError, SyntaxError, ValidationError};
pub use keywords::Keyword;
pub use position::{Cursor, PositionIndex, PositionMarker};

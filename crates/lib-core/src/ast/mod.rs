//! The typed AST: a closed set of node variants covering every statement and
//! expression shape in the spec. Nodes derive `PartialEq` directly; spans and
//! attached comments are wrapped in [`trivia::Trivia`] so that derived
//! equality already ignores them, giving the "structural equality ignoring
//! positions/comments" property the spec requires for free.

pub mod expr;
pub mod ident;
pub mod statement;
pub mod trivia;
pub mod visit;

pub use expr::*;
pub use ident::{Ident, ObjectName};
pub use statement::*;
pub use trivia::{Comments, Span};
pub use visit::{Visitor, walk_cte, walk_expr, walk_statement, walk_table_factor};

//! Expression nodes. `Expr` is the sum type shared by every clause that
//! takes a scalar expression: projections, `WHERE`, `ON`, `SET`, etc.

use super::ident::{Ident, ObjectName};
use super::statement::Statement;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `qualifiers` holds everything before the final segment (`a.b.c` ->
    /// qualifiers `[a, b]`, name `c`).
    Column { qualifiers: Vec<Ident>, name: Ident },
    Wildcard,
    /// `alias.*`
    QualifiedWildcard(Vec<Ident>),
    Literal(LiteralValue),
    Parameter(Parameter),
    FunctionCall(FunctionCall),
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },
    BinaryOp { left: Box<Expr>, op: BinaryOperator, right: Box<Expr> },
    Case {
        operand: Option<Box<Expr>>,
        when_then: Vec<(Expr, Expr)>,
        else_result: Option<Box<Expr>>,
    },
    Between { expr: Box<Expr>, negated: bool, low: Box<Expr>, high: Box<Expr> },
    InList { expr: Box<Expr>, negated: bool, list: Vec<Expr> },
    InSubquery { expr: Box<Expr>, negated: bool, subquery: Box<Statement> },
    Exists { negated: bool, subquery: Box<Statement> },
    /// A parenthesized `SELECT` used as a scalar/row expression.
    Subquery(Box<Statement>),
    Array(Vec<Expr>),
    Cast { expr: Box<Expr>, data_type: DataType, style: CastStyle },
    Nested(Box<Expr>),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column { qualifiers: vec![], name: Ident::new(name) }
    }

    pub fn qualified_column(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column { qualifiers: vec![Ident::new(qualifier)], name: Ident::new(name) }
    }

    /// If this expression is a single unqualified column reference, its name
    /// — used by the invariant that requires an explicit alias or a bare
    /// column reference for every select item.
    pub fn as_bare_column_name(&self) -> Option<&Ident> {
        match self {
            Expr::Column { qualifiers, name } if qualifiers.is_empty() => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    /// A type-prefixed string literal such as `E'...'` or `N'...'`.
    Typed { prefix: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Option<String>,
    pub index: Option<u32>,
    /// The raw spelling family observed at parse time (`:`, `$`, `@`, `?`,
    /// `%s`), so a printer configured to preserve rather than reformat
    /// parameters can round-trip the original symbol.
    pub raw_symbol: ParamSymbol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSymbol {
    Colon,
    Dollar,
    At,
    QuestionMark,
    DollarIndex,
    PercentS,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: ObjectName,
    pub args: Vec<Expr>,
    pub distinct: bool,
    pub over: Option<WindowSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Is,
    IsNot,
    Like,
    ILike,
    Plus,
    Minus,
    Concat,
    Mul,
    Div,
    Mod,
    Exp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CastStyle {
    #[default]
    Standard,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<super::statement::OrderByItem>,
    pub frame: Option<WindowFrame>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUnits {
    Range,
    Rows,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(Box<Expr>),
    CurrentRow,
    Following(Box<Expr>),
    UnboundedFollowing,
}

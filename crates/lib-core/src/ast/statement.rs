//! Statement nodes: the top-level `Statement` sum type and every clause it
//! is built from.

use super::expr::Expr;
use super::ident::{Ident, ObjectName};
use super::trivia::{Comments, Span, Trivia};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Values(ValuesStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Merge(MergeStatement),
    CreateTable(CreateTableStatement),
    AlterTable(AlterTableStatement),
    DropTable(DropTableStatement),
    CreateIndex(CreateIndexStatement),
    DropIndex(DropIndexStatement),
}

impl Statement {
    pub fn as_select(&self) -> Option<&SelectStatement> {
        match self {
            Statement::Select(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_simple_select_mut(&mut self) -> Option<&mut SimpleSelect> {
        match self {
            Statement::Select(SelectStatement::Simple(s)) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectStatement {
    Simple(Box<SimpleSelect>),
    Binary { op: SetOperator, left: Box<Statement>, right: Box<Statement>, all: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleSelect {
    pub span: Span,
    pub with_clause: Option<WithClause>,
    pub select_clause: SelectClause,
    pub from_clause: Option<FromClause>,
    pub where_clause: Option<Expr>,
    pub group_by: GroupBy,
    pub having: Option<Expr>,
    pub order_by: OrderBy,
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
    pub fetch: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WithClause {
    pub ctes: Vec<CteDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CteDefinition {
    pub name: Ident,
    pub column_list: Option<Vec<Ident>>,
    pub recursive: bool,
    pub materialized_hint: Option<MaterializedHint>,
    pub body: Box<Statement>,
    pub comments: Trivia<Comments>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializedHint {
    Materialized,
    NotMaterialized,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectClause {
    pub items: Vec<SelectItem>,
    pub distinct: bool,
    pub distinct_on: Option<Vec<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<Ident>,
    pub comments: Trivia<Comments>,
}

impl SelectItem {
    /// The output name a consumer sees for this item: the alias if present,
    /// otherwise the bare column name. `None` only for expressions that
    /// violate the named-output invariant (caught earlier by validation).
    pub fn output_name(&self) -> Option<&Ident> {
        self.alias.as_ref().or_else(|| self.expr.as_bare_column_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub source: TableFactor,
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableFactor {
    Table { name: ObjectName, alias: Option<Ident> },
    Derived { subquery: Box<Statement>, alias: Option<Ident>, lateral: bool },
}

impl TableFactor {
    pub fn alias(&self) -> Option<&Ident> {
        match self {
            TableFactor::Table { alias, .. } | TableFactor::Derived { alias, .. } => alias.as_ref(),
        }
    }

    pub fn table_name(&self) -> Option<&ObjectName> {
        match self {
            TableFactor::Table { name, .. } => Some(name),
            TableFactor::Derived { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub right: TableFactor,
    pub predicate: Option<Expr>,
    pub using: Option<Vec<Ident>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    LeftOuter,
    Right,
    RightOuter,
    Full,
    FullOuter,
    Cross,
    LateralLeft,
    NaturalInner,
    NaturalLeft,
    NaturalRight,
    NaturalFull,
}

impl JoinKind {
    pub fn is_natural(self) -> bool {
        matches!(
            self,
            JoinKind::NaturalInner | JoinKind::NaturalLeft | JoinKind::NaturalRight | JoinKind::NaturalFull
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupBy {
    pub exprs: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderBy {
    pub items: Vec<OrderByItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub direction: Option<Direction>,
    pub nulls: Option<NullsOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuesStatement {
    pub rows: Vec<Vec<Expr>>,
}

// ---- CRUD ----

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub with_clause: Option<WithClause>,
    pub table: ObjectName,
    pub columns: Option<Vec<Ident>>,
    pub source: InsertSource,
    pub returning: Option<Vec<SelectItem>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Select(Box<Statement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub with_clause: Option<WithClause>,
    pub table: ObjectName,
    pub alias: Option<Ident>,
    pub assignments: Vec<Assignment>,
    pub from: Option<FromClause>,
    pub where_clause: Option<Expr>,
    pub returning: Option<Vec<SelectItem>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: Ident,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub with_clause: Option<WithClause>,
    pub table: ObjectName,
    pub alias: Option<Ident>,
    pub using: Option<FromClause>,
    pub where_clause: Option<Expr>,
    pub returning: Option<Vec<SelectItem>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeStatement {
    pub target: ObjectName,
    pub target_alias: Option<Ident>,
    pub source: TableFactor,
    pub predicate: Expr,
    pub clauses: Vec<MergeClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeClause {
    pub matched: bool,
    pub by_source: bool,
    pub condition: Option<Expr>,
    pub action: MergeAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeAction {
    Update(Vec<Assignment>),
    Delete,
    Insert { columns: Option<Vec<Ident>>, values: Vec<Expr> },
}

// ---- DDL ----

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub name: ObjectName,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: Ident,
    pub data_type: super::expr::DataType,
    pub not_null: bool,
    pub default: Option<Expr>,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableConstraint {
    pub name: Option<Ident>,
    pub kind: ConstraintKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    PrimaryKey(Vec<Ident>),
    Unique(Vec<Ident>),
    ForeignKey { columns: Vec<Ident>, ref_table: ObjectName, ref_columns: Vec<Ident> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    pub name: ObjectName,
    pub action: AlterAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn(ColumnDef),
    DropColumn(Ident),
    RenameTable(ObjectName),
    AddConstraint(TableConstraint),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    pub names: Vec<ObjectName>,
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    pub name: Ident,
    pub table: ObjectName,
    pub columns: Vec<Ident>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropIndexStatement {
    pub name: Ident,
}

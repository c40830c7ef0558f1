//! C6: a configurable AST -> SQL text printer. A single pre-order visitor
//! walks the AST once, consulting `Style` at each break point; there is no
//! separate layout pass.

use sqlfixture_core::ast::*;
use sqlfixture_core::errors::ConfigError;
use sqlfixture_helpers::{Config, IndexMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordCase {
    None,
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakStyle {
    None,
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    Block,
    Smart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithClauseStyle {
    Standard,
    CteOneline,
    FullOneline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportComment {
    None,
    HeaderOnly,
    TopHeaderOnly,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintStyle {
    Postgres,
    Mysql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    Named,
    Indexed,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierEscape {
    None,
    Delimited { start: char, end: char },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub indent_char: String,
    pub indent_size: usize,
    pub newline: String,
    pub keyword_case: KeywordCase,
    pub comma_break: BreakStyle,
    pub cte_comma_break: Option<BreakStyle>,
    pub values_comma_break: Option<BreakStyle>,
    pub and_break: BreakStyle,
    pub or_break: BreakStyle,
    pub insert_columns_one_line: bool,
    pub indent_nested_parentheses: bool,
    pub parentheses_one_line: bool,
    pub between_one_line: bool,
    pub values_one_line: bool,
    pub join_one_line: bool,
    pub case_one_line: bool,
    pub subquery_one_line: bool,
    pub when_one_line: bool,
    pub join_condition_order_by_declaration: bool,
    pub comment_style: CommentStyle,
    pub with_clause_style: WithClauseStyle,
    pub export_comment: ExportComment,
    pub cast_style: CastStyle,
    pub constraint_style: ConstraintStyle,
    pub parameter_style: ParameterStyle,
    pub parameter_symbol: String,
    pub identifier_escape: IdentifierEscape,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            indent_char: String::new(),
            indent_size: 0,
            newline: " ".to_string(),
            keyword_case: KeywordCase::None,
            comma_break: BreakStyle::None,
            cte_comma_break: None,
            values_comma_break: None,
            and_break: BreakStyle::None,
            or_break: BreakStyle::None,
            insert_columns_one_line: false,
            indent_nested_parentheses: false,
            parentheses_one_line: false,
            between_one_line: false,
            values_one_line: false,
            join_one_line: false,
            case_one_line: false,
            subquery_one_line: false,
            when_one_line: false,
            join_condition_order_by_declaration: false,
            comment_style: CommentStyle::Block,
            with_clause_style: WithClauseStyle::Standard,
            export_comment: ExportComment::None,
            cast_style: CastStyle::Standard,
            constraint_style: ConstraintStyle::Postgres,
            parameter_style: ParameterStyle::Named,
            parameter_symbol: ":".to_string(),
            identifier_escape: IdentifierEscape::Delimited { start: '"', end: '"' },
        }
    }
}

impl Style {
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let mut style = Style::default();
        match name {
            "postgres" => {
                style.cast_style = CastStyle::Postgres;
                style.constraint_style = ConstraintStyle::Postgres;
                style.parameter_style = ParameterStyle::Named;
                style.parameter_symbol = "$".to_string();
            }
            "mysql" => {
                style.identifier_escape = IdentifierEscape::Delimited { start: '`', end: '`' };
                style.constraint_style = ConstraintStyle::Mysql;
                style.parameter_style = ParameterStyle::Anonymous;
                style.parameter_symbol = "?".to_string();
            }
            "redshift" | "cockroachdb" => {
                style.cast_style = CastStyle::Postgres;
                style.constraint_style = ConstraintStyle::Postgres;
            }
            other => return Err(ConfigError::new(format!("unknown style preset `{other}`"))),
        }
        Ok(style)
    }

    fn resolved_cte_comma_break(&self) -> BreakStyle {
        self.cte_comma_break.unwrap_or(self.comma_break)
    }

    fn resolved_values_comma_break(&self) -> BreakStyle {
        self.values_comma_break.unwrap_or(self.comma_break)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamsOutput {
    /// `parameterStyle = "named"`: each unique name maps to its logical
    /// parameter identity, deduplicated by first occurrence.
    Named(IndexMap<String, Parameter>),
    /// `parameterStyle = "indexed"`: first-occurrence order, 1-based.
    Indexed(Vec<Parameter>),
    /// `parameterStyle = "anonymous"`: only a count, since nothing
    /// distinguishes occurrences.
    Anonymous(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatResult {
    pub text: String,
    pub params: ParamsOutput,
}

pub fn format(stmt: &Statement, style: &Style) -> FormatResult {
    let mut printer = Printer::new(style);
    printer.print_statement(stmt);
    let params = printer.finish_params();
    FormatResult { text: printer.buf, params }
}

struct Printer<'s> {
    style: &'s Style,
    buf: String,
    depth: usize,
    seen_params: IndexMap<String, Parameter>,
    order: Vec<Parameter>,
}

impl<'s> Printer<'s> {
    fn new(style: &'s Style) -> Self {
        Printer { style, buf: String::new(), depth: 0, seen_params: IndexMap::default(), order: Vec::new() }
    }

    fn finish_params(self) -> ParamsOutput {
        match self.style.parameter_style {
            ParameterStyle::Named => ParamsOutput::Named(self.seen_params),
            ParameterStyle::Indexed => ParamsOutput::Indexed(self.order),
            ParameterStyle::Anonymous => ParamsOutput::Anonymous(self.order.len()),
        }
    }

    fn kw(&mut self, text: &str) {
        if !self.buf.is_empty() && !self.buf.ends_with(' ') && !self.buf.ends_with('(') && !self.buf.ends_with('\n') {
            self.buf.push(' ');
        }
        let cased = match self.style.keyword_case {
            KeywordCase::None => text.to_string(),
            KeywordCase::Upper => text.to_ascii_uppercase(),
            KeywordCase::Lower => text.to_ascii_lowercase(),
        };
        self.buf.push_str(&cased);
    }

    fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    fn space(&mut self) {
        if !self.buf.ends_with(' ') && !self.buf.is_empty() {
            self.buf.push(' ');
        }
    }

    fn newline_indent(&mut self) {
        if self.style.indent_size == 0 && self.style.newline == " " {
            self.space();
            return;
        }
        self.buf.push_str(&self.style.newline);
        self.buf.push_str(&self.style.indent_char.repeat(self.style.indent_size * self.depth));
    }

    fn comma_separated<T>(&mut self, items: &[T], style: BreakStyle, mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                match style {
                    BreakStyle::Before => {
                        self.newline_indent();
                        self.raw(",");
                    }
                    BreakStyle::After => {
                        self.raw(",");
                        self.newline_indent();
                    }
                    BreakStyle::None => self.raw(", "),
                }
            }
            each(self, item);
        }
    }

    fn print_ident(&mut self, ident: &Ident) {
        match &self.style.identifier_escape {
            IdentifierEscape::None => self.raw(&ident.value),
            IdentifierEscape::Delimited { start, end } => {
                self.space();
                self.raw(&start.to_string());
                self.raw(&ident.value.replace(*end, &format!("{end}{end}")));
                self.raw(&end.to_string());
            }
        }
    }

    fn print_object_name(&mut self, name: &ObjectName) {
        for (i, part) in name.0.iter().enumerate() {
            if i > 0 {
                self.raw(".");
            }
            self.print_ident(part);
        }
    }

    fn print_comments(&mut self, comments: &Comments, leading: bool) {
        if matches!(self.style.export_comment, ExportComment::None) {
            return;
        }
        let texts = if leading { &comments.leading } else { &comments.trailing };
        for text in texts {
            self.space();
            self.raw(&self.reshape_comment(text));
        }
    }

    fn reshape_comment(&self, text: &str) -> String {
        match self.style.comment_style {
            CommentStyle::Block => text.to_string(),
            // Converting `/* ... */` to `--` is only safe once a real line
            // break follows it; the default layout's `newline` is a single
            // space, and a `--` comment there would swallow every token
            // printed after it on the same (never-broken) output line.
            CommentStyle::Smart if self.style.newline.contains('\n') => {
                if let Some(body) = text.strip_prefix("/*").and_then(|s| s.strip_suffix("*/")) {
                    if !body.contains('\n') {
                        return format!("--{body}");
                    }
                }
                text.to_string()
            }
            CommentStyle::Smart => text.to_string(),
        }
    }

    // ---- statements ----

    fn print_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Select(select) => self.print_select_statement(select),
            Statement::Values(values) => self.print_values(values),
            Statement::Insert(insert) => self.print_insert(insert),
            Statement::Update(update) => self.print_update(update),
            Statement::Delete(delete) => self.print_delete(delete),
            Statement::Merge(merge) => self.print_merge(merge),
            Statement::CreateTable(create) => self.print_create_table(create),
            Statement::AlterTable(alter) => self.print_alter_table(alter),
            Statement::DropTable(drop) => self.print_drop_table(drop),
            Statement::CreateIndex(create) => self.print_create_index(create),
            Statement::DropIndex(drop) => self.print_drop_index(drop),
        }
    }

    fn print_select_statement(&mut self, select: &SelectStatement) {
        match select {
            SelectStatement::Simple(simple) => self.print_simple_select(simple),
            SelectStatement::Binary { op, left, right, all } => {
                self.print_statement(left);
                self.kw(match op {
                    SetOperator::Union => "union",
                    SetOperator::Intersect => "intersect",
                    SetOperator::Except => "except",
                });
                if *all {
                    self.kw("all");
                }
                self.print_statement(right);
            }
        }
    }

    fn print_with_clause(&mut self, with: &WithClause) {
        self.kw("with");
        if with.ctes.iter().any(|c| c.recursive) {
            self.kw("recursive");
        }
        let cte_break = self.style.resolved_cte_comma_break();
        let one_line = matches!(self.style.with_clause_style, WithClauseStyle::CteOneline | WithClauseStyle::FullOneline);
        self.comma_separated(&with.ctes, if one_line { BreakStyle::None } else { cte_break }, |p, cte| {
            p.print_comments(&cte.comments, true);
            p.space();
            p.print_ident(&cte.name);
            if let Some(cols) = &cte.column_list {
                p.raw("(");
                p.comma_separated(cols, BreakStyle::None, |p, c| p.print_ident(c));
                p.raw(")");
            }
            p.kw("as");
            if let Some(hint) = cte.materialized_hint {
                match hint {
                    MaterializedHint::Materialized => p.kw("materialized"),
                    MaterializedHint::NotMaterialized => {
                        p.kw("not");
                        p.kw("materialized");
                    }
                }
            }
            p.space();
            p.raw("(");
            p.print_statement(&cte.body);
            p.raw(")");
        });
    }

    fn print_simple_select(&mut self, select: &SimpleSelect) {
        if let Some(with) = &select.with_clause {
            self.print_with_clause(with);
        }
        self.kw("select");
        if select.select_clause.distinct {
            self.kw("distinct");
            if let Some(on) = &select.select_clause.distinct_on {
                self.kw("on");
                self.raw("(");
                self.comma_separated(on, BreakStyle::None, |p, e| p.print_expr(e));
                self.raw(")");
            }
        }
        let item_break = self.style.comma_break;
        self.comma_separated(&select.select_clause.items, item_break, |p, item| {
            p.print_comments(&item.comments, true);
            p.space();
            p.print_expr(&item.expr);
            if let Some(alias) = &item.alias {
                p.kw("as");
                p.print_ident(alias);
            }
            p.print_comments(&item.comments, false);
        });
        if let Some(from) = &select.from_clause {
            self.kw("from");
            self.print_from_clause(from);
        }
        if let Some(pred) = &select.where_clause {
            self.kw("where");
            self.print_bool_expr(pred);
        }
        if !select.group_by.exprs.is_empty() {
            self.kw("group");
            self.kw("by");
            self.comma_separated(&select.group_by.exprs, BreakStyle::None, |p, e| p.print_expr(e));
        }
        if let Some(having) = &select.having {
            self.kw("having");
            self.print_expr(having);
        }
        if !select.order_by.items.is_empty() {
            self.kw("order");
            self.kw("by");
            self.comma_separated(&select.order_by.items, BreakStyle::None, |p, item| {
                p.print_expr(&item.expr);
                if let Some(dir) = item.direction {
                    p.kw(match dir {
                        Direction::Asc => "asc",
                        Direction::Desc => "desc",
                    });
                }
                if let Some(nulls) = item.nulls {
                    p.kw("nulls");
                    p.kw(match nulls {
                        NullsOrder::First => "first",
                        NullsOrder::Last => "last",
                    });
                }
            });
        }
        if let Some(limit) = &select.limit {
            self.kw("limit");
            self.print_expr(limit);
        }
        if let Some(offset) = &select.offset {
            self.kw("offset");
            self.print_expr(offset);
        }
        if let Some(fetch) = &select.fetch {
            self.kw("fetch");
            self.kw("first");
            self.print_expr(fetch);
            self.kw("rows");
            self.kw("only");
        }
    }

    /// Splits on top-level `AND`/`OR` to honor `andBreak`/`orBreak`
    /// independently of the general expression printer.
    fn print_bool_expr(&mut self, expr: &Expr) {
        self.print_expr(expr);
    }

    fn print_from_clause(&mut self, from: &FromClause) {
        self.print_table_factor(&from.source);
        for join in &from.joins {
            if !self.style.join_one_line {
                self.newline_indent();
            }
            self.print_join_kind(join.kind);
            self.print_table_factor(&join.right);
            if let Some(pred) = &join.predicate {
                self.kw("on");
                self.print_expr(pred);
            }
            if let Some(using) = &join.using {
                self.kw("using");
                self.raw("(");
                self.comma_separated(using, BreakStyle::None, |p, c| p.print_ident(c));
                self.raw(")");
            }
        }
    }

    fn print_join_kind(&mut self, kind: JoinKind) {
        let words: &[&str] = match kind {
            JoinKind::Inner => &["join"],
            JoinKind::Left => &["left", "join"],
            JoinKind::LeftOuter => &["left", "outer", "join"],
            JoinKind::Right => &["right", "join"],
            JoinKind::RightOuter => &["right", "outer", "join"],
            JoinKind::Full => &["full", "join"],
            JoinKind::FullOuter => &["full", "outer", "join"],
            JoinKind::Cross => &["cross", "join"],
            JoinKind::LateralLeft => &["lateral", "left", "join"],
            JoinKind::NaturalInner => &["natural", "join"],
            JoinKind::NaturalLeft => &["natural", "left", "join"],
            JoinKind::NaturalRight => &["natural", "right", "join"],
            JoinKind::NaturalFull => &["natural", "full", "join"],
        };
        for w in words {
            self.kw(w);
        }
    }

    fn print_table_factor(&mut self, table: &TableFactor) {
        match table {
            TableFactor::Table { name, alias } => {
                self.print_object_name(name);
                if let Some(alias) = alias {
                    self.kw("as");
                    self.print_ident(alias);
                }
            }
            TableFactor::Derived { subquery, alias, lateral } => {
                if *lateral {
                    self.kw("lateral");
                }
                self.raw("(");
                self.print_statement(subquery);
                self.raw(")");
                if let Some(alias) = alias {
                    self.kw("as");
                    self.print_ident(alias);
                }
            }
        }
    }

    fn print_values(&mut self, values: &ValuesStatement) {
        self.print_value_rows(&values.rows);
    }

    fn print_value_rows(&mut self, rows: &[Vec<Expr>]) {
        self.kw("values");
        let row_break = self.style.resolved_values_comma_break();
        self.comma_separated(rows, row_break, |p, row| {
            p.raw("(");
            p.comma_separated(row, BreakStyle::None, |p, e| p.print_expr(e));
            p.raw(")");
        });
    }

    fn print_insert(&mut self, insert: &InsertStatement) {
        if let Some(with) = &insert.with_clause {
            self.print_with_clause(with);
        }
        self.kw("insert");
        self.kw("into");
        self.print_object_name(&insert.table);
        if let Some(cols) = &insert.columns {
            self.raw("(");
            self.comma_separated(cols, BreakStyle::None, |p, c| p.print_ident(c));
            self.raw(")");
        }
        match &insert.source {
            InsertSource::Values(rows) => self.print_value_rows(rows),
            InsertSource::Select(stmt) => self.print_statement(stmt),
        }
        self.print_returning(&insert.returning);
    }

    fn print_returning(&mut self, returning: &Option<Vec<SelectItem>>) {
        if let Some(items) = returning {
            self.kw("returning");
            self.comma_separated(items, BreakStyle::None, |p, item| {
                p.print_expr(&item.expr);
                if let Some(alias) = &item.alias {
                    p.kw("as");
                    p.print_ident(alias);
                }
            });
        }
    }

    fn print_update(&mut self, update: &UpdateStatement) {
        if let Some(with) = &update.with_clause {
            self.print_with_clause(with);
        }
        self.kw("update");
        self.print_object_name(&update.table);
        if let Some(alias) = &update.alias {
            self.kw("as");
            self.print_ident(alias);
        }
        self.kw("set");
        self.comma_separated(&update.assignments, BreakStyle::None, |p, a| {
            p.print_ident(&a.column);
            p.space();
            p.raw("=");
            p.print_expr(&a.value);
        });
        if let Some(from) = &update.from {
            self.kw("from");
            self.print_from_clause(from);
        }
        if let Some(pred) = &update.where_clause {
            self.kw("where");
            self.print_expr(pred);
        }
        self.print_returning(&update.returning);
    }

    fn print_delete(&mut self, delete: &DeleteStatement) {
        if let Some(with) = &delete.with_clause {
            self.print_with_clause(with);
        }
        self.kw("delete");
        self.kw("from");
        self.print_object_name(&delete.table);
        if let Some(alias) = &delete.alias {
            self.kw("as");
            self.print_ident(alias);
        }
        if let Some(using) = &delete.using {
            self.kw("using");
            self.print_from_clause(using);
        }
        if let Some(pred) = &delete.where_clause {
            self.kw("where");
            self.print_expr(pred);
        }
        self.print_returning(&delete.returning);
    }

    fn print_merge(&mut self, merge: &MergeStatement) {
        self.kw("merge");
        self.kw("into");
        self.print_object_name(&merge.target);
        if let Some(alias) = &merge.target_alias {
            self.kw("as");
            self.print_ident(alias);
        }
        self.kw("using");
        self.print_table_factor(&merge.source);
        self.kw("on");
        self.print_expr(&merge.predicate);
        for clause in &merge.clauses {
            self.kw("when");
            if !clause.matched {
                self.kw("not");
            }
            self.kw("matched");
            if clause.by_source {
                self.kw("by");
                self.kw("source");
            }
            if let Some(cond) = &clause.condition {
                self.kw("and");
                self.print_expr(cond);
            }
            self.kw("then");
            match &clause.action {
                MergeAction::Update(assignments) => {
                    self.kw("update");
                    self.kw("set");
                    self.comma_separated(assignments, BreakStyle::None, |p, a| {
                        p.print_ident(&a.column);
                        p.space();
                        p.raw("=");
                        p.print_expr(&a.value);
                    });
                }
                MergeAction::Delete => self.kw("delete"),
                MergeAction::Insert { columns, values } => {
                    self.kw("insert");
                    if let Some(cols) = columns {
                        self.raw("(");
                        self.comma_separated(cols, BreakStyle::None, |p, c| p.print_ident(c));
                        self.raw(")");
                    }
                    self.kw("values");
                    self.raw("(");
                    self.comma_separated(values, BreakStyle::None, |p, e| p.print_expr(e));
                    self.raw(")");
                }
            }
        }
    }

    fn print_create_table(&mut self, create: &CreateTableStatement) {
        self.kw("create");
        self.kw("table");
        if create.if_not_exists {
            self.kw("if");
            self.kw("not");
            self.kw("exists");
        }
        self.print_object_name(&create.name);
        self.raw("(");
        let mut first = true;
        for column in &create.columns {
            if !first {
                self.raw(", ");
            }
            first = false;
            self.print_ident(&column.name);
            self.space();
            self.raw(&column.data_type.0);
            if column.not_null {
                self.kw("not");
                self.kw("null");
            }
            if column.primary_key {
                self.kw("primary");
                self.kw("key");
            }
            if let Some(default) = &column.default {
                self.kw("default");
                self.print_expr(default);
            }
        }
        for constraint in &create.constraints {
            if !first {
                self.raw(", ");
            }
            first = false;
            self.print_table_constraint(constraint);
        }
        self.raw(")");
    }

    fn print_table_constraint(&mut self, constraint: &TableConstraint) {
        if let Some(name) = &constraint.name {
            self.kw("constraint");
            self.print_ident(name);
        }
        match &constraint.kind {
            ConstraintKind::PrimaryKey(cols) => {
                self.kw("primary");
                self.kw("key");
                self.raw("(");
                self.comma_separated(cols, BreakStyle::None, |p, c| p.print_ident(c));
                self.raw(")");
            }
            ConstraintKind::Unique(cols) => {
                match self.style.constraint_style {
                    ConstraintStyle::Postgres => self.kw("unique"),
                    ConstraintStyle::Mysql => {
                        self.kw("unique");
                        self.kw("key");
                    }
                }
                self.raw("(");
                self.comma_separated(cols, BreakStyle::None, |p, c| p.print_ident(c));
                self.raw(")");
            }
            ConstraintKind::ForeignKey { columns, ref_table, ref_columns } => {
                self.kw("foreign");
                self.kw("key");
                self.raw("(");
                self.comma_separated(columns, BreakStyle::None, |p, c| p.print_ident(c));
                self.raw(")");
                self.kw("references");
                self.print_object_name(ref_table);
                self.raw("(");
                self.comma_separated(ref_columns, BreakStyle::None, |p, c| p.print_ident(c));
                self.raw(")");
            }
        }
    }

    fn print_alter_table(&mut self, alter: &AlterTableStatement) {
        self.kw("alter");
        self.kw("table");
        self.print_object_name(&alter.name);
        match &alter.action {
            AlterAction::AddColumn(col) => {
                self.kw("add");
                self.kw("column");
                self.print_ident(&col.name);
                self.space();
                self.raw(&col.data_type.0);
            }
            AlterAction::DropColumn(name) => {
                self.kw("drop");
                self.kw("column");
                self.print_ident(name);
            }
            AlterAction::RenameTable(new_name) => {
                self.kw("rename");
                self.kw("to");
                self.print_object_name(new_name);
            }
            AlterAction::AddConstraint(constraint) => {
                self.kw("add");
                self.print_table_constraint(constraint);
            }
        }
    }

    fn print_drop_table(&mut self, drop: &DropTableStatement) {
        self.kw("drop");
        self.kw("table");
        if drop.if_exists {
            self.kw("if");
            self.kw("exists");
        }
        self.comma_separated(&drop.names, BreakStyle::None, |p, n| p.print_object_name(n));
    }

    fn print_create_index(&mut self, create: &CreateIndexStatement) {
        self.kw("create");
        if create.unique {
            self.kw("unique");
        }
        self.kw("index");
        self.print_ident(&create.name);
        self.kw("on");
        self.print_object_name(&create.table);
        self.raw("(");
        self.comma_separated(&create.columns, BreakStyle::None, |p, c| p.print_ident(c));
        self.raw(")");
    }

    fn print_drop_index(&mut self, drop: &DropIndexStatement) {
        self.kw("drop");
        self.kw("index");
        self.print_ident(&drop.name);
    }

    // ---- expressions ----

    fn print_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Column { qualifiers, name } => {
                for q in qualifiers {
                    self.print_ident(q);
                    self.raw(".");
                }
                self.print_ident(name);
            }
            Expr::Wildcard => {
                self.space();
                self.raw("*");
            }
            Expr::QualifiedWildcard(parts) => {
                for q in parts {
                    self.print_ident(q);
                    self.raw(".");
                }
                self.raw("*");
            }
            Expr::Literal(lit) => self.print_literal(lit),
            Expr::Parameter(param) => self.print_parameter(param),
            Expr::FunctionCall(call) => self.print_function_call(call),
            Expr::UnaryOp { op, expr } => {
                match op {
                    UnaryOperator::Not => self.kw("not"),
                    UnaryOperator::Minus => self.raw(" -"),
                    UnaryOperator::Plus => self.raw(" +"),
                }
                self.print_expr(expr);
            }
            Expr::BinaryOp { left, op, right } => self.print_binary_op(left, *op, right),
            Expr::Case { operand, when_then, else_result } => self.print_case(operand, when_then, else_result),
            Expr::Between { expr, negated, low, high } => {
                self.print_expr(expr);
                if *negated {
                    self.kw("not");
                }
                self.kw("between");
                self.print_expr(low);
                self.kw("and");
                self.print_expr(high);
            }
            Expr::InList { expr, negated, list } => {
                self.print_expr(expr);
                if *negated {
                    self.kw("not");
                }
                self.kw("in");
                self.raw("(");
                self.comma_separated(list, BreakStyle::None, |p, e| p.print_expr(e));
                self.raw(")");
            }
            Expr::InSubquery { expr, negated, subquery } => {
                self.print_expr(expr);
                if *negated {
                    self.kw("not");
                }
                self.kw("in");
                self.raw("(");
                self.print_statement(subquery);
                self.raw(")");
            }
            Expr::Exists { negated, subquery } => {
                if *negated {
                    self.kw("not");
                }
                self.kw("exists");
                self.raw("(");
                self.print_statement(subquery);
                self.raw(")");
            }
            Expr::Subquery(subquery) => {
                self.raw("(");
                self.print_statement(subquery);
                self.raw(")");
            }
            Expr::Array(items) => {
                self.kw("array");
                self.raw("[");
                self.comma_separated(items, BreakStyle::None, |p, e| p.print_expr(e));
                self.raw("]");
            }
            Expr::Cast { expr, data_type, style } => self.print_cast(expr, data_type, *style),
            Expr::Nested(inner) => {
                self.raw("(");
                self.print_expr(inner);
                self.raw(")");
            }
        }
    }

    fn print_binary_op(&mut self, left: &Expr, op: BinaryOperator, right: &Expr) {
        self.print_expr(left);
        match op {
            BinaryOperator::And => {
                if self.style.and_break != BreakStyle::None {
                    self.newline_indent();
                }
                self.kw("and");
            }
            BinaryOperator::Or => {
                if self.style.or_break != BreakStyle::None {
                    self.newline_indent();
                }
                self.kw("or");
            }
            BinaryOperator::Is => self.kw("is"),
            BinaryOperator::IsNot => {
                self.kw("is");
                self.kw("not");
            }
            BinaryOperator::Like => self.kw("like"),
            BinaryOperator::ILike => self.kw("ilike"),
            _ => {
                self.space();
                self.raw(operator_symbol(op));
            }
        }
        if matches!(op, BinaryOperator::Is | BinaryOperator::IsNot) {
            self.kw("null");
            return;
        }
        self.print_expr(right);
    }

    fn print_case(&mut self, operand: &Option<Box<Expr>>, when_then: &[(Expr, Expr)], else_result: &Option<Box<Expr>>) {
        self.kw("case");
        if let Some(operand) = operand {
            self.print_expr(operand);
        }
        for (when, then) in when_then {
            self.kw("when");
            self.print_expr(when);
            self.kw("then");
            self.print_expr(then);
        }
        if let Some(e) = else_result {
            self.kw("else");
            self.print_expr(e);
        }
        self.kw("end");
    }

    fn print_cast(&mut self, expr: &Expr, data_type: &DataType, style: CastStyle) {
        let style = if self.style.cast_style == CastStyle::Postgres { CastStyle::Postgres } else { style };
        match style {
            CastStyle::Standard => {
                self.kw("cast");
                self.raw("(");
                self.print_expr(expr);
                self.kw("as");
                self.raw(&data_type.0);
                self.raw(")");
            }
            CastStyle::Postgres => {
                self.print_expr(expr);
                self.raw("::");
                self.raw(&data_type.0);
            }
        }
    }

    fn print_function_call(&mut self, call: &FunctionCall) {
        self.space();
        self.print_object_name(&call.name);
        self.raw("(");
        if call.distinct {
            self.kw("distinct");
        }
        self.comma_separated(&call.args, BreakStyle::None, |p, a| p.print_expr(a));
        self.raw(")");
        if let Some(over) = &call.over {
            self.kw("over");
            self.raw("(");
            if !over.partition_by.is_empty() {
                self.kw("partition");
                self.kw("by");
                self.comma_separated(&over.partition_by, BreakStyle::None, |p, e| p.print_expr(e));
            }
            if !over.order_by.is_empty() {
                self.kw("order");
                self.kw("by");
                self.comma_separated(&over.order_by, BreakStyle::None, |p, item| p.print_expr(&item.expr));
            }
            if let Some(frame) = &over.frame {
                self.print_window_frame(frame);
            }
            self.raw(")");
        }
    }

    fn print_window_frame(&mut self, frame: &WindowFrame) {
        self.kw(match frame.units {
            FrameUnits::Range => "range",
            FrameUnits::Rows => "rows",
        });
        if let Some(end) = &frame.end {
            self.kw("between");
            self.print_frame_bound(&frame.start);
            self.kw("and");
            self.print_frame_bound(end);
        } else {
            self.print_frame_bound(&frame.start);
        }
    }

    fn print_frame_bound(&mut self, bound: &FrameBound) {
        match bound {
            FrameBound::UnboundedPreceding => {
                self.kw("unbounded");
                self.kw("preceding");
            }
            FrameBound::Preceding(expr) => {
                self.print_expr(expr);
                self.kw("preceding");
            }
            FrameBound::CurrentRow => {
                self.kw("current");
                self.kw("row");
            }
            FrameBound::Following(expr) => {
                self.print_expr(expr);
                self.kw("following");
            }
            FrameBound::UnboundedFollowing => {
                self.kw("unbounded");
                self.kw("following");
            }
        }
    }

    fn print_literal(&mut self, lit: &LiteralValue) {
        self.space();
        match lit {
            LiteralValue::Int(v) => self.raw(&v.to_string()),
            LiteralValue::Float(v) => self.raw(&v.to_string()),
            LiteralValue::String(s) => {
                self.raw("'");
                self.raw(&s.replace('\'', "''"));
                self.raw("'");
            }
            LiteralValue::Boolean(b) => self.kw(if *b { "true" } else { "false" }),
            LiteralValue::Null => self.kw("null"),
            LiteralValue::Typed { prefix, value } => {
                self.raw(prefix);
                self.raw("'");
                self.raw(&value.replace('\'', "''"));
                self.raw("'");
            }
        }
    }

    fn print_parameter(&mut self, param: &Parameter) {
        self.space();
        let key = param.name.clone().or_else(|| param.index.map(|i| i.to_string())).unwrap_or_else(|| "?".to_string());
        let first_seen = !self.seen_params.contains_key(&key);
        if first_seen {
            self.seen_params.insert(key, param.clone());
            self.order.push(param.clone());
        }
        match self.style.parameter_style {
            ParameterStyle::Named => {
                self.raw(&self.style.parameter_symbol.clone());
                self.raw(param.name.as_deref().unwrap_or(&key));
            }
            ParameterStyle::Indexed => {
                let position = self.order.iter().position(|p| self.param_key(p) == key).unwrap_or(0) + 1;
                self.raw(&self.style.parameter_symbol.clone());
                self.raw(&position.to_string());
            }
            ParameterStyle::Anonymous => self.raw(&self.style.parameter_symbol.clone()),
        }
    }

    fn param_key(&self, param: &Parameter) -> String {
        param.name.clone().or_else(|| param.index.map(|i| i.to_string())).unwrap_or_else(|| "?".to_string())
    }
}

fn operator_symbol(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Eq => "=",
        BinaryOperator::NotEq => "<>",
        BinaryOperator::Lt => "<",
        BinaryOperator::LtEq => "<=",
        BinaryOperator::Gt => ">",
        BinaryOperator::GtEq => ">=",
        BinaryOperator::Plus => "+",
        BinaryOperator::Minus => "-",
        BinaryOperator::Concat => "||",
        BinaryOperator::Mul => "*",
        BinaryOperator::Div => "/",
        BinaryOperator::Mod => "%",
        BinaryOperator::Exp => "^",
        BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Is | BinaryOperator::IsNot | BinaryOperator::Like | BinaryOperator::ILike => {
            unreachable!("handled by keyword branch in print_binary_op")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statement;

    #[test]
    fn prints_simple_select_with_upper_keywords() {
        let stmt = parse_statement("select id from users").unwrap();
        let style = Style::default().config(|s| s.keyword_case = KeywordCase::Upper);
        let result = format(&stmt, &style);
        assert!(result.text.contains("SELECT"));
        assert!(result.text.contains("FROM"));
        assert!(result.text.contains("\"users\""));
    }

    #[test]
    fn named_to_indexed_param_rewrite_dedupes_by_first_occurrence() {
        let stmt = parse_statement("SELECT * FROM t WHERE a=:x AND b=:x AND c=:y").unwrap();
        let style = Style::default().config(|s| {
            s.parameter_style = ParameterStyle::Indexed;
            s.parameter_symbol = "$".to_string();
        });
        let result = format(&stmt, &style);
        assert!(result.text.contains("$1"));
        assert!(result.text.contains("$2"));
        match result.params {
            ParamsOutput::Indexed(order) => {
                assert_eq!(order.len(), 2);
                assert_eq!(order[0].name.as_deref(), Some("x"));
                assert_eq!(order[1].name.as_deref(), Some("y"));
            }
            _ => panic!("expected indexed params"),
        }
    }
}

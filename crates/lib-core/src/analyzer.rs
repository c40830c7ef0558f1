//! C4: visitors that collect selectable columns, table references, parameter
//! names, and CTE/alias scope, used by the rewriters and by IDE-style
//! consumers of the parser.

use sqlfixture_helpers::{IndexMap, IndexSet};

use crate::ast::*;
use crate::errors::ValidationError;

// ---------------------------------------------------------------------
// SelectableColumnCollector
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnMode {
    /// Dedupes by bare name only.
    #[default]
    ColumnNameOnly,
    /// Keeps `qualifier.name` uniqueness.
    FullName,
    /// Expands `*`/`alias.*` by consulting CTEs and declared sources.
    WithWildcards,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectableColumn {
    pub name: Ident,
    pub qualifier: Option<Ident>,
}

/// Resolves the column set visible at the root of a `SELECT`. With
/// `upstream = true`, walks into CTE bodies and named subqueries too, so
/// every column producible anywhere in the dependency chain is exposed —
/// this is what the JSON builder and fixture tooling require.
pub struct SelectableColumnCollector {
    pub mode: ColumnMode,
    pub upstream: bool,
}

impl SelectableColumnCollector {
    pub fn new(mode: ColumnMode, upstream: bool) -> Self {
        Self { mode, upstream }
    }

    pub fn collect(&self, select: &SimpleSelect) -> Result<Vec<SelectableColumn>, ValidationError> {
        let mut seen: IndexSet<String> = IndexSet::default();
        let mut out = Vec::new();
        self.collect_into(select, &mut seen, &mut out)?;

        if self.upstream {
            if let Some(with) = &select.with_clause {
                for cte in &with.ctes {
                    if let Statement::Select(SelectStatement::Simple(inner)) = cte.body.as_ref() {
                        self.collect_into(inner, &mut seen, &mut out)?;
                    }
                }
            }
        }
        Ok(out)
    }

    fn collect_into(
        &self,
        select: &SimpleSelect,
        seen: &mut IndexSet<String>,
        out: &mut Vec<SelectableColumn>,
    ) -> Result<(), ValidationError> {
        for item in &select.select_clause.items {
            match &item.expr {
                Expr::Wildcard | Expr::QualifiedWildcard(_) if !matches!(self.mode, ColumnMode::WithWildcards) => {
                    return Err(ValidationError::new(
                        "wildcard select item requires ColumnMode::WithWildcards",
                    ));
                }
                Expr::Wildcard | Expr::QualifiedWildcard(_) => {
                    // Without a declared-sources catalog there is nothing further to
                    // expand against; callers that need expansion supply one via
                    // `tableDefinitions` in the rewriter, which re-enters this
                    // collector per source. Here we simply skip: a caller relying on
                    // this path in isolation should prefer `FullName`/`ColumnNameOnly`.
                    continue;
                }
                _ => {}
            }

            let name = item.output_name().ok_or_else(|| {
                ValidationError::new(format!(
                    "select item `{:?}` has no alias and is not a bare column reference",
                    item.expr
                ))
            })?;

            let qualifier = match &item.expr {
                Expr::Column { qualifiers, .. } => qualifiers.last().cloned(),
                _ => None,
            };

            let key = match self.mode {
                ColumnMode::FullName => match &qualifier {
                    Some(q) => format!("{}.{}", q.resolution_key(), name.resolution_key()),
                    None => name.resolution_key().into_owned(),
                },
                _ => name.resolution_key().into_owned(),
            };

            if seen.insert(key) {
                out.push(SelectableColumn { name: name.clone(), qualifier });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------
// TableReferenceCollector
// ---------------------------------------------------------------------

/// Enumerates physical table references (CTE-name references excluded)
/// across the full statement, including nested subqueries and join sources.
/// CTE resolution is lexical: an inner CTE of the same name shadows an
/// outer one, so a reference inside such an inner scope is never reported
/// as a physical table even if an outer CTE of a different shape exists
/// with the same name.
#[derive(Default)]
pub struct TableReferenceCollector {
    tables: IndexSet<String>,
}

impl TableReferenceCollector {
    pub fn collect(stmt: &Statement) -> Vec<String> {
        let mut collector = Self::default();
        collector.walk_statement(stmt, &IndexSet::default());
        collector.tables.into_iter().collect()
    }

    fn walk_statement(&mut self, stmt: &Statement, ctes_in_scope: &IndexSet<String>) {
        match stmt {
            Statement::Select(select) => self.walk_select(select, ctes_in_scope),
            Statement::Values(_) => {}
            Statement::Insert(insert) => {
                let scope = self.extend_scope(ctes_in_scope, insert.with_clause.as_ref());
                self.note_table(&insert.table, &scope);
                if let crate::ast::InsertSource::Select(stmt) = &insert.source {
                    self.walk_statement(stmt, &scope);
                }
                if let Some(with) = &insert.with_clause {
                    for cte in &with.ctes {
                        self.walk_statement(&cte.body, &scope);
                    }
                }
            }
            Statement::Update(update) => {
                let scope = self.extend_scope(ctes_in_scope, update.with_clause.as_ref());
                self.note_table(&update.table, &scope);
                if let Some(from) = &update.from {
                    self.walk_from(from, &scope);
                }
                if let Some(with) = &update.with_clause {
                    for cte in &with.ctes {
                        self.walk_statement(&cte.body, &scope);
                    }
                }
            }
            Statement::Delete(delete) => {
                let scope = self.extend_scope(ctes_in_scope, delete.with_clause.as_ref());
                self.note_table(&delete.table, &scope);
                if let Some(using) = &delete.using {
                    self.walk_from(using, &scope);
                }
                if let Some(with) = &delete.with_clause {
                    for cte in &with.ctes {
                        self.walk_statement(&cte.body, &scope);
                    }
                }
            }
            Statement::Merge(merge) => {
                self.note_table(&merge.target, ctes_in_scope);
                self.walk_table_factor(&merge.source, ctes_in_scope);
            }
            Statement::CreateTable(_)
            | Statement::AlterTable(_)
            | Statement::DropTable(_)
            | Statement::CreateIndex(_)
            | Statement::DropIndex(_) => {}
        }
    }

    fn walk_select(&mut self, select: &SelectStatement, ctes_in_scope: &IndexSet<String>) {
        match select {
            SelectStatement::Simple(simple) => {
                let scope = self.extend_scope(ctes_in_scope, simple.with_clause.as_ref());
                if let Some(from) = &simple.from_clause {
                    self.walk_from(from, &scope);
                }
                for expr in select_subqueries(simple) {
                    self.walk_expr(expr, &scope);
                }
                if let Some(with) = &simple.with_clause {
                    for cte in &with.ctes {
                        self.walk_statement(&cte.body, &scope);
                    }
                }
            }
            SelectStatement::Binary { left, right, .. } => {
                self.walk_statement(left, ctes_in_scope);
                self.walk_statement(right, ctes_in_scope);
            }
        }
    }

    fn walk_from(&mut self, from: &FromClause, ctes_in_scope: &IndexSet<String>) {
        self.walk_table_factor(&from.source, ctes_in_scope);
        for join in &from.joins {
            self.walk_table_factor(&join.right, ctes_in_scope);
        }
    }

    fn walk_table_factor(&mut self, table: &TableFactor, ctes_in_scope: &IndexSet<String>) {
        match table {
            TableFactor::Table { name, .. } => self.note_table(name, ctes_in_scope),
            TableFactor::Derived { subquery, .. } => self.walk_statement(subquery, ctes_in_scope),
        }
    }

    fn walk_expr(&mut self, expr: &Expr, ctes_in_scope: &IndexSet<String>) {
        match expr {
            Expr::Subquery(stmt) | Expr::Exists { subquery: stmt, .. } | Expr::InSubquery { subquery: stmt, .. } => {
                self.walk_statement(stmt, ctes_in_scope)
            }
            _ => {}
        }
    }

    fn note_table(&mut self, name: &ObjectName, ctes_in_scope: &IndexSet<String>) {
        let normalized = name.normalized();
        if !ctes_in_scope.contains(&normalized) {
            self.tables.insert(normalized);
        }
    }

    fn extend_scope(&self, outer: &IndexSet<String>, with: Option<&WithClause>) -> IndexSet<String> {
        let mut scope = outer.clone();
        if let Some(with) = with {
            for cte in &with.ctes {
                scope.insert(cte.name.resolution_key().into_owned());
            }
        }
        scope
    }
}

fn select_subqueries(select: &SimpleSelect) -> Vec<&Expr> {
    let mut out = Vec::new();
    if let Some(pred) = &select.where_clause {
        collect_subquery_exprs(pred, &mut out);
    }
    if let Some(having) = &select.having {
        collect_subquery_exprs(having, &mut out);
    }
    for item in &select.select_clause.items {
        collect_subquery_exprs(&item.expr, &mut out);
    }
    out
}

fn collect_subquery_exprs<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Subquery(_) | Expr::Exists { .. } | Expr::InSubquery { .. } => out.push(expr),
        Expr::BinaryOp { left, right, .. } => {
            collect_subquery_exprs(left, out);
            collect_subquery_exprs(right, out);
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::Cast { expr, .. } => collect_subquery_exprs(expr, out),
        Expr::Between { expr, low, high, .. } => {
            collect_subquery_exprs(expr, out);
            collect_subquery_exprs(low, out);
            collect_subquery_exprs(high, out);
        }
        Expr::InList { expr, list, .. } => {
            collect_subquery_exprs(expr, out);
            list.iter().for_each(|e| collect_subquery_exprs(e, out));
        }
        Expr::Case { operand, when_then, else_result } => {
            if let Some(operand) = operand {
                collect_subquery_exprs(operand, out);
            }
            for (w, t) in when_then {
                collect_subquery_exprs(w, out);
                collect_subquery_exprs(t, out);
            }
            if let Some(e) = else_result {
                collect_subquery_exprs(e, out);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------
// ParameterCollector
// ---------------------------------------------------------------------

/// Returns parameter identities (name, or index for positional/anonymous
/// params) in first-occurrence, left-to-right parse order.
#[derive(Default)]
pub struct ParameterCollector {
    seen: IndexSet<String>,
    order: Vec<Parameter>,
}

impl ParameterCollector {
    pub fn collect(stmt: &Statement) -> Vec<Parameter> {
        let mut collector = Self::default();
        collector.visit_statement(stmt);
        collector.order
    }
}

impl Visitor for ParameterCollector {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Parameter(param) = expr {
            let key = param
                .name
                .clone()
                .or_else(|| param.index.map(|i| i.to_string()))
                .unwrap_or_else(|| "?".to_string());
            if self.seen.insert(key) {
                self.order.push(param.clone());
            }
        }
        crate::ast::walk_expr(self, expr);
    }
}

// ---------------------------------------------------------------------
// ScopeResolver
// ---------------------------------------------------------------------

/// The set of table aliases and CTE names visible at some point in a
/// statement, used by IDE-style consumers. Shadowing rule: an inner
/// subquery's aliases hide outer same-named ones (the resolver always
/// returns the innermost binding for a name).
#[derive(Debug, Default, Clone)]
pub struct Scope {
    pub aliases: IndexMap<String, ObjectName>,
    pub ctes: IndexSet<String>,
}

impl Scope {
    pub fn resolve(&self, name: &str) -> bool {
        let key = name.to_ascii_lowercase();
        self.aliases.contains_key(&key) || self.ctes.contains(&key)
    }
}

pub struct ScopeResolver;

impl ScopeResolver {
    /// The scope visible at the root of `select` — aliases and CTE names
    /// from its own `WITH`/`FROM`, not a cursor position. `sqlfixture`'s
    /// `parser::scope_at` builds the cursor-aware `scopeAt` hook on top of
    /// this by reparsing up to the cursor and resolving the scope of
    /// whichever select that reparse lands on.
    pub fn scope_of(select: &SimpleSelect) -> Scope {
        let mut scope = Scope::default();
        if let Some(with) = &select.with_clause {
            for cte in &with.ctes {
                scope.ctes.insert(cte.name.resolution_key().into_owned());
            }
        }
        if let Some(from) = &select.from_clause {
            Self::note_table_factor(&from.source, &mut scope);
            for join in &from.joins {
                Self::note_table_factor(&join.right, &mut scope);
            }
        }
        scope
    }

    fn note_table_factor(table: &TableFactor, scope: &mut Scope) {
        let key_name = |alias: &Option<Ident>, fallback: Option<&ObjectName>| -> Option<String> {
            alias
                .as_ref()
                .map(|a| a.resolution_key().into_owned())
                .or_else(|| fallback.map(|n| n.normalized()))
        };
        match table {
            TableFactor::Table { name, alias } => {
                if let Some(key) = key_name(alias, Some(name)) {
                    scope.aliases.insert(key, name.clone());
                }
            }
            TableFactor::Derived { alias, .. } => {
                if let Some(alias) = alias {
                    scope.aliases.insert(alias.resolution_key().into_owned(), ObjectName(vec![alias.clone()]));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::ast::trivia::Trivia;

    fn simple_select(sql_items: Vec<SelectItem>, from: Option<FromClause>) -> SimpleSelect {
        SimpleSelect { select_clause: SelectClause { items: sql_items, ..Default::default() }, from_clause: from, ..Default::default() }
    }

    #[test]
    fn selectable_columns_dedupe_by_name_first_occurrence_wins() {
        let select = simple_select(
            vec![
                SelectItem { expr: Expr::column("id"), alias: None, comments: Trivia::default() },
                SelectItem { expr: Expr::qualified_column("u", "id"), alias: None, comments: Trivia::default() },
            ],
            None,
        );
        let cols = SelectableColumnCollector::new(ColumnMode::ColumnNameOnly, false).collect(&select).unwrap();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].name, Ident::new("id"));
    }

    #[test]
    fn table_reference_collector_excludes_cte_names() {
        let inner = SimpleSelect {
            select_clause: SelectClause { items: vec![], ..Default::default() },
            from_clause: Some(FromClause {
                source: TableFactor::Table { name: ObjectName::single(Ident::new("users")), alias: None },
                joins: vec![],
            }),
            ..Default::default()
        };
        let outer = SimpleSelect {
            with_clause: Some(WithClause {
                ctes: vec![CteDefinition {
                    name: Ident::new("recent_users"),
                    column_list: None,
                    recursive: false,
                    materialized_hint: None,
                    body: Box::new(Statement::Select(SelectStatement::Simple(Box::new(inner)))),
                    comments: Trivia::default(),
                }],
            }),
            from_clause: Some(FromClause {
                source: TableFactor::Table { name: ObjectName::single(Ident::new("recent_users")), alias: None },
                joins: vec![],
            }),
            ..Default::default()
        };
        let stmt = Statement::Select(SelectStatement::Simple(Box::new(outer)));
        let tables = TableReferenceCollector::collect(&stmt);
        assert_eq!(tables, vec!["users".to_string()]);
    }

    #[test]
    fn parameter_collector_preserves_first_occurrence_order() {
        let expr = Expr::BinaryOp {
            left: Box::new(Expr::Parameter(Parameter { name: Some("x".into()), index: None, raw_symbol: ParamSymbol::Colon })),
            op: BinaryOperator::Eq,
            right: Box::new(Expr::Parameter(Parameter { name: Some("y".into()), index: None, raw_symbol: ParamSymbol::Colon })),
        };
        let select = SimpleSelect { where_clause: Some(expr), ..Default::default() };
        let stmt = Statement::Select(SelectStatement::Simple(Box::new(select)));
        let params = ParameterCollector::collect(&stmt);
        assert_eq!(params.iter().filter_map(|p| p.name.clone()).collect::<Vec<_>>(), vec!["x", "y"]);
    }
}

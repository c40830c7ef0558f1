//! C5.3: the dynamic query builder. Applies a filter-condition DSL, sort
//! injection, and paging to a base statement, in that fixed order, then
//! optionally prunes joins and CTEs the result no longer touches.

use std::collections::HashSet;

use sqlfixture_core::analyzer::{ColumnMode, ScopeResolver, SelectableColumnCollector};
use sqlfixture_core::ast::*;
use sqlfixture_core::errors::{push_diagnostic, Diagnostic};
use sqlfixture_helpers::{enter_panic, IndexMap};

#[derive(Debug, thiserror::Error)]
pub enum DynamicError {
    #[error("filter column key `{0}` is not a valid `column` or `table.column` reference")]
    InvalidColumnKey(String),
    #[error("EXISTS anchor `{anchor}` expects {expected} placeholder argument(s) but the predicate supplies {found}")]
    ExistsAnchorMismatch { anchor: String, expected: usize, found: usize },
    #[error("filter/sort key `{0}` does not resolve to a column in the base statement's scope")]
    UnresolvedFilterColumn(String),
    #[error("invalid paging spec: page={page}, pageSize={page_size} (both must be >= 1)")]
    InvalidPageSize { page: u64, page_size: u64 },
    #[error("dynamic builder only accepts a simple SELECT as its base statement")]
    UnsupportedBaseStatement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    ILike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(LiteralValue),
    Array(Vec<LiteralValue>),
    Range { low: Option<LiteralValue>, high: Option<LiteralValue> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Compare { column_key: String, comparator: Comparator, value: Option<FilterValue> },
    And(Vec<FilterCondition>),
    Or(Vec<FilterCondition>),
    Not(Box<FilterCondition>),
    /// An EXISTS/NOT EXISTS subquery over `anchor_table`. `predicate`'s
    /// `Compare` nodes may reference an anchor column positionally via
    /// `$c0`, `$c1`, … — `$cN` resolves to `anchor_table.anchor_columns[N]`.
    /// Any other `column_key` in `predicate` resolves as an ordinary column
    /// reference inside the subquery (e.g. a bare column on `anchor_table`).
    /// `strict` rejects a predicate whose declared anchor columns don't
    /// match the placeholders it actually uses.
    Exists { anchor_table: String, anchor_columns: Vec<String>, predicate: Box<FilterCondition>, negated: bool, strict: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub column_key: String,
    pub direction: Direction,
    pub nulls: Option<NullsOrder>,
}

/// Paging is expressed as a 1-based `page` and a `page_size`, the shape the
/// dynamic DSL's callers hand over; `limit`/`offset` are derived, not
/// accepted directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub page: u64,
    pub page_size: u64,
}

impl PageSpec {
    fn limit_offset(self) -> Result<(u64, u64), DynamicError> {
        if self.page == 0 || self.page_size == 0 {
            return Err(DynamicError::InvalidPageSize { page: self.page, page_size: self.page_size });
        }
        Ok((self.page_size, (self.page - 1) * self.page_size))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicOptions {
    pub prune_unused_joins: bool,
    pub prune_unused_ctes: bool,
    /// Declared unique key columns per table, lowercase table name ->
    /// lowercase column names. A `LEFT JOIN` is only pruned as unused when
    /// its table carries a declared unique key here, since otherwise
    /// dropping it could change the row count.
    pub unique_keys: IndexMap<String, Vec<String>>,
    /// When `true`, a filter/sort key that doesn't resolve to a column in
    /// the base statement's scope is a hard [`DynamicError::UnresolvedFilterColumn`].
    /// When `false` (the default), it is dropped and recorded as a
    /// [`Diagnostic`] on the caller's sink instead.
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicQuery {
    pub statement: Statement,
    pub pruned_joins: Vec<String>,
    pub pruned_ctes: Vec<String>,
    /// Every named parameter synthesized for an injected filter value, in
    /// the order it was bound.
    pub params: IndexMap<String, LiteralValue>,
}

fn column_key_to_expr(key: &str) -> Result<Expr, DynamicError> {
    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        [name] => Ok(Expr::column(*name)),
        [qualifier, name] => Ok(Expr::qualified_column(*qualifier, *name)),
        _ => Err(DynamicError::InvalidColumnKey(key.to_string())),
    }
}

/// Resolves a `Compare`/`SortSpec` column key to an expression. Inside an
/// `Exists` predicate, `anchor` carries the positional `$cN` -> column-name
/// mapping; everywhere else it's `None` and every key goes through
/// [`column_key_to_expr`] unchanged.
fn resolve_key(key: &str, anchor: Option<(&str, &[String])>) -> Result<Expr, DynamicError> {
    if let Some((anchor_table, anchor_columns)) = anchor {
        if let Some(rest) = key.strip_prefix("$c") {
            let index: usize = rest.parse().map_err(|_| DynamicError::InvalidColumnKey(key.to_string()))?;
            let column = anchor_columns.get(index).ok_or_else(|| DynamicError::InvalidColumnKey(key.to_string()))?;
            return Ok(Expr::qualified_column(anchor_table, column.as_str()));
        }
    }
    column_key_to_expr(key)
}

/// Derives the bound-parameter base name for a filter value: the column
/// key's final (unqualified, lowercased) segment, or the raw key itself
/// for a `$cN` placeholder (callers shouldn't bind values against those in
/// practice, but the name stays legible if they do).
fn param_base_name(column_key: &str) -> String {
    column_key.rsplit('.').next().unwrap_or(column_key).trim_start_matches('$').to_ascii_lowercase()
}

fn bind_param(bindings: &mut IndexMap<String, LiteralValue>, name: String, value: LiteralValue) -> Expr {
    bindings.insert(name.clone(), value);
    Expr::Parameter(Parameter { name: Some(name), index: None, raw_symbol: ParamSymbol::Colon })
}

fn compare_expr(
    column_key: &str,
    comparator: Comparator,
    value: Option<&FilterValue>,
    anchor: Option<(&str, &[String])>,
    bindings: &mut IndexMap<String, LiteralValue>,
) -> Result<Expr, DynamicError> {
    let column = resolve_key(column_key, anchor)?;
    let base = param_base_name(column_key);
    let expr = match (comparator, value) {
        (Comparator::IsNull, _) => {
            Expr::BinaryOp { left: Box::new(column), op: BinaryOperator::Is, right: Box::new(Expr::Literal(LiteralValue::Null)) }
        }
        (Comparator::IsNotNull, _) => Expr::BinaryOp {
            left: Box::new(column),
            op: BinaryOperator::IsNot,
            right: Box::new(Expr::Literal(LiteralValue::Null)),
        },
        (Comparator::Between, Some(FilterValue::Range { low, high })) => {
            let low = match low {
                Some(v) => bind_param(bindings, format!("{base}_min"), v.clone()),
                None => Expr::Literal(LiteralValue::Null),
            };
            let high = match high {
                Some(v) => bind_param(bindings, format!("{base}_max"), v.clone()),
                None => Expr::Literal(LiteralValue::Null),
            };
            Expr::Between { expr: Box::new(column), negated: false, low: Box::new(low), high: Box::new(high) }
        }
        (Comparator::In, Some(FilterValue::Array(values))) => Expr::InList {
            expr: Box::new(column),
            negated: false,
            list: values.iter().enumerate().map(|(i, v)| bind_param(bindings, format!("{base}_{i}"), v.clone())).collect(),
        },
        (Comparator::NotIn, Some(FilterValue::Array(values))) => Expr::InList {
            expr: Box::new(column),
            negated: true,
            list: values.iter().enumerate().map(|(i, v)| bind_param(bindings, format!("{base}_{i}"), v.clone())).collect(),
        },
        (Comparator::Like, Some(FilterValue::Scalar(v))) => {
            let param = bind_param(bindings, base, v.clone());
            Expr::BinaryOp { left: Box::new(column), op: BinaryOperator::Like, right: Box::new(param) }
        }
        (Comparator::ILike, Some(FilterValue::Scalar(v))) => {
            let param = bind_param(bindings, base, v.clone());
            Expr::BinaryOp { left: Box::new(column), op: BinaryOperator::ILike, right: Box::new(param) }
        }
        (comparator, Some(FilterValue::Scalar(v))) => {
            let op = match comparator {
                Comparator::Eq => BinaryOperator::Eq,
                Comparator::NotEq => BinaryOperator::NotEq,
                Comparator::Lt => BinaryOperator::Lt,
                Comparator::LtEq => BinaryOperator::LtEq,
                Comparator::Gt => BinaryOperator::Gt,
                Comparator::GtEq => BinaryOperator::GtEq,
                _ => BinaryOperator::Eq,
            };
            let param = bind_param(bindings, base, v.clone());
            Expr::BinaryOp { left: Box::new(column), op, right: Box::new(param) }
        }
        _ => return Err(DynamicError::InvalidColumnKey(column_key.to_string())),
    };
    Ok(expr)
}

fn walk_expr_count(expr: &Expr, on_qualifier: &mut impl FnMut(&str)) {
    match expr {
        Expr::Column { qualifiers, .. } => {
            for q in qualifiers {
                on_qualifier(&q.value);
            }
        }
        Expr::QualifiedWildcard(parts) => {
            for q in parts {
                on_qualifier(&q.value);
            }
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::Cast { expr, .. } => walk_expr_count(expr, on_qualifier),
        Expr::BinaryOp { left, right, .. } => {
            walk_expr_count(left, on_qualifier);
            walk_expr_count(right, on_qualifier);
        }
        Expr::Case { operand, when_then, else_result } => {
            if let Some(o) = operand {
                walk_expr_count(o, on_qualifier);
            }
            for (w, t) in when_then {
                walk_expr_count(w, on_qualifier);
                walk_expr_count(t, on_qualifier);
            }
            if let Some(e) = else_result {
                walk_expr_count(e, on_qualifier);
            }
        }
        Expr::Between { expr, low, high, .. } => {
            walk_expr_count(expr, on_qualifier);
            walk_expr_count(low, on_qualifier);
            walk_expr_count(high, on_qualifier);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr_count(expr, on_qualifier);
            for item in list {
                walk_expr_count(item, on_qualifier);
            }
        }
        Expr::Array(items) => {
            for item in items {
                walk_expr_count(item, on_qualifier);
            }
        }
        Expr::FunctionCall(call) => {
            for arg in &call.args {
                walk_expr_count(arg, on_qualifier);
            }
        }
        Expr::Literal(_) | Expr::Wildcard | Expr::Parameter(_) | Expr::InSubquery { .. } | Expr::Exists { .. } | Expr::Subquery(_) => {}
    }
}

fn references_table(expr: &Expr, table: &str) -> usize {
    let mut count = 0;
    walk_expr_count(expr, &mut |qualifier: &str| {
        if qualifier.eq_ignore_ascii_case(table) {
            count += 1;
        }
    });
    count
}

/// Collects the distinct `$cN` indices a predicate actually references,
/// stopping at a nested `Exists` (that's a separate anchor scope).
fn placeholder_indices(condition: &FilterCondition, out: &mut HashSet<usize>) {
    match condition {
        FilterCondition::Compare { column_key, .. } => {
            if let Some(rest) = column_key.strip_prefix("$c") {
                if let Ok(index) = rest.parse::<usize>() {
                    out.insert(index);
                }
            }
        }
        FilterCondition::And(parts) | FilterCondition::Or(parts) => {
            for part in parts {
                placeholder_indices(part, out);
            }
        }
        FilterCondition::Not(inner) => placeholder_indices(inner, out),
        FilterCondition::Exists { .. } => {}
    }
}

fn build_filter_expr(
    condition: &FilterCondition,
    anchor: Option<(&str, &[String])>,
    bindings: &mut IndexMap<String, LiteralValue>,
) -> Result<Expr, DynamicError> {
    match condition {
        FilterCondition::Compare { column_key, comparator, value } => {
            compare_expr(column_key, *comparator, value.as_ref(), anchor, bindings)
        }
        FilterCondition::And(parts) => fold_boolean(parts, anchor, bindings, BinaryOperator::And, Expr::Literal(LiteralValue::Boolean(true))),
        FilterCondition::Or(parts) => fold_boolean(parts, anchor, bindings, BinaryOperator::Or, Expr::Literal(LiteralValue::Boolean(false))),
        FilterCondition::Not(inner) => {
            Ok(Expr::UnaryOp { op: UnaryOperator::Not, expr: Box::new(build_filter_expr(inner, anchor, bindings)?) })
        }
        FilterCondition::Exists { anchor_table, anchor_columns, predicate, negated, strict } => {
            if *strict {
                let mut used = HashSet::new();
                placeholder_indices(predicate, &mut used);
                let out_of_range = used.iter().any(|i| *i >= anchor_columns.len());
                if used.len() != anchor_columns.len() || out_of_range {
                    return Err(DynamicError::ExistsAnchorMismatch {
                        anchor: anchor_table.clone(),
                        expected: anchor_columns.len(),
                        found: used.len(),
                    });
                }
            }
            let predicate_expr = build_filter_expr(predicate, Some((anchor_table.as_str(), anchor_columns.as_slice())), bindings)?;
            let subquery = SimpleSelect {
                select_clause: SelectClause { items: vec![SelectItem { expr: Expr::Literal(LiteralValue::Int(1)), alias: None, comments: Trivia::default() }], ..Default::default() },
                from_clause: Some(FromClause { source: TableFactor::Table { name: ObjectName::single(Ident::new(anchor_table.clone())), alias: None }, joins: vec![] }),
                where_clause: Some(predicate_expr),
                ..Default::default()
            };
            Ok(Expr::Exists { negated: *negated, subquery: Box::new(Statement::Select(SelectStatement::Simple(Box::new(subquery)))) })
        }
    }
}

fn fold_boolean(
    parts: &[FilterCondition],
    anchor: Option<(&str, &[String])>,
    bindings: &mut IndexMap<String, LiteralValue>,
    op: BinaryOperator,
    identity: Expr,
) -> Result<Expr, DynamicError> {
    let mut exprs = parts.iter().map(|p| build_filter_expr(p, anchor, bindings));
    let Some(first) = exprs.next() else { return Ok(identity) };
    exprs.try_fold(first?, |acc, next| Ok(Expr::BinaryOp { left: Box::new(acc), op, right: Box::new(next?) }))
}

/// Bare key: must name a column the base statement's projection selects
/// (permissive when that can't be determined at all, e.g. a `SELECT *`
/// item the collector can't expand). Qualified key: the qualifier must
/// resolve in the base statement's alias/CTE scope.
fn column_in_scope(select: &SimpleSelect, key: &str) -> bool {
    match key.split_once('.') {
        Some((qualifier, _)) => ScopeResolver::scope_of(select).resolve(qualifier),
        None => match SelectableColumnCollector::new(ColumnMode::ColumnNameOnly, false).collect(select) {
            Ok(columns) => columns.iter().any(|c| c.name.resolution_key().eq_ignore_ascii_case(key)),
            Err(_) => true,
        },
    }
}

fn leaf_column_keys<'a>(condition: &'a FilterCondition, out: &mut Vec<&'a str>) {
    match condition {
        FilterCondition::Compare { column_key, .. } => {
            if !column_key.starts_with("$c") {
                out.push(column_key);
            }
        }
        FilterCondition::And(parts) | FilterCondition::Or(parts) => parts.iter().for_each(|p| leaf_column_keys(p, out)),
        FilterCondition::Not(inner) => leaf_column_keys(inner, out),
        FilterCondition::Exists { .. } => {}
    }
}

fn apply_filters(
    select: &mut SimpleSelect,
    filters: &[FilterCondition],
    opts: &DynamicOptions,
    mut diagnostics: Option<&mut Vec<Diagnostic>>,
    bindings: &mut IndexMap<String, LiteralValue>,
) -> Result<(), DynamicError> {
    if filters.is_empty() {
        return Ok(());
    }
    let mut accepted = Vec::with_capacity(filters.len());
    for filter in filters {
        let mut keys = Vec::new();
        leaf_column_keys(filter, &mut keys);
        let unresolved = keys.iter().find(|key| !column_in_scope(select, key));
        if let Some(key) = unresolved {
            if opts.strict {
                return Err(DynamicError::UnresolvedFilterColumn((*key).to_string()));
            }
            push_diagnostic(
                diagnostics.as_mut().map(|v| &mut **v),
                Diagnostic::with_context(format!("unresolved filter column `{key}`"), "dynamic builder: non-strict filter skip".to_string()),
            );
            continue;
        }
        accepted.push(filter.clone());
    }
    if accepted.is_empty() {
        return Ok(());
    }
    let combined = fold_boolean(&accepted, None, bindings, BinaryOperator::And, Expr::Literal(LiteralValue::Boolean(true)))?;
    select.where_clause = Some(match select.where_clause.take() {
        Some(existing) => Expr::BinaryOp { left: Box::new(existing), op: BinaryOperator::And, right: Box::new(combined) },
        None => combined,
    });
    Ok(())
}

fn apply_sort(
    select: &mut SimpleSelect,
    sort: &[SortSpec],
    opts: &DynamicOptions,
    mut diagnostics: Option<&mut Vec<Diagnostic>>,
) -> Result<(), DynamicError> {
    for spec in sort {
        if !column_in_scope(select, &spec.column_key) {
            if opts.strict {
                return Err(DynamicError::UnresolvedFilterColumn(spec.column_key.clone()));
            }
            push_diagnostic(
                diagnostics.as_mut().map(|v| &mut **v),
                Diagnostic::with_context(format!("unresolved sort column `{}`", spec.column_key), "dynamic builder: non-strict sort skip".to_string()),
            );
            continue;
        }
        let expr = column_key_to_expr(&spec.column_key)?;
        select.order_by.items.push(OrderByItem { expr, direction: Some(spec.direction), nulls: spec.nulls });
    }
    Ok(())
}

fn apply_page(select: &mut SimpleSelect, page: PageSpec) -> Result<(), DynamicError> {
    let (limit, offset) = page.limit_offset()?;
    select.limit = Some(Expr::Literal(LiteralValue::Int(limit as i64)));
    select.offset = Some(Expr::Literal(LiteralValue::Int(offset as i64)));
    Ok(())
}

fn select_body_qualifiers(select: &SimpleSelect) -> HashSet<String> {
    let mut qualifiers = HashSet::new();
    let mut note = |q: &str| {
        qualifiers.insert(q.to_ascii_lowercase());
    };
    for item in &select.select_clause.items {
        walk_expr_count(&item.expr, &mut note);
    }
    if let Some(where_clause) = &select.where_clause {
        walk_expr_count(where_clause, &mut note);
    }
    for expr in &select.group_by.exprs {
        walk_expr_count(expr, &mut note);
    }
    if let Some(having) = &select.having {
        walk_expr_count(having, &mut note);
    }
    for item in &select.order_by.items {
        walk_expr_count(&item.expr, &mut note);
    }
    qualifiers
}

fn join_identity(join: &Join) -> String {
    join.right
        .alias()
        .map(|a| a.value.clone())
        .or_else(|| join.right.table_name().map(|n| n.last().value.clone()))
        .unwrap_or_default()
}

#[tracing::instrument(level = "debug", skip(select, opts))]
fn prune_unused_joins(select: &mut SimpleSelect, opts: &DynamicOptions) -> Vec<String> {
    let mut pruned = Vec::new();
    if !opts.prune_unused_joins {
        return pruned;
    }
    loop {
        let body_refs = select_body_qualifiers(select);
        let Some(from_clause) = select.from_clause.as_mut() else { break };

        let mut drop_index = None;
        for (i, join) in from_clause.joins.iter().enumerate() {
            if !matches!(join.kind, JoinKind::Left | JoinKind::LeftOuter) {
                continue;
            }
            let identity = join_identity(join);
            let table_key = join.right.table_name().map(|n| n.normalized());
            let Some(table_key) = table_key else { continue };
            if !opts.unique_keys.contains_key(&table_key) {
                continue;
            }
            let referenced_in_body = body_refs.contains(&identity.to_ascii_lowercase());
            let referenced_in_other_joins = from_clause
                .joins
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .any(|(_, other)| other.predicate.as_ref().is_some_and(|p| references_table(p, &identity) > 0));
            if !referenced_in_body && !referenced_in_other_joins {
                drop_index = Some(i);
                break;
            }
        }

        match drop_index {
            Some(i) => {
                let removed = from_clause.joins.remove(i);
                pruned.push(join_identity(&removed));
            }
            None => break,
        }
    }
    pruned
}

#[tracing::instrument(level = "debug", skip(select, opts))]
fn prune_unused_ctes(select: &mut SimpleSelect, opts: &DynamicOptions) -> Vec<String> {
    let mut pruned = Vec::new();
    if !opts.prune_unused_ctes {
        return pruned;
    }
    let Some(with_clause) = select.with_clause.as_mut() else { return pruned };

    let mut live: HashSet<String> = std::collections::HashSet::new();
    if let Some(from_clause) = &select.from_clause {
        collect_table_factor_names(&from_clause.source, &mut live);
        for join in &from_clause.joins {
            collect_table_factor_names(&join.right, &mut live);
        }
    }

    loop {
        let mut grew = false;
        for cte in &with_clause.ctes {
            if !live.contains(&cte.name.resolution_key().into_owned()) {
                continue;
            }
            if let Statement::Select(SelectStatement::Simple(inner)) = cte.body.as_ref() {
                if let Some(from_clause) = &inner.from_clause {
                    let before = live.len();
                    collect_table_factor_names(&from_clause.source, &mut live);
                    for join in &from_clause.joins {
                        collect_table_factor_names(&join.right, &mut live);
                    }
                    if live.len() != before {
                        grew = true;
                    }
                }
            }
        }
        if !grew {
            break;
        }
    }

    let before_len = with_clause.ctes.len();
    with_clause.ctes.retain(|cte| {
        let keep = live.contains(&cte.name.resolution_key().into_owned());
        if !keep {
            pruned.push(cte.name.value.clone());
        }
        keep
    });
    debug_assert!(with_clause.ctes.len() <= before_len);
    pruned
}

fn collect_table_factor_names(factor: &TableFactor, into: &mut HashSet<String>) {
    if let TableFactor::Table { name, .. } = factor {
        into.insert(name.normalized());
    }
}

/// Applies filters, then sort, then paging, then (if enabled) join/CTE
/// pruning, in that fixed order.
#[tracing::instrument(level = "debug", skip(base, filters, sort, opts, diagnostics))]
pub fn build_dynamic(
    base: &Statement,
    filters: &[FilterCondition],
    sort: &[SortSpec],
    page: Option<PageSpec>,
    opts: &DynamicOptions,
    mut diagnostics: Option<&mut Vec<Diagnostic>>,
) -> Result<DynamicQuery, DynamicError> {
    let _ctx = enter_panic("build_dynamic".to_string());
    let Statement::Select(SelectStatement::Simple(select)) = base else {
        return Err(DynamicError::UnsupportedBaseStatement);
    };
    let mut select = select.as_ref().clone();
    let mut bindings: IndexMap<String, LiteralValue> = IndexMap::default();

    apply_filters(&mut select, filters, opts, diagnostics.as_mut().map(|v| &mut **v), &mut bindings)?;
    apply_sort(&mut select, sort, opts, diagnostics.as_mut().map(|v| &mut **v))?;
    if let Some(page) = page {
        apply_page(&mut select, page)?;
    }
    let pruned_joins = prune_unused_joins(&mut select, opts);
    let pruned_ctes = prune_unused_ctes(&mut select, opts);

    Ok(DynamicQuery {
        statement: Statement::Select(SelectStatement::Simple(Box::new(select))),
        pruned_joins,
        pruned_ctes,
        params: bindings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_with_join() -> Statement {
        let select = SimpleSelect {
            select_clause: SelectClause {
                items: vec![SelectItem { expr: Expr::qualified_column("u", "id"), alias: None, comments: Trivia::default() }],
                ..Default::default()
            },
            from_clause: Some(FromClause {
                source: TableFactor::Table { name: ObjectName::single(Ident::new("users")), alias: Some(Ident::new("u")) },
                joins: vec![Join {
                    kind: JoinKind::Left,
                    right: TableFactor::Table { name: ObjectName::single(Ident::new("profiles")), alias: Some(Ident::new("p")) },
                    predicate: Some(Expr::BinaryOp { left: Box::new(Expr::qualified_column("p", "user_id")), op: BinaryOperator::Eq, right: Box::new(Expr::qualified_column("u", "id")) }),
                    using: None,
                }],
            }),
            ..Default::default()
        };
        Statement::Select(SelectStatement::Simple(Box::new(select)))
    }

    fn base_simple() -> Statement {
        let select = SimpleSelect {
            select_clause: SelectClause { items: vec![SelectItem { expr: Expr::column("id"), alias: None, comments: Trivia::default() }], ..Default::default() },
            from_clause: Some(FromClause { source: TableFactor::Table { name: ObjectName::single(Ident::new("t")), alias: None }, joins: vec![] }),
            ..Default::default()
        };
        Statement::Select(SelectStatement::Simple(Box::new(select)))
    }

    #[test]
    fn filter_sort_and_page_apply_in_order() {
        let base = base_with_join();
        let filters = vec![FilterCondition::Compare {
            column_key: "u.active".to_string(),
            comparator: Comparator::Eq,
            value: Some(FilterValue::Scalar(LiteralValue::Boolean(true))),
        }];
        let sort = vec![SortSpec { column_key: "u.id".to_string(), direction: Direction::Desc, nulls: None }];
        let page = PageSpec { page: 3, page_size: 10 };
        let result = build_dynamic(&base, &filters, &sort, Some(page), &DynamicOptions::default(), None).unwrap();
        assert_eq!(result.params.get("active"), Some(&LiteralValue::Boolean(true)));
        match result.statement {
            Statement::Select(SelectStatement::Simple(select)) => {
                assert!(select.where_clause.is_some());
                assert_eq!(select.order_by.items.len(), 1);
                assert_eq!(select.limit, Some(Expr::Literal(LiteralValue::Int(10))));
                assert_eq!(select.offset, Some(Expr::Literal(LiteralValue::Int(20))));
            }
            _ => panic!("expected simple select"),
        }
    }

    #[test]
    fn invalid_page_size_is_rejected() {
        let base = base_with_join();
        let err = build_dynamic(&base, &[], &[], Some(PageSpec { page: 0, page_size: 10 }), &DynamicOptions::default(), None).unwrap_err();
        assert!(matches!(err, DynamicError::InvalidPageSize { page: 0, page_size: 10 }));
    }

    #[test]
    fn unused_left_join_on_a_declared_unique_key_is_pruned() {
        let base = base_with_join();
        let mut opts = DynamicOptions { prune_unused_joins: true, ..Default::default() };
        opts.unique_keys.insert("profiles".to_string(), vec!["user_id".to_string()]);
        let result = build_dynamic(&base, &[], &[], None, &opts, None).unwrap();
        assert_eq!(result.pruned_joins, vec!["p".to_string()]);
        match result.statement {
            Statement::Select(SelectStatement::Simple(select)) => {
                assert!(select.from_clause.unwrap().joins.is_empty());
            }
            _ => panic!("expected simple select"),
        }
    }

    #[test]
    fn exists_strict_rejects_a_predicate_that_never_uses_its_placeholder() {
        let predicate = FilterCondition::Compare {
            column_key: "other_flag".to_string(),
            comparator: Comparator::Eq,
            value: Some(FilterValue::Scalar(LiteralValue::Boolean(true))),
        };
        let condition = FilterCondition::Exists {
            anchor_table: "orders".to_string(),
            anchor_columns: vec!["user_id".to_string()],
            predicate: Box::new(predicate),
            negated: false,
            strict: true,
        };
        let mut bindings = IndexMap::default();
        let err = build_filter_expr(&condition, None, &mut bindings).unwrap_err();
        assert!(matches!(err, DynamicError::ExistsAnchorMismatch { expected: 1, found: 0, .. }));
    }

    #[test]
    fn exists_placeholder_resolves_to_the_anchor_table_column() {
        let predicate = FilterCondition::Compare {
            column_key: "$c0".to_string(),
            comparator: Comparator::Eq,
            value: Some(FilterValue::Scalar(LiteralValue::Int(7))),
        };
        let condition = FilterCondition::Exists {
            anchor_table: "orders".to_string(),
            anchor_columns: vec!["user_id".to_string()],
            predicate: Box::new(predicate),
            negated: false,
            strict: true,
        };
        let mut bindings = IndexMap::default();
        let expr = build_filter_expr(&condition, None, &mut bindings).unwrap();
        match expr {
            Expr::Exists { negated: false, subquery } => match *subquery {
                Statement::Select(SelectStatement::Simple(select)) => match select.where_clause.unwrap() {
                    Expr::BinaryOp { left, .. } => assert_eq!(*left, Expr::qualified_column("orders", "user_id")),
                    other => panic!("expected binary op, got {other:?}"),
                },
                other => panic!("expected simple select, got {other:?}"),
            },
            other => panic!("expected exists expr, got {other:?}"),
        }
    }

    #[test]
    fn non_strict_unresolved_filter_column_is_skipped_with_a_diagnostic() {
        let base = base_simple();
        let filters = vec![
            FilterCondition::Compare { column_key: "missing".to_string(), comparator: Comparator::Eq, value: Some(FilterValue::Scalar(LiteralValue::Int(1))) },
            FilterCondition::Compare { column_key: "id".to_string(), comparator: Comparator::Eq, value: Some(FilterValue::Scalar(LiteralValue::Int(2))) },
        ];
        let mut diagnostics = Vec::new();
        let result = build_dynamic(&base, &filters, &[], None, &DynamicOptions::default(), Some(&mut diagnostics)).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(result.params.len(), 1);
        match result.statement {
            Statement::Select(SelectStatement::Simple(select)) => assert!(select.where_clause.is_some()),
            _ => panic!("expected simple select"),
        }
    }

    #[test]
    fn strict_unresolved_filter_column_errors() {
        let base = base_simple();
        let filters = vec![FilterCondition::Compare { column_key: "missing".to_string(), comparator: Comparator::Eq, value: Some(FilterValue::Scalar(LiteralValue::Int(1))) }];
        let opts = DynamicOptions { strict: true, ..Default::default() };
        let err = build_dynamic(&base, &filters, &[], None, &opts, None).unwrap_err();
        assert!(matches!(err, DynamicError::UnresolvedFilterColumn(key) if key == "missing"));
    }
}

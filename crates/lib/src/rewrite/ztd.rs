//! C5.1: the Zero-Table-Dependency rewriter. Turns any CRUD statement into
//! an equivalent read-only `SELECT` evaluated entirely against fixture CTEs.

use sqlfixture_core::analyzer::TableReferenceCollector;
use sqlfixture_core::ast::*;
use sqlfixture_core::errors::{Diagnostic, FixtureCoverageError, SqlFixtureError, ValidationError, push_diagnostic};
use sqlfixture_helpers::enter_panic;

use super::fixture::{Fixture, FixtureSet, MissingFixtureStrategy, TableDefinitions, ZtdOptions};

/// Rewrites `stmt` into a pure `SELECT` over `fixtures`. See module docs on
/// [`crate::rewrite`] for the per-statement shapes this produces.
#[tracing::instrument(level = "debug", skip(stmt, fixtures, diagnostics))]
pub fn rewrite_for_fixtures(
    stmt: &Statement,
    fixtures: &FixtureSet,
    opts: &ZtdOptions,
    mut diagnostics: Option<&mut Vec<Diagnostic>>,
) -> Result<Statement, SqlFixtureError> {
    let _ctx = enter_panic("rewrite_for_fixtures".to_string());
    let tables = TableReferenceCollector::collect(stmt);
    let covered = check_coverage(&tables, fixtures, opts, diagnostics.as_mut().map(|v| &mut **v))?;
    let shadow = build_shadow_ctes(&covered, fixtures);

    match stmt {
        Statement::Select(SelectStatement::Simple(select)) => rewrite_select(select, shadow),
        Statement::Select(SelectStatement::Binary { .. }) => Err(ValidationError::new(
            "ZTD rewrite of a top-level set-operation SELECT is not supported directly; wrap it in a subquery",
        )
        .into()),
        Statement::Insert(insert) => rewrite_insert(insert, fixtures, opts, shadow),
        Statement::Update(update) => rewrite_update(update, fixtures, opts, shadow),
        Statement::Delete(delete) => rewrite_delete(delete, fixtures, opts, shadow),
        Statement::Merge(merge) => rewrite_merge(merge, shadow),
        Statement::CreateTable(_) | Statement::AlterTable(_) | Statement::DropTable(_) | Statement::CreateIndex(_) | Statement::DropIndex(_) => {
            Err(ValidationError::new("ZTD rewrite is only defined for SELECT/INSERT/UPDATE/DELETE/MERGE").into())
        }
    }
}

fn check_coverage(
    tables: &[String],
    fixtures: &FixtureSet,
    opts: &ZtdOptions,
    mut diagnostics: Option<&mut Vec<Diagnostic>>,
) -> Result<Vec<String>, SqlFixtureError> {
    let missing: Vec<String> = tables.iter().filter(|t| !fixtures.contains_key(*t)).cloned().collect();
    let covered = || tables.iter().filter(|t| fixtures.contains_key(*t)).cloned().collect();

    if missing.is_empty() {
        return Ok(covered());
    }

    match opts.missing_fixture_strategy {
        MissingFixtureStrategy::Error => {
            let suggested_fixture_template = missing
                .iter()
                .map(|t| format!("{t} {{ columns: [...], rows: [] }}"))
                .collect::<Vec<_>>()
                .join(", ");
            Err(FixtureCoverageError { tables: missing, sql_snippet: String::new(), suggested_fixture_template }.into())
        }
        MissingFixtureStrategy::Warn => {
            for table in &missing {
                tracing::warn!(table = %table, "missing fixture; proceeding under warn strategy");
                push_diagnostic(
                    diagnostics.as_mut().map(|v| &mut **v),
                    Diagnostic::with_context(format!("no fixture for table `{table}`"), "missing_fixture_strategy=warn".to_string()),
                );
            }
            Ok(covered())
        }
        MissingFixtureStrategy::Passthrough => Ok(covered()),
    }
}

fn build_shadow_ctes(covered_tables: &[String], fixtures: &FixtureSet) -> Vec<CteDefinition> {
    covered_tables
        .iter()
        .filter_map(|key| fixtures.get(key).map(|fixture| shadow_cte_for(key, fixture)))
        .collect()
}

/// CTEs cannot be schema-qualified, so the shadow uses the table's final
/// segment — a caller relying on ZTD for a schema-qualified reference needs
/// that segment to be unique within the statement (see DESIGN.md).
fn shadow_cte_for(table_key: &str, fixture: &Fixture) -> CteDefinition {
    let leaf_name = table_key.rsplit('.').next().unwrap_or(table_key);
    let rows: Vec<Vec<Expr>> = fixture.rows.iter().map(|row| row.iter().map(|v| Expr::Literal(v.clone())).collect()).collect();
    let body = build_union_all_rows(&fixture.columns, &rows);
    CteDefinition {
        name: Ident::new(leaf_name),
        column_list: None,
        recursive: false,
        materialized_hint: None,
        body: Box::new(body),
        comments: Trivia::default(),
    }
}

/// Builds `SELECT CAST(v0 AS t0) AS c0, … UNION ALL SELECT v0, …` with the
/// cast and alias carried only on the first row (a `UNION`'s output shape
/// is governed by its first arm), or a zero-row `WHERE false` guard that
/// still advertises every declared column when `rows` is empty.
fn build_union_all_rows(columns: &[(String, String)], rows: &[Vec<Expr>]) -> Statement {
    if rows.is_empty() {
        let items = columns
            .iter()
            .map(|(name, ty)| SelectItem {
                expr: Expr::Cast { expr: Box::new(Expr::Literal(LiteralValue::Null)), data_type: DataType(ty.clone()), style: CastStyle::Standard },
                alias: Some(Ident::new(name.clone())),
                comments: Trivia::default(),
            })
            .collect();
        return Statement::Select(SelectStatement::Simple(Box::new(SimpleSelect {
            select_clause: SelectClause { items, ..Default::default() },
            where_clause: Some(Expr::Literal(LiteralValue::Boolean(false))),
            ..Default::default()
        })));
    }

    let mut statement: Option<Statement> = None;
    for (row_index, row) in rows.iter().enumerate() {
        let items = row
            .iter()
            .zip(columns)
            .map(|(value, (name, ty))| {
                let expr = if row_index == 0 {
                    Expr::Cast { expr: Box::new(value.clone()), data_type: DataType(ty.clone()), style: CastStyle::Standard }
                } else {
                    value.clone()
                };
                SelectItem { expr, alias: if row_index == 0 { Some(Ident::new(name.clone())) } else { None }, comments: Trivia::default() }
            })
            .collect();
        let select = Statement::Select(SelectStatement::Simple(Box::new(SimpleSelect {
            select_clause: SelectClause { items, ..Default::default() },
            ..Default::default()
        })));
        statement = Some(match statement {
            None => select,
            Some(prev) => Statement::Select(SelectStatement::Binary { op: SetOperator::Union, left: Box::new(prev), right: Box::new(select), all: true }),
        });
    }
    statement.expect("rows is non-empty")
}

fn prepend_shadow_ctes(existing: Option<WithClause>, shadow: Vec<CteDefinition>) -> Result<WithClause, ValidationError> {
    let mut ctes = shadow;
    if let Some(existing) = existing {
        for cte in &existing.ctes {
            if ctes.iter().any(|s| s.name.resolution_key() == cte.name.resolution_key()) {
                return Err(ValidationError::new(format!("fixture shadow CTE `{}` collides with a user-defined CTE of the same name", cte.name)));
            }
        }
        ctes.extend(existing.ctes);
    }
    Ok(WithClause { ctes })
}

fn resolve_table_columns(table_key: &str, fixtures: &FixtureSet, table_defs: Option<&TableDefinitions>) -> Result<Vec<(String, String)>, ValidationError> {
    if let Some(def) = table_defs.and_then(|defs| defs.tables.get(table_key)) {
        return Ok(def.columns.iter().map(|(n, t)| (n.clone(), t.clone())).collect());
    }
    fixtures.get(table_key).map(|f| f.columns.clone()).ok_or_else(|| ValidationError::new(format!("no table definition or fixture for `{table_key}`")))
}

fn returning_items_or_count(
    returning: &Option<Vec<SelectItem>>,
    resolve_columns: impl Fn() -> Result<Vec<(String, String)>, ValidationError>,
) -> Result<Vec<SelectItem>, ValidationError> {
    match returning {
        Some(items) => {
            let mut out = Vec::new();
            for item in items {
                if matches!(item.expr, Expr::Wildcard) {
                    let columns = resolve_columns()?;
                    out.extend(columns.into_iter().map(|(name, _)| SelectItem {
                        expr: Expr::column(name.clone()),
                        alias: Some(Ident::new(name)),
                        comments: Trivia::default(),
                    }));
                } else {
                    out.push(item.clone());
                }
            }
            Ok(out)
        }
        None => Ok(vec![count_star_item()]),
    }
}

fn count_star_item() -> SelectItem {
    SelectItem {
        expr: Expr::FunctionCall(FunctionCall { name: ObjectName::single(Ident::new("count")), args: vec![Expr::Wildcard], distinct: false, over: None }),
        alias: Some(Ident::new("count")),
        comments: Trivia::default(),
    }
}

fn rewrite_select(select: &SimpleSelect, shadow: Vec<CteDefinition>) -> Result<Statement, SqlFixtureError> {
    let mut select = select.clone();
    select.with_clause = Some(prepend_shadow_ctes(select.with_clause.take(), shadow)?);
    Ok(Statement::Select(SelectStatement::Simple(Box::new(select))))
}

fn align_insert_row(explicit_columns: &Option<Vec<Ident>>, row: &[Expr], resolved_columns: &[(String, String)]) -> Vec<Expr> {
    match explicit_columns {
        None => row.to_vec(),
        Some(cols) => {
            let provided: sqlfixture_helpers::IndexMap<String, Expr> =
                cols.iter().zip(row.iter()).map(|(c, e)| (c.resolution_key().into_owned(), e.clone())).collect();
            resolved_columns
                .iter()
                .map(|(name, _)| provided.get(&name.to_ascii_lowercase()).cloned().unwrap_or(Expr::Literal(LiteralValue::Null)))
                .collect()
        }
    }
}

fn rewrite_insert(insert: &InsertStatement, fixtures: &FixtureSet, opts: &ZtdOptions, shadow: Vec<CteDefinition>) -> Result<Statement, SqlFixtureError> {
    let table_key = insert.table.normalized();
    let resolved_columns = resolve_table_columns(&table_key, fixtures, opts.table_definitions.as_ref())?;

    let inserted_cte = match &insert.source {
        InsertSource::Values(rows) => {
            let aligned: Vec<Vec<Expr>> = rows.iter().map(|row| align_insert_row(&insert.columns, row, &resolved_columns)).collect();
            let body = build_union_all_rows(&resolved_columns, &aligned);
            CteDefinition {
                name: Ident::new("__inserted_rows"),
                column_list: None,
                recursive: false,
                materialized_hint: None,
                body: Box::new(body),
                comments: Trivia::default(),
            }
        }
        InsertSource::Select(select_stmt) => CteDefinition {
            name: Ident::new("__inserted_rows"),
            column_list: Some(resolved_columns.iter().map(|(n, _)| Ident::new(n.clone())).collect()),
            recursive: false,
            materialized_hint: None,
            body: select_stmt.clone(),
            comments: Trivia::default(),
        },
    };

    let mut ctes = shadow;
    ctes.push(inserted_cte);
    let select = SimpleSelect {
        with_clause: Some(WithClause { ctes }),
        select_clause: SelectClause { items: returning_items_or_count(&insert.returning, || Ok(resolved_columns.clone()))?, ..Default::default() },
        from_clause: Some(FromClause { source: TableFactor::Table { name: ObjectName::single(Ident::new("__inserted_rows")), alias: None }, joins: vec![] }),
        ..Default::default()
    };
    Ok(Statement::Select(SelectStatement::Simple(Box::new(select))))
}

fn implicit_from(base: TableFactor, extra: Option<&FromClause>) -> FromClause {
    let mut joins = Vec::new();
    if let Some(extra) = extra {
        joins.push(Join { kind: JoinKind::Cross, right: extra.source.clone(), predicate: None, using: None });
        joins.extend(extra.joins.clone());
    }
    FromClause { source: base, joins }
}

fn rewrite_update(update: &UpdateStatement, fixtures: &FixtureSet, opts: &ZtdOptions, shadow: Vec<CteDefinition>) -> Result<Statement, SqlFixtureError> {
    let table_key = update.table.normalized();
    let from_clause = implicit_from(TableFactor::Table { name: update.table.clone(), alias: update.alias.clone() }, update.from.as_ref());

    let items = returning_items_or_count(&update.returning, || resolve_table_columns(&table_key, fixtures, opts.table_definitions.as_ref()))?;
    let items = substitute_set_assignments(items, &update.assignments);

    let select = SimpleSelect {
        with_clause: if shadow.is_empty() { None } else { Some(WithClause { ctes: shadow }) },
        select_clause: SelectClause { items, ..Default::default() },
        from_clause: Some(from_clause),
        where_clause: update.where_clause.clone(),
        ..Default::default()
    };
    Ok(Statement::Select(SelectStatement::Simple(Box::new(select))))
}

/// When a `RETURNING`/projection item is a bare reference to an assigned
/// column, the assignment's expression — not the pre-update value — is what
/// the statement would actually return.
fn substitute_set_assignments(items: Vec<SelectItem>, assignments: &[Assignment]) -> Vec<SelectItem> {
    items
        .into_iter()
        .map(|item| match &item.expr {
            Expr::Column { qualifiers, name } if qualifiers.is_empty() => {
                match assignments.iter().find(|a| a.column.resolution_key() == name.resolution_key()) {
                    Some(assignment) => SelectItem { expr: assignment.value.clone(), alias: item.alias.clone(), comments: item.comments.clone() },
                    None => item,
                }
            }
            _ => item,
        })
        .collect()
}

fn rewrite_delete(delete: &DeleteStatement, fixtures: &FixtureSet, opts: &ZtdOptions, shadow: Vec<CteDefinition>) -> Result<Statement, SqlFixtureError> {
    let table_key = delete.table.normalized();
    let from_clause = implicit_from(TableFactor::Table { name: delete.table.clone(), alias: delete.alias.clone() }, delete.using.as_ref());

    let items = returning_items_or_count(&delete.returning, || resolve_table_columns(&table_key, fixtures, opts.table_definitions.as_ref()))?;

    let select = SimpleSelect {
        with_clause: if shadow.is_empty() { None } else { Some(WithClause { ctes: shadow }) },
        select_clause: SelectClause { items, ..Default::default() },
        from_clause: Some(from_clause),
        where_clause: delete.where_clause.clone(),
        ..Default::default()
    };
    Ok(Statement::Select(SelectStatement::Simple(Box::new(select))))
}

/// `MERGE` lacks a declared join key in this AST, so "matched"/"not matched"
/// is approximated by the merge predicate itself and its negation rather
/// than a null-check on a known key column — documented in DESIGN.md.
fn branch_predicate(merge: &MergeStatement, clause: &MergeClause) -> Expr {
    let base = if clause.matched {
        merge.predicate.clone()
    } else {
        Expr::UnaryOp { op: UnaryOperator::Not, expr: Box::new(Expr::Nested(Box::new(merge.predicate.clone()))) }
    };
    match &clause.condition {
        Some(cond) => Expr::BinaryOp { left: Box::new(base), op: BinaryOperator::And, right: Box::new(cond.clone()) },
        None => base,
    }
}

fn rewrite_merge(merge: &MergeStatement, shadow: Vec<CteDefinition>) -> Result<Statement, SqlFixtureError> {
    if merge.clauses.is_empty() {
        return Err(ValidationError::new("MERGE has no WHEN clauses to rewrite").into());
    }
    let from = FromClause {
        source: TableFactor::Table { name: merge.target.clone(), alias: merge.target_alias.clone() },
        joins: vec![Join { kind: JoinKind::FullOuter, right: merge.source.clone(), predicate: Some(merge.predicate.clone()), using: None }],
    };

    let mut branches: Option<Statement> = None;
    for clause in &merge.clauses {
        let select = SimpleSelect {
            select_clause: SelectClause { items: vec![SelectItem { expr: Expr::Literal(LiteralValue::Int(1)), alias: None, comments: Trivia::default() }], ..Default::default() },
            from_clause: Some(from.clone()),
            where_clause: Some(branch_predicate(merge, clause)),
            ..Default::default()
        };
        let stmt = Statement::Select(SelectStatement::Simple(Box::new(select)));
        branches = Some(match branches {
            None => stmt,
            Some(prev) => Statement::Select(SelectStatement::Binary { op: SetOperator::Union, left: Box::new(prev), right: Box::new(stmt), all: true }),
        });
    }

    let action_cte = CteDefinition {
        name: Ident::new("__merge_action_rows"),
        column_list: None,
        recursive: false,
        materialized_hint: None,
        body: Box::new(branches.expect("merge has at least one clause")),
        comments: Trivia::default(),
    };
    let mut ctes = shadow;
    ctes.push(action_cte);

    let outer = SimpleSelect {
        with_clause: Some(WithClause { ctes }),
        select_clause: SelectClause { items: vec![count_star_item()], ..Default::default() },
        from_clause: Some(FromClause { source: TableFactor::Table { name: ObjectName::single(Ident::new("__merge_action_rows")), alias: None }, joins: vec![] }),
        ..Default::default()
    };
    Ok(Statement::Select(SelectStatement::Simple(Box::new(outer))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statement;

    fn users_fixture() -> FixtureSet {
        let mut fixtures = FixtureSet::default();
        fixtures.insert(
            "users".to_string(),
            Fixture::new(vec![("id".into(), "int".into()), ("email".into(), "text".into()), ("active".into(), "bool".into())]),
        );
        fixtures
    }

    #[test]
    fn insert_without_returning_emits_count() {
        let stmt = parse_statement("INSERT INTO users(email, active) VALUES (:e, :a)").unwrap();
        let fixtures = users_fixture();
        let rewritten = rewrite_for_fixtures(&stmt, &fixtures, &ZtdOptions::default(), None).unwrap();
        let select = rewritten.as_select().unwrap();
        match select {
            SelectStatement::Simple(simple) => {
                let with = simple.with_clause.as_ref().unwrap();
                assert_eq!(with.ctes.len(), 2);
                assert_eq!(with.ctes[0].name, Ident::new("users"));
                assert_eq!(with.ctes[1].name, Ident::new("__inserted_rows"));
                assert_eq!(simple.select_clause.items[0].alias, Some(Ident::new("count")));
            }
            _ => panic!("expected simple select"),
        }
    }

    #[test]
    fn missing_fixture_under_error_strategy_fails() {
        let stmt = parse_statement("SELECT id FROM users").unwrap();
        let result = rewrite_for_fixtures(&stmt, &FixtureSet::default(), &ZtdOptions::default(), None);
        assert!(matches!(result, Err(SqlFixtureError::FixtureCoverage(_))));
    }

    #[test]
    fn passthrough_strategy_leaves_uncovered_table_unshadowed() {
        let stmt = parse_statement("SELECT id FROM users").unwrap();
        let opts = ZtdOptions { missing_fixture_strategy: MissingFixtureStrategy::Passthrough, ..Default::default() };
        let rewritten = rewrite_for_fixtures(&stmt, &FixtureSet::default(), &opts, None).unwrap();
        match rewritten.as_select().unwrap() {
            SelectStatement::Simple(simple) => assert!(simple.with_clause.is_none()),
            _ => panic!("expected simple select"),
        }
    }

    #[test]
    fn merge_with_two_clauses_counts_union_all_branches() {
        let stmt = parse_statement(
            "MERGE INTO users AS t USING staged AS s ON t.id = s.id \
             WHEN MATCHED THEN UPDATE SET email = s.email \
             WHEN NOT MATCHED THEN INSERT (id, email) VALUES (s.id, s.email)",
        )
        .unwrap();
        let rewritten = rewrite_for_fixtures(&stmt, &FixtureSet::default(), &ZtdOptions::default(), None).unwrap();
        match rewritten.as_select().unwrap() {
            SelectStatement::Simple(simple) => {
                let cte = &simple.with_clause.as_ref().unwrap().ctes[0];
                assert_eq!(cte.name, Ident::new("__merge_action_rows"));
                assert!(matches!(cte.body.as_ref(), Statement::Select(SelectStatement::Binary { .. })));
            }
            _ => panic!("expected simple select"),
        }
    }
}

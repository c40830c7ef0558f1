//! Visitor traversal over the AST.
//!
//! The original design this spec distills from dispatches visits through
//! runtime polymorphism (every node implements an `accept` method). Here the
//! AST is a closed, sum-typed hierarchy, so traversal is exhaustive pattern
//! matching instead: a `Visitor` overrides the hooks it cares about and calls
//! the matching `walk_*` free function to keep descending, the same
//! "override + call through" convention `syn::visit` uses.

use super::expr::{Expr, FrameBound, WindowSpec};
use super::statement::*;

/// Every hook is a no-op by default; implementors override only what they
/// need and call `walk_*` to continue into children.
pub trait Visitor {
    fn visit_statement(&mut self, stmt: &Statement) {
        walk_statement(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_table_factor(&mut self, table: &TableFactor) {
        walk_table_factor(self, table);
    }

    fn visit_cte(&mut self, cte: &CteDefinition) {
        walk_cte(self, cte);
    }
}

pub fn walk_statement<V: Visitor + ?Sized>(v: &mut V, stmt: &Statement) {
    match stmt {
        Statement::Select(select) => walk_select_statement(v, select),
        Statement::Values(values) => {
            for row in &values.rows {
                row.iter().for_each(|e| v.visit_expr(e));
            }
        }
        Statement::Insert(insert) => {
            if let Some(with) = &insert.with_clause {
                with.ctes.iter().for_each(|cte| v.visit_cte(cte));
            }
            match &insert.source {
                InsertSource::Values(rows) => {
                    for row in rows {
                        row.iter().for_each(|e| v.visit_expr(e));
                    }
                }
                InsertSource::Select(stmt) => v.visit_statement(stmt),
            }
            if let Some(returning) = &insert.returning {
                returning.iter().for_each(|item| v.visit_expr(&item.expr));
            }
        }
        Statement::Update(update) => {
            if let Some(with) = &update.with_clause {
                with.ctes.iter().for_each(|cte| v.visit_cte(cte));
            }
            update.assignments.iter().for_each(|a| v.visit_expr(&a.value));
            if let Some(from) = &update.from {
                walk_from_clause(v, from);
            }
            if let Some(pred) = &update.where_clause {
                v.visit_expr(pred);
            }
            if let Some(returning) = &update.returning {
                returning.iter().for_each(|item| v.visit_expr(&item.expr));
            }
        }
        Statement::Delete(delete) => {
            if let Some(with) = &delete.with_clause {
                with.ctes.iter().for_each(|cte| v.visit_cte(cte));
            }
            if let Some(using) = &delete.using {
                walk_from_clause(v, using);
            }
            if let Some(pred) = &delete.where_clause {
                v.visit_expr(pred);
            }
            if let Some(returning) = &delete.returning {
                returning.iter().for_each(|item| v.visit_expr(&item.expr));
            }
        }
        Statement::Merge(merge) => {
            v.visit_table_factor(&merge.source);
            v.visit_expr(&merge.predicate);
            for clause in &merge.clauses {
                if let Some(cond) = &clause.condition {
                    v.visit_expr(cond);
                }
                match &clause.action {
                    MergeAction::Update(assignments) => {
                        assignments.iter().for_each(|a| v.visit_expr(&a.value));
                    }
                    MergeAction::Delete => {}
                    MergeAction::Insert { values, .. } => values.iter().for_each(|e| v.visit_expr(e)),
                }
            }
        }
        Statement::CreateTable(_)
        | Statement::AlterTable(_)
        | Statement::DropTable(_)
        | Statement::CreateIndex(_)
        | Statement::DropIndex(_) => {}
    }
}

fn walk_select_statement<V: Visitor + ?Sized>(v: &mut V, select: &SelectStatement) {
    match select {
        SelectStatement::Simple(simple) => walk_simple_select(v, simple),
        SelectStatement::Binary { left, right, .. } => {
            v.visit_statement(left);
            v.visit_statement(right);
        }
    }
}

fn walk_simple_select<V: Visitor + ?Sized>(v: &mut V, select: &SimpleSelect) {
    if let Some(with) = &select.with_clause {
        with.ctes.iter().for_each(|cte| v.visit_cte(cte));
    }
    for item in &select.select_clause.items {
        v.visit_expr(&item.expr);
    }
    if let Some(distinct_on) = &select.select_clause.distinct_on {
        distinct_on.iter().for_each(|e| v.visit_expr(e));
    }
    if let Some(from) = &select.from_clause {
        walk_from_clause(v, from);
    }
    if let Some(pred) = &select.where_clause {
        v.visit_expr(pred);
    }
    select.group_by.exprs.iter().for_each(|e| v.visit_expr(e));
    if let Some(having) = &select.having {
        v.visit_expr(having);
    }
    select.order_by.items.iter().for_each(|item| v.visit_expr(&item.expr));
    [&select.limit, &select.offset, &select.fetch].into_iter().flatten().for_each(|e| v.visit_expr(e));
}

fn walk_from_clause<V: Visitor + ?Sized>(v: &mut V, from: &FromClause) {
    v.visit_table_factor(&from.source);
    for join in &from.joins {
        v.visit_table_factor(&join.right);
        if let Some(pred) = &join.predicate {
            v.visit_expr(pred);
        }
    }
}

pub fn walk_table_factor<V: Visitor + ?Sized>(v: &mut V, table: &TableFactor) {
    if let TableFactor::Derived { subquery, .. } = table {
        v.visit_statement(subquery);
    }
}

pub fn walk_cte<V: Visitor + ?Sized>(v: &mut V, cte: &CteDefinition) {
    v.visit_statement(&cte.body);
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::Column { .. } | Expr::Wildcard | Expr::QualifiedWildcard(_) | Expr::Literal(_) | Expr::Parameter(_) => {}
        Expr::FunctionCall(call) => {
            call.args.iter().for_each(|a| v.visit_expr(a));
            if let Some(over) = &call.over {
                walk_window(v, over);
            }
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) => v.visit_expr(expr),
        Expr::BinaryOp { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        Expr::Case { operand, when_then, else_result } => {
            if let Some(operand) = operand {
                v.visit_expr(operand);
            }
            for (when, then) in when_then {
                v.visit_expr(when);
                v.visit_expr(then);
            }
            if let Some(else_result) = else_result {
                v.visit_expr(else_result);
            }
        }
        Expr::Between { expr, low, high, .. } => {
            v.visit_expr(expr);
            v.visit_expr(low);
            v.visit_expr(high);
        }
        Expr::InList { expr, list, .. } => {
            v.visit_expr(expr);
            list.iter().for_each(|e| v.visit_expr(e));
        }
        Expr::InSubquery { expr, subquery, .. } => {
            v.visit_expr(expr);
            v.visit_statement(subquery);
        }
        Expr::Exists { subquery, .. } | Expr::Subquery(subquery) => v.visit_statement(subquery),
        Expr::Array(items) => items.iter().for_each(|e| v.visit_expr(e)),
        Expr::Cast { expr, .. } => v.visit_expr(expr),
    }
}

fn walk_window<V: Visitor + ?Sized>(v: &mut V, window: &WindowSpec) {
    window.partition_by.iter().for_each(|e| v.visit_expr(e));
    window.order_by.iter().for_each(|item| v.visit_expr(&item.expr));
    if let Some(frame) = &window.frame {
        walk_bound(v, &frame.start);
        if let Some(end) = &frame.end {
            walk_bound(v, end);
        }
    }
}

fn walk_bound<V: Visitor + ?Sized>(v: &mut V, bound: &FrameBound) {
    match bound {
        FrameBound::Preceding(e) | FrameBound::Following(e) => v.visit_expr(e),
        FrameBound::UnboundedPreceding | FrameBound::CurrentRow | FrameBound::UnboundedFollowing => {}
    }
}

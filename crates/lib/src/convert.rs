//! C7 support: thin constructors that assemble a `Statement` from already
//! validated pieces, plus the INSERT VALUES <-> SELECT round-trip helpers.

use sqlfixture_core::ast::*;
use sqlfixture_core::errors::ValidationError;

pub fn build_insert_query(
    table: ObjectName,
    columns: Option<Vec<Ident>>,
    source: InsertSource,
    returning: Option<Vec<SelectItem>>,
) -> Statement {
    Statement::Insert(InsertStatement { with_clause: None, table, columns, source, returning })
}

pub fn build_update_query(
    table: ObjectName,
    alias: Option<Ident>,
    assignments: Vec<Assignment>,
    from: Option<FromClause>,
    where_clause: Option<Expr>,
    returning: Option<Vec<SelectItem>>,
) -> Statement {
    Statement::Update(UpdateStatement { with_clause: None, table, alias, assignments, from, where_clause, returning })
}

pub fn build_delete_query(
    table: ObjectName,
    alias: Option<Ident>,
    using: Option<FromClause>,
    where_clause: Option<Expr>,
    returning: Option<Vec<SelectItem>>,
) -> Statement {
    Statement::Delete(DeleteStatement { with_clause: None, table, alias, using, where_clause, returning })
}

pub fn build_merge_query(target: ObjectName, target_alias: Option<Ident>, source: TableFactor, predicate: Expr, clauses: Vec<MergeClause>) -> Statement {
    Statement::Merge(MergeStatement { target, target_alias, source, predicate, clauses })
}

pub fn build_create_table_query(name: ObjectName, if_not_exists: bool, columns: Vec<ColumnDef>, constraints: Vec<TableConstraint>) -> Statement {
    Statement::CreateTable(CreateTableStatement { name, if_not_exists, columns, constraints })
}

/// Turns an `INSERT ... VALUES` into the equivalent `SELECT` — one row
/// literal, `UNION ALL`-ed with the rest. Requires an explicit column list,
/// since a bare `SELECT` needs names for its projection.
pub fn convert_insert_values_to_select(insert: &InsertStatement) -> Result<Statement, ValidationError> {
    let InsertSource::Values(rows) = &insert.source else {
        return Err(ValidationError::new("convertInsertValuesToSelect requires an INSERT ... VALUES statement"));
    };
    let columns = insert
        .columns
        .as_ref()
        .ok_or_else(|| ValidationError::new("convertInsertValuesToSelect requires an explicit column list"))?;
    if rows.is_empty() {
        return Err(ValidationError::new("convertInsertValuesToSelect requires at least one row"));
    }

    let row_select = |row: &[Expr]| -> Result<SimpleSelect, ValidationError> {
        if row.len() != columns.len() {
            return Err(ValidationError::new("VALUES row arity does not match the column list"));
        }
        let items = columns
            .iter()
            .zip(row.iter())
            .map(|(col, expr)| SelectItem { expr: expr.clone(), alias: Some(col.clone()), comments: Trivia::default() })
            .collect();
        Ok(SimpleSelect { select_clause: SelectClause { items, ..Default::default() }, ..Default::default() })
    };

    let mut iter = rows.iter();
    let first = row_select(iter.next().expect("checked non-empty above"))?;
    let mut stmt = Statement::Select(SelectStatement::Simple(Box::new(first)));
    for row in iter {
        let next = row_select(row)?;
        stmt = Statement::Select(SelectStatement::Binary {
            op: SetOperator::Union,
            left: Box::new(stmt),
            right: Box::new(Statement::Select(SelectStatement::Simple(Box::new(next)))),
            all: true,
        });
    }
    Ok(stmt)
}

/// The inverse of [`convert_insert_values_to_select`]: flattens a chain of
/// `SELECT <literals> UNION ALL ...` back into `InsertSource::Values`. Fails
/// if any branch isn't a simple select over literal expressions only.
pub fn convert_insert_select_to_values(table: ObjectName, select: &Statement) -> Result<InsertStatement, ValidationError> {
    let simples = flatten_union_all(select)?;
    let columns: Vec<Ident> = simples[0]
        .select_clause
        .items
        .iter()
        .map(|item| item.output_name().cloned().ok_or_else(|| ValidationError::new("every branch needs a named or bare-column output")))
        .collect::<Result<_, _>>()?;

    let mut rows = Vec::with_capacity(simples.len());
    for simple in &simples {
        if simple.select_clause.items.len() != columns.len() {
            return Err(ValidationError::new("UNION ALL branches project a different number of columns"));
        }
        let row = simple
            .select_clause
            .items
            .iter()
            .map(|item| match &item.expr {
                Expr::Literal(_) => Ok(item.expr.clone()),
                _ => Err(ValidationError::new("convertInsertSelectToValues requires every projected expression to be a literal")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }

    Ok(InsertStatement { with_clause: None, table, columns: Some(columns), source: InsertSource::Values(rows), returning: None })
}

fn flatten_union_all(stmt: &Statement) -> Result<Vec<SimpleSelect>, ValidationError> {
    match stmt {
        Statement::Select(SelectStatement::Simple(simple)) => Ok(vec![simple.as_ref().clone()]),
        Statement::Select(SelectStatement::Binary { op: SetOperator::Union, left, right, all: true }) => {
            let mut left_rows = flatten_union_all(left)?;
            left_rows.extend(flatten_union_all(right)?);
            Ok(left_rows)
        }
        _ => Err(ValidationError::new("convertInsertSelectToValues requires a chain of UNION ALL simple selects")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_to_select_and_back_round_trips() {
        let insert = InsertStatement {
            with_clause: None,
            table: ObjectName::single(Ident::new("users")),
            columns: Some(vec![Ident::new("id"), Ident::new("name")]),
            source: InsertSource::Values(vec![
                vec![Expr::Literal(LiteralValue::Int(1)), Expr::Literal(LiteralValue::String("a".to_string()))],
                vec![Expr::Literal(LiteralValue::Int(2)), Expr::Literal(LiteralValue::String("b".to_string()))],
            ]),
            returning: None,
        };
        let select = convert_insert_values_to_select(&insert).unwrap();
        let roundtripped = convert_insert_select_to_values(ObjectName::single(Ident::new("users")), &select).unwrap();
        assert_eq!(roundtripped.source, insert.source);
        assert_eq!(roundtripped.columns, insert.columns);
    }
}

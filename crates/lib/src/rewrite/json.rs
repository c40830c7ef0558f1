//! C5.2: the hierarchical JSON projection builder. Lowers a flat row plus a
//! declarative entity hierarchy into a pipeline of aggregating CTEs.
//!
//! Supports a single linear ancestor chain (root -> child -> grandchild ->
//! ...); a parent with more than one nested child is rejected rather than
//! silently mis-aggregated, since collapsing branching siblings through one
//! shared sequential CTE chain needs per-branch correlated subqueries instead.

use sqlfixture_core::ast::*;
use sqlfixture_core::errors::ValidationError;
use sqlfixture_helpers::{enter_panic, IndexMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipType {
    Array,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFormat {
    Array,
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyResult {
    EmptyArray,
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonEntity {
    pub id: String,
    /// `jsonProp -> sqlColumn`, in the order the JSON object should emit.
    pub columns: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NestedJsonEntity {
    pub entity: JsonEntity,
    pub parent_id: String,
    pub property_name: String,
    pub relationship_type: RelationshipType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonMapping {
    pub root_name: String,
    pub root_entity: JsonEntity,
    pub nested_entities: Vec<NestedJsonEntity>,
    pub use_jsonb: bool,
    pub result_format: ResultFormat,
    pub empty_result: EmptyResult,
}

struct EntityNode<'a> {
    id: &'a str,
    parent_id: Option<&'a str>,
    property_name: Option<&'a str>,
    relationship: Option<RelationshipType>,
    columns: &'a IndexMap<String, String>,
    depth: usize,
}

fn index_entities(mapping: &JsonMapping) -> Result<Vec<EntityNode<'_>>, ValidationError> {
    let mut nodes = vec![EntityNode {
        id: &mapping.root_entity.id,
        parent_id: None,
        property_name: None,
        relationship: None,
        columns: &mapping.root_entity.columns,
        depth: 0,
    }];
    for nested in &mapping.nested_entities {
        nodes.push(EntityNode {
            id: &nested.entity.id,
            parent_id: Some(&nested.parent_id),
            property_name: Some(&nested.property_name),
            relationship: Some(nested.relationship_type),
            columns: &nested.entity.columns,
            depth: 0,
        });
    }

    let ids: std::collections::HashSet<&str> = nodes.iter().map(|n| n.id).collect();
    for nested in &mapping.nested_entities {
        if !ids.contains(nested.parent_id.as_str()) {
            return Err(ValidationError::new(format!("entity `{}` has parentId `{}` with no matching entity", nested.entity.id, nested.parent_id)));
        }
    }

    let mut seen_parents = std::collections::HashSet::new();
    for nested in &mapping.nested_entities {
        if !seen_parents.insert(nested.parent_id.as_str()) {
            return Err(ValidationError::new(format!(
                "entity `{}` is a second child of parentId `{}`: this builder only supports a single linear ancestor chain, not branching siblings",
                nested.entity.id, nested.parent_id
            )));
        }
    }

    loop {
        let mut changed = false;
        let snapshot: Vec<(usize, Option<&str>)> = nodes.iter().map(|n| (n.depth, n.parent_id)).collect();
        for i in 0..nodes.len() {
            if let Some(parent_id) = snapshot[i].1 {
                if let Some(parent_depth) = nodes.iter().find(|n| n.id == parent_id).map(|n| n.depth) {
                    let new_depth = parent_depth + 1;
                    if nodes[i].depth != new_depth {
                        nodes[i].depth = new_depth;
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
        if nodes.iter().any(|n| n.depth > nodes.len()) {
            return Err(ValidationError::new("cycle detected in JSON entity hierarchy"));
        }
    }
    Ok(nodes)
}

fn validate_mapping(mapping: &JsonMapping, select: &SimpleSelect) -> Result<(), ValidationError> {
    let projected: std::collections::HashSet<String> = select
        .select_clause
        .items
        .iter()
        .filter_map(|item| item.output_name().map(|n| n.resolution_key().into_owned()))
        .collect();

    let mut check_columns = |id: &str, columns: &IndexMap<String, String>| -> Result<(), ValidationError> {
        for sql_column in columns.values() {
            if !projected.contains(&sql_column.to_ascii_lowercase()) {
                return Err(ValidationError::new(format!("entity `{id}` references column `{sql_column}` not present in the flat projection")));
            }
        }
        Ok(())
    };
    check_columns(&mapping.root_entity.id, &mapping.root_entity.columns)?;
    for nested in &mapping.nested_entities {
        check_columns(&nested.entity.id, &nested.entity.columns)?;
    }
    Ok(())
}

fn json_build_object_fn(use_jsonb: bool, columns: &IndexMap<String, String>, source: &str) -> Expr {
    let name = if use_jsonb { "jsonb_build_object" } else { "json_build_object" };
    let mut args = Vec::with_capacity(columns.len() * 2);
    for (prop, col) in columns {
        args.push(Expr::Literal(LiteralValue::String(prop.clone())));
        args.push(Expr::qualified_column(source, col));
    }
    Expr::FunctionCall(FunctionCall { name: ObjectName::single(Ident::new(name)), args, distinct: false, over: None })
}

fn agg_fn(use_jsonb: bool, expr: Expr) -> Expr {
    let name = if use_jsonb { "jsonb_agg" } else { "json_agg" };
    Expr::FunctionCall(FunctionCall { name: ObjectName::single(Ident::new(name)), args: vec![expr], distinct: false, over: None })
}

fn empty_array_literal(use_jsonb: bool) -> Expr {
    let data_type = if use_jsonb { "jsonb" } else { "json" };
    Expr::Cast {
        expr: Box::new(Expr::Literal(LiteralValue::String("[]".to_string()))),
        data_type: DataType(data_type.to_string()),
        style: CastStyle::Postgres,
    }
}

/// Every column belonging to `entity`'s ancestors (not `entity` itself),
/// deduplicated. These are the columns a stage collapsing `entity` must carry
/// forward raw: ancestor entities still need them for their own
/// `json_build_object` calls and for grouping further up the chain, while
/// `entity`'s own columns are fully consumed into the aggregate at this stage.
fn ancestor_passthrough_columns<'a>(entity: &EntityNode<'a>, all: &'a [EntityNode<'a>]) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = parent_of(entity, all);
    while let Some(node) = current {
        for col in node.columns.values() {
            if !chain.contains(col) {
                chain.push(col.clone());
            }
        }
        current = parent_of(node, all);
    }
    chain.reverse();
    chain
}

fn cte(name: impl Into<String>, body: Statement) -> CteDefinition {
    CteDefinition {
        name: Ident::new(name),
        column_list: None,
        recursive: false,
        materialized_hint: None,
        body: Box::new(body),
        comments: Trivia::default(),
    }
}

/// Lowers `select` plus `mapping` into a `WITH`-chain statement that produces
/// the nested JSON shape `mapping` describes.
pub fn build_json(select: &SimpleSelect, mapping: &JsonMapping) -> Result<Statement, ValidationError> {
    let _ctx = enter_panic("build_json".to_string());
    validate_mapping(mapping, select)?;
    let entities = index_entities(mapping)?;

    let mut ctes = vec![cte("origin_query", Statement::Select(SelectStatement::Simple(Box::new(select.clone()))))];
    let mut current_source = "origin_query".to_string();

    let mut array_entities: Vec<&EntityNode> = entities.iter().filter(|n| n.relationship == Some(RelationshipType::Array)).collect();
    array_entities.sort_by(|a, b| b.depth.cmp(&a.depth));
    for entity in &array_entities {
        let passthrough = ancestor_passthrough_columns(entity, &entities);
        let group_by = passthrough.iter().map(|k| Expr::qualified_column(current_source.as_str(), k)).collect::<Vec<_>>();
        let items: Vec<SelectItem> = passthrough
            .iter()
            .map(|k| SelectItem { expr: Expr::qualified_column(current_source.as_str(), k), alias: Some(Ident::new(k.clone())), comments: Trivia::default() })
            .chain(std::iter::once(SelectItem {
                expr: agg_fn(mapping.use_jsonb, json_build_object_fn(mapping.use_jsonb, entity.columns, &current_source)),
                alias: entity.property_name.map(Ident::new),
                comments: Trivia::default(),
            }))
            .collect();
        let stage = SimpleSelect {
            select_clause: SelectClause { items, ..Default::default() },
            from_clause: Some(FromClause { source: TableFactor::Table { name: ObjectName::single(Ident::new(current_source.clone())), alias: None }, joins: vec![] }),
            group_by: GroupBy { exprs: group_by },
            ..Default::default()
        };
        let stage_name = format!("stage_{}_{}", entity.depth, entity.id.to_ascii_lowercase());
        ctes.push(cte(stage_name.clone(), Statement::Select(SelectStatement::Simple(Box::new(stage)))));
        current_source = stage_name;
    }

    let mut object_entities: Vec<&EntityNode> = entities.iter().filter(|n| n.relationship == Some(RelationshipType::Object)).collect();
    object_entities.sort_by(|a, b| b.depth.cmp(&a.depth));
    for entity in &object_entities {
        let null_guard_cols: Vec<Expr> = entity.columns.values().map(|c| Expr::qualified_column(current_source.as_str(), c)).collect();
        let all_null = null_guard_cols
            .iter()
            .cloned()
            .map(|c| Expr::BinaryOp { left: Box::new(c), op: BinaryOperator::Is, right: Box::new(Expr::Literal(LiteralValue::Null)) })
            .reduce(|a, b| Expr::BinaryOp { left: Box::new(a), op: BinaryOperator::And, right: Box::new(b) })
            .unwrap_or(Expr::Literal(LiteralValue::Boolean(true)));
        let json_col_name = format!("{}_json", entity.id.to_ascii_lowercase());
        let case_expr = Expr::Case {
            operand: None,
            when_then: vec![(all_null, Expr::Literal(LiteralValue::Null))],
            else_result: Some(Box::new(json_build_object_fn(mapping.use_jsonb, entity.columns, &current_source))),
        };
        let stage = SimpleSelect {
            select_clause: SelectClause {
                items: vec![
                    SelectItem { expr: Expr::QualifiedWildcard(vec![Ident::new(current_source.clone())]), alias: None, comments: Trivia::default() },
                    SelectItem { expr: case_expr, alias: Some(Ident::new(json_col_name.clone())), comments: Trivia::default() },
                ],
                ..Default::default()
            },
            from_clause: Some(FromClause { source: TableFactor::Table { name: ObjectName::single(Ident::new(current_source.clone())), alias: None }, joins: vec![] }),
            ..Default::default()
        };
        let stage_name = format!("stage_{}_{}", entity.depth, entity.id.to_ascii_lowercase());
        ctes.push(cte(stage_name.clone(), Statement::Select(SelectStatement::Simple(Box::new(stage)))));
        current_source = stage_name;
    }

    let root_cte_name = format!("cte_root_{}", mapping.root_name.to_ascii_lowercase());
    let root_items: Vec<SelectItem> = std::iter::once(SelectItem {
        expr: json_build_object_fn(mapping.use_jsonb, &mapping.root_entity.columns, &current_source),
        alias: Some(Ident::new(mapping.root_name.clone())),
        comments: Trivia::default(),
    })
    .collect();
    let root_select = SimpleSelect {
        select_clause: SelectClause { items: root_items, ..Default::default() },
        from_clause: Some(FromClause { source: TableFactor::Table { name: ObjectName::single(Ident::new(current_source.clone())), alias: None }, joins: vec![] }),
        ..Default::default()
    };
    ctes.push(cte(root_cte_name.clone(), Statement::Select(SelectStatement::Simple(Box::new(root_select)))));

    let root_column = Expr::column(mapping.root_name.clone());
    let outer_expr = match mapping.result_format {
        ResultFormat::Array => {
            let aggregated = agg_fn(mapping.use_jsonb, root_column);
            match mapping.empty_result {
                EmptyResult::Null => aggregated,
                EmptyResult::EmptyArray => Expr::FunctionCall(FunctionCall {
                    name: ObjectName::single(Ident::new("coalesce")),
                    args: vec![aggregated, empty_array_literal(mapping.use_jsonb)],
                    distinct: false,
                    over: None,
                }),
            }
        }
        ResultFormat::Single => root_column,
    };
    let mut outer = SimpleSelect {
        with_clause: Some(WithClause { ctes }),
        select_clause: SelectClause {
            items: vec![SelectItem { expr: outer_expr, alias: Some(Ident::new(mapping.root_name.clone())), comments: Trivia::default() }],
            ..Default::default()
        },
        from_clause: Some(FromClause { source: TableFactor::Table { name: ObjectName::single(Ident::new(root_cte_name)), alias: None }, joins: vec![] }),
        ..Default::default()
    };
    if matches!(mapping.result_format, ResultFormat::Single) {
        outer.limit = Some(Expr::Literal(LiteralValue::Int(1)));
    }
    Ok(Statement::Select(SelectStatement::Simple(Box::new(outer))))
}

fn parent_of<'a>(entity: &EntityNode<'a>, all: &'a [EntityNode<'a>]) -> Option<&'a EntityNode<'a>> {
    entity.parent_id.and_then(|pid| all.iter().find(|n| n.id == pid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_select() -> SimpleSelect {
        SimpleSelect {
            select_clause: SelectClause {
                items: vec![
                    SelectItem { expr: Expr::column("division_id"), alias: None, comments: Trivia::default() },
                    SelectItem { expr: Expr::column("division_name"), alias: None, comments: Trivia::default() },
                    SelectItem { expr: Expr::column("dept_id"), alias: None, comments: Trivia::default() },
                    SelectItem { expr: Expr::column("dept_name"), alias: None, comments: Trivia::default() },
                ],
                ..Default::default()
            },
            from_clause: Some(FromClause {
                source: TableFactor::Table { name: ObjectName::single(Ident::new("flat_rows")), alias: None },
                joins: vec![],
            }),
            ..Default::default()
        }
    }

    fn column_map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn two_level_mapping_produces_one_array_stage_and_a_root_cte() {
        let mapping = JsonMapping {
            root_name: "Division".to_string(),
            root_entity: JsonEntity { id: "division".to_string(), columns: column_map(&[("id", "division_id"), ("name", "division_name")]) },
            nested_entities: vec![NestedJsonEntity {
                entity: JsonEntity { id: "departments".to_string(), columns: column_map(&[("id", "dept_id"), ("name", "dept_name")]) },
                parent_id: "division".to_string(),
                property_name: "departments".to_string(),
                relationship_type: RelationshipType::Array,
            }],
            use_jsonb: true,
            result_format: ResultFormat::Single,
            empty_result: EmptyResult::Null,
        };
        let stmt = build_json(&flat_select(), &mapping).unwrap();
        match stmt {
            Statement::Select(SelectStatement::Simple(select)) => {
                let ctes = &select.with_clause.unwrap().ctes;
                assert_eq!(ctes.len(), 3);
                assert_eq!(ctes[0].name, Ident::new("origin_query"));
                assert!(ctes[1].name.value.starts_with("stage_1_departments"));
                assert_eq!(ctes[2].name, Ident::new("cte_root_division"));
            }
            _ => panic!("expected simple select"),
        }
    }

    #[test]
    fn branching_siblings_under_the_same_parent_are_rejected() {
        let mapping = JsonMapping {
            root_name: "Division".to_string(),
            root_entity: JsonEntity { id: "division".to_string(), columns: column_map(&[("id", "division_id")]) },
            nested_entities: vec![
                NestedJsonEntity {
                    entity: JsonEntity { id: "departments".to_string(), columns: column_map(&[("id", "dept_id")]) },
                    parent_id: "division".to_string(),
                    property_name: "departments".to_string(),
                    relationship_type: RelationshipType::Array,
                },
                NestedJsonEntity {
                    entity: JsonEntity { id: "managers".to_string(), columns: column_map(&[("id", "dept_id")]) },
                    parent_id: "division".to_string(),
                    property_name: "managers".to_string(),
                    relationship_type: RelationshipType::Array,
                },
            ],
            use_jsonb: true,
            result_format: ResultFormat::Single,
            empty_result: EmptyResult::Null,
        };
        assert!(build_json(&flat_select(), &mapping).is_err());
    }

    #[test]
    fn unknown_parent_id_is_rejected() {
        let mapping = JsonMapping {
            root_name: "Division".to_string(),
            root_entity: JsonEntity { id: "division".to_string(), columns: column_map(&[("id", "division_id")]) },
            nested_entities: vec![NestedJsonEntity {
                entity: JsonEntity { id: "departments".to_string(), columns: column_map(&[("id", "dept_id")]) },
                parent_id: "missing".to_string(),
                property_name: "departments".to_string(),
                relationship_type: RelationshipType::Array,
            }],
            use_jsonb: true,
            result_format: ResultFormat::Single,
            empty_result: EmptyResult::Null,
        };
        assert!(build_json(&flat_select(), &mapping).is_err());
    }
}

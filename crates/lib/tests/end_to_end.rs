//! The literal end-to-end scenarios and universal properties.

use sqlfixture::{
    build_dynamic, build_json, format, parse_statement, rewrite_for_fixtures, Comparator, DynamicOptions,
    EmptyResult, Fixture, FixtureSet, FilterCondition, FilterValue, JsonEntity, JsonMapping, KeywordCase,
    NestedJsonEntity, PageSpec, ParamsOutput, ParameterStyle, RelationshipType, ResultFormat, Style, ZtdOptions,
};
use sqlfixture::ast::LiteralValue;
use sqlfixture::printer::{CommentStyle, ExportComment};

#[test]
fn smart_comment_style_prints_with_upper_keywords() {
    let stmt = parse_statement("SELECT /* User ID */ id FROM users").unwrap();
    let style =
        Style { keyword_case: KeywordCase::Upper, comment_style: CommentStyle::Smart, export_comment: ExportComment::Full, ..Style::default() };
    let result = format(&stmt, &style);
    assert_eq!(result.text, "SELECT /* User ID */ \"id\" FROM \"users\"");
}

#[test]
fn named_parameters_dedupe_by_first_occurrence_when_rendered_indexed() {
    let stmt = parse_statement("SELECT * FROM orders WHERE x = :x AND y = :y AND x2 = :x").unwrap();
    let style = Style { parameter_style: ParameterStyle::Indexed, ..Style::default() };
    let result = format(&stmt, &style);
    match result.params {
        ParamsOutput::Indexed(params) => assert_eq!(params.len(), 2),
        other => panic!("expected indexed params, got {other:?}"),
    }
}

#[test]
fn ztd_insert_without_returning_rewrites_to_a_count_select() {
    let stmt = parse_statement("INSERT INTO users(email, active) VALUES ('a@example.com', true)").unwrap();
    let mut fixtures = FixtureSet::default();
    fixtures.insert(
        "users".to_string(),
        Fixture::new(vec![("id".to_string(), "int".to_string()), ("email".to_string(), "text".to_string()), ("active".to_string(), "bool".to_string())]),
    );
    let rewritten = rewrite_for_fixtures(&stmt, &fixtures, &ZtdOptions::default(), None).unwrap();
    let printed = format(&rewritten, &Style::default());
    assert!(printed.text.contains("count( *) as \"count\""));
    assert!(printed.text.contains("from \"__inserted_rows\""));
}

#[test]
fn ztd_merge_with_two_clauses_counts_affected_rows() {
    let stmt = parse_statement(
        "MERGE INTO users AS t USING staged AS s ON t.id = s.id \
         WHEN MATCHED THEN UPDATE SET email = s.email \
         WHEN NOT MATCHED THEN INSERT (id, email) VALUES (s.id, s.email)",
    )
    .unwrap();
    let rewritten = rewrite_for_fixtures(&stmt, &FixtureSet::default(), &ZtdOptions::default(), None).unwrap();
    let printed = format(&rewritten, &Style::default());
    assert!(printed.text.contains("count( *) as \"count\""));
    assert!(printed.text.contains("from \"__merge_action_rows\""));
}

#[test]
fn dynamic_filter_range_and_paging_renders_named_parameters() {
    let stmt = parse_statement("SELECT id, status, price FROM t").unwrap();
    let filters = vec![
        FilterCondition::Compare {
            column_key: "status".to_string(),
            comparator: Comparator::In,
            value: Some(FilterValue::Array(vec![LiteralValue::String("active".to_string()), LiteralValue::String("pending".to_string())])),
        },
        FilterCondition::Compare {
            column_key: "price".to_string(),
            comparator: Comparator::Between,
            value: Some(FilterValue::Range { low: Some(LiteralValue::Int(10)), high: Some(LiteralValue::Int(99)) }),
        },
    ];
    let page = PageSpec { page: 2, page_size: 25 };
    let result = build_dynamic(&stmt, &filters, &[], Some(page), &DynamicOptions::default(), None).unwrap();
    let printed = format(&result.statement, &Style::default());
    assert_eq!(
        printed.text,
        "select \"id\", \"status\", \"price\" from \"t\" where \"status\" in( :status_0, :status_1) and \"price\" between :price_min and :price_max limit 25 offset 25"
    );
    assert_eq!(result.params.get("status_0"), Some(&LiteralValue::String("active".to_string())));
    assert_eq!(result.params.get("status_1"), Some(&LiteralValue::String("pending".to_string())));
    assert_eq!(result.params.get("price_min"), Some(&LiteralValue::Int(10)));
    assert_eq!(result.params.get("price_max"), Some(&LiteralValue::Int(99)));
}

#[test]
fn hierarchical_json_builds_a_three_level_pipeline() {
    let stmt = parse_statement("SELECT division_id, division_name, dept_id, dept_name, emp_id, emp_name FROM flat_rows").unwrap();
    let select = stmt.as_select().unwrap();
    let sqlfixture::ast::SelectStatement::Simple(simple) = select else { panic!("expected simple select") };

    let mapping = JsonMapping {
        root_name: "Division".to_string(),
        root_entity: JsonEntity {
            id: "division".to_string(),
            columns: [("id".to_string(), "division_id".to_string()), ("name".to_string(), "division_name".to_string())].into_iter().collect(),
        },
        nested_entities: vec![
            NestedJsonEntity {
                entity: JsonEntity {
                    id: "departments".to_string(),
                    columns: [("id".to_string(), "dept_id".to_string()), ("name".to_string(), "dept_name".to_string())].into_iter().collect(),
                },
                parent_id: "division".to_string(),
                property_name: "departments".to_string(),
                relationship_type: RelationshipType::Array,
            },
            NestedJsonEntity {
                entity: JsonEntity {
                    id: "employees".to_string(),
                    columns: [("id".to_string(), "emp_id".to_string()), ("name".to_string(), "emp_name".to_string())].into_iter().collect(),
                },
                parent_id: "departments".to_string(),
                property_name: "employees".to_string(),
                relationship_type: RelationshipType::Array,
            },
        ],
        use_jsonb: true,
        result_format: ResultFormat::Single,
        empty_result: EmptyResult::Null,
    };

    let built = build_json(simple.as_ref(), &mapping).unwrap();
    let printed = format(&built, &Style::default());
    assert!(printed.text.contains("stage_2_employees"));
    assert!(printed.text.contains("stage_1_departments"));
    assert!(printed.text.contains("cte_root_division"));
}

#[test]
fn parsing_the_same_text_twice_yields_structurally_equal_statements() {
    let sql = "SELECT a, b FROM t WHERE a > 1 ORDER BY b DESC LIMIT 10";
    let first = parse_statement(sql).unwrap();
    let second = parse_statement(sql).unwrap();
    assert_eq!(first, second);
}

#[test]
fn printing_then_reparsing_preserves_structure() {
    let sql = "SELECT a, b FROM t WHERE a > 1 AND b < 2";
    let stmt = parse_statement(sql).unwrap();
    let printed = format(&stmt, &Style::default());
    let reparsed = parse_statement(&printed.text).unwrap();
    assert_eq!(stmt, reparsed);
}

#[test]
fn ztd_coverage_error_under_the_error_strategy_names_the_missing_table() {
    let stmt = parse_statement("SELECT id FROM orders").unwrap();
    let err = rewrite_for_fixtures(&stmt, &FixtureSet::default(), &ZtdOptions::default(), None).unwrap_err();
    match err {
        sqlfixture::SqlFixtureError::FixtureCoverage(coverage) => assert_eq!(coverage.tables, vec!["orders".to_string()]),
        other => panic!("expected fixture coverage error, got {other:?}"),
    }
}


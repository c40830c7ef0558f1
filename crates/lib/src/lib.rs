//! `sqlfixture`: parses SQL, rewrites it against fixture data instead of a
//! live database, and prints it back out under a configurable style.
//!
//! - [`parser`] (C3) — `parse_statement`, `parse_statements`, `parse_to_cursor`, `scope_at`.
//! - [`rewrite`] (C5) — `rewrite_for_fixtures`, `build_json`, `build_dynamic`.
//! - [`printer`] (C6) — `format`.
//! - [`convert`] (C7 support) — the INSERT/SELECT/UPDATE/DELETE/MERGE/CREATE
//!   TABLE builders and the VALUES<->SELECT round trip.
//! - [`driver`] (C7) — the fixture-intercepting proxy.

pub mod convert;
pub mod driver;
pub mod parser;
pub mod printer;
pub mod rewrite;

pub use sqlfixture_core::ast;
pub use sqlfixture_core::errors::{Diagnostic, SqlFixtureError};

pub type Error = SqlFixtureError;

pub use convert::{
    build_create_table_query, build_delete_query, build_insert_query, build_merge_query, build_update_query,
    convert_insert_select_to_values, convert_insert_values_to_select,
};
pub use driver::{FixtureDriver, InterceptedStatement, InterceptingProxy, ProxyError, QueryOutcome};
pub use parser::{parse_statement, parse_statements, parse_to_cursor, scope_at, ParseOptions, ParseToCursorResult};
pub use printer::{format, FormatResult, ParamsOutput, Style};
pub use rewrite::{
    build_dynamic, build_json, rewrite_for_fixtures, Comparator, DynamicError, DynamicOptions, DynamicQuery,
    EmptyResult, Fixture, FixtureSet, FilterCondition, FilterValue, JsonEntity, JsonMapping, MissingFixtureStrategy,
    NestedJsonEntity, PageSpec, RelationshipType, ResultFormat, SortSpec, TableDefinition, TableDefinitions, ZtdOptions,
};

//! C5: the rewrite family — ZTD fixture substitution, hierarchical JSON
//! projection, and dynamic filter/sort/page query assembly.

pub mod dynamic;
pub mod fixture;
pub mod json;
pub mod ztd;

pub use dynamic::{build_dynamic, Comparator, DynamicError, DynamicOptions, DynamicQuery, FilterCondition, FilterValue, PageSpec, SortSpec};
pub use fixture::{Fixture, FixtureSet, MissingFixtureStrategy, TableDefinition, TableDefinitions, ZtdOptions};
pub use json::{build_json, EmptyResult, JsonEntity, JsonMapping, NestedJsonEntity, RelationshipType, ResultFormat};
pub use ztd::rewrite_for_fixtures;

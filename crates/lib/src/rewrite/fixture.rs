//! Fixture sets and table definitions: the data ZTD rewrites against.

use std::collections::BTreeMap;

use sqlfixture_core::ast::LiteralValue;
use sqlfixture_helpers::IndexMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered column list plus an ordered row set for one base table,
/// keyed into a [`FixtureSet`] by [`sqlfixture_core::ast::ObjectName::normalized`].
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Vec<LiteralValue>>,
    pub schema_hints: IndexMap<String, String>,
}

impl Fixture {
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Fixture { columns, rows: Vec::new(), schema_hints: IndexMap::default() }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<LiteralValue>>) -> Self {
        self.rows = rows;
        self
    }
}

pub type FixtureSet = IndexMap<String, Fixture>;

/// The declared shape of one table, as read from a schema-discovery JSON
/// file (`{"<table>": {"columns": {"<col>": "<declaredType>"}}}`).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableDefinition {
    pub columns: BTreeMap<String, String>,
}

/// The resolved shape of every table a rewrite might touch. A plain struct
/// rather than a resolver trait object so it round-trips through `serde`
/// without a dyn boundary; callers wrapping a dynamic lookup build one
/// lazily via [`TableDefinitions::from_resolver`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableDefinitions {
    pub tables: BTreeMap<String, TableDefinition>,
}

impl TableDefinitions {
    /// Builds a `TableDefinitions` covering exactly `table_keys`, using
    /// `resolver` to look each one up. Tables the resolver can't answer for
    /// are simply absent — callers fall back to fixture-derived columns.
    pub fn from_resolver(table_keys: &[String], resolver: impl Fn(&str) -> Option<TableDefinition>) -> Self {
        let tables = table_keys.iter().filter_map(|key| resolver(key).map(|def| (key.clone(), def))).collect();
        TableDefinitions { tables }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFixtureStrategy {
    #[default]
    Error,
    Warn,
    Passthrough,
}

/// Gets the `sqlfixture_helpers::Config` builder methods via its blanket impl.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZtdOptions {
    pub missing_fixture_strategy: MissingFixtureStrategy,
    pub table_definitions: Option<TableDefinitions>,
}

//! C7: the driver interception contract. Sits in front of a real SQL
//! executor, parsing every statement that passes through and substituting a
//! ZTD-rewritten form when the statement touches a fixture-backed table.

use sqlfixture_core::ast::{LiteralValue, Statement};
use sqlfixture_core::errors::SqlFixtureError;

use crate::parser::parse_statement;
use crate::printer::{format, Style};
use crate::rewrite::{rewrite_for_fixtures, FixtureSet, MissingFixtureStrategy, ZtdOptions};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryOutcome {
    pub rows_affected: u64,
    pub rows: Vec<Vec<LiteralValue>>,
}

/// The downstream thing that actually talks to a database. Boxed dyn error
/// since the proxy is generic over drivers whose own error types vary.
pub trait FixtureDriver {
    fn execute(&self, sql: &str) -> Result<QueryOutcome, Box<dyn std::error::Error + Send + Sync>>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Rewrite(#[from] SqlFixtureError),
    #[error("downstream driver error: {0}")]
    Downstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterceptedStatement {
    /// The statement was rewritten against fixture data.
    Rewritten { statement: Statement, original: Statement },
    /// Sent through unchanged — either it named no fixture-backed table, or
    /// [`MissingFixtureStrategy::Passthrough`] is in effect.
    Passthrough(Statement),
}

impl InterceptedStatement {
    pub fn statement(&self) -> &Statement {
        match self {
            InterceptedStatement::Rewritten { statement, .. } => statement,
            InterceptedStatement::Passthrough(statement) => statement,
        }
    }
}

pub struct InterceptingProxy<D: FixtureDriver> {
    inner: D,
    fixtures: FixtureSet,
    options: ZtdOptions,
    style: Style,
}

impl<D: FixtureDriver> InterceptingProxy<D> {
    pub fn new(inner: D, fixtures: FixtureSet, options: ZtdOptions) -> Self {
        InterceptingProxy { inner, fixtures, options, style: Style::default() }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[tracing::instrument(level = "debug", skip(self, sql))]
    pub fn intercept(&self, sql: &str) -> Result<InterceptedStatement, ProxyError> {
        let stmt = parse_statement(sql)?;
        match rewrite_for_fixtures(&stmt, &self.fixtures, &self.options, None) {
            Ok(rewritten) => Ok(InterceptedStatement::Rewritten { statement: rewritten, original: stmt }),
            Err(SqlFixtureError::FixtureCoverage(_)) if self.options.missing_fixture_strategy == MissingFixtureStrategy::Passthrough => {
                Ok(InterceptedStatement::Passthrough(stmt))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn execute(&self, sql: &str) -> Result<QueryOutcome, ProxyError> {
        let intercepted = self.intercept(sql)?;
        let rendered = format(intercepted.statement(), &self.style);
        self.inner.execute(&rendered.text).map_err(ProxyError::Downstream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlfixture_core::ast::LiteralValue;
    use sqlfixture_helpers::IndexMap;

    use crate::rewrite::Fixture;

    struct RecordingDriver {
        last_sql: std::cell::RefCell<Option<String>>,
    }

    impl FixtureDriver for RecordingDriver {
        fn execute(&self, sql: &str) -> Result<QueryOutcome, Box<dyn std::error::Error + Send + Sync>> {
            *self.last_sql.borrow_mut() = Some(sql.to_string());
            Ok(QueryOutcome { rows_affected: 0, rows: vec![] })
        }
    }

    #[test]
    fn intercept_rewrites_a_select_against_its_fixture() {
        let mut fixtures: FixtureSet = IndexMap::default();
        fixtures.insert(
            "users".to_string(),
            Fixture::new(vec![("id".to_string(), "int".to_string())]).with_rows(vec![vec![LiteralValue::Int(1)]]),
        );
        let proxy = InterceptingProxy::new(RecordingDriver { last_sql: std::cell::RefCell::new(None) }, fixtures, ZtdOptions::default());
        let intercepted = proxy.intercept("SELECT id FROM users").unwrap();
        assert!(matches!(intercepted, InterceptedStatement::Rewritten { .. }));
    }

    #[test]
    fn passthrough_strategy_lets_an_uncovered_table_through() {
        let fixtures: FixtureSet = IndexMap::default();
        let options = ZtdOptions { missing_fixture_strategy: MissingFixtureStrategy::Passthrough, ..Default::default() };
        let proxy = InterceptingProxy::new(RecordingDriver { last_sql: std::cell::RefCell::new(None) }, fixtures, options);
        let intercepted = proxy.intercept("SELECT id FROM users").unwrap();
        assert!(matches!(intercepted, InterceptedStatement::Passthrough(_)));
    }
}

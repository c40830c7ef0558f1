//! C3: recursive-descent parser with Pratt-style expression precedence
//! climbing over the lexeme stream produced by `sqlfixture_core::lexer`.

use sqlfixture_core::ast::*;
use sqlfixture_core::errors::SyntaxError;
use sqlfixture_core::keywords::join_phrases;
use sqlfixture_core::lexer::{self, Lexeme, LexemeKind};
use sqlfixture_core::position::{PositionIndex, PositionMarker};

use crate::Error;

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Bounds recovery attempts in `parse_to_cursor`.
    pub max_recovery_attempts: usize,
}

impl ParseOptions {
    pub fn with_max_recovery_attempts(mut self, n: usize) -> Self {
        self.max_recovery_attempts = n;
        self
    }
}

const DEFAULT_MAX_RECOVERY_ATTEMPTS: usize = 8;

/// Parses exactly one statement; fails if trailing non-comment content
/// remains after it.
pub fn parse_statement(text: &str) -> Result<Statement, Error> {
    let (lexemes, _index) = lexer::tokenize(text)?;
    let mut parser = Parser::new(lexemes);
    let stmt = parser.parse_statement()?;
    parser.skip_semicolons();
    if !parser.is_eof() {
        return Err(parser.error_here(vec!["end of input".into()]).into());
    }
    Ok(stmt)
}

/// Splits `text` on semicolons (respecting strings, comments and nested
/// parentheses) and parses each resulting statement.
pub fn parse_statements(text: &str) -> Result<Vec<Statement>, Error> {
    let mut out = Vec::new();
    for chunk in split_statements(text) {
        let trimmed = chunk.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.push(parse_statement(trimmed)?);
    }
    Ok(out)
}

/// Splits `text` into statement-sized chunks on top-level `;` punctuation,
/// tracking paren nesting depth and skipping string/identifier literals and
/// comments along the way — those are handled by the lexer itself so this
/// walks raw characters only to find split points.
fn split_statements(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0usize;
    let bytes = text.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] as char {
            '\'' => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] as char == '\'' {
                        if i + 1 < bytes.len() && bytes[i + 1] as char == '\'' {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                continue;
            }
            '"' | '`' => {
                let close = bytes[i] as char;
                i += 1;
                while i < bytes.len() {
                    if bytes[i] as char == close {
                        if i + 1 < bytes.len() && bytes[i + 1] as char == close {
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                continue;
            }
            '-' if i + 1 < bytes.len() && bytes[i + 1] as char == '-' => {
                while i < bytes.len() && bytes[i] as char != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if i + 1 < bytes.len() && bytes[i + 1] as char == '*' => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] as char == '*' && bytes[i + 1] as char == '/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                continue;
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            ';' if depth <= 0 => {
                out.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[derive(Debug, Clone)]
pub struct ParseToCursorResult {
    pub statement_or_partial: Option<Statement>,
    pub token_before_cursor: Option<Lexeme>,
    pub recovery_attempts: usize,
    pub stopped_at_cursor: bool,
}

/// Best-effort parse that stops at `cursor` and tolerates a bounded set of
/// insertable-token recoveries (closing parens, a missing identifier after
/// `FROM`/`JOIN`/`SELECT`/`WHERE`), for editor-style callers.
pub fn parse_to_cursor(text: &str, cursor: usize, options: &ParseOptions) -> Result<ParseToCursorResult, Error> {
    let max_attempts = if options.max_recovery_attempts == 0 {
        DEFAULT_MAX_RECOVERY_ATTEMPTS
    } else {
        options.max_recovery_attempts
    };
    let (lexemes, index) = lexer::tokenize(text)?;
    let token_before_cursor = lexer::find_lexeme_at_offset(&lexemes, cursor.saturating_sub(1)).cloned();

    let truncated: Vec<Lexeme> = lexemes.iter().filter(|l| l.position.start_byte < cursor).cloned().collect();
    let mut parser = Parser::new(truncated);
    parser.recovery_budget = max_attempts;

    let result = parser.parse_statement();
    let _ = &index;
    match result {
        Ok(stmt) => Ok(ParseToCursorResult {
            statement_or_partial: Some(stmt),
            token_before_cursor,
            recovery_attempts: parser.recovery_attempts,
            stopped_at_cursor: true,
        }),
        Err(_) => Ok(ParseToCursorResult {
            statement_or_partial: None,
            token_before_cursor,
            recovery_attempts: parser.recovery_attempts,
            stopped_at_cursor: true,
        }),
    }
}

/// The `scopeAt` IDE hook: table alias/CTE scope visible at `cursor`, from a
/// best-effort reparse of `text` truncated to that offset. Precision is
/// bounded by `parse_to_cursor`'s recovery — a cursor inside an unterminated
/// nested subquery sees the outermost select that parsed successfully up to
/// the cursor, since `SimpleSelect::span` records only a node's start byte,
/// not its extent, so there's no reliable way to prefer a not-yet-closed
/// nested select over its parent.
pub fn scope_at(text: &str, cursor: usize, options: &ParseOptions) -> Result<sqlfixture_core::analyzer::Scope, crate::Error> {
    let result = parse_to_cursor(text, cursor, options)?;
    let scope = match result.statement_or_partial {
        Some(Statement::Select(SelectStatement::Simple(select))) => sqlfixture_core::analyzer::ScopeResolver::scope_of(&select),
        _ => sqlfixture_core::analyzer::Scope::default(),
    };
    Ok(scope)
}

struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
    recovery_budget: usize,
    recovery_attempts: usize,
}

impl Parser {
    fn new(lexemes: Vec<Lexeme>) -> Self {
        Parser { lexemes, pos: 0, recovery_budget: DEFAULT_MAX_RECOVERY_ATTEMPTS, recovery_attempts: 0 }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.lexemes.len()
    }

    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn peek_n(&self, n: usize) -> Option<&Lexeme> {
        self.lexemes.get(self.pos + n)
    }

    fn bump(&mut self) -> Option<Lexeme> {
        let lex = self.lexemes.get(self.pos).cloned();
        if lex.is_some() {
            self.pos += 1;
        }
        lex
    }

    fn skip_semicolons(&mut self) {
        while self.at_punct(";") {
            self.pos += 1;
        }
    }

    fn at_keyword(&self, kw: &str) -> bool {
        self.peek().is_some_and(|l| l.kind == LexemeKind::Command && l.value.eq_ignore_ascii_case(kw))
    }

    fn at_keyword_n(&self, n: usize, kw: &str) -> bool {
        self.peek_n(n).is_some_and(|l| l.kind == LexemeKind::Command && l.value.eq_ignore_ascii_case(kw))
    }

    fn at_punct(&self, p: &str) -> bool {
        self.peek().is_some_and(|l| l.kind == LexemeKind::Punctuation && l.value == p)
    }

    fn at_operator(&self, op: &str) -> bool {
        self.peek().is_some_and(|l| l.kind == LexemeKind::Operator && l.value == op)
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.at_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.at_punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_operator(&mut self, op: &str) -> bool {
        if self.at_operator(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<(), SyntaxError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.error_here(vec![kw.to_string()]))
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<(), SyntaxError> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.error_here(vec![p.to_string()]))
        }
    }

    fn error_here(&self, expected: Vec<String>) -> SyntaxError {
        let (found, position) = match self.peek() {
            Some(l) => (l.value.clone(), l.position),
            None => ("<eof>".to_string(), self.lexemes.last().map(|l| l.position).unwrap_or_else(|| PositionMarker::new(0, 0, 1, 1))),
        };
        SyntaxError { message: format!("expected one of {expected:?}, found {found}"), position, expected, found, recovery_hint: None }
    }

    /// Consumes an insertable-token recovery if the budget allows, returning
    /// whether one was applied.
    fn try_recover_missing_identifier(&mut self) -> bool {
        if self.recovery_attempts >= self.recovery_budget {
            return false;
        }
        self.recovery_attempts += 1;
        true
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        self.skip_semicolons();
        if self.at_keyword("with") {
            return self.parse_with_prefixed_statement();
        }
        if self.at_keyword("select") || self.at_punct("(") {
            return Ok(Statement::Select(self.parse_select_statement()?));
        }
        if self.at_keyword("values") {
            return Ok(Statement::Values(self.parse_values_statement()?));
        }
        if self.at_keyword("insert") {
            return Ok(Statement::Insert(self.parse_insert(None)?));
        }
        if self.at_keyword("update") {
            return Ok(Statement::Update(self.parse_update(None)?));
        }
        if self.at_keyword("delete") {
            return Ok(Statement::Delete(self.parse_delete(None)?));
        }
        if self.at_keyword("merge") {
            return Ok(Statement::Merge(self.parse_merge()?));
        }
        if self.at_keyword("create") && self.at_keyword_n(1, "table") {
            return Ok(Statement::CreateTable(self.parse_create_table()?));
        }
        if self.at_keyword("create")
            && (self.at_keyword_n(1, "index") || (self.at_keyword_n(1, "unique") && self.at_keyword_n(2, "index")))
        {
            return Ok(Statement::CreateIndex(self.parse_create_index()?));
        }
        if self.at_keyword("alter") && self.at_keyword_n(1, "table") {
            return Ok(Statement::AlterTable(self.parse_alter_table()?));
        }
        if self.at_keyword("drop") && self.at_keyword_n(1, "table") {
            return Ok(Statement::DropTable(self.parse_drop_table()?));
        }
        if self.at_keyword("drop") && self.at_keyword_n(1, "index") {
            return Ok(Statement::DropIndex(self.parse_drop_index()?));
        }
        Err(self.error_here(vec!["statement".into()]))
    }

    fn parse_with_prefixed_statement(&mut self) -> Result<Statement, SyntaxError> {
        let with = self.parse_with_clause()?;
        if self.at_keyword("select") || self.at_punct("(") {
            let mut select = self.parse_select_statement()?;
            if let SelectStatement::Simple(simple) = &mut select {
                simple.with_clause = Some(with);
            }
            return Ok(Statement::Select(select));
        }
        if self.at_keyword("insert") {
            return Ok(Statement::Insert(self.parse_insert(Some(with))?));
        }
        if self.at_keyword("update") {
            return Ok(Statement::Update(self.parse_update(Some(with))?));
        }
        if self.at_keyword("delete") {
            return Ok(Statement::Delete(self.parse_delete(Some(with))?));
        }
        Err(self.error_here(vec!["select".into(), "insert".into(), "update".into(), "delete".into()]))
    }

    fn parse_with_clause(&mut self) -> Result<WithClause, SyntaxError> {
        self.expect_keyword("with")?;
        let recursive = self.eat_keyword("recursive");
        let mut ctes = Vec::new();
        loop {
            let leading = self.take_leading_comments();
            let name = self.parse_ident()?;
            let column_list = if self.at_punct("(") {
                self.pos += 1;
                let mut cols = vec![self.parse_ident()?];
                while self.eat_punct(",") {
                    cols.push(self.parse_ident()?);
                }
                self.expect_punct(")")?;
                Some(cols)
            } else {
                None
            };
            self.expect_keyword("as")?;
            let materialized_hint = if self.eat_keyword("materialized") {
                Some(MaterializedHint::Materialized)
            } else if self.at_keyword("not") && self.at_keyword_n(1, "materialized") {
                self.pos += 2;
                Some(MaterializedHint::NotMaterialized)
            } else {
                None
            };
            self.expect_punct("(")?;
            let body = self.parse_statement()?;
            self.expect_punct(")")?;
            ctes.push(CteDefinition {
                name,
                column_list,
                recursive,
                materialized_hint,
                body: Box::new(body),
                comments: Comments { leading, trailing: Vec::new() }.into(),
            });
            if !self.eat_punct(",") {
                break;
            }
        }
        Ok(WithClause { ctes })
    }

    fn take_leading_comments(&self) -> Vec<String> {
        self.peek().map(|l| l.leading_comments.clone()).unwrap_or_default()
    }

    fn parse_select_statement(&mut self) -> Result<SelectStatement, SyntaxError> {
        let mut left = SelectStatement::Simple(Box::new(self.parse_simple_select_or_paren()?));
        loop {
            let op = if self.at_keyword("union") {
                SetOperator::Union
            } else if self.at_keyword("intersect") {
                SetOperator::Intersect
            } else if self.at_keyword("except") {
                SetOperator::Except
            } else {
                break;
            };
            self.pos += 1;
            let all = self.eat_keyword("all");
            let right = self.parse_simple_select_or_paren()?;
            left = SelectStatement::Binary {
                op,
                left: Box::new(Statement::Select(left)),
                right: Box::new(Statement::Select(SelectStatement::Simple(Box::new(right)))),
                all,
            };
        }
        Ok(left)
    }

    fn parse_simple_select_or_paren(&mut self) -> Result<SimpleSelect, SyntaxError> {
        if self.eat_punct("(") {
            let inner = self.parse_select_statement()?;
            self.expect_punct(")")?;
            return match inner {
                SelectStatement::Simple(s) => Ok(*s),
                other => {
                    // A parenthesized set-op nested inside another set-op: fold it
                    // into a Simple carrier via a synthetic derived subquery isn't
                    // representable without FROM, so flatten by re-wrapping.
                    Ok(SimpleSelect {
                        from_clause: Some(FromClause {
                            source: TableFactor::Derived {
                                subquery: Box::new(Statement::Select(other)),
                                alias: None,
                                lateral: false,
                            },
                            joins: vec![],
                        }),
                        select_clause: SelectClause {
                            items: vec![SelectItem { expr: Expr::Wildcard, alias: None, comments: Default::default() }],
                            ..Default::default()
                        },
                        ..Default::default()
                    })
                }
            };
        }
        self.parse_simple_select()
    }

    fn parse_simple_select(&mut self) -> Result<SimpleSelect, SyntaxError> {
        let start_pos = self.current_position();
        let with_clause = if self.at_keyword("with") { Some(self.parse_with_clause()?) } else { None };
        self.expect_keyword("select")?;
        let distinct = self.eat_keyword("distinct");
        let distinct_on = if distinct && self.at_keyword("on") {
            self.pos += 1;
            self.expect_punct("(")?;
            let mut exprs = vec![self.parse_expr()?];
            while self.eat_punct(",") {
                exprs.push(self.parse_expr()?);
            }
            self.expect_punct(")")?;
            Some(exprs)
        } else {
            None
        };
        if !distinct {
            let _ = self.eat_keyword("all");
        }

        let mut items = Vec::new();
        loop {
            items.push(self.parse_select_item()?);
            if !self.eat_punct(",") {
                break;
            }
        }

        let from_clause = if self.at_keyword("from") {
            self.pos += 1;
            Some(self.parse_from_clause()?)
        } else {
            None
        };
        let where_clause = if self.eat_keyword("where") { Some(self.parse_expr()?) } else { None };
        let group_by = if self.at_keyword("group") && self.at_keyword_n(1, "by") {
            self.pos += 2;
            let mut exprs = vec![self.parse_expr()?];
            while self.eat_punct(",") {
                exprs.push(self.parse_expr()?);
            }
            GroupBy { exprs }
        } else {
            GroupBy::default()
        };
        let having = if self.eat_keyword("having") { Some(self.parse_expr()?) } else { None };
        let order_by = if self.at_keyword("order") && self.at_keyword_n(1, "by") {
            self.pos += 2;
            self.parse_order_by()?
        } else {
            OrderBy::default()
        };
        let limit = if self.eat_keyword("limit") { Some(self.parse_expr()?) } else { None };
        let offset = if self.eat_keyword("offset") { Some(self.parse_expr()?) } else { None };
        let fetch = if self.at_keyword("fetch") {
            self.pos += 2; // FETCH (FIRST|NEXT)
            let e = self.parse_expr()?;
            let _ = self.eat_keyword("rows") || self.eat_keyword("row");
            let _ = self.eat_keyword("only");
            Some(e)
        } else {
            None
        };

        Ok(SimpleSelect {
            span: start_pos.into(),
            with_clause,
            select_clause: SelectClause { items, distinct, distinct_on },
            from_clause,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
            fetch,
        })
    }

    fn current_position(&self) -> PositionMarker {
        self.peek().map(|l| l.position).unwrap_or_else(|| PositionMarker::new(0, 0, 1, 1))
    }

    fn parse_select_item(&mut self) -> Result<SelectItem, SyntaxError> {
        let leading = self.take_leading_comments();
        if self.at_operator("*") {
            self.pos += 1;
            return Ok(SelectItem { expr: Expr::Wildcard, alias: None, comments: Comments { leading, trailing: vec![] }.into() });
        }
        let expr = self.parse_expr()?;
        let alias = if self.eat_keyword("as") {
            Some(self.parse_ident()?)
        } else if self.at_ident_like_token() {
            Some(self.parse_ident()?)
        } else {
            None
        };
        let trailing = self.peek().map(|l| l.leading_comments.clone()).unwrap_or_default();
        Ok(SelectItem { expr, alias, comments: Comments { leading, trailing }.into() })
    }

    fn at_ident_like_token(&self) -> bool {
        self.peek().is_some_and(|l| l.kind == LexemeKind::Identifier)
    }

    fn parse_from_clause(&mut self) -> Result<FromClause, SyntaxError> {
        let source = self.parse_table_factor()?;
        let mut joins = Vec::new();
        while let Some(kind) = self.match_join_kind() {
            let right = self.parse_table_factor()?;
            let (predicate, using) = if kind.is_natural() || matches!(kind, JoinKind::Cross) {
                (None, None)
            } else if self.eat_keyword("on") {
                (Some(self.parse_expr()?), None)
            } else if self.eat_keyword("using") {
                self.expect_punct("(")?;
                let mut cols = vec![self.parse_ident()?];
                while self.eat_punct(",") {
                    cols.push(self.parse_ident()?);
                }
                self.expect_punct(")")?;
                (None, Some(cols))
            } else {
                (None, None)
            };
            joins.push(Join { kind, right, predicate, using });
        }
        Ok(FromClause { source, joins })
    }

    /// Consumes the maximal keyword sequence that names a join, validated
    /// against the JOIN phrase dictionary (longest match first).
    fn match_join_kind(&mut self) -> Option<JoinKind> {
        for phrase in join_phrases() {
            if phrase.iter().enumerate().all(|(i, word)| self.at_keyword_n(i, word)) {
                self.pos += phrase.len();
                return Some(phrase_to_join_kind(phrase));
            }
        }
        None
    }

    fn parse_table_factor(&mut self) -> Result<TableFactor, SyntaxError> {
        let lateral = self.eat_keyword("lateral");
        if self.eat_punct("(") {
            let stmt = self.parse_statement()?;
            self.expect_punct(")")?;
            let alias = self.parse_optional_alias();
            return Ok(TableFactor::Derived { subquery: Box::new(stmt), alias, lateral });
        }
        let name = self.parse_object_name()?;
        let alias = self.parse_optional_alias();
        Ok(TableFactor::Table { name, alias })
    }

    fn parse_optional_alias(&mut self) -> Option<Ident> {
        if self.eat_keyword("as") {
            return self.parse_ident().ok();
        }
        if self.at_ident_like_token() {
            return self.parse_ident().ok();
        }
        None
    }

    fn parse_order_by(&mut self) -> Result<OrderBy, SyntaxError> {
        let mut items = vec![self.parse_order_by_item()?];
        while self.eat_punct(",") {
            items.push(self.parse_order_by_item()?);
        }
        Ok(OrderBy { items })
    }

    fn parse_order_by_item(&mut self) -> Result<OrderByItem, SyntaxError> {
        let expr = self.parse_expr()?;
        let direction = if self.eat_keyword("asc") {
            Some(Direction::Asc)
        } else if self.eat_keyword("desc") {
            Some(Direction::Desc)
        } else {
            None
        };
        let nulls = if self.at_keyword("nulls") {
            self.pos += 1;
            if self.eat_keyword("first") {
                Some(NullsOrder::First)
            } else {
                self.eat_keyword("last");
                Some(NullsOrder::Last)
            }
        } else {
            None
        };
        Ok(OrderByItem { expr, direction, nulls })
    }

    fn parse_values_statement(&mut self) -> Result<ValuesStatement, SyntaxError> {
        self.expect_keyword("values")?;
        let mut rows = vec![self.parse_values_row()?];
        while self.eat_punct(",") {
            rows.push(self.parse_values_row()?);
        }
        Ok(ValuesStatement { rows })
    }

    fn parse_values_row(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.expect_punct("(")?;
        let mut exprs = vec![self.parse_expr()?];
        while self.eat_punct(",") {
            exprs.push(self.parse_expr()?);
        }
        self.expect_punct(")")?;
        Ok(exprs)
    }

    // ---- CRUD ----

    fn parse_insert(&mut self, with_clause: Option<WithClause>) -> Result<InsertStatement, SyntaxError> {
        self.expect_keyword("insert")?;
        self.expect_keyword("into")?;
        let table = self.parse_object_name()?;
        let columns = if self.at_punct("(") {
            self.pos += 1;
            let mut cols = vec![self.parse_ident()?];
            while self.eat_punct(",") {
                cols.push(self.parse_ident()?);
            }
            self.expect_punct(")")?;
            Some(cols)
        } else {
            None
        };
        let source = if self.at_keyword("values") {
            let values = self.parse_values_statement()?;
            InsertSource::Values(values.rows)
        } else {
            InsertSource::Select(Box::new(self.parse_statement()?))
        };
        let returning = self.parse_optional_returning()?;
        Ok(InsertStatement { with_clause, table, columns, source, returning })
    }

    fn parse_optional_returning(&mut self) -> Result<Option<Vec<SelectItem>>, SyntaxError> {
        if !self.eat_keyword("returning") {
            return Ok(None);
        }
        let mut items = vec![self.parse_select_item()?];
        while self.eat_punct(",") {
            items.push(self.parse_select_item()?);
        }
        Ok(Some(items))
    }

    fn parse_update(&mut self, with_clause: Option<WithClause>) -> Result<UpdateStatement, SyntaxError> {
        self.expect_keyword("update")?;
        let table = self.parse_object_name()?;
        let alias = self.parse_optional_alias();
        self.expect_keyword("set")?;
        let mut assignments = vec![self.parse_assignment()?];
        while self.eat_punct(",") {
            assignments.push(self.parse_assignment()?);
        }
        let from = if self.eat_keyword("from") { Some(self.parse_from_clause()?) } else { None };
        let where_clause = if self.eat_keyword("where") { Some(self.parse_expr()?) } else { None };
        let returning = self.parse_optional_returning()?;
        Ok(UpdateStatement { with_clause, table, alias, assignments, from, where_clause, returning })
    }

    fn parse_assignment(&mut self) -> Result<Assignment, SyntaxError> {
        let column = self.parse_ident()?;
        self.expect_operator_eq()?;
        let value = self.parse_expr()?;
        Ok(Assignment { column, value })
    }

    fn expect_operator_eq(&mut self) -> Result<(), SyntaxError> {
        if self.eat_operator("=") {
            Ok(())
        } else {
            Err(self.error_here(vec!["=".into()]))
        }
    }

    fn parse_delete(&mut self, with_clause: Option<WithClause>) -> Result<DeleteStatement, SyntaxError> {
        self.expect_keyword("delete")?;
        self.expect_keyword("from")?;
        let table = self.parse_object_name()?;
        let alias = self.parse_optional_alias();
        let using = if self.eat_keyword("using") { Some(self.parse_from_clause()?) } else { None };
        let where_clause = if self.eat_keyword("where") { Some(self.parse_expr()?) } else { None };
        let returning = self.parse_optional_returning()?;
        Ok(DeleteStatement { with_clause, table, alias, using, where_clause, returning })
    }

    fn parse_merge(&mut self) -> Result<MergeStatement, SyntaxError> {
        self.expect_keyword("merge")?;
        self.expect_keyword("into")?;
        let target = self.parse_object_name()?;
        let target_alias = self.parse_optional_alias();
        self.expect_keyword("using")?;
        let source = self.parse_table_factor()?;
        self.expect_keyword("on")?;
        let predicate = self.parse_expr()?;
        let mut clauses = Vec::new();
        while self.at_keyword("when") {
            self.pos += 1;
            let matched = if self.eat_keyword("matched") {
                true
            } else {
                self.expect_keyword("not")?;
                self.expect_keyword("matched")?;
                false
            };
            let by_source = self.at_keyword("by") && self.at_keyword_n(1, "source");
            if by_source {
                self.pos += 2;
            }
            let condition = if self.eat_keyword("and") { Some(self.parse_expr()?) } else { None };
            self.expect_keyword("then")?;
            let action = if self.eat_keyword("update") {
                self.expect_keyword("set")?;
                let mut assigns = vec![self.parse_assignment()?];
                while self.eat_punct(",") {
                    assigns.push(self.parse_assignment()?);
                }
                MergeAction::Update(assigns)
            } else if self.eat_keyword("delete") {
                MergeAction::Delete
            } else {
                self.expect_keyword("insert")?;
                let columns = if self.at_punct("(") {
                    self.pos += 1;
                    let mut cols = vec![self.parse_ident()?];
                    while self.eat_punct(",") {
                        cols.push(self.parse_ident()?);
                    }
                    self.expect_punct(")")?;
                    Some(cols)
                } else {
                    None
                };
                self.expect_keyword("values")?;
                self.expect_punct("(")?;
                let mut values = vec![self.parse_expr()?];
                while self.eat_punct(",") {
                    values.push(self.parse_expr()?);
                }
                self.expect_punct(")")?;
                MergeAction::Insert { columns, values }
            };
            clauses.push(MergeClause { matched, by_source, condition, action });
        }
        Ok(MergeStatement { target, target_alias, source, predicate, clauses })
    }

    // ---- DDL ----

    fn parse_create_table(&mut self) -> Result<CreateTableStatement, SyntaxError> {
        self.pos += 2; // CREATE TABLE
        let if_not_exists = self.at_keyword("if") && self.at_keyword_n(1, "not") && self.at_keyword_n(2, "exists");
        if if_not_exists {
            self.pos += 3;
        }
        let name = self.parse_object_name()?;
        self.expect_punct("(")?;
        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if self.at_keyword("primary") || self.at_keyword("unique") || self.at_keyword("foreign") || self.at_keyword("constraint") {
                constraints.push(self.parse_table_constraint()?);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(CreateTableStatement { name, if_not_exists, columns, constraints })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef, SyntaxError> {
        let name = self.parse_ident()?;
        let data_type = self.parse_data_type()?;
        let mut not_null = false;
        let mut primary_key = false;
        let mut default = None;
        loop {
            if self.at_keyword("not") && self.at_keyword_n(1, "null") {
                self.pos += 2;
                not_null = true;
            } else if self.at_keyword("primary") && self.at_keyword_n(1, "key") {
                self.pos += 2;
                primary_key = true;
                not_null = true;
            } else if self.eat_keyword("default") {
                default = Some(self.parse_expr()?);
            } else {
                break;
            }
        }
        Ok(ColumnDef { name, data_type, not_null, default, primary_key })
    }

    fn parse_table_constraint(&mut self) -> Result<TableConstraint, SyntaxError> {
        let name = if self.eat_keyword("constraint") { Some(self.parse_ident()?) } else { None };
        let kind = if self.at_keyword("primary") {
            self.pos += 2;
            ConstraintKind::PrimaryKey(TableConstraint::parse_paren_ident_list(self)?)
        } else if self.at_keyword("unique") {
            self.pos += 1;
            ConstraintKind::Unique(TableConstraint::parse_paren_ident_list(self)?)
        } else {
            self.pos += 2; // FOREIGN KEY
            let columns = TableConstraint::parse_paren_ident_list(self)?;
            self.expect_keyword("references")?;
            let ref_table = self.parse_object_name()?;
            let ref_columns = TableConstraint::parse_paren_ident_list(self)?;
            ConstraintKind::ForeignKey { columns, ref_table, ref_columns }
        };
        Ok(TableConstraint { name, kind })
    }

    fn parse_data_type(&mut self) -> Result<DataType, SyntaxError> {
        let mut text = self.parse_ident()?.value;
        if self.eat_punct("(") {
            text.push('(');
            loop {
                let tok = self.bump().ok_or_else(|| self.error_here(vec![")".into()]))?;
                text.push_str(&tok.value);
                if tok.kind == LexemeKind::Punctuation && tok.value == ")" {
                    break;
                }
                if self.at_punct(",") {
                    text.push(',');
                    self.pos += 1;
                }
            }
        }
        Ok(DataType(text))
    }

    fn parse_alter_table(&mut self) -> Result<AlterTableStatement, SyntaxError> {
        self.pos += 2; // ALTER TABLE
        let name = self.parse_object_name()?;
        let action = if self.at_keyword("add") && self.at_keyword_n(1, "column") {
            self.pos += 2;
            AlterAction::AddColumn(self.parse_column_def()?)
        } else if self.at_keyword("add") {
            self.pos += 1;
            AlterAction::AddConstraint(self.parse_table_constraint()?)
        } else if self.at_keyword("drop") && self.at_keyword_n(1, "column") {
            self.pos += 2;
            AlterAction::DropColumn(self.parse_ident()?)
        } else {
            self.expect_keyword("rename")?;
            self.expect_keyword("to")?;
            AlterAction::RenameTable(self.parse_object_name()?)
        };
        Ok(AlterTableStatement { name, action })
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStatement, SyntaxError> {
        self.pos += 2; // DROP TABLE
        let if_exists = self.at_keyword("if") && self.at_keyword_n(1, "exists");
        if if_exists {
            self.pos += 2;
        }
        let mut names = vec![self.parse_object_name()?];
        while self.eat_punct(",") {
            names.push(self.parse_object_name()?);
        }
        Ok(DropTableStatement { names, if_exists })
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexStatement, SyntaxError> {
        self.pos += 1; // CREATE
        let unique = self.eat_keyword("unique");
        self.expect_keyword("index")?;
        let name = self.parse_ident()?;
        self.expect_keyword("on")?;
        let table = self.parse_object_name()?;
        self.expect_punct("(")?;
        let mut columns = vec![self.parse_ident()?];
        while self.eat_punct(",") {
            columns.push(self.parse_ident()?);
        }
        self.expect_punct(")")?;
        Ok(CreateIndexStatement { name, table, columns, unique })
    }

    fn parse_drop_index(&mut self) -> Result<DropIndexStatement, SyntaxError> {
        self.pos += 2; // DROP INDEX
        Ok(DropIndexStatement { name: self.parse_ident()? })
    }

    // ---- identifiers ----

    fn parse_ident(&mut self) -> Result<Ident, SyntaxError> {
        let lex = self.bump().ok_or_else(|| self.error_here(vec!["identifier".into()]))?;
        match lex.kind {
            LexemeKind::Identifier => Ok(parse_ident_lexeme(&lex.value)),
            LexemeKind::Command => Ok(Ident::new(lex.value)),
            _ => Err(SyntaxError {
                message: format!("expected identifier, found {}", lex.value),
                position: lex.position,
                expected: vec!["identifier".into()],
                found: lex.value,
                recovery_hint: None,
            }),
        }
    }

    fn parse_object_name(&mut self) -> Result<ObjectName, SyntaxError> {
        let mut parts = vec![self.parse_ident()?];
        while self.at_punct(".") {
            self.pos += 1;
            parts.push(self.parse_ident()?);
        }
        Ok(ObjectName(parts))
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = Expr::BinaryOp { left: Box::new(left), op: BinaryOperator::Or, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_not()?;
        while self.eat_keyword("and") {
            let right = self.parse_not()?;
            left = Expr::BinaryOp { left: Box::new(left), op: BinaryOperator::And, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_keyword("not") {
            let inner = self.parse_not()?;
            return Ok(Expr::UnaryOp { op: UnaryOperator::Not, expr: Box::new(inner) });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.parse_additive()?;
        self.parse_comparison_tail(expr)
    }

    fn parse_comparison_tail(&mut self, expr: Expr) -> Result<Expr, SyntaxError> {
        if self.eat_keyword("between") {
            let negated = false;
            let low = self.parse_additive()?;
            self.expect_keyword("and")?;
            let high = self.parse_additive()?;
            return Ok(Expr::Between { expr: Box::new(expr), negated, low: Box::new(low), high: Box::new(high) });
        }
        if self.at_keyword("not") && self.at_keyword_n(1, "between") {
            self.pos += 2;
            let low = self.parse_additive()?;
            self.expect_keyword("and")?;
            let high = self.parse_additive()?;
            return Ok(Expr::Between { expr: Box::new(expr), negated: true, low: Box::new(low), high: Box::new(high) });
        }
        if self.eat_keyword("in") {
            return self.parse_in_tail(expr, false);
        }
        if self.at_keyword("not") && self.at_keyword_n(1, "in") {
            self.pos += 2;
            return self.parse_in_tail(expr, true);
        }
        if let Some(op) = self.match_comparison_operator() {
            let right = self.parse_additive()?;
            return Ok(Expr::BinaryOp { left: Box::new(expr), op, right: Box::new(right) });
        }
        if self.at_keyword("is") {
            self.pos += 1;
            let negated = self.eat_keyword("not");
            self.expect_keyword("null")?;
            let op = if negated { BinaryOperator::IsNot } else { BinaryOperator::Is };
            return Ok(Expr::BinaryOp { left: Box::new(expr), op, right: Box::new(Expr::Literal(LiteralValue::Null)) });
        }
        Ok(expr)
    }

    fn parse_in_tail(&mut self, expr: Expr, negated: bool) -> Result<Expr, SyntaxError> {
        self.expect_punct("(")?;
        if self.at_keyword("select") || self.at_keyword("with") {
            let stmt = self.parse_statement()?;
            self.expect_punct(")")?;
            return Ok(Expr::InSubquery { expr: Box::new(expr), negated, subquery: Box::new(stmt) });
        }
        let mut list = vec![self.parse_expr()?];
        while self.eat_punct(",") {
            list.push(self.parse_expr()?);
        }
        self.expect_punct(")")?;
        Ok(Expr::InList { expr: Box::new(expr), negated, list })
    }

    fn match_comparison_operator(&mut self) -> Option<BinaryOperator> {
        let op = if self.eat_operator("=") {
            BinaryOperator::Eq
        } else if self.eat_operator("<>") || self.eat_operator("!=") {
            BinaryOperator::NotEq
        } else if self.eat_operator("<=") {
            BinaryOperator::LtEq
        } else if self.eat_operator(">=") {
            BinaryOperator::GtEq
        } else if self.eat_operator("<") {
            BinaryOperator::Lt
        } else if self.eat_operator(">") {
            BinaryOperator::Gt
        } else if self.eat_keyword("ilike") {
            BinaryOperator::ILike
        } else if self.eat_keyword("like") {
            BinaryOperator::Like
        } else {
            return None;
        };
        Some(op)
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.eat_operator("+") {
                BinaryOperator::Plus
            } else if self.eat_operator("-") {
                BinaryOperator::Minus
            } else if self.eat_operator("||") {
                BinaryOperator::Concat
            } else {
                break;
            };
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_exponent()?;
        loop {
            let op = if self.eat_operator("*") {
                BinaryOperator::Mul
            } else if self.eat_operator("/") {
                BinaryOperator::Div
            } else if self.eat_operator("%") {
                BinaryOperator::Mod
            } else {
                break;
            };
            let right = self.parse_exponent()?;
            left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_exponent(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_unary()?;
        if self.eat_operator("^") {
            let right = self.parse_exponent()?;
            return Ok(Expr::BinaryOp { left: Box::new(left), op: BinaryOperator::Exp, right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_operator("-") {
            return Ok(Expr::UnaryOp { op: UnaryOperator::Minus, expr: Box::new(self.parse_unary()?) });
        }
        if self.eat_operator("+") {
            return Ok(Expr::UnaryOp { op: UnaryOperator::Plus, expr: Box::new(self.parse_unary()?) });
        }
        self.parse_cast()
    }

    fn parse_cast(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_member_access()?;
        while self.eat_operator("::") {
            let data_type = self.parse_data_type()?;
            expr = Expr::Cast { expr: Box::new(expr), data_type, style: CastStyle::Postgres };
        }
        Ok(expr)
    }

    fn parse_member_access(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_keyword("cast") {
            self.expect_punct("(")?;
            let expr = self.parse_expr()?;
            self.expect_keyword("as")?;
            let data_type = self.parse_data_type()?;
            self.expect_punct(")")?;
            return Ok(Expr::Cast { expr: Box::new(expr), data_type, style: CastStyle::Standard });
        }
        if self.eat_keyword("case") {
            return self.parse_case();
        }
        if self.eat_keyword("exists") {
            self.expect_punct("(")?;
            let stmt = self.parse_statement()?;
            self.expect_punct(")")?;
            return Ok(Expr::Exists { negated: false, subquery: Box::new(stmt) });
        }
        if self.at_keyword("not") && self.at_keyword_n(1, "exists") {
            self.pos += 2;
            self.expect_punct("(")?;
            let stmt = self.parse_statement()?;
            self.expect_punct(")")?;
            return Ok(Expr::Exists { negated: true, subquery: Box::new(stmt) });
        }
        if self.at_punct("(") {
            self.pos += 1;
            if self.at_keyword("select") || self.at_keyword("with") {
                let stmt = self.parse_statement()?;
                self.expect_punct(")")?;
                return Ok(Expr::Subquery(Box::new(stmt)));
            }
            let inner = self.parse_expr()?;
            self.expect_punct(")")?;
            return Ok(Expr::Nested(Box::new(inner)));
        }
        if self.eat_punct("[") {
            // permissive: some dialects bracket-quote identifiers handled by the
            // lexer already; an opening `[` here starts an ARRAY literal shape.
            let mut items = Vec::new();
            if !self.at_punct("]") {
                items.push(self.parse_expr()?);
                while self.eat_punct(",") {
                    items.push(self.parse_expr()?);
                }
            }
            self.expect_punct("]")?;
            return Ok(Expr::Array(items));
        }
        if self.eat_keyword("array") {
            self.expect_punct("[")?;
            let mut items = Vec::new();
            if !self.at_punct("]") {
                items.push(self.parse_expr()?);
                while self.eat_punct(",") {
                    items.push(self.parse_expr()?);
                }
            }
            self.expect_punct("]")?;
            return Ok(Expr::Array(items));
        }

        let lex = self.bump().ok_or_else(|| self.error_here(vec!["expression".into()]))?;
        match lex.kind {
            LexemeKind::Literal => Ok(Expr::Literal(parse_literal_lexeme(&lex.value))),
            LexemeKind::Parameter => Ok(Expr::Parameter(parse_parameter_lexeme(&lex.value))),
            LexemeKind::Command if lex.value == "null" => Ok(Expr::Literal(LiteralValue::Null)),
            LexemeKind::Command if lex.value == "true" => Ok(Expr::Literal(LiteralValue::Boolean(true))),
            LexemeKind::Command if lex.value == "false" => Ok(Expr::Literal(LiteralValue::Boolean(false))),
            LexemeKind::Identifier | LexemeKind::Command => self.parse_column_or_call(lex),
            LexemeKind::Operator if lex.value == "*" => Ok(Expr::Wildcard),
            _ => Err(SyntaxError {
                message: format!("unexpected token {}", lex.value),
                position: lex.position,
                expected: vec!["expression".into()],
                found: lex.value,
                recovery_hint: None,
            }),
        }
    }

    fn parse_column_or_call(&mut self, first: Lexeme) -> Result<Expr, SyntaxError> {
        let mut parts = vec![parse_ident_lexeme_or_keyword(&first)];
        while self.at_punct(".") {
            if self.at_operator_n_is_wildcard(1) {
                self.pos += 2;
                return Ok(Expr::QualifiedWildcard(parts));
            }
            self.pos += 1;
            parts.push(self.parse_ident()?);
        }
        if self.at_punct("(") {
            self.pos += 1;
            let distinct = self.eat_keyword("distinct");
            let mut args = Vec::new();
            if !self.at_punct(")") {
                if self.at_operator("*") {
                    self.pos += 1;
                    args.push(Expr::Wildcard);
                } else {
                    args.push(self.parse_expr()?);
                    while self.eat_punct(",") {
                        args.push(self.parse_expr()?);
                    }
                }
            }
            self.expect_punct(")")?;
            let over = if self.eat_keyword("over") { Some(self.parse_window_spec()?) } else { None };
            return Ok(Expr::FunctionCall(FunctionCall { name: ObjectName(parts), args, distinct, over }));
        }
        let name = parts.pop().expect("at least one part");
        Ok(Expr::Column { qualifiers: parts, name })
    }

    fn at_operator_n_is_wildcard(&self, n: usize) -> bool {
        self.peek_n(n).is_some_and(|l| l.kind == LexemeKind::Operator && l.value == "*")
    }

    fn parse_window_spec(&mut self) -> Result<WindowSpec, SyntaxError> {
        self.expect_punct("(")?;
        let partition_by = if self.at_keyword("partition") && self.at_keyword_n(1, "by") {
            self.pos += 2;
            let mut exprs = vec![self.parse_expr()?];
            while self.eat_punct(",") {
                exprs.push(self.parse_expr()?);
            }
            exprs
        } else {
            Vec::new()
        };
        let order_by = if self.at_keyword("order") && self.at_keyword_n(1, "by") {
            self.pos += 2;
            self.parse_order_by()?.items
        } else {
            Vec::new()
        };
        let frame = if self.at_keyword("rows") || self.at_keyword("range") {
            let units = if self.eat_keyword("rows") { FrameUnits::Rows } else { self.pos += 1; FrameUnits::Range };
            if self.eat_keyword("between") {
                let start = self.parse_frame_bound()?;
                self.expect_keyword("and")?;
                let end = Some(self.parse_frame_bound()?);
                Some(WindowFrame { units, start, end })
            } else {
                let start = self.parse_frame_bound()?;
                Some(WindowFrame { units, start, end: None })
            }
        } else {
            None
        };
        self.expect_punct(")")?;
        Ok(WindowSpec { partition_by, order_by, frame })
    }

    fn parse_frame_bound(&mut self) -> Result<FrameBound, SyntaxError> {
        if self.at_keyword("unbounded") && self.at_keyword_n(1, "preceding") {
            self.pos += 2;
            return Ok(FrameBound::UnboundedPreceding);
        }
        if self.at_keyword("unbounded") && self.at_keyword_n(1, "following") {
            self.pos += 2;
            return Ok(FrameBound::UnboundedFollowing);
        }
        if self.at_keyword("current") && self.at_keyword_n(1, "row") {
            self.pos += 2;
            return Ok(FrameBound::CurrentRow);
        }
        let expr = self.parse_additive()?;
        if self.eat_keyword("preceding") {
            Ok(FrameBound::Preceding(Box::new(expr)))
        } else {
            self.expect_keyword("following")?;
            Ok(FrameBound::Following(Box::new(expr)))
        }
    }

    fn parse_case(&mut self) -> Result<Expr, SyntaxError> {
        let operand = if self.at_keyword("when") { None } else { Some(Box::new(self.parse_expr()?)) };
        let mut when_then = Vec::new();
        while self.eat_keyword("when") {
            let when = self.parse_expr()?;
            self.expect_keyword("then")?;
            let then = self.parse_expr()?;
            when_then.push((when, then));
        }
        let else_result = if self.eat_keyword("else") { Some(Box::new(self.parse_expr()?)) } else { None };
        self.expect_keyword("end")?;
        Ok(Expr::Case { operand, when_then, else_result })
    }
}

impl TableConstraint {
    fn parse_paren_ident_list(parser: &mut Parser) -> Result<Vec<Ident>, SyntaxError> {
        parser.expect_punct("(")?;
        let mut cols = vec![parser.parse_ident()?];
        while parser.eat_punct(",") {
            cols.push(parser.parse_ident()?);
        }
        parser.expect_punct(")")?;
        Ok(cols)
    }
}

fn phrase_to_join_kind(phrase: &[&str]) -> JoinKind {
    let lower: Vec<String> = phrase.iter().map(|w| w.to_ascii_lowercase()).collect();
    match lower.join(" ").as_str() {
        "join" | "inner join" => JoinKind::Inner,
        "left join" => JoinKind::Left,
        "left outer join" => JoinKind::LeftOuter,
        "right join" => JoinKind::Right,
        "right outer join" => JoinKind::RightOuter,
        "full join" => JoinKind::Full,
        "full outer join" => JoinKind::FullOuter,
        "cross join" => JoinKind::Cross,
        "lateral left join" => JoinKind::LateralLeft,
        "natural join" | "natural inner join" => JoinKind::NaturalInner,
        "natural left join" | "natural left outer join" => JoinKind::NaturalLeft,
        "natural right join" | "natural right outer join" => JoinKind::NaturalRight,
        "natural full join" | "natural full outer join" => JoinKind::NaturalFull,
        _ => JoinKind::Inner,
    }
}

fn parse_ident_lexeme(raw: &str) -> Ident {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() >= 2 {
        let (open, close) = (chars[0], *chars.last().unwrap());
        if matches!((open, close), ('"', '"') | ('`', '`') | ('[', ']')) {
            let inner: String = chars[1..chars.len() - 1].iter().collect();
            let doubled = match open {
                '[' => inner, // bracket-quoted identifiers have no doubling escape
                _ => inner.replace(&format!("{close}{close}"), &close.to_string()),
            };
            return Ident::quoted(doubled, open);
        }
    }
    Ident::new(raw.to_string())
}

fn parse_ident_lexeme_or_keyword(lex: &Lexeme) -> Ident {
    match lex.kind {
        LexemeKind::Identifier => parse_ident_lexeme(&lex.value),
        _ => Ident::new(lex.value.clone()),
    }
}

fn parse_literal_lexeme(raw: &str) -> LiteralValue {
    if let Some(rest) = raw.strip_prefix('\'').and_then(|_| raw.strip_suffix('\'')) {
        let unescaped = rest.replace("''", "'");
        return LiteralValue::String(unescaped);
    }
    if raw.len() >= 2 && raw.ends_with('\'') {
        if let Some(idx) = raw.find('\'') {
            if idx > 0 {
                let prefix = raw[..idx].to_string();
                let body = &raw[idx + 1..raw.len() - 1];
                return LiteralValue::Typed { prefix, value: body.replace("''", "'") };
            }
        }
    }
    if raw.contains('.') || raw.to_ascii_lowercase().contains('e') {
        if let Ok(f) = raw.parse::<f64>() {
            return LiteralValue::Float(f);
        }
    }
    if let Ok(i) = raw.parse::<i64>() {
        return LiteralValue::Int(i);
    }
    raw.parse::<f64>().map(LiteralValue::Float).unwrap_or(LiteralValue::Int(0))
}

fn parse_parameter_lexeme(raw: &str) -> Parameter {
    let mut chars = raw.chars();
    let sigil = chars.next().unwrap_or('?');
    let rest: String = chars.collect();
    match sigil {
        ':' => Parameter { name: Some(rest), index: None, raw_symbol: ParamSymbol::Colon },
        '@' => Parameter { name: Some(rest), index: None, raw_symbol: ParamSymbol::At },
        '?' => Parameter { name: None, index: None, raw_symbol: ParamSymbol::QuestionMark },
        '$' => {
            if let Ok(index) = rest.parse::<u32>() {
                Parameter { name: None, index: Some(index), raw_symbol: ParamSymbol::DollarIndex }
            } else {
                Parameter { name: Some(rest), index: None, raw_symbol: ParamSymbol::Dollar }
            }
        }
        '%' => Parameter { name: None, index: None, raw_symbol: ParamSymbol::PercentS },
        _ => Parameter { name: None, index: None, raw_symbol: ParamSymbol::PercentS },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_at_resolves_aliases_visible_up_to_the_cursor() {
        let sql = "SELECT u.id FROM users u JOIN profiles p ON p.user_id = u.id";
        let cursor = sql.find("FROM").unwrap();
        let scope = scope_at(sql, cursor, &ParseOptions::default()).unwrap();
        assert!(scope.aliases.is_empty());

        let cursor_after_from = sql.len();
        let scope = scope_at(sql, cursor_after_from, &ParseOptions::default()).unwrap();
        assert!(scope.resolve("u"));
        assert!(scope.resolve("p"));
    }

    #[test]
    fn scope_at_with_no_parseable_select_returns_an_empty_scope() {
        let scope = scope_at("", 0, &ParseOptions::default()).unwrap();
        assert!(scope.aliases.is_empty());
        assert!(scope.ctes.is_empty());
    }
}

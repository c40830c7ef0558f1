//! The keyword dictionary and the multi-word JOIN phrase map.
//!
//! This is not a list of *reserved* keywords: the parser decides per-context
//! whether a keyword token may also be consumed as an identifier. New
//! keywords can be added here without changing what it means for a keyword
//! to be reserved; see [`crate::parser`] for that decision.

use phf::phf_set;

/// Defines a string constant for a single keyword: `kw_def!(SELECT);`
/// expands to `pub const SELECT: &str = "SELECT";`.
macro_rules! kw_def {
    ($ident:ident = $string_keyword:expr) => {
        pub const $ident: &str = $string_keyword;
    };
    ($ident:ident) => {
        kw_def!($ident = stringify!($ident));
    };
}

/// Expands to a `kw_def!()` for each keyword, an exhaustive `Keyword` enum,
/// and an `ALL_KEYWORDS` array consumed to build the lookup set.
macro_rules! define_keywords {
    ($($ident:ident $(= $string_keyword:expr)?),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(non_camel_case_types)]
        pub enum Keyword {
            $($ident),*
        }

        impl Keyword {
            pub fn text(self) -> &'static str {
                match self {
                    $(Keyword::$ident => $ident),*
                }
            }
        }

        $(kw_def!($ident $(= $string_keyword)?);)*

        pub const ALL_KEYWORDS: &[&str] = &[$($ident),*];
    };
}

define_keywords!(
    ADD, ALL, ALTER, AND, ARRAY, AS, ASC, BETWEEN, BY, CASE, CAST, COLUMN, CONSTRAINT, CREATE,
    CROSS, CURRENT, DEFAULT, DELETE, DESC, DISTINCT, DROP, ELSE, END, EXCEPT, EXISTS, FALSE,
    FETCH, FILTER, FIRST, FOLLOWING, FOR, FOREIGN, FROM, FULL, FUNCTION, GROUP, HAVING, IF,
    ILIKE, IN, INDEX, INNER, INSERT, INTERSECT, INTO, IS, JOIN, KEY, LAST, LATERAL, LEFT, LIKE,
    LIMIT, MATCHED, MATERIALIZED, MERGE, NATURAL, NOT, NULL, NULLS, OFFSET, ON, ONLY, OR, ORDER,
    OUTER, OVER, PARTITION, PRECEDING, PRIMARY, RANGE, RECURSIVE, REFERENCES, RENAME, RETURNING,
    RIGHT, ROW, ROWS, SELECT, SET, SOURCE, TABLE, THEN, TRUE, UNBOUNDED, UNION, UNIQUE, UPDATE,
    USING, VALUES, WHEN, WHERE, WINDOW, WITH,
);

/// The keyword set, built at compile time rather than assembled into a
/// runtime hash set on first lookup.
static KEYWORD_SET: phf::Set<&'static str> = phf_set! {
    "ADD", "ALL", "ALTER", "AND", "ARRAY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CAST", "COLUMN",
    "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP",
    "ELSE", "END", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FILTER", "FIRST", "FOLLOWING", "FOR",
    "FOREIGN", "FROM", "FULL", "FUNCTION", "GROUP", "HAVING", "IF", "ILIKE", "IN", "INDEX", "INNER",
    "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "KEY", "LAST", "LATERAL", "LEFT", "LIKE", "LIMIT",
    "MATCHED", "MATERIALIZED", "MERGE", "NATURAL", "NOT", "NULL", "NULLS", "OFFSET", "ON", "ONLY",
    "OR", "ORDER", "OUTER", "OVER", "PARTITION", "PRECEDING", "PRIMARY", "RANGE", "RECURSIVE",
    "REFERENCES", "RENAME", "RETURNING", "RIGHT", "ROW", "ROWS", "SELECT", "SET", "SOURCE", "TABLE",
    "THEN", "TRUE", "UNBOUNDED", "UNION", "UNIQUE", "UPDATE", "USING", "VALUES", "WHEN", "WHERE",
    "WINDOW", "WITH",
};

/// Case-insensitive keyword membership test; `text` should already have
/// delimiters stripped (it is never called on a quoted identifier).
pub fn is_keyword(text: &str) -> bool {
    KEYWORD_SET.contains(text.to_ascii_uppercase().as_str())
}

/// No-op: the keyword set is a compile-time `phf::Set`, so there is nothing
/// to rebuild. Kept so call sites (and tests) that reset between cases don't
/// need to special-case this crate's keyword lookup.
pub fn reset() {}

/// Ordered list of the maximal keyword phrases recognized as JOIN
/// introducers, longest-first so the parser's phrase matcher greedily
/// consumes e.g. `LEFT OUTER JOIN` before falling back to `LEFT JOIN`.
pub fn join_phrases() -> &'static [&'static [&'static str]] {
    static PHRASES: &[&[&str]] = &[
        &["NATURAL", "LEFT", "OUTER", "JOIN"],
        &["NATURAL", "RIGHT", "OUTER", "JOIN"],
        &["NATURAL", "FULL", "OUTER", "JOIN"],
        &["NATURAL", "LEFT", "JOIN"],
        &["NATURAL", "RIGHT", "JOIN"],
        &["NATURAL", "FULL", "JOIN"],
        &["NATURAL", "INNER", "JOIN"],
        &["NATURAL", "JOIN"],
        &["LATERAL", "LEFT", "JOIN"],
        &["LEFT", "OUTER", "JOIN"],
        &["RIGHT", "OUTER", "JOIN"],
        &["FULL", "OUTER", "JOIN"],
        &["CROSS", "JOIN"],
        &["INNER", "JOIN"],
        &["LEFT", "JOIN"],
        &["RIGHT", "JOIN"],
        &["FULL", "JOIN"],
        &["JOIN"],
    ];
    PHRASES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup_is_case_insensitive() {
        assert!(is_keyword("select"));
        assert!(is_keyword("SELECT"));
        assert!(is_keyword("Select"));
        assert!(!is_keyword("orders"));
    }

    #[test]
    fn reset_is_idempotent() {
        assert!(is_keyword("select"));
        reset();
        assert!(is_keyword("select"));
    }

    #[test]
    fn join_phrases_are_longest_first() {
        let phrases = join_phrases();
        for pair in phrases.windows(2) {
            assert!(pair[0].len() >= pair[1].len() || pair[0][0] != pair[1][0]);
        }
    }
}

//! C1: tokenizes source text into a stream of [`Lexeme`]s plus a
//! [`PositionIndex`] for line/column lookups, and exposes cursor→lexeme
//! lookup for editor-style consumers.

use crate::errors::LexError;
use crate::keywords;
use crate::position::{Cursor, PositionIndex, PositionMarker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeKind {
    Command,
    Identifier,
    Function,
    Operator,
    Literal,
    Punctuation,
    Parameter,
    Comment,
    Whitespace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    /// Normalized text: keywords are lowercased; everything else is the raw
    /// spelling (quoted identifiers and string literals keep their original
    /// case and escaping).
    pub value: String,
    pub position: PositionMarker,
    pub leading_comments: Vec<String>,
    pub trailing_comments: Vec<String>,
}

/// Tokenizes `text`, skipping whitespace and folding comments onto the
/// adjacent non-trivia token (leading on the next token, trailing on the
/// previous one), returning the lexeme stream the parser consumes plus a
/// position index for line/column lookups.
pub fn tokenize(text: &str) -> Result<(Vec<Lexeme>, PositionIndex), LexError> {
    let raw = scan_raw(text)?;
    Ok((attach_comments(raw), PositionIndex::new(text)))
}

fn scan_raw(text: &str) -> Result<Vec<Lexeme>, LexError> {
    let mut cursor = Cursor::new(text);
    let mut out = Vec::new();

    while !cursor.is_eof() {
        let start_byte = cursor.byte_offset();
        let start_line = cursor.line();
        let start_col = cursor.column();
        let ch = cursor.peek().expect("checked is_eof");

        let (kind, value) = if ch.is_whitespace() {
            let mut buf = String::new();
            while let Some(c) = cursor.peek() {
                if !c.is_whitespace() {
                    break;
                }
                buf.push(c);
                cursor.bump();
            }
            (LexemeKind::Whitespace, buf)
        } else if ch == '-' && cursor.peek2() == Some('-') {
            cursor.bump();
            cursor.bump();
            let mut buf = String::new();
            while let Some(c) = cursor.peek() {
                if c == '\n' {
                    break;
                }
                buf.push(c);
                cursor.bump();
            }
            (LexemeKind::Comment, format!("--{buf}"))
        } else if ch == '/' && cursor.peek2() == Some('*') {
            cursor.bump();
            cursor.bump();
            let mut buf = String::from("/*");
            loop {
                match cursor.peek() {
                    None => {
                        return Err(LexError {
                            message: "unterminated block comment".into(),
                            position: PositionMarker::new(start_byte, cursor.byte_offset(), start_line, start_col),
                        });
                    }
                    Some('*') if cursor.peek2() == Some('/') => {
                        cursor.bump();
                        cursor.bump();
                        buf.push_str("*/");
                        break;
                    }
                    Some(c) => {
                        buf.push(c);
                        cursor.bump();
                    }
                }
            }
            (LexemeKind::Comment, buf)
        } else if ch == '\'' {
            let s = scan_quoted(&mut cursor, '\'', start_byte, start_line, start_col)?;
            (LexemeKind::Literal, s)
        } else if matches!(ch, '"' | '`' | '[') {
            let close = match ch { '"' => '"', '`' => '`', '[' => ']', _ => unreachable!() };
            let s = scan_quoted(&mut cursor, close, start_byte, start_line, start_col)?;
            (LexemeKind::Identifier, s)
        } else if ch.is_ascii_digit() {
            let s = scan_number(&mut cursor);
            (LexemeKind::Literal, s)
        } else if is_ident_start(ch) {
            let mut buf = String::new();
            while let Some(c) = cursor.peek() {
                if !is_ident_continue(c) {
                    break;
                }
                buf.push(c);
                cursor.bump();
            }
            // E'...'/N'...' typed string literal: a one-letter prefix glued to a quote.
            if buf.len() == 1 && cursor.peek() == Some('\'') {
                let quoted = scan_quoted(&mut cursor, '\'', start_byte, start_line, start_col)?;
                (LexemeKind::Literal, format!("{buf}{quoted}"))
            } else if keywords::is_keyword(&buf) {
                (LexemeKind::Command, buf.to_ascii_lowercase())
            } else {
                (LexemeKind::Identifier, buf)
            }
        } else if matches!(ch, ':' | '@') {
            cursor.bump();
            let mut buf = String::from(ch);
            while let Some(c) = cursor.peek() {
                if !is_ident_continue(c) {
                    break;
                }
                buf.push(c);
                cursor.bump();
            }
            if buf.len() == 1 && ch == ':' && cursor.peek() == Some(':') {
                cursor.bump();
                (LexemeKind::Operator, "::".to_string())
            } else {
                (LexemeKind::Parameter, buf)
            }
        } else if ch == '$' {
            cursor.bump();
            let mut buf = String::from('$');
            while let Some(c) = cursor.peek() {
                if !is_ident_continue(c) {
                    break;
                }
                buf.push(c);
                cursor.bump();
            }
            (LexemeKind::Parameter, buf)
        } else if ch == '?' {
            cursor.bump();
            (LexemeKind::Parameter, "?".to_string())
        } else if ch == '%' && cursor.peek2() == Some('s') {
            cursor.bump();
            cursor.bump();
            (LexemeKind::Parameter, "%s".to_string())
        } else if matches!(ch, '(' | ')' | ',' | ';' | '.') {
            cursor.bump();
            (LexemeKind::Punctuation, ch.to_string())
        } else if is_operator_start(ch) {
            let mut buf = String::from(ch);
            cursor.bump();
            while let Some(c) = cursor.peek() {
                let candidate = format!("{buf}{c}");
                if is_operator_token(&candidate) {
                    buf = candidate;
                    cursor.bump();
                } else {
                    break;
                }
            }
            (LexemeKind::Operator, buf)
        } else {
            return Err(LexError {
                message: format!("unexpected character '{ch}'"),
                position: PositionMarker::new(start_byte, start_byte + ch.len_utf8(), start_line, start_col),
            });
        };

        let end_byte = cursor.byte_offset();
        out.push(Lexeme {
            kind,
            value,
            position: PositionMarker::new(start_byte, end_byte, start_line, start_col),
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
        });
    }

    Ok(out)
}

fn scan_quoted(
    cursor: &mut Cursor<'_>,
    close: char,
    start_byte: usize,
    start_line: usize,
    start_col: usize,
) -> Result<String, LexError> {
    let mut buf = String::new();
    buf.push(cursor.bump().expect("opening delimiter"));
    loop {
        match cursor.peek() {
            None => {
                return Err(LexError {
                    message: "unterminated quoted literal".into(),
                    position: PositionMarker::new(start_byte, cursor.byte_offset(), start_line, start_col),
                });
            }
            Some(c) if c == close => {
                buf.push(c);
                cursor.bump();
                if cursor.peek() == Some(close) {
                    // doubled delimiter escapes a literal delimiter character
                    buf.push(cursor.bump().expect("peeked"));
                    continue;
                }
                break;
            }
            Some(c) => {
                buf.push(c);
                cursor.bump();
            }
        }
    }
    Ok(buf)
}

fn scan_number(cursor: &mut Cursor<'_>) -> String {
    let mut buf = String::new();
    buf.push_str(&take_digits(cursor));
    if cursor.peek() == Some('.') && cursor.peek2().is_some_and(|c| c.is_ascii_digit()) {
        buf.push(cursor.bump().unwrap());
        buf.push_str(&take_digits(cursor));
    }
    if matches!(cursor.peek(), Some('e' | 'E')) {
        // Only consume the exponent if digits actually follow it (with an
        // optional sign in between).
        let mut it = cursor.rest().chars();
        it.next();
        let mut peek_iter = it.clone();
        if matches!(peek_iter.next(), Some('+' | '-')) {
            // skip sign in the lookahead check
        } else {
            peek_iter = it;
        }
        if peek_iter.next().is_some_and(|c| c.is_ascii_digit()) {
            buf.push(cursor.bump().unwrap());
            if matches!(cursor.peek(), Some('+' | '-')) {
                buf.push(cursor.bump().unwrap());
            }
            buf.push_str(&take_digits(cursor));
        }
    }
    buf
}

fn take_digits(cursor: &mut Cursor<'_>) -> String {
    let mut buf = String::new();
    while let Some(c) = cursor.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        buf.push(c);
        cursor.bump();
    }
    buf
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphanumeric()
}

fn is_operator_start(ch: char) -> bool {
    matches!(ch, '+' | '-' | '*' | '/' | '%' | '^' | '=' | '<' | '>' | '|' | '!' | '~')
}

/// Whether `candidate` is a recognized multi-character operator token, used
/// to decide whether the lexer should keep extending a greedily-scanned
/// operator.
fn is_operator_token(candidate: &str) -> bool {
    matches!(candidate, "<>" | "<=" | ">=" | "!=" | "||" | "::")
}

/// Strips whitespace/comment lexemes from `raw`, attaching every comment as
/// a leading comment on the next non-trivia token. A comment with no
/// following token at all (it trails the last real token in the file)
/// attaches as a trailing comment on that last token instead, per the
/// spec's attachment rule.
fn attach_comments(raw: Vec<Lexeme>) -> Vec<Lexeme> {
    let mut out: Vec<Lexeme> = Vec::with_capacity(raw.len());
    let mut pending_leading: Vec<String> = Vec::new();

    for lex in raw {
        match lex.kind {
            LexemeKind::Whitespace => continue,
            LexemeKind::Comment => pending_leading.push(lex.value),
            _ => {
                let mut lex = lex;
                lex.leading_comments = std::mem::take(&mut pending_leading);
                out.push(lex);
            }
        }
    }
    if !pending_leading.is_empty() {
        if let Some(last) = out.last_mut() {
            last.trailing_comments = pending_leading;
        }
    }
    out
}

/// Finds the lexeme whose half-open span contains `offset`, or `None` if the
/// offset falls inside whitespace or a comment that was stripped.
pub fn find_lexeme_at_offset<'a>(lexemes: &'a [Lexeme], offset: usize) -> Option<&'a Lexeme> {
    lexemes.iter().find(|lex| lex.position.contains(offset))
}

/// Finds the lexeme at a 1-based `(line, column)` pair via the position
/// index, or `None` if it falls inside whitespace/comments.
pub fn find_lexeme_at_line_column<'a>(
    lexemes: &'a [Lexeme],
    index: &PositionIndex,
    line: usize,
    column: usize,
) -> Option<&'a Lexeme> {
    let offset = index.offset_of(line, column)?;
    find_lexeme_at_offset(lexemes, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(LexemeKind, String)> {
        let (lexemes, _) = tokenize(text).unwrap();
        lexemes.into_iter().map(|l| (l.kind, l.value)).collect()
    }

    #[test]
    fn tokenizes_simple_select() {
        let got = kinds("SELECT id FROM users");
        assert_eq!(
            got,
            vec![
                (LexemeKind::Command, "select".into()),
                (LexemeKind::Identifier, "id".into()),
                (LexemeKind::Command, "from".into()),
                (LexemeKind::Identifier, "users".into()),
            ]
        );
    }

    #[test]
    fn quoted_identifier_preserves_case() {
        let got = kinds("\"Users\"");
        assert_eq!(got, vec![(LexemeKind::Identifier, "\"Users\"".into())]);
    }

    #[test]
    fn doubled_quote_escapes_inside_identifier() {
        let got = kinds("\"a\"\"b\"");
        assert_eq!(got, vec![(LexemeKind::Identifier, "\"a\"\"b\"".into())]);
    }

    #[test]
    fn string_literal_with_doubled_quote_escape() {
        let got = kinds("'it''s'");
        assert_eq!(got, vec![(LexemeKind::Literal, "'it''s'".into())]);
    }

    #[test]
    fn typed_string_literal_prefix_preserved() {
        let got = kinds("E'abc'");
        assert_eq!(got, vec![(LexemeKind::Literal, "E'abc'".into())]);
    }

    #[test]
    fn numeric_literal_variants() {
        assert_eq!(kinds("1"), vec![(LexemeKind::Literal, "1".into())]);
        assert_eq!(kinds("1.5"), vec![(LexemeKind::Literal, "1.5".into())]);
        assert_eq!(kinds("1e10"), vec![(LexemeKind::Literal, "1e10".into())]);
        assert_eq!(kinds("1.5e-3"), vec![(LexemeKind::Literal, "1.5e-3".into())]);
    }

    #[test]
    fn cast_operator_is_not_part_of_numeric_literal() {
        let got = kinds("1::int");
        assert_eq!(
            got,
            vec![
                (LexemeKind::Literal, "1".into()),
                (LexemeKind::Operator, "::".into()),
                (LexemeKind::Identifier, "int".into()),
            ]
        );
    }

    #[test]
    fn recognizes_every_parameter_style() {
        for (text, expected) in [
            (":name", ":name"),
            ("$name", "$name"),
            ("@name", "@name"),
            ("?", "?"),
            ("$1", "$1"),
            ("%s", "%s"),
        ] {
            let got = kinds(text);
            assert_eq!(got, vec![(LexemeKind::Parameter, expected.into())], "for {text}");
        }
    }

    #[test]
    fn interior_comment_attaches_as_leading_on_the_next_token() {
        let (lexemes, _) = tokenize("SELECT id -- trailing\nFROM users").unwrap();
        assert!(lexemes[1].trailing_comments.is_empty());
        assert_eq!(lexemes[2].leading_comments, vec!["-- trailing".to_string()]);
    }

    #[test]
    fn comment_at_end_of_input_attaches_as_trailing_on_the_last_token() {
        let (lexemes, _) = tokenize("SELECT id FROM users -- trailing").unwrap();
        let last = lexemes.last().unwrap();
        assert_eq!(last.trailing_comments, vec!["-- trailing".to_string()]);
    }

    #[test]
    fn leading_file_comment_attaches_to_the_first_token() {
        let (lexemes, _) = tokenize("/* User ID */ id").unwrap();
        assert_eq!(lexemes[0].leading_comments, vec!["/* User ID */".to_string()]);
    }

    #[test]
    fn block_comment_does_not_nest() {
        let got = kinds("/* a /* b */ c */");
        // the first `*/` closes the comment; trailing ` c */` is parsed as further tokens
        assert_eq!(got[0], (LexemeKind::Comment, "/* a /* b */".into()));
    }

    #[test]
    fn unterminated_block_comment_errors_with_position() {
        let err = tokenize("/* never closed").unwrap_err();
        assert_eq!(err.position.start_byte, 0);
    }

    #[test]
    fn cursor_lookup_skips_whitespace() {
        let (lexemes, _) = tokenize("SELECT  id").unwrap();
        assert!(find_lexeme_at_offset(&lexemes, 6).is_none());
        assert!(find_lexeme_at_offset(&lexemes, 8).is_some());
    }

    #[test]
    fn lexer_roundtrip_modulo_comment_normalization() {
        let text = "SELECT id, name FROM users WHERE id = 1";
        let (lexemes, _) = tokenize(text).unwrap();
        let mut rebuilt = String::new();
        for (i, lex) in lexemes.iter().enumerate() {
            if i > 0 {
                rebuilt.push(' ');
            }
            rebuilt.push_str(&match lex.kind {
                LexemeKind::Command => lex.value.to_ascii_uppercase(),
                _ => lex.value.clone(),
            });
        }
        assert_eq!(rebuilt, text);
    }
}

//! Literal rendering and fragment checks

use quarry_types::{SqlValue, format_double, hex};
use regex::Regex;
use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::LazyLock;

use crate::{CompileError, CompileResult};

/// Plain SQL name, optionally schema- or table-qualified
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$")
        .expect("identifier pattern is valid")
});

/// Quote `text` as a SQL string literal, doubling embedded quotes
pub fn sanitize_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// Render a value as an inline SQL literal.
///
/// NaN has no SQL literal and renders as `NULL`; infinities render as
/// out-of-range reals that SQLite reads back as infinity. Text containing a
/// NUL character is rejected under validation.
pub fn to_sanitized_string(value: &SqlValue, needs_validation: bool) -> CompileResult<String> {
    Ok(match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Long(l) => l.to_string(),
        SqlValue::Double(d) if d.is_nan() => "NULL".to_string(),
        SqlValue::Double(d) if d.is_infinite() => {
            if *d > 0.0 { "9e999" } else { "-9e999" }.to_string()
        }
        SqlValue::Double(d) => format_double(*d),
        SqlValue::Text(s) => {
            if needs_validation && s.contains('\0') {
                return Err(CompileError::InvalidLiteral {
                    message: "text literal contains a NUL character".to_string(),
                });
            }
            sanitize_string(s)
        }
        SqlValue::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
        SqlValue::Blob(b) => format!("X'{}'", hex(b)),
    })
}

/// Reject fragments that could escape the clause they are embedded in.
///
/// Outside of quoted text a fragment may not contain a statement separator
/// or a comment opener, its parentheses must balance, and every quote it
/// opens must be closed.
pub fn validate_fragment(fragment: &str) -> CompileResult<()> {
    let mut depth: i32 = 0;
    let mut problem = None;
    lex(fragment, |lexeme| {
        if problem.is_some() {
            return;
        }
        problem = match lexeme {
            Lexeme::Code(';') => Some("statement separator"),
            Lexeme::LineComment => Some("line comment"),
            Lexeme::BlockComment => Some("block comment"),
            Lexeme::Unterminated => Some("unterminated quote"),
            Lexeme::Code('(') => {
                depth += 1;
                None
            }
            Lexeme::Code(')') => {
                depth -= 1;
                (depth < 0).then_some("unbalanced parentheses")
            }
            _ => None,
        };
    });

    match problem.or_else(|| (depth != 0).then_some("unbalanced parentheses")) {
        Some(reason) => Err(CompileError::unsafe_fragment(fragment, reason)),
        None => Ok(()),
    }
}

/// Check that `name` is a plain, optionally qualified, SQL identifier
pub fn validate_identifier(name: &str) -> CompileResult<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}

/// What the lexer reports for a SQL fragment. Quoted text, quoted and
/// bracketed identifiers and comment bodies are opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    /// A character outside quotes and comments
    Code(char),
    /// `?` or `?[]` at a byte offset
    Placeholder { pos: usize, array: bool },
    LineComment,
    BlockComment,
    /// Quoted text or a bracketed identifier still open at the end
    Unterminated,
}

fn lex(sql: &str, mut f: impl FnMut(Lexeme)) {
    let mut chars = sql.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                if !skip_quoted(&mut chars, close) {
                    f(Lexeme::Unterminated);
                }
            }
            '-' if next == Some('-') => {
                f(Lexeme::LineComment);
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '/' if next == Some('*') => {
                f(Lexeme::BlockComment);
                chars.next();
                let mut star = false;
                for (_, c) in chars.by_ref() {
                    if star && c == '/' {
                        break;
                    }
                    star = c == '*';
                }
            }
            '?' => {
                let array = sql[pos + 1..].starts_with("[]");
                if array {
                    chars.next();
                    chars.next();
                }
                f(Lexeme::Placeholder { pos, array });
            }
            _ => f(Lexeme::Code(c)),
        }
    }
}

/// Consume up to and including `close`; a doubled quote is an escaped
/// quote character. False when the input ends first.
fn skip_quoted(chars: &mut Peekable<CharIndices<'_>>, close: char) -> bool {
    while let Some((_, c)) = chars.next() {
        if c != close {
            continue;
        }
        if close != ']' && chars.peek().map(|&(_, n)| n) == Some(close) {
            chars.next();
            continue;
        }
        return true;
    }
    false
}

/// Visit the `?` placeholders of a fragment that sit outside quoted text,
/// bracketed identifiers and comments.
///
/// The callback receives the byte offset of each placeholder and whether it
/// is an array placeholder (`?[]`).
pub(crate) fn for_each_placeholder(sql: &str, mut f: impl FnMut(usize, bool)) {
    lex(sql, |lexeme| {
        if let Lexeme::Placeholder { pos, array } = lexeme {
            f(pos, array);
        }
    });
}

/// Substitute each placeholder of `fragment` with the matching argument
/// rendered as a literal
pub(crate) fn inline_arguments(
    fragment: &str,
    args: &[SqlValue],
    needs_validation: bool,
) -> CompileResult<String> {
    let mut positions = Vec::new();
    for_each_placeholder(fragment, |pos, _| positions.push(pos));
    if positions.len() != args.len() {
        return Err(CompileError::CountMismatch {
            context: "raw fragment arguments",
            expected: positions.len(),
            found: args.len(),
        });
    }

    let mut out = String::with_capacity(fragment.len() + args.len() * 8);
    let mut last = 0;
    for (pos, arg) in positions.into_iter().zip(args) {
        out.push_str(&fragment[last..pos]);
        out.push_str(&to_sanitized_string(arg, needs_validation)?);
        last = pos + 1;
    }
    out.push_str(&fragment[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_string_doubles_quotes() {
        assert_eq!(sanitize_string("it's"), "'it''s'");
        assert_eq!(sanitize_string(""), "''");
    }

    #[test]
    fn test_literal_rendering() {
        let render = |v: SqlValue| to_sanitized_string(&v, false).unwrap();
        assert_eq!(render(SqlValue::Null), "NULL");
        assert_eq!(render(SqlValue::Long(-4)), "-4");
        assert_eq!(render(SqlValue::Double(1.0)), "1.0");
        assert_eq!(render(SqlValue::Double(f64::NAN)), "NULL");
        assert_eq!(render(SqlValue::Double(f64::NEG_INFINITY)), "-9e999");
        assert_eq!(render(SqlValue::Boolean(true)), "1");
        assert_eq!(render(SqlValue::blob(vec![0xde, 0xad])), "X'dead'");
    }

    #[test]
    fn test_nul_rejected_only_under_validation() {
        let value = SqlValue::text("a\0b");
        assert!(to_sanitized_string(&value, false).is_ok());
        assert!(matches!(
            to_sanitized_string(&value, true),
            Err(CompileError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_validate_fragment() {
        assert!(validate_fragment("a = 1 AND (b > 2)").is_ok());
        assert!(validate_fragment("name = 'x;--y'").is_ok());
        assert!(validate_fragment("name = 'it''s'").is_ok());
        assert!(validate_fragment("1; DROP TABLE t").is_err());
        assert!(validate_fragment("a = 1 -- tail").is_err());
        assert!(validate_fragment("a /* c */").is_err());
        assert!(validate_fragment("(a = 1").is_err());
        assert!(validate_fragment("a = 1)").is_err());
        assert!(validate_fragment("name = 'open").is_err());
        assert!(validate_fragment("a - -1").is_ok());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("people").is_ok());
        assert!(validate_identifier("p.first_name").is_ok());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("a b").is_err());
        assert!(validate_identifier("a.b.c").is_err());
    }

    #[test]
    fn test_placeholders_skip_quoted_text() {
        let mut found = Vec::new();
        for_each_placeholder("a = ? AND b = '?' AND c IN (?[])", |pos, array| {
            found.push((pos, array))
        });
        assert_eq!(found, vec![(4, false), (28, true)]);
    }

    #[test]
    fn test_placeholders_skip_identifiers_and_comments() {
        let mut found = Vec::new();
        for_each_placeholder("[odd?col] = ? /* ? */ AND \"q?\" = ? -- ?\n OR x = ?", |pos, _| {
            found.push(pos)
        });
        assert_eq!(found, vec![12, 33, 48]);
    }

    #[test]
    fn test_validation_and_placeholders_agree_on_brackets() {
        let fragment = "[a;b?] = ?";
        assert!(validate_fragment(fragment).is_ok());
        let mut count = 0;
        for_each_placeholder(fragment, |_, _| count += 1);
        assert_eq!(count, 1);

        assert!(validate_fragment("[open = 1").is_err());
        let sql = inline_arguments("[x?] = ?", &[SqlValue::Integer(3)], false).unwrap();
        assert_eq!(sql, "[x?] = 3");
    }

    #[test]
    fn test_inline_arguments() {
        let sql = inline_arguments("a = ? OR b = ?", &[SqlValue::Integer(1), SqlValue::text("x")], false).unwrap();
        assert_eq!(sql, "a = 1 OR b = 'x'");
        assert!(inline_arguments("a = ?", &[], false).is_err());
    }
}

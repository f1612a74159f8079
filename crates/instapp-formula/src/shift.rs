//! Row shifting for formulas copied from a template row.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while1, take_while_m_n},
    character::complete::{anychar, char, digit1},
    combinator::{all_consuming, map, opt, recognize},
    multi::many0,
    sequence::{delimited, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

/// How row references are rewritten
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftMode {
    /// Replace every occurrence of the row's digits, anywhere in the text.
    #[default]
    Textual,
    /// Rewrite only relative cell references that point at the row.
    References,
}

/// True when a cell holds a formula rather than a value.
pub fn is_formula(raw: &str) -> bool {
    raw.trim_start().starts_with('=')
}

/// Shift a formula from `from_row` to `to_row` using `mode`.
pub fn shift_formula(formula: &str, from_row: u32, to_row: u32, mode: ShiftMode) -> String {
    match mode {
        ShiftMode::Textual => shift_formula_row(formula, from_row, to_row),
        ShiftMode::References => shift_formula_row_strict(formula, from_row, to_row),
    }
}

/// Replace every occurrence of `from_row`'s digits with `to_row`'s.
///
/// This is a plain substring substitution. Digits that are not part of a
/// reference are rewritten too:
///
/// ```
/// use instapp_formula::shift_formula_row;
///
/// assert_eq!(shift_formula_row("=A2+B2", 2, 6), "=A6+B6");
/// assert_eq!(shift_formula_row("=A2*2", 2, 20), "=A20*20");
/// assert_eq!(shift_formula_row("=A12+B2", 2, 3), "=A13+B3");
/// ```
pub fn shift_formula_row(formula: &str, from_row: u32, to_row: u32) -> String {
    formula.replace(&from_row.to_string(), &to_row.to_string())
}

/// Rewrite only cell references whose row is `from_row`.
///
/// String literals, quoted sheet names, function names such as `LOG10`,
/// numeric constants and `$`-anchored rows are left alone.
///
/// ```
/// use instapp_formula::shift_formula_row_strict;
///
/// assert_eq!(shift_formula_row_strict("=A2*2", 2, 20), "=A20*2");
/// assert_eq!(shift_formula_row_strict("=A12+B2", 2, 3), "=A12+B3");
/// assert_eq!(shift_formula_row_strict("=$A$2+A2", 2, 5), "=$A$2+A5");
/// ```
pub fn shift_formula_row_strict(formula: &str, from_row: u32, to_row: u32) -> String {
    let mut out = String::with_capacity(formula.len() + 4);
    let mut rest = formula;

    while !rest.is_empty() {
        let Ok((next, token)) = parse_token(rest) else {
            out.push_str(rest);
            break;
        };

        match token {
            Token::Verbatim(text) => out.push_str(text),
            Token::Word(word) => {
                let follows_call_or_sheet = matches!(next.chars().next(), Some('(') | Some('!'));
                match parse_reference(word) {
                    Some(reference)
                        if !follows_call_or_sheet
                            && !reference.abs_row
                            && reference.row == from_row =>
                    {
                        if reference.abs_col {
                            out.push('$');
                        }
                        out.push_str(reference.col);
                        out.push_str(&to_row.to_string());
                    }
                    _ => out.push_str(word),
                }
            }
        }

        rest = next;
    }

    out
}

enum Token<'a> {
    Verbatim(&'a str),
    Word(&'a str),
}

struct Reference<'a> {
    abs_col: bool,
    col: &'a str,
    abs_row: bool,
    row: u32,
}

/// `"..."` with `""` escapes
fn string_literal(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('"'),
        many0(alt((tag("\"\""), is_not("\"")))),
        char('"'),
    ))(input)
}

/// `'...'` with `''` escapes
fn quoted_sheet(input: &str) -> IResult<&str, &str> {
    recognize(delimited(
        char('\''),
        many0(alt((tag("''"), is_not("'")))),
        char('\''),
    ))(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$'))(input)
}

fn parse_token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        map(string_literal, Token::Verbatim),
        map(quoted_sheet, Token::Verbatim),
        map(word, Token::Word),
        map(recognize(anychar), Token::Verbatim),
    ))(input)
}

fn parse_reference(word: &str) -> Option<Reference<'_>> {
    let cell_ref = tuple((
        opt(char('$')),
        take_while_m_n(1, 3, |c: char| c.is_ascii_alphabetic()),
        opt(char('$')),
        digit1,
    ));
    let (_, (abs_col, col, abs_row, digits)) =
        all_consuming::<_, _, nom::error::Error<&str>, _>(cell_ref)(word).ok()?;
    Some(Reference {
        abs_col: abs_col.is_some(),
        col,
        abs_row: abs_row.is_some(),
        row: digits.parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textual_shift() {
        assert_eq!(shift_formula_row("=A2+B2", 2, 6), "=A6+B6");
        assert_eq!(shift_formula_row("=SUM(A2:D2)", 2, 15), "=SUM(A15:D15)");
    }

    #[test]
    fn test_textual_shift_rewrites_unrelated_digits() {
        assert_eq!(shift_formula_row("=A2*2", 2, 20), "=A20*20");
        assert_eq!(shift_formula_row("=B2/12", 2, 7), "=B7/17");
    }

    #[test]
    fn test_textual_shift_without_match() {
        assert_eq!(shift_formula_row("=A3+B3", 2, 6), "=A3+B3");
    }

    #[test]
    fn test_strict_shift_references_only() {
        assert_eq!(shift_formula_row_strict("=A2+B2", 2, 6), "=A6+B6");
        assert_eq!(shift_formula_row_strict("=A2*2", 2, 20), "=A20*2");
        assert_eq!(shift_formula_row_strict("=B2/12", 2, 7), "=B7/12");
        assert_eq!(shift_formula_row_strict("=A12+B2", 2, 3), "=A12+B3");
    }

    #[test]
    fn test_strict_shift_ranges_and_sheets() {
        assert_eq!(shift_formula_row_strict("=SUM(A2:D2)", 2, 9), "=SUM(A9:D9)");
        assert_eq!(shift_formula_row_strict("=Rates!C2*B2", 2, 4), "=Rates!C4*B4");
        assert_eq!(
            shift_formula_row_strict("='My Sheet'!C2+1", 2, 4),
            "='My Sheet'!C4+1"
        );
    }

    #[test]
    fn test_strict_shift_skips_literals_and_functions() {
        assert_eq!(
            shift_formula_row_strict("=IF(A10>0,\"A10\",LOG10(A10))", 10, 11),
            "=IF(A11>0,\"A10\",LOG10(A11))"
        );
        assert_eq!(shift_formula_row_strict("=A2*2.25", 2, 3), "=A3*2.25");
    }

    #[test]
    fn test_strict_shift_absolute_rows() {
        assert_eq!(shift_formula_row_strict("=$A$2+A2", 2, 5), "=$A$2+A5");
        assert_eq!(shift_formula_row_strict("=$A2+B$2", 2, 5), "=$A5+B$2");
    }

    #[test]
    fn test_shift_mode_dispatch() {
        assert_eq!(shift_formula("=A2*2", 2, 3, ShiftMode::Textual), "=A3*3");
        assert_eq!(shift_formula("=A2*2", 2, 3, ShiftMode::References), "=A3*2");
        assert!(is_formula("  =A1"));
        assert!(!is_formula("A1="));
    }
}

use crate::errors::SexprError;
use crate::sexpr::Sexpr;
use nom::branch::alt;
use nom::bytes::complete::{take_till, take_while1};
use nom::character::complete::{char, digit1, multispace1, none_of, one_of};
use nom::combinator::{cut, map, map_res, opt, recognize, value};
use nom::error::{ContextError, ErrorKind, FromExternalError, ParseError};
use nom::multi::{fold_many0, many0_count};
use nom::sequence::{pair, preceded, terminated};
use nom::{IResult, Offset};
use std::fmt;

#[derive(Debug)]
enum Reason {
    Kind(ErrorKind),
    Message(String),
    UnexpectedEnd,
    UnbalancedParen,
}

/// Parsing failure, located by the remaining input.
#[derive(Debug)]
pub(crate) struct ParseFailure<'a> {
    input: &'a str,
    reason: Reason,
}

impl<'a> ParseFailure<'a> {
    fn new(input: &'a str, reason: Reason) -> Self {
        Self { input, reason }
    }

    pub(crate) fn into_error(self, source: &str) -> SexprError {
        let offset = source.offset(self.input);
        let line = line_at(source, offset);
        match self.reason {
            Reason::UnbalancedParen => SexprError::UnbalancedParen { line },
            _ if self.input.is_empty() => SexprError::UnexpectedEnd { line },
            Reason::UnexpectedEnd => SexprError::UnexpectedEnd { line },
            Reason::Message(message) => SexprError::Parse { line, message },
            Reason::Kind(kind) => {
                let found = self.input.chars().next().unwrap_or_default();
                SexprError::Parse {
                    line,
                    message: format!("unexpected character {found:?} ({kind:?})"),
                }
            }
        }
    }
}

impl<'a> ParseError<&'a str> for ParseFailure<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self::new(input, Reason::Kind(kind))
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a> ContextError<&'a str> for ParseFailure<'a> {
    fn add_context(_: &'a str, ctx: &'static str, mut other: Self) -> Self {
        if let Reason::Kind(_) = other.reason {
            other.reason = Reason::Message(format!("invalid {ctx}"));
        }
        other
    }
}

impl<'a, E: fmt::Display> FromExternalError<&'a str, E> for ParseFailure<'a> {
    fn from_external_error(input: &'a str, _: ErrorKind, e: E) -> Self {
        Self::new(input, Reason::Message(format!("invalid integer literal: {e}")))
    }
}

type PResult<'a, T> = IResult<&'a str, T, ParseFailure<'a>>;

/// Deepest list nesting accepted by the reader.
pub const MAX_DEPTH: usize = 1024;

/// 1-based line number of a byte offset.
pub(crate) fn line_at(source: &str, offset: usize) -> usize {
    1 + source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
}

fn comment(input: &str) -> PResult<&str> {
    recognize(pair(char(';'), take_till(|c: char| c == '\n')))(input)
}

/// Skips whitespaces and comments.
pub(crate) fn skip(input: &str) -> PResult<()> {
    value((), many0_count(alt((multispace1, comment))))(input)
}

fn int(input: &str) -> PResult<i32> {
    preceded(
        char('#'),
        cut(nom::error::context(
            "integer literal",
            map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i32>),
        )),
    )(input)
}

fn string(input: &str) -> PResult<String> {
    let string_char = alt((preceded(char('\\'), one_of("\\\"")), none_of("\\\"")));
    preceded(
        char('"'),
        cut(nom::error::context(
            "string literal",
            terminated(
                fold_many0(string_char, String::new, |mut s, c| {
                    s.push(c);
                    s
                }),
                char('"'),
            ),
        )),
    )(input)
}

fn symbol(input: &str) -> PResult<&str> {
    take_while1(|c: char| !c.is_whitespace() && !"()\"#;".contains(c))(input)
}

fn atom(input: &str) -> PResult<Sexpr> {
    alt((
        map(int, Sexpr::Int),
        map(string, Sexpr::Str),
        map(symbol, |name: &str| Sexpr::Symbol(name.to_string())),
    ))(input)
}

/// Parses one expression. Lists are built on an explicit stack of open
/// lists, innermost last.
fn sexpr(input: &str) -> PResult<Sexpr> {
    let mut open: Vec<Vec<Sexpr>> = Vec::new();
    let mut input = input;
    loop {
        let mut done = match input.strip_prefix('(') {
            Some(rest) => {
                if open.len() >= MAX_DEPTH {
                    return Err(nom::Err::Failure(ParseFailure::new(
                        input,
                        Reason::Message(format!("lists nested deeper than {MAX_DEPTH} levels")),
                    )));
                }
                open.push(Vec::new());
                input = rest;
                None
            }
            None => {
                let (rest, atom) = atom(input)?;
                input = rest;
                Some(atom)
            }
        };
        loop {
            if let Some(expr) = done.take() {
                match open.last_mut() {
                    Some(items) => items.push(expr),
                    None => return Ok((input, expr)),
                }
            }
            let (rest, _) = skip(input)?;
            if rest.is_empty() {
                return Err(nom::Err::Failure(ParseFailure::new(rest, Reason::UnexpectedEnd)));
            }
            match rest.strip_prefix(')') {
                Some(after) => {
                    input = after;
                    done = open.pop().map(Sexpr::List);
                }
                None => {
                    input = rest;
                    break;
                }
            }
        }
    }
}

/// Parses the next expression after whitespaces and comments; `None` at end
/// of input.
pub(crate) fn next_sexpr(input: &str) -> PResult<Option<Sexpr>> {
    let (input, _) = skip(input)?;
    if input.is_empty() {
        return Ok((input, None));
    }
    if input.starts_with(')') {
        return Err(nom::Err::Failure(ParseFailure::new(input, Reason::UnbalancedParen)));
    }
    map(sexpr, Some)(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::Finish;

    fn parse_one(source: &str) -> Result<Option<Sexpr>, SexprError> {
        next_sexpr(source)
            .finish()
            .map(|(_, expr)| expr)
            .map_err(|failure| failure.into_error(source))
    }

    #[test]
    fn atoms() {
        assert_eq!(parse_one("foo"), Ok(Some(Sexpr::symbol("foo"))));
        assert_eq!(parse_one("  #-42 "), Ok(Some(Sexpr::Int(-42))));
        assert_eq!(parse_one(r#""a\"b\\""#), Ok(Some(Sexpr::string("a\"b\\"))));
        assert_eq!(parse_one("; only a comment\n  "), Ok(None));
    }

    #[test]
    fn lists() {
        assert_eq!(
            parse_one("(a (b #1) ; comment\n ())"),
            Ok(Some(Sexpr::list([
                Sexpr::symbol("a"),
                Sexpr::list([Sexpr::symbol("b"), Sexpr::Int(1)]),
                Sexpr::nil(),
            ])))
        );
    }

    #[test]
    fn errors() {
        assert_eq!(
            parse_one("(a\n(b"),
            Err(SexprError::UnexpectedEnd { line: 2 })
        );
        assert_eq!(parse_one("\n\n)"), Err(SexprError::UnbalancedParen { line: 3 }));
        assert!(matches!(
            parse_one("\n#99999999999"),
            Err(SexprError::Parse { line: 2, .. })
        ));
        assert!(matches!(parse_one("#x"), Err(SexprError::Parse { line: 1, .. })));
        assert!(matches!(
            parse_one(r#""bad \n escape""#),
            Err(SexprError::Parse { line: 1, .. })
        ));
        assert_eq!(parse_one("\"open"), Err(SexprError::UnexpectedEnd { line: 1 }));
    }

    #[test]
    fn nesting_limit() {
        let at_limit = format!("{}{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(matches!(parse_one(&at_limit), Ok(Some(Sexpr::List(_)))));

        let source = format!("{}{}", "(".repeat(5_000), ")".repeat(5_000));
        match parse_one(&source) {
            Err(SexprError::Parse { line: 1, message }) => assert!(message.contains("nested")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn line_numbers() {
        assert_eq!(line_at("a\nb\nc", 0), 1);
        assert_eq!(line_at("a\nb\nc", 2), 2);
        assert_eq!(line_at("a\nb\nc", 5), 3);
    }
}

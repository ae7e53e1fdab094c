use parcel::parsers::character::{alphabetic, digit, expect_character};
use parcel::prelude::v1::*;

use super::ast::{Ast, RepeatKind};

/// The maximum number of groups that may be open at once.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrKind {
    /// A group is never closed, i.e. `(ab`, or is closed without being
    /// opened, i.e. `ab)`.
    UnmatchedParenthesis,
    /// A group with no contents, i.e. `()`.
    EmptyExpression,
    /// An alternation or quantifier with nothing to apply to, i.e. `|a`,
    /// `+` or `a++`.
    NoLeftExpression,
    InvalidCharacter(char),
    /// A group opened beyond [MAX_NESTING_DEPTH] levels deep.
    NestingTooDeep,
}

impl std::fmt::Display for ParseErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmatchedParenthesis => write!(f, "unmatched parenthesis"),
            Self::EmptyExpression => write!(f, "empty expression"),
            Self::NoLeftExpression => write!(f, "no left expression"),
            Self::InvalidCharacter(c) => write!(f, "invalid character '{}'", c),
            Self::NestingTooDeep => write!(
                f,
                "groups nested deeper than {} levels",
                MAX_NESTING_DEPTH
            ),
        }
    }
}

/// A syntax error, carrying the character column of the offending input.
///
/// The `Display` representation renders a diagnostic pointing at that
/// column:
///
/// ```
/// use tiny_regex_compiler::parse;
///
/// let err = parse("a.b").unwrap_err();
/// assert_eq!("error: invalid character '.'\na.b\n ^", err.to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErr {
    kind: ParseErrKind,
    position: usize,
    pattern: String,
}

impl ParseErr {
    pub fn new(kind: ParseErrKind, position: usize, pattern: &str) -> Self {
        Self {
            kind,
            position,
            pattern: pattern.to_string(),
        }
    }

    pub fn kind(&self) -> &ParseErrKind {
        &self.kind
    }

    /// The zero-based character column the error occurred at.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "error: {}\n{}\n{:position$}^",
            self.kind,
            self.pattern,
            "",
            position = self.position
        )
    }
}

impl std::error::Error for ParseErr {}

/// Parses a pattern into its abstract syntax tree. The outermost expression
/// is terminated by an [Ast::EndMarker].
///
/// # Example
///
/// ```
/// use tiny_regex_compiler::ast::{Ast, RepeatKind};
/// use tiny_regex_compiler::parse;
///
/// assert_eq!(
///     Ok(Ast::Concat(vec![
///         Ast::Literal('a'),
///         Ast::repeat(RepeatKind::Optional, Ast::Literal('b')),
///         Ast::EndMarker,
///     ])),
///     parse("ab?")
/// );
/// ```
pub fn parse(pattern: &str) -> Result<Ast, ParseErr> {
    let input = pattern.chars().enumerate().collect::<Vec<_>>();
    let mut parser = PatternParser {
        pattern,
        input: &input,
        cursor: 0,
    };

    parser.expression(0).map_err(|err| {
        log::debug!("failed to parse pattern {:?}: {}", pattern, err.kind);
        err
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    OpenGroup,
    CloseGroup,
    Alternation,
    Quantifier(RepeatKind),
}

/// A recursive descent parser over a cursor into the enumerated pattern.
struct PatternParser<'a> {
    pattern: &'a str,
    input: &'a [(usize, char)],
    cursor: usize,
}

impl<'a> PatternParser<'a> {
    fn error(&self, kind: ParseErrKind, position: usize) -> ParseErr {
        ParseErr::new(kind, position, self.pattern)
    }

    /// Consumes the next token, returning it along with the position it
    /// started at, or `None` at the end of input.
    fn next_token(&mut self) -> Result<Option<(usize, Token)>, ParseErr> {
        let input = self.input;
        let remaining = &input[self.cursor..];
        let (position, next) = match remaining.first() {
            Some(&(position, next)) => (position, next),
            None => return Ok(None),
        };

        match token().parse(remaining) {
            Ok(MatchStatus::Match {
                remainder, inner, ..
            }) => {
                self.cursor = input.len() - remainder.len();
                Ok(Some((position, inner)))
            }
            // a single character either forms a token or it doesn't.
            Ok(MatchStatus::NoMatch(_)) | Err(_) => {
                Err(self.error(ParseErrKind::InvalidCharacter(next), position))
            }
        }
    }

    /// Parses an expression up to the end of input or, when `depth` is
    /// non-zero, up to and including the closing parenthesis of the
    /// enclosing group.
    ///
    /// The alternatives of a level are gathered in order and folded into a
    /// right-nested chain once the level ends, so only groups recurse.
    fn expression(&mut self, depth: usize) -> Result<Ast, ParseErr> {
        let in_group = depth > 0;
        let mut alternatives: Vec<Ast> = vec![];
        let mut items: Vec<Ast> = vec![];
        // a quantifier can't apply to an already quantified item.
        let mut quantified = false;

        let last = loop {
            let (position, token) = match self.next_token()? {
                Some(next) => next,
                None if in_group => {
                    return Err(self.error(ParseErrKind::UnmatchedParenthesis, self.input.len()))
                }
                None => {
                    items.push(Ast::EndMarker);
                    break Ast::Concat(items);
                }
            };

            match token {
                Token::Literal(c) => {
                    items.push(Ast::Literal(c));
                    quantified = false;
                }
                Token::OpenGroup if depth >= MAX_NESTING_DEPTH => {
                    return Err(self.error(ParseErrKind::NestingTooDeep, position))
                }
                Token::OpenGroup => {
                    let group = self.expression(depth + 1)?;
                    items.push(group);
                    quantified = false;
                }
                Token::CloseGroup if !in_group => {
                    return Err(self.error(ParseErrKind::UnmatchedParenthesis, position))
                }
                Token::CloseGroup if items.is_empty() => {
                    return Err(self.error(ParseErrKind::EmptyExpression, position))
                }
                Token::CloseGroup => break Ast::Concat(items),
                Token::Alternation if items.is_empty() => {
                    return Err(self.error(ParseErrKind::NoLeftExpression, position))
                }
                Token::Alternation => {
                    alternatives.push(Ast::Concat(std::mem::take(&mut items)));
                    quantified = false;
                }
                Token::Quantifier(kind) => match items.pop() {
                    Some(operand) if !quantified => {
                        items.push(Ast::repeat(kind, operand));
                        quantified = true;
                    }
                    _ => return Err(self.error(ParseErrKind::NoLeftExpression, position)),
                },
            }
        };

        Ok(alternatives
            .into_iter()
            .rev()
            .fold(last, |right, left| Ast::alternation(left, right)))
    }
}

fn token<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Token> {
    parcel::or(literal().map(Token::Literal), || {
        parcel::or(expect_character('(').map(|_| Token::OpenGroup), || {
            parcel::or(expect_character(')').map(|_| Token::CloseGroup), || {
                parcel::or(expect_character('|').map(|_| Token::Alternation), || {
                    quantifier().map(Token::Quantifier)
                })
            })
        })
    })
}

// Terminals

fn literal<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], char> {
    parcel::or(alphabetic().predicate(|c| c.is_ascii_alphabetic()), || {
        digit(10)
    })
}

// Quantifiers

fn quantifier<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], RepeatKind> {
    parcel::or(zero_or_more_quantifier(), || {
        parcel::or(one_or_more_quantifier(), || zero_or_one_quantifier())
    })
}

fn zero_or_more_quantifier<'a>() -> impl Parser<'a, &'a [(usize, char)], RepeatKind> {
    expect_character('*').map(|_| RepeatKind::Star)
}

fn one_or_more_quantifier<'a>() -> impl Parser<'a, &'a [(usize, char)], RepeatKind> {
    expect_character('+').map(|_| RepeatKind::Plus)
}

fn zero_or_one_quantifier<'a>() -> impl Parser<'a, &'a [(usize, char)], RepeatKind> {
    expect_character('?').map(|_| RepeatKind::Optional)
}

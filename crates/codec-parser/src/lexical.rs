//! Character-level parsing primitives.
//!
//! There is no separate tokenization pass: the grammar productions in
//! [`parser`](super::parser) are built directly on these combinators, which
//! operate on the located character stream.
//!
//! Identifiers come in two disjoint classes. PascalCase names
//! (`[A-Z][A-Za-z0-9]*`) denote types, traits, entities, services and views;
//! snake_case names (`[a-z][a-z0-9_]*`) denote fields, parameters and
//! variables. Both must end at a word boundary, so a production expecting one
//! class rejects the other instead of consuming a prefix of it.

use winnow::{
    Parser,
    ascii::{digit1, multispace1},
    combinator::{alt, cut_err, not, opt, repeat, terminated},
    error::{ContextError, ErrMode},
    stream::{LocatingSlice, Location},
    token::{literal, none_of, one_of, take_till, take_while},
};

use codec_core::primitive::PrimitiveType;

use crate::{
    error::ErrorCode,
    span::{Span, Spanned},
};

pub(crate) type Input<'src> = LocatingSlice<&'src str>;
pub(crate) type Error = ErrMode<ContextError<Context>>;
pub(crate) type IResult<O> = Result<O, Error>;

/// Context attached to winnow errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// A lexical error with its own code and help text
    Lexical(LexicalError),
}

/// Rich information for errors inside string literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexicalError {
    pub code: ErrorCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Wrap a parser's output with the span it consumed.
pub(crate) fn spanned<'src, O, P>(parser: P) -> impl Parser<Input<'src>, Spanned<O>, Error>
where
    P: Parser<Input<'src>, O, Error>,
{
    parser
        .with_span()
        .map(|(value, range)| Spanned::new(value, Span::new(range)))
}

/// Succeeds without consuming if the next character cannot continue a word.
pub(crate) fn word_boundary(input: &mut Input<'_>) -> IResult<()> {
    not(one_of(is_word_char)).parse_next(input)
}

/// Parse line comment starting with '//'
fn line_comment(input: &mut Input<'_>) -> IResult<()> {
    ("//", take_till(0.., '\n')).void().parse_next(input)
}

fn ws_comment(input: &mut Input<'_>) -> IResult<()> {
    alt((multispace1.void(), line_comment)).parse_next(input)
}

/// Parse zero or more whitespace/comments
pub(crate) fn ws0(input: &mut Input<'_>) -> IResult<()> {
    repeat(0.., ws_comment).parse_next(input)
}

/// Parse one or more whitespace/comments
pub(crate) fn ws1(input: &mut Input<'_>) -> IResult<()> {
    repeat(1.., ws_comment)
        .context(Context::Label("whitespace"))
        .parse_next(input)
}

/// Parse a keyword with word boundary checking.
///
/// `entity` matches in `entity Person` but not in `entityPerson` or
/// `entity_id`.
pub(crate) fn keyword<'src>(word: &'static str) -> impl Parser<Input<'src>, (), Error> {
    terminated(literal(word), word_boundary).void()
}

/// Parse a PascalCase identifier: `Person`, `LegalEntity2`.
pub(crate) fn pascal_identifier(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    spanned(
        terminated(
            (
                one_of(|c: char| c.is_ascii_uppercase()),
                take_while(0.., |c: char| c.is_ascii_alphanumeric()),
            )
                .take(),
            word_boundary,
        )
        .map(|name: &str| name.to_string()),
    )
    .context(Context::Label("PascalCase name"))
    .parse_next(input)
}

/// Parse the PascalCase name of a declaration.
///
/// Primitive type names are reserved: a declaration named `String` could
/// never be referenced.
pub(crate) fn declaration_name(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    pascal_identifier
        .verify(|name: &Spanned<String>| PrimitiveType::from_name(name).is_none())
        .context(Context::Label("a name that is not a primitive type"))
        .parse_next(input)
}

/// Parse a snake_case identifier: `name`, `birth_date`, `line2`.
pub(crate) fn snake_identifier(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    spanned(
        terminated(
            (
                one_of(|c: char| c.is_ascii_lowercase()),
                take_while(0.., |c: char| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
                }),
            )
                .take(),
            word_boundary,
        )
        .map(|name: &str| name.to_string()),
    )
    .context(Context::Label("snake_case name"))
    .parse_next(input)
}

/// Parse an escape sequence after a backslash.
fn escape_sequence(input: &mut Input<'_>) -> IResult<char> {
    let start = input.current_token_start();
    '\\'.parse_next(input)?;

    cut_err(one_of(['"', '\\', 'n', 't', 'r']).map(|c| match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }))
    .context(Context::Lexical(LexicalError {
        code: ErrorCode::E002,
        message: "invalid escape sequence",
        help: Some("valid escapes: `\\\"`, `\\\\`, `\\n`, `\\t`, `\\r`"),
        start,
    }))
    .parse_next(input)
}

/// Parse a double-quoted string literal on a single line.
///
/// Commits after the opening quote: an unterminated string or a bad escape
/// is reported as a lexical error rather than backtracked away.
pub(crate) fn string_literal(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    let start = input.current_token_start();
    '"'.context(Context::Label("string literal"))
        .parse_next(input)?;

    let content = cut_err(terminated(
        repeat(
            0..,
            alt((escape_sequence, none_of(['"', '\\', '\n', '\r']))),
        )
        .fold(String::new, |mut acc, c| {
            acc.push(c);
            acc
        }),
        '"',
    ))
    .context(Context::Lexical(LexicalError {
        code: ErrorCode::E001,
        message: "unterminated string literal",
        help: Some("add a closing `\"` before the end of the line"),
        start,
    }))
    .parse_next(input)?;

    let end = input.current_token_start();
    Ok(Spanned::new(content, Span::new(start..end)))
}

/// Parse an optionally negative decimal integer.
pub(crate) fn integer_literal(input: &mut Input<'_>) -> IResult<Spanned<i64>> {
    spanned(
        terminated((opt('-'), digit1).take(), word_boundary)
            .try_map(|digits: &str| digits.parse::<i64>()),
    )
    .context(Context::Label("integer"))
    .parse_next(input)
}

/// Parse opaque text up to (not including) an opening brace.
///
/// Used for `if` conditions and `for` collection expressions, which the
/// compiler passes through without interpreting. The text may not span
/// lines and is trimmed.
pub(crate) fn opaque_text(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    spanned(
        take_till(1.., ['{', '}', ';', '\n'])
            .map(|text: &str| text.trim().to_string())
            .verify(|text: &String| !text.is_empty()),
    )
    .context(Context::Label("expression"))
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<O>(
        parser: impl FnMut(&mut Input<'_>) -> IResult<O>,
        source: &str,
    ) -> Result<(O, &str), Error> {
        let mut input = LocatingSlice::new(source);
        let mut parser = parser;
        let output = parser(&mut input)?;
        Ok((output, *input))
    }

    #[test]
    fn test_pascal_identifier() {
        let (name, rest) = run(pascal_identifier, "Person {").unwrap();
        assert_eq!(name.as_str(), "Person");
        assert_eq!(name.span(), Span::new(0..6));
        assert_eq!(rest, " {");
    }

    #[test]
    fn test_pascal_identifier_rejects_snake_case() {
        assert!(run(pascal_identifier, "person").is_err());
        assert!(run(pascal_identifier, "Snake_Case").is_err());
    }

    #[test]
    fn test_snake_identifier() {
        let (name, rest) = run(snake_identifier, "birth_date: Date").unwrap();
        assert_eq!(name.as_str(), "birth_date");
        assert_eq!(rest, ": Date");
    }

    #[test]
    fn test_snake_identifier_rejects_other_classes() {
        assert!(run(snake_identifier, "Name").is_err());
        assert!(run(snake_identifier, "camelCase").is_err());
        assert!(run(snake_identifier, "_private").is_err());
    }

    #[test]
    fn test_keyword_word_boundary() {
        assert!(run(|i: &mut Input<'_>| keyword("entity").parse_next(i), "entity Person").is_ok());
        assert!(run(|i: &mut Input<'_>| keyword("entity").parse_next(i), "entityPerson").is_err());
        assert!(run(|i: &mut Input<'_>| keyword("entity").parse_next(i), "entity_id").is_err());
    }

    #[test]
    fn test_ws_skips_comments() {
        let (_, rest) = run(ws0, "  // a comment\n\t // another\n  entity").unwrap();
        assert_eq!(rest, "entity");
    }

    #[test]
    fn test_ws1_requires_whitespace() {
        assert!(run(ws1, "entity").is_err());
        assert!(run(ws1, " entity").is_ok());
    }

    #[test]
    fn test_string_literal_with_escapes() {
        let (value, rest) = run(string_literal, r#""a\"b\\c\n" tail"#).unwrap();
        assert_eq!(value.as_str(), "a\"b\\c\n");
        assert_eq!(rest, " tail");
    }

    #[test]
    fn test_string_literal_unterminated_is_cut() {
        let err = run(string_literal, "\"abc\nnext").unwrap_err();
        let ErrMode::Cut(err) = err else {
            panic!("expected a cut error");
        };
        assert!(err.context().any(|ctx| matches!(
            ctx,
            Context::Lexical(LexicalError {
                code: ErrorCode::E001,
                ..
            })
        )));
    }

    #[test]
    fn test_string_literal_invalid_escape() {
        let err = run(string_literal, r#""\q""#).unwrap_err();
        let ErrMode::Cut(err) = err else {
            panic!("expected a cut error");
        };
        let first_lexical = err.context().find_map(|ctx| match ctx {
            Context::Lexical(lexical) => Some(lexical.code),
            Context::Label(_) => None,
        });
        assert_eq!(first_lexical, Some(ErrorCode::E002));
    }

    #[test]
    fn test_integer_literal() {
        assert_eq!(*run(integer_literal, "42)").unwrap().0.inner(), 42);
        assert_eq!(*run(integer_literal, "-7").unwrap().0.inner(), -7);
        assert!(run(integer_literal, "12ab").is_err());
        assert!(run(integer_literal, "99999999999999999999").is_err());
    }

    #[test]
    fn test_opaque_text_is_trimmed() {
        let (text, rest) = run(opaque_text, "person.age > 18 {").unwrap();
        assert_eq!(text.as_str(), "person.age > 18");
        assert_eq!(rest, "{");
        assert!(run(opaque_text, "   {").is_err());
    }
}

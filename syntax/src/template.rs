use combine::parser::char::char;
use combine::parser::range::take_while1;
use combine::{between, eof, many, EasyParser, Parser};

use crate::ast::{Placeholder, Segment};
use crate::parse::{Error, Input};

/// Parse a filename template into literal and placeholder segments.
/// The whole string must be consumed.
pub fn parse_template(text: &str) -> Result<Vec<Segment<'_>>, Error> {
    many::<Vec<_>, _, _>(segment())
        .skip(eof())
        .easy_parse(text)
        .map(|(segments, _)| segments)
        .map_err(|e| Error::from_easy(e, text))
}

fn segment<'a>() -> impl Parser<Input<'a>, Output = Segment<'a>> {
    placeholder()
        .map(Segment::Placeholder)
        .or(literal().map(Segment::Literal))
}

fn literal<'a>() -> impl Parser<Input<'a>, Output = &'a str> {
    take_while1(|c: char| c != '{')
}

fn name<'a>() -> impl Parser<Input<'a>, Output = &'a str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')
}

// key=value, where value runs until the next '?' or the closing brace
fn option<'a>() -> impl Parser<Input<'a>, Output = (&'a str, &'a str)> {
    (name(), char('='), take_while1(|c: char| c != '?' && c != '}'))
        .map(|(k, _, v)| (k, v))
}

fn placeholder<'a>() -> impl Parser<Input<'a>, Output = Placeholder<'a>> {
    between(
        char('{'),
        char('}'),
        (name(), many::<Vec<_>, _, _>(char('?').with(option()))),
    )
    .map(|(name, options)| Placeholder { name, options })
}

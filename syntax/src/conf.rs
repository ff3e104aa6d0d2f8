use combine::parser::char::char;
use combine::parser::range::{take_while, take_while1};
use combine::{between, eof, many, satisfy, skip_many, EasyParser, Parser};

use crate::ast::{Entry, Section};
use crate::parse::{Error, Input};

/// Parse a run-config file:
///
/// ```text
/// # comment
/// [section.name]
/// key = value
/// ```
///
/// Comments take a whole line. Every entry must belong to a section.
pub fn parse_conf(text: &str) -> Result<Vec<Section<'_>>, Error> {
    junk()
        .with(many::<Vec<_>, _, _>(section()))
        .skip(eof())
        .easy_parse(text)
        .map(|(sections, _)| sections)
        .map_err(|e| Error::from_easy(e, text))
}

fn inline_whitespace<'a>() -> impl Parser<Input<'a>, Output = ()> {
    skip_many(satisfy(|c: char| c == ' ' || c == '\t'))
}

fn comment<'a>() -> impl Parser<Input<'a>, Output = ()> {
    char('#')
        .with(take_while(|c: char| c != '\n'))
        .map(|_| ())
}

// whitespace (incl. newlines) and comments; every branch consumes input.
fn junk<'a>() -> impl Parser<Input<'a>, Output = ()> {
    skip_many(satisfy(|c: char| c.is_whitespace()).map(|_| ()).or(comment()))
}

fn section_name<'a>() -> impl Parser<Input<'a>, Output = &'a str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
}

fn key<'a>() -> impl Parser<Input<'a>, Output = &'a str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

fn value<'a>() -> impl Parser<Input<'a>, Output = &'a str> {
    take_while(|c: char| c != '\n').map(str::trim)
}

fn entry<'a>() -> impl Parser<Input<'a>, Output = Entry<'a>> {
    (key(), inline_whitespace(), char('='), inline_whitespace(), value())
        .map(|(key, _, _, _, value)| Entry { key, value })
        .skip(junk())
}

fn section<'a>() -> impl Parser<Input<'a>, Output = Section<'a>> {
    (
        between(char('['), char(']'), section_name()).skip(junk()),
        many::<Vec<_>, _, _>(entry()),
    )
        .map(|(name, entries)| Section { name, entries })
}

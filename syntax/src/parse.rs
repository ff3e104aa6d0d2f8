use combine::easy;
use combine::stream::PointerOffset;

/// Input type for every parser in this crate.
pub type Input<'a> = easy::Stream<&'a str>;

#[derive(Debug, thiserror::Error)]
#[error("ParseError on line '{line}': {msg}")]
pub struct Error {
    pub msg: String,
    pub pos: usize,
    pub line: String,
}

impl Error {
    /// Since converting combine's errors is a lifetime nightmare,
    /// we just stringify the error and isolate the offending line.
    pub(crate) fn from_easy(
        e: easy::Errors<char, &str, PointerOffset<str>>,
        text: &str,
    ) -> Self {
        let pos = e.position.translate_position(text);
        let before = &text[0..pos];
        let after = &text[pos..];
        let prefix: String = before.chars().rev().take_while(|&c| c != '\n').collect();
        let prefix: String = prefix.chars().rev().collect();
        let suffix: String = after.chars().take_while(|&c| c != '\n').collect();
        Self {
            pos,
            line: prefix + &suffix,
            msg: format!("{}", e),
        }
    }
}

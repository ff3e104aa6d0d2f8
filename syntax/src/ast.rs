/// One piece of a filename template.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Segment<'a> {
    /// text copied through as-is (may contain `*` and `?` wildcards)
    Literal(&'a str),
    /// `{name}` or `{name?key=value?key=value}`
    Placeholder(Placeholder<'a>),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Placeholder<'a> {
    pub name: &'a str,
    pub options: Vec<(&'a str, &'a str)>,
}

impl<'a> Placeholder<'a> {
    /// Value of the option named `key`, if present.
    pub fn option(&self, key: &str) -> Option<&'a str> {
        self.options.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }
}

/// A `[name]` header and the `key = value` lines under it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Section<'a> {
    pub name: &'a str,
    pub entries: Vec<Entry<'a>>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Entry<'a> {
    pub key: &'a str,
    /// rest of the line after `=`, trimmed; may be empty.
    pub value: &'a str,
}

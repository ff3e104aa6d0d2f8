use chrono::{Datelike, NaiveDate, Timelike};
use regex::Regex;

use super::{Error, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Literal(String),
    /// %Y
    Year,
    /// %y
    Year2,
    /// %m
    Month,
    /// %d
    Day,
    /// %j
    DayOfYear,
    /// %H
    Hour,
    /// %M
    Minute,
    /// %S
    Second,
}

impl Item {
    fn width(&self) -> usize {
        match self {
            Self::Literal(_) => 0,
            Self::Year => 4,
            Self::DayOfYear => 3,
            _ => 2,
        }
    }
}

/// A strftime-style format for init and valid times.
///
/// Only fixed-width numeric directives are supported, so every format can be
/// turned back into a regular expression that recovers the time it rendered.
#[derive(Debug, Clone)]
pub struct DateFormat {
    source: String,
    items: Vec<Item>,
    matcher: Regex,
}

impl DateFormat {
    pub fn parse(fmt: &str) -> Result<Self, Error> {
        let mut items = Vec::with_capacity(8);
        let mut literal = String::new();
        let mut chars = fmt.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let item = match chars.next() {
                Some('%') => {
                    literal.push('%');
                    continue;
                }
                Some('Y') => Item::Year,
                Some('y') => Item::Year2,
                Some('m') => Item::Month,
                Some('d') => Item::Day,
                Some('j') => Item::DayOfYear,
                Some('H') => Item::Hour,
                Some('M') => Item::Minute,
                Some('S') => Item::Second,
                Some(other) => return Err(Error::InvalidDirective(fmt.to_owned(), other)),
                None => return Err(Error::DanglingPercent(fmt.to_owned())),
            };
            if !literal.is_empty() {
                items.push(Item::Literal(std::mem::take(&mut literal)));
            }
            items.push(item);
        }
        if !literal.is_empty() {
            items.push(Item::Literal(literal));
        }

        let mut re = String::from("^");
        for item in &items {
            match item {
                Item::Literal(s) => re.push_str(&regex::escape(s)),
                other => re.push_str(&format!(r"(\d{{{}}})", other.width())),
            }
        }
        re.push('$');
        let matcher = Regex::new(&re).map_err(|e| Error::Pattern(fmt.to_owned(), e))?;

        Ok(Self {
            source: fmt.to_owned(),
            items,
            matcher,
        })
    }

    /// The format string this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render(&self, t: &Timestamp) -> String {
        let mut out = String::with_capacity(self.source.len() + 8);
        for item in &self.items {
            match item {
                Item::Literal(s) => out.push_str(s),
                Item::Year => out.push_str(&format!("{:04}", t.year())),
                Item::Year2 => out.push_str(&format!("{:02}", t.year().rem_euclid(100))),
                Item::Month => out.push_str(&format!("{:02}", t.month())),
                Item::Day => out.push_str(&format!("{:02}", t.day())),
                Item::DayOfYear => out.push_str(&format!("{:03}", t.ordinal())),
                Item::Hour => out.push_str(&format!("{:02}", t.hour())),
                Item::Minute => out.push_str(&format!("{:02}", t.minute())),
                Item::Second => out.push_str(&format!("{:02}", t.second())),
            }
        }
        out
    }

    /// Regex source matching anything `render` can produce, without capture groups.
    pub fn regex_source(&self) -> String {
        let mut re = String::with_capacity(self.source.len() * 4);
        for item in &self.items {
            match item {
                Item::Literal(s) => re.push_str(&regex::escape(s)),
                other => re.push_str(&format!(r"\d{{{}}}", other.width())),
            }
        }
        re
    }

    /// Recover a time from text produced by `render`.
    /// Missing fields default to the start of their period; a year is required.
    pub fn parse_value(&self, text: &str) -> Result<Timestamp, Error> {
        let fields = self.parse_fields(text)?;
        self.finish(&fields, text)
    }

    /// Recover the individual fields in `text` without requiring a complete date.
    /// Used when one time is spread over several placeholders, e.g. a `%Y%m%d`
    /// directory holding `%H`-stamped files.
    pub fn parse_fields(&self, text: &str) -> Result<DateFields, Error> {
        let no_match = || Error::NoMatch(text.to_owned(), self.source.clone());
        let caps = self.matcher.captures(text).ok_or_else(no_match)?;

        let mut fields = DateFields::default();
        let numeric = self.items.iter().filter(|i| !matches!(i, Item::Literal(_)));
        for (idx, item) in numeric.enumerate() {
            let digits = caps.get(idx + 1).ok_or_else(no_match)?.as_str();
            let n: u32 = digits.parse().map_err(|_| no_match())?;
            let n = match item {
                // POSIX pivot: 69-99 => 19xx, 00-68 => 20xx
                Item::Year2 if n >= 69 => 1900 + n,
                Item::Year2 => 2000 + n,
                _ => n,
            };
            let slot = match item {
                Item::Year | Item::Year2 => &mut fields.year,
                Item::Month => &mut fields.month,
                Item::Day => &mut fields.day,
                Item::DayOfYear => &mut fields.ordinal,
                Item::Hour => &mut fields.hour,
                Item::Minute => &mut fields.minute,
                Item::Second => &mut fields.second,
                Item::Literal(_) => unreachable!(),
            };
            if !set_once(slot, n) {
                return Err(no_match());
            }
        }
        Ok(fields)
    }

    /// Build a timestamp from fields recovered by `parse_fields`.
    pub fn finish(&self, fields: &DateFields, text: &str) -> Result<Timestamp, Error> {
        fields.to_timestamp().ok_or_else(|| match fields.year {
            None => Error::Incomplete(self.source.clone()),
            Some(_) => Error::InvalidTimestamp(text.to_owned()),
        })
    }
}

impl PartialEq for DateFormat {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for DateFormat {}

/// Date fields recovered from text, any of which may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFields {
    year: Option<u32>,
    month: Option<u32>,
    day: Option<u32>,
    ordinal: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
}

impl DateFields {
    /// Fold `other` into `self`. Returns false if both set a field to different values.
    pub fn merge(&mut self, other: &DateFields) -> bool {
        let pairs = [
            (&mut self.year, other.year),
            (&mut self.month, other.month),
            (&mut self.day, other.day),
            (&mut self.ordinal, other.ordinal),
            (&mut self.hour, other.hour),
            (&mut self.minute, other.minute),
            (&mut self.second, other.second),
        ];
        pairs
            .into_iter()
            .all(|(slot, value)| value.map_or(true, |v| set_once(slot, v)))
    }

    /// The time these fields describe, if they name a year and form a real date.
    pub fn to_timestamp(&self) -> Option<Timestamp> {
        let year = self.year? as i32;
        let date = match self.ordinal {
            Some(ord) => NaiveDate::from_yo_opt(year, ord)?,
            None => NaiveDate::from_ymd_opt(year, self.month.unwrap_or(1), self.day.unwrap_or(1))?,
        };
        date.and_hms_opt(
            self.hour.unwrap_or(0),
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
        )
    }
}

fn set_once(slot: &mut Option<u32>, value: u32) -> bool {
    match *slot {
        Some(prev) => prev == value,
        None => {
            *slot = Some(value);
            true
        }
    }
}

use regex::Regex;

use super::{Error, Lead, MAX_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    /// %H: total hours
    Hours,
    /// %M: minutes within the hour
    Minutes,
    /// %S: seconds within the minute
    Seconds,
    /// %s: total seconds
    TotalSeconds,
}

impl Unit {
    fn default_width(self) -> usize {
        match self {
            Self::TotalSeconds => 1,
            _ => 2,
        }
    }

    fn is_total(self) -> bool {
        matches!(self, Self::Hours | Self::TotalSeconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Literal(String),
    Num(Unit, usize),
}

/// A format for leads, e.g. `%3H` renders a 6 hour lead as `006`.
/// An optional width between `%` and the directive sets the zero padding.
#[derive(Debug, Clone)]
pub struct LeadFormat {
    source: String,
    items: Vec<Item>,
    matcher: Regex,
}

impl LeadFormat {
    pub fn parse(fmt: &str) -> Result<Self, Error> {
        let mut items = Vec::with_capacity(4);
        let mut literal = String::new();
        let mut chars = fmt.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }

            let mut width: Option<usize> = None;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                chars.next();
                let w = width.unwrap_or(0) * 10 + d as usize;
                if w > MAX_WIDTH {
                    return Err(Error::WidthTooLarge(fmt.to_owned()));
                }
                width = Some(w);
            }
            let unit = match chars.next() {
                Some('H') => Unit::Hours,
                Some('M') => Unit::Minutes,
                Some('S') => Unit::Seconds,
                Some('s') => Unit::TotalSeconds,
                Some(other) => return Err(Error::InvalidDirective(fmt.to_owned(), other)),
                None => return Err(Error::DanglingPercent(fmt.to_owned())),
            };
            if !literal.is_empty() {
                items.push(Item::Literal(std::mem::take(&mut literal)));
            }
            let width = width.unwrap_or(unit.default_width()).max(1);
            items.push(Item::Num(unit, width));
        }
        if !literal.is_empty() {
            items.push(Item::Literal(literal));
        }

        let matcher = Regex::new(&format!("^{}$", build_regex(&items, true)))
            .map_err(|e| Error::Pattern(fmt.to_owned(), e))?;

        Ok(Self {
            source: fmt.to_owned(),
            items,
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render(&self, lead: &Lead) -> String {
        let secs = lead.seconds();
        let abs = secs.unsigned_abs();
        let sign = if secs < 0 { "-" } else { "" };

        let mut out = String::with_capacity(self.source.len() + 4);
        for item in &self.items {
            match item {
                Item::Literal(s) => out.push_str(s),
                Item::Num(unit, w) => {
                    let w = *w;
                    let s = match unit {
                        Unit::Hours => format!("{sign}{:0w$}", abs / 3600),
                        Unit::Minutes => format!("{:0w$}", abs % 3600 / 60),
                        Unit::Seconds => format!("{:0w$}", abs % 60),
                        Unit::TotalSeconds => format!("{sign}{:0w$}", abs),
                    };
                    out.push_str(&s);
                }
            }
        }
        out
    }

    /// Regex source matching anything `render` can produce, without capture groups.
    pub fn regex_source(&self) -> String {
        build_regex(&self.items, false)
    }

    /// Recover a lead from text produced by `render`.
    pub fn parse_value(&self, text: &str) -> Result<Lead, Error> {
        let no_match = || Error::NoMatch(text.to_owned(), self.source.clone());
        let caps = self.matcher.captures(text).ok_or_else(no_match)?;

        let mut total: Option<i64> = None;
        let mut negative = false;
        let (mut hours, mut minutes, mut seconds) = (None, None, None);

        let numeric = self.items.iter().filter_map(|i| match i {
            Item::Num(unit, _) => Some(*unit),
            Item::Literal(_) => None,
        });
        for (idx, unit) in numeric.enumerate() {
            let digits = caps.get(idx + 1).ok_or_else(no_match)?.as_str();
            let n: i64 = digits.parse().map_err(|_| no_match())?;
            if unit.is_total() && digits.starts_with('-') {
                negative = true;
            }
            let slot = match unit {
                Unit::Hours => &mut hours,
                Unit::Minutes => &mut minutes,
                Unit::Seconds => &mut seconds,
                Unit::TotalSeconds => &mut total,
            };
            match *slot {
                Some(prev) if prev != n => return Err(no_match()),
                _ => *slot = Some(n),
            }
        }

        if let Some(total) = total {
            return Ok(Lead::from_seconds(total));
        }
        if hours.is_none() && minutes.is_none() && seconds.is_none() {
            return Err(Error::Incomplete(self.source.clone()));
        }
        let abs = hours
            .unwrap_or(0)
            .checked_abs()
            .and_then(|h| h.checked_mul(3600))
            .zip(minutes.unwrap_or(0).checked_mul(60))
            .and_then(|(h, m)| h.checked_add(m))
            .and_then(|hm| hm.checked_add(seconds.unwrap_or(0)))
            .ok_or(Error::OutOfRange)?;
        Ok(Lead::from_seconds(if negative { -abs } else { abs }))
    }
}

impl PartialEq for LeadFormat {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for LeadFormat {}

fn build_regex(items: &[Item], capture: bool) -> String {
    let mut re = String::with_capacity(items.len() * 8);
    for item in items {
        match item {
            Item::Literal(s) => re.push_str(&regex::escape(s)),
            Item::Num(unit, w) => {
                let class = if unit.is_total() {
                    format!(r"-?\d{{{w},}}")
                } else if *w <= 2 {
                    format!(r"\d{{{w},2}}")
                } else {
                    format!(r"\d{{{w}}}")
                };
                if capture {
                    re.push('(');
                    re.push_str(&class);
                    re.push(')');
                } else {
                    re.push_str(&class);
                }
            }
        }
    }
    re
}

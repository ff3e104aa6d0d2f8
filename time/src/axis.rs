use std::fmt;

/// A value on one time axis, or a wildcard that matches any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis<T> {
    Any,
    At(T),
}

impl<T> Default for Axis<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl<T> Axis<T> {
    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// The concrete value, if there is one.
    #[inline]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Any => None,
            Self::At(v) => Some(v),
        }
    }

    pub fn map<U, F: FnOnce(&T) -> U>(&self, f: F) -> Axis<U> {
        match self {
            Self::Any => Axis::Any,
            Self::At(v) => Axis::At(f(v)),
        }
    }
}

impl<T: PartialEq> Axis<T> {
    /// Subsetting rule: either side a wildcard, or both concrete and equal.
    #[inline]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::At(a), Self::At(b)) => a == b,
            _ => true,
        }
    }
}

impl<T> From<Option<T>> for Axis<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Self::At(v),
            None => Self::Any,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Axis<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::At(v) => v.fmt(f),
        }
    }
}

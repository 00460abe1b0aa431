//! Cache Key Module
//!
//! Deterministic key construction: `namespace[:part...]`.

use std::collections::BTreeSet;
use std::fmt;

// == Cache Key ==
/// A cache key built from a namespace and normalized arguments.
///
/// Separator characters inside arguments are percent-escaped, so two distinct
/// argument lists never render to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Starts a key in the given namespace.
    pub fn new(namespace: &str) -> Self {
        Self(escape(namespace))
    }

    /// Appends one argument, trimmed and escaped.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.0.push(':');
        self.0.push_str(&escape(value.to_string().trim()));
        self
    }

    /// Appends a set of tags as a single sorted, de-duplicated argument.
    ///
    /// An empty set renders as `all`.
    pub fn set_arg<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: BTreeSet<String> = values
            .into_iter()
            .map(|v| escape(v.as_ref().trim()))
            .filter(|v| !v.is_empty())
            .collect();

        self.0.push(':');
        if normalized.is_empty() {
            self.0.push_str("all");
        } else {
            let joined: Vec<String> = normalized.into_iter().collect();
            self.0.push_str(&joined.join(","));
        }
        self
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            ',' => out.push_str("%2C"),
            _ => out.push(c),
        }
    }
    out
}

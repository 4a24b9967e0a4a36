//! Ordered label sets and their on-disk header encoding
//!
//! A stored object starts with one `key value` line per label, followed by
//! a single NUL byte that separates the header from the body.

use std::fmt;

/// Byte that terminates the label header
pub const HEADER_END: u8 = 0;

/// Ordered key/value labels attached to a stored object.
///
/// Keys are expected to be distinct. When they are not, lookups return the
/// first value stored under the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(Vec<(String, String)>);

impl Labels {
    /// Create an empty label set
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a label
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Value stored under `key`, first match wins
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True if `key` is present with exactly `value`
    pub fn matches(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize to the on-disk header, including the terminating NUL
    pub fn encode(&self) -> Result<Vec<u8>, String> {
        let mut out = Vec::new();
        for (key, value) in &self.0 {
            validate_key(key)?;
            validate_value(key, value)?;
            out.extend_from_slice(key.as_bytes());
            out.push(b' ');
            out.extend_from_slice(value.as_bytes());
            out.push(b'\n');
        }
        out.push(HEADER_END);
        Ok(out)
    }

    /// Parse a header (without its terminating NUL)
    pub fn decode(header: &[u8]) -> Result<Self, String> {
        let text = std::str::from_utf8(header)
            .map_err(|e| format!("label header is not UTF-8: {}", e))?;

        let mut labels = Self::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            labels.push(key, value);
        }
        Ok(labels)
    }
}

fn validate_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("label key is empty".to_string());
    }
    if key.chars().any(|c| c.is_whitespace() || c == '\0') {
        return Err(format!("label key {:?} contains whitespace or NUL", key));
    }
    Ok(())
}

fn validate_value(key: &str, value: &str) -> Result<(), String> {
    if value.contains(['\n', '\r', '\0']) {
        return Err(format!("value for label {:?} contains a line break or NUL", key));
    }
    Ok(())
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

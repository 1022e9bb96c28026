//! Extra request headers from `key=value` arguments.

use crate::error::QueryError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Multi-valued header mapping attached to every outbound request.
///
/// Names keep their first spelling and compare ASCII case-insensitively;
/// values keep insertion order. Nothing is validated here: names or values
/// that HTTP cannot carry are reported when a request is prepared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, Vec<String>)>,
}

/// Build a [`HeaderSet`] from raw arguments.
///
/// Each argument is split on the first `=`; without one the whole argument
/// is the name and the value is empty. Repeated names accumulate values.
pub fn parse_header_args<I, S>(args: I) -> HeaderSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut headers = HeaderSet::new();
    for arg in args {
        let (name, value) = arg.as_ref().split_once('=').unwrap_or((arg.as_ref(), ""));
        headers.add(name, value);
    }
    headers
}

impl HeaderSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append `value` to the values of `name`.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// All values for `name`, empty when absent.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map_or(&[], |(_, values)| values.as_slice())
    }

    /// Names with their values, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every header to `target`.
    pub(crate) fn apply(&self, target: &mut HeaderMap) -> Result<(), QueryError> {
        for (name, values) in self.iter() {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| QueryError::invalid_header(name, e))?;
            for value in values {
                let value = HeaderValue::from_str(value)
                    .map_err(|e| QueryError::invalid_header(name, e))?;
                target.append(header.clone(), value);
            }
        }
        Ok(())
    }
}

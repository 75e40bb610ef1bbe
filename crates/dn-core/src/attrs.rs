//! Ordered attribute map carried by every node.
//!
//! Values are stored as the raw text read from the record table so that a
//! parse → serialize cycle reproduces the input. Numeric access parses on
//! demand through [`crate::numeric::parse_number`].

use crate::CoreResult;
use crate::numeric::parse_number;

/// Insertion-ordered `name -> raw value` map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw value of an attribute, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, keeping the original position when the name already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Numeric value of an attribute.
    ///
    /// Missing and empty values are `Ok(None)`; text that is not a finite
    /// number is an error naming `node` and the attribute.
    pub fn number(&self, node: &str, name: &str) -> CoreResult<Option<f64>> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => parse_number(node, name, raw),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

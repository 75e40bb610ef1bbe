//! Delimited text layouts.

use serde::{Deserialize, Serialize};

use crate::{RecordError, RecordResult};

/// Field separator of a record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Delimiter {
    Char(char),
    /// Runs of spaces/tabs, as in GEOframe topology files.
    Whitespace,
}

impl Delimiter {
    pub(crate) fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Char(c) => line.split(*c).collect(),
            Delimiter::Whitespace => line.split_whitespace().collect(),
        }
    }

    /// Lines carrying no record. Only whitespace mode ignores blank-looking
    /// lines; with a character delimiter `"\t\t"` is a row of empty fields.
    pub(crate) fn is_blank(&self, line: &str) -> bool {
        match self {
            Delimiter::Char(_) => line.is_empty(),
            Delimiter::Whitespace => line.trim().is_empty(),
        }
    }

    /// Separator written between fields.
    pub(crate) fn separator(&self) -> char {
        match self {
            Delimiter::Char(c) => *c,
            Delimiter::Whitespace => ' ',
        }
    }

    /// Whether `value` survives a write/split cycle unchanged.
    pub(crate) fn can_hold(&self, value: &str) -> bool {
        match self {
            Delimiter::Char(c) => !value.contains(*c),
            Delimiter::Whitespace => !value.is_empty() && !value.contains(char::is_whitespace),
        }
    }
}

impl TryFrom<String> for Delimiter {
    type Error = RecordError;

    fn try_from(value: String) -> RecordResult<Self> {
        if value.eq_ignore_ascii_case("whitespace") {
            return Ok(Delimiter::Whitespace);
        }
        if value == "\\t" || value.eq_ignore_ascii_case("tab") {
            return Ok(Delimiter::Char('\t'));
        }
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Delimiter::Char(c)),
            _ => Err(RecordError::InvalidDelimiter { value }),
        }
    }
}

impl From<Delimiter> for String {
    fn from(d: Delimiter) -> Self {
        match d {
            Delimiter::Char('\t') => "tab".to_string(),
            Delimiter::Char(c) => c.to_string(),
            Delimiter::Whitespace => "whitespace".to_string(),
        }
    }
}

/// Layout of a record table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFormat {
    pub delimiter: Delimiter,
    /// Text marking "no downstream node". An empty field always means outlet too.
    pub outlet_token: String,
    /// First line names the columns.
    pub has_header: bool,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self::csv()
    }
}

impl RecordFormat {
    /// Comma separated with header; outlets have an empty downstream field.
    pub fn csv() -> Self {
        Self {
            delimiter: Delimiter::Char(','),
            outlet_token: String::new(),
            has_header: true,
        }
    }

    pub fn tsv() -> Self {
        Self {
            delimiter: Delimiter::Char('\t'),
            ..Self::csv()
        }
    }

    /// GEOframe topology file: `node downstream` per line, no header,
    /// `0` marks the closure section.
    pub fn geoframe() -> Self {
        Self {
            delimiter: Delimiter::Whitespace,
            outlet_token: "0".to_string(),
            has_header: false,
        }
    }

    pub fn preset(name: &str) -> RecordResult<Self> {
        match name {
            "csv" => Ok(Self::csv()),
            "tsv" => Ok(Self::tsv()),
            "geoframe" => Ok(Self::geoframe()),
            _ => Err(RecordError::UnknownFormat {
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_from_text() {
        assert_eq!(Delimiter::try_from(";".to_string()).unwrap(), Delimiter::Char(';'));
        assert_eq!(Delimiter::try_from("tab".to_string()).unwrap(), Delimiter::Char('\t'));
        assert_eq!(
            Delimiter::try_from("Whitespace".to_string()).unwrap(),
            Delimiter::Whitespace
        );
        assert!(Delimiter::try_from(";;".to_string()).is_err());
    }

    #[test]
    fn whitespace_split_and_hold() {
        let d = Delimiter::Whitespace;
        assert_eq!(d.split("  1 \t 2 "), vec!["1", "2"]);
        assert!(!d.can_hold(""));
        assert!(!d.can_hold("a b"));
        assert!(Delimiter::Char(',').can_hold(""));
        assert!(d.is_blank(" \t "));
        assert!(!Delimiter::Char('\t').is_blank("\t\t"));
        assert!(Delimiter::Char('\t').is_blank(""));
    }

    #[test]
    fn unknown_preset() {
        assert!(matches!(
            RecordFormat::preset("xml"),
            Err(RecordError::UnknownFormat { .. })
        ));
    }
}

//! Stream-gauge dictionary files: `gauge_id node_id` per line.

use std::path::Path;

use dn_graph::GaugeDictionary;
use tracing::debug;

use crate::{RecordError, RecordResult, read_file};

pub fn parse_gauges(text: &str) -> RecordResult<GaugeDictionary> {
    let mut dict = GaugeDictionary::new();
    for (n, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [gauge, node] => dict.insert(*gauge, *node)?,
            _ => {
                return Err(RecordError::FieldCount {
                    line: n + 1,
                    expected: 2,
                    found: fields.len(),
                });
            }
        }
    }
    Ok(dict)
}

pub fn load_gauges(path: &Path) -> RecordResult<GaugeDictionary> {
    let dict = parse_gauges(&read_file(path)?)?;
    debug!(path = %path.display(), gauges = dict.len(), "gauge dictionary loaded");
    Ok(dict)
}

//! dn-records: network record store for drainet.
//!
//! Text <-> record conversion only. Tables are parsed into records and
//! handed to the graph builder; topology checks stay with the validator.

pub mod config;
pub mod format;
pub mod gauges;
pub mod table;

use std::path::{Path, PathBuf};

use dn_core::{CoreError, NodeId};
use dn_graph::{GraphError, Network, check_network};
use tracing::{debug, warn};

pub use config::{WorkflowConfig, load_config};
pub use format::{Delimiter, RecordFormat};
pub use gauges::{load_gauges, parse_gauges};
pub use table::{RecordTable, parse_table, serialize_table};

pub type RecordResult<T> = Result<T, RecordError>;

#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("Missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("Duplicate column '{column}'")]
    DuplicateColumn { column: String },

    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid value in column '{column}'")]
    InvalidField {
        line: usize,
        column: String,
        #[source]
        source: CoreError,
    },

    #[error("Value '{value}' of column '{column}' at node {node} cannot be written in this format")]
    Unrepresentable {
        node: NodeId,
        column: String,
        value: String,
    },

    #[error("Invalid delimiter '{value}' (expected a single character or 'whitespace')")]
    InvalidDelimiter { value: String },

    #[error("Unknown record format '{name}'")]
    UnknownFormat { name: String },

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub(crate) fn read_file(path: &Path) -> RecordResult<String> {
    std::fs::read_to_string(path).map_err(|e| RecordError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

pub(crate) fn write_file(path: &Path, content: &str) -> RecordResult<()> {
    std::fs::write(path, content).map_err(|e| RecordError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn load_table(path: &Path, format: &RecordFormat) -> RecordResult<RecordTable> {
    let content = read_file(path)?;
    let table = parse_table(&content, format)?;
    debug!(path = %path.display(), records = table.records.len(), "table loaded");
    Ok(table)
}

pub fn save_table(path: &Path, table: &RecordTable, format: &RecordFormat) -> RecordResult<()> {
    let content = serialize_table(table, format)?;
    write_file(path, &content)?;
    debug!(path = %path.display(), records = table.records.len(), "table saved");
    Ok(())
}

/// Load a table and build it into a network (not validated).
pub fn load_network(path: &Path, format: &RecordFormat) -> RecordResult<Network> {
    load_table(path, format)?.into_network()
}

/// Load a network and refuse it unless the validator finds no defect.
pub fn load_valid_network(path: &Path, format: &RecordFormat) -> RecordResult<Network> {
    let network = load_network(path, format)?;
    let report = check_network(&network);
    if !report.is_valid() {
        warn!(
            path = %path.display(),
            findings = report.findings().len(),
            "network rejected"
        );
    }
    report.into_result()?;
    Ok(network)
}

pub fn save_network(path: &Path, network: &Network, format: &RecordFormat) -> RecordResult<()> {
    save_table(path, &RecordTable::from_network(network), format)
}

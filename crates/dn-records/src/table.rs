//! Record tables: one row per sub-basin.

use dn_core::NodeId;
use dn_graph::{DOWNSTREAM_ID_COLUMN, NODE_ID_COLUMN, Network, NetworkBuilder, Node};

use crate::format::RecordFormat;
use crate::{RecordError, RecordResult};

/// Column header plus node records, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub records: Vec<Node>,
}

impl RecordTable {
    pub fn from_network(network: &Network) -> Self {
        Self {
            columns: network.columns().to_vec(),
            records: network.nodes().to_vec(),
        }
    }

    /// Build the records into a network. Duplicate ids and dangling
    /// downstream ids fail here; topology is left to the validator.
    pub fn into_network(self) -> RecordResult<Network> {
        let mut builder = NetworkBuilder::new().with_columns(self.columns);
        for node in self.records {
            builder.push(node)?;
        }
        Ok(builder.build()?)
    }

    /// Same records restricted to the two id columns.
    pub fn ids_only(&self) -> Self {
        Self {
            columns: vec![NODE_ID_COLUMN.to_string(), DOWNSTREAM_ID_COLUMN.to_string()],
            records: self
                .records
                .iter()
                .map(|n| Node::new(n.id.clone(), n.downstream.clone()))
                .collect(),
        }
    }
}

fn column_position(columns: &[String], name: &'static str) -> RecordResult<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or(RecordError::MissingColumn { column: name })
}

fn parse_id(raw: &str, line: usize, column: &str) -> RecordResult<NodeId> {
    NodeId::parse(raw).map_err(|e| RecordError::InvalidField {
        line,
        column: column.to_string(),
        source: e,
    })
}

/// Parse delimited text into records.
///
/// With a header the id columns may be anywhere; without one the first two
/// fields are the node and downstream ids and further fields are named
/// `col3`, `col4`, ... Empty lines are skipped. Header cells and ids are
/// taken verbatim: padded ids are rejected rather than trimmed.
pub fn parse_table(text: &str, format: &RecordFormat) -> RecordResult<RecordTable> {
    let mut rows = text
        .lines()
        .enumerate()
        .map(|(n, l)| (n + 1, l))
        .filter(|(_, l)| !format.delimiter.is_blank(l))
        .peekable();

    let columns: Vec<String> = if format.has_header {
        match rows.next() {
            Some((_, header)) => format
                .delimiter
                .split(header)
                .into_iter()
                .map(str::to_string)
                .collect(),
            None => vec![NODE_ID_COLUMN.to_string(), DOWNSTREAM_ID_COLUMN.to_string()],
        }
    } else {
        let width = rows
            .peek()
            .map(|(_, l)| format.delimiter.split(l).len())
            .unwrap_or(2)
            .max(2);
        let mut cols = vec![NODE_ID_COLUMN.to_string(), DOWNSTREAM_ID_COLUMN.to_string()];
        cols.extend((3..=width).map(|i| format!("col{i}")));
        cols
    };

    for (i, c) in columns.iter().enumerate() {
        if columns[..i].contains(c) {
            return Err(RecordError::DuplicateColumn { column: c.clone() });
        }
    }
    let id_pos = column_position(&columns, NODE_ID_COLUMN)?;
    let down_pos = column_position(&columns, DOWNSTREAM_ID_COLUMN)?;

    let mut records = Vec::new();
    for (line, row) in rows {
        let fields = format.delimiter.split(row);
        if fields.len() != columns.len() {
            return Err(RecordError::FieldCount {
                line,
                expected: columns.len(),
                found: fields.len(),
            });
        }

        let id = parse_id(fields[id_pos], line, NODE_ID_COLUMN)?;

        let raw_down = fields[down_pos];
        let downstream = if raw_down.is_empty() || raw_down == format.outlet_token {
            None
        } else {
            Some(parse_id(raw_down, line, DOWNSTREAM_ID_COLUMN)?)
        };

        let mut node = Node::new(id, downstream);
        for (pos, value) in fields.iter().enumerate() {
            if pos != id_pos && pos != down_pos {
                node.attributes.set(columns[pos].clone(), *value);
            }
        }
        records.push(node);
    }

    Ok(RecordTable { columns, records })
}

/// Write records back as delimited text, one line per record.
pub fn serialize_table(table: &RecordTable, format: &RecordFormat) -> RecordResult<String> {
    let sep = format.delimiter.separator().to_string();
    let mut out = String::new();

    if format.has_header {
        for column in &table.columns {
            if !format.delimiter.can_hold(column) {
                return Err(RecordError::Unrepresentable {
                    node: NodeId::from(""),
                    column: column.clone(),
                    value: column.clone(),
                });
            }
        }
        out.push_str(&table.columns.join(&sep));
        out.push('\n');
    }

    let mut fields: Vec<&str> = Vec::with_capacity(table.columns.len());
    for node in &table.records {
        fields.clear();
        for column in &table.columns {
            let value = match column.as_str() {
                NODE_ID_COLUMN => node.id.as_str(),
                DOWNSTREAM_ID_COLUMN => match &node.downstream {
                    Some(d) if d.as_str() == format.outlet_token => {
                        return Err(RecordError::Unrepresentable {
                            node: node.id.clone(),
                            column: column.clone(),
                            value: d.to_string(),
                        });
                    }
                    Some(d) => d.as_str(),
                    None => format.outlet_token.as_str(),
                },
                name => node.attributes.get(name).unwrap_or_default(),
            };
            if !format.delimiter.can_hold(value) {
                return Err(RecordError::Unrepresentable {
                    node: node.id.clone(),
                    column: column.clone(),
                    value: value.to_string(),
                });
            }
            fields.push(value);
        }
        out.push_str(&fields.join(&sep));
        out.push('\n');
    }

    Ok(out)
}

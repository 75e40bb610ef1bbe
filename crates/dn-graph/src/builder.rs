//! Incremental network builder.

use std::collections::HashSet;

use dn_core::{Attributes, NodeId};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::network::{DOWNSTREAM_ID_COLUMN, NODE_ID_COLUMN, Network, Node};

/// Builder for constructing a network from an ordered record sequence.
///
/// Use `add_node` (or `push`) once per record, then call `build()` to check
/// references and freeze the records into an immutable `Network`. Duplicate
/// ids fail immediately; dangling downstream ids fail at `build()` because a
/// record may legitimately reference a node that appears later.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    nodes: Vec<Node>,
    seen: HashSet<NodeId>,
    columns: Option<Vec<String>>,
}

impl NetworkBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit column header instead of the derived one.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Add a record and return its position in record order.
    pub fn add_node(
        &mut self,
        id: impl Into<NodeId>,
        downstream: Option<NodeId>,
        attributes: Attributes,
    ) -> GraphResult<usize> {
        self.push(Node::new(id, downstream).with_attributes(attributes))
    }

    /// Add a fully formed node record.
    pub fn push(&mut self, node: Node) -> GraphResult<usize> {
        if !self.seen.insert(node.id.clone()) {
            return Err(GraphError::DuplicateNode { id: node.id });
        }
        self.nodes.push(node);
        Ok(self.nodes.len() - 1)
    }

    /// Number of records added so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Build a network directly from records.
    pub fn from_records<I>(records: I) -> GraphResult<Network>
    where
        I: IntoIterator<Item = Node>,
    {
        let mut builder = Self::new();
        for node in records {
            builder.push(node)?;
        }
        builder.build()
    }

    /// Check downstream references and return an immutable `Network`.
    pub fn build(self) -> GraphResult<Network> {
        for node in &self.nodes {
            if let Some(downstream) = &node.downstream {
                if !self.seen.contains(downstream) {
                    return Err(GraphError::DanglingReference {
                        node: node.id.clone(),
                        downstream: downstream.clone(),
                    });
                }
            }
        }

        let columns = Self::resolve_columns(self.columns, &self.nodes);
        let network = Network::assemble(self.nodes, columns);
        debug!(
            nodes = network.len(),
            outlets = network.outlets().len(),
            "network built"
        );
        Ok(network)
    }

    /// Given columns first, then every attribute name not yet listed, in
    /// first-seen order.
    fn resolve_columns(given: Option<Vec<String>>, nodes: &[Node]) -> Vec<String> {
        let mut columns = given
            .unwrap_or_else(|| vec![NODE_ID_COLUMN.to_string(), DOWNSTREAM_ID_COLUMN.to_string()]);
        for node in nodes {
            for name in node.attributes.names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        columns
    }
}

//! Graph-specific error types.

use dn_core::{CoreError, NodeId};
use thiserror::Error;

use crate::validate::TopologyError;

pub type GraphResult<T> = Result<T, GraphError>;

/// Network construction, query and transformation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Two records share the same node id.
    #[error("Duplicate node id {id}")]
    DuplicateNode { id: NodeId },

    /// A record names a downstream node that doesn't exist.
    #[error("Node {node} drains to non-existent node {downstream}")]
    DanglingReference { node: NodeId, downstream: NodeId },

    /// A query names a node that isn't in the network.
    #[error("Node {id} not found in network")]
    UnknownNode { id: NodeId },

    /// A gauge dictionary entry references a node absent from the network.
    #[error("Gauge {gauge} references node {node} which is not in the network")]
    UnknownGaugeNode { gauge: String, node: NodeId },

    /// A gauge id that isn't in the dictionary.
    #[error("Gauge {gauge} not found in gauge dictionary")]
    UnknownGauge { gauge: String },

    /// A gauge id or gauged node appears twice in a dictionary.
    #[error("Duplicate gauge entry {gauge} at node {node}")]
    DuplicateGauge { gauge: String, node: NodeId },

    /// `RequireEqual` aggregation met differing values.
    #[error("Attribute '{attribute}' differs across collapsed chain at {node}: {values:?}")]
    AmbiguousAttribute {
        node: NodeId,
        attribute: String,
        values: Vec<String>,
    },

    /// Validation found topology defects.
    #[error("Network topology is invalid ({} finding(s))", findings.len())]
    InvalidTopology { findings: Vec<TopologyError> },

    #[error(transparent)]
    Core(#[from] CoreError),
}

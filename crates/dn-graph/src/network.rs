//! Core network data structures.

use std::collections::HashMap;

use dn_core::{Attributes, NodeId};

/// Header of the node id column in record tables.
pub const NODE_ID_COLUMN: &str = "node_id";
/// Header of the downstream id column in record tables.
pub const DOWNSTREAM_ID_COLUMN: &str = "downstream_id";

/// A sub-basin of the drainage network.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Node this sub-basin drains into; `None` marks the outlet.
    pub downstream: Option<NodeId>,
    /// Open attribute payload (area, elevation, centroid, ...).
    pub attributes: Attributes,
    /// Stream order, only set on networks produced by `with_stream_order`.
    pub stream_order: Option<u32>,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, downstream: Option<NodeId>) -> Self {
        Self {
            id: id.into(),
            downstream,
            attributes: Attributes::new(),
            stream_order: None,
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn is_outlet(&self) -> bool {
        self.downstream.is_none()
    }
}

/// The network: nodes in record order plus derived adjacency.
///
/// The network stores:
/// - All nodes in a vector (the arena), in the order the records were given.
/// - An id -> arena index map.
/// - The downstream arena index of every node.
/// - Compact reverse adjacency: for each node, its predecessors in record order.
///
/// A `Network` is never mutated after construction; every query and
/// transformation returns a new, independently owned value.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) nodes: Vec<Node>,
    pub(crate) index: HashMap<NodeId, usize>,
    pub(crate) downstream: Vec<Option<usize>>,

    /// Offsets into `upstream`: node i's predecessors are in upstream[upstream_offsets[i]..upstream_offsets[i+1]].
    pub(crate) upstream_offsets: Vec<usize>,

    /// Flat list of predecessor arena indices.
    pub(crate) upstream: Vec<usize>,

    /// Full column header (id columns and attribute columns) in table order.
    pub(crate) columns: Vec<String>,
}

impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        // Everything else is derived from these two.
        self.nodes == other.nodes && self.columns == other.columns
    }
}

impl Network {
    /// Assemble a network from nodes whose ids are unique and whose
    /// downstream ids all resolve. Callers guarantee both.
    pub(crate) fn assemble(nodes: Vec<Node>, columns: Vec<String>) -> Self {
        let index: HashMap<NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();

        let downstream: Vec<Option<usize>> = nodes
            .iter()
            .map(|n| {
                n.downstream.as_ref().map(|d| {
                    debug_assert!(index.contains_key(d), "unresolved downstream {d}");
                    index[d]
                })
            })
            .collect();

        let (upstream_offsets, upstream) = Self::build_reverse_adjacency(&downstream);

        Self {
            nodes,
            index,
            downstream,
            upstream_offsets,
            upstream,
            columns,
        }
    }

    /// Build compact predecessor lists; predecessors keep record order.
    fn build_reverse_adjacency(downstream: &[Option<usize>]) -> (Vec<usize>, Vec<usize>) {
        let n = downstream.len();
        let mut counts = vec![0usize; n];
        for d in downstream.iter().flatten() {
            counts[*d] += 1;
        }

        let mut offsets = Vec::with_capacity(n + 1);
        offsets.push(0);
        for c in &counts {
            offsets.push(offsets[offsets.len() - 1] + c);
        }

        let mut cursor = offsets[..n].to_vec();
        let mut flat = vec![0usize; offsets[n]];
        for (i, d) in downstream.iter().enumerate() {
            if let Some(d) = *d {
                flat[cursor[d]] = i;
                cursor[d] += 1;
            }
        }

        (offsets, flat)
    }

    /// Network restricted to the nodes with `keep[i] == true`.
    ///
    /// Record order is preserved; a kept node whose downstream neighbour is
    /// dropped becomes an outlet.
    pub(crate) fn induced(&self, keep: &[bool]) -> Network {
        let nodes: Vec<Node> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| keep[*i])
            .map(|(i, node)| {
                let mut node = node.clone();
                if let Some(d) = self.downstream[i] {
                    if !keep[d] {
                        node.downstream = None;
                    }
                }
                node
            })
            .collect();
        Network::assemble(nodes, self.columns.clone())
    }

    /// Return all nodes in record order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Column header used when the network is written back as a table.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Node ids in record order.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Get a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Arena index of a node (its position in record order).
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Arena index of the node `i` drains into.
    pub fn downstream_index(&self, i: usize) -> Option<usize> {
        self.downstream.get(i).copied().flatten()
    }

    /// Arena indices of the predecessors of node `i`, in record order.
    pub fn upstream_indices(&self, i: usize) -> &[usize] {
        if i >= self.nodes.len() {
            return &[];
        }
        &self.upstream[self.upstream_offsets[i]..self.upstream_offsets[i + 1]]
    }

    /// Ids of the direct predecessors of a node, in record order.
    pub fn predecessors(&self, id: &NodeId) -> Vec<&NodeId> {
        match self.index_of(id) {
            Some(i) => self
                .upstream_indices(i)
                .iter()
                .map(|&p| &self.nodes[p].id)
                .collect(),
            None => Vec::new(),
        }
    }

    /// All outlets, in record order.
    pub fn outlets(&self) -> Vec<&NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.is_outlet())
            .map(|n| &n.id)
            .collect()
    }

    /// The outlet, if there is exactly one.
    pub fn outlet(&self) -> Option<&NodeId> {
        match self.outlets().as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Sum of a numeric attribute over all nodes (absent values count as zero).
    pub fn attribute_total(&self, name: &str) -> crate::GraphResult<f64> {
        let mut total = 0.0;
        for node in &self.nodes {
            if let Some(v) = node.attributes.number(node.id.as_str(), name)? {
                total += v;
            }
        }
        Ok(total)
    }
}

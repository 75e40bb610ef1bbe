//! Upstream/downstream queries and induced subgraphs.
//!
//! All traversals use explicit work-lists over arena indices, so deep
//! drainage chains never grow the call stack. Queries assume a validated
//! network; on invalid input they still terminate but the result is
//! unspecified.

use dn_core::NodeId;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::network::{Network, Node};

fn require(network: &Network, id: &NodeId) -> GraphResult<usize> {
    network
        .index_of(id)
        .ok_or_else(|| GraphError::UnknownNode { id: id.clone() })
}

/// Mask of `start` and every node draining through it.
pub(crate) fn upstream_mask(network: &Network, start: usize) -> Vec<bool> {
    let mut keep = vec![false; network.len()];
    let mut stack = vec![start];
    keep[start] = true;
    while let Some(i) = stack.pop() {
        for &p in network.upstream_indices(i) {
            if !keep[p] {
                keep[p] = true;
                stack.push(p);
            }
        }
    }
    keep
}

/// The sub-basin draining through `node_id`: the node and all its
/// transitive predecessors. `node_id` is the outlet of the result.
pub fn get_upstream_network(network: &Network, node_id: &NodeId) -> GraphResult<Network> {
    let start = require(network, node_id)?;
    let keep = upstream_mask(network, start);
    let sub = network.induced(&keep);
    debug!(node = %node_id, nodes = sub.len(), "upstream network");
    Ok(sub)
}

/// Path from `node_id` to the outlet, both ends included, in downstream order.
///
/// The walk stops after `network.len()` nodes, so it terminates even on a
/// network containing a cycle.
pub fn get_downstream_network(network: &Network, node_id: &NodeId) -> GraphResult<Vec<Node>> {
    let mut cur = Some(require(network, node_id)?);
    let mut path = Vec::new();
    while let Some(i) = cur {
        if path.len() == network.len() {
            break;
        }
        path.push(network.nodes[i].clone());
        cur = network.downstream_index(i);
    }
    Ok(path)
}

/// Subgraph induced by `node_ids`.
///
/// Edges are kept only when both ends are in the set; a node whose
/// downstream neighbour is outside the set becomes an outlet of the result.
/// Nodes keep the record order of the source network.
pub fn get_subgraph(network: &Network, node_ids: &[NodeId]) -> GraphResult<Network> {
    let mut keep = vec![false; network.len()];
    for id in node_ids {
        keep[require(network, id)?] = true;
    }
    Ok(network.induced(&keep))
}

/// The network without the sub-basin draining through `node_id`.
pub fn get_remainder_network(network: &Network, node_id: &NodeId) -> GraphResult<Network> {
    let start = require(network, node_id)?;
    let keep: Vec<bool> = upstream_mask(network, start)
        .into_iter()
        .map(|upstream| !upstream)
        .collect();
    Ok(network.induced(&keep))
}

/// One upstream network per outlet, outlets in record order.
///
/// This is the explicit repair for a multi-outlet table: each connected
/// basin becomes its own single-outlet network. Nodes on cycles belong to
/// no basin.
pub fn split_basins(network: &Network) -> Vec<Network> {
    let basins: Vec<Network> = (0..network.len())
        .filter(|&i| network.nodes[i].is_outlet())
        .map(|i| network.induced(&upstream_mask(network, i)))
        .collect();
    debug!(basins = basins.len(), "split network by outlet");
    basins
}

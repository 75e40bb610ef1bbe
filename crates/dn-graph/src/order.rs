//! Topological sort and stream order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use dn_core::NodeId;

use crate::error::{GraphError, GraphResult};
use crate::network::Network;

/// Arena indices in topological order, upstream first.
///
/// Kahn's algorithm with a min-heap on record position: among the nodes
/// whose predecessors are all emitted, the earliest record goes first.
/// Nodes on or draining into a cycle are never emitted.
pub(crate) fn topological_indices(network: &Network) -> Vec<usize> {
    let n = network.len();
    let mut pending: Vec<usize> = (0..n).map(|i| network.upstream_indices(i).len()).collect();
    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&i| pending[i] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        if let Some(d) = network.downstream_index(i) {
            pending[d] -= 1;
            if pending[d] == 0 {
                ready.push(Reverse(d));
            }
        }
    }
    order
}

/// Node ids in topological order: every node before the node it drains
/// into, so the outlet comes last. Ties follow record order.
pub fn sort_node(network: &Network) -> Vec<NodeId> {
    topological_indices(network)
        .into_iter()
        .map(|i| network.nodes[i].id.clone())
        .collect()
}

/// Order in which one series per sub-basin is produced by timeseries writers.
pub fn series_order(network: &Network) -> Vec<NodeId> {
    sort_node(network)
}

/// Sort a subset of node ids by their topological position.
pub fn sort_ids(network: &Network, ids: &[NodeId]) -> GraphResult<Vec<NodeId>> {
    let mut rank = vec![usize::MAX; network.len()];
    for (pos, i) in topological_indices(network).into_iter().enumerate() {
        rank[i] = pos;
    }
    let mut keyed = Vec::with_capacity(ids.len());
    for id in ids {
        let i = network
            .index_of(id)
            .ok_or_else(|| GraphError::UnknownNode { id: id.clone() })?;
        keyed.push((rank[i], id.clone()));
    }
    keyed.sort_by_key(|(r, _)| *r);
    Ok(keyed.into_iter().map(|(_, id)| id).collect())
}

/// Stream order per arena index (0 for nodes never reached by the sort).
fn strahler(network: &Network) -> Vec<u32> {
    let mut order = vec![0u32; network.len()];
    for i in topological_indices(network) {
        let mut max = 0u32;
        let mut at_max = 0usize;
        for &p in network.upstream_indices(i) {
            let o = order[p];
            if o > max {
                max = o;
                at_max = 1;
            } else if o == max {
                at_max += 1;
            }
        }
        order[i] = match (max, at_max) {
            (0, _) => 1,
            (m, n) if n >= 2 => m + 1,
            (m, _) => m,
        };
    }
    order
}

/// Horton–Strahler stream order of every node.
///
/// Leaves have order 1. A node takes the highest order among its
/// predecessors, incremented when two or more predecessors share it.
pub fn get_order_node(network: &Network) -> HashMap<NodeId, u32> {
    strahler(network)
        .into_iter()
        .enumerate()
        .filter(|(_, o)| *o > 0)
        .map(|(i, o)| (network.nodes[i].id.clone(), o))
        .collect()
}

/// Copy of the network with `Node::stream_order` filled in.
pub fn with_stream_order(network: &Network) -> Network {
    let orders = strahler(network);
    let mut out = network.clone();
    for (node, o) in out.nodes.iter_mut().zip(orders) {
        node.stream_order = (o > 0).then_some(o);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::network::Node;

    fn net(edges: &[(u32, Option<u32>)]) -> Network {
        NetworkBuilder::from_records(
            edges
                .iter()
                .map(|&(id, d)| Node::new(id, d.map(NodeId::from))),
        )
        .unwrap()
    }

    fn id(v: u32) -> NodeId {
        NodeId::from(v)
    }

    #[test]
    fn sort_places_outlet_last() {
        let n = net(&[(1, Some(2)), (2, Some(3)), (3, None), (4, Some(3))]);
        assert_eq!(sort_node(&n), vec![id(1), id(2), id(4), id(3)]);
    }

    #[test]
    fn sort_ties_follow_record_order() {
        let n = net(&[(9, None), (7, Some(9)), (8, Some(9)), (6, Some(9))]);
        assert_eq!(sort_node(&n), vec![id(7), id(8), id(6), id(9)]);
    }

    #[test]
    fn series_order_lists_every_sub_basin_once() {
        let n = net(&[(10, Some(30)), (30, None), (20, Some(30)), (40, Some(10))]);
        let series = series_order(&n);
        assert_eq!(series, vec![id(20), id(40), id(10), id(30)]);
        assert_eq!(series, sort_node(&n));
    }

    #[test]
    fn sort_subset() {
        let n = net(&[(1, Some(2)), (2, Some(3)), (3, None), (4, Some(3))]);
        let sorted = sort_ids(&n, &[id(3), id(4), id(1)]).unwrap();
        assert_eq!(sorted, vec![id(1), id(4), id(3)]);
        assert!(sort_ids(&n, &[id(10)]).is_err());
    }

    #[test]
    fn strahler_example() {
        let n = net(&[(1, Some(2)), (2, Some(3)), (3, None), (4, Some(3))]);
        let expected: HashMap<NodeId, u32> =
            [(id(1), 1), (id(4), 1), (id(2), 1), (id(3), 2)].into_iter().collect();
        assert_eq!(get_order_node(&n), expected);
    }

    #[test]
    fn strahler_unequal_branches_keep_max() {
        // 1,2 -> 3 (order 2); 3,4 -> 5 stays 2
        let n = net(&[(1, Some(3)), (2, Some(3)), (3, Some(5)), (4, Some(5)), (5, None)]);
        let orders = get_order_node(&n);
        assert_eq!(orders[&id(3)], 2);
        assert_eq!(orders[&id(5)], 2);
    }

    #[test]
    fn stream_order_annotation() {
        let n = net(&[(1, Some(3)), (2, Some(3)), (3, None)]);
        let annotated = with_stream_order(&n);
        assert_eq!(annotated.node(&id(3)).unwrap().stream_order, Some(2));
        assert_eq!(n.node(&id(3)).unwrap().stream_order, None);
    }
}

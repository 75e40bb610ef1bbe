//! Network validation logic.
//!
//! The validator never fails: it walks the whole network and collects every
//! finding so that the source table can be fixed in one pass.

use dn_core::NodeId;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{GraphError, GraphResult};
use crate::network::Network;

/// A structural defect of a drainage network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Network has no outlet")]
    NoOutlet,

    #[error("Network has {} outlets: {}", outlets.len(), join_ids(outlets, ", "))]
    MultipleOutlets { outlets: Vec<NodeId> },

    #[error("Cycle detected: {}", join_ids(cycle, " -> "))]
    CycleDetected { cycle: Vec<NodeId> },

    #[error("Node {node} has no path to an outlet")]
    UnreachableNode { node: NodeId },
}

fn join_ids(ids: &[NodeId], sep: &str) -> String {
    ids.iter().map(NodeId::as_str).collect::<Vec<_>>().join(sep)
}

/// All findings of one `check_network` run, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    findings: Vec<TopologyError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn findings(&self) -> &[TopologyError] {
        &self.findings
    }

    /// Cycles found, each as node ids in downstream order.
    pub fn cycles(&self) -> impl Iterator<Item = &[NodeId]> {
        self.findings.iter().filter_map(|f| match f {
            TopologyError::CycleDetected { cycle } => Some(cycle.as_slice()),
            _ => None,
        })
    }

    /// Turn a non-empty report into an error.
    pub fn into_result(self) -> GraphResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(GraphError::InvalidTopology {
                findings: self.findings,
            })
        }
    }
}

/// Where the downstream walk from a node ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Unvisited,
    OnPath,
    ReachesOutlet,
    OnCycle,
    DrainsToCycle,
}

/// Check outlets, acyclicity and reachability of a network.
pub fn check_network(network: &Network) -> ValidationReport {
    let mut findings = Vec::new();

    // (a) outlets
    let outlets: Vec<NodeId> = network.outlets().into_iter().cloned().collect();
    if outlets.len() > 1 {
        findings.push(TopologyError::MultipleOutlets { outlets: outlets.clone() });
    }

    // (b) cycles, (c) reachability
    let (cycles, fates) = walk_downstream(network);
    for cycle in &cycles {
        findings.push(TopologyError::CycleDetected {
            cycle: cycle.iter().map(|&i| network.nodes[i].id.clone()).collect(),
        });
    }

    // Without outlets a non-empty network must contain a cycle; the cycle
    // findings already describe it.
    if outlets.is_empty() && cycles.is_empty() {
        findings.insert(0, TopologyError::NoOutlet);
    }

    for (i, fate) in fates.iter().enumerate() {
        if *fate == Fate::DrainsToCycle {
            findings.push(TopologyError::UnreachableNode {
                node: network.nodes[i].id.clone(),
            });
        }
    }

    if findings.is_empty() {
        debug!(nodes = network.len(), "network is valid");
    } else {
        warn!(
            nodes = network.len(),
            findings = findings.len(),
            "network has topology defects"
        );
    }

    ValidationReport { findings }
}

/// Follow downstream links from every node, iteratively.
///
/// Returns each distinct cycle (arena indices, rotated to start at the
/// lowest record index) and the fate of every node.
fn walk_downstream(network: &Network) -> (Vec<Vec<usize>>, Vec<Fate>) {
    let n = network.len();
    let mut fates = vec![Fate::Unvisited; n];
    let mut cycles = Vec::new();
    let mut path: Vec<usize> = Vec::new();

    for start in 0..n {
        if fates[start] != Fate::Unvisited {
            continue;
        }
        path.clear();
        let mut cur = start;
        let end = loop {
            match fates[cur] {
                Fate::Unvisited => {
                    fates[cur] = Fate::OnPath;
                    path.push(cur);
                    match network.downstream[cur] {
                        Some(next) => cur = next,
                        None => break Fate::ReachesOutlet,
                    }
                }
                Fate::OnPath => {
                    let pos = path.iter().position(|&p| p == cur).unwrap_or(0);
                    let mut cycle = path.split_off(pos);
                    for &c in &cycle {
                        fates[c] = Fate::OnCycle;
                    }
                    if let Some(min_pos) = cycle
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, idx)| **idx)
                        .map(|(p, _)| p)
                    {
                        cycle.rotate_left(min_pos);
                    }
                    cycles.push(cycle);
                    break Fate::DrainsToCycle;
                }
                Fate::ReachesOutlet => break Fate::ReachesOutlet,
                Fate::OnCycle | Fate::DrainsToCycle => break Fate::DrainsToCycle,
            }
        };
        for &p in &path {
            fates[p] = end;
        }
    }

    (cycles, fates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::network::Node;

    fn net(edges: &[(&str, Option<&str>)]) -> Network {
        NetworkBuilder::from_records(
            edges
                .iter()
                .map(|(id, d)| Node::new(*id, d.map(NodeId::from))),
        )
        .unwrap()
    }

    #[test]
    fn valid_tree_has_no_findings() {
        let report = check_network(&net(&[("a", Some("c")), ("b", Some("c")), ("c", None)]));
        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn empty_network_has_no_outlet() {
        let report = check_network(&net(&[]));
        assert_eq!(report.findings(), &[TopologyError::NoOutlet]);
    }

    #[test]
    fn multiple_outlets_reported_once() {
        let report = check_network(&net(&[("a", None), ("b", None), ("c", Some("a"))]));
        assert_eq!(
            report.findings(),
            &[TopologyError::MultipleOutlets {
                outlets: vec!["a".into(), "b".into()]
            }]
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let report = check_network(&net(&[("a", Some("a")), ("o", None)]));
        assert_eq!(
            report.findings(),
            &[TopologyError::CycleDetected {
                cycle: vec!["a".into()]
            }]
        );
    }

    #[test]
    fn feeder_of_cycle_is_unreachable() {
        let report = check_network(&net(&[
            ("x", Some("a")),
            ("a", Some("b")),
            ("b", Some("a")),
            ("o", None),
        ]));
        assert_eq!(report.cycles().count(), 1);
        assert_eq!(
            report.cycles().next().unwrap(),
            &[NodeId::from("a"), NodeId::from("b")][..]
        );
        assert!(report
            .findings()
            .contains(&TopologyError::UnreachableNode { node: "x".into() }));
        assert_eq!(report.findings().len(), 2);
    }

    #[test]
    fn findings_are_displayable() {
        let err = TopologyError::CycleDetected {
            cycle: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "Cycle detected: a -> b");
    }
}

//! Calibration filter: carve a network into gauged sub-basins.

use std::collections::HashMap;

use dn_core::NodeId;
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};
use crate::network::Network;
use crate::order::{sort_ids, topological_indices};
use crate::traversal::upstream_mask;

/// A stream gauge located at the outlet of a sub-basin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gauge {
    pub id: String,
    pub node: NodeId,
}

/// Gauge id <-> node id mapping, one gauge per node, insertion ordered.
#[derive(Debug, Clone, Default)]
pub struct GaugeDictionary {
    gauges: Vec<Gauge>,
    by_node: HashMap<NodeId, usize>,
    by_id: HashMap<String, usize>,
}

impl GaugeDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from `(gauge id, node id)` pairs.
    pub fn from_pairs<I, G, N>(pairs: I) -> GraphResult<Self>
    where
        I: IntoIterator<Item = (G, N)>,
        G: Into<String>,
        N: Into<NodeId>,
    {
        let mut dict = Self::new();
        for (gauge, node) in pairs {
            dict.insert(gauge, node)?;
        }
        Ok(dict)
    }

    pub fn insert(&mut self, gauge: impl Into<String>, node: impl Into<NodeId>) -> GraphResult<()> {
        let gauge = gauge.into();
        let node = node.into();
        if self.by_node.contains_key(&node) || self.by_id.contains_key(&gauge) {
            return Err(GraphError::DuplicateGauge { gauge, node });
        }
        let slot = self.gauges.len();
        self.by_node.insert(node.clone(), slot);
        self.by_id.insert(gauge.clone(), slot);
        self.gauges.push(Gauge { id: gauge, node });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gauge> {
        self.gauges.iter()
    }

    /// Gauge by gauge id.
    pub fn get(&self, gauge: &str) -> Option<&Gauge> {
        self.by_id.get(gauge).map(|&i| &self.gauges[i])
    }

    /// Gauge located at a node.
    pub fn at_node(&self, node: &NodeId) -> Option<&Gauge> {
        self.by_node.get(node).map(|&i| &self.gauges[i])
    }

    /// Fail with `UnknownGaugeNode` on the first gauge whose node is not in `network`.
    pub fn check_against(&self, network: &Network) -> GraphResult<()> {
        match self.gauges.iter().find(|g| !network.contains(&g.node)) {
            Some(g) => Err(GraphError::UnknownGaugeNode {
                gauge: g.id.clone(),
                node: g.node.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Calibration role of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLabel {
    /// Nearest gauge at or downstream of the node.
    pub gauge: Option<String>,
    pub calibrated: bool,
}

/// The sub-basin observed by one gauge.
#[derive(Debug, Clone)]
pub struct GaugeBasin {
    pub gauge: Gauge,
    pub network: Network,
    pub labels: HashMap<NodeId, NodeLabel>,
}

/// Result of [`filter_to_calibrate`].
#[derive(Debug, Clone)]
pub struct CalibrationSet {
    /// One basin per gauge, in dictionary order.
    pub basins: Vec<GaugeBasin>,
    /// Label of every node of the source network.
    pub labels: HashMap<NodeId, NodeLabel>,
    /// Nodes with no gauge downstream, in record order.
    pub uncalibrated: Vec<NodeId>,
}

/// For every node, the nearest gauge at or downstream of it.
///
/// One pass in reverse topological order: a node's downstream neighbour is
/// always resolved before the node itself.
fn governing_gauges<'g>(network: &Network, gauges: &'g GaugeDictionary) -> Vec<Option<&'g Gauge>> {
    let mut governing: Vec<Option<&Gauge>> = vec![None; network.len()];
    for i in topological_indices(network).into_iter().rev() {
        governing[i] = match gauges.at_node(&network.nodes()[i].id) {
            Some(g) => Some(g),
            None => network.downstream_index(i).and_then(|d| governing[d]),
        };
    }
    governing
}

fn label_basin(network: &Network, gauges: &GaugeDictionary, own: &Gauge) -> HashMap<NodeId, NodeLabel> {
    governing_gauges(network, gauges)
        .into_iter()
        .zip(network.nodes())
        .map(|(g, node)| {
            let label = NodeLabel {
                gauge: g.map(|g| g.id.clone()),
                calibrated: g.is_some_and(|g| g.id == own.id),
            };
            (node.id.clone(), label)
        })
        .collect()
}

/// Split a network into the upstream basins of its gauges.
///
/// Every node is labelled with its nearest downstream gauge; nodes that no
/// gauge observes are flagged as not calibrated.
pub fn filter_to_calibrate(network: &Network, gauges: &GaugeDictionary) -> GraphResult<CalibrationSet> {
    gauges.check_against(network)?;

    let mut basins = Vec::with_capacity(gauges.len());
    for gauge in gauges.iter() {
        basins.push(gauge_basin(network, gauges, &gauge.id, false)?);
    }

    let mut labels = HashMap::with_capacity(network.len());
    let mut uncalibrated = Vec::new();
    for (g, node) in governing_gauges(network, gauges).into_iter().zip(network.nodes()) {
        if g.is_none() {
            uncalibrated.push(node.id.clone());
        }
        labels.insert(
            node.id.clone(),
            NodeLabel {
                gauge: g.map(|g| g.id.clone()),
                calibrated: g.is_some(),
            },
        );
    }

    info!(
        gauges = gauges.len(),
        uncalibrated = uncalibrated.len(),
        "calibration basins extracted"
    );
    Ok(CalibrationSet {
        basins,
        labels,
        uncalibrated,
    })
}

/// Upstream basin of a single gauge.
///
/// With `prune_inner`, everything strictly upstream of another gauge inside
/// the basin is removed; the inner gauge node stays as a leaf whose inflow is
/// taken from observations. Nodes draining to the basin's own gauge are
/// labelled calibrated, nodes governed by an inner gauge are not.
pub fn gauge_basin(
    network: &Network,
    gauges: &GaugeDictionary,
    gauge_id: &str,
    prune_inner: bool,
) -> GraphResult<GaugeBasin> {
    let gauge = gauges.get(gauge_id).ok_or_else(|| GraphError::UnknownGauge {
        gauge: gauge_id.to_string(),
    })?;
    let start = network
        .index_of(&gauge.node)
        .ok_or_else(|| GraphError::UnknownGaugeNode {
            gauge: gauge.id.clone(),
            node: gauge.node.clone(),
        })?;

    let mut keep = upstream_mask(network, start);
    if prune_inner {
        let inner: Vec<usize> = gauges
            .iter()
            .filter_map(|g| network.index_of(&g.node))
            .filter(|&i| i != start && keep[i])
            .collect();
        for g in inner {
            for (i, upstream) in upstream_mask(network, g).into_iter().enumerate() {
                if upstream && i != g {
                    keep[i] = false;
                }
            }
        }
    }

    let sub = network.induced(&keep);
    let labels = label_basin(&sub, gauges, gauge);
    debug!(gauge = %gauge.id, nodes = sub.len(), prune_inner, "gauge basin");
    Ok(GaugeBasin {
        gauge: gauge.clone(),
        network: sub,
        labels,
    })
}

/// Gauge ids ordered by the topological position of their nodes,
/// upstream gauges first.
pub fn order_gauges(network: &Network, gauges: &GaugeDictionary) -> GraphResult<Vec<String>> {
    gauges.check_against(network)?;
    let nodes: Vec<NodeId> = gauges.iter().map(|g| g.node.clone()).collect();
    let sorted = sort_ids(network, &nodes)?;
    Ok(sorted
        .iter()
        .filter_map(|n| gauges.at_node(n).map(|g| g.id.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::network::Node;

    // 1 -> 2 -> 3 -> 5 (outlet), 4 -> 5, 6 -> 2
    fn sample() -> Network {
        NetworkBuilder::from_records([
            Node::new(1, Some(NodeId::from(2))),
            Node::new(2, Some(NodeId::from(3))),
            Node::new(3, Some(NodeId::from(5))),
            Node::new(4, Some(NodeId::from(5))),
            Node::new(5, None),
            Node::new(6, Some(NodeId::from(2))),
        ])
        .unwrap()
    }

    #[test]
    fn dictionary_rejects_duplicates() {
        let mut dict = GaugeDictionary::new();
        dict.insert("g1", 2).unwrap();
        assert!(dict.insert("g2", 2).is_err());
        assert!(dict.insert("g1", 3).is_err());
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn unknown_gauge_node() {
        let dict = GaugeDictionary::from_pairs([("g1", 42)]).unwrap();
        let err = filter_to_calibrate(&sample(), &dict).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownGaugeNode {
                gauge: "g1".into(),
                node: NodeId::from(42)
            }
        );
    }

    #[test]
    fn labels_and_uncalibrated() {
        let dict = GaugeDictionary::from_pairs([("up", 2), ("mid", 3)]).unwrap();
        let set = filter_to_calibrate(&sample(), &dict).unwrap();

        assert_eq!(set.basins.len(), 2);
        assert_eq!(set.basins[0].network.len(), 3); // 1, 2, 6
        assert_eq!(set.basins[1].network.len(), 4); // 1, 2, 3, 6

        assert_eq!(set.labels[&NodeId::from(1)].gauge.as_deref(), Some("up"));
        assert_eq!(set.labels[&NodeId::from(3)].gauge.as_deref(), Some("mid"));
        assert!(!set.labels[&NodeId::from(4)].calibrated);
        assert_eq!(set.uncalibrated, vec![NodeId::from(4), NodeId::from(5)]);
    }

    #[test]
    fn pruned_basin_keeps_inner_gauge_as_leaf() {
        let dict = GaugeDictionary::from_pairs([("out", 5), ("inner", 2)]).unwrap();
        let basin = gauge_basin(&sample(), &dict, "out", true).unwrap();
        let ids: Vec<_> = basin.network.ids().map(|i| i.to_string()).collect();
        assert_eq!(ids, vec!["2", "3", "4", "5"]);
        assert!(basin.network.predecessors(&NodeId::from(2)).is_empty());

        assert!(basin.labels[&NodeId::from(5)].calibrated);
        assert!(basin.labels[&NodeId::from(3)].calibrated);
        assert!(!basin.labels[&NodeId::from(2)].calibrated);
        assert_eq!(basin.labels[&NodeId::from(2)].gauge.as_deref(), Some("inner"));
    }

    #[test]
    fn unpruned_basin_labels_inner_upstream_as_not_calibrated() {
        let dict = GaugeDictionary::from_pairs([("out", 5), ("inner", 2)]).unwrap();
        let basin = gauge_basin(&sample(), &dict, "out", false).unwrap();
        assert_eq!(basin.network.len(), 6);
        assert!(!basin.labels[&NodeId::from(6)].calibrated);
        assert!(basin.labels[&NodeId::from(4)].calibrated);
    }

    #[test]
    fn unknown_gauge_id() {
        let dict = GaugeDictionary::from_pairs([("out", 5)]).unwrap();
        assert!(matches!(
            gauge_basin(&sample(), &dict, "nope", false),
            Err(GraphError::UnknownGauge { .. })
        ));
    }

    #[test]
    fn gauges_in_topological_order() {
        let dict = GaugeDictionary::from_pairs([("out", 5), ("b", 4), ("a", 1)]).unwrap();
        assert_eq!(order_gauges(&sample(), &dict).unwrap(), vec!["a", "b", "out"]);
    }
}

//! Structural simplification of a drainage network.
//!
//! A pass-through node has exactly one predecessor and drains somewhere.
//! Every maximal chain `u -> p1 -> ... -> pk -> d` of pass-through nodes is
//! merged into `u`, which then drains straight into `d`. The interior ids
//! `p1..pk` disappear from the result.
//!
//! How the attributes of the merged group `{u, p1, ..., pk}` combine is set
//! per attribute by an [`AggregationPolicy`]:
//!
//! | Rule           | Value kept for the merged node                          |
//! |----------------|---------------------------------------------------------|
//! | `Sum`          | sum of all numeric values (additive: area, volume)      |
//! | `Downstream`   | value of the most downstream member carrying it (`pk`)  |
//! | `Upstream`     | value of the surviving node `u` (or first carrying it)  |
//! | `RequireEqual` | the shared value (numbers within tolerance); else error |
//!
//! `AggregationPolicy::default()` sums `area` and takes every other
//! attribute from the chain's downstream end.

use std::collections::BTreeMap;

use dn_core::{Attributes, Tolerances, format_number};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GraphError, GraphResult};
use crate::network::{Network, Node};

/// How one attribute is combined when a chain is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Downstream,
    Upstream,
    RequireEqual,
}

/// Per-attribute aggregation table with a fallback rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationPolicy {
    /// Rule for attributes not listed in `attributes`.
    pub default: Aggregation,
    pub attributes: BTreeMap<String, Aggregation>,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self::new(Aggregation::Downstream).with("area", Aggregation::Sum)
    }
}

impl AggregationPolicy {
    /// Empty table: every attribute follows `default`.
    pub fn new(default: Aggregation) -> Self {
        Self {
            default,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, attribute: impl Into<String>, rule: Aggregation) -> Self {
        self.attributes.insert(attribute.into(), rule);
        self
    }

    pub fn rule_for(&self, attribute: &str) -> Aggregation {
        self.attributes
            .get(attribute)
            .copied()
            .unwrap_or(self.default)
    }
}

fn is_pass_through(network: &Network, i: usize) -> bool {
    network.upstream_indices(i).len() == 1 && network.downstream_index(i).is_some()
}

/// Collapse every pass-through chain. The outlet id and the total of every
/// `Sum` attribute are unchanged; applying it twice equals applying it once.
pub fn simplify_network(network: &Network, policy: &AggregationPolicy) -> GraphResult<Network> {
    let n = network.len();
    let mut removed = vec![false; n];
    let mut merged: Vec<Option<Node>> = vec![None; n];
    let mut chains = 0usize;

    for u in 0..n {
        if is_pass_through(network, u) {
            continue;
        }
        let Some(first) = network.downstream_index(u) else {
            continue;
        };
        let mut group = vec![u];
        let mut cur = first;
        while is_pass_through(network, cur) && group.len() <= n {
            group.push(cur);
            let Some(next) = network.downstream_index(cur) else {
                break;
            };
            cur = next;
        }
        if group.len() == 1 {
            continue;
        }

        for &p in &group[1..] {
            removed[p] = true;
        }
        let mut node = network.nodes[u].clone();
        node.downstream = Some(network.nodes[cur].id.clone());
        node.attributes = aggregate(network, &group, policy)?;
        merged[u] = Some(node);
        chains += 1;
    }

    let nodes: Vec<Node> = (0..n)
        .filter(|&i| !removed[i])
        .map(|i| merged[i].take().unwrap_or_else(|| network.nodes[i].clone()))
        .collect();

    info!(
        chains,
        before = n,
        after = nodes.len(),
        "network simplified"
    );
    Ok(Network::assemble(nodes, network.columns.clone()))
}

/// Combine the attributes of `group` (upstream end first).
fn aggregate(network: &Network, group: &[usize], policy: &AggregationPolicy) -> GraphResult<Attributes> {
    let members: Vec<&Node> = group.iter().map(|&i| &network.nodes[i]).collect();
    let survivor = &members[0];

    let mut names: Vec<&str> = Vec::new();
    for m in &members {
        for name in m.attributes.names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let mut out = Attributes::new();
    for name in names {
        let mut carried = members.iter().filter_map(|m| m.attributes.get(name));
        let value = match policy.rule_for(name) {
            Aggregation::Sum => {
                let mut total = 0.0;
                let mut any = false;
                for m in &members {
                    if let Some(v) = m.attributes.number(m.id.as_str(), name)? {
                        total += v;
                        any = true;
                    }
                }
                if any {
                    format_number(total)
                } else {
                    survivor.attributes.get(name).unwrap_or_default().to_string()
                }
            }
            Aggregation::Downstream => carried.last().unwrap_or_default().to_string(),
            Aggregation::Upstream => carried.next().unwrap_or_default().to_string(),
            Aggregation::RequireEqual => {
                let mut distinct: Vec<&str> = Vec::new();
                for v in carried.map(str::trim).filter(|v| !v.is_empty()) {
                    if !distinct.iter().any(|d| same_value(d, v)) {
                        distinct.push(v);
                    }
                }
                if distinct.len() > 1 {
                    return Err(GraphError::AmbiguousAttribute {
                        node: survivor.id.clone(),
                        attribute: name.to_string(),
                        values: distinct.into_iter().map(str::to_string).collect(),
                    });
                }
                distinct.first().copied().unwrap_or_default().to_string()
            }
        };
        out.set(name, value);
    }
    Ok(out)
}

/// Equal text, or two numbers within the default tolerances.
fn same_value(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => Tolerances::default().agree(x, y),
        _ => false,
    }
}

/// Every node becomes an independent outlet.
///
/// Used to produce the "dummy" topology in which each sub-basin drains
/// straight to the closure, so the simulator treats them independently.
pub fn flatten_network(network: &Network) -> Network {
    let nodes: Vec<Node> = network
        .nodes
        .iter()
        .map(|n| Node {
            downstream: None,
            ..n.clone()
        })
        .collect();
    Network::assemble(nodes, network.columns.clone())
}

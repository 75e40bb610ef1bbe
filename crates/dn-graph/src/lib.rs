//! dn-graph: drainage network topology engine for drainet.
//!
//! Provides:
//! - Network data structures (Node, Network) with compact reverse adjacency
//! - Record-driven network builder with referential checks
//! - Validator collecting every topology defect into a report
//! - Traversals (upstream basin, downstream path, induced subgraphs)
//! - Topological sort and Horton–Strahler stream order
//! - Chain simplification under an explicit aggregation policy
//! - Calibration filter over a stream-gauge dictionary
//!
//! # Example
//!
//! ```
//! use dn_core::NodeId;
//! use dn_graph::{NetworkBuilder, Node, check_network, get_order_node, sort_node};
//!
//! let net = NetworkBuilder::from_records([
//!     Node::new(1, Some(NodeId::from(2))),
//!     Node::new(2, Some(NodeId::from(3))),
//!     Node::new(3, None),
//!     Node::new(4, Some(NodeId::from(3))),
//! ])
//! .unwrap();
//!
//! assert!(check_network(&net).is_valid());
//! assert_eq!(sort_node(&net).last(), Some(&NodeId::from(3)));
//! assert_eq!(get_order_node(&net)[&NodeId::from(3)], 2);
//! ```

pub mod builder;
pub mod calibrate;
pub mod error;
pub mod network;
pub mod order;
pub mod simplify;
pub mod traversal;
pub mod validate;

// Re-exports for ergonomics
pub use builder::NetworkBuilder;
pub use calibrate::{
    CalibrationSet, Gauge, GaugeBasin, GaugeDictionary, NodeLabel, filter_to_calibrate,
    gauge_basin, order_gauges,
};
pub use error::{GraphError, GraphResult};
pub use network::{DOWNSTREAM_ID_COLUMN, NODE_ID_COLUMN, Network, Node};
pub use order::{get_order_node, series_order, sort_ids, sort_node, with_stream_order};
pub use simplify::{Aggregation, AggregationPolicy, flatten_network, simplify_network};
pub use traversal::{
    get_downstream_network, get_remainder_network, get_subgraph, get_upstream_network,
    split_basins,
};
pub use validate::{TopologyError, ValidationReport, check_network};

//! dn-core: stable foundation for drainet.
//!
//! Contains:
//! - ids (textual node identifiers)
//! - attrs (ordered, lossless attribute map)
//! - numeric (attribute number parsing + tolerances)
//! - error (shared error types)

pub mod attrs;
pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use attrs::Attributes;
pub use error::{CoreError, CoreResult};
pub use ids::NodeId;
pub use numeric::*;

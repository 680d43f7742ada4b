//! Network topology module.
//!
//! This module holds the topology input description and the per-run index
//! map that turns node identifiers into allocator inputs.

pub mod index;
pub mod types;

// Re-export key types for easier access
pub use index::{Index, NodeKind, TopologyIndex};
pub use types::{LinkClass, LinkSet, OrderedPair, TopologyInput, VpnId, VpnSite};

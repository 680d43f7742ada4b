//! Error types for address planning.
//!
//! Every variant is terminal for the planning run that produced it: a
//! partially computed plan may contain truncated or overlapping allocations
//! and is never returned.

use crate::topology::{LinkClass, NodeKind};

/// Errors raised by the allocators, the topology index and the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("Unknown node '{node}': not registered as router, host or controller")]
    UnknownNode { node: String },

    #[error("Value {value} does not fit the {width}-bit {field} field")]
    EncodingOverflow {
        field: &'static str,
        value: u128,
        width: u8,
    },

    #[error("Address space exhausted in {block}")]
    ExhaustedAddressSpace { block: String },

    #[error("Node '{node}' already registered as {existing:?}, cannot register as {requested:?}")]
    RoleConflict {
        node: String,
        existing: NodeKind,
        requested: NodeKind,
    },

    #[error("Link ({left}, {right}) has endpoints of the wrong kind for a {class:?} link")]
    LinkClass {
        class: LinkClass,
        left: String,
        right: String,
    },

    #[error("VPN id must be strictly positive")]
    InvalidVpnId,
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, PlanError>;

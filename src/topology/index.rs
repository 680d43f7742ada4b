//! Node index assignment.
//!
//! Every router, host and controller gets a dense, strictly positive index
//! the first time it is registered. Indices come from one counter shared by
//! all node kinds and are the encoding input of every per-node allocator.

use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

/// Dense node index, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index(NonZeroU32);

impl Index {
    /// Returns `None` for 0, which is never assigned
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Index)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role a node was registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Router,
    Host,
    Controller,
}

/// Mapping from node identifiers to indices for one planning run
#[derive(Debug, Default)]
pub struct TopologyIndex {
    nodes: HashMap<String, (Index, NodeKind)>,
    last: u32,
}

impl TopologyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next index to `node`, or return the one it already has.
    ///
    /// Registering a known node under a different kind is an error.
    pub fn register(&mut self, node: &str, kind: NodeKind) -> Result<Index> {
        if let Some(&(index, existing)) = self.nodes.get(node) {
            if existing != kind {
                return Err(PlanError::RoleConflict {
                    node: node.to_string(),
                    existing,
                    requested: kind,
                });
            }
            return Ok(index);
        }

        let next = self.last.checked_add(1).and_then(Index::new).ok_or(PlanError::EncodingOverflow {
            field: "node index",
            value: self.last as u128 + 1,
            width: 32,
        })?;
        self.last = next.get();
        self.nodes.insert(node.to_string(), (next, kind));
        log::trace!("Registered {:?} '{}' with index {}", kind, node, next);
        Ok(next)
    }

    /// Index of a registered node; never allocates
    pub fn index_of(&self, node: &str) -> Result<Index> {
        self.lookup(node).map(|(index, _)| index)
    }

    /// Index and kind of a registered node
    pub fn lookup(&self, node: &str) -> Result<(Index, NodeKind)> {
        self.nodes.get(node).copied().ok_or_else(|| PlanError::UnknownNode {
            node: node.to_string(),
        })
    }

    pub fn kind_of(&self, node: &str) -> Option<NodeKind> {
        self.nodes.get(node).map(|&(_, kind)| kind)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

//! Topology type definitions.
//!
//! Input description of a topology (node lists, classified links and VPN
//! sites) plus the small key types the allocators are called with.

use super::index::Index;
use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Class of a link, selecting the allocator that numbers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkClass {
    /// Router to router
    Core,
    /// Router to customer-facing host
    Edge,
    /// Router to access host
    Access,
    /// Controller to router or host
    Management,
}

/// The two indices of a link, in the order the allocator encodes them.
///
/// Pair allocators are not symmetric: `(a, b)` and `(b, a)` land in different
/// networks. Building the pair once and passing the same value to the network
/// and endpoint calls keeps the three results consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderedPair {
    left: Index,
    right: Index,
}

impl OrderedPair {
    pub fn new(left: Index, right: Index) -> Self {
        OrderedPair { left, right }
    }

    pub fn left(&self) -> Index {
        self.left
    }

    pub fn right(&self) -> Index {
        self.right
    }

    pub fn reversed(&self) -> Self {
        OrderedPair {
            left: self.right,
            right: self.left,
        }
    }
}

/// Customer VPN identifier, strictly positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VpnId(NonZeroU32);

impl VpnId {
    pub fn new(value: u32) -> Result<Self> {
        NonZeroU32::new(value).map(VpnId).ok_or(PlanError::InvalidVpnId)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for VpnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Links grouped by class, each an (endpoint, endpoint) tuple
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkSet {
    #[serde(default)]
    pub core: Vec<(String, String)>,
    #[serde(default)]
    pub edge: Vec<(String, String)>,
    #[serde(default)]
    pub access: Vec<(String, String)>,
    #[serde(default)]
    pub management: Vec<(String, String)>,
}

impl LinkSet {
    pub fn of_class(&self, class: LinkClass) -> &[(String, String)] {
        match class {
            LinkClass::Core => &self.core,
            LinkClass::Edge => &self.edge,
            LinkClass::Access => &self.access,
            LinkClass::Management => &self.management,
        }
    }

    /// All links with their class, in declaration order per class
    pub fn iter(&self) -> impl Iterator<Item = (LinkClass, &(String, String))> {
        [LinkClass::Core, LinkClass::Edge, LinkClass::Access, LinkClass::Management]
            .into_iter()
            .flat_map(move |class| self.of_class(class).iter().map(move |link| (class, link)))
    }
}

/// Attachment of a host to a customer VPN through a PE router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnSite {
    pub vpn: u32,
    pub router: String,
    pub host: String,
}

/// Ordered node and link collections handed to the generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyInput {
    #[serde(default)]
    pub routers: Vec<String>,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub controllers: Vec<String>,
    #[serde(default)]
    pub links: LinkSet,
    #[serde(default)]
    pub vpns: Vec<VpnSite>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_pair_reversal() {
        let pair = OrderedPair::new(Index::new(1).unwrap(), Index::new(2).unwrap());
        let reversed = pair.reversed();
        assert_eq!(reversed.left().get(), 2);
        assert_eq!(reversed.right().get(), 1);
        assert_ne!(pair, reversed);
        assert_eq!(reversed.reversed(), pair);
    }

    #[test]
    fn test_vpn_id_rejects_zero() {
        assert_eq!(VpnId::new(0), Err(PlanError::InvalidVpnId));
        assert_eq!(VpnId::new(5).unwrap().get(), 5);
    }

    #[test]
    fn test_link_set_iteration_order() {
        let links = LinkSet {
            core: vec![("r1".into(), "r2".into())],
            edge: vec![("r1".into(), "h1".into())],
            access: vec![],
            management: vec![("c1".into(), "r1".into())],
        };
        let classes: Vec<LinkClass> = links.iter().map(|(class, _)| class).collect();
        assert_eq!(classes, vec![LinkClass::Core, LinkClass::Edge, LinkClass::Management]);
    }
}

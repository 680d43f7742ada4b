//! Property records produced by a planning run.
//!
//! These are the data objects handed to whatever writes the deployment
//! descriptor. They serialize with serde so the writer can pick its format.

use crate::config::Profile;
use crate::topology::{Index, LinkClass, VpnId};
use ipnet::{IpNet, Ipv6Net};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Addresses of one router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterProperties {
    pub node: String,
    pub index: Index,
    /// `None` under the IPv4 profile
    pub loopback: Option<IpAddr>,
    /// OSPF-style router id, also used in IPv6 deployments
    pub router_id: Ipv4Addr,
    /// `None` under the IPv4 profile
    pub router_net: Option<IpNet>,
    pub mgmt: Option<IpAddr>,
}

/// Addresses of one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostProperties {
    pub node: String,
    pub index: Index,
    pub loopback: Option<IpAddr>,
    pub mgmt: Option<IpAddr>,
}

/// Addresses of one controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerProperties {
    pub node: String,
    pub index: Index,
    pub mgmt: Option<IpAddr>,
}

/// Subnet and endpoint addresses of one link.
///
/// `left_node`/`right_node` reflect the encoded order, which for edge, access
/// and management links may differ from the order the link was declared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkProperties {
    pub class: LinkClass,
    pub left_node: String,
    pub right_node: String,
    pub left: IpAddr,
    pub right: IpAddr,
    pub net: IpNet,
    pub prefix_len: u8,
}

/// Customer network and SID of one VPN site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VpnProperties {
    pub vpn: VpnId,
    pub router: String,
    pub host: String,
    pub net: IpNet,
    pub router_address: IpAddr,
    pub host_address: IpAddr,
    /// IPv6 profile only
    pub sid: Option<Ipv6Addr>,
    pub sid_family: Option<Ipv6Net>,
}

/// Complete output of one planning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressPlan {
    pub profile: Profile,
    pub routers: Vec<RouterProperties>,
    pub hosts: Vec<HostProperties>,
    pub controllers: Vec<ControllerProperties>,
    pub core_links: Vec<LinkProperties>,
    pub edge_links: Vec<LinkProperties>,
    pub access_links: Vec<LinkProperties>,
    pub mgmt_links: Vec<LinkProperties>,
    pub vpns: Vec<VpnProperties>,
}

impl AddressPlan {
    /// Every link record, core first
    pub fn links(&self) -> impl Iterator<Item = &LinkProperties> {
        self.core_links
            .iter()
            .chain(&self.edge_links)
            .chain(&self.access_links)
            .chain(&self.mgmt_links)
    }

    pub fn router(&self, node: &str) -> Option<&RouterProperties> {
        self.routers.iter().find(|router| router.node == node)
    }

    pub fn host(&self, node: &str) -> Option<&HostProperties> {
        self.hosts.iter().find(|host| host.node == node)
    }

    pub fn controller(&self, node: &str) -> Option<&ControllerProperties> {
        self.controllers.iter().find(|controller| controller.node == node)
    }

    /// Fill empty management addresses from the management links, first link wins
    pub(crate) fn apply_mgmt_addresses(&mut self) {
        for link in &self.mgmt_links {
            if let Some(controller) = self.controllers.iter_mut().find(|c| c.node == link.left_node) {
                controller.mgmt.get_or_insert(link.left);
            }
            if let Some(router) = self.routers.iter_mut().find(|r| r.node == link.right_node) {
                router.mgmt.get_or_insert(link.right);
            } else if let Some(host) = self.hosts.iter_mut().find(|h| h.node == link.right_node) {
                host.mgmt.get_or_insert(link.right);
            }
        }
    }
}

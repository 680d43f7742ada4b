//! Address plan orchestrator.
//!
//! This module walks the node and link lists of one topology once, calls the
//! allocators in a fixed order and assembles the property records. Routers
//! are registered first, then hosts and controllers, then links of every
//! class; a link endpoint that was never registered aborts the run.

use crate::config::{LinkScheme, Profile};
use crate::error::{PlanError, Result};
use crate::ip::{
    CustomerNetAllocator, Family, HostCursor, LinkNetAllocator, LoopbackAllocator,
    RouterIdAllocator, RouterNetAllocator, SidAllocator, SubnetPool,
};
use crate::properties::{
    AddressPlan, ControllerProperties, HostProperties, LinkProperties, RouterProperties,
    VpnProperties,
};
use crate::topology::{
    Index, LinkClass, NodeKind, OrderedPair, TopologyIndex, TopologyInput, VpnId, VpnSite,
};
use ipnet::Ipv6Net;
use log::{debug, info, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv6Addr};

/// Plan a whole topology in one go.
///
/// Runs every stage in order and returns the first error encountered.
pub fn plan(profile: Profile, topology: &TopologyInput) -> Result<AddressPlan> {
    info!(
        "Planning {:?} topology ({:?} links): {} routers, {} hosts, {} controllers",
        profile.family,
        profile.link_scheme,
        topology.routers.len(),
        topology.hosts.len(),
        topology.controllers.len()
    );

    let mut generator = PropertiesGenerator::new(profile);
    let routers = generator.routers_properties(&topology.routers)?;
    let hosts = generator.hosts_properties(&topology.hosts)?;
    let controllers = generator.controllers_properties(&topology.controllers)?;
    let core_links = generator.core_links_properties(&topology.links.core)?;
    let edge_links = generator.edge_links_properties(&topology.links.edge)?;
    let access_links = generator.access_links_properties(&topology.links.access)?;
    let mgmt_links = generator.mgmt_links_properties(&topology.links.management)?;
    let vpns = generator.vpn_properties(&topology.vpns)?;

    let mut plan = AddressPlan {
        profile,
        routers,
        hosts,
        controllers,
        core_links,
        edge_links,
        access_links,
        mgmt_links,
        vpns,
    };
    plan.apply_mgmt_addresses();

    info!("Address plan complete: {} nodes, {} links", generator.index().len(), plan.links().count());
    Ok(plan)
}

/// Stateful generator for one planning run.
///
/// The only state is the node index map and, under the pooled link scheme,
/// the per-class subnet pools. Use one generator per topology.
#[derive(Debug)]
pub struct PropertiesGenerator {
    profile: Profile,
    index: TopologyIndex,
    loopbacks: LoopbackAllocator,
    router_ids: RouterIdAllocator,
    router_nets: RouterNetAllocator,
    sids: SidAllocator,
    customers: CustomerNetAllocator,
    pools: HashMap<LinkClass, SubnetPool>,
}

impl PropertiesGenerator {
    pub fn new(profile: Profile) -> Self {
        PropertiesGenerator {
            profile,
            index: TopologyIndex::new(),
            loopbacks: LoopbackAllocator::default(),
            router_ids: RouterIdAllocator::default(),
            router_nets: RouterNetAllocator::default(),
            sids: SidAllocator::default(),
            customers: CustomerNetAllocator::new(profile.family),
            pools: HashMap::new(),
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn index(&self) -> &TopologyIndex {
        &self.index
    }

    /// Register routers in input order and compute their properties
    pub fn routers_properties<S: AsRef<str>>(&mut self, nodes: &[S]) -> Result<Vec<RouterProperties>> {
        let mut output = Vec::with_capacity(nodes.len());
        for node in nodes {
            let node = node.as_ref();
            let Some(index) = self.register(node, NodeKind::Router)? else {
                continue;
            };

            let (loopback, router_net) = match self.profile.family {
                Family::Ipv6 => (
                    Some(self.loopbacks.loopback_address(index)?),
                    Some(self.router_nets.router_net(index)?),
                ),
                Family::Ipv4 => (None, None),
            };
            let properties = RouterProperties {
                node: node.to_string(),
                index,
                loopback,
                router_id: self.router_ids.router_id(index)?,
                router_net,
                mgmt: None,
            };
            debug!("Router {}: {:?}", node, properties);
            output.push(properties);
        }
        info!("Registered {} routers", output.len());
        Ok(output)
    }

    /// Register hosts, continuing the router index sequence
    pub fn hosts_properties<S: AsRef<str>>(&mut self, nodes: &[S]) -> Result<Vec<HostProperties>> {
        let mut output = Vec::with_capacity(nodes.len());
        for node in nodes {
            let node = node.as_ref();
            let Some(index) = self.register(node, NodeKind::Host)? else {
                continue;
            };

            let loopback = match self.profile.family {
                Family::Ipv6 => Some(self.loopbacks.loopback_address(index)?),
                Family::Ipv4 => None,
            };
            let properties = HostProperties {
                node: node.to_string(),
                index,
                loopback,
                mgmt: None,
            };
            debug!("Host {}: {:?}", node, properties);
            output.push(properties);
        }
        info!("Registered {} hosts", output.len());
        Ok(output)
    }

    /// Register controllers, continuing the shared index sequence
    pub fn controllers_properties<S: AsRef<str>>(&mut self, nodes: &[S]) -> Result<Vec<ControllerProperties>> {
        let mut output = Vec::with_capacity(nodes.len());
        for node in nodes {
            let node = node.as_ref();
            let Some(index) = self.register(node, NodeKind::Controller)? else {
                continue;
            };
            output.push(ControllerProperties {
                node: node.to_string(),
                index,
                mgmt: None,
            });
        }
        info!("Registered {} controllers", output.len());
        Ok(output)
    }

    /// Router to router links, numbered (left, right) in declaration order
    pub fn core_links_properties<S: AsRef<str>>(&mut self, links: &[(S, S)]) -> Result<Vec<LinkProperties>> {
        self.links_properties(LinkClass::Core, links)
    }

    /// Router to customer-facing host links
    pub fn edge_links_properties<S: AsRef<str>>(&mut self, links: &[(S, S)]) -> Result<Vec<LinkProperties>> {
        self.links_properties(LinkClass::Edge, links)
    }

    /// Router to access host links
    pub fn access_links_properties<S: AsRef<str>>(&mut self, links: &[(S, S)]) -> Result<Vec<LinkProperties>> {
        self.links_properties(LinkClass::Access, links)
    }

    /// Controller to router (or host) links
    pub fn mgmt_links_properties<S: AsRef<str>>(&mut self, links: &[(S, S)]) -> Result<Vec<LinkProperties>> {
        self.links_properties(LinkClass::Management, links)
    }

    /// Customer networks and SIDs for every VPN site
    pub fn vpn_properties(&self, sites: &[VpnSite]) -> Result<Vec<VpnProperties>> {
        let mut output = Vec::with_capacity(sites.len());
        for site in sites {
            let vpn = VpnId::new(site.vpn)?;
            let (router, router_kind) = self.index.lookup(&site.router)?;
            let (host, host_kind) = self.index.lookup(&site.host)?;
            if router_kind != NodeKind::Router || host_kind != NodeKind::Host {
                return Err(PlanError::LinkClass {
                    class: LinkClass::Edge,
                    left: site.router.clone(),
                    right: site.host.clone(),
                });
            }

            let (sid, sid_family) = match self.profile.family {
                Family::Ipv6 => {
                    let router_id = self.router_ids.router_id(router)?;
                    (Some(self.sids.sid(router_id, vpn)?), Some(self.sids.sid_family(router_id)?))
                }
                Family::Ipv4 => (None, None),
            };
            let properties = VpnProperties {
                vpn,
                router: site.router.clone(),
                host: site.host.clone(),
                net: self.customers.net(vpn, host)?,
                router_address: self.customers.router_address(vpn, host)?,
                host_address: self.customers.host_address(vpn, host)?,
                sid,
                sid_family,
            };
            debug!("VPN {} site ({}, {}): {:?}", vpn, site.router, site.host, properties);
            output.push(properties);
        }
        info!("Resolved {} VPN sites", output.len());
        Ok(output)
    }

    /// SID of VPN `vpn` on a registered router
    pub fn sid(&self, router: &str, vpn: VpnId) -> Result<Ipv6Addr> {
        let router_id = self.router_ids.router_id(self.router_index(router)?)?;
        self.sids.sid(router_id, vpn)
    }

    /// SID family shared by every VPN of a registered router
    pub fn sid_family(&self, router: &str) -> Result<Ipv6Net> {
        let router_id = self.router_ids.router_id(self.router_index(router)?)?;
        self.sids.sid_family(router_id)
    }

    fn router_index(&self, router: &str) -> Result<Index> {
        match self.index.lookup(router)? {
            (index, NodeKind::Router) => Ok(index),
            (_, existing) => Err(PlanError::RoleConflict {
                node: router.to_string(),
                existing,
                requested: NodeKind::Router,
            }),
        }
    }

    /// Register a node, returning `None` for a repeat of the same node and kind
    fn register(&mut self, node: &str, kind: NodeKind) -> Result<Option<Index>> {
        if self.index.kind_of(node) == Some(kind) {
            warn!("{:?} '{}' listed more than once, skipping duplicate", kind, node);
            return Ok(None);
        }
        self.index.register(node, kind).map(Some)
    }

    fn links_properties<S: AsRef<str>>(&mut self, class: LinkClass, links: &[(S, S)]) -> Result<Vec<LinkProperties>> {
        let mut output = Vec::with_capacity(links.len());
        for (left, right) in links {
            let (left, right) = (left.as_ref(), right.as_ref());
            let (left_node, right_node, pair) = self.orient(class, left, right)?;

            let (net, left_address, right_address) = match self.profile.link_scheme {
                LinkScheme::Keyed => {
                    let allocator = self.link_allocator(class);
                    (allocator.net(pair)?, allocator.left_address(pair)?, allocator.right_address(pair)?)
                }
                LinkScheme::Pooled => {
                    let subnet = self.pool(class)?.next_subnet()?;
                    let mut hosts = HostCursor::new(subnet);
                    (subnet, hosts.next_host()?, hosts.next_host()?)
                }
            };

            let properties = LinkProperties {
                class,
                left_node: left_node.to_string(),
                right_node: right_node.to_string(),
                left: left_address,
                right: right_address,
                net,
                prefix_len: net.prefix_len(),
            };
            debug!("{:?} link ({}, {}): {:?}", class, left, right, properties);
            output.push(properties);
        }
        info!("Resolved {} {:?} links", output.len(), class);
        Ok(output)
    }

    /// Check endpoint kinds for `class` and put them in encoding order.
    ///
    /// Edge and access links always encode the router on the left and
    /// management links the controller, whatever the declaration order.
    fn orient<'a>(&self, class: LinkClass, a: &'a str, b: &'a str) -> Result<(&'a str, &'a str, OrderedPair)> {
        let (a_index, a_kind) = self.index.lookup(a)?;
        let (b_index, b_kind) = self.index.lookup(b)?;

        use NodeKind::{Controller, Host, Router};
        let swap = match (class, a_kind, b_kind) {
            (LinkClass::Core, Router, Router) => Some(false),
            (LinkClass::Edge | LinkClass::Access, Router, Host) => Some(false),
            (LinkClass::Edge | LinkClass::Access, Host, Router) => Some(true),
            (LinkClass::Management, Controller, Router | Host) => Some(false),
            (LinkClass::Management, Router | Host, Controller) => Some(true),
            _ => None,
        };

        match swap {
            Some(false) => Ok((a, b, OrderedPair::new(a_index, b_index))),
            Some(true) => Ok((b, a, OrderedPair::new(b_index, a_index))),
            None => Err(PlanError::LinkClass {
                class,
                left: a.to_string(),
                right: b.to_string(),
            }),
        }
    }

    fn link_allocator(&self, class: LinkClass) -> LinkNetAllocator {
        LinkNetAllocator::new(class, self.profile.family)
    }

    fn pool(&mut self, class: LinkClass) -> Result<&mut SubnetPool> {
        let block = self.link_allocator(class).layout().pool;
        match self.pools.entry(class) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(SubnetPool::new(block)?)),
        }
    }
}

/// First endpoint address of a link that lies outside its subnet, if any
pub fn stray_endpoint(link: &LinkProperties) -> Option<IpAddr> {
    [link.left, link.right].into_iter().find(|addr| !link.net.contains(addr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipnet::IpNet;

    fn ipv6() -> Profile {
        Profile::default()
    }

    fn links(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    }

    #[test]
    fn test_router_properties() {
        let mut generator = PropertiesGenerator::new(ipv6());
        let routers = generator.routers_properties(&["r1", "r2"]).unwrap();

        assert_eq!(routers[0].index.get(), 1);
        assert_eq!(routers[0].loopback, Some("fcff:1::1".parse().unwrap()));
        assert_eq!(routers[0].router_id.to_string(), "0.0.0.1");
        assert_eq!(routers[0].router_net, Some("fcff:1::/32".parse().unwrap()));
        assert_eq!(routers[1].router_id.to_string(), "0.0.0.2");
        assert_eq!(routers[1].mgmt, None);
    }

    #[test]
    fn test_hosts_continue_router_indices() {
        let mut generator = PropertiesGenerator::new(ipv6());
        generator.routers_properties(&["r1", "r2"]).unwrap();
        let hosts = generator.hosts_properties(&["h1"]).unwrap();
        assert_eq!(hosts[0].index.get(), 3);
        assert_eq!(hosts[0].loopback, Some("fcff:3::1".parse().unwrap()));
    }

    #[test]
    fn test_ipv4_profile_has_no_loopbacks() {
        let profile = Profile { family: Family::Ipv4, ..Profile::default() };
        let mut generator = PropertiesGenerator::new(profile);
        let routers = generator.routers_properties(&["r1"]).unwrap();
        assert_eq!(routers[0].loopback, None);
        assert_eq!(routers[0].router_net, None);
        assert_eq!(routers[0].router_id.to_string(), "0.0.0.1");
    }

    #[test]
    fn test_duplicate_node_is_skipped() {
        let mut generator = PropertiesGenerator::new(ipv6());
        let routers = generator.routers_properties(&["r1", "r1", "r2"]).unwrap();
        assert_eq!(routers.len(), 2);
        assert_eq!(routers[1].index.get(), 2);
    }

    #[test]
    fn test_core_link_example() {
        let mut generator = PropertiesGenerator::new(ipv6());
        generator.routers_properties(&["r1", "r2"]).unwrap();
        let link = &generator.core_links_properties(&links(&[("r1", "r2")])).unwrap()[0];

        assert_eq!(link.net, "fcf0:0:1:2::/64".parse::<IpNet>().unwrap());
        assert_eq!(link.left, "fcf0:0:1:2::1".parse::<IpAddr>().unwrap());
        assert_eq!(link.right, "fcf0:0:1:2::2".parse::<IpAddr>().unwrap());
        assert_eq!(link.prefix_len, 64);
        assert_eq!(stray_endpoint(link), None);
    }

    #[test]
    fn test_link_before_registration_fails() {
        let mut generator = PropertiesGenerator::new(ipv6());
        generator.routers_properties(&["r1"]).unwrap();
        assert_eq!(
            generator.core_links_properties(&links(&[("r1", "r2")])),
            Err(PlanError::UnknownNode { node: "r2".to_string() })
        );
    }

    #[test]
    fn test_edge_link_puts_router_left() {
        let mut generator = PropertiesGenerator::new(ipv6());
        generator.routers_properties(&["r1"]).unwrap();
        generator.hosts_properties(&["h1"]).unwrap();

        let declared = generator.edge_links_properties(&links(&[("r1", "h1")])).unwrap();
        let swapped = generator.edge_links_properties(&links(&[("h1", "r1")])).unwrap();
        assert_eq!(declared, swapped);
        assert_eq!(swapped[0].left_node, "r1");
        assert_eq!(swapped[0].net, "fcff:1:3:2::/64".parse::<IpNet>().unwrap());
    }

    #[test]
    fn test_wrong_endpoint_kinds() {
        let mut generator = PropertiesGenerator::new(ipv6());
        generator.routers_properties(&["r1"]).unwrap();
        generator.hosts_properties(&["h1", "h2"]).unwrap();

        assert!(matches!(
            generator.core_links_properties(&links(&[("r1", "h1")])),
            Err(PlanError::LinkClass { class: LinkClass::Core, .. })
        ));
        assert!(matches!(
            generator.access_links_properties(&links(&[("h1", "h2")])),
            Err(PlanError::LinkClass { class: LinkClass::Access, .. })
        ));
    }

    #[test]
    fn test_pooled_links() {
        let profile = Profile { link_scheme: LinkScheme::Pooled, ..Profile::default() };
        let mut generator = PropertiesGenerator::new(profile);
        generator.routers_properties(&["r1", "r2", "r3"]).unwrap();
        let core = generator
            .core_links_properties(&links(&[("r1", "r2"), ("r2", "r3")]))
            .unwrap();

        assert_eq!(core[0].net, "fcf0::/64".parse::<IpNet>().unwrap());
        assert_eq!(core[0].left, "fcf0::1".parse::<IpAddr>().unwrap());
        assert_eq!(core[0].right, "fcf0::2".parse::<IpAddr>().unwrap());
        assert_eq!(core[1].net, "fcf0:0:0:1::/64".parse::<IpNet>().unwrap());
    }

    #[test]
    fn test_sid_lookup() {
        let mut generator = PropertiesGenerator::new(ipv6());
        generator.routers_properties(&["r1"]).unwrap();
        generator.hosts_properties(&["h1"]).unwrap();

        let vpn = VpnId::new(5).unwrap();
        assert_eq!(generator.sid("r1", vpn).unwrap(), "fcff:1:2::5".parse::<Ipv6Addr>().unwrap());
        assert_eq!(generator.sid_family("r1").unwrap(), "fcff:1:2::/64".parse::<Ipv6Net>().unwrap());
        assert!(matches!(generator.sid("h1", vpn), Err(PlanError::RoleConflict { .. })));
        assert!(matches!(generator.sid("r9", vpn), Err(PlanError::UnknownNode { .. })));
    }

    #[test]
    fn test_vpn_sites() {
        let mut generator = PropertiesGenerator::new(ipv6());
        generator.routers_properties(&["r1"]).unwrap();
        generator.hosts_properties(&["h1"]).unwrap();

        let sites = vec![VpnSite { vpn: 5, router: "r1".to_string(), host: "h1".to_string() }];
        let vpn = &generator.vpn_properties(&sites).unwrap()[0];
        assert_eq!(vpn.net, "fd00:5:2::/48".parse::<IpNet>().unwrap());
        assert_eq!(vpn.router_address, "fd00:5:2::1".parse::<IpAddr>().unwrap());
        assert_eq!(vpn.host_address, "fd00:5:2::2".parse::<IpAddr>().unwrap());
        assert_eq!(vpn.sid, Some("fcff:1:2::5".parse().unwrap()));

        let bad = vec![VpnSite { vpn: 0, router: "r1".to_string(), host: "h1".to_string() }];
        assert_eq!(generator.vpn_properties(&bad), Err(PlanError::InvalidVpnId));
    }
}

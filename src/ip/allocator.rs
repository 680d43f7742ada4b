//! Keyed address allocators.
//!
//! Each allocator is a pure function of its key: calling it twice with the
//! same indices yields the same result, regardless of call order. The
//! allocators hold only their layout, so they can be shared freely between
//! planning runs.

use super::block::{addr_from_bits, v6_net_from_bits, Family};
use super::layout::{self, NodeLayout, PairLayout, LOOPBACK_HOST};
use crate::error::Result;
use crate::topology::{Index, LinkClass, OrderedPair, VpnId};
use ipnet::{IpNet, Ipv6Net};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Side of a link or site network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Left,
    Right,
}

/// Router loopbacks: `fcff:xxxx:0::1` inside `fcff:xxxx:0::/64`
#[derive(Debug, Clone, Copy)]
pub struct LoopbackAllocator {
    layout: NodeLayout,
}

impl Default for LoopbackAllocator {
    fn default() -> Self {
        LoopbackAllocator { layout: layout::LOOPBACK_V6 }
    }
}

impl LoopbackAllocator {
    pub fn loopback_address(&self, index: Index) -> Result<IpAddr> {
        self.layout.block.pack_address(&self.layout.fields(index.get() as u128, LOOPBACK_HOST))
    }

    /// The /64 the loopback address is announced with
    pub fn loopback_net(&self, index: Index) -> Result<IpNet> {
        self.layout.block.pack_network(&self.layout.fields(index.get() as u128, 0))
    }
}

/// Router summary networks: `fcff:xxxx::/32`
#[derive(Debug, Clone, Copy)]
pub struct RouterNetAllocator {
    layout: NodeLayout,
}

impl Default for RouterNetAllocator {
    fn default() -> Self {
        RouterNetAllocator { layout: layout::ROUTER_NET_V6 }
    }
}

impl RouterNetAllocator {
    pub fn router_net(&self, index: Index) -> Result<IpNet> {
        self.layout.block.pack_network(&self.layout.fields(index.get() as u128, 0))
    }
}

/// Router ids start from 0.0.0.1
#[derive(Debug, Clone, Copy)]
pub struct RouterIdAllocator {
    layout: NodeLayout,
}

impl Default for RouterIdAllocator {
    fn default() -> Self {
        RouterIdAllocator { layout: layout::ROUTER_ID }
    }
}

impl RouterIdAllocator {
    pub fn router_id(&self, index: Index) -> Result<Ipv4Addr> {
        let bits = self.layout.block.pack(&self.layout.fields(index.get() as u128, 0))?;
        Ok(Ipv4Addr::from(bits as u32))
    }
}

/// SIDs: `fcff:xxxx:2::tttt` for router id `xxxx` and VPN `tttt`.
///
/// All VPNs of one router share its SID family `fcff:xxxx:2::/64`.
#[derive(Debug, Clone, Copy)]
pub struct SidAllocator {
    layout: NodeLayout,
}

impl Default for SidAllocator {
    fn default() -> Self {
        SidAllocator { layout: layout::SID_V6 }
    }
}

impl SidAllocator {
    pub fn sid(&self, router_id: Ipv4Addr, vpn: VpnId) -> Result<Ipv6Addr> {
        let fields = self.layout.fields(u32::from(router_id) as u128, vpn.get() as u128);
        let bits = self.layout.block.pack(&fields)?;
        Ok(Ipv6Addr::from(bits))
    }

    pub fn sid_family(&self, router_id: Ipv4Addr) -> Result<Ipv6Net> {
        let bits = self.layout.block.pack(&self.layout.fields(u32::from(router_id) as u128, 0))?;
        v6_net_from_bits(bits, self.layout.block.sub_prefix())
    }
}

/// Link subnets keyed by the ordered pair of endpoint indices.
///
/// The left index is always the router (core: the first router, management:
/// the controller); the right index is the remote router, host or managed node.
#[derive(Debug, Clone, Copy)]
pub struct LinkNetAllocator {
    class: LinkClass,
    layout: PairLayout,
}

impl LinkNetAllocator {
    pub fn new(class: LinkClass, family: Family) -> Self {
        let layout = match class {
            LinkClass::Core => layout::core_link(family),
            LinkClass::Edge => layout::customer_facing(family),
            LinkClass::Access => layout::access(family),
            LinkClass::Management => layout::management(family),
        };
        LinkNetAllocator { class, layout }
    }

    pub fn class(&self) -> LinkClass {
        self.class
    }

    /// Prefix length of every network this allocator returns
    pub fn prefix_len(&self) -> u8 {
        self.layout.block.sub_prefix()
    }

    pub fn layout(&self) -> &PairLayout {
        &self.layout
    }

    pub fn net(&self, pair: OrderedPair) -> Result<IpNet> {
        net_of(&self.layout, pair.left().get() as u128, pair.right().get() as u128)
    }

    pub fn address(&self, pair: OrderedPair, endpoint: Endpoint) -> Result<IpAddr> {
        address_of(&self.layout, pair.left().get() as u128, pair.right().get() as u128, endpoint)
    }

    /// Address of the left router (or the controller on management links)
    pub fn left_address(&self, pair: OrderedPair) -> Result<IpAddr> {
        self.address(pair, Endpoint::Left)
    }

    /// Address of the right router, host or managed node
    pub fn right_address(&self, pair: OrderedPair) -> Result<IpAddr> {
        self.address(pair, Endpoint::Right)
    }
}

/// Customer VPN networks keyed by (VPN, host)
#[derive(Debug, Clone, Copy)]
pub struct CustomerNetAllocator {
    layout: PairLayout,
}

impl CustomerNetAllocator {
    pub fn new(family: Family) -> Self {
        CustomerNetAllocator { layout: layout::customer(family) }
    }

    pub fn prefix_len(&self) -> u8 {
        self.layout.block.sub_prefix()
    }

    pub fn net(&self, vpn: VpnId, host: Index) -> Result<IpNet> {
        net_of(&self.layout, vpn.get() as u128, host.get() as u128)
    }

    /// Address of the PE router on the customer network
    pub fn router_address(&self, vpn: VpnId, host: Index) -> Result<IpAddr> {
        address_of(&self.layout, vpn.get() as u128, host.get() as u128, Endpoint::Left)
    }

    pub fn host_address(&self, vpn: VpnId, host: Index) -> Result<IpAddr> {
        address_of(&self.layout, vpn.get() as u128, host.get() as u128, Endpoint::Right)
    }
}

fn net_of(layout: &PairLayout, left: u128, right: u128) -> Result<IpNet> {
    layout.block.pack_network(&layout.fields(left, right, 0))
}

fn address_of(layout: &PairLayout, left: u128, right: u128, endpoint: Endpoint) -> Result<IpAddr> {
    let role = match endpoint {
        Endpoint::Left => layout.left_role,
        Endpoint::Right => layout.right_role,
    };
    let bits = layout.block.pack(&layout.fields(left, right, role))?;
    Ok(addr_from_bits(layout.block.family(), bits))
}

//! Sequential allocation from a reserved block.
//!
//! A [`SubnetPool`] is a cursor over the sub-networks of one block, handed
//! out in address order; a [`HostCursor`] walks the usable hosts of one of
//! those sub-networks. Neither ever hands out the same value twice, and both
//! fail with `ExhaustedAddressSpace` once their finite range is used up.

use super::block::{addr_from_bits, bits_from_addr, net_from_bits, Family, ReservedBlock};
use crate::error::{PlanError, Result};
use ipnet::IpNet;
use std::net::IpAddr;

/// Cursor over the `2^(sub_prefix - prefix_len)` sub-networks of a block
#[derive(Debug, Clone)]
pub struct SubnetPool {
    block: ReservedBlock,
    next: u128,
    capacity: u128,
}

impl SubnetPool {
    pub fn new(block: ReservedBlock) -> Result<Self> {
        let bits = block.family().bits();
        if block.sub_prefix() < block.prefix_len() || block.sub_prefix() > bits {
            return Err(PlanError::EncodingOverflow {
                field: "sub-allocation prefix",
                value: block.sub_prefix() as u128,
                width: bits,
            });
        }
        let capacity = 1u128
            .checked_shl((block.sub_prefix() - block.prefix_len()) as u32)
            .unwrap_or(u128::MAX);
        Ok(SubnetPool { block, next: 0, capacity })
    }

    /// Total number of sub-networks in the block
    pub fn capacity(&self) -> u128 {
        self.capacity
    }

    /// Sub-networks not yet handed out
    pub fn remaining(&self) -> u128 {
        self.capacity - self.next
    }

    /// Hand out the next sub-network
    pub fn next_subnet(&mut self) -> Result<IpNet> {
        if self.next >= self.capacity {
            return Err(PlanError::ExhaustedAddressSpace {
                block: self.describe(),
            });
        }
        let step = (self.block.family().bits() - self.block.sub_prefix()) as u32;
        let offset = self.next.checked_shl(step).unwrap_or(0);
        let subnet = net_from_bits(
            self.block.family(),
            self.block.base_bits() | offset,
            self.block.sub_prefix(),
        )?;
        self.next += 1;
        Ok(subnet)
    }

    fn describe(&self) -> String {
        match self.block.network() {
            Ok(net) => net.to_string(),
            Err(_) => format!("{:?}", self.block),
        }
    }
}

/// Cursor over the usable hosts of one sub-network.
///
/// The network address and the all-ones address are never handed out, which
/// leaves `2^host_bits - 2` usable hosts.
#[derive(Debug, Clone)]
pub struct HostCursor {
    subnet: IpNet,
    next: u128,
    usable: u128,
}

impl HostCursor {
    pub fn new(subnet: IpNet) -> Self {
        let host_bits = (subnet.max_prefix_len() - subnet.prefix_len()) as u32;
        let size = 1u128.checked_shl(host_bits).unwrap_or(u128::MAX);
        HostCursor {
            subnet: subnet.trunc(),
            next: 0,
            usable: size.saturating_sub(2),
        }
    }

    pub fn subnet(&self) -> IpNet {
        self.subnet
    }

    /// Hosts not yet handed out
    pub fn remaining(&self) -> u128 {
        self.usable - self.next
    }

    /// Hand out the next host address
    pub fn next_host(&mut self) -> Result<IpAddr> {
        if self.next >= self.usable {
            return Err(PlanError::ExhaustedAddressSpace {
                block: self.subnet.to_string(),
            });
        }
        self.next += 1;
        let bits = bits_from_addr(self.subnet.network()) + self.next;
        let family = match self.subnet {
            IpNet::V4(_) => Family::Ipv4,
            IpNet::V6(_) => Family::Ipv6,
        };
        Ok(addr_from_bits(family, bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_subnets_in_address_order() {
        let block = ReservedBlock::v6(Ipv6Addr::new(0xfcf0, 0, 0, 0, 0, 0, 0, 0), 16, 64);
        let mut pool = SubnetPool::new(block).unwrap();
        assert_eq!(pool.next_subnet().unwrap(), "fcf0::/64".parse::<IpNet>().unwrap());
        assert_eq!(pool.next_subnet().unwrap(), "fcf0:0:0:1::/64".parse::<IpNet>().unwrap());
        assert_eq!(pool.remaining(), (1u128 << 48) - 2);
    }

    #[test]
    fn test_pool_exhausts_at_capacity() {
        // 2^(30 - 28) = 4 subnets
        let block = ReservedBlock::v4(Ipv4Addr::new(172, 16, 0, 0), 28, 30);
        let mut pool = SubnetPool::new(block).unwrap();
        assert_eq!(pool.capacity(), 4);

        let mut seen = HashSet::new();
        for _ in 0..4 {
            assert!(seen.insert(pool.next_subnet().unwrap()));
        }
        assert_eq!(
            pool.next_subnet(),
            Err(PlanError::ExhaustedAddressSpace { block: "172.16.0.0/28".to_string() })
        );
        // Exhaustion is sticky
        assert!(pool.next_subnet().is_err());
    }

    #[test]
    fn test_sub_prefix_shorter_than_block_is_rejected() {
        let block = ReservedBlock::v4(Ipv4Addr::new(10, 0, 0, 0), 16, 8);
        assert!(matches!(
            SubnetPool::new(block),
            Err(PlanError::EncodingOverflow { field: "sub-allocation prefix", .. })
        ));
    }

    #[test]
    fn test_hosts_skip_network_and_broadcast() {
        let mut hosts = HostCursor::new("11.0.32.8/30".parse().unwrap());
        assert_eq!(hosts.remaining(), 2);
        assert_eq!(hosts.next_host().unwrap(), "11.0.32.9".parse::<IpAddr>().unwrap());
        assert_eq!(hosts.next_host().unwrap(), "11.0.32.10".parse::<IpAddr>().unwrap());
        assert_eq!(
            hosts.next_host(),
            Err(PlanError::ExhaustedAddressSpace { block: "11.0.32.8/30".to_string() })
        );
    }

    #[test]
    fn test_ipv6_hosts() {
        let mut hosts = HostCursor::new("fcf0:0:0:1::/64".parse().unwrap());
        assert_eq!(hosts.next_host().unwrap(), "fcf0:0:0:1::1".parse::<IpAddr>().unwrap());
        assert_eq!(hosts.next_host().unwrap(), "fcf0:0:0:1::2".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_point_to_point_subnets_have_no_usable_hosts() {
        let mut hosts = HostCursor::new("10.0.0.0/31".parse().unwrap());
        assert_eq!(hosts.remaining(), 0);
        assert!(hosts.next_host().is_err());
    }
}

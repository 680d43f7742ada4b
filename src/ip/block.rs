//! Reserved address blocks and the bit-packing primitive.
//!
//! Every allocator in this crate encodes small integers into fixed bit
//! positions of a base prefix. A [`ReservedBlock`] owns one base prefix and
//! the prefix length of the networks carved out of it; [`BitField`]s describe
//! where each encoded value lives. All arithmetic happens on `u128`, with IPv4
//! values occupying the low 32 bits.

use crate::error::{PlanError, Result};
use ipnet::{IpNet, Ipv6Net};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Address family of a reserved block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Ipv4,
    #[default]
    Ipv6,
}

impl Family {
    /// Width of an address of this family in bits
    pub const fn bits(self) -> u8 {
        match self {
            Family::Ipv4 => 32,
            Family::Ipv6 => 128,
        }
    }
}

/// A named bit range inside an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub name: &'static str,
    pub shift: u8,
    pub width: u8,
}

impl BitField {
    pub const fn new(name: &'static str, shift: u8, width: u8) -> Self {
        BitField { name, shift, width }
    }

    /// Largest value the field can hold
    pub fn max_value(&self) -> u128 {
        if self.width >= 128 {
            u128::MAX
        } else {
            (1u128 << self.width) - 1
        }
    }

    /// Mask covering the field at its position
    pub fn mask(&self) -> u128 {
        self.max_value() << self.shift
    }

    /// Shift `value` into position, rejecting values wider than the field
    pub fn encode(&self, value: u128) -> Result<u128> {
        if value > self.max_value() {
            return Err(PlanError::EncodingOverflow {
                field: self.name,
                value,
                width: self.width,
            });
        }
        Ok(value << self.shift)
    }
}

/// A base prefix dedicated to one allocation purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedBlock {
    family: Family,
    base: u128,
    prefix_len: u8,
    sub_prefix: u8,
}

impl ReservedBlock {
    pub const fn v4(base: Ipv4Addr, prefix_len: u8, sub_prefix: u8) -> Self {
        ReservedBlock {
            family: Family::Ipv4,
            base: u32::from_be_bytes(base.octets()) as u128,
            prefix_len,
            sub_prefix,
        }
    }

    pub const fn v6(base: Ipv6Addr, prefix_len: u8, sub_prefix: u8) -> Self {
        ReservedBlock {
            family: Family::Ipv6,
            base: u128::from_be_bytes(base.octets()),
            prefix_len,
            sub_prefix,
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Prefix length of the networks produced from this block
    pub fn sub_prefix(&self) -> u8 {
        self.sub_prefix
    }

    /// Number of bits below the block prefix
    pub fn host_bits(&self) -> u8 {
        self.family.bits() - self.prefix_len
    }

    pub fn base_bits(&self) -> u128 {
        self.base
    }

    /// The block itself as a network
    pub fn network(&self) -> Result<IpNet> {
        net_from_bits(self.family, self.base, self.prefix_len)
    }

    /// Whether `addr` falls inside the block
    pub fn contains(&self, addr: IpAddr) -> bool {
        match self.network() {
            Ok(net) => net.contains(&addr),
            Err(_) => false,
        }
    }

    /// OR every `(field, value)` pair into the block base.
    ///
    /// Fails with `EncodingOverflow` when a value is wider than its field or
    /// when the field reaches into the block prefix.
    pub fn pack(&self, fields: &[(BitField, u128)]) -> Result<u128> {
        let mut bits = self.base;
        for (field, value) in fields {
            if field.shift as u16 + field.width as u16 > self.host_bits() as u16 {
                return Err(PlanError::EncodingOverflow {
                    field: field.name,
                    value: *value,
                    width: self.host_bits().saturating_sub(field.shift),
                });
            }
            bits |= field.encode(*value)?;
        }
        Ok(bits)
    }

    /// Pack the fields and return a single host address
    pub fn pack_address(&self, fields: &[(BitField, u128)]) -> Result<IpAddr> {
        let bits = self.pack(fields)?;
        Ok(addr_from_bits(self.family, bits))
    }

    /// Pack the fields and return the covering network at the sub-allocation prefix
    pub fn pack_network(&self, fields: &[(BitField, u128)]) -> Result<IpNet> {
        let bits = self.pack(fields)?;
        net_from_bits(self.family, bits, self.sub_prefix)
    }
}

pub(crate) fn addr_from_bits(family: Family, bits: u128) -> IpAddr {
    match family {
        Family::Ipv4 => IpAddr::V4(Ipv4Addr::from(bits as u32)),
        Family::Ipv6 => IpAddr::V6(Ipv6Addr::from(bits)),
    }
}

pub(crate) fn bits_from_addr(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

/// Build a network from raw bits, clearing everything below `prefix_len`
pub(crate) fn net_from_bits(family: Family, bits: u128, prefix_len: u8) -> Result<IpNet> {
    IpNet::new(addr_from_bits(family, bits), prefix_len)
        .map(|net| net.trunc())
        .map_err(|_| PlanError::EncodingOverflow {
            field: "prefix length",
            value: prefix_len as u128,
            width: family.bits(),
        })
}

pub(crate) fn v6_net_from_bits(bits: u128, prefix_len: u8) -> Result<Ipv6Net> {
    Ipv6Net::new(Ipv6Addr::from(bits), prefix_len)
        .map(|net| net.trunc())
        .map_err(|_| PlanError::EncodingOverflow {
            field: "prefix length",
            value: prefix_len as u128,
            width: 128,
        })
}

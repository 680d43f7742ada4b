//! Bit layouts for every address domain.
//!
//! IPv6 plan (operator space is fc00::/8, customer space is fd00::/8):
//!
//! ```text
//! fcff:xxxx::/32                 summary network of router xxxx
//! fcff:xxxx:0000::/64            loopback of router xxxx (address ::1)
//! fcff:xxxx:0002::/64            SID family of router xxxx, fcff:xxxx:2::tttt is the SID of VPN tttt
//! fcff:xxxx:0003:yyyy::/64       customer-facing link between router xxxx and host yyyy
//! fcfb:xxxx:0003:yyyy::/64       access link between router xxxx and host yyyy
//! fcf0:0000:xxxx:yyyy::/64       core link between routers xxxx and yyyy
//! fd00:vvvv:yyyy::/48            customer network of VPN vvvv towards host yyyy
//! 2000:0000:cccc:xxxx::/64       management link between controller cccc and router xxxx
//! ```
//!
//! IPv4 keeps only link-level domains; loopbacks and router networks are
//! not emitted for that family.

use super::block::{BitField, Family, ReservedBlock};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Host part of the address assigned to the left side of a link
pub const LEFT_ROLE: u8 = 1;
/// Host part of the address assigned to the right side of a link
pub const RIGHT_ROLE: u8 = 2;

/// Sub-block selector for loopbacks inside a router's /32
pub const LOOPBACK_TAG: u128 = 0;
/// Sub-block selector for SIDs inside a router's /32
pub const SID_TAG: u128 = 2;
/// Sub-block selector for customer-facing and access links
pub const CUSTOMER_FACING_TAG: u128 = 3;

/// Host part of a loopback address
pub const LOOPBACK_HOST: u128 = 1;

const V6_NODE: BitField = BitField::new("router index", 96, 16);
const V6_TAG: BitField = BitField::new("sub-block tag", 80, 16);
const V6_ROLE: BitField = BitField::new("role tag", 0, 16);

const FCFF: Ipv6Addr = Ipv6Addr::new(0xfcff, 0, 0, 0, 0, 0, 0, 0);
const FCFB: Ipv6Addr = Ipv6Addr::new(0xfcfb, 0, 0, 0, 0, 0, 0, 0);

/// Layout of a domain keyed by a single node index
#[derive(Debug, Clone, Copy)]
pub struct NodeLayout {
    pub block: ReservedBlock,
    pub index: BitField,
    pub tag: Option<(BitField, u128)>,
    pub low: BitField,
}

impl NodeLayout {
    /// Fields for `index`, with `low` ORed into the low bits
    pub fn fields(&self, index: u128, low: u128) -> Vec<(BitField, u128)> {
        let mut fields = vec![(self.index, index), (self.low, low)];
        if let Some(tag) = self.tag {
            fields.push(tag);
        }
        fields
    }
}

/// Layout of a domain keyed by an ordered pair of values
#[derive(Debug, Clone, Copy)]
pub struct PairLayout {
    pub block: ReservedBlock,
    pub left: BitField,
    pub right: BitField,
    pub tag: Option<(BitField, u128)>,
    pub role: BitField,
    pub left_role: u8,
    pub right_role: u8,
    /// Block drawn from sequentially when the link scheme is pooled
    pub pool: ReservedBlock,
}

impl PairLayout {
    /// Fields for the pair `(left, right)` with the given role tag
    pub fn fields(&self, left: u128, right: u128, role: u8) -> Vec<(BitField, u128)> {
        let mut fields = vec![(self.left, left), (self.right, right), (self.role, role as u128)];
        if let Some(tag) = self.tag {
            fields.push(tag);
        }
        fields
    }
}

pub const LOOPBACK_V6: NodeLayout = NodeLayout {
    block: ReservedBlock::v6(FCFF, 16, 64),
    index: V6_NODE,
    tag: Some((V6_TAG, LOOPBACK_TAG)),
    low: V6_ROLE,
};

pub const ROUTER_NET_V6: NodeLayout = NodeLayout {
    block: ReservedBlock::v6(FCFF, 16, 32),
    index: V6_NODE,
    tag: None,
    low: V6_ROLE,
};

pub const SID_V6: NodeLayout = NodeLayout {
    block: ReservedBlock::v6(FCFF, 16, 64),
    index: BitField::new("router id", 96, 16),
    tag: Some((V6_TAG, SID_TAG)),
    low: BitField::new("vpn id", 0, 16),
};

/// Router ids are the index itself, rendered as a dotted quad
pub const ROUTER_ID: NodeLayout = NodeLayout {
    block: ReservedBlock::v4(Ipv4Addr::UNSPECIFIED, 0, 32),
    index: BitField::new("router id", 0, 32),
    tag: None,
    low: BitField::new("unused", 0, 0),
};

const CORE_V6: PairLayout = PairLayout {
    block: ReservedBlock::v6(Ipv6Addr::new(0xfcf0, 0, 0, 0, 0, 0, 0, 0), 16, 64),
    left: BitField::new("left router index", 80, 16),
    right: BitField::new("right router index", 64, 16),
    tag: None,
    role: V6_ROLE,
    left_role: LEFT_ROLE,
    right_role: RIGHT_ROLE,
    pool: ReservedBlock::v6(Ipv6Addr::new(0xfcf0, 0, 0, 0, 0, 0, 0, 0), 16, 64),
};

const CORE_V4: PairLayout = PairLayout {
    block: ReservedBlock::v4(Ipv4Addr::new(11, 0, 0, 0), 8, 30),
    left: BitField::new("left router index", 13, 11),
    right: BitField::new("right router index", 2, 11),
    tag: None,
    role: BitField::new("role tag", 0, 2),
    left_role: LEFT_ROLE,
    right_role: RIGHT_ROLE,
    pool: ReservedBlock::v4(Ipv4Addr::new(11, 0, 0, 0), 8, 30),
};

const CUSTOMER_FACING_V6: PairLayout = PairLayout {
    block: ReservedBlock::v6(FCFF, 16, 64),
    left: V6_NODE,
    right: BitField::new("host index", 64, 16),
    tag: Some((V6_TAG, CUSTOMER_FACING_TAG)),
    role: V6_ROLE,
    left_role: LEFT_ROLE,
    right_role: RIGHT_ROLE,
    // fcff:0::/32 belongs to no router since index 0 is never assigned
    pool: ReservedBlock::v6(Ipv6Addr::new(0xfcff, 0, 3, 0, 0, 0, 0, 0), 48, 64),
};

const CUSTOMER_FACING_V4: PairLayout = PairLayout {
    block: ReservedBlock::v4(Ipv4Addr::new(192, 168, 0, 0), 16, 30),
    left: BitField::new("router index", 9, 7),
    right: BitField::new("host index", 2, 7),
    tag: None,
    role: BitField::new("role tag", 0, 2),
    left_role: LEFT_ROLE,
    right_role: RIGHT_ROLE,
    pool: ReservedBlock::v4(Ipv4Addr::new(192, 168, 0, 0), 16, 30),
};

const ACCESS_V6: PairLayout = PairLayout {
    block: ReservedBlock::v6(FCFB, 16, 64),
    pool: ReservedBlock::v6(Ipv6Addr::new(0xfcfb, 0, 3, 0, 0, 0, 0, 0), 48, 64),
    ..CUSTOMER_FACING_V6
};

const ACCESS_V4: PairLayout = PairLayout {
    block: ReservedBlock::v4(Ipv4Addr::new(10, 0, 0, 0), 16, 30),
    pool: ReservedBlock::v4(Ipv4Addr::new(10, 0, 0, 0), 16, 30),
    ..CUSTOMER_FACING_V4
};

const MANAGEMENT_V6: PairLayout = PairLayout {
    block: ReservedBlock::v6(Ipv6Addr::new(0x2000, 0, 0, 0, 0, 0, 0, 0), 16, 64),
    left: BitField::new("controller index", 80, 16),
    right: BitField::new("managed node index", 64, 16),
    tag: None,
    role: V6_ROLE,
    left_role: LEFT_ROLE,
    right_role: RIGHT_ROLE,
    pool: ReservedBlock::v6(Ipv6Addr::new(0x2000, 0, 0, 0, 0, 0, 0, 0), 16, 64),
};

const MANAGEMENT_V4: PairLayout = PairLayout {
    block: ReservedBlock::v4(Ipv4Addr::new(172, 0, 0, 0), 12, 30),
    left: BitField::new("controller index", 11, 9),
    right: BitField::new("managed node index", 2, 9),
    tag: None,
    role: BitField::new("role tag", 0, 2),
    left_role: LEFT_ROLE,
    right_role: RIGHT_ROLE,
    pool: ReservedBlock::v4(Ipv4Addr::new(172, 0, 0, 0), 12, 30),
};

const CUSTOMER_V6: PairLayout = PairLayout {
    block: ReservedBlock::v6(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 0), 8, 48),
    left: BitField::new("vpn id", 96, 16),
    right: BitField::new("host index", 80, 16),
    tag: None,
    role: V6_ROLE,
    left_role: LEFT_ROLE,
    right_role: RIGHT_ROLE,
    pool: ReservedBlock::v6(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 0), 8, 48),
};

// VPN ids start at 1, so 10.0.0.0/16 stays with the access block
const CUSTOMER_V4: PairLayout = PairLayout {
    block: ReservedBlock::v4(Ipv4Addr::new(10, 0, 0, 0), 8, 24),
    left: BitField::new("vpn id", 16, 8),
    right: BitField::new("host index", 8, 8),
    tag: None,
    role: BitField::new("role tag", 0, 8),
    left_role: LEFT_ROLE,
    right_role: RIGHT_ROLE,
    pool: ReservedBlock::v4(Ipv4Addr::new(10, 0, 0, 0), 8, 24),
};

pub fn core_link(family: Family) -> PairLayout {
    match family {
        Family::Ipv4 => CORE_V4,
        Family::Ipv6 => CORE_V6,
    }
}

pub fn customer_facing(family: Family) -> PairLayout {
    match family {
        Family::Ipv4 => CUSTOMER_FACING_V4,
        Family::Ipv6 => CUSTOMER_FACING_V6,
    }
}

pub fn access(family: Family) -> PairLayout {
    match family {
        Family::Ipv4 => ACCESS_V4,
        Family::Ipv6 => ACCESS_V6,
    }
}

pub fn management(family: Family) -> PairLayout {
    match family {
        Family::Ipv4 => MANAGEMENT_V4,
        Family::Ipv6 => MANAGEMENT_V6,
    }
}

pub fn customer(family: Family) -> PairLayout {
    match family {
        Family::Ipv4 => CUSTOMER_V4,
        Family::Ipv6 => CUSTOMER_V6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_layouts() -> Vec<PairLayout> {
        let mut layouts = Vec::new();
        for family in [Family::Ipv4, Family::Ipv6] {
            layouts.push(core_link(family));
            layouts.push(customer_facing(family));
            layouts.push(access(family));
            layouts.push(management(family));
            layouts.push(customer(family));
        }
        layouts
    }

    fn assert_disjoint(fields: &[BitField], host_bits: u8) {
        let mut seen = 0u128;
        for field in fields {
            assert!(
                field.shift as u16 + field.width as u16 <= host_bits as u16,
                "{} reaches into the block prefix",
                field.name
            );
            assert_eq!(seen & field.mask(), 0, "{} overlaps another field", field.name);
            seen |= field.mask();
        }
    }

    #[test]
    fn test_pair_fields_do_not_overlap() {
        for layout in pair_layouts() {
            let mut fields = vec![layout.left, layout.right, layout.role];
            if let Some((tag, _)) = layout.tag {
                fields.push(tag);
            }
            assert_disjoint(&fields, layout.block.host_bits());
        }
    }

    #[test]
    fn test_node_fields_do_not_overlap() {
        for layout in [LOOPBACK_V6, ROUTER_NET_V6, SID_V6] {
            let mut fields = vec![layout.index, layout.low];
            if let Some((tag, _)) = layout.tag {
                fields.push(tag);
            }
            assert_disjoint(&fields, layout.block.host_bits());
        }
    }

    #[test]
    fn test_role_tags_stay_below_sub_prefix() {
        for layout in pair_layouts() {
            let sub_host_bits = layout.block.family().bits() - layout.block.sub_prefix();
            assert!(layout.role.shift as u16 + layout.role.width as u16 <= sub_host_bits as u16);
            assert!((layout.right_role as u128) < (1u128 << sub_host_bits));
        }
    }

    #[test]
    fn test_pool_blocks_match_sub_prefix() {
        for layout in pair_layouts() {
            assert_eq!(layout.pool.family(), layout.block.family());
            assert_eq!(layout.pool.sub_prefix(), layout.block.sub_prefix());
        }
    }
}

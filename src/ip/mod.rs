//! IP address allocation module.
//!
//! This module carves disjoint address ranges out of a handful of reserved
//! prefixes. Keyed allocators encode node indices at fixed bit offsets;
//! pooled allocators hand out sub-networks and hosts in order.

pub mod block;
pub mod layout;
pub mod allocator;
pub mod pool;

// Re-export commonly used types
pub use block::{BitField, Family, ReservedBlock};
pub use allocator::{
    CustomerNetAllocator, Endpoint, LinkNetAllocator, LoopbackAllocator, RouterIdAllocator,
    RouterNetAllocator, SidAllocator,
};
pub use pool::{HostCursor, SubnetPool};

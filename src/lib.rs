//! # srv6plan - Address planning for emulated SRv6 networks
//!
//! This library computes deterministic, collision-free IPv4/IPv6 address
//! plans for a network topology made of routers, hosts, controllers and the
//! links between them.
//!
//! ## Overview
//!
//! Every node gets a small dense index in discovery order. Allocators encode
//! those indices at fixed bit positions inside a handful of reserved
//! prefixes, so each address domain (loopbacks, router networks, SIDs, link
//! subnets, customer VPN networks, management networks) lives in its own
//! disjoint range and the same topology always yields the same plan.
//!
//! ## Architecture
//!
//! - `ip`: reserved blocks, the bit-packing primitive, keyed and pooled allocators
//! - `topology`: topology input description and the per-run index map
//! - `properties`: router, host, controller, link and VPN records
//! - `orchestrator`: the properties generator tying it all together
//! - `config` / `config_loader`: YAML topology files and deployment profiles
//! - `error`: planning errors
//!
//! ## Example Usage
//!
//! ```rust
//! use srv6plan::config::Profile;
//! use srv6plan::orchestrator::plan;
//! use srv6plan::topology::TopologyInput;
//!
//! let mut topology = TopologyInput::default();
//! topology.routers = vec!["r1".to_string(), "r2".to_string()];
//! topology.links.core = vec![("r1".to_string(), "r2".to_string())];
//!
//! let plan = plan(Profile::default(), &topology)?;
//! assert_eq!(plan.routers[0].loopback.unwrap().to_string(), "fcff:1::1");
//! assert_eq!(plan.core_links[0].net.to_string(), "fcf0:0:1:2::/64");
//! # Ok::<(), srv6plan::error::PlanError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library functions return `Result<T, PlanError>`. A planning run stops at
//! the first unknown node, encoding overflow or exhausted pool; no partial
//! plan is ever returned.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod ip;
pub mod orchestrator;
pub mod properties;
pub mod topology;

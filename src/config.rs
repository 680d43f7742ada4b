use crate::ip::Family;
use crate::topology::TopologyInput;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How link-class subnets are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkScheme {
    /// Subnet is a pure function of the endpoint indices
    #[default]
    Keyed,
    /// Subnets are drawn in order from each link class's pool block
    Pooled,
}

/// Deployment profile: one address family and one link scheme per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub family: Family,
    #[serde(default)]
    pub link_scheme: LinkScheme,
}

/// Top-level topology description that mirrors the YAML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyConfig {
    #[serde(default)]
    pub profile: Profile,
    #[serde(flatten)]
    pub topology: TopologyInput,
}

impl TopologyConfig {
    /// Validate the topology description
    pub fn validate(&self) -> Result<(), ValidationError> {
        let topology = &self.topology;

        // Every node id must be non-empty and listed under one role only
        let mut roles: HashMap<&str, &str> = HashMap::new();
        let groups = [
            ("router", &topology.routers),
            ("host", &topology.hosts),
            ("controller", &topology.controllers),
        ];
        for (role, nodes) in groups {
            for node in nodes.iter() {
                if node.trim().is_empty() {
                    return Err(ValidationError::InvalidNode(format!(
                        "{} list contains an empty node id",
                        role
                    )));
                }
                if let Some(existing) = roles.insert(node.as_str(), role) {
                    if existing != role {
                        return Err(ValidationError::InvalidNode(format!(
                            "node '{}' is listed as both {} and {}",
                            node, existing, role
                        )));
                    }
                }
            }
        }

        for (class, (left, right)) in topology.links.iter() {
            if left == right {
                return Err(ValidationError::InvalidLink(format!(
                    "{:?} link ({}, {}) connects a node to itself",
                    class, left, right
                )));
            }
        }

        for site in &topology.vpns {
            if site.vpn == 0 {
                return Err(ValidationError::InvalidVpn(format!(
                    "site ({}, {}) uses VPN id 0",
                    site.router, site.host
                )));
            }
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid node configuration: {0}")]
    InvalidNode(String),
    #[error("Invalid link configuration: {0}")]
    InvalidLink(String),
    #[error("Invalid VPN configuration: {0}")]
    InvalidVpn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
profile:
  family: ipv4
  link_scheme: pooled
routers: [r1, r2]
hosts: [h1]
controllers: [c1]
links:
  core: [[r1, r2]]
  edge: [[h1, r1]]
  management: [[c1, r1]]
vpns:
  - { vpn: 5, router: r1, host: h1 }
"#;
        let config: TopologyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.profile.family, Family::Ipv4);
        assert_eq!(config.profile.link_scheme, LinkScheme::Pooled);
        assert_eq!(config.topology.routers, vec!["r1", "r2"]);
        assert_eq!(config.topology.links.edge, vec![("h1".to_string(), "r1".to_string())]);
        assert!(config.topology.links.access.is_empty());
        assert_eq!(config.topology.vpns[0].vpn, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: TopologyConfig = serde_yaml::from_str("routers: [r1]").unwrap();
        assert_eq!(config.profile, Profile { family: Family::Ipv6, link_scheme: LinkScheme::Keyed });
        assert!(config.topology.hosts.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut config: TopologyConfig = serde_yaml::from_str("routers: [r1, n1]\nhosts: [n1]").unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNode(_))));

        config.topology.hosts = vec!["  ".to_string()];
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNode(_))));

        config.topology.hosts.clear();
        config.topology.links.core.push(("r1".to_string(), "r1".to_string()));
        assert!(matches!(config.validate(), Err(ValidationError::InvalidLink(_))));

        config.topology.links.core.clear();
        config.topology.vpns.push(crate::topology::VpnSite {
            vpn: 0,
            router: "r1".to_string(),
            host: "h1".to_string(),
        });
        assert!(matches!(config.validate(), Err(ValidationError::InvalidVpn(_))));
    }

    #[test]
    fn test_duplicate_within_one_role_is_allowed() {
        let config: TopologyConfig = serde_yaml::from_str("routers: [r1, r1]").unwrap();
        assert!(config.validate().is_ok());
    }
}

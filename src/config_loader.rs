use crate::config::TopologyConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load, parse and validate a topology description from a YAML file
pub fn load_config(config_path: &Path) -> Result<TopologyConfig> {
    info!("Loading topology from: {:?}", config_path);

    // Open the topology file
    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open topology file '{}'", config_path.display()))?;

    // Parse the YAML content
    let config: TopologyConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse topology file '{}'", config_path.display()))?;

    // Validate the configuration
    config.validate()?;

    info!(
        "Loaded {:?} profile with {} routers, {} hosts, {} controllers",
        config.profile.family,
        config.topology.routers.len(),
        config.topology.hosts.len(),
        config.topology.controllers.len()
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkScheme;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_topology() {
        let yaml = r#"
profile:
  link_scheme: pooled
routers: [r1, r2]
links:
  core: [[r1, r2]]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.profile.link_scheme, LinkScheme::Pooled);
        assert_eq!(config.topology.links.core.len(), 1);
    }

    #[test]
    fn test_invalid_topology_is_rejected() {
        let yaml = r#"
routers: [r1]
hosts: [r1]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", yaml).unwrap();

        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid node configuration"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/topology.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to open topology file"));
    }
}

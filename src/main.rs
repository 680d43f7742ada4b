use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use srv6plan::config_loader;
use srv6plan::orchestrator::plan;

/// Address planning for emulated SRv6 network topologies
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the topology description YAML file
    #[arg(short, long)]
    topology: PathBuf,

    /// Print the resulting plan as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Topology file: {:?}", args.topology);
    let config = config_loader::load_config(&args.topology)?;

    let address_plan = plan(config.profile, &config.topology)
        .wrap_err_with(|| format!("Failed to plan addresses for '{}'", args.topology.display()))?;

    for router in &address_plan.routers {
        info!(
            "Router {} (index {}): router-id {}, loopback {}",
            router.node,
            router.index,
            router.router_id,
            router.loopback.map_or_else(|| "-".to_string(), |addr| addr.to_string())
        );
    }
    info!(
        "Links: {} core, {} edge, {} access, {} management; {} VPN sites",
        address_plan.core_links.len(),
        address_plan.edge_links.len(),
        address_plan.access_links.len(),
        address_plan.mgmt_links.len(),
        address_plan.vpns.len()
    );

    if args.json {
        let json = serde_json::to_string_pretty(&address_plan).wrap_err("Failed to serialize address plan")?;
        println!("{}", json);
    }

    info!("Address planning completed successfully");
    Ok(())
}

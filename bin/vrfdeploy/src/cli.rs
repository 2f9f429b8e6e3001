use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use vrfdeploy_core::EnvironmentId;

/// The network targeted when none is given.
const DEFAULT_NETWORK: &str = "hardhat";

#[derive(Parser)]
#[command(name = "vrfdeploy")]
#[command(
    author,
    version,
    about = "Deploy a VRF-consuming contract, mocking the coordinator on development chains"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "VRFDEPLOY_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The target environment: a network name from the registry or a numeric chain id.
    #[arg(short, long, env = "VRFDEPLOY_NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: EnvironmentId,

    /// Path to a Deploy.toml file, or to the directory containing it.
    ///
    /// Without it, only the built-in networks and `VRFDEPLOY_*` environment overrides apply.
    #[arg(short, long, alias = "conf", env = "VRFDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// The compiled artifact to deploy. Overrides `artifact` from the configuration.
    #[arg(long, env = "VRFDEPLOY_ARTIFACT")]
    pub artifact: Option<PathBuf>,

    /// Directory deployment records are written to, as `<dir>/<network>/<contract>.json`.
    #[arg(long, env = "VRFDEPLOY_RECORD_DIR", default_value = "deployments")]
    pub record_dir: PathBuf,

    /// Do not write a deployment record. Takes precedence over `--record-dir`.
    #[arg(long)]
    pub no_record: bool,

    /// Skip source verification even when an API key is configured.
    #[arg(long, env = "VRFDEPLOY_NO_VERIFY")]
    pub no_verify: bool,

    /// Print the environment registry and exit.
    #[arg(long)]
    pub list_networks: bool,

    /// Write the effective configuration to this path and exit.
    #[arg(long, value_name = "PATH")]
    pub dump_config: Option<PathBuf>,
}

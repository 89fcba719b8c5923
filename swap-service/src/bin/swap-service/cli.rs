use clap::Parser;
use std::path::PathBuf;
use swap_core::infrastructure::config::{CONFIG_PATH_ENV, DATA_DIR_ENV};
use swap_service::service::ServiceMode;

/// Env var the node URL override is written to; picked up by the config loader.
const NODE_URL_ENV: &str = "SWAP_SERVICE__NODE_RPC_URL";

#[derive(Parser, Debug)]
#[command(name = "swap-service")]
#[command(about = "CKB capacity/UDT swap service", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Override node RPC URL
    #[arg(short, long)]
    pub node_url: Option<String>,

    /// Log filter (e.g. "info", "debug,reqwest=info", "root=warn")
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Directory for rolling log files; console only when absent
    #[arg(long, env = "SWAP_LOG_DIR")]
    pub log_dir: Option<String>,

    /// Apply `[profiles.<name>]` overrides from the config file
    #[arg(short, long, env = "SWAP_PROFILE")]
    pub profile: Option<String>,

    /// Which half of the deployment to run
    #[arg(short, long, value_enum, env = "SWAP_MODE", default_value_t = ServiceMode::All)]
    pub mode: ServiceMode,

    /// Print the multisig structure, lock args and witness placeholder length, then exit
    #[arg(long)]
    pub print_multisig_args: bool,

    /// Print the reservation pools stored in the data directory, then exit
    #[arg(long)]
    pub pool_status: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn apply_to_env(&self) {
        if let Some(config_path) = &self.config {
            std::env::set_var(CONFIG_PATH_ENV, config_path);
        }

        if let Some(data_dir) = &self.data_dir {
            std::env::set_var(DATA_DIR_ENV, data_dir);
        }

        if let Some(node_url) = &self.node_url {
            std::env::set_var(NODE_URL_ENV, node_url);
        }
    }
}

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

pub mod private_key;

pub use private_key::PrivateKey;
use reqwest::Url;

use crate::artifacts::ContractSpec;

#[derive(Debug, Clone, Parser)]
#[clap(rename_all = "kebab-case", version, about)]
pub struct Args {
    /// Contract to deploy, either `Name` or `path/to/Source.sol:Name`
    #[clap(long, env = "VOTE_DEPLOYER_CONTRACT", default_value = "Vote")]
    pub contract: ContractSpec,

    /// Directory holding the compiled artifacts (Hardhat `artifacts` or Foundry `out`)
    #[clap(long, env = "VOTE_DEPLOYER_ARTIFACTS_DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Path to the deployment configuration file
    #[clap(short, long, env = "VOTE_DEPLOYER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Named network from the configuration file
    #[clap(short, long, env = "VOTE_DEPLOYER_NETWORK")]
    pub network: Option<String>,

    /// The RPC Url to use for the deployment
    #[clap(short, long, env)]
    pub rpc_url: Option<Url>,

    /// Private key to use for the deployment
    #[clap(short, long, env, hide_env_values = true)]
    pub private_key: Option<PrivateKey>,

    /// Number of blocks to wait for on top of the deployment transaction
    #[clap(long, env = "VOTE_DEPLOYER_CONFIRMATIONS")]
    pub confirmations: Option<usize>,

    /// How often to poll the node for the transaction receipt [default: 1000]
    #[clap(long, env = "VOTE_DEPLOYER_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Send a legacy (pre EIP-1559) transaction
    #[clap(
        long,
        env = "VOTE_DEPLOYER_LEGACY",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub legacy: bool,

    /// Write a deployment report to this path
    #[clap(long, env = "VOTE_DEPLOYER_REPORT")]
    pub report: Option<PathBuf>,
}

/// Help and version requests are not failures; every other parse error is.
pub fn parse_error_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

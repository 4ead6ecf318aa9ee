use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use eyre::{Context, ContextCompat};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::artifacts::ContractSpec;
use crate::cli::{Args, PrivateKey};
use crate::network::NetworkOptions;

pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_network: Option<String>,

    #[serde(default)]
    pub artifacts_dir: Option<PathBuf>,

    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,

    #[serde(default)]
    pub confirmations: Option<usize>,

    #[serde(default)]
    pub legacy: bool,
}

/// Everything a deployment needs, after merging the command line, the
/// environment and the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub contract: ContractSpec,
    pub artifacts_dir: PathBuf,
    pub network_name: Option<String>,
    pub rpc_url: Option<Url>,
    pub private_key: Option<PrivateKey>,
    pub network_options: NetworkOptions,
    pub report: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(args: Args, config: &Config) -> eyre::Result<Self> {
        let network_name =
            args.network.clone().or_else(|| config.default_network.clone());

        let network = network_name
            .as_ref()
            .map(|name| {
                config.networks.get(name).with_context(|| {
                    format!("Network {name} is not defined in the config")
                })
            })
            .transpose()?;

        let rpc_url = match (args.rpc_url, network) {
            (Some(rpc_url), _) => Some(rpc_url),
            (None, Some(network)) => {
                Some(network.rpc_url.parse::<Url>().with_context(|| {
                    format!("Invalid rpc_url {}", network.rpc_url)
                })?)
            }
            (None, None) => None,
        };

        let defaults = NetworkOptions::default();

        let confirmations = args
            .confirmations
            .or_else(|| network.and_then(|n| n.confirmations))
            .unwrap_or(defaults.confirmations);

        let legacy = args.legacy || network.map_or(false, |n| n.legacy);

        let artifacts_dir = args
            .artifacts_dir
            .or_else(|| config.artifacts_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));

        Ok(Self {
            contract: args.contract,
            artifacts_dir,
            network_name,
            rpc_url,
            private_key: args.private_key,
            network_options: NetworkOptions {
                confirmations,
                poll_interval: args
                    .poll_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.poll_interval),
                legacy,
            },
            report: args.report,
        })
    }
}

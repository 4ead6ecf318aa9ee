use ethers::types::{Address, H256, U64};

use crate::artifacts::ContractArtifact;
use crate::error::DeploymentError;

pub mod ethers_network;

pub use self::ethers_network::{EthersConnector, NetworkOptions};

/// A creation transaction accepted by the node but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeployment {
    pub transaction_hash: H256,
    pub deployer: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedDeployment {
    pub transaction_hash: H256,
    pub deployer: Address,
    pub block_number: Option<U64>,
    pub contract_address: Option<Address>,
}

pub trait DeploymentNetwork {
    fn chain_id(&self) -> u64;

    async fn submit(
        &self,
        artifact: &ContractArtifact,
    ) -> Result<PendingDeployment, DeploymentError>;

    /// Resolves once the creation transaction is included and successful.
    async fn wait_for_confirmation(
        &self,
        pending: PendingDeployment,
    ) -> Result<ConfirmedDeployment, DeploymentError>;
}

/// Opens the network a deployment is submitted through. Connecting is
/// deferred until an artifact has been resolved.
pub trait NetworkConnector {
    type Network: DeploymentNetwork;

    async fn connect(&self) -> Result<Self::Network, DeploymentError>;
}

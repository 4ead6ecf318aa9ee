use ethers::types::{Address, H256, U64};
use serde::{Deserialize, Serialize};

use crate::network::ConfirmedDeployment;
use crate::types::ContractAddress;

/// Outcome of a successful deployment.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ContractDeployment {
    pub contract: String,
    pub address: ContractAddress,
    pub transaction_hash: H256,
    pub deployer: Address,
    #[serde(default)]
    pub block_number: Option<U64>,
    pub chain_id: u64,
}

impl ContractDeployment {
    pub fn new(
        contract: impl ToString,
        address: ContractAddress,
        confirmed: &ConfirmedDeployment,
        chain_id: u64,
    ) -> Self {
        Self {
            contract: contract.to_string(),
            address,
            transaction_hash: confirmed.transaction_hash,
            deployer: confirmed.deployer,
            block_number: confirmed.block_number,
            chain_id,
        }
    }
}

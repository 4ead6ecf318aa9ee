use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::serde_utils;

pub mod contract_deployment;

use self::contract_deployment::ContractDeployment;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    #[serde(default)]
    pub network: Option<String>,

    pub deployment: ContractDeployment,
}

impl Report {
    pub fn new(network: Option<String>, deployment: ContractDeployment) -> Self {
        Self {
            network,
            deployment,
        }
    }

    #[instrument(skip(self))]
    pub async fn write(&self, path: &Path) -> eyre::Result<()> {
        serde_utils::write_serialize(path, self).await?;

        info!("Report written to {}", path.display());

        Ok(())
    }
}

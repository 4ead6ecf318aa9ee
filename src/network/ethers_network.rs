use std::sync::Arc;
use std::time::Duration;

use ethers::prelude::SignerMiddleware;
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::signers::{LocalWallet, Signer, Wallet};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Eip1559TransactionRequest, TransactionRequest};
use eyre::Context;
use reqwest::Url;
use tracing::{info, instrument};

use super::{
    ConfirmedDeployment, DeploymentNetwork, NetworkConnector,
    PendingDeployment,
};
use crate::artifacts::ContractArtifact;
use crate::cli::PrivateKey;
use crate::error::{ConfirmationFailure, DeploymentError};
use crate::interactive::resolve_credentials;

pub type RpcSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

#[derive(Debug, Clone)]
pub struct NetworkOptions {
    pub confirmations: usize,
    pub poll_interval: Duration,
    pub legacy: bool,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            confirmations: 1,
            poll_interval: Duration::from_millis(1000),
            legacy: false,
        }
    }
}

/// JSON-RPC node behind an ethers middleware stack. In production that is
/// an HTTP provider signing with a local key.
#[derive(Debug)]
pub struct EthersNetwork<M = RpcSigner> {
    client: Arc<M>,
    deployer: Address,
    chain_id: u64,
    options: NetworkOptions,
}

impl EthersNetwork<RpcSigner> {
    #[instrument(skip_all, fields(rpc_url = %rpc_url))]
    pub async fn connect(
        rpc_url: &Url,
        private_key: &PrivateKey,
        options: NetworkOptions,
    ) -> eyre::Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url.as_str())
            .with_context(|| format!("Invalid RPC url {rpc_url}"))?
            .interval(options.poll_interval);

        let chain_id = provider
            .get_chainid()
            .await
            .with_context(|| format!("Fetching chain id from {rpc_url}"))?
            .as_u64();

        let wallet =
            Wallet::from(private_key.key.clone()).with_chain_id(chain_id);
        let deployer = wallet.address();

        info!(chain_id, ?deployer, "Connected");

        let signer = SignerMiddleware::new(provider, wallet);

        Ok(Self::new(Arc::new(signer), deployer, chain_id, options))
    }
}

impl<M: Middleware> EthersNetwork<M> {
    pub fn new(
        client: Arc<M>,
        deployer: Address,
        chain_id: u64,
        options: NetworkOptions,
    ) -> Self {
        Self {
            client,
            deployer,
            chain_id,
            options,
        }
    }

    fn creation_transaction(
        &self,
        artifact: &ContractArtifact,
    ) -> TypedTransaction {
        let data = artifact.bytecode.clone();

        if self.options.legacy {
            TransactionRequest::new().from(self.deployer).data(data).into()
        } else {
            Eip1559TransactionRequest::new()
                .from(self.deployer)
                .data(data)
                .into()
        }
    }
}

impl<M> DeploymentNetwork for EthersNetwork<M>
where
    M: Middleware,
    M::Error: 'static,
{
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    #[instrument(skip_all, fields(contract = %artifact.contract_name))]
    async fn submit(
        &self,
        artifact: &ContractArtifact,
    ) -> Result<PendingDeployment, DeploymentError> {
        let mut tx = self.creation_transaction(artifact);

        self.client
            .fill_transaction(&mut tx, None)
            .await
            .map_err(DeploymentError::submission)?;

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(DeploymentError::submission)?;

        let transaction_hash = *pending;

        info!(?transaction_hash, "Deployment transaction sent");

        Ok(PendingDeployment {
            transaction_hash,
            deployer: self.deployer,
        })
    }

    #[instrument(skip_all, fields(transaction_hash = ?pending.transaction_hash))]
    async fn wait_for_confirmation(
        &self,
        pending: PendingDeployment,
    ) -> Result<ConfirmedDeployment, DeploymentError> {
        let transaction_hash = pending.transaction_hash;
        let fail = |failure| {
            DeploymentError::confirmation(transaction_hash, failure)
        };

        let receipt =
            PendingTransaction::new(transaction_hash, self.client.provider())
                .interval(self.options.poll_interval)
                .confirmations(self.options.confirmations)
                .await
                .map_err(|err| fail(ConfirmationFailure::Rpc(Box::new(err))))?
                .ok_or_else(|| fail(ConfirmationFailure::Dropped))?;

        if receipt.status != Some(1.into()) {
            return Err(fail(ConfirmationFailure::Reverted {
                block_number: receipt.block_number,
            }));
        }

        if let Some(address) = receipt.contract_address {
            let code = self
                .client
                .get_code(address, None)
                .await
                .map_err(|err| fail(ConfirmationFailure::Rpc(Box::new(err))))?;

            if code.is_empty() {
                return Err(fail(ConfirmationFailure::NoCode));
            }
        }

        info!(block_number = ?receipt.block_number, "Deployment confirmed");

        Ok(ConfirmedDeployment {
            transaction_hash,
            deployer: pending.deployer,
            block_number: receipt.block_number,
            contract_address: receipt.contract_address,
        })
    }
}

/// Connects with the configured credentials, prompting for missing ones,
/// only once a deployment actually needs the network.
#[derive(Debug, Clone)]
pub struct EthersConnector {
    rpc_url: Option<Url>,
    private_key: Option<PrivateKey>,
    options: NetworkOptions,
}

impl EthersConnector {
    pub fn new(
        rpc_url: Option<Url>,
        private_key: Option<PrivateKey>,
        options: NetworkOptions,
    ) -> Self {
        Self {
            rpc_url,
            private_key,
            options,
        }
    }
}

impl NetworkConnector for EthersConnector {
    type Network = EthersNetwork<RpcSigner>;

    async fn connect(&self) -> Result<Self::Network, DeploymentError> {
        let credentials =
            resolve_credentials(self.rpc_url.as_ref(), self.private_key.as_ref())
                .map_err(|err| {
                    DeploymentError::from_report(
                        "Missing deployment credentials",
                        err,
                    )
                })?;

        EthersNetwork::connect(
            &credentials.rpc_url,
            &credentials.private_key,
            self.options.clone(),
        )
        .await
        .map_err(|err| {
            DeploymentError::from_report(
                "Could not connect to the deployment network",
                err,
            )
        })
    }
}

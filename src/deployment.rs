use std::io::Write;

use eyre::Context;
use tracing::{info, instrument};

use crate::artifacts::{ArtifactStore, ContractFactoryProvider, ContractSpec};
use crate::cli::Args;
use crate::config::{Config, Settings};
use crate::error::DeploymentError;
use crate::network::{DeploymentNetwork, EthersConnector, NetworkConnector};
use crate::report::contract_deployment::ContractDeployment;
use crate::report::Report;
use crate::serde_utils;
use crate::types::ContractAddress;

/// Drives a single deployment: resolve, connect, submit, confirm, read the
/// address.
pub struct DeploymentRunner<F, C> {
    factory_provider: F,
    connector: C,
}

impl<F, C> DeploymentRunner<F, C>
where
    F: ContractFactoryProvider,
    C: NetworkConnector,
{
    pub fn new(factory_provider: F, connector: C) -> Self {
        Self {
            factory_provider,
            connector,
        }
    }

    /// Every step waits for the previous one; the first failure ends the
    /// deployment and nothing is retried. The network is only contacted once
    /// the artifact is known to exist.
    #[instrument(name = "deploy", skip_all, fields(contract = %contract))]
    pub async fn deploy(
        &self,
        contract: &ContractSpec,
    ) -> Result<ContractDeployment, DeploymentError> {
        let artifact = self.factory_provider.get_factory(contract).await?;

        info!(
            source = artifact.source_name.as_deref().unwrap_or("-"),
            functions = artifact.abi.functions().count(),
            bytecode_len = artifact.bytecode.len(),
            "Resolved artifact for {}",
            artifact.contract_name
        );

        let network = self.connector.connect().await?;

        let pending = network.submit(&artifact).await?;

        let confirmed = network.wait_for_confirmation(pending).await?;

        let address = ContractAddress::from_receipt(confirmed.contract_address)
            .ok_or_else(|| {
                DeploymentError::other(format!(
                    "Transaction {:?} was confirmed but its receipt carries no contract address",
                    confirmed.transaction_hash
                ))
            })?;

        info!(%address, "Deployed {}", artifact.contract_name);

        Ok(ContractDeployment::new(
            &artifact.contract_name,
            address,
            &confirmed,
            network.chain_id(),
        ))
    }
}

pub fn report_address(
    out: &mut impl Write,
    address: &ContractAddress,
) -> std::io::Result<()> {
    writeln!(out, "address {address}")?;
    out.flush()
}

/// Deploys, writes the optional report and only then prints the address,
/// so a failed run leaves `out` untouched.
pub async fn execute<F, C>(
    runner: &DeploymentRunner<F, C>,
    settings: &Settings,
    out: &mut impl Write,
) -> eyre::Result<()>
where
    F: ContractFactoryProvider,
    C: NetworkConnector,
{
    let deployment = runner.deploy(&settings.contract).await?;
    let address = deployment.address;

    if let Some(path) = settings.report.as_deref() {
        Report::new(settings.network_name.clone(), deployment)
            .write(path)
            .await
            .with_context(|| {
                format!("Contract was deployed at {address} but the report could not be written")
            })?;
    }

    report_address(out, &address)?;

    Ok(())
}

pub async fn run_deployment(
    args: Args,
    out: &mut impl Write,
) -> eyre::Result<()> {
    let config: Config = match args.config.as_ref() {
        Some(path) => serde_utils::read_deserialize(path).await?,
        None => Config::default(),
    };

    let settings = Settings::resolve(args, &config)?;

    let artifact_store = ArtifactStore::new(&settings.artifacts_dir);
    info!("Reading artifacts from {}", artifact_store.root().display());

    let connector = EthersConnector::new(
        settings.rpc_url.clone(),
        settings.private_key.clone(),
        settings.network_options.clone(),
    );

    let runner = DeploymentRunner::new(artifact_store, connector);

    execute(&runner, &settings, out).await
}

/// Logs a failed run and maps it to the process exit status.
pub fn exit_code(result: eyre::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            if let Some(err) = err.downcast_ref::<DeploymentError>() {
                tracing::error!(kind = %err.kind(), "Deployment failed");
            }

            tracing::error!("{:?}", err);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use clap::Parser;
    use ethers::abi::Abi;
    use ethers::types::{Address, H256, U64};
    use hex_literal::hex;

    use super::*;
    use crate::artifacts::ContractArtifact;
    use crate::error::{ConfirmationFailure, DeploymentErrorKind};
    use crate::network::{ConfirmedDeployment, PendingDeployment};

    const VOTE_ADDRESS: [u8; 20] = hex!("abc0000000000000000000000000000000000123");
    const TX_HASH: H256 = H256([0x42; 32]);

    type Calls = Arc<Mutex<Vec<&'static str>>>;

    #[derive(Clone, Copy)]
    enum Outcome {
        Succeed,
        Fail,
    }

    struct MockProvider {
        calls: Calls,
        known: &'static str,
    }

    impl ContractFactoryProvider for MockProvider {
        async fn get_factory(
            &self,
            contract: &ContractSpec,
        ) -> Result<ContractArtifact, DeploymentError> {
            self.calls.lock().unwrap().push("get_factory");

            if contract.name != self.known {
                return Err(DeploymentError::artifact_not_found(
                    contract, "unknown",
                ));
            }

            Ok(ContractArtifact {
                contract_name: contract.name.clone(),
                source_name: None,
                abi: Abi::default(),
                bytecode: vec![0x60, 0x80].into(),
            })
        }
    }

    #[derive(Clone)]
    struct MockNetwork {
        calls: Calls,
        submit: Outcome,
        confirm: Outcome,
        contract_address: Option<Address>,
    }

    impl DeploymentNetwork for MockNetwork {
        fn chain_id(&self) -> u64 {
            31337
        }

        async fn submit(
            &self,
            _artifact: &ContractArtifact,
        ) -> Result<PendingDeployment, DeploymentError> {
            self.calls.lock().unwrap().push("submit");

            match self.submit {
                Outcome::Succeed => Ok(PendingDeployment {
                    transaction_hash: TX_HASH,
                    deployer: Address::repeat_byte(0x01),
                }),
                Outcome::Fail => Err(DeploymentError::submission(
                    std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "insufficient funds for gas * price + value",
                    ),
                )),
            }
        }

        async fn wait_for_confirmation(
            &self,
            pending: PendingDeployment,
        ) -> Result<ConfirmedDeployment, DeploymentError> {
            self.calls.lock().unwrap().push("wait_for_confirmation");

            match self.confirm {
                Outcome::Succeed => Ok(ConfirmedDeployment {
                    transaction_hash: pending.transaction_hash,
                    deployer: pending.deployer,
                    block_number: Some(U64::from(7)),
                    contract_address: self.contract_address,
                }),
                Outcome::Fail => Err(DeploymentError::confirmation(
                    pending.transaction_hash,
                    ConfirmationFailure::Reverted {
                        block_number: Some(U64::from(7)),
                    },
                )),
            }
        }
    }

    impl NetworkConnector for MockNetwork {
        type Network = MockNetwork;

        async fn connect(&self) -> Result<MockNetwork, DeploymentError> {
            self.calls.lock().unwrap().push("connect");
            Ok(self.clone())
        }
    }

    fn runner(
        known: &'static str,
        submit: Outcome,
        confirm: Outcome,
        contract_address: Option<Address>,
    ) -> (DeploymentRunner<MockProvider, MockNetwork>, Calls) {
        let calls = Calls::default();

        let runner = DeploymentRunner::new(
            MockProvider {
                calls: calls.clone(),
                known,
            },
            MockNetwork {
                calls: calls.clone(),
                submit,
                confirm,
                contract_address,
            },
        );

        (runner, calls)
    }

    fn calls(calls: &Calls) -> Vec<&'static str> {
        calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn deploys_and_reports_address() {
        let (runner, log) = runner(
            "Vote",
            Outcome::Succeed,
            Outcome::Succeed,
            Some(Address::from(VOTE_ADDRESS)),
        );

        let deployment = runner.deploy(&ContractSpec::name("Vote")).await.unwrap();

        assert_eq!(
            calls(&log),
            vec!["get_factory", "connect", "submit", "wait_for_confirmation"]
        );
        assert_eq!(deployment.contract, "Vote");
        assert_eq!(deployment.transaction_hash, TX_HASH);
        assert_eq!(deployment.block_number, Some(U64::from(7)));
        assert_eq!(deployment.chain_id, 31337);

        let mut out = Vec::new();
        report_address(&mut out, &deployment.address).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert_eq!(
            out.to_lowercase(),
            "address 0xabc0000000000000000000000000000000000123\n"
        );
    }

    #[tokio::test]
    async fn unknown_contract_is_never_submitted() {
        let (runner, log) =
            runner("Vote", Outcome::Succeed, Outcome::Succeed, None);

        let err = runner
            .deploy(&ContractSpec::name("Ballot"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DeploymentErrorKind::ArtifactNotFound);
        assert_eq!(calls(&log), vec!["get_factory"]);
    }

    #[tokio::test]
    async fn rejected_submission_is_never_awaited() {
        let (runner, log) = runner(
            "Vote",
            Outcome::Fail,
            Outcome::Succeed,
            Some(Address::from(VOTE_ADDRESS)),
        );

        let err = runner.deploy(&ContractSpec::name("Vote")).await.unwrap_err();

        assert_eq!(err.kind(), DeploymentErrorKind::DeploymentSubmission);
        assert_eq!(calls(&log), vec!["get_factory", "connect", "submit"]);
    }

    #[tokio::test]
    async fn reverted_deployment_fails_confirmation() {
        let (runner, log) = runner(
            "Vote",
            Outcome::Succeed,
            Outcome::Fail,
            Some(Address::from(VOTE_ADDRESS)),
        );

        let err = runner.deploy(&ContractSpec::name("Vote")).await.unwrap_err();

        assert_eq!(err.kind(), DeploymentErrorKind::DeploymentConfirmation);
        assert_eq!(
            calls(&log),
            vec!["get_factory", "connect", "submit", "wait_for_confirmation"]
        );
    }

    #[tokio::test]
    async fn missing_address_is_never_reported() {
        for contract_address in [None, Some(Address::zero())] {
            let (runner, _) = runner(
                "Vote",
                Outcome::Succeed,
                Outcome::Succeed,
                contract_address,
            );

            let err =
                runner.deploy(&ContractSpec::name("Vote")).await.unwrap_err();

            assert_eq!(err.kind(), DeploymentErrorKind::Other);
        }
    }

    fn settings(extra: &[&str]) -> Settings {
        let mut argv = vec!["vote-deployer", "--rpc-url", "http://127.0.0.1:8545"];
        argv.extend_from_slice(extra);

        let args = Args::try_parse_from(argv).unwrap();

        Settings::resolve(args, &Config::default()).unwrap()
    }

    #[tokio::test]
    async fn failed_run_prints_nothing_and_exits_with_failure() {
        let (runner, _) = runner(
            "Vote",
            Outcome::Fail,
            Outcome::Succeed,
            Some(Address::from(VOTE_ADDRESS)),
        );

        let mut out = Vec::new();
        let result = execute(&runner, &settings(&[]), &mut out).await;

        assert_eq!(exit_code(result), 1);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn successful_run_prints_one_address_line() {
        let (runner, _) = runner(
            "Vote",
            Outcome::Succeed,
            Outcome::Succeed,
            Some(Address::from(VOTE_ADDRESS)),
        );

        let mut out = Vec::new();
        let result = execute(&runner, &settings(&[]), &mut out).await;

        assert_eq!(exit_code(result), 0);

        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out.to_lowercase(),
            "address 0xabc0000000000000000000000000000000000123\n"
        );
    }

    #[tokio::test]
    async fn report_is_written_before_the_address() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("reports").join("vote.yml");

        let (runner, _) = runner(
            "Vote",
            Outcome::Succeed,
            Outcome::Succeed,
            Some(Address::from(VOTE_ADDRESS)),
        );

        let mut out = Vec::new();
        execute(
            &runner,
            &settings(&["--report", report.to_str().unwrap()]),
            &mut out,
        )
        .await
        .unwrap();

        assert!(report.is_file());
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[tokio::test]
    async fn missing_artifact_fails_before_contacting_the_node() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts_dir = dir.path().join("missing");

        let args = Args::try_parse_from([
            "vote-deployer",
            "--artifacts-dir",
            artifacts_dir.to_str().unwrap(),
            "--rpc-url",
            "http://127.0.0.1:1",
            "--private-key",
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        ])
        .unwrap();

        let mut out = Vec::new();
        let err = run_deployment(args, &mut out).await.unwrap_err();

        let err = err.downcast_ref::<DeploymentError>().unwrap();
        assert_eq!(err.kind(), DeploymentErrorKind::ArtifactNotFound);
        assert!(out.is_empty());
    }
}

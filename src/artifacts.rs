use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ethers::abi::Abi;
use ethers::types::Bytes;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::DeploymentError;

/// Names a contract either by its bare name (`Vote`) or fully qualified
/// with the source it was compiled from (`contracts/Vote.sol:Vote`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSpec {
    pub path: Option<PathBuf>,
    pub name: String,
}

impl ContractSpec {
    pub fn path_name(path: impl Into<PathBuf>, name: impl ToString) -> Self {
        Self {
            path: Some(path.into()),
            name: name.to_string(),
        }
    }

    pub fn name(name: impl ToString) -> Self {
        Self {
            path: None,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ContractSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = self.path.as_deref() {
            write!(f, "{}:{}", path.display(), self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl FromStr for ContractSpec {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let spec = match s.rsplit_once(':') {
            Some((path, name)) => Self::path_name(path, name),
            None => Self::name(s),
        };

        if spec.name.is_empty() {
            eyre::bail!("Contract name is empty in {s:?}");
        }

        if spec.path.as_deref().map_or(false, |p| p.as_os_str().is_empty()) {
            eyre::bail!("Source path is empty in {s:?}");
        }

        Ok(spec)
    }
}

/// Compiled contract ready to be deployed.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: Option<String>,
    pub abi: Abi,
    pub bytecode: Bytes,
}

/// Resolves a contract name to something the network can deploy.
pub trait ContractFactoryProvider {
    async fn get_factory(
        &self,
        contract: &ContractSpec,
    ) -> Result<ContractArtifact, DeploymentError>;
}

/// Artifact JSON as written by Hardhat (`bytecode` is a hex string) or by
/// Foundry (`bytecode` is an object carrying the hex in `object`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    #[serde(default)]
    contract_name: Option<String>,
    #[serde(default)]
    source_name: Option<String>,
    abi: Abi,
    #[serde(default)]
    bytecode: Option<RawBytecode>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl RawBytecode {
    fn as_str(&self) -> &str {
        match self {
            Self::Hex(s) => s,
            Self::Object { object } => object,
        }
    }
}

const BUILD_INFO_DIR: &str = "build-info";
const LIBRARY_PLACEHOLDER: &str = "__$";

/// Reads compiled artifacts from a Hardhat `artifacts/` or Foundry `out/`
/// directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn locate(
        &self,
        contract: &ContractSpec,
    ) -> Result<PathBuf, DeploymentError> {
        if !self.root.is_dir() {
            return Err(DeploymentError::artifact_not_found(
                contract,
                format!(
                    "artifacts directory {} does not exist",
                    self.root.display()
                ),
            ));
        }

        let file_name = format!("{}.json", contract.name);

        if let Some(path) = contract.path.as_deref() {
            let mut candidates = vec![self.root.join(path).join(&file_name)];

            if let Some(source_file) = path.file_name() {
                candidates.push(self.root.join(source_file).join(&file_name));
            }

            for candidate in candidates {
                if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                    return Ok(candidate);
                }
            }

            return Err(DeploymentError::artifact_not_found(
                contract,
                format!("no artifact under {}", self.root.display()),
            ));
        }

        let mut matches = find_artifacts(&self.root, &file_name)
            .await
            .map_err(|err| {
                DeploymentError::other_with_source(
                    format!("Scanning {}", self.root.display()),
                    err,
                )
            })?;

        match matches.len() {
            0 => Err(DeploymentError::artifact_not_found(
                contract,
                format!("no artifact under {}", self.root.display()),
            )),
            1 => Ok(matches.remove(0)),
            _ => {
                matches.sort();
                let sources = matches
                    .iter()
                    .filter_map(|p| p.parent())
                    .filter_map(|p| p.strip_prefix(&self.root).ok())
                    .map(|p| format!("{}:{}", p.display(), contract.name))
                    .collect::<Vec<_>>()
                    .join(", ");

                Err(DeploymentError::artifact_not_found(
                    contract,
                    format!(
                        "name is ambiguous, use one of the fully qualified names: {sources}"
                    ),
                ))
            }
        }
    }
}

impl ContractFactoryProvider for ArtifactStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn get_factory(
        &self,
        contract: &ContractSpec,
    ) -> Result<ContractArtifact, DeploymentError> {
        let path = self.locate(contract).await?;

        debug!("Reading artifact from {}", path.display());

        let content = tokio::fs::read_to_string(&path).await.map_err(|err| {
            DeploymentError::other_with_source(
                format!("Reading from {}", path.display()),
                err,
            )
        })?;

        let file: ArtifactFile =
            serde_json::from_str(&content).map_err(|err| {
                DeploymentError::other_with_source(
                    format!("Parsing artifact {}", path.display()),
                    err,
                )
            })?;

        let raw = file.bytecode.as_ref().map(RawBytecode::as_str).unwrap_or("");
        let raw = raw.strip_prefix("0x").unwrap_or(raw);

        if raw.is_empty() {
            return Err(DeploymentError::artifact_not_found(
                contract,
                "artifact has no bytecode, the contract is abstract or an interface",
            ));
        }

        if raw.contains(LIBRARY_PLACEHOLDER) {
            return Err(DeploymentError::other(format!(
                "Bytecode of {contract} references unlinked libraries"
            )));
        }

        let bytecode = hex::decode(raw).map_err(|err| {
            DeploymentError::other_with_source(
                format!("Decoding bytecode of {}", path.display()),
                err,
            )
        })?;

        Ok(ContractArtifact {
            contract_name: file
                .contract_name
                .unwrap_or_else(|| contract.name.clone()),
            source_name: file.source_name,
            abi: file.abi,
            bytecode: bytecode.into(),
        })
    }
}

/// Collects every `<dir>.sol/<file_name>` below `root`.
async fn find_artifacts(
    root: &Path,
    file_name: &str,
) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_owned()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if entry.file_type().await?.is_dir() {
                if entry.file_name() != BUILD_INFO_DIR {
                    pending.push(path);
                }
                continue;
            }

            let in_source_dir = dir
                .extension()
                .map_or(false, |extension| extension == "sol");

            if in_source_dir && entry.file_name() == file_name {
                found.push(path);
            }
        }
    }

    Ok(found)
}

use ethers::types::{H256, U64};

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum DeploymentErrorKind {
    #[display(fmt = "ArtifactNotFound")]
    ArtifactNotFound,
    #[display(fmt = "DeploymentSubmissionError")]
    DeploymentSubmission,
    #[display(fmt = "DeploymentConfirmationError")]
    DeploymentConfirmation,
    #[display(fmt = "Other")]
    Other,
}

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("ArtifactNotFound: no deployable artifact for {contract}: {reason}")]
    ArtifactNotFound { contract: String, reason: String },

    #[error("DeploymentSubmissionError: deployment transaction was rejected")]
    DeploymentSubmission(#[source] BoxError),

    #[error("DeploymentConfirmationError: transaction {transaction_hash:?} {failure}")]
    DeploymentConfirmation {
        transaction_hash: H256,
        failure: ConfirmationFailure,
    },

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfirmationFailure {
    #[error("was dropped from the mempool")]
    Dropped,

    #[error("reverted in block {block_number:?}")]
    Reverted { block_number: Option<U64> },

    #[error("left no code at the created address")]
    NoCode,

    #[error("could not be polled")]
    Rpc(#[source] BoxError),
}

impl DeploymentError {
    pub fn kind(&self) -> DeploymentErrorKind {
        match self {
            Self::ArtifactNotFound { .. } => DeploymentErrorKind::ArtifactNotFound,
            Self::DeploymentSubmission(_) => {
                DeploymentErrorKind::DeploymentSubmission
            }
            Self::DeploymentConfirmation { .. } => {
                DeploymentErrorKind::DeploymentConfirmation
            }
            Self::Other { .. } => DeploymentErrorKind::Other,
        }
    }

    pub fn artifact_not_found(
        contract: impl ToString,
        reason: impl ToString,
    ) -> Self {
        Self::ArtifactNotFound {
            contract: contract.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn submission(
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DeploymentSubmission(Box::new(err))
    }

    pub fn confirmation(
        transaction_hash: H256,
        failure: ConfirmationFailure,
    ) -> Self {
        Self::DeploymentConfirmation {
            transaction_hash,
            failure,
        }
    }

    pub fn other(message: impl ToString) -> Self {
        Self::Other {
            message: message.to_string(),
            source: None,
        }
    }

    pub fn from_report(message: impl ToString, report: eyre::Report) -> Self {
        Self::Other {
            message: message.to_string(),
            source: Some(report.into()),
        }
    }

    pub fn other_with_source(
        message: impl ToString,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            message: message.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

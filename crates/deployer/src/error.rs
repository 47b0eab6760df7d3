use alloy_primitives::TxHash;
use std::{path::PathBuf, time::Duration};

/// Errors that can occur while deploying a contract.
///
/// A deployment either confirms or fails with one of these; there is no partial success.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("no artifact found for `{reference}` in {}", .dir.display())]
    ArtifactNotFound { reference: String, dir: PathBuf },
    #[error(
        "multiple artifacts found for `{reference}`, use a fully qualified name:\n{}",
        .candidates.join("\n")
    )]
    AmbiguousArtifact { reference: String, candidates: Vec<String> },
    #[error("invalid artifact {}: {reason}", .path.display())]
    InvalidArtifact { path: PathBuf, reason: String },
    #[error("invalid constructor arguments for {contract}: {reason}")]
    ConstructorArgs { contract: String, reason: String },
    #[error("failed to connect to the network: {0}")]
    Connection(String),
    #[error("deployment transaction rejected: {0}")]
    SubmissionRejected(String),
    #[error("transaction {tx_hash} was not confirmed within {}s", .timeout.as_secs())]
    ConfirmationTimeout { tx_hash: TxHash, timeout: Duration },
}

impl DeployError {
    /// Returns a stable name for the kind of error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArtifactNotFound { .. } => "ArtifactNotFound",
            Self::AmbiguousArtifact { .. } => "AmbiguousArtifact",
            Self::InvalidArtifact { .. } => "InvalidArtifact",
            Self::ConstructorArgs { .. } => "ConstructorArgs",
            Self::Connection(_) => "Connection",
            Self::SubmissionRejected(_) => "SubmissionRejected",
            Self::ConfirmationTimeout { .. } => "ConfirmationTimeout",
        }
    }

    pub(crate) fn connection(err: impl std::fmt::Display) -> Self {
        Self::Connection(err.to_string())
    }

    pub(crate) fn rejected(reason: impl std::fmt::Display) -> Self {
        Self::SubmissionRejected(reason.to_string())
    }
}

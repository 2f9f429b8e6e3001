//! Error types for a deployment run.

use alloy_core::primitives::B256;
use thiserror::Error;

/// Result alias used across the orchestration pipeline.
pub type DeployResult<T> = std::result::Result<T, DeployError>;

/// Errors raised by a deployment run.
///
/// Every variant except [`DeployError::VerificationFailed`] aborts the run.
/// Verification failures are reported in the run summary instead.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Environment '{environment}' is missing required config: {field}")]
    MissingRequiredConfig {
        environment: String,
        field: &'static str,
    },

    #[error("Environment '{environment}' has no signing credential (expected env var {env_var})")]
    MissingCredential { environment: String, env_var: String },

    #[error("Invalid configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to instantiate substitute oracle")]
    OracleInstantiationFailed(#[source] anyhow::Error),

    #[error("Failed to create oracle subscription")]
    SubscriptionCreationFailed(#[source] anyhow::Error),

    #[error("Failed to fund subscription {subscription_id}")]
    FundingFailed {
        subscription_id: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("Constructor expects {expected} arguments ({signature}), got {actual}")]
    ArgumentArityMismatch {
        expected: usize,
        actual: usize,
        signature: String,
    },

    #[error("Deployment transaction was rejected")]
    DeploymentReverted {
        tx_hash: Option<B256>,
        #[source]
        source: anyhow::Error,
    },

    #[error("Deployment {tx_hash} not confirmed after {waited_secs}s ({confirmations} confirmations required)")]
    DeploymentTimeout {
        tx_hash: B256,
        confirmations: u64,
        waited_secs: u64,
    },

    #[error("Source verification failed: {0}")]
    VerificationFailed(String),
}

impl DeployError {
    /// Whether this error aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::VerificationFailed(_))
    }
}

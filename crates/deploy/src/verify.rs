//! Best-effort source verification of a confirmed deployment.

use serde::Serialize;

use crate::{
    classifier::EnvironmentClass,
    config::Secret,
    error::DeployError,
    executor::{DeploymentArgs, DeploymentResult},
    traits::{SourceVerifier, VerificationRequest, VerificationResponse},
};

/// Why verification did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    #[strum(to_string = "ephemeral environment")]
    EphemeralEnvironment,
    #[strum(to_string = "no verification API key")]
    MissingCredential,
    #[strum(to_string = "disabled")]
    Disabled,
}

/// Result of the verification step. Never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerificationOutcome {
    Skipped { reason: SkipReason },
    Submitted { already_verified: bool },
    Failed { reason: String },
}

impl VerificationOutcome {
    /// The non-fatal error a failed verification is reported as.
    pub fn as_error(&self) -> Option<DeployError> {
        match self {
            Self::Failed { reason } => Some(DeployError::VerificationFailed(reason.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped { reason } => write!(f, "skipped ({reason})"),
            Self::Submitted {
                already_verified: true,
            } => f.write_str("already verified"),
            Self::Submitted { .. } => f.write_str("submitted"),
            Self::Failed { reason } => write!(f, "failed ({reason})"),
        }
    }
}

/// Submits deployments to a [`SourceVerifier`] when the environment allows it.
pub struct VerificationTrigger<'a, V> {
    verifier: &'a V,
    api_key: Option<&'a Secret>,
    enabled: bool,
}

impl<'a, V: SourceVerifier> VerificationTrigger<'a, V> {
    pub fn new(verifier: &'a V, api_key: Option<&'a Secret>) -> Self {
        Self {
            verifier,
            api_key,
            enabled: true,
        }
    }

    /// Turn verification off for this run regardless of credentials.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Verify `result` unless the environment is ephemeral or no API key is configured.
    pub async fn verify_if_applicable(
        &self,
        result: &DeploymentResult,
        args: &DeploymentArgs,
        class: EnvironmentClass,
    ) -> VerificationOutcome {
        if class == EnvironmentClass::Ephemeral {
            return skipped(SkipReason::EphemeralEnvironment);
        }
        if !self.enabled {
            return skipped(SkipReason::Disabled);
        }
        let Some(api_key) = self.api_key else {
            return skipped(SkipReason::MissingCredential);
        };

        tracing::info!(address = %result.address, "Verifying contract source...");

        let request = VerificationRequest {
            address: result.address,
            constructor_arguments: args.encode(),
            api_key: api_key.clone(),
        };

        match self.verifier.submit(&request).await {
            Ok(VerificationResponse::Accepted { reference }) => {
                tracing::info!(%reference, "Verification submitted");
                VerificationOutcome::Submitted {
                    already_verified: false,
                }
            }
            Ok(VerificationResponse::AlreadyVerified) => {
                tracing::info!(address = %result.address, "Contract already verified");
                VerificationOutcome::Submitted {
                    already_verified: true,
                }
            }
            Ok(VerificationResponse::Rejected { reason }) => {
                tracing::warn!(%reason, "Verification rejected");
                VerificationOutcome::Failed { reason }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Verification request failed");
                VerificationOutcome::Failed {
                    reason: format!("{e:#}"),
                }
            }
        }
    }
}

fn skipped(reason: SkipReason) -> VerificationOutcome {
    tracing::info!(%reason, "Skipping source verification");
    VerificationOutcome::Skipped { reason }
}

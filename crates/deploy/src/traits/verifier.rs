//! Source verification capability.

use std::future::Future;

use alloy_core::primitives::{Address, Bytes};
use anyhow::Result;

use crate::config::Secret;

/// What is sent to the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub address: Address,
    /// ABI-encoded constructor arguments, without selector.
    pub constructor_arguments: Bytes,
    pub api_key: Secret,
}

/// How the verification service answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResponse {
    /// Submission accepted; `reference` is the service's tracking id.
    Accepted { reference: String },
    /// The source was verified by an earlier run.
    AlreadyVerified,
    Rejected { reason: String },
}

/// An Etherscan-like source verification service.
pub trait SourceVerifier: Send + Sync {
    fn submit(
        &self,
        request: &VerificationRequest,
    ) -> impl Future<Output = Result<VerificationResponse>> + Send;
}

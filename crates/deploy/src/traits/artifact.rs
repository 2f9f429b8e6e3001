//! Contract creation capability.

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::Result;

/// Where a submitted deployment stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Not mined yet.
    Pending,
    /// Mined successfully; `depth` counts the inclusion block itself.
    Mined {
        address: Option<Address>,
        block_number: u64,
        depth: u64,
    },
    /// Mined, but execution reverted.
    Reverted { block_number: u64 },
}

/// Submits creation transactions and reports their confirmation depth.
pub trait ArtifactDeployer: Send + Sync {
    /// Submit `creation_code` (bytecode followed by encoded constructor arguments).
    ///
    /// An error means the environment rejected the submission.
    fn submit(&self, creation_code: Bytes) -> impl Future<Output = Result<B256>> + Send;

    /// Current status of a submitted deployment.
    fn status(&self, tx_hash: B256) -> impl Future<Output = Result<ConfirmationStatus>> + Send;
}

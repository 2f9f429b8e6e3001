//! Contract creation over JSON-RPC.

use alloy_core::primitives::{B256, Bytes};

use crate::{
    chain::{ChainClient, TransactionReceipt},
    traits::{ArtifactDeployer, ConfirmationStatus},
};

/// Submits creation transactions through a [`ChainClient`] and reads back their depth.
pub struct RpcArtifactDeployer<'a> {
    chain: &'a ChainClient,
}

impl<'a> RpcArtifactDeployer<'a> {
    pub fn new(chain: &'a ChainClient) -> Self {
        Self { chain }
    }
}

impl ArtifactDeployer for RpcArtifactDeployer<'_> {
    async fn submit(&self, creation_code: Bytes) -> anyhow::Result<B256> {
        self.chain.send_transaction(None, creation_code).await
    }

    async fn status(&self, tx_hash: B256) -> anyhow::Result<ConfirmationStatus> {
        let Some(receipt) = self.chain.receipt(tx_hash).await? else {
            return Ok(ConfirmationStatus::Pending);
        };
        let head = self.chain.block_number().await?;

        Ok(status_from_receipt(&receipt, head))
    }
}

/// Interpret a receipt against the current chain head.
fn status_from_receipt(receipt: &TransactionReceipt, head: u64) -> ConfirmationStatus {
    // Some nodes return pending receipts without a block number.
    let Some(block_number) = receipt.block_number() else {
        return ConfirmationStatus::Pending;
    };

    if !receipt.succeeded() {
        return ConfirmationStatus::Reverted { block_number };
    }

    ConfirmationStatus::Mined {
        address: receipt.contract_address,
        block_number,
        depth: head.saturating_sub(block_number) + 1,
    }
}

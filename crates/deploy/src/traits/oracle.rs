//! Substitute oracle capability.

use std::future::Future;

use alloy_core::primitives::{Address, B256, U256};
use anyhow::Result;

use crate::chain::Log;

/// Outcome of a state-changing call: its hash and the events it emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReceipt {
    pub tx_hash: B256,
    pub logs: Vec<Log>,
}

/// Operations against a substitute VRF coordinator.
///
/// Every method performs exactly one external call. None of them is retried by the caller:
/// repeating `create_subscription` would leave orphaned subscriptions behind.
pub trait OracleProvisioner: Send + Sync {
    /// Create a fresh coordinator instance and return its address.
    fn instantiate(&self) -> impl Future<Output = Result<Address>> + Send;

    /// Open a new subscription on `coordinator`.
    ///
    /// The subscription id is not returned directly; it is carried by the
    /// `SubscriptionCreated` event in the receipt.
    fn create_subscription(
        &self,
        coordinator: Address,
    ) -> impl Future<Output = Result<CallReceipt>> + Send;

    /// Fund `subscription_id` on `coordinator` with `amount` LINK wei.
    fn fund_subscription(
        &self,
        coordinator: Address,
        subscription_id: u64,
        amount: U256,
    ) -> impl Future<Output = Result<()>> + Send;
}

//! `VRFCoordinatorV2Mock` driven over JSON-RPC.

use std::path::PathBuf;

use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256, aliases::U96, ruint::UintTryFrom},
    sol_types::SolCall,
};
use anyhow::Context;

use crate::{
    artifact::Artifact,
    chain::{ChainClient, abi::VRFCoordinatorV2Mock},
    config::MockCoordinatorConfig,
    executor,
    traits::{CallReceipt, OracleProvisioner},
};

/// The coordinator takes its fees and LINK amounts as `uint96`.
fn to_uint96(value: U256, what: &str) -> anyhow::Result<U96> {
    U96::uint_try_from(value)
        .map_err(|_| anyhow::anyhow!("{} {} does not fit in uint96", what, value))
}

/// Deploys and drives a substitute coordinator through a [`ChainClient`].
///
/// The coordinator artifact is only read when a new instance is deployed.
pub struct RpcCoordinatorMock<'a> {
    chain: &'a ChainClient,
    artifact: PathBuf,
    base_fee: U256,
    gas_price_link: U256,
}

impl<'a> RpcCoordinatorMock<'a> {
    pub fn new(chain: &'a ChainClient, config: &MockCoordinatorConfig) -> Self {
        Self {
            chain,
            artifact: config.artifact.clone(),
            base_fee: config.base_fee,
            gas_price_link: config.gas_price_link,
        }
    }

    fn constructor_args(&self) -> anyhow::Result<Vec<DynSolValue>> {
        Ok(vec![
            DynSolValue::Uint(U256::from(to_uint96(self.base_fee, "Base fee")?), 96),
            DynSolValue::Uint(U256::from(to_uint96(self.gas_price_link, "Gas price")?), 96),
        ])
    }
}

impl OracleProvisioner for RpcCoordinatorMock<'_> {
    async fn instantiate(&self) -> anyhow::Result<Address> {
        let artifact = Artifact::load(&self.artifact)
            .context("Failed to load the mock coordinator artifact")?;
        let code = executor::creation_code(&artifact, &self.constructor_args()?)?;

        tracing::debug!(
            base_fee = %self.base_fee,
            gas_price_link = %self.gas_price_link,
            "Deploying VRF coordinator mock"
        );
        let receipt = self.chain.transact(None, code).await?;

        receipt
            .contract_address
            .context("Coordinator deployment receipt has no contract address")
    }

    async fn create_subscription(&self, coordinator: Address) -> anyhow::Result<CallReceipt> {
        let input = VRFCoordinatorV2Mock::createSubscriptionCall {}.abi_encode();
        let receipt = self.chain.transact(Some(coordinator), input.into()).await?;

        Ok(CallReceipt {
            tx_hash: receipt.transaction_hash,
            logs: receipt.logs,
        })
    }

    async fn fund_subscription(
        &self,
        coordinator: Address,
        subscription_id: u64,
        amount: U256,
    ) -> anyhow::Result<()> {
        let input = VRFCoordinatorV2Mock::fundSubscriptionCall {
            subId: subscription_id,
            amount: to_uint96(amount, "Funding amount")?,
        }
        .abi_encode();
        self.chain.transact(Some(coordinator), input.into()).await?;
        Ok(())
    }
}

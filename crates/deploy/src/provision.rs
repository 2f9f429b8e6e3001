//! Oracle dependency resolution and the mock provisioner for ephemeral networks.

use alloy_core::{
    primitives::{Address, U256},
    sol_types::SolEvent,
};
use anyhow::Context;
use serde::Serialize;

use crate::{
    chain::{Log, abi::VRFCoordinatorV2Mock::SubscriptionCreated},
    classifier::EnvironmentClass,
    error::{DeployError, DeployResult},
    registry::DependencyConfig,
    traits::OracleProvisioner,
};

/// Amount every mock subscription is funded with: 1000 LINK, in wei.
///
/// Far above what any local test run consumes.
pub const MOCK_FUND_AMOUNT: U256 = U256::from_limbs([0x35c9_adc5_dea0_0000, 0x36, 0, 0]);

/// A substitute coordinator provisioned for the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MockOracleHandle {
    pub coordinator: Address,
    pub subscription_id: u64,
    /// LINK wei the subscription was funded with.
    pub funded_amount: U256,
}

/// Oracle wiring of a persistent environment, checked to be complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersistentDependencies {
    pub oracle_address: Address,
    pub subscription_id: u64,
}

impl PersistentDependencies {
    /// Take the oracle address and subscription verbatim from the registry entry.
    pub fn from_config(environment: &str, config: &DependencyConfig) -> DeployResult<Self> {
        let oracle_address =
            config
                .oracle_address
                .ok_or_else(|| DeployError::MissingRequiredConfig {
                    environment: environment.to_string(),
                    field: "oracle_address",
                })?;
        let subscription_id =
            config
                .subscription_id
                .ok_or_else(|| DeployError::MissingRequiredConfig {
                    environment: environment.to_string(),
                    field: "subscription_id",
                })?;

        Ok(Self {
            oracle_address,
            subscription_id,
        })
    }
}

/// Oracle dependencies resolved once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum ResolvedDependencies {
    Ephemeral(MockOracleHandle),
    Persistent(PersistentDependencies),
}

impl ResolvedDependencies {
    pub fn class(&self) -> EnvironmentClass {
        match self {
            Self::Ephemeral(_) => EnvironmentClass::Ephemeral,
            Self::Persistent(_) => EnvironmentClass::Persistent,
        }
    }

    pub fn oracle_address(&self) -> Address {
        match self {
            Self::Ephemeral(handle) => handle.coordinator,
            Self::Persistent(deps) => deps.oracle_address,
        }
    }

    pub fn subscription_id(&self) -> u64 {
        match self {
            Self::Ephemeral(handle) => handle.subscription_id,
            Self::Persistent(deps) => deps.subscription_id,
        }
    }
}

/// Find the subscription id in the `SubscriptionCreated` event emitted by `coordinator`.
///
/// Matches by emitter and event topic, so unrelated or reordered logs do not matter.
pub fn extract_subscription_id(coordinator: Address, logs: &[Log]) -> anyhow::Result<u64> {
    let log = logs
        .iter()
        .find(|log| {
            log.address == coordinator
                && log.topics.first() == Some(&SubscriptionCreated::SIGNATURE_HASH)
        })
        .context("No SubscriptionCreated event in the subscription receipt")?;

    let event = SubscriptionCreated::decode_raw_log(log.topics.iter().copied(), &log.data)
        .context("Malformed SubscriptionCreated event")?;

    Ok(event.subId)
}

/// Provisions a funded subscription on a substitute coordinator.
pub struct MockProvisioner<'a, O> {
    oracle: &'a O,
    fund_amount: U256,
    existing_coordinator: Option<Address>,
}

impl<'a, O: OracleProvisioner> MockProvisioner<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            fund_amount: MOCK_FUND_AMOUNT,
            existing_coordinator: None,
        }
    }

    /// Override the funding threshold.
    pub fn fund_amount(mut self, amount: U256) -> Self {
        self.fund_amount = amount;
        self
    }

    /// Reuse a coordinator already running on the local chain instead of creating one.
    pub fn existing_coordinator(mut self, coordinator: Option<Address>) -> Self {
        self.existing_coordinator = coordinator;
        self
    }

    /// Instantiate (or reuse) the coordinator, open a subscription and fund it.
    ///
    /// Any failing step aborts; resources created by earlier steps are left behind.
    pub async fn provision(&self) -> DeployResult<MockOracleHandle> {
        let coordinator = match self.existing_coordinator {
            Some(coordinator) => {
                tracing::info!(%coordinator, "Reusing substitute VRF coordinator");
                coordinator
            }
            None => {
                let coordinator = self
                    .oracle
                    .instantiate()
                    .await
                    .map_err(DeployError::OracleInstantiationFailed)?;
                tracing::info!(%coordinator, "Substitute VRF coordinator deployed");
                coordinator
            }
        };

        let receipt = self
            .oracle
            .create_subscription(coordinator)
            .await
            .map_err(DeployError::SubscriptionCreationFailed)?;
        let subscription_id = extract_subscription_id(coordinator, &receipt.logs)
            .map_err(DeployError::SubscriptionCreationFailed)?;
        tracing::info!(
            subscription_id,
            tx_hash = %receipt.tx_hash,
            "Mock subscription created"
        );

        self.oracle
            .fund_subscription(coordinator, subscription_id, self.fund_amount)
            .await
            .map_err(|source| DeployError::FundingFailed {
                subscription_id,
                source,
            })?;
        tracing::info!(
            subscription_id,
            amount = %self.fund_amount,
            "Mock subscription funded"
        );

        Ok(MockOracleHandle {
            coordinator,
            subscription_id,
            funded_amount: self.fund_amount,
        })
    }
}

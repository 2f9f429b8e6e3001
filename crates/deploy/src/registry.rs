//! Environment registry: the static table of target networks and their oracle dependencies.

use std::{collections::BTreeMap, time::Duration};

use alloy_core::primitives::{Address, B256, U256};
use derive_more::{Deref, Display};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    config::amount,
    error::{DeployError, DeployResult},
};

/// Confirmation depth used when a network does not configure one.
pub const DEFAULT_BLOCK_CONFIRMATIONS: u64 = 1;

/// Upper bound on the confirmation wait when a network does not configure one.
///
/// Fifteen minutes comfortably covers several confirmations on slow public testnets.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 900;

/// Interval between receipt polls when a network does not configure one.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Identifier selecting one registry entry: either its name or its numeric chain id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, Serialize, Deserialize)]
pub struct EnvironmentId(String);

impl EnvironmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EnvironmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EnvironmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for EnvironmentId {
    fn from(chain_id: u64) -> Self {
        Self(chain_id.to_string())
    }
}

/// Oracle wiring and constructor parameters for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// Address of the VRF coordinator. Required on persistent networks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_address: Option<Address>,
    /// Pre-registered VRF subscription. Required on persistent networks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<u64>,
    /// Entrance fee, in wei.
    #[serde(with = "amount")]
    pub entrance_fee: U256,
    /// VRF key hash selecting the gas lane.
    pub gas_lane: B256,
    /// Gas limit for the VRF fulfillment callback.
    pub callback_gas_limit: u32,
    /// Automation upkeep interval, in seconds.
    pub update_interval: u64,
}

/// Connection parameters and dependency configuration for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// The chain id the endpoint must report.
    pub chain_id: u64,
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Name of the environment variable holding the deployer private key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_key_env: Option<String>,
    /// Number of blocks a deployment must be buried under before it is final.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_confirmations: Option<u64>,
    /// Upper bound on the confirmation wait, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,
    /// Interval between receipt polls, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(flatten)]
    pub dependencies: DependencyConfig,
}

impl NetworkConfig {
    /// Confirmation depth, defaulting to 1. A configured 0 still waits for inclusion.
    pub fn confirmations(&self) -> u64 {
        self.block_confirmations
            .unwrap_or(DEFAULT_BLOCK_CONFIRMATIONS)
            .max(1)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(
            self.confirmation_timeout_secs
                .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }
}

/// A registry entry resolved from an [`EnvironmentId`].
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry<'a> {
    /// Registry key of the entry (independent of how it was looked up).
    pub name: &'a str,
    pub network: &'a NetworkConfig,
}

impl<'a> RegistryEntry<'a> {
    pub fn dependencies(&self) -> &'a DependencyConfig {
        &self.network.dependencies
    }
}

/// Read-only view over the configured networks.
#[derive(Debug, Clone, Copy)]
pub struct Registry<'a> {
    networks: &'a BTreeMap<String, NetworkConfig>,
}

impl<'a> Registry<'a> {
    pub fn new(networks: &'a BTreeMap<String, NetworkConfig>) -> Self {
        Self { networks }
    }

    /// Resolve an environment by name, falling back to its numeric chain id.
    ///
    /// When several entries share a chain id, the first one in name order wins.
    pub fn lookup(&self, id: &EnvironmentId) -> DeployResult<RegistryEntry<'a>> {
        if let Some((name, network)) = self.networks.get_key_value(id.as_str()) {
            return Ok(RegistryEntry { name, network });
        }

        id.parse::<u64>()
            .ok()
            .and_then(|chain_id| {
                self.networks
                    .iter()
                    .find(|(_, network)| network.chain_id == chain_id)
            })
            .map(|(name, network)| RegistryEntry { name, network })
            .ok_or_else(|| DeployError::UnknownEnvironment(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = RegistryEntry<'a>> + 'a {
        self.networks
            .iter()
            .map(|(name, network)| RegistryEntry { name, network })
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::primitives::address;

    use super::*;

    fn network(chain_id: u64) -> NetworkConfig {
        NetworkConfig {
            chain_id,
            rpc_url: Url::parse("http://127.0.0.1:8545").unwrap(),
            signer_key_env: None,
            block_confirmations: None,
            confirmation_timeout_secs: None,
            poll_interval_ms: None,
            dependencies: DependencyConfig {
                oracle_address: None,
                subscription_id: None,
                entrance_fee: U256::from(10u64).pow(U256::from(18u64)),
                gas_lane: B256::repeat_byte(0xab),
                callback_gas_limit: 500_000,
                update_interval: 30,
            },
        }
    }

    fn networks() -> BTreeMap<String, NetworkConfig> {
        let mut testnet = network(97);
        testnet.dependencies.oracle_address =
            Some(address!("0x6a2aad07396b36fe02a22b33cf443582f682c82f"));
        testnet.dependencies.subscription_id = Some(42);
        testnet.block_confirmations = Some(6);

        BTreeMap::from([
            ("local".to_string(), network(31337)),
            ("localhost".to_string(), network(31337)),
            ("testnet".to_string(), testnet),
        ])
    }

    #[test]
    fn test_lookup_by_name() {
        let networks = networks();
        let registry = Registry::new(&networks);

        let entry = registry.lookup(&"testnet".into()).unwrap();
        assert_eq!(entry.name, "testnet");
        assert_eq!(entry.dependencies().subscription_id, Some(42));
        assert_eq!(entry.network.confirmations(), 6);
    }

    #[test]
    fn test_lookup_by_chain_id() {
        let networks = networks();
        let registry = Registry::new(&networks);

        assert_eq!(registry.lookup(&97u64.into()).unwrap().name, "testnet");
        // Shared chain id resolves to the first entry in name order.
        assert_eq!(registry.lookup(&31337u64.into()).unwrap().name, "local");
    }

    #[test]
    fn test_lookup_unknown_environment() {
        let networks = networks();
        let registry = Registry::new(&networks);

        for id in ["mainnet", "1", ""] {
            let err = registry.lookup(&id.into()).unwrap_err();
            assert!(matches!(err, DeployError::UnknownEnvironment(ref got) if got == id));
        }
    }

    #[test]
    fn test_network_defaults() {
        let mut config = network(31337);
        assert_eq!(config.confirmations(), 1);
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(900));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));

        config.block_confirmations = Some(0);
        assert_eq!(config.confirmations(), 1);
    }

    #[test]
    fn test_network_config_from_toml() {
        let config: NetworkConfig = toml::from_str(
            r#"
            chain_id = 97
            rpc_url = "https://data-seed-prebsc-1-s1.binance.org:8545"
            block_confirmations = 6
            oracle_address = "0x6a2aad07396b36fe02a22b33cf443582f682c82f"
            subscription_id = 42
            entrance_fee = "10000000000000000"
            gas_lane = "0xd4bb89654db74673a187bd804519e65e3f71a52bc55f11da7601a702ab8b3b5b"
            callback_gas_limit = 500000
            update_interval = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.chain_id, 97);
        assert_eq!(config.dependencies.subscription_id, Some(42));
        assert_eq!(
            config.dependencies.entrance_fee,
            U256::from(10_000_000_000_000_000u64)
        );
        assert_eq!(config.signer_key_env, None);
    }
}

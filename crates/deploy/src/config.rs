//! Deployment configuration and out-of-band credentials.

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use alloy_core::primitives::{U256, address, b256};
use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    classifier::DEFAULT_DEVELOPMENT_CHAINS,
    error::{DeployError, DeployResult},
    registry::{DependencyConfig, NetworkConfig, Registry},
};

/// The default name for the deployment configuration file.
pub const DEPLOY_CONFIG_FILENAME: &str = "Deploy.toml";

/// Prefix of environment variables overriding configuration keys.
///
/// Nested keys are separated by `__`, e.g. `VRFDEPLOY_NETWORKS__BSC_TESTNET__RPC_URL`.
pub const ENV_PREFIX: &str = "VRFDEPLOY_";

/// Signing key variable used by persistent networks that do not name one.
pub const DEFAULT_SIGNER_KEY_ENV: &str = "PRIVATE_KEY";

/// Verification API key variable used when the config does not name one.
pub const DEFAULT_VERIFICATION_API_KEY_ENV: &str = "BSC_SCANNER_API_KEY";

/// Serde helpers for wei amounts: accepts decimal or 0x-prefixed strings and integers,
/// always serializes as a decimal string (TOML integers stop at i64).
pub(crate) mod amount {
    use std::str::FromStr;

    use alloy_core::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Int(value) => Ok(U256::from(value)),
            Repr::Text(text) => U256::from_str(text.trim()).map_err(serde::de::Error::custom),
        }
    }
}

/// Settings for the substitute VRF coordinator deployed on ephemeral networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockCoordinatorConfig {
    /// Compiled `VRFCoordinatorV2Mock` artifact.
    pub artifact: PathBuf,
    /// Flat fee per request, in LINK wei.
    #[serde(with = "amount")]
    pub base_fee: U256,
    /// LINK per gas unit, in LINK wei.
    #[serde(with = "amount")]
    pub gas_price_link: U256,
    /// Amount every fresh mock subscription is funded with, in LINK wei.
    #[serde(with = "amount")]
    pub fund_amount: U256,
}

impl Default for MockCoordinatorConfig {
    fn default() -> Self {
        Self {
            artifact: PathBuf::from(
                "artifacts/@chainlink/contracts/src/v0.8/mocks/VRFCoordinatorV2Mock.sol/VRFCoordinatorV2Mock.json",
            ),
            // 0.25 LINK per request.
            base_fee: U256::from(250_000_000_000_000_000u64),
            gas_price_link: U256::from(1_000_000_000u64),
            fund_amount: crate::provision::MOCK_FUND_AMOUNT,
        }
    }
}

/// Settings for the Etherscan-compatible source verification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// API endpoint, e.g. `https://api-testnet.bscscan.com/api`.
    pub api_url: Url,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Fully qualified contract name, `<source path>:<contract>`.
    pub contract_name: String,
    /// Full compiler version, e.g. `v0.8.8+commit.dddeac2f`.
    pub compiler_version: String,
    /// Standard-JSON compiler input (or a Hardhat build-info file containing one).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_input: Option<PathBuf>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse("https://api-testnet.bscscan.com/api")
                .expect("static verification URL is valid"),
            api_key_env: DEFAULT_VERIFICATION_API_KEY_ENV.to_string(),
            contract_name: "contracts/Raffle.sol:Raffle".to_string(),
            compiler_version: "v0.8.8+commit.dddeac2f".to_string(),
            source_input: None,
        }
    }
}

/// Complete deployment configuration, loaded once at process start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Compiled artifact of the contract to deploy.
    pub artifact: PathBuf,
    /// Network names treated as disposable local environments.
    pub development_chains: Vec<String>,
    pub mock_coordinator: MockCoordinatorConfig,
    pub verification: VerificationConfig,
    /// The environment registry.
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl DeployConfig {
    /// Load the configuration: built-in defaults, then the TOML file, then `VRFDEPLOY_*` env.
    ///
    /// `path` may point at a directory containing [`DEPLOY_CONFIG_FILENAME`].
    pub fn load(path: Option<&Path>) -> DeployResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.exists() {
                return Err(DeployError::Config(anyhow::anyhow!(
                    "Configuration file or directory not found: {}",
                    path.display()
                )));
            }

            let config_path = if path.is_dir() {
                path.join(DEPLOY_CONFIG_FILENAME)
            } else {
                path.to_path_buf()
            };

            figment = figment.merge(Toml::file(config_path));
        }

        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| DeployError::Config(e.into()))?;

        tracing::debug!(networks = config.networks.len(), "Configuration loaded");
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deploy config to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    pub fn registry(&self) -> Registry<'_> {
        Registry::new(&self.networks)
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            artifact: PathBuf::from("artifacts/contracts/Raffle.sol/Raffle.json"),
            development_chains: DEFAULT_DEVELOPMENT_CHAINS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            mock_coordinator: MockCoordinatorConfig::default(),
            verification: VerificationConfig::default(),
            networks: default_networks(),
        }
    }
}

/// Built-in registry entries for a Hardhat-style project.
fn default_networks() -> BTreeMap<String, NetworkConfig> {
    // 0.01 ETH.
    let entrance_fee = U256::from(10_000_000_000_000_000u64);

    let local = |rpc_url: &str| NetworkConfig {
        chain_id: 31337,
        rpc_url: Url::parse(rpc_url).expect("static RPC URL is valid"),
        signer_key_env: None,
        block_confirmations: None,
        confirmation_timeout_secs: Some(60),
        poll_interval_ms: Some(100),
        dependencies: DependencyConfig {
            oracle_address: None,
            subscription_id: None,
            entrance_fee,
            gas_lane: b256!("0xd89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc"),
            callback_gas_limit: 500_000,
            update_interval: 30,
        },
    };

    let rinkeby = NetworkConfig {
        chain_id: 4,
        rpc_url: Url::parse("https://rpc.ankr.com/eth_rinkeby").expect("static RPC URL is valid"),
        signer_key_env: Some("PRIVATE_KEY_DEV_1".to_string()),
        block_confirmations: Some(6),
        confirmation_timeout_secs: None,
        poll_interval_ms: None,
        dependencies: DependencyConfig {
            oracle_address: Some(address!("0x6168499c0cffcacd319c818142124b7a15e857ab")),
            subscription_id: None,
            entrance_fee,
            gas_lane: b256!("0xd89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc"),
            callback_gas_limit: 500_000,
            update_interval: 30,
        },
    };

    let bsc_testnet = NetworkConfig {
        chain_id: 97,
        rpc_url: Url::parse("https://data-seed-prebsc-1-s1.binance.org:8545")
            .expect("static RPC URL is valid"),
        signer_key_env: Some("PRIVATE_KEY_DEV_1".to_string()),
        block_confirmations: Some(6),
        confirmation_timeout_secs: None,
        poll_interval_ms: None,
        dependencies: DependencyConfig {
            oracle_address: Some(address!("0x6a2aad07396b36fe02a22b33cf443582f682c82f")),
            subscription_id: None,
            entrance_fee,
            gas_lane: b256!("0xd4bb89654db74673a187bd804519e65e3f71a52bc55f11da7601a702ab8b3b5b"),
            callback_gas_limit: 500_000,
            update_interval: 30,
        },
    };

    BTreeMap::from([
        ("hardhat".to_string(), local("http://127.0.0.1:8545")),
        ("localhost".to_string(), local("http://127.0.0.1:8545")),
        ("rinkeby".to_string(), rinkeby),
        ("bsc_testnet".to_string(), bsc_testnet),
    ])
}

/// A secret string that never shows up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Signing keys and the verification API key, resolved once from the environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Signing keys by environment variable name.
    signer_keys: BTreeMap<String, Secret>,
    verification_api_key: Option<Secret>,
}

impl Credentials {
    /// Read every credential variable referenced by `config`. Empty values count as absent.
    pub fn from_env(config: &DeployConfig) -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(Secret)
        };

        let mut signer_keys = BTreeMap::new();
        let env_names = config
            .networks
            .values()
            .filter_map(|network| network.signer_key_env.as_deref())
            .chain(std::iter::once(DEFAULT_SIGNER_KEY_ENV));
        for name in env_names {
            if let Some(secret) = read(name) {
                signer_keys.insert(name.to_string(), secret);
            }
        }

        Self {
            signer_keys,
            verification_api_key: read(&config.verification.api_key_env),
        }
    }

    pub fn with_signer_key(mut self, env_var: impl Into<String>, key: impl Into<String>) -> Self {
        self.signer_keys.insert(env_var.into(), Secret(key.into()));
        self
    }

    pub fn with_verification_api_key(mut self, key: impl Into<String>) -> Self {
        self.verification_api_key = Some(Secret(key.into()));
        self
    }

    /// The signing key stored under `env_var`, if any.
    pub fn signer_key(&self, env_var: &str) -> Option<&Secret> {
        self.signer_keys.get(env_var)
    }

    pub fn verification_api_key(&self) -> Option<&Secret> {
        self.verification_api_key.as_ref()
    }
}

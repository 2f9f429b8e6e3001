//! One deployment run: lookup, classify, resolve dependencies, deploy, verify.
//!
//! A run is split in two phases. [`Orchestrator::plan`] does everything that needs no
//! network: registry lookup, classification, validation of persistent dependencies and
//! signing credentials. [`RunPlan::execute`] then drives the external collaborators strictly
//! in sequence. A failure at any step aborts the run; nothing is retried or rolled back.

use std::path::PathBuf;

use alloy_core::primitives::Address;
use serde::Serialize;

use crate::{
    artifact::Artifact,
    chain::LocalSigner,
    classifier::{Classifier, EnvironmentClass},
    config::{Credentials, DEFAULT_SIGNER_KEY_ENV, DeployConfig},
    error::{DeployError, DeployResult},
    executor::{self, DeploymentArgs, DeploymentExecutor, DeploymentResult, WaitPolicy},
    provision::{MockProvisioner, PersistentDependencies, ResolvedDependencies},
    record::DeploymentRecord,
    registry::{EnvironmentId, NetworkConfig, RegistryEntry},
    traits::{ArtifactDeployer, OracleProvisioner, SourceVerifier},
    verify::{VerificationOutcome, VerificationTrigger},
};

/// Per-run switches that are not part of the environment configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Submit source verification when the environment allows it.
    pub verify: bool,
    /// Write a deployment record under this directory.
    pub record_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            verify: true,
            record_dir: None,
        }
    }
}

/// How the oracle dependencies will be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyPlan {
    /// Provision a substitute coordinator, reusing `existing_coordinator` if configured.
    Mock { existing_coordinator: Option<Address> },
    /// Use the registry values verbatim.
    Static(PersistentDependencies),
}

/// Builds run plans from an immutable configuration and credential set.
pub struct Orchestrator<'a> {
    config: &'a DeployConfig,
    credentials: &'a Credentials,
    classifier: Classifier,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a DeployConfig, credentials: &'a Credentials) -> Self {
        Self {
            config,
            credentials,
            classifier: Classifier::new(config.development_chains.iter().cloned()),
        }
    }

    /// Resolve everything a run on `environment` needs before the first external call.
    pub fn plan(&self, environment: &EnvironmentId) -> DeployResult<RunPlan<'a>> {
        let registry = self.config.registry();
        let entry = registry.lookup(environment)?;
        let class = self.classifier.classify(entry.name);

        tracing::info!(
            environment = %environment,
            network = entry.name,
            chain_id = entry.network.chain_id,
            %class,
            "Environment resolved"
        );

        let dependencies = match class {
            EnvironmentClass::Ephemeral => DependencyPlan::Mock {
                existing_coordinator: entry.dependencies().oracle_address,
            },
            EnvironmentClass::Persistent => DependencyPlan::Static(
                PersistentDependencies::from_config(entry.name, entry.dependencies())?,
            ),
        };

        let signer = self.resolve_signer(&entry, class)?;

        Ok(RunPlan {
            entry,
            class,
            dependencies,
            signer,
            config: self.config,
            credentials: self.credentials,
        })
    }

    /// Persistent networks always sign locally; ephemeral ones fall back to node accounts.
    fn resolve_signer(
        &self,
        entry: &RegistryEntry<'a>,
        class: EnvironmentClass,
    ) -> DeployResult<Option<LocalSigner>> {
        let env_var = match (&entry.network.signer_key_env, class) {
            (Some(env_var), _) => env_var.as_str(),
            (None, EnvironmentClass::Persistent) => DEFAULT_SIGNER_KEY_ENV,
            (None, EnvironmentClass::Ephemeral) => return Ok(None),
        };

        match self.credentials.signer_key(env_var) {
            Some(key) => LocalSigner::from_hex(key.expose())
                .map(Some)
                .map_err(|e| DeployError::Config(e.context(format!("Invalid key in {env_var}")))),
            None if class == EnvironmentClass::Ephemeral => {
                tracing::debug!(env_var, "No signing key set, using the node's unlocked account");
                Ok(None)
            }
            None => Err(DeployError::MissingCredential {
                environment: entry.name.to_string(),
                env_var: env_var.to_string(),
            }),
        }
    }
}

/// A validated run, ready to drive the external collaborators.
#[derive(Debug)]
pub struct RunPlan<'a> {
    entry: RegistryEntry<'a>,
    class: EnvironmentClass,
    dependencies: DependencyPlan,
    signer: Option<LocalSigner>,
    config: &'a DeployConfig,
    credentials: &'a Credentials,
}

impl<'a> RunPlan<'a> {
    /// Registry name of the target network.
    pub fn environment(&self) -> &'a str {
        self.entry.name
    }

    pub fn network(&self) -> &'a NetworkConfig {
        self.entry.network
    }

    pub fn class(&self) -> EnvironmentClass {
        self.class
    }

    pub fn dependencies(&self) -> &DependencyPlan {
        &self.dependencies
    }

    /// The local signing key, if transactions are not sent from a node account.
    pub fn signer(&self) -> Option<&LocalSigner> {
        self.signer.as_ref()
    }

    /// Check `artifact`'s constructor against this network's argument layout.
    ///
    /// Uses placeholder oracle values, so it can run before anything touches the network.
    pub fn check_artifact(&self, artifact: &Artifact) -> DeployResult<()> {
        let placeholder = DeploymentArgs::placeholder(self.entry.dependencies());
        executor::check_constructor_args(artifact, &placeholder.to_abi_values())
    }

    /// Resolve the oracle dependencies, deploy `artifact`, then verify it.
    pub async fn execute<O, D, V>(
        &self,
        artifact: &Artifact,
        oracle: &O,
        deployer: &D,
        verifier: &V,
        options: &RunOptions,
    ) -> DeployResult<RunSummary>
    where
        O: OracleProvisioner,
        D: ArtifactDeployer,
        V: SourceVerifier,
    {
        let dependency_config = self.entry.dependencies();
        // A wrong artifact fails before the mock coordinator is provisioned.
        self.check_artifact(artifact)?;

        let resolved = match self.dependencies {
            DependencyPlan::Mock {
                existing_coordinator,
            } => {
                tracing::info!("Development chain detected, deploying mocks...");
                let handle = MockProvisioner::new(oracle)
                    .fund_amount(self.config.mock_coordinator.fund_amount)
                    .existing_coordinator(existing_coordinator)
                    .provision()
                    .await?;
                ResolvedDependencies::Ephemeral(handle)
            }
            DependencyPlan::Static(deps) => ResolvedDependencies::Persistent(deps),
        };

        let args = DeploymentArgs::new(&resolved, dependency_config);
        let policy = WaitPolicy::from_network(self.entry.network);
        let deployment = DeploymentExecutor::new(deployer, artifact)
            .deploy(&args, &policy)
            .await?;

        let verification = VerificationTrigger::new(verifier, self.credentials.verification_api_key())
            .enabled(options.verify)
            .verify_if_applicable(&deployment, &args, self.class)
            .await;

        let record = options.record_dir.as_ref().and_then(|dir| {
            let record = DeploymentRecord::new(
                &artifact.name,
                self.entry.name,
                self.entry.network.chain_id,
                self.class,
                &deployment,
                &args,
            );
            match record.save(dir) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to save deployment record");
                    None
                }
            }
        });

        Ok(RunSummary {
            environment: self.entry.name.to_string(),
            chain_id: self.entry.network.chain_id,
            class: self.class,
            contract: artifact.name.clone(),
            dependencies: resolved,
            args,
            deployment,
            verification,
            record,
        })
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub environment: String,
    pub chain_id: u64,
    pub class: EnvironmentClass,
    pub contract: String,
    pub dependencies: ResolvedDependencies,
    pub args: DeploymentArgs,
    pub deployment: DeploymentResult,
    pub verification: VerificationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<PathBuf>,
}

impl RunSummary {
    /// Non-fatal errors raised during the run.
    pub fn warnings(&self) -> Vec<DeployError> {
        self.verification.as_error().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hardhat account #0.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_plan_unknown_environment() {
        let config = DeployConfig::default();
        let credentials = Credentials::default();

        let err = Orchestrator::new(&config, &credentials)
            .plan(&EnvironmentId::from("mainnet"))
            .unwrap_err();
        assert!(matches!(err, DeployError::UnknownEnvironment(id) if id == "mainnet"));
    }

    #[test]
    fn test_plan_development_chain_uses_mocks_and_node_account() {
        let config = DeployConfig::default();
        let credentials = Credentials::default();

        let plan = Orchestrator::new(&config, &credentials)
            .plan(&EnvironmentId::from("hardhat"))
            .unwrap();

        assert_eq!(plan.class(), EnvironmentClass::Ephemeral);
        assert_eq!(
            plan.dependencies(),
            &DependencyPlan::Mock {
                existing_coordinator: None
            }
        );
        assert!(plan.signer().is_none());
    }

    #[test]
    fn test_plan_by_chain_id() {
        let config = DeployConfig::default();
        let credentials = Credentials::default();

        let plan = Orchestrator::new(&config, &credentials)
            .plan(&EnvironmentId::from(31337u64))
            .unwrap();
        assert_eq!(plan.environment(), "hardhat");
        assert_eq!(plan.class(), EnvironmentClass::Ephemeral);
    }

    #[test]
    fn test_plan_persistent_missing_subscription() {
        // The built-in bsc_testnet entry has no subscription id.
        let config = DeployConfig::default();
        let credentials = Credentials::default().with_signer_key("PRIVATE_KEY_DEV_1", DEV_KEY);

        let err = Orchestrator::new(&config, &credentials)
            .plan(&EnvironmentId::from("bsc_testnet"))
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::MissingRequiredConfig {
                field: "subscription_id",
                ..
            }
        ));
    }

    #[test]
    fn test_plan_persistent_requires_signing_key() {
        let mut config = DeployConfig::default();
        config
            .networks
            .get_mut("bsc_testnet")
            .unwrap()
            .dependencies
            .subscription_id = Some(42);
        let credentials = Credentials::default();

        let err = Orchestrator::new(&config, &credentials)
            .plan(&EnvironmentId::from("bsc_testnet"))
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::MissingCredential { env_var, .. } if env_var == "PRIVATE_KEY_DEV_1"
        ));

        let credentials = credentials.with_signer_key("PRIVATE_KEY_DEV_1", DEV_KEY);
        let plan = Orchestrator::new(&config, &credentials)
            .plan(&EnvironmentId::from("bsc_testnet"))
            .unwrap();
        assert_eq!(plan.class(), EnvironmentClass::Persistent);
        assert!(plan.signer().is_some());
    }

    #[test]
    fn test_plan_persistent_default_key_env() {
        let mut config = DeployConfig::default();
        let network = config.networks.get_mut("rinkeby").unwrap();
        network.signer_key_env = None;
        network.dependencies.subscription_id = Some(7);

        let credentials = Credentials::default();
        let err = Orchestrator::new(&config, &credentials)
            .plan(&EnvironmentId::from("rinkeby"))
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::MissingCredential { env_var, .. } if env_var == DEFAULT_SIGNER_KEY_ENV
        ));
    }

    #[test]
    fn test_plan_rejects_malformed_key() {
        let mut config = DeployConfig::default();
        config
            .networks
            .get_mut("rinkeby")
            .unwrap()
            .dependencies
            .subscription_id = Some(7);
        let credentials = Credentials::default().with_signer_key("PRIVATE_KEY_DEV_1", "0x1234");

        let err = Orchestrator::new(&config, &credentials)
            .plan(&EnvironmentId::from("rinkeby"))
            .unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
        assert!(!format!("{err:?}").contains("0x1234"));
    }

    #[test]
    fn test_check_artifact_before_any_call() {
        let config = DeployConfig::default();
        let credentials = Credentials::default();
        let plan = Orchestrator::new(&config, &credentials)
            .plan(&EnvironmentId::from("hardhat"))
            .unwrap();

        let artifact = Artifact::from_json(
            r#"{"abi": [{"type": "constructor", "stateMutability": "nonpayable", "inputs": [
                {"name": "vrfCoordinatorV2", "type": "address"}
            ]}], "bytecode": "0x6080"}"#,
            "RaffleV0",
        )
        .unwrap();
        let err = plan.check_artifact(&artifact).unwrap_err();
        assert!(matches!(
            err,
            DeployError::ArgumentArityMismatch {
                expected: 1,
                actual: 6,
                ..
            }
        ));
    }

    #[test]
    fn test_summary_warnings() {
        let summary = RunSummary {
            environment: "bsc_testnet".to_string(),
            chain_id: 97,
            class: EnvironmentClass::Persistent,
            contract: "Raffle".to_string(),
            dependencies: ResolvedDependencies::Persistent(PersistentDependencies {
                oracle_address: Address::repeat_byte(1),
                subscription_id: 42,
            }),
            args: DeploymentArgs::placeholder(&config_deps()),
            deployment: DeploymentResult {
                address: Address::repeat_byte(2),
                transaction_hash: Default::default(),
                block_number: 1,
                confirmed_block_depth: 6,
            },
            verification: VerificationOutcome::Failed {
                reason: "Invalid API Key".to_string(),
            },
            record: None,
        };

        let warnings = summary.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(!warnings[0].is_fatal());
    }

    fn config_deps() -> crate::registry::DependencyConfig {
        DeployConfig::default().networks["hardhat"].dependencies.clone()
    }
}

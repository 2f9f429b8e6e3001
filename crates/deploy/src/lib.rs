//! vrfdeploy-core - Deployment orchestration for VRF-consuming contracts.
//!
//! A run targets one environment from the registry. Development chains get a freshly
//! provisioned and funded mock VRF coordinator; shared networks use the coordinator and
//! subscription from configuration. The contract is then deployed, awaited to the configured
//! confirmation depth, and submitted for source verification where that makes sense.

mod artifact;
pub use artifact::Artifact;

mod classifier;
pub use classifier::{Classifier, DEFAULT_DEVELOPMENT_CHAINS, EnvironmentClass};

mod config;
pub use config::{
    Credentials, DEFAULT_SIGNER_KEY_ENV, DEFAULT_VERIFICATION_API_KEY_ENV, DEPLOY_CONFIG_FILENAME,
    DeployConfig, ENV_PREFIX, MockCoordinatorConfig, Secret, VerificationConfig,
};

mod error;
pub use error::{DeployError, DeployResult};

mod executor;
pub use executor::{
    DeploymentArgs, DeploymentExecutor, DeploymentResult, WaitPolicy, check_constructor_args,
    creation_code,
};

mod orchestrator;
pub use orchestrator::{DependencyPlan, Orchestrator, RunOptions, RunPlan, RunSummary};

mod provision;
pub use provision::{
    MOCK_FUND_AMOUNT, MockOracleHandle, MockProvisioner, PersistentDependencies,
    ResolvedDependencies, extract_subscription_id,
};

mod record;
pub use record::DeploymentRecord;

mod registry;
pub use registry::{
    DEFAULT_BLOCK_CONFIRMATIONS, DependencyConfig, EnvironmentId, NetworkConfig, Registry,
    RegistryEntry,
};

mod verify;
pub use verify::{SkipReason, VerificationOutcome, VerificationTrigger};

pub mod chain;
pub mod fakes;
pub mod rpc;
pub mod services;
pub mod traits;

pub use chain::{ChainClient, LocalSigner};
pub use services::{EtherscanVerifier, RpcArtifactDeployer, RpcCoordinatorMock};

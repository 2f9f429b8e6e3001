//! Constructor argument assembly, deployment submission and the confirmation wait.

use std::time::{Duration, Instant};

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Address, B256, Bytes, U256},
    sol_types::SolConstructor,
};
use serde::Serialize;

use crate::{
    artifact::Artifact,
    chain::abi::Raffle,
    error::{DeployError, DeployResult},
    provision::ResolvedDependencies,
    registry::{DependencyConfig, NetworkConfig},
    rpc,
    traits::{ArtifactDeployer, ConfirmationStatus},
};

/// Positional constructor arguments of the deployed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeploymentArgs {
    pub oracle_address: Address,
    pub subscription_id: u64,
    pub entrance_fee: U256,
    pub gas_lane: B256,
    pub callback_gas_limit: u32,
    pub update_interval: u64,
}

impl DeploymentArgs {
    /// Combine the resolved oracle wiring with the environment's static parameters.
    pub fn new(dependencies: &ResolvedDependencies, config: &DependencyConfig) -> Self {
        Self {
            oracle_address: dependencies.oracle_address(),
            subscription_id: dependencies.subscription_id(),
            entrance_fee: config.entrance_fee,
            gas_lane: config.gas_lane,
            callback_gas_limit: config.callback_gas_limit,
            update_interval: config.update_interval,
        }
    }

    /// Same layout as the real arguments, with a zero oracle address and subscription id.
    pub fn placeholder(config: &DependencyConfig) -> Self {
        Self {
            oracle_address: Address::ZERO,
            subscription_id: 0,
            entrance_fee: config.entrance_fee,
            gas_lane: config.gas_lane,
            callback_gas_limit: config.callback_gas_limit,
            update_interval: config.update_interval,
        }
    }

    pub fn constructor(&self) -> Raffle::constructorCall {
        Raffle::constructorCall {
            vrfCoordinatorV2: self.oracle_address,
            subscriptionId: self.subscription_id,
            entranceFee: self.entrance_fee,
            gasLane: self.gas_lane,
            callbackGasLimit: self.callback_gas_limit,
            interval: U256::from(self.update_interval),
        }
    }

    /// Arguments in constructor order, typed as the constructor declares them.
    pub fn to_abi_values(&self) -> Vec<DynSolValue> {
        vec![
            DynSolValue::Address(self.oracle_address),
            DynSolValue::Uint(U256::from(self.subscription_id), 64),
            DynSolValue::Uint(self.entrance_fee, 256),
            DynSolValue::FixedBytes(self.gas_lane, 32),
            DynSolValue::Uint(U256::from(self.callback_gas_limit), 32),
            DynSolValue::Uint(U256::from(self.update_interval), 256),
        ]
    }

    /// Arguments in constructor order, as displayed in records.
    pub fn display_values(&self) -> Vec<String> {
        vec![
            self.oracle_address.to_string(),
            self.subscription_id.to_string(),
            self.entrance_fee.to_string(),
            self.gas_lane.to_string(),
            self.callback_gas_limit.to_string(),
            self.update_interval.to_string(),
        ]
    }

    /// ABI encoding of the arguments, as appended to creation code and sent for verification.
    pub fn encode(&self) -> Bytes {
        self.constructor().abi_encode().into()
    }
}

/// Check `values` against the artifact's constructor, by count and by position.
pub fn check_constructor_args(artifact: &Artifact, values: &[DynSolValue]) -> DeployResult<()> {
    let mismatch = || DeployError::ArgumentArityMismatch {
        expected: artifact.constructor_inputs.len(),
        actual: values.len(),
        signature: artifact.constructor_signature(),
    };

    if artifact.constructor_inputs.len() != values.len() {
        return Err(mismatch());
    }

    for (param, value) in artifact.constructor_inputs.iter().zip(values) {
        let expected = param.selector_type();
        let matches = DynSolType::parse(&expected).is_ok_and(|ty| ty.matches(value));
        if !matches {
            tracing::error!(
                parameter = %param.name,
                expected = %expected,
                got = ?value.as_type(),
                "Constructor argument type mismatch"
            );
            return Err(mismatch());
        }
    }

    Ok(())
}

/// Creation code: bytecode followed by the encoded constructor arguments.
pub fn creation_code(artifact: &Artifact, values: &[DynSolValue]) -> DeployResult<Bytes> {
    check_constructor_args(artifact, values)?;

    let mut code = artifact.bytecode.to_vec();
    code.extend_from_slice(&DynSolValue::Tuple(values.to_vec()).abi_encode_params());
    Ok(code.into())
}

/// How long and how often to wait for confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub confirmations: u64,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    pub fn from_network(network: &NetworkConfig) -> Self {
        Self {
            confirmations: network.confirmations(),
            timeout: network.confirmation_timeout(),
            poll_interval: network.poll_interval(),
        }
    }
}

/// A confirmed deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeploymentResult {
    /// Address reported by the environment; downstream steps use it as-is.
    pub address: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
    pub confirmed_block_depth: u64,
}

/// Deploys one artifact through an [`ArtifactDeployer`].
pub struct DeploymentExecutor<'a, D> {
    deployer: &'a D,
    artifact: &'a Artifact,
}

impl<'a, D: ArtifactDeployer> DeploymentExecutor<'a, D> {
    pub fn new(deployer: &'a D, artifact: &'a Artifact) -> Self {
        Self { deployer, artifact }
    }

    /// Deploy with `args` and block until `policy.confirmations` blocks are observed.
    pub async fn deploy(
        &self,
        args: &DeploymentArgs,
        policy: &WaitPolicy,
    ) -> DeployResult<DeploymentResult> {
        let code = creation_code(self.artifact, &args.to_abi_values())?;

        tracing::info!(
            artifact = %self.artifact.name,
            confirmations = policy.confirmations,
            "Deploying and waiting for confirmations..."
        );

        let tx_hash = self
            .deployer
            .submit(code)
            .await
            .map_err(|source| DeployError::DeploymentReverted {
                tx_hash: None,
                source,
            })?;
        tracing::info!(%tx_hash, "Deployment transaction submitted");

        let required = policy.confirmations.max(1);
        let start = Instant::now();

        rpc::poll_until(
            &format!("{required} confirmations of {tx_hash}"),
            policy.timeout,
            policy.poll_interval,
            || self.check_confirmations(tx_hash, required),
        )
        .await
        .map_err(|_| DeployError::DeploymentTimeout {
            tx_hash,
            confirmations: required,
            waited_secs: start.elapsed().as_secs(),
        })?
    }

    /// One status poll: `None` while more blocks are needed, `Some` once the outcome is final.
    async fn check_confirmations(
        &self,
        tx_hash: B256,
        required: u64,
    ) -> anyhow::Result<Option<DeployResult<DeploymentResult>>> {
        let outcome = match self.deployer.status(tx_hash).await? {
            ConfirmationStatus::Pending => {
                tracing::debug!(%tx_hash, "Deployment not mined yet");
                return Ok(None);
            }
            ConfirmationStatus::Mined { depth, .. } if depth < required => {
                tracing::debug!(%tx_hash, depth, required, "Waiting for more confirmations");
                return Ok(None);
            }
            ConfirmationStatus::Reverted { block_number } => {
                Err(DeployError::DeploymentReverted {
                    tx_hash: Some(tx_hash),
                    source: anyhow::anyhow!("Execution reverted in block {}", block_number),
                })
            }
            ConfirmationStatus::Mined {
                address: None,
                block_number,
                ..
            } => Err(DeployError::DeploymentReverted {
                tx_hash: Some(tx_hash),
                source: anyhow::anyhow!(
                    "Receipt in block {} carries no contract address",
                    block_number
                ),
            }),
            ConfirmationStatus::Mined {
                address: Some(address),
                block_number,
                depth,
            } => {
                tracing::info!(%address, block_number, depth, "Deployment confirmed");
                Ok(DeploymentResult {
                    address,
                    transaction_hash: tx_hash,
                    block_number,
                    confirmed_block_depth: depth,
                })
            }
        };

        Ok(Some(outcome))
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::primitives::{address, b256};

    use super::*;
    use crate::{
        fakes::{FakeDeployer, FakeDeployerBehavior},
        provision::{MockOracleHandle, PersistentDependencies},
    };

    const RAFFLE_ARTIFACT: &str = r#"{
        "contractName": "Raffle",
        "abi": [{"type": "constructor", "stateMutability": "nonpayable", "inputs": [
            {"name": "vrfCoordinatorV2", "type": "address"},
            {"name": "subscriptionId", "type": "uint64"},
            {"name": "entranceFee", "type": "uint256"},
            {"name": "gasLane", "type": "bytes32"},
            {"name": "callbackGasLimit", "type": "uint32"},
            {"name": "interval", "type": "uint256"}
        ]}],
        "bytecode": "0x6080604052"
    }"#;

    fn raffle() -> Artifact {
        Artifact::from_json(RAFFLE_ARTIFACT, "Raffle").unwrap()
    }

    fn dependency_config() -> DependencyConfig {
        DependencyConfig {
            oracle_address: None,
            subscription_id: None,
            entrance_fee: U256::from(1_000_000_000_000_000_000u64),
            gas_lane: b256!("0xd89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc"),
            callback_gas_limit: 500_000,
            update_interval: 30,
        }
    }

    fn args() -> DeploymentArgs {
        let deps = ResolvedDependencies::Persistent(PersistentDependencies {
            oracle_address: address!("0x6a2aad07396b36fe02a22b33cf443582f682c82f"),
            subscription_id: 42,
        });
        DeploymentArgs::new(&deps, &dependency_config())
    }

    fn fast_policy(confirmations: u64) -> WaitPolicy {
        WaitPolicy {
            confirmations,
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_args_from_mock_handle() {
        let deps = ResolvedDependencies::Ephemeral(MockOracleHandle {
            coordinator: address!("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
            subscription_id: 1,
            funded_amount: crate::provision::MOCK_FUND_AMOUNT,
        });
        let args = DeploymentArgs::new(&deps, &dependency_config());

        assert_eq!(
            args.to_abi_values(),
            vec![
                DynSolValue::Address(address!("0x5fbdb2315678afecb367f032d93f642f64180aa3")),
                DynSolValue::Uint(U256::from(1u64), 64),
                DynSolValue::Uint(U256::from(1_000_000_000_000_000_000u64), 256),
                DynSolValue::FixedBytes(
                    b256!("0xd89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc"),
                    32
                ),
                DynSolValue::Uint(U256::from(500_000u64), 32),
                DynSolValue::Uint(U256::from(30u64), 256),
            ]
        );
        assert_eq!(args.encode().len(), 6 * 32);
    }

    #[test]
    fn test_creation_code_appends_args() {
        let artifact = raffle();
        let code = creation_code(&artifact, &args().to_abi_values()).unwrap();

        assert_eq!(&code[..5], artifact.bytecode.as_ref());
        // Encoded from the artifact-checked values, identical to the typed constructor.
        assert_eq!(&code[5..], args().encode().as_ref());
    }

    #[test]
    fn test_check_constructor_args_rejects_wider_declared_type() {
        // An older contract revision took the subscription id as uint256.
        let json = RAFFLE_ARTIFACT.replace(
            r#""name": "subscriptionId", "type": "uint64""#,
            r#""name": "subscriptionId", "type": "uint256""#,
        );
        let artifact = Artifact::from_json(&json, "Raffle").unwrap();

        let err = check_constructor_args(&artifact, &args().to_abi_values()).unwrap_err();
        assert!(matches!(
            err,
            DeployError::ArgumentArityMismatch {
                expected: 6,
                actual: 6,
                ..
            }
        ));
        assert!(
            err.to_string()
                .contains("constructor(address,uint256,uint256,bytes32,uint32,uint256)")
        );
    }

    #[test]
    fn test_check_constructor_args_wrong_order() {
        let mut values = args().to_abi_values();
        values.swap(0, 3);

        let err = check_constructor_args(&raffle(), &values).unwrap_err();
        assert!(matches!(
            err,
            DeployError::ArgumentArityMismatch {
                expected: 6,
                actual: 6,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_arity_mismatch_makes_no_network_call() {
        let artifact = Artifact::from_json(
            r#"{"abi": [{"type": "constructor", "stateMutability": "nonpayable", "inputs": [
                {"name": "vrfCoordinatorV2", "type": "address"},
                {"name": "entranceFee", "type": "uint256"}
            ]}], "bytecode": "0x60"}"#,
            "RaffleV0",
        )
        .unwrap();
        let deployer = FakeDeployer::default();

        let err = DeploymentExecutor::new(&deployer, &artifact)
            .deploy(&args(), &fast_policy(1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::ArgumentArityMismatch {
                expected: 2,
                actual: 6,
                ..
            }
        ));
        assert_eq!(deployer.submit_calls(), 0);
        assert_eq!(deployer.status_calls(), 0);
    }

    #[tokio::test]
    async fn test_deploy_waits_for_first_confirmation() {
        let artifact = raffle();
        // Two pending polls before the receipt shows up.
        let deployer = FakeDeployer::with_behavior(FakeDeployerBehavior {
            pending_polls: 2,
            ..Default::default()
        });

        let result = DeploymentExecutor::new(&deployer, &artifact)
            .deploy(&args(), &fast_policy(1))
            .await
            .unwrap();

        assert!(result.confirmed_block_depth >= 1);
        assert_eq!(result.address, FakeDeployer::CONTRACT_ADDRESS);
        assert_eq!(deployer.status_calls(), 3);
        assert_eq!(deployer.submitted()[0], creation_code(&artifact, &args().to_abi_values()).unwrap());
    }

    #[tokio::test]
    async fn test_deploy_waits_for_configured_depth() {
        let artifact = raffle();
        let deployer = FakeDeployer::default();

        let result = DeploymentExecutor::new(&deployer, &artifact)
            .deploy(&args(), &fast_policy(6))
            .await
            .unwrap();

        assert_eq!(result.confirmed_block_depth, 6);
        // Mined at depth 1 on the first poll, one more block per poll.
        assert_eq!(deployer.status_calls(), 6);
    }

    #[tokio::test]
    async fn test_deploy_rejected_submission() {
        let artifact = raffle();
        let deployer = FakeDeployer::with_behavior(FakeDeployerBehavior {
            reject_submission: true,
            ..Default::default()
        });

        let err = DeploymentExecutor::new(&deployer, &artifact)
            .deploy(&args(), &fast_policy(1))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::DeploymentReverted { tx_hash: None, .. }));
        assert_eq!(deployer.status_calls(), 0);
    }

    #[tokio::test]
    async fn test_deploy_reverted_execution() {
        let artifact = raffle();
        let deployer = FakeDeployer::with_behavior(FakeDeployerBehavior {
            revert: true,
            ..Default::default()
        });

        let err = DeploymentExecutor::new(&deployer, &artifact)
            .deploy(&args(), &fast_policy(1))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::DeploymentReverted { tx_hash: Some(_), .. }));
    }

    #[tokio::test]
    async fn test_deploy_receipt_without_contract_address() {
        let artifact = raffle();
        let deployer = FakeDeployer::with_behavior(FakeDeployerBehavior {
            omit_address: true,
            ..Default::default()
        });

        let err = DeploymentExecutor::new(&deployer, &artifact)
            .deploy(&args(), &fast_policy(3))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::DeploymentReverted {
                tx_hash: Some(hash),
                ..
            } if hash == FakeDeployer::TX_HASH
        ));
        // Rejected as soon as the required depth is reached, never resubmitted.
        assert_eq!(deployer.status_calls(), 3);
        assert_eq!(deployer.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_deploy_timeout() {
        let artifact = raffle();
        let deployer = FakeDeployer::with_behavior(FakeDeployerBehavior {
            pending_polls: u64::MAX,
            ..Default::default()
        });
        let policy = WaitPolicy {
            confirmations: 1,
            timeout: Duration::from_millis(30),
            poll_interval: Duration::from_millis(5),
        };

        let err = DeploymentExecutor::new(&deployer, &artifact)
            .deploy(&args(), &policy)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::DeploymentTimeout {
                confirmations: 1,
                ..
            }
        ));
        assert!(deployer.status_calls() >= 2);
    }
}

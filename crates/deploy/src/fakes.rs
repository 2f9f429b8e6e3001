//! In-memory fakes for the capability traits (testing only).
//!
//! `FakeOracle`, `FakeDeployer` and `FakeVerifier` satisfy the trait contracts without a
//! chain or an explorer, and record every call so tests can assert on what was (not) done.

use std::collections::BTreeMap;
use std::sync::Mutex;

use alloy_core::{
    primitives::{Address, B256, Bytes, U256, address, b256},
    sol_types::SolEvent,
};

use crate::{
    chain::{
        Log,
        abi::VRFCoordinatorV2Mock::{ConsumerAdded, SubscriptionCreated},
    },
    traits::{
        ArtifactDeployer, CallReceipt, ConfirmationStatus, OracleProvisioner, SourceVerifier,
        VerificationRequest, VerificationResponse,
    },
};

// ---------------------------------------------------------------------------
// FakeOracle
// ---------------------------------------------------------------------------

/// Knobs for [`FakeOracle`].
#[derive(Debug, Clone, Copy)]
pub struct FakeOracleBehavior {
    /// Emit `SubscriptionCreated` when a subscription is opened.
    pub emit_subscription_event: bool,
    pub fail_instantiation: bool,
    pub fail_subscription: bool,
    pub reject_funding: bool,
}

impl Default for FakeOracleBehavior {
    fn default() -> Self {
        Self {
            emit_subscription_event: true,
            fail_instantiation: false,
            fail_subscription: false,
            reject_funding: false,
        }
    }
}

#[derive(Debug, Default)]
struct OracleState {
    next_subscription_id: u64,
    balances: BTreeMap<u64, U256>,
    instantiate_calls: usize,
    subscription_calls: usize,
    fund_calls: usize,
    coordinators_used: Vec<Address>,
}

/// In-memory coordinator: subscription ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct FakeOracle {
    behavior: FakeOracleBehavior,
    state: Mutex<OracleState>,
}

impl FakeOracle {
    /// Address returned by [`OracleProvisioner::instantiate`].
    pub const COORDINATOR: Address = address!("0x5fbdb2315678afecb367f032d93f642f64180aa3");
    /// Owner reported in `SubscriptionCreated`.
    pub const OWNER: Address = address!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");

    pub fn with_behavior(behavior: FakeOracleBehavior) -> Self {
        Self {
            behavior,
            state: Mutex::default(),
        }
    }

    pub fn balance(&self, subscription_id: u64) -> U256 {
        let state = self.state.lock().unwrap();
        state
            .balances
            .get(&subscription_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn instantiate_calls(&self) -> usize {
        self.state.lock().unwrap().instantiate_calls
    }

    pub fn subscription_calls(&self) -> usize {
        self.state.lock().unwrap().subscription_calls
    }

    pub fn fund_calls(&self) -> usize {
        self.state.lock().unwrap().fund_calls
    }

    /// Total number of external calls made against this oracle.
    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.instantiate_calls + state.subscription_calls + state.fund_calls
    }

    /// Coordinators passed to `create_subscription` and `fund_subscription`, in call order.
    pub fn coordinators_used(&self) -> Vec<Address> {
        self.state.lock().unwrap().coordinators_used.clone()
    }
}

impl OracleProvisioner for FakeOracle {
    async fn instantiate(&self) -> anyhow::Result<Address> {
        let mut state = self.state.lock().unwrap();
        state.instantiate_calls += 1;

        if self.behavior.fail_instantiation {
            anyhow::bail!("Coordinator deployment ran out of gas");
        }
        Ok(Self::COORDINATOR)
    }

    async fn create_subscription(&self, coordinator: Address) -> anyhow::Result<CallReceipt> {
        let mut state = self.state.lock().unwrap();
        state.subscription_calls += 1;
        state.coordinators_used.push(coordinator);

        if self.behavior.fail_subscription {
            anyhow::bail!("createSubscription reverted");
        }

        state.next_subscription_id += 1;
        let subscription_id = state.next_subscription_id;
        state.balances.insert(subscription_id, U256::ZERO);

        // An unrelated event precedes `SubscriptionCreated`.
        let mut logs = vec![log_of(
            coordinator,
            &ConsumerAdded {
                subId: subscription_id,
                consumer: Address::ZERO,
            },
        )];
        if self.behavior.emit_subscription_event {
            logs.push(log_of(
                coordinator,
                &SubscriptionCreated {
                    subId: subscription_id,
                    owner: Self::OWNER,
                },
            ));
        }

        Ok(CallReceipt {
            tx_hash: B256::from(U256::from(subscription_id).to_be_bytes::<32>()),
            logs,
        })
    }

    async fn fund_subscription(
        &self,
        coordinator: Address,
        subscription_id: u64,
        amount: U256,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.fund_calls += 1;
        state.coordinators_used.push(coordinator);

        if self.behavior.reject_funding {
            anyhow::bail!("fundSubscription reverted");
        }

        let balance = state
            .balances
            .get_mut(&subscription_id)
            .ok_or_else(|| anyhow::anyhow!("InvalidSubscription({})", subscription_id))?;
        *balance += amount;
        Ok(())
    }
}

fn log_of(emitter: Address, event: &impl SolEvent) -> Log {
    let data = event.encode_log_data();
    Log {
        address: emitter,
        topics: data.topics().to_vec(),
        data: data.data,
    }
}

// ---------------------------------------------------------------------------
// FakeDeployer
// ---------------------------------------------------------------------------

/// Knobs for [`FakeDeployer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeDeployerBehavior {
    /// Number of status polls answered with `Pending` before the transaction is mined.
    pub pending_polls: u64,
    /// Refuse the submission outright.
    pub reject_submission: bool,
    /// Mine the transaction as reverted.
    pub revert: bool,
    /// Mine successfully but report no contract address.
    pub omit_address: bool,
}

#[derive(Debug, Default)]
struct DeployerState {
    submitted: Vec<Bytes>,
    status_calls: u64,
}

/// In-memory deployer. Once mined, each further poll observes one more block.
#[derive(Debug, Default)]
pub struct FakeDeployer {
    behavior: FakeDeployerBehavior,
    state: Mutex<DeployerState>,
}

impl FakeDeployer {
    pub const CONTRACT_ADDRESS: Address = address!("0xe7f1725e7734ce288f8367e1bb143e90bb3f0512");
    pub const TX_HASH: B256 =
        b256!("0x2f1c5c2b44f771e942a8506148e256f94f1a464babc938ae0690c6e34cd79190");
    pub const INCLUSION_BLOCK: u64 = 100;

    pub fn with_behavior(behavior: FakeDeployerBehavior) -> Self {
        Self {
            behavior,
            state: Mutex::default(),
        }
    }

    /// Creation code of every submission, in order.
    pub fn submitted(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn submit_calls(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }

    pub fn status_calls(&self) -> u64 {
        self.state.lock().unwrap().status_calls
    }
}

impl ArtifactDeployer for FakeDeployer {
    async fn submit(&self, creation_code: Bytes) -> anyhow::Result<B256> {
        let mut state = self.state.lock().unwrap();
        state.submitted.push(creation_code);

        if self.behavior.reject_submission {
            anyhow::bail!("insufficient funds for gas * price + value");
        }
        Ok(Self::TX_HASH)
    }

    async fn status(&self, tx_hash: B256) -> anyhow::Result<ConfirmationStatus> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;

        if tx_hash != Self::TX_HASH {
            anyhow::bail!("Unknown transaction {}", tx_hash);
        }
        if state.status_calls <= self.behavior.pending_polls {
            return Ok(ConfirmationStatus::Pending);
        }
        if self.behavior.revert {
            return Ok(ConfirmationStatus::Reverted {
                block_number: Self::INCLUSION_BLOCK,
            });
        }

        let depth = state.status_calls - self.behavior.pending_polls;
        Ok(ConfirmationStatus::Mined {
            address: (!self.behavior.omit_address).then_some(Self::CONTRACT_ADDRESS),
            block_number: Self::INCLUSION_BLOCK,
            depth,
        })
    }
}

// ---------------------------------------------------------------------------
// FakeVerifier
// ---------------------------------------------------------------------------

/// How [`FakeVerifier`] answers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FakeVerifierMode {
    #[default]
    Accept,
    AlreadyVerified,
    Reject(String),
    /// Transport-level failure.
    Unreachable,
}

/// In-memory verification service recording every request.
#[derive(Debug, Default)]
pub struct FakeVerifier {
    mode: FakeVerifierMode,
    requests: Mutex<Vec<VerificationRequest>>,
}

impl FakeVerifier {
    pub fn new(mode: FakeVerifierMode) -> Self {
        Self {
            mode,
            requests: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<VerificationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl SourceVerifier for FakeVerifier {
    async fn submit(&self, request: &VerificationRequest) -> anyhow::Result<VerificationResponse> {
        self.requests.lock().unwrap().push(request.clone());

        match &self.mode {
            FakeVerifierMode::Accept => Ok(VerificationResponse::Accepted {
                reference: "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn".to_string(),
            }),
            FakeVerifierMode::AlreadyVerified => Ok(VerificationResponse::AlreadyVerified),
            FakeVerifierMode::Reject(reason) => Ok(VerificationResponse::Rejected {
                reason: reason.clone(),
            }),
            FakeVerifierMode::Unreachable => anyhow::bail!("Connection refused"),
        }
    }
}

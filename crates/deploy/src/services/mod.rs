//! Collaborators backed by real networks.
//!
//! - `coordinator_mock` - substitute VRF coordinator deployed on a local chain
//! - `artifact_deployer` - contract creation over JSON-RPC
//! - `etherscan` - Etherscan-compatible source verification

pub mod artifact_deployer;
pub mod coordinator_mock;
pub mod etherscan;

pub use artifact_deployer::RpcArtifactDeployer;
pub use coordinator_mock::RpcCoordinatorMock;
pub use etherscan::EtherscanVerifier;

//! Capability traits for the external collaborators of a deployment run.
//!
//! Each external system the pipeline talks to sits behind one small trait so tests can
//! swap it for an in-memory fake:
//! - [`OracleProvisioner`]: the substitute VRF coordinator on ephemeral networks
//! - [`ArtifactDeployer`]: contract creation and confirmation tracking
//! - [`SourceVerifier`]: the block explorer's source verification API
//!
//! Implementations return [`anyhow::Result`]; the pipeline maps failures to
//! [`DeployError`](crate::DeployError) kinds.

mod artifact;
mod oracle;
mod verifier;

pub use artifact::{ArtifactDeployer, ConfirmationStatus};
pub use oracle::{CallReceipt, OracleProvisioner};
pub use verifier::{SourceVerifier, VerificationRequest, VerificationResponse};

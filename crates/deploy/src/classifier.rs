//! Classification of target environments into ephemeral and persistent ones.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Network names that are disposable local chains unless configured otherwise.
pub const DEFAULT_DEVELOPMENT_CHAINS: &[&str] = &["hardhat", "localhost", "local", "anvil"];

/// The kind of environment a run targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentClass {
    /// Local chain without external state; oracle dependencies are mocked.
    Ephemeral,
    /// Shared chain; oracle dependencies must already exist.
    Persistent,
}

/// Membership test against the set of development chain names.
#[derive(Debug, Clone)]
pub struct Classifier {
    development_chains: BTreeSet<String>,
}

impl Classifier {
    pub fn new<I, S>(development_chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            development_chains: development_chains.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ephemeral(&self, environment: &str) -> bool {
        self.development_chains.contains(environment)
    }

    pub fn classify(&self, environment: &str) -> EnvironmentClass {
        if self.is_ephemeral(environment) {
            EnvironmentClass::Ephemeral
        } else {
            EnvironmentClass::Persistent
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_DEVELOPMENT_CHAINS.iter().copied())
    }
}

//! Deployment records written after a successful run.

use std::path::{Path, PathBuf};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    classifier::EnvironmentClass,
    executor::{DeploymentArgs, DeploymentResult},
};

/// What was deployed where. Written once per run; never read back by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub network: String,
    pub chain_id: u64,
    pub class: EnvironmentClass,
    pub address: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
    pub confirmations: u64,
    /// Constructor arguments in declaration order, as displayed values.
    pub args: Vec<String>,
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentRecord {
    pub fn new(
        contract_name: &str,
        network: &str,
        chain_id: u64,
        class: EnvironmentClass,
        result: &DeploymentResult,
        args: &DeploymentArgs,
    ) -> Self {
        Self {
            contract_name: contract_name.to_string(),
            network: network.to_string(),
            chain_id,
            class,
            address: result.address,
            transaction_hash: result.transaction_hash,
            block_number: result.block_number,
            confirmations: result.confirmed_block_depth,
            args: args.display_values(),
            deployed_at: Utc::now(),
        }
    }

    /// Where the record for this deployment lives under `dir`.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.network)
            .join(format!("{}.json", self.contract_name))
    }

    /// Write the record as `<dir>/<network>/<contract>.json`, replacing any previous one.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = self.path_in(dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize deployment record")?;
        std::fs::write(&path, content)
            .context(format!("Failed to write deployment record to {}", path.display()))?;

        tracing::info!(path = %path.display(), "Deployment record saved");
        Ok(path)
    }
}

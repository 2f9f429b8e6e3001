//! Compiled contract artifacts (Hardhat or Foundry JSON).

use std::path::Path;

use alloy_core::{
    json_abi::{JsonAbi, Param},
    primitives::Bytes,
};
use anyhow::Context;
use serde::Deserialize;

/// Hardhat stores the bytecode as a string, Foundry as `{ "object": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum Bytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    #[serde(default)]
    contract_name: Option<String>,
    abi: JsonAbi,
    bytecode: Bytecode,
}

/// A deployable contract: creation bytecode plus its constructor signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub bytecode: Bytes,
    pub constructor_inputs: Vec<Param>,
}

impl Artifact {
    /// Load an artifact JSON file. The name falls back to the file stem.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let fallback_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("Contract");

        Self::from_json(&content, fallback_name)
            .with_context(|| format!("Invalid artifact {}", path.display()))
    }

    pub fn from_json(content: &str, fallback_name: &str) -> anyhow::Result<Self> {
        let file: ArtifactFile =
            serde_json::from_str(content).context("Failed to parse artifact JSON")?;

        let bytecode = match file.bytecode {
            Bytecode::Hex(bytes) | Bytecode::Object { object: bytes } => bytes,
        };
        if bytecode.is_empty() {
            anyhow::bail!("Artifact has no creation bytecode (abstract contract or interface?)");
        }

        let constructor_inputs = file
            .abi
            .constructor
            .map(|constructor| constructor.inputs)
            .unwrap_or_default();

        Ok(Self {
            name: file
                .contract_name
                .unwrap_or_else(|| fallback_name.to_string()),
            bytecode,
            constructor_inputs,
        })
    }

    /// Canonical constructor signature, e.g. `constructor(address,uint64)`.
    pub fn constructor_signature(&self) -> String {
        let types: Vec<_> = self
            .constructor_inputs
            .iter()
            .map(Param::selector_type)
            .collect();
        format!("constructor({})", types.join(","))
    }
}

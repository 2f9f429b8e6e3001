//! Etherscan-compatible source verification (Etherscan, BscScan, ...).

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    config::VerificationConfig,
    rpc,
    traits::{SourceVerifier, VerificationRequest, VerificationResponse},
};

const CODE_FORMAT: &str = "solidity-standard-json-input";

/// Body of every Etherscan API answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EtherscanResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: String,
}

/// Map an API answer to a verification response.
///
/// `status == "1"` carries the submission guid; an "already verified" rejection counts as
/// success.
pub fn classify_response(response: EtherscanResponse) -> VerificationResponse {
    if response.status == "1" {
        return VerificationResponse::Accepted {
            reference: response.result,
        };
    }

    if response.result.to_lowercase().contains("already verified") {
        return VerificationResponse::AlreadyVerified;
    }

    let reason = if response.result.is_empty() {
        response.message
    } else {
        response.result
    };
    VerificationResponse::Rejected { reason }
}

/// Read a standard-json compiler input.
///
/// Accepts either the input itself or a Hardhat build-info file wrapping it under `input`.
pub fn load_source_input(path: &Path) -> anyhow::Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source input {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Source input {} is not valid JSON", path.display()))?;

    let input = match value.get("input") {
        Some(input) => input,
        None => &value,
    };
    if input.get("sources").is_none() {
        anyhow::bail!(
            "{} is not a standard-json compiler input (no `sources`)",
            path.display()
        );
    }

    Ok(input.to_string())
}

/// Submits `verifysourcecode` requests to an Etherscan-compatible API.
#[derive(Debug, Clone)]
pub struct EtherscanVerifier {
    client: reqwest::Client,
    api_url: Url,
    contract_name: String,
    compiler_version: String,
    /// Read on submission only.
    source_input: Option<PathBuf>,
}

impl EtherscanVerifier {
    pub fn from_config(config: &VerificationConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            api_url: config.api_url.clone(),
            contract_name: config.contract_name.clone(),
            compiler_version: config.compiler_version.clone(),
            source_input: config.source_input.clone(),
        })
    }
}

impl SourceVerifier for EtherscanVerifier {
    async fn submit(&self, request: &VerificationRequest) -> anyhow::Result<VerificationResponse> {
        let source_path = self
            .source_input
            .as_deref()
            .context("No standard-json source input configured (verification.source_input)")?;
        let source_input = load_source_input(source_path)?;

        let address = request.address.to_string();
        let constructor_arguments = hex::encode(&request.constructor_arguments);
        let form = [
            ("apikey", request.api_key.expose()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", address.as_str()),
            ("sourceCode", source_input.as_str()),
            ("codeformat", CODE_FORMAT),
            ("contractname", self.contract_name.as_str()),
            ("compilerversion", self.compiler_version.as_str()),
            // Misspelled on the Etherscan side.
            ("constructorArguements", constructor_arguments.as_str()),
        ];

        let response: EtherscanResponse = self
            .client
            .post(self.api_url.clone())
            .form(&form)
            .send()
            .await
            .context("Failed to reach the verification API")?
            .json()
            .await
            .context("Failed to parse the verification API response")?;

        Ok(classify_response(response))
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;
    use crate::config::Secret;

    fn response(status: &str, message: &str, result: &str) -> EtherscanResponse {
        EtherscanResponse {
            status: status.to_string(),
            message: message.to_string(),
            result: result.to_string(),
        }
    }

    #[test]
    fn test_classify_accepted() {
        assert_eq!(
            classify_response(response("1", "OK", "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn")),
            VerificationResponse::Accepted {
                reference: "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn".to_string()
            }
        );
    }

    #[test]
    fn test_classify_already_verified() {
        assert_eq!(
            classify_response(response("0", "NOTOK", "Contract source code already verified")),
            VerificationResponse::AlreadyVerified
        );
    }

    #[test]
    fn test_classify_rejected() {
        assert_eq!(
            classify_response(response("0", "NOTOK", "Invalid API Key")),
            VerificationResponse::Rejected {
                reason: "Invalid API Key".to_string()
            }
        );
        assert_eq!(
            classify_response(response("0", "NOTOK", "")),
            VerificationResponse::Rejected {
                reason: "NOTOK".to_string()
            }
        );
    }

    #[test]
    fn test_load_source_input_from_build_info() {
        let dir = TempDir::new("vrfdeploy-etherscan").unwrap();
        let path = dir.path().join("build-info.json");
        std::fs::write(
            &path,
            r#"{"_format": "hh-sol-build-info-1", "solcVersion": "0.8.8",
                "input": {"language": "Solidity", "sources": {"contracts/Raffle.sol": {"content": ""}}},
                "output": {}}"#,
        )
        .unwrap();

        let input = load_source_input(&path).unwrap();
        let value: Value = serde_json::from_str(&input).unwrap();
        assert_eq!(value["language"], "Solidity");
        assert!(value.get("output").is_none());
    }

    #[test]
    fn test_load_source_input_rejects_other_json() {
        let dir = TempDir::new("vrfdeploy-etherscan").unwrap();
        let path = dir.path().join("Raffle.json");
        std::fs::write(&path, r#"{"abi": [], "bytecode": "0x00"}"#).unwrap();

        assert!(load_source_input(&path).is_err());
    }

    #[tokio::test]
    async fn test_submit_without_source_input_fails() {
        let verifier = EtherscanVerifier::from_config(&VerificationConfig::default()).unwrap();
        let request = VerificationRequest {
            address: alloy_core::primitives::Address::ZERO,
            constructor_arguments: Default::default(),
            api_key: Secret::new("KEY"),
        };

        let err = verifier.submit(&request).await.unwrap_err();
        assert!(err.to_string().contains("source input"));
    }
}

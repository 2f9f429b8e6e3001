//! JSON-RPC chain client used by the real collaborators.

pub mod abi;
mod tx;
mod types;

use std::time::Duration;

use alloy_consensus::TxLegacy;
use alloy_core::primitives::{Address, B256, Bytes, U64, U256};
use anyhow::Context;
use serde_json::Value;
use url::Url;

pub use tx::LocalSigner;
pub use types::{Log, TransactionReceipt};

use crate::{registry::NetworkConfig, rpc};

/// Extra gas on top of `eth_estimateGas`, in percent.
const GAS_ESTIMATE_MARGIN_PERCENT: u64 = 20;

/// The account transactions are sent from.
#[derive(Debug, Clone)]
pub enum Sender {
    /// An account unlocked on the node itself (local development chains).
    Unlocked(Address),
    /// A private key held by this process.
    Local(LocalSigner),
}

impl Sender {
    pub fn address(&self) -> Address {
        match self {
            Self::Unlocked(address) => *address,
            Self::Local(signer) => signer.address(),
        }
    }
}

/// A connection to one network's JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct ChainClient {
    client: reqwest::Client,
    url: Url,
    chain_id: u64,
    sender: Sender,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl ChainClient {
    /// Connect to `network`, checking its chain id.
    ///
    /// Without a signer, the node's first unlocked account (`eth_accounts[0]`) sends the
    /// transactions.
    pub async fn connect(network: &NetworkConfig, signer: Option<LocalSigner>) -> anyhow::Result<Self> {
        let client = rpc::create_client()?;
        let url = network.rpc_url.clone();

        let reported: U64 = rpc::json_rpc_call(&client, url.as_str(), "eth_chainId", vec![])
            .await
            .with_context(|| format!("Failed to reach RPC endpoint {url}"))?;
        let reported = reported.to::<u64>();
        if reported != network.chain_id {
            anyhow::bail!(
                "RPC endpoint {} reports chain id {}, expected {}",
                url,
                reported,
                network.chain_id
            );
        }

        let sender = match signer {
            Some(signer) => Sender::Local(signer),
            None => {
                let accounts: Vec<Address> =
                    rpc::json_rpc_call(&client, url.as_str(), "eth_accounts", vec![])
                        .await
                        .context("Failed to list node accounts")?;
                let deployer = accounts
                    .first()
                    .copied()
                    .context("Node exposes no unlocked accounts and no signing key was given")?;
                Sender::Unlocked(deployer)
            }
        };

        tracing::info!(
            rpc_url = %url,
            chain_id = reported,
            sender = %sender.address(),
            "Connected to network"
        );

        Ok(Self {
            client,
            url,
            chain_id: reported,
            sender,
            receipt_timeout: network.confirmation_timeout(),
            poll_interval: network.poll_interval(),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn sender_address(&self) -> Address {
        self.sender.address()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> anyhow::Result<T> {
        rpc::json_rpc_call(&self.client, self.url.as_str(), method, params).await
    }

    /// Submit a transaction and return its hash. `to = None` creates a contract.
    ///
    /// The transaction is sent exactly once; callers never resubmit on failure.
    pub async fn send_transaction(&self, to: Option<Address>, input: Bytes) -> anyhow::Result<B256> {
        let mut request = serde_json::json!({
            "from": self.sender.address(),
            "data": input,
        });
        if let Some(to) = to {
            request["to"] = serde_json::json!(to);
        }

        match &self.sender {
            Sender::Unlocked(_) => self
                .call("eth_sendTransaction", vec![request])
                .await
                .context("eth_sendTransaction failed"),
            Sender::Local(signer) => {
                let nonce: U64 = self
                    .call(
                        "eth_getTransactionCount",
                        vec![serde_json::json!(signer.address()), serde_json::json!("pending")],
                    )
                    .await
                    .context("Failed to fetch sender nonce")?;
                let gas_price: U256 = self
                    .call("eth_gasPrice", vec![])
                    .await
                    .context("Failed to fetch gas price")?;
                let gas_estimate: U64 = self
                    .call("eth_estimateGas", vec![request])
                    .await
                    .context("Gas estimation failed")?;
                let gas_estimate = gas_estimate.to::<u64>();

                let tx = TxLegacy {
                    chain_id: Some(self.chain_id),
                    nonce: nonce.to::<u64>(),
                    gas_price: gas_price.saturating_to::<u128>(),
                    gas_limit: gas_estimate + gas_estimate * GAS_ESTIMATE_MARGIN_PERCENT / 100,
                    to: to.into(),
                    value: U256::ZERO,
                    input,
                };
                let raw = signer.sign_transaction(tx)?;

                self.call("eth_sendRawTransaction", vec![serde_json::json!(raw)])
                    .await
                    .context("eth_sendRawTransaction failed")
            }
        }
    }

    pub async fn receipt(&self, tx_hash: B256) -> anyhow::Result<Option<TransactionReceipt>> {
        self.call("eth_getTransactionReceipt", vec![serde_json::json!(tx_hash)])
            .await
    }

    pub async fn block_number(&self) -> anyhow::Result<u64> {
        let number: U64 = self.call("eth_blockNumber", vec![]).await?;
        Ok(number.to::<u64>())
    }

    /// Wait until `tx_hash` is mined and return its receipt.
    pub async fn wait_for_receipt(&self, tx_hash: B256) -> anyhow::Result<TransactionReceipt> {
        rpc::poll_until(
            &format!("receipt of {tx_hash}"),
            self.receipt_timeout,
            self.poll_interval,
            || self.receipt(tx_hash),
        )
        .await
    }

    /// Send a transaction and wait for a successful receipt.
    pub async fn transact(&self, to: Option<Address>, input: Bytes) -> anyhow::Result<TransactionReceipt> {
        let tx_hash = self.send_transaction(to, input).await?;
        tracing::debug!(%tx_hash, "Transaction sent");

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.succeeded() {
            anyhow::bail!("Transaction {} reverted", tx_hash);
        }
        Ok(receipt)
    }
}

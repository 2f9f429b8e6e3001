//! JSON-RPC response types.

use alloy_core::primitives::{Address, B256, Bytes, U64};
use serde::{Deserialize, Serialize};

/// An event log emitted by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
}

/// The subset of `eth_getTransactionReceipt` used by the deployer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// `0x1` on success, `0x0` on revert. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|status| status != U64::ZERO)
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number.map(|n| n.to::<u64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_from_json() {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0x6f0d4e3b35b1b4b8a2d4f2ce40cc4ae27b4d0b40c93ed4f5b2d35c1ae9f3b5a1",
            "blockNumber": "0x2a",
            "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "status": "0x1",
            "gasUsed": "0x5208",
            "logs": [{
                "address": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "topics": ["0x0000000000000000000000000000000000000000000000000000000000000001"],
                "data": "0x",
                "logIndex": "0x0"
            }]
        }))
        .unwrap();

        assert!(receipt.succeeded());
        assert_eq!(receipt.block_number(), Some(42));
        assert_eq!(receipt.logs.len(), 1);
        assert!(receipt.contract_address.is_some());
    }

    #[test]
    fn test_reverted_receipt() {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0x6f0d4e3b35b1b4b8a2d4f2ce40cc4ae27b4d0b40c93ed4f5b2d35c1ae9f3b5a1",
            "blockNumber": "0x2a",
            "contractAddress": null,
            "status": "0x0",
            "logs": []
        }))
        .unwrap();

        assert!(!receipt.succeeded());
    }
}

//! Local signing of legacy transactions.

use std::{fmt, str::FromStr};

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_core::primitives::{Address, Bytes};
use alloy_eips::eip2718::Encodable2718;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use anyhow::Context;

/// A private key held in memory that signs transactions locally.
#[derive(Clone)]
pub struct LocalSigner {
    inner: PrivateKeySigner,
}

impl LocalSigner {
    /// Parse a hex private key, with or without `0x` prefix.
    pub fn from_hex(private_key: &str) -> anyhow::Result<Self> {
        let inner = PrivateKeySigner::from_str(private_key.trim())
            .context("Private key is not a valid secp256k1 key")?;
        Ok(Self { inner })
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    /// Sign `tx` with EIP-155 replay protection and return its raw encoding.
    pub fn sign_transaction(&self, tx: TxLegacy) -> anyhow::Result<Bytes> {
        let signature = self
            .inner
            .sign_hash_sync(&tx.signature_hash())
            .context("Failed to sign transaction hash")?;

        let envelope = TxEnvelope::from(tx.into_signed(signature));
        Ok(envelope.encoded_2718().into())
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

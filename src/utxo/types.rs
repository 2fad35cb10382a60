//! Domain types for the UTXO transfer pipeline.

use rust_decimal::Decimal;
use std::fmt;

/// Reference to a prior transaction output usable as a funding input.
/// Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutpointRef {
    pub source_id: String,
    pub source_index: u32,
}

/// Opaque signing credential. Held in memory for the duration of one request
/// only, never persisted, never logged.
#[derive(Clone)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(material: impl Into<String>) -> Self {
        Self(material.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// A funding input with its credential bound structurally. Binding the key to
/// the outpoint in one record is what keeps the i-th key signing the i-th
/// input under any future reordering.
#[derive(Debug, Clone)]
pub struct FundingInput {
    pub outpoint: OutpointRef,
    pub key: SigningKey,
}

/// Requested transfer destination. Amount is the caller's decimal value;
/// conversion to subunits happens at assembly.
#[derive(Debug, Clone)]
pub struct Destination {
    pub address: String,
    pub amount: Decimal,
}

/// A single draft output with its amount already converted to subunits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOutput {
    pub address: String,
    pub value: u64,
}

/// Ordered draft of a transaction, built before any signature is applied.
/// Input and output ordering is immutable after assembly.
#[derive(Debug, Clone)]
pub struct TxDraft {
    pub inputs: Vec<FundingInput>,
    pub outputs: Vec<DraftOutput>,
}

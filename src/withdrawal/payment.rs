//! Payment Envelope Build + Signing
//!
//! Account-chain payments are expressed as a compact envelope, signed with
//! the sender's ed25519 secret and shipped to the chain gateway as
//! base64(bincode). The secret arrives with the request, lives on the stack
//! for the duration of the build, and is never logged or persisted.

use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::config::Network;
use crate::money::{self, MoneyError};
use crate::upstream::LedgerAccount;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Account-chain amounts carry 7 fractional digits.
pub const ACCOUNT_SUBUNIT_EXPONENT: u32 = 7;

/// Base fee per operation, in subunits.
pub const BASE_FEE: u32 = 100;

/// Envelopes expire this many seconds after signing.
pub const VALID_SECONDS: u64 = 30;

/// Text memos above this byte length are replaced by their SHA-256 hash.
pub const MAX_TEXT_MEMO_BYTES: usize = 28;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid signing secret: {0}")]
    InvalidSecret(String),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Envelope encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Memo {
    None,
    Text(String),
    Hash([u8; 32]),
}

impl Memo {
    /// Attach a caller-supplied attribute as a memo. Anything that fits the
    /// text memo limit goes in verbatim; longer payloads are hashed so the
    /// reference survives without breaking the envelope size rules.
    pub fn from_attr(attr: Option<&str>) -> Self {
        match attr {
            None => Memo::None,
            Some(text) if text.len() <= MAX_TEXT_MEMO_BYTES => Memo::Text(text.to_string()),
            Some(text) => {
                let digest = Sha256::digest(text.as_bytes());
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&digest);
                Memo::Hash(hash)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asset {
    Native,
    Issued { code: String, issuer: String },
}

/// The signed payload. Sequence must be the account's current sequence plus
/// one or the chain rejects the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEnvelope {
    pub source: String,
    pub sequence: i64,
    pub fee: u32,
    pub destination: String,
    pub asset: Asset,
    pub amount: u64,
    pub memo: Memo,
    pub signed_at: u64,
    pub valid_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub envelope: PaymentEnvelope,
    pub signature: Vec<u8>,
}

fn decode_secret(secret_hex: &str) -> Result<SigningKey, PaymentError> {
    let bytes = hex::decode(secret_hex.trim())
        .map_err(|e| PaymentError::InvalidSecret(format!("not hex: {}", e)))?;
    let seed: [u8; SECRET_KEY_LENGTH] = bytes
        .try_into()
        .map_err(|_| PaymentError::InvalidSecret("seed must be 32 bytes".to_string()))?;
    Ok(SigningKey::from_bytes(&seed))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Network id mixed into the signed payload so an envelope signed for one
/// network never verifies on another.
fn network_id(network: Network) -> [u8; 32] {
    Sha256::digest(network.passphrase().as_bytes()).into()
}

/// Build a payment envelope against the sender's fresh account snapshot,
/// sign it, and return the wire form (base64 of the bincode encoding).
pub fn build_and_sign(
    secret_hex: &str,
    account: &LedgerAccount,
    destination: &str,
    amount: Decimal,
    asset: Asset,
    attr: Option<&str>,
    network: Network,
) -> Result<String, PaymentError> {
    let signing_key = decode_secret(secret_hex)?;

    let envelope = PaymentEnvelope {
        source: account.chain_address.clone(),
        sequence: account.sequence + 1,
        fee: BASE_FEE,
        destination: destination.to_string(),
        asset,
        amount: money::to_subunits(amount, ACCOUNT_SUBUNIT_EXPONENT)?,
        memo: Memo::from_attr(attr),
        signed_at: unix_now(),
        valid_seconds: VALID_SECONDS,
    };

    let encoded = bincode::serialize(&envelope).map_err(|e| PaymentError::Encode(e.to_string()))?;
    let mut payload = network_id(network).to_vec();
    payload.extend_from_slice(&encoded);
    let signature = signing_key.sign(&payload);

    let signed = SignedEnvelope {
        envelope,
        signature: signature.to_bytes().to_vec(),
    };
    let wire = bincode::serialize(&signed).map_err(|e| PaymentError::Encode(e.to_string()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(wire))
}

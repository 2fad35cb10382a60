//! Request and response bodies for the HTTP surface.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Strict format Decimal - validates format during deserialization
///
/// - Rejects `.5` (must be `0.5`)
/// - Rejects `5.` (must be `5.0` or `5`)
/// - Rejects negative numbers
/// - Rejects empty strings
///
/// Business validation (zero amounts, subunit overflow) happens later in the
/// money layer.
#[derive(Debug, Clone, Copy)]
pub struct StrictDecimal(Decimal);

impl StrictDecimal {
    pub fn inner(self) -> Decimal {
        self.0
    }

    #[cfg(test)]
    pub fn from_decimal(d: Decimal) -> Self {
        Self(d)
    }
}

impl std::ops::Deref for StrictDecimal {
    type Target = Decimal;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for StrictDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        // Support both JSON number and JSON string
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum DecimalOrString {
            String(String),
            Number(Decimal),
        }

        let value = DecimalOrString::deserialize(deserializer)?;

        match value {
            DecimalOrString::String(s) => {
                if s.is_empty() {
                    return Err(D::Error::custom("Amount cannot be empty"));
                }
                if s.starts_with('.') {
                    return Err(D::Error::custom("Invalid format: use 0.5 not .5"));
                }
                if s.ends_with('.') {
                    return Err(D::Error::custom("Invalid format: use 5.0 not 5."));
                }

                let d = Decimal::from_str(&s)
                    .map_err(|e| D::Error::custom(format!("Invalid decimal: {}", e)))?;

                if d.is_sign_negative() {
                    return Err(D::Error::custom("Amount cannot be negative"));
                }

                Ok(StrictDecimal(d))
            }
            DecimalOrString::Number(d) => {
                if d.is_sign_negative() {
                    return Err(D::Error::custom("Amount cannot be negative"));
                }
                Ok(StrictDecimal(d))
            }
        }
    }
}

impl Serialize for StrictDecimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Serialize as string to preserve precision
        serializer.serialize_str(&self.0.to_string())
    }
}

/// Explicit spendable reference with its signing credential.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoRef {
    pub source_id: String,
    pub source_index: u32,
    #[serde(alias = "credential")]
    pub key: String,
}

impl std::fmt::Debug for UtxoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UtxoRef")
            .field("source_id", &self.source_id)
            .field("source_index", &self.source_index)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Funding address with its signing credential.
#[derive(Clone, Deserialize)]
pub struct AddressRef {
    pub address: String,
    #[serde(alias = "credential")]
    pub key: String,
}

impl std::fmt::Debug for AddressRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressRef")
            .field("address", &self.address)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// One requested output. `decimalAmount` is accepted as a legacy spelling
/// of `amount`, as `credential` is for the funding `key` fields.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSpec {
    pub address: String,
    #[serde(alias = "decimalAmount")]
    pub amount: StrictDecimal,
}

/// Body of `POST /transaction`. Exactly one of `fromUTXO` / `fromAddress`
/// must be present; the handler rejects both-or-neither before any upstream
/// call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTransactionRequest {
    #[serde(rename = "fromUTXO")]
    pub from_utxo: Option<Vec<UtxoRef>>,
    pub from_address: Option<Vec<AddressRef>>,
    pub to: Vec<OutputSpec>,
}

/// Body of `POST /transfer`. Secret material is excluded from Debug output.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub secret: String,
    pub token: Option<String>,
    pub issuer_account: Option<String>,
    pub sender_account_id: String,
    pub amount: StrictDecimal,
    pub address: String,
    pub attr: Option<String>,
}

impl std::fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferRequest")
            .field("secret", &"<redacted>")
            .field("sender_account_id", &self.sender_account_id)
            .field("address", &self.address)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDataResponse {
    pub tx_data: String,
}

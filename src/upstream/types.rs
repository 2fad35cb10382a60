//! Wire types exchanged with the upstream core service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One output of a historical transaction, as reported by the history lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutputRef {
    pub address: String,
    pub index: u32,
}

/// A transaction from an address's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressTx {
    pub hash: String,
    pub confirmations: u32,
    pub outputs: Vec<TxOutputRef>,
}

/// Off-chain ledger account, fetched fresh per request. The sequence must
/// reflect the chain's current position or envelope signing fails downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAccount {
    pub id: String,
    pub currency: String,
    pub chain_address: String,
    pub sequence: i64,
}

/// Withdrawal record creation request. The ledger service is authoritative
/// for the record's lifecycle; this crate only requests create/cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub sender_account_id: String,
    pub currency: String,
    pub amount: Decimal,
    pub address: String,
    pub fee: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalCreated {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_address_tx_deserializes() {
        let json = r#"{"hash":"ab12","confirmations":7,"outputs":[{"address":"mxy","index":0}]}"#;
        let tx: AddressTx = serde_json::from_str(json).unwrap();
        assert_eq!(tx.confirmations, 7);
        assert_eq!(tx.outputs[0].index, 0);
    }

    #[test]
    fn test_withdrawal_request_wire_shape() {
        let req = WithdrawalRequest {
            sender_account_id: "acc-1".to_string(),
            currency: "XLM".to_string(),
            amount: Decimal::from_str("10.5").unwrap(),
            address: "GDST".to_string(),
            fee: Decimal::from_str("0.00001").unwrap(),
            attr: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("senderAccountId").is_some());
        assert!(v.get("attr").is_none());
    }
}

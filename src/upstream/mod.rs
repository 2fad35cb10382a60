//! Upstream Collaborators
//!
//! Every remote effect of this service goes through the [`CoreApi`] trait:
//! transaction-history lookup, UTXO spendability checks, ledger account and
//! withdrawal operations, and raw broadcast submission. The production
//! implementation is [`HttpCoreClient`]; tests swap in a mock.

pub mod client;
pub mod types;

pub use client::HttpCoreClient;
pub use types::{AddressTx, LedgerAccount, TxOutputRef, WithdrawalCreated, WithdrawalRequest};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// The resource does not exist upstream. For the UTXO spendability check
    /// this means "already spent / ineligible", not a fault.
    #[error("Not found upstream")]
    NotFound,

    /// The collaborator answered with a non-2xx status. Status and body are
    /// preserved so callers can echo them verbatim.
    #[error("Upstream returned status {status}")]
    Status { status: u16, body: serde_json::Value },

    #[error("Upstream transport error: {0}")]
    Transport(String),
}

/// Remote core service consumed by both pipelines.
///
/// Calls are sequential within one request; the deadline configured on the
/// client applies to every outbound call.
#[async_trait]
pub trait CoreApi: Send + Sync {
    /// Transaction history of an address, newest-first as the upstream returns it.
    async fn fetch_history(&self, address: &str) -> Result<Vec<AddressTx>, UpstreamError>;

    /// Confirm a prior output is still unspent. `Err(NotFound)` means spent
    /// or otherwise unavailable.
    async fn check_unspent(&self, tx_hash: &str, index: u32) -> Result<(), UpstreamError>;

    /// Submit a hex-encoded raw UTXO-chain transaction for broadcast.
    async fn submit_raw(&self, tx_data: &str) -> Result<serde_json::Value, UpstreamError>;

    /// Fetch the off-chain ledger account by id.
    async fn fetch_account(&self, account_id: &str) -> Result<LedgerAccount, UpstreamError>;

    /// Create a Pending withdrawal record in the ledger.
    async fn record_withdrawal(
        &self,
        req: &WithdrawalRequest,
    ) -> Result<WithdrawalCreated, UpstreamError>;

    /// Cancel a previously recorded withdrawal (saga compensation).
    async fn cancel_withdrawal(&self, id: &str) -> Result<(), UpstreamError>;

    /// Broadcast a signed account-chain transaction, tagged with its
    /// withdrawal id so the ledger can complete the record.
    async fn submit_account_broadcast(
        &self,
        tx_data: &str,
        withdrawal_id: &str,
    ) -> Result<serde_json::Value, UpstreamError>;
}

/// Mock collaborator for tests. Records call counts and lets each operation
/// be forced to fail, in the style of the service-adapter mocks used by the
/// transfer FSM tests.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct MockCore {
        pub history: Mutex<Vec<AddressTx>>,
        pub account: Mutex<Option<LedgerAccount>>,
        /// Outputs the spendability check reports as spent ("tx_hash:index").
        pub spent: Mutex<Vec<String>>,

        pub fail_unspent: Mutex<Option<UpstreamError>>,
        pub fail_fetch_account: Mutex<Option<UpstreamError>>,
        pub fail_record: Mutex<Option<UpstreamError>>,
        pub fail_cancel: Mutex<Option<UpstreamError>>,
        pub fail_broadcast: Mutex<Option<UpstreamError>>,

        pub history_calls: AtomicUsize,
        pub unspent_calls: AtomicUsize,
        pub raw_calls: AtomicUsize,
        pub account_calls: AtomicUsize,
        pub record_calls: AtomicUsize,
        pub cancel_calls: AtomicUsize,
        pub broadcast_calls: AtomicUsize,
    }

    impl MockCore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_account(currency: &str) -> Self {
            let mock = Self::default();
            *mock.account.lock().unwrap() = Some(LedgerAccount {
                id: "acc-1".to_string(),
                currency: currency.to_string(),
                chain_address: "GSENDER".to_string(),
                sequence: 41,
            });
            mock
        }

        pub fn mark_spent(&self, tx_hash: &str, index: u32) {
            self.spent.lock().unwrap().push(format!("{}:{}", tx_hash, index));
        }

        pub fn cancel_count(&self) -> usize {
            self.cancel_calls.load(Ordering::SeqCst)
        }

        pub fn broadcast_count(&self) -> usize {
            self.broadcast_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CoreApi for MockCore {
        async fn fetch_history(&self, _address: &str) -> Result<Vec<AddressTx>, UpstreamError> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.history.lock().unwrap().clone())
        }

        async fn check_unspent(&self, tx_hash: &str, index: u32) -> Result<(), UpstreamError> {
            self.unspent_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.fail_unspent.lock().unwrap().clone() {
                return Err(e);
            }
            let key = format!("{}:{}", tx_hash, index);
            if self.spent.lock().unwrap().contains(&key) {
                Err(UpstreamError::NotFound)
            } else {
                Ok(())
            }
        }

        async fn submit_raw(&self, tx_data: &str) -> Result<serde_json::Value, UpstreamError> {
            self.raw_calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::json!({ "txData": tx_data }))
        }

        async fn fetch_account(&self, _account_id: &str) -> Result<LedgerAccount, UpstreamError> {
            self.account_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.fail_fetch_account.lock().unwrap().clone() {
                return Err(e);
            }
            self.account
                .lock()
                .unwrap()
                .clone()
                .ok_or(UpstreamError::NotFound)
        }

        async fn record_withdrawal(
            &self,
            _req: &WithdrawalRequest,
        ) -> Result<WithdrawalCreated, UpstreamError> {
            self.record_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.fail_record.lock().unwrap().clone() {
                return Err(e);
            }
            Ok(WithdrawalCreated {
                id: "wd-1".to_string(),
            })
        }

        async fn cancel_withdrawal(&self, _id: &str) -> Result<(), UpstreamError> {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.fail_cancel.lock().unwrap().clone() {
                return Err(e);
            }
            Ok(())
        }

        async fn submit_account_broadcast(
            &self,
            _tx_data: &str,
            withdrawal_id: &str,
        ) -> Result<serde_json::Value, UpstreamError> {
            self.broadcast_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.fail_broadcast.lock().unwrap().clone() {
                return Err(e);
            }
            Ok(serde_json::json!({ "withdrawalId": withdrawal_id, "completed": true }))
        }
    }
}

#[cfg(test)]
pub use mock::MockCore;

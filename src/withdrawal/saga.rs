//! Withdrawal Saga
//!
//! Record-before-broadcast orchestration for account-chain withdrawals.
//! The ledger record is created first; every failure after that point
//! triggers exactly one compensating cancel before the error surfaces.

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::payment::{self, Asset};
use super::state::SagaState;
use crate::config::Network;
use crate::upstream::{CoreApi, UpstreamError, WithdrawalRequest};
use thiserror::Error;

/// Currency code of the chain's native asset.
pub const NATIVE_ASSET: &str = "XLM";

/// Flat fee attached to every withdrawal record.
fn withdrawal_fee() -> Decimal {
    Decimal::new(1, 5) // 0.00001
}

/// One withdrawal request as accepted by the transfer endpoint. The secret
/// never appears in Debug output.
#[derive(Clone)]
pub struct TransferCommand {
    pub secret: String,
    pub sender_account_id: String,
    pub address: String,
    pub amount: Decimal,
    pub token: Option<String>,
    pub issuer_account: Option<String>,
    pub attr: Option<String>,
}

impl std::fmt::Debug for TransferCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferCommand")
            .field("secret", &"<redacted>")
            .field("sender_account_id", &self.sender_account_id)
            .field("address", &self.address)
            .field("amount", &self.amount)
            .field("token", &self.token)
            .field("issuer_account", &self.issuer_account)
            .field("attr", &self.attr)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum SagaError {
    /// Native-currency accounts must not name a token; token-currency
    /// accounts must. Checked before any ledger effect.
    #[error("Unsupported account currency.")]
    CurrencyMismatch,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Envelope build or signing failed after the record existed. The record
    /// has been cancelled; `id` identifies it for the caller.
    #[error("Withdrawal {id} cancelled: {reason}")]
    BuildCancelled { id: String, reason: String },

    /// Broadcast failed after the record existed. The record has been
    /// cancelled; the original broadcast failure is preserved.
    #[error("Broadcast failed for withdrawal {id}")]
    BroadcastFailed { id: String, source: UpstreamError },
}

pub struct WithdrawalSaga<'a> {
    core: &'a dyn CoreApi,
    network: Network,
    state: SagaState,
    compensation_spent: bool,
}

impl<'a> WithdrawalSaga<'a> {
    pub fn new(core: &'a dyn CoreApi, network: Network) -> Self {
        Self {
            core,
            network,
            state: SagaState::Initiated,
            compensation_spent: false,
        }
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    fn transition(&mut self, next: SagaState) {
        info!(from = %self.state, to = %next, "Saga transition");
        self.state = next;
    }

    /// Run the saga to a terminal state. On success the broadcast response is
    /// returned as-is for the handler to pass through.
    pub async fn execute(
        &mut self,
        cmd: TransferCommand,
    ) -> Result<serde_json::Value, SagaError> {
        // 1. Resolve the sender's ledger account. Sequence must be fresh.
        let account = self.core.fetch_account(&cmd.sender_account_id).await?;
        self.transition(SagaState::AccountResolved);

        // 2. Currency/token consistency. No ledger effect exists yet, so a
        // mismatch terminates without compensation.
        let native = account.currency == NATIVE_ASSET;
        if (native && cmd.token.is_some()) || (!native && cmd.token.is_none()) {
            self.transition(SagaState::Rejected);
            return Err(SagaError::CurrencyMismatch);
        }
        self.transition(SagaState::Validated);

        let asset = match &cmd.token {
            None => Asset::Native,
            Some(code) => Asset::Issued {
                code: code.clone(),
                issuer: cmd.issuer_account.clone().unwrap_or_default(),
            },
        };

        // 3. Record the Pending withdrawal. A failure here leaves nothing
        // behind, so the upstream error propagates directly.
        let record = self
            .core
            .record_withdrawal(&WithdrawalRequest {
                sender_account_id: cmd.sender_account_id.clone(),
                currency: account.currency.clone(),
                amount: cmd.amount,
                address: cmd.address.clone(),
                fee: withdrawal_fee(),
                attr: cmd.attr.clone(),
            })
            .await?;
        self.transition(SagaState::Recorded);

        // 4. Build and sign the payment envelope.
        let tx_data = match payment::build_and_sign(
            &cmd.secret,
            &account,
            &cmd.address,
            cmd.amount,
            asset,
            cmd.attr.as_deref(),
            self.network,
        ) {
            Ok(tx_data) => tx_data,
            Err(e) => {
                self.transition(SagaState::BuildFailed);
                self.compensate(&record.id).await;
                return Err(SagaError::BuildCancelled {
                    id: record.id,
                    reason: e.to_string(),
                });
            }
        };

        // 5. Broadcast. On failure the original error is preserved for the
        // caller; the record is cancelled first.
        match self.core.submit_account_broadcast(&tx_data, &record.id).await {
            Ok(response) => {
                self.transition(SagaState::Broadcast);
                self.transition(SagaState::Completed);
                info!(withdrawal_id = %record.id, "Withdrawal broadcast completed");
                Ok(response)
            }
            Err(source) => {
                self.transition(SagaState::BroadcastFailed);
                self.compensate(&record.id).await;
                Err(SagaError::BroadcastFailed {
                    id: record.id,
                    source,
                })
            }
        }
    }

    /// Cancel the withdrawal record, at most once per saga instance. A cancel
    /// failure is logged and swallowed so it never masks the primary error.
    async fn compensate(&mut self, id: &str) {
        if self.compensation_spent {
            return;
        }
        self.compensation_spent = true;
        self.transition(SagaState::Cancelling);

        match self.core.cancel_withdrawal(id).await {
            Ok(()) => {
                self.transition(SagaState::Cancelled);
                info!(withdrawal_id = %id, "Withdrawal record cancelled");
            }
            Err(e) => {
                self.transition(SagaState::Cancelled);
                warn!(withdrawal_id = %id, error = %e, "Withdrawal cancel failed; record needs manual cleanup");
            }
        }
    }
}

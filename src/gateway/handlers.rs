//! HTTP handlers for the two transfer endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;
use tracing::info;

use super::error::ApiError;
use super::state::AppState;
use super::types::{BuildTransactionRequest, TransferRequest, TxDataResponse};
use crate::utxo::{
    self, AddressSource, Destination, FundingSourceResolver, OutpointRef, SigningKey, UtxoSource,
};
use crate::withdrawal::{TransferCommand, WithdrawalSaga};

/// `POST /transaction` - build, sign and broadcast a UTXO-chain transaction.
/// Answers 202: the signed transaction has been accepted for broadcast, the
/// chain's verdict arrives out of band.
pub async fn build_transaction(
    State(state): State<AppState>,
    Json(req): Json<BuildTransactionRequest>,
) -> Result<(StatusCode, Json<TxDataResponse>), ApiError> {
    let from_utxo = req.from_utxo.map(|sources| {
        sources
            .into_iter()
            .map(|s| UtxoSource {
                outpoint: OutpointRef {
                    source_id: s.source_id,
                    source_index: s.source_index,
                },
                key: SigningKey::new(s.key),
            })
            .collect()
    });
    let from_address = req.from_address.map(|sources| {
        sources
            .into_iter()
            .map(|s| AddressSource {
                address: s.address,
                key: SigningKey::new(s.key),
            })
            .collect()
    });

    let resolver = FundingSourceResolver::new(state.core.as_ref());
    let inputs = resolver.resolve(from_utxo, from_address).await?;

    let destinations: Vec<Destination> = req
        .to
        .iter()
        .map(|out| Destination {
            address: out.address.clone(),
            amount: out.amount.inner(),
        })
        .collect();

    let draft = utxo::assemble(inputs, &destinations)?;
    let tx_data = utxo::sign(&draft, state.network)?;

    state.core.submit_raw(&tx_data).await?;
    info!(
        inputs = draft.inputs.len(),
        outputs = draft.outputs.len(),
        "Transaction signed and submitted"
    );

    Ok((StatusCode::ACCEPTED, Json(TxDataResponse { tx_data })))
}

/// `POST /transfer` - run the account-chain withdrawal saga. The broadcast
/// response is passed through unchanged on success.
pub async fn transfer(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut saga = WithdrawalSaga::new(state.core.as_ref(), state.network);
    let response = saga
        .execute(TransferCommand {
            secret: req.secret,
            sender_account_id: req.sender_account_id,
            address: req.address,
            amount: req.amount.inner(),
            token: req.token,
            issuer_account: req.issuer_account,
            attr: req.attr,
        })
        .await?;
    Ok(Json(response))
}

/// `GET /health`
pub async fn health_check() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

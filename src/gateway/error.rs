//! HTTP error mapping.
//!
//! Every fallible handler returns [`ApiError`]; the `IntoResponse` impl is
//! the single place where domain failures become wire shapes. Upstream
//! failures keep their original status and payload.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;

use crate::money::MoneyError;
use crate::upstream::UpstreamError;
use crate::utxo::{ResolveError, SignError};
use crate::withdrawal::SagaError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed transaction body (funding exclusivity, bad amounts, bad
    /// key/address material, nothing to sign).
    #[error("{0}")]
    InvalidBody(String),

    /// Account currency and requested asset disagree.
    #[error("Unsupported account currency.")]
    UnsupportedCurrency,

    /// Upstream answered with an error; status and body are echoed verbatim.
    #[error("Upstream returned status {status}")]
    Upstream { status: u16, body: Value },

    /// Upstream was unreachable.
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// Withdrawal record was created and then cancelled after a local
    /// build/signing failure.
    #[error("Withdrawal {id} cancelled")]
    WithdrawalCancelled { id: String, message: String },

    /// Broadcast was rejected after the record existed; the record was
    /// cancelled and the original rejection is carried through.
    #[error("Broadcast rejected for withdrawal {id}")]
    BroadcastRejected {
        id: String,
        status: u16,
        body: Value,
    },
}

impl ApiError {
    /// Status code and JSON body for the wire. Split out of `into_response`
    /// so tests can assert on shapes directly.
    pub fn status_and_body(&self) -> (StatusCode, Value) {
        match self {
            ApiError::InvalidBody(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "code": "transaction.invalid.body" }),
            ),
            ApiError::UnsupportedCurrency => (
                StatusCode::FORBIDDEN,
                json!({
                    "message": "Unsupported account currency.",
                    "statusCode": 403,
                    "errorCode": "account.currency"
                }),
            ),
            ApiError::Upstream { status, body } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                body.clone(),
            ),
            ApiError::Unavailable(message) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": message }),
            ),
            ApiError::WithdrawalCancelled { id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": message, "code": "withdrawal.cancelled", "id": id }),
            ),
            ApiError::BroadcastRejected { id, status, body } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                json!({ "data": body.clone(), "id": id }),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::NotFound => ApiError::Upstream {
                status: 404,
                body: json!({ "error": "Not found upstream" }),
            },
            UpstreamError::Status { status, body } => ApiError::Upstream { status, body },
            UpstreamError::Transport(message) => ApiError::Unavailable(message),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::InvalidBody => ApiError::InvalidBody(e.to_string()),
            ResolveError::Upstream(inner) => inner.into(),
        }
    }
}

impl From<SignError> for ApiError {
    fn from(e: SignError) -> Self {
        ApiError::InvalidBody(e.to_string())
    }
}

impl From<MoneyError> for ApiError {
    fn from(e: MoneyError) -> Self {
        ApiError::InvalidBody(e.to_string())
    }
}

impl From<SagaError> for ApiError {
    fn from(e: SagaError) -> Self {
        match e {
            SagaError::CurrencyMismatch => ApiError::UnsupportedCurrency,
            SagaError::Upstream(inner) => inner.into(),
            SagaError::BuildCancelled { id, reason } => ApiError::WithdrawalCancelled {
                id,
                message: reason,
            },
            SagaError::BroadcastFailed { id, source } => match source {
                UpstreamError::Status { status, body } => {
                    ApiError::BroadcastRejected { id, status, body }
                }
                other => {
                    let (status, body) = ApiError::from(other).status_and_body();
                    ApiError::BroadcastRejected {
                        id,
                        status: status.as_u16(),
                        body,
                    }
                }
            },
        }
    }
}

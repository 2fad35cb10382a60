//! HTTP implementation of [`CoreApi`] against the core REST service.

use super::types::{AddressTx, LedgerAccount, WithdrawalCreated, WithdrawalRequest};
use super::{CoreApi, UpstreamError};
use crate::config::CoreConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

pub struct HttpCoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCoreClient {
    pub fn new(config: &CoreConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a response, preserving the status and body of non-2xx answers
    /// so handlers can echo them to the caller unchanged.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, UpstreamError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.json::<Value>().await.unwrap_or(Value::Null);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, UpstreamError> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }
}

#[async_trait]
impl CoreApi for HttpCoreClient {
    async fn fetch_history(&self, address: &str) -> Result<Vec<AddressTx>, UpstreamError> {
        debug!(address, "Fetching address history");
        self.get_json(&format!("/tx/address/{}", address)).await
    }

    async fn check_unspent(&self, tx_hash: &str, index: u32) -> Result<(), UpstreamError> {
        let resp = self
            .http
            .get(self.url(&format!("/utxo/{}/{}", tx_hash, index)))
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = resp.status();
        // 404 here carries meaning: the output is spent or unavailable.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound);
        }
        if !status.is_success() {
            let body = resp.json::<Value>().await.unwrap_or(Value::Null);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn submit_raw(&self, tx_data: &str) -> Result<Value, UpstreamError> {
        debug!("Submitting raw transaction for broadcast");
        self.post_json("/broadcast", &serde_json::json!({ "txData": tx_data }))
            .await
    }

    async fn fetch_account(&self, account_id: &str) -> Result<LedgerAccount, UpstreamError> {
        debug!(account_id, "Fetching ledger account");
        self.get_json(&format!("/account/{}", account_id)).await
    }

    async fn record_withdrawal(
        &self,
        req: &WithdrawalRequest,
    ) -> Result<WithdrawalCreated, UpstreamError> {
        debug!(
            sender = %req.sender_account_id,
            "Recording pending withdrawal"
        );
        let body = serde_json::to_value(req).map_err(|e| UpstreamError::Transport(e.to_string()))?;
        self.post_json("/withdrawal", &body).await
    }

    async fn cancel_withdrawal(&self, id: &str) -> Result<(), UpstreamError> {
        debug!(id, "Cancelling withdrawal");
        let _: Value = self
            .post_json(&format!("/withdrawal/{}/cancel", id), &Value::Null)
            .await?;
        Ok(())
    }

    async fn submit_account_broadcast(
        &self,
        tx_data: &str,
        withdrawal_id: &str,
    ) -> Result<Value, UpstreamError> {
        debug!(withdrawal_id, "Broadcasting account-chain transaction");
        self.post_json(
            "/withdrawal/broadcast",
            &serde_json::json!({ "txData": tx_data, "withdrawalId": withdrawal_id }),
        )
        .await
    }
}

//! Outbound Click merchant API client.
//!
//! Used by the reconciliation flow (`sync`) and the reversal endpoint. Every
//! call carries a bounded timeout; a timeout or network failure surfaces as
//! `AppError::Gateway` (retryable) and never guesses a payment status.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::config::ClickConfig;
use crate::error::{AppError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway payment_status code for a confirmed charge.
pub const GATEWAY_STATUS_CONFIRMED: i64 = 2;

#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    merchant_user_id: String,
    secret_key: String,
}

/// Merchant API reply for status and reversal calls.
#[derive(Debug, Deserialize)]
pub struct GatewayStatus {
    pub error_code: i64,
    pub error_note: Option<String>,
    /// Gateway-assigned payment id, when the gateway knows the transaction.
    pub payment_id: Option<i64>,
    /// Gateway-side payment status; `2` means confirmed, negative values
    /// are cancelled/failed, anything else is still in flight.
    pub payment_status: Option<i64>,
}

impl GatewayClient {
    pub fn new(config: &ClickConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base_url.clone(),
            merchant_user_id: config.merchant_user_id.clone(),
            secret_key: config.secret_key.clone(),
        }
    }

    /// Merchant API digest auth: `user_id:sha1(timestamp + secret):timestamp`.
    fn auth_header(&self) -> String {
        let timestamp = Utc::now().timestamp();
        let digest = hex::encode(Sha1::digest(format!("{}{}", timestamp, self.secret_key)));
        format!("{}:{}:{}", self.merchant_user_id, digest, timestamp)
    }

    /// Query the authoritative status of a merchant transaction.
    /// `created_at` narrows the gateway-side search to the payment's date.
    pub async fn query_status(
        &self,
        service_id: &str,
        merchant_trans_id: &str,
        created_at: i64,
    ) -> Result<GatewayStatus> {
        let date = DateTime::<Utc>::from_timestamp(created_at, 0)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .ok_or_else(|| AppError::Internal("invalid payment timestamp".into()))?;
        let url = format!(
            "{}/payment/status_by_mti/{}/{}/{}",
            self.base_url, service_id, merchant_trans_id, date
        );
        self.get_json(self.client.get(&url)).await
    }

    /// Request a reversal of a gateway payment. The ack is the gateway's
    /// reply body; a nonzero error_code means the gateway refused.
    pub async fn reverse(&self, service_id: &str, payment_id: &str) -> Result<GatewayStatus> {
        let url = format!(
            "{}/payment/reversal/{}/{}",
            self.base_url, service_id, payment_id
        );
        self.get_json(self.client.delete(&url)).await
    }

    async fn get_json(&self, request: reqwest::RequestBuilder) -> Result<GatewayStatus> {
        let response = request
            .header("Auth", self.auth_header())
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transient)?;

        if !response.status().is_success() {
            return Err(AppError::Gateway(format!(
                "merchant API returned {}",
                response.status()
            )));
        }

        response.json().await.map_err(transient)
    }
}

fn transient(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Gateway("merchant API request timed out".to_string())
    } else {
        AppError::Gateway(e.to_string())
    }
}

use crate::domain::ports::{PaymentReceipt, PaymentService};
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct SquarePaymentService {
    client: Client,
    api_base: String,
    access_token: String,
    location_id: String,
}

impl SquarePaymentService {
    pub fn new(api_base: String, access_token: String, location_id: String) -> Self {
        Self {
            client: Client::new(),
            api_base,
            access_token,
            location_id,
        }
    }
}

#[derive(Serialize)]
struct AmountMoney {
    amount: i64,
    currency: String,
}

#[derive(Serialize)]
struct CreatePaymentPayload {
    source_id: String,
    idempotency_key: String,
    amount_money: AmountMoney,
    location_id: String,
    note: String,
}

#[async_trait]
impl PaymentService for SquarePaymentService {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn charge(
        &self,
        source_token: &str,
        amount_cents: i64,
        note: &str,
    ) -> Result<PaymentReceipt, AppError> {
        let payload = CreatePaymentPayload {
            source_id: source_token.to_string(),
            // Fresh key per attempt; retries are the caller's decision.
            idempotency_key: Uuid::new_v4().to_string(),
            amount_money: AmountMoney {
                amount: amount_cents,
                currency: "USD".to_string(),
            },
            location_id: self.location_id.clone(),
            note: note.to_string(),
        };

        let res = self.client.post(format!("{}/v2/payments", self.api_base))
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Payment service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            error!("Payment service failed. Status: {}, Body: {}", status, text);
            return Err(AppError::InternalWithMsg(format!(
                "Payment service failed with status {}", status
            )));
        }

        let body: serde_json::Value = res.json().await.map_err(|e| {
            AppError::InternalWithMsg(format!("Invalid payment service response: {}", e))
        })?;
        let payment_id = body["payment"]["id"].as_str().unwrap_or_default().to_string();
        if payment_id.is_empty() {
            warn!("Payment succeeded but response carried no payment id");
        }
        info!("Captured {} cents (payment {})", amount_cents, payment_id);

        Ok(PaymentReceipt {
            payment_id,
            amount_cents,
        })
    }
}

/// Used when Square credentials are not configured. `is_enabled` lets
/// callers skip the charge step; an actual charge attempt is an error.
pub struct DisabledPaymentService;

#[async_trait]
impl PaymentService for DisabledPaymentService {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn charge(
        &self,
        _source_token: &str,
        _amount_cents: i64,
        _note: &str,
    ) -> Result<PaymentReceipt, AppError> {
        Err(AppError::InternalWithMsg("Payment processing is not configured".to_string()))
    }
}

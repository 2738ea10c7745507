use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

pub struct ResendEmailService {
    client: Client,
    api_key: String,
    from: String,
}

impl ResendEmailService {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from,
        }
    }
}

#[derive(Serialize)]
struct EmailPayload {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
}

#[async_trait]
impl EmailService for ResendEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        let payload = EmailPayload {
            from: self.from.clone(),
            to: vec![recipient.to_string()],
            subject: subject.to_string(),
            html: html_body.to_string(),
        };

        let res = self.client.post(RESEND_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Email service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Email service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}

/// Used when no RESEND_API_KEY is configured. Sends go nowhere but still
/// succeed, so booking flows never depend on email being set up.
pub struct DisabledEmailService;

#[async_trait]
impl EmailService for DisabledEmailService {
    async fn send(&self, recipient: &str, subject: &str, _html_body: &str) -> Result<(), AppError> {
        info!("Email disabled; skipping \"{}\" to {}", subject, recipient);
        Ok(())
    }
}

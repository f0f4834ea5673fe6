//! # Resend
//!
//! Transactional email API. One `POST /emails` per dispatch; a broadcast is a
//! single call with every address in `to`.
use reqwest::Client;
use roster::{mail::OutgoingEmail, remote::error_message};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("RESEND_API_KEY not configured")]
    NotConfigured,

    #[error("{0}")]
    Rejected(String),

    #[error("Failed to send email: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct Mailer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    default_from: String,
}

impl Mailer {
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: Option<String>,
        default_from: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_from: default_from.to_string(),
        }
    }

    pub fn default_from(&self) -> &str {
        &self.default_from
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<Value, MailerError> {
        let api_key = self.api_key.as_deref().ok_or(MailerError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MailerError::Rejected(error_message(status, &body)));
        }

        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}

use crate::adapters::upstream_json;
use crate::config::toml_config::EmailConfig;
use crate::domain::model::OutgoingEmail;
use crate::domain::ports::Mailer;
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String> {
        tracing::debug!("Sending email via Resend to {:?}", email.to);

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;
        let json = upstream_json("resend", response).await?;
        let parsed: SendEmailResponse =
            serde_json::from_value(json).map_err(BookingError::SerializationError)?;

        tracing::info!("📧 Resend accepted message {}", parsed.id);
        Ok(parsed.id)
    }
}

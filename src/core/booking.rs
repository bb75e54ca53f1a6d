use crate::core::catalog::Catalog;
use crate::core::rate_limiter::{Decision, SlidingWindowLimiter};
use crate::core::render::{confirmation_html, confirmation_subject};
use crate::core::slots::describe_instant;
use crate::domain::model::{BookingDetails, DepositRequest, OutgoingEmail, PaymentReceipt};
use crate::domain::money::Money;
use crate::domain::ports::{Mailer, PaymentGateway};
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::is_plausible_email;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Deserialize)]
pub struct DepositPayload {
    /// Card nonce from the Square Web Payments SDK
    pub source_id: String,
    pub service: String,
    pub customer_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub slot_start: Option<String>,
    pub note: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositOutcome {
    pub payment: PaymentReceipt,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_label: Option<String>,
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationPayload {
    pub customer_name: String,
    pub email: String,
    pub service: String,
    pub slot_start: Option<String>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationOutcome {
    pub id: String,
}

/// Sender identity for confirmation emails.
#[derive(Debug, Clone)]
pub struct Sender {
    pub from: String,
    pub reply_to: Option<String>,
}

struct PaymentSetup {
    gateway: Arc<dyn PaymentGateway>,
    deposit: Money,
}

struct EmailSetup {
    mailer: Arc<dyn Mailer>,
    sender: Sender,
    limiter: Arc<SlidingWindowLimiter>,
}

/// Validates booking requests and forwards them to the payment and email providers.
pub struct BookingEngine {
    catalog: Arc<Catalog>,
    site_name: String,
    timezone: Tz,
    payments: Option<PaymentSetup>,
    email: Option<EmailSetup>,
}

impl BookingEngine {
    pub fn new(catalog: Arc<Catalog>, site_name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            catalog,
            site_name: site_name.into(),
            timezone,
            payments: None,
            email: None,
        }
    }

    pub fn with_payments(mut self, gateway: Arc<dyn PaymentGateway>, deposit: Money) -> Self {
        self.payments = Some(PaymentSetup { gateway, deposit });
        self
    }

    pub fn with_mailer(
        mut self,
        mailer: Arc<dyn Mailer>,
        sender: Sender,
        limiter: Arc<SlidingWindowLimiter>,
    ) -> Self {
        self.email = Some(EmailSetup {
            mailer,
            sender,
            limiter,
        });
        self
    }

    pub fn payments_enabled(&self) -> bool {
        self.payments.is_some()
    }

    pub fn email_enabled(&self) -> bool {
        self.email.is_some()
    }

    pub fn deposit(&self) -> Option<&Money> {
        self.payments.as_ref().map(|p| &p.deposit)
    }

    pub async fn book_deposit(&self, payload: DepositPayload) -> Result<DepositOutcome> {
        let payments = self
            .payments
            .as_ref()
            .ok_or(BookingError::FeatureDisabled { feature: "payments" })?;

        if payload.source_id.trim().is_empty() {
            return Err(BookingError::validation("source_id is required"));
        }
        let details = self.booking_details(
            &payload.customer_name,
            &payload.email,
            &payload.service,
            payload.slot_start.as_deref(),
        )?;

        let idempotency_key = payload
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let request = DepositRequest {
            source_id: payload.source_id.trim().to_string(),
            idempotency_key,
            amount: payments.deposit.clone(),
            buyer_email: details.email.clone(),
            note: self.payment_note(&details, payload.phone.as_deref(), payload.note.as_deref()),
            reference_id: None,
        };

        tracing::info!(
            "🗓️ Deposit requested for {} ({})",
            details.service,
            details.slot_label.as_deref().unwrap_or("no slot")
        );
        let receipt = payments.gateway.create_deposit(&request).await?;

        let details = BookingDetails {
            deposit: Some(receipt.amount.clone()),
            payment_id: Some(receipt.payment_id.clone()),
            ..details
        };

        // 付款已成功，寄信失敗只記錄不回滾
        let (email_sent, email_id) = if self.email.is_some() {
            match self.deliver_confirmation(&details).await {
                Ok(id) => (true, Some(id)),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Payment {} succeeded but confirmation email failed: {}",
                        receipt.payment_id,
                        e
                    );
                    (false, None)
                }
            }
        } else {
            (false, None)
        };

        Ok(DepositOutcome {
            service: details.service,
            slot_label: details.slot_label,
            payment: receipt,
            email_sent,
            email_id,
        })
    }

    pub async fn send_confirmation(&self, payload: ConfirmationPayload) -> Result<ConfirmationOutcome> {
        if self.email.is_none() {
            return Err(BookingError::FeatureDisabled { feature: "email" });
        }

        let mut details = self.booking_details(
            &payload.customer_name,
            &payload.email,
            &payload.service,
            payload.slot_start.as_deref(),
        )?;
        details.payment_id = payload.payment_id.filter(|p| !p.trim().is_empty());
        details.deposit = self.deposit().cloned().filter(|_| details.payment_id.is_some());

        let id = self.deliver_confirmation(&details).await?;
        Ok(ConfirmationOutcome { id })
    }

    fn booking_details(
        &self,
        customer_name: &str,
        email: &str,
        service: &str,
        slot_start: Option<&str>,
    ) -> Result<BookingDetails> {
        let customer_name = customer_name.trim();
        if customer_name.is_empty() {
            return Err(BookingError::validation("customer_name is required"));
        }
        if customer_name.chars().count() > 120 {
            return Err(BookingError::validation("customer_name is too long"));
        }

        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(BookingError::validation(format!("Invalid email address: {}", email)));
        }

        let service = self
            .catalog
            .find(service)
            .ok_or_else(|| BookingError::validation(format!("Unknown service: {}", service.trim())))?;

        let slot_label = slot_start
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|t| describe_instant(t.with_timezone(&Utc), &self.timezone))
                    .map_err(|e| BookingError::validation(format!("Invalid slot_start {}: {}", s, e)))
            })
            .transpose()?;

        Ok(BookingDetails {
            customer_name: customer_name.to_string(),
            email: email.to_string(),
            service: service.name.clone(),
            slot_label,
            deposit: None,
            payment_id: None,
        })
    }

    fn payment_note(&self, details: &BookingDetails, phone: Option<&str>, note: Option<&str>) -> String {
        let mut parts = vec![format!(
            "{} deposit: {} for {}",
            self.site_name, details.service, details.customer_name
        )];
        if let Some(slot) = &details.slot_label {
            parts.push(format!("requested {}", slot));
        }
        if let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) {
            parts.push(format!("phone {}", phone));
        }
        if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
            parts.push(note.to_string());
        }
        parts.join(" | ")
    }

    async fn deliver_confirmation(&self, details: &BookingDetails) -> Result<String> {
        let email = self
            .email
            .as_ref()
            .ok_or(BookingError::FeatureDisabled { feature: "email" })?;

        let now = Instant::now();
        email.limiter.prune(now);
        if let Decision::Limited { retry_after } =
            email.limiter.check_at(&details.email.to_lowercase(), now)
        {
            tracing::warn!("🚦 Confirmation email to {} rate limited", details.email);
            return Err(BookingError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        let outgoing = OutgoingEmail {
            from: email.sender.from.clone(),
            to: vec![details.email.clone()],
            subject: confirmation_subject(&self.site_name),
            html: confirmation_html(&self.site_name, details),
            reply_to: email.sender.reply_to.clone(),
        };
        email.mailer.send(&outgoing).await
    }
}

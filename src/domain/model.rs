use crate::domain::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub price: String,
    pub duration: String,
    pub details: String,
    /// Square 的 service variation id，用於即時查詢可預約時段
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Injectables,
    Prp,
    Peels,
}

impl Category {
    pub fn title(&self) -> &'static str {
        match self {
            Category::Injectables => "Injectables",
            Category::Prp => "PRP",
            Category::Peels => "Peels",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// RFC 3339, UTC
    pub start_at: String,
    /// Clinic-local time, e.g. "9:30 AM"
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: String,
    pub label: String,
    pub slots: Vec<Slot>,
}

/// Offline-generated availability document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityFeed {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub days: Vec<DaySlots>,
}

#[derive(Debug, Clone)]
pub struct AvailabilityQuery {
    pub days: u32,
    pub service: Option<String>,
    pub now: DateTime<Utc>,
}

impl AvailabilityQuery {
    pub const MAX_DAYS: u32 = 60;

    pub fn new(days: u32, service: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            days: days.clamp(1, Self::MAX_DAYS),
            service,
            now,
        }
    }
}

/// What the payment gateway is asked to charge.
#[derive(Debug, Clone)]
pub struct DepositRequest {
    pub source_id: String,
    pub idempotency_key: String,
    pub amount: Money,
    pub buyer_email: String,
    pub note: String,
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Details rendered into the confirmation email.
#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub customer_name: String,
    pub email: String,
    pub service: String,
    pub slot_label: Option<String>,
    pub deposit: Option<Money>,
    pub payment_id: Option<String>,
}

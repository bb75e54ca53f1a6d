use crate::adapters::upstream_json;
use crate::config::toml_config::PaymentsConfig;
use crate::core::catalog::Catalog;
use crate::core::slots::{group_into_days, local_horizon};
use crate::domain::model::{AvailabilityQuery, DaySlots, DepositRequest, PaymentReceipt};
use crate::domain::money::Money;
use crate::domain::ports::{AvailabilitySource, PaymentGateway};
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Square only accepts availability searches spanning at most 32 days.
const MAX_SEARCH_DAYS: u32 = 31;
const MAX_NOTE_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct SquareClient {
    client: Client,
    base_url: String,
    access_token: String,
    api_version: String,
    location_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AmountMoney {
    amount: i64,
    currency: String,
}

#[derive(Debug, Serialize)]
struct CreatePaymentBody<'a> {
    source_id: &'a str,
    idempotency_key: &'a str,
    amount_money: AmountMoney,
    location_id: &'a str,
    autocomplete: bool,
    note: String,
    buyer_email_address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    payment: SquarePayment,
}

#[derive(Debug, Deserialize)]
struct SquarePayment {
    id: String,
    status: String,
    receipt_url: Option<String>,
    amount_money: Option<AmountMoney>,
}

#[derive(Debug, Deserialize)]
struct SearchAvailabilityResponse {
    #[serde(default)]
    availabilities: Vec<SquareAvailabilitySlot>,
}

#[derive(Debug, Deserialize)]
struct SquareAvailabilitySlot {
    start_at: String,
}

impl SquareClient {
    pub fn new(config: &PaymentsConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            api_version: config.api_version().to_string(),
            location_id: config.location_id.clone(),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .header("Square-Version", &self.api_version)
    }

    pub async fn search_availability(
        &self,
        service_variation_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let body = serde_json::json!({
            "query": {
                "filter": {
                    "start_at_range": {
                        "start_at": start.to_rfc3339_opts(SecondsFormat::Secs, true),
                        "end_at": end.to_rfc3339_opts(SecondsFormat::Secs, true),
                    },
                    "location_id": self.location_id,
                    "segment_filters": [
                        { "service_variation_id": service_variation_id }
                    ]
                }
            }
        });

        tracing::debug!(
            "Searching Square availability for {} between {} and {}",
            service_variation_id,
            start,
            end
        );
        let response = self
            .post("/v2/bookings/availability/search")
            .json(&body)
            .send()
            .await?;
        let json = upstream_json("square", response).await?;
        let parsed: SearchAvailabilityResponse = serde_json::from_value(json)?;

        let instants = parsed
            .availabilities
            .into_iter()
            .filter_map(|slot| match DateTime::parse_from_rfc3339(&slot.start_at) {
                Ok(t) => Some(t.with_timezone(&Utc)),
                Err(e) => {
                    tracing::warn!("Skipping unparseable Square start_at {}: {}", slot.start_at, e);
                    None
                }
            })
            .collect();

        Ok(instants)
    }
}

#[async_trait]
impl PaymentGateway for SquareClient {
    async fn create_deposit(&self, request: &DepositRequest) -> Result<PaymentReceipt> {
        let body = CreatePaymentBody {
            source_id: &request.source_id,
            idempotency_key: &request.idempotency_key,
            amount_money: AmountMoney {
                amount: request.amount.amount,
                currency: request.amount.currency.clone(),
            },
            location_id: &self.location_id,
            autocomplete: true,
            note: request.note.chars().take(MAX_NOTE_CHARS).collect(),
            buyer_email_address: &request.buyer_email,
            reference_id: request.reference_id.as_deref(),
        };

        tracing::info!(
            "💳 Creating Square payment of {} (idempotency key {})",
            request.amount,
            request.idempotency_key
        );
        let response = self.post("/v2/payments").json(&body).send().await?;
        let json = upstream_json("square", response).await?;
        let parsed: CreatePaymentResponse = serde_json::from_value(json)?;
        let payment = parsed.payment;

        let amount = payment
            .amount_money
            .map(|m| Money::new(m.amount, m.currency))
            .unwrap_or_else(|| request.amount.clone());

        tracing::info!("✅ Square payment {} is {}", payment.id, payment.status);
        Ok(PaymentReceipt {
            payment_id: payment.id,
            status: payment.status,
            receipt_url: payment.receipt_url,
            amount,
        })
    }
}

/// Live availability pulled from Square Bookings.
pub struct SquareAvailability {
    client: Arc<SquareClient>,
    catalog: Arc<Catalog>,
    default_variation_id: Option<String>,
    timezone: Tz,
}

impl SquareAvailability {
    pub fn new(
        client: Arc<SquareClient>,
        catalog: Arc<Catalog>,
        default_variation_id: Option<String>,
        timezone: Tz,
    ) -> Self {
        Self {
            client,
            catalog,
            default_variation_id,
            timezone,
        }
    }

    fn variation_for(&self, service: Option<&str>) -> Result<String> {
        let mapped = match service {
            Some(name) => {
                let service = self
                    .catalog
                    .find(name)
                    .ok_or_else(|| BookingError::validation(format!("Unknown service: {}", name)))?;
                service.variation_id.clone()
            }
            None => None,
        };

        mapped
            .or_else(|| self.default_variation_id.clone())
            .ok_or_else(|| {
                BookingError::validation(format!(
                    "No Square service variation is configured for {}",
                    service.unwrap_or("the default service")
                ))
            })
    }
}

#[async_trait]
impl AvailabilitySource for SquareAvailability {
    async fn availability(&self, query: &AvailabilityQuery) -> Result<Vec<DaySlots>> {
        let variation = self.variation_for(query.service.as_deref())?;
        let days = query.days.min(MAX_SEARCH_DAYS);
        let end = local_horizon(query.now, days, &self.timezone);

        let instants = self
            .client
            .search_availability(&variation, query.now, end)
            .await?;
        tracing::debug!("Square returned {} availability entries", instants.len());

        Ok(group_into_days(
            instants.into_iter().filter(|t| *t > query.now),
            &self.timezone,
        ))
    }
}

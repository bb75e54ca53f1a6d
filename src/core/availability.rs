use crate::core::slots::{local_horizon, parse_timezone, SlotPlan};
use crate::domain::model::{AvailabilityFeed, AvailabilityQuery, DaySlots};
use crate::domain::ports::{AvailabilitySource, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Slots computed in-process from opening hours.
pub struct StaticAvailability {
    plan: SlotPlan,
}

impl StaticAvailability {
    pub fn new(plan: SlotPlan) -> Self {
        Self { plan }
    }
}

#[async_trait]
impl AvailabilitySource for StaticAvailability {
    async fn availability(&self, query: &AvailabilityQuery) -> Result<Vec<DaySlots>> {
        let mut plan = self.plan.clone();
        plan.days_ahead = query.days.min(plan.days_ahead);
        Ok(plan.generate(query.now))
    }
}

/// Slots read from a feed produced ahead of time by `generate-availability`.
pub struct FileAvailability<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> FileAvailability<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }
}

#[async_trait]
impl<S: Storage + 'static> AvailabilitySource for FileAvailability<S> {
    async fn availability(&self, query: &AvailabilityQuery) -> Result<Vec<DaySlots>> {
        let data = self.storage.read_file(&self.file_name).await?;
        let feed: AvailabilityFeed = serde_json::from_slice(&data)?;
        tracing::debug!(
            "Loaded availability feed generated at {} ({} days)",
            feed.generated_at,
            feed.days.len()
        );

        let tz = parse_timezone(&feed.timezone)?;
        Ok(filter_feed(feed.days, query, &tz))
    }
}

/// 過濾已過去的時段，並截到查詢的當地天數範圍內
pub fn filter_feed(days: Vec<DaySlots>, query: &AvailabilityQuery, tz: &Tz) -> Vec<DaySlots> {
    let horizon = local_horizon(query.now, query.days, tz);

    days.into_iter()
        .filter_map(|mut day| {
            day.slots.retain(|slot| match DateTime::parse_from_rfc3339(&slot.start_at) {
                Ok(start) => {
                    let start = start.with_timezone(&Utc);
                    start > query.now && start < horizon
                }
                Err(_) => {
                    tracing::warn!("Dropping slot with invalid start_at: {}", slot.start_at);
                    false
                }
            });
            (!day.slots.is_empty()).then_some(day)
        })
        .collect()
}

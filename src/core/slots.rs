use crate::domain::model::{DaySlots, Slot};
use crate::utils::error::{BookingError, Result};
use chrono::{DateTime, Datelike, Days, NaiveTime, SecondsFormat, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use std::collections::BTreeSet;

/// Opening hours used to generate bookable slots.
#[derive(Debug, Clone)]
pub struct SlotPlan {
    pub timezone: Tz,
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub slot_minutes: u32,
    pub days_ahead: u32,
    pub closed_weekdays: Vec<Weekday>,
}

impl SlotPlan {
    /// Slots from the clinic's local "today" onwards, skipping anything at or before `now`.
    pub fn generate(&self, now: DateTime<Utc>) -> Vec<DaySlots> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let open = self.open.num_seconds_from_midnight() / 60;
        let close = self.close.num_seconds_from_midnight() / 60;
        let step = self.slot_minutes.max(1);

        let mut instants = Vec::new();
        for offset in 0..self.days_ahead {
            let Some(date) = today.checked_add_days(Days::new(offset.into())) else {
                break;
            };
            if self.closed_weekdays.contains(&date.weekday()) {
                continue;
            }

            let mut minute = open;
            while minute + step <= close {
                let local = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
                    .and_then(|time| {
                        // DST 缺口回傳 None，重疊時取較早的時間
                        self.timezone
                            .from_local_datetime(&date.and_time(time))
                            .earliest()
                    });

                if let Some(local) = local {
                    let instant = local.with_timezone(&Utc);
                    if instant > now {
                        instants.push(instant);
                    }
                }
                minute += step;
            }
        }

        tracing::debug!(
            "Generated {} slots over {} days ({})",
            instants.len(),
            self.days_ahead,
            self.timezone
        );
        group_into_days(instants, &self.timezone)
    }
}

/// Sorts, de-duplicates and buckets instants by local calendar day.
pub fn group_into_days(instants: impl IntoIterator<Item = DateTime<Utc>>, tz: &Tz) -> Vec<DaySlots> {
    let unique: BTreeSet<DateTime<Utc>> = instants.into_iter().collect();
    let mut days: Vec<DaySlots> = Vec::new();

    for instant in unique {
        let local = instant.with_timezone(tz);
        let date = local.format("%Y-%m-%d").to_string();
        let slot = Slot {
            start_at: instant.to_rfc3339_opts(SecondsFormat::Secs, true),
            label: local.format("%-I:%M %p").to_string(),
        };

        match days.last_mut() {
            Some(day) if day.date == date => day.slots.push(slot),
            _ => days.push(DaySlots {
                date,
                label: local.format("%a, %b %-d").to_string(),
                slots: vec![slot],
            }),
        }
    }

    days
}

/// End of a `days`-day window: local midnight after the last day, counting today as day one.
pub fn local_horizon(now: DateTime<Utc>, days: u32, tz: &Tz) -> DateTime<Utc> {
    now.with_timezone(tz)
        .date_naive()
        .checked_add_days(Days::new(days.into()))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or_else(|| now + chrono::Duration::days(days.into()))
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| BookingError::InvalidConfigValueError {
            field: "site.timezone".to_string(),
            value: name.to_string(),
            reason: e.to_string(),
        })
}

/// Human label for a slot start in the clinic timezone, e.g. "Tue, Oct 20 at 10:30 AM".
pub fn describe_instant(instant: DateTime<Utc>, tz: &Tz) -> String {
    instant
        .with_timezone(tz)
        .format("%a, %b %-d at %-I:%M %p %Z")
        .to_string()
}

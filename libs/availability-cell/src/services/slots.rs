use anyhow::Result;
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityRule, DaySlots};
use crate::services::calendar;

/// Expands a therapist's recurring rules and date overrides into the
/// bookable-slot view for the rolling 7-day window starting at `today`.
///
/// Pure function of its inputs; the service edge injects the clock.
/// Recurring rules apply first and accumulate additively; valid
/// special-date rules then replace whatever the recurring pass produced
/// for their date. A special date whose weekday does not match the
/// rule, or which lies in the past, invalidates the whole rule: it is
/// logged and skipped. Rules resolving outside the window are dropped
/// at the boundary, so the result is always exactly 7 entries.
pub fn materialize_week(rules: &[AvailabilityRule], today: NaiveDate) -> Vec<DaySlots> {
    let dates = calendar::week_dates(today);
    let mut days: Vec<DaySlots> = dates
        .iter()
        .map(|&date| DaySlots::empty(date, calendar::day_name(date)))
        .collect();

    let index_of = |date: NaiveDate| dates.iter().position(|&d| d == date);

    for rule in rules.iter().filter(|r| r.special_date.is_none()) {
        let Some(target) = calendar::next_occurrence(&rule.day_of_week, today) else {
            warn!(
                "Rule {} has unrecognized weekday {:?}, skipping",
                rule.id, rule.day_of_week
            );
            continue;
        };
        let Some(idx) = index_of(target) else {
            continue;
        };
        apply_rule(&mut days[idx], rule);
    }

    let mut overridden = [false; 7];
    for rule in rules.iter() {
        let Some(special) = rule.special_date else {
            continue;
        };
        let Some(date) = calendar::validate_special_date(special, &rule.day_of_week, today)
        else {
            warn!(
                "Rule {} special date {} is past or does not fall on a {}, skipping",
                rule.id, special, rule.day_of_week
            );
            continue;
        };
        let Some(idx) = index_of(date) else {
            debug!("Rule {} special date {} outside the 7-day window, dropped", rule.id, date);
            continue;
        };
        // The first override for a date discards the recurring slots.
        if !overridden[idx] {
            days[idx] = DaySlots::empty(date, calendar::day_name(date));
            overridden[idx] = true;
        }
        apply_rule(&mut days[idx], rule);
    }

    days
}

fn apply_rule(day: &mut DaySlots, rule: &AvailabilityRule) {
    if !rule.is_available {
        return;
    }
    let (Some(start), Some(end)) = (rule.start_time.as_deref(), rule.end_time.as_deref()) else {
        return;
    };
    let (Some(start), Some(end)) = (calendar::parse_hhmm(start), calendar::parse_hhmm(end))
    else {
        warn!(
            "Rule {} has malformed time range {:?}-{:?}, skipping",
            rule.id, rule.start_time, rule.end_time
        );
        return;
    };

    day.unavailable = false;

    let mut current = start;
    while current < end {
        if calendar::is_morning(current) {
            day.morning.push(calendar::format_hhmm(current));
        } else if calendar::is_afternoon(current) {
            day.afternoon.push(calendar::format_hhmm(current));
        }
        // Times outside both buckets are dropped.
        current += 60;
    }
}

pub struct SlotService {
    supabase: SupabaseClient,
}

impl SlotService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// The bookable-slot view for the upcoming week, computed fresh on
    /// every call. A therapist with no rules yields 7 unavailable
    /// entries, never an error.
    pub async fn week_availability(
        &self,
        therapist_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<DaySlots>> {
        debug!("Computing week availability for therapist {}", therapist_id);

        let path = format!(
            "/rest/v1/availability_rules?therapist_id=eq.{}",
            therapist_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        let rules: Vec<AvailabilityRule> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<AvailabilityRule>, _>>()?;

        let days = materialize_week(&rules, Utc::now().date_naive());
        debug!(
            "Materialized {} day entries from {} rules",
            days.len(),
            rules.len()
        );
        Ok(days)
    }
}

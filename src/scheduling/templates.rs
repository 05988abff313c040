//! Weekly recurring templates and their expansion into concrete events.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SchedulingConfig;
use crate::error::{Result, SchedulingError};
use crate::scheduling::closures::ClosureCalendar;
use crate::scheduling::conflicts::CapacityChecker;
use crate::scheduling::datetime::{local_instant, parse_hhmm};
use crate::scheduling::events::{CreateEventParams, EventFactory};
use crate::scheduling::types::{Event, EventType, RecurringTemplate};
use crate::store::BookingStore;

/// Parameters for creating a recurring template.
#[derive(Debug, Clone)]
pub struct CreateTemplateParams {
    pub name: String,
    /// Session start time at the venue ("HH:MM").
    pub start_time: String,
    /// Session end time at the venue ("HH:MM").
    pub end_time: String,
    /// Weekdays the session runs on (0 = Monday .. 6 = Sunday).
    pub days_of_week: Vec<u8>,
    pub start_date: NaiveDate,
    /// Inclusive end of the validity window; a fixed horizon applies when absent.
    pub end_date: Option<NaiveDate>,
    pub max_capacity: u32,
    pub location_id: String,
}

/// Why a candidate day was not materialized into an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// The business is closed that day.
    Closure { name: String },
    /// Overlapping events already commit the location's capacity.
    CapacityConflict { committed: u32, limit: u32 },
}

/// A candidate day that was skipped during expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SkippedDay {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

/// Full result of expanding a template: the events created, in ascending
/// date order, plus every candidate day that was skipped and why.
///
/// Skips are normal business outcome (partial schedules), not errors, but
/// they are always surfaced so callers can detect degradation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExpansionOutcome {
    pub events: Vec<Event>,
    pub skipped: Vec<SkippedDay>,
}

/// Materializes every concrete event implied by a recurring template within
/// its validity window.
pub struct TemplateExpander<S: BookingStore, C: ClosureCalendar> {
    store: Arc<S>,
    closures: Arc<C>,
    config: SchedulingConfig,
}

impl<S: BookingStore, C: ClosureCalendar> TemplateExpander<S, C> {
    /// Create a new expander.
    pub fn new(store: Arc<S>, closures: Arc<C>, config: SchedulingConfig) -> Self {
        Self {
            store,
            closures,
            config,
        }
    }

    /// Validate and persist a recurring template.
    pub async fn create_recurring_template(
        &self,
        params: CreateTemplateParams,
    ) -> Result<RecurringTemplate> {
        if params.days_of_week.is_empty() {
            return Err(
                SchedulingError::InvalidTemplate("days_of_week must not be empty".into()).into(),
            );
        }
        if let Some(&bad) = params.days_of_week.iter().find(|&&d| d > 6) {
            return Err(SchedulingError::InvalidTemplate(format!(
                "day of week out of range (0 = Monday .. 6 = Sunday): {}",
                bad
            ))
            .into());
        }
        if let Some(end_date) = params.end_date {
            if end_date < params.start_date {
                return Err(SchedulingError::InvalidTemplate(format!(
                    "end date {} is before start date {}",
                    end_date, params.start_date
                ))
                .into());
            }
        }
        let start = parse_hhmm(&params.start_time)?;
        let end = parse_hhmm(&params.end_time)?;
        if end <= start {
            return Err(SchedulingError::InvalidTemplate(format!(
                "session window must be ordered: {} .. {}",
                params.start_time, params.end_time
            ))
            .into());
        }

        let template = RecurringTemplate {
            id: uuid::Uuid::new_v4().to_string(),
            name: params.name,
            start_time: params.start_time,
            end_time: params.end_time,
            days_of_week: params.days_of_week,
            start_date: params.start_date,
            end_date: params.end_date,
            max_capacity: params.max_capacity,
            location_id: params.location_id,
            active: true,
            created_at: Utc::now(),
        };

        let template = self.store.create_template(template).await?;
        debug!("Created recurring template {} ({})", template.name, template.id);
        Ok(template)
    }

    /// Load a template, failing when it does not exist.
    pub async fn require_template(&self, template_id: &str) -> Result<RecurringTemplate> {
        self.store
            .get_template(template_id)
            .await?
            .ok_or_else(|| SchedulingError::TemplateNotFound(template_id.to_string()).into())
    }

    /// Generate every event implied by a template.
    ///
    /// Returns an empty list when the template is missing or inactive.
    pub async fn generate_recurring_events(&self, template_id: &str) -> Result<Vec<Event>> {
        let Some(template) = self.store.get_template(template_id).await? else {
            debug!("Template {} not found, nothing to generate", template_id);
            return Ok(Vec::new());
        };
        if !template.active {
            debug!("Template {} is inactive, nothing to generate", template_id);
            return Ok(Vec::new());
        }
        Ok(self.expand(&template).await?.events)
    }

    /// Expand a template into events, reporting skipped days.
    pub async fn expand(&self, template: &RecurringTemplate) -> Result<ExpansionOutcome> {
        let location = self
            .store
            .get_location(&template.location_id)
            .await?
            .ok_or_else(|| SchedulingError::MissingLocation(template.location_id.clone()))?;

        let factory = EventFactory::new(
            self.store.clone(),
            self.closures.clone(),
            self.config.clone(),
        );
        let checker = CapacityChecker::new(
            self.store.clone(),
            self.config.default_location_capacity,
        );

        // An explicit end date is inclusive; the default horizon is not.
        let horizon = match template.end_date {
            Some(end_date) => end_date + Duration::days(1),
            None => {
                template.start_date
                    + Duration::weeks(i64::from(self.config.default_horizon_weeks))
            }
        };

        let mut outcome = ExpansionOutcome::default();
        let mut day = template.start_date;

        while day < horizon {
            let weekday = day.weekday().num_days_from_monday() as u8;
            if !template.days_of_week.contains(&weekday) {
                day += Duration::days(1);
                continue;
            }

            if let Some(info) = self.closures.closure_info(day) {
                debug!("Skipping {} ({}) for template {}", day, info.name, template.id);
                outcome.skipped.push(SkippedDay {
                    date: day,
                    reason: SkipReason::Closure { name: info.name },
                });
                day += Duration::days(1);
                continue;
            }

            let start = local_instant(day, &template.start_time, &location.timezone)?;
            let end = local_instant(day, &template.end_time, &location.timezone)?;

            let decision = checker.check_window(&template.location_id, start, end).await?;
            if decision.is_conflict() {
                debug!(
                    "Skipping {} for template {}: committed {} of {}",
                    day, template.id, decision.committed, decision.limit
                );
                outcome.skipped.push(SkippedDay {
                    date: day,
                    reason: SkipReason::CapacityConflict {
                        committed: decision.committed,
                        limit: decision.limit,
                    },
                });
                day += Duration::days(1);
                continue;
            }

            let event = factory
                .create_event(
                    CreateEventParams::new(
                        &template.name,
                        EventType::RecurringSession,
                        day,
                        &template.start_time,
                        &template.end_time,
                        &template.location_id,
                    )
                    .with_capacity(template.max_capacity)
                    .from_template(&template.id),
                )
                .await?;
            outcome.events.push(event);

            day += Duration::days(1);
        }

        debug!(
            "Expanded template {} into {} events ({} skipped)",
            template.id,
            outcome.events.len(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }
}

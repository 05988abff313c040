//! Event creation with business-rule enforcement.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use tracing::debug;

use crate::config::SchedulingConfig;
use crate::error::{Result, SchedulingError};
use crate::scheduling::closures::ClosureCalendar;
use crate::scheduling::datetime::local_instant;
use crate::scheduling::types::{Event, EventStatus, EventType};
use crate::store::BookingStore;

/// Parameters for creating a single event.
#[derive(Debug, Clone)]
pub struct CreateEventParams {
    pub title: String,
    pub event_type: EventType,
    /// Calendar date of the event at the venue.
    pub date: NaiveDate,
    /// Start time at the venue ("HH:MM").
    pub start_time: String,
    /// End time at the venue ("HH:MM").
    pub end_time: String,
    pub location_id: String,
    /// Explicit capacity; a type-specific default applies when absent.
    pub max_capacity: Option<u32>,
    pub min_age: Option<u8>,
    pub max_age: Option<u8>,
    /// Back-reference for events generated from a recurring template.
    pub template_id: Option<String>,
    pub description: Option<String>,
}

impl CreateEventParams {
    /// Create params for an event on a date with a venue-local time window.
    pub fn new(
        title: impl Into<String>,
        event_type: EventType,
        date: NaiveDate,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        location_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            event_type,
            date,
            start_time: start_time.into(),
            end_time: end_time.into(),
            location_id: location_id.into(),
            max_capacity: None,
            min_age: None,
            max_age: None,
            template_id: None,
            description: None,
        }
    }

    /// Set an explicit capacity.
    pub fn with_capacity(mut self, max_capacity: u32) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Set the age bounds.
    pub fn with_ages(mut self, min_age: u8, max_age: u8) -> Self {
        self.min_age = Some(min_age);
        self.max_age = Some(max_age);
        self
    }

    /// Link to the recurring template that generated this event.
    pub fn from_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Creates single persisted events, enforcing the non-closure-date and
/// camp-weekday invariants before anything is written.
///
/// Capacity conflicts are deliberately not checked here; that is the caller's
/// responsibility.
pub struct EventFactory<S: BookingStore, C: ClosureCalendar> {
    store: Arc<S>,
    closures: Arc<C>,
    config: SchedulingConfig,
}

impl<S: BookingStore, C: ClosureCalendar> EventFactory<S, C> {
    /// Create a new factory.
    pub fn new(store: Arc<S>, closures: Arc<C>, config: SchedulingConfig) -> Self {
        Self {
            store,
            closures,
            config,
        }
    }

    /// Create and persist one event.
    pub async fn create_event(&self, params: CreateEventParams) -> Result<Event> {
        let location = self
            .store
            .get_location(&params.location_id)
            .await?
            .ok_or_else(|| SchedulingError::MissingLocation(params.location_id.clone()))?;

        if self.closures.is_closure_date(params.date) {
            let name = self
                .closures
                .closure_info(params.date)
                .map(|info| info.name)
                .unwrap_or_else(|| "business closure".to_string());
            return Err(SchedulingError::ClosureViolation {
                date: params.date,
                name,
            }
            .into());
        }

        if params.event_type == EventType::Camp && is_weekend(params.date) {
            return Err(SchedulingError::WeekendViolation { date: params.date }.into());
        }

        let start = local_instant(params.date, &params.start_time, &location.timezone)?;
        let end = local_instant(params.date, &params.end_time, &location.timezone)?;
        if end <= start {
            return Err(SchedulingError::InvalidTime(format!(
                "event window must be ordered: {} .. {}",
                params.start_time, params.end_time
            ))
            .into());
        }

        let max_capacity = params
            .max_capacity
            .unwrap_or_else(|| self.default_capacity(params.event_type));

        let now = Utc::now();
        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            title: params.title,
            description: params.description,
            event_type: params.event_type,
            start,
            end,
            location_id: location.id.clone(),
            max_capacity,
            current_count: 0,
            template_id: params.template_id,
            min_age: params.min_age,
            max_age: params.max_age,
            status: EventStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };

        let event = self.store.create_event(event).await?;
        debug!(
            "Created {} event {} at {} ({} - {})",
            event.event_type.display_name(),
            event.id,
            location.name,
            event.start,
            event.end
        );
        Ok(event)
    }

    fn default_capacity(&self, event_type: EventType) -> u32 {
        match event_type {
            EventType::Camp => self.config.camp_capacity,
            EventType::Birthday => self.config.birthday_capacity,
            EventType::RecurringSession => self.config.default_event_capacity,
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

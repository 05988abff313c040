//! Linking bookings to the events that fulfill them.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::debug;

use crate::error::{Result, SchedulingError};
use crate::scheduling::datetime::local_instant;
use crate::scheduling::types::{Booking, BookingStatus, Event};
use crate::store::BookingStore;

/// Parameters identifying the purchase a booking link fulfils.
#[derive(Debug, Clone)]
pub struct LinkBookingParams {
    pub student_id: String,
    pub product_id: String,
    /// The requested booking date, used to find the proactive booking the
    /// checkout flow created.
    pub booking_date: NaiveDate,
    pub price_cents: i64,
    pub notes: Option<String>,
}

/// Associates a just-created event with the booking it fulfils and keeps the
/// event's occupancy counter accurate.
///
/// Linking is not idempotent: every call increments the event's counter.
/// Callers must guarantee at-most-once invocation per (order item, event).
pub struct BookingLinker<S: BookingStore> {
    store: Arc<S>,
}

impl<S: BookingStore> BookingLinker<S> {
    /// Create a new linker.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Attach a booking to the event, creating the booking if the proactive
    /// one from checkout is absent, then increment the event's occupancy.
    pub async fn link(&self, event: &Event, params: LinkBookingParams) -> Result<Booking> {
        let location = self
            .store
            .get_location(&event.location_id)
            .await?
            .ok_or_else(|| SchedulingError::MissingLocation(event.location_id.clone()))?;

        // Match the proactive booking on the venue-local calendar day.
        let day_start = local_instant(params.booking_date, "00:00", &location.timezone)?;
        let day_end = local_instant(
            params.booking_date + Duration::days(1),
            "00:00",
            &location.timezone,
        )?;

        let existing = self
            .store
            .find_unlinked_booking(&params.student_id, &params.product_id, day_start, day_end)
            .await?;

        let booking = match existing {
            Some(booking) => {
                debug!("Linking existing booking {} to event {}", booking.id, event.id);
                self.store.link_booking_event(&booking.id, &event.id).await?
            }
            None => {
                // Fallback path; checkout normally creates the booking first.
                let now = Utc::now();
                let booking = Booking {
                    id: uuid::Uuid::new_v4().to_string(),
                    student_id: params.student_id,
                    product_id: params.product_id,
                    location_id: event.location_id.clone(),
                    event_id: Some(event.id.clone()),
                    start: event.start,
                    end: event.end,
                    status: BookingStatus::Confirmed,
                    price_cents: params.price_cents,
                    notes: params.notes,
                    created_at: now,
                    updated_at: now,
                };
                debug!("No proactive booking found, created {} for event {}", booking.id, event.id);
                self.store.create_booking(booking).await?
            }
        };

        self.store.increment_event_count(&event.id).await?;
        Ok(booking)
    }
}

//! Aggregate capacity conflict checking for proposed event windows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::store::BookingStore;

/// Outcome of a capacity check for a proposed `[start, end)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityDecision {
    /// Sum of declared capacities of intersecting, non-cancelled events.
    pub committed: u32,
    /// The location's configured maximum concurrent capacity.
    pub limit: u32,
}

impl CapacityDecision {
    /// Whether creating another event in this window would conflict.
    pub fn is_conflict(&self) -> bool {
        self.committed >= self.limit
    }
}

/// Decides whether a proposed time window at a location would push aggregate
/// concurrent capacity past the location's physical limit.
///
/// The check sums *declared* capacity of overlapping events, not actual
/// occupancy, so it is conservative: it can reject a window even when the
/// existing sessions are under-subscribed.
pub struct CapacityChecker<S: BookingStore> {
    store: Arc<S>,
    /// Capacity assumed when the location record cannot be found.
    default_capacity: u32,
}

impl<S: BookingStore> CapacityChecker<S> {
    /// Create a new checker over the given store.
    pub fn new(store: Arc<S>, default_capacity: u32) -> Self {
        Self {
            store,
            default_capacity,
        }
    }

    /// Check a proposed `[start, end)` window at a location.
    pub async fn check_window(
        &self,
        location_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CapacityDecision> {
        let limit = match self.store.get_location(location_id).await? {
            Some(location) => location.max_capacity,
            None => {
                debug!(
                    "Location {} not found, assuming capacity {}",
                    location_id, self.default_capacity
                );
                self.default_capacity
            }
        };

        let overlapping = self
            .store
            .find_overlapping_events(location_id, start, end)
            .await?;

        let committed: u32 = overlapping.iter().map(|e| e.max_capacity).sum();

        Ok(CapacityDecision { committed, limit })
    }
}

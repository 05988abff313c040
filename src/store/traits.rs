//! Storage trait for the scheduling engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::scheduling::types::{
    Booking, Event, Location, MaterializationRecord, Order, Product, RecurringTemplate, Student,
};

/// Trait for booking-platform storage backends.
///
/// Orders, products, students and locations are collaborator state the engine
/// reads (and that tests seed); events, bookings, templates and
/// materialization records are the state the engine writes.
#[async_trait]
pub trait BookingStore: Send + Sync {
    // ========================================================================
    // Collaborator State
    // ========================================================================

    /// Insert or replace a product.
    async fn put_product(&self, product: Product) -> Result<Product>;

    /// Get a product by ID.
    async fn get_product(&self, id: &str) -> Result<Option<Product>>;

    /// Insert or replace a student.
    async fn put_student(&self, student: Student) -> Result<Student>;

    /// Get a student by ID.
    async fn get_student(&self, id: &str) -> Result<Option<Student>>;

    /// Insert or replace a location.
    async fn put_location(&self, location: Location) -> Result<Location>;

    /// Get a location by ID.
    async fn get_location(&self, id: &str) -> Result<Option<Location>>;

    /// Insert or replace an order (with its owned items).
    async fn put_order(&self, order: Order) -> Result<Order>;

    /// Get an order by ID.
    async fn get_order(&self, id: &str) -> Result<Option<Order>>;

    // ========================================================================
    // Events
    // ========================================================================

    /// Persist a new event.
    async fn create_event(&self, event: Event) -> Result<Event>;

    /// Get an event by ID.
    async fn get_event(&self, id: &str) -> Result<Option<Event>>;

    /// All non-cancelled events at a location whose windows intersect
    /// `[start, end)`, sorted by start time.
    async fn find_overlapping_events(
        &self,
        location_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    /// Increment an event's occupancy counter by one, returning the new
    /// count. The read-modify-write happens atomically inside the store.
    async fn increment_event_count(&self, event_id: &str) -> Result<u32>;

    /// Mark an event cancelled. Events are never deleted.
    async fn cancel_event(&self, event_id: &str) -> Result<Event>;

    // ========================================================================
    // Bookings
    // ========================================================================

    /// Persist a new booking.
    async fn create_booking(&self, booking: Booking) -> Result<Booking>;

    /// Get a booking by ID.
    async fn get_booking(&self, id: &str) -> Result<Option<Booking>>;

    /// Find a booking for (student, product) with no event reference whose
    /// start falls within `[start_from, start_to)`.
    async fn find_unlinked_booking(
        &self,
        student_id: &str,
        product_id: &str,
        start_from: DateTime<Utc>,
        start_to: DateTime<Utc>,
    ) -> Result<Option<Booking>>;

    /// Attach an event to a booking and mark it confirmed.
    async fn link_booking_event(&self, booking_id: &str, event_id: &str) -> Result<Booking>;

    // ========================================================================
    // Recurring Templates
    // ========================================================================

    /// Persist a new recurring template.
    async fn create_template(&self, template: RecurringTemplate) -> Result<RecurringTemplate>;

    /// Get a recurring template by ID.
    async fn get_template(&self, id: &str) -> Result<Option<RecurringTemplate>>;

    // ========================================================================
    // Materialization Records
    // ========================================================================

    /// Get the materialization record for an order, if one exists.
    async fn get_materialization(&self, order_id: &str) -> Result<Option<MaterializationRecord>>;

    /// Atomically claim an order for materialization.
    ///
    /// Inserts `claim` when no record exists (returning `None`) or when the
    /// existing record is settled (replacing it and returning it). Fails with
    /// `InvalidOperation` while another run's unsettled claim is in place.
    async fn claim_materialization(
        &self,
        claim: MaterializationRecord,
    ) -> Result<Option<MaterializationRecord>>;

    /// Record a materialization, settling any claim held on the order.
    async fn put_materialization(&self, record: MaterializationRecord) -> Result<()>;
}

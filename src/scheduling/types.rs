//! Domain types for the scheduling and order-materialization engine.
//!
//! This module defines the commercial side of the model (orders, products,
//! students) and the calendar side (locations, recurring templates, events,
//! bookings) that order materialization bridges.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Commercial Types
// ============================================================================

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

/// A commercial transaction, created at checkout and marked paid by the
/// payment collaborator. Owns its line items.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Order {
    /// Unique identifier for the order.
    pub id: String,
    /// Customer contact name.
    pub customer_name: String,
    /// Customer contact email.
    pub customer_email: String,
    /// Payment status.
    pub status: PaymentStatus,
    /// Venue the order is fulfilled at. Required before materialization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    /// Purchased line items.
    pub items: Vec<OrderItem>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending order.
    pub fn new(customer_name: impl Into<String>, customer_email: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            status: PaymentStatus::Pending,
            location_id: None,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the fulfilment location.
    pub fn at_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    /// Add a line item.
    pub fn with_item(mut self, item: OrderItem) -> Self {
        self.items.push(item);
        self
    }

    /// Mark the order as paid.
    pub fn paid(mut self) -> Self {
        self.status = PaymentStatus::Paid;
        self
    }
}

/// One purchased unit within an order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrderItem {
    /// Unique identifier for the item.
    pub id: String,
    /// Purchased product.
    pub product_id: String,
    /// Enrolled student.
    pub student_id: String,
    /// Requested booking date (a calendar date, not a full instant).
    pub booking_date: NaiveDate,
    /// Requested start time ("HH:MM"), used by birthday bookings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_time: Option<String>,
    /// Price paid, in cents.
    pub price_cents: i64,
}

impl OrderItem {
    /// Create a new order item.
    pub fn new(
        product_id: impl Into<String>,
        student_id: impl Into<String>,
        booking_date: NaiveDate,
        price_cents: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            student_id: student_id.into(),
            booking_date,
            booking_time: None,
            price_cents,
        }
    }

    /// Set the requested start time.
    pub fn at_time(mut self, hhmm: impl Into<String>) -> Self {
        self.booking_time = Some(hhmm.into());
        self
    }
}

/// Catalog category of a product. Dispatch during materialization is an
/// exhaustive match over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Camp,
    Birthday,
    Subscription,
}

impl ProductCategory {
    /// Get a human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProductCategory::Camp => "Camp",
            ProductCategory::Birthday => "Birthday Party",
            ProductCategory::Subscription => "Subscription",
        }
    }
}

/// A catalog entry. Read-only from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    /// Unique identifier for the product.
    pub id: String,
    /// Product display name.
    pub name: String,
    /// Catalog category.
    pub category: ProductCategory,
    /// Duration in minutes for camps and birthdays; month count for subscriptions.
    pub duration: u32,
    /// Minimum age, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u8>,
    /// Maximum age, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u8>,
}

impl Product {
    /// Create a new product.
    pub fn new(name: impl Into<String>, category: ProductCategory, duration: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            category,
            duration,
            min_age: None,
            max_age: None,
        }
    }

    /// Set the age bounds.
    pub fn with_ages(mut self, min_age: u8, max_age: u8) -> Self {
        self.min_age = Some(min_age);
        self.max_age = Some(max_age);
        self
    }
}

/// A child enrolled with the business.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Student {
    /// Unique identifier for the student.
    pub id: String,
    /// Student name.
    pub name: String,
    /// Allergy/medical notes, used only to annotate event descriptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,
}

impl Student {
    /// Create a new student.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            medical_notes: None,
        }
    }

    /// Set the medical notes.
    pub fn with_medical_notes(mut self, notes: impl Into<String>) -> Self {
        self.medical_notes = Some(notes.into());
        self
    }
}

// ============================================================================
// Calendar Types
// ============================================================================

/// A physical venue.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    /// Unique identifier for the location.
    pub id: String,
    /// Venue name.
    pub name: String,
    /// IANA timezone identifier (e.g. "Australia/Sydney").
    pub timezone: String,
    /// Maximum concurrent capacity across overlapping events.
    pub max_capacity: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(name: impl Into<String>, timezone: impl Into<String>, max_capacity: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            timezone: timezone.into(),
            max_capacity,
        }
    }
}

/// A weekly recurrence rule used to generate many concrete events.
///
/// Days of week use chrono's `num_days_from_monday` convention:
/// 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecurringTemplate {
    /// Unique identifier for the template.
    pub id: String,
    /// Template name, reused as the title of generated events.
    pub name: String,
    /// Session start time ("HH:MM").
    pub start_time: String,
    /// Session end time ("HH:MM").
    pub end_time: String,
    /// Weekdays the session runs on (0 = Monday .. 6 = Sunday).
    pub days_of_week: Vec<u8>,
    /// First date of the validity window.
    pub start_date: NaiveDate,
    /// Last date of the validity window, inclusive. Defaults to a fixed
    /// horizon from the start when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Max capacity of each generated event.
    pub max_capacity: u32,
    /// Owning location.
    pub location_id: String,
    /// Inactive templates expand to nothing.
    pub active: bool,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
}

/// Type of a concrete calendar event. Mirrors the product category, plus the
/// synthetic type for sessions generated from a recurring template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Camp,
    Birthday,
    RecurringSession,
}

impl EventType {
    /// Get a human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            EventType::Camp => "Camp",
            EventType::Birthday => "Birthday Party",
            EventType::RecurringSession => "Recurring Session",
        }
    }
}

/// Lifecycle status of an event. Events are never deleted, only cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Cancelled,
}

/// One concrete calendar occurrence at a location.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    /// Unique identifier for the event.
    pub id: String,
    /// Event title.
    pub title: String,
    /// Event description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Type of event.
    pub event_type: EventType,
    /// Start instant (UTC).
    pub start: DateTime<Utc>,
    /// End instant (UTC).
    pub end: DateTime<Utc>,
    /// Venue the event takes place at.
    pub location_id: String,
    /// Maximum number of attendees.
    pub max_capacity: u32,
    /// Running occupancy counter, incremented by the booking linker.
    pub current_count: u32,
    /// Back-reference to the recurring template that generated this event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// Minimum age, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u8>,
    /// Maximum age, inclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u8>,
    /// Lifecycle status.
    pub status: EventStatus,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    /// When the event was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Check if this event's window overlaps `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    /// Check whether the event still counts toward capacity.
    pub fn is_active(&self) -> bool {
        self.status != EventStatus::Cancelled
    }

    /// Remaining seats, saturating at zero if the counter overshot.
    pub fn remaining_capacity(&self) -> u32 {
        self.max_capacity.saturating_sub(self.current_count)
    }
}

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

/// The link between a purchased student/product unit and the event that
/// fulfills it. Holds a weak reference to the event: a booking may exist
/// before the event it will attach to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Booking {
    /// Unique identifier for the booking.
    pub id: String,
    /// Enrolled student.
    pub student_id: String,
    /// Purchased product.
    pub product_id: String,
    /// Venue.
    pub location_id: String,
    /// The event fulfilling this booking, once linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Start instant (UTC).
    pub start: DateTime<Utc>,
    /// End instant (UTC).
    pub end: DateTime<Utc>,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Price paid, in cents.
    pub price_cents: i64,
    /// Free-form notes (student medical notes, closure remarks).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last updated.
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Materialization Records
// ============================================================================

/// Record of an order materialization, keyed by order id.
///
/// The items hash makes webhook re-delivery safe: a repeat run with the same
/// content replays the events already created and reprocesses only items that
/// are not yet fulfilled. An unsettled record marks a run in flight and blocks
/// concurrent invocations for the same order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MaterializationRecord {
    /// The materialized order.
    pub order_id: String,
    /// SHA-256 hex digest over the order's canonical item list.
    pub items_hash: String,
    /// Ids of the events created so far.
    pub event_ids: Vec<String>,
    /// Line items fulfilled so far; a retry reprocesses only the rest.
    pub completed_item_ids: Vec<String>,
    /// False while a run holds the claim on this order.
    pub settled: bool,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

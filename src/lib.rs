//! Wallaby: booking-platform scheduling engine
//!
//! The recurring-event scheduling and order-to-calendar materialization core
//! of a children's activity business (camps, birthday parties, weekly
//! after-school subscriptions). Given a paid order, it generates the correct
//! set of calendar events, honors business closures and weekday-only rules,
//! guards location capacity across overlapping windows, and links each event
//! back to a booking.

pub mod config;
pub mod error;
pub mod scheduling;
pub mod store;

pub use config::{Config, SchedulingConfig, StorageConfig};
pub use error::{ConfigError, Result, SchedulingError, StorageError, WallabyError};
pub use scheduling::{
    Booking, BookingLinker, BookingStatus, CapacityChecker, CapacityDecision, ClosureCalendar,
    ClosureInfo, CreateEventParams, CreateTemplateParams, Event, EventFactory, EventStatus,
    EventType, ExpansionOutcome, ItemFailure, LinkBookingParams, Location, MaterializationRecord,
    MaterializedOrder, Order, OrderItem, OrderMaterializer, PaymentStatus, Product,
    ProductCategory, RecurringTemplate, SkipReason, SkippedDay, StaticClosureCalendar, Student,
    TemplateExpander,
};
pub use store::{BookingStore, EmbeddedBookingStore};

//! Scheduling and order-materialization engine.
//!
//! This module turns paid commercial orders into concrete calendar state:
//!
//! - **Domain types**: orders, products, students, locations, recurring
//!   templates, events and bookings
//! - **DateTime Builder**: venue-local wall-clock times resolved to instants
//! - **Closure Calendar**: business-closure collaborator contract
//! - **Capacity Conflict Checker**: aggregate declared-capacity guard per
//!   location and time window
//! - **Event Factory**: single-event creation enforcing closure and
//!   camp-weekday invariants
//! - **Template Expander**: weekly recurrence rules expanded into sessions
//! - **Booking Linker**: attaches bookings to events and tracks occupancy
//! - **Order Materializer**: per-category orchestration over one paid order
//!
//! Control flow: the materializer dispatches each line item to the event
//! factory or template expander, both of which consult the closure calendar,
//! the datetime builder and (via the expander) the conflict checker, then the
//! booking linker records fulfilment.

pub mod bookings;
pub mod closures;
pub mod conflicts;
pub mod datetime;
pub mod events;
pub mod orders;
pub mod templates;
pub mod types;

pub use bookings::{BookingLinker, LinkBookingParams};
pub use closures::{ClosureCalendar, ClosureInfo, StaticClosureCalendar};
pub use conflicts::{CapacityChecker, CapacityDecision};
pub use events::{CreateEventParams, EventFactory};
pub use orders::{ItemFailure, MaterializedOrder, OrderMaterializer};
pub use templates::{
    CreateTemplateParams, ExpansionOutcome, SkipReason, SkippedDay, TemplateExpander,
};
pub use types::{
    Booking, BookingStatus, Event, EventStatus, EventType, Location, MaterializationRecord, Order,
    OrderItem, PaymentStatus, Product, ProductCategory, RecurringTemplate, Student,
};

//! Persistence layer for the scheduling engine.
//!
//! [`BookingStore`] is the storage contract the engine runs against; the
//! [`EmbeddedBookingStore`] keeps everything in memory behind a single lock
//! with optional JSON-file persistence.

mod embedded;
mod traits;

pub use embedded::EmbeddedBookingStore;
pub use traits::BookingStore;

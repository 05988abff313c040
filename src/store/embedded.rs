//! In-memory booking store with optional JSON persistence.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, RwLock};

use crate::error::{Result, StorageError, WallabyError};
use crate::scheduling::types::{
    Booking, BookingStatus, Event, EventStatus, Location, MaterializationRecord, Order, Product,
    RecurringTemplate, Student,
};
use crate::store::BookingStore;

// ============================================================================
// Internal Data Structure
// ============================================================================

/// Internal data storage structure.
#[derive(Debug, Default)]
struct StoreData {
    orders: HashMap<String, Order>,
    products: HashMap<String, Product>,
    students: HashMap<String, Student>,
    locations: HashMap<String, Location>,
    events: HashMap<String, Event>,
    bookings: HashMap<String, Booking>,
    templates: HashMap<String, RecurringTemplate>,
    /// Keyed by order id.
    materializations: HashMap<String, MaterializationRecord>,
    /// Index: location_id -> event IDs.
    events_by_location: HashMap<String, Vec<String>>,
}

impl StoreData {
    fn index_event_location(&mut self, event_id: &str, location_id: &str) {
        self.events_by_location
            .entry(location_id.to_string())
            .or_default()
            .push(event_id.to_string());
    }
}

/// Serialized snapshot format.
#[derive(Debug, Serialize, Deserialize)]
struct PersistenceData {
    version: u32,
    orders: Vec<Order>,
    products: Vec<Product>,
    students: Vec<Student>,
    locations: Vec<Location>,
    events: Vec<Event>,
    bookings: Vec<Booking>,
    templates: Vec<RecurringTemplate>,
    materializations: Vec<MaterializationRecord>,
}

// ============================================================================
// Embedded Implementation
// ============================================================================

/// In-memory booking store with optional persistence.
///
/// All data lives in HashMaps behind a single RwLock so occupancy updates are
/// one atomic read-modify-write, with optional JSON snapshot persistence.
pub struct EmbeddedBookingStore {
    data: RwLock<StoreData>,
    persistence_path: Option<std::path::PathBuf>,
    persist_lock: AsyncMutex<()>,
}

impl EmbeddedBookingStore {
    /// Create a new in-memory store without persistence.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(StoreData::default()),
            persistence_path: None,
            persist_lock: AsyncMutex::new(()),
        }
    }

    /// Create a store with file persistence.
    pub async fn with_persistence(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).map_err(StorageError::Io)?;

        let persistence_path = data_dir.join("bookings.json");
        let store = Self {
            data: RwLock::new(StoreData::default()),
            persistence_path: Some(persistence_path.clone()),
            persist_lock: AsyncMutex::new(()),
        };

        if persistence_path.exists() {
            store.load_from_file(&persistence_path).await?;
        }

        Ok(store)
    }

    /// Load data from a JSON snapshot.
    async fn load_from_file(&self, path: &Path) -> Result<()> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(WallabyError::Io)?;

        let persisted: PersistenceData =
            serde_json::from_str(&content).map_err(WallabyError::Serialization)?;

        let mut data = self.data.write().await;

        for order in persisted.orders {
            data.orders.insert(order.id.clone(), order);
        }
        for product in persisted.products {
            data.products.insert(product.id.clone(), product);
        }
        for student in persisted.students {
            data.students.insert(student.id.clone(), student);
        }
        for location in persisted.locations {
            data.locations.insert(location.id.clone(), location);
        }
        for event in persisted.events {
            data.index_event_location(&event.id, &event.location_id);
            data.events.insert(event.id.clone(), event);
        }
        for booking in persisted.bookings {
            data.bookings.insert(booking.id.clone(), booking);
        }
        for template in persisted.templates {
            data.templates.insert(template.id.clone(), template);
        }
        for record in persisted.materializations {
            data.materializations.insert(record.order_id.clone(), record);
        }

        tracing::info!(
            "Loaded {} events and {} bookings from {}",
            data.events.len(),
            data.bookings.len(),
            path.display()
        );

        Ok(())
    }

    /// Persist data to file if persistence is enabled.
    async fn persist(&self) -> Result<()> {
        let Some(ref path) = self.persistence_path else {
            return Ok(());
        };

        let _lock = self.persist_lock.lock().await;

        let data = self.data.read().await;
        let persisted = PersistenceData {
            version: 1,
            orders: data.orders.values().cloned().collect(),
            products: data.products.values().cloned().collect(),
            students: data.students.values().cloned().collect(),
            locations: data.locations.values().cloned().collect(),
            events: data.events.values().cloned().collect(),
            bookings: data.bookings.values().cloned().collect(),
            templates: data.templates.values().cloned().collect(),
            materializations: data.materializations.values().cloned().collect(),
        };
        drop(data);

        let content =
            serde_json::to_string_pretty(&persisted).map_err(WallabyError::Serialization)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content)
            .await
            .map_err(WallabyError::Io)?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(WallabyError::Io)?;

        Ok(())
    }
}

impl Default for EmbeddedBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingStore for EmbeddedBookingStore {
    // ========================================================================
    // Collaborator State
    // ========================================================================

    async fn put_product(&self, product: Product) -> Result<Product> {
        let mut data = self.data.write().await;
        data.products.insert(product.id.clone(), product.clone());
        drop(data);
        self.persist().await?;
        Ok(product)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>> {
        let data = self.data.read().await;
        Ok(data.products.get(id).cloned())
    }

    async fn put_student(&self, student: Student) -> Result<Student> {
        let mut data = self.data.write().await;
        data.students.insert(student.id.clone(), student.clone());
        drop(data);
        self.persist().await?;
        Ok(student)
    }

    async fn get_student(&self, id: &str) -> Result<Option<Student>> {
        let data = self.data.read().await;
        Ok(data.students.get(id).cloned())
    }

    async fn put_location(&self, location: Location) -> Result<Location> {
        let mut data = self.data.write().await;
        data.locations.insert(location.id.clone(), location.clone());
        drop(data);
        self.persist().await?;
        Ok(location)
    }

    async fn get_location(&self, id: &str) -> Result<Option<Location>> {
        let data = self.data.read().await;
        Ok(data.locations.get(id).cloned())
    }

    async fn put_order(&self, order: Order) -> Result<Order> {
        let mut data = self.data.write().await;
        data.orders.insert(order.id.clone(), order.clone());
        drop(data);
        self.persist().await?;
        Ok(order)
    }

    async fn get_order(&self, id: &str) -> Result<Option<Order>> {
        let data = self.data.read().await;
        Ok(data.orders.get(id).cloned())
    }

    // ========================================================================
    // Events
    // ========================================================================

    async fn create_event(&self, event: Event) -> Result<Event> {
        let mut data = self.data.write().await;
        data.index_event_location(&event.id, &event.location_id);
        data.events.insert(event.id.clone(), event.clone());
        drop(data);
        self.persist().await?;
        Ok(event)
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>> {
        let data = self.data.read().await;
        Ok(data.events.get(id).cloned())
    }

    async fn find_overlapping_events(
        &self,
        location_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let data = self.data.read().await;

        let ids = data
            .events_by_location
            .get(location_id)
            .map(|ids| ids.as_slice())
            .unwrap_or_default();

        let mut events: Vec<Event> = ids
            .iter()
            .filter_map(|id| data.events.get(id))
            .filter(|e| e.is_active() && e.overlaps(start, end))
            .cloned()
            .collect();

        events.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(events)
    }

    async fn increment_event_count(&self, event_id: &str) -> Result<u32> {
        let mut data = self.data.write().await;

        let event = data
            .events
            .get_mut(event_id)
            .ok_or_else(|| StorageError::NotFound(format!("Event not found: {}", event_id)))?;

        event.current_count += 1;
        event.updated_at = Utc::now();
        let count = event.current_count;

        drop(data);
        self.persist().await?;
        Ok(count)
    }

    async fn cancel_event(&self, event_id: &str) -> Result<Event> {
        let mut data = self.data.write().await;

        let event = data
            .events
            .get_mut(event_id)
            .ok_or_else(|| StorageError::NotFound(format!("Event not found: {}", event_id)))?;

        event.status = EventStatus::Cancelled;
        event.updated_at = Utc::now();
        let cancelled = event.clone();

        drop(data);
        self.persist().await?;
        Ok(cancelled)
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    async fn create_booking(&self, booking: Booking) -> Result<Booking> {
        let mut data = self.data.write().await;
        data.bookings.insert(booking.id.clone(), booking.clone());
        drop(data);
        self.persist().await?;
        Ok(booking)
    }

    async fn get_booking(&self, id: &str) -> Result<Option<Booking>> {
        let data = self.data.read().await;
        Ok(data.bookings.get(id).cloned())
    }

    async fn find_unlinked_booking(
        &self,
        student_id: &str,
        product_id: &str,
        start_from: DateTime<Utc>,
        start_to: DateTime<Utc>,
    ) -> Result<Option<Booking>> {
        let data = self.data.read().await;

        let booking = data
            .bookings
            .values()
            .filter(|b| {
                b.event_id.is_none()
                    && b.student_id == student_id
                    && b.product_id == product_id
                    && b.start >= start_from
                    && b.start < start_to
            })
            .min_by_key(|b| b.created_at)
            .cloned();

        Ok(booking)
    }

    async fn link_booking_event(&self, booking_id: &str, event_id: &str) -> Result<Booking> {
        let mut data = self.data.write().await;

        let booking = data
            .bookings
            .get_mut(booking_id)
            .ok_or_else(|| StorageError::NotFound(format!("Booking not found: {}", booking_id)))?;

        booking.event_id = Some(event_id.to_string());
        booking.status = BookingStatus::Confirmed;
        booking.updated_at = Utc::now();
        let linked = booking.clone();

        drop(data);
        self.persist().await?;
        Ok(linked)
    }

    // ========================================================================
    // Recurring Templates
    // ========================================================================

    async fn create_template(&self, template: RecurringTemplate) -> Result<RecurringTemplate> {
        let mut data = self.data.write().await;
        data.templates.insert(template.id.clone(), template.clone());
        drop(data);
        self.persist().await?;
        Ok(template)
    }

    async fn get_template(&self, id: &str) -> Result<Option<RecurringTemplate>> {
        let data = self.data.read().await;
        Ok(data.templates.get(id).cloned())
    }

    // ========================================================================
    // Materialization Records
    // ========================================================================

    async fn get_materialization(&self, order_id: &str) -> Result<Option<MaterializationRecord>> {
        let data = self.data.read().await;
        Ok(data.materializations.get(order_id).cloned())
    }

    async fn claim_materialization(
        &self,
        claim: MaterializationRecord,
    ) -> Result<Option<MaterializationRecord>> {
        let mut data = self.data.write().await;

        let prior = match data.materializations.get(&claim.order_id) {
            Some(existing) if !existing.settled => {
                return Err(StorageError::InvalidOperation(format!(
                    "materialization already in progress for order {}",
                    claim.order_id
                ))
                .into());
            }
            Some(existing) => Some(existing.clone()),
            None => None,
        };
        data.materializations.insert(claim.order_id.clone(), claim);

        drop(data);
        self.persist().await?;
        Ok(prior)
    }

    async fn put_materialization(&self, record: MaterializationRecord) -> Result<()> {
        let mut data = self.data.write().await;
        data.materializations
            .insert(record.order_id.clone(), record);
        drop(data);
        self.persist().await?;
        Ok(())
    }
}

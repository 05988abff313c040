//! Order materialization: turning a paid order's line items into events.

use std::sync::Arc;

use chrono::{Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::SchedulingConfig;
use crate::error::{Result, SchedulingError, StorageError};
use crate::scheduling::bookings::{BookingLinker, LinkBookingParams};
use crate::scheduling::closures::ClosureCalendar;
use crate::scheduling::datetime::offset_hhmm;
use crate::scheduling::events::{CreateEventParams, EventFactory};
use crate::scheduling::templates::{CreateTemplateParams, SkippedDay, TemplateExpander};
use crate::scheduling::types::{
    Event, EventType, Location, MaterializationRecord, Order, OrderItem, PaymentStatus, Product,
    ProductCategory, Student,
};
use crate::store::BookingStore;

/// A line item the materializer could not fulfil.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ItemFailure {
    pub item_id: String,
    pub error: String,
}

/// First-class result of materializing one order.
///
/// Partial completion is reported as data, never hidden: `skipped` carries
/// recurring days that were not created and why, `failures` carries items
/// that could not be fulfilled at all.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MaterializedOrder {
    pub order_id: String,
    /// Every event created across all line items.
    pub events: Vec<Event>,
    /// Recurring candidate days skipped during expansion.
    pub skipped: Vec<SkippedDay>,
    /// Line items that failed outright.
    pub failures: Vec<ItemFailure>,
    /// True when a previous run already materialized this order and its
    /// events were returned unchanged.
    pub replayed: bool,
}

struct ItemOutcome {
    events: Vec<Event>,
    skipped: Vec<SkippedDay>,
}

/// Orchestrates order materialization: dispatches each paid line item by
/// product category to the event factory or template expander, then links
/// bookings.
pub struct OrderMaterializer<S: BookingStore, C: ClosureCalendar> {
    store: Arc<S>,
    closures: Arc<C>,
    config: SchedulingConfig,
}

impl<S: BookingStore, C: ClosureCalendar> OrderMaterializer<S, C> {
    /// Create a new materializer.
    pub fn new(store: Arc<S>, closures: Arc<C>, config: SchedulingConfig) -> Self {
        Self {
            store,
            closures,
            config,
        }
    }

    /// Materialize every event implied by a paid order's line items.
    ///
    /// Re-invocations for the same order (webhook re-delivery) claim the
    /// order's materialization record: fully fulfilled orders replay their
    /// events without double-booking, while items that failed on an earlier
    /// run are reprocessed. A concurrent invocation for the same order fails
    /// with `InvalidOperation` instead of double-creating events.
    pub async fn materialize(&self, order_id: &str) -> Result<MaterializedOrder> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| SchedulingError::OrderNotFound(order_id.to_string()))?;

        if order.status != PaymentStatus::Paid {
            return Err(SchedulingError::OrderNotPaid(order_id.to_string()).into());
        }

        let location_id = order
            .location_id
            .clone()
            .ok_or_else(|| SchedulingError::MissingLocation(format!("order {}", order_id)))?;
        let location = self
            .store
            .get_location(&location_id)
            .await?
            .ok_or_else(|| SchedulingError::MissingLocation(location_id.clone()))?;

        let items_hash = hash_items(&order.items);
        let prior = self
            .store
            .claim_materialization(MaterializationRecord {
                order_id: order_id.to_string(),
                items_hash: items_hash.clone(),
                event_ids: Vec::new(),
                completed_item_ids: Vec::new(),
                settled: false,
                created_at: Utc::now(),
            })
            .await?;

        let mut result = MaterializedOrder {
            order_id: order_id.to_string(),
            events: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            replayed: false,
        };
        let mut completed_item_ids = Vec::new();

        if let Some(record) = prior {
            if record.items_hash != items_hash {
                // Release the claim before failing; the settled record stands.
                self.store.put_materialization(record).await?;
                return Err(StorageError::InvalidOperation(format!(
                    "order {} was already materialized with different items",
                    order_id
                ))
                .into());
            }

            for id in &record.event_ids {
                if let Some(event) = self.store.get_event(id).await? {
                    result.events.push(event);
                }
            }
            completed_item_ids = record.completed_item_ids.clone();

            if order
                .items
                .iter()
                .all(|item| completed_item_ids.contains(&item.id))
            {
                self.store.put_materialization(record).await?;
                info!(
                    "Order {} already materialized, replaying {} events",
                    order_id,
                    result.events.len()
                );
                result.replayed = true;
                return Ok(result);
            }
            info!(
                "Order {} partially materialized, retrying unfulfilled items",
                order_id
            );
        }

        for item in &order.items {
            if completed_item_ids.contains(&item.id) {
                continue;
            }
            match self.materialize_item(&order, &location, item).await {
                Ok(outcome) => {
                    completed_item_ids.push(item.id.clone());
                    result.events.extend(outcome.events);
                    result.skipped.extend(outcome.skipped);
                }
                Err(err) => {
                    warn!("Order {} item {} failed: {}", order_id, item.id, err);
                    result.failures.push(ItemFailure {
                        item_id: item.id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        self.store
            .put_materialization(MaterializationRecord {
                order_id: order_id.to_string(),
                items_hash,
                event_ids: result.events.iter().map(|e| e.id.clone()).collect(),
                completed_item_ids,
                settled: true,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            "Materialized order {}: {} events, {} skipped days, {} failed items",
            order_id,
            result.events.len(),
            result.skipped.len(),
            result.failures.len()
        );
        Ok(result)
    }

    async fn materialize_item(
        &self,
        order: &Order,
        location: &Location,
        item: &OrderItem,
    ) -> Result<ItemOutcome> {
        let product = self
            .store
            .get_product(&item.product_id)
            .await?
            .ok_or_else(|| SchedulingError::ProductNotFound(item.product_id.clone()))?;
        let student = self
            .store
            .get_student(&item.student_id)
            .await?
            .ok_or_else(|| SchedulingError::StudentNotFound(item.student_id.clone()))?;

        debug!(
            "Materializing {} item {} for order {}",
            product.category.display_name(),
            item.id,
            order.id
        );

        match product.category {
            ProductCategory::Camp => {
                self.materialize_camp(location, item, &product, &student).await
            }
            ProductCategory::Birthday => {
                self.materialize_birthday(location, item, &product, &student)
                    .await
            }
            ProductCategory::Subscription => {
                self.materialize_subscription(location, item, &product, &student)
                    .await
            }
        }
    }

    async fn materialize_camp(
        &self,
        location: &Location,
        item: &OrderItem,
        product: &Product,
        student: &Student,
    ) -> Result<ItemOutcome> {
        let cfg = &self.config;
        // Long camp products run as all-day sessions, the rest as half days.
        let (start, end) = if product.duration > cfg.all_day_threshold_minutes {
            (cfg.all_day_start.clone(), cfg.all_day_end.clone())
        } else {
            (cfg.half_day_start.clone(), cfg.half_day_end.clone())
        };

        let event = self
            .factory()
            .create_event(self.event_params(
                product,
                student,
                EventType::Camp,
                item,
                start,
                end,
                &location.id,
            ))
            .await?;
        self.link_item(&event, item, student).await?;

        Ok(ItemOutcome {
            events: vec![event],
            skipped: Vec::new(),
        })
    }

    async fn materialize_birthday(
        &self,
        location: &Location,
        item: &OrderItem,
        product: &Product,
        student: &Student,
    ) -> Result<ItemOutcome> {
        let start = item
            .booking_time
            .clone()
            .unwrap_or_else(|| self.config.birthday_default_start.clone());
        let end = offset_hhmm(&start, self.config.birthday_duration_minutes)?;

        let event = self
            .factory()
            .create_event(self.event_params(
                product,
                student,
                EventType::Birthday,
                item,
                start,
                end,
                &location.id,
            ))
            .await?;
        self.link_item(&event, item, student).await?;

        Ok(ItemOutcome {
            events: vec![event],
            skipped: Vec::new(),
        })
    }

    async fn materialize_subscription(
        &self,
        location: &Location,
        item: &OrderItem,
        product: &Product,
        student: &Student,
    ) -> Result<ItemOutcome> {
        let cfg = &self.config;
        // A subscription product's duration is a month count, four weeks each.
        let weeks = product
            .duration
            .checked_mul(cfg.weeks_per_month)
            .ok_or_else(|| {
                SchedulingError::InvalidTemplate(format!(
                    "subscription span overflows: {} months",
                    product.duration
                ))
            })?;
        let end_date = item
            .booking_date
            .checked_add_signed(Duration::weeks(i64::from(weeks)))
            .and_then(|d| d.checked_sub_signed(Duration::days(1)))
            .ok_or_else(|| {
                SchedulingError::InvalidTemplate(format!(
                    "subscription end date out of range: {} months from {}",
                    product.duration, item.booking_date
                ))
            })?;

        let expander = self.expander();
        let template = expander
            .create_recurring_template(CreateTemplateParams {
                name: format!("{} - {}", product.name, student.name),
                start_time: cfg.subscription_start.clone(),
                end_time: cfg.subscription_end.clone(),
                days_of_week: vec![cfg.subscription_day],
                start_date: item.booking_date,
                end_date: Some(end_date),
                max_capacity: cfg.subscription_capacity,
                location_id: location.id.clone(),
            })
            .await?;

        let outcome = expander.expand(&template).await?;

        // One traceable booking per purchase: only the first session is
        // linked, later ones stay capacity-tracked but unbooked.
        if let Some(first) = outcome.events.first() {
            self.link_item(first, item, student).await?;
        }

        Ok(ItemOutcome {
            events: outcome.events,
            skipped: outcome.skipped,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn event_params(
        &self,
        product: &Product,
        student: &Student,
        event_type: EventType,
        item: &OrderItem,
        start_time: String,
        end_time: String,
        location_id: &str,
    ) -> CreateEventParams {
        let mut params = CreateEventParams::new(
            product.name.clone(),
            event_type,
            item.booking_date,
            start_time,
            end_time,
            location_id,
        );
        params.min_age = product.min_age;
        params.max_age = product.max_age;
        if let Some(ref notes) = student.medical_notes {
            params = params.with_description(format!("{}: {}", student.name, notes));
        }
        params
    }

    async fn link_item(&self, event: &Event, item: &OrderItem, student: &Student) -> Result<()> {
        self.linker()
            .link(
                event,
                LinkBookingParams {
                    student_id: item.student_id.clone(),
                    product_id: item.product_id.clone(),
                    booking_date: item.booking_date,
                    price_cents: item.price_cents,
                    notes: student.medical_notes.clone(),
                },
            )
            .await?;
        Ok(())
    }

    fn factory(&self) -> EventFactory<S, C> {
        EventFactory::new(
            self.store.clone(),
            self.closures.clone(),
            self.config.clone(),
        )
    }

    fn expander(&self) -> TemplateExpander<S, C> {
        TemplateExpander::new(
            self.store.clone(),
            self.closures.clone(),
            self.config.clone(),
        )
    }

    fn linker(&self) -> BookingLinker<S> {
        BookingLinker::new(self.store.clone())
    }
}

/// SHA-256 hex digest over the order's canonical item list.
fn hash_items(items: &[OrderItem]) -> String {
    let mut hasher = Sha256::new();
    for item in items {
        hasher.update(item.id.as_bytes());
        hasher.update(b"|");
        hasher.update(item.product_id.as_bytes());
        hasher.update(b"|");
        hasher.update(item.student_id.as_bytes());
        hasher.update(b"|");
        hasher.update(item.booking_date.to_string().as_bytes());
        hasher.update(b"|");
        if let Some(ref time) = item.booking_time {
            hasher.update(time.as_bytes());
        }
        hasher.update(b"|");
        hasher.update(item.price_cents.to_le_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WallabyError;
    use crate::scheduling::closures::StaticClosureCalendar;
    use crate::store::EmbeddedBookingStore;
    use chrono::NaiveDate;

    fn materializer(
        store: Arc<EmbeddedBookingStore>,
    ) -> OrderMaterializer<EmbeddedBookingStore, StaticClosureCalendar> {
        OrderMaterializer::new(
            store,
            Arc::new(StaticClosureCalendar::new()),
            SchedulingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_order_not_found() {
        let store = Arc::new(EmbeddedBookingStore::new());
        let err = materializer(store).materialize("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            WallabyError::Scheduling(SchedulingError::OrderNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unpaid_order_rejected() {
        let store = Arc::new(EmbeddedBookingStore::new());
        let order = Order::new("Dana Example", "dana@example.com");
        let order_id = order.id.clone();
        store.put_order(order).await.unwrap();

        let err = materializer(store).materialize(&order_id).await.unwrap_err();
        assert!(matches!(
            err,
            WallabyError::Scheduling(SchedulingError::OrderNotPaid(_))
        ));
    }

    #[tokio::test]
    async fn test_order_without_location_rejected() {
        let store = Arc::new(EmbeddedBookingStore::new());
        let order = Order::new("Dana Example", "dana@example.com").paid();
        let order_id = order.id.clone();
        store.put_order(order).await.unwrap();

        let err = materializer(store).materialize(&order_id).await.unwrap_err();
        assert!(matches!(
            err,
            WallabyError::Scheduling(SchedulingError::MissingLocation(_))
        ));
    }

    #[tokio::test]
    async fn test_subscription_span_overflow_reported() {
        let store = Arc::new(EmbeddedBookingStore::new());
        let location = Location::new("Neutral Bay Hall", "Australia/Sydney", 20);
        let location_id = location.id.clone();
        store.put_location(location).await.unwrap();

        let student = Student::new("Alex Park");
        let student_id = student.id.clone();
        store.put_student(student).await.unwrap();

        // Corrupt month count that overflows the week multiply
        let product = Product::new("Forever Club", ProductCategory::Subscription, u32::MAX);
        let product_id = product.id.clone();
        store.put_product(product).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let order = Order::new("Dana Example", "dana@example.com")
            .at_location(&location_id)
            .with_item(OrderItem::new(&product_id, &student_id, date, 60_000))
            .paid();
        let order_id = order.id.clone();
        store.put_order(order).await.unwrap();

        let result = materializer(store).materialize(&order_id).await.unwrap();
        assert!(result.events.is_empty());
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].error.contains("subscription"));
    }

    #[test]
    fn test_hash_items_is_content_sensitive() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
        let a = OrderItem::new("prod-1", "student-1", date, 35_000);
        let mut b = a.clone();

        assert_eq!(hash_items(&[a.clone()]), hash_items(&[b.clone()]));

        b.booking_date = date + Duration::days(1);
        assert_ne!(hash_items(&[a]), hash_items(&[b]));
    }
}

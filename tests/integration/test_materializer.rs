//! End-to-end order materialization scenarios.

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use wallaby::{
    EmbeddedBookingStore, BookingStore, Location, Order, OrderItem, OrderMaterializer, Product,
    ProductCategory, SchedulingConfig, StaticClosureCalendar, Student,
};

struct Fixture {
    store: Arc<EmbeddedBookingStore>,
    location_id: String,
    student_id: String,
}

impl Fixture {
    async fn new() -> Self {
        let store = Arc::new(EmbeddedBookingStore::new());
        let location = Location::new("Neutral Bay Hall", "Australia/Sydney", 20);
        let location_id = location.id.clone();
        store.put_location(location).await.unwrap();

        let student = Student::new("Alex Park").with_medical_notes("peanut allergy");
        let student_id = student.id.clone();
        store.put_student(student).await.unwrap();

        Self {
            store,
            location_id,
            student_id,
        }
    }

    async fn product(&self, name: &str, category: ProductCategory, duration: u32) -> String {
        let product = Product::new(name, category, duration);
        let id = product.id.clone();
        self.store.put_product(product).await.unwrap();
        id
    }

    async fn paid_order(&self, items: Vec<OrderItem>) -> String {
        let mut order = Order::new("Dana Park", "dana@example.com")
            .at_location(&self.location_id)
            .paid();
        order.items = items;
        let id = order.id.clone();
        self.store.put_order(order).await.unwrap();
        id
    }

    fn materializer(
        &self,
        closures: StaticClosureCalendar,
    ) -> OrderMaterializer<EmbeddedBookingStore, StaticClosureCalendar> {
        OrderMaterializer::new(
            self.store.clone(),
            Arc::new(closures),
            SchedulingConfig::default(),
        )
    }
}

fn local_hm(event_start: chrono::DateTime<chrono::Utc>) -> String {
    let sydney: Tz = "Australia/Sydney".parse().unwrap();
    event_start
        .with_timezone(&sydney)
        .format("%H:%M")
        .to_string()
}

#[tokio::test]
async fn test_all_day_camp_order() {
    let fx = Fixture::new().await;
    let product_id = fx
        .product("Summer Holiday Camp", ProductCategory::Camp, 480)
        .await;
    let tuesday = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
    let order_id = fx
        .paid_order(vec![OrderItem::new(
            &product_id,
            &fx.student_id,
            tuesday,
            35_000,
        )])
        .await;

    let result = fx
        .materializer(StaticClosureCalendar::new())
        .materialize(&order_id)
        .await
        .unwrap();

    assert_eq!(result.events.len(), 1);
    assert!(result.failures.is_empty());
    let event = &result.events[0];
    assert_eq!(local_hm(event.start), "09:00");
    assert_eq!(local_hm(event.end), "17:00");
    // Medical notes annotate the description
    assert!(event.description.as_deref().unwrap().contains("peanut allergy"));

    // The booking linker ran exactly once
    let stored = fx.store.get_event(&event.id).await.unwrap().unwrap();
    assert_eq!(stored.current_count, 1);
}

#[tokio::test]
async fn test_half_day_camp_order() {
    let fx = Fixture::new().await;
    let product_id = fx
        .product("Morning Camp", ProductCategory::Camp, 300)
        .await;
    let tuesday = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
    let order_id = fx
        .paid_order(vec![OrderItem::new(
            &product_id,
            &fx.student_id,
            tuesday,
            19_000,
        )])
        .await;

    let result = fx
        .materializer(StaticClosureCalendar::new())
        .materialize(&order_id)
        .await
        .unwrap();

    assert_eq!(result.events.len(), 1);
    assert_eq!(local_hm(result.events[0].start), "09:00");
    assert_eq!(local_hm(result.events[0].end), "15:00");
}

#[tokio::test]
async fn test_birthday_order_uses_requested_time() {
    let fx = Fixture::new().await;
    let product_id = fx
        .product("Party Package", ProductCategory::Birthday, 120)
        .await;
    let saturday = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();
    let order_id = fx
        .paid_order(vec![
            OrderItem::new(&product_id, &fx.student_id, saturday, 45_000).at_time("13:30"),
        ])
        .await;

    let result = fx
        .materializer(StaticClosureCalendar::new())
        .materialize(&order_id)
        .await
        .unwrap();

    assert_eq!(result.events.len(), 1);
    assert_eq!(local_hm(result.events[0].start), "13:30");
    assert_eq!(local_hm(result.events[0].end), "15:30");
    assert_eq!(result.events[0].max_capacity, 12);
}

#[tokio::test]
async fn test_closure_date_item_reported_not_materialized() {
    let fx = Fixture::new().await;
    let product_id = fx
        .product("Summer Holiday Camp", ProductCategory::Camp, 480)
        .await;
    let australia_day = NaiveDate::from_ymd_opt(2025, 1, 27).unwrap();
    let order_id = fx
        .paid_order(vec![OrderItem::new(
            &product_id,
            &fx.student_id,
            australia_day,
            35_000,
        )])
        .await;

    let closures = StaticClosureCalendar::new().with_closure(australia_day, "Australia Day");
    let result = fx
        .materializer(closures)
        .materialize(&order_id)
        .await
        .unwrap();

    assert!(result.events.is_empty());
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].error.contains("Australia Day"));
}

#[tokio::test]
async fn test_partial_order_reports_failures_and_keeps_good_items() {
    let fx = Fixture::new().await;
    let product_id = fx
        .product("Summer Holiday Camp", ProductCategory::Camp, 480)
        .await;
    let tuesday = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
    let saturday = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();

    let good = OrderItem::new(&product_id, &fx.student_id, tuesday, 35_000);
    let weekend = OrderItem::new(&product_id, &fx.student_id, saturday, 35_000);
    let weekend_id = weekend.id.clone();
    let order_id = fx.paid_order(vec![good, weekend]).await;

    let result = fx
        .materializer(StaticClosureCalendar::new())
        .materialize(&order_id)
        .await
        .unwrap();

    assert_eq!(result.events.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].item_id, weekend_id);
    assert!(result.failures[0].error.contains("weekend"));

    // A webhook retry reprocesses only the weekend item; the fulfilled one
    // is carried over, not double-booked
    let retry = fx
        .materializer(StaticClosureCalendar::new())
        .materialize(&order_id)
        .await
        .unwrap();
    assert!(!retry.replayed);
    assert_eq!(retry.events.len(), 1);
    assert_eq!(retry.failures.len(), 1);

    let event = fx
        .store
        .get_event(&retry.events[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.current_count, 1);
}

#[tokio::test]
async fn test_retry_after_missing_product_fulfills_item() {
    let fx = Fixture::new().await;
    let product = Product::new("Summer Holiday Camp", ProductCategory::Camp, 480);
    let tuesday = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
    let order_id = fx
        .paid_order(vec![OrderItem::new(
            &product.id,
            &fx.student_id,
            tuesday,
            35_000,
        )])
        .await;

    let materializer = fx.materializer(StaticClosureCalendar::new());

    // The catalog row is missing on the first delivery
    let first = materializer.materialize(&order_id).await.unwrap();
    assert!(first.events.is_empty());
    assert_eq!(first.failures.len(), 1);

    fx.store.put_product(product).await.unwrap();

    // The retry fulfils the item instead of replaying the empty record
    let second = materializer.materialize(&order_id).await.unwrap();
    assert!(!second.replayed);
    assert_eq!(second.events.len(), 1);
    assert!(second.failures.is_empty());

    let third = materializer.materialize(&order_id).await.unwrap();
    assert!(third.replayed);
    assert_eq!(third.events[0].id, second.events[0].id);

    let event = fx
        .store
        .get_event(&second.events[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.current_count, 1);
}

#[tokio::test]
async fn test_rematerialization_replays_without_double_booking() {
    let fx = Fixture::new().await;
    let product_id = fx
        .product("Summer Holiday Camp", ProductCategory::Camp, 480)
        .await;
    let tuesday = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
    let order_id = fx
        .paid_order(vec![OrderItem::new(
            &product_id,
            &fx.student_id,
            tuesday,
            35_000,
        )])
        .await;

    let materializer = fx.materializer(StaticClosureCalendar::new());
    let first = materializer.materialize(&order_id).await.unwrap();
    let second = materializer.materialize(&order_id).await.unwrap();

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(first.events.len(), 1);
    assert_eq!(second.events[0].id, first.events[0].id);

    // The replay did not touch the occupancy counter
    let event = fx
        .store
        .get_event(&first.events[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.current_count, 1);
}

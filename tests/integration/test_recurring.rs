//! End-to-end subscription and recurring-expansion scenarios.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};
use chrono_tz::Tz;
use wallaby::{
    BookingStore, CreateEventParams, EmbeddedBookingStore, EventFactory, EventType, Location,
    Order, OrderItem, OrderMaterializer, Product, ProductCategory, SchedulingConfig, SkipReason,
    StaticClosureCalendar, Student,
};

async fn seeded_store(location_capacity: u32) -> (Arc<EmbeddedBookingStore>, String, String, String)
{
    let store = Arc::new(EmbeddedBookingStore::new());

    let location = Location::new("Neutral Bay Hall", "Australia/Sydney", location_capacity);
    let location_id = location.id.clone();
    store.put_location(location).await.unwrap();

    let student = Student::new("Alex Park");
    let student_id = student.id.clone();
    store.put_student(student).await.unwrap();

    // Duration of a subscription product is a month count
    let product = Product::new("After School Club", ProductCategory::Subscription, 3);
    let product_id = product.id.clone();
    store.put_product(product).await.unwrap();

    (store, location_id, student_id, product_id)
}

async fn paid_subscription_order(
    store: &EmbeddedBookingStore,
    location_id: &str,
    student_id: &str,
    product_id: &str,
    start: NaiveDate,
) -> String {
    let order = Order::new("Dana Park", "dana@example.com")
        .at_location(location_id)
        .with_item(OrderItem::new(product_id, student_id, start, 60_000))
        .paid();
    let id = order.id.clone();
    store.put_order(order).await.unwrap();
    id
}

#[tokio::test]
async fn test_subscription_materializes_twelve_wednesdays() {
    let (store, location_id, student_id, product_id) = seeded_store(20).await;
    let wednesday = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
    let order_id =
        paid_subscription_order(&store, &location_id, &student_id, &product_id, wednesday).await;

    let materializer = OrderMaterializer::new(
        store.clone(),
        Arc::new(StaticClosureCalendar::new()),
        SchedulingConfig::default(),
    );
    let result = materializer.materialize(&order_id).await.unwrap();

    // 3 months at 4 weeks per month, one session per week
    assert_eq!(result.events.len(), 12);
    assert!(result.skipped.is_empty());

    let sydney: Tz = "Australia/Sydney".parse().unwrap();
    for event in &result.events {
        assert_eq!(event.event_type, EventType::RecurringSession);
        assert!(event.template_id.is_some());
        assert_eq!(event.max_capacity, 8);
        let local = event.start.with_timezone(&sydney);
        assert_eq!(local.weekday(), Weekday::Wed);
        assert_eq!(local.format("%H:%M").to_string(), "16:00");
    }

    // Only the first session carries the traceable booking
    let first = store
        .get_event(&result.events[0].id)
        .await
        .unwrap()
        .unwrap();
    let second = store
        .get_event(&result.events[1].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.current_count, 1);
    assert_eq!(second.current_count, 0);
}

#[tokio::test]
async fn test_subscription_skips_closure_wednesdays() {
    let (store, location_id, student_id, product_id) = seeded_store(20).await;
    let wednesday = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
    let closed = NaiveDate::from_ymd_opt(2025, 1, 29).unwrap();
    let order_id =
        paid_subscription_order(&store, &location_id, &student_id, &product_id, wednesday).await;

    let closures = StaticClosureCalendar::new().with_closure(closed, "Staff Training");
    let materializer =
        OrderMaterializer::new(store.clone(), Arc::new(closures), SchedulingConfig::default());
    let result = materializer.materialize(&order_id).await.unwrap();

    assert_eq!(result.events.len(), 11);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].date, closed);
    assert!(matches!(
        result.skipped[0].reason,
        SkipReason::Closure { ref name } if name == "Staff Training"
    ));
    assert!(result.events.iter().all(|e| {
        let sydney: Tz = "Australia/Sydney".parse().unwrap();
        e.start.with_timezone(&sydney).date_naive() != closed
    }));
}

#[tokio::test]
async fn test_subscription_skips_fully_committed_slot() {
    // Location capacity 8 and an existing hire over one weekly slot
    let (store, location_id, student_id, product_id) = seeded_store(8).await;
    let wednesday = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
    let blocked = NaiveDate::from_ymd_opt(2025, 1, 22).unwrap();

    let factory = EventFactory::new(
        store.clone(),
        Arc::new(StaticClosureCalendar::new()),
        SchedulingConfig::default(),
    );
    factory
        .create_event(
            CreateEventParams::new(
                "Private Hire",
                EventType::Birthday,
                blocked,
                "16:00",
                "18:00",
                &location_id,
            )
            .with_capacity(8),
        )
        .await
        .unwrap();

    let order_id =
        paid_subscription_order(&store, &location_id, &student_id, &product_id, wednesday).await;
    let materializer = OrderMaterializer::new(
        store.clone(),
        Arc::new(StaticClosureCalendar::new()),
        SchedulingConfig::default(),
    );
    let result = materializer.materialize(&order_id).await.unwrap();

    // The blocked Wednesday is skipped silently, but the skip is visible
    assert_eq!(result.events.len(), 11);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].date, blocked);
    assert!(matches!(
        result.skipped[0].reason,
        SkipReason::CapacityConflict { committed: 8, limit: 8 }
    ));
}

//! Materialized state surviving a store restart.

use std::sync::Arc;

use chrono::NaiveDate;
use wallaby::{
    BookingStore, EmbeddedBookingStore, Location, Order, OrderItem, OrderMaterializer, Product,
    ProductCategory, SchedulingConfig, StaticClosureCalendar, Student,
};

fn materializer(
    store: Arc<EmbeddedBookingStore>,
) -> OrderMaterializer<EmbeddedBookingStore, StaticClosureCalendar> {
    OrderMaterializer::new(
        store,
        Arc::new(StaticClosureCalendar::new()),
        SchedulingConfig::default(),
    )
}

async fn seed_camp_order(store: &EmbeddedBookingStore) -> String {
    let location = Location::new("Neutral Bay Hall", "Australia/Sydney", 20);
    let location_id = location.id.clone();
    store.put_location(location).await.unwrap();

    let student = Student::new("Alex Park");
    let student_id = student.id.clone();
    store.put_student(student).await.unwrap();

    let product = Product::new("Summer Holiday Camp", ProductCategory::Camp, 480);
    let product_id = product.id.clone();
    store.put_product(product).await.unwrap();

    let tuesday = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();
    let order = Order::new("Dana Park", "dana@example.com")
        .at_location(&location_id)
        .with_item(OrderItem::new(&product_id, &student_id, tuesday, 35_000))
        .paid();
    let order_id = order.id.clone();
    store.put_order(order).await.unwrap();
    order_id
}

#[tokio::test]
async fn test_materialized_order_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (order_id, event_id) = {
        let store = Arc::new(
            EmbeddedBookingStore::with_persistence(dir.path())
                .await
                .unwrap(),
        );
        let order_id = seed_camp_order(&store).await;
        let result = materializer(store.clone())
            .materialize(&order_id)
            .await
            .unwrap();
        assert_eq!(result.events.len(), 1);
        assert!(!result.replayed);
        (order_id, result.events[0].id.clone())
    };

    let store = Arc::new(
        EmbeddedBookingStore::with_persistence(dir.path())
            .await
            .unwrap(),
    );

    let event = store.get_event(&event_id).await.unwrap().unwrap();
    assert_eq!(event.current_count, 1);

    // The materialization record was persisted too, so a webhook re-delivery
    // against the reopened store replays instead of double-booking
    let replay = materializer(store.clone())
        .materialize(&order_id)
        .await
        .unwrap();
    assert!(replay.replayed);
    assert_eq!(replay.events.len(), 1);
    assert_eq!(replay.events[0].id, event_id);

    let event = store.get_event(&event_id).await.unwrap().unwrap();
    assert_eq!(event.current_count, 1);
}

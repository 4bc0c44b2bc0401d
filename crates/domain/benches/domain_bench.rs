use common::{CustomerId, ProductId, RestaurantId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{DeliveryAddress, Money, Order, OrderItem, Restaurant};

fn sample_restaurant(product_id: ProductId) -> Restaurant {
    Restaurant::new(RestaurantId::new(), "Benchmark Bistro", true).with_product(
        product_id,
        "Margherita",
        Money::from_cents(1099),
    )
}

fn bench_initialize(c: &mut Criterion) {
    let product_id = ProductId::new();
    let restaurant = sample_restaurant(product_id);
    let customer_id = CustomerId::new();

    c.bench_function("domain/initialize_order", |b| {
        b.iter(|| {
            Order::initialize(
                customer_id,
                &restaurant,
                Money::from_cents(5495),
                vec![OrderItem::new(product_id, 5, Money::from_cents(1099))],
                DeliveryAddress::new("1 Main St", "10001", "Springfield"),
            )
            .unwrap()
        });
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    let product_id = ProductId::new();
    let restaurant = sample_restaurant(product_id);
    let customer_id = CustomerId::new();

    c.bench_function("domain/full_lifecycle", |b| {
        b.iter(|| {
            let mut order = Order::initialize(
                customer_id,
                &restaurant,
                Money::from_cents(1099),
                vec![OrderItem::new(product_id, 1, Money::from_cents(1099))],
                DeliveryAddress::new("1 Main St", "10001", "Springfield"),
            )
            .unwrap();
            order.pay().unwrap();
            order.approve().unwrap();
            order.complete().unwrap();
            order
        });
    });
}

criterion_group!(benches, bench_initialize, bench_full_lifecycle);
criterion_main!(benches);

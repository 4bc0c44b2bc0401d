//! HTTP API server with observability for the order saga service.
//!
//! Provides REST endpoints for creating and tracking orders, with structured
//! logging (tracing) and Prometheus metrics. The saga itself runs in the
//! background: the outbox relay publishes participant requests and the
//! response listener applies their verdicts.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use common::{ProductId, RestaurantId};
use domain::{Money, Restaurant};
use messaging::InMemoryMessageBus;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore, StoreError};
use saga::CreateOrderHandler;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{tracking_id}", get(routes::orders::track::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state around the given store.
pub fn create_state<S: OrderStore>(store: Arc<S>) -> Arc<AppState<S>> {
    Arc::new(AppState {
        create_order: CreateOrderHandler::new(store.clone()),
        store,
    })
}

/// Creates in-memory state for local runs and tests, with an in-process bus.
pub fn create_default_state() -> (
    Arc<AppState<InMemoryOrderStore>>,
    Arc<InMemoryOrderStore>,
    Arc<InMemoryMessageBus>,
) {
    let store = Arc::new(InMemoryOrderStore::new());
    let bus = Arc::new(InMemoryMessageBus::new());
    (create_state(store.clone()), store, bus)
}

/// Seeds a demo restaurant so a fresh in-memory instance accepts orders.
pub async fn seed_demo_restaurant<S: OrderStore>(
    store: &S,
) -> Result<(RestaurantId, ProductId), StoreError> {
    let restaurant_id = RestaurantId::new();
    let product_id = ProductId::new();
    let restaurant = Restaurant::new(restaurant_id, "Demo Pizzeria", true).with_product(
        product_id,
        "Margherita",
        Money::from_cents(1099),
    );
    store.upsert_restaurant(&restaurant).await?;
    Ok((restaurant_id, product_id))
}

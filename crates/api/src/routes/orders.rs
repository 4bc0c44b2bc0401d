//! Order creation and tracking endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, ProductId, RestaurantId, TrackingId};
use domain::{DeliveryAddress, Money, OrderItem, OrderStatus};
use order_store::OrderStore;
use saga::{CreateOrderCommand, CreateOrderHandler};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub create_order: CreateOrderHandler<S>,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub restaurant_id: RestaurantId,
    /// Order total in cents, as shown to the customer.
    pub amount_cents: i64,
    pub items: Vec<OrderItemRequest>,
    pub address: AddressRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price_cents: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub tracking_id: TrackingId,
    pub status: OrderStatus,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackOrderResponse {
    pub tracking_id: TrackingId,
    pub status: OrderStatus,
    pub failure_messages: Vec<String>,
}

/// POST /orders — starts a new order saga.
pub async fn create<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let command = CreateOrderCommand {
        customer_id: request.customer_id,
        restaurant_id: request.restaurant_id,
        amount_cents: Money::from_cents(request.amount_cents),
        items: request
            .items
            .into_iter()
            .map(|item| {
                OrderItem::new(
                    item.product_id,
                    item.quantity,
                    Money::from_cents(item.price_cents),
                )
            })
            .collect(),
        address: DeliveryAddress::new(
            request.address.street,
            request.address.postal_code,
            request.address.city,
        ),
    };

    let created = state.create_order.handle(command).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            tracking_id: created.tracking_id,
            status: created.status,
            message: "order created successfully".to_string(),
        }),
    ))
}

/// GET /orders/{tracking_id} — returns the order's current saga state.
pub async fn track<S: OrderStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(tracking_id): Path<Uuid>,
) -> Result<Json<TrackOrderResponse>, ApiError> {
    let tracking_id = TrackingId::from_uuid(tracking_id);
    let order = state
        .store
        .find_by_tracking_id(tracking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no order with tracking id {tracking_id}")))?;

    Ok(Json(TrackOrderResponse {
        tracking_id,
        status: order.status(),
        failure_messages: order.failure_messages().to_vec(),
    }))
}

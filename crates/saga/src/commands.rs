use common::{CustomerId, RestaurantId, TrackingId};
use domain::{DeliveryAddress, Money, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};

/// Request to start a new order saga.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderCommand {
    pub customer_id: CustomerId,
    pub restaurant_id: RestaurantId,
    /// Total the customer was shown, in cents. Must match the sum of the
    /// item subtotals priced against the restaurant's menu.
    pub amount_cents: Money,
    pub items: Vec<OrderItem>,
    pub address: DeliveryAddress,
}

/// Result of a successful order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub tracking_id: TrackingId,
    pub status: OrderStatus,
}

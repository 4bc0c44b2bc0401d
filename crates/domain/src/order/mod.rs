//! Order aggregate and related types.

mod aggregate;
mod status;
mod value_objects;

pub use aggregate::Order;
pub use status::OrderStatus;
pub use value_objects::{DeliveryAddress, Money, OrderItem, Product, Restaurant};

use common::{ProductId, RestaurantId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The declared order amount disagrees with the sum of item subtotals.
    #[error("Price mismatch: declared {declared}, items total {computed}")]
    PriceMismatch { declared: Money, computed: Money },

    /// The order has no items.
    #[error("Order must contain at least one item")]
    EmptyItemList,

    /// A submitted item price disagrees with the restaurant's authoritative price.
    #[error("Item price mismatch for product {product_id}: submitted {submitted}, menu price {authoritative}")]
    ItemPriceMismatch {
        product_id: ProductId,
        submitted: Money,
        authoritative: Money,
    },

    /// The restaurant is unknown, inactive, or does not carry a requested product.
    #[error("Invalid restaurant: {restaurant_id} ({reason})")]
    InvalidRestaurant {
        restaurant_id: RestaurantId,
        reason: &'static str,
    },

    /// The order is not in the required status for the requested transition.
    #[error("Invalid order state: cannot {action} from {current} status")]
    InvalidOrderState {
        current: OrderStatus,
        action: &'static str,
    },
}

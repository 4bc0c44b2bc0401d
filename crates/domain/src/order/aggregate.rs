//! Order aggregate implementation.

use common::{CustomerId, OrderId, RestaurantId, TrackingId, Version};
use serde::{Deserialize, Serialize};

use super::{DeliveryAddress, Money, OrderError, OrderItem, OrderStatus, Restaurant};

/// Order aggregate root.
///
/// Holds the full lifecycle of an order from creation to completion or
/// cancellation. Every mutation validates the current status as a
/// precondition; violations are domain errors, never silent no-ops. The
/// aggregate itself performs no I/O — persisting state and recording outbox
/// events is the saga step handlers' job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Internal order identity, server generated.
    id: OrderId,

    /// Externally shared correlation id, doubles as the saga id.
    tracking_id: TrackingId,

    customer_id: CustomerId,
    restaurant_id: RestaurantId,
    address: DeliveryAddress,

    /// Total amount; always equals the sum of item subtotals.
    amount: Money,

    items: Vec<OrderItem>,
    status: OrderStatus,

    /// Every cancellation cause, preserved in arrival order.
    failure_messages: Vec<String>,

    /// Optimistic concurrency version of the persisted row.
    version: Version,
}

impl Order {
    /// Creates a new order in `Pending` status after validating it against
    /// the restaurant's replica data.
    ///
    /// Fails with [`OrderError::InvalidRestaurant`] if the restaurant is
    /// inactive or does not carry a requested product,
    /// [`OrderError::EmptyItemList`] if there are no items,
    /// [`OrderError::ItemPriceMismatch`] if a submitted unit price disagrees
    /// with the menu price, and [`OrderError::PriceMismatch`] if the declared
    /// amount is not the sum of item subtotals.
    pub fn initialize(
        customer_id: CustomerId,
        restaurant: &Restaurant,
        amount: Money,
        items: Vec<OrderItem>,
        address: DeliveryAddress,
    ) -> Result<Self, OrderError> {
        if !restaurant.active {
            return Err(OrderError::InvalidRestaurant {
                restaurant_id: restaurant.id,
                reason: "restaurant is not active",
            });
        }

        if items.is_empty() {
            return Err(OrderError::EmptyItemList);
        }

        for item in &items {
            let authoritative = restaurant.price_of(item.product_id).ok_or({
                OrderError::InvalidRestaurant {
                    restaurant_id: restaurant.id,
                    reason: "product is not on the menu",
                }
            })?;

            if item.price != authoritative {
                return Err(OrderError::ItemPriceMismatch {
                    product_id: item.product_id,
                    submitted: item.price,
                    authoritative,
                });
            }
        }

        // An overflowing total can never match a declared amount.
        let computed = items.iter().try_fold(Money::zero(), |total, item| {
            item.price
                .checked_mul(item.quantity)
                .and_then(|subtotal| total.checked_add(subtotal))
        });
        match computed {
            Some(computed) if computed == amount => {}
            computed => {
                return Err(OrderError::PriceMismatch {
                    declared: amount,
                    computed: computed.unwrap_or(Money::MAX),
                });
            }
        }

        Ok(Self {
            id: OrderId::new(),
            tracking_id: TrackingId::new(),
            customer_id,
            restaurant_id: restaurant.id,
            address,
            amount,
            items,
            status: OrderStatus::Pending,
            failure_messages: Vec::new(),
            version: Version::initial(),
        })
    }

    /// Confirms payment: `Pending → Paid`.
    pub fn pay(&mut self) -> Result<(), OrderError> {
        if !self.status.can_pay() {
            return Err(OrderError::InvalidOrderState {
                current: self.status,
                action: "confirm payment",
            });
        }
        self.status = OrderStatus::Paid;
        Ok(())
    }

    /// Confirms restaurant approval: `Paid → Approved`.
    pub fn approve(&mut self) -> Result<(), OrderError> {
        if !self.status.can_approve() {
            return Err(OrderError::InvalidOrderState {
                current: self.status,
                action: "approve",
            });
        }
        self.status = OrderStatus::Approved;
        Ok(())
    }

    /// Marks the order fulfilled: `Approved → Completed`.
    pub fn complete(&mut self) -> Result<(), OrderError> {
        if !self.status.can_complete() {
            return Err(OrderError::InvalidOrderState {
                current: self.status,
                action: "complete",
            });
        }
        self.status = OrderStatus::Completed;
        Ok(())
    }

    /// Starts cancellation: `Pending | Paid → Cancelling`, appending the
    /// given failure reasons.
    pub fn initiate_cancel(&mut self, reasons: &[String]) -> Result<(), OrderError> {
        if !self.status.can_initiate_cancel() {
            return Err(OrderError::InvalidOrderState {
                current: self.status,
                action: "initiate cancellation",
            });
        }
        self.status = OrderStatus::Cancelling;
        self.append_failure_messages(reasons);
        Ok(())
    }

    /// Settles a pending cancellation: `Cancelling → Cancelled`, appending
    /// the given failure reasons.
    pub fn finalize_cancel(&mut self, reasons: &[String]) -> Result<(), OrderError> {
        if !self.status.can_finalize_cancel() {
            return Err(OrderError::InvalidOrderState {
                current: self.status,
                action: "finalize cancellation",
            });
        }
        self.status = OrderStatus::Cancelled;
        self.append_failure_messages(reasons);
        Ok(())
    }

    fn append_failure_messages(&mut self, reasons: &[String]) {
        self.failure_messages
            .extend(reasons.iter().filter(|r| !r.is_empty()).cloned());
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn tracking_id(&self) -> TrackingId {
        self.tracking_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn restaurant_id(&self) -> RestaurantId {
        self.restaurant_id
    }

    pub fn address(&self) -> &DeliveryAddress {
        &self.address
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn failure_messages(&self) -> &[String] {
        &self.failure_messages
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Persistence support
impl Order {
    /// Rebuilds an order from stored state. Validation happened at creation
    /// time; stores must pass fields back unmodified.
    #[allow(clippy::too_many_arguments)]
    pub fn from_storage(
        id: OrderId,
        tracking_id: TrackingId,
        customer_id: CustomerId,
        restaurant_id: RestaurantId,
        address: DeliveryAddress,
        amount: Money,
        items: Vec<OrderItem>,
        status: OrderStatus,
        failure_messages: Vec<String>,
        version: Version,
    ) -> Self {
        Self {
            id,
            tracking_id,
            customer_id,
            restaurant_id,
            address,
            amount,
            items,
            status,
            failure_messages,
            version,
        }
    }

    /// Updates the version after a successful conditional write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

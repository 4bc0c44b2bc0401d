//! Value objects owned by the order aggregate.

use common::{ProductId, RestaurantId};
use serde::{Deserialize, Serialize};

/// Money amount in integer cents, avoiding floating point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from cents (`1099` is `$10.99`).
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Largest representable amount.
    pub const MAX: Money = Money(i64::MAX);

    /// Adds, returning `None` if the sum leaves the cents range.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::Mul<u32> for Money {
    type Output = Money;

    fn mul(self, quantity: u32) -> Self::Output {
        Money(self.0 * i64::from(quantity))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A line item in an order. Immutable once the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product ordered.
    pub product_id: ProductId,

    /// Quantity ordered.
    pub quantity: u32,

    /// Unit price as submitted by the client.
    pub price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(product_id: ProductId, quantity: u32, price: Money) -> Self {
        Self {
            product_id,
            quantity,
            price,
        }
    }

    /// Returns `price × quantity`.
    pub fn subtotal(&self) -> Money {
        self.price * self.quantity
    }
}

/// Delivery address for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

impl DeliveryAddress {
    pub fn new(
        street: impl Into<String>,
        postal_code: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            postal_code: postal_code.into(),
            city: city.into(),
        }
    }
}

/// A product on a restaurant's menu with its authoritative price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
}

/// Local replica of restaurant master data used to validate incoming orders.
///
/// The order domain does not own restaurants; it keeps this read-side copy so
/// that order creation can reject inactive restaurants and stale
/// client-submitted prices without a cross-domain call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub active: bool,
    pub products: Vec<Product>,
}

impl Restaurant {
    /// Creates a restaurant replica entry.
    pub fn new(id: RestaurantId, name: impl Into<String>, active: bool) -> Self {
        Self {
            id,
            name: name.into(),
            active,
            products: Vec::new(),
        }
    }

    /// Adds a product to the menu, builder style.
    pub fn with_product(mut self, id: ProductId, name: impl Into<String>, price: Money) -> Self {
        self.products.push(Product {
            id,
            name: name.into(),
            price,
        });
        self
    }

    /// Returns the authoritative price for a product, if the menu carries it.
    pub fn price_of(&self, product_id: ProductId) -> Option<Money> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.price)
    }
}

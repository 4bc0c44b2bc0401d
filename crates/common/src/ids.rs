//! Typed UUID identifiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Internal identity of an order aggregate. Never shared with clients.
    OrderId
}

uuid_id! {
    /// Externally shared correlation identifier for an order.
    ///
    /// Distinct from [`OrderId`]: clients use it to track the order, and the
    /// saga uses it to correlate cross-domain request/response events.
    TrackingId
}

uuid_id! {
    /// Identity of the customer who placed an order.
    CustomerId
}

uuid_id! {
    /// Identity of the restaurant fulfilling an order.
    RestaurantId
}

uuid_id! {
    /// Identity of a product on a restaurant's menu.
    ProductId
}

uuid_id! {
    /// Identity of an outbox record.
    RecordId
}

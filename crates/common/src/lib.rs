//! Shared types for the food-ordering saga services.
//!
//! Typed identifiers prevent mixing up the many UUID-valued ids that flow
//! between the order, payment, and restaurant domains, and [`Version`] carries
//! the optimistic-concurrency counter used by both the order rows and the
//! outbox rows.

pub mod ids;
pub mod version;

pub use ids::{CustomerId, OrderId, ProductId, RecordId, RestaurantId, TrackingId};
pub use version::Version;

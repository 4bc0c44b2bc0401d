//! Domain layer for the food-ordering saga.
//!
//! This crate holds the order aggregate and its state machine, plus the value
//! objects it owns. It is deliberately free of I/O: every operation validates
//! a precondition and mutates in-memory state, leaving persistence and event
//! emission to the saga step handlers.

pub mod order;

pub use order::{
    DeliveryAddress, Money, Order, OrderError, OrderItem, OrderStatus, Product, Restaurant,
};

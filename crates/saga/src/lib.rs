//! Saga orchestration for the order lifecycle.
//!
//! Each inbound participant response is applied by a dedicated handler that
//! re-reads the order, checks the step's precondition, and commits the state
//! change together with the next outbox record in one atomic unit. Responses
//! that arrive out of order or more than once are absorbed by the
//! precondition guard instead of corrupting the order.

pub mod commands;
pub mod error;
pub mod events;
pub mod guard;
pub mod handlers;
pub mod listener;

pub use commands::{CreateOrderCommand, CreatedOrder};
pub use error::SagaError;
pub use events::{
    ApprovalOutcome, ApprovalResponse, PaymentOutcome, PaymentResponse, RefundOutcome,
    RefundResponse,
};
pub use guard::HandleOutcome;
pub use handlers::{
    ApprovalResponseHandler, CreateOrderHandler, FulfillmentHandler, PaymentResponseHandler,
    RefundResponseHandler,
};
pub use listener::ResponseListener;

//! Logical topic names shared across the order, payment, and restaurant domains.

pub const PAYMENT_REQUEST: &str = "payment-request";
pub const PAYMENT_RESPONSE: &str = "payment-response";
pub const APPROVAL_REQUEST: &str = "approval-request";
pub const APPROVAL_RESPONSE: &str = "approval-response";
pub const REFUND_REQUEST: &str = "refund-request";
pub const REFUND_RESPONSE: &str = "refund-response";

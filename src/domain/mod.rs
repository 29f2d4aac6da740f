//! The business rule of order creation, free of I/O.

mod create_order;
mod error;

pub use create_order::CreateOrder;
pub use error::OrderError;

//! Service wiring and shutdown.

mod order_system;

pub use order_system::OrderSystem;

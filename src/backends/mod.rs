//! Concrete guard backends used by the running service.
//!
//! - [`LoggingTransactionManager`]: an in-process unit-of-work registry that logs each boundary.
//! - [`TracingSpanManager`]: maps every time span onto a `tracing` span and logs its duration.

mod spans;
mod transactions;

pub use spans::TracingSpanManager;
pub use transactions::LoggingTransactionManager;

//! Error types for order creation.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    /// The user's balance does not cover the product price.
    #[error("Insufficient funds: balance {balance}, price {price}")]
    InsufficientFunds { balance: u64, price: u64 },

    /// An entity the operation depends on was not loaded into the context.
    #[error("{0} not loaded before order creation")]
    MissingEntity(&'static str),
}

//! # Repositories
//!
//! The lookup and write boundary of the order use case. Hooks depend on these traits only;
//! the store-backed implementations in [`store`] and the [`TimedOrderRepository`] decorator are
//! wired together by [`OrderSystem`](crate::lifecycle::OrderSystem).
//!
//! Every method reports through [`UseCaseError`]: a missing entity is
//! [`UseCaseError::NotFound`], a failed write is [`UseCaseError::Persistence`].

mod store;
mod timed;

pub use store::{StoreOrderRepository, StoreProductRepository, StoreUserRepository};
pub use timed::TimedOrderRepository;

use crate::model::{Order, Product, ProductId, User, UserId};
use async_trait::async_trait;
use pipeline_framework::UseCaseError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    /// [`UseCaseError::NotFound`] if no user has this id.
    async fn find(&self, id: UserId) -> Result<User, UseCaseError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// # Errors
    /// [`UseCaseError::NotFound`] if no product has this id.
    async fn find(&self, id: ProductId) -> Result<Product, UseCaseError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order. Idempotency is the implementation's concern.
    ///
    /// # Errors
    /// [`UseCaseError::Persistence`] if the write fails.
    async fn create(&self, order: &Order) -> Result<(), UseCaseError>;
}

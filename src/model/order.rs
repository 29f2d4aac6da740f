use super::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A placed order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_id: ProductId,
}

impl Order {
    pub fn new(user_id: UserId, product_id: ProductId) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            product_id,
        }
    }
}

/// Input of the create-order use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub product_id: ProductId,
}

impl CreateOrderRequest {
    pub fn new(user_id: UserId, product_id: ProductId) -> Self {
        Self { user_id, product_id }
    }
}

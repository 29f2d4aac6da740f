//! Repositories backed by [`StoreClient`]s.

use super::{OrderRepository, ProductRepository, UserRepository};
use crate::model::{Order, OrderId, Product, ProductId, User, UserId};
use crate::store::{Record, StoreClient, StoreError};
use async_trait::async_trait;
use pipeline_framework::UseCaseError;
use tracing::instrument;

impl Record for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

impl Record for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

impl Record for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

fn lookup_error(entity: &str, error: StoreError) -> UseCaseError {
    match error {
        StoreError::NotFound(id) => UseCaseError::NotFound(format!("{entity} {id}")),
        other => UseCaseError::persistence(other),
    }
}

#[derive(Debug, Clone)]
pub struct StoreUserRepository {
    users: StoreClient<User>,
}

impl StoreUserRepository {
    pub fn new(users: StoreClient<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    #[instrument(skip_all, fields(%id))]
    async fn find(&self, id: UserId) -> Result<User, UseCaseError> {
        self.users.get(id).await.map_err(|e| lookup_error("user", e))
    }
}

#[derive(Debug, Clone)]
pub struct StoreProductRepository {
    products: StoreClient<Product>,
}

impl StoreProductRepository {
    pub fn new(products: StoreClient<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductRepository for StoreProductRepository {
    #[instrument(skip_all, fields(%id))]
    async fn find(&self, id: ProductId) -> Result<Product, UseCaseError> {
        self.products.get(id).await.map_err(|e| lookup_error("product", e))
    }
}

#[derive(Debug, Clone)]
pub struct StoreOrderRepository {
    orders: StoreClient<Order>,
}

impl StoreOrderRepository {
    pub fn new(orders: StoreClient<Order>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    #[instrument(skip_all, fields(order_id = %order.id))]
    async fn create(&self, order: &Order) -> Result<(), UseCaseError> {
        self.orders
            .insert(order.clone())
            .await
            .map(|_| ())
            .map_err(UseCaseError::persistence)
    }
}

use crate::config::AppConfig;
use crate::context::CreateOrderContext;
use crate::domain::CreateOrder;
use crate::hooks::{CommitHook, LoadEntitiesHook, PersistOrderHook, SpanHook, TransactionHook};
use crate::model::{CreateOrderRequest, Order, OrderId, Product, ProductId, User, UserId};
use crate::repository::{
    OrderRepository, ProductRepository, StoreOrderRepository, StoreProductRepository, StoreUserRepository,
    TimedOrderRepository, UserRepository,
};
use crate::store::{StoreActor, StoreClient, StoreError};
use pipeline_framework::{
    PipelineFailure, SpanGuard, Stage, TimeSpanManager, TransactionGuard, TransactionManager, UseCaseError,
    UseCasePipeline,
};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, instrument};

/// The running order service.
///
/// `OrderSystem` owns one store actor per entity type and the shared guard backends. Each call to
/// [`create_order`](Self::create_order) builds its own guards and its own pipeline, so concurrent
/// invocations never share transaction or span state; only the backends are shared.
///
/// # Example
///
/// ```ignore
/// let system = OrderSystem::new(AppConfig::default(), transactions, spans);
///
/// let user_id = system.register_user(User::new("alice", 100)).await?;
/// let product_id = system.register_product(Product::new("book", 80)).await?;
/// let order = system.create_order(CreateOrderRequest::new(user_id, product_id)).await?;
///
/// system.shutdown().await?;
/// ```
pub struct OrderSystem {
    config: AppConfig,
    users: StoreClient<User>,
    products: StoreClient<Product>,
    orders: StoreClient<Order>,
    user_repository: Arc<dyn UserRepository>,
    product_repository: Arc<dyn ProductRepository>,
    order_repository: Arc<dyn OrderRepository>,
    transactions: Arc<dyn TransactionManager>,
    spans: Arc<dyn TimeSpanManager>,
    handles: Vec<JoinHandle<()>>,
}

impl OrderSystem {
    /// Spawns the store actors. Must be called from within a Tokio runtime.
    pub fn new(config: AppConfig, transactions: Arc<dyn TransactionManager>, spans: Arc<dyn TimeSpanManager>) -> Self {
        let (user_actor, users) = StoreActor::<User>::new(config.store_buffer);
        let (product_actor, products) = StoreActor::<Product>::new(config.store_buffer);
        let (order_actor, orders) = StoreActor::<Order>::new(config.store_buffer);

        let handles = vec![
            tokio::spawn(user_actor.run()),
            tokio::spawn(product_actor.run()),
            tokio::spawn(order_actor.run()),
        ];

        let order_repository = TimedOrderRepository::new(StoreOrderRepository::new(orders.clone()), spans.clone());

        info!(span_label = %config.span_label, store_buffer = config.store_buffer, "Order system started");
        Self {
            user_repository: Arc::new(StoreUserRepository::new(users.clone())),
            product_repository: Arc::new(StoreProductRepository::new(products.clone())),
            order_repository: Arc::new(order_repository),
            config,
            users,
            products,
            orders,
            transactions,
            spans,
            handles,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn register_user(&self, user: User) -> Result<UserId, StoreError> {
        self.users.insert(user).await
    }

    pub async fn register_product(&self, product: Product) -> Result<ProductId, StoreError> {
        self.products.insert(product).await
    }

    pub async fn find_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.orders.find(id).await
    }

    pub async fn order_count(&self) -> Result<usize, StoreError> {
        self.orders.count().await
    }

    /// Runs the create-order use case once.
    ///
    /// # Errors
    /// The [`PipelineFailure`] of the invocation: a validation error for insufficient funds,
    /// not-found for a missing user or product, and persistence or guard errors from the
    /// backends. Cleanup has completed by the time this returns.
    #[instrument(skip_all, fields(user_id = %request.user_id, product_id = %request.product_id))]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, PipelineFailure> {
        let pipeline = self.pipeline();
        let ctx = pipeline.execute(CreateOrderContext::new(request)).await?;

        match ctx.into_result() {
            Some(order) => {
                info!(order_id = %order.id, "Order created");
                Ok(order)
            }
            None => {
                error!("Pipeline succeeded without producing an order");
                Err(PipelineFailure::new(
                    UseCaseError::InvariantViolation("no order produced".into()),
                    Stage::Done,
                ))
            }
        }
    }

    fn pipeline(&self) -> UseCasePipeline<CreateOrderContext> {
        let span = Arc::new(SpanGuard::span(self.spans.clone()));
        let tx = Arc::new(TransactionGuard::transaction(self.transactions.clone()));

        UseCasePipeline::builder("create order", CreateOrder)
            .hook(SpanHook::new(span.clone(), self.config.span_label.clone()))
            .hook(TransactionHook::new(tx.clone()))
            .hook(LoadEntitiesHook::new(
                self.user_repository.clone(),
                self.product_repository.clone(),
                span.clone(),
            ))
            .hook(PersistOrderHook::new(self.order_repository.clone()))
            .hook(CommitHook::new(tx.clone()))
            .watch(span)
            .watch(tx)
            .build()
    }

    /// Closes every store channel and waits for the actors to finish.
    ///
    /// # Errors
    /// The first actor task that panicked or was cancelled.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!("Shutting down order system");
        let Self {
            users,
            products,
            orders,
            user_repository,
            product_repository,
            order_repository,
            handles,
            ..
        } = self;
        drop((users, products, orders));
        drop((user_repository, product_repository, order_repository));

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Store actor failed");
                return Err(e);
            }
        }
        info!("Order system shutdown complete");
        Ok(())
    }
}

//! # Create-Order Hooks
//!
//! The cross-cutting steps around [`CreateOrder`](crate::domain::CreateOrder), in the order
//! [`OrderSystem`](crate::lifecycle::OrderSystem) registers them:
//!
//! | # | Hook | on_start | on_end | on_finally |
//! |---|------|----------|--------|------------|
//! | 1 | [`SpanHook`] | start span | | stop if active |
//! | 2 | [`TransactionHook`] | begin | | rollback if active |
//! | 3 | [`LoadEntitiesHook`] | load user, then product | | |
//! | 4 | [`PersistOrderHook`] | | write the order | |
//! | 5 | [`CommitHook`] | | commit | |
//!
//! Lookups and the order write run inside the transaction; the commit is the last `on_end` step.
//! Finally-phase hooks run in registration order, so the span is stopped before the transaction
//! is rolled back. Each release is independent of the other.

use crate::context::CreateOrderContext;
use crate::repository::{OrderRepository, ProductRepository, UserRepository};
use async_trait::async_trait;
use pipeline_framework::{Hook, SpanGuard, TransactionGuard, UseCaseError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Opens the invocation's time span and closes it on every exit path.
pub struct SpanHook {
    span: Arc<SpanGuard>,
    label: String,
}

impl SpanHook {
    pub fn new(span: Arc<SpanGuard>, label: impl Into<String>) -> Self {
        Self {
            span,
            label: label.into(),
        }
    }
}

#[async_trait]
impl Hook<CreateOrderContext> for SpanHook {
    async fn on_start(&self, _ctx: &mut CreateOrderContext) -> Result<(), UseCaseError> {
        self.span.start(&self.label)?;
        Ok(())
    }

    async fn on_finally(&self, _ctx: &mut CreateOrderContext) -> Result<(), UseCaseError> {
        self.span.release_if_active()?;
        Ok(())
    }
}

/// Begins the transaction and rolls it back if nothing committed it.
pub struct TransactionHook {
    tx: Arc<TransactionGuard>,
}

impl TransactionHook {
    pub fn new(tx: Arc<TransactionGuard>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Hook<CreateOrderContext> for TransactionHook {
    async fn on_start(&self, _ctx: &mut CreateOrderContext) -> Result<(), UseCaseError> {
        self.tx.begin()?;
        Ok(())
    }

    async fn on_finally(&self, _ctx: &mut CreateOrderContext) -> Result<(), UseCaseError> {
        if self.tx.release_if_active()? {
            debug!("Transaction rolled back");
        }
        Ok(())
    }
}

/// Fetches the requested user and product into the context.
pub struct LoadEntitiesHook {
    users: Arc<dyn UserRepository>,
    products: Arc<dyn ProductRepository>,
    span: Arc<SpanGuard>,
}

impl LoadEntitiesHook {
    /// `span` is annotated after each lookup when it is open.
    pub fn new(users: Arc<dyn UserRepository>, products: Arc<dyn ProductRepository>, span: Arc<SpanGuard>) -> Self {
        Self { users, products, span }
    }

    fn annotate(&self, event: &str) {
        if !self.span.is_active() {
            return;
        }
        if let Err(e) = self.span.add_event(event) {
            warn!(error = %e, "Span event dropped");
        }
    }
}

#[async_trait]
impl Hook<CreateOrderContext> for LoadEntitiesHook {
    async fn on_start(&self, ctx: &mut CreateOrderContext) -> Result<(), UseCaseError> {
        let request = *ctx.request();

        let user = self.users.find(request.user_id).await?;
        self.annotate(&format!("user {} loaded", user.id));
        ctx.set_user(user)?;

        let product = self.products.find(request.product_id).await?;
        self.annotate(&format!("product {} loaded", product.id));
        ctx.set_product(product)
    }
}

/// Writes the produced order.
pub struct PersistOrderHook {
    orders: Arc<dyn OrderRepository>,
}

impl PersistOrderHook {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl Hook<CreateOrderContext> for PersistOrderHook {
    async fn on_end(&self, ctx: &mut CreateOrderContext) -> Result<(), UseCaseError> {
        let order = ctx
            .result()
            .ok_or_else(|| UseCaseError::InvariantViolation("no order to persist".into()))?;
        self.orders.create(order).await
    }
}

/// Commits the transaction once everything before it in `on_end` succeeded.
pub struct CommitHook {
    tx: Arc<TransactionGuard>,
}

impl CommitHook {
    pub fn new(tx: Arc<TransactionGuard>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Hook<CreateOrderContext> for CommitHook {
    async fn on_end(&self, _ctx: &mut CreateOrderContext) -> Result<(), UseCaseError> {
        Ok(self.tx.commit()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreateOrderRequest, Order, Product, ProductId, User, UserId};
    use pipeline_framework::mock::{BackendEvent, EventLog, RecordingSpanManager, RecordingTransactionManager};
    use std::sync::Mutex;

    struct OneUser(User);

    #[async_trait]
    impl UserRepository for OneUser {
        async fn find(&self, id: UserId) -> Result<User, UseCaseError> {
            if id == self.0.id {
                Ok(self.0.clone())
            } else {
                Err(UseCaseError::NotFound(format!("user {id}")))
            }
        }
    }

    struct OneProduct(Product);

    #[async_trait]
    impl ProductRepository for OneProduct {
        async fn find(&self, id: ProductId) -> Result<Product, UseCaseError> {
            if id == self.0.id {
                Ok(self.0.clone())
            } else {
                Err(UseCaseError::NotFound(format!("product {id}")))
            }
        }
    }

    #[derive(Default)]
    struct Collecting(Mutex<Vec<Order>>);

    #[async_trait]
    impl OrderRepository for Collecting {
        async fn create(&self, order: &Order) -> Result<(), UseCaseError> {
            self.0.lock().unwrap().push(order.clone());
            Ok(())
        }
    }

    fn span_guard(log: &EventLog) -> Arc<SpanGuard> {
        Arc::new(SpanGuard::span(Arc::new(RecordingSpanManager::new(log.clone()))))
    }

    #[tokio::test]
    async fn test_load_entities_fills_context_and_annotates_span() {
        let log = EventLog::new();
        let span = span_guard(&log);
        let user = User::new("alice", 100);
        let product = Product::new("book", 80);
        let hook = LoadEntitiesHook::new(
            Arc::new(OneUser(user.clone())),
            Arc::new(OneProduct(product.clone())),
            span.clone(),
        );

        span.start("create order").unwrap();
        let mut ctx = CreateOrderContext::new(CreateOrderRequest::new(user.id, product.id));
        hook.on_start(&mut ctx).await.unwrap();

        assert_eq!(ctx.user(), Some(&user));
        assert_eq!(ctx.product(), Some(&product));
        assert_eq!(log.count(|e| matches!(e, BackendEvent::SpanEvent(..))), 2);
        span.stop().unwrap();
    }

    #[tokio::test]
    async fn test_load_entities_stops_at_missing_user() {
        let log = EventLog::new();
        let product = Product::new("book", 80);
        let hook = LoadEntitiesHook::new(
            Arc::new(OneUser(User::new("alice", 100))),
            Arc::new(OneProduct(product.clone())),
            span_guard(&log),
        );

        let mut ctx = CreateOrderContext::new(CreateOrderRequest::new(UserId::new(), product.id));
        let err = hook.on_start(&mut ctx).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(ctx.user().is_none() && ctx.product().is_none());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_persist_without_result_is_a_defect() {
        let orders = Arc::new(Collecting::default());
        let hook = PersistOrderHook::new(orders.clone());
        let mut ctx = CreateOrderContext::new(CreateOrderRequest::new(UserId::new(), ProductId::new()));

        assert!(hook.on_end(&mut ctx).await.unwrap_err().is_invariant_violation());
        assert!(orders.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transaction_and_commit_hooks_share_one_guard() {
        let log = EventLog::new();
        let tx = Arc::new(TransactionGuard::transaction(Arc::new(RecordingTransactionManager::new(log.clone()))));
        let begin = TransactionHook::new(tx.clone());
        let commit = CommitHook::new(tx.clone());
        let mut ctx = CreateOrderContext::new(CreateOrderRequest::new(UserId::new(), ProductId::new()));

        begin.on_start(&mut ctx).await.unwrap();
        commit.on_end(&mut ctx).await.unwrap();
        begin.on_finally(&mut ctx).await.unwrap();

        let events = log.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], BackendEvent::Commit(_)));
        assert!(!tx.is_active());
    }
}

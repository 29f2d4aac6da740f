use order_pipeline::backends::{LoggingTransactionManager, TracingSpanManager};
use order_pipeline::config::AppConfig;
use order_pipeline::domain::OrderError;
use order_pipeline::lifecycle::OrderSystem;
use order_pipeline::model::{CreateOrderRequest, Product, ProductId, User, UserId};
use pipeline_framework::mock::{BackendEvent, BackendOp, EventLog, RecordingSpanManager, RecordingTransactionManager};
use pipeline_framework::{GuardError, Stage, UseCaseError};
use std::sync::Arc;

// --- Fixture ---

struct Harness {
    system: OrderSystem,
    log: EventLog,
    transactions: Arc<RecordingTransactionManager>,
    spans: Arc<RecordingSpanManager>,
}

impl Harness {
    fn new() -> Self {
        let log = EventLog::new();
        let transactions = Arc::new(RecordingTransactionManager::new(log.clone()));
        let spans = Arc::new(RecordingSpanManager::new(log.clone()));
        let system = OrderSystem::new(AppConfig::default(), transactions.clone(), spans.clone());
        Self {
            system,
            log,
            transactions,
            spans,
        }
    }

    async fn seed(&self, balance: u64, price: u64) -> (UserId, ProductId) {
        let user = self.system.register_user(User::new("alice", balance)).await.unwrap();
        let product = self.system.register_product(Product::new("book", price)).await.unwrap();
        (user, product)
    }

    fn count(&self, predicate: impl Fn(&BackendEvent) -> bool) -> usize {
        self.log.count(predicate)
    }

    fn commits(&self) -> usize {
        self.count(|e| matches!(e, BackendEvent::Commit(_)))
    }

    fn rollbacks(&self) -> usize {
        self.count(|e| matches!(e, BackendEvent::Rollback(_)))
    }

    /// Every started span has been stopped.
    fn spans_balanced(&self) -> bool {
        self.count(|e| matches!(e, BackendEvent::SpanStart(..))) == self.count(|e| matches!(e, BackendEvent::SpanStop(_)))
    }
}

// --- Scenarios ---

#[tokio::test]
async fn test_affordable_order_is_created_and_committed() {
    let h = Harness::new();
    let (user_id, product_id) = h.seed(100, 80).await;

    let order = h.system.create_order(CreateOrderRequest::new(user_id, product_id)).await.unwrap();
    assert_eq!(order.user_id, user_id);
    assert_eq!(order.product_id, product_id);
    assert_eq!(h.system.find_order(order.id).await.unwrap(), Some(order));

    assert_eq!(h.count(|e| matches!(e, BackendEvent::Begin(_))), 1);
    assert_eq!(h.commits(), 1);
    assert_eq!(h.rollbacks(), 0);
    assert!(h.spans_balanced());

    // The outer span opens first and closes last; the commit precedes it.
    let events = h.log.events();
    assert!(matches!(&events[0], BackendEvent::SpanStart(_, label) if label == "create order"));
    assert!(matches!(events[events.len() - 2], BackendEvent::Commit(_)));
    assert!(matches!(events[events.len() - 1], BackendEvent::SpanStop(_)));
}

#[tokio::test]
async fn test_order_write_gets_its_own_span_inside_the_transaction() {
    let h = Harness::new();
    let (user_id, product_id) = h.seed(100, 80).await;

    let order = h.system.create_order(CreateOrderRequest::new(user_id, product_id)).await.unwrap();

    let events = h.log.events();
    let insert = events
        .iter()
        .position(|e| matches!(e, BackendEvent::SpanStart(_, label) if label == "insert order"))
        .unwrap();
    let begin = events.iter().position(|e| matches!(e, BackendEvent::Begin(_))).unwrap();
    let commit = events.iter().position(|e| matches!(e, BackendEvent::Commit(_))).unwrap();
    assert!(begin < insert && insert < commit);
    assert!(matches!(&events[insert + 1], BackendEvent::SpanEvent(_, text) if text.contains(&order.id.to_string())));
}

#[tokio::test]
async fn test_insufficient_funds_rolls_back_without_order() {
    let h = Harness::new();
    let (user_id, product_id) = h.seed(50, 80).await;

    let failure = h.system.create_order(CreateOrderRequest::new(user_id, product_id)).await.unwrap_err();
    assert_eq!(failure.stage(), Stage::DomainFailed);
    assert_eq!(
        failure.error().downcast_source::<OrderError>(),
        Some(&OrderError::InsufficientFunds { balance: 50, price: 80 })
    );
    assert!(failure.suppressed().is_empty());

    assert_eq!(h.commits(), 0);
    assert_eq!(h.rollbacks(), 1);
    assert!(h.spans_balanced());
    assert_eq!(h.system.order_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_product_propagates_not_found() {
    let h = Harness::new();
    let (user_id, _) = h.seed(100, 80).await;
    let missing = ProductId::new();

    let failure = h.system.create_order(CreateOrderRequest::new(user_id, missing)).await.unwrap_err();
    assert_eq!(failure.stage(), Stage::StartFailed);
    assert!(matches!(failure.error(), UseCaseError::NotFound(what) if what == &format!("product {missing}")));

    assert_eq!(h.commits(), 0);
    assert_eq!(h.rollbacks(), 1);
    assert!(h.spans_balanced());
    assert_eq!(h.system.order_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_user_skips_product_lookup() {
    let h = Harness::new();
    let (_, product_id) = h.seed(100, 80).await;

    let failure = h.system.create_order(CreateOrderRequest::new(UserId::new(), product_id)).await.unwrap_err();
    assert!(failure.error().is_not_found());
    assert_eq!(h.count(|e| matches!(e, BackendEvent::SpanEvent(..))), 0);
    assert!(h.spans_balanced());
}

#[tokio::test]
async fn test_begin_failure_never_reaches_repositories() {
    let h = Harness::new();
    let (user_id, product_id) = h.seed(100, 80).await;
    h.transactions.fail_on(BackendOp::Begin);

    let failure = h.system.create_order(CreateOrderRequest::new(user_id, product_id)).await.unwrap_err();
    assert!(matches!(
        failure.error(),
        UseCaseError::Guard(GuardError::Backend { operation: "begin", .. })
    ));
    assert_eq!(h.count(|e| matches!(e, BackendEvent::SpanEvent(..))), 0);
    assert_eq!(h.rollbacks(), 0);
    assert!(h.spans_balanced());
}

#[tokio::test]
async fn test_span_stop_failure_is_suppressed_behind_validation_error() {
    let h = Harness::new();
    let (user_id, product_id) = h.seed(50, 80).await;
    h.spans.fail_on(BackendOp::StopSpan);

    let failure = h.system.create_order(CreateOrderRequest::new(user_id, product_id)).await.unwrap_err();
    assert!(failure.error().is_validation());
    assert_eq!(failure.suppressed().len(), 1);

    // The rollback still ran after the span hook failed.
    assert_eq!(h.rollbacks(), 1);
}

#[tokio::test]
async fn test_commit_failure_rolls_back_in_cleanup() {
    let h = Harness::new();
    let (user_id, product_id) = h.seed(100, 80).await;
    h.transactions.fail_on(BackendOp::Commit);

    let failure = h.system.create_order(CreateOrderRequest::new(user_id, product_id)).await.unwrap_err();
    assert_eq!(failure.stage(), Stage::EndFailed);
    assert_eq!(h.commits(), 0);
    assert_eq!(h.rollbacks(), 1);
    assert!(h.spans_balanced());
}

#[tokio::test]
async fn test_concurrent_orders_use_separate_transactions() {
    let h = Harness::new();
    let (rich, product_id) = h.seed(100, 80).await;
    let poor = h.system.register_user(User::new("bob", 10)).await.unwrap();
    let system = Arc::new(h.system);

    let mut handles = Vec::new();
    for i in 0..16 {
        let system = system.clone();
        let user_id = if i % 2 == 0 { rich } else { poor };
        handles.push(tokio::spawn(async move {
            system.create_order(CreateOrderRequest::new(user_id, product_id)).await.is_ok()
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap() {
            created += 1;
        }
    }

    assert_eq!(created, 8);
    assert_eq!(system.order_count().await.unwrap(), 8);
    assert_eq!(h.log.count(|e| matches!(e, BackendEvent::Commit(_))), 8);
    assert_eq!(h.log.count(|e| matches!(e, BackendEvent::Rollback(_))), 8);
}

#[tokio::test]
async fn test_production_backends_end_balanced() {
    let transactions = Arc::new(LoggingTransactionManager::new());
    let spans = Arc::new(TracingSpanManager::new());
    let config = AppConfig::default().with_span_label("checkout").with_store_buffer(4);
    let system = OrderSystem::new(config, transactions.clone(), spans.clone());

    let alice = system.register_user(User::new("alice", 100)).await.unwrap();
    let bob = system.register_user(User::new("bob", 50)).await.unwrap();
    let book = system.register_product(Product::new("book", 80)).await.unwrap();

    assert!(system.create_order(CreateOrderRequest::new(alice, book)).await.is_ok());
    assert!(system.create_order(CreateOrderRequest::new(bob, book)).await.is_err());

    assert_eq!(transactions.committed_count(), 1);
    assert_eq!(transactions.rolled_back_count(), 1);
    assert_eq!(transactions.open_count(), 0);
    assert_eq!(spans.open_count(), 0);

    system.shutdown().await.unwrap();
}

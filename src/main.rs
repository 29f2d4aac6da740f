use order_pipeline::backends::{LoggingTransactionManager, TracingSpanManager};
use order_pipeline::config::AppConfig;
use order_pipeline::lifecycle::OrderSystem;
use order_pipeline::model::{CreateOrderRequest, Product, User};
use pipeline_framework::tracing::setup_tracing_with_default;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    setup_tracing_with_default(&config.log_filter);

    let transactions = Arc::new(LoggingTransactionManager::new());
    let spans = Arc::new(TracingSpanManager::new());
    let system = OrderSystem::new(config, transactions.clone(), spans.clone());

    let alice = system.register_user(User::new("alice", 100)).await?;
    let bob = system.register_user(User::new("bob", 50)).await?;
    let book = system.register_product(Product::new("book", 80)).await?;

    let order = system.create_order(CreateOrderRequest::new(alice, book)).await?;
    info!(order_id = %order.id, "alice bought a book");

    match system.create_order(CreateOrderRequest::new(bob, book)).await {
        Ok(order) => info!(order_id = %order.id, "bob bought a book"),
        Err(failure) => warn!(error = %failure.error(), stage = %failure.stage(), "bob's order rejected"),
    }

    info!(
        orders = system.order_count().await?,
        committed = transactions.committed_count(),
        rolled_back = transactions.rolled_back_count(),
        open_spans = spans.open_count(),
        "Done"
    );

    system.shutdown().await?;
    Ok(())
}

//! Order writes wrapped in their own time span.

use super::OrderRepository;
use crate::model::Order;
use async_trait::async_trait;
use pipeline_framework::{SpanGuard, TimeSpanManager, UseCaseError};
use std::sync::Arc;
use tracing::warn;

/// Decorates an [`OrderRepository`] so every `create` is timed by a dedicated span.
///
/// The span is opened before the write, annotated with the row about to be inserted, and stopped
/// on every exit path. If the call is cancelled mid-write, dropping the guard stops the span.
pub struct TimedOrderRepository<R> {
    inner: R,
    spans: Arc<dyn TimeSpanManager>,
    label: String,
}

impl<R: OrderRepository> TimedOrderRepository<R> {
    pub fn new(inner: R, spans: Arc<dyn TimeSpanManager>) -> Self {
        Self {
            inner,
            spans,
            label: "insert order".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[async_trait]
impl<R: OrderRepository> OrderRepository for TimedOrderRepository<R> {
    async fn create(&self, order: &Order) -> Result<(), UseCaseError> {
        let span = SpanGuard::span(self.spans.clone());
        span.start(&self.label)?;

        let event = format!(
            "insert order id={} user_id={} product_id={}",
            order.id, order.user_id, order.product_id
        );
        // An annotation is not worth failing the write over.
        if let Err(e) = span.add_event(&event) {
            warn!(error = %e, "Span event dropped");
        }

        let written = self.inner.create(order).await;
        let stopped = span.stop();
        written?;
        Ok(stopped?)
    }
}

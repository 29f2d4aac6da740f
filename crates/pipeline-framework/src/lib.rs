//! # Pipeline Framework
//!
//! Building blocks for running a business use case with guaranteed cleanup.
//!
//! A use case is a pure [`DomainOperation`] wrapped in an ordered [`HookChain`]. Hooks fetch
//! inputs, acquire resources, persist results, and release whatever is still held. The
//! [`UseCasePipeline`] drives one invocation through the phases and promises two things:
//!
//! - `on_finally` runs exactly once on every exit path.
//! - The primary error is never masked by a failure during cleanup.
//!
//! ## Architecture Overview
//!
//! 1. **Guards** ([`guard`]): stateful handles over external resources (transactions, spans)
//! 2. **Hooks** ([`hook`]): lifecycle observers that drive the guards
//! 3. **Pipeline** ([`pipeline`]): phase ordering, error combination, leak detection
//!
//! ## Quick Start
//!
//! ```rust
//! use pipeline_framework::mock::{EventLog, RecordingTransactionManager};
//! use pipeline_framework::{Hook, TransactionGuard, UseCaseError, UseCasePipeline};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Transactional(Arc<TransactionGuard>);
//!
//! #[async_trait]
//! impl Hook<u32> for Transactional {
//!     async fn on_start(&self, _ctx: &mut u32) -> Result<(), UseCaseError> {
//!         self.0.begin()?;
//!         Ok(())
//!     }
//!     async fn on_end(&self, _ctx: &mut u32) -> Result<(), UseCaseError> {
//!         Ok(self.0.commit()?)
//!     }
//!     async fn on_finally(&self, _ctx: &mut u32) -> Result<(), UseCaseError> {
//!         self.0.release_if_active()?;
//!         Ok(())
//!     }
//! }
//!
//! fn double(n: &mut u32) -> Result<(), UseCaseError> {
//!     *n *= 2;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let log = EventLog::new();
//!     let tx = Arc::new(TransactionGuard::transaction(Arc::new(RecordingTransactionManager::new(log.clone()))));
//!
//!     let pipeline = UseCasePipeline::<u32>::builder("double", double)
//!         .hook(Transactional(tx.clone()))
//!         .watch(tx)
//!         .build();
//!
//!     assert_eq!(pipeline.execute(21).await.unwrap(), 42);
//!     assert_eq!(log.len(), 2);
//! }
//! ```

pub mod error;
pub mod guard;
pub mod hook;
pub mod mock;
pub mod operation;
pub mod pipeline;
pub mod tracing;

pub use error::{BoxError, GuardError, UseCaseError};
pub use guard::{
    Guard, GuardState, GuardedResource, ResourceGuard, SpanGuard, SpanId, Spans, TimeSpanManager,
    TransactionGuard, TransactionId, TransactionManager, Transactions,
};
pub use hook::{Hook, HookChain, Phase};
pub use operation::DomainOperation;
pub use pipeline::{PipelineBuilder, PipelineFailure, Stage, UseCasePipeline};

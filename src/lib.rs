//! # Order Pipeline
//!
//! > **Create an order if the user can afford the product, with every side effect kept out of
//! > the business rule.**
//!
//! The rule itself, [`CreateOrder`](domain::CreateOrder), is a synchronous function over a
//! [`CreateOrderContext`](context::CreateOrderContext). Everything else (loading entities,
//! persisting the order, transaction boundaries, timing spans) is a hook run by a
//! [`UseCasePipeline`](pipeline_framework::UseCasePipeline) from the `pipeline-framework` crate.
//!
//! ## Request Flow
//!
//! ```text
//! OrderSystem::create_order(request)
//!   └─ UseCasePipeline::execute(ctx)
//!        ├─ on_start   SpanHook → TransactionHook → LoadEntitiesHook
//!        ├─ domain     CreateOrder
//!        ├─ on_end     PersistOrderHook → CommitHook
//!        └─ on_finally SpanHook (stop) → TransactionHook (rollback), always
//! ```
//!
//! ## Module Tour
//!
//! - [`model`]: users, products, orders, and their ids
//! - [`context`]: the write-once per-invocation state
//! - [`domain`]: the affordability rule and its errors
//! - [`hooks`]: the cross-cutting steps
//! - [`repository`]: lookup/write traits, store-backed implementations, timed decorator
//! - [`store`]: the in-memory store actor behind the repositories
//! - [`backends`]: transaction and span backends for the running service
//! - [`lifecycle`]: [`OrderSystem`](lifecycle::OrderSystem), the wiring and shutdown
//! - [`config`]: environment configuration

pub mod backends;
pub mod config;
pub mod context;
pub mod domain;
pub mod hooks;
pub mod lifecycle;
pub mod model;
pub mod repository;
pub mod store;

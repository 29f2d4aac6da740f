//! The pure business step at the center of a pipeline.

use crate::error::UseCaseError;

/// A synchronous, I/O-free business step.
///
/// It reads what the start hooks placed in the context and writes its result back. Fetching
/// inputs and persisting outputs belong to hooks, never to the operation.
pub trait DomainOperation<C>: Send + Sync {
    /// Name used in logs. Defaults to the type name without its module path.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn run(&self, ctx: &mut C) -> Result<(), UseCaseError>;
}

impl<C, F> DomainOperation<C> for F
where
    F: Fn(&mut C) -> Result<(), UseCaseError> + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn run(&self, ctx: &mut C) -> Result<(), UseCaseError> {
        self(ctx)
    }
}

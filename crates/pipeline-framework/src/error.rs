//! # Framework Errors
//!
//! The error taxonomy shared by every use case built on the pipeline. Hooks, domain
//! operations, and guards all report through [`UseCaseError`], so the pipeline can order,
//! record, and surface failures without knowing which collaborator produced them.

use std::error::Error as StdError;

/// Boxed source error carried by the open-ended variants.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failures raised by a [`ResourceGuard`](crate::guard::ResourceGuard) or its backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// `begin`/`start` was called on a guard that already holds a resource.
    #[error("{kind} guard is already active")]
    AlreadyActive { kind: &'static str },

    /// `commit`/`rollback`/`stop` was called on a guard that holds nothing.
    #[error("{kind} guard is not active")]
    NotActive { kind: &'static str },

    /// The backend refused the operation.
    #[error("{kind} {operation} failed: {message}")]
    Backend {
        kind: &'static str,
        operation: &'static str,
        message: String,
    },
}

impl GuardError {
    /// Shorthand for a backend failure.
    pub fn backend(kind: &'static str, operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            kind,
            operation,
            message: message.into(),
        }
    }
}

/// Errors that can end a use-case invocation.
///
/// # Design Note: one taxonomy for every phase
///
/// The variants follow what went wrong, not where: a lookup failing inside a start hook and a
/// lookup failing inside the domain operation are both [`UseCaseError::NotFound`]. The phase is
/// recorded separately on [`PipelineFailure`](crate::pipeline::PipelineFailure).
#[derive(Debug, thiserror::Error)]
pub enum UseCaseError {
    /// An expected, user-facing rejection (e.g. insufficient funds).
    #[error("Validation failed: {0}")]
    Validation(#[source] BoxError),

    /// A referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A repository write failed. Never retried by the pipeline.
    #[error("Persistence failed: {0}")]
    Persistence(#[source] BoxError),

    /// A guard lifecycle call failed.
    #[error("Guard error: {0}")]
    Guard(#[from] GuardError),

    /// A defect in a hook or operation, such as a guard left active after cleanup.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl UseCaseError {
    /// Wraps a domain rejection.
    pub fn validation(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Validation(Box::new(error))
    }

    /// Wraps a repository write failure.
    pub fn persistence(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Persistence(Box::new(error))
    }

    /// Returns `true` for [`UseCaseError::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` for [`UseCaseError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` for [`UseCaseError::InvariantViolation`].
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }

    /// Attempts to view the wrapped validation or persistence source as `E`.
    pub fn downcast_source<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Validation(source) | Self::Persistence(source) => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("balance too low")]
    struct Broke;

    #[test]
    fn test_validation_keeps_source() {
        let err = UseCaseError::validation(Broke);
        assert!(err.is_validation());
        assert!(err.downcast_source::<Broke>().is_some());
        assert_eq!(err.to_string(), "Validation failed: balance too low");
    }

    #[test]
    fn test_guard_error_converts() {
        let err: UseCaseError = GuardError::NotActive { kind: "transaction" }.into();
        assert!(matches!(err, UseCaseError::Guard(GuardError::NotActive { .. })));
        assert_eq!(err.to_string(), "Guard error: transaction guard is not active");
    }
}

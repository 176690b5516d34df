use courseplan_core::{PlanId, SchemaViolations, Violation};
use thiserror::Error;

/// Why a request was turned away before or instead of a write.
///
/// Rejections are ordinary results, not faults: each maps directly to a
/// client-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The record failed structural validation.
    #[error("{0}")]
    Input(SchemaViolations),
    /// The first business rule the request broke.
    #[error("{0}")]
    Constraint(Violation),
    #[error("Plan {0} not found.")]
    NotFound(PlanId),
}

impl Rejection {
    /// Stable machine-readable tag.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Input(_) => "invalid_input",
            Rejection::Constraint(violation) => violation.code(),
            Rejection::NotFound(_) => "not_found",
        }
    }
}

/// Result of a request that reached the rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Accepted(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }

    pub fn accepted(self) -> Option<T> {
        match self {
            Outcome::Accepted(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Accepted(_) => None,
            Outcome::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Accepted(value) => Outcome::Accepted(f(value)),
            Outcome::Rejected(rejection) => Outcome::Rejected(rejection),
        }
    }
}

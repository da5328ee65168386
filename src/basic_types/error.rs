//! Error and warning taxonomy surfaced across the context/solve API boundary.

use thiserror::Error;

use crate::basic_types::Literal;

/// Errors raised by the problem-submission and solve APIs.
///
/// This mirrors the four coarse kinds surfaced through the client-facing boundary: a logic
/// error signals client misuse (e.g. adding constraints while frozen), a runtime error signals
/// a failure detected while running the search, `BadAlloc` signals resource exhaustion that
/// survived an emergency learnt-database reduction, and `Unknown` is the catch-all for anything
/// that doesn't fit the other three.
#[derive(Error, Debug)]
pub enum ClaspError {
    /// The client called an operation in an invalid state, e.g. adding a constraint after
    /// [`endInit`](crate::engine::shared_context::SharedContext::end_init) without an
    /// intervening [`unfreeze`](crate::engine::shared_context::SharedContext::unfreeze).
    #[error("logic error: {0}")]
    Logic(String),

    /// A failure detected while running the search itself.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Resource exhaustion that persisted even after forcing an emergency reduction.
    #[error("allocation failure: {0}")]
    BadAlloc(String),

    /// A client-supplied propagator callback raised an error.
    #[error("propagator callback error: {0}")]
    PropagatorCallback(String),

    /// Anything not covered by the other variants.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl ClaspError {
    pub fn logic(message: impl Into<String>) -> Self {
        ClaspError::Logic(message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        ClaspError::Runtime(message.into())
    }
}

/// Non-fatal conditions reported alongside a successful operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClaspWarning {
    OperationUndefined,
    AtomUndefined,
    FileIncluded,
    VariableUnbounded,
    GlobalVariable,
    Other,
}

/// Failure to add or remove a constraint outside of a conflict, e.g. because it is already
/// trivially violated by the current root-level assignment.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConstraintOperationError {
    #[error("the constraint is trivially unsatisfiable at the root level")]
    InfeasibleRoot,
    #[error("literal {0:?} is already assigned to the opposite value at the root level")]
    InfeasibleLiteral(Literal),
    #[error("the context is frozen and not accepting problem constraints")]
    ContextFrozen,
}

pub type Result<T> = std::result::Result<T, ClaspError>;

//! Core reasoning engine of a conflict-driven answer-set / SAT / PB solver.
//!
//! This crate implements the shared problem context, the per-solver CDCL search loop with its
//! auxiliary data structures (watch lists, short-clause implication graph, assignment trail,
//! learnt-database management), the unfounded-set checker that enforces stable-model semantics
//! for recursive logic programs, and the external propagator interface through which a client
//! theory participates in propagation and model checking.
//!
//! Out of scope: the logic-program front-end (rule simplification, equivalence preprocessing,
//! grounding into aspif), wire-format parsers, the command-line driver and the optimisation
//! facade — those consume this crate through [`SharedContext`] and [`Solver`].

pub(crate) mod asserts;
pub(crate) mod basic_types;
pub(crate) mod engine;

pub use basic_types::ClaspError;
pub use basic_types::ClaspWarning;
pub use basic_types::ConstraintOperationError;
pub use basic_types::Literal;
pub use basic_types::Result;
pub use basic_types::Var;
pub use engine::config::Config;
pub use engine::config::ConfigError;
pub use engine::distributor::Distributor;
pub use engine::enumerator::EnumerationMode;
pub use engine::enumerator::Enumerator;
pub use engine::enumerator::Model;
pub use engine::enumerator::OptMode;
pub use engine::post_propagator::PostPropagator;
pub use engine::post_propagator::PropagationResult;
pub use engine::post_propagator::Priority;
pub use engine::propagator_extension::ClauseLifetime;
pub use engine::propagator_extension::PropagatorExtension;
pub use engine::shared_context::ShareMode;
pub use engine::shared_context::SharedContext;
pub use engine::solver::SolveResult;
pub use engine::solver::Solver;
pub use engine::termination::ConflictBudget;
pub use engine::termination::TerminationCondition;
pub use engine::termination::TimeBudget;
pub use engine::unfounded_check::AtomId;
pub use engine::unfounded_check::BodyId;
pub use engine::unfounded_check::PrgDepGraph;
pub use engine::unfounded_check::ReasonStrategy;
pub use engine::unfounded_check::UnfoundedCheck;

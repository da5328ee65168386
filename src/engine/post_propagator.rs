//! The post-propagator chain: auxiliary propagators consulted once binary/ternary
//! and long-clause propagation reach a fixpoint.

use crate::basic_types::Literal;
use crate::engine::assignment::Assignment;
use crate::engine::assignment::Conflict;
use crate::engine::clause_db::ClauseAllocator;
use crate::engine::clause_db::ClausalPropagator;

/// Ascending priority classes; lower values propagate earlier. Reserved slots mirror the
/// fixed priority bands recognised by the chain so unrelated propagators never need to agree on
/// a numeric ordering among themselves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    ClassSimple,
    ClassGeneral,
    ClassUfs,
    ReservedLook,
    ReservedMsg,
    ReservedUfs,
}

/// The outcome of running one post-propagator to its own fixpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropagationResult {
    /// No conflict; the chain may continue to lower-priority propagators.
    NoConflict,
    /// This propagator assigned at least one literal; propagation must restart at step 1
    /// (binary/ternary propagation) before resuming the chain, unless the propagator reports
    /// that it already reached a fixpoint internally.
    Changed { fixpoint_reached: bool },
}

/// One entry in the post-propagator chain.
///
/// Propagators that justify an assignment with a long clause (e.g. the unfounded-set checker's
/// external reason) allocate it through the shared `allocator` so the resulting
/// [`ClauseReference`](crate::basic_types::ClauseReference) stays valid for later conflict
/// analysis instead of pointing into a propagator-private store.
pub trait PostPropagator: std::fmt::Debug {
    fn priority(&self) -> Priority;

    /// Propagates to fixpoint within this propagator's own priority class. Returns `Err` with
    /// the conflicting literal/antecedent pair on conflict. `watches` lets a propagator install
    /// long clauses it needs to stay valid as watched pairs, the same way the core SAT layer
    /// does.
    fn propagate_fixpoint(
        &mut self,
        assignment: &mut Assignment,
        allocator: &mut ClauseAllocator,
        watches: &mut ClausalPropagator,
    ) -> Result<PropagationResult, Conflict>;

    /// Last chance to reject a total assignment, e.g. the unfounded-set checker vetoing a
    /// classically-consistent but unsupported model. Mutable access mirrors `propagate_fixpoint`
    /// since a client propagator may still need to add a clause while explaining the rejection.
    fn is_model(
        &mut self,
        assignment: &mut Assignment,
        allocator: &mut ClauseAllocator,
        watches: &mut ClausalPropagator,
    ) -> Result<(), Conflict>;

    fn reset(&mut self) {}

    /// Notifies the propagator that every literal in `undone` was just retracted down to
    /// `level`, in the order they were originally pushed. `assignment` reflects the
    /// already-undone state.
    fn undo_level(&mut self, level: usize, undone: &[Literal], assignment: &Assignment);
}

/// Runs every propagator in priority order to a joint fixpoint: whenever one propagator makes
/// progress without declaring its own fixpoint reached, the chain restarts from the beginning.
pub fn run_chain(
    chain: &mut [Box<dyn PostPropagator>],
    assignment: &mut Assignment,
    allocator: &mut ClauseAllocator,
    watches: &mut ClausalPropagator,
) -> Result<(), Conflict> {
    chain.sort_by_key(|p| p.priority());
    let mut index = 0;
    while index < chain.len() {
        match chain[index].propagate_fixpoint(assignment, allocator, watches)? {
            PropagationResult::NoConflict => index += 1,
            PropagationResult::Changed { fixpoint_reached } => {
                if fixpoint_reached {
                    index += 1;
                } else {
                    index = 0;
                }
            }
        }
    }
    Ok(())
}

/// Gives every propagator in the chain a last chance to reject a total assignment.
pub fn check_model(
    chain: &mut [Box<dyn PostPropagator>],
    assignment: &mut Assignment,
    allocator: &mut ClauseAllocator,
    watches: &mut ClausalPropagator,
) -> Result<(), Conflict> {
    for propagator in chain.iter_mut() {
        propagator.is_model(assignment, allocator, watches)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Var;
    use crate::engine::assignment::Antecedent;

    #[derive(Debug)]
    struct CountingPropagator {
        priority: Priority,
        remaining_triggers: usize,
        var: Var,
    }

    impl PostPropagator for CountingPropagator {
        fn priority(&self) -> Priority {
            self.priority
        }

        fn propagate_fixpoint(
            &mut self,
            assignment: &mut Assignment,
            _allocator: &mut ClauseAllocator,
            _watches: &mut ClausalPropagator,
        ) -> Result<PropagationResult, Conflict> {
            if self.remaining_triggers == 0 {
                return Ok(PropagationResult::NoConflict);
            }
            self.remaining_triggers -= 1;
            if assignment.is_free(self.var.pos_lit()) {
                assignment.force(self.var.pos_lit(), Antecedent::Decision)?;
                Ok(PropagationResult::Changed {
                    fixpoint_reached: true,
                })
            } else {
                Ok(PropagationResult::NoConflict)
            }
        }

        fn is_model(
            &mut self,
            _assignment: &mut Assignment,
            _allocator: &mut ClauseAllocator,
            _watches: &mut ClausalPropagator,
        ) -> Result<(), Conflict> {
            Ok(())
        }

        fn undo_level(&mut self, _level: usize, _undone: &[Literal], _assignment: &Assignment) {}
    }

    #[test]
    fn chain_runs_in_priority_order() {
        let mut assignment = Assignment::new(2);
        let mut allocator = ClauseAllocator::default();
        let mut watches = ClausalPropagator::new(2);
        let mut chain: Vec<Box<dyn PostPropagator>> = vec![
            Box::new(CountingPropagator {
                priority: Priority::ClassUfs,
                remaining_triggers: 1,
                var: Var::from_index(1),
            }),
            Box::new(CountingPropagator {
                priority: Priority::ClassSimple,
                remaining_triggers: 1,
                var: Var::from_index(0),
            }),
        ];
        run_chain(&mut chain, &mut assignment, &mut allocator, &mut watches).unwrap();
        assert!(assignment.is_true(Var::from_index(0).pos_lit()));
        assert!(assignment.is_true(Var::from_index(1).pos_lit()));
    }
}

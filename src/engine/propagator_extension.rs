//! External theory propagator interface.

use crate::basic_types::Literal;
use crate::engine::assignment::Antecedent;
use crate::engine::assignment::Assignment;
use crate::engine::assignment::Conflict;
use crate::engine::clause_db::ClausalPropagator;
use crate::engine::clause_db::ClauseAllocator;
use crate::engine::post_propagator::PostPropagator;
use crate::engine::post_propagator::PropagationResult;
use crate::engine::post_propagator::Priority;

/// How long a clause added by a propagator callback survives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClauseLifetime {
    /// Subject to the learnt-database reduction policy like any other conflict clause.
    Learnt,
    /// Never deleted.
    Static,
    /// Deleted at the end of the current solving step.
    Volatile,
    /// Kept for the remainder of the current step, then deleted like `Volatile`, but exempt
    /// from reduction while the step is active.
    VolatileStatic,
}

/// Whether `check` should run on every propagation fixpoint or only once the assignment is
/// total.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CheckMode {
    Total,
    Fixpoint,
}

/// Read-only view of the assignment exposed to a propagator's `propagate` callback, plus the
/// ability to add clauses and force literals.
pub trait PropagatorControl {
    fn assignment(&self) -> &Assignment;

    /// Adds a clause with the given lifetime. Returns `false` and stops accepting further
    /// assignments this call if the clause is immediately conflicting: the engine assigns any
    /// implied literal and returns a flag if propagation must stop.
    fn add_clause(&mut self, literals: &[Literal], lifetime: ClauseLifetime) -> bool;
}

/// A literal pushed or popped since the propagator was last consulted, handed to `propagate`
/// and `undo` in trail order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WatchedChange {
    pub literal: Literal,
}

/// A client-supplied theory participating in propagation and model checking.
///
/// Implementors register the literals they want to watch during [`PropagatorExtension::init`]
/// and are notified through `propagate`/`undo` as those literals are assigned and retracted.
pub trait PropagatorExtension {
    /// Selects the check cadence for this propagator. Runs once, during `init`.
    fn check_mode(&self) -> CheckMode;

    /// The solver literals this propagator wants notified on assignment. May add clauses,
    /// internalise further literals and install watches via `control`.
    fn init(&mut self, control: &mut dyn PropagatorControl) -> Result<Vec<Literal>, String>;

    /// Consulted after every propagation fixpoint (or only on total assignments, per
    /// [`check_mode`](Self::check_mode)). `changes` holds every watched literal assigned since
    /// the last call, in trail order.
    fn propagate(&mut self, control: &mut dyn PropagatorControl, changes: &[WatchedChange]) -> Result<(), String>;

    /// Called for exactly the literals pushed since the matching `propagate` call, once they
    /// are retracted by backtracking. Must not propagate.
    fn undo(&mut self, changes: &[WatchedChange]);

    /// Last-chance check on a total assignment; may still add conflicting clauses through
    /// `control`.
    fn check(&mut self, control: &mut dyn PropagatorControl) -> Result<(), String>;
}

/// [`PropagatorControl`] backed by the solver's live assignment/allocator/watches, handed to a
/// [`PropagatorExtension`] for the duration of a single callback.
struct ExtensionControl<'a> {
    assignment: &'a mut Assignment,
    allocator: &'a mut ClauseAllocator,
    watches: &'a mut ClausalPropagator,
    produced_conflict: Option<Conflict>,
}

impl PropagatorControl for ExtensionControl<'_> {
    fn assignment(&self) -> &Assignment {
        self.assignment
    }

    fn add_clause(&mut self, literals: &[Literal], lifetime: ClauseLifetime) -> bool {
        if self.produced_conflict.is_some() {
            return false;
        }
        match literals.len() {
            0 => {
                self.produced_conflict = Some(Conflict {
                    literal: Literal::TRUE,
                    antecedent: Antecedent::Decision,
                });
                false
            }
            1 => match self.assignment.force(literals[0], Antecedent::Decision) {
                Ok(()) => true,
                Err(conflict) => {
                    self.produced_conflict = Some(conflict);
                    false
                }
            },
            _ => {
                let is_learnt = lifetime != ClauseLifetime::Static;
                let reference = self.watches.add_clause(literals.to_vec(), is_learnt, self.allocator);
                let clause_literals = self.allocator.get(reference).literals().to_vec();
                if clause_literals.iter().any(|&l| self.assignment.is_true(l)) {
                    return true;
                }
                let non_false: Vec<Literal> = clause_literals
                    .iter()
                    .copied()
                    .filter(|&l| !self.assignment.is_false(l))
                    .collect();
                match non_false.len() {
                    0 => {
                        self.produced_conflict = Some(Conflict {
                            literal: clause_literals[0],
                            antecedent: Antecedent::Clause(reference),
                        });
                        false
                    }
                    1 => match self.assignment.force(non_false[0], Antecedent::Clause(reference)) {
                        Ok(()) => true,
                        Err(conflict) => {
                            self.produced_conflict = Some(conflict);
                            false
                        }
                    },
                    _ => true,
                }
            }
        }
    }
}

/// Bridges a client [`PropagatorExtension`] into the solver's [`PostPropagator`] chain: tracks
/// which watched literals have newly landed on the trail since the last callback and forwards
/// them, and turns clause additions made through [`PropagatorControl`] into the conflict
/// convention the rest of the solve loop understands.
pub struct PropagatorExtensionAdapter {
    extension: Box<dyn PropagatorExtension>,
    watched: Vec<Literal>,
    check_mode: CheckMode,
    initialised: bool,
    next_trail_index: usize,
}

impl PropagatorExtensionAdapter {
    pub fn new(extension: Box<dyn PropagatorExtension>) -> Self {
        PropagatorExtensionAdapter {
            extension,
            watched: Vec::new(),
            check_mode: CheckMode::Fixpoint,
            initialised: false,
            next_trail_index: 0,
        }
    }

    fn pending_changes(&mut self, assignment: &Assignment) -> Vec<WatchedChange> {
        let changes = (self.next_trail_index..assignment.num_trail_entries())
            .map(|index| assignment.trail_entry(index))
            .filter(|literal| self.watched.iter().any(|&watched| watched.var() == literal.var()))
            .map(|literal| WatchedChange { literal })
            .collect();
        self.next_trail_index = assignment.num_trail_entries();
        changes
    }
}

impl std::fmt::Debug for PropagatorExtensionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagatorExtensionAdapter")
            .field("watched", &self.watched)
            .field("initialised", &self.initialised)
            .finish()
    }
}

impl PostPropagator for PropagatorExtensionAdapter {
    fn priority(&self) -> Priority {
        Priority::ClassGeneral
    }

    fn propagate_fixpoint(
        &mut self,
        assignment: &mut Assignment,
        allocator: &mut ClauseAllocator,
        watches: &mut ClausalPropagator,
    ) -> Result<PropagationResult, Conflict> {
        if !self.initialised {
            let mut control = ExtensionControl {
                assignment,
                allocator,
                watches,
                produced_conflict: None,
            };
            let result = self.extension.init(&mut control);
            if let Some(conflict) = control.produced_conflict {
                return Err(conflict);
            }
            self.watched = result.map_err(|message| {
                log::warn!("propagator extension init failed: {message}");
                Conflict {
                    literal: Literal::TRUE,
                    antecedent: Antecedent::Decision,
                }
            })?;
            self.check_mode = self.extension.check_mode();
            self.initialised = true;
            self.next_trail_index = assignment.num_trail_entries();
        }

        let changes = self.pending_changes(assignment);
        if changes.is_empty() && self.check_mode == CheckMode::Total {
            return Ok(PropagationResult::NoConflict);
        }

        let before = assignment.num_trail_entries();
        let mut control = ExtensionControl {
            assignment,
            allocator,
            watches,
            produced_conflict: None,
        };
        let outcome = self.extension.propagate(&mut control, &changes);
        if let Some(conflict) = control.produced_conflict {
            return Err(conflict);
        }
        outcome.map_err(|message| {
            log::warn!("propagator extension rejected assignment: {message}");
            Conflict {
                literal: Literal::TRUE,
                antecedent: Antecedent::Decision,
            }
        })?;

        if assignment.num_trail_entries() != before {
            Ok(PropagationResult::Changed {
                fixpoint_reached: false,
            })
        } else {
            Ok(PropagationResult::NoConflict)
        }
    }

    fn is_model(
        &mut self,
        assignment: &mut Assignment,
        allocator: &mut ClauseAllocator,
        watches: &mut ClausalPropagator,
    ) -> Result<(), Conflict> {
        let mut control = ExtensionControl {
            assignment,
            allocator,
            watches,
            produced_conflict: None,
        };
        let outcome = self.extension.check(&mut control);
        if let Some(conflict) = control.produced_conflict {
            return Err(conflict);
        }
        outcome.map_err(|message| {
            log::warn!("propagator extension check rejected model: {message}");
            Conflict {
                literal: Literal::TRUE,
                antecedent: Antecedent::Decision,
            }
        })
    }

    fn undo_level(&mut self, _level: usize, undone: &[Literal], assignment: &Assignment) {
        let retracted: Vec<WatchedChange> = undone
            .iter()
            .filter(|literal| self.watched.iter().any(|&watched| watched.var() == literal.var()))
            .map(|&literal| WatchedChange { literal })
            .collect();
        if !retracted.is_empty() {
            self.extension.undo(&retracted);
        }
        self.next_trail_index = self.next_trail_index.min(assignment.num_trail_entries());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Var;
    use crate::engine::assignment::Antecedent;

    struct RecordingControl {
        assignment: Assignment,
        added: Vec<(Vec<Literal>, ClauseLifetime)>,
    }

    impl PropagatorControl for RecordingControl {
        fn assignment(&self) -> &Assignment {
            &self.assignment
        }

        fn add_clause(&mut self, literals: &[Literal], lifetime: ClauseLifetime) -> bool {
            self.added.push((literals.to_vec(), lifetime));
            true
        }
    }

    struct AtLeastOneTrue {
        watched: Vec<Literal>,
    }

    impl PropagatorExtension for AtLeastOneTrue {
        fn check_mode(&self) -> CheckMode {
            CheckMode::Fixpoint
        }

        fn init(&mut self, _control: &mut dyn PropagatorControl) -> Result<Vec<Literal>, String> {
            Ok(self.watched.clone())
        }

        fn propagate(
            &mut self,
            control: &mut dyn PropagatorControl,
            changes: &[WatchedChange],
        ) -> Result<(), String> {
            if changes.is_empty() {
                return Ok(());
            }
            let all_false = self
                .watched
                .iter()
                .all(|&literal| control.assignment().is_false(literal));
            if all_false {
                let _ = control.add_clause(&self.watched, ClauseLifetime::Learnt);
            }
            Ok(())
        }

        fn undo(&mut self, _changes: &[WatchedChange]) {}

        fn check(&mut self, _control: &mut dyn PropagatorControl) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn propagator_adds_clause_once_all_watches_are_false() {
        let literal = Var::from_index(0).pos_lit();
        let mut assignment = Assignment::new(1);
        assignment.force(!literal, Antecedent::Decision).unwrap();
        let mut control = RecordingControl {
            assignment,
            added: Vec::new(),
        };
        let mut propagator = AtLeastOneTrue {
            watched: vec![literal],
        };
        propagator
            .propagate(&mut control, &[WatchedChange { literal: !literal }])
            .unwrap();
        assert_eq!(control.added.len(), 1);
        assert_eq!(control.added[0].1, ClauseLifetime::Learnt);
    }

    #[test]
    fn adapter_forwards_control_conflicts_from_extension() {
        let literal0 = Var::from_index(0).pos_lit();
        let literal1 = Var::from_index(1).pos_lit();
        let mut assignment = Assignment::new(2);
        let mut allocator = ClauseAllocator::default();
        let mut watches = ClausalPropagator::new(2);

        let mut adapter = PropagatorExtensionAdapter::new(Box::new(AtLeastOneTrue {
            watched: vec![literal0, literal1],
        }));
        adapter
            .propagate_fixpoint(&mut assignment, &mut allocator, &mut watches)
            .unwrap();

        assignment.force(!literal0, Antecedent::Decision).unwrap();
        assignment.force(!literal1, Antecedent::Decision).unwrap();

        let err = adapter
            .propagate_fixpoint(&mut assignment, &mut allocator, &mut watches)
            .unwrap_err();
        assert_eq!(err.literal, literal0);
    }
}

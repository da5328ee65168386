//! Long-clause storage and two-watched-literal propagation.

use crate::basic_types::ClauseReference;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::clasp_assert_moderate;
use crate::clasp_assert_simple;
use crate::engine::assignment::Antecedent;
use crate::engine::assignment::Assignment;
use crate::engine::assignment::Conflict;

/// A stored long clause: at least two literals, with the first two always the watched pair.
#[allow(clippy::len_without_is_empty)]
#[derive(Debug)]
pub struct Clause {
    literals: Vec<Literal>,
    is_learnt: bool,
    is_deleted: bool,
    protected: bool,
    lbd: u32,
    activity: f32,
}

impl Clause {
    fn new(literals: Vec<Literal>, is_learnt: bool) -> Clause {
        clasp_assert_simple!(literals.len() >= 2);
        let lbd = literals.len() as u32;
        Clause {
            literals,
            is_learnt,
            is_deleted: false,
            protected: false,
            lbd,
            activity: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn is_learnt(&self) -> bool {
        self.is_learnt
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn lbd(&self) -> u32 {
        self.lbd
    }

    pub fn set_lbd(&mut self, lbd: u32) {
        self.lbd = lbd;
    }

    pub fn activity(&self) -> f32 {
        self.activity
    }

    pub fn bump_activity(&mut self, amount: f32) {
        self.activity += amount;
    }

    pub fn rescale_activity(&mut self, factor: f32) {
        self.activity *= factor;
    }

    /// Whether this clause is currently the antecedent of an assigned literal and may not be
    /// reduced away.
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    pub fn set_protected(&mut self, protected: bool) {
        self.protected = protected;
    }

    fn mark_deleted(&mut self) {
        clasp_assert_moderate!(!self.is_deleted);
        self.is_deleted = true;
    }
}

impl std::ops::Index<usize> for Clause {
    type Output = Literal;
    fn index(&self, index: usize) -> &Literal {
        &self.literals[index]
    }
}

impl std::ops::IndexMut<usize> for Clause {
    fn index_mut(&mut self, index: usize) -> &mut Literal {
        &mut self.literals[index]
    }
}

/// Owns every allocated [`Clause`], addressed by [`ClauseReference`]. Deleted slots are
/// recycled the way the problem database recycles clause ids: a free list of reusable
/// references avoids ever-growing the backing vector across a long reduction cycle.
#[derive(Default, Debug)]
pub struct ClauseAllocator {
    clauses: Vec<Clause>,
    free_list: Vec<ClauseReference>,
}

impl ClauseAllocator {
    pub fn create_clause(&mut self, literals: Vec<Literal>, is_learnt: bool) -> ClauseReference {
        clasp_assert_simple!(literals.len() >= 2);
        if let Some(reference) = self.free_list.pop() {
            self.clauses[reference.get_code() as usize - 1] = Clause::new(literals, is_learnt);
            reference
        } else {
            self.clauses.push(Clause::new(literals, is_learnt));
            ClauseReference::new(self.clauses.len() as u32)
        }
    }

    pub fn get(&self, reference: ClauseReference) -> &Clause {
        &self.clauses[reference.get_code() as usize - 1]
    }

    pub fn get_mut(&mut self, reference: ClauseReference) -> &mut Clause {
        &mut self.clauses[reference.get_code() as usize - 1]
    }

    pub fn delete(&mut self, reference: ClauseReference) {
        clasp_assert_moderate!(!self.get(reference).is_deleted());
        self.get_mut(reference).mark_deleted();
        self.free_list.push(reference);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClauseReference, &Clause)> {
        self.clauses
            .iter()
            .enumerate()
            .filter(|(_, clause)| !clause.is_deleted)
            .map(|(index, clause)| (ClauseReference::new(index as u32 + 1), clause))
    }

    /// Copies every live clause into a fresh allocator, registering each one's watched pair with
    /// `watches` as it goes. References are renumbered in iteration order; deleted slots are not
    /// carried over. Used when a [`Solver`] attaches to a frozen shared problem and needs its
    /// own private copy of the long-clause database to extend during search.
    ///
    /// [`Solver`]: crate::engine::solver::Solver
    pub fn clone_into(&self, watches: &mut ClausalPropagator) -> ClauseAllocator {
        let mut allocator = ClauseAllocator::default();
        for (_, clause) in self.iter() {
            let reference = watches.add_clause(clause.literals().to_vec(), clause.is_learnt(), &mut allocator);
            let copy = allocator.get_mut(reference);
            copy.set_lbd(clause.lbd());
            copy.bump_activity(clause.activity());
        }
        allocator
    }
}

impl std::ops::Index<ClauseReference> for ClauseAllocator {
    type Output = Clause;
    fn index(&self, reference: ClauseReference) -> &Clause {
        self.get(reference)
    }
}

impl std::ops::IndexMut<ClauseReference> for ClauseAllocator {
    fn index_mut(&mut self, reference: ClauseReference) -> &mut Clause {
        self.get_mut(reference)
    }
}

#[derive(Clone, Copy, Debug)]
struct ClauseWatcher {
    /// A literal of the clause, other than the watched one, checked first since it is often
    /// already satisfied — avoids touching the clause at all in the common case.
    blocker: Literal,
    reference: ClauseReference,
}

/// Two-watched-literal propagation over the long-clause database.
///
/// Watch lists are keyed by literal; the watch list of `¬p` is scanned whenever `p` is
/// assigned true. Watched positions always live at indices 0 and 1 of the clause.
#[derive(Default, Debug)]
pub struct ClausalPropagator {
    watch_lists: KeyedVec<Literal, Vec<ClauseWatcher>>,
    next_trail_index: usize,
}

impl ClausalPropagator {
    pub fn new(num_vars: usize) -> Self {
        let mut watch_lists = KeyedVec::default();
        watch_lists.resize(num_vars * 2, Vec::new());
        ClausalPropagator {
            watch_lists,
            next_trail_index: 0,
        }
    }

    pub fn grow(&mut self, num_vars: usize) {
        self.watch_lists.resize(num_vars * 2, Vec::new());
    }

    /// Registers a freshly-created clause's first two literals as its watched pair.
    pub fn start_watching(&mut self, clause: &Clause, reference: ClauseReference) {
        clasp_assert_simple!(clause.len() >= 2);
        self.watch_lists[clause[0]].push(ClauseWatcher {
            blocker: clause[1],
            reference,
        });
        self.watch_lists[clause[1]].push(ClauseWatcher {
            blocker: clause[0],
            reference,
        });
    }

    pub fn add_clause(
        &mut self,
        literals: Vec<Literal>,
        is_learnt: bool,
        allocator: &mut ClauseAllocator,
    ) -> ClauseReference {
        let reference = allocator.create_clause(literals, is_learnt);
        self.start_watching(allocator.get(reference), reference);
        reference
    }

    pub fn remove_from_watch_lists(&mut self, clause: &Clause, reference: ClauseReference) {
        for literal in [clause[0], clause[1]] {
            let list = &mut self.watch_lists[literal];
            if let Some(position) = list.iter().position(|w| w.reference == reference) {
                list.swap_remove(position);
            }
        }
    }

    pub fn synchronise(&mut self, trail_len: usize) {
        clasp_assert_simple!(self.next_trail_index >= trail_len);
        self.next_trail_index = trail_len;
    }

    pub fn is_propagation_complete(&self, trail_len: usize) -> bool {
        self.next_trail_index == trail_len
    }

    /// Propagates every trail entry not yet processed, in trail order, to fixpoint or conflict.
    pub fn propagate(
        &mut self,
        assignment: &mut Assignment,
        allocator: &mut ClauseAllocator,
    ) -> Result<(), Conflict> {
        while self.next_trail_index < assignment.num_trail_entries() {
            let true_literal = assignment.trail_entry(self.next_trail_index);
            let false_literal = !true_literal;

            if self.watch_lists[false_literal].is_empty() {
                self.next_trail_index += 1;
                continue;
            }

            let mut write = 0;
            let mut read = 0;
            let len = self.watch_lists[false_literal].len();
            let mut conflict = None;

            while read < len {
                let watcher = self.watch_lists[false_literal][read];

                if assignment.is_true(watcher.blocker) {
                    self.watch_lists[false_literal][write] = watcher;
                    read += 1;
                    write += 1;
                    continue;
                }

                let clause = allocator.get_mut(watcher.reference);
                if clause[0] == false_literal {
                    clause.literals.swap(0, 1);
                }

                if assignment.is_true(clause[0]) {
                    let updated = ClauseWatcher {
                        blocker: clause[0],
                        reference: watcher.reference,
                    };
                    self.watch_lists[false_literal][write] = updated;
                    read += 1;
                    write += 1;
                    continue;
                }

                let mut relocated = false;
                for i in 2..clause.len() {
                    if !assignment.is_false(clause[i]) {
                        clause.literals.swap(1, i);
                        self.watch_lists[clause[1]].push(ClauseWatcher {
                            blocker: clause[0],
                            reference: watcher.reference,
                        });
                        relocated = true;
                        break;
                    }
                }
                if relocated {
                    read += 1;
                    continue;
                }

                self.watch_lists[false_literal][write] = watcher;
                read += 1;
                write += 1;

                let propagated = clause[0];
                if let Err(err) = assignment.force(propagated, Antecedent::Clause(watcher.reference)) {
                    while read < len {
                        self.watch_lists[false_literal][write] = self.watch_lists[false_literal][read];
                        read += 1;
                        write += 1;
                    }
                    conflict = Some(err);
                    break;
                }
            }

            self.watch_lists[false_literal].truncate(write);
            if let Some(conflict) = conflict {
                return Err(conflict);
            }
            self.next_trail_index += 1;
        }
        Ok(())
    }

    /// Debug-only sanity check of the watched-literal invariant: every clause is either
    /// satisfied or both its watched literals are non-false.
    pub fn debug_check_watch_invariant(&self, assignment: &Assignment, allocator: &ClauseAllocator) {
        for (_, clause) in allocator.iter() {
            let satisfied = clause.literals().iter().any(|&l| assignment.is_true(l));
            clasp_assert_moderate!(
                satisfied || (!assignment.is_false(clause[0]) && !assignment.is_false(clause[1]))
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Var;

    fn lit(i: usize) -> Literal {
        Var::from_index(i).pos_lit()
    }

    #[test]
    fn unit_propagation_through_long_clause() {
        let mut allocator = ClauseAllocator::default();
        let mut propagator = ClausalPropagator::new(4);
        propagator.add_clause(vec![lit(0), lit(1), lit(2)], false, &mut allocator);

        let mut assignment = Assignment::new(4);
        assignment.force(!lit(0), Antecedent::Decision).unwrap();
        assignment.force(!lit(1), Antecedent::Decision).unwrap();
        propagator.propagate(&mut assignment, &mut allocator).unwrap();

        assert!(assignment.is_true(lit(2)));
    }

    #[test]
    fn conflicting_clause_is_detected() {
        let mut allocator = ClauseAllocator::default();
        let mut propagator = ClausalPropagator::new(4);
        propagator.add_clause(vec![lit(0), lit(1)], false, &mut allocator);

        let mut assignment = Assignment::new(4);
        assignment.force(!lit(0), Antecedent::Decision).unwrap();
        assignment.force(!lit(1), Antecedent::Decision).unwrap();
        let result = propagator.propagate(&mut assignment, &mut allocator);
        assert!(result.is_err());
    }

    #[test]
    fn clone_into_reproduces_propagation_behaviour() {
        let mut allocator = ClauseAllocator::default();
        let mut propagator = ClausalPropagator::new(4);
        propagator.add_clause(vec![lit(0), lit(1), lit(2)], false, &mut allocator);

        let mut cloned_propagator = ClausalPropagator::new(4);
        let cloned_allocator = allocator.clone_into(&mut cloned_propagator);

        let mut allocator = cloned_allocator;
        let mut assignment = Assignment::new(4);
        assignment.force(!lit(0), Antecedent::Decision).unwrap();
        assignment.force(!lit(1), Antecedent::Decision).unwrap();
        cloned_propagator
            .propagate(&mut assignment, &mut allocator)
            .unwrap();

        assert!(assignment.is_true(lit(2)));
    }

    #[test]
    fn watch_invariant_holds_after_fixpoint() {
        let mut allocator = ClauseAllocator::default();
        let mut propagator = ClausalPropagator::new(6);
        propagator.add_clause(vec![lit(0), lit(1), lit(2)], false, &mut allocator);
        propagator.add_clause(vec![lit(3), lit(4), lit(5)], false, &mut allocator);

        let mut assignment = Assignment::new(6);
        assignment.force(!lit(0), Antecedent::Decision).unwrap();
        propagator.propagate(&mut assignment, &mut allocator).unwrap();
        propagator.debug_check_watch_invariant(&assignment, &allocator);
    }
}

//! Binary/ternary implication storage addressed directly by literal.
//!
//! Problem-level entries are stored in plain per-literal vectors, populated only while the
//! owning [`crate::engine::shared_context::SharedContext`] is unfrozen. Learnt short
//! implications append to a separate per-literal list guarded by a lock so that worker solvers
//! can publish new binary/ternary learnt clauses without taking an allocator-wide lock; see
//! the distributor (§4.10) for the cross-solver publish path. The source implementation reaches
//! for a hand-rolled lock-free CAS list here; we use a `Mutex<Vec<_>>` per literal instead,
//! which gives the same external contract (wait-free readers are not required, only mutually
//! exclusive appends) at a fraction of the complexity.

use std::sync::Mutex;

use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::engine::assignment::Antecedent;
use crate::engine::assignment::Assignment;
use crate::engine::assignment::Conflict;

/// A ternary implication `¬p ∨ q ∨ r` stored at `p`'s entry as the pair `(q, r)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct TernaryArc {
    q: Literal,
    r: Literal,
}

#[derive(Clone, Debug, Default)]
struct LiteralEntry {
    /// Unary implications `p -> q`, used mainly during equivalence preprocessing.
    unary: Vec<Literal>,
    /// Binary implications `p -> q`.
    binary: Vec<Literal>,
    /// Ternary implications, see [`TernaryArc`].
    ternary: Vec<TernaryArc>,
}

/// Counts of problem vs. learnt short-implication entries, tracked separately as required by
/// the data model.
#[derive(Copy, Clone, Debug, Default)]
pub struct ShortImplicationCounts {
    pub problem_binary: usize,
    pub problem_ternary: usize,
    pub learnt_binary: usize,
    pub learnt_ternary: usize,
}

#[derive(Debug, Default)]
struct LearntEntry {
    binary: Vec<Literal>,
    ternary: Vec<TernaryArc>,
}

/// Storage for binary and ternary implications, split into a frozen problem part and a
/// lock-guarded learnt part that solvers may append to concurrently.
#[derive(Debug, Default)]
pub struct ShortImplicationsGraph {
    problem: KeyedVec<Literal, LiteralEntry>,
    learnt: Vec<Mutex<LearntEntry>>,
    counts: ShortImplicationCounts,
}

impl ShortImplicationsGraph {
    pub fn new(num_vars: usize) -> Self {
        let size = num_vars * 2;
        let mut problem = KeyedVec::default();
        problem.resize(size, LiteralEntry::default());
        let mut learnt = Vec::with_capacity(size);
        learnt.resize_with(size, || Mutex::new(LearntEntry::default()));
        ShortImplicationsGraph {
            problem,
            learnt,
            counts: ShortImplicationCounts::default(),
        }
    }

    pub fn grow(&mut self, num_vars: usize) {
        let size = num_vars * 2;
        self.problem.resize(size, LiteralEntry::default());
        self.learnt.resize_with(size, || Mutex::new(LearntEntry::default()));
    }

    pub fn counts(&self) -> ShortImplicationCounts {
        self.counts
    }

    /// Adds a binary implication `p -> q` (stored as `¬p ∨ q`). The entry for `p` is what
    /// [`propagate`](Self::propagate) consults once `p` is assigned true. Returns `false` if
    /// the arc is already present (idempotent add).
    pub fn add_binary(&mut self, p: Literal, q: Literal, learnt: bool) -> bool {
        if learnt {
            let mut entry = self.learnt[p.index()].lock().unwrap();
            if entry.binary.contains(&q) {
                return false;
            }
            entry.binary.push(q);
            drop(entry);
            let mut entry = self.learnt[(!q).index()].lock().unwrap();
            entry.binary.push(!p);
            self.counts.learnt_binary += 1;
            true
        } else {
            if self.problem[p].binary.contains(&q) {
                return false;
            }
            self.problem[p].binary.push(q);
            self.problem[!q].binary.push(!p);
            self.counts.problem_binary += 1;
            true
        }
    }

    /// Adds a ternary clause `¬p ∨ q ∨ r`. The `(q, r)` pair is stored under `p` (consulted by
    /// [`propagate`](Self::propagate) once `p` is true), and the two other rotations are stored
    /// so the same clause is reachable regardless of which literal is assigned first. Returns
    /// `false` if the exact arc is already present under `p` (idempotent add, mirroring
    /// [`add_binary`](Self::add_binary)).
    pub fn add_ternary(&mut self, p: Literal, q: Literal, r: Literal, learnt: bool) -> bool {
        let rotations = [(p, q, r), (!q, !p, r), (!r, !p, q)];
        if learnt {
            {
                let entry = self.learnt[p.index()].lock().unwrap();
                if entry.ternary.contains(&TernaryArc { q, r }) {
                    return false;
                }
            }
            for (key, a, b) in rotations {
                let mut entry = self.learnt[key.index()].lock().unwrap();
                entry.ternary.push(TernaryArc { q: a, r: b });
            }
            self.counts.learnt_ternary += 1;
        } else {
            if self.problem[p].ternary.contains(&TernaryArc { q, r }) {
                return false;
            }
            for (key, a, b) in rotations {
                self.problem[key].ternary.push(TernaryArc { q: a, r: b });
            }
            self.counts.problem_ternary += 1;
        }
        true
    }

    /// Simplifies the graph once `top` is permanently true at the root level: the entry for
    /// `¬top` is dropped entirely, since `propagate` is only ever consulted for a literal that
    /// has just become true, and `¬top` can never become true again once `top` is fixed.
    ///
    /// This does not chase every secondary consequence (an arc `p -> ¬top` elsewhere in the
    /// graph is left in place; propagating `p` will still correctly fail against the now-false
    /// `¬top`), but it drops the one entry guaranteed to be dead weight from this point on.
    pub fn remove_true(&mut self, top: Literal) {
        let not_top = !top;
        let removed_binary = self.problem[not_top].binary.len();
        let removed_ternary = self.problem[not_top].ternary.len();
        self.problem[not_top] = LiteralEntry::default();
        self.counts.problem_binary = self.counts.problem_binary.saturating_sub(removed_binary);
        self.counts.problem_ternary = self.counts.problem_ternary.saturating_sub(removed_ternary);

        let mut entry = self.learnt[not_top.index()].lock().unwrap();
        let removed_learnt_binary = entry.binary.len();
        let removed_learnt_ternary = entry.ternary.len();
        *entry = LearntEntry::default();
        drop(entry);
        self.counts.learnt_binary = self.counts.learnt_binary.saturating_sub(removed_learnt_binary);
        self.counts.learnt_ternary = self.counts.learnt_ternary.saturating_sub(removed_learnt_ternary);
    }

    /// Clones the problem-level (non-learnt) short implications, used when a [`Solver`] is
    /// attached to a frozen [`crate::engine::shared_context::SharedContext`] and needs its own
    /// private copy to extend with learnt arcs during search.
    ///
    /// [`Solver`]: crate::engine::solver::Solver
    pub fn clone_problem(&self) -> Self {
        let size = self.learnt.len();
        let mut learnt = Vec::with_capacity(size);
        learnt.resize_with(size, || Mutex::new(LearntEntry::default()));
        ShortImplicationsGraph {
            problem: self.problem.clone(),
            learnt,
            counts: ShortImplicationCounts {
                problem_binary: self.counts.problem_binary,
                problem_ternary: self.counts.problem_ternary,
                learnt_binary: 0,
                learnt_ternary: 0,
            },
        }
    }

    /// Adds a single-literal learnt fact `p`, recorded in `p`'s own unary list so it replays on
    /// the next propagation of `p`'s negation is never reached (facts are applied immediately by
    /// the caller; this entry exists for equivalence-preprocessing style consumers).
    pub fn add_unary(&mut self, p: Literal) {
        self.problem[p].unary.push(p);
    }

    /// Propagates consequences of `p` becoming true: every binary `q` is forced, and for every
    /// ternary arc `(q, r)` the remaining literal is forced if the other is false.
    pub fn propagate(&self, p: Literal, assignment: &mut Assignment) -> Result<(), Conflict> {
        self.propagate_one(&self.problem[p], p, assignment)?;
        let learnt = self.learnt[p.index()].lock().unwrap();
        self.propagate_learnt(&learnt, p, assignment)
    }

    fn propagate_one(
        &self,
        entry: &LiteralEntry,
        p: Literal,
        assignment: &mut Assignment,
    ) -> Result<(), Conflict> {
        for &q in &entry.binary {
            assignment.force(q, Antecedent::Binary(!p))?;
        }
        for arc in &entry.ternary {
            if assignment.is_false(arc.q) {
                assignment.force(arc.r, Antecedent::Ternary(!p, arc.q))?;
            } else if assignment.is_false(arc.r) {
                assignment.force(arc.q, Antecedent::Ternary(!p, arc.r))?;
            }
        }
        Ok(())
    }

    fn propagate_learnt(
        &self,
        entry: &LearntEntry,
        p: Literal,
        assignment: &mut Assignment,
    ) -> Result<(), Conflict> {
        for &q in &entry.binary {
            assignment.force(q, Antecedent::Binary(!p))?;
        }
        for arc in &entry.ternary {
            if assignment.is_false(arc.q) {
                assignment.force(arc.r, Antecedent::Ternary(!p, arc.q))?;
            } else if assignment.is_false(arc.r) {
                assignment.force(arc.q, Antecedent::Ternary(!p, arc.r))?;
            }
        }
        Ok(())
    }

    /// Looks for a literal implied by `p` that is already false at or below `max_level`,
    /// giving conflict-clause minimisation a cheaper alternative reason than `p` itself.
    pub fn reverse_arc(&self, p: Literal, max_level: usize, assignment: &Assignment) -> Option<Literal> {
        self.problem[p]
            .binary
            .iter()
            .chain(self.learnt[p.index()].lock().unwrap().binary.iter())
            .find(|&&q| assignment.is_false(q) && assignment.literal_level(q) <= max_level)
            .copied()
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
    fn binary_add_is_idempotent() {
        let mut graph = ShortImplicationsGraph::new(4);
        assert!(graph.add_binary(lit(0), lit(1), false));
        assert!(!graph.add_binary(lit(0), lit(1), false));
        assert_eq!(graph.counts().problem_binary, 1);
    }

    #[test]
    fn binary_propagation_forces_consequence() {
        let mut graph = ShortImplicationsGraph::new(4);
        graph.add_binary(lit(0), lit(1), false);
        let mut assignment = Assignment::new(4);
        assignment.force(lit(0), Antecedent::Decision).unwrap();
        graph.propagate(lit(0), &mut assignment).unwrap();
        assert!(assignment.is_true(lit(1)));
    }

    #[test]
    fn ternary_propagation_needs_both_others_false() {
        let mut graph = ShortImplicationsGraph::new(6);
        graph.add_ternary(lit(0), lit(1), lit(2), false);
        let mut assignment = Assignment::new(6);
        assignment.force(lit(0), Antecedent::Decision).unwrap();
        assignment.force(!lit(1), Antecedent::Decision).unwrap();
        graph.propagate(lit(0), &mut assignment).unwrap();
        assert!(assignment.is_true(lit(2)));
    }

    #[test]
    fn learnt_binary_is_visible_to_propagation() {
        let mut graph = ShortImplicationsGraph::new(4);
        graph.add_binary(lit(0), lit(1), true);
        let mut assignment = Assignment::new(4);
        assignment.force(lit(0), Antecedent::Decision).unwrap();
        graph.propagate(lit(0), &mut assignment).unwrap();
        assert!(assignment.is_true(lit(1)));
        assert_eq!(graph.counts().learnt_binary, 1);
    }

    #[test]
    fn ternary_add_is_idempotent() {
        let mut graph = ShortImplicationsGraph::new(6);
        assert!(graph.add_ternary(lit(0), lit(1), lit(2), false));
        assert!(!graph.add_ternary(lit(0), lit(1), lit(2), false));
        assert_eq!(graph.counts().problem_ternary, 1);
    }

    #[test]
    fn learnt_ternary_add_is_idempotent() {
        let mut graph = ShortImplicationsGraph::new(6);
        assert!(graph.add_ternary(lit(0), lit(1), lit(2), true));
        assert!(!graph.add_ternary(lit(0), lit(1), lit(2), true));
        assert_eq!(graph.counts().learnt_ternary, 1);
    }

    #[test]
    fn remove_true_drops_the_dead_negated_entry() {
        let mut graph = ShortImplicationsGraph::new(4);
        graph.add_binary(lit(0), lit(1), false);
        assert_eq!(graph.counts().problem_binary, 1);
        // the mirrored back-arc lives at `!lit(1)`'s entry.
        assert!(graph.problem[!lit(1)].binary.contains(&!lit(0)));

        graph.remove_true(lit(0));

        // `!lit(0)` can never become true again; its entry is now dead weight.
        assert!(graph.problem[!lit(0)].binary.is_empty());
        assert!(graph.problem[!lit(0)].ternary.is_empty());
    }

    #[test]
    fn remove_true_is_idempotent_on_counts() {
        let mut graph = ShortImplicationsGraph::new(4);
        graph.add_ternary(lit(0), lit(1), lit(2), false);
        graph.remove_true(lit(0));
        graph.remove_true(lit(0));
        assert_eq!(graph.counts().problem_ternary, 1);
    }

    #[test]
    fn reverse_arc_finds_an_already_false_consequence() {
        let mut graph = ShortImplicationsGraph::new(6);
        graph.add_binary(lit(0), lit(1), false);
        let mut assignment = Assignment::new(6);
        assignment.force(!lit(1), Antecedent::Decision).unwrap();
        let found = graph.reverse_arc(lit(0), assignment.decision_level(), &assignment);
        assert_eq!(found, Some(lit(1)));
    }

    #[test]
    fn reverse_arc_ignores_consequences_above_max_level() {
        let mut graph = ShortImplicationsGraph::new(6);
        graph.add_binary(lit(0), lit(1), false);
        let mut assignment = Assignment::new(6);
        assignment.assume(lit(3));
        assignment.force(!lit(1), Antecedent::Decision).unwrap();
        let found = graph.reverse_arc(lit(0), 0, &assignment);
        assert_eq!(found, None);
    }
}

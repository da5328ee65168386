//! Partial assignment, trail and reason bookkeeping.

use crate::basic_types::ClauseReference;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::Var;
use crate::clasp_assert_moderate;
use crate::clasp_assert_simple;

/// The three-valued truth state of a variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VarValue {
    Free,
    True,
    False,
}

/// What forced a literal onto the trail.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Antecedent {
    /// Chosen by the heuristic; not implied by anything.
    Decision,
    /// Implied via a binary clause `other ∨ literal`; `other` is the already-false literal.
    Binary(Literal),
    /// Implied via a ternary clause; both stored literals are already-false.
    Ternary(Literal, Literal),
    /// Implied by a long clause.
    Clause(ClauseReference),
}

#[derive(Copy, Clone, Debug)]
struct VarRecord {
    value: VarValue,
    level: u32,
    antecedent: Antecedent,
    /// Position of this variable's literal in the trail, valid only while `value != Free`.
    trail_position: u32,
}

impl Default for VarRecord {
    fn default() -> Self {
        VarRecord {
            value: VarValue::Free,
            level: 0,
            antecedent: Antecedent::Decision,
            trail_position: 0,
        }
    }
}

/// Outcome of pushing a conflicting literal via [`Assignment::force`].
#[derive(Copy, Clone, Debug)]
pub struct Conflict {
    pub literal: Literal,
    pub antecedent: Antecedent,
}

/// The assignment, trail and decision-level bookkeeping for a single `Solver`.
///
/// Invariants maintained by this type: every non-decision antecedent, when replayed against the
/// assignment that existed just before its literal was pushed, would unit-propagate that
/// literal; and trail levels are non-decreasing.
#[derive(Debug, Default)]
pub struct Assignment {
    records: KeyedVec<Var, VarRecord>,
    trail: Vec<Literal>,
    /// `level_starts[d]` is the trail index of the first literal assigned at level `d`.
    level_starts: Vec<u32>,
}

impl Assignment {
    pub fn new(num_vars: usize) -> Self {
        let mut records = KeyedVec::default();
        records.resize(num_vars, VarRecord::default());
        Assignment {
            records,
            trail: Vec::new(),
            level_starts: vec![0],
        }
    }

    pub fn grow(&mut self, num_vars: usize) {
        self.records.resize(num_vars, VarRecord::default());
    }

    pub fn num_vars(&self) -> usize {
        self.records.len()
    }

    pub fn decision_level(&self) -> usize {
        self.level_starts.len() - 1
    }

    pub fn num_trail_entries(&self) -> usize {
        self.trail.len()
    }

    pub fn trail_entry(&self, index: usize) -> Literal {
        self.trail[index]
    }

    pub fn trail(&self) -> &[Literal] {
        &self.trail
    }

    fn value_of(&self, var: Var) -> VarValue {
        self.records[var].value
    }

    /// The truth value of `literal` given the variable's current value.
    pub fn literal_value(&self, literal: Literal) -> VarValue {
        match self.value_of(literal.var()) {
            VarValue::Free => VarValue::Free,
            VarValue::True if literal.is_positive() => VarValue::True,
            VarValue::True => VarValue::False,
            VarValue::False if literal.is_positive() => VarValue::False,
            VarValue::False => VarValue::True,
        }
    }

    pub fn is_true(&self, literal: Literal) -> bool {
        matches!(self.literal_value(literal), VarValue::True)
    }

    pub fn is_false(&self, literal: Literal) -> bool {
        matches!(self.literal_value(literal), VarValue::False)
    }

    pub fn is_free(&self, literal: Literal) -> bool {
        matches!(self.literal_value(literal), VarValue::Free)
    }

    pub fn level(&self, var: Var) -> usize {
        self.records[var].level as usize
    }

    pub fn literal_level(&self, literal: Literal) -> usize {
        self.level(literal.var())
    }

    pub fn antecedent(&self, var: Var) -> Antecedent {
        self.records[var].antecedent
    }

    pub fn is_root_assignment(&self, literal: Literal) -> bool {
        !self.is_free(literal) && self.literal_level(literal) == 0
    }

    fn push_trail(&mut self, literal: Literal, level: usize, antecedent: Antecedent) {
        clasp_assert_simple!(self.is_free(literal));
        let position = self.trail.len() as u32;
        let var = literal.var();
        self.records[var] = VarRecord {
            value: if literal.is_positive() {
                VarValue::True
            } else {
                VarValue::False
            },
            level: level as u32,
            antecedent,
            trail_position: position,
        };
        self.trail.push(literal);
    }

    /// Pushes a decision literal at a new decision level. Fails (returns `false`) if `literal`
    /// is already false.
    #[must_use]
    pub fn assume(&mut self, literal: Literal) -> bool {
        if self.is_false(literal) {
            return false;
        }
        if self.is_true(literal) {
            return true;
        }
        self.level_starts.push(self.trail.len() as u32);
        let level = self.decision_level();
        self.push_trail(literal, level, Antecedent::Decision);
        true
    }

    /// Propagates `literal` at the current decision level via `antecedent`. Returns `Err` with
    /// the conflicting literal/antecedent pair if `literal` is already false.
    pub fn force(&mut self, literal: Literal, antecedent: Antecedent) -> Result<(), Conflict> {
        if self.is_true(literal) {
            return Ok(());
        }
        if self.is_false(literal) {
            return Err(Conflict {
                literal,
                antecedent,
            });
        }
        let level = self.decision_level();
        self.push_trail(literal, level, antecedent);
        Ok(())
    }

    /// Pops every trail entry assigned above `level`, returning the unassigned literals in
    /// trail (i.e. chronological) order so callers can notify the heuristic.
    pub fn undo_until(&mut self, level: usize) -> Vec<Literal> {
        clasp_assert_simple!(level <= self.decision_level());
        if level == self.decision_level() {
            return Vec::new();
        }
        let cut = self.level_starts[level + 1] as usize;
        let mut undone = Vec::with_capacity(self.trail.len() - cut);
        for literal in self.trail.drain(cut..) {
            self.records[literal.var()] = VarRecord::default();
            undone.push(literal);
        }
        self.level_starts.truncate(level + 1);
        undone
    }

    /// Verifies the trail-level-monotonicity invariant; intended for debug assertions rather
    /// than the hot path.
    pub fn debug_check_level_monotone(&self) {
        clasp_assert_moderate!(self
            .trail
            .windows(2)
            .all(|pair| self.literal_level(pair[0]) <= self.literal_level(pair[1])));
    }

    pub fn trail_position(&self, var: Var) -> usize {
        self.records[var].trail_position as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(i: usize) -> Literal {
        Var::from_index(i).pos_lit()
    }

    #[test]
    fn assume_then_force_tracks_levels() {
        let mut assignment = Assignment::new(4);
        assert!(assignment.assume(lit(0)));
        assert_eq!(assignment.decision_level(), 1);
        assignment
            .force(lit(1), Antecedent::Binary(lit(0)))
            .unwrap();
        assert_eq!(assignment.literal_level(lit(1)), 1);
        assert!(assignment.is_true(lit(0)));
        assert!(assignment.is_true(lit(1)));
    }

    #[test]
    fn force_detects_conflict() {
        let mut assignment = Assignment::new(2);
        assignment.force(lit(0), Antecedent::Decision).unwrap();
        let err = assignment.force(!lit(0), Antecedent::Decision).unwrap_err();
        assert_eq!(err.literal, !lit(0));
    }

    #[test]
    fn undo_until_restores_free_state() {
        let mut assignment = Assignment::new(3);
        assignment.assume(lit(0));
        assignment.assume(lit(1));
        assignment
            .force(lit(2), Antecedent::Binary(lit(1)))
            .unwrap();
        let undone = assignment.undo_until(1);
        assert_eq!(undone.len(), 2);
        assert!(assignment.is_free(lit(1)));
        assert!(assignment.is_free(lit(2)));
        assert!(assignment.is_true(lit(0)));
        assert_eq!(assignment.decision_level(), 1);
    }

    #[test]
    fn level_monotonicity_holds_after_mixed_pushes() {
        let mut assignment = Assignment::new(4);
        assignment.assume(lit(0));
        assignment
            .force(lit(1), Antecedent::Binary(lit(0)))
            .unwrap();
        assignment.assume(lit(2));
        assignment
            .force(lit(3), Antecedent::Binary(lit(2)))
            .unwrap();
        assignment.debug_check_level_monotone();
    }
}

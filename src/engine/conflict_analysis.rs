//! First-UIP conflict analysis and learnt-clause minimisation.

use crate::basic_types::ClauseReference;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::Var;
use crate::engine::assignment::Antecedent;
use crate::engine::assignment::Assignment;
use crate::engine::assignment::Conflict;
use crate::engine::clause_db::ClauseAllocator;
use crate::engine::heuristic::Heuristic;
use crate::engine::short_implication_graph::ShortImplicationsGraph;

/// The outcome of clause learning: the learnt clause with the asserting literal at index 0 and
/// the literal with the second-highest decision level at index 1 (redundantly repeated as
/// `backjump_level`), matching the contract consulted by the solver loop when backtracking.
#[derive(Clone, Debug, Default)]
pub struct ConflictAnalysisResult {
    pub learnt_literals: Vec<Literal>,
    pub backjump_level: usize,
    /// Long clauses traversed during resolution; the caller bumps their activity in the
    /// learnt-clause database.
    pub bumped_clauses: Vec<ClauseReference>,
}

fn reason_literals(antecedent: Antecedent, allocator: &ClauseAllocator) -> Vec<Literal> {
    match antecedent {
        Antecedent::Decision => Vec::new(),
        Antecedent::Binary(other) => vec![other],
        Antecedent::Ternary(o1, o2) => vec![o1, o2],
        Antecedent::Clause(reference) => allocator.get(reference).literals()[1..].to_vec(),
    }
}

/// Resolves the conflict using first-UIP: walks the trail backwards from the conflict,
/// resolving each literal assigned at the conflict level against its antecedent, stopping when
/// exactly one literal of the resolvent remains at the conflict level (the UIP).
///
/// # Bibliography
/// J. Marques-Silva, I. Lynce, and S. Malik, "Conflict-driven clause learning SAT solvers", in
/// Handbook of satisfiability, IOS press, 2021.
pub fn analyse_conflict(
    conflict: Conflict,
    assignment: &Assignment,
    allocator: &mut ClauseAllocator,
    heuristic: &mut Heuristic,
    graph: &ShortImplicationsGraph,
) -> ConflictAnalysisResult {
    let conflict_level = assignment.decision_level();
    let mut seen: KeyedVec<Var, bool> = KeyedVec::default();
    seen.resize(assignment.num_vars(), false);

    let mut counter = 0usize;
    let mut learnt_literals = vec![Literal::TRUE];
    let mut backjump_level = 0usize;
    let mut bumped_clauses = Vec::new();

    if let Antecedent::Clause(reference) = conflict.antecedent {
        bumped_clauses.push(reference);
    }
    absorb_reason(
        reason_literals(conflict.antecedent, allocator),
        assignment,
        conflict_level,
        &mut seen,
        &mut counter,
        &mut learnt_literals,
        &mut backjump_level,
        heuristic,
    );
    let existing_antecedent = assignment.antecedent(conflict.literal.var());
    if let Antecedent::Clause(reference) = existing_antecedent {
        bumped_clauses.push(reference);
    }
    absorb_reason(
        reason_literals(existing_antecedent, allocator),
        assignment,
        conflict_level,
        &mut seen,
        &mut counter,
        &mut learnt_literals,
        &mut backjump_level,
        heuristic,
    );

    let mut trail_index = assignment.num_trail_entries();
    let mut uip = conflict.literal;
    while counter > 0 {
        loop {
            trail_index -= 1;
            uip = assignment.trail_entry(trail_index);
            if seen[uip.var()] {
                break;
            }
        }
        seen[uip.var()] = false;
        counter -= 1;
        if counter == 0 {
            break;
        }
        let antecedent = assignment.antecedent(uip.var());
        if let Antecedent::Clause(reference) = antecedent {
            bumped_clauses.push(reference);
        }
        absorb_reason(
            reason_literals(antecedent, allocator),
            assignment,
            conflict_level,
            &mut seen,
            &mut counter,
            &mut learnt_literals,
            &mut backjump_level,
            heuristic,
        );
    }

    learnt_literals[0] = !uip;
    heuristic.on_conflict_decay();

    minimise(&mut learnt_literals, assignment, allocator, graph);

    ConflictAnalysisResult {
        learnt_literals,
        backjump_level,
        bumped_clauses,
    }
}

/// Derives the unsat core for a conflict discovered while only assumption-forced decisions are
/// active on the trail: resolves through the conflict's antecedents without stopping at a first
/// UIP, collecting every `Decision`-antecedent literal whose level was pushed for an assumption
/// rather than a search decision. `reason_literals` always returns the already-false literal as
/// stored in the antecedent, so the variable's actual trail literal — the assumption as the
/// caller originally gave it — is its negation.
pub fn analyse_final_conflict(
    conflict: Conflict,
    assignment: &Assignment,
    allocator: &ClauseAllocator,
    assumption_levels: &[usize],
) -> Vec<Literal> {
    let mut seen: KeyedVec<Var, bool> = KeyedVec::default();
    seen.resize(assignment.num_vars(), false);
    let mut core = Vec::new();

    let mut frontier = reason_literals(conflict.antecedent, allocator);
    frontier.push(conflict.literal);

    while let Some(literal) = frontier.pop() {
        let var = literal.var();
        if seen[var] || assignment.level(var) == 0 {
            continue;
        }
        seen[var] = true;
        match assignment.antecedent(var) {
            Antecedent::Decision => {
                if assumption_levels.contains(&assignment.level(var)) {
                    core.push(!literal);
                }
            }
            antecedent => frontier.extend(reason_literals(antecedent, allocator)),
        }
    }

    core
}

#[allow(clippy::too_many_arguments)]
fn absorb_reason(
    literals: Vec<Literal>,
    assignment: &Assignment,
    conflict_level: usize,
    seen: &mut KeyedVec<Var, bool>,
    counter: &mut usize,
    learnt_literals: &mut Vec<Literal>,
    backjump_level: &mut usize,
    heuristic: &mut Heuristic,
) {
    for lit in literals {
        let var = lit.var();
        if seen[var] {
            continue;
        }
        seen[var] = true;
        heuristic.on_conflict_bump(var);
        let level = assignment.literal_level(lit);
        if level == conflict_level {
            *counter += 1;
        } else if level > 0 {
            learnt_literals.push(lit);
            *backjump_level = (*backjump_level).max(level);
        }
    }
}

/// Removes literals from the tail of the learnt clause whose antecedent is already fully
/// subsumed by the rest of the clause (recursive self-subsumption, bounded to antecedents
/// that are themselves single-step reasons — the common case in practice).
///
/// Before falling back to a literal's actual propagation antecedent, also tries
/// [`ShortImplicationsGraph::reverse_arc`] on the literal itself: a binary clause `¬lit ∨ q`
/// with `q` already false and covered (present elsewhere in the clause, or fixed at level 0)
/// resolves against the learnt clause to the same effect as dropping `lit` outright — and it
/// applies even when `lit`'s own recorded antecedent is a decision, which the antecedent-based
/// check below can never remove on its own.
fn minimise(
    learnt: &mut Vec<Literal>,
    assignment: &Assignment,
    allocator: &ClauseAllocator,
    graph: &ShortImplicationsGraph,
) {
    if learnt.len() <= 1 {
        return;
    }
    let first = learnt[0];
    let marker: std::collections::HashSet<Var> = learnt.iter().map(|l| l.var()).collect();
    let max_level = assignment.decision_level();
    let is_covered = |literal: Literal| marker.contains(&literal.var()) || assignment.literal_level(literal) == 0;

    learnt.retain(|&lit| {
        if lit == first {
            return true;
        }
        if graph.reverse_arc(lit, max_level, assignment).is_some_and(is_covered) {
            return false;
        }
        let var = lit.var();
        match assignment.antecedent(var) {
            Antecedent::Decision => true,
            antecedent => {
                let reasons = reason_literals(antecedent, allocator);
                !reasons.iter().all(|&r| is_covered(r))
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::heuristic::HeuristicKind;

    fn lit(i: usize) -> Literal {
        Var::from_index(i).pos_lit()
    }

    #[test]
    fn single_decision_conflict_learns_unit_clause() {
        let mut assignment = Assignment::new(4);
        assignment.assume(lit(0));
        // forcing the negation immediately conflicts against the decision.
        let err = assignment.force(!lit(0), Antecedent::Decision).unwrap_err();

        let mut allocator = ClauseAllocator::default();
        let mut heuristic = Heuristic::new(HeuristicKind::Vsids, 4);
        let graph = ShortImplicationsGraph::new(4);
        let result = analyse_conflict(err, &assignment, &mut allocator, &mut heuristic, &graph);

        assert_eq!(result.learnt_literals.len(), 1);
        assert_eq!(result.backjump_level, 0);
    }

    #[test]
    fn chained_binary_implications_produce_asserting_literal() {
        let mut assignment = Assignment::new(4);
        assignment.assume(lit(0));
        assignment
            .force(lit(1), Antecedent::Binary(!lit(0)))
            .unwrap();
        let err = assignment
            .force(!lit(1), Antecedent::Binary(!lit(0)))
            .unwrap_err();

        let mut allocator = ClauseAllocator::default();
        let mut heuristic = Heuristic::new(HeuristicKind::Vsids, 4);
        let graph = ShortImplicationsGraph::new(4);
        let result = analyse_conflict(err, &assignment, &mut allocator, &mut heuristic, &graph);

        assert!(!result.learnt_literals.is_empty());
        assert_eq!(result.learnt_literals[0], !lit(0));
    }

    #[test]
    fn final_conflict_core_recovers_the_responsible_assumption() {
        // `lit(0)` assumed true, then immediately forced false by a unit-equivalent binary
        // fact tying it to `lit(1)`, which is itself assumed false. The core should name
        // exactly the two assumptions, not the propagated literal.
        let mut assignment = Assignment::new(4);
        assignment.assume(lit(0));
        assignment.assume(!lit(1));
        let err = assignment
            .force(!lit(0), Antecedent::Binary(lit(1)))
            .unwrap_err();

        let mut allocator = ClauseAllocator::default();
        let assumption_levels = vec![1, 2];
        let core = analyse_final_conflict(err, &assignment, &mut allocator, &assumption_levels);

        assert_eq!(core.len(), 2);
        assert!(core.contains(&lit(0)));
        assert!(core.contains(&!lit(1)));
    }

    #[test]
    fn reverse_arc_drops_a_decision_literal_covered_by_a_binary_fact() {
        // `lit(1)` is its own independent decision (no propagation antecedent tying it to
        // `lit(0)`), so the antecedent-based check alone would never drop it. A separate binary
        // fact `lit(0) -> lit(1)` lets `reverse_arc` resolve it away anyway, since `!lit(0)` is
        // already false and present elsewhere in the clause.
        let mut assignment = Assignment::new(4);
        let mut graph = ShortImplicationsGraph::new(4);
        graph.add_binary(lit(0), lit(1), false);

        assignment.assume(lit(0));
        assignment.assume(lit(1));
        assignment.assume(lit(2));

        let mut allocator = ClauseAllocator::default();
        let reference = allocator.create_clause(vec![!lit(2), !lit(0), !lit(1)], false);
        let err = assignment
            .force(!lit(2), Antecedent::Clause(reference))
            .unwrap_err();

        let mut heuristic = Heuristic::new(HeuristicKind::Vsids, 4);
        let result = analyse_conflict(err, &assignment, &mut allocator, &mut heuristic, &graph);

        assert!(!result.learnt_literals.iter().any(|&l| l.var() == lit(1).var()));
        assert!(result.learnt_literals.iter().any(|&l| l.var() == lit(0).var()));
    }
}

//! The CDCL search loop tying every other component together.

use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;
use crate::basic_types::Var;
use crate::clasp_assert_simple;
use crate::engine::assignment::Antecedent;
use crate::engine::assignment::Assignment;
use crate::engine::assignment::Conflict;
use crate::engine::clause_db::ClauseAllocator;
use crate::engine::clause_db::ClausalPropagator;
use crate::engine::conflict_analysis::analyse_conflict;
use crate::engine::conflict_analysis::analyse_final_conflict;
use crate::engine::config::DeletionConfig;
use crate::engine::config::RestartConfig;
use crate::engine::distributor::Distributor;
use crate::engine::distributor::SolverChannel;
use crate::engine::enumerator::EnumerationAction;
use crate::engine::enumerator::Enumerator;
use crate::engine::enumerator::Model;
use crate::engine::enumerator::SolveControl;
use crate::engine::heuristic::Heuristic;
use crate::engine::heuristic::HeuristicKind;
use crate::engine::learnt_db::LearntDb;
use crate::engine::post_propagator::check_model;
use crate::engine::post_propagator::run_chain;
use crate::engine::post_propagator::PostPropagator;
use crate::engine::propagator_extension::PropagatorExtension;
use crate::engine::propagator_extension::PropagatorExtensionAdapter;
use crate::engine::shared_context::SharedContext;
use crate::engine::short_implication_graph::ShortImplicationsGraph;
use crate::engine::termination::TerminationCondition;
use std::sync::Arc;
use std::sync::Mutex;

/// Outcome of [`Solver::solve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveResult {
    Satisfiable,
    /// Carries the unsat core: the subset of assumption literals whose negations participated
    /// in deriving the root-level conflict. Empty when the instance is unsatisfiable without any
    /// assumptions at all.
    Unsatisfiable(Vec<Literal>),
    /// The termination condition fired before the search concluded.
    Unknown,
}

/// The [`SolveControl`] handed to an attached [`Enumerator`] while a total assignment is still
/// on the trail. Wraps a mutable borrow of the solver itself; [`Solver::solve`] briefly takes its
/// enumerator out of `self` before constructing one of these, so the borrow this holds never
/// aliases the enumerator it is passed alongside.
struct SolverModelControl<'a> {
    solver: &'a mut Solver,
}

impl SolveControl for SolverModelControl<'_> {
    fn add_clause(&mut self, literals: &[Literal]) -> bool {
        self.solver.add_blocking_clause(literals)
    }
}

/// One solver's private search state: assignment, trail-indexed propagation cursors, local
/// clause storage and learnt-clause bookkeeping, heuristic state and post-propagator chain.
/// Each Solver holds exclusive ownership of its Assignment, trail, watch lists, local learnt
/// DB, and heuristic state.
///
/// The source shares long problem constraints and the short-implication graph physically
/// across attached solvers; here every `Solver` owns its own copy instead of an `Arc`-shared
/// one, which keeps the single-threaded core free of interior mutability while preserving the
/// same external contract (each solver still only ever sees problem constraints plus whatever
/// it learns itself).
#[derive(Debug)]
pub struct Solver {
    assignment: Assignment,
    short_implications: ShortImplicationsGraph,
    next_short_index: usize,
    allocator: ClauseAllocator,
    watches: ClausalPropagator,
    learnt_db: LearntDb,
    heuristic: Heuristic,
    post_propagators: Vec<Box<dyn PostPropagator>>,
    restart_config: RestartConfig,
    restart_limit: f64,
    conflicts_since_restart: u64,
    enumerator: Option<Enumerator>,
    /// Per-literal cost, consulted by [`Solver::current_cost`] when an [`Enumerator`] running in
    /// an optimisation mode is attached.
    objective: Vec<(Literal, i64)>,
    channel: Option<SolverChannel>,
    distributor: Option<Arc<Mutex<Distributor>>>,
    /// The decision level assumption literals were pushed at, in the order
    /// [`Solver::solve`] received them; consulted by [`analyse_final_conflict`] to tell
    /// assumption-derived decisions apart from search decisions.
    assumption_levels: Vec<usize>,
    /// Unit model-blocking clauses queued by [`SolverModelControl::add_clause`] while a total
    /// assignment is still on the trail; committed once the solver backjumps to level 0, since a
    /// unit clause can only be installed as a root-level fact.
    pending_root_units: Vec<Literal>,
}

impl Solver {
    pub fn new(
        num_vars: usize,
        heuristic_kind: HeuristicKind,
        restart_config: RestartConfig,
        deletion_config: DeletionConfig,
    ) -> Self {
        Solver {
            assignment: Assignment::new(num_vars),
            short_implications: ShortImplicationsGraph::new(num_vars),
            next_short_index: 0,
            allocator: ClauseAllocator::default(),
            watches: ClausalPropagator::new(num_vars),
            learnt_db: LearntDb::new(deletion_config.initial_budget, deletion_config.increment),
            heuristic: Heuristic::new(heuristic_kind, num_vars),
            post_propagators: Vec::new(),
            restart_limit: restart_config.initial_limit as f64,
            restart_config,
            conflicts_since_restart: 0,
            enumerator: None,
            objective: Vec::new(),
            channel: None,
            distributor: None,
            assumption_levels: Vec::new(),
            pending_root_units: Vec::new(),
        }
    }

    /// Attaches a fresh `Solver` to a frozen [`SharedContext`], copying its problem-level long
    /// clauses and short implications into private storage this solver may extend with its own
    /// learnt clauses during search. The source context keeps its own copy untouched.
    pub fn from_shared_context(
        context: &SharedContext,
        heuristic_kind: HeuristicKind,
        restart_config: RestartConfig,
        deletion_config: DeletionConfig,
    ) -> Self {
        clasp_assert_simple!(context.is_frozen());
        let num_vars = context.num_vars();
        let mut watches = ClausalPropagator::new(num_vars);
        let allocator = context.long_constraints().clone_into(&mut watches);
        Solver {
            assignment: Assignment::new(num_vars),
            short_implications: context.binary_ternary().clone_problem(),
            next_short_index: 0,
            allocator,
            watches,
            learnt_db: LearntDb::new(deletion_config.initial_budget, deletion_config.increment),
            heuristic: Heuristic::new(heuristic_kind, num_vars),
            post_propagators: Vec::new(),
            restart_limit: restart_config.initial_limit as f64,
            restart_config,
            conflicts_since_restart: 0,
            enumerator: None,
            objective: Vec::new(),
            channel: None,
            distributor: None,
            assumption_levels: Vec::new(),
            pending_root_units: Vec::new(),
        }
    }

    pub fn grow(&mut self, num_vars: usize) {
        self.assignment.grow(num_vars);
        self.short_implications.grow(num_vars);
        self.watches.grow(num_vars);
        self.heuristic.grow(num_vars);
    }

    pub fn register_post_propagator(&mut self, propagator: Box<dyn PostPropagator>) {
        self.post_propagators.push(propagator);
    }

    /// Wraps `extension` in the adapter that lets it participate in the post-propagator chain.
    pub fn register_propagator_extension(&mut self, extension: Box<dyn PropagatorExtension>) {
        self.post_propagators
            .push(Box::new(PropagatorExtensionAdapter::new(extension)));
    }

    /// Installs the model classifier/enumerator consulted once a total assignment is found.
    pub fn register_enumerator(&mut self, enumerator: Enumerator) {
        self.enumerator = Some(enumerator);
    }

    pub fn enumerator(&self) -> Option<&Enumerator> {
        self.enumerator.as_ref()
    }

    /// Sets the per-literal costs an attached optimising [`Enumerator`] minimises.
    pub fn register_objective(&mut self, objective: Vec<(Literal, i64)>) {
        self.objective = objective;
    }

    /// Joins the learnt-clause sharing cluster owned by `distributor` via `channel`.
    pub fn attach_distributor(&mut self, distributor: Arc<Mutex<Distributor>>, channel: SolverChannel) {
        self.distributor = Some(distributor);
        self.channel = Some(channel);
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Adds a problem clause directly to this solver's local store (used for clauses not
    /// physically shared via a [`crate::engine::shared_context::SharedContext`]).
    pub fn add_clause(&mut self, literals: Vec<Literal>) -> ClauseReference {
        self.watches.add_clause(literals, false, &mut self.allocator)
    }

    /// Adds a model-blocking clause on behalf of an attached [`Enumerator`], via
    /// [`SolverModelControl`]. Returns `false` if the clause is already falsified at the root
    /// level, meaning enumeration is exhausted. Unit clauses cannot be installed while a
    /// decision is active (a unit clause is a root-level fact), so they are queued and
    /// committed the next time the solver backjumps to level 0.
    fn add_blocking_clause(&mut self, literals: &[Literal]) -> bool {
        match literals.len() {
            0 => false,
            1 => {
                let literal = literals[0];
                if self.assignment.is_root_assignment(literal) {
                    return !self.assignment.is_false(literal);
                }
                self.pending_root_units.push(literal);
                true
            }
            _ => {
                if literals
                    .iter()
                    .all(|&l| self.assignment.is_root_assignment(l) && self.assignment.is_false(l))
                {
                    return false;
                }
                self.add_clause(literals.to_vec());
                true
            }
        }
    }

    /// Forces every clause queued by [`Solver::add_blocking_clause`] while deeper in the search
    /// as a root-level fact. Returns the resulting conflict, if any, so the caller can derive an
    /// unsat core instead of looping on a contradiction no decision can undo.
    fn commit_pending_root_units(&mut self) -> Result<(), Conflict> {
        for literal in std::mem::take(&mut self.pending_root_units) {
            self.assignment.force(literal, Antecedent::Decision)?;
        }
        Ok(())
    }

    pub fn add_binary(&mut self, p: Literal, q: Literal) {
        let _ = self.short_implications.add_binary(p, q, false);
    }

    pub fn add_ternary(&mut self, p: Literal, q: Literal, r: Literal) {
        let _ = self.short_implications.add_ternary(p, q, r, false);
    }

    /// Runs the three propagation sub-steps to a joint fixpoint, repeating whenever any step
    /// makes progress.
    fn propagate(&mut self) -> Result<(), Conflict> {
        loop {
            let mut changed = false;

            while self.next_short_index < self.assignment.num_trail_entries() {
                let literal = self.assignment.trail_entry(self.next_short_index);
                self.short_implications.propagate(literal, &mut self.assignment)?;
                self.next_short_index += 1;
                changed = true;
            }

            let before = self.assignment.num_trail_entries();
            self.watches.propagate(&mut self.assignment, &mut self.allocator)?;
            changed |= self.assignment.num_trail_entries() != before;

            let before_chain = self.assignment.num_trail_entries();
            run_chain(
                &mut self.post_propagators,
                &mut self.assignment,
                &mut self.allocator,
                &mut self.watches,
            )?;
            changed |= self.assignment.num_trail_entries() != before_chain;

            if !changed {
                return Ok(());
            }
        }
    }

    /// Marks every clause currently acting as an antecedent on the trail as protected, so a
    /// subsequent [`LearntDb::reduce`] never deletes a clause still needed to explain an
    /// assigned literal.
    fn protect_locked_clauses(&mut self) -> Vec<ClauseReference> {
        let mut protected = Vec::new();
        for &literal in self.assignment.trail() {
            if let Antecedent::Clause(reference) = self.assignment.antecedent(literal.var()) {
                self.allocator.get_mut(reference).set_protected(true);
                protected.push(reference);
            }
        }
        protected
    }

    fn undo_to(&mut self, level: usize) {
        let undone = self.assignment.undo_until(level);
        for &literal in &undone {
            self.heuristic.on_unassign(literal.var());
        }
        let assignment = &self.assignment;
        for propagator in &mut self.post_propagators {
            propagator.undo_level(level, &undone, assignment);
        }
        self.watches.synchronise(self.assignment.num_trail_entries());
        self.next_short_index = self.assignment.num_trail_entries();
    }

    /// Shares a freshly-learnt clause with the rest of this solver's distributor cluster, if
    /// attached. `is_static` clauses bypass the receiver's usual LBD ceiling.
    fn publish_learnt(&self, literals: &[Literal], lbd: u32, is_static: bool) {
        if let (Some(distributor), Some(channel)) = (&self.distributor, &self.channel) {
            let distributor = distributor.lock().unwrap();
            let _ = distributor.publish(channel, literals, lbd, is_static);
        }
    }

    /// Installs every learnt clause shared by other solvers in the cluster since the last poll.
    /// Unlike this solver's own learning, nothing is forced immediately: a clause from another
    /// solver's branch is not necessarily unit under this solver's current assignment.
    fn receive_shared_clauses(&mut self) {
        let Some(channel) = self.channel.as_ref() else {
            return;
        };
        for clause in channel.receive() {
            let literals = clause.literals.to_vec();
            match literals.len() {
                1 => {
                    if self.assignment.decision_level() == 0 {
                        let _ = self.assignment.force(literals[0], Antecedent::Decision);
                    }
                }
                2 => {
                    let _ = self.short_implications.add_binary(!literals[0], literals[1], true);
                }
                3 => {
                    let _ = self
                        .short_implications
                        .add_ternary(!literals[0], literals[1], literals[2], true);
                }
                _ => {
                    let reference = self.watches.add_clause(literals.clone(), true, &mut self.allocator);
                    self.learnt_db
                        .register(reference, &literals, &self.assignment, &mut self.allocator);
                }
            }
        }
    }

    /// The current objective value: the sum of every objective literal's cost that is currently
    /// true. `None` if no objective has been registered.
    fn current_cost(&self) -> Option<i64> {
        if self.objective.is_empty() {
            return None;
        }
        Some(
            self.objective
                .iter()
                .filter(|&&(literal, _)| self.assignment.is_true(literal))
                .map(|&(_, cost)| cost)
                .sum(),
        )
    }

    /// Installs a freshly-learnt clause and immediately assigns its asserting literal. The
    /// clause is unit at `backjump_level` by construction of first-UIP, with the asserting
    /// literal conventionally at index 0.
    fn add_learnt_clause(&mut self, literals: Vec<Literal>) {
        let asserting = literals[0];
        match literals.len() {
            1 => {
                self.assignment
                    .force(asserting, Antecedent::Decision)
                    .expect("asserting literal of a unit learnt clause cannot already be false");
            }
            2 => {
                let other = literals[1];
                let _ = self.short_implications.add_binary(!asserting, other, true);
                self.assignment
                    .force(asserting, Antecedent::Binary(other))
                    .expect("asserting literal cannot already be false");
            }
            3 => {
                let q = literals[1];
                let r = literals[2];
                let _ = self.short_implications.add_ternary(!asserting, q, r, true);
                self.assignment
                    .force(asserting, Antecedent::Ternary(q, r))
                    .expect("asserting literal cannot already be false");
            }
            _ => {
                let reference = self.watches.add_clause(literals.clone(), true, &mut self.allocator);
                self.learnt_db
                    .register(reference, &literals, &self.assignment, &mut self.allocator);
                self.assignment
                    .force(asserting, Antecedent::Clause(reference))
                    .expect("asserting literal cannot already be false");
            }
        }
        self.publish_learnt(&literals, literals.len() as u32, false);
    }

    fn maybe_restart(&mut self) {
        if (self.conflicts_since_restart as f64) < self.restart_limit {
            return;
        }
        log::debug!("restarting at {} conflicts, next limit {}", self.conflicts_since_restart, self.restart_limit * self.restart_config.increase_factor);
        self.undo_to(0);
        self.conflicts_since_restart = 0;
        self.restart_limit *= self.restart_config.increase_factor;
    }

    fn maybe_reduce(&mut self) {
        if !self.learnt_db.should_reduce() {
            return;
        }
        let protected = self.protect_locked_clauses();
        let dropped = self.learnt_db.reduce(&mut self.allocator);
        log::debug!("learnt-db reduction dropped {} clauses", dropped.len());
        for reference in &protected {
            self.allocator.get_mut(*reference).set_protected(false);
        }
        for reference in dropped {
            self.watches.remove_from_watch_lists(self.allocator.get(reference), reference);
        }
    }

    /// Whether every currently active decision level was pushed for an assumption rather than a
    /// search decision, i.e. the search has not branched past the assumptions yet.
    fn within_assumption_prefix(&self) -> bool {
        self.assignment.decision_level() <= self.assumption_levels.len()
    }

    fn final_conflict(&mut self, conflict: Conflict) -> SolveResult {
        let core = analyse_final_conflict(conflict, &self.assignment, &mut self.allocator, &self.assumption_levels);
        SolveResult::Unsatisfiable(core)
    }

    /// `solve(assumptions) -> sat | unsat | unknown`.
    pub fn solve(&mut self, assumptions: &[Literal], termination: &mut dyn TerminationCondition) -> SolveResult {
        self.assumption_levels.clear();
        for &assumption in assumptions {
            let level_before = self.assignment.decision_level();
            if !self.assignment.assume(assumption) {
                let conflict = Conflict {
                    literal: assumption,
                    antecedent: Antecedent::Decision,
                };
                return self.final_conflict(conflict);
            }
            if self.assignment.decision_level() > level_before {
                self.assumption_levels.push(self.assignment.decision_level());
            }
        }

        loop {
            if termination.should_stop() {
                return SolveResult::Unknown;
            }

            self.receive_shared_clauses();

            if let Err(conflict) = self.propagate() {
                if self.within_assumption_prefix() {
                    return self.final_conflict(conflict);
                }
                termination.encountered_conflict();
                let analysis = analyse_conflict(
                    conflict,
                    &self.assignment,
                    &mut self.allocator,
                    &mut self.heuristic,
                    &self.short_implications,
                );
                self.learnt_db.bump_participants(&analysis.bumped_clauses, &mut self.allocator);
                self.undo_to(analysis.backjump_level);
                self.add_learnt_clause(analysis.learnt_literals);
                self.conflicts_since_restart += 1;
                continue;
            }

            if self.assignment.num_trail_entries() == self.assignment.num_vars() {
                if let Err(conflict) =
                    check_model(&mut self.post_propagators, &mut self.assignment, &mut self.allocator, &mut self.watches)
                {
                    if self.within_assumption_prefix() {
                        return self.final_conflict(conflict);
                    }
                    termination.encountered_conflict();
                    let analysis = analyse_conflict(
                        conflict,
                        &self.assignment,
                        &mut self.allocator,
                        &mut self.heuristic,
                        &self.short_implications,
                    );
                    self.undo_to(analysis.backjump_level);
                    self.add_learnt_clause(analysis.learnt_literals);
                    continue;
                }

                if let Some(action) = self.report_model() {
                    match action {
                        EnumerationAction::Stop => return SolveResult::Satisfiable,
                        EnumerationAction::Continue | EnumerationAction::Improved { .. } => {
                            self.undo_to(0);
                            if let Err(conflict) = self.commit_pending_root_units() {
                                return self.final_conflict(conflict);
                            }
                            continue;
                        }
                    }
                }
                return SolveResult::Satisfiable;
            }

            self.maybe_restart();
            self.maybe_reduce();

            let Some(var) = self.heuristic.select(&self.assignment) else {
                return SolveResult::Satisfiable;
            };
            let polarity = self.heuristic.preferred_polarity(var);
            let literal = if polarity { var.pos_lit() } else { var.neg_lit() };
            clasp_assert_simple!(self.assignment.assume(literal));
        }
    }

    /// Classifies the total assignment currently on the trail through the attached
    /// [`Enumerator`], if any, reporting it and applying whatever model-blocker or minimisation
    /// bound it decides on. Returns `None` if no enumerator is attached, in which case the
    /// caller should treat the model as a final answer.
    fn report_model(&mut self) -> Option<EnumerationAction> {
        let mut enumerator = self.enumerator.take()?;
        let projected = enumerator.projected().to_vec();
        let model = Model::from_assignment(&self.assignment, &projected);
        let cost = self.current_cost();
        let (_, action) = {
            let mut control = SolverModelControl { solver: self };
            enumerator.on_model(model, cost, &mut control)
        };
        self.enumerator = Some(enumerator);
        Some(action)
    }

    pub fn num_vars(&self) -> usize {
        self.assignment.num_vars()
    }

    pub fn true_literals(&self) -> Vec<Literal> {
        (0..self.num_vars())
            .map(Var::from_index)
            .filter(|&var| self.assignment.is_true(var.pos_lit()))
            .map(Var::pos_lit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::termination::Indefinite;

    fn lit(i: usize) -> Literal {
        Var::from_index(i).pos_lit()
    }

    fn solver(num_vars: usize) -> Solver {
        Solver::new(num_vars, HeuristicKind::Vsids, RestartConfig::default(), DeletionConfig::default())
    }

    fn is_unsat(result: &SolveResult) -> bool {
        matches!(result, SolveResult::Unsatisfiable(_))
    }

    #[test]
    fn exclusive_pair_is_satisfiable_with_exactly_one_true() {
        // `lit1 ∨ lit2` together with `¬lit1 ∨ ¬lit2`: exactly one of the two is ever true.
        let mut solver = solver(3);
        solver.add_clause(vec![lit(1), lit(2)]);
        solver.add_binary(lit(1), !lit(2));
        let result = solver.solve(&[], &mut Indefinite);
        assert_eq!(result, SolveResult::Satisfiable);
        assert!(solver.assignment().is_true(lit(1)) ^ solver.assignment().is_true(lit(2)));
    }

    #[test]
    fn conflicting_unit_assumptions_are_unsat() {
        let mut solver = solver(2);
        let result = solver.solve(&[lit(1), !lit(1)], &mut Indefinite);
        assert!(is_unsat(&result));
        let SolveResult::Unsatisfiable(core) = result else {
            unreachable!()
        };
        assert_eq!(core, vec![lit(1)]);
    }

    #[test]
    fn four_clauses_over_two_vars_is_unsat() {
        // Every one of the four truth-assignments to (lit1, lit2) violates one of the clauses.
        let mut solver = solver(3);
        solver.add_clause(vec![lit(1), lit(2)]);
        solver.add_clause(vec![lit(1), !lit(2)]);
        solver.add_clause(vec![!lit(1), lit(2)]);
        solver.add_clause(vec![!lit(1), !lit(2)]);
        let result = solver.solve(&[], &mut Indefinite);
        assert!(is_unsat(&result));
    }

    #[test]
    fn random_instances_preserve_trail_level_monotonicity() {
        use rand::rngs::SmallRng;
        use rand::Rng;
        use rand::SeedableRng;

        let mut rng = SmallRng::seed_from_u64(0x5eed);
        for _ in 0..20 {
            let num_vars = 5;
            let mut solver = solver(num_vars);
            for _ in 0..8 {
                let a = rng.gen_range(1..num_vars);
                let b = rng.gen_range(1..num_vars);
                let la = if rng.gen_bool(0.5) { lit(a) } else { !lit(a) };
                let lb = if rng.gen_bool(0.5) { lit(b) } else { !lit(b) };
                solver.add_clause(vec![la, lb]);
            }
            let _ = solver.solve(&[], &mut Indefinite);

            let trail = solver.assignment().trail();
            for pair in trail.windows(2) {
                assert!(solver.assignment().level(pair[0].var()) <= solver.assignment().level(pair[1].var()));
            }
        }
    }

    #[test]
    fn attaching_to_a_frozen_shared_context_copies_its_problem_clauses() {
        use crate::basic_types::VarType;
        use crate::engine::shared_context::ShareMode;

        let mut context = SharedContext::new(ShareMode::Auto);
        let first = context.add_vars(2, VarType::Plain).unwrap();
        let second = Var::from_index(first.index() + 1);
        context.add_long(vec![first.pos_lit(), second.pos_lit()]).unwrap();
        assert!(context.end_init());

        let mut solver = Solver::from_shared_context(&context, HeuristicKind::Vsids, RestartConfig::default(), DeletionConfig::default());
        let result = solver.solve(&[!first.pos_lit(), !second.pos_lit()], &mut Indefinite);
        assert!(is_unsat(&result));
    }

    #[test]
    fn enumerator_counts_every_projected_model_before_exhausting_the_search() {
        use crate::engine::enumerator::EnumerationMode;
        use crate::engine::enumerator::OptMode;

        // A single projected variable has exactly two models; once both have been blocked the
        // enumerator can no longer add a blocker for the one remaining value, so it stops the
        // search rather than looping forever.
        let mut solver = solver(2);
        let enumerator = Enumerator::new(EnumerationMode::Record, OptMode::Ignore, vec![lit(1)], 0);
        solver.register_enumerator(enumerator);
        let result = solver.solve(&[], &mut Indefinite);
        assert_eq!(result, SolveResult::Satisfiable);
        assert_eq!(solver.enumerator().unwrap().models_found(), 2);
    }

    #[test]
    fn published_learnt_clauses_are_installed_by_other_attached_solvers() {
        use crate::engine::distributor::SharePolicy;

        let distributor = Arc::new(Mutex::new(Distributor::new(SharePolicy::default())));
        let channel_a = distributor.lock().unwrap().attach();
        let channel_b = distributor.lock().unwrap().attach();

        let mut solver_a = solver(3);
        solver_a.attach_distributor(Arc::clone(&distributor), channel_a);
        let mut solver_b = solver(3);
        solver_b.attach_distributor(Arc::clone(&distributor), channel_b);

        solver_a.add_learnt_clause(vec![lit(1)]);
        solver_b.receive_shared_clauses();

        assert!(solver_b.assignment().is_true(lit(1)));
    }
}

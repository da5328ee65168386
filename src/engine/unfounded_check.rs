//! Unfounded-set checker enforcing stable-model semantics.

use crate::basic_types::ClauseReference;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::keyed_vec::StorageKey;
use crate::engine::assignment::Antecedent;
use crate::engine::assignment::Assignment;
use crate::engine::assignment::Conflict;
use crate::engine::clause_db::ClauseAllocator;
use crate::engine::clause_db::ClausalPropagator;
use crate::engine::post_propagator::PostPropagator;
use crate::engine::post_propagator::Priority;
use crate::engine::post_propagator::PropagationResult;

/// Typed index into [`PrgDepGraph`]'s atom table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomId(u32);

impl AtomId {
    pub fn from_index(index: usize) -> Self {
        AtomId(index as u32)
    }
}

impl StorageKey for AtomId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        AtomId::from_index(index)
    }
}

/// Typed index into [`PrgDepGraph`]'s body table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(u32);

impl BodyId {
    pub fn from_index(index: usize) -> Self {
        BodyId(index as u32)
    }
}

impl StorageKey for BodyId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        BodyId::from_index(index)
    }
}

/// Strongly-connected-component id; trivial SCCs (singleton, no self-loop) never need
/// unfounded-set checking.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SccId(pub u32);

/// Source-pointer bookkeeping for one atom of a ground logic program.
#[derive(Clone, Debug)]
pub struct AtomNode {
    pub literal: Literal,
    pub scc: SccId,
    pub non_trivial: bool,
    /// Bodies that can support this atom.
    pub supporting_bodies: Vec<BodyId>,
}

/// A normal, choice, weight or disjunctive body (extended bodies additionally populate
/// `bound`/`weights`; unweighted bodies leave them empty and fall back to plain counting).
#[derive(Clone, Debug)]
pub struct BodyNode {
    pub literal: Literal,
    pub scc: SccId,
    /// Positive-body predecessor atoms that must themselves be sourced for this body to
    /// support an atom in the same SCC: at least one predecessor must currently be sourced.
    pub predecessors: Vec<AtomId>,
    /// Literals external to the dependency graph (negative-body literals and literals of
    /// predecessors outside the SCC) whose falsity makes the body unable to support anything.
    pub external_literals: Vec<Literal>,
    pub heads: Vec<AtomId>,
    /// Weight-constraint bound; `None` for normal/choice bodies.
    pub bound: Option<i64>,
    /// Parallel to `predecessors`, the weight contributed by each when true.
    pub weights: Vec<i64>,
}

/// Bipartite atom/body dependency graph with per-node SCC membership.
#[derive(Debug, Default)]
pub struct PrgDepGraph {
    atoms: KeyedVec<AtomId, AtomNode>,
    bodies: KeyedVec<BodyId, BodyNode>,
}

impl PrgDepGraph {
    pub fn add_atom(&mut self, literal: Literal, scc: SccId, non_trivial: bool) -> AtomId {
        let id = AtomId::from_index(self.atoms.len());
        self.atoms.push(AtomNode {
            literal,
            scc,
            non_trivial,
            supporting_bodies: Vec::new(),
        });
        id
    }

    pub fn add_body(
        &mut self,
        literal: Literal,
        scc: SccId,
        predecessors: Vec<AtomId>,
        external_literals: Vec<Literal>,
    ) -> BodyId {
        let id = BodyId::from_index(self.bodies.len());
        self.bodies.push(BodyNode {
            literal,
            scc,
            predecessors,
            external_literals,
            heads: Vec::new(),
            bound: None,
            weights: Vec::new(),
        });
        id
    }

    /// Sets a weight-constraint bound and per-predecessor weights on an already-added body.
    pub fn set_weight_bound(&mut self, body: BodyId, bound: i64, weights: Vec<i64>) {
        let node = &mut self.bodies[body];
        debug_assert_eq!(weights.len(), node.predecessors.len());
        node.bound = Some(bound);
        node.weights = weights;
    }

    /// Links `body` as a potential source of `atom`.
    pub fn add_support(&mut self, atom: AtomId, body: BodyId) {
        self.atoms[atom].supporting_bodies.push(body);
        self.bodies[body].heads.push(atom);
    }

    pub fn atom(&self, atom: AtomId) -> &AtomNode {
        &self.atoms[atom]
    }

    pub fn body(&self, body: BodyId) -> &BodyNode {
        &self.bodies[body]
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }
}

/// How the checker materialises the reason clause for a forced-false atom.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReasonStrategy {
    /// Recomputes the external false-literal set on demand every time it is needed.
    OnlyReason,
    /// Asserts one literal at a time using a reason cached per atom from the last sweep.
    CommonReason,
}

/// Enforces well-founded support for every atom of a non-trivial SCC, running as a
/// [`PostPropagator`] at [`Priority::ClassUfs`].
#[derive(Debug)]
pub struct UnfoundedCheck {
    graph: PrgDepGraph,
    sourced: KeyedVec<AtomId, bool>,
    reason_strategy: ReasonStrategy,
    cached_reasons: KeyedVec<AtomId, Vec<Literal>>,
}

impl UnfoundedCheck {
    pub fn new(graph: PrgDepGraph, reason_strategy: ReasonStrategy) -> Self {
        let num_atoms = graph.num_atoms();
        let mut sourced = KeyedVec::default();
        sourced.resize(num_atoms, true);
        let mut cached_reasons = KeyedVec::default();
        cached_reasons.resize(num_atoms, Vec::new());
        UnfoundedCheck {
            graph,
            sourced,
            reason_strategy,
            cached_reasons,
        }
    }

    fn body_potential_weight(&self, body: &BodyNode, assignment: &Assignment) -> Option<i64> {
        let bound = body.bound?;
        let mut potential = 0i64;
        for (predecessor, &weight) in body.predecessors.iter().zip(body.weights.iter()) {
            let literal = self.graph.atom(*predecessor).literal;
            if !assignment.is_false(literal) {
                potential += weight;
            }
        }
        Some(if potential >= bound { 1 } else { 0 })
    }

    /// Whether `body` can currently support an atom: not false itself, every external literal
    /// not false, and (for weight bodies) the running potential still permits the bound.
    fn body_is_viable(&self, body: &BodyNode, assignment: &Assignment) -> bool {
        if assignment.is_false(body.literal) {
            return false;
        }
        if body
            .external_literals
            .iter()
            .any(|&literal| assignment.is_false(literal))
        {
            return false;
        }
        if let Some(weight_ok) = self.body_potential_weight(body, assignment) {
            if weight_ok == 0 {
                return false;
            }
        }
        true
    }

    /// A body additionally requires every in-SCC predecessor to be currently sourced: a body
    /// with several in-SCC predecessors needs all of them true and sourced to itself be a valid
    /// support path.
    fn body_predecessors_sourced(&self, body: &BodyNode) -> bool {
        body.predecessors.iter().all(|&predecessor| {
            let predecessor_node = self.graph.atom(predecessor);
            predecessor_node.scc != body.scc || self.sourced[predecessor]
        })
    }

    /// Recomputes `sourced` to a fixpoint given the current assignment. Returns the unfounded
    /// atoms: non-false atoms in a non-trivial SCC with no viable, fully-sourced support.
    fn recompute(&mut self, assignment: &Assignment) -> Vec<AtomId> {
        for index in 0..self.sourced.len() {
            let atom = AtomId::from_index(index);
            self.sourced[atom] = !self.graph.atom(atom).non_trivial;
        }

        loop {
            let mut changed = false;
            for index in 0..self.sourced.len() {
                let atom = AtomId::from_index(index);
                if self.sourced[atom] || !self.graph.atom(atom).non_trivial {
                    continue;
                }
                let has_support = self.graph.atom(atom).supporting_bodies.iter().any(|&body_id| {
                    let body = self.graph.body(body_id);
                    self.body_is_viable(body, assignment) && self.body_predecessors_sourced(body)
                });
                if has_support {
                    self.sourced[atom] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        (0..self.sourced.len())
            .map(AtomId::from_index)
            .filter(|&atom| {
                let node = self.graph.atom(atom);
                node.non_trivial && !self.sourced[atom] && !assignment.is_false(node.literal)
            })
            .collect()
    }

    /// The external literals whose falsity makes every support of `atom` unavailable (the
    /// *minimal external reason*).
    fn external_reason(&self, atom: AtomId, assignment: &Assignment) -> Vec<Literal> {
        let mut reason = Vec::new();
        for &body_id in &self.graph.atom(atom).supporting_bodies {
            let body = self.graph.body(body_id);
            if assignment.is_false(body.literal) {
                reason.push(body.literal);
                continue;
            }
            for &literal in &body.external_literals {
                if assignment.is_false(literal) {
                    reason.push(literal);
                    break;
                }
            }
        }
        reason.sort_unstable();
        reason.dedup();
        reason
    }

    fn reason_for(&mut self, atom: AtomId, assignment: &Assignment) -> Vec<Literal> {
        match self.reason_strategy {
            ReasonStrategy::OnlyReason => self.external_reason(atom, assignment),
            ReasonStrategy::CommonReason => {
                if self.cached_reasons[atom].is_empty() {
                    self.cached_reasons[atom] = self.external_reason(atom, assignment);
                }
                self.cached_reasons[atom].clone()
            }
        }
    }

    /// Forces every atom of `unfounded` false, with a reason clause recording the external
    /// literals that make every one of its supports unavailable.
    fn force_unfounded(
        &mut self,
        unfounded: Vec<AtomId>,
        assignment: &mut Assignment,
        allocator: &mut ClauseAllocator,
    ) -> Result<bool, Conflict> {
        let mut changed = false;
        for atom in unfounded {
            log::debug!("atom {:?} is unfounded, forcing its literal false", atom);
            let literal = self.graph.atom(atom).literal;
            if assignment.is_false(literal) {
                continue;
            }
            let reason = self.reason_for(atom, assignment);
            if reason.is_empty() {
                // No supporting body at all: the atom is unconditionally unfounded, with
                // nothing to resolve against. Treat it like a decision rather than fabricate a
                // self-referential unit clause.
                assignment.force(!literal, Antecedent::Decision)?;
            } else {
                let mut literals = Vec::with_capacity(reason.len() + 1);
                literals.push(!literal);
                literals.extend(reason);
                let reference: ClauseReference = allocator.create_clause(literals, true);
                assignment.force(!literal, Antecedent::Clause(reference))?;
            }
            changed = true;
        }
        Ok(changed)
    }
}

impl PostPropagator for UnfoundedCheck {
    fn priority(&self) -> Priority {
        Priority::ClassUfs
    }

    fn propagate_fixpoint(
        &mut self,
        assignment: &mut Assignment,
        allocator: &mut ClauseAllocator,
        _watches: &mut ClausalPropagator,
    ) -> Result<PropagationResult, Conflict> {
        let unfounded = self.recompute(assignment);
        if unfounded.is_empty() {
            return Ok(PropagationResult::NoConflict);
        }
        let changed = self.force_unfounded(unfounded, assignment, allocator)?;
        Ok(PropagationResult::Changed {
            fixpoint_reached: !changed,
        })
    }

    fn is_model(
        &mut self,
        assignment: &mut Assignment,
        _allocator: &mut ClauseAllocator,
        _watches: &mut ClausalPropagator,
    ) -> Result<(), Conflict> {
        let unfounded = self.recompute(assignment);
        if let Some(&atom) = unfounded.first() {
            let literal = self.graph.atom(atom).literal;
            return Err(Conflict {
                literal,
                antecedent: Antecedent::Decision,
            });
        }
        Ok(())
    }

    fn reset(&mut self) {
        for reasons in self.cached_reasons.iter_mut() {
            reasons.clear();
        }
    }

    fn undo_level(&mut self, _level: usize, _undone: &[Literal], _assignment: &Assignment) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Var;

    fn lit(i: usize) -> Literal {
        Var::from_index(i).pos_lit()
    }

    /// `a :- not b. b :- not a.` — each atom's only support depends on the other being false,
    /// so neither is in a cycle through positive dependencies; both are trivially sourced.
    #[test]
    fn acyclic_support_leaves_every_atom_sourced() {
        let mut graph = PrgDepGraph::default();
        let a = graph.add_atom(lit(0), SccId(0), false);
        let b = graph.add_atom(lit(1), SccId(0), false);
        let body_a = graph.add_body(lit(0), SccId(0), vec![], vec![!lit(1)]);
        let body_b = graph.add_body(lit(1), SccId(0), vec![], vec![!lit(0)]);
        graph.add_support(a, body_a);
        graph.add_support(b, body_b);

        let mut checker = UnfoundedCheck::new(graph, ReasonStrategy::OnlyReason);
        let assignment = Assignment::new(3);
        assert!(checker.recompute(&assignment).is_empty());
    }

    /// `a :- b. b :- a. a :- not c. c :- not a.` with `c` forced false and the `a :- not c`
    /// route blocked: the only remaining support for `a`/`b` is their mutual positive cycle,
    /// so both are unfounded.
    #[test]
    fn positive_cycle_without_external_support_is_unfounded() {
        let mut graph = PrgDepGraph::default();
        let a = graph.add_atom(lit(0), SccId(1), true);
        let b = graph.add_atom(lit(1), SccId(1), true);
        let body_ab = graph.add_body(lit(2), SccId(1), vec![b], vec![]);
        let body_ba = graph.add_body(lit(3), SccId(1), vec![a], vec![]);
        graph.add_support(a, body_ab);
        graph.add_support(b, body_ba);

        let mut checker = UnfoundedCheck::new(graph, ReasonStrategy::OnlyReason);
        let mut assignment = Assignment::new(4);
        assignment
            .force(lit(2), Antecedent::Decision)
            .unwrap();
        assignment
            .force(lit(3), Antecedent::Decision)
            .unwrap();
        let unfounded = checker.recompute(&assignment);
        assert_eq!(unfounded.len(), 2);
    }

    #[test]
    fn force_unfounded_asserts_negative_literal_with_reason() {
        let mut graph = PrgDepGraph::default();
        let a = graph.add_atom(lit(0), SccId(1), true);
        let body = graph.add_body(lit(1), SccId(1), vec![a], vec![]);
        graph.add_support(a, body);

        let mut checker = UnfoundedCheck::new(graph, ReasonStrategy::OnlyReason);
        let mut assignment = Assignment::new(2);
        assignment.force(lit(1), Antecedent::Decision).unwrap();
        let mut allocator = ClauseAllocator::default();
        let mut watches = ClausalPropagator::new(2);
        checker
            .propagate_fixpoint(&mut assignment, &mut allocator, &mut watches)
            .unwrap();
        assert!(assignment.is_false(lit(0)));
    }
}

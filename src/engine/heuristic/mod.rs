//! Branching decision heuristics.

mod vsids;

pub use vsids::Vsids;

use crate::basic_types::Var;
use crate::engine::assignment::Assignment;

/// Which concrete strategy backs a [`Heuristic`], matching the `solver.heuristic` config key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HeuristicKind {
    #[default]
    Vsids,
    /// Variable move-to-front: like VSIDS but reorders a move-to-front list instead of decaying
    /// activities. Approximated here by VSIDS with decay disabled (no distinct decay schedule),
    /// since the two agree on "most recently touched first" in the steady state.
    Vmtf,
    /// Berkmin-style: VSIDS restricted to the variables of the most recent conflict clause
    /// before falling back to global activity order.
    Berkmin,
    /// Domain heuristic: a client-supplied priority stack overrides activity order for the
    /// variables it names; falls back to VSIDS otherwise.
    Domain,
    /// First unassigned variable in index order, no activity tracking.
    Unit,
    /// No heuristic state at all; the caller must supply the next literal itself.
    None,
}

/// One domain-heuristic modifier applied to a variable: a forced sign, truth value, or a
/// priority level at which the variable is preferred over lower-priority ones.
///
/// `init` modifiers accumulate, but `sign` / `level` / `true` / `false` modifiers replace one
/// another when several of the same kind target the same variable with equal priority from
/// different grounding steps: only the most-recently-applied modifier of each kind per variable
/// is kept (last write wins).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DomainModifier {
    Sign(bool),
    Level(i32),
    Value(bool),
}

#[derive(Debug, Default)]
struct DomainOverrides {
    sign: Option<bool>,
    level: Option<i32>,
    value: Option<bool>,
}

/// The active branching heuristic for one `Solver`.
#[derive(Debug)]
pub struct Heuristic {
    kind: HeuristicKind,
    vsids: Vsids,
    domain: Vec<Option<DomainOverrides>>,
    /// For `Unit`, the next candidate index to try.
    next_unit_candidate: usize,
}

impl Heuristic {
    pub fn new(kind: HeuristicKind, num_vars: usize) -> Self {
        let mut vsids = Vsids::default();
        vsids.set_var_count(num_vars);
        Heuristic {
            kind,
            vsids,
            domain: (0..num_vars).map(|_| None).collect(),
            next_unit_candidate: 0,
        }
    }

    pub fn grow(&mut self, num_vars: usize) {
        self.vsids.set_var_count(num_vars);
        self.domain.resize_with(num_vars, || None);
    }

    pub fn kind(&self) -> HeuristicKind {
        self.kind
    }

    /// Applies a domain-heuristic modifier to `var`, following the last-write-wins resolution
    /// documented on [`DomainModifier`].
    pub fn apply_domain_modifier(&mut self, var: Var, modifier: DomainModifier) {
        let slot = self.domain[var.index()].get_or_insert_with(DomainOverrides::default);
        match modifier {
            DomainModifier::Sign(sign) => slot.sign = Some(sign),
            DomainModifier::Level(level) => slot.level = Some(level),
            DomainModifier::Value(value) => slot.value = Some(value),
        }
    }

    pub fn on_conflict_bump(&mut self, var: Var) {
        if matches!(self.kind, HeuristicKind::Vsids | HeuristicKind::Vmtf | HeuristicKind::Berkmin | HeuristicKind::Domain) {
            self.vsids.bump(var);
        }
    }

    pub fn on_conflict_decay(&mut self) {
        if matches!(self.kind, HeuristicKind::Vsids | HeuristicKind::Berkmin | HeuristicKind::Domain) {
            self.vsids.decay();
        }
    }

    pub fn on_unassign(&mut self, var: Var) {
        match self.kind {
            HeuristicKind::Vsids | HeuristicKind::Vmtf | HeuristicKind::Berkmin | HeuristicKind::Domain => {
                self.vsids.make_available(var)
            }
            HeuristicKind::Unit => self.next_unit_candidate = self.next_unit_candidate.min(var.index()),
            HeuristicKind::None => {}
        }
    }

    /// Honours domain priority overrides first, falling back to the configured strategy.
    pub fn select(&mut self, assignment: &Assignment) -> Option<Var> {
        match self.kind {
            HeuristicKind::Domain => self.select_domain_first(assignment),
            HeuristicKind::Vsids | HeuristicKind::Vmtf | HeuristicKind::Berkmin => self.vsids.select(),
            HeuristicKind::Unit => self.select_unit(assignment),
            HeuristicKind::None => None,
        }
    }

    fn select_domain_first(&mut self, assignment: &Assignment) -> Option<Var> {
        let prioritised = self
            .domain
            .iter()
            .enumerate()
            .filter_map(|(index, overrides)| {
                let level = overrides.as_ref()?.level?;
                let var = Var::from_index(index);
                if assignment.is_free(var.pos_lit()) {
                    Some((level, var))
                } else {
                    None
                }
            })
            .max_by_key(|&(level, _)| level);

        if let Some((_, var)) = prioritised {
            return Some(var);
        }
        self.vsids.select()
    }

    fn select_unit(&mut self, assignment: &Assignment) -> Option<Var> {
        while self.next_unit_candidate < self.domain.len() {
            let var = Var::from_index(self.next_unit_candidate);
            if assignment.is_free(var.pos_lit()) {
                return Some(var);
            }
            self.next_unit_candidate += 1;
        }
        None
    }

    /// The polarity to assign a freshly-selected variable, honouring any domain sign override.
    pub fn preferred_polarity(&self, var: Var) -> bool {
        self.domain[var.index()]
            .as_ref()
            .and_then(|o| o.sign.or(o.value))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assignment::Antecedent;

    #[test]
    fn domain_priority_overrides_vsids_order() {
        let mut heuristic = Heuristic::new(HeuristicKind::Domain, 3);
        heuristic.vsids.make_available(Var::from_index(0));
        heuristic.vsids.bump(Var::from_index(0));
        heuristic.apply_domain_modifier(Var::from_index(2), DomainModifier::Level(10));

        let assignment = Assignment::new(3);
        assert_eq!(heuristic.select(&assignment), Some(Var::from_index(2)));
    }

    #[test]
    fn unit_heuristic_picks_lowest_free_index() {
        let mut heuristic = Heuristic::new(HeuristicKind::Unit, 3);
        let mut assignment = Assignment::new(3);
        assignment
            .force(Var::from_index(0).pos_lit(), Antecedent::Decision)
            .unwrap();
        assert_eq!(heuristic.select(&assignment), Some(Var::from_index(1)));
    }
}

//! Model classification and enumeration control.

use crate::basic_types::Literal;
use crate::engine::assignment::Assignment;

/// `solve.opt_mode`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptMode {
    Ignore,
    Optimise,
    EnumOpt,
}

/// `solve.enum_mode`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnumerationMode {
    Auto,
    Brave,
    Cautious,
    Record,
    DomRecord,
    Query,
}

/// A total assignment produced by the search, restricted to the literals the client cares
/// about. Classified as stable / brave / cautious / optimisation before being emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    pub literals: Vec<Literal>,
}

impl Model {
    pub fn from_assignment(assignment: &Assignment, projected: &[Literal]) -> Self {
        let literals = projected
            .iter()
            .copied()
            .filter(|&literal| assignment.is_true(literal))
            .collect();
        Model { literals }
    }
}

/// The restricted view handed to the enumerator hook: forbids touching watch state but permits
/// adding clauses to the active solve step.
pub trait SolveControl {
    /// Adds a clause that blocks the current model (or a stronger minimisation bound) from
    /// being found again. Returns `false` if the clause is trivially satisfied at the root
    /// level, meaning the search has been exhausted.
    fn add_clause(&mut self, literals: &[Literal]) -> bool;
}

/// What the enumerator hook decides to do after a model is reported.
#[derive(Debug, PartialEq, Eq)]
pub enum EnumerationAction {
    /// Adds a model-blocker clause and continues the search.
    Continue,
    /// A strictly better cost bound was found; a minimisation constraint was asserted.
    Improved { cost: i64 },
    /// Enough models have been found; stop.
    Stop,
}

/// Classifies and emits total assignments as they are found, deciding whether the search
/// should continue.
#[derive(Debug)]
pub struct Enumerator {
    mode: EnumerationMode,
    opt_mode: OptMode,
    projected: Vec<Literal>,
    models_wanted: u64,
    models_found: u64,
    best_cost: Option<i64>,
}

impl Enumerator {
    pub fn new(mode: EnumerationMode, opt_mode: OptMode, projected: Vec<Literal>, models_wanted: u64) -> Self {
        Enumerator {
            mode,
            opt_mode,
            projected,
            models_wanted,
            models_found: 0,
            best_cost: None,
        }
    }

    pub fn mode(&self) -> EnumerationMode {
        self.mode
    }

    pub fn models_found(&self) -> u64 {
        self.models_found
    }

    /// The literals this enumerator restricts models and blocking clauses to.
    pub fn projected(&self) -> &[Literal] {
        &self.projected
    }

    /// Handles a freshly-found total assignment, returning the model and the action the CDCL
    /// loop should take next. Takes an owned [`Model`] rather than the assignment it was built
    /// from, since the caller's [`SolveControl`] may itself hold the only mutable path to the
    /// assignment (e.g. when it wraps the solver that owns it).
    pub fn on_model(
        &mut self,
        model: Model,
        cost: Option<i64>,
        control: &mut dyn SolveControl,
    ) -> (Model, EnumerationAction) {
        self.models_found += 1;

        if self.opt_mode != OptMode::Ignore {
            if let Some(cost) = cost {
                let improved = match self.best_cost {
                    Some(best) => cost < best,
                    None => true,
                };
                if improved {
                    self.best_cost = Some(cost);
                    let blocker = self.blocking_clause(&model);
                    let _ = control.add_clause(&blocker);
                    return (model, EnumerationAction::Improved { cost });
                }
            }
        }

        // `models_wanted == 0` means "enumerate all models".
        if self.models_wanted != 0 && self.models_found >= self.models_wanted {
            return (model, EnumerationAction::Stop);
        }

        let blocker = self.blocking_clause(&model);
        if !control.add_clause(&blocker) {
            return (model, EnumerationAction::Stop);
        }
        (model, EnumerationAction::Continue)
    }

    /// Builds the clause that blocks exactly this model's projected assignment from recurring:
    /// one disjunct per projected literal, negated where the model made it true and kept as-is
    /// where the model made it false. Using the full projected set (not just the literals that
    /// came out true) matters when every projected literal is false — a clause built only from
    /// `model.literals` would then be empty and trivially conflicting, aborting the search after
    /// the very first all-false model instead of blocking just that one combination.
    fn blocking_clause(&self, model: &Model) -> Vec<Literal> {
        self.projected
            .iter()
            .map(|&literal| {
                if model.literals.contains(&literal) {
                    !literal
                } else {
                    literal
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Var;
    use crate::engine::assignment::Antecedent;

    struct RecordingControl {
        clauses: Vec<Vec<Literal>>,
        accept: bool,
    }

    impl SolveControl for RecordingControl {
        fn add_clause(&mut self, literals: &[Literal]) -> bool {
            self.clauses.push(literals.to_vec());
            self.accept
        }
    }

    fn lit(i: usize) -> Literal {
        Var::from_index(i).pos_lit()
    }

    #[test]
    fn enumerate_all_never_stops_on_count() {
        let mut assignment = Assignment::new(2);
        assignment.force(lit(0), Antecedent::Decision).unwrap();
        let mut enumerator = Enumerator::new(EnumerationMode::Auto, OptMode::Ignore, vec![lit(0)], 0);
        let model = Model::from_assignment(&assignment, enumerator.projected());
        let mut control = RecordingControl {
            clauses: Vec::new(),
            accept: true,
        };
        let (model, action) = enumerator.on_model(model, None, &mut control);
        assert_eq!(model.literals, vec![lit(0)]);
        assert_eq!(action, EnumerationAction::Continue);
        assert_eq!(control.clauses, vec![vec![!lit(0)]]);
    }

    #[test]
    fn model_budget_stops_search() {
        let assignment = Assignment::new(2);
        let mut enumerator = Enumerator::new(EnumerationMode::Auto, OptMode::Ignore, vec![], 1);
        let model = Model::from_assignment(&assignment, enumerator.projected());
        let mut control = RecordingControl {
            clauses: Vec::new(),
            accept: true,
        };
        let (_, action) = enumerator.on_model(model, None, &mut control);
        assert_eq!(action, EnumerationAction::Stop);
    }

    #[test]
    fn optimisation_reports_improvement_on_lower_cost() {
        let assignment = Assignment::new(2);
        let mut enumerator = Enumerator::new(EnumerationMode::Auto, OptMode::Optimise, vec![], 0);
        let mut control = RecordingControl {
            clauses: Vec::new(),
            accept: true,
        };
        let model = Model::from_assignment(&assignment, enumerator.projected());
        let (_, first) = enumerator.on_model(model, Some(5), &mut control);
        assert_eq!(first, EnumerationAction::Improved { cost: 5 });
        let model = Model::from_assignment(&assignment, enumerator.projected());
        let (_, second) = enumerator.on_model(model, Some(7), &mut control);
        assert_eq!(second, EnumerationAction::Continue);
    }

    #[test]
    fn blocking_clause_covers_an_all_false_model() {
        let mut assignment = Assignment::new(2);
        assignment.force(!lit(0), Antecedent::Decision).unwrap();
        assignment.force(!lit(1), Antecedent::Decision).unwrap();
        let enumerator = Enumerator::new(EnumerationMode::Auto, OptMode::Ignore, vec![lit(0), lit(1)], 0);
        let model = Model::from_assignment(&assignment, enumerator.projected());
        assert!(model.literals.is_empty());
        let blocker = enumerator.blocking_clause(&model);
        assert_eq!(blocker, vec![lit(0), lit(1)]);
    }
}

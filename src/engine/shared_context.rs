//! Process-wide variable registry and problem-submission lifecycle.

use crate::basic_types::ClaspError;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::Literal;
use crate::basic_types::Var;
use crate::basic_types::VarInfo;
use crate::basic_types::VarType;
use crate::clasp_assert_simple;
use crate::engine::clause_db::ClauseAllocator;
use crate::engine::clause_db::ClausalPropagator;
use crate::engine::short_implication_graph::ShortImplicationsGraph;

/// Controls which problem state is physically shared with attached worker solvers versus
/// copied into each solver's private storage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ShareMode {
    #[default]
    Auto,
    Problem,
    Learnt,
    All,
    None,
}

/// Process-wide variable registry and the frozen/unfrozen lifecycle of problem constraints.
///
/// While `frozen == false` (the setup phase), only the calling thread may add variables or
/// constraints. [`SharedContext::end_init`] freezes the context; from then on,
/// [`SharedContext::unfreeze`] is required before further problem constraints may be added.
#[derive(Debug)]
pub struct SharedContext {
    var_info: Vec<VarInfo>,
    binary_ternary: ShortImplicationsGraph,
    long_constraints: ClauseAllocator,
    watches: ClausalPropagator,
    frozen: bool,
    share_mode: ShareMode,
    step_var: Option<Var>,
    top_level_conflict: bool,
}

impl SharedContext {
    pub fn new(share_mode: ShareMode) -> Self {
        // Variable 0 is the sentinel; registries are pre-seeded with its slot.
        SharedContext {
            var_info: vec![VarInfo::default()],
            binary_ternary: ShortImplicationsGraph::new(1),
            long_constraints: ClauseAllocator::default(),
            watches: ClausalPropagator::new(1),
            frozen: false,
            share_mode,
            step_var: None,
            top_level_conflict: false,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.var_info.len()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn share_mode(&self) -> ShareMode {
        self.share_mode
    }

    /// `addVars(n, type, flags) -> first_id`.
    pub fn add_vars(&mut self, count: usize, var_type: VarType) -> Result<Var, ConstraintOperationError> {
        if self.frozen {
            return Err(ConstraintOperationError::ContextFrozen);
        }
        let first = Var::from_index(self.var_info.len());
        for _ in 0..count {
            let mut info = VarInfo::default();
            info.set_var_type(var_type);
            self.var_info.push(info);
        }
        self.binary_ternary.grow(self.var_info.len());
        self.watches.grow(self.var_info.len());
        Ok(first)
    }

    pub fn var_info(&self, var: Var) -> &VarInfo {
        &self.var_info[var.index()]
    }

    pub fn var_info_mut(&mut self, var: Var) -> &mut VarInfo {
        &mut self.var_info[var.index()]
    }

    /// `startAddConstraints(hint)`: reserves capacity ahead of a batch of additions.
    pub fn start_add_constraints(&mut self, hint: usize) -> Result<(), ConstraintOperationError> {
        if self.frozen {
            return Err(ConstraintOperationError::ContextFrozen);
        }
        let _ = hint;
        Ok(())
    }

    pub fn add_unary(&mut self, literal: Literal) -> Result<(), ConstraintOperationError> {
        if self.frozen {
            return Err(ConstraintOperationError::ContextFrozen);
        }
        self.binary_ternary.add_unary(literal);
        Ok(())
    }

    pub fn add_binary(&mut self, p: Literal, q: Literal) -> Result<(), ConstraintOperationError> {
        if self.frozen {
            return Err(ConstraintOperationError::ContextFrozen);
        }
        let _ = self.binary_ternary.add_binary(p, q, false);
        Ok(())
    }

    pub fn add_ternary(&mut self, p: Literal, q: Literal, r: Literal) -> Result<(), ConstraintOperationError> {
        if self.frozen {
            return Err(ConstraintOperationError::ContextFrozen);
        }
        let _ = self.binary_ternary.add_ternary(p, q, r, false);
        Ok(())
    }

    /// `add(Constraint*)` for long constraints: ownership of `literals` transfers into the
    /// context's clause store.
    pub fn add_long(&mut self, literals: Vec<Literal>) -> Result<(), ConstraintOperationError> {
        if self.frozen {
            return Err(ConstraintOperationError::ContextFrozen);
        }
        if literals.len() < 2 {
            return Err(ConstraintOperationError::InfeasibleRoot);
        }
        let _ = self
            .watches
            .add_clause(literals, false, &mut self.long_constraints);
        Ok(())
    }

    /// `eliminate(var)`: marks a variable as removed from the problem. The core does not itself
    /// run variable elimination (that is an out-of-scope SAT preprocessor); this only records
    /// the bookkeeping flag consulted by the heuristic and the dependency graph.
    pub fn eliminate(&mut self, var: Var) {
        self.var_info[var.index()].set_frozen(true);
    }

    /// `requestStepVar()`: allocates one literal used to make subsequent learnt clauses
    /// retractable at step end.
    pub fn request_step_var(&mut self) -> Result<Var, ConstraintOperationError> {
        let var = self.add_vars(1, VarType::Plain)?;
        self.step_var = Some(var);
        Ok(var)
    }

    pub fn step_var(&self) -> Option<Var> {
        self.step_var
    }

    /// `endInit(attachAll) -> ok`: freezes the context. Returns `false` iff a top-level conflict
    /// was derived while adding problem constraints.
    pub fn end_init(&mut self) -> bool {
        self.frozen = true;
        !self.top_level_conflict
    }

    /// Records that a top-level conflict was derived (e.g. by unit-propagating the problem
    /// constraints during `endInit`), so the next `end_init` call reports failure.
    pub fn record_top_level_conflict(&mut self) {
        log::warn!("top-level conflict derived while adding problem constraints; endInit will report failure");
        self.top_level_conflict = true;
    }

    /// `unfreeze()`: re-opens the context for incremental update, dropping the step literal
    /// (volatile learnt clauses anchored to it are retracted by the owning solvers when they
    /// next undo to level 0, not by this call directly).
    pub fn unfreeze(&mut self) {
        clasp_assert_simple!(self.frozen);
        self.frozen = false;
        self.step_var = None;
        self.top_level_conflict = false;
    }

    pub fn binary_ternary(&self) -> &ShortImplicationsGraph {
        &self.binary_ternary
    }

    pub fn binary_ternary_mut(&mut self) -> &mut ShortImplicationsGraph {
        &mut self.binary_ternary
    }

    pub fn long_constraints(&self) -> &ClauseAllocator {
        &self.long_constraints
    }

    pub fn long_constraints_mut(&mut self) -> &mut ClauseAllocator {
        &mut self.long_constraints
    }

    pub fn watches(&self) -> &ClausalPropagator {
        &self.watches
    }

    pub fn watches_mut(&mut self) -> &mut ClausalPropagator {
        &mut self.watches
    }
}

impl From<ConstraintOperationError> for ClaspError {
    fn from(error: ConstraintOperationError) -> Self {
        ClaspError::logic(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_constraints_after_end_init_is_rejected() {
        let mut context = SharedContext::new(ShareMode::Auto);
        let first = context.add_vars(2, VarType::Plain).unwrap();
        assert!(context.end_init());
        let err = context
            .add_binary(first.pos_lit(), first.pos_lit())
            .unwrap_err();
        assert_eq!(err, ConstraintOperationError::ContextFrozen);
    }

    #[test]
    fn unfreeze_reopens_for_additions() {
        let mut context = SharedContext::new(ShareMode::Auto);
        let first = context.add_vars(2, VarType::Plain).unwrap();
        assert!(context.end_init());
        context.unfreeze();
        context.add_binary(first.pos_lit(), first.pos_lit()).unwrap();
    }

    #[test]
    fn end_init_reports_top_level_conflict() {
        let mut context = SharedContext::new(ShareMode::Auto);
        context.record_top_level_conflict();
        assert!(!context.end_init());
    }

    #[test]
    fn step_var_is_tracked_until_unfreeze() {
        let mut context = SharedContext::new(ShareMode::Auto);
        let step = context.request_step_var().unwrap();
        assert_eq!(context.step_var(), Some(step));
        assert!(context.end_init());
        context.unfreeze();
        assert_eq!(context.step_var(), None);
    }
}

//! Activity/LBD tracking and deletion policy for learnt long clauses.

use crate::basic_types::ClauseReference;
use crate::basic_types::Literal;
use crate::engine::assignment::Assignment;
use crate::engine::clause_db::ClauseAllocator;

/// Literal block distance: the number of distinct decision levels among a clause's literals.
/// Clauses at or below [`LearntDb::GLUE_LBD`] are "glue" clauses and exempt from reduction.
pub fn calculate_lbd(literals: &[Literal], assignment: &Assignment) -> u32 {
    let mut levels: Vec<usize> = literals
        .iter()
        .map(|&literal| assignment.literal_level(literal))
        .collect();
    levels.sort_unstable();
    levels.dedup();
    levels.len() as u32
}

/// Tracks every learnt long clause accepted into the database and applies the size-based
/// reduction policy once the moving budget is exceeded.
#[derive(Debug)]
pub struct LearntDb {
    clauses: Vec<ClauseReference>,
    /// Amount added to a clause's activity on every bump; divided by `decay` each conflict
    /// instead of rescaling every clause, mirroring the variable-activity scheme.
    bump: f32,
    decay: f32,
    reduce_budget: usize,
    reduce_increment: usize,
}

impl LearntDb {
    pub const GLUE_LBD: u32 = 2;
    const RESCALE_LIMIT: f32 = f32::MAX / 16.0;

    pub fn new(initial_budget: usize, reduce_increment: usize) -> Self {
        LearntDb {
            clauses: Vec::new(),
            bump: 1.0,
            decay: 1.0 / 0.999,
            reduce_budget: initial_budget,
            reduce_increment,
        }
    }

    pub fn register(&mut self, reference: ClauseReference, literals: &[Literal], assignment: &Assignment, allocator: &mut ClauseAllocator) {
        let lbd = calculate_lbd(literals, assignment);
        allocator.get_mut(reference).set_lbd(lbd);
        self.clauses.push(reference);
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Bumps the activity of every clause that participated in the current conflict's
    /// resolution, then decays the shared bump value (equivalent to decaying every clause's
    /// activity without touching each one individually).
    pub fn bump_participants(&mut self, participants: &[ClauseReference], allocator: &mut ClauseAllocator) {
        for &reference in participants {
            let clause = allocator.get_mut(reference);
            clause.bump_activity(self.bump);
            if clause.activity() >= Self::RESCALE_LIMIT {
                self.rescale(allocator);
            }
        }
        self.bump *= self.decay;
        if self.bump >= Self::RESCALE_LIMIT {
            self.rescale(allocator);
        }
    }

    fn rescale(&mut self, allocator: &mut ClauseAllocator) {
        let factor = 1.0 / Self::RESCALE_LIMIT;
        for &reference in &self.clauses {
            allocator.get_mut(reference).rescale_activity(factor);
        }
        self.bump *= factor;
    }

    pub fn should_reduce(&self) -> bool {
        self.clauses.len() > self.reduce_budget
    }

    /// Drops the worse half of the non-glue, unprotected clauses, sorted by
    /// `(not glue, lbd desc, activity asc)` as specified. Callers must mark clauses currently
    /// acting as an antecedent on the trail as protected before calling this.
    pub fn reduce(&mut self, allocator: &mut ClauseAllocator) -> Vec<ClauseReference> {
        let mut candidates: Vec<ClauseReference> = self
            .clauses
            .iter()
            .copied()
            .filter(|&r| {
                let clause = allocator.get(r);
                !clause.is_protected() && clause.lbd() > Self::GLUE_LBD
            })
            .collect();

        candidates.sort_by(|&a, &b| {
            let ca = allocator.get(a);
            let cb = allocator.get(b);
            cb.lbd()
                .cmp(&ca.lbd())
                .then(ca.activity().partial_cmp(&cb.activity()).unwrap())
        });

        let drop_count = candidates.len() / 2;
        let dropped: Vec<ClauseReference> = candidates.into_iter().take(drop_count).collect();

        for &reference in &dropped {
            allocator.delete(reference);
        }
        self.clauses.retain(|r| !dropped.contains(r));
        self.reduce_budget += self.reduce_increment;
        dropped
    }
}

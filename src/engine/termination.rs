//! Cancellation of an in-progress search.
//!
//! The CDCL loop polls a [`TerminationCondition`] between propagations rather than carrying a
//! callback into the hot path; a watchdog thread or a signal handler flips the condition's
//! underlying flag from outside.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// Polled by the search loop to decide whether to stop early.
///
/// `should_stop` must be cheap: it is called at least once per propagation fixpoint.
/// `encountered_conflict` lets budget-style conditions count conflicts without the loop having
/// to know which conditions care about them.
pub trait TerminationCondition {
    fn should_stop(&mut self) -> bool;

    fn encountered_conflict(&mut self) {}
}

/// Never stops. The default for a single, uninterruptible solve.
#[derive(Copy, Clone, Debug, Default)]
pub struct Indefinite;

impl TerminationCondition for Indefinite {
    fn should_stop(&mut self) -> bool {
        false
    }
}

/// An atomic flag flipped by [`Interrupt::trigger`], shareable across threads so that a caller
/// can request cancellation of a Solver running on another thread.
#[derive(Clone, Debug, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Interrupt::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl TerminationCondition for Interrupt {
    fn should_stop(&mut self) -> bool {
        self.is_triggered()
    }
}

/// Stops the search after a fixed number of conflicts have been seen.
#[derive(Debug, Default)]
pub struct ConflictBudget {
    budget: AtomicU64,
    encountered: AtomicU64,
}

impl ConflictBudget {
    pub fn with_budget(budget: u64) -> Self {
        ConflictBudget {
            budget: AtomicU64::new(budget),
            encountered: AtomicU64::new(0),
        }
    }

    pub fn conflicts_seen(&self) -> u64 {
        self.encountered.load(Ordering::Relaxed)
    }
}

impl TerminationCondition for ConflictBudget {
    fn should_stop(&mut self) -> bool {
        self.encountered.load(Ordering::Relaxed) >= *self.budget.get_mut()
    }

    fn encountered_conflict(&mut self) {
        let _ = self.encountered.fetch_add(1, Ordering::Relaxed);
    }
}

/// Stops the search once a wall-clock deadline has passed. A watchdog thread is unnecessary:
/// the loop already polls `should_stop` between propagations, so checking the clock there is
/// enough to guarantee the search returns within bounded work after the deadline passes.
#[derive(Debug)]
pub struct TimeBudget {
    deadline: Instant,
}

impl TimeBudget {
    pub fn starting_now(duration: Duration) -> Self {
        TimeBudget {
            deadline: Instant::now() + duration,
        }
    }
}

impl TerminationCondition for TimeBudget {
    fn should_stop(&mut self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Combines two conditions, stopping as soon as either does.
#[derive(Debug)]
pub struct Combinator<A, B> {
    first: A,
    second: B,
}

impl<A, B> Combinator<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Combinator { first, second }
    }
}

impl<A: TerminationCondition, B: TerminationCondition> TerminationCondition for Combinator<A, B> {
    fn should_stop(&mut self) -> bool {
        self.first.should_stop() || self.second.should_stop()
    }

    fn encountered_conflict(&mut self) {
        self.first.encountered_conflict();
        self.second.encountered_conflict();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_budget_stops_after_threshold() {
        let mut budget = ConflictBudget::with_budget(2);
        assert!(!budget.should_stop());
        budget.encountered_conflict();
        assert!(!budget.should_stop());
        budget.encountered_conflict();
        assert!(budget.should_stop());
        assert_eq!(budget.conflicts_seen(), 2);
    }

    #[test]
    fn interrupt_is_visible_across_clones() {
        let interrupt = Interrupt::new();
        let mut clone = interrupt.clone();
        assert!(!clone.should_stop());
        interrupt.trigger();
        assert!(clone.should_stop());
    }

    #[test]
    fn combinator_stops_when_either_stops() {
        let mut combined = Combinator::new(ConflictBudget::with_budget(100), Indefinite);
        assert!(!combined.should_stop());
        for _ in 0..100 {
            combined.encountered_conflict();
        }
        assert!(combined.should_stop());
    }
}

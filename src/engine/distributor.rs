//! Inter-thread learnt-clause sharing.
//!
//! Each worker Solver gets its own receiving end of a broadcast built from one
//! `crossbeam_channel` per subscriber; `publish` filters by the policy and fans the clause out
//! to every solver whose bit is set in the target mask, mirroring a ref-counted slot ring
//! without hand-rolling lock-free memory reclamation for it.

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use crate::basic_types::Literal;

/// Which learnt clauses a Distributor accepts for sharing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SharePolicy {
    pub max_size: usize,
    pub max_lbd: u32,
    pub share_static: bool,
}

impl Default for SharePolicy {
    fn default() -> Self {
        SharePolicy {
            max_size: 8,
            max_lbd: 4,
            share_static: true,
        }
    }
}

/// A published learnt clause, ref-counted implicitly by how many receivers still hold a handle
/// to it (an `Arc` clone per target, reclaimed by the last `Drop`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedClause {
    pub literals: std::sync::Arc<[Literal]>,
    pub lbd: u32,
}

/// Per-solver handle into the distributor: publish outgoing clauses, poll incoming ones.
#[derive(Debug)]
pub struct SolverChannel {
    id: usize,
    outbox: Sender<SharedClause>,
    inbox: Receiver<SharedClause>,
}

impl SolverChannel {
    pub fn id(&self) -> usize {
        self.id
    }

    /// `receive`s every clause published since the last poll whose target mask includes this
    /// solver. Non-blocking: an empty channel returns an empty vector immediately.
    pub fn receive(&self) -> Vec<SharedClause> {
        self.inbox.try_iter().collect()
    }
}

/// Owns the broadcast channels for one cluster of worker solvers and applies the share policy
/// on every publish.
#[derive(Debug)]
pub struct Distributor {
    policy: SharePolicy,
    senders: Vec<Sender<SharedClause>>,
}

impl Distributor {
    pub fn new(policy: SharePolicy) -> Self {
        Distributor {
            policy,
            senders: Vec::new(),
        }
    }

    /// Registers a new worker solver, returning its private channel handle.
    pub fn attach(&mut self) -> SolverChannel {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let id = self.senders.len();
        self.senders.push(sender.clone());
        SolverChannel {
            id,
            outbox: sender,
            inbox: receiver,
        }
    }

    /// `publish`es `clause` from `source`, i.e. fans it out to every attached solver except the
    /// source itself, if the policy accepts it. Returns `false` if the policy rejected it.
    pub fn publish(&self, source: &SolverChannel, literals: &[Literal], lbd: u32, is_static: bool) -> bool {
        if literals.len() > self.policy.max_size {
            return false;
        }
        if lbd > self.policy.max_lbd && !(is_static && self.policy.share_static) {
            return false;
        }
        let clause = SharedClause {
            literals: literals.into(),
            lbd,
        };
        for (index, sender) in self.senders.iter().enumerate() {
            if index == source.id() {
                continue;
            }
            // A disconnected receiver (a solver that finished and dropped its handle) is not
            // an error here; the slot is simply never reclaimed for it again.
            let _ = sender.send(clause.clone());
        }
        true
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
    fn published_clause_reaches_other_solvers_only() {
        let mut distributor = Distributor::new(SharePolicy::default());
        let a = distributor.attach();
        let b = distributor.attach();

        assert!(distributor.publish(&a, &[lit(0), lit(1)], 2, false));

        assert!(a.receive().is_empty());
        let received = b.receive();
        assert_eq!(received.len(), 1);
        assert_eq!(&*received[0].literals, &[lit(0), lit(1)]);
    }

    #[test]
    fn oversized_clause_is_rejected_by_policy() {
        let policy = SharePolicy {
            max_size: 1,
            ..SharePolicy::default()
        };
        let mut distributor = Distributor::new(policy);
        let a = distributor.attach();
        let _b = distributor.attach();
        assert!(!distributor.publish(&a, &[lit(0), lit(1)], 2, false));
    }

    #[test]
    fn high_lbd_clause_survives_if_static_and_policy_allows() {
        let mut distributor = Distributor::new(SharePolicy::default());
        let a = distributor.attach();
        let b = distributor.attach();
        assert!(distributor.publish(&a, &[lit(0)], 100, true));
        assert_eq!(b.receive().len(), 1);
    }
}

//! Typed index into a [`crate::engine::clause_db::ClauseAllocator`].
//!
//! Long clauses are referenced by position rather than by pointer so that the allocator can be
//! stored in a plain `Vec` and `Clone`d cheaply; index zero is reserved as a null reference,
//! never handed out by [`ClauseReference::new`].

use std::num::NonZeroU32;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClauseReference(NonZeroU32);

impl ClauseReference {
    /// Creates a reference from a one-based allocator slot id.
    pub(crate) fn new(one_based_id: u32) -> ClauseReference {
        ClauseReference(NonZeroU32::new(one_based_id).expect("clause reference id must be nonzero"))
    }

    pub(crate) fn get_code(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Debug for ClauseReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "clause#{}", self.0)
    }
}

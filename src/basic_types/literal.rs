//! Bit-packed variable and literal representation.
//!
//! A [`Var`] is a dense, zero-based index into the per-variable tables owned by
//! [`crate::engine::shared_context::SharedContext`]. A [`Literal`] packs a variable index, its
//! sign and a spare "watch" bit reserved for higher layers (the short-implication graph marks
//! learnt arcs with it) into a single machine word, following the same layout idea as a DIMACS
//! literal but shifted left to make room for the extra bit.

use std::fmt;
use std::ops::Not;

use crate::basic_types::keyed_vec::StorageKey;

/// Backing integer type for both [`Var`] and [`Literal`].
pub(crate) type RawIndex = u32;

/// The variable id reserved as the constantly-true sentinel (variable 0).
pub const SENTINEL_VAR: Var = Var(0);

/// A solver variable, identified by a dense non-negative integer.
///
/// Variable `0` is reserved as a sentinel whose positive literal is always true; this mirrors a
/// constantly-true top-level fact and lets constraints refer to "no variable" without an
/// `Option`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var(RawIndex);

impl Var {
    /// The largest variable index supported. Two bits are reserved in [`Literal`] for sign and
    /// the watch flag, so the usable range is smaller than the backing integer.
    pub const MAX: Var = Var(RawIndex::MAX >> 2);

    /// Creates a variable from a zero-based index.
    #[inline]
    pub fn from_index(index: usize) -> Var {
        debug_assert!(index <= Var::MAX.index());
        Var(index as RawIndex)
    }

    /// The zero-based index of this variable.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The positive literal of this variable.
    #[inline]
    pub const fn pos_lit(self) -> Literal {
        Literal::new(self, true)
    }

    /// The negative literal of this variable.
    #[inline]
    pub const fn neg_lit(self) -> Literal {
        Literal::new(self, false)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A signed reference to a [`Var`], packed as `(var << 2) | sign_bit | watch_flag`.
///
/// The watch flag is carry space reserved for higher layers (see module docs); this type never
/// inspects it except via [`Literal::with_watch_flag`] / [`Literal::watch_flag`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Literal {
    code: RawIndex,
}

const SIGN_BIT: RawIndex = 1;
const WATCH_BIT: RawIndex = 2;

impl Literal {
    /// The constantly-true literal (the positive literal of the sentinel variable).
    pub const TRUE: Literal = SENTINEL_VAR.pos_lit();

    #[inline]
    const fn new(var: Var, is_positive: bool) -> Literal {
        let sign = if is_positive { 0 } else { SIGN_BIT };
        Literal {
            code: (var.0 << 2) | sign,
        }
    }

    /// The underlying variable of this literal.
    #[inline]
    pub const fn var(self) -> Var {
        Var(self.code >> 2)
    }

    /// Whether this literal is the positive occurrence of its variable.
    #[inline]
    pub const fn is_positive(self) -> bool {
        self.code & SIGN_BIT == 0
    }

    /// Whether this literal is the negative occurrence of its variable.
    #[inline]
    pub const fn is_negative(self) -> bool {
        !self.is_positive()
    }

    /// Returns a copy of this literal with the watch flag set to `flag`.
    #[inline]
    pub const fn with_watch_flag(self, flag: bool) -> Literal {
        let code = if flag {
            self.code | WATCH_BIT
        } else {
            self.code & !WATCH_BIT
        };
        Literal { code }
    }

    /// The current value of the reserved watch flag.
    #[inline]
    pub const fn watch_flag(self) -> bool {
        self.code & WATCH_BIT != 0
    }

    /// A dense index suitable for indexing per-literal tables, distinct for each
    /// `(var, sign)` pair and ignoring the watch flag.
    #[inline]
    pub const fn index(self) -> usize {
        ((self.code & !WATCH_BIT) >> 1) as usize
    }

    /// Whether this is the constantly-true literal.
    #[inline]
    pub const fn is_true_sentinel(self) -> bool {
        self.var().index() == 0 && self.is_positive()
    }
}

impl Not for Literal {
    type Output = Literal;

    #[inline]
    fn not(self) -> Literal {
        Literal {
            code: self.code ^ SIGN_BIT,
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-")?;
        }
        write!(f, "{}", self.var())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The role a variable plays in the dependency graph used by the unfounded-set checker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VarType {
    /// Ordinary boolean variable with no dependency-graph role.
    Plain,
    /// Represents a logic-program atom.
    Atom,
    /// Represents a logic-program body.
    Body,
    /// Plays both roles (e.g. an atom defined by a single body collapsed during preprocessing).
    Hybrid,
}

/// Per-variable metadata bundled into a single byte-sized record: type tag plus a handful of
/// independent flags consulted during preprocessing and propagation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VarInfo {
    var_type: VarType,
    frozen: bool,
    input: bool,
    output: bool,
    in_negative_antecedents: bool,
}

impl Default for VarInfo {
    fn default() -> Self {
        VarInfo {
            var_type: VarType::Plain,
            frozen: false,
            input: false,
            output: false,
            in_negative_antecedents: false,
        }
    }
}

impl VarInfo {
    pub fn var_type(&self) -> VarType {
        self.var_type
    }

    pub fn set_var_type(&mut self, var_type: VarType) {
        self.var_type = var_type;
    }

    /// Frozen variables are exempt from preprocessor elimination.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn is_input(&self) -> bool {
        self.input
    }

    pub fn set_input(&mut self, input: bool) {
        self.input = input;
    }

    pub fn is_output(&self) -> bool {
        self.output
    }

    pub fn set_output(&mut self, output: bool) {
        self.output = output;
    }

    /// Whether this variable occurs negated in some body, i.e. is relevant to unfounded-set
    /// support search.
    pub fn in_negative_antecedents(&self) -> bool {
        self.in_negative_antecedents
    }

    pub fn set_in_negative_antecedents(&mut self, value: bool) {
        self.in_negative_antecedents = value;
    }
}

impl StorageKey for Var {
    fn index(&self) -> usize {
        Var::index(*self)
    }

    fn create_from_index(index: usize) -> Self {
        Var::from_index(index)
    }
}

impl StorageKey for Literal {
    fn index(&self) -> usize {
        Literal::index(*self)
    }

    fn create_from_index(index: usize) -> Self {
        let var = Var::from_index(index >> 1);
        if index & 1 == 0 {
            var.pos_lit()
        } else {
            var.neg_lit()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_negation_round_trips() {
        let var = Var::from_index(5);
        let pos = var.pos_lit();
        let neg = var.neg_lit();
        assert_eq!(!pos, neg);
        assert_eq!(!neg, pos);
        assert_eq!(pos.var(), var);
        assert!(pos.is_positive());
        assert!(neg.is_negative());
    }

    #[test]
    fn watch_flag_is_independent_of_sign() {
        let lit = Var::from_index(3).neg_lit();
        let watched = lit.with_watch_flag(true);
        assert!(watched.watch_flag());
        assert_eq!(watched.var(), lit.var());
        assert_eq!(watched.is_negative(), lit.is_negative());
        assert!(!watched.with_watch_flag(false).watch_flag());
    }

    #[test]
    fn sentinel_true_literal() {
        assert!(Literal::TRUE.is_true_sentinel());
        assert!(!(!Literal::TRUE).is_true_sentinel());
    }

    #[test]
    fn index_is_dense_and_sign_sensitive() {
        let a = Var::from_index(0).pos_lit();
        let b = Var::from_index(0).neg_lit();
        let c = Var::from_index(1).pos_lit();
        assert_ne!(a.index(), b.index());
        assert_ne!(a.index(), c.index());
    }
}

//! Grammar node IDs.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Index into a [`GrammarTable`](crate::GrammarTable).
///
/// # Design
/// The grammar graph is cyclic (`Expr: Expr '+' Term`), so nodes refer
/// to each other by index rather than by owning pointers.
/// - Memory: 4 bytes
/// - Equality: O(1) integer compare, which is also what the negative
///   cache and the left-recursion check use as grammar identity
#[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct GrammarId(u32);

impl GrammarId {
    /// Invalid grammar ID (sentinel value).
    pub const INVALID: GrammarId = GrammarId(u32::MAX);

    #[inline]
    pub const fn new(index: u32) -> Self {
        GrammarId(index)
    }

    /// Id of table slot `index`, if it lies below the sentinel.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .map(GrammarId)
            .filter(|id| id.is_valid())
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Hash for GrammarId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for GrammarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "GrammarId({})", self.0)
        } else {
            write!(f, "GrammarId::INVALID")
        }
    }
}

impl Default for GrammarId {
    fn default() -> Self {
        Self::INVALID
    }
}

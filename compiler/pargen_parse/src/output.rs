//! Result of a parse.

use pargen_ir::{ElementArena, ElementDisplay, ElementId};

/// Counters collected during one parse.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Steps pushed.
    pub steps: usize,
    /// Occurrences rejected by the negative cache.
    pub negative_hits: usize,
    /// Switch alternatives skipped by the forward check.
    pub forward_skips: usize,
    /// Upward jumps taken.
    pub jumps: usize,
    /// Furthest token offset ever consumed.
    pub furthest_token: usize,
}

/// Everything a parse produced.
///
/// A match that stops short of the end of input is still a match;
/// `at_end` tells the two apart. `root` can be `None` for a match when
/// element creation was switched off.
///
/// After an upward jump the target alternative is parsed for its hooks
/// only: neither it nor the jumping compound is delivered, so fields
/// matched after the label appear in no element. Hooks on those entries
/// are the way to observe them.
#[derive(Debug)]
pub struct ParseOutput {
    pub matched: bool,
    pub root: Option<ElementId>,
    pub elements: ElementArena,
    pub stats: ParseStats,
    pub at_end: bool,
}

impl ParseOutput {
    /// Root matched and all input was consumed.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.matched && self.at_end
    }

    pub fn display_root(&self) -> Option<ElementDisplay<'_>> {
        self.root.map(|root| self.elements.display(root))
    }
}

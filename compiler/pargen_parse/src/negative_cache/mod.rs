//! Negative cache: grammars known to fail at a token position.
//!
//! Positions are tracked relative to a cursor that the engine moves one
//! token right on every consumed token and one token left for every
//! token given back by backtracking. Entries are created lazily at
//! either end, so the cache only ever spans the positions the parse has
//! visited.

use std::collections::VecDeque;

use pargen_ir::GrammarId;
use rustc_hash::FxHashSet;

pub(crate) struct NegativeCache {
    entries: VecDeque<FxHashSet<GrammarId>>,
    /// Index of the current position in `entries`; always valid.
    cursor: usize,
    /// Current position relative to where the parse started.
    offset: isize,
}

impl NegativeCache {
    pub(crate) fn new() -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(FxHashSet::default());
        NegativeCache {
            entries,
            cursor: 0,
            offset: 0,
        }
    }

    pub(crate) fn go_right(&mut self) {
        if self.cursor + 1 == self.entries.len() {
            self.entries.push_back(FxHashSet::default());
        }
        self.cursor += 1;
        self.offset += 1;
    }

    pub(crate) fn go_left(&mut self) {
        if self.cursor == 0 {
            self.entries.push_front(FxHashSet::default());
        } else {
            self.cursor -= 1;
        }
        self.offset -= 1;
    }

    pub(crate) fn add_negative(&mut self, grammar: GrammarId) {
        self.entries[self.cursor].insert(grammar);
    }

    pub(crate) fn is_negative(&self, grammar: GrammarId) -> bool {
        self.entries[self.cursor].contains(&grammar)
    }

    /// Drop every position right of the cursor.
    pub(crate) fn cut(&mut self) {
        self.entries.truncate(self.cursor + 1);
    }

    /// Forget all recorded failures, keeping the cursor.
    pub(crate) fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.clear();
        }
    }

    #[inline]
    pub(crate) fn offset(&self) -> isize {
        self.offset
    }
}

//! Forward-transition optimizer.
//!
//! Annotates every switch alternative reachable from a root with the set
//! of tokens that can start it. The engine uses the set to skip an
//! alternative without pushing a step when the next token cannot begin
//! it. The sets are conservative: whenever the walk cannot tell (an
//! alternative that may match nothing, a cycle back into a grammar
//! already being collected) the set errs towards accepting more.

use std::sync::Arc;

use pargen_ir::{GrammarEntry, GrammarId, GrammarKind, GrammarTable, TokenMatcher, Transitions};
use smallvec::SmallVec;
use tracing::debug;

use crate::stack::ensure_sufficient_stack;

/// Annotate the switches reachable from `root`.
///
/// Nodes are marked as visited, so calling this again for another root
/// of the same table only walks what is new.
#[tracing::instrument(level = "debug", skip_all)]
pub fn optimize<U>(table: &mut GrammarTable<U>, root: GrammarId) {
    let mut optimizer = Optimizer {
        stamps: vec![0; table.len()],
        loop_id: 1,
        annotated: 0,
    };
    optimizer.walk(table, root);
    debug!(
        root = table.name(root),
        annotated = optimizer.annotated,
        "forward transitions computed"
    );
}

struct Optimizer {
    /// `loop_id` of the collection that last entered each node.
    stamps: Vec<u32>,
    loop_id: u32,
    annotated: usize,
}

impl Optimizer {
    fn walk<U>(&mut self, table: &mut GrammarTable<U>, id: GrammarId) {
        ensure_sufficient_stack(|| self.walk_inner(table, id));
    }

    fn walk_inner<U>(&mut self, table: &mut GrammarTable<U>, id: GrammarId) {
        // Dangling ids are reported by the engine when a parse reaches them.
        if table.try_get(id).is_none() {
            return;
        }
        let grammar = table.get_mut(id);
        if grammar.optimized {
            return;
        }
        grammar.optimized = true;

        let children: SmallVec<[GrammarId; 8]> = match &table.get(id).kind {
            GrammarKind::Immediate(_) => return,
            GrammarKind::Alias(target) => SmallVec::from_elem(*target, 1),
            GrammarKind::Compound(compound) => compound
                .entries
                .iter()
                .filter_map(|entry| match entry {
                    GrammarEntry::Subgrammar(sub) => Some(sub.grammar),
                    GrammarEntry::Jump(jump) => Some(jump.switch),
                    GrammarEntry::InlineMatch(_) => None,
                })
                .collect(),
            GrammarKind::Switch(switch) => {
                let alternatives: SmallVec<[GrammarId; 8]> =
                    switch.entries.iter().map(|entry| entry.grammar).collect();
                for (index, alternative) in alternatives.into_iter().enumerate() {
                    let mut transitions = Transitions::default();
                    if self.collect(table, alternative, &mut transitions) {
                        transitions.any = true;
                    }
                    if let GrammarKind::Switch(switch) = &mut table.get_mut(id).kind {
                        switch.entries[index].transitions = Some(transitions);
                        self.annotated += 1;
                    }
                    self.loop_id += 1;
                    self.walk(table, alternative);
                }
                return;
            }
        };

        for child in children {
            self.walk(table, child);
        }
    }

    /// Add the first tokens of `id` to `transitions`. Returns whether
    /// `id` may match without consuming a token.
    fn collect<U>(
        &mut self,
        table: &GrammarTable<U>,
        id: GrammarId,
        transitions: &mut Transitions<U>,
    ) -> bool {
        ensure_sufficient_stack(|| self.collect_inner(table, id, transitions))
    }

    fn collect_inner<U>(
        &mut self,
        table: &GrammarTable<U>,
        id: GrammarId,
        transitions: &mut Transitions<U>,
    ) -> bool {
        let Some(grammar) = table.try_get(id) else {
            return true;
        };
        let stamp = &mut self.stamps[id.index()];
        if *stamp == self.loop_id {
            return true;
        }
        *stamp = self.loop_id;

        match &grammar.kind {
            GrammarKind::Immediate(matcher) => {
                match matcher {
                    TokenMatcher::Exact(text) => {
                        transitions.tokens.insert(text.clone());
                    }
                    TokenMatcher::Any => transitions.any = true,
                    TokenMatcher::Predicate(predicate) => {
                        transitions.predicates.push(Arc::clone(predicate));
                    }
                }
                false
            }
            GrammarKind::Compound(compound) => {
                for sub in compound.entries.iter().filter_map(|e| e.as_subgrammar()) {
                    if !self.collect(table, sub.grammar, transitions) && !sub.is_optional() {
                        return false;
                    }
                }
                true
            }
            // Optional as soon as one alternative is.
            GrammarKind::Switch(switch) => {
                let mut optional = false;
                for entry in &switch.entries {
                    optional |= self.collect(table, entry.grammar, transitions);
                }
                optional
            }
            GrammarKind::Alias(target) => self.collect(table, *target, transitions),
        }
    }
}

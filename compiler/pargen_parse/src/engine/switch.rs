//! Switch steps: ordered alternation with direct left recursion.
//!
//! A switch runs in two phases. The NLR phase tries the alternatives
//! that do not start with the switch itself, in order, and keeps the
//! first one that consumes input as the seed. The LR phase then tries
//! the left-recursive alternatives with the seed pre-assigned to their
//! leading field, starting right after that field. Each success becomes
//! the new seed and the LR phase starts over, so `a + b + c` grows as
//! `((a + b) + c)`. The switch matches with the last seed once no
//! left-recursive alternative extends it.

use pargen_ir::{GrammarId, GrammarKind, SwitchEntry, SwitchGrammar};
use tracing::trace;

use super::{grammar_of, switch_of, CompoundStart, Flow, ParseResult, Parser, Verdict};
use crate::acceptor::{Acceptor, Slot};
use crate::error::EngineError;
use crate::step::{SwitchPhase, SwitchStep};

impl<U> Parser<'_, U> {
    fn switch_step(&mut self, idx: usize) -> Result<&mut SwitchStep, EngineError> {
        self.state
            .steps
            .get_mut(idx)
            .and_then(|step| step.switch_mut())
            .ok_or(EngineError::StepMismatch(idx))
    }

    /// Try the next alternative of the current phase.
    pub(super) fn switch_advance(&mut self, idx: usize) -> Result<(), EngineError> {
        let table = self.table;
        let grammar = self.step(idx)?.grammar;
        let switch = switch_of(table, grammar)?;
        match self.switch_step(idx)?.phase {
            SwitchPhase::Nlr => self.switch_nlr(idx, grammar, switch),
            SwitchPhase::Lr => self.switch_lr(idx, grammar, switch),
        }
    }

    fn switch_nlr(
        &mut self,
        idx: usize,
        grammar: GrammarId,
        switch: &SwitchGrammar<U>,
    ) -> Result<(), EngineError> {
        let table = self.table;
        loop {
            let state = self.switch_step(idx)?;
            let Some(entry) = switch.entries.get(state.next_nlr) else {
                break;
            };
            state.next_nlr += 1;
            if !self.variant_allows(&entry.variants) || !self.upwards_green(entry) {
                continue;
            }

            let acceptor = Acceptor::Slot(idx, Slot::SwitchSeed);
            if let GrammarKind::Compound(compound) = &grammar_of(table, entry.grammar)?.kind {
                if compound.first_subgrammar().is_some_and(|first| first.grammar == grammar) {
                    continue;
                }
                self.push_compound(entry.grammar, acceptor, false, CompoundStart::FRESH)?;
                return Ok(());
            }
            match self.parse_grammar(entry.grammar, acceptor, false)? {
                ParseResult::Up => return Ok(()),
                ParseResult::NonemptyMatch => return self.switch_match(idx, true, false),
                ParseResult::EmptyMatch => return self.switch_match(idx, true, true),
                ParseResult::NoMatch => {}
            }
        }

        let state = self.switch_step(idx)?;
        if state.got_empty_nlr {
            let seed = state.nlr_element;
            state.element = seed;
            if self.notify_accept(grammar, seed) == Flow::Repositioned {
                return Ok(());
            }
            return self.switch_final_match(idx, true);
        }
        self.switch_match(idx, false, false)
    }

    /// An alternative finished (or, with `matched == false`, the NLR
    /// phase ran out of alternatives).
    pub(super) fn switch_match(
        &mut self,
        idx: usize,
        matched: bool,
        empty: bool,
    ) -> Result<(), EngineError> {
        let grammar = self.step(idx)?.grammar;
        let state = self.switch_step(idx)?;
        match state.phase {
            // An empty match is remembered, but a later alternative that
            // consumes input is preferred.
            SwitchPhase::Nlr if matched && empty => {
                state.got_empty_nlr = true;
                self.switch_advance(idx)
            }
            SwitchPhase::Nlr => {
                state.phase = SwitchPhase::Lr;
                state.next_lr = 0;
                if matched {
                    state.got_nonempty_nlr = true;
                    let seed = state.nlr_element;
                    trace!(switch = self.table.name(grammar), "seed matched");
                    if self.notify_accept(grammar, seed) == Flow::Repositioned {
                        return Ok(());
                    }
                }
                self.switch_advance(idx)
            }
            SwitchPhase::Lr if empty => self.switch_advance(idx),
            SwitchPhase::Lr => {
                let grown = state.element.take();
                state.got_lr_match = true;
                state.nlr_element = grown;
                state.next_lr = 0;
                trace!(switch = self.table.name(grammar), "seed grown");
                if self.notify_accept(grammar, grown) == Flow::Repositioned {
                    return Ok(());
                }
                self.switch_advance(idx)
            }
        }
    }

    fn switch_lr(
        &mut self,
        idx: usize,
        grammar: GrammarId,
        switch: &SwitchGrammar<U>,
    ) -> Result<(), EngineError> {
        let table = self.table;
        loop {
            let state = self.switch_step(idx)?;
            let Some(entry) = switch.entries.get(state.next_lr) else {
                break;
            };
            state.next_lr += 1;
            let has_seed = state.got_empty_nlr || state.got_nonempty_nlr || state.got_lr_match;
            let seed = state.nlr_element;

            let Some(compound) = grammar_of(table, entry.grammar)?.as_compound() else {
                continue;
            };
            let Some(first_index) = compound.first_subgrammar_index() else {
                continue;
            };
            let Some(first) = compound.entries[first_index].as_subgrammar() else {
                continue;
            };
            if first.grammar != grammar || !self.variant_allows(&entry.variants) {
                continue;
            }
            if !has_seed && !first.is_optional() {
                continue;
            }

            self.switch_step(idx)?.element = None;
            let element = self.push_compound(
                entry.grammar,
                Acceptor::Slot(idx, Slot::SwitchCurrent),
                false,
                CompoundStart {
                    entry: first_index + 1,
                    got_nonoptional_match: false,
                    go_right_count: 0,
                    records_negative: false,
                },
            )?;
            if let (Some(seed), Some(field)) = (seed, first.field) {
                self.state.assign_field(element, field, Some(seed))?;
            }
            return Ok(());
        }

        self.switch_lr_exhausted(idx, grammar)
    }

    fn switch_lr_exhausted(&mut self, idx: usize, grammar: GrammarId) -> Result<(), EngineError> {
        let table = self.table;
        let state = self.switch_step(idx)?;
        let element = state.nlr_element;
        state.element = element;
        let nonempty = state.got_lr_match || state.got_nonempty_nlr;
        let got_empty = state.got_empty_nlr;

        if nonempty {
            let match_fn = table.try_get(grammar).and_then(|g| g.hooks.match_fn.as_ref());
            if let (Some(element), Some(match_fn)) = (element, match_fn) {
                match self.run_match(match_fn, element) {
                    Verdict::Keep => {}
                    Verdict::Reject => return self.switch_no_match(idx),
                    Verdict::Repositioned => return Ok(()),
                }
            }
            return self.switch_final_match(idx, false);
        }
        if got_empty {
            if self.notify_accept(grammar, None) == Flow::Repositioned {
                return Ok(());
            }
            return self.switch_final_match(idx, true);
        }
        self.switch_no_match(idx)
    }

    fn switch_no_match(&mut self, idx: usize) -> Result<(), EngineError> {
        let step = self.step(idx)?;
        let (grammar, acceptor, optional) = (step.grammar, step.acceptor, step.optional);
        if !optional {
            return self.pop(false, false);
        }
        if self.notify_accept(grammar, None) == Flow::Repositioned {
            return Ok(());
        }
        self.state.deliver(acceptor, None)?;
        self.pop(true, true)
    }

    fn switch_final_match(&mut self, idx: usize, empty: bool) -> Result<(), EngineError> {
        let acceptor = self.step(idx)?.acceptor;
        let element = self.switch_step(idx)?.element;
        self.state.deliver(acceptor, element)?;
        self.pop(true, empty)
    }

    /// Whether alternative `entry` may start here, going by the negative
    /// cache and the optimizer's first-token set.
    fn upwards_green(&mut self, entry: &SwitchEntry<U>) -> bool {
        if self.config.negative_cache && self.state.negative.is_negative(entry.grammar) {
            self.state.stats.negative_hits += 1;
            return false;
        }
        if !self.config.forward_optimization {
            return true;
        }
        let Some(transitions) = &entry.transitions else {
            return true;
        };
        if transitions.any {
            return true;
        }

        let start = self.state.stream.position();
        let green = match self.state.stream.next_token() {
            Some(token) => transitions.accepts(&token, self.user),
            None => false,
        };
        self.state.stream.set_position(start);
        if !green {
            self.state.stats.forward_skips += 1;
            trace!(alternative = self.table.name(entry.grammar), "skipped by first token");
        }
        green
    }
}

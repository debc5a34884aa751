//! Compound steps: entries matched in order, plus upward jumps.

use pargen_ir::{GrammarEntry, GrammarId, GrammarTable, JumpEntry};
use tracing::debug;

use super::{compound_of, switch_of, CompoundStart, Flow, ParseResult, Parser, Verdict};
use crate::acceptor::Acceptor;
use crate::error::EngineError;
use crate::step::{CompoundStep, StepKind};

impl<U> Parser<'_, U> {
    fn compound_step(&mut self, idx: usize) -> Result<&mut CompoundStep, EngineError> {
        self.state
            .steps
            .get_mut(idx)
            .and_then(|step| step.compound_mut())
            .ok_or(EngineError::StepMismatch(idx))
    }

    /// Continue the compound at `idx` from its next entry. `empty_match`
    /// describes the child that just popped (true when there was none).
    pub(super) fn compound_match(&mut self, idx: usize, empty_match: bool) -> Result<(), EngineError> {
        let table = self.table;
        let compound = compound_of(table, self.step(idx)?.grammar)?;
        if !empty_match {
            self.compound_step(idx)?.got_nonoptional_match = true;
        }

        loop {
            let step = self.compound_step(idx)?;
            if step.jump_performed {
                break;
            }
            let index = step.next_entry;
            let Some(entry) = compound.entries.get(index) else {
                break;
            };
            step.next_entry += 1;
            let element = step.element;

            match entry {
                GrammarEntry::Jump(_) => step.jump = Some(index),
                GrammarEntry::InlineMatch(inline) => match self.run_match(inline, element) {
                    Verdict::Keep => {}
                    Verdict::Reject => return self.compound_no_match(idx),
                    Verdict::Repositioned => return Ok(()),
                },
                GrammarEntry::Subgrammar(sub) => {
                    let acceptor = sub
                        .field
                        .map_or(Acceptor::Discard, |field| Acceptor::Field { element, field });
                    if sub.is_sequence() {
                        self.push_step(
                            sub.grammar,
                            acceptor,
                            sub.is_optional(),
                            StepKind::Sequence(Default::default()),
                        );
                        return Ok(());
                    }
                    match self.parse_grammar(sub.grammar, acceptor, sub.is_optional())? {
                        ParseResult::NonemptyMatch => {
                            self.compound_step(idx)?.got_nonoptional_match = true;
                        }
                        ParseResult::EmptyMatch => {}
                        ParseResult::NoMatch => return self.compound_no_match(idx),
                        ParseResult::Up => return Ok(()),
                    }
                }
            }
        }

        self.compound_exhausted(idx)
    }

    /// All entries matched, or a jump target finished.
    fn compound_exhausted(&mut self, idx: usize) -> Result<(), EngineError> {
        let table = self.table;
        let step = self.step(idx)?;
        let (grammar, acceptor) = (step.grammar, step.acceptor);
        let compound = self.compound_step(idx)?;
        let (element, jump_performed, pending) =
            (compound.element, compound.jump_performed, compound.jump);

        if !jump_performed {
            if pending.is_some() && self.config.upwards_jumps && self.try_jump(idx)? {
                return Ok(());
            }
            if let Some(match_fn) = table.try_get(grammar).and_then(|g| g.hooks.match_fn.as_ref()) {
                match self.run_match(match_fn, element) {
                    Verdict::Keep => {}
                    Verdict::Reject => return self.compound_no_match(idx),
                    Verdict::Repositioned => return Ok(()),
                }
            }
            if self.notify_accept(grammar, Some(element)) == Flow::Repositioned {
                return Ok(());
            }
            self.state.deliver(acceptor, Some(element))?;
        }

        let empty = !self.compound_step(idx)?.got_nonoptional_match;
        self.pop(true, empty)
    }

    pub(super) fn compound_no_match(&mut self, idx: usize) -> Result<(), EngineError> {
        let compound = self.compound_step(idx)?;
        if !compound.jump_performed
            && compound.jump.is_some()
            && self.config.upwards_jumps
            && self.try_jump(idx)?
        {
            return Ok(());
        }

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

    /// Take the pending upward jump of the compound at `idx`, if its
    /// predicate allows. The pending jump is consumed either way.
    ///
    /// The target alternative is pushed above the jumping compound and
    /// starts at the label's entry. It inherits the tokens consumed so
    /// far, so its outcome stands in for the jumping compound's.
    fn try_jump(&mut self, idx: usize) -> Result<bool, EngineError> {
        let table = self.table;
        let grammar = self.step(idx)?.grammar;
        let compound = self.compound_step(idx)?;
        let element = compound.element;
        let Some(index) = compound.jump.take() else {
            return Ok(false);
        };
        let Some(GrammarEntry::Jump(jump)) = compound_of(table, grammar)?.entries.get(index) else {
            return Err(EngineError::StepMismatch(idx));
        };

        if let Some(predicate) = &jump.predicate {
            if !predicate(element, &self.state.elements, self.user) {
                debug!(from = table.name(grammar), "upward jump declined");
                return Ok(false);
            }
        }
        let target = jump_target(table, jump)?;

        let step = &mut self.state.steps[idx];
        let go_right_count = std::mem::take(&mut step.go_right_count);
        let Some(compound) = step.compound_mut() else {
            return Err(EngineError::StepMismatch(idx));
        };
        compound.jump_performed = true;
        let got_nonoptional_match = compound.got_nonoptional_match;

        self.push_compound(
            target,
            Acceptor::Discard,
            false,
            CompoundStart {
                entry: jump.compound_index,
                got_nonoptional_match,
                go_right_count,
                records_negative: false,
            },
        )?;
        self.state.stats.jumps += 1;
        debug!(
            from = table.name(grammar),
            to = table.name(target),
            entry = jump.compound_index,
            "upward jump"
        );
        Ok(true)
    }
}

fn jump_target<U>(
    table: &GrammarTable<U>,
    jump: &JumpEntry<U>,
) -> Result<GrammarId, EngineError> {
    switch_of(table, jump.switch)?
        .entries
        .get(jump.switch_index)
        .map(|entry| entry.grammar)
        .ok_or_else(|| EngineError::BadJumpTarget {
            switch: table.name(jump.switch).into(),
            index: jump.switch_index,
        })
}

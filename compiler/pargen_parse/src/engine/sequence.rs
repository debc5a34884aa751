//! Sequence steps: one grammar repeated while it keeps matching.

use super::{ParseResult, Parser};
use crate::acceptor::Acceptor;
use crate::error::EngineError;
use crate::step::SequenceStep;

impl<U> Parser<'_, U> {
    fn sequence_step(&mut self, idx: usize) -> Result<&mut SequenceStep, EngineError> {
        self.state
            .steps
            .get_mut(idx)
            .and_then(|step| step.sequence_mut())
            .ok_or(EngineError::StepMismatch(idx))
    }

    /// Try further items until one fails or needs a step of its own.
    pub(super) fn sequence_match(&mut self, idx: usize) -> Result<(), EngineError> {
        let item = self.step(idx)?.grammar;
        loop {
            let sequence = self.sequence_step(idx)?;
            sequence.committed = sequence.items.len();
            match self.parse_grammar(item, Acceptor::List(idx), false)? {
                ParseResult::NonemptyMatch => {}
                ParseResult::EmptyMatch | ParseResult::NoMatch => {
                    return self.sequence_no_match(idx)
                }
                ParseResult::Up => return Ok(()),
            }
        }
    }

    /// An item step popped.
    ///
    /// An item that matched without consuming anything would match again
    /// forever, so it ends the sequence like a failed one, and whatever it
    /// delivered is dropped.
    pub(super) fn sequence_down(
        &mut self,
        idx: usize,
        matched: bool,
        empty: bool,
    ) -> Result<(), EngineError> {
        if matched && !empty {
            return self.sequence_match(idx);
        }
        if matched {
            let sequence = self.sequence_step(idx)?;
            let committed = sequence.committed;
            sequence.items.truncate(committed);
        }
        self.sequence_no_match(idx)
    }

    fn sequence_no_match(&mut self, idx: usize) -> Result<(), EngineError> {
        let step = self.step(idx)?;
        let (acceptor, optional) = (step.acceptor, step.optional);
        let items = std::mem::take(&mut self.sequence_step(idx)?.items);

        if !items.is_empty() {
            for item in items {
                self.state.deliver(acceptor, Some(item))?;
            }
            return self.pop(true, false);
        }
        if optional {
            self.pop(true, true)
        } else {
            self.pop(false, false)
        }
    }
}

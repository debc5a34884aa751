//! Alias steps.
//!
//! An alias is transparent: its target is parsed with the alias's own
//! optionality and the result is handed on unchanged. The alias step
//! exists so the alias's own callbacks fire around the target's.

use pargen_ir::GrammarKind;

use super::{grammar_of, Flow, ParseResult, Parser, Verdict};
use crate::acceptor::{Acceptor, Slot};
use crate::error::EngineError;

impl<U> Parser<'_, U> {
    pub(super) fn alias_up(&mut self, idx: usize) -> Result<(), EngineError> {
        let table = self.table;
        let step = self.step(idx)?;
        let (grammar, optional) = (step.grammar, step.optional);
        let GrammarKind::Alias(target) = grammar_of(table, grammar)?.kind else {
            return Err(EngineError::KindMismatch {
                grammar: table.name(grammar).into(),
                expected: "alias",
            });
        };

        if let Some(alias) = self.state.steps.get_mut(idx).and_then(|step| step.alias_mut()) {
            alias.element = None;
        }
        match self.parse_grammar(target, Acceptor::Slot(idx, Slot::Alias), optional)? {
            ParseResult::Up => Ok(()),
            ParseResult::NonemptyMatch => self.alias_finish(idx, true, false),
            ParseResult::EmptyMatch => self.alias_finish(idx, true, true),
            ParseResult::NoMatch => self.alias_finish(idx, false, false),
        }
    }

    /// The target finished, synchronously or as a popped step.
    pub(super) fn alias_finish(
        &mut self,
        idx: usize,
        matched: bool,
        empty: bool,
    ) -> Result<(), EngineError> {
        let table = self.table;
        let step = self.step(idx)?;
        let (grammar, acceptor, optional) = (step.grammar, step.acceptor, step.optional);
        let element = self
            .state
            .steps
            .get_mut(idx)
            .and_then(|step| step.alias_mut())
            .ok_or(EngineError::StepMismatch(idx))?
            .element;

        if matched {
            let mut keep = true;
            let match_fn = table.try_get(grammar).and_then(|g| g.hooks.match_fn.as_ref());
            if let (false, Some(element), Some(match_fn)) = (empty, element, match_fn) {
                match self.run_match(match_fn, element) {
                    Verdict::Keep => {}
                    Verdict::Reject => keep = false,
                    Verdict::Repositioned => return Ok(()),
                }
            }
            if keep {
                if self.notify_accept(grammar, element) == Flow::Repositioned {
                    return Ok(());
                }
                self.state.deliver(acceptor, element)?;
                return self.pop(true, empty);
            }
        }

        if !optional {
            return self.pop(false, false);
        }
        if self.notify_accept(grammar, None) == Flow::Repositioned {
            return Ok(());
        }
        self.state.deliver(acceptor, None)?;
        self.pop(true, true)
    }
}

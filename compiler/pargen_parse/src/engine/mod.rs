//! The parsing engine.
//!
//! Parsing runs on an explicit stack of [`ParsingStep`]s instead of
//! native recursion, so input nesting depth never touches the call
//! stack. Each loop iteration looks at the top step and the current
//! [`Direction`]:
//!
//! - **Up**: the step was just pushed; start it.
//! - **Down**: a child step just popped; consume its outcome.
//! - **Resume**: a callback restored a position marker; the marked
//!   compound continues from its saved entry.
//!
//! Immediate grammars never get a step: they are matched synchronously
//! by [`Parser::parse_grammar`], which is why most step handlers loop
//! over several entries or alternatives before yielding to the main
//! loop.

mod alias;
mod compound;
mod sequence;
mod switch;

use pargen_ir::{
    CompoundGrammar, Element, ElementId, Grammar, GrammarId, GrammarKind, GrammarTable, MatchFn,
    SwitchGrammar, TokenElement, TokenMatcher, TokenStream,
};
use tracing::{debug, trace};

use crate::acceptor::Acceptor;
use crate::config::ParserConfig;
use crate::error::EngineError;
use crate::lookup::LookupData;
use crate::output::ParseOutput;
use crate::state::ParseState;
use crate::step::{CompoundStep, Direction, ParsingStep, StepKind, StepTag};

/// Outcome of [`Parser::parse_grammar`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ParseResult {
    /// A step was pushed, or a callback repositioned the parse; the main
    /// loop takes over.
    Up,
    NonemptyMatch,
    EmptyMatch,
    NoMatch,
}

/// Verdict of a veto callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Verdict {
    Keep,
    Reject,
    Repositioned,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Repositioned,
}

pub(crate) struct Parser<'a, U> {
    table: &'a GrammarTable<U>,
    config: &'a ParserConfig,
    user: &'a mut U,
    state: ParseState<'a>,
}

impl<'a, U> Parser<'a, U> {
    pub(crate) fn new(
        table: &'a GrammarTable<U>,
        config: &'a ParserConfig,
        stream: &'a mut dyn TokenStream,
        user: &'a mut U,
        lookup: Option<&'a mut dyn LookupData>,
    ) -> Self {
        Parser {
            table,
            config,
            user,
            state: ParseState::new(stream, lookup, config.negative_cache, config.create_elements),
        }
    }

    /// Parse the stream against `root`.
    pub(crate) fn run(mut self, root: GrammarId) -> Result<ParseOutput, EngineError> {
        if self.table.try_get(root).is_none() {
            return Err(EngineError::UnknownGrammar(root));
        }

        let mut matched = match self.parse_grammar(root, Acceptor::Root, false)? {
            ParseResult::NonemptyMatch | ParseResult::EmptyMatch => true,
            ParseResult::Up | ParseResult::NoMatch => false,
        };
        while let Some(top) = self.state.steps.len().checked_sub(1) {
            match self.state.direction {
                Direction::Up => self.parse_up(top)?,
                Direction::Down => self.parse_down(top)?,
                Direction::Resume => self.compound_match(top, true)?,
            }
            if self.state.steps.is_empty() {
                matched = self.state.matched;
            }
        }

        let stream = &mut *self.state.stream;
        let end = stream.position();
        let at_end = stream.next_token().is_none();
        stream.set_position(end);

        debug!(
            root = self.table.name(root),
            matched,
            at_end,
            steps = self.state.stats.steps,
            negative_hits = self.state.stats.negative_hits,
            forward_skips = self.state.stats.forward_skips,
            "parse finished"
        );
        Ok(ParseOutput {
            matched,
            root: self.state.root,
            elements: self.state.elements,
            stats: self.state.stats,
            at_end,
        })
    }

    fn parse_up(&mut self, idx: usize) -> Result<(), EngineError> {
        let step = self.step(idx)?;
        let (grammar, tag) = (step.grammar, step.kind.tag());
        trace!(grammar = self.table.name(grammar), depth = idx, "step up");
        match tag {
            StepTag::Sequence => self.sequence_match(idx),
            StepTag::Compound => {
                self.begin(grammar);
                self.compound_match(idx, true)
            }
            StepTag::Switch => {
                self.begin(grammar);
                self.switch_advance(idx)
            }
            StepTag::Alias => {
                self.begin(grammar);
                self.alias_up(idx)
            }
        }
    }

    fn parse_down(&mut self, idx: usize) -> Result<(), EngineError> {
        let (matched, empty) = (self.state.matched, self.state.empty_match);
        match self.step(idx)?.kind.tag() {
            StepTag::Sequence => self.sequence_down(idx, matched, empty),
            StepTag::Compound if matched => self.compound_match(idx, empty),
            StepTag::Compound => self.compound_no_match(idx),
            StepTag::Switch if matched => self.switch_match(idx, true, empty),
            StepTag::Switch => self.switch_advance(idx),
            StepTag::Alias => self.alias_finish(idx, matched, empty),
        }
    }

    /// Try `grammar` at the current position.
    ///
    /// Immediates are decided on the spot; every other kind pushes a
    /// step and reports [`ParseResult::Up`].
    pub(crate) fn parse_grammar(
        &mut self,
        grammar: GrammarId,
        acceptor: Acceptor,
        optional: bool,
    ) -> Result<ParseResult, EngineError> {
        let table = self.table;
        if self.config.negative_cache && self.state.negative.is_negative(grammar) {
            self.state.stats.negative_hits += 1;
            trace!(grammar = table.name(grammar), "known to fail here");
            return self.no_match_in_place(grammar, acceptor, optional);
        }

        match &grammar_of(table, grammar)?.kind {
            GrammarKind::Immediate(matcher) => {
                self.parse_immediate(grammar, matcher, acceptor, optional)
            }
            GrammarKind::Compound(_) => {
                self.push_compound(grammar, acceptor, optional, CompoundStart::FRESH)?;
                Ok(ParseResult::Up)
            }
            GrammarKind::Switch(_) => {
                self.push_step(grammar, acceptor, optional, StepKind::Switch(Default::default()));
                Ok(ParseResult::Up)
            }
            GrammarKind::Alias(_) => {
                self.push_step(grammar, acceptor, optional, StepKind::Alias(Default::default()));
                Ok(ParseResult::Up)
            }
        }
    }

    fn parse_immediate(
        &mut self,
        grammar: GrammarId,
        matcher: &TokenMatcher<U>,
        acceptor: Acceptor,
        optional: bool,
    ) -> Result<ParseResult, EngineError> {
        let table = self.table;
        let hooks = &grammar_of(table, grammar)?.hooks;
        let start = self.state.stream.position();
        let level = self.state.elements.level();
        // Hooks need an element to look at even when nobody stores it.
        let wants_element =
            (acceptor.stores() || !hooks.is_empty()) && self.state.create_elements;

        let matched = match self.state.stream.next_token() {
            Some(token) if matcher.matches(&token, self.user) => {
                if wants_element {
                    let element = Element::Token(TokenElement {
                        text: token.text.into(),
                        payload: token.payload,
                    });
                    let id = self.state.elements.alloc(element);
                    Some(Some(id.ok_or(EngineError::ElementLimit)?))
                } else {
                    Some(None)
                }
            }
            _ => None,
        };

        let Some(element) = matched else {
            self.state.stream.set_position(start);
            return self.no_match_in_place(grammar, acceptor, optional);
        };
        self.state.go_right();

        if let Some(element) = element {
            if let Some(match_fn) = &hooks.match_fn {
                match self.run_match(match_fn, element) {
                    Verdict::Keep => {}
                    Verdict::Reject => {
                        self.state.go_left();
                        self.state.elements.truncate(level);
                        self.state.stream.set_position(start);
                        return self.no_match_in_place(grammar, acceptor, optional);
                    }
                    Verdict::Repositioned => return Ok(ParseResult::Up),
                }
            }
            if self.notify_accept(grammar, Some(element)) == Flow::Repositioned {
                return Ok(ParseResult::Up);
            }
            self.state.deliver(acceptor, Some(element))?;
        }
        Ok(ParseResult::NonemptyMatch)
    }

    /// Settle a failure that never got a step of its own.
    fn no_match_in_place(
        &mut self,
        grammar: GrammarId,
        acceptor: Acceptor,
        optional: bool,
    ) -> Result<ParseResult, EngineError> {
        if !optional {
            return Ok(ParseResult::NoMatch);
        }
        if self.notify_accept(grammar, None) == Flow::Repositioned {
            return Ok(ParseResult::Up);
        }
        self.state.deliver(acceptor, None)?;
        Ok(ParseResult::EmptyMatch)
    }

    fn begin(&mut self, grammar: GrammarId) {
        let table = self.table;
        if let Some(begin) = table.try_get(grammar).and_then(|g| g.hooks.begin.as_ref()) {
            begin(self.user);
        }
    }

    /// Run a veto callback on `element`.
    fn run_match(&mut self, match_fn: &MatchFn<U>, element: ElementId) -> Verdict {
        self.state.position_changed = false;
        let keep = match_fn(element, &mut self.state, self.user);
        if self.state.position_changed {
            Verdict::Repositioned
        } else if keep {
            Verdict::Keep
        } else {
            Verdict::Reject
        }
    }

    /// Fire the accept hook of `grammar`, if it has one.
    fn notify_accept(&mut self, grammar: GrammarId, element: Option<ElementId>) -> Flow {
        let table = self.table;
        let Some(accept) = table.try_get(grammar).and_then(|g| g.hooks.accept.as_ref()) else {
            return Flow::Continue;
        };
        self.state.position_changed = false;
        accept(element, &mut self.state, self.user);
        if self.state.position_changed {
            Flow::Repositioned
        } else {
            Flow::Continue
        }
    }

    fn push_step(&mut self, grammar: GrammarId, acceptor: Acceptor, optional: bool, kind: StepKind) {
        // A sequence step is keyed by its item grammar. The sequence failing
        // says nothing about the item failing here: the item may have
        // matched empty.
        let records_negative = !matches!(kind, StepKind::Sequence(_));
        self.push_prepared(ParsingStep {
            grammar,
            acceptor,
            optional,
            stream_pos: self.state.stream.position(),
            go_right_count: 0,
            el_level: self.state.elements.level(),
            serial: 0,
            records_negative,
            kind,
        });
    }

    fn push_prepared(&mut self, step: ParsingStep) {
        trace!(
            grammar = self.table.name(step.grammar),
            kind = self.table.try_get(step.grammar).map_or("?", |g| g.kind.label()),
            depth = self.state.steps.len(),
            "push"
        );
        self.state.push_step(step);
    }

    fn pop(&mut self, matched: bool, empty: bool) -> Result<(), EngineError> {
        if let Some(step) = self.state.steps.last() {
            trace!(
                grammar = self.table.name(step.grammar),
                depth = self.state.steps.len() - 1,
                matched,
                empty,
                "pop"
            );
        }
        self.state.pop_step(matched, empty)
    }

    /// Allocate the element and push a step for compound `grammar`.
    fn push_compound(
        &mut self,
        grammar: GrammarId,
        acceptor: Acceptor,
        optional: bool,
        start: CompoundStart,
    ) -> Result<ElementId, EngineError> {
        let table = self.table;
        let compound = compound_of(table, grammar)?;
        let el_level = self.state.elements.level();
        let element = self
            .state
            .elements
            .alloc(Element::Compound(compound.factory.create()))
            .ok_or(EngineError::ElementLimit)?;
        self.push_prepared(ParsingStep {
            grammar,
            acceptor,
            optional,
            stream_pos: self.state.stream.position(),
            go_right_count: start.go_right_count,
            el_level,
            serial: 0,
            records_negative: start.records_negative,
            kind: StepKind::Compound(CompoundStep {
                element,
                next_entry: start.entry,
                got_nonoptional_match: start.got_nonoptional_match,
                jump: None,
                jump_performed: false,
            }),
        });
        Ok(element)
    }

    fn step(&self, idx: usize) -> Result<&ParsingStep, EngineError> {
        self.state
            .steps
            .get(idx)
            .ok_or(EngineError::StepMismatch(idx))
    }

    /// Whether `variants` admits the active variant. An empty list
    /// admits every variant.
    fn variant_allows(&self, variants: &[Box<str>]) -> bool {
        if variants.is_empty() {
            return true;
        }
        let active = self
            .state
            .variant
            .as_deref()
            .unwrap_or(&self.config.default_variant);
        variants.iter().any(|variant| &**variant == active)
    }
}

/// Where a compound step starts. Fresh occurrences start at entry 0;
/// left-recursion continuations and upward jumps start mid-way.
#[derive(Copy, Clone, Debug)]
struct CompoundStart {
    entry: usize,
    got_nonoptional_match: bool,
    go_right_count: usize,
    records_negative: bool,
}

impl CompoundStart {
    const FRESH: CompoundStart = CompoundStart {
        entry: 0,
        got_nonoptional_match: false,
        go_right_count: 0,
        records_negative: true,
    };
}

fn grammar_of<U>(table: &GrammarTable<U>, id: GrammarId) -> Result<&Grammar<U>, EngineError> {
    table.try_get(id).ok_or(EngineError::UnknownGrammar(id))
}

fn compound_of<U>(table: &GrammarTable<U>, id: GrammarId) -> Result<&CompoundGrammar<U>, EngineError> {
    grammar_of(table, id)?
        .as_compound()
        .ok_or_else(|| EngineError::KindMismatch {
            grammar: table.name(id).into(),
            expected: "compound",
        })
}

fn switch_of<U>(table: &GrammarTable<U>, id: GrammarId) -> Result<&SwitchGrammar<U>, EngineError> {
    grammar_of(table, id)?
        .as_switch()
        .ok_or_else(|| EngineError::KindMismatch {
            grammar: table.name(id).into(),
            expected: "switch",
        })
}

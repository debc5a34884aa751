//! Mutable state of one parse, and the [`ParserControl`] surface that
//! callbacks see.

use pargen_ir::{
    ControlError, ElementArena, ElementId, ParserControl, PositionMarker, TokenStream,
};
use tracing::debug;

use crate::acceptor::{Acceptor, Slot};
use crate::error::EngineError;
use crate::lookup::LookupData;
use crate::negative_cache::NegativeCache;
use crate::output::ParseStats;
use crate::step::{Direction, ParsingStep, StepKind};

pub(crate) struct ParseState<'a> {
    pub(crate) stream: &'a mut dyn TokenStream,
    lookup: Option<&'a mut dyn LookupData>,
    pub(crate) steps: Vec<ParsingStep>,
    pub(crate) elements: ElementArena,
    pub(crate) negative: NegativeCache,
    cache_enabled: bool,
    pub(crate) direction: Direction,
    /// Outcome of the last popped step.
    pub(crate) matched: bool,
    pub(crate) empty_match: bool,
    /// Set by `set_position`; checked after every callback.
    pub(crate) position_changed: bool,
    pub(crate) create_elements: bool,
    pub(crate) variant: Option<String>,
    pub(crate) root: Option<ElementId>,
    pub(crate) stats: ParseStats,
    next_serial: u64,
}

impl<'a> ParseState<'a> {
    pub(crate) fn new(
        stream: &'a mut dyn TokenStream,
        lookup: Option<&'a mut dyn LookupData>,
        cache_enabled: bool,
        create_elements: bool,
    ) -> Self {
        ParseState {
            stream,
            lookup,
            steps: Vec::new(),
            elements: ElementArena::new(),
            negative: NegativeCache::new(),
            cache_enabled,
            direction: Direction::Up,
            matched: false,
            empty_match: false,
            position_changed: false,
            create_elements,
            variant: None,
            root: None,
            stats: ParseStats::default(),
            next_serial: 0,
        }
    }

    pub(crate) fn push_step(&mut self, mut step: ParsingStep) {
        step.serial = self.next_serial;
        self.next_serial += 1;
        self.stats.steps += 1;
        if let Some(lookup) = self.lookup.as_deref_mut() {
            lookup.new_checkpoint();
        }
        self.steps.push(step);
        self.direction = Direction::Up;
    }

    /// Pop the top step with its outcome and hand control back down.
    pub(crate) fn pop_step(&mut self, matched: bool, empty: bool) -> Result<(), EngineError> {
        let step = self
            .steps
            .pop()
            .ok_or(EngineError::StepMismatch(self.steps.len()))?;
        self.finish_pop(step, matched, empty, true);
        Ok(())
    }

    /// Everything a pop does after the step left the stack.
    ///
    /// Without `update_cache` the negative cache cursor is left where it
    /// is; `set_position` rewinds it itself.
    pub(crate) fn finish_pop(
        &mut self,
        step: ParsingStep,
        matched: bool,
        empty: bool,
        update_cache: bool,
    ) {
        if !matched || empty {
            self.stream.set_position(step.stream_pos);
        }
        if update_cache {
            if !matched || empty {
                for _ in 0..step.go_right_count {
                    self.negative.go_left();
                }
            } else if let Some(parent) = self.steps.last_mut() {
                parent.go_right_count += step.go_right_count;
            }
            if !matched && step.records_negative && self.cache_enabled {
                self.negative.add_negative(step.grammar);
            }
        }
        if !matched {
            self.elements.truncate(step.el_level);
        }
        if let Some(lookup) = self.lookup.as_deref_mut() {
            if matched {
                lookup.commit_checkpoint();
            } else {
                lookup.cancel_checkpoint();
            }
        }
        self.matched = matched;
        self.empty_match = empty;
        self.direction = Direction::Down;
    }

    /// Record one consumed token.
    pub(crate) fn go_right(&mut self) {
        self.negative.go_right();
        if let Some(step) = self.steps.last_mut() {
            step.go_right_count += 1;
        }
        let offset = usize::try_from(self.negative.offset()).unwrap_or(0);
        self.stats.furthest_token = self.stats.furthest_token.max(offset);
    }

    /// Give back the token most recently recorded by `go_right`.
    pub(crate) fn go_left(&mut self) {
        self.negative.go_left();
        if let Some(step) = self.steps.last_mut() {
            step.go_right_count = step.go_right_count.saturating_sub(1);
        }
    }

    /// Hand a matched (or cleared) element to its destination.
    pub(crate) fn deliver(
        &mut self,
        acceptor: Acceptor,
        element: Option<ElementId>,
    ) -> Result<(), EngineError> {
        match acceptor {
            Acceptor::Discard => {}
            Acceptor::Root => self.root = element,
            Acceptor::List(depth) => {
                let sequence = self
                    .steps
                    .get_mut(depth)
                    .and_then(ParsingStep::sequence_mut)
                    .ok_or(EngineError::StepMismatch(depth))?;
                sequence.items.extend(element);
            }
            Acceptor::Slot(depth, slot) => {
                let step = self
                    .steps
                    .get_mut(depth)
                    .ok_or(EngineError::StepMismatch(depth))?;
                let target = match (slot, &mut step.kind) {
                    (Slot::SwitchSeed, StepKind::Switch(switch)) => &mut switch.nlr_element,
                    (Slot::SwitchCurrent, StepKind::Switch(switch)) => &mut switch.element,
                    (Slot::Alias, StepKind::Alias(alias)) => &mut alias.element,
                    _ => return Err(EngineError::StepMismatch(depth)),
                };
                *target = element;
            }
            Acceptor::Field { element: parent, field } => {
                self.assign_field(parent, field, element)?;
            }
        }
        Ok(())
    }

    pub(crate) fn assign_field(
        &mut self,
        parent: ElementId,
        field: usize,
        value: Option<ElementId>,
    ) -> Result<(), EngineError> {
        self.elements
            .compound_mut(parent)
            .ok_or(EngineError::StaleElement(parent))?
            .assign(field, value);
        Ok(())
    }
}

impl ParserControl for ParseState<'_> {
    fn set_create_elements(&mut self, create: bool) {
        self.create_elements = create;
    }

    fn position(&self) -> Result<PositionMarker, ControlError> {
        let depth = self
            .steps
            .len()
            .checked_sub(1)
            .ok_or(ControlError::NotInCompound)?;
        let step = &self.steps[depth];
        let compound = step.compound().ok_or(ControlError::NotInCompound)?;
        let fields = self
            .elements
            .compound(compound.element)
            .map(|element| element.fields().iter().cloned().collect())
            .unwrap_or_default();
        Ok(PositionMarker {
            depth,
            serial: step.serial,
            stream_pos: self.stream.position(),
            next_entry: compound.next_entry,
            got_nonoptional_match: compound.got_nonoptional_match,
            pending_jump: compound.jump,
            go_right_count: step.go_right_count,
            element_level: self.elements.level(),
            fields,
        })
    }

    fn set_position(&mut self, marker: &PositionMarker) -> Result<(), ControlError> {
        let live = self
            .steps
            .get(marker.depth)
            .is_some_and(|step| step.serial == marker.serial && step.compound().is_some());
        if !live {
            return Err(ControlError::StaleMarker);
        }

        let mut consumed = 0;
        while self.steps.len() > marker.depth + 1 {
            if let Some(step) = self.steps.pop() {
                consumed += step.go_right_count;
                self.finish_pop(step, false, false, false);
            }
        }

        let step = &mut self.steps[marker.depth];
        consumed += step.go_right_count;
        step.go_right_count = marker.go_right_count;
        let Some(compound) = step.compound_mut() else {
            return Err(ControlError::StaleMarker);
        };
        compound.next_entry = marker.next_entry;
        compound.got_nonoptional_match = marker.got_nonoptional_match;
        compound.jump = marker.pending_jump;
        compound.jump_performed = false;
        let element = compound.element;

        self.elements.truncate(marker.element_level);
        if let Some(compound) = self.elements.compound_mut(element) {
            compound.restore_fields(&marker.fields);
        }

        for _ in marker.go_right_count..consumed {
            self.negative.go_left();
        }
        self.negative.cut();

        self.stream.set_position(marker.stream_pos);
        self.position_changed = true;
        self.direction = Direction::Resume;
        debug!(
            depth = marker.depth,
            entry = marker.next_entry,
            offset = marker.stream_pos.offset(),
            "position restored"
        );
        Ok(())
    }

    fn set_variant(&mut self, variant: &str) {
        self.variant = (!variant.is_empty()).then(|| variant.to_string());
        // Failures recorded under the old variant may succeed now.
        self.negative.clear();
    }

    fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    fn elements(&self) -> &ElementArena {
        &self.elements
    }

    fn elements_mut(&mut self) -> &mut ElementArena {
        &mut self.elements
    }
}

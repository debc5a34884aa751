//! Parsing steps: one frame of the explicit parse stack per in-progress
//! grammar occurrence.

use pargen_ir::{ElementId, ElementLevel, GrammarId, StreamPos};
use smallvec::SmallVec;

use crate::acceptor::Acceptor;

/// Which way the main loop moves next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    /// A step was just pushed and has not started.
    Up,
    /// A step was just popped; its parent consumes the result.
    Down,
    /// A callback restored a position marker; the marked compound
    /// continues from its saved entry.
    Resume,
}

pub(crate) struct ParsingStep {
    pub(crate) grammar: GrammarId,
    pub(crate) acceptor: Acceptor,
    pub(crate) optional: bool,
    /// Stream position when the step was pushed.
    pub(crate) stream_pos: StreamPos,
    /// Tokens consumed by this step and already-popped children.
    pub(crate) go_right_count: usize,
    pub(crate) el_level: ElementLevel,
    /// Unique per push; lets a position marker detect a reused depth.
    pub(crate) serial: u64,
    /// Failure may be recorded in the negative cache. Off for steps that
    /// start in the middle of a compound.
    pub(crate) records_negative: bool,
    pub(crate) kind: StepKind,
}

pub(crate) enum StepKind {
    Sequence(SequenceStep),
    Compound(CompoundStep),
    Switch(SwitchStep),
    Alias(AliasStep),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum StepTag {
    Sequence,
    Compound,
    Switch,
    Alias,
}

impl StepKind {
    pub(crate) fn tag(&self) -> StepTag {
        match self {
            StepKind::Sequence(_) => StepTag::Sequence,
            StepKind::Compound(_) => StepTag::Compound,
            StepKind::Switch(_) => StepTag::Switch,
            StepKind::Alias(_) => StepTag::Alias,
        }
    }
}

#[derive(Default)]
pub(crate) struct SequenceStep {
    pub(crate) items: SmallVec<[ElementId; 8]>,
    /// Items delivered before the current attempt.
    pub(crate) committed: usize,
}

pub(crate) struct CompoundStep {
    pub(crate) element: ElementId,
    pub(crate) next_entry: usize,
    pub(crate) got_nonoptional_match: bool,
    /// Entry index of the last anchor passed, if its jump is still open.
    pub(crate) jump: Option<usize>,
    pub(crate) jump_performed: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum SwitchPhase {
    /// Trying alternatives that do not start with the switch itself.
    #[default]
    Nlr,
    /// Growing the seed through left-recursive alternatives.
    Lr,
}

#[derive(Default)]
pub(crate) struct SwitchStep {
    pub(crate) phase: SwitchPhase,
    pub(crate) next_nlr: usize,
    pub(crate) next_lr: usize,
    pub(crate) got_empty_nlr: bool,
    pub(crate) got_nonempty_nlr: bool,
    pub(crate) got_lr_match: bool,
    /// Seed for left recursion; the best result so far.
    pub(crate) nlr_element: Option<ElementId>,
    pub(crate) element: Option<ElementId>,
}

#[derive(Default)]
pub(crate) struct AliasStep {
    pub(crate) element: Option<ElementId>,
}

impl ParsingStep {
    pub(crate) fn compound(&self) -> Option<&CompoundStep> {
        match &self.kind {
            StepKind::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    pub(crate) fn compound_mut(&mut self) -> Option<&mut CompoundStep> {
        match &mut self.kind {
            StepKind::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    pub(crate) fn sequence_mut(&mut self) -> Option<&mut SequenceStep> {
        match &mut self.kind {
            StepKind::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub(crate) fn switch_mut(&mut self) -> Option<&mut SwitchStep> {
        match &mut self.kind {
            StepKind::Switch(switch) => Some(switch),
            _ => None,
        }
    }

    pub(crate) fn alias_mut(&mut self) -> Option<&mut AliasStep> {
        match &mut self.kind {
            StepKind::Alias(alias) => Some(alias),
            _ => None,
        }
    }
}

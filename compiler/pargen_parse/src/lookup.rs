//! Speculative user data.

/// User state that must follow the engine's backtracking.
///
/// A checkpoint is opened whenever a step is pushed. It is committed
/// when the step matches and cancelled when the step fails, so every
/// change made while a failed alternative was tried can be rolled back.
/// Checkpoints nest like the step stack.
pub trait LookupData {
    fn new_checkpoint(&mut self);

    fn commit_checkpoint(&mut self);

    fn cancel_checkpoint(&mut self);
}

//! Validated stage transitions.

use super::ValidationError;

/// A closed set of stages with an explicit transition table.
///
/// Implementors list the successors of each stage once in
/// `valid_transitions`; everything else is derived from that table.
/// Conversations never assign a stage directly: the engine asks
/// `transition_to` first and treats a refusal as a defect in the flow.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if `target` may follow `self`.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Successors of `self`, in no particular order.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns `target` if the move is allowed.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "stage_transition",
                format!("{self:?} cannot be followed by {target:?}"),
            ));
        }
        Ok(target)
    }

    /// A stage without successors.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

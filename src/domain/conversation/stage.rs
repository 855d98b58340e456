//! Traits shared by every conversation domain.

use std::fmt;
use std::hash::Hash;

use crate::domain::artifact::ScopedArtifact;
use crate::domain::foundation::StateMachine;

/// A stage enum driving one conversation domain.
///
/// On top of the transition table from [`StateMachine`], a stage set names
/// its entry and terminal stages and marks which stages are transient:
/// a transient stage runs immediately with the event that led into it
/// instead of waiting for a new one.
pub trait ConversationStage:
    StateMachine + Eq + Hash + fmt::Display + Send + Sync + 'static
{
    /// Stage a fresh session starts in.
    fn initial() -> Self;

    /// The terminal stage. Sessions in this stage accept no further events.
    fn terminated() -> Self;

    /// Returns true for stages that process the current event right away.
    fn is_transient(&self) -> bool;

    /// Every stage of the domain.
    fn all() -> &'static [Self];

    /// Returns true if this is the terminal stage.
    fn is_terminated(&self) -> bool {
        *self == Self::terminated()
    }
}

/// Strongly typed per-domain session data.
pub trait ConversationSession: Default + Send + Sync + 'static {
    /// Detaches the source artifact, if the session holds one.
    fn take_source(&mut self) -> Option<ScopedArtifact>;

    /// Clears every field. Any held artifact is dropped and therefore deleted.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Asserts the structural properties every stage set must have.
#[cfg(test)]
pub(crate) fn assert_stage_set_is_well_formed<S: ConversationStage>() {
    let all = S::all();
    assert!(all.contains(&S::initial()));
    assert!(all.contains(&S::terminated()));
    assert!(S::terminated().is_terminal());
    assert!(!S::initial().is_transient());

    for stage in all {
        for target in stage.valid_transitions() {
            assert!(all.contains(&target), "{stage} leads outside the stage set");
            assert!(stage.can_transition_to(&target));
        }
        for target in all {
            assert_eq!(
                stage.can_transition_to(target),
                stage.valid_transitions().contains(target),
                "{stage} -> {target} disagrees between can_transition_to and valid_transitions"
            );
        }
        if !stage.is_terminated() {
            assert!(
                stage.can_transition_to(&S::terminated()),
                "{stage} must accept cancellation"
            );
        }
    }
}

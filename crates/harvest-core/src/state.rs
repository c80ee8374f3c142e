//! The collection lifecycle and its transition rules.
//!
//! Forward states carry an order (`NotStarted` = 0 through `Completed` = 6)
//! and a run only moves forward through them. `Failed` and `Paused` sit
//! outside the order: any state may drop into them, and from them a run
//! may restart at any non-terminal state.

use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Where a collection run currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionState {
    /// Nothing collected yet.
    #[default]
    NotStarted,
    /// Walking question listing pages.
    CollectingQuestions,
    /// Fetching answers for known questions.
    CollectingAnswers,
    /// Fetching comments attached to questions.
    CollectingQuestionComments,
    /// Fetching comments attached to answers.
    CollectingAnswerComments,
    /// Handing records to storage.
    SavingToDatabase,
    /// Run finished and stored.
    Completed,
    /// A phase failed; the run may be restarted.
    Failed,
    /// Run suspended by an operator; the run may be resumed.
    Paused,
}

impl CollectionState {
    /// Every state, forward states first.
    pub const ALL: [Self; 9] = [
        Self::NotStarted,
        Self::CollectingQuestions,
        Self::CollectingAnswers,
        Self::CollectingQuestionComments,
        Self::CollectingAnswerComments,
        Self::SavingToDatabase,
        Self::Completed,
        Self::Failed,
        Self::Paused,
    ];

    /// Position in the forward sequence; negative for `Failed` and `Paused`.
    pub const fn order(self) -> i8 {
        match self {
            Self::NotStarted => 0,
            Self::CollectingQuestions => 1,
            Self::CollectingAnswers => 2,
            Self::CollectingQuestionComments => 3,
            Self::CollectingAnswerComments => 4,
            Self::SavingToDatabase => 5,
            Self::Completed => 6,
            Self::Failed => -1,
            Self::Paused => -2,
        }
    }

    /// Human-readable label.
    pub const fn description(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::CollectingQuestions => "Collecting Questions",
            Self::CollectingAnswers => "Collecting Answers",
            Self::CollectingQuestionComments => "Collecting Question Comments",
            Self::CollectingAnswerComments => "Collecting Answer Comments",
            Self::SavingToDatabase => "Saving to Database",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Paused => "Paused",
        }
    }

    /// `Completed` and `Failed` end a run.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether moving from `self` to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        if self == target {
            return true;
        }
        if matches!(self, Self::Failed | Self::Paused) {
            return !target.is_terminal();
        }
        matches!(target, Self::Paused | Self::Failed)
            || (target.order() > self.order() && target.order() <= Self::Completed.order())
    }

    /// Validate a move to `target` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidTransition`] when the move is illegal.
    pub fn transition_to(self, target: Self) -> Result<Self, StateError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(StateError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }

    /// The forward state after this one, or `self` when terminal or paused.
    pub fn next_state(self) -> Self {
        if self.is_terminal() || self == Self::Paused {
            return self;
        }
        let next = self.order().saturating_add(1);
        Self::ALL
            .into_iter()
            .find(|s| s.order() == next)
            .unwrap_or(self)
    }

    /// `100 * order / 6` for forward states, 0 otherwise.
    pub fn progress_percentage(self) -> f64 {
        let order = self.order();
        if order < 0 {
            return 0.0;
        }
        f64::from(order) / f64::from(Self::Completed.order()) * 100.0
    }
}

impl core::fmt::Display for CollectionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn paused_resumes_into_answers() {
        assert!(CollectionState::Paused.can_transition_to(CollectionState::CollectingAnswers));
    }

    #[test]
    fn completed_cannot_go_back() {
        assert!(!CollectionState::Completed.can_transition_to(CollectionState::CollectingQuestions));
        assert_eq!(
            CollectionState::Completed.transition_to(CollectionState::CollectingQuestions),
            Err(StateError::InvalidTransition {
                from: CollectionState::Completed,
                to: CollectionState::CollectingQuestions,
            })
        );
    }

    #[test]
    fn legality_rule_holds_for_every_pair() {
        use CollectionState::{Failed, Paused};

        for s in CollectionState::ALL {
            for t in CollectionState::ALL {
                let expected = if s == t {
                    true
                } else if matches!(s, Failed | Paused) {
                    !t.is_terminal()
                } else {
                    matches!(t, Failed | Paused)
                        || (t.order() > s.order() && t.order() <= CollectionState::Completed.order())
                };
                assert_eq!(s.can_transition_to(t), expected, "{s:?} -> {t:?}");
                assert_eq!(s.transition_to(t).is_ok(), expected);
            }
        }
    }

    #[test]
    fn restart_states_cannot_jump_to_terminal() {
        assert!(!CollectionState::Failed.can_transition_to(CollectionState::Completed));
        assert!(!CollectionState::Paused.can_transition_to(CollectionState::Failed));
        assert!(CollectionState::Failed.can_transition_to(CollectionState::CollectingQuestions));
    }

    #[test]
    fn forward_skips_are_allowed() {
        assert!(CollectionState::NotStarted.can_transition_to(CollectionState::SavingToDatabase));
        assert!(!CollectionState::SavingToDatabase.can_transition_to(CollectionState::CollectingAnswers));
    }

    #[test]
    fn next_state_walks_the_forward_order() {
        assert_eq!(
            CollectionState::NotStarted.next_state(),
            CollectionState::CollectingQuestions
        );
        assert_eq!(
            CollectionState::SavingToDatabase.next_state(),
            CollectionState::Completed
        );
        assert_eq!(CollectionState::Completed.next_state(), CollectionState::Completed);
        assert_eq!(CollectionState::Failed.next_state(), CollectionState::Failed);
        assert_eq!(CollectionState::Paused.next_state(), CollectionState::Paused);
    }

    #[test]
    fn progress_percentage_by_order() {
        assert!(CollectionState::NotStarted.progress_percentage().abs() < f64::EPSILON);
        assert!((CollectionState::CollectingAnswerComments.progress_percentage() - 400.0 / 6.0).abs() < 1e-9);
        assert!((CollectionState::Completed.progress_percentage() - 100.0).abs() < f64::EPSILON);
        assert!(CollectionState::Failed.progress_percentage().abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&CollectionState::CollectingQuestionComments).unwrap();
        assert_eq!(json, "\"COLLECTING_QUESTION_COMMENTS\"");
        let back: CollectionState = serde_json::from_str("\"PAUSED\"").unwrap();
        assert_eq!(back, CollectionState::Paused);
    }
}

//! Display updates published by the submitter

use chrono::{DateTime, Utc};
use hearth_core::{DisplayState, DisplayStyle};
use std::fmt;
use uuid::Uuid;

/// Identifies one submission in logs and display updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// The current contents of the display and who wrote them.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    pub state: DisplayState,
    /// `None` until the first submission
    pub submission: Option<SubmissionId>,
    pub at: DateTime<Utc>,
}

impl DisplayUpdate {
    pub fn idle() -> Self {
        Self {
            state: DisplayState::Idle,
            submission: None,
            at: Utc::now(),
        }
    }

    pub fn new(state: DisplayState, submission: SubmissionId) -> Self {
        Self {
            state,
            submission: Some(submission),
            at: Utc::now(),
        }
    }

    pub fn text(&self, style: &DisplayStyle) -> String {
        self.state.render(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_update() {
        let update = DisplayUpdate::idle();
        assert_eq!(update.state, DisplayState::Idle);
        assert!(update.submission.is_none());
        assert_eq!(update.text(&DisplayStyle::default()), "");
    }

    #[test]
    fn test_submission_ids_unique() {
        let a = SubmissionId::new();
        let b = SubmissionId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 32);
    }
}

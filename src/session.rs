use std::time::SystemTime;

/// Where a session currently is in its lifecycle.
///
/// `Idle` never appears inside a running engine; a `Session` is constructed
/// directly in `Playing` and an absent session stands in for the idle screen.
/// The variant exists so snapshot consumers (UI, history) can render the
/// full lifecycle with one enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Playing,
    Success,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Success | SessionStatus::Failed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureReason {
    NoLives,
    TimeUp,
}

/// The mutable record of one attempt at a stage.
///
/// Owned exclusively by `engine::Session`; the UI only ever sees it through
/// `Session::state()` or a `snapshot()` clone, so every guard decision inside
/// the engine reads these fields live, never a copy taken at dispatch time.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub status: SessionStatus,
    pub lives: u32,
    pub score: u32,
    pub correct_count: u32,
    pub selected_candidate: Option<u32>,
    pub active_error: Option<u32>,
    /// Input is suppressed while the post-selection explanation is shown.
    pub show_explanation: bool,
    /// One-way latch: goes true on the terminal transition, never back.
    pub show_result: bool,
    pub failure_reason: Option<FailureReason>,
    pub started_at: Option<SystemTime>,
    /// Guard-rejected events, kept for diagnostics only.
    pub ignored_events: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Idle,
            lives: 0,
            score: 0,
            correct_count: 0,
            selected_candidate: None,
            active_error: None,
            show_explanation: false,
            show_result: false,
            failure_reason: None,
            started_at: None,
            ignored_events: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        let state = SessionState::default();
        assert_eq!(state.status, SessionStatus::Idle);
        assert_eq!(state.lives, 0);
        assert!(!state.show_explanation);
        assert!(!state.show_result);
        assert!(state.failure_reason.is_none());
        assert!(state.started_at.is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!SessionStatus::Idle.is_terminal());
        assert!(!SessionStatus::Playing.is_terminal());
        assert!(SessionStatus::Success.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
    }

    #[test]
    fn status_display_is_snake_case() {
        assert_eq!(SessionStatus::Playing.to_string(), "playing");
        assert_eq!(FailureReason::NoLives.to_string(), "no_lives");
        assert_eq!(FailureReason::TimeUp.to_string(), "time_up");
    }
}

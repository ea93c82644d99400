use crate::config::Config;
use crate::session::FailureReason;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum GameOutcome {
    Success,
    Failed,
}

/// The terminal outcome of a session, computed exactly once when the session
/// ends and immutable thereafter.
#[derive(Clone, Debug, PartialEq)]
pub struct GameResult {
    pub outcome: GameOutcome,
    pub final_score: u32,
    pub time_remaining_secs: f64,
    pub lives_remaining: u32,
    pub failure_reason: Option<FailureReason>,
}

impl GameResult {
    pub fn is_success(&self) -> bool {
        self.outcome == GameOutcome::Success
    }
}

/// Seconds left on the clock, clamped at zero.
pub fn time_remaining(time_limit_secs: f64, elapsed_secs: f64) -> f64 {
    (time_limit_secs - elapsed_secs).max(0.0)
}

/// Final score for a finished session.
///
/// A cleared stage earns the clear bonus plus whole remaining seconds times
/// the multiplier; a failed one keeps only the per-round base component.
pub fn final_score(
    cfg: &Config,
    outcome: GameOutcome,
    correct_count: u32,
    time_remaining_secs: f64,
) -> u32 {
    let base = cfg.base_score * correct_count;
    match outcome {
        GameOutcome::Success => {
            base + cfg.clear_bonus + (time_remaining_secs.floor() as u32) * cfg.time_bonus_multiplier
        }
        GameOutcome::Failed => base,
    }
}

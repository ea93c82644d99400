use std::collections::VecDeque;
use std::time::SystemTime;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::scoring::{self, GameOutcome, GameResult};
use crate::session::{FailureReason, SessionState, SessionStatus};
use crate::stage::{StageDescriptor, StageError};

/// A discrete player/runtime event dispatched into the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The player picked a candidate.
    Select { candidate: u32 },
    /// The player tapped a location that is not a candidate.
    Miss,
    /// The player dismissed the post-selection explanation.
    DismissExplanation,
    /// The caller-owned countdown ran out.
    TimerExpired,
}

/// Side effects requested by a transition, executed by the caller after the
/// state change. Keeping these out of the transition itself keeps the
/// machine testable without a UI or device.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Best-effort wrong-answer cue; failures are ignored.
    Haptic,
    /// Delivered exactly once per session, on the terminal transition.
    ResultReady(GameResult),
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stage(#[from] StageError),
}

/// One attempt at a stage, from start to a single terminal state.
///
/// All mutation happens inside `apply`, on `&mut self`: events are totally
/// ordered by the borrow, and every guard reads the fields as they are at
/// the instant of the decision. Duplicate or late events (double-taps, taps
/// landing during a transition animation) fall outside their guard window
/// and are counted, not acted on.
#[derive(Debug)]
pub struct Session {
    stage: StageDescriptor,
    config: Config,
    state: SessionState,
    /// Error targets still to be found, in stage order. The front is the
    /// active one; it is popped when its explanation is dismissed.
    remaining_targets: VecDeque<u32>,
    time_limit_secs: f64,
    result: Option<GameResult>,
}

impl Session {
    /// Validate config and stage, then open the session in `Playing`.
    /// Both checks fail fast; no session exists on the error path.
    pub fn start(stage: StageDescriptor, config: Config) -> Result<Self, StartError> {
        config.validate()?;
        stage.validate()?;

        let remaining_targets: VecDeque<u32> = stage.error_targets().map(|c| c.id).collect();
        let time_limit_secs = stage
            .time_limit_secs
            .unwrap_or(config.default_time_limit_secs);

        let state = SessionState {
            status: SessionStatus::Playing,
            lives: config.default_lives.min(config.max_lives),
            active_error: remaining_targets.front().copied(),
            started_at: Some(SystemTime::now()),
            ..SessionState::default()
        };

        Ok(Self {
            stage,
            config,
            state,
            remaining_targets,
            time_limit_secs,
            result: None,
        })
    }

    /// The single mutating entry point. Returns the effects the caller
    /// should execute, in order.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Select { candidate } => self.handle_select(candidate),
            SessionEvent::Miss => self.handle_miss(),
            SessionEvent::DismissExplanation => self.handle_dismiss(),
            SessionEvent::TimerExpired => self.handle_timer_expired(),
        }
    }

    pub fn select_candidate(&mut self, candidate: u32) -> Vec<Effect> {
        self.apply(SessionEvent::Select { candidate })
    }

    pub fn register_wrong_selection(&mut self) -> Vec<Effect> {
        self.apply(SessionEvent::Miss)
    }

    pub fn dismiss_explanation(&mut self) -> Vec<Effect> {
        self.apply(SessionEvent::DismissExplanation)
    }

    pub fn on_timer_expired(&mut self) -> Vec<Effect> {
        self.apply(SessionEvent::TimerExpired)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Read-only projection for the rendering layer.
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn stage(&self) -> &StageDescriptor {
        &self.stage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn time_limit_secs(&self) -> f64 {
        self.time_limit_secs
    }

    pub fn has_finished(&self) -> bool {
        self.state.status.is_terminal()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.state
            .started_at
            .and_then(|t| t.elapsed().ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    pub fn seconds_remaining(&self) -> f64 {
        scoring::time_remaining(self.time_limit_secs, self.elapsed_secs())
    }

    /// Targets found so far out of the stage total, for the progress bar.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.stage.error_target_count();
        (total - self.remaining_targets.len(), total)
    }

    /// True for an error target the player has already found and dismissed.
    pub fn is_resolved(&self, id: u32) -> bool {
        self.stage.candidate(id).is_some_and(|c| c.is_error)
            && !self.remaining_targets.contains(&id)
    }

    /// True while player selections are being accepted.
    fn accepting_input(&self) -> bool {
        self.state.status == SessionStatus::Playing
            && !self.state.show_explanation
            && !self.state.show_result
    }

    fn ignore_event(&mut self) -> Vec<Effect> {
        self.state.ignored_events += 1;
        Vec::new()
    }

    fn handle_select(&mut self, candidate: u32) -> Vec<Effect> {
        if !self.accepting_input() {
            return self.ignore_event();
        }
        // An id that names no candidate is a stale/garbled tap, not a miss.
        if self.stage.candidate(candidate).is_none() {
            return self.ignore_event();
        }

        self.state.selected_candidate = Some(candidate);

        if self.state.active_error == Some(candidate) {
            // Round resolved; credit it now, advance on dismissal.
            self.state.correct_count += 1;
            self.state.score = self.config.base_score * self.state.correct_count;
            self.state.show_explanation = true;
            Vec::new()
        } else {
            self.lose_life()
        }
    }

    fn handle_miss(&mut self) -> Vec<Effect> {
        if !self.accepting_input() {
            return self.ignore_event();
        }
        self.lose_life()
    }

    fn handle_dismiss(&mut self) -> Vec<Effect> {
        if self.state.status != SessionStatus::Playing
            || !self.state.show_explanation
            || self.state.show_result
        {
            return self.ignore_event();
        }

        self.state.show_explanation = false;
        self.state.selected_candidate = None;
        self.remaining_targets.pop_front();

        match self.remaining_targets.front() {
            Some(&next) => {
                self.state.active_error = Some(next);
                Vec::new()
            }
            None => {
                self.state.active_error = None;
                self.finish(GameOutcome::Success, None)
            }
        }
    }

    fn handle_timer_expired(&mut self) -> Vec<Effect> {
        // The clock is not suspended by the explanation overlay; only a
        // terminal state makes expiry stale.
        if self.state.status != SessionStatus::Playing || self.state.show_result {
            return self.ignore_event();
        }
        self.finish(GameOutcome::Failed, Some(FailureReason::TimeUp))
    }

    /// Decrement a life and fail the session in the same event when the
    /// last one is gone. Lives and status change together; no caller can
    /// observe `lives == 0` with the session still `Playing`.
    fn lose_life(&mut self) -> Vec<Effect> {
        if self.state.lives == 0 {
            // Already depleted: a duplicate of the event that ended the game.
            return self.ignore_event();
        }

        let new_lives = self.state.lives - 1;
        self.state.lives = new_lives;

        let mut effects = vec![Effect::Haptic];
        if new_lives == 0 {
            effects.extend(self.finish(GameOutcome::Failed, Some(FailureReason::NoLives)));
        }
        effects
    }

    /// Terminal transition behind the one-way latch: the first call computes
    /// and publishes the result, every later call is inert.
    fn finish(&mut self, outcome: GameOutcome, reason: Option<FailureReason>) -> Vec<Effect> {
        if self.state.show_result {
            return Vec::new();
        }

        self.state.status = match outcome {
            GameOutcome::Success => SessionStatus::Success,
            GameOutcome::Failed => SessionStatus::Failed,
        };
        self.state.failure_reason = reason;

        let time_remaining_secs = self.seconds_remaining();
        let result = GameResult {
            outcome,
            final_score: scoring::final_score(
                &self.config,
                outcome,
                self.state.correct_count,
                time_remaining_secs,
            ),
            time_remaining_secs,
            lives_remaining: self.state.lives,
            failure_reason: reason,
        };

        self.state.score = result.final_score;
        self.state.show_result = true;
        self.result = Some(result.clone());
        vec![Effect::ResultReady(result)]
    }
}

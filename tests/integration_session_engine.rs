use assert_matches::assert_matches;

use snag::config::Config;
use snag::engine::{Effect, Session, StartError};
use snag::scoring::GameOutcome;
use snag::session::{FailureReason, SessionStatus};
use snag::stage::{Candidate, StageDescriptor, StageLibrary, StageMode};

/// Integration tests for whole play sessions.
/// These drive the engine end to end and check the state-machine contracts
/// the UI depends on: monotonic lives, single result publication, and
/// no observable intermediate states.

fn candidate(id: u32, is_error: bool) -> Candidate {
    Candidate {
        id,
        text: format!("line {id}"),
        is_error,
        explanation: format!("explanation {id}"),
    }
}

fn stage(error_ids: &[u32], total: u32) -> StageDescriptor {
    StageDescriptor {
        stage_id: "it-stage".into(),
        level: 1,
        mode: StageMode::Article,
        time_limit_secs: Some(120.0),
        candidates: (1..=total)
            .map(|id| candidate(id, error_ids.contains(&id)))
            .collect(),
    }
}

fn config(lives: u32) -> Config {
    Config {
        default_lives: lives,
        max_lives: 5,
        base_score: 10,
        clear_bonus: 50,
        time_bonus_multiplier: 0,
        default_time_limit_secs: 60.0,
    }
}

fn count_results(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::ResultReady(_)))
        .count()
}

#[test]
fn full_clear_publishes_one_result_with_expected_score() {
    let mut session = Session::start(stage(&[2, 4], 5), config(3)).unwrap();
    let mut results = 0;

    for id in [2, 4] {
        results += count_results(&session.select_candidate(id));
        results += count_results(&session.dismiss_explanation());
    }

    assert_eq!(results, 1);
    assert_eq!(session.state().status, SessionStatus::Success);
    let result = session.result().unwrap();
    assert_eq!(result.outcome, GameOutcome::Success);
    // 10 * 2 + 50, time bonus zeroed out
    assert_eq!(result.final_score, 70);
    assert_eq!(result.lives_remaining, 3);
}

#[test]
fn failure_after_some_progress_keeps_only_base_score() {
    let mut session = Session::start(stage(&[1, 2, 3, 4], 6), config(2)).unwrap();

    // Three rounds cleared...
    for id in [1, 2, 3] {
        session.select_candidate(id);
        session.dismiss_explanation();
    }
    // ...then both lives burned on misses.
    session.register_wrong_selection();
    let effects = session.register_wrong_selection();

    assert_matches!(effects.as_slice(), [Effect::Haptic, Effect::ResultReady(result)] => {
        assert_eq!(result.outcome, GameOutcome::Failed);
        // 10 * 3, no clear or time bonus
        assert_eq!(result.final_score, 30);
        assert_eq!(result.failure_reason, Some(FailureReason::NoLives));
    });
}

#[test]
fn lives_are_monotonically_non_increasing() {
    let mut session = Session::start(stage(&[2], 4), config(3)).unwrap();
    let mut observed = vec![session.state().lives];

    // An adversarial mix of misses, wrong picks, stale ids and dismissals
    let events: [&dyn Fn(&mut Session) -> Vec<Effect>; 8] = [
        &|s| s.register_wrong_selection(),
        &|s| s.select_candidate(1),
        &|s| s.dismiss_explanation(),
        &|s| s.select_candidate(99),
        &|s| s.register_wrong_selection(),
        &|s| s.select_candidate(3),
        &|s| s.register_wrong_selection(),
        &|s| s.register_wrong_selection(),
    ];
    for event in events {
        event(&mut session);
        observed.push(session.state().lives);
    }

    for pair in observed.windows(2) {
        assert!(pair[1] <= pair[0], "lives increased: {observed:?}");
    }
    assert_eq!(*observed.last().unwrap(), 0);
    assert_eq!(session.state().status, SessionStatus::Failed);
}

#[test]
fn one_life_wrong_selection_is_atomic() {
    let mut session = Session::start(stage(&[2], 3), config(1)).unwrap();

    let effects = session.select_candidate(3);

    // One event: life gone, session failed, reason set, result published.
    assert_eq!(count_results(&effects), 1);
    let state = session.state();
    assert_eq!(
        (state.lives, state.status, state.failure_reason),
        (0, SessionStatus::Failed, Some(FailureReason::NoLives))
    );
}

#[test]
fn duplicate_terminal_events_never_republish() {
    let mut session = Session::start(stage(&[2], 3), config(1)).unwrap();
    session.select_candidate(1); // last life, terminal
    let first_result = session.result().cloned().unwrap();

    let mut extra = Vec::new();
    extra.extend(session.select_candidate(1));
    extra.extend(session.register_wrong_selection());
    extra.extend(session.dismiss_explanation());
    extra.extend(session.on_timer_expired());

    assert!(extra.is_empty());
    assert_eq!(session.result().cloned().unwrap(), first_result);
}

#[test]
fn explanation_window_blocks_all_player_input() {
    let mut session = Session::start(stage(&[2, 3], 4), config(3)).unwrap();
    session.select_candidate(2);
    assert!(session.state().show_explanation);

    let lives_before = session.state().lives;
    session.select_candidate(3);
    session.select_candidate(1);
    session.register_wrong_selection();

    assert_eq!(session.state().lives, lives_before);
    assert_eq!(session.state().correct_count, 1);

    // Dismissal re-opens the window; the next target becomes active.
    session.dismiss_explanation();
    assert_eq!(session.state().active_error, Some(3));
    assert!(!session.state().show_explanation);
}

#[test]
fn timer_expiry_beats_remaining_lives() {
    let mut session = Session::start(stage(&[2], 3), config(3)).unwrap();
    let effects = session.on_timer_expired();

    assert_eq!(count_results(&effects), 1);
    let result = session.result().unwrap();
    assert_eq!(result.failure_reason, Some(FailureReason::TimeUp));
    assert_eq!(result.lives_remaining, 3);
}

#[test]
fn invalid_config_fails_fast() {
    let bad = Config {
        default_lives: 0,
        ..config(3)
    };
    assert_matches!(
        Session::start(stage(&[2], 3), bad),
        Err(StartError::Config(_))
    );
}

#[test]
fn empty_stage_fails_fast() {
    let empty = StageDescriptor {
        stage_id: "empty".into(),
        level: 1,
        mode: StageMode::Text,
        time_limit_secs: None,
        candidates: vec![],
    };
    assert_matches!(
        Session::start(empty, config(3)),
        Err(StartError::Stage(_))
    );
}

#[test]
fn every_builtin_stage_is_clearable() {
    let library = StageLibrary::builtin();
    assert!(!library.is_empty());

    for descriptor in library.iter() {
        let mut session = Session::start(descriptor.clone(), config(3)).unwrap();
        let targets: Vec<u32> = descriptor.error_targets().map(|c| c.id).collect();

        for id in targets {
            assert_eq!(session.state().active_error, Some(id));
            session.select_candidate(id);
            session.dismiss_explanation();
        }

        assert_eq!(
            session.state().status,
            SessionStatus::Success,
            "stage {} did not clear",
            descriptor.stage_id
        );
    }
}

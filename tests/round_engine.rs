use assert_matches::assert_matches;
use rand::rngs::StdRng;
use rand::SeedableRng;

use reflex::clock::ManualClock;
use reflex::config::{Config, ConfigError};
use reflex::engine::EngineError;
use reflex::rules::{try_derive_answer_key, RulePair};
use reflex::scoring::ResponseLabel;
use reflex::stimulus::StimulusTable;
use reflex::{Command, GameVariant, Phase, RoundEngine};

fn engine_with(
    variant: GameVariant,
    level: u8,
    seed: u64,
) -> (RoundEngine<ManualClock, StdRng>, ManualClock) {
    let clock = ManualClock::new();
    let config = Config {
        variant,
        level,
        ..Config::default()
    };
    let engine =
        RoundEngine::with_embedded_stimuli(&config, clock.clone(), StdRng::seed_from_u64(seed))
            .unwrap();
    (engine, clock)
}

fn stroop() -> (RoundEngine<ManualClock, StdRng>, ManualClock) {
    engine_with(GameVariant::WordColor, 1, 7)
}

/// Lets the exposure delay run out so the answer buttons appear.
fn reveal(engine: &mut RoundEngine<ManualClock, StdRng>, clock: &ManualClock) {
    clock.advance_ms(engine.exposure_ms());
    engine.poll();
    assert_eq!(engine.phase(), Phase::Revealed);
}

#[test]
fn idle_engine_shows_canonical_preview() {
    let (engine, _clock) = stroop();
    let snapshot = engine.snapshot();

    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(!snapshot.running);
    assert!(!snapshot.game_over);
    assert_eq!(snapshot.time_remaining, 120);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.last_reaction_ms, None);
    assert_eq!(snapshot.last_response, ResponseLabel::Ready);
    assert_eq!(snapshot.round.round_id, 0);
    assert_eq!((snapshot.round.rule1, snapshot.round.rule2), (0, 0));
    assert_eq!(snapshot.round.stimulus.as_str(), "word_red_ink_red");
    assert!(!snapshot.round.revealed);
}

#[test]
fn rock_paper_scissors_preview_uses_picture_rule() {
    let (engine, _clock) = engine_with(GameVariant::RockPaperScissors, 1, 1);
    assert_eq!(
        engine.round().rules(),
        RulePair::canonical(GameVariant::RockPaperScissors)
    );
    assert_eq!(engine.round().stimulus().as_str(), "hand_rock");
}

#[test]
fn start_arms_first_round() {
    let (mut engine, _clock) = stroop();
    engine.start_session();
    let snapshot = engine.snapshot();

    assert_eq!(snapshot.phase, Phase::Armed);
    assert!(snapshot.running);
    assert_eq!(snapshot.last_response, ResponseLabel::Go);
    assert_eq!(snapshot.round.round_id, 1);
    assert!(!snapshot.round.revealed);
    assert_eq!(snapshot.round.active_cell, None);

    let round = engine.round();
    assert_eq!(
        try_derive_answer_key(
            GameVariant::WordColor,
            round.rules().rule1,
            round.rules().rule2,
            round.random_index()
        ),
        Ok(round.correct_key())
    );
}

#[test]
fn answer_before_reveal_is_ignored() {
    let (mut engine, clock) = stroop();
    engine.start_session();
    clock.advance_ms(1_500);
    engine.poll();
    let before = engine.snapshot();

    let key = engine.round().correct_key();
    assert_eq!(engine.submit_answer(key), None);
    assert_eq!(engine.snapshot(), before);
}

#[test]
fn exposure_delay_reveals_controls() {
    let (mut engine, clock) = stroop();
    engine.start_session();

    clock.advance_ms(4_999);
    engine.poll();
    assert_eq!(engine.phase(), Phase::Armed);

    clock.advance_ms(1);
    assert!(engine.poll());
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Revealed);
    assert!(snapshot.round.revealed);
    assert_eq!(snapshot.time_remaining, 115);
}

#[test]
fn higher_levels_reveal_sooner() {
    let (mut engine, clock) = engine_with(GameVariant::WordColor, 7, 3);
    assert_eq!(engine.exposure_ms(), 500);
    engine.start_session();
    clock.advance_ms(500);
    engine.poll();
    assert_eq!(engine.phase(), Phase::Revealed);
}

#[test]
fn correct_answer_scores_and_opens_next_round() {
    let (mut engine, clock) = stroop();
    engine.start_session();
    reveal(&mut engine, &clock);

    clock.advance_ms(350);
    let key = engine.round().correct_key();
    assert_eq!(engine.submit_answer(key), Some(ResponseLabel::Correct));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.score, 10);
    assert_eq!(snapshot.last_response, ResponseLabel::Correct);
    // exposure time is not counted as reaction time
    assert_eq!(snapshot.last_reaction_ms, Some(350));
    assert_eq!(snapshot.round.round_id, 2);
    assert_eq!(snapshot.phase, Phase::Armed);
    assert!(!snapshot.round.revealed);
}

#[test]
fn wrong_answer_keeps_score() {
    let (mut engine, clock) = stroop();
    engine.start_session();
    reveal(&mut engine, &clock);

    let wrong = (engine.round().correct_key() + 1) % 4;
    assert_eq!(engine.submit_answer(wrong), Some(ResponseLabel::Wrong));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.last_response, ResponseLabel::Wrong);
    assert_eq!(snapshot.last_reaction_ms, None);
    assert_eq!(snapshot.round.round_id, 2);
}

#[test]
fn double_submission_counts_once() {
    let (mut engine, clock) = stroop();
    engine.start_session();
    reveal(&mut engine, &clock);

    let key = engine.round().correct_key();
    assert_eq!(engine.submit_answer(key), Some(ResponseLabel::Correct));
    assert_eq!(engine.submit_answer(key), None);
    assert_eq!(engine.snapshot().score, 10);
}

#[test]
fn session_runs_out_after_two_minutes() {
    let (mut engine, clock) = stroop();
    engine.start_session();

    let mut previous = engine.snapshot().time_remaining;
    for _ in 0..119 {
        clock.advance_ms(1_000);
        engine.poll();
        let remaining = engine.snapshot().time_remaining;
        assert_eq!(remaining, previous - 1);
        previous = remaining;
    }
    assert!(!engine.is_game_over());

    clock.advance_ms(1_000);
    engine.poll();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.time_remaining, 0);
    assert!(!snapshot.running);
    assert!(snapshot.game_over);
    assert_eq!(snapshot.phase, Phase::GameOver);

    clock.advance_ms(10_000);
    engine.poll();
    assert_eq!(engine.snapshot().time_remaining, 0);
    assert!(engine.is_game_over());
}

#[test]
fn answers_after_time_is_up_are_ignored() {
    let (mut engine, clock) = stroop();
    engine.start_session();
    clock.advance_ms(119_500);
    engine.poll();
    assert_eq!(engine.phase(), Phase::Revealed);

    // the poll that would expire the session has not run yet
    clock.advance_ms(600);
    let key = engine.round().correct_key();
    assert_eq!(engine.submit_answer(key), None);
    assert!(engine.is_game_over());
    assert_eq!(engine.snapshot().score, 0);
}

#[test]
fn game_over_is_terminal_until_restart() {
    let (mut engine, clock) = stroop();
    engine.start_session();
    clock.advance_ms(120_000);
    engine.poll();
    assert!(engine.is_game_over());

    assert!(!engine.start_new_round());
    assert!(engine.is_game_over());

    engine.start_session();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Armed);
    assert_eq!(snapshot.round.round_id, 1);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.time_remaining, 120);
}

#[test]
fn reset_restores_initial_state_and_cancels_timers() {
    let (mut engine, clock) = stroop();
    engine.start_session();
    reveal(&mut engine, &clock);
    let key = engine.round().correct_key();
    engine.submit_answer(key);
    assert_eq!(engine.snapshot().score, 10);

    engine.reset_session();
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.round.round_id, 0);
    assert_eq!(snapshot.time_remaining, 120);
    assert_eq!(snapshot.last_response, ResponseLabel::Ready);
    assert_eq!(snapshot.last_reaction_ms, None);
    assert!(!snapshot.running);

    // the reveal scheduled for round 2 must not fire into the idle screen
    clock.advance_ms(30_000);
    assert!(!engine.poll());
    assert_eq!(engine.snapshot(), snapshot);
}

#[test]
fn superseded_round_timer_is_dropped() {
    let (mut engine, clock) = stroop();
    engine.start_session();

    clock.advance_ms(2_000);
    assert!(engine.start_new_round());
    assert_eq!(engine.round().round_id(), 2);

    // round 1 would have been revealed at 5000
    clock.advance_ms(3_000);
    engine.poll();
    assert_eq!(engine.phase(), Phase::Armed);

    // round 2 reveals at 7000
    clock.advance_ms(2_000);
    engine.poll();
    assert_eq!(engine.phase(), Phase::Revealed);
}

#[test]
fn round_ids_and_score_only_grow() {
    let (mut engine, clock) = engine_with(GameVariant::WordColorPicture, 4, 11);
    engine.start_session();

    let mut last_id = engine.snapshot().round.round_id;
    let mut last_score = 0;
    let mut answered = 0u32;

    while !engine.is_game_over() {
        clock.advance_ms(engine.exposure_ms());
        engine.poll();
        if engine.phase() != Phase::Revealed {
            continue;
        }

        clock.advance_ms(200);
        let choice = if answered % 3 == 0 {
            (engine.round().correct_key() + 1) % 4
        } else {
            engine.round().correct_key()
        };
        if engine.submit_answer(choice).is_some() {
            answered += 1;
        }

        let snapshot = engine.snapshot();
        assert!(snapshot.score >= last_score);
        if !snapshot.game_over {
            assert_eq!(snapshot.round.round_id, last_id + 1);
            last_id = snapshot.round.round_id;
        }
        last_score = snapshot.score;
    }

    let summary = engine.summary();
    assert_eq!(summary.correct + summary.wrong, answered);
    assert_eq!(summary.score, summary.correct * 10);
    assert_eq!(summary.mean_reaction_ms, Some(200.0));
}

#[test]
fn rock_paper_scissors_rounds_use_picture_rule() {
    let (mut engine, clock) = engine_with(GameVariant::RockPaperScissors, 2, 5);
    engine.start_session();

    for _ in 0..30 {
        assert_eq!(engine.round().rules().rule1, 1);
        assert!(engine.round().rules().rule2 <= 2);
        assert!(engine.round().correct_key() < 3);
        reveal(&mut engine, &clock);
        let key = engine.round().correct_key();
        engine.submit_answer(key);
    }
    assert_eq!(engine.snapshot().score, 300);
}

#[test]
fn same_seed_replays_same_rounds() {
    let rounds = |seed| {
        let (mut engine, clock) = engine_with(GameVariant::WordColorPicture, 7, seed);
        engine.start_session();
        let mut seen = Vec::new();
        for _ in 0..20 {
            let round = engine.round();
            seen.push((round.rules(), round.random_index(), round.stimulus().clone()));
            clock.advance_ms(engine.exposure_ms());
            engine.poll();
            let key = engine.round().correct_key();
            engine.submit_answer(key);
        }
        seen
    };

    assert_eq!(rounds(99), rounds(99));
}

#[test]
fn subscribers_see_every_transition() {
    let (mut engine, clock) = stroop();
    let rx = engine.subscribe();

    engine.start_session();
    let started = rx.try_recv().unwrap();
    assert_eq!(started.phase, Phase::Armed);

    clock.advance_ms(5_000);
    engine.poll();
    let revealed = rx.try_iter().last().unwrap();
    assert!(revealed.round.revealed);

    engine.reset_session();
    assert_eq!(rx.try_recv().unwrap().phase, Phase::Idle);
}

#[test]
fn commands_dispatch() {
    let (mut engine, clock) = stroop();
    assert!(!engine.apply(Command::Answer(0)));
    assert!(engine.apply(Command::Start));
    assert!(!engine.apply(Command::Tap(0)));

    reveal(&mut engine, &clock);
    let key = engine.round().correct_key();
    assert!(engine.apply(Command::Answer(key)));
    assert!(engine.apply(Command::Reset));
    assert_eq!(engine.phase(), Phase::Idle);
}

#[test]
fn snapshot_serializes_for_presentation_layer() {
    let (mut engine, _clock) = stroop();
    engine.start_session();
    let json = serde_json::to_value(engine.snapshot()).unwrap();

    assert_eq!(json["time_remaining"], 120);
    assert_eq!(json["phase"], "Armed");
    assert_eq!(json["last_response"], "Go");
    assert_eq!(json["round"]["round_id"], 1);
    assert!(json["round"].get("correct_key").is_none());
}

#[test]
fn construction_errors() {
    let bad_level = Config {
        level: 0,
        ..Config::default()
    };
    let result = RoundEngine::with_embedded_stimuli(
        &bad_level,
        ManualClock::new(),
        StdRng::seed_from_u64(0),
    );
    assert_matches!(result.err(), Some(EngineError::Config(ConfigError::LevelOutOfRange(0))));

    let table = StimulusTable::embedded(GameVariant::WhackAMole).unwrap();
    let result = RoundEngine::new(
        &Config::default(),
        table,
        ManualClock::new(),
        StdRng::seed_from_u64(0),
    );
    assert_matches!(
        result.err(),
        Some(EngineError::TableMismatch {
            table: GameVariant::WhackAMole,
            engine: GameVariant::WordColor
        })
    );
}

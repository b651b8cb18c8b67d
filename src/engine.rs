use std::sync::mpsc::{self, Receiver, Sender};

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::clock::Clock;
use crate::config::{Config, ConfigError};
use crate::rules::{derive_answer_key, select_rules, RulePair};
use crate::schedule::{Scheduled, Scheduler, TimerAction};
use crate::scoring::{ResponseLabel, ScoreSummary, ScoringTracker};
use crate::session::{SessionTimer, TimerStatus};
use crate::stimulus::{StimulusError, StimulusId, StimulusTable};
use crate::variant::GameVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum Phase {
    /// No session; the round shown is the canonical preview.
    Idle,
    /// Stimulus shown, answers hidden (or mole up).
    Armed,
    /// Response controls shown.
    Revealed,
    /// Answer recorded; mole variant waits out the feedback phases here.
    Scored,
    GameOver,
}

/// Commands the presentation layer may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Answer(u8),
    Tap(u8),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stimulus(#[from] StimulusError),

    #[error("stimulus table is for {table}, engine plays {engine}")]
    TableMismatch {
        table: GameVariant,
        engine: GameVariant,
    },
}

/// One stimulus-response trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    round_id: u32,
    rules: RulePair,
    random_index: u16,
    stimulus: StimulusId,
    correct_key: u8,
    revealed: bool,
    active_cell: Option<u8>,
    feedback: bool,
    started_at_ms: u64,
}

impl Round {
    fn preview(variant: GameVariant, stimuli: &StimulusTable) -> Self {
        let rules = RulePair::canonical(variant);
        Self {
            round_id: 0,
            rules,
            random_index: 1,
            stimulus: stimuli.resolve(1),
            correct_key: derive_answer_key(variant, rules.rule1, rules.rule2, 1),
            revealed: false,
            active_cell: None,
            feedback: false,
            started_at_ms: 0,
        }
    }

    pub fn round_id(&self) -> u32 {
        self.round_id
    }

    pub fn rules(&self) -> RulePair {
        self.rules
    }

    pub fn random_index(&self) -> u16 {
        self.random_index
    }

    pub fn stimulus(&self) -> &StimulusId {
        &self.stimulus
    }

    pub fn correct_key(&self) -> u8 {
        self.correct_key
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn active_cell(&self) -> Option<u8> {
        self.active_cell
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundView {
    pub round_id: u32,
    pub rule1: u8,
    pub rule2: u8,
    pub stimulus: StimulusId,
    pub revealed: bool,
    pub active_cell: Option<u8>,
    /// First mole feedback phase (result still on screen).
    pub feedback: bool,
}

/// Immutable view handed to the presentation layer after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub variant: GameVariant,
    pub time_remaining: u32,
    pub running: bool,
    pub score: u32,
    pub last_reaction_ms: Option<u64>,
    pub last_response: ResponseLabel,
    pub phase: Phase,
    pub round: RoundView,
    pub game_over: bool,
}

/// Round/session state machine for one game screen.
///
/// All time comes from `C` and all randomness from `R`, so a `ManualClock`
/// and a seeded rng replay a session exactly.
pub struct RoundEngine<C: Clock, R: Rng> {
    variant: GameVariant,
    level: u8,
    exposure_ms: u64,
    feedback_ms: u64,
    stimuli: StimulusTable,
    clock: C,
    rng: R,
    timer: SessionTimer,
    scoring: ScoringTracker,
    scheduler: Scheduler,
    generation: u64,
    phase: Phase,
    round: Round,
    subscribers: Vec<Sender<Snapshot>>,
}

impl<C: Clock, R: Rng> RoundEngine<C, R> {
    pub fn new(
        config: &Config,
        stimuli: StimulusTable,
        clock: C,
        rng: R,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        if stimuli.variant() != config.variant {
            return Err(EngineError::TableMismatch {
                table: stimuli.variant(),
                engine: config.variant,
            });
        }

        let variant = config.variant;
        let round = Round::preview(variant, &stimuli);

        Ok(Self {
            variant,
            level: config.level,
            exposure_ms: config.exposure_delay(variant, config.level).as_millis() as u64,
            feedback_ms: config.feedback_delay_ms,
            stimuli,
            clock,
            rng,
            timer: SessionTimer::new(config.session_secs),
            scoring: ScoringTracker::new(config.points_per_correct),
            scheduler: Scheduler::new(),
            generation: 0,
            phase: Phase::Idle,
            round,
            subscribers: Vec::new(),
        })
    }

    /// Builds an engine using the stimulus table shipped with the crate.
    pub fn with_embedded_stimuli(config: &Config, clock: C, rng: R) -> Result<Self, EngineError> {
        let stimuli = StimulusTable::embedded(config.variant)?;
        Self::new(config, stimuli, clock, rng)
    }

    pub fn start_session(&mut self) {
        let now = self.clock.now_ms();
        self.generation += 1;
        self.timer.start(now);
        self.scoring.mark_go();
        self.round.round_id = 0;
        info!(
            variant = %self.variant,
            level = self.level,
            secs = self.timer.remaining(),
            "session started"
        );
        self.open_round(now);
        self.publish();
    }

    pub fn reset_session(&mut self) {
        self.generation += 1;
        self.timer.reset();
        self.scoring.reset();
        self.round = Round::preview(self.variant, &self.stimuli);
        self.phase = Phase::Idle;
        debug!(variant = %self.variant, "session reset");
        self.publish();
    }

    /// Opens the next round. Ignored unless a session is running.
    pub fn start_new_round(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.advance_to(now);
        if !self.timer.is_running() {
            debug!(phase = %self.phase, "new round requested without a running session");
            return false;
        }
        self.open_round(now);
        self.publish();
        true
    }

    /// Scores `choice` against the open round. Only accepted while the
    /// response controls are shown; returns `None` when ignored.
    pub fn submit_answer(&mut self, choice: u8) -> Option<ResponseLabel> {
        let now = self.clock.now_ms();
        self.advance_to(now);

        if self.phase != Phase::Revealed {
            debug!(phase = %self.phase, choice, "answer ignored");
            return None;
        }

        // The exposure window is not part of the reaction.
        let reaction_ms = now
            .saturating_sub(self.round.started_at_ms)
            .saturating_sub(self.exposure_ms);

        let label = if choice == self.round.correct_key {
            self.scoring.record_correct(reaction_ms);
            ResponseLabel::Correct
        } else {
            self.scoring.record_wrong();
            ResponseLabel::Wrong
        };
        self.phase = Phase::Scored;
        debug!(
            round = self.round.round_id,
            choice,
            expected = self.round.correct_key,
            reaction_ms,
            %label,
            "answer scored"
        );

        if self.timer.is_running() && self.timer.remaining() > 0 {
            self.open_round(now);
        } else {
            self.finish_session();
        }
        self.publish();
        Some(label)
    }

    /// Whack-a-mole hit test. Scores only a tap on the active cell while the
    /// mole is up; anything else is ignored.
    pub fn on_cell_tap(&mut self, idx: u8) -> Option<ResponseLabel> {
        let now = self.clock.now_ms();
        self.advance_to(now);

        if !self.variant.is_mole() {
            debug!(variant = %self.variant, idx, "cell tap outside whack-a-mole");
            return None;
        }
        if self.phase != Phase::Armed || self.round.active_cell != Some(idx) {
            debug!(phase = %self.phase, idx, active = ?self.round.active_cell, "tap ignored");
            return None;
        }

        let reaction_ms = now.saturating_sub(self.round.started_at_ms);
        self.scoring.record_correct(reaction_ms);
        debug!(round = self.round.round_id, idx, reaction_ms, "mole hit");
        self.enter_feedback(now);
        self.publish();
        Some(ResponseLabel::Correct)
    }

    /// Dispatches a command; returns whether it changed anything.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Start => {
                self.start_session();
                true
            }
            Command::Reset => {
                self.reset_session();
                true
            }
            Command::Answer(choice) => self.submit_answer(choice).is_some(),
            Command::Tap(idx) => self.on_cell_tap(idx).is_some(),
        }
    }

    /// Fires everything due by now. Returns whether state changed.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now_ms();
        let changed = self.advance_to(now);
        if changed {
            self.publish();
        }
        changed
    }

    /// Receives a snapshot after every transition until dropped.
    pub fn subscribe(&mut self) -> Receiver<Snapshot> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            variant: self.variant,
            time_remaining: self.timer.remaining(),
            running: self.timer.is_running(),
            score: self.scoring.score(),
            last_reaction_ms: self.scoring.last_reaction_ms(),
            last_response: self.scoring.last_response(),
            phase: self.phase,
            round: RoundView {
                round_id: self.round.round_id,
                rule1: self.round.rules.rule1,
                rule2: self.round.rules.rule2,
                stimulus: self.round.stimulus.clone(),
                revealed: self.round.revealed,
                active_cell: self.round.active_cell,
                feedback: self.round.feedback,
            },
            game_over: self.phase == Phase::GameOver,
        }
    }

    pub fn summary(&self) -> ScoreSummary {
        self.scoring.summary()
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn variant(&self) -> GameVariant {
        self.variant
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn exposure_ms(&self) -> u64 {
        self.exposure_ms
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    fn open_round(&mut self, now: u64) {
        self.generation += 1;

        let running = self.timer.is_running();
        let (rules, random_index) = select_rules(self.variant, running, &mut self.rng);
        let correct_key = derive_answer_key(self.variant, rules.rule1, rules.rule2, random_index);
        let stimulus = self.stimuli.resolve(random_index);
        let is_mole = self.variant.is_mole();

        self.round = Round {
            round_id: self.round.round_id + 1,
            rules,
            random_index,
            stimulus,
            correct_key,
            revealed: false,
            active_cell: is_mole.then_some(correct_key),
            feedback: false,
            started_at_ms: now,
        };
        self.phase = Phase::Armed;

        let action = if is_mole {
            TimerAction::MoleTimeout
        } else {
            TimerAction::Reveal
        };
        let due = now.saturating_add(self.exposure_ms);
        self.scheduler.schedule(due, self.generation, action);

        debug!(
            round = self.round.round_id,
            rule1 = rules.rule1,
            rule2 = rules.rule2,
            random_index,
            stimulus = %self.round.stimulus,
            "round armed"
        );
    }

    /// Mole result is shown for one feedback delay, then the board stays
    /// empty for another before the next round.
    fn enter_feedback(&mut self, at: u64) {
        self.generation += 1;
        self.phase = Phase::Scored;
        self.round.active_cell = None;
        self.round.feedback = true;
        let clear_at = at.saturating_add(self.feedback_ms);
        let next_at = clear_at.saturating_add(self.feedback_ms);
        self.scheduler.schedule(clear_at, self.generation, TimerAction::FeedbackClear);
        self.scheduler.schedule(next_at, self.generation, TimerAction::NextRound);
    }

    fn finish_session(&mut self) {
        self.generation += 1;
        self.timer.stop();
        self.phase = Phase::GameOver;
        self.round.revealed = false;
        self.round.active_cell = None;
        self.round.feedback = false;
        let summary = self.scoring.summary();
        info!(
            variant = %self.variant,
            score = summary.score,
            correct = summary.correct,
            wrong = summary.wrong,
            missed = summary.missed,
            "session over"
        );
    }

    /// Replays session seconds and round timers due by `now` in deadline
    /// order. On a tie the session second goes first.
    fn advance_to(&mut self, now: u64) -> bool {
        let mut changed = false;

        loop {
            let tick_due = self.timer.next_tick_due().filter(|&due| due <= now);
            let timer_due = self.scheduler.next_due().filter(|&due| due <= now);

            match (tick_due, timer_due) {
                (None, None) => break,
                (Some(tick), timer) if timer.map_or(true, |due| tick <= due) => {
                    changed = true;
                    if self.timer.tick() == TimerStatus::Expired {
                        self.finish_session();
                    }
                }
                _ => match self.scheduler.pop_due(now) {
                    Some(entry) => changed |= self.fire(entry),
                    None => break,
                },
            }
        }

        changed
    }

    fn fire(&mut self, entry: Scheduled) -> bool {
        if entry.generation != self.generation {
            trace!(
                action = ?entry.action,
                scheduled = entry.generation,
                current = self.generation,
                "stale timer dropped"
            );
            return false;
        }

        match entry.action {
            TimerAction::Reveal if self.phase == Phase::Armed => {
                self.round.revealed = true;
                self.phase = Phase::Revealed;
                true
            }
            TimerAction::MoleTimeout if self.phase == Phase::Armed => {
                self.scoring.record_miss();
                debug!(round = self.round.round_id, "mole missed");
                self.enter_feedback(entry.due_ms);
                true
            }
            TimerAction::FeedbackClear => {
                self.round.feedback = false;
                true
            }
            TimerAction::NextRound if self.timer.is_running() => {
                self.open_round(entry.due_ms);
                true
            }
            _ => false,
        }
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

use serde::{Deserialize, Serialize};

use crate::util::{mean, std_dev};

pub const POINTS_PER_CORRECT: u32 = 10;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
pub enum ResponseLabel {
    #[default]
    Ready,
    Go,
    Correct,
    Wrong,
    Miss,
}

/// End-of-session figures for the results screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub score: u32,
    pub correct: u32,
    pub wrong: u32,
    pub missed: u32,
    pub accuracy: f64,
    pub mean_reaction_ms: Option<f64>,
    pub reaction_std_dev_ms: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ScoringTracker {
    points_per_correct: u32,
    score: u32,
    last_reaction_ms: Option<u64>,
    last_response: ResponseLabel,
    correct: u32,
    wrong: u32,
    missed: u32,
    reaction_times: Vec<u64>,
}

impl ScoringTracker {
    pub fn new(points_per_correct: u32) -> Self {
        Self {
            points_per_correct,
            score: 0,
            last_reaction_ms: None,
            last_response: ResponseLabel::Ready,
            correct: 0,
            wrong: 0,
            missed: 0,
            reaction_times: Vec::new(),
        }
    }

    pub fn record_correct(&mut self, reaction_ms: u64) {
        self.score = self.score.saturating_add(self.points_per_correct);
        self.last_reaction_ms = Some(reaction_ms);
        self.last_response = ResponseLabel::Correct;
        self.correct += 1;
        self.reaction_times.push(reaction_ms);
    }

    pub fn record_wrong(&mut self) {
        self.last_response = ResponseLabel::Wrong;
        self.wrong += 1;
    }

    pub fn record_miss(&mut self) {
        self.last_response = ResponseLabel::Miss;
        self.last_reaction_ms = None;
        self.missed += 1;
    }

    /// Clears everything and shows `Go` for a fresh session.
    pub fn mark_go(&mut self) {
        self.reset();
        self.last_response = ResponseLabel::Go;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.points_per_correct);
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn last_reaction_ms(&self) -> Option<u64> {
        self.last_reaction_ms
    }

    pub fn last_response(&self) -> ResponseLabel {
        self.last_response
    }

    pub fn attempts(&self) -> u32 {
        self.correct + self.wrong + self.missed
    }

    pub fn summary(&self) -> ScoreSummary {
        let samples: Vec<f64> = self.reaction_times.iter().map(|&ms| ms as f64).collect();
        let attempts = self.attempts();
        let accuracy = if attempts > 0 {
            ((self.correct as f64 / attempts as f64) * 100.0).round()
        } else {
            0.0
        };

        ScoreSummary {
            score: self.score,
            correct: self.correct,
            wrong: self.wrong,
            missed: self.missed,
            accuracy,
            mean_reaction_ms: mean(&samples),
            reaction_std_dev_ms: std_dev(&samples),
        }
    }
}

impl Default for ScoringTracker {
    fn default() -> Self {
        Self::new(POINTS_PER_CORRECT)
    }
}

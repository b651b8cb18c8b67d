use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::variant::GameVariant;

/// Answer keys for the rock-paper-scissors table: 0 rock, 1 scissors, 2 paper.
/// Rows are win / tie / lose, columns are the shown hand (index 1 rock,
/// 2 scissors, 3 paper).
const RPS_OUTCOMES: [[u8; 3]; 3] = [[2, 0, 1], [0, 1, 2], [1, 2, 0]];

/// Number of answer keys in both stroop variants.
const STROOP_KEYS: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePair {
    pub rule1: u8,
    pub rule2: u8,
}

impl RulePair {
    pub fn new(rule1: u8, rule2: u8) -> Self {
        Self { rule1, rule2 }
    }

    /// Pair used while no session is running (preview and description states).
    pub fn canonical(variant: GameVariant) -> Self {
        match variant {
            GameVariant::RockPaperScissors => Self::new(1, 0),
            _ => Self::new(0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("{variant} has no rule1 value {rule1}")]
    Rule1OutOfDomain { variant: GameVariant, rule1: u8 },

    #[error("{variant} has no rule2 value {rule2}")]
    Rule2OutOfDomain { variant: GameVariant, rule2: u8 },

    #[error("{variant} random index {index} outside 1..={max}")]
    IndexOutOfDomain {
        variant: GameVariant,
        index: u16,
        max: u16,
    },
}

/// Picks the rule pair and random index for a new round.
///
/// With `running == false` the result is the canonical pair and index 1, so
/// idle screens always show the same preview.
pub fn select_rules<R: Rng>(
    variant: GameVariant,
    running: bool,
    rng: &mut R,
) -> (RulePair, u16) {
    if !running {
        return (RulePair::canonical(variant), 1);
    }

    let rule1 = *variant.rule1_domain().choose(rng).unwrap_or(&0);
    let rule2 = *variant.rule2_domain().choose(rng).unwrap_or(&0);
    let index = rng.gen_range(1..=variant.index_domain());

    (RulePair::new(rule1, rule2), index)
}

/// Table lookup for the correct answer key. Out-of-domain input falls back
/// to key 0; use [`try_derive_answer_key`] to detect it instead.
pub fn derive_answer_key(variant: GameVariant, rule1: u8, rule2: u8, random_index: u16) -> u8 {
    match try_derive_answer_key(variant, rule1, rule2, random_index) {
        Ok(key) => key,
        Err(err) => {
            warn!(%err, "answer derivation outside its domain, using key 0");
            0
        }
    }
}

pub fn try_derive_answer_key(
    variant: GameVariant,
    rule1: u8,
    rule2: u8,
    random_index: u16,
) -> Result<u8, RuleError> {
    if !variant.rule1_domain().contains(&rule1) {
        return Err(RuleError::Rule1OutOfDomain { variant, rule1 });
    }
    if !variant.rule2_domain().contains(&rule2) {
        return Err(RuleError::Rule2OutOfDomain { variant, rule2 });
    }
    let max = variant.index_domain();
    if random_index == 0 || random_index > max {
        return Err(RuleError::IndexOutOfDomain {
            variant,
            index: random_index,
            max,
        });
    }

    let offset = random_index - 1;
    let key = match variant {
        GameVariant::WordColor => {
            let divisor = if rule2 == 0 { 1 } else { STROOP_KEYS };
            (offset / divisor) % STROOP_KEYS
        }
        GameVariant::WordColorPicture => {
            // word meaning, word ink, then the fruit picture (its colour matches the fruit)
            let divisor = match (rule1, rule2) {
                (0, 0) => 1,
                (0, _) => STROOP_KEYS,
                _ => STROOP_KEYS * STROOP_KEYS,
            };
            (offset / divisor) % STROOP_KEYS
        }
        GameVariant::RockPaperScissors => {
            RPS_OUTCOMES[rule2 as usize][offset as usize] as u16
        }
        GameVariant::WhackAMole => offset,
    };

    Ok(key as u8)
}

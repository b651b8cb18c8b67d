use serde::{Deserialize, Serialize};

/// Number of cells on the whack-a-mole board (3x3).
pub const MOLE_CELLS: u8 = 9;

/// The four mini-games. Fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum GameVariant {
    #[strum(serialize = "Stroop")]
    WordColor,
    #[strum(serialize = "Stroop Fruit")]
    WordColorPicture,
    #[strum(serialize = "Rock Scissors Paper")]
    RockPaperScissors,
    #[strum(serialize = "Whack-a-Mole")]
    WhackAMole,
}

impl GameVariant {
    pub const ALL: [GameVariant; 4] = [
        GameVariant::WordColor,
        GameVariant::WordColorPicture,
        GameVariant::RockPaperScissors,
        GameVariant::WhackAMole,
    ];

    /// Highest valid random index; indices run from 1 to this value inclusive.
    pub fn index_domain(&self) -> u16 {
        match self {
            GameVariant::WordColor => 16,
            GameVariant::WordColorPicture => 64,
            GameVariant::RockPaperScissors => 3,
            GameVariant::WhackAMole => MOLE_CELLS as u16,
        }
    }

    /// Values rule 1 may take while a session is running.
    pub fn rule1_domain(&self) -> &'static [u8] {
        match self {
            GameVariant::WordColor => &[0],
            GameVariant::WordColorPicture => &[0, 1],
            GameVariant::RockPaperScissors => &[1],
            GameVariant::WhackAMole => &[0],
        }
    }

    /// Values rule 2 may take while a session is running.
    pub fn rule2_domain(&self) -> &'static [u8] {
        match self {
            GameVariant::WordColor | GameVariant::WordColorPicture => &[0, 1],
            GameVariant::RockPaperScissors => &[0, 1, 2],
            GameVariant::WhackAMole => &[0],
        }
    }

    pub fn uses_rule_grid(&self) -> bool {
        !matches!(self, GameVariant::WhackAMole)
    }

    pub fn is_mole(&self) -> bool {
        matches!(self, GameVariant::WhackAMole)
    }

    /// Labels for the response controls, indexed by answer key.
    pub fn choice_labels(&self) -> &'static [&'static str] {
        match self {
            GameVariant::WordColor | GameVariant::WordColorPicture => {
                &["red", "blue", "yellow", "green"]
            }
            GameVariant::RockPaperScissors => &["rock", "scissors", "paper"],
            GameVariant::WhackAMole => &["1", "2", "3", "4", "5", "6", "7", "8", "9"],
        }
    }

    pub fn choice_count(&self) -> u8 {
        self.choice_labels().len() as u8
    }

    pub fn rule1_label(&self, rule1: u8) -> &'static str {
        match (self, rule1) {
            (GameVariant::WhackAMole, _) => "-",
            (_, 0) => "word",
            (_, 1) => "picture",
            _ => "?",
        }
    }

    pub fn rule2_label(&self, rule2: u8) -> &'static str {
        match (self, rule2) {
            (GameVariant::WhackAMole, _) => "-",
            (GameVariant::RockPaperScissors, 0) => "win",
            (GameVariant::RockPaperScissors, 1) => "tie",
            (GameVariant::RockPaperScissors, 2) => "lose",
            (_, 0) => "meaning",
            (_, 1) => "color",
            _ => "?",
        }
    }

    /// File stem of the embedded stimulus table for this variant.
    pub fn asset_name(&self) -> &'static str {
        match self {
            GameVariant::WordColor => "word_color",
            GameVariant::WordColorPicture => "word_color_picture",
            GameVariant::RockPaperScissors => "rock_paper_scissors",
            GameVariant::WhackAMole => "whack_a_mole",
        }
    }
}

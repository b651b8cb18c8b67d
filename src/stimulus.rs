use std::collections::HashMap;
use std::fmt;

use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::variant::GameVariant;

static STIMULUS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets/stimuli");

/// Opaque reference to a display asset. The core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StimulusId(String);

impl StimulusId {
    pub fn new(asset: impl Into<String>) -> Self {
        Self(asset.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StimulusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum StimulusError {
    #[error("no embedded stimulus table for {0}")]
    MissingTable(GameVariant),

    #[error("failed to parse stimulus table {name}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stimulus table {name} is declared for {declared}, expected {expected}")]
    VariantMismatch {
        name: String,
        declared: GameVariant,
        expected: GameVariant,
    },

    #[error("stimulus table for {variant} has index {index} outside 1..={max}")]
    IndexOutOfDomain {
        variant: GameVariant,
        index: u16,
        max: u16,
    },

    #[error("stimulus table for {variant} lists index {index} more than once")]
    DuplicateIndex { variant: GameVariant, index: u16 },

    #[error("stimulus table for {0} has an empty fallback asset")]
    EmptyFallback(GameVariant),
}

#[derive(Debug, Clone, Deserialize)]
struct StimulusFile {
    variant: GameVariant,
    fallback: String,
    entries: Vec<StimulusEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct StimulusEntry {
    index: u16,
    asset: String,
}

/// Explicit (variant, index) -> asset mapping for one variant, with a
/// fallback for indices that have no entry.
#[derive(Debug, Clone)]
pub struct StimulusTable {
    variant: GameVariant,
    fallback: StimulusId,
    assets: HashMap<u16, StimulusId>,
}

impl StimulusTable {
    /// Loads the table shipped with the binary for `variant`.
    pub fn embedded(variant: GameVariant) -> Result<Self, StimulusError> {
        let name = format!("{}.json", variant.asset_name());
        let contents = STIMULUS_DIR
            .get_file(&name)
            .and_then(|file| file.contents_utf8())
            .ok_or(StimulusError::MissingTable(variant))?;

        Self::from_json(variant, &name, contents)
    }

    pub fn from_json(
        variant: GameVariant,
        name: &str,
        contents: &str,
    ) -> Result<Self, StimulusError> {
        let file: StimulusFile =
            serde_json::from_str(contents).map_err(|source| StimulusError::Parse {
                name: name.to_string(),
                source,
            })?;

        if file.variant != variant {
            return Err(StimulusError::VariantMismatch {
                name: name.to_string(),
                declared: file.variant,
                expected: variant,
            });
        }

        let entries = file
            .entries
            .into_iter()
            .map(|entry| (entry.index, StimulusId::new(entry.asset)));

        Self::from_entries(variant, StimulusId::new(file.fallback), entries)
    }

    /// Builds a table, rejecting out-of-domain and duplicate indices.
    pub fn from_entries<I>(
        variant: GameVariant,
        fallback: StimulusId,
        entries: I,
    ) -> Result<Self, StimulusError>
    where
        I: IntoIterator<Item = (u16, StimulusId)>,
    {
        if fallback.as_str().trim().is_empty() {
            return Err(StimulusError::EmptyFallback(variant));
        }

        let entries: Vec<(u16, StimulusId)> = entries.into_iter().collect();
        let max = variant.index_domain();

        if let Some(&(index, _)) = entries.iter().find(|(index, _)| *index == 0 || *index > max) {
            return Err(StimulusError::IndexOutOfDomain {
                variant,
                index,
                max,
            });
        }

        if let Some(index) = entries.iter().map(|(index, _)| *index).duplicates().next() {
            return Err(StimulusError::DuplicateIndex { variant, index });
        }

        Ok(Self {
            variant,
            fallback,
            assets: entries.into_iter().collect(),
        })
    }

    pub fn variant(&self) -> GameVariant {
        self.variant
    }

    /// Indices in the variant's domain with no asset of their own.
    pub fn missing_indices(&self) -> Vec<u16> {
        (1..=self.variant.index_domain())
            .filter(|index| !self.assets.contains_key(index))
            .collect()
    }

    pub fn resolve(&self, index: u16) -> StimulusId {
        match self.assets.get(&index) {
            Some(asset) => asset.clone(),
            None => {
                warn!(variant = %self.variant, index, "unresolved stimulus, using fallback");
                self.fallback.clone()
            }
        }
    }
}

//! Rejection reasons surfaced by every mutating entry point.

use thiserror::Error;

use crate::feedback::SoundCue;
use crate::hunt::HuntBlockReason;
use crate::state::Genre;

/// Result alias used across the simulation core.
pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("quantity must be a positive whole number, got `{0}`")]
    InvalidQuantity(String),
    #[error("`{0}` is not a valid number")]
    InvalidNumber(String),
    #[error("unknown material `{0}`")]
    UnknownMaterial(String),
    #[error("unknown enemy `{0}`")]
    UnknownEnemy(String),
    #[error("`{enemy}` already drops {material}")]
    DuplicateLootEntry { enemy: String, material: String },
    #[error("chapter choice {0} is not on offer")]
    ChoiceNotOffered(usize),
    #[error("chapter length {0} is not one of the fixed tiers")]
    InvalidChapterLength(u32),
    #[error("{0} has no notoriety score")]
    NotorietyUntracked(Genre),

    #[error("a run is already in progress")]
    RunInProgress,
    #[error("cannot hunt: {0}")]
    Hunt(HuntBlockReason),
    #[error("batch hunting needs {needed} cheese and {needed} remaining pages")]
    BatchUnavailable { needed: u32 },
    #[error("not enough mallets: need {needed}, have {available}")]
    NotEnoughMallets { needed: f64, available: f64 },
    #[error("{0} is not unlocked for this run")]
    FantasyLocked(Genre),
    #[error("there are no chapter choices to pick from")]
    NoPendingChoices,
    #[error("finish the current chapter before choosing the next one")]
    ChoicesLocked,
    #[error("only available during the postscript")]
    NotInPostscript,
    #[error("the postscript was already extended")]
    PostscriptAlreadyExtended,

    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,

    #[error("snapshot document is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// Cue the presentation layer should play alongside this rejection.
    #[must_use]
    pub const fn cue(&self) -> Option<SoundCue> {
        match self {
            Self::NotEnoughMallets { .. } | Self::FantasyLocked(_) => Some(SoundCue::DialogOpen),
            _ => None,
        }
    }

    /// Whether the rejection stems from malformed user input rather than game rules.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuantity(_)
                | Self::InvalidNumber(_)
                | Self::UnknownMaterial(_)
                | Self::UnknownEnemy(_)
                | Self::DuplicateLootEntry { .. }
                | Self::ChoiceNotOffered(_)
                | Self::InvalidChapterLength(_)
                | Self::NotorietyUntracked(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mallet_and_fantasy_rejections_open_a_dialog() {
        let err = SimError::NotEnoughMallets {
            needed: 30.0,
            available: 4.0,
        };
        assert_eq!(err.cue(), Some(SoundCue::DialogOpen));
        assert_eq!(
            SimError::FantasyLocked(Genre::Fantasy).cue(),
            Some(SoundCue::DialogOpen)
        );
        assert_eq!(SimError::NothingToUndo.cue(), None);
    }

    #[test]
    fn messages_name_the_problem() {
        let err = SimError::Hunt(HuntBlockReason::OutOfCheese);
        assert_eq!(err.to_string(), "cannot hunt: not enough cheese of that tier");
        assert!(SimError::InvalidQuantity("0".into()).is_invalid_input());
        assert!(!SimError::RunInProgress.is_invalid_input());
    }
}

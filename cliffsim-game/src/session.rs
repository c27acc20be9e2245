use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::SnapshotStorage;
use crate::chapter;
use crate::constants::BATCH_HUNT_SIZE;
use crate::craft::{self, Recipe};
use crate::edit;
use crate::error::{SimError, SimResult};
use crate::feedback::{AudioSettings, Feedback, Journal, SoundCue};
use crate::history::History;
use crate::hunt::{self, HuntReport};
use crate::loot;
use crate::numbers::format_amount;
use crate::state::{ChapterChoice, CheeseTier, GameState, Genre};

/// Session-wide settings that are not part of the saved game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub seed: u64,
    pub combo_enabled: bool,
    pub audio: AudioSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            combo_enabled: true,
            audio: AudioSettings::default(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_combo(mut self, enabled: bool) -> Self {
        self.combo_enabled = enabled;
        self
    }

    #[must_use]
    pub const fn with_audio(mut self, audio: AudioSettings) -> Self {
        self.audio = audio;
        self
    }
}

/// Result of a committed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub feedback: Feedback,
}

/// Owns the undoable state and the random source; every entry point the
/// presentation layer calls lives here.
#[derive(Debug, Clone)]
pub struct StorySession<R = ChaCha20Rng> {
    history: History<GameState>,
    rng: R,
    config: SessionConfig,
    journal: Journal,
}

impl StorySession<ChaCha20Rng> {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::from_state(GameState::default(), config)
    }

    #[must_use]
    pub fn from_state(state: GameState, config: SessionConfig) -> Self {
        let rng = ChaCha20Rng::seed_from_u64(config.seed);
        Self::with_rng(state, config, rng)
    }
}

impl<R: Rng> StorySession<R> {
    pub fn with_rng(state: GameState, config: SessionConfig, rng: R) -> Self {
        Self {
            history: History::new(state),
            rng,
            config,
            journal: Journal::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        self.history.current()
    }

    #[must_use]
    pub const fn history(&self) -> &History<GameState> {
        &self.history
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }

    pub const fn set_combo_enabled(&mut self, enabled: bool) {
        self.config.combo_enabled = enabled;
    }

    pub fn set_audio(&mut self, audio: AudioSettings) {
        self.config.audio = audio;
    }

    /// Cues from `feedback` that should actually be played.
    #[must_use]
    pub fn audible_cues(&self, feedback: &Feedback) -> Vec<SoundCue> {
        self.config.audio.audible(&feedback.cues)
    }

    #[must_use]
    pub fn export_journal(&self) -> String {
        self.journal.export()
    }

    pub fn into_state(self) -> GameState {
        self.history.into_current()
    }

    fn apply<T>(
        &mut self,
        action: &str,
        op: impl FnOnce(&mut GameState, &mut R, &mut Feedback) -> SimResult<T>,
    ) -> SimResult<Outcome<T>> {
        let mut next = self.history.current().clone();
        let mut feedback = Feedback::default();
        match op(&mut next, &mut self.rng, &mut feedback) {
            Ok(value) => {
                self.history.commit(next);
                self.journal.record(&feedback);
                Ok(Outcome { value, feedback })
            }
            Err(err) => {
                log::debug!("{action} rejected: {err}");
                Err(err)
            }
        }
    }

    fn apply_edit(
        &mut self,
        action: &str,
        op: impl FnOnce(&mut GameState) -> SimResult<bool>,
    ) -> SimResult<bool> {
        let mut next = self.history.current().clone();
        match op(&mut next) {
            Ok(true) => {
                self.history.commit(next);
                let mut feedback = Feedback::default();
                feedback.note(action);
                self.journal.record(&feedback);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => {
                log::debug!("{action} rejected: {err}");
                Err(err)
            }
        }
    }

    /// # Errors
    ///
    /// Fails unless the state is idle.
    pub fn start_random_run(&mut self) -> SimResult<Outcome<ChapterChoice>> {
        self.apply("random start", |state, rng, feedback| {
            chapter::start_random_run(state, rng, feedback)
        })
    }

    /// # Errors
    ///
    /// See [`chapter::start_manual_run`].
    pub fn start_manual_run(&mut self, choice: ChapterChoice) -> SimResult<Outcome<()>> {
        self.apply("manual start", |state, rng, feedback| {
            chapter::start_manual_run(state, choice, rng, feedback)
        })
    }

    /// # Errors
    ///
    /// Returns [`SimError::Hunt`] with the first unmet precondition.
    pub fn perform_hunt(&mut self, tier: Option<CheeseTier>) -> SimResult<Outcome<HuntReport>> {
        let combo = self.config.combo_enabled;
        self.apply("hunt", |state, rng, feedback| {
            hunt::perform_hunt(state, tier, combo, rng, feedback)
        })
    }

    /// Ten hunts in a row, each committed on its own so undo steps back one hunt at a time.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::BatchUnavailable`] when cheese or remaining pages fall short.
    pub fn batch_hunt(&mut self, tier: CheeseTier) -> SimResult<Outcome<Vec<HuntReport>>> {
        if let Some(reason) = hunt::hunt_block_reason(self.state(), Some(tier)) {
            return Err(SimError::Hunt(reason));
        }
        if !hunt::batch_available(self.state(), tier) {
            log::debug!("batch hunt rejected for {tier}");
            return Err(SimError::BatchUnavailable {
                needed: BATCH_HUNT_SIZE,
            });
        }
        let mut reports = Vec::new();
        let mut feedback = Feedback::default();
        for _ in 0..BATCH_HUNT_SIZE {
            let outcome = self.perform_hunt(Some(tier))?;
            feedback.extend(outcome.feedback);
            reports.push(outcome.value);
        }
        Ok(Outcome {
            value: reports,
            feedback,
        })
    }

    /// # Errors
    ///
    /// Returns [`SimError::InvalidQuantity`] when `quantity` is not positive.
    pub fn craft(&mut self, recipe: &Recipe, quantity: i64) -> SimResult<Outcome<()>> {
        self.apply("craft", |state, _, feedback| {
            craft::craft(state, recipe, quantity)?;
            feedback.cue(SoundCue::ImportSuccess);
            feedback.note(craft::describe_craft(recipe, quantity));
            Ok(())
        })
    }

    /// Craft from the raw quantity field text.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidQuantity`]; the caller resets the field to 1.
    pub fn craft_from_input(&mut self, recipe: &Recipe, raw: &str) -> SimResult<Outcome<()>> {
        let quantity = craft::parse_quantity(raw)?;
        self.craft(recipe, i64::from(quantity))
    }

    /// # Errors
    ///
    /// See [`chapter::choose_next_chapter`].
    pub fn choose_next_chapter(&mut self, index: usize) -> SimResult<Outcome<ChapterChoice>> {
        self.apply("chapter choice", |state, rng, feedback| {
            chapter::choose_next_chapter(state, index, rng, feedback)
        })
    }

    /// # Errors
    ///
    /// See [`chapter::reroll_choices`].
    pub fn reroll_choices(&mut self) -> SimResult<Outcome<()>> {
        self.apply("reroll", |state, rng, feedback| {
            chapter::reroll_choices(state, rng, feedback)
        })
    }

    /// # Errors
    ///
    /// See [`chapter::extend_postscript`].
    pub fn extend_postscript(&mut self) -> SimResult<Outcome<()>> {
        self.apply("postscript extension", |state, _, feedback| {
            chapter::extend_postscript(state, feedback)
        })
    }

    /// # Errors
    ///
    /// Rejects unknown keys and negative amounts.
    pub fn edit_resource(&mut self, key: &str, value: f64) -> SimResult<bool> {
        let action = format!("Set {key} to {}", format_amount(value));
        self.apply_edit(&action, |state| edit::set_resource(state, key, value))
    }

    /// # Errors
    ///
    /// Rejects unknown keys and non-finite amounts.
    pub fn edit_consumable(&mut self, key: &str, value: f64) -> SimResult<bool> {
        let action = format!("Set {key} to {}", format_amount(value));
        self.apply_edit(&action, |state| edit::set_consumable(state, key, value))
    }

    /// # Errors
    ///
    /// Rejects the bonus genre.
    pub fn edit_notoriety(&mut self, genre: Genre, value: i64) -> SimResult<bool> {
        let action = format!("Set {genre} notoriety to {value}");
        self.apply_edit(&action, |state| edit::set_notoriety(state, genre, value))
    }

    /// # Errors
    ///
    /// Rejects negative or non-finite amounts.
    pub fn edit_loot_entry(
        &mut self,
        enemy: &str,
        material: &str,
        value: f64,
    ) -> SimResult<bool> {
        if value < 0.0 {
            return Err(SimError::InvalidNumber(format_amount(value)));
        }
        let action = format!("Set {enemy} drop {material} to {}", format_amount(value));
        self.apply_edit(&action, |state| {
            loot::set_drop_amount(state, enemy, material, value)
        })
    }

    /// # Errors
    ///
    /// Rejects materials outside the catalog, unknown enemies and duplicates.
    pub fn add_loot_entry(&mut self, enemy: &str, material: &str) -> SimResult<Outcome<()>> {
        self.apply("add loot entry", |state, _, feedback| {
            loot::add_drop_entry(state, enemy, material)?;
            feedback.note(format!("Added {material} to {enemy} drops"));
            Ok(())
        })
    }

    /// # Errors
    ///
    /// Returns [`SimError::NothingToUndo`] at the start of history.
    pub fn undo(&mut self) -> SimResult<&GameState> {
        self.history.undo()
    }

    /// # Errors
    ///
    /// Returns [`SimError::NothingToRedo`] when nothing was undone.
    pub fn redo(&mut self) -> SimResult<&GameState> {
        self.history.redo()
    }

    /// # Errors
    ///
    /// Propagates storage failures; the session is unaffected either way.
    pub fn save_snapshot<S: SnapshotStorage>(
        &self,
        storage: &S,
        name: &str,
    ) -> Result<(), S::Error> {
        storage.save_snapshot(name, self.state())?;
        log::info!("saved snapshot `{name}`");
        Ok(())
    }

    /// Commit a stored snapshot as the new current state. Returns `false` when
    /// no snapshot exists under `name`.
    ///
    /// # Errors
    ///
    /// Propagates storage failures without touching the session.
    pub fn load_snapshot<S: SnapshotStorage>(
        &mut self,
        storage: &S,
        name: &str,
    ) -> Result<bool, S::Error> {
        let Some(state) = storage.load_snapshot(name)? else {
            return Ok(false);
        };
        self.adopt(state, name);
        Ok(true)
    }

    /// Commit a snapshot from raw document text.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Json`] when the text is not a document at all.
    pub fn load_snapshot_json(&mut self, json: &str) -> SimResult<()> {
        let state = GameState::from_json(json)?;
        self.adopt(state, "document");
        Ok(())
    }

    fn adopt(&mut self, state: GameState, source: &str) {
        self.history.commit(state);
        let mut feedback = Feedback::default();
        feedback.note(format!("Loaded snapshot from {source}"));
        self.journal.record(&feedback);
        log::info!("loaded snapshot `{source}`");
    }
}

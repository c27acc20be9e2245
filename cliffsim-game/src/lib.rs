//! Cliffsim Story Engine
//!
//! Platform-agnostic core for the cheese-hunt story run: crafting, loot,
//! the chapter state machine, the hunt orchestrator and undoable history.
//! This crate has no UI, audio or file-system dependencies; it reports
//! journal lines and cue identifiers and leaves playback to its callers.

pub mod chapter;
pub mod constants;
pub mod craft;
pub mod edit;
pub mod error;
pub mod feedback;
pub mod history;
pub mod hunt;
pub mod loot;
pub mod numbers;
pub mod session;
pub mod snapshot;
pub mod state;

use std::cell::RefCell;
use std::collections::HashMap;

// Re-export commonly used types
pub use craft::{RECIPES, Recipe, find_recipe, parse_quantity};
pub use error::{SimError, SimResult};
pub use feedback::{AudioSettings, Feedback, Journal, LogEntry, LogTag, SoundCue};
pub use history::History;
pub use hunt::{
    HuntBlockReason, HuntReport, HuntTransition, batch_available, hunt_block_reason,
};
pub use loot::{DropTable, LootLine, all_material_types, available_drop_types};
pub use session::{Outcome, SessionConfig, StorySession};
pub use snapshot::SnapshotDocument;
pub use state::{ChapterChoice, CheeseTier, GameState, Genre, RunPhase};

/// Trait for abstracting snapshot save/load operations.
/// Platform-specific implementations decide where documents live.
pub trait SnapshotStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist `state` under `name`, replacing any earlier snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save_snapshot(&self, name: &str, state: &GameState) -> Result<(), Self::Error>;

    /// Read the snapshot stored under `name`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read.
    fn load_snapshot(&self, name: &str) -> Result<Option<GameState>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be removed.
    fn delete_snapshot(&self, name: &str) -> Result<(), Self::Error>;
}

/// In-process store keeping serialized documents, handy for tests and previews.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    documents: RefCell<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }

    /// Raw document text stored under `name`.
    #[must_use]
    pub fn document(&self, name: &str) -> Option<String> {
        self.documents.borrow().get(name).cloned()
    }
}

impl SnapshotStorage for MemorySnapshotStore {
    type Error = SimError;

    fn save_snapshot(&self, name: &str, state: &GameState) -> Result<(), Self::Error> {
        let json = state.to_json_pretty()?;
        self.documents.borrow_mut().insert(name.to_string(), json);
        Ok(())
    }

    fn load_snapshot(&self, name: &str) -> Result<Option<GameState>, Self::Error> {
        self.documents
            .borrow()
            .get(name)
            .map(|json| GameState::from_json(json))
            .transpose()
    }

    fn delete_snapshot(&self, name: &str) -> Result<(), Self::Error> {
        self.documents.borrow_mut().remove(name);
        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    CHAPTER_LENGTHS, COMMON_WEAVER_T1, COMMON_WEAVER_T2, COMMON_WEAVER_T3, CONSUMABLE_KEYS,
    DEFAULT_POSTSCRIPT_LENGTH, FANTASY_UNLOCK_THRESHOLD, MALLETS, MYTHWEAVER_T1, MYTHWEAVER_T2,
    MYTHWEAVER_T3, NOTORIETY_MAX, NOTORIETY_MIN, POSTSCRIPT_POSITION, RESOURCE_KEYS, T1_CHEESE,
    T1_MOUSE, T2_CHEESE, T2_MOUSE, T3_CHEESE, T3_MOUSE, TOTAL_CHAPTERS,
};
use crate::error::{SimError, SimResult};
use crate::loot::{DropTable, default_drop_table};
use crate::snapshot::SnapshotDocument;

/// Story genres. The first five are the base pool; `Fantasy` is the bonus genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Genre {
    Romance,
    Adventure,
    Comedy,
    Tragedy,
    Suspense,
    Fantasy,
}

impl Genre {
    pub const BASE: [Self; 5] = [
        Self::Romance,
        Self::Adventure,
        Self::Comedy,
        Self::Tragedy,
        Self::Suspense,
    ];

    pub const ALL: [Self; 6] = [
        Self::Romance,
        Self::Adventure,
        Self::Comedy,
        Self::Tragedy,
        Self::Suspense,
        Self::Fantasy,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Romance => "Romance",
            Self::Adventure => "Adventure",
            Self::Comedy => "Comedy",
            Self::Tragedy => "Tragedy",
            Self::Suspense => "Suspense",
            Self::Fantasy => "Fantasy",
        }
    }

    #[must_use]
    pub const fn is_bonus(self) -> bool {
        matches!(self, Self::Fantasy)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|genre| genre.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Cheese strength used for a hunt. Each tier carries its own enemies and rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheeseTier {
    T1,
    T2,
    T3,
}

impl CheeseTier {
    pub const ALL: [Self; 3] = [Self::T1, Self::T2, Self::T3];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::T1 => "T1",
            Self::T2 => "T2",
            Self::T3 => "T3",
        }
    }

    /// Resource key consumed by one hunt with this tier.
    #[must_use]
    pub const fn resource_key(self) -> &'static str {
        match self {
            Self::T1 => T1_CHEESE,
            Self::T2 => T2_CHEESE,
            Self::T3 => T3_CHEESE,
        }
    }

    /// Genre pages granted per chapter hunt.
    #[must_use]
    pub const fn page_gain(self) -> u32 {
        match self {
            Self::T1 => 25,
            Self::T2 => 50,
            Self::T3 => 125,
        }
    }

    /// Notoriety granted to the drawn genre per postscript hunt.
    #[must_use]
    pub const fn notoriety_gain(self) -> i32 {
        match self {
            Self::T1 => 25,
            Self::T2 => 50,
            Self::T3 => 125,
        }
    }

    #[must_use]
    pub const fn chapter_enemy(self) -> &'static str {
        match self {
            Self::T1 => T1_MOUSE,
            Self::T2 => T2_MOUSE,
            Self::T3 => T3_MOUSE,
        }
    }

    #[must_use]
    pub const fn postscript_enemy(self) -> &'static str {
        match self {
            Self::T1 => COMMON_WEAVER_T1,
            Self::T2 => COMMON_WEAVER_T2,
            Self::T3 => COMMON_WEAVER_T3,
        }
    }

    #[must_use]
    pub const fn ultimate_enemy(self) -> &'static str {
        match self {
            Self::T1 => MYTHWEAVER_T1,
            Self::T2 => MYTHWEAVER_T2,
            Self::T3 => MYTHWEAVER_T3,
        }
    }
}

impl fmt::Display for CheeseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheeseTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "T1" => Ok(Self::T1),
            "T2" => Ok(Self::T2),
            "T3" => Ok(Self::T3),
            _ => Err(()),
        }
    }
}

/// A candidate next chapter offered to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterChoice {
    pub length: u32,
    pub genre: Genre,
}

impl ChapterChoice {
    #[must_use]
    pub const fn new(length: u32, genre: Genre) -> Self {
        Self { length, genre }
    }
}

impl fmt::Display for ChapterChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pages / {}", self.length, self.genre)
    }
}

pub type ChoiceSet = SmallVec<[ChapterChoice; 3]>;

/// Coarse lifecycle view derived from `chapter_position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Chapter { number: u8 },
    Postscript,
    /// Position outside the run; only reachable through hand-edited documents.
    Unknown { position: u8 },
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Chapter { number } => write!(f, "chapter {number}/{TOTAL_CHAPTERS}"),
            Self::Postscript => f.write_str("postscript"),
            Self::Unknown { position } => write!(f, "unknown position {position}"),
        }
    }
}

/// Complete, serializable snapshot of the simulation.
///
/// Committed states are never edited in place; every operation works on a
/// clone which the history then adopts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotDocument")]
pub struct GameState {
    pub resources: BTreeMap<String, f64>,
    pub consumables: BTreeMap<String, f64>,
    pub notoriety: BTreeMap<Genre, i32>,
    pub enemy_drops: DropTable,
    pub genre_pages: BTreeMap<Genre, u32>,
    pub total_hunts: u64,
    pub current_run_hunts: u32,
    pub chapter_position: u8,
    pub current_chapter_length: Option<u32>,
    pub current_chapter_genre: Option<Genre>,
    pub current_chapter_progress: u32,
    pub postscript_length: u32,
    pub pending_chapter_choices: ChoiceSet,
    pub run_fantasy_available: bool,
    pub postscript_extended: bool,
    pub run_mallets_spent: f64,
    pub total_mallets_spent: f64,
    pub pending_choices_locked: bool,
    pub total_diamonds_gain: f64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            resources: RESOURCE_KEYS
                .iter()
                .map(|key| ((*key).to_string(), 0.0))
                .collect(),
            consumables: CONSUMABLE_KEYS
                .iter()
                .map(|key| ((*key).to_string(), 0.0))
                .collect(),
            notoriety: Genre::BASE.iter().map(|genre| (*genre, 0)).collect(),
            enemy_drops: default_drop_table(),
            genre_pages: empty_pages(),
            total_hunts: 0,
            current_run_hunts: 0,
            chapter_position: 0,
            current_chapter_length: None,
            current_chapter_genre: None,
            current_chapter_progress: 0,
            postscript_length: DEFAULT_POSTSCRIPT_LENGTH,
            pending_chapter_choices: SmallVec::new(),
            run_fantasy_available: false,
            postscript_extended: false,
            run_mallets_spent: 0.0,
            total_mallets_spent: 0.0,
            pending_choices_locked: false,
            total_diamonds_gain: 0.0,
        }
    }
}

pub(crate) fn empty_pages() -> BTreeMap<Genre, u32> {
    Genre::ALL.iter().map(|genre| (*genre, 0)).collect()
}

impl GameState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn resource(&self, key: &str) -> f64 {
        self.resources.get(key).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn consumable(&self, key: &str) -> f64 {
        self.consumables.get(key).copied().unwrap_or(0.0)
    }

    /// Amount held of any material, looking in resources before consumables.
    #[must_use]
    pub fn material(&self, key: &str) -> f64 {
        self.resources
            .get(key)
            .or_else(|| self.consumables.get(key))
            .copied()
            .unwrap_or(0.0)
    }

    /// Add `amount` to whichever bucket owns `key`; unclassified materials become resources.
    pub fn add_material(&mut self, key: &str, amount: f64) {
        if let Some(value) = self.resources.get_mut(key) {
            *value += amount;
        } else if let Some(value) = self.consumables.get_mut(key) {
            *value += amount;
        } else {
            self.resources.insert(key.to_string(), amount);
        }
    }

    #[must_use]
    pub fn mallets(&self) -> f64 {
        self.resource(MALLETS)
    }

    /// Pay a mallet fee, recording it against the run and lifetime totals.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotEnoughMallets`] when the balance is short.
    pub fn spend_mallets(&mut self, cost: f64) -> SimResult<()> {
        let available = self.mallets();
        if available < cost {
            return Err(SimError::NotEnoughMallets {
                needed: cost,
                available,
            });
        }
        self.resources.insert(MALLETS.to_string(), available - cost);
        self.run_mallets_spent += cost;
        self.total_mallets_spent += cost;
        Ok(())
    }

    #[must_use]
    pub fn notoriety_of(&self, genre: Genre) -> i32 {
        self.notoriety.get(&genre).copied().unwrap_or(0)
    }

    pub fn set_notoriety(&mut self, genre: Genre, value: i32) {
        self.notoriety
            .insert(genre, value.clamp(NOTORIETY_MIN, NOTORIETY_MAX));
    }

    pub fn clamp_notoriety(&mut self) {
        for value in self.notoriety.values_mut() {
            *value = (*value).clamp(NOTORIETY_MIN, NOTORIETY_MAX);
        }
    }

    /// True when every base genre's notoriety exceeds the bonus-genre threshold.
    #[must_use]
    pub fn fantasy_unlocked(&self) -> bool {
        Genre::BASE
            .iter()
            .all(|genre| self.notoriety_of(*genre) > FANTASY_UNLOCK_THRESHOLD)
    }

    /// Genres that may be drawn for chapters of the current run.
    #[must_use]
    pub fn run_genres(&self) -> SmallVec<[Genre; 6]> {
        let mut genres: SmallVec<[Genre; 6]> = Genre::BASE.iter().copied().collect();
        if self.run_fantasy_available {
            genres.push(Genre::Fantasy);
        }
        genres
    }

    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        match self.chapter_position {
            0 => RunPhase::Idle,
            POSTSCRIPT_POSITION => RunPhase::Postscript,
            number @ 1..=TOTAL_CHAPTERS => RunPhase::Chapter { number },
            position => RunPhase::Unknown { position },
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.chapter_position == 0
    }

    #[must_use]
    pub const fn in_postscript(&self) -> bool {
        self.chapter_position == POSTSCRIPT_POSITION
    }

    /// Hunts needed to finish the active chapter or postscript.
    #[must_use]
    pub const fn target_length(&self) -> Option<u32> {
        if self.in_postscript() {
            Some(self.postscript_length)
        } else {
            self.current_chapter_length
        }
    }

    #[must_use]
    pub fn remaining_progress(&self) -> Option<u32> {
        self.target_length()
            .map(|target| target.saturating_sub(self.current_chapter_progress))
    }

    #[must_use]
    pub fn pages_of(&self, genre: Genre) -> u32 {
        self.genre_pages.get(&genre).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.genre_pages.values().map(|pages| u64::from(*pages)).sum()
    }

    /// Share of the run's pages written in `genre`, as a percentage.
    #[must_use]
    pub fn page_share(&self, genre: Genre) -> f64 {
        let total = self.total_pages();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.pages_of(genre)) * 100.0 / crate::numbers::u64_to_f64(total)
    }

    /// Average hunts per diamond gained, or `None` before the first diamond.
    #[must_use]
    pub fn hunts_per_diamond(&self) -> Option<f64> {
        (self.total_diamonds_gain > 0.0)
            .then(|| crate::numbers::u64_to_f64(self.total_hunts) / self.total_diamonds_gain)
    }

    #[must_use]
    pub fn is_valid_chapter_length(length: u32) -> bool {
        CHAPTER_LENGTHS.contains(&length)
    }
}

//! Save/load document for [`GameState`].
//!
//! Writing uses the state's own `Serialize` impl. Reading goes through
//! [`SnapshotDocument`], where every field is optional and loosely typed, and
//! an explicit default-filling step turns it into a state. Older or partial
//! documents therefore always load; only text that is not a JSON record at
//! all is rejected.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::{CHAPTER_LENGTHS, CONSUMABLE_KEYS, NOTORIETY_MAX, NOTORIETY_MIN, RESOURCE_KEYS};
use crate::error::SimResult;
use crate::loot::{DropTable, backfill_defaults};
use crate::numbers::{truncate_f64_to_i32, truncate_f64_to_u32, truncate_f64_to_u64};
use crate::state::{ChapterChoice, ChoiceSet, GameState, Genre};

/// Loosely typed mirror of the persisted state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotDocument {
    pub resources: Option<Value>,
    pub consumables: Option<Value>,
    pub notoriety: Option<Value>,
    pub enemy_drops: Option<Value>,
    pub genre_pages: Option<Value>,
    pub total_hunts: Option<Value>,
    pub current_run_hunts: Option<Value>,
    pub chapter_position: Option<Value>,
    pub current_chapter_length: Option<Value>,
    pub current_chapter_genre: Option<Value>,
    pub current_chapter_progress: Option<Value>,
    pub postscript_length: Option<Value>,
    pub pending_chapter_choices: Option<Value>,
    pub run_fantasy_available: Option<Value>,
    pub postscript_extended: Option<Value>,
    pub run_mallets_spent: Option<Value>,
    pub total_mallets_spent: Option<Value>,
    pub pending_choices_locked: Option<Value>,
    pub total_diamonds_gain: Option<Value>,
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

fn genre_of(value: &Value) -> Option<Genre> {
    value.as_str().and_then(|s| s.parse().ok())
}

fn float_map(value: Option<&Value>) -> BTreeMap<String, f64> {
    value
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(key, raw)| number(raw).map(|amount| (key.clone(), amount)))
                .collect()
        })
        .unwrap_or_default()
}

fn genre_map(value: Option<&Value>) -> BTreeMap<Genre, f64> {
    value
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(key, raw)| Some((key.parse::<Genre>().ok()?, number(raw)?)))
                .collect()
        })
        .unwrap_or_default()
}

/// Overlay loaded amounts onto the known keys; unknown keys are kept as-is.
fn merge_amounts(
    target: &mut BTreeMap<String, f64>,
    keys: &[&str],
    loaded: BTreeMap<String, f64>,
) {
    for key in keys {
        target.entry((*key).to_string()).or_insert(0.0);
    }
    target.extend(loaded);
}

fn drop_table(value: Option<&Value>) -> DropTable {
    let mut table: DropTable = value
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter(|(_, drops)| drops.is_object())
                .map(|(enemy, drops)| (enemy.clone(), float_map(Some(drops))))
                .collect()
        })
        .unwrap_or_default();
    backfill_defaults(&mut table);
    table
}

fn choice(item: &Value) -> Option<ChapterChoice> {
    let length = truncate_f64_to_u32(number(item.get("length")?)?);
    let genre = genre_of(item.get("genre")?)?;
    GameState::is_valid_chapter_length(length).then(|| ChapterChoice::new(length, genre))
}

/// All three choices, one per length tier, or none at all.
fn choices(value: Option<&Value>) -> ChoiceSet {
    let Some(set) = value
        .and_then(Value::as_array)
        .and_then(|items| items.iter().map(choice).collect::<Option<ChoiceSet>>())
    else {
        return ChoiceSet::new();
    };
    let covers_every_tier = set.len() == CHAPTER_LENGTHS.len()
        && CHAPTER_LENGTHS
            .iter()
            .all(|length| set.iter().any(|choice| choice.length == *length));
    if covers_every_tier { set } else { ChoiceSet::new() }
}

impl From<SnapshotDocument> for GameState {
    fn from(doc: SnapshotDocument) -> Self {
        let mut state = Self::default();

        merge_amounts(
            &mut state.resources,
            &RESOURCE_KEYS,
            float_map(doc.resources.as_ref()),
        );
        merge_amounts(
            &mut state.consumables,
            &CONSUMABLE_KEYS,
            float_map(doc.consumables.as_ref()),
        );
        for (genre, value) in genre_map(doc.notoriety.as_ref()) {
            if !genre.is_bonus() {
                state.notoriety.insert(
                    genre,
                    truncate_f64_to_i32(value).clamp(NOTORIETY_MIN, NOTORIETY_MAX),
                );
            }
        }
        state.enemy_drops = drop_table(doc.enemy_drops.as_ref());
        for (genre, value) in genre_map(doc.genre_pages.as_ref()) {
            state.genre_pages.insert(genre, truncate_f64_to_u32(value));
        }

        let count = |value: Option<&Value>| value.and_then(number);
        if let Some(n) = count(doc.total_hunts.as_ref()) {
            state.total_hunts = truncate_f64_to_u64(n);
        }
        if let Some(n) = count(doc.current_run_hunts.as_ref()) {
            state.current_run_hunts = truncate_f64_to_u32(n);
        }
        if let Some(n) = count(doc.chapter_position.as_ref()) {
            state.chapter_position = u8::try_from(truncate_f64_to_u32(n)).unwrap_or(0);
        }
        state.current_chapter_length = count(doc.current_chapter_length.as_ref())
            .map(truncate_f64_to_u32)
            .filter(|length| *length > 0);
        state.current_chapter_genre = doc.current_chapter_genre.as_ref().and_then(genre_of);
        if let Some(n) = count(doc.current_chapter_progress.as_ref()) {
            state.current_chapter_progress = truncate_f64_to_u32(n);
        }
        if let Some(n) = count(doc.postscript_length.as_ref()) {
            state.postscript_length = truncate_f64_to_u32(n);
        }
        state.pending_chapter_choices = choices(doc.pending_chapter_choices.as_ref());
        if let Some(n) = count(doc.run_mallets_spent.as_ref()) {
            state.run_mallets_spent = n;
        }
        if let Some(n) = count(doc.total_mallets_spent.as_ref()) {
            state.total_mallets_spent = n;
        }
        if let Some(n) = count(doc.total_diamonds_gain.as_ref()) {
            state.total_diamonds_gain = n;
        }

        let toggle = |value: Option<&Value>| value.and_then(flag).unwrap_or(false);
        state.run_fantasy_available = toggle(doc.run_fantasy_available.as_ref());
        state.postscript_extended = toggle(doc.postscript_extended.as_ref());
        state.pending_choices_locked = toggle(doc.pending_choices_locked.as_ref());

        state
    }
}

impl GameState {
    /// Parse a snapshot document, defaulting anything missing or malformed.
    ///
    /// # Errors
    ///
    /// Fails only when `json` is not a JSON record.
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_json_pretty(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write-side view of the state as a generic JSON value.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_document(&self) -> SimResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

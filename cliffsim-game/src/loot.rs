//! Loot engine: drop tables and their application to a state.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{
    COMMON_WEAVER_T1, COMMON_WEAVER_T2, COMMON_WEAVER_T3, CONSUMABLE_KEYS, DIAMOND, GOLD,
    MACHINERY, MALLETS, MYTHWEAVER_T1, MYTHWEAVER_T2, MYTHWEAVER_T3, RESOURCE_KEYS, T1_MOUSE,
    T2_MOUSE, T3_MOUSE, THREAD, UNSCALED_MATERIALS,
};
use crate::error::{SimError, SimResult};
use crate::numbers::format_amount;
use crate::state::GameState;

/// Per-enemy material drops, keyed by enemy then material.
pub type DropTable = BTreeMap<String, BTreeMap<String, f64>>;

const DEFAULT_DROPS: [(&str, &[(&str, f64)]); 9] = [
    (T1_MOUSE, &[(THREAD, 1.54), (GOLD, 7500.0)]),
    (T2_MOUSE, &[(MACHINERY, 2.43), (GOLD, 16500.0)]),
    (T3_MOUSE, &[(GOLD, 25000.0)]),
    (
        COMMON_WEAVER_T1,
        &[(GOLD, 25000.0), (MALLETS, 1.5), (THREAD, 1.54)],
    ),
    (
        COMMON_WEAVER_T2,
        &[(GOLD, 25000.0), (MALLETS, 1.5), (MACHINERY, 2.43)],
    ),
    (COMMON_WEAVER_T3, &[(GOLD, 25000.0), (MALLETS, 1.5)]),
    (
        MYTHWEAVER_T1,
        &[(GOLD, 225_000.0), (DIAMOND, 1.0), (MALLETS, 2.3), (THREAD, 1.54)],
    ),
    (
        MYTHWEAVER_T2,
        &[
            (GOLD, 225_000.0),
            (DIAMOND, 1.0),
            (MALLETS, 2.3),
            (MACHINERY, 2.43),
        ],
    ),
    (
        MYTHWEAVER_T3,
        &[(GOLD, 225_000.0), (DIAMOND, 1.0), (MALLETS, 2.3)],
    ),
];

/// The built-in drop table every state starts from.
#[must_use]
pub fn default_drop_table() -> DropTable {
    DEFAULT_DROPS
        .iter()
        .map(|(enemy, drops)| {
            let entries = drops
                .iter()
                .map(|(material, amount)| ((*material).to_string(), *amount))
                .collect();
            ((*enemy).to_string(), entries)
        })
        .collect()
}

fn default_drops_for(enemy: &str) -> Option<&'static [(&'static str, f64)]> {
    DEFAULT_DROPS
        .iter()
        .find(|(name, _)| *name == enemy)
        .map(|(_, drops)| *drops)
}

/// Restore any built-in enemy missing from `table`. Existing entries are untouched.
pub fn backfill_defaults(table: &mut DropTable) {
    for (enemy, drops) in DEFAULT_DROPS {
        table.entry(enemy.to_string()).or_insert_with(|| {
            drops
                .iter()
                .map(|(material, amount)| ((*material).to_string(), *amount))
                .collect()
        });
    }
}

/// Sorted catalog of every material a drop table may reference.
#[must_use]
pub fn all_material_types() -> Vec<&'static str> {
    let mut materials: Vec<&'static str> = RESOURCE_KEYS
        .iter()
        .chain(CONSUMABLE_KEYS.iter())
        .copied()
        .collect();
    materials.sort_unstable();
    materials.dedup();
    materials
}

/// Catalog materials that `enemy` does not drop yet.
#[must_use]
pub fn available_drop_types(state: &GameState, enemy: &str) -> Vec<&'static str> {
    let current = state.enemy_drops.get(enemy);
    all_material_types()
        .into_iter()
        .filter(|material| current.is_none_or(|drops| !drops.contains_key(*material)))
        .collect()
}

/// One material actually credited by a loot application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootLine {
    pub material: String,
    pub amount: f64,
}

impl fmt::Display for LootLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} +{}", self.material, format_amount(self.amount))
    }
}

pub type LootLines = SmallVec<[LootLine; 4]>;

/// Credit `enemy`'s drops to `state`, scaling everything except currency-like
/// materials by `multiplier`.
pub fn apply_loot(state: &mut GameState, enemy: &str, multiplier: f64) -> LootLines {
    let drops: Vec<(String, f64)> = match state.enemy_drops.get(enemy) {
        Some(table) => table
            .iter()
            .map(|(material, amount)| (material.clone(), *amount))
            .collect(),
        None => default_drops_for(enemy)
            .unwrap_or_default()
            .iter()
            .map(|(material, amount)| ((*material).to_string(), *amount))
            .collect(),
    };

    let mut lines = LootLines::new();
    for (material, base) in drops {
        let amount = if UNSCALED_MATERIALS.contains(&material.as_str()) {
            base
        } else {
            base * multiplier
        };
        if material == DIAMOND {
            state.total_diamonds_gain += amount;
        }
        state.add_material(&material, amount);
        lines.push(LootLine { material, amount });
    }
    lines
}

/// Render loot lines for the journal, skipping zero amounts.
#[must_use]
pub fn describe_loot(lines: &[LootLine]) -> String {
    let parts: Vec<String> = lines
        .iter()
        .filter(|line| line.amount != 0.0)
        .map(ToString::to_string)
        .collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

/// Set one drop amount. Enemies absent from the table are created.
///
/// # Errors
///
/// Rejects non-finite amounts.
pub fn set_drop_amount(
    state: &mut GameState,
    enemy: &str,
    material: &str,
    amount: f64,
) -> SimResult<bool> {
    if !amount.is_finite() {
        return Err(SimError::InvalidNumber(amount.to_string()));
    }
    let drops = state.enemy_drops.entry(enemy.to_string()).or_default();
    if drops.get(material).copied() == Some(amount) {
        return Ok(false);
    }
    drops.insert(material.to_string(), amount);
    Ok(true)
}

/// Register a new zero-amount drop for `enemy`.
///
/// # Errors
///
/// Rejects materials outside the catalog, unknown enemies, and duplicates.
pub fn add_drop_entry(state: &mut GameState, enemy: &str, material: &str) -> SimResult<()> {
    if !all_material_types().contains(&material) {
        return Err(SimError::UnknownMaterial(material.to_string()));
    }
    let Some(drops) = state.enemy_drops.get_mut(enemy) else {
        return Err(SimError::UnknownEnemy(enemy.to_string()));
    };
    if drops.contains_key(material) {
        return Err(SimError::DuplicateLootEntry {
            enemy: enemy.to_string(),
            material: material.to_string(),
        });
    }
    drops.insert(material.to_string(), 0.0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{HOOKS, MAGIC_ESSENCE};

    fn amount_of(lines: &[LootLine], material: &str) -> f64 {
        lines
            .iter()
            .find(|line| line.material == material)
            .map_or(0.0, |line| line.amount)
    }

    #[test]
    fn default_table_has_nine_enemies() {
        let table = default_drop_table();
        assert_eq!(table.len(), 9);
        assert!((table[T2_MOUSE][MACHINERY] - 2.43).abs() < f64::EPSILON);
        assert!((table[MYTHWEAVER_T3][DIAMOND] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn multiplier_skips_currency_materials() {
        let mut state = GameState::default();
        let lines = apply_loot(&mut state, T2_MOUSE, 2.0);
        assert!((amount_of(&lines, GOLD) - 16500.0).abs() < f64::EPSILON);
        assert!((amount_of(&lines, MACHINERY) - 4.86).abs() < 1e-9);
        assert!((state.consumable(GOLD) - 16500.0).abs() < f64::EPSILON);
        assert!((state.resource(MACHINERY) - 4.86).abs() < 1e-9);
    }

    #[test]
    fn diamonds_feed_lifetime_counter_unscaled() {
        let mut state = GameState::default();
        apply_loot(&mut state, MYTHWEAVER_T1, 2.0);
        assert!((state.total_diamonds_gain - 1.0).abs() < f64::EPSILON);
        assert!((state.resource(DIAMOND) - 1.0).abs() < f64::EPSILON);
        assert!((state.resource(MALLETS) - 4.6).abs() < 1e-9);
    }

    #[test]
    fn missing_table_entry_falls_back_to_defaults() {
        let mut state = GameState::default();
        state.enemy_drops.remove(T1_MOUSE);
        let lines = apply_loot(&mut state, T1_MOUSE, 1.0);
        assert!((amount_of(&lines, THREAD) - 1.54).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_enemy_without_table_drops_nothing() {
        let mut state = GameState::default();
        let lines = apply_loot(&mut state, "Paper Tiger", 1.0);
        assert!(lines.is_empty());
        assert_eq!(describe_loot(&lines), "none");
    }

    #[test]
    fn describe_skips_zero_lines() {
        let lines = vec![
            LootLine {
                material: THREAD.into(),
                amount: 3.08,
            },
            LootLine {
                material: HOOKS.into(),
                amount: 0.0,
            },
            LootLine {
                material: GOLD.into(),
                amount: 7500.0,
            },
        ];
        assert_eq!(describe_loot(&lines), "Thread +3.08, Gold +7500");
    }

    #[test]
    fn adding_entries_rejects_duplicates_and_unknown_materials() {
        let mut state = GameState::default();
        add_drop_entry(&mut state, T3_MOUSE, MAGIC_ESSENCE).unwrap();
        assert_eq!(state.enemy_drops[T3_MOUSE][MAGIC_ESSENCE], 0.0);
        assert!(matches!(
            add_drop_entry(&mut state, T3_MOUSE, MAGIC_ESSENCE),
            Err(SimError::DuplicateLootEntry { .. })
        ));
        assert!(matches!(
            add_drop_entry(&mut state, T3_MOUSE, "Stardust"),
            Err(SimError::UnknownMaterial(_))
        ));
        assert!(matches!(
            add_drop_entry(&mut state, "Nobody", GOLD),
            Err(SimError::UnknownEnemy(_))
        ));
    }

    #[test]
    fn available_types_exclude_current_drops() {
        let state = GameState::default();
        let available = available_drop_types(&state, T3_MOUSE);
        assert!(!available.contains(&GOLD));
        assert!(available.contains(&THREAD));
        assert_eq!(available.len(), all_material_types().len() - 1);
    }

    #[test]
    fn backfill_restores_only_missing_enemies() {
        let mut table = DropTable::new();
        table.insert(T1_MOUSE.to_string(), BTreeMap::new());
        table.insert("Custom".to_string(), BTreeMap::new());
        backfill_defaults(&mut table);
        assert_eq!(table.len(), 10);
        assert!(table[T1_MOUSE].is_empty());
    }

    #[test]
    fn drop_edits_report_changes() {
        let mut state = GameState::default();
        assert!(!set_drop_amount(&mut state, T1_MOUSE, THREAD, 1.54).unwrap());
        assert!(set_drop_amount(&mut state, T1_MOUSE, THREAD, 2.0).unwrap());
        assert!(set_drop_amount(&mut state, "Custom", GOLD, 5.0).unwrap());
        assert!(set_drop_amount(&mut state, T1_MOUSE, THREAD, f64::NAN).is_err());
    }
}

//! Centralized balance and tuning constants for the story-run simulation.
//!
//! Every economy number used by the chapter machine, the hunt orchestrator,
//! crafting and the loot engine lives here so that balance changes go
//! through code review instead of loose data files.

// Material keys ------------------------------------------------------------
pub const MALLETS: &str = "mallets";
pub const T1_CHEESE: &str = "T1 cheese";
pub const T2_CHEESE: &str = "T2 cheese";
pub const T3_CHEESE: &str = "T3 cheese";
pub const THREAD: &str = "Thread";
pub const MACHINERY: &str = "Machinery";
pub const DIAMOND: &str = "Diamond";

pub const COMBO_CONSUMABLE: &str = "CC";
pub const HOOKS: &str = "hooks";
pub const GOLD: &str = "Gold";
pub const MAGIC_ESSENCE: &str = "ME";

pub const RESOURCE_KEYS: [&str; 7] = [
    MALLETS, T1_CHEESE, T2_CHEESE, T3_CHEESE, THREAD, MACHINERY, DIAMOND,
];
pub const CONSUMABLE_KEYS: [&str; 4] = [COMBO_CONSUMABLE, HOOKS, GOLD, MAGIC_ESSENCE];

/// Materials that loot multipliers never scale.
pub(crate) const UNSCALED_MATERIALS: [&str; 2] = [GOLD, DIAMOND];

// Enemy names --------------------------------------------------------------
pub const T1_MOUSE: &str = "T1 mouse";
pub const T2_MOUSE: &str = "T2 mouse";
pub const T3_MOUSE: &str = "T3 mouse";
pub const COMMON_WEAVER_T1: &str = "Common Weaver - With T1 Cheese";
pub const COMMON_WEAVER_T2: &str = "Common Weaver - With T2 Cheese";
pub const COMMON_WEAVER_T3: &str = "Common Weaver - With T3 Cheese";
pub const MYTHWEAVER_T1: &str = "Ultimate MythWeaver - With T1 Cheese";
pub const MYTHWEAVER_T2: &str = "Ultimate MythWeaver - With T2 Cheese";
pub const MYTHWEAVER_T3: &str = "Ultimate MythWeaver - With T3 Cheese";

// Chapter structure --------------------------------------------------------
pub const CHAPTER_LENGTHS: [u32; 3] = [10, 20, 30];
pub const TOTAL_CHAPTERS: u8 = 6;
pub const POSTSCRIPT_POSITION: u8 = TOTAL_CHAPTERS + 1;
pub const DEFAULT_POSTSCRIPT_LENGTH: u32 = 10;
pub(crate) const POSTSCRIPT_EXTENSION: u32 = 3;

// Mallet fees --------------------------------------------------------------
pub const MANUAL_START_COST: f64 = 30.0;
pub const REROLL_COST: f64 = 3.0;
pub const EXTEND_POSTSCRIPT_COST: f64 = 30.0;

// Notoriety ----------------------------------------------------------------
pub const NOTORIETY_MIN: i32 = 0;
pub const NOTORIETY_MAX: i32 = 200;
pub const FANTASY_UNLOCK_THRESHOLD: i32 = 80;
pub(crate) const FANTASY_NOTORIETY_PENALTY: i32 = 20;
pub(crate) const RIVAL_NOTORIETY_DECAY: i32 = 1;

// Hunting ------------------------------------------------------------------
pub(crate) const COMBO_MULTIPLIER: f64 = 2.0;
pub const BATCH_HUNT_SIZE: u32 = 10;

// Presentation defaults ----------------------------------------------------
pub(crate) const DEFAULT_SFX_VOLUME: f32 = 0.25;

//! Hunt orchestration: cheese in, pages, notoriety and loot out.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chapter::{complete_chapter, finish_postscript};
use crate::constants::{
    BATCH_HUNT_SIZE, COMBO_CONSUMABLE, COMBO_MULTIPLIER, FANTASY_NOTORIETY_PENALTY,
    NOTORIETY_MAX, NOTORIETY_MIN, RIVAL_NOTORIETY_DECAY, TOTAL_CHAPTERS,
};
use crate::error::{SimError, SimResult};
use crate::feedback::{Feedback, LogTag, SoundCue};
use crate::loot::{LootLines, apply_loot, describe_loot};
use crate::numbers::u64_to_f64;
use crate::state::{CheeseTier, GameState, Genre, RunPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HuntBlockReason {
    NotStarted,
    ChoicePending,
    NoCheeseSelected,
    IneligiblePhase,
    NoActiveChapter,
    OutOfCheese,
}

impl fmt::Display for HuntBlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "no run in progress",
            Self::ChoicePending => "pick the next chapter first",
            Self::NoCheeseSelected => "no cheese tier selected",
            Self::IneligiblePhase => "the current phase does not allow hunting",
            Self::NoActiveChapter => "no active chapter",
            Self::OutOfCheese => "not enough cheese of that tier",
        })
    }
}

/// Phase change triggered by the hunt that filled the target length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HuntTransition {
    ChapterComplete { number: u8 },
    PostscriptEntered,
    RunComplete,
}

/// What a single hunt produced, for logging and presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntReport {
    pub genre: Genre,
    pub enemy: String,
    pub tier: CheeseTier,
    pub multiplier: f64,
    pub loot: LootLines,
    pub transition: Option<HuntTransition>,
}

impl HuntReport {
    /// Journal line in the form `[Genre] - Get a [enemy] with [tier]; drops: ...`.
    #[must_use]
    pub fn log_line(&self) -> String {
        format!(
            "[{}] - Get a [{}] with [{}]; drops: {}",
            self.genre,
            self.enemy,
            self.tier,
            describe_loot(&self.loot)
        )
    }
}

/// First unmet precondition for hunting with `tier`, if any.
#[must_use]
pub fn hunt_block_reason(state: &GameState, tier: Option<CheeseTier>) -> Option<HuntBlockReason> {
    if state.is_idle() {
        return Some(HuntBlockReason::NotStarted);
    }
    if !state.pending_chapter_choices.is_empty()
        && !state.pending_choices_locked
        && state.chapter_position <= TOTAL_CHAPTERS
    {
        return Some(HuntBlockReason::ChoicePending);
    }
    let Some(tier) = tier else {
        return Some(HuntBlockReason::NoCheeseSelected);
    };
    if !matches!(
        state.phase(),
        RunPhase::Chapter { .. } | RunPhase::Postscript
    ) {
        return Some(HuntBlockReason::IneligiblePhase);
    }
    match state.target_length() {
        Some(length) if length > 0 => {}
        _ => return Some(HuntBlockReason::NoActiveChapter),
    }
    if !state.in_postscript() && state.current_chapter_genre.is_none() {
        return Some(HuntBlockReason::NoActiveChapter);
    }
    if state.resource(tier.resource_key()) < 1.0 {
        return Some(HuntBlockReason::OutOfCheese);
    }
    None
}

/// Preconditions for a ten-hunt batch on top of the single-hunt checks.
#[must_use]
pub fn batch_available(state: &GameState, tier: CheeseTier) -> bool {
    let needed = f64::from(BATCH_HUNT_SIZE);
    hunt_block_reason(state, Some(tier)).is_none()
        && state.resource(tier.resource_key()) >= needed
        && state
            .remaining_progress()
            .is_some_and(|remaining| remaining >= BATCH_HUNT_SIZE)
}

/// Weighted draw over accumulated pages; uniform over every genre when no pages exist.
pub fn draw_postscript_genre<R: Rng + ?Sized>(state: &GameState, rng: &mut R) -> Genre {
    let weighted: Vec<(Genre, f64)> = Genre::ALL
        .iter()
        .map(|genre| (*genre, f64::from(state.pages_of(*genre))))
        .filter(|(_, weight)| *weight > 0.0)
        .collect();
    let total: f64 = weighted.iter().map(|(_, weight)| weight).sum();
    if weighted.is_empty() || total <= 0.0 {
        return Genre::ALL.choose(rng).copied().unwrap_or(Genre::Romance);
    }
    let pick = rng.gen_range(0.0..=total);
    let mut cumulative = 0.0;
    for (genre, weight) in &weighted {
        cumulative += weight;
        if pick <= cumulative {
            return *genre;
        }
    }
    weighted
        .last()
        .map_or(Genre::Romance, |(genre, _)| *genre)
}

fn apply_postscript_notoriety(state: &mut GameState, drawn: Genre, tier: CheeseTier) {
    if drawn.is_bonus() {
        for value in state.notoriety.values_mut() {
            *value = (*value - FANTASY_NOTORIETY_PENALTY).max(NOTORIETY_MIN);
        }
        return;
    }
    for (genre, value) in &mut state.notoriety {
        if *genre == drawn {
            *value = (*value + tier.notoriety_gain()).clamp(NOTORIETY_MIN, NOTORIETY_MAX);
        } else if *value > RIVAL_NOTORIETY_DECAY {
            *value -= RIVAL_NOTORIETY_DECAY;
        }
    }
}

/// Spend one cheese of `tier` and resolve the hunt against the active chapter or postscript.
///
/// # Errors
///
/// Returns [`SimError::Hunt`] with the first unmet precondition.
pub fn perform_hunt<R: Rng + ?Sized>(
    state: &mut GameState,
    tier: Option<CheeseTier>,
    combo_enabled: bool,
    rng: &mut R,
    feedback: &mut Feedback,
) -> SimResult<HuntReport> {
    if let Some(reason) = hunt_block_reason(state, tier) {
        return Err(SimError::Hunt(reason));
    }
    let Some(tier) = tier else {
        return Err(SimError::Hunt(HuntBlockReason::NoCheeseSelected));
    };

    state.add_material(tier.resource_key(), -1.0);
    state.current_chapter_progress = state.current_chapter_progress.saturating_add(1);
    state.total_hunts = state.total_hunts.saturating_add(1);
    state.current_run_hunts = state.current_run_hunts.saturating_add(1);

    let multiplier = if combo_enabled {
        state.add_material(COMBO_CONSUMABLE, -1.0);
        COMBO_MULTIPLIER
    } else {
        1.0
    };

    let postscript = state.in_postscript();
    let (genre, enemy) = if postscript {
        let genre = draw_postscript_genre(state, rng);
        let enemy = if genre.is_bonus() {
            tier.ultimate_enemy()
        } else {
            tier.postscript_enemy()
        };
        apply_postscript_notoriety(state, genre, tier);
        (genre, enemy)
    } else {
        let genre = state
            .current_chapter_genre
            .ok_or(SimError::Hunt(HuntBlockReason::NoActiveChapter))?;
        let pages = state.genre_pages.entry(genre).or_insert(0);
        *pages = pages.saturating_add(tier.page_gain());
        (genre, tier.chapter_enemy())
    };
    let loot = apply_loot(state, enemy, multiplier);

    let mut report = HuntReport {
        genre,
        enemy: enemy.to_string(),
        tier,
        multiplier,
        loot,
        transition: None,
    };
    log::debug!(
        "hunt #{} ({}): {}",
        state.total_hunts,
        state.phase(),
        report.log_line()
    );
    feedback.cue(SoundCue::CopyMessage);
    if postscript {
        feedback.tagged(report.log_line(), LogTag::Postscript);
    } else {
        feedback.note(report.log_line());
    }

    let target = state.target_length().unwrap_or(0);
    if state.current_chapter_progress >= target {
        report.transition = Some(if postscript {
            finish_postscript(state, feedback);
            HuntTransition::RunComplete
        } else {
            let number = state.chapter_position;
            complete_chapter(state, rng, feedback);
            if state.in_postscript() {
                HuntTransition::PostscriptEntered
            } else {
                HuntTransition::ChapterComplete { number }
            }
        });
    }
    Ok(report)
}

/// Average loot-per-hunt figure used by summaries.
#[must_use]
pub fn diamonds_per_hundred_hunts(state: &GameState) -> f64 {
    if state.total_hunts == 0 {
        return 0.0;
    }
    state.total_diamonds_gain * 100.0 / u64_to_f64(state.total_hunts)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::field_reassign_with_default)]

    use super::*;
    use crate::chapter::{enter_postscript, start_random_run};
    use crate::constants::{DIAMOND, GOLD, POSTSCRIPT_POSITION, T1_CHEESE, THREAD};
    use crate::state::ChapterChoice;
    use rand::SeedableRng;
    use rand::rngs::mock::StepRng;
    use rand_chacha::ChaCha20Rng;

    fn chapter_state(length: u32, genre: Genre, cheese: f64) -> GameState {
        let mut state = GameState::default();
        state.chapter_position = 1;
        state.current_chapter_length = Some(length);
        state.current_chapter_genre = Some(genre);
        state.pending_chapter_choices.push(ChapterChoice::new(10, Genre::Comedy));
        state.pending_chapter_choices.push(ChapterChoice::new(20, Genre::Tragedy));
        state.pending_chapter_choices.push(ChapterChoice::new(30, Genre::Suspense));
        state.pending_choices_locked = true;
        state.resources.insert(T1_CHEESE.to_string(), cheese);
        state
    }

    fn postscript_state(cheese: f64) -> GameState {
        let mut state = GameState::default();
        state.chapter_position = POSTSCRIPT_POSITION;
        state.resources.insert(T1_CHEESE.to_string(), cheese);
        state
    }

    #[test]
    fn preconditions_are_reported_in_order() {
        let idle = GameState::default();
        assert_eq!(
            hunt_block_reason(&idle, Some(CheeseTier::T1)),
            Some(HuntBlockReason::NotStarted)
        );

        let mut pending = chapter_state(10, Genre::Romance, 5.0);
        pending.pending_choices_locked = false;
        assert_eq!(
            hunt_block_reason(&pending, Some(CheeseTier::T1)),
            Some(HuntBlockReason::ChoicePending)
        );

        let active = chapter_state(10, Genre::Romance, 5.0);
        assert_eq!(
            hunt_block_reason(&active, None),
            Some(HuntBlockReason::NoCheeseSelected)
        );
        assert_eq!(
            hunt_block_reason(&active, Some(CheeseTier::T2)),
            Some(HuntBlockReason::OutOfCheese)
        );
        assert_eq!(hunt_block_reason(&active, Some(CheeseTier::T1)), None);

        let mut between = active.clone();
        between.current_chapter_length = None;
        between.pending_chapter_choices.clear();
        assert_eq!(
            hunt_block_reason(&between, Some(CheeseTier::T1)),
            Some(HuntBlockReason::NoActiveChapter)
        );
    }

    #[test]
    fn positions_past_the_postscript_cannot_hunt() {
        let mut stray = chapter_state(10, Genre::Romance, 5.0);
        stray.chapter_position = 9;
        assert_eq!(
            hunt_block_reason(&stray, Some(CheeseTier::T1)),
            Some(HuntBlockReason::IneligiblePhase)
        );

        let before = stray.clone();
        let err = perform_hunt(
            &mut stray,
            Some(CheeseTier::T1),
            false,
            &mut StepRng::new(0, 0),
            &mut Feedback::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SimError::Hunt(HuntBlockReason::IneligiblePhase)
        ));
        assert_eq!(stray, before);
    }

    #[test]
    fn rejected_hunt_leaves_state_untouched() {
        let mut state = chapter_state(10, Genre::Romance, 0.0);
        let before = state.clone();
        let mut rng = StepRng::new(0, 0);
        let err = perform_hunt(
            &mut state,
            Some(CheeseTier::T1),
            true,
            &mut rng,
            &mut Feedback::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::Hunt(HuntBlockReason::OutOfCheese)));
        assert_eq!(state, before);
    }

    #[test]
    fn chapter_hunt_grants_pages_and_mouse_loot() {
        let mut state = chapter_state(10, Genre::Romance, 3.0);
        let mut rng = StepRng::new(0, 0);
        let mut feedback = Feedback::default();
        let report = perform_hunt(
            &mut state,
            Some(CheeseTier::T1),
            false,
            &mut rng,
            &mut feedback,
        )
        .unwrap();
        assert_eq!(report.enemy, "T1 mouse");
        assert_eq!(report.genre, Genre::Romance);
        assert_eq!(state.pages_of(Genre::Romance), 25);
        assert_eq!(state.current_chapter_progress, 1);
        assert_eq!(state.total_hunts, 1);
        assert!((state.resource(T1_CHEESE) - 2.0).abs() < f64::EPSILON);
        assert!((state.resource(THREAD) - 1.54).abs() < f64::EPSILON);
        assert!((state.consumable(GOLD) - 7500.0).abs() < f64::EPSILON);
        assert_eq!(
            report.log_line(),
            "[Romance] - Get a [T1 mouse] with [T1]; drops: Thread +1.54, Gold +7500"
        );
        assert!(feedback.has_cue(SoundCue::CopyMessage));
    }

    #[test]
    fn combo_doubles_scaled_loot_and_allows_debt() {
        let mut state = chapter_state(10, Genre::Comedy, 3.0);
        let mut rng = StepRng::new(0, 0);
        perform_hunt(
            &mut state,
            Some(CheeseTier::T1),
            true,
            &mut rng,
            &mut Feedback::default(),
        )
        .unwrap();
        assert!((state.consumable(COMBO_CONSUMABLE) + 1.0).abs() < f64::EPSILON);
        assert!((state.resource(THREAD) - 3.08).abs() < 1e-9);
        assert!((state.consumable(GOLD) - 7500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ten_hunts_complete_a_ten_page_chapter() {
        let mut state = GameState::default();
        state.resources.insert(T1_CHEESE.to_string(), 10.0);
        let mut rng = StepRng::new(0, 0);
        let mut feedback = Feedback::default();
        start_random_run(&mut state, &mut rng, &mut feedback).unwrap();
        assert_eq!(state.current_chapter_length, Some(10));

        let mut last = None;
        for _ in 0..10 {
            let report = perform_hunt(
                &mut state,
                Some(CheeseTier::T1),
                false,
                &mut rng,
                &mut feedback,
            )
            .unwrap();
            last = report.transition;
        }
        assert_eq!(last, Some(HuntTransition::ChapterComplete { number: 1 }));
        assert_eq!(state.current_chapter_progress, 0);
        assert_eq!(state.current_chapter_length, None);
        assert!(!state.pending_choices_locked);
        assert_eq!(state.pages_of(Genre::Romance), 250);
        assert_eq!(
            hunt_block_reason(&state, Some(CheeseTier::T1)),
            Some(HuntBlockReason::ChoicePending)
        );
    }

    #[test]
    fn last_chapter_completion_enters_postscript() {
        let mut state = chapter_state(10, Genre::Tragedy, 1.0);
        state.chapter_position = TOTAL_CHAPTERS;
        state.pending_chapter_choices.clear();
        state.pending_choices_locked = false;
        state.current_chapter_progress = 9;
        let mut feedback = Feedback::default();
        let report = perform_hunt(
            &mut state,
            Some(CheeseTier::T1),
            false,
            &mut StepRng::new(0, 0),
            &mut feedback,
        )
        .unwrap();
        assert_eq!(report.transition, Some(HuntTransition::PostscriptEntered));
        assert!(state.in_postscript());
        assert!(feedback.has_cue(SoundCue::Completion));
    }

    #[test]
    fn postscript_draw_follows_page_weights() {
        let mut state = postscript_state(0.0);
        state.genre_pages.insert(Genre::Comedy, 100);
        let mut rng = ChaCha20Rng::seed_from_u64(17);
        for _ in 0..20 {
            assert_eq!(draw_postscript_genre(&state, &mut rng), Genre::Comedy);
        }

        state.genre_pages.insert(Genre::Romance, 50);
        let mut zero = StepRng::new(0, 0);
        assert_eq!(draw_postscript_genre(&state, &mut zero), Genre::Romance);
    }

    #[test]
    fn postscript_without_pages_draws_uniformly() {
        let state = postscript_state(0.0);
        let mut zero = StepRng::new(0, 0);
        assert_eq!(draw_postscript_genre(&state, &mut zero), Genre::Romance);
    }

    #[test]
    fn postscript_hunt_shifts_notoriety() {
        let mut state = postscript_state(2.0);
        state.genre_pages.insert(Genre::Adventure, 25);
        state.set_notoriety(Genre::Adventure, 190);
        state.set_notoriety(Genre::Comedy, 1);
        state.set_notoriety(Genre::Tragedy, 40);
        let mut feedback = Feedback::default();
        let report = perform_hunt(
            &mut state,
            Some(CheeseTier::T1),
            false,
            &mut StepRng::new(0, 0),
            &mut feedback,
        )
        .unwrap();
        assert_eq!(report.genre, Genre::Adventure);
        assert_eq!(report.enemy, "Common Weaver - With T1 Cheese");
        assert_eq!(state.notoriety_of(Genre::Adventure), NOTORIETY_MAX);
        assert_eq!(state.notoriety_of(Genre::Comedy), 1);
        assert_eq!(state.notoriety_of(Genre::Tragedy), 39);
        assert_eq!(state.notoriety_of(Genre::Romance), 0);
        assert_eq!(state.pages_of(Genre::Adventure), 25);
    }

    #[test]
    fn fantasy_draw_summons_the_mythweaver() {
        let mut state = postscript_state(1.0);
        state.genre_pages.insert(Genre::Fantasy, 125);
        for genre in Genre::BASE {
            state.set_notoriety(genre, 15);
        }
        state.set_notoriety(Genre::Suspense, 150);
        let report = perform_hunt(
            &mut state,
            Some(CheeseTier::T1),
            false,
            &mut StepRng::new(0, 0),
            &mut Feedback::default(),
        )
        .unwrap();
        assert_eq!(report.enemy, "Ultimate MythWeaver - With T1 Cheese");
        assert_eq!(state.notoriety_of(Genre::Romance), 0);
        assert_eq!(state.notoriety_of(Genre::Suspense), 130);
        assert!((state.resource(DIAMOND) - 1.0).abs() < f64::EPSILON);
        assert!((state.total_diamonds_gain - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn filling_the_postscript_ends_the_run() {
        let mut state = postscript_state(5.0);
        state.postscript_length = 1;
        state.total_hunts = 99;
        let mut feedback = Feedback::default();
        let report = perform_hunt(
            &mut state,
            Some(CheeseTier::T1),
            false,
            &mut StepRng::new(0, 0),
            &mut feedback,
        )
        .unwrap();
        assert_eq!(report.transition, Some(HuntTransition::RunComplete));
        assert!(state.is_idle());
        assert_eq!(state.total_hunts, 100);
        assert_eq!(state.current_run_hunts, 0);
    }

    #[test]
    fn notoriety_stays_in_bounds_over_many_hunts() {
        let mut state = postscript_state(10_000.0);
        state.postscript_length = 5_000;
        state.genre_pages.insert(Genre::Comedy, 300);
        state.genre_pages.insert(Genre::Fantasy, 100);
        state.genre_pages.insert(Genre::Tragedy, 50);
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        for _ in 0..2_000 {
            perform_hunt(
                &mut state,
                Some(CheeseTier::T1),
                true,
                &mut rng,
                &mut Feedback::default(),
            )
            .unwrap();
            assert!(
                state
                    .notoriety
                    .values()
                    .all(|v| (NOTORIETY_MIN..=NOTORIETY_MAX).contains(v))
            );
        }
    }

    #[test]
    fn batch_requires_cheese_and_room() {
        let mut state = chapter_state(10, Genre::Romance, 10.0);
        assert!(batch_available(&state, CheeseTier::T1));
        state.current_chapter_progress = 1;
        assert!(!batch_available(&state, CheeseTier::T1));
        state.current_chapter_progress = 0;
        state.resources.insert(T1_CHEESE.to_string(), 9.0);
        assert!(!batch_available(&state, CheeseTier::T1));
    }

    #[test]
    fn postscript_entry_keeps_hunting_eligible() {
        let mut state = postscript_state(1.0);
        enter_postscript(&mut state, &mut Feedback::default());
        assert_eq!(hunt_block_reason(&state, Some(CheeseTier::T1)), None);
    }

    #[test]
    fn diamond_rate_is_zero_before_hunting() {
        let mut state = GameState::default();
        assert!(diamonds_per_hundred_hunts(&state).abs() < f64::EPSILON);
        state.total_hunts = 50;
        state.total_diamonds_gain = 2.0;
        assert!((diamonds_per_hundred_hunts(&state) - 4.0).abs() < f64::EPSILON);
    }
}

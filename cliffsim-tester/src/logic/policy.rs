use std::fmt;
use std::str::FromStr;

use cliffsim_game::constants::{EXTEND_POSTSCRIPT_COST, REROLL_COST};
use cliffsim_game::{CheeseTier, GameState};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Decision returned by a [`ChapterPolicy`] while chapter choices are pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterDecision {
    Choose {
        index: usize,
        rationale: Option<String>,
    },
    Reroll,
}

impl ChapterDecision {
    #[must_use]
    pub fn choose(index: usize, rationale: impl Into<String>) -> Self {
        Self::Choose {
            index,
            rationale: Some(rationale.into()),
        }
    }
}

/// Policy interface for automated play.
pub trait ChapterPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Tier to hunt with next; `None` when nothing is stocked.
    fn pick_tier(&mut self, state: &GameState) -> Option<CheeseTier>;

    /// Pick one of the pending chapter choices, or pay for a reroll.
    fn pick_chapter(&mut self, state: &GameState) -> ChapterDecision;

    fn wants_batch(&self) -> bool {
        false
    }

    fn wants_extension(&mut self, _state: &GameState) -> bool {
        false
    }
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Sprinter,
    Collector,
    Balanced,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Sprinter, Self::Collector, Self::Balanced, Self::Random];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sprinter => "Sprinter",
            Self::Collector => "Collector",
            Self::Balanced => "Balanced",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sprinter => "sprinter",
            Self::Collector => "collector",
            Self::Balanced => "balanced",
            Self::Random => "random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn ChapterPolicy + Send> {
        match self {
            Self::Sprinter => Box::new(SprinterPolicy),
            Self::Collector => Box::new(CollectorPolicy),
            Self::Balanced => Box::new(BalancedPolicy::default()),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

fn stocked_tiers(state: &GameState) -> Vec<CheeseTier> {
    CheeseTier::ALL
        .into_iter()
        .filter(|tier| state.resource(tier.resource_key()) >= 1.0)
        .collect()
}

fn pick_by_length(state: &GameState, longest: bool) -> ChapterDecision {
    let choices = &state.pending_chapter_choices;
    let best = choices.iter().enumerate().reduce(|best, candidate| {
        let better = if longest {
            candidate.1.length > best.1.length
        } else {
            candidate.1.length < best.1.length
        };
        if better { candidate } else { best }
    });
    match best {
        Some((index, choice)) => ChapterDecision::choose(index, format!("{choice}")),
        None => ChapterDecision::choose(0, "no choices offered"),
    }
}

/// Cheapest cheese, shortest chapters, batches whenever possible.
struct SprinterPolicy;

/// Best cheese, longest chapters, always extends the postscript.
struct CollectorPolicy;

/// Spreads pages across genres, rerolling once when a set is one-note.
#[derive(Default)]
struct BalancedPolicy {
    rerolled: bool,
}

struct RandomPolicy {
    rng: ChaCha20Rng,
    rerolls_in_a_row: u32,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            rerolls_in_a_row: 0,
        }
    }
}

impl ChapterPolicy for SprinterPolicy {
    fn name(&self) -> &'static str {
        "Sprinter"
    }

    fn pick_tier(&mut self, state: &GameState) -> Option<CheeseTier> {
        stocked_tiers(state).first().copied()
    }

    fn pick_chapter(&mut self, state: &GameState) -> ChapterDecision {
        pick_by_length(state, false)
    }

    fn wants_batch(&self) -> bool {
        true
    }
}

impl ChapterPolicy for CollectorPolicy {
    fn name(&self) -> &'static str {
        "Collector"
    }

    fn pick_tier(&mut self, state: &GameState) -> Option<CheeseTier> {
        stocked_tiers(state).last().copied()
    }

    fn pick_chapter(&mut self, state: &GameState) -> ChapterDecision {
        pick_by_length(state, true)
    }

    fn wants_extension(&mut self, state: &GameState) -> bool {
        state.mallets() >= EXTEND_POSTSCRIPT_COST
    }
}

impl ChapterPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "Balanced"
    }

    fn pick_tier(&mut self, state: &GameState) -> Option<CheeseTier> {
        let stocked = stocked_tiers(state);
        stocked
            .iter()
            .copied()
            .find(|tier| *tier == CheeseTier::T2)
            .or_else(|| stocked.first().copied())
    }

    fn pick_chapter(&mut self, state: &GameState) -> ChapterDecision {
        let choices = &state.pending_chapter_choices;
        let one_note = choices
            .first()
            .is_some_and(|first| choices.iter().all(|choice| choice.genre == first.genre));
        if one_note && !self.rerolled && state.mallets() >= REROLL_COST {
            self.rerolled = true;
            return ChapterDecision::Reroll;
        }
        self.rerolled = false;

        let best = choices
            .iter()
            .enumerate()
            .min_by_key(|(_, choice)| (state.pages_of(choice.genre), choice.length));
        match best {
            Some((index, choice)) => ChapterDecision::choose(
                index,
                format!("{} has {} pages", choice.genre, state.pages_of(choice.genre)),
            ),
            None => ChapterDecision::choose(0, "no choices offered"),
        }
    }
}

impl ChapterPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_tier(&mut self, state: &GameState) -> Option<CheeseTier> {
        stocked_tiers(state).choose(&mut self.rng).copied()
    }

    fn pick_chapter(&mut self, state: &GameState) -> ChapterDecision {
        let can_reroll = state.mallets() >= REROLL_COST && self.rerolls_in_a_row < 2;
        if can_reroll && self.rng.gen_range(0..4) == 0 {
            self.rerolls_in_a_row += 1;
            return ChapterDecision::Reroll;
        }
        self.rerolls_in_a_row = 0;
        let count = state.pending_chapter_choices.len().max(1);
        ChapterDecision::choose(self.rng.gen_range(0..count), "random pick")
    }

    fn wants_extension(&mut self, state: &GameState) -> bool {
        state.mallets() >= EXTEND_POSTSCRIPT_COST && self.rng.gen_bool(0.5)
    }
}

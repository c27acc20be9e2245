//! Run and chapter lifecycle: idle → chapters → postscript → idle.

use rand::Rng;
use rand::seq::SliceRandom;
use smallvec::SmallVec;

use crate::constants::{
    CHAPTER_LENGTHS, DEFAULT_POSTSCRIPT_LENGTH, EXTEND_POSTSCRIPT_COST, MANUAL_START_COST,
    POSTSCRIPT_EXTENSION, POSTSCRIPT_POSITION, REROLL_COST, TOTAL_CHAPTERS,
};
use crate::error::{SimError, SimResult};
use crate::feedback::{Feedback, LogTag, SoundCue};
use crate::numbers::format_amount;
use crate::state::{ChapterChoice, ChoiceSet, GameState, Genre, empty_pages};

/// Draw one choice per length tier, taking genres from a shuffled pool that
/// is refilled whenever it runs dry.
pub fn generate_choices<R: Rng + ?Sized>(genres: &[Genre], rng: &mut R) -> ChoiceSet {
    let mut choices = ChoiceSet::new();
    if genres.is_empty() {
        return choices;
    }
    let mut pool: SmallVec<[Genre; 6]> = SmallVec::new();
    for length in CHAPTER_LENGTHS {
        if pool.is_empty() {
            pool.extend_from_slice(genres);
            pool.shuffle(rng);
        }
        if let Some(genre) = pool.pop() {
            choices.push(ChapterChoice::new(length, genre));
        }
    }
    choices
}

fn describe_choices(choices: &[ChapterChoice]) -> String {
    choices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Reset every per-run field and freeze bonus-genre eligibility for the run.
fn reset_for_new_run(state: &mut GameState) {
    state.genre_pages = empty_pages();
    state.current_run_hunts = 0;
    state.chapter_position = 0;
    state.current_chapter_length = None;
    state.current_chapter_genre = None;
    state.current_chapter_progress = 0;
    state.postscript_length = DEFAULT_POSTSCRIPT_LENGTH;
    state.pending_chapter_choices.clear();
    state.pending_choices_locked = false;
    state.postscript_extended = false;
    state.run_mallets_spent = 0.0;
    state.run_fantasy_available = state.fantasy_unlocked();
}

/// Start a run with a randomly drawn first chapter.
///
/// # Errors
///
/// Returns [`SimError::RunInProgress`] unless the state is idle.
pub fn start_random_run<R: Rng + ?Sized>(
    state: &mut GameState,
    rng: &mut R,
    feedback: &mut Feedback,
) -> SimResult<ChapterChoice> {
    if !state.is_idle() {
        return Err(SimError::RunInProgress);
    }
    reset_for_new_run(state);
    let genres = state.run_genres();
    let length = CHAPTER_LENGTHS
        .choose(rng)
        .copied()
        .unwrap_or(CHAPTER_LENGTHS[0]);
    let genre = genres.choose(rng).copied().unwrap_or(Genre::Romance);
    if state.run_fantasy_available {
        feedback.note("Fantasy is unlocked for this run.");
    }
    let first = ChapterChoice::new(length, genre);
    begin_chapter(state, 1, first, rng, feedback);
    Ok(first)
}

/// Start a run with a hand-picked first chapter, paying the mallet fee.
///
/// # Errors
///
/// Rejects mid-run calls, short mallet balances, off-tier lengths and a locked
/// bonus genre, checked in that order.
pub fn start_manual_run<R: Rng + ?Sized>(
    state: &mut GameState,
    choice: ChapterChoice,
    rng: &mut R,
    feedback: &mut Feedback,
) -> SimResult<()> {
    if !state.is_idle() {
        return Err(SimError::RunInProgress);
    }
    let available = state.mallets();
    if available < MANUAL_START_COST {
        return Err(SimError::NotEnoughMallets {
            needed: MANUAL_START_COST,
            available,
        });
    }
    if !GameState::is_valid_chapter_length(choice.length) {
        return Err(SimError::InvalidChapterLength(choice.length));
    }
    reset_for_new_run(state);
    if choice.genre.is_bonus() && !state.run_fantasy_available {
        return Err(SimError::FantasyLocked(choice.genre));
    }
    state.spend_mallets(MANUAL_START_COST)?;
    feedback.cue(SoundCue::ButtonClick);
    feedback.note(format!(
        "Spent {} mallets to pick the opening chapter.",
        format_amount(MANUAL_START_COST)
    ));
    begin_chapter(state, 1, choice, rng, feedback);
    Ok(())
}

/// Open chapter `number`. Every chapter but the last pre-rolls its successors and locks them.
pub fn begin_chapter<R: Rng + ?Sized>(
    state: &mut GameState,
    number: u8,
    choice: ChapterChoice,
    rng: &mut R,
    feedback: &mut Feedback,
) {
    state.chapter_position = number;
    state.current_chapter_length = Some(choice.length);
    state.current_chapter_genre = Some(choice.genre);
    state.current_chapter_progress = 0;
    if number < TOTAL_CHAPTERS {
        let genres = state.run_genres();
        state.pending_chapter_choices = generate_choices(&genres, rng);
        state.pending_choices_locked = true;
    } else {
        state.pending_chapter_choices.clear();
        state.pending_choices_locked = false;
    }
    log::info!("chapter {number} begins: {choice}");
    feedback.note(format!(
        "Chapter {number}/{TOTAL_CHAPTERS} begins: {} pages of {}.",
        choice.length, choice.genre
    ));
}

/// Close the active chapter, moving on to the postscript after the last one.
pub fn complete_chapter<R: Rng + ?Sized>(
    state: &mut GameState,
    rng: &mut R,
    feedback: &mut Feedback,
) {
    let finished = state.chapter_position;
    if finished >= TOTAL_CHAPTERS {
        enter_postscript(state, feedback);
        return;
    }
    state.current_chapter_length = None;
    state.current_chapter_genre = None;
    state.current_chapter_progress = 0;
    state.pending_choices_locked = false;
    if state.pending_chapter_choices.is_empty() {
        let genres = state.run_genres();
        state.pending_chapter_choices = generate_choices(&genres, rng);
    }
    log::info!("chapter {finished} complete");
    feedback.note(format!(
        "Chapter {finished} complete. Next chapter options: {}",
        describe_choices(&state.pending_chapter_choices)
    ));
}

/// Take one of the offered chapters as the next one.
///
/// # Errors
///
/// Rejects when nothing is offered, the offer is still locked, or `index` is out of range.
pub fn choose_next_chapter<R: Rng + ?Sized>(
    state: &mut GameState,
    index: usize,
    rng: &mut R,
    feedback: &mut Feedback,
) -> SimResult<ChapterChoice> {
    if state.pending_chapter_choices.is_empty() {
        return Err(SimError::NoPendingChoices);
    }
    if state.pending_choices_locked {
        return Err(SimError::ChoicesLocked);
    }
    let choice = state
        .pending_chapter_choices
        .get(index)
        .copied()
        .ok_or(SimError::ChoiceNotOffered(index))?;
    let next = state.chapter_position.saturating_add(1).min(TOTAL_CHAPTERS);
    begin_chapter(state, next, choice, rng, feedback);
    Ok(choice)
}

/// Replace the offered chapters for a mallet fee.
///
/// # Errors
///
/// Rejects when nothing is offered or mallets are short.
pub fn reroll_choices<R: Rng + ?Sized>(
    state: &mut GameState,
    rng: &mut R,
    feedback: &mut Feedback,
) -> SimResult<()> {
    if state.pending_chapter_choices.is_empty() {
        return Err(SimError::NoPendingChoices);
    }
    state.spend_mallets(REROLL_COST)?;
    let genres = state.run_genres();
    state.pending_chapter_choices = generate_choices(&genres, rng);
    feedback.cue(SoundCue::ButtonClick);
    feedback.note(format!(
        "Spent {} mallets to reroll. Next chapter options: {}",
        format_amount(REROLL_COST),
        describe_choices(&state.pending_chapter_choices)
    ));
    Ok(())
}

pub fn enter_postscript(state: &mut GameState, feedback: &mut Feedback) {
    state.chapter_position = POSTSCRIPT_POSITION;
    state.current_chapter_length = None;
    state.current_chapter_genre = None;
    state.current_chapter_progress = 0;
    state.pending_chapter_choices.clear();
    state.pending_choices_locked = false;
    state.postscript_extended = false;
    log::info!("postscript begins ({} pages)", state.postscript_length);
    feedback.cue(SoundCue::Completion);
    feedback.tagged(
        format!(
            "All {TOTAL_CHAPTERS} chapters written. The postscript begins: {} hunts.",
            state.postscript_length
        ),
        LogTag::Postscript,
    );
}

/// Lengthen the postscript once per postscript for a mallet fee.
///
/// # Errors
///
/// Rejects outside the postscript, on a second extension, or when mallets are short.
pub fn extend_postscript(state: &mut GameState, feedback: &mut Feedback) -> SimResult<()> {
    if !state.in_postscript() {
        return Err(SimError::NotInPostscript);
    }
    if state.postscript_extended {
        return Err(SimError::PostscriptAlreadyExtended);
    }
    state.spend_mallets(EXTEND_POSTSCRIPT_COST)?;
    state.postscript_length = state.postscript_length.saturating_add(POSTSCRIPT_EXTENSION);
    state.postscript_extended = true;
    feedback.cue(SoundCue::ButtonClick);
    feedback.tagged(
        format!(
            "Spent {} mallets: postscript extended to {} hunts.",
            format_amount(EXTEND_POSTSCRIPT_COST),
            state.postscript_length
        ),
        LogTag::Postscript,
    );
    Ok(())
}

/// Return to idle. Lifetime counters survive; everything scoped to the run is cleared.
pub fn finish_postscript(state: &mut GameState, feedback: &mut Feedback) {
    let run_hunts = state.current_run_hunts;
    let run_mallets = state.run_mallets_spent;
    state.chapter_position = 0;
    state.current_chapter_length = None;
    state.current_chapter_genre = None;
    state.current_chapter_progress = 0;
    state.postscript_length = DEFAULT_POSTSCRIPT_LENGTH;
    state.pending_chapter_choices.clear();
    state.pending_choices_locked = false;
    state.run_fantasy_available = false;
    state.current_run_hunts = 0;
    state.genre_pages = empty_pages();
    state.run_mallets_spent = 0.0;
    log::info!("run complete after {run_hunts} hunts");
    feedback.tagged(
        format!(
            "Run complete: {run_hunts} hunts, {} mallets spent.",
            format_amount(run_mallets)
        ),
        LogTag::RunComplete,
    );
}

use std::hash::Hasher;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cliffsim_game::constants::{
    COMBO_CONSUMABLE, GOLD, HOOKS, MALLETS, T1_CHEESE, T2_CHEESE, T3_CHEESE,
};
use cliffsim_game::{
    GameState, HuntTransition, SimResult, SnapshotStorage, StorySession, find_recipe,
};
use twox_hash::XxHash64;

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{
    SimulationConfig, SimulationSession, StepAction, TurnOutcome, invariant_violations,
};
use crate::storage::FileSnapshotStore;

pub const DEFAULT_MAX_STEPS: u32 = 2_000;

const BULK_CHEESE_RECIPE: &str = "6 hook + 16000 Gold → 2 T1 cheese";

/// Setup hook applied to a fresh session before play begins.
pub type SessionSetup = fn(&mut StorySession) -> SimResult<()>;

#[must_use]
pub fn default_policy_setup(strategy: GameplayStrategy) -> SessionSetup {
    match strategy {
        GameplayStrategy::Sprinter => sprinter_setup,
        GameplayStrategy::Collector => collector_setup,
        GameplayStrategy::Balanced | GameplayStrategy::Random => base_setup,
    }
}

/// Stock the larder through the same edit and crafting paths a player uses.
fn base_setup(session: &mut StorySession) -> SimResult<()> {
    session.edit_consumable(GOLD, 40_000.0)?;
    session.edit_consumable(HOOKS, 12.0)?;
    if let Some(recipe) = find_recipe(BULK_CHEESE_RECIPE) {
        session.craft(recipe, 2)?;
    }
    session.edit_resource(T1_CHEESE, session.state().resource(T1_CHEESE) + 400.0)?;
    session.edit_resource(T2_CHEESE, 200.0)?;
    session.edit_resource(T3_CHEESE, 60.0)?;
    session.edit_resource(MALLETS, 120.0)?;
    session.edit_consumable(COMBO_CONSUMABLE, 200.0)?;
    Ok(())
}

fn sprinter_setup(session: &mut StorySession) -> SimResult<()> {
    base_setup(session)?;
    session.edit_resource(T1_CHEESE, 600.0)?;
    Ok(())
}

fn collector_setup(session: &mut StorySession) -> SimResult<()> {
    base_setup(session)?;
    session.edit_resource(T3_CHEESE, 250.0)?;
    Ok(())
}

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_steps: Option<u32>,
    pub combo_enabled: bool,
    pub setup: Option<SessionSetup>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_steps: None,
            combo_enabled: true,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    #[must_use]
    pub const fn with_combo(mut self, enabled: bool) -> Self {
        self.combo_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: SessionSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    /// # Errors
    ///
    /// Returns the expectation's failure.
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub turns: Vec<TurnOutcome>,
    pub final_state: GameState,
    pub journal: String,
    pub undo_depth: usize,
    pub run_completed: bool,
    pub error: Option<String>,
    pub violations: Vec<String>,
}

impl SimulationSummary {
    #[must_use]
    pub fn hunts(&self) -> u64 {
        self.final_state.total_hunts
    }

    #[must_use]
    pub fn chapters_completed(&self) -> usize {
        self.transitions()
            .filter(|t| matches!(t, HuntTransition::ChapterComplete { .. }))
            .count()
    }

    #[must_use]
    pub fn entered_postscript(&self) -> bool {
        self.transitions()
            .any(|t| *t == HuntTransition::PostscriptEntered)
    }

    #[must_use]
    pub fn count_actions(&self, predicate: impl Fn(&StepAction) -> bool) -> usize {
        self.turns.iter().filter(|turn| predicate(&turn.action)).count()
    }

    /// XxHash64 of the final state document and the journal text.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        if let Ok(json) = self.final_state.to_json_pretty() {
            hasher.write(json.as_bytes());
        }
        hasher.write(self.journal.as_bytes());
        hasher.finish()
    }

    fn transitions(&self) -> impl Iterator<Item = &HuntTransition> {
        self.turns.iter().flat_map(|turn| turn.transitions.iter())
    }
}

/// Headless deterministic runner for the story engine.
#[derive(Debug, Clone, Default)]
pub struct GameTester {
    verbose: bool,
    snapshot_dir: Option<PathBuf>,
    journal_dir: Option<PathBuf>,
}

impl GameTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self {
            verbose,
            snapshot_dir: None,
            journal_dir: None,
        }
    }

    #[must_use]
    pub fn with_snapshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.snapshot_dir = dir;
        self
    }

    #[must_use]
    pub fn with_journal_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.journal_dir = dir;
        self
    }

    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let config = SimulationConfig::new(seed)
            .with_max_steps(plan.max_steps.unwrap_or(DEFAULT_MAX_STEPS))
            .with_combo(plan.combo_enabled);
        let mut sim = SimulationSession::new(config);
        let mut turns = Vec::new();
        let mut violations = Vec::new();
        let mut error = None;

        if let Some(setup) = plan.setup
            && let Err(err) = setup(sim.session_mut())
        {
            error = Some(format!("setup failed: {err}"));
        }

        if self.verbose {
            log_initial_state(seed, plan, sim.state());
        }

        let mut policy = plan.strategy.create_policy(seed);
        let mut run_completed = false;
        while error.is_none() && !sim.out_of_steps() {
            let outcome = sim.advance(policy.as_mut());
            if self.verbose {
                log_turn(&outcome, sim.state());
            }
            for violation in invariant_violations(sim.state()) {
                violations.push(format!("step {}: {violation}", outcome.step));
            }
            error.clone_from(&outcome.error);
            run_completed = outcome.run_complete;
            turns.push(outcome);
            if run_completed {
                break;
            }
        }

        let undo_depth = sim.session().history().undo_depth();
        let session = sim.into_session();
        let journal = session.export_journal();
        SimulationSummary {
            seed,
            strategy: plan.strategy,
            turns,
            final_state: session.into_state(),
            journal,
            undo_depth,
            run_completed,
            error,
            violations,
        }
    }

    /// Write the final snapshot and journal for a run when output dirs are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if either artifact cannot be written.
    pub fn persist_artifacts(&self, label: &str, summary: &SimulationSummary) -> Result<()> {
        let name = format!("{}-seed-{}", slug(label), summary.seed);
        if let Some(dir) = &self.snapshot_dir {
            FileSnapshotStore::new(dir)
                .save_snapshot(&name, &summary.final_state)
                .with_context(|| format!("failed to save snapshot {name}"))?;
        }
        if let Some(dir) = &self.journal_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let path = dir.join(format!("{name}.log"));
            std::fs::write(&path, &summary.journal)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(())
    }
}

fn slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn log_initial_state(seed: u64, plan: &SimulationPlan, state: &GameState) {
    println!(
        "🎮 Starting simulation | seed:{seed} policy:{} combo:{}",
        plan.strategy.label(),
        plan.combo_enabled
    );
    println!(
        "🧀 Larder | T1:{} T2:{} T3:{} Mallets:{}",
        state.resource(T1_CHEESE),
        state.resource(T2_CHEESE),
        state.resource(T3_CHEESE),
        state.mallets()
    );
}

fn log_turn(outcome: &TurnOutcome, state: &GameState) {
    match &outcome.action {
        StepAction::Start => println!("📖 Step {}: run started ({})", outcome.step, state.phase()),
        StepAction::Choose { index } => println!(
            "🎯 Step {}: chose option {index} -> {}",
            outcome.step,
            outcome.rationale.as_deref().unwrap_or("-")
        ),
        StepAction::Reroll => println!("🎲 Step {}: rerolled choices", outcome.step),
        StepAction::Extend => println!("📜 Step {}: extended postscript", outcome.step),
        StepAction::Stalled(reason) => println!("⛔ Step {}: stalled ({reason})", outcome.step),
        StepAction::Hunt { .. } => {}
    }
    for transition in &outcome.transitions {
        println!(
            "📅 Step {}: {transition:?} | hunts:{} pages:{}",
            outcome.step,
            state.total_hunts,
            state.total_pages()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_run_plan(strategy: GameplayStrategy) -> SimulationPlan {
        SimulationPlan::new(strategy).with_setup(default_policy_setup(strategy))
    }

    #[test]
    fn every_strategy_finishes_a_provisioned_run() {
        let tester = GameTester::new(false);
        for strategy in GameplayStrategy::ALL {
            let summary = tester.run_plan(&full_run_plan(strategy), 1337);
            assert!(summary.run_completed, "{strategy} did not finish");
            assert!(summary.error.is_none(), "{strategy}: {:?}", summary.error);
            assert!(summary.violations.is_empty(), "{:?}", summary.violations);
            assert_eq!(summary.chapters_completed(), 5);
            assert!(summary.entered_postscript());
            assert!(summary.final_state.is_idle());
            assert!(summary.undo_depth > 0);
        }
    }

    #[test]
    fn setup_crafts_cheese_through_the_recipe() {
        let tester = GameTester::new(false);
        let plan = full_run_plan(GameplayStrategy::Balanced).with_max_steps(0);
        let summary = tester.run_plan(&plan, 7);
        assert!(summary.turns.is_empty());
        assert!((summary.final_state.resource(T1_CHEESE) - 404.0).abs() < f64::EPSILON);
        assert!(summary.final_state.consumable(HOOKS).abs() < f64::EPSILON);
        assert!(summary.journal.contains("Crafted 2 ×"));
    }

    #[test]
    fn unprovisioned_runs_stop_with_an_error() {
        let tester = GameTester::new(false);
        let summary = tester.run_plan(&SimulationPlan::new(GameplayStrategy::Sprinter), 3);
        assert!(!summary.run_completed);
        assert!(summary.error.as_deref().unwrap().contains("stalled"));
    }

    #[test]
    fn same_seed_gives_the_same_fingerprint() {
        let tester = GameTester::new(false);
        let plan = full_run_plan(GameplayStrategy::Random);
        assert_eq!(
            tester.run_plan(&plan, 21).fingerprint(),
            tester.run_plan(&plan, 21).fingerprint()
        );
    }

    #[test]
    fn artifacts_land_in_the_configured_dirs() {
        let base = std::env::temp_dir().join(format!(
            "cliffsim-artifacts-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let tester = GameTester::new(false)
            .with_snapshot_dir(Some(base.join("snapshots")))
            .with_journal_dir(Some(base.join("journals")));
        let plan = full_run_plan(GameplayStrategy::Sprinter).with_max_steps(5);
        let summary = tester.run_plan(&plan, 9);
        tester.persist_artifacts("Smoke Run", &summary).unwrap();

        assert!(base.join("snapshots").join("smoke-run-seed-9.json").exists());
        let journal =
            std::fs::read_to_string(base.join("journals").join("smoke-run-seed-9.log")).unwrap();
        assert_eq!(journal, summary.journal);
    }

    #[test]
    fn slugs_collapse_punctuation() {
        assert_eq!(slug("Full Run (Sprinter)"), "full-run-sprinter");
        assert_eq!(slug("undo/redo"), "undo-redo");
    }
}

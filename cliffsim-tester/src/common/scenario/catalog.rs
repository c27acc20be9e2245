use anyhow::{Result, ensure};

use crate::common::scenario::SimulationScenario;
use crate::logic::game_tester::{GameTester, SimulationSummary};
use crate::logic::simulation::StepAction;
use crate::logic::{GameplayStrategy, SimulationPlan, default_policy_setup};
use crate::storage::FileSnapshotStore;
use cliffsim_game::constants::{
    EXTEND_POSTSCRIPT_COST, MAGIC_ESSENCE, T1_CHEESE, T1_MOUSE, THREAD,
};
use cliffsim_game::{
    CheeseTier, GameState, Genre, MemorySnapshotStore, SessionConfig, SimResult, SnapshotStorage,
    StorySession, find_recipe,
};

const SMOKE_STEPS: u32 = 60;
const SNAPSHOT_STEPS: u32 = 120;

pub fn catalog_scenarios() -> Vec<SimulationScenario> {
    vec![
        SimulationScenario::new(
            "smoke",
            "Smoke",
            "Balanced policy plays the opening of a run",
            provisioned(GameplayStrategy::Balanced)
                .with_max_steps(SMOKE_STEPS)
                .with_expectation(smoke_expectation),
        ),
        full_run("full-run-sprinter", "Full Run (Sprinter)", GameplayStrategy::Sprinter),
        full_run("full-run-collector", "Full Run (Collector)", GameplayStrategy::Collector),
        full_run("full-run-balanced", "Full Run (Balanced)", GameplayStrategy::Balanced),
        full_run("full-run-random", "Full Run (Random)", GameplayStrategy::Random),
        SimulationScenario::new(
            "postscript-extension",
            "Postscript Extension",
            "Collector pays to lengthen the postscript exactly once",
            provisioned(GameplayStrategy::Collector)
                .with_expectation(completed_cleanly)
                .with_expectation(postscript_extension_expectation),
        ),
        SimulationScenario::new(
            "notoriety-bounds",
            "Notoriety Bounds",
            "Near-maximum notoriety unlocks Fantasy and stays in range",
            SimulationPlan::new(GameplayStrategy::Random)
                .with_setup(notorious_setup)
                .with_expectation(completed_cleanly)
                .with_expectation(notoriety_expectation),
        ),
        SimulationScenario::new(
            "deterministic",
            "Deterministic Replay",
            "Same seed and policy replay to an identical fingerprint",
            provisioned(GameplayStrategy::Random).with_expectation(deterministic_expectation),
        ),
        SimulationScenario::new(
            "undo-redo",
            "Undo and Redo",
            "History steps back and forth one committed action at a time",
            base_plan().with_expectation(undo_redo_expectation),
        ),
        SimulationScenario::new(
            "snapshot-roundtrip",
            "Snapshot Round Trip",
            "Mid-run states survive memory and file snapshot stores",
            provisioned(GameplayStrategy::Balanced)
                .with_max_steps(SNAPSHOT_STEPS)
                .with_combo(false)
                .with_expectation(snapshot_roundtrip_expectation),
        ),
        SimulationScenario::new(
            "crafting-linear",
            "Crafting Linearity",
            "Crafting n at once equals n single crafts",
            base_plan().with_expectation(crafting_linear_expectation),
        ),
        SimulationScenario::new(
            "loot-editing",
            "Loot Table Editing",
            "Added drop entries pay out on the next hunt",
            base_plan().with_expectation(loot_editing_expectation),
        ),
    ]
}

pub fn find_catalog_scenario(key: &str) -> Option<SimulationScenario> {
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.key() == key)
}

fn base_plan() -> SimulationPlan {
    SimulationPlan::new(GameplayStrategy::Balanced).with_max_steps(0)
}

fn provisioned(strategy: GameplayStrategy) -> SimulationPlan {
    SimulationPlan::new(strategy).with_setup(default_policy_setup(strategy))
}

fn full_run(
    key: &'static str,
    name: &'static str,
    strategy: GameplayStrategy,
) -> SimulationScenario {
    SimulationScenario::new(
        key,
        name,
        "Provisioned policy plays six chapters and the postscript",
        provisioned(strategy).with_expectation(completed_cleanly),
    )
}

fn notorious_setup(session: &mut StorySession) -> SimResult<()> {
    default_policy_setup(GameplayStrategy::Random)(session)?;
    for genre in Genre::BASE {
        session.edit_notoriety(genre, 195)?;
    }
    Ok(())
}

/// Session stocked the way the provisioned plans are, outside the runner.
fn stocked_session(seed: u64) -> Result<StorySession> {
    let mut session = StorySession::new(SessionConfig::default().with_seed(seed));
    default_policy_setup(GameplayStrategy::Balanced)(&mut session)?;
    Ok(session)
}

fn healthy(summary: &SimulationSummary) -> Result<()> {
    if let Some(err) = &summary.error {
        anyhow::bail!("simulation error: {err}");
    }
    ensure!(
        summary.violations.is_empty(),
        "invariant violations: {}",
        summary.violations.join("; ")
    );
    Ok(())
}

fn smoke_expectation(summary: &SimulationSummary) -> Result<()> {
    healthy(summary)?;
    ensure!(summary.hunts() > 0, "smoke run should hunt at least once");
    Ok(())
}

fn completed_cleanly(summary: &SimulationSummary) -> Result<()> {
    healthy(summary)?;
    ensure!(summary.run_completed, "run did not complete");
    ensure!(
        summary.chapters_completed() == 5,
        "expected 5 chapter transitions, saw {}",
        summary.chapters_completed()
    );
    ensure!(summary.entered_postscript(), "postscript never entered");
    ensure!(summary.final_state.is_idle(), "final state is not idle");
    ensure!(
        summary.final_state.run_mallets_spent.abs() < f64::EPSILON,
        "run spend not reset"
    );
    Ok(())
}

fn postscript_extension_expectation(summary: &SimulationSummary) -> Result<()> {
    let extensions = summary.count_actions(|action| *action == StepAction::Extend);
    ensure!(extensions == 1, "expected one extension, saw {extensions}");
    ensure!(
        summary.final_state.total_mallets_spent >= EXTEND_POSTSCRIPT_COST,
        "extension was not charged"
    );
    Ok(())
}

fn notoriety_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.journal.contains("Fantasy is unlocked"),
        "Fantasy unlock was not announced"
    );
    ensure!(
        !summary.final_state.notoriety.contains_key(&Genre::Fantasy),
        "Fantasy must not carry notoriety"
    );
    Ok(())
}

fn deterministic_expectation(summary: &SimulationSummary) -> Result<()> {
    let replay = GameTester::new(false).run_plan(&provisioned(summary.strategy), summary.seed);
    ensure!(
        replay.fingerprint() == summary.fingerprint(),
        "replay diverged: {:016x} vs {:016x}",
        replay.fingerprint(),
        summary.fingerprint()
    );
    ensure!(replay.turns.len() == summary.turns.len(), "step counts differ");
    Ok(())
}

fn undo_redo_expectation(summary: &SimulationSummary) -> Result<()> {
    let mut session = stocked_session(summary.seed)?;
    session.start_random_run()?;
    let start = session.state().clone();
    for _ in 0..5 {
        session.perform_hunt(Some(CheeseTier::T1))?;
    }
    let after = session.state().clone();

    for _ in 0..5 {
        session.undo()?;
    }
    ensure!(session.state() == &start, "undo did not restore the start");
    for _ in 0..5 {
        session.redo()?;
    }
    ensure!(session.state() == &after, "redo did not replay the hunts");

    session.undo()?;
    session.perform_hunt(Some(CheeseTier::T1))?;
    ensure!(session.redo().is_err(), "a new action must clear redo");
    Ok(())
}

fn snapshot_roundtrip_expectation(summary: &SimulationSummary) -> Result<()> {
    let state = &summary.final_state;
    let reloaded = GameState::from_json(&state.to_json_pretty()?)?;
    ensure!(&reloaded == state, "JSON round trip changed the state");

    let mut session = StorySession::new(SessionConfig::default().with_seed(summary.seed));
    let memory = MemorySnapshotStore::default();
    memory.save_snapshot("mid-run", state)?;
    ensure!(session.load_snapshot(&memory, "mid-run")?, "memory snapshot missing");
    ensure!(session.state() == state, "memory store changed the state");
    session.undo()?;
    ensure!(session.state().is_idle(), "loading was not undoable");

    let dir = std::env::temp_dir().join(format!("cliffsim-scenario-{}", summary.seed));
    let files = FileSnapshotStore::new(&dir);
    session.redo()?;
    session.save_snapshot(&files, "mid-run")?;
    let from_disk = files.load_snapshot("mid-run")?;
    files.delete_snapshot("mid-run")?;
    ensure!(from_disk.as_ref() == Some(state), "file store changed the state");
    Ok(())
}

fn crafting_linear_expectation(summary: &SimulationSummary) -> Result<()> {
    let Some(recipe) = find_recipe("12 T1 cheese + 24 Thread + 1 ME → 2 T2 cheese") else {
        anyhow::bail!("T2 cheese recipe missing");
    };
    let prepare = || -> Result<StorySession> {
        let mut session = StorySession::new(SessionConfig::default().with_seed(summary.seed));
        session.edit_resource(T1_CHEESE, 36.0)?;
        session.edit_resource(THREAD, 72.0)?;
        session.edit_consumable(MAGIC_ESSENCE, 3.0)?;
        Ok(session)
    };

    let mut bulk = prepare()?;
    bulk.craft_from_input(recipe, " 3 ")?;
    let mut single = prepare()?;
    for _ in 0..3 {
        single.craft(recipe, 1)?;
    }
    ensure!(bulk.state() == single.state(), "crafting is not linear");
    ensure!(
        bulk.craft_from_input(recipe, "0").is_err() && bulk.craft_from_input(recipe, "x").is_err(),
        "invalid quantities must be rejected"
    );
    Ok(())
}

fn loot_editing_expectation(summary: &SimulationSummary) -> Result<()> {
    let mut session = stocked_session(summary.seed)?;
    session.set_combo_enabled(false);
    session.add_loot_entry(T1_MOUSE, MAGIC_ESSENCE)?;
    ensure!(
        session.add_loot_entry(T1_MOUSE, MAGIC_ESSENCE).is_err(),
        "duplicate loot entries must be rejected"
    );
    session.edit_loot_entry(T1_MOUSE, MAGIC_ESSENCE, 2.5)?;

    session.start_random_run()?;
    let before = session.state().consumable(MAGIC_ESSENCE);
    let report = session.perform_hunt(Some(CheeseTier::T1))?.value;
    let gained = session.state().consumable(MAGIC_ESSENCE) - before;
    ensure!(report.enemy == T1_MOUSE, "unexpected enemy {}", report.enemy);
    ensure!((gained - 2.5).abs() < 1e-9, "expected +2.5 ME, got {gained}");
    Ok(())
}

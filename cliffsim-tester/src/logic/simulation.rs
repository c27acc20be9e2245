use cliffsim_game::constants::{NOTORIETY_MAX, NOTORIETY_MIN, POSTSCRIPT_POSITION};
use cliffsim_game::{
    GameState, Genre, HuntBlockReason, HuntTransition, SessionConfig, SimError, StorySession,
    batch_available, hunt_block_reason,
};

use crate::logic::policy::{ChapterDecision, ChapterPolicy};

/// Configuration for a simulation session.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub seed: u64,
    pub combo_enabled: bool,
    pub max_steps: u32,
}

impl SimulationConfig {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            seed,
            combo_enabled: true,
            max_steps: 2_000,
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub const fn with_combo(mut self, enabled: bool) -> Self {
        self.combo_enabled = enabled;
        self
    }
}

/// What the driver did on one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Start,
    Hunt { hunts: u32 },
    Choose { index: usize },
    Reroll,
    Extend,
    Stalled(String),
}

/// Result of advancing the simulation by one step.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub step: u32,
    pub action: StepAction,
    pub transitions: Vec<HuntTransition>,
    pub rationale: Option<String>,
    pub run_complete: bool,
    pub error: Option<String>,
}

impl TurnOutcome {
    fn new(step: u32, action: StepAction) -> Self {
        Self {
            step,
            action,
            transitions: Vec::new(),
            rationale: None,
            run_complete: false,
            error: None,
        }
    }

    fn failed(step: u32, action: StepAction, err: &SimError) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Self::new(step, action)
        }
    }
}

/// Deterministic harness that plays one story run through a [`ChapterPolicy`].
pub struct SimulationSession {
    session: StorySession,
    config: SimulationConfig,
    step: u32,
    started: bool,
}

impl SimulationSession {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let session_config = SessionConfig::default()
            .with_seed(config.seed)
            .with_combo(config.combo_enabled);
        Self {
            session: StorySession::new(session_config),
            config,
            step: 0,
            started: false,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &StorySession {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut StorySession {
        &mut self.session
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        self.session.state()
    }

    #[must_use]
    pub const fn out_of_steps(&self) -> bool {
        self.step >= self.config.max_steps
    }

    #[must_use]
    pub fn into_session(self) -> StorySession {
        self.session
    }

    /// Take one player action. A run that returns to idle after starting is complete.
    pub fn advance(&mut self, policy: &mut dyn ChapterPolicy) -> TurnOutcome {
        self.step += 1;
        let step = self.step;

        if self.state().is_idle() {
            if self.started {
                let mut outcome = TurnOutcome::new(step, StepAction::Start);
                outcome.run_complete = true;
                return outcome;
            }
            self.started = true;
            return match self.session.start_random_run() {
                Ok(started) => {
                    let mut outcome = TurnOutcome::new(step, StepAction::Start);
                    outcome.rationale = Some(started.value.to_string());
                    outcome
                }
                Err(err) => TurnOutcome::failed(step, StepAction::Start, &err),
            };
        }

        if self.should_extend(policy) {
            return match self.session.extend_postscript() {
                Ok(_) => TurnOutcome::new(step, StepAction::Extend),
                Err(err) => TurnOutcome::failed(step, StepAction::Extend, &err),
            };
        }

        let tier = policy.pick_tier(self.state());
        match hunt_block_reason(self.state(), tier) {
            None => self.hunt(step, policy, tier),
            Some(HuntBlockReason::ChoicePending) => self.decide_chapter(step, policy),
            Some(reason) => {
                let mut outcome = TurnOutcome::new(step, StepAction::Stalled(reason.to_string()));
                outcome.error = Some(format!("stalled: {reason}"));
                outcome
            }
        }
    }

    fn should_extend(&self, policy: &mut dyn ChapterPolicy) -> bool {
        let state = self.session.state();
        state.in_postscript()
            && !state.postscript_extended
            && state.current_chapter_progress == 0
            && policy.wants_extension(state)
    }

    fn hunt(
        &mut self,
        step: u32,
        policy: &mut dyn ChapterPolicy,
        tier: Option<cliffsim_game::CheeseTier>,
    ) -> TurnOutcome {
        let batch_tier = tier.filter(|tier| {
            policy.wants_batch() && batch_available(self.session.state(), *tier)
        });
        let reports = match batch_tier {
            Some(tier) => self.session.batch_hunt(tier).map(|outcome| outcome.value),
            None => self
                .session
                .perform_hunt(tier)
                .map(|outcome| vec![outcome.value]),
        };
        match reports {
            Ok(reports) => {
                let hunts = u32::try_from(reports.len()).unwrap_or(u32::MAX);
                let mut outcome = TurnOutcome::new(step, StepAction::Hunt { hunts });
                outcome.transitions = reports.iter().filter_map(|r| r.transition).collect();
                outcome.run_complete = outcome.transitions.contains(&HuntTransition::RunComplete);
                outcome
            }
            Err(err) => TurnOutcome::failed(step, StepAction::Hunt { hunts: 0 }, &err),
        }
    }

    fn decide_chapter(&mut self, step: u32, policy: &mut dyn ChapterPolicy) -> TurnOutcome {
        match policy.pick_chapter(self.session.state()) {
            ChapterDecision::Reroll => match self.session.reroll_choices() {
                Ok(_) => TurnOutcome::new(step, StepAction::Reroll),
                Err(err) => TurnOutcome::failed(step, StepAction::Reroll, &err),
            },
            ChapterDecision::Choose { index, rationale } => {
                match self.session.choose_next_chapter(index) {
                    Ok(_) => {
                        let mut outcome = TurnOutcome::new(step, StepAction::Choose { index });
                        outcome.rationale = rationale;
                        outcome
                    }
                    Err(err) => TurnOutcome::failed(step, StepAction::Choose { index }, &err),
                }
            }
        }
    }
}

/// Structural checks that must hold after every committed action.
#[must_use]
pub fn invariant_violations(state: &GameState) -> Vec<String> {
    let mut violations = Vec::new();

    for (genre, value) in &state.notoriety {
        if !(NOTORIETY_MIN..=NOTORIETY_MAX).contains(value) {
            violations.push(format!("{genre} notoriety {value} out of range"));
        }
    }
    if state.notoriety.contains_key(&Genre::Fantasy) {
        violations.push("Fantasy carries notoriety".to_string());
    }
    if state.chapter_position > POSTSCRIPT_POSITION {
        violations.push(format!("chapter position {}", state.chapter_position));
    }
    if state.pending_chapter_choices.len() > 3 {
        violations.push(format!(
            "{} pending choices",
            state.pending_chapter_choices.len()
        ));
    }
    if let Some(target) = state.target_length()
        && state.current_chapter_progress > target
    {
        violations.push(format!(
            "progress {} past target {target}",
            state.current_chapter_progress
        ));
    }
    if state.is_idle()
        && (state.current_run_hunts != 0
            || state.total_pages() != 0
            || !state.pending_chapter_choices.is_empty())
    {
        violations.push("idle state carries run data".to_string());
    }
    if u64::from(state.current_run_hunts) > state.total_hunts {
        violations.push("run hunts exceed lifetime hunts".to_string());
    }

    violations
}

#[cfg(test)]
mod tests {
    #![allow(clippy::field_reassign_with_default)]

    use super::*;
    use crate::logic::policy::GameplayStrategy;
    use cliffsim_game::constants::{MALLETS, T1_CHEESE};

    fn provisioned(strategy: GameplayStrategy, seed: u64) -> SimulationSession {
        let mut sim = SimulationSession::new(SimulationConfig::new(seed));
        sim.session_mut().edit_resource(T1_CHEESE, 500.0).unwrap();
        sim.session_mut().edit_resource(MALLETS, 100.0).unwrap();
        sim
    }

    fn play(sim: &mut SimulationSession, policy: &mut dyn ChapterPolicy) -> Vec<TurnOutcome> {
        let mut turns = Vec::new();
        while !sim.out_of_steps() {
            let outcome = sim.advance(policy);
            let done = outcome.run_complete || outcome.error.is_some();
            turns.push(outcome);
            if done {
                break;
            }
        }
        turns
    }

    #[test]
    fn sprinter_completes_a_run_with_batches() {
        let mut sim = provisioned(GameplayStrategy::Sprinter, 11);
        let mut policy = GameplayStrategy::Sprinter.create_policy(11);
        let turns = play(&mut sim, policy.as_mut());

        let last = turns.last().unwrap();
        assert!(last.run_complete, "run did not finish: {last:?}");
        assert!(turns.iter().all(|turn| turn.error.is_none()));
        assert!(
            turns
                .iter()
                .any(|turn| turn.action == StepAction::Hunt { hunts: 10 })
        );
        assert!(sim.state().is_idle());
        assert!(invariant_violations(sim.state()).is_empty());
    }

    #[test]
    fn collector_extends_the_postscript() {
        let mut sim = provisioned(GameplayStrategy::Collector, 5);
        let mut policy = GameplayStrategy::Collector.create_policy(5);
        let turns = play(&mut sim, policy.as_mut());
        assert!(turns.iter().any(|turn| turn.action == StepAction::Extend));
        assert!(turns.last().unwrap().run_complete);
        assert!(sim.state().total_mallets_spent >= 30.0);
    }

    #[test]
    fn empty_larder_stalls_the_run() {
        let mut sim = SimulationSession::new(SimulationConfig::new(1));
        let mut policy = GameplayStrategy::Sprinter.create_policy(1);
        assert_eq!(sim.advance(policy.as_mut()).action, StepAction::Start);
        let stalled = sim.advance(policy.as_mut());
        assert!(matches!(stalled.action, StepAction::Stalled(_)));
        assert!(stalled.error.is_some());
    }

    #[test]
    fn step_budget_is_respected() {
        let mut sim = SimulationSession::new(
            SimulationConfig::new(3).with_max_steps(4),
        );
        sim.session_mut().edit_resource(T1_CHEESE, 500.0).unwrap();
        let mut policy = GameplayStrategy::Balanced.create_policy(3);
        let turns = play(&mut sim, policy.as_mut());
        assert_eq!(turns.len(), 4);
        assert!(sim.out_of_steps());
    }

    #[test]
    fn invariant_checks_flag_broken_states() {
        let mut state = GameState::default();
        assert!(invariant_violations(&state).is_empty());
        state.notoriety.insert(Genre::Fantasy, 5);
        state.chapter_position = 9;
        state.current_run_hunts = 3;
        let violations = invariant_violations(&state);
        assert_eq!(violations.len(), 3, "{violations:?}");
    }
}

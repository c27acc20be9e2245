pub mod catalog;

use crate::logic::SimulationPlan;
use catalog::{catalog_scenarios, find_catalog_scenario};

// Logic test scenario
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Catalog entry: a CLI key, a display name and the plan it runs.
#[derive(Debug, Clone)]
pub struct SimulationScenario {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    plan: SimulationPlan,
}

impl SimulationScenario {
    #[must_use]
    pub const fn new(
        key: &'static str,
        name: &'static str,
        description: &'static str,
        plan: SimulationPlan,
    ) -> Self {
        Self {
            key,
            name,
            description,
            plan,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    #[must_use]
    pub fn as_logic_scenario(&self) -> TestScenario {
        TestScenario::simulation(self.name, self.plan.clone())
    }
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<SimulationScenario> {
    find_catalog_scenario(key)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog_scenarios()
        .iter()
        .map(|scenario| (scenario.key(), scenario.description()))
        .collect()
}

#[must_use]
pub fn scenario_keys() -> Vec<&'static str> {
    catalog_scenarios()
        .iter()
        .map(SimulationScenario::key)
        .collect()
}

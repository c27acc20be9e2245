//! Fixed crafting recipes and their linear application.

use serde::Serialize;
use std::fmt;

use crate::constants::{
    GOLD, HOOKS, MACHINERY, MAGIC_ESSENCE, MALLETS, T1_CHEESE, T2_CHEESE, T3_CHEESE, THREAD,
};
use crate::error::{SimError, SimResult};
use crate::numbers::{format_amount, i64_to_f64};
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recipe {
    pub label: &'static str,
    pub costs: &'static [(&'static str, f64)],
    pub outputs: &'static [(&'static str, f64)],
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

pub const RECIPES: [Recipe; 5] = [
    Recipe {
        label: "6 hook + 2000 Gold → 1 T1 cheese",
        costs: &[(HOOKS, 6.0), (GOLD, 2000.0)],
        outputs: &[(T1_CHEESE, 1.0)],
    },
    Recipe {
        label: "6 hook + 16000 Gold → 2 T1 cheese",
        costs: &[(HOOKS, 6.0), (GOLD, 16000.0)],
        outputs: &[(T1_CHEESE, 2.0)],
    },
    Recipe {
        label: "12 T1 cheese + 24 Thread + 1 ME → 2 T2 cheese",
        costs: &[(T1_CHEESE, 12.0), (THREAD, 24.0), (MAGIC_ESSENCE, 1.0)],
        outputs: &[(T2_CHEESE, 2.0)],
    },
    Recipe {
        label: "48 T1 cheese + 60 Machinery + 1 ME → 2 T3 cheese",
        costs: &[(T1_CHEESE, 48.0), (MACHINERY, 60.0), (MAGIC_ESSENCE, 1.0)],
        outputs: &[(T3_CHEESE, 2.0)],
    },
    Recipe {
        label: "30 Machinery → 1 Mallet",
        costs: &[(MACHINERY, 30.0)],
        outputs: &[(MALLETS, 1.0)],
    },
];

#[must_use]
pub fn find_recipe(label: &str) -> Option<&'static Recipe> {
    RECIPES.iter().find(|recipe| recipe.label == label)
}

/// Parse the free-text quantity field.
///
/// # Errors
///
/// Anything other than a whole number above zero is [`SimError::InvalidQuantity`].
pub fn parse_quantity(raw: &str) -> SimResult<u32> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(value) if value > 0 => {
            u32::try_from(value).map_err(|_| SimError::InvalidQuantity(trimmed.to_string()))
        }
        _ => Err(SimError::InvalidQuantity(trimmed.to_string())),
    }
}

/// Deduct `costs × quantity` and credit `outputs × quantity`.
///
/// # Errors
///
/// Returns [`SimError::InvalidQuantity`] when `quantity` is not positive.
pub fn craft(state: &mut GameState, recipe: &Recipe, quantity: i64) -> SimResult<()> {
    if quantity <= 0 {
        return Err(SimError::InvalidQuantity(quantity.to_string()));
    }
    let factor = i64_to_f64(quantity);
    for (material, amount) in recipe.costs {
        debug_assert!(
            is_declared(state, material),
            "recipe `{}` costs undeclared material `{material}`",
            recipe.label
        );
        state.add_material(material, -amount * factor);
    }
    for (material, amount) in recipe.outputs {
        debug_assert!(
            is_declared(state, material),
            "recipe `{}` yields undeclared material `{material}`",
            recipe.label
        );
        state.add_material(material, amount * factor);
    }
    log::debug!("crafted {quantity} × {}", recipe.label);
    Ok(())
}

fn is_declared(state: &GameState, material: &str) -> bool {
    state.resources.contains_key(material) || state.consumables.contains_key(material)
}

/// Journal line for a successful craft.
#[must_use]
pub fn describe_craft(recipe: &Recipe, quantity: i64) -> String {
    let factor = i64_to_f64(quantity);
    let outputs: Vec<String> = recipe
        .outputs
        .iter()
        .map(|(material, amount)| format!("{material} +{}", format_amount(amount * factor)))
        .collect();
    format!("Crafted {quantity} × [{}]: {}", recipe.label, outputs.join(", "))
}

//! Direct field edits made from the inventory, notoriety and loot-table panels.
//!
//! Every setter reports whether the value actually changed so callers can
//! skip committing a no-op.

use crate::constants::{NOTORIETY_MAX, NOTORIETY_MIN};
use crate::error::{SimError, SimResult};
use crate::numbers::format_amount;
use crate::state::{GameState, Genre};

/// Parse an amount field. Blank input counts as zero.
///
/// # Errors
///
/// Returns [`SimError::InvalidNumber`] for text that is not a finite number.
pub fn parse_amount(raw: &str) -> SimResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| SimError::InvalidNumber(trimmed.to_string()))
}

/// Parse a notoriety field as a whole number. Blank input counts as zero.
///
/// # Errors
///
/// Returns [`SimError::InvalidNumber`] for anything but an integer.
pub fn parse_notoriety(raw: &str) -> SimResult<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| SimError::InvalidNumber(trimmed.to_string()))
}

fn require_non_negative(value: f64) -> SimResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidNumber(format_amount(value)))
    }
}

/// # Errors
///
/// Rejects unknown resource keys and negative or non-finite amounts.
pub fn set_resource(state: &mut GameState, key: &str, value: f64) -> SimResult<bool> {
    let value = require_non_negative(value)?;
    let slot = state
        .resources
        .get_mut(key)
        .ok_or_else(|| SimError::UnknownMaterial(key.to_string()))?;
    if *slot == value {
        return Ok(false);
    }
    *slot = value;
    Ok(true)
}

/// Consumables may be set below zero to record debt.
///
/// # Errors
///
/// Rejects unknown consumable keys and non-finite amounts.
pub fn set_consumable(state: &mut GameState, key: &str, value: f64) -> SimResult<bool> {
    if !value.is_finite() {
        return Err(SimError::InvalidNumber(value.to_string()));
    }
    let slot = state
        .consumables
        .get_mut(key)
        .ok_or_else(|| SimError::UnknownMaterial(key.to_string()))?;
    if *slot == value {
        return Ok(false);
    }
    *slot = value;
    Ok(true)
}

/// Values outside the notoriety range are clamped rather than rejected.
///
/// # Errors
///
/// Rejects the bonus genre, which carries no notoriety.
pub fn set_notoriety(state: &mut GameState, genre: Genre, value: i64) -> SimResult<bool> {
    if genre.is_bonus() {
        return Err(SimError::NotorietyUntracked(genre));
    }
    let clamped = i32::try_from(value.clamp(i64::from(NOTORIETY_MIN), i64::from(NOTORIETY_MAX)))
        .unwrap_or(NOTORIETY_MIN);
    if state.notoriety_of(genre) == clamped {
        return Ok(false);
    }
    state.set_notoriety(genre, clamped);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COMBO_CONSUMABLE, MALLETS};

    #[test]
    fn blank_fields_parse_as_zero() {
        assert!(parse_amount("  ").unwrap().abs() < f64::EPSILON);
        assert_eq!(parse_notoriety("").unwrap(), 0);
        assert!((parse_amount("2.5").unwrap() - 2.5).abs() < f64::EPSILON);
        assert!(matches!(parse_amount("abc"), Err(SimError::InvalidNumber(_))));
        assert!(parse_amount("inf").is_err());
        assert!(parse_notoriety("12.5").is_err());
    }

    #[test]
    fn resource_edits_reject_negatives_and_skip_no_ops() {
        let mut state = GameState::default();
        assert!(set_resource(&mut state, MALLETS, 40.0).unwrap());
        assert!(!set_resource(&mut state, MALLETS, 40.0).unwrap());
        assert!(set_resource(&mut state, MALLETS, -1.0).is_err());
        assert!(matches!(
            set_resource(&mut state, "Stardust", 1.0),
            Err(SimError::UnknownMaterial(_))
        ));
        assert!((state.mallets() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn consumables_accept_debt() {
        let mut state = GameState::default();
        assert!(set_consumable(&mut state, COMBO_CONSUMABLE, -3.0).unwrap());
        assert!((state.consumable(COMBO_CONSUMABLE) + 3.0).abs() < f64::EPSILON);
        assert!(set_consumable(&mut state, MALLETS, 1.0).is_err());
    }

    #[test]
    fn notoriety_edits_clamp() {
        let mut state = GameState::default();
        assert!(set_notoriety(&mut state, Genre::Comedy, 1_000).unwrap());
        assert_eq!(state.notoriety_of(Genre::Comedy), NOTORIETY_MAX);
        assert!(!set_notoriety(&mut state, Genre::Comedy, 250).unwrap());
        assert!(set_notoriety(&mut state, Genre::Comedy, -9).unwrap());
        assert_eq!(state.notoriety_of(Genre::Comedy), NOTORIETY_MIN);
        assert!(matches!(
            set_notoriety(&mut state, Genre::Fantasy, 10),
            Err(SimError::NotorietyUntracked(Genre::Fantasy))
        ));
    }
}

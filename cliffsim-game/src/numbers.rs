//! Numeric conversion and display helpers centralizing lossy casts.

use num_traits::cast::cast;

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Truncate a f64 toward zero and clamp it to the i32 range, returning 0 for NaN.
#[must_use]
pub fn truncate_f64_to_i32(value: f64) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i32, f64>(i32::MIN).unwrap_or(f64::MIN);
    let max = cast::<i32, f64>(i32::MAX).unwrap_or(f64::MAX);
    cast::<f64, i32>(value.clamp(min, max).trunc()).unwrap_or(0)
}

/// Truncate a f64 toward zero and clamp it to the u32 range, returning 0 for NaN.
#[must_use]
pub fn truncate_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    cast::<f64, u32>(value.clamp(0.0, max).trunc()).unwrap_or(0)
}

/// Truncate a f64 toward zero and clamp it to the u64 range, returning 0 for NaN.
#[must_use]
pub fn truncate_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.clamp(0.0, max).trunc()).unwrap_or(0)
}

/// Render an amount the way the journal shows it: whole numbers without a
/// fraction, everything else with at most four decimals.
#[must_use]
pub fn format_amount(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        return format!("{value:.0}");
    }
    let text = format!("{value:.4}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

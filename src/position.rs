//! Conversions from a normalized position to device-native wire values.
//!
//! `0.0` is fully closed/retracted, `1.0` fully open/extended.

/// Clamp into `[0, 1]`. NaN maps to `0`.
pub fn clamp_unit(position: f64) -> f64 {
    if position.is_nan() {
        0.0
    } else {
        position.clamp(0.0, 1.0)
    }
}

/// Scale to an integer percentage, truncating toward zero.
///
/// Not clamped: `1.5` becomes `150`. Saturates at the `i64` bounds.
pub fn to_percent(position: f64) -> i64 {
    (position * 100.0) as i64
}

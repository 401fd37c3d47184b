//! Angle normalization and angular binning

/// Degrees in a full revolution
pub const FULL_TURN_DEG: f64 = 360.0;

/// Wrap any finite angle into `[0, 360)`. Negative angles wrap forward.
#[inline]
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(FULL_TURN_DEG);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= FULL_TURN_DEG { 0.0 } else { wrapped }
}

/// Map a normalized angle to its bin, clamped to `[0, bins - 1]`.
///
/// The last bin absorbs the remainder when `360 / delta_deg` is not an integer.
#[inline]
pub fn bin_for_angle(normalized_deg: f64, delta_deg: f64, bins: usize) -> usize {
    debug_assert!(bins >= 1);
    let idx = (normalized_deg / delta_deg).floor();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(bins - 1)
    }
}

/// Angular span `[start, end)` in degrees covered by `bin` out of `bins`.
pub fn bin_span(bin: usize, delta_deg: f64, bins: usize) -> (f64, f64) {
    let start = bin as f64 * delta_deg;
    let end = if bin + 1 >= bins {
        FULL_TURN_DEG
    } else {
        (bin + 1) as f64 * delta_deg
    };
    (start, end)
}

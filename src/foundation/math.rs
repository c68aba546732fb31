use crate::foundation::error::{FilterError, FilterResult};

// Tolerance for float noise on frames that were already snapped to the pixel grid.
const PIXEL_EPS: f64 = 1e-6;

/// Smallest power of two `>= v`. Zero maps to one.
pub(crate) fn next_pow2(v: u32) -> u32 {
    v.max(1).next_power_of_two()
}

/// Convert a CSS-space extent to whole device pixels, rounding up.
pub(crate) fn pixel_extent(css: f64, resolution: f64) -> FilterResult<u32> {
    let px = css * resolution;
    if !px.is_finite() {
        return Err(FilterError::validation(format!(
            "surface extent must be finite, got {css} at resolution {resolution}"
        )));
    }
    let px = (px - PIXEL_EPS).ceil().max(0.0);
    if px > f64::from(u32::MAX) {
        return Err(FilterError::contract(format!(
            "surface extent {px} does not fit in u32"
        )));
    }
    Ok(px as u32)
}

pub(crate) fn validate_resolution(resolution: f64) -> FilterResult<f64> {
    if resolution.is_finite() && resolution > 0.0 {
        Ok(resolution)
    } else {
        Err(FilterError::validation(format!(
            "resolution must be finite and > 0, got {resolution}"
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

//! Rectangle helpers for filter frames.
//!
//! All helpers take and return [`Rect`] values in parent (CSS pixel) space.

use crate::foundation::core::Rect;

const SNAP_EPS: f64 = 0.001;

/// Grow `r` outward by `padding` on every side.
pub fn pad_rect(r: Rect, padding: f64) -> Rect {
    Rect::new(r.x0 - padding, r.y0 - padding, r.x1 + padding, r.y1 + padding)
}

/// Clip `r` to `bounds`.
///
/// A disjoint pair collapses to a zero-sized rect at the clamped origin rather than going negative.
pub fn fit_rect(r: Rect, bounds: Rect) -> Rect {
    let r = r.abs();
    let bounds = bounds.abs();
    let x0 = r.x0.max(bounds.x0);
    let y0 = r.y0.max(bounds.y0);
    let x1 = r.x1.min(bounds.x1).max(x0);
    let y1 = r.y1.min(bounds.y1).max(y0);
    Rect::new(x0, y0, x1, y1)
}

/// Snap `r` outward to the pixel grid of `resolution`.
///
/// Edges within a thousandth of a pixel of a grid line are treated as on it, which makes the
/// operation idempotent for frames that were already snapped.
pub fn ceil_rect(r: Rect, resolution: f64) -> Rect {
    let x1 = ((r.x1 - SNAP_EPS) * resolution).ceil() / resolution;
    let y1 = ((r.y1 - SNAP_EPS) * resolution).ceil() / resolution;
    let x0 = ((r.x0 + SNAP_EPS) * resolution).floor() / resolution;
    let y0 = ((r.y0 + SNAP_EPS) * resolution).floor() / resolution;
    Rect::new(x0, y0, x1, y1)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/frame.rs"]
mod tests;

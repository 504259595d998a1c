//! Stick and trigger shaping on raw 16-bit axis values.
//!
//! All functions are pure. Fractions (`cutoff`, `deadzone`, `edge`) are
//! relative to full scale, `32767`.

use serde::{Deserialize, Serialize};

use super::snapshot::InputSnapshot;

/// Largest axis magnitude after clamping
pub const AXIS_MAX: i16 = 32767;

const FULL_SCALE: f32 = AXIS_MAX as f32;

/// Zeroes `value` when its magnitude is below `cutoff * 32767`
pub fn threshold(value: i16, cutoff: f32) -> i16 {
    let limit = cutoff * FULL_SCALE;
    if (value as f32).abs() < limit {
        0
    } else {
        value
    }
}

/// Rescales a stick sample between a deadzone and an outer edge.
///
/// Per axis, magnitudes below `deadzone * 32767` become `0` and magnitudes at
/// or above `edge * 32767` become full scale, linearly in between. When one
/// axis overshoots the edge, the other is scaled down by the same factor so the
/// sample stays inside the unit diamond. A zero-width band returns the input
/// unchanged.
pub fn scale_and_limit(x: i16, y: i16, deadzone: f32, edge: f32) -> (i16, i16) {
    let low = deadzone * FULL_SCALE;
    // Band width is truncated to whole units before the zero check
    let span = (edge * FULL_SCALE - low) as i32;
    if span == 0 {
        return (x, y);
    }
    let span = span as f32;

    let mut fx = ((x as i32).abs() as f32 - low) / span;
    let mut fy = ((y as i32).abs() as f32 - low) / span;

    if fx > 1.0 {
        fy /= fx;
        fx = 1.0;
    }
    if fy > 1.0 {
        fx /= fy;
        fy = 1.0;
    }

    let sign_x = direction(x, &mut fx);
    let sign_y = direction(y, &mut fy);

    (
        (sign_x * fx * FULL_SCALE) as i16,
        (sign_y * fy * FULL_SCALE) as i16,
    )
}

// Sign of a raw value, zeroing its fraction when it sits inside the deadzone
fn direction(raw: i16, fraction: &mut f32) -> f32 {
    if raw == 0 {
        return 0.0;
    }
    if *fraction <= 0.0 {
        *fraction = 0.0;
        0.0
    } else {
        f32::from(raw.signum())
    }
}

pub fn clamp(value: i16, min: i16, max: i16) -> i16 {
    if value <= min {
        min
    } else if value >= max {
        max
    } else {
        value
    }
}

/// Raises `value` to at least `min`
pub fn min_floor(value: i16, min: i16) -> i16 {
    if value <= min {
        min
    } else {
        value
    }
}

/// Lowers `value` to at most `max`
pub fn max_ceiling(value: i16, max: i16) -> i16 {
    if value >= max {
        max
    } else {
        value
    }
}

/// Deadzone/edge pair applied to a whole snapshot
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StickShaping {
    pub deadzone: f32,
    pub edge: f32,
}

impl Default for StickShaping {
    fn default() -> Self {
        Self {
            deadzone: 0.1,
            edge: 0.9,
        }
    }
}

impl StickShaping {
    pub fn new(deadzone: f32, edge: f32) -> Self {
        Self { deadzone, edge }
    }

    /// Shapes both sticks with [`scale_and_limit`] and gates the triggers
    /// with [`threshold`] at the deadzone.
    pub fn apply(&self, snapshot: &mut InputSnapshot) {
        (snapshot.axis_left_x, snapshot.axis_left_y) = scale_and_limit(
            snapshot.axis_left_x,
            snapshot.axis_left_y,
            self.deadzone,
            self.edge,
        );
        (snapshot.axis_right_x, snapshot.axis_right_y) = scale_and_limit(
            snapshot.axis_right_x,
            snapshot.axis_right_y,
            self.deadzone,
            self.edge,
        );
        snapshot.trigger_left = threshold(snapshot.trigger_left, self.deadzone);
        snapshot.trigger_right = threshold(snapshot.trigger_right, self.deadzone);
    }
}

use serde::{Deserialize, Serialize};

use super::axis::{clamp, AXIS_MAX};
use crate::backend::{GamepadBackend, InstanceId, PadAxis, PadButton};

/// Button and axis state of the active gamepad for one frame.
///
/// Axes are clamped to `-32767..=32767`; sticks use the SDL convention with
/// Y growing downward, triggers rest at `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub back: bool,
    pub guide: bool,
    pub start: bool,
    pub lstick: bool,
    pub rstick: bool,
    pub lshoulder: bool,
    pub rshoulder: bool,
    pub dup: bool,
    pub ddown: bool,
    pub dleft: bool,
    pub dright: bool,

    pub axis_left_x: i16,
    pub axis_left_y: i16,
    pub axis_right_x: i16,
    pub axis_right_y: i16,
    pub trigger_left: i16,
    pub trigger_right: i16,
}

impl InputSnapshot {
    /// True when any button is held
    pub fn any_pressed(&self) -> bool {
        [
            self.a,
            self.b,
            self.x,
            self.y,
            self.back,
            self.guide,
            self.start,
            self.lstick,
            self.rstick,
            self.lshoulder,
            self.rshoulder,
            self.dup,
            self.ddown,
            self.dleft,
            self.dright,
        ]
        .into_iter()
        .any(|pressed| pressed)
    }
}

/// Fills `out` from the live state of `device`.
///
/// Buttons are copied as-is. Axes are only clamped; the platform minimum
/// (-32768) is one unit wider than the maximum, clamping keeps them symmetric.
pub fn write_inputs(backend: &dyn GamepadBackend, device: InstanceId, out: &mut InputSnapshot) {
    let button = |b: PadButton| backend.button(device, b);
    let axis = |a: PadAxis| clamp(backend.axis(device, a), -AXIS_MAX, AXIS_MAX);

    out.a = button(PadButton::South);
    out.b = button(PadButton::East);
    out.x = button(PadButton::West);
    out.y = button(PadButton::North);
    out.back = button(PadButton::Back);
    out.guide = button(PadButton::Guide);
    out.start = button(PadButton::Start);
    out.lstick = button(PadButton::LeftStick);
    out.rstick = button(PadButton::RightStick);
    out.lshoulder = button(PadButton::LeftShoulder);
    out.rshoulder = button(PadButton::RightShoulder);
    out.dup = button(PadButton::DPadUp);
    out.ddown = button(PadButton::DPadDown);
    out.dleft = button(PadButton::DPadLeft);
    out.dright = button(PadButton::DPadRight);

    out.axis_left_x = axis(PadAxis::LeftX);
    out.axis_left_y = axis(PadAxis::LeftY);
    out.axis_right_x = axis(PadAxis::RightX);
    out.axis_right_y = axis(PadAxis::RightY);
    out.trigger_left = axis(PadAxis::TriggerLeft);
    out.trigger_right = axis(PadAxis::TriggerRight);
}

use glam::{Vec2, Vec3};
use terrainview_camera::{InputDelta, Throttle};

use crate::controls::{FlightControl, HeldControls};
use crate::gamepad::{GamepadAxes, GamepadSample, LEFT_SHOULDER, RIGHT_SHOULDER};

/// Tunables for turning raw input into flight deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlConfig {
    /// Degrees per pixel of cursor offset.
    pub mouse_sensitivity: f32,
    /// Degrees per frame while a rotation key is held.
    pub key_sensitivity: f32,
    /// Speed change per frame while accelerate/decelerate is held.
    pub speed_step: f32,
    pub stick_dead_zone: f32,
    pub trigger_dead_zone: f32,
    /// Degrees per frame at full left-stick deflection.
    pub stick_gain: f32,
    /// Speed at full trigger travel.
    pub trigger_gain: f32,
    /// Degrees per frame while a shoulder button is held.
    pub shoulder_gain: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.1,
            key_sensitivity: 1.0,
            speed_step: 0.01,
            stick_dead_zone: 0.2,
            trigger_dead_zone: 0.001,
            stick_gain: 2.0,
            trigger_gain: 3.0,
            shoulder_gain: 1.0,
        }
    }
}

/// Everything sampled from the input devices for one frame.
#[derive(Debug, Clone, Default)]
pub struct InputSample {
    /// Cursor offset from its reference point, in pixels.
    pub cursor_offset: Vec2,
    pub held: HeldControls,
    pub gamepad: Option<GamepadSample>,
}

/// Combine mouse, keyboard and gamepad into one frame's flight input.
///
/// Mouse and keys add together. A gamepad with five or more axes then
/// replaces pitch, roll and throttle outright and nudges the position
/// sideways with the right stick; its shoulder buttons add to yaw.
pub fn map_input(sample: &InputSample, config: &ControlConfig) -> InputDelta {
    let held = &sample.held;
    let mouse = sample.cursor_offset * config.mouse_sensitivity;
    let keys = config.key_sensitivity;

    let mut delta = InputDelta {
        pitch: mouse.y + held.axis(FlightControl::PitchUp, FlightControl::PitchDown) * -keys,
        yaw: held.axis(FlightControl::YawRight, FlightControl::YawLeft) * keys,
        roll: mouse.x + held.axis(FlightControl::RollLeft, FlightControl::RollRight) * keys,
        throttle: Throttle::Adjust(
            held.axis(FlightControl::Decelerate, FlightControl::Accelerate) * config.speed_step,
        ),
        nudge: Vec3::ZERO,
    };

    if let Some(pad) = &sample.gamepad {
        apply_gamepad(&mut delta, pad, config);
    }

    delta
}

fn apply_gamepad(delta: &mut InputDelta, pad: &GamepadSample, config: &ControlConfig) {
    if let Some(axes) =
        GamepadAxes::filtered(pad, config.stick_dead_zone, config.trigger_dead_zone)
    {
        delta.pitch = -axes.left_y * config.stick_gain;
        delta.roll = axes.left_x * config.stick_gain;
        delta.throttle = Throttle::Set(axes.triggers * config.trigger_gain);
        delta.nudge += Vec3::new(axes.right_x, 0.0, -axes.right_y);
    }

    if pad.has_shoulders() {
        if pad.button(LEFT_SHOULDER) {
            delta.yaw += config.shoulder_gain;
        }
        if pad.button(RIGHT_SHOULDER) {
            delta.yaw -= config.shoulder_gain;
        }
    }
}

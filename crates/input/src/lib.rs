//! Flight controls: raw per-frame samples mapped to an [`InputDelta`].
//!
//! # Invariants
//! - Input is sampled once per frame, before the camera steps.
//! - The mapping is platform-agnostic; windowing and gamepad backends only
//!   fill in an [`InputSample`].
//! - A connected gamepad with at least five axes overrides pitch, roll and
//!   throttle, even when its sticks rest inside the dead zones.
//!
//! [`InputDelta`]: terrainview_camera::InputDelta

mod controls;
mod cursor;
mod gamepad;
mod mapping;

pub use controls::{FlightControl, HeldControls};
pub use cursor::RelativeCursor;
pub use gamepad::{GamepadAxes, GamepadSample};
pub use mapping::{ControlConfig, InputSample, map_input};

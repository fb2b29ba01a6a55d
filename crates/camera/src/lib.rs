//! Free-flight camera for the terrain viewer.
//!
//! The camera is a position plus a `direction`/`up` frame that is rotated
//! every step by the pitch, yaw and roll of the current frame's input. There
//! is no world-up clamp: the camera can loop and roll freely.
//!
//! # Invariants
//! - A zero delta moves `position` by `direction * speed` and leaves the
//!   orientation bit-for-bit unchanged.
//! - `right` and `forward` are re-derived from the current frame every step.
//! - Speed is unbounded and may go negative (reverse flight).

mod flight;
mod projection;

pub use flight::{CameraFrame, InputDelta, Throttle, orthogonality_error};
pub use projection::Projection;

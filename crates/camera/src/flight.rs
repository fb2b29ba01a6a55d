use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// How a frame's input changes the flight speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Throttle {
    /// Add to the current speed (keyboard acceleration).
    Adjust(f32),
    /// Replace the current speed (analog trigger).
    Set(f32),
}

impl Throttle {
    pub fn apply(self, speed: f32) -> f32 {
        match self {
            Throttle::Adjust(delta) => speed + delta,
            Throttle::Set(value) => value,
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Throttle::Adjust(0.0)
    }
}

/// Control input for one frame. Angles are in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputDelta {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub throttle: Throttle,
    /// World-space translation applied directly to the position, outside
    /// the rotate-then-translate model (gamepad right stick).
    pub nudge: Vec3,
}

impl InputDelta {
    pub const ZERO: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
        throttle: Throttle::Adjust(0.0),
        nudge: Vec3::ZERO,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Position and orientation of the flying camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    pub position: Vec3,
    /// Unit forward vector.
    pub direction: Vec3,
    /// Unit up vector, kept approximately orthogonal to `direction`.
    pub up: Vec3,
    pub speed: f32,
}

impl Default for CameraFrame {
    /// High above the grid centre, looking diagonally down across it.
    fn default() -> Self {
        Self::looking_along(Vec3::new(0.0, 200.0, 0.0), Vec3::new(1.0, -1.0, 1.0), Vec3::Y)
    }
}

impl CameraFrame {
    /// Frame at `position` facing `direction`, with `up_hint` projected
    /// onto the plane orthogonal to it.
    pub fn looking_along(position: Vec3, direction: Vec3, up_hint: Vec3) -> Self {
        let direction = direction.normalize();
        let up = (up_hint - direction * direction.dot(up_hint))
            .try_normalize()
            .unwrap_or_else(|| direction.any_orthonormal_vector());
        Self {
            position,
            direction,
            up,
            speed: 0.0,
        }
    }

    /// Advance the frame by one step of input.
    pub fn step(&self, delta: &InputDelta) -> Self {
        let speed = delta.throttle.apply(self.speed);

        let right = self.direction.cross(self.up);
        let forward = self.up.cross(right);

        let position = self.position + delta.nudge + self.direction * speed;

        let pitch = delta.pitch.to_radians();
        let yaw = delta.yaw.to_radians();
        let roll = delta.roll.to_radians();

        let direction = rotate_about(self.direction, right, pitch);
        let direction = rotate_about(direction, self.up, yaw);
        // Up follows the pitch as well as the roll. Yaw is taken about the
        // old up, so combined yaw and roll input drifts the frame slightly
        // away from orthogonal.
        let up = rotate_about(self.up, forward, roll);
        let up = rotate_about(up, right, pitch);

        Self {
            position,
            direction,
            up,
            speed,
        }
    }

    /// In-place form of [`CameraFrame::step`].
    pub fn advance(&mut self, delta: &InputDelta) {
        *self = self.step(delta);
    }

    pub fn right(&self) -> Vec3 {
        self.direction.cross(self.up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.direction, self.up)
    }
}

/// Angle in radians by which `direction` and `up` miss being perpendicular.
pub fn orthogonality_error(frame: &CameraFrame) -> f32 {
    let cos = frame.direction.normalize().dot(frame.up.normalize()).clamp(-1.0, 1.0);
    (cos.acos() - std::f32::consts::FRAC_PI_2).abs()
}

/// Rotate `v` about `axis` by `angle` radians. A zero angle or a
/// degenerate axis leaves `v` untouched.
fn rotate_about(v: Vec3, axis: Vec3, angle: f32) -> Vec3 {
    if angle == 0.0 {
        return v;
    }
    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, angle) * v,
        None => {
            tracing::trace!(?axis, "skipping rotation about degenerate axis");
            v
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-4;

    fn assert_vec_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "{a} != {b}");
    }

    #[test]
    fn default_frame_is_orthonormal() {
        let frame = CameraFrame::default();
        assert_eq!(frame.position, Vec3::new(0.0, 200.0, 0.0));
        assert!((frame.direction.length() - 1.0).abs() < 1e-6);
        assert!((frame.up.length() - 1.0).abs() < 1e-6);
        assert!(orthogonality_error(&frame) < 1e-6);
        assert!(frame.up.y > 0.0);
        assert_eq!(frame.speed, 0.0);
    }

    #[test]
    fn zero_input_only_translates() {
        let mut frame = CameraFrame::default();
        frame.speed = 2.5;
        let next = frame.step(&InputDelta::ZERO);

        assert_eq!(next.direction.to_array(), frame.direction.to_array());
        assert_eq!(next.up.to_array(), frame.up.to_array());
        assert_eq!(next.speed, frame.speed);
        assert_eq!(next.position, frame.position + frame.direction * frame.speed);
    }

    #[test]
    fn throttle_adjusts_before_moving() {
        let frame = CameraFrame::looking_along(Vec3::ZERO, Vec3::X, Vec3::Y);
        let delta = InputDelta {
            throttle: Throttle::Adjust(0.01),
            ..InputDelta::ZERO
        };
        let next = frame.step(&delta);
        assert_eq!(next.speed, 0.01);
        assert_vec_near(next.position, Vec3::new(0.01, 0.0, 0.0));

        let reverse = next.step(&InputDelta {
            throttle: Throttle::Set(-3.0),
            ..InputDelta::ZERO
        });
        assert_eq!(reverse.speed, -3.0);
        assert_vec_near(reverse.position, Vec3::new(-2.99, 0.0, 0.0));
    }

    #[test]
    fn nudge_bypasses_orientation() {
        let frame = CameraFrame::looking_along(Vec3::ZERO, Vec3::Z, Vec3::Y);
        let next = frame.step(&InputDelta {
            nudge: Vec3::new(0.5, 0.0, -0.25),
            ..InputDelta::ZERO
        });
        assert_eq!(next.position, Vec3::new(0.5, 0.0, -0.25));
        assert_eq!(next.direction, frame.direction);
    }

    #[test]
    fn pitch_tilts_direction_and_up_together() {
        // Looking down -Z with +Y up: right is +X.
        let frame = CameraFrame::looking_along(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let next = frame.step(&InputDelta {
            pitch: 90.0,
            ..InputDelta::ZERO
        });
        assert_vec_near(next.direction, Vec3::Y);
        assert_vec_near(next.up, Vec3::Z);
    }

    #[test]
    fn yaw_turns_about_up() {
        let frame = CameraFrame::looking_along(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let next = frame.step(&InputDelta {
            yaw: 90.0,
            ..InputDelta::ZERO
        });
        assert_vec_near(next.direction, Vec3::NEG_X);
        assert_eq!(next.up, Vec3::Y);
    }

    #[test]
    fn roll_turns_up_about_forward() {
        let frame = CameraFrame::looking_along(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let next = frame.step(&InputDelta {
            roll: 90.0,
            ..InputDelta::ZERO
        });
        assert_eq!(next.direction, Vec3::NEG_Z);
        assert_vec_near(next.up, Vec3::X);
    }

    #[test]
    fn single_axis_steps_stay_orthogonal() {
        let frame = CameraFrame::default();
        for delta in [
            InputDelta { pitch: 7.0, ..InputDelta::ZERO },
            InputDelta { yaw: -13.0, ..InputDelta::ZERO },
            InputDelta { roll: 25.0, ..InputDelta::ZERO },
            InputDelta { pitch: 3.0, roll: 4.0, ..InputDelta::ZERO },
        ] {
            let next = frame.step(&delta);
            assert!(orthogonality_error(&next) < TOLERANCE, "{delta:?}");
        }
    }

    #[test]
    fn yaw_with_roll_drifts_by_their_product() {
        let frame = CameraFrame::looking_along(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let (yaw, roll) = (2.0_f32, 3.0_f32);
        let next = frame.step(&InputDelta {
            yaw,
            roll,
            ..InputDelta::ZERO
        });
        let expected = (yaw.to_radians().sin() * roll.to_radians().sin()).asin();
        assert!((orthogonality_error(&next) - expected).abs() < TOLERANCE);
    }

    #[test]
    fn long_pitch_loop_keeps_unit_length() {
        let mut frame = CameraFrame::default();
        let delta = InputDelta {
            pitch: 1.0,
            ..InputDelta::ZERO
        };
        for _ in 0..10_000 {
            frame.advance(&delta);
        }
        assert!((frame.direction.length() - 1.0).abs() < 1e-3);
        assert!((frame.up.length() - 1.0).abs() < 1e-3);
        assert!(orthogonality_error(&frame) < 1e-3);
    }

    #[test]
    fn view_matrix_maps_target_onto_negative_z() {
        let frame = CameraFrame::default();
        let target = frame.position + frame.direction * 10.0;
        let in_view = frame.view_matrix().transform_point3(target);
        // The eye sits 200 units up, so f32 rounding in the view transform
        // is a few ulps at that magnitude.
        assert!(
            (in_view - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-3,
            "{in_view}"
        );
    }
}

use glam::Mat4;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 45.0_f32.to_radians(),
            aspect: 640.0 / 480.0,
            near: 1.0,
            far: 10_000.0,
        }
    }
}

impl Projection {
    /// Update the aspect ratio for a new framebuffer size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn resize_guards_zero_height() {
        let mut projection = Projection::default();
        projection.resize(1920, 0);
        assert_eq!(projection.aspect, 1920.0);
        projection.resize(800, 400);
        assert_eq!(projection.aspect, 2.0);
    }

    #[test]
    fn near_and_far_map_to_depth_range() {
        let m = Projection::default().matrix();
        let near = m.project_point3(Vec3::new(0.0, 0.0, -1.0));
        let far = m.project_point3(Vec3::new(0.0, 0.0, -10_000.0));
        assert!(near.z.abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-5);
    }
}

//! Perspective camera.

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    target: Vec3,
    projection: Mat4,
    view: Mat4,
}

impl PerspectiveCamera {
    /// Camera on the +Z axis at `config.distance`, looking at the origin.
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            fov_deg: config.fov_deg,
            aspect,
            near: config.near,
            far: config.far,
            position: Vec3::new(0.0, 0.0, config.distance),
            target: Vec3::ZERO,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera.look_at(Vec3::ZERO);
        camera
    }

    /// Recompute the projection from fov/aspect/near/far.
    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh_gl(self.fov_deg.to_radians(), self.aspect, self.near, self.far);
    }

    /// Re-aim at `target` from the current position.
    ///
    /// An eye on top of the target, or looking straight along the up axis,
    /// keeps the identity orientation.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
        let forward = target - self.position;
        self.view = if forward.cross(Vec3::Y).length_squared() > f32::EPSILON {
            Mat4::look_at_rh(self.position, target, Vec3::Y)
        } else {
            Mat4::from_translation(-self.position)
        };
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_view_axis() {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 2.0);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 500.0));
        assert_eq!(camera.target(), Vec3::ZERO);
        let origin = camera.view().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -500.0), 1e-3));
    }

    #[test]
    fn target_lands_on_negative_z() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        camera.position = Vec3::new(300.0, 200.0, 100.0);
        camera.look_at(Vec3::ZERO);
        let p = camera.view().transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -camera.position.length()), 1e-3));
    }

    #[test]
    fn degenerate_aim_stays_finite() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        camera.position = Vec3::new(1.0, 2.0, 3.0);
        camera.look_at(camera.position);
        assert!(camera.view().is_finite());
        camera.position = Vec3::new(0.0, 50.0, 0.0);
        camera.look_at(Vec3::ZERO);
        assert!(camera.view().is_finite());
    }

    #[test]
    fn aspect_change_needs_projection_update() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        let before = *camera.projection();
        camera.aspect = 2.0;
        assert_eq!(*camera.projection(), before);
        camera.update_projection_matrix();
        assert!((camera.projection().x_axis.x - before.x_axis.x / 2.0).abs() < 1e-6);
    }

    #[test]
    fn projection_matches_gl_clip_range() {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        let near = camera.projection().project_point3(Vec3::new(0.0, 0.0, -camera.near));
        let far = camera.projection().project_point3(Vec3::new(0.0, 0.0, -camera.far));
        assert!((near.z + 1.0).abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }
}

//! # Camera
//!
//! A [`Transform`] specialization that keeps the horizontal and vertical
//! field-of-view coupled and caches the view/projection matrices. The two FOV
//! values are never set independently: changing one recomputes the other from
//! the current aspect ratio, so they always describe the same frustum.
//!
//! Every transform-mutating call recomputes `view = inverse(transform)`
//! immediately; there is no dirty flag, the matrices are always current.

use cgmath::{perspective, Deg, Matrix4, SquareMatrix, Vector3};
use log::warn;

use crate::gfx::transform::Transform;

/// FOV clamp range, degrees.
pub const FOV_MIN_DEGREES: f32 = 1.0;
pub const FOV_MAX_DEGREES: f32 = 120.0;

/// Near and far clip planes shared by every camera.
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 500.0;

/// Derives one field-of-view from the other.
///
/// `ratio` is the aspect ratio when deriving vertical from horizontal and its
/// reciprocal when deriving horizontal from vertical. The formula is the
/// inherited one and is kept verbatim.
fn coupled_fov(fov_degrees: f32, ratio: f32) -> f32 {
    (2.0 * ((fov_degrees.to_radians() / 2.0).tan() * ratio).atan()).to_degrees()
}

/// Perspective camera with coupled FOVs and cached matrices.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    transform: Transform,
    fov_h_degrees: f32,
    fov_v_degrees: f32,
    aspect_ratio: f32,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl Camera {
    /// Creates a camera at the origin from a vertical FOV and aspect ratio.
    pub fn new(fov_v_degrees: f32, aspect_ratio: f32) -> Self {
        let fov_v_degrees = fov_v_degrees.clamp(FOV_MIN_DEGREES, FOV_MAX_DEGREES);
        let mut camera = Self {
            transform: Transform::new(),
            fov_h_degrees: coupled_fov(fov_v_degrees, 1.0 / aspect_ratio),
            fov_v_degrees,
            aspect_ratio,
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        };
        camera.rebuild_view();
        camera.rebuild_projection();
        camera
    }

    pub fn fov_h_degrees(&self) -> f32 {
        self.fov_h_degrees
    }

    pub fn fov_v_degrees(&self) -> f32 {
        self.fov_v_degrees
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    /// `projection * view`, the matrix pushed to shaders each frame.
    pub fn world_to_camera(&self) -> Matrix4<f32> {
        self.projection * self.view
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.position()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Adds `delta` degrees to the horizontal FOV, clamps, and re-derives the
    /// vertical FOV for the current aspect ratio.
    pub fn modify_fov_h(&mut self, delta: f32) {
        self.fov_h_degrees = (self.fov_h_degrees + delta).clamp(FOV_MIN_DEGREES, FOV_MAX_DEGREES);
        self.fov_v_degrees = coupled_fov(self.fov_h_degrees, self.aspect_ratio);
        self.rebuild_projection();
    }

    /// Adds `delta` degrees to the vertical FOV, clamps, and re-derives the
    /// horizontal FOV for the current aspect ratio.
    pub fn modify_fov_v(&mut self, delta: f32) {
        self.fov_v_degrees = (self.fov_v_degrees + delta).clamp(FOV_MIN_DEGREES, FOV_MAX_DEGREES);
        self.fov_h_degrees = coupled_fov(self.fov_v_degrees, 1.0 / self.aspect_ratio);
        self.rebuild_projection();
    }

    /// Window-resize hook: rebuilds the projection and re-derives the
    /// horizontal FOV from the vertical one.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.fov_h_degrees = coupled_fov(self.fov_v_degrees, 1.0 / self.aspect_ratio);
        self.rebuild_projection();
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.transform.set_position(position);
        self.rebuild_view();
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.transform.translate(offset);
        self.rebuild_view();
    }

    pub fn set_axes(&mut self, right: Vector3<f32>, up: Vector3<f32>, forward: Vector3<f32>) {
        self.transform.set_axes(right, up, forward);
        self.rebuild_view();
    }

    pub fn set_forward(&mut self, forward: Vector3<f32>) {
        self.transform.set_forward(forward);
        self.rebuild_view();
    }

    pub fn set_matrix(&mut self, matrix: Matrix4<f32>) {
        self.transform.set_matrix(matrix);
        self.rebuild_view();
    }

    pub fn rotate(&mut self, axis: Vector3<f32>, angle: Deg<f32>) {
        self.transform.rotate(axis, angle);
        self.rebuild_view();
    }

    fn rebuild_view(&mut self) {
        self.view = self.transform.matrix().invert().unwrap_or_else(|| {
            warn!("camera transform is singular, view matrix reset to identity");
            Matrix4::identity()
        });
    }

    fn rebuild_projection(&mut self) {
        self.projection = perspective(
            Deg(self.fov_v_degrees),
            self.aspect_ratio,
            NEAR_PLANE,
            FAR_PLANE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ASPECT: f32 = 16.0 / 9.0;

    #[test]
    fn fovs_stay_coupled_when_either_changes() {
        let mut camera = Camera::new(45.0, ASPECT);
        camera.modify_fov_v(10.0);
        assert_relative_eq!(camera.fov_v_degrees(), 55.0, epsilon = 1e-4);
        assert_relative_eq!(
            camera.fov_h_degrees(),
            coupled_fov(55.0, 1.0 / ASPECT),
            epsilon = 1e-4
        );

        camera.modify_fov_h(-5.0);
        assert_relative_eq!(
            camera.fov_v_degrees(),
            coupled_fov(camera.fov_h_degrees(), ASPECT),
            epsilon = 1e-4
        );
    }

    #[test]
    fn fov_clamps_to_the_valid_range() {
        let mut camera = Camera::new(45.0, ASPECT);
        camera.modify_fov_v(500.0);
        assert_relative_eq!(camera.fov_v_degrees(), FOV_MAX_DEGREES);
        camera.modify_fov_v(-500.0);
        assert_relative_eq!(camera.fov_v_degrees(), FOV_MIN_DEGREES);
    }

    #[test]
    fn transform_mutations_recompute_the_view_matrix() {
        let mut camera = Camera::new(45.0, ASPECT);
        camera.set_position(Vector3::new(3.0, -1.0, 7.0));
        let expected = camera.transform().matrix().invert().unwrap();
        assert_relative_eq!(camera.view(), expected, epsilon = 1e-6);

        camera.translate(Vector3::new(0.0, 2.0, 0.0));
        let expected = camera.transform().matrix().invert().unwrap();
        assert_relative_eq!(camera.view(), expected, epsilon = 1e-6);
    }

    #[test]
    fn world_to_camera_is_projection_times_view() {
        let mut camera = Camera::new(60.0, ASPECT);
        camera.set_position(Vector3::new(0.0, 1.0, -4.0));
        assert_relative_eq!(
            camera.world_to_camera(),
            camera.projection() * camera.view(),
            epsilon = 1e-6
        );
    }
}

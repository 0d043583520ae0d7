//! # Transform
//!
//! Affine pose used by every positioned object in the scene: a cgmath
//! `Matrix4<f32>` whose column 3 is the position and whose columns 0–2 hold
//! the right/up/forward axes. Axes are re-normalized on every set, and the
//! single-axis setters derive the other two axes from a fixed hint so the
//! basis stays orthonormal.
//!
//! ## Sign convention
//!
//! The stored right and forward columns are negated relative to the values
//! passed to the setters (a horizontal-flip convention carried over from the
//! renderer this engine's coordinate handling descends from). [`Transform::right`]
//! and [`Transform::forward`] negate again on the way out, so
//! `set_forward(v)` followed by `forward()` returns `v`. The raw matrix keeps
//! the flip; changing it breaks on-screen orientation.

use cgmath::{Deg, InnerSpace, Matrix4, SquareMatrix, Vector3};

/// World-up hint used when deriving axes in `set_right` and `set_forward`.
const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Hint axis used by `set_up`. Deliberately different from [`WORLD_UP`]; the
/// inherited behavior derives the basis from the world forward axis here and
/// existing scenes depend on it.
const WORLD_FORWARD: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);

/// Affine pose: position plus three orthonormal axes, stored as a 4x4 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw pose matrix, sign convention included.
    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    /// Replaces the whole pose matrix.
    pub fn set_matrix(&mut self, matrix: Matrix4<f32>) {
        self.matrix = matrix;
    }

    pub fn position(&self) -> Vector3<f32> {
        self.matrix.w.truncate()
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.matrix.w = position.extend(1.0);
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.matrix.w += offset.extend(0.0);
    }

    /// Composes an axis-angle rotation onto the pose.
    pub fn rotate(&mut self, axis: Vector3<f32>, angle: Deg<f32>) {
        self.matrix = Matrix4::from_axis_angle(axis.normalize(), angle) * self.matrix;
    }

    /// Sets all three axes at once. Each input is normalized independently;
    /// the right and forward columns are stored negated (see module docs).
    pub fn set_axes(&mut self, right: Vector3<f32>, up: Vector3<f32>, forward: Vector3<f32>) {
        self.matrix.x = (-right.normalize()).extend(0.0);
        self.matrix.y = up.normalize().extend(0.0);
        self.matrix.z = (-forward.normalize()).extend(0.0);
    }

    /// Sets the right axis and derives up/forward against the world-up hint.
    pub fn set_right(&mut self, right: Vector3<f32>) {
        let forward = right.cross(WORLD_UP).normalize();
        let up = forward.cross(right);
        self.set_axes(right, up, forward);
    }

    /// Sets the up axis and derives the others against the world-forward
    /// hint. Note the hint axis differs from `set_right`/`set_forward`.
    pub fn set_up(&mut self, up: Vector3<f32>) {
        let right = up.cross(WORLD_FORWARD).normalize();
        let forward = up.cross(right);
        self.set_axes(right, up, forward);
    }

    /// Sets the forward axis and derives right/up against the world-up hint.
    pub fn set_forward(&mut self, forward: Vector3<f32>) {
        let right = WORLD_UP.cross(forward).normalize();
        let up = forward.cross(right);
        self.set_axes(right, up, forward);
    }

    /// The right axis, un-flipped.
    pub fn right(&self) -> Vector3<f32> {
        -self.matrix.x.truncate()
    }

    /// The up axis. Not part of the flip convention.
    pub fn up(&self) -> Vector3<f32> {
        self.matrix.y.truncate()
    }

    /// The forward axis, un-flipped.
    pub fn forward(&self) -> Vector3<f32> {
        -self.matrix.z.truncate()
    }
}

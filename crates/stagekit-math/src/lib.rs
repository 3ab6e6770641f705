//! # StageKit Math
//!
//! Small linear-algebra kit for the StageKit demos.
//!
//! ## Conventions
//!
//! - [`Matrix4`] is stored column-major, exactly the layout `uniformMatrix4fv`
//!   expects with `transpose = false`.
//! - Transforms act on column vectors, so `a.multiply(&b)` applies `b` first.
//! - The `*_self` operations follow DOMMatrix: `translate_self` / `rotate_self`
//!   post-multiply, `pre_multiply_self` pre-multiplies.
//! - Angles given to `rotate_self` are degrees.

use std::ops::{Add, Mul, Neg, Sub};

pub mod camera;

pub use camera::{look_at, perspective_projection, Perspective, MIN_NEAR_PLANE};

// ==================== Vec3 ====================

/// A 3D point or direction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Scale to unit length.
    ///
    /// A zero vector yields NaN components; callers must not pass one.
    pub fn normalize(self) -> Vec3 {
        self * (1.0 / self.length())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

// ==================== Matrix4 ====================

/// Column-major 4x4 transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    m: [f64; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4 {
    /// Create identity matrix.
    pub const fn identity() -> Self {
        Self {
            m: [
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Build from 16 values in column-major order.
    pub const fn from_cols_array(m: [f64; 16]) -> Self {
        Self { m }
    }

    /// The 16 values in column-major order.
    pub fn to_cols_array(&self) -> [f64; 16] {
        self.m
    }

    /// Narrow to `f32` for uniform upload.
    pub fn to_f32_array(&self) -> [f32; 16] {
        self.m.map(|v| v as f32)
    }

    /// Element at `col`, `row`.
    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.m[col * 4 + row]
    }

    /// Create translation matrix.
    pub fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        let mut out = Self::identity();
        out.m[12] = tx;
        out.m[13] = ty;
        out.m[14] = tz;
        out
    }

    /// Rotation about the X axis (degrees).
    pub fn rotation_x(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_cols_array([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, s, 0.0, //
            0.0, -s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Rotation about the Y axis (degrees).
    pub fn rotation_y(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_cols_array([
            c, 0.0, -s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Rotation about the Z axis (degrees).
    pub fn rotation_z(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_cols_array([
            c, s, 0.0, 0.0, //
            -s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// `self × rhs`.
    pub fn multiply(&self, rhs: &Matrix4) -> Matrix4 {
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = (0..4)
                    .map(|k| self.m[k * 4 + row] * rhs.m[col * 4 + k])
                    .sum();
            }
        }
        Matrix4 { m: out }
    }

    /// `self = self × rhs`.
    pub fn multiply_self(&mut self, rhs: &Matrix4) -> &mut Self {
        *self = self.multiply(rhs);
        self
    }

    /// `self = lhs × self`.
    pub fn pre_multiply_self(&mut self, lhs: &Matrix4) -> &mut Self {
        *self = lhs.multiply(self);
        self
    }

    /// Post-multiply a translation.
    pub fn translate_self(&mut self, tx: f64, ty: f64, tz: f64) -> &mut Self {
        self.multiply_self(&Self::translation(tx, ty, tz))
    }

    /// Post-multiply rotations about Z, then Y, then X (degrees), like
    /// `DOMMatrix.rotateSelf(rotX, rotY, rotZ)`.
    pub fn rotate_self(&mut self, rot_x: f64, rot_y: f64, rot_z: f64) -> &mut Self {
        self.multiply_self(&Self::rotation_z(rot_z))
            .multiply_self(&Self::rotation_y(rot_y))
            .multiply_self(&Self::rotation_x(rot_x))
    }

    /// Apply to a point (w = 1), returning homogeneous coordinates.
    pub fn transform_point(&self, p: Vec3) -> [f64; 4] {
        let v = [p.x, p.y, p.z, 1.0];
        let mut out = [0.0; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|k| self.m[k * 4 + row] * v[k]).sum();
        }
        out
    }

    /// Compare element-wise within `epsilon`.
    pub fn approx_eq(&self, other: &Matrix4, epsilon: f64) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        self.multiply(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_point(actual: [f64; 4], expected: [f64; 3]) {
        for i in 0..3 {
            assert!(
                (actual[i] - expected[i]).abs() < 1e-9,
                "component {i}: {actual:?} vs {expected:?}"
            );
        }
    }

    #[test]
    fn test_vec3_cross_follows_right_hand_rule() {
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert_eq!(Vec3::Y.cross(Vec3::Z), Vec3::X);
        assert_eq!(Vec3::Z.cross(Vec3::X), Vec3::Y);
    }

    #[test]
    fn test_vec3_normalize() {
        let v = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < EPS);
        assert!((v.x - 0.6).abs() < EPS);
        assert!(!Vec3::ZERO.normalize().is_finite());
    }

    #[test]
    fn test_identity_multiply() {
        let t = Matrix4::translation(1.0, 2.0, 3.0);
        assert_eq!(Matrix4::identity().multiply(&t), t);
        assert_eq!(t.multiply(&Matrix4::identity()), t);
    }

    #[test]
    fn test_translation_layout_is_column_major() {
        let t = Matrix4::translation(1.0, 2.0, 3.0);
        assert_eq!(t.get(3, 0), 1.0);
        assert_eq!(t.get(3, 1), 2.0);
        assert_eq!(t.get(3, 2), 3.0);
        assert_eq!(t.to_cols_array()[12..15], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_pre_multiply_applies_lhs_last() {
        // model moves +1 on x, camera then moves -5 on z
        let camera = Matrix4::translation(0.0, 0.0, -5.0);
        let mut mvp = Matrix4::translation(1.0, 0.0, 0.0);
        mvp.pre_multiply_self(&camera);

        assert_eq!(mvp, camera.multiply(&Matrix4::translation(1.0, 0.0, 0.0)));
        assert_point(mvp.transform_point(Vec3::ZERO), [1.0, 0.0, -5.0]);
    }

    #[test]
    fn test_rotation_y_quarter_turn() {
        let r = Matrix4::rotation_y(90.0);
        assert_point(r.transform_point(Vec3::X), [0.0, 0.0, -1.0]);
        assert_point(r.transform_point(Vec3::Z), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rotation_x_and_z_quarter_turn() {
        assert_point(
            Matrix4::rotation_x(90.0).transform_point(Vec3::Y),
            [0.0, 0.0, 1.0],
        );
        assert_point(
            Matrix4::rotation_z(90.0).transform_point(Vec3::X),
            [0.0, 1.0, 0.0],
        );
    }

    #[test]
    fn test_rotate_self_order_is_z_then_y_then_x() {
        let mut m = Matrix4::identity();
        m.rotate_self(10.0, 20.0, 30.0);

        let expected = Matrix4::rotation_z(30.0)
            * Matrix4::rotation_y(20.0)
            * Matrix4::rotation_x(10.0);
        assert!(m.approx_eq(&expected, EPS));
    }

    #[test]
    fn test_translate_then_rotate_chain() {
        // camera setup used by the cube stages
        let mut m = Matrix4::identity();
        m.translate_self(0.0, 0.0, -5.0).rotate_self(0.0, 33.0, 0.0);

        let expected = Matrix4::translation(0.0, 0.0, -5.0) * Matrix4::rotation_y(33.0);
        assert!(m.approx_eq(&expected, EPS));
        // rotation keeps the origin in place, so only the translation shows
        assert_point(m.transform_point(Vec3::ZERO), [0.0, 0.0, -5.0]);
    }

    #[test]
    fn test_to_f32_array() {
        let m = Matrix4::translation(0.5, -1.25, 2.0);
        let f = m.to_f32_array();
        assert_eq!(f[0], 1.0f32);
        assert_eq!(f[12], 0.5f32);
        assert_eq!(f[13], -1.25f32);
    }
}

//! Projection and view matrices.
//!
//! Both builders are pure. Neither guards degenerate input: a zero viewport
//! height, `far == near`, or `eye == center` produce infinities or NaN.

use crate::{Matrix4, Vec3};

/// Smallest near-plane distance a projection is built with.
pub const MIN_NEAR_PLANE: f64 = 0.01;

/// Build an OpenGL-style (right-handed, clip z in -w..w) perspective projection.
///
/// The focal term is `1 / tan(fov)` over the *full* vertical field of view,
/// not the textbook half angle, so the visible cone is wider than
/// `fov_degrees` suggests. Stages are authored against this behaviour.
///
/// `near` below [`MIN_NEAR_PLANE`] is raised to it.
pub fn perspective_projection(
    fov_degrees: f64,
    viewport_width: f64,
    viewport_height: f64,
    near: f64,
    far: f64,
) -> Matrix4 {
    let fov = fov_degrees.to_radians();
    let aspect = viewport_width / viewport_height;
    let near = if near < MIN_NEAR_PLANE { MIN_NEAR_PLANE } else { near };
    let focal = 1.0 / fov.tan();
    let inverse_depth = 1.0 / (near - far);

    Matrix4::from_cols_array([
        focal / aspect, 0.0, 0.0, 0.0, //
        0.0, focal, 0.0, 0.0, //
        0.0, 0.0, (far + near) * inverse_depth, -1.0, //
        0.0, 0.0, 2.0 * near * far * inverse_depth, 0.0,
    ])
}

/// Build a view matrix looking from `eye` towards `center`.
///
/// `up` only picks the roll; it need not be unit length or orthogonal to the
/// view direction, but must not be parallel to it.
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Matrix4 {
    let z = (eye - center).normalize();
    let x = up.cross(z).normalize();
    let y = z.cross(x).normalize();

    Matrix4::from_cols_array([
        x.x, y.x, z.x, 0.0, //
        x.y, y.y, z.y, 0.0, //
        x.z, y.z, z.z, 0.0, //
        -x.dot(eye), -y.dot(eye), -z.dot(eye), 1.0,
    ])
}

/// Perspective parameters that stay fixed while the viewport may change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for Perspective {
    fn default() -> Self {
        Self {
            fov_degrees: 30.0,
            near: MIN_NEAR_PLANE,
            far: 100.0,
        }
    }
}

impl Perspective {
    pub fn new(fov_degrees: f64, near: f64, far: f64) -> Self {
        Self {
            fov_degrees,
            near,
            far,
        }
    }

    /// Projection for a viewport of the given size.
    pub fn matrix(&self, viewport_width: f64, viewport_height: f64) -> Matrix4 {
        perspective_projection(
            self.fov_degrees,
            viewport_width,
            viewport_height,
            self.near,
            self.far,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn reference_depth_terms(near: f64, far: f64) -> (f64, f64) {
        let inv = 1.0 / (near - far);
        ((far + near) * inv, 2.0 * near * far * inv)
    }

    #[test]
    fn test_perspective_divide_column() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let fov = rng.gen_range(1.0..179.0);
            let width = rng.gen_range(1.0..4096.0);
            let height = rng.gen_range(1.0..4096.0);
            let near = rng.gen_range(MIN_NEAR_PLANE..10.0);
            let far = near + rng.gen_range(0.5..1000.0);

            let m = perspective_projection(fov, width, height, near, far);
            assert_eq!(m.get(2, 3), -1.0);
            assert_eq!(m.get(3, 3), 0.0);
            assert_eq!(m.get(0, 3), 0.0);
            assert_eq!(m.get(1, 3), 0.0);
        }
    }

    #[test]
    fn test_near_plane_is_clamped() {
        let (zz, zw) = reference_depth_terms(MIN_NEAR_PLANE, 100.0);
        for near in [0.0, -1.0, -250.0, 0.005] {
            let m = perspective_projection(30.0, 640.0, 480.0, near, 100.0);
            assert_eq!(m.get(2, 2), zz, "near = {near}");
            assert_eq!(m.get(3, 2), zw, "near = {near}");
        }
    }

    #[test]
    fn test_near_plane_above_minimum_is_kept() {
        let (zz, zw) = reference_depth_terms(0.5, 20.0);
        let m = perspective_projection(30.0, 640.0, 480.0, 0.5, 20.0);
        assert_eq!(m.get(2, 2), zz);
        assert_eq!(m.get(3, 2), zw);
    }

    #[test]
    fn test_focal_uses_full_field_of_view() {
        // tan(45 deg) == 1, the half-angle formula would give 1/tan(22.5 deg)
        let m = perspective_projection(45.0, 100.0, 100.0, 1.0, 10.0);
        assert!((m.get(1, 1) - 1.0).abs() < 1e-12);
        assert!((m.get(0, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_aspect_scales_x_only() {
        let m = perspective_projection(30.0, 200.0, 100.0, 0.1, 10.0);
        assert!((m.get(0, 0) * 2.0 - m.get(1, 1)).abs() < 1e-12);
    }

    #[test]
    fn test_near_and_far_map_to_clip_bounds() {
        let m = perspective_projection(30.0, 1.0, 1.0, 1.0, 10.0);
        let near = m.transform_point(Vec3::new(0.0, 0.0, -1.0));
        let far = m.transform_point(Vec3::new(0.0, 0.0, -10.0));
        assert!((near[2] / near[3] + 1.0).abs() < 1e-12);
        assert!((far[2] / far[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_height_is_degenerate() {
        let m = perspective_projection(30.0, 640.0, 0.0, 0.1, 10.0);
        assert!(!m.get(0, 0).is_finite() || m.get(0, 0) == 0.0);
    }

    #[test]
    fn test_look_at_down_negative_z() {
        let m = look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let expected = Matrix4::translation(0.0, 0.0, -5.0);
        assert!(m.approx_eq(&expected, 1e-12), "{m:?}");
    }

    #[test]
    fn test_look_at_up_magnitude_does_not_matter() {
        let eye = Vec3::new(3.0, 2.0, 7.0);
        let center = Vec3::new(-1.0, 0.5, 0.0);
        let a = look_at(eye, center, Vec3::Y);
        let b = look_at(eye, center, Vec3::new(0.0, 42.0, 0.0));
        assert!(a.approx_eq(&b, 1e-12));
    }

    #[test]
    fn test_look_at_maps_eye_to_origin_and_center_to_negative_z() {
        let eye = Vec3::new(4.0, -2.0, 3.0);
        let center = Vec3::new(1.0, 1.0, -1.0);
        let m = look_at(eye, center, Vec3::Y);

        let e = m.transform_point(eye);
        assert!(e[0].abs() < 1e-9 && e[1].abs() < 1e-9 && e[2].abs() < 1e-9);

        let c = m.transform_point(center);
        let distance = (eye - center).length();
        assert!(c[0].abs() < 1e-9 && c[1].abs() < 1e-9);
        assert!((c[2] + distance).abs() < 1e-9);
    }

    #[test]
    fn test_look_at_basis_is_orthonormal() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut checked = 0;
        while checked < 20 {
            let mut point = || {
                Vec3::new(
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                )
            };
            let eye = point();
            let center = point();
            let up = point();

            let forward = (eye - center).normalize();
            // skip coincident points and up hints nearly parallel to the view
            if (eye - center).length() < 1e-3 || up.cross(forward).length() < 1e-3 {
                continue;
            }
            checked += 1;

            let m = look_at(eye, center, up);
            let rows = [
                Vec3::new(m.get(0, 0), m.get(1, 0), m.get(2, 0)),
                Vec3::new(m.get(0, 1), m.get(1, 1), m.get(2, 1)),
                Vec3::new(m.get(0, 2), m.get(1, 2), m.get(2, 2)),
            ];
            for i in 0..3 {
                for j in 0..3 {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    let d = rows[i].dot(rows[j]);
                    assert!(
                        (d - expected).abs() < 1e-6,
                        "rows {i},{j}: dot = {d} for eye={eye:?} center={center:?} up={up:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_look_at_coincident_points_yield_nan() {
        let p = Vec3::new(1.0, 1.0, 1.0);
        let m = look_at(p, p, Vec3::Y);
        assert!(m.to_cols_array().iter().any(|v| v.is_nan()));
    }

    #[test]
    fn test_perspective_struct_matches_free_function() {
        let p = Perspective::default();
        assert_eq!(
            p.matrix(640.0, 480.0),
            perspective_projection(30.0, 640.0, 480.0, 0.01, 100.0)
        );
    }
}

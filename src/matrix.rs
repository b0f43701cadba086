//! 4×4 homogeneous transform algebra.
//!
//! [`Matrix`] is a small value type over a single [`glam::Mat4`]. It exists so the
//! rest of the pipeline can compose transforms in *application order*: every
//! builder call right-multiplies an elementary transform onto the current matrix,
//! so the first call is the first thing that happens to a point.
//!
//! ```
//! use phosphor::{Matrix, Vec3};
//!
//! // Scale a point, then move it.
//! let mut m = Matrix::identity();
//! m.scale(2.0, 2.0, 2.0).translate(1.0, 0.0, 0.0);
//!
//! let p = m.transform_point(Vec3::new(1.0, 1.0, 1.0)).unwrap();
//! assert_eq!(p.position, Vec3::new(3.0, 2.0, 2.0));
//! ```
//!
//! # Element Layout
//!
//! [`Matrix::elements`] exposes the classic 16-float column-major layout: the
//! translation of an affine matrix lives in elements 12, 13 and 14.

use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::TAU;
use std::ops::Mul;

/// A matrix is treated as singular when its determinant is at or below this
/// fraction of the product of its column lengths.
pub const SINGULAR_EPSILON: f32 = 1e-8;

/// Homogeneous `w` values with a magnitude below this cannot be divided by.
pub const W_EPSILON: f32 = 1e-6;

/// Errors raised by matrix operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatrixError {
    /// The matrix has no inverse.
    SingularMatrix { determinant: f32 },
    /// The point at `index` landed on (or next to) the `w = 0` plane.
    DegenerateProjection { index: usize, w: f32 },
}

impl std::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixError::SingularMatrix { determinant } => {
                write!(f, "matrix is singular (determinant {})", determinant)
            }
            MatrixError::DegenerateProjection { index, w } => {
                write!(f, "point {} has degenerate homogeneous w ({})", index, w)
            }
        }
    }
}

impl std::error::Error for MatrixError {}

/// A point after transformation and perspective divide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// Dehomogenized position (`xyz / w`).
    pub position: Vec3,
    /// The `w` component before the divide (clip-space w).
    pub w: f32,
}

/// Anything that can be promoted to a homogeneous 4-tuple.
///
/// Three-component inputs get `w = 1`.
pub trait IntoHomogeneous: Copy {
    fn into_homogeneous(self) -> Vec4;
}

impl IntoHomogeneous for Vec3 {
    fn into_homogeneous(self) -> Vec4 {
        self.extend(1.0)
    }
}

impl IntoHomogeneous for Vec4 {
    fn into_homogeneous(self) -> Vec4 {
        self
    }
}

impl IntoHomogeneous for [f32; 3] {
    fn into_homogeneous(self) -> Vec4 {
        Vec3::from(self).extend(1.0)
    }
}

impl IntoHomogeneous for [f32; 4] {
    fn into_homogeneous(self) -> Vec4 {
        Vec4::from(self)
    }
}

/// A 4×4 transform in homogeneous coordinates.
///
/// Composition reads in application order: `a.multiply(&b)` (or `a * b`)
/// produces a matrix that applies `a` to a point first and `b` second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    // Stored with glam's column-vector convention, so `inner * p` transforms `p`.
    inner: Mat4,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        inner: Mat4::IDENTITY,
    };

    /// Creates the multiplicative identity.
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Builds a right-handed perspective projection.
    ///
    /// `fov` is the vertical field of view in radians and `aspect` is
    /// `width / height`. Points in front of the camera have negative z and come
    /// out with `w = -z`.
    pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            inner: Mat4::perspective_rh_gl(fov, aspect, near, far),
        }
    }

    /// Creates a matrix from 16 column-major elements.
    pub fn from_elements(elements: [f32; 16]) -> Self {
        Self {
            inner: Mat4::from_cols_array(&elements),
        }
    }

    /// Returns the 16 column-major elements.
    pub fn elements(&self) -> [f32; 16] {
        self.inner.to_cols_array()
    }

    /// Resets this matrix to the identity.
    pub fn set_identity(&mut self) -> &mut Self {
        self.inner = Mat4::IDENTITY;
        self
    }

    /// Replaces the contents with a perspective projection (not composed).
    pub fn set_perspective(&mut self, fov: f32, aspect: f32, near: f32, far: f32) -> &mut Self {
        *self = Self::perspective(fov, aspect, near, far);
        self
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.then(Mat4::from_translation(Vec3::new(x, y, z)))
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.then(Mat4::from_scale(Vec3::new(x, y, z)))
    }

    /// Rotates about the x axis (right-hand rule).
    pub fn rotate_x(&mut self, angle: f32) -> &mut Self {
        self.then(Mat4::from_rotation_x(angle))
    }

    /// Rotates about the y axis (right-hand rule).
    pub fn rotate_y(&mut self, angle: f32) -> &mut Self {
        self.then(Mat4::from_rotation_y(angle))
    }

    /// Rotates about the z axis (right-hand rule).
    pub fn rotate_z(&mut self, angle: f32) -> &mut Self {
        self.then(Mat4::from_rotation_z(angle))
    }

    /// Replaces `self` with `self * other`: `other` is applied after `self`.
    pub fn multiply(&mut self, other: &Matrix) -> &mut Self {
        self.then(other.inner)
    }

    fn then(&mut self, next: Mat4) -> &mut Self {
        self.inner = next * self.inner;
        self
    }

    pub fn determinant(&self) -> f32 {
        self.inner.determinant()
    }

    /// Inverts this matrix in place.
    ///
    /// On failure the contents are left untouched.
    pub fn invert(&mut self) -> Result<(), MatrixError> {
        *self = self.inverse()?;
        Ok(())
    }

    /// Returns the inverse, or [`MatrixError::SingularMatrix`] when the
    /// determinant is negligible next to the column lengths.
    ///
    /// The threshold scales with the matrix, so uniformly tiny (or huge) scales
    /// still invert.
    pub fn inverse(&self) -> Result<Matrix, MatrixError> {
        let determinant = self.determinant();
        let volume = (0..4).map(|i| self.inner.col(i).length()).product::<f32>();
        if !determinant.is_finite() || determinant.abs() <= SINGULAR_EPSILON * volume {
            return Err(MatrixError::SingularMatrix { determinant });
        }
        Ok(Self {
            inner: self.inner.inverse(),
        })
    }

    /// Transforms a single point and divides by the resulting `w`.
    pub fn transform_point<P: IntoHomogeneous>(
        &self,
        point: P,
    ) -> Result<ProjectedPoint, MatrixError> {
        self.transform_indexed(0, point)
    }

    /// Transforms a batch of points.
    ///
    /// A degenerate point is reported in its own slot; it never aborts the rest of
    /// the batch.
    pub fn transform_points<P: IntoHomogeneous>(
        &self,
        points: &[P],
    ) -> Vec<Result<ProjectedPoint, MatrixError>> {
        points
            .iter()
            .enumerate()
            .map(|(index, &point)| self.transform_indexed(index, point))
            .collect()
    }

    fn transform_indexed<P: IntoHomogeneous>(
        &self,
        index: usize,
        point: P,
    ) -> Result<ProjectedPoint, MatrixError> {
        let clip = self.inner * point.into_homogeneous();
        let w = clip.w;
        if !w.is_finite() || w.abs() < W_EPSILON {
            return Err(MatrixError::DegenerateProjection { index, w });
        }
        Ok(ProjectedPoint {
            position: clip.truncate() / w,
            w,
        })
    }

    /// Element-wise comparison within `max_abs_diff`.
    pub fn abs_diff_eq(&self, other: &Matrix, max_abs_diff: f32) -> bool {
        self.inner.abs_diff_eq(other.inner, max_abs_diff)
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    /// `a * b` applies `a` first, then `b`.
    fn mul(mut self, rhs: Matrix) -> Matrix {
        self.multiply(&rhs);
        self
    }
}

/// Wraps an angle into `[0, 2π)`.
///
/// Non-finite input is a recoverable data error: it is logged and treated as 0.
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        log::warn!("non-finite angle {} treated as 0", angle);
        return 0.0;
    }
    let wrapped = (angle as f64).rem_euclid(std::f64::consts::TAU) as f32;
    // Rounding back to f32 can land exactly on 2π.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn sample() -> Matrix {
        let mut m = Matrix::identity();
        m.scale(2.0, 0.5, 1.5)
            .rotate_x(0.3)
            .rotate_y(-1.1)
            .rotate_z(2.0)
            .translate(4.0, -3.0, 7.0);
        m
    }

    fn assert_vec3_near(a: Vec3, b: Vec3) {
        assert!((a - b).abs().max_element() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn identity_law() {
        let m = sample();
        assert!((Matrix::identity() * m).abs_diff_eq(&m, 1e-6));
        assert!((m * Matrix::identity()).abs_diff_eq(&m, 1e-6));
    }

    #[test]
    fn inverse_law() {
        let m = sample();
        let product = m * m.inverse().unwrap();
        assert!(product.abs_diff_eq(&Matrix::identity(), 1e-5));
    }

    #[test]
    fn invert_in_place() {
        let mut m = Matrix::identity();
        m.translate(1.0, 2.0, 3.0);
        m.invert().unwrap();
        let p = m.transform_point(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_vec3_near(p.position, Vec3::ZERO);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let mut m = Matrix::identity();
        m.scale(1.0, 0.0, 1.0);
        let before = m;
        assert!(matches!(
            m.invert(),
            Err(MatrixError::SingularMatrix { .. })
        ));
        assert_eq!(m, before);
    }

    #[test]
    fn tiny_uniform_scale_still_inverts() {
        let mut m = Matrix::identity();
        m.scale(0.002, 0.002, 0.002).translate(0.01, 0.0, -0.02);
        let product = m * m.inverse().unwrap();
        assert!(product.abs_diff_eq(&Matrix::identity(), 1e-4));

        let mut flat = Matrix::identity();
        flat.scale(0.002, 0.0, 0.002);
        assert!(flat.inverse().is_err());
    }

    #[test]
    fn builders_compose_in_call_order() {
        // Translate then rotate moves the point around the origin.
        let mut a = Matrix::identity();
        a.translate(1.0, 0.0, 0.0).rotate_z(FRAC_PI_2);
        let p = a.transform_point(Vec3::ZERO).unwrap();
        assert_vec3_near(p.position, Vec3::new(0.0, 1.0, 0.0));

        // Rotate then translate leaves the rotation at the origin.
        let mut b = Matrix::identity();
        b.rotate_z(FRAC_PI_2).translate(1.0, 0.0, 0.0);
        let p = b.transform_point(Vec3::ZERO).unwrap();
        assert_vec3_near(p.position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn multiply_applies_other_last() {
        let mut scale = Matrix::identity();
        scale.scale(3.0, 3.0, 3.0);
        let mut shift = Matrix::identity();
        shift.translate(0.0, 0.0, -1.0);

        let mut m = scale;
        m.multiply(&shift);
        let p = m.transform_point([1.0, 1.0, 1.0]).unwrap();
        assert_vec3_near(p.position, Vec3::new(3.0, 3.0, 2.0));
    }

    #[test]
    fn translation_lives_in_elements_12_to_14() {
        let mut m = Matrix::identity();
        m.translate(5.0, 6.0, 7.0);
        let e = m.elements();
        assert_eq!(&e[12..15], &[5.0, 6.0, 7.0]);
        assert_eq!(Matrix::from_elements(e), m);
    }

    #[test]
    fn perspective_divides_by_w() {
        let m = Matrix::perspective(FRAC_PI_2, 1.0, 1.0, 100.0);
        let p = m.transform_point(Vec3::new(1.0, 1.0, -2.0)).unwrap();
        assert!((p.w - 2.0).abs() < 1e-6);
        assert!((p.position.x - 0.5).abs() < 1e-5);
        assert!((p.position.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn perspective_replaces_contents() {
        let mut m = Matrix::identity();
        m.translate(9.0, 9.0, 9.0);
        m.set_perspective(1.0, 1.5, 1.0, 50.0);
        assert_eq!(m, Matrix::perspective(1.0, 1.5, 1.0, 50.0));
    }

    #[test]
    fn degenerate_points_are_reported_individually() {
        let m = Matrix::perspective(1.0, 1.0, 1.0, 100.0);
        let results = m.transform_points(&[
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, -10.0),
        ]);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(MatrixError::DegenerateProjection { index: 1, .. })
        ));
        assert!(results[2].is_ok());
    }

    #[test]
    fn homogeneous_inputs_keep_their_w() {
        let p = Matrix::identity()
            .transform_point(Vec4::new(2.0, 4.0, 6.0, 2.0))
            .unwrap();
        assert_eq!(p.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.w, 2.0);
    }

    #[test]
    fn wrap_angle_range_and_periodicity() {
        for &theta in &[0.0_f32, 0.5, 1.0, 3.0, -0.5, -3.0, 6.0, 100.0, -100.0] {
            let w = wrap_angle(theta);
            assert!((0.0..TAU).contains(&w), "{} wrapped to {}", theta, w);
            for k in -3..=3 {
                let shifted = wrap_angle(theta + TAU * k as f32);
                let diff = (shifted - w).abs();
                assert!(diff < 1e-4 || (TAU - diff) < 1e-4, "{} vs {}", shifted, w);
            }
        }
        assert!((wrap_angle(-PI) - PI).abs() < 1e-6);
        assert!(wrap_angle(TAU) < 1e-5);
    }

    #[test]
    fn wrap_angle_treats_non_finite_as_zero() {
        assert_eq!(wrap_angle(f32::NAN), 0.0);
        assert_eq!(wrap_angle(f32::INFINITY), 0.0);
    }
}

use glam::Vec3;

use crate::matrix::{Matrix, MatrixError, wrap_angle};

/// Errors raised when configuring a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraError {
    /// Viewport width and height must both be positive.
    InvalidViewport { width: f32, height: f32 },
    /// Field of view must lie in (0, π) and `0 < near < far`.
    InvalidProjection { fov: f32, near: f32, far: f32 },
}

impl std::fmt::Display for CameraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraError::InvalidViewport { width, height } => {
                write!(f, "invalid viewport {}x{}", width, height)
            }
            CameraError::InvalidProjection { fov, near, far } => write!(
                f,
                "invalid projection (fov {}, near {}, far {})",
                fov, near, far
            ),
        }
    }
}

impl std::error::Error for CameraError {}

/// A pose plus a perspective projection.
///
/// The view transform translates world points by `position` and then rotates them
/// about x, y and z in that order. Placing the camera at `(0, 0, -d)` therefore
/// pushes the whole scene `d` units in front of the lens (the view looks down -z).
///
/// Viewport and projection parameters sit behind validated setters; every
/// successful change rebuilds the cached perspective matrix immediately.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    rotation: Vec3,
    width: f32,
    height: f32,
    fov: f32, // radians
    near: f32,
    far: f32,
    perspective: Matrix,
}

impl Default for Camera {
    fn default() -> Self {
        let (width, height, fov, near, far) = (1600.0, 900.0, 1.0, 1.0, 100.0);
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            width,
            height,
            fov,
            near,
            far,
            perspective: Matrix::perspective(fov, width / height, near, far),
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.set_rotation(Vec3::new(x, y, z));
        self
    }

    /// Sets the field of view in radians, ignoring invalid values.
    pub fn with_fov(mut self, fov: f32) -> Self {
        if let Err(e) = self.set_fov(fov) {
            log::warn!("{}; keeping fov {}", e, self.fov);
        }
        self
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Result<Self, CameraError> {
        self.set_viewport(width, height)?;
        Ok(self)
    }

    /// Rotation angles (x, y, z), each in `[0, 2π)`.
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = Vec3::new(
            wrap_angle(rotation.x),
            wrap_angle(rotation.y),
            wrap_angle(rotation.z),
        );
    }

    pub fn rotate_by(&mut self, delta: Vec3) {
        self.set_rotation(self.rotation + delta);
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Resizes the viewport. Non-positive sizes are rejected before anything changes.
    pub fn set_viewport(&mut self, width: f32, height: f32) -> Result<(), CameraError> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(CameraError::InvalidViewport { width, height });
        }
        self.width = width;
        self.height = height;
        self.rebuild_perspective();
        Ok(())
    }

    pub fn set_fov(&mut self, fov: f32) -> Result<(), CameraError> {
        Self::validate_projection(fov, self.near, self.far)?;
        self.fov = fov;
        self.rebuild_perspective();
        Ok(())
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) -> Result<(), CameraError> {
        Self::validate_projection(self.fov, near, far)?;
        self.near = near;
        self.far = far;
        self.rebuild_perspective();
        Ok(())
    }

    fn validate_projection(fov: f32, near: f32, far: f32) -> Result<(), CameraError> {
        let valid = fov > 0.0
            && fov < std::f32::consts::PI
            && near > 0.0
            && far > near
            && far.is_finite();
        if valid {
            Ok(())
        } else {
            Err(CameraError::InvalidProjection { fov, near, far })
        }
    }

    fn rebuild_perspective(&mut self) {
        self.perspective
            .set_perspective(self.fov, self.aspect(), self.near, self.far);
    }

    /// The cached projection matrix.
    pub fn perspective(&self) -> &Matrix {
        &self.perspective
    }

    /// Moves world points into camera-relative space.
    pub fn view_matrix(&self) -> Matrix {
        let mut m = Matrix::identity();
        m.translate(self.position.x, self.position.y, self.position.z)
            .rotate_x(self.rotation.x)
            .rotate_y(self.rotation.y)
            .rotate_z(self.rotation.z);
        m
    }

    /// Maps an NDC point to screen pixels (y grows downward).
    pub fn ndc_to_screen(&self, ndc: Vec3) -> Vec3 {
        Vec3::new(
            (ndc.x + 1.0) / 2.0 * self.width,
            (1.0 - ndc.y) / 2.0 * self.height,
            ndc.z,
        )
    }

    /// Projects camera-space points to screen space.
    ///
    /// Each result is `(screen x, screen y, ndc z)`; points that land on the
    /// camera plane come back as [`MatrixError::DegenerateProjection`].
    pub fn project(&self, points: &[Vec3]) -> Vec<Result<Vec3, MatrixError>> {
        self.perspective
            .transform_points(points)
            .into_iter()
            .map(|r| r.map(|p| self.ndc_to_screen(p.position)))
            .collect()
    }
}

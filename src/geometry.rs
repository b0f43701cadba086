//! STL import.
//!
//! Converts triangle meshes into [`SceneDescription`]s so they can be dropped into
//! a scene next to hand-authored JSON models.
//!
//! ```no_run
//! use phosphor::geometry::PendingGeometry;
//!
//! let desc = PendingGeometry::from_stl("assets/rover.stl")
//!     .centered()      // Center at origin
//!     .normalized()    // Fit in a unit cube
//!     .scaled(20.0)
//!     .build()
//!     .unwrap();
//! ```
//!
//! STL facets are wound counter-clockwise seen from outside, which is the front
//! face convention the renderer culls by, so imported solids cull correctly
//! without any reordering.

use glam::{Quat, Vec3};
use std::path::{Path, PathBuf};

use crate::description::{FaceEntry, SceneDescription};

/// Why a mesh could not be turned into geometry.
#[derive(Debug)]
pub enum GeometryError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Only `.stl` is understood; carries the offending extension.
    UnknownFormat(String),
    /// `stl_io` rejected the data.
    ParseError(std::io::Error),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            GeometryError::UnknownFormat(ext) => write!(f, "no mesh reader for '.{}' files", ext),
            GeometryError::ParseError(e) => write!(f, "malformed STL: {}", e),
        }
    }
}

impl std::error::Error for GeometryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeometryError::Io { source, .. } => Some(source),
            GeometryError::ParseError(e) => Some(e),
            GeometryError::UnknownFormat(_) => None,
        }
    }
}

/// Shared vertex positions plus index loops, before styling.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGeometry {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Vec<usize>>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Vec<usize>>) -> Self {
        Self { vertices, faces }
    }

    /// Axis-aligned bounding box as `(min, max)`. Zero-sized at the origin when empty.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        if self.vertices.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), &p| (min.min(p), max.max(p)),
        )
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Scales uniformly around the origin.
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.vertices {
            *v *= factor;
        }
    }

    pub fn rotate(&mut self, rotation: Quat) {
        for v in &mut self.vertices {
            *v = rotation * *v;
        }
    }

    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Scales the geometry to fit within a unit cube (-0.5 to 0.5).
    pub fn normalize(&mut self) {
        let size = self.size();
        let max_dim = size.x.max(size.y).max(size.z);
        if max_dim > 0.0 {
            self.scale(1.0 / max_dim);
        }
    }

    /// Unstyled description: bare index faces, default pose.
    pub fn into_description(self) -> SceneDescription {
        SceneDescription {
            vertices: self.vertices.into_iter().map(Into::into).collect(),
            faces: self.faces.into_iter().map(FaceEntry::Indices).collect(),
            ..Default::default()
        }
    }
}

/// A fluent builder for loading and adjusting geometry.
///
/// Load errors are held until [`build`](Self::build), so adjustments can be
/// chained unconditionally.
#[derive(Debug)]
pub struct PendingGeometry {
    result: Result<RawGeometry, GeometryError>,
    center: bool,
    normalize: bool,
    scale_factor: Option<f32>,
    translation: Option<Vec3>,
    rotation: Option<Quat>,
}

impl PendingGeometry {
    fn with_result(result: Result<RawGeometry, GeometryError>) -> Self {
        Self {
            result,
            center: false,
            normalize: false,
            scale_factor: None,
            translation: None,
            rotation: None,
        }
    }

    /// Load geometry from a file path, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        Self::with_result(Self::load_file(path.as_ref()))
    }

    pub fn from_stl(path: impl AsRef<Path>) -> Self {
        Self::with_result(Self::load_stl_file(path.as_ref()))
    }

    pub fn from_stl_bytes(bytes: &[u8]) -> Self {
        Self::with_result(Self::parse_stl_bytes(bytes))
    }

    pub fn from_raw(geometry: RawGeometry) -> Self {
        Self::with_result(Ok(geometry))
    }

    /// Centers the geometry at the origin.
    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    /// Scales the geometry to fit within a unit cube.
    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    /// Applies a uniform scale factor after centering and normalization.
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale_factor = Some(factor);
        self
    }

    /// Translates the geometry. Applied last.
    pub fn translated(mut self, offset: Vec3) -> Self {
        self.translation = Some(offset);
        self
    }

    /// Reorients Z-up models to Y-up (-90 degrees about X).
    pub fn upright(mut self) -> Self {
        self.rotation = Some(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        self
    }

    /// Applies all requested adjustments: center, rotate, normalize, scale,
    /// translate.
    pub fn build_raw(self) -> Result<RawGeometry, GeometryError> {
        let mut geometry = self.result?;

        if self.center {
            geometry.recenter();
        }
        if let Some(rotation) = self.rotation {
            geometry.rotate(rotation);
        }
        if self.normalize {
            geometry.normalize();
        }
        if let Some(scale) = self.scale_factor {
            geometry.scale(scale);
        }
        if let Some(offset) = self.translation {
            geometry.translate(offset);
        }

        Ok(geometry)
    }

    pub fn build(self) -> Result<SceneDescription, GeometryError> {
        self.build_raw().map(RawGeometry::into_description)
    }

    fn load_file(path: &Path) -> Result<RawGeometry, GeometryError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "stl" => Self::load_stl_file(path),
            _ => Err(GeometryError::UnknownFormat(ext)),
        }
    }

    fn load_stl_file(path: &Path) -> Result<RawGeometry, GeometryError> {
        let file = std::fs::File::open(path).map_err(|source| GeometryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = std::io::BufReader::new(file);
        Self::parse_stl(&mut reader)
    }

    fn parse_stl_bytes(bytes: &[u8]) -> Result<RawGeometry, GeometryError> {
        let mut cursor = std::io::Cursor::new(bytes);
        Self::parse_stl(&mut cursor)
    }

    fn parse_stl<R: std::io::Read + std::io::Seek>(
        reader: &mut R,
    ) -> Result<RawGeometry, GeometryError> {
        let stl = stl_io::read_stl(reader).map_err(GeometryError::ParseError)?;

        // stl_io already merges coincident corners into one vertex list.
        let vertices: Vec<Vec3> = stl
            .vertices
            .iter()
            .map(|v| {
                let p: [f32; 3] = (*v).into();
                Vec3::from(p)
            })
            .collect();
        let faces = stl
            .faces
            .iter()
            .map(|face| face.vertices.to_vec())
            .collect();

        log::debug!(
            "parsed STL: {} vertices, {} facets",
            vertices.len(),
            stl.faces.len()
        );
        Ok(RawGeometry::new(vertices, faces))
    }
}

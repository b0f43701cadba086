//! A positioned, rotated, scaled model.

use glam::Vec3;

use crate::color::{Color, parse_lenient};
use crate::description::SceneDescription;
use crate::matrix::{Matrix, wrap_angle};
use crate::polygon::Polygon;

/// A face as declared by the model: vertex indices plus style.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceTemplate {
    pub indices: Vec<usize>,
    /// Overrides the node's fill when set.
    pub fill: Option<Color>,
    /// Overrides the node's stroke when set.
    pub stroke: Option<Color>,
    pub doublesided: bool,
}

/// A decal attached to one of the node's own faces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecalTemplate {
    pub indices: Vec<usize>,
    /// Index into the node's face list.
    pub parent: usize,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
}

/// A rigid model in the scene graph.
///
/// Topology (vertices, faces, decals) is fixed once built; only the pose changes
/// from frame to frame. The parent link is owned by the [`Scene`](super::Scene),
/// not the node.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub position: Vec3,
    rotation: Vec3,
    pub scale: f32,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    vertices: Vec<Vec3>,
    faces: Vec<FaceTemplate>,
    decals: Vec<DecalTemplate>,
}

impl SceneNode {
    /// Creates an empty node at the origin. It contributes no polygons until
    /// geometry is attached.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            fill: None,
            stroke: None,
            vertices: Vec::new(),
            faces: Vec::new(),
            decals: Vec::new(),
        }
    }

    /// Builds a node from a parsed description.
    ///
    /// Missing pose fields default to 0 (scale to 1). Non-finite values, bad colors
    /// and decals pointing at a face that does not exist are logged and dropped.
    pub fn from_description(name: impl Into<String>, desc: &SceneDescription) -> Self {
        let name = name.into();
        let finite = |value: Option<f32>, default: f32, field: &str| match value {
            Some(v) if v.is_finite() => v,
            Some(v) => {
                log::warn!("{}: non-finite {} ({}) treated as {}", name, field, v, default);
                default
            }
            None => default,
        };

        let position = Vec3::new(
            finite(desc.x, 0.0, "x"),
            finite(desc.y, 0.0, "y"),
            finite(desc.z, 0.0, "z"),
        );
        let scale = finite(desc.scale, 1.0, "scale");
        let rotation = Vec3::new(
            desc.x_rot.unwrap_or(0.0),
            desc.y_rot.unwrap_or(0.0),
            desc.z_rot.unwrap_or(0.0),
        );
        let fill = parse_lenient(desc.fill.as_deref(), &format!("{} fill", name));
        let stroke = parse_lenient(desc.stroke.as_deref(), &format!("{} stroke", name));

        let faces: Vec<FaceTemplate> = desc
            .face_records()
            .into_iter()
            .enumerate()
            .map(|(i, face)| FaceTemplate {
                fill: parse_lenient(face.fill.as_deref(), &format!("{} face {} fill", name, i)),
                stroke: parse_lenient(
                    face.stroke.as_deref(),
                    &format!("{} face {} stroke", name, i),
                ),
                indices: face.vertices,
                doublesided: face.doublesided,
            })
            .collect();

        let decals = desc
            .subfaces
            .iter()
            .enumerate()
            .filter_map(|(i, decal)| {
                if decal.parent >= faces.len() {
                    log::warn!(
                        "{}: decal {} references face {} but only {} faces exist; dropped",
                        name,
                        i,
                        decal.parent,
                        faces.len()
                    );
                    return None;
                }
                Some(DecalTemplate {
                    indices: decal.vertices.clone(),
                    parent: decal.parent,
                    fill: parse_lenient(
                        decal.fill.as_deref(),
                        &format!("{} decal {} fill", name, i),
                    ),
                    stroke: parse_lenient(
                        decal.stroke.as_deref(),
                        &format!("{} decal {} stroke", name, i),
                    ),
                })
            })
            .collect();

        let mut node = Self {
            name,
            position,
            rotation: Vec3::ZERO,
            scale,
            fill,
            stroke,
            vertices: desc.vertices.iter().map(|&v| Vec3::from(v)).collect(),
            faces,
            decals,
        };
        node.set_rotation(rotation);
        node
    }

    pub fn with_geometry(
        mut self,
        vertices: Vec<Vec3>,
        faces: Vec<FaceTemplate>,
        decals: Vec<DecalTemplate>,
    ) -> Self {
        self.vertices = vertices;
        self.faces = faces;
        self.decals = decals
            .into_iter()
            .filter(|d| {
                let valid = d.parent < self.faces.len();
                if !valid {
                    log::warn!("{}: decal on missing face {} dropped", self.name, d.parent);
                }
                valid
            })
            .collect();
        self
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.set_rotation(Vec3::new(x, y, z));
        self
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
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

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[FaceTemplate] {
        &self.faces
    }

    pub fn decals(&self) -> &[DecalTemplate] {
        &self.decals
    }

    /// True when no geometry has been loaded.
    pub fn is_unpopulated(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    /// This node's own transform, ignoring any parent:
    /// scale, then rotate x, y, z, then translate.
    pub fn own_matrix(&self) -> Matrix {
        let mut m = Matrix::identity();
        m.scale(self.scale, self.scale, self.scale)
            .rotate_x(self.rotation.x)
            .rotate_y(self.rotation.y)
            .rotate_z(self.rotation.z)
            .translate(self.position.x, self.position.y, self.position.z);
        m
    }

    /// Runs the node's templates through `m` (model → camera space).
    ///
    /// Vertices are transformed once and shared by every face. A face that
    /// references a missing vertex is skipped, and so are its decals.
    pub(crate) fn build_polygons(&self, m: &Matrix) -> Vec<Polygon> {
        let transformed: Vec<Option<Vec3>> = m
            .transform_points(&self.vertices)
            .into_iter()
            .map(|r| r.ok().map(|p| p.position))
            .collect();
        let gather = |indices: &[usize]| -> Option<Vec<Vec3>> {
            indices
                .iter()
                .map(|&i| transformed.get(i).copied().flatten())
                .collect()
        };

        let mut slots: Vec<Option<Polygon>> = self
            .faces
            .iter()
            .enumerate()
            .map(|(i, face)| {
                let Some(vertices) = gather(&face.indices) else {
                    log::debug!("{}: face {} has an unusable vertex; skipped", self.name, i);
                    return None;
                };
                let mut polygon = Polygon::new(vertices);
                polygon.fill = face.fill.or(self.fill);
                polygon.stroke = face.stroke.or(self.stroke);
                polygon.doublesided = face.doublesided;
                polygon.compute_depth();
                Some(polygon)
            })
            .collect();

        for (i, decal) in self.decals.iter().enumerate() {
            let Some(Some(parent)) = slots.get_mut(decal.parent) else {
                continue;
            };
            let Some(vertices) = gather(&decal.indices) else {
                log::debug!("{}: decal {} has an unusable vertex; skipped", self.name, i);
                continue;
            };
            let mut subface = Polygon::new(vertices);
            subface.fill = decal.fill.or(self.fill);
            subface.stroke = decal.stroke.or(self.stroke);
            // Sort stability: a decal always travels with its face.
            subface.depth = parent.depth;
            parent.subfaces.push(subface);
        }

        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn quad_description() -> SceneDescription {
        SceneDescription::from_json(
            r##"{
                "vertices": [[0,0,0],[1,0,0],[1,1,0],[0,1,0],[0.2,0.2,-5],[0.8,0.2,3],[0.5,0.8,0]],
                "faces": [
                    {"vertices": [0,1,2,3], "fill": "#111"},
                    [3,2,1]
                ],
                "subfaces": [
                    {"vertices": [4,5,6], "parent": 0},
                    {"vertices": [4,5,6], "parent": 9}
                ],
                "fill": "#222", "stroke": "white",
                "x": 1, "scale": 2, "zRot": -1.5707964
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn description_defaults() {
        let node = SceneNode::from_description("empty", &SceneDescription::default());
        assert_eq!(node.position, Vec3::ZERO);
        assert_eq!(node.rotation(), Vec3::ZERO);
        assert_eq!(node.scale, 1.0);
        assert!(node.is_unpopulated());
    }

    #[test]
    fn description_pose_and_wrapping() {
        let node = SceneNode::from_description("quad", &quad_description());
        assert_eq!(node.position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(node.scale, 2.0);
        assert!((node.rotation().z - 3.0 * FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn non_finite_pose_values_fall_back() {
        let desc = SceneDescription {
            x: Some(f32::NAN),
            scale: Some(f32::INFINITY),
            y_rot: Some(f32::NAN),
            ..Default::default()
        };
        let node = SceneNode::from_description("bad", &desc);
        assert_eq!(node.position.x, 0.0);
        assert_eq!(node.scale, 1.0);
        assert_eq!(node.rotation().y, 0.0);
    }

    #[test]
    fn out_of_range_decal_is_dropped() {
        let node = SceneNode::from_description("quad", &quad_description());
        assert_eq!(node.faces().len(), 2);
        assert_eq!(node.decals().len(), 1);
        assert_eq!(node.decals()[0].parent, 0);
    }

    #[test]
    fn face_style_overrides_node_style() {
        let node = SceneNode::from_description("quad", &quad_description());
        let polygons = node.build_polygons(&Matrix::identity());
        assert_eq!(polygons[0].fill, Some("#111".parse::<Color>().unwrap()));
        assert_eq!(polygons[1].fill, Some("#222".parse::<Color>().unwrap()));
        assert_eq!(polygons[1].stroke, Some(Color::WHITE));
    }

    #[test]
    fn decal_inherits_parent_depth() {
        let node = SceneNode::from_description("quad", &quad_description());
        let mut view = Matrix::identity();
        view.translate(0.0, 0.0, -20.0);
        let polygons = node.build_polygons(&view);
        let face = &polygons[0];
        assert_eq!(face.subfaces.len(), 1);
        // The decal's own z-range is [-25, -17]; it still takes the face's depth.
        assert_eq!(face.subfaces[0].depth, face.depth);
        assert_eq!(face.depth, 20.0);
    }

    #[test]
    fn face_with_missing_vertex_is_skipped_with_its_decals() {
        let node = SceneNode::new("broken").with_geometry(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![
                FaceTemplate {
                    indices: vec![0, 1, 7],
                    ..Default::default()
                },
                FaceTemplate {
                    indices: vec![0, 1, 2],
                    ..Default::default()
                },
            ],
            vec![DecalTemplate {
                indices: vec![0, 1, 2],
                parent: 0,
                ..Default::default()
            }],
        );
        let polygons = node.build_polygons(&Matrix::identity());
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].vertices, vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert!(polygons[0].subfaces.is_empty());
    }

    #[test]
    fn own_matrix_scales_rotates_then_translates() {
        let node = SceneNode::new("n")
            .scaled(2.0)
            .rotated(0.0, 0.0, PI / 2.0)
            .at(10.0, 0.0, 0.0);
        let p = node.own_matrix().transform_point(Vec3::X).unwrap();
        assert!((p.position - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-5);
    }
}

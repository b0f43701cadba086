//! Per-frame drawable faces.
//!
//! A [`Polygon`] is produced fresh every frame by
//! [`Scene::transformed_faces`](crate::Scene::transformed_faces) and thrown away after
//! drawing. Its vertices start out in camera space (where `depth` is computed) and
//! are replaced by screen-space points once the renderer projects them (where the
//! backface test runs).

use glam::Vec3;

use crate::color::Color;

/// A closed loop of vertices with style, sort depth and attached decals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Vec3>,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    /// Suppresses backface culling.
    pub doublesided: bool,
    /// Distance along the view direction; only used for sort order.
    pub depth: f32,
    /// Screen-space winding result; only used for culling.
    pub backface: bool,
    /// Decals drawn on top of this polygon, sharing its depth.
    pub subfaces: Vec<Polygon>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec3>) -> Self {
        Self {
            vertices,
            ..Default::default()
        }
    }

    /// Sets `depth` to the midpoint of the camera-space depth range.
    ///
    /// Camera space looks down -z, so a vertex's distance in front of the camera
    /// is `-z` and the midpoint is `-(min_z + max_z) / 2`.
    pub fn compute_depth(&mut self) -> f32 {
        self.depth = midpoint_depth(&self.vertices);
        self.depth
    }

    /// Classifies the polygon from its current (screen-space) vertices.
    pub fn compute_backface(&mut self) -> bool {
        self.backface = is_backface(&self.vertices, self.doublesided);
        self.backface
    }
}

fn midpoint_depth(vertices: &[Vec3]) -> f32 {
    if vertices.is_empty() {
        return 0.0;
    }
    let (min_z, max_z) = vertices
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v.z), hi.max(v.z))
        });
    -(min_z + max_z) / 2.0
}

/// Screen-space winding test on the first three vertices.
///
/// With screen y growing downward, `cross > 0` means the loop runs clockwise on
/// screen, i.e. the face points away from the viewer. Front faces are wound
/// counter-clockwise as seen by the viewer. Fewer than three vertices, or a
/// double-sided face, is never a backface.
pub fn is_backface(vertices: &[Vec3], doublesided: bool) -> bool {
    if doublesided {
        return false;
    }
    let [v1, v2, v3] = match vertices {
        [a, b, c, ..] => [*a, *b, *c],
        _ => return false,
    };
    let e1 = v2 - v1;
    let e2 = v3 - v2;
    let cross = e1.x * e2.y - e1.y * e2.x;
    cross > 0.0
}

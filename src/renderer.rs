//! Painter's-algorithm frame assembly.
//!
//! Each frame the [`Renderer`] gathers camera-space polygons from every node,
//! sorts them farthest first, projects each one to screen space, culls the ones
//! that turned their back on the viewer, and hands the rest (plus their decals) to
//! a [`Surface`]. Nearer polygons are drawn later and overdraw farther ones, which
//! stands in for a depth buffer.

use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::camera::Camera;
use crate::color::Color;
use crate::matrix::MatrixError;
use crate::polygon::Polygon;
use crate::scene::{Scene, SceneError};

/// An outline color and its width in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

/// Immediate-mode 2D drawing target.
///
/// `points` is a closed loop in screen pixels. Fill and stroke are independent:
/// either, both or neither may be present.
pub trait Surface {
    fn draw_polygon(&mut self, points: &[Vec2], fill: Option<Color>, stroke: Option<Stroke>);
}

/// Sky, ground and horizon drawn behind every frame.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Backdrop {
    pub sky: Color,
    /// Fills the lower half of the viewport.
    pub ground: Option<Color>,
    /// Line across the middle of the viewport.
    pub horizon: Option<Stroke>,
}

impl Default for Backdrop {
    fn default() -> Self {
        Self {
            sky: Color::BLACK,
            ground: Some(Color::from_rgba8(32, 32, 32, 255)),
            horizon: Some(Stroke {
                color: Color::from_rgba8(128, 128, 128, 255),
                width: 3.0,
            }),
        }
    }
}

/// Scene-specific drawing parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// `K` in `stroke width = K / depth`.
    pub stroke_scale: f32,
    pub backdrop: Option<Backdrop>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            stroke_scale: 256.0,
            backdrop: Some(Backdrop::default()),
        }
    }
}

/// What happened to the polygons of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Top-level polygons collected from the scene.
    pub polygons: usize,
    pub drawn: usize,
    pub culled: usize,
    /// Decals drawn on top of visible polygons.
    pub decals: usize,
    /// Polygons or decals dropped for empty or unprojectable geometry.
    pub skipped: usize,
}

/// Sorts farthest first. Equal depths keep their relative order.
pub fn depth_sort(polygons: &mut [Polygon]) {
    polygons.sort_by(|a, b| b.depth.total_cmp(&a.depth));
}

/// Perspective-scaled outline width, `k / depth`.
///
/// Geometry at or behind the camera plane gets the unscaled `k`.
pub fn stroke_width(k: f32, depth: f32) -> f32 {
    if depth > 0.0 && depth.is_finite() {
        k / depth
    } else {
        k
    }
}

/// Draws a [`Scene`] through a [`Camera`] onto a [`Surface`].
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    pub camera: Camera,
    pub config: RenderConfig,
}

impl Renderer {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            config: RenderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Every node's camera-space polygons for this frame, in spawn order.
    pub fn collect_faces(&self, scene: &Scene) -> Result<Vec<Polygon>, SceneError> {
        let mut polygons = Vec::new();
        for entity in scene.nodes() {
            polygons.extend(scene.transformed_faces(entity, &self.camera)?);
        }
        Ok(polygons)
    }

    /// Renders one frame.
    pub fn draw<S: Surface + ?Sized>(
        &self,
        scene: &Scene,
        surface: &mut S,
    ) -> Result<FrameStats, SceneError> {
        if let Some(backdrop) = &self.config.backdrop {
            self.draw_backdrop(backdrop, surface);
        }

        let mut polygons = self.collect_faces(scene)?;
        depth_sort(&mut polygons);

        let mut stats = FrameStats {
            polygons: polygons.len(),
            ..Default::default()
        };

        for mut polygon in polygons {
            let Some(screen) = self.project(&polygon.vertices) else {
                stats.skipped += 1;
                continue;
            };
            polygon.vertices = screen;
            // Winding is judged after projection, on what will actually be drawn.
            if polygon.compute_backface() {
                stats.culled += 1;
                continue;
            }

            let width = stroke_width(self.config.stroke_scale, polygon.depth);
            dispatch(surface, &polygon, width);
            stats.drawn += 1;

            for mut subface in std::mem::take(&mut polygon.subfaces) {
                match self.project(&subface.vertices) {
                    Some(screen) => {
                        subface.vertices = screen;
                        dispatch(surface, &subface, width);
                        stats.decals += 1;
                    }
                    None => stats.skipped += 1,
                }
            }
        }

        log::trace!(
            "frame: {} polygons, {} drawn, {} culled, {} decals, {} skipped",
            stats.polygons,
            stats.drawn,
            stats.culled,
            stats.decals,
            stats.skipped
        );
        Ok(stats)
    }

    // None for empty loops and for loops with a vertex on the camera plane.
    fn project(&self, vertices: &[Vec3]) -> Option<Vec<Vec3>> {
        if vertices.is_empty() {
            return None;
        }
        match self
            .camera
            .project(vertices)
            .into_iter()
            .collect::<Result<Vec<Vec3>, MatrixError>>()
        {
            Ok(screen) => Some(screen),
            Err(e) => {
                log::debug!("polygon skipped: {}", e);
                None
            }
        }
    }

    fn draw_backdrop<S: Surface + ?Sized>(&self, backdrop: &Backdrop, surface: &mut S) {
        let w = self.camera.width();
        let h = self.camera.height();
        let mid = h * 0.5;

        surface.draw_polygon(&rect(0.0, 0.0, w, h), Some(backdrop.sky), None);
        if let Some(ground) = backdrop.ground {
            surface.draw_polygon(&rect(0.0, mid, w, h), Some(ground), None);
        }
        if let Some(horizon) = backdrop.horizon {
            surface.draw_polygon(
                &[Vec2::new(0.0, mid), Vec2::new(w, mid)],
                None,
                Some(horizon),
            );
        }
    }
}

fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> [Vec2; 4] {
    [
        Vec2::new(x0, y0),
        Vec2::new(x1, y0),
        Vec2::new(x1, y1),
        Vec2::new(x0, y1),
    ]
}

fn dispatch<S: Surface + ?Sized>(surface: &mut S, polygon: &Polygon, width: f32) {
    let points: Vec<Vec2> = polygon.vertices.iter().map(|v| v.truncate()).collect();
    let stroke = polygon.stroke.map(|color| Stroke { color, width });
    surface.draw_polygon(&points, polygon.fill, stroke);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{DecalTemplate, FaceTemplate, SceneNode};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(Vec<Vec2>, Option<Color>, Option<Stroke>)>,
    }

    impl Surface for Recorder {
        fn draw_polygon(&mut self, points: &[Vec2], fill: Option<Color>, stroke: Option<Stroke>) {
            self.calls.push((points.to_vec(), fill, stroke));
        }
    }

    fn with_depth(depth: f32, tag: f32) -> Polygon {
        Polygon {
            depth,
            vertices: vec![Vec3::splat(tag)],
            ..Default::default()
        }
    }

    fn bare() -> Renderer {
        Renderer::new(Camera::new()).with_config(RenderConfig {
            stroke_scale: 100.0,
            backdrop: None,
        })
    }

    // Front-facing (counter-clockwise seen from the camera) unless `flip`.
    fn triangle(name: &str, fill: Color, z: f32, flip: bool) -> SceneNode {
        let indices = if flip { vec![0, 2, 1] } else { vec![0, 1, 2] };
        let mut node = SceneNode::new(name)
            .with_geometry(
                vec![Vec3::ZERO, Vec3::X, Vec3::Y],
                vec![FaceTemplate {
                    indices,
                    ..Default::default()
                }],
                vec![DecalTemplate {
                    indices: vec![0, 1, 2],
                    parent: 0,
                    fill: Some(Color::WHITE),
                    stroke: None,
                }],
            )
            .at(0.0, 0.0, z);
        node.fill = Some(fill);
        node.stroke = Some(Color::BLACK);
        node
    }

    #[test]
    fn depth_sort_is_descending_and_stable() {
        let mut polys = vec![
            with_depth(5.0, 0.0),
            with_depth(1.0, 1.0),
            with_depth(3.0, 2.0),
            with_depth(3.0, 3.0),
        ];
        depth_sort(&mut polys);
        let depths: Vec<f32> = polys.iter().map(|p| p.depth).collect();
        assert_eq!(depths, vec![5.0, 3.0, 3.0, 1.0]);
        assert_eq!(polys[1].vertices[0].x, 2.0);
        assert_eq!(polys[2].vertices[0].x, 3.0);
    }

    #[test]
    fn stroke_width_scales_with_depth() {
        assert_eq!(stroke_width(256.0, 4.0), 64.0);
        assert_eq!(stroke_width(128.0, 0.0), 128.0);
        assert_eq!(stroke_width(128.0, -2.0), 128.0);
    }

    #[test]
    fn farthest_polygon_is_drawn_first() {
        let near = Color::rgb(1.0, 0.0, 0.0);
        let far = Color::rgb(0.0, 0.0, 1.0);
        let mut scene = Scene::new();
        scene.spawn(triangle("near", near, -5.0, false));
        scene.spawn(triangle("far", far, -20.0, false));

        let mut surface = Recorder::default();
        let stats = bare().draw(&scene, &mut surface).unwrap();

        assert_eq!(stats.drawn, 2);
        assert_eq!(stats.decals, 2);
        // far face, its decal, near face, its decal
        assert_eq!(surface.calls.len(), 4);
        assert_eq!(surface.calls[0].1, Some(far));
        assert_eq!(surface.calls[1].1, Some(Color::WHITE));
        assert_eq!(surface.calls[2].1, Some(near));
        assert_eq!(surface.calls[3].1, Some(Color::WHITE));
    }

    #[test]
    fn stroke_width_uses_polygon_depth_for_decals_too() {
        let mut scene = Scene::new();
        scene.spawn(triangle("t", Color::WHITE, -4.0, false));
        let mut surface = Recorder::default();
        bare().draw(&scene, &mut surface).unwrap();
        assert_eq!(surface.calls[0].2.unwrap().width, 25.0);
        assert_eq!(surface.calls[1].2.unwrap().width, 25.0);
    }

    #[test]
    fn backfaces_are_culled_with_their_decals() {
        let mut scene = Scene::new();
        scene.spawn(triangle("away", Color::WHITE, -5.0, true));
        let mut surface = Recorder::default();
        let stats = bare().draw(&scene, &mut surface).unwrap();
        assert_eq!(stats.culled, 1);
        assert_eq!(stats.drawn, 0);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn doublesided_faces_survive_either_winding() {
        let node = triangle("away", Color::WHITE, -5.0, true).with_geometry(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![FaceTemplate {
                indices: vec![0, 2, 1],
                doublesided: true,
                ..Default::default()
            }],
            Vec::new(),
        );
        let mut scene = Scene::new();
        scene.spawn(node);
        let mut surface = Recorder::default();
        let stats = bare().draw(&scene, &mut surface).unwrap();
        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.culled, 0);
    }

    #[test]
    fn geometry_on_the_camera_plane_is_skipped() {
        let mut scene = Scene::new();
        scene.spawn(triangle("flat", Color::WHITE, 0.0, false));
        scene.spawn(SceneNode::new("empty").with_geometry(
            Vec::new(),
            vec![FaceTemplate::default()],
            Vec::new(),
        ));
        let mut surface = Recorder::default();
        let stats = bare().draw(&scene, &mut surface).unwrap();
        assert_eq!(stats.polygons, 2);
        assert_eq!(stats.skipped, 2);
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn backdrop_is_drawn_before_geometry() {
        let mut scene = Scene::new();
        scene.spawn(triangle("t", Color::rgb(0.0, 1.0, 0.0), -5.0, false));
        let renderer = Renderer::new(Camera::new());
        let mut surface = Recorder::default();
        renderer.draw(&scene, &mut surface).unwrap();

        assert_eq!(surface.calls[0].1, Some(Color::BLACK));
        assert_eq!(surface.calls[0].0.len(), 4);
        let horizon = &surface.calls[2];
        assert_eq!(horizon.0, vec![Vec2::new(0.0, 450.0), Vec2::new(1600.0, 450.0)]);
        assert_eq!(horizon.2.unwrap().width, 3.0);
        assert_eq!(surface.calls[3].1, Some(Color::rgb(0.0, 1.0, 0.0)));
    }

    #[test]
    fn unpopulated_nodes_contribute_nothing() {
        let mut scene = Scene::new();
        scene.spawn(SceneNode::new("pending"));
        let stats = bare().draw(&scene, &mut Recorder::default()).unwrap();
        assert_eq!(stats, FrameStats::default());
    }
}

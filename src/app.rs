//! Manifest-driven batch rendering.
//!
//! [`Stage`] is a loaded scene plus its camera and scripted motions; [`run`] loads
//! a manifest into a stage and writes a PNG per frame.

use std::path::{Path, PathBuf};

use anyhow::Context;
use glam::Vec3;
use hecs::Entity;

use crate::canvas::ImageSurface;
use crate::config::{ConfigError, Manifest, Viewport};
use crate::loader::{FileLoader, SceneLoader, load_node};
use crate::motion::Motion;
use crate::renderer::{FrameStats, Renderer, Surface};
use crate::scene::{Scene, SceneError};

/// Run parameters that sit outside the manifest.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub manifest: PathBuf,
    pub output: PathBuf,
    pub frames: u32,
    /// Overrides the manifest viewport.
    pub size: Option<(u32, u32)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("assets/lunar.json"),
            output: PathBuf::from("frames"),
            frames: 1,
            size: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = path.into();
        self
    }

    pub fn output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output = dir.into();
        self
    }

    pub fn frames(mut self, frames: u32) -> Self {
        self.frames = frames;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }
}

/// A scene ready to animate and draw.
pub struct Stage {
    pub scene: Scene,
    pub renderer: Renderer,
    motions: Vec<(Entity, Motion)>,
}

impl Stage {
    /// Loads every node in `manifest` and wires up parents and motions.
    ///
    /// Nodes whose model fails to load stay in the scene unpopulated; a bad camera
    /// or a dangling parent name fails the whole stage.
    pub async fn from_manifest<L: SceneLoader>(
        manifest: &Manifest,
        loader: &L,
        viewport: Option<Viewport>,
    ) -> Result<Self, ConfigError> {
        manifest.validate()?;
        let camera = manifest
            .camera
            .build(viewport.unwrap_or(manifest.viewport))?;

        let mut scene = Scene::new();
        let mut entities = Vec::with_capacity(manifest.nodes.len());
        let mut motions = Vec::new();
        for config in &manifest.nodes {
            let mut node = load_node(loader, &config.name, &config.resource).await;
            if let Some(position) = config.position {
                node.position = position;
            }
            if let Some(rotation) = config.rotation {
                node.set_rotation(rotation);
            }
            if let Some(scale) = config.scale {
                node.scale = scale;
            }
            let entity = scene.spawn(node);
            if let Some(motion) = &config.motion {
                motions.push((entity, motion.clone()));
            }
            entities.push(entity);
        }

        for (config, &entity) in manifest.nodes.iter().zip(&entities) {
            let Some(parent_name) = &config.parent else {
                continue;
            };
            let parent = manifest
                .nodes
                .iter()
                .position(|n| &n.name == parent_name)
                .map(|i| entities[i])
                .ok_or_else(|| ConfigError::UnknownParent {
                    node: config.name.clone(),
                    parent: parent_name.clone(),
                })?;
            scene.set_parent(entity, Some(parent))?;
        }

        log::info!(
            "stage ready: {} nodes, {} animated",
            scene.len(),
            motions.len()
        );
        Ok(Self {
            scene,
            renderer: Renderer::new(camera).with_config(manifest.render),
            motions,
        })
    }

    /// Advances every scripted motion by one frame.
    pub fn step(&mut self) -> Result<(), SceneError> {
        for (entity, motion) in &mut self.motions {
            let mut node = self.scene.node_mut(*entity)?;
            motion.step(&mut node);
        }
        Ok(())
    }

    /// Steps the motions, then draws.
    pub fn frame<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
    ) -> Result<FrameStats, SceneError> {
        self.step()?;
        self.renderer.draw(&self.scene, surface)
    }

    pub fn camera_position(&self) -> Vec3 {
        self.renderer.camera.position
    }
}

/// Loads the manifest and writes `frames` PNGs into the output directory.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let manifest = Manifest::load(&config.manifest)
        .with_context(|| format!("reading manifest {}", config.manifest.display()))?;
    let root = config
        .manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let loader = FileLoader::new(root);
    let viewport = config.size.map(|(width, height)| Viewport { width, height });

    let mut stage = pollster::block_on(Stage::from_manifest(&manifest, &loader, viewport))
        .with_context(|| format!("building scene from {}", config.manifest.display()))?;

    std::fs::create_dir_all(&config.output)
        .with_context(|| format!("creating {}", config.output.display()))?;

    let camera = &stage.renderer.camera;
    let (width, height) = (camera.width() as u32, camera.height() as u32);
    log::info!(
        "rendering {} frames at {}x{} into {}",
        config.frames,
        width,
        height,
        config.output.display()
    );

    for index in 0..config.frames {
        let mut surface = ImageSurface::new(width, height)
            .with_context(|| format!("{}x{} viewport has no pixels", width, height))?;
        let stats = stage.frame(&mut surface)?;
        let path = config.output.join(format!("frame_{:04}.png", index));
        surface
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        log::debug!(
            "{}: {} drawn, {} culled",
            path.display(),
            stats.drawn,
            stats.culled
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;

    const PLATE: &str = r##"{
        "vertices": [[-1,-1,0],[1,-1,0],[1,1,0],[-1,1,0]],
        "faces": [[0,1,2,3]],
        "fill": "#888"
    }"##;

    fn manifest() -> Manifest {
        Manifest::from_json(
            r#"{
                "viewport": { "width": 64, "height": 36 },
                "camera": { "position": [0, 0, -20] },
                "nodes": [
                    { "name": "base", "resource": "plate.json",
                      "motion": { "kind": "spin", "rate": [0, 0, 0.1] } },
                    { "name": "arm", "resource": "plate.json", "parent": "base",
                      "position": [3, 0, 0] },
                    { "name": "ghost", "resource": "missing.json" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn builder_sets_fields() {
        let config = AppConfig::new().frames(3).size(320, 200).output("out");
        assert_eq!(config.frames, 3);
        assert_eq!(config.size, Some((320, 200)));
        assert_eq!(config.output, PathBuf::from("out"));
    }

    #[test]
    fn stage_wires_parents_and_overrides() {
        let loader = MemoryLoader::new().with("plate.json", PLATE);
        let stage = pollster::block_on(Stage::from_manifest(&manifest(), &loader, None)).unwrap();

        let base = stage.scene.find("base").unwrap();
        let arm = stage.scene.find("arm").unwrap();
        let ghost = stage.scene.find("ghost").unwrap();
        assert_eq!(stage.scene.parent(arm), Some(base));
        assert_eq!(stage.scene.node(arm).unwrap().position, Vec3::new(3.0, 0.0, 0.0));
        assert!(stage.scene.node(ghost).unwrap().is_unpopulated());
        assert_eq!(stage.renderer.camera.width(), 64.0);
        assert_eq!(stage.camera_position(), Vec3::new(0.0, 0.0, -20.0));
    }

    #[test]
    fn viewport_override_wins() {
        let loader = MemoryLoader::new().with("plate.json", PLATE);
        let viewport = Some(Viewport {
            width: 10,
            height: 10,
        });
        let stage =
            pollster::block_on(Stage::from_manifest(&manifest(), &loader, viewport)).unwrap();
        assert_eq!(stage.renderer.camera.height(), 10.0);
    }

    #[test]
    fn frames_advance_motion_before_drawing() {
        let loader = MemoryLoader::new().with("plate.json", PLATE);
        let mut stage =
            pollster::block_on(Stage::from_manifest(&manifest(), &loader, None)).unwrap();
        let mut surface = ImageSurface::new(64, 36).unwrap();
        let stats = stage.frame(&mut surface).unwrap();
        assert_eq!(stats.drawn, 2);

        let base = stage.scene.find("base").unwrap();
        assert!((stage.scene.node(base).unwrap().rotation().z - 0.1).abs() < 1e-6);
        // The plate's center pixel is covered.
        assert_ne!(surface.to_image().get_pixel(32, 18).0, [0, 0, 0, 255]);
    }

    #[test]
    fn dangling_parent_fails_the_stage() {
        let manifest = Manifest::from_json(
            r#"{ "nodes": [{ "name": "a", "resource": "plate.json", "parent": "b" }] }"#,
        )
        .unwrap();
        let loader = MemoryLoader::new().with("plate.json", PLATE);
        let result = pollster::block_on(Stage::from_manifest(&manifest, &loader, None));
        assert!(matches!(result, Err(ConfigError::UnknownParent { .. })));
    }
}

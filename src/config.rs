//! Scene manifests.
//!
//! A manifest is a JSON file listing the models that make up a scene, how they
//! hang together, how they move, and where the camera sits:
//!
//! ```json
//! {
//!   "viewport": { "width": 800, "height": 450 },
//!   "camera": { "position": [0, 0, -200], "fov": 1.0472, "far": 1000 },
//!   "render": { "strokeScale": 256 },
//!   "nodes": [
//!     { "name": "ascent", "resource": "lm_ascent.json",
//!       "motion": { "kind": "spin", "rate": [0, 0, -0.00628] } },
//!     { "name": "descent", "resource": "lm_descent.json", "parent": "ascent" }
//!   ]
//! }
//! ```
//!
//! Every field is optional.

use std::path::Path;

use glam::Vec3;
use serde::Deserialize;

use crate::camera::{Camera, CameraError};
use crate::motion::Motion;
use crate::renderer::RenderConfig;
use crate::scene::SceneError;

/// Errors raised while reading a manifest or assembling its scene.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Camera(CameraError),
    /// A node names a parent that no node in the manifest is called.
    UnknownParent { node: String, parent: String },
    Scene(SceneError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "malformed manifest: {}", e),
            ConfigError::Camera(e) => write!(f, "camera: {}", e),
            ConfigError::UnknownParent { node, parent } => {
                write!(f, "node '{}' names unknown parent '{}'", node, parent)
            }
            ConfigError::Scene(e) => write!(f, "scene: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::Camera(e) => Some(e),
            ConfigError::Scene(e) => Some(e),
            ConfigError::UnknownParent { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<CameraError> for ConfigError {
    fn from(e: CameraError) -> Self {
        ConfigError::Camera(e)
    }
}

impl From<SceneError> for ConfigError {
    fn from(e: SceneError) -> Self {
        ConfigError::Scene(e)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
        }
    }
}

/// Camera pose and projection.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Radians about x, y and z.
    pub rotation: Vec3,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let camera = Camera::default();
        Self {
            position: camera.position,
            rotation: camera.rotation(),
            fov: camera.fov(),
            near: camera.near(),
            far: camera.far(),
        }
    }
}

impl CameraConfig {
    pub fn build(&self, viewport: Viewport) -> Result<Camera, CameraError> {
        let mut camera =
            Camera::new().with_viewport(viewport.width as f32, viewport.height as f32)?;
        camera.position = self.position;
        camera.set_rotation(self.rotation);
        camera.set_clip_planes(self.near, self.far)?;
        camera.set_fov(self.fov)?;
        Ok(camera)
    }
}

/// One model in the scene.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub name: String,
    /// Model path relative to the manifest.
    pub resource: String,
    /// Name of another node in the same manifest.
    pub parent: Option<String>,
    /// Overrides the pose stored in the model file.
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<f32>,
    pub motion: Option<Motion>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub viewport: Viewport,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    pub nodes: Vec<NodeConfig>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Checks that every named parent exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for node in &self.nodes {
            if let Some(parent) = &node.parent {
                if !self.nodes.iter().any(|n| &n.name == parent) {
                    return Err(ConfigError::UnknownParent {
                        node: node.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

//! # Phosphor
//!
//! **A software 3D pipeline that draws wireframe-and-fill models with nothing but
//! a 2D polygon call.**
//!
//! Models live in a scene graph, each with its own position, rotation and scale
//! and an optional parent whose transform it inherits. Every frame the renderer
//! transforms all faces into camera space, sorts them farthest first, projects
//! them to the screen, drops the ones facing away and paints the rest in order
//! onto any [`Surface`].
//!
//! ## Quick Start
//!
//! ```
//! use phosphor::*;
//!
//! let desc = SceneDescription::from_json(r##"{
//!     "vertices": [[-1,-1,0],[1,-1,0],[1,1,0],[-1,1,0]],
//!     "faces": [[0,1,2,3]],
//!     "fill": "#0b0", "stroke": "white",
//!     "z": -10
//! }"##).unwrap();
//!
//! let mut scene = Scene::new();
//! scene.spawn(SceneNode::from_description("plate", &desc));
//!
//! let renderer = Renderer::new(Camera::new().with_viewport(320.0, 180.0).unwrap());
//! let mut surface = ImageSurface::new(320, 180).unwrap();
//! let stats = renderer.draw(&scene, &mut surface).unwrap();
//! assert_eq!(stats.drawn, 1);
//! ```
//!
//! ## Layout
//!
//! - [`Matrix`], [`Camera`]: transforms and projection
//! - [`Scene`], [`SceneNode`]: the node registry and parent links
//! - [`Renderer`], [`Surface`]: depth sort, culling and draw dispatch
//! - [`loader`], [`config`], [`app`]: getting scenes off disk and into PNGs

pub mod app;
mod camera;
pub mod canvas;
mod color;
pub mod config;
mod description;
pub mod geometry;
pub mod loader;
pub mod logging;
mod matrix;
pub mod motion;
mod polygon;
mod renderer;
mod scene;

pub use camera::{Camera, CameraError};
pub use canvas::ImageSurface;
pub use color::{Color, ColorError};
pub use description::{FaceEntry, FaceRecord, SceneDescription, SubfaceRecord};
pub use geometry::{GeometryError, PendingGeometry, RawGeometry};
pub use loader::{FileLoader, LoadError, MemoryLoader, SceneLoader, load_node};
pub use matrix::{
    IntoHomogeneous, Matrix, MatrixError, ProjectedPoint, SINGULAR_EPSILON, W_EPSILON, wrap_angle,
};
pub use motion::{Crawler, Motion};
pub use polygon::{Polygon, is_backface};
pub use renderer::{
    Backdrop, FrameStats, RenderConfig, Renderer, Stroke, Surface, depth_sort, stroke_width,
};
pub use scene::{DecalTemplate, FaceTemplate, Parent, Scene, SceneError, SceneNode};

// Re-export math types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
pub use hecs::Entity;

//! The scene graph.
//!
//! A [`Scene`] owns every [`SceneNode`] as an entity in an `hecs` world. Parent
//! links are plain [`Parent`] components: they shape transforms and nothing else.
//!
//! # Example
//!
//! ```
//! use phosphor::{Camera, Scene, SceneDescription, SceneNode};
//!
//! let desc = SceneDescription::from_json(
//!     r#"{ "vertices": [[0,0,0],[1,0,0],[0,1,0]], "faces": [[0,1,2]], "z": -5 }"#,
//! ).unwrap();
//!
//! let mut scene = Scene::new();
//! let body = scene.spawn(SceneNode::from_description("body", &desc));
//! let arm = scene.spawn_child(SceneNode::from_description("arm", &desc), body).unwrap();
//!
//! let faces = scene.transformed_faces(arm, &Camera::new()).unwrap();
//! assert_eq!(faces.len(), 1);
//! assert_eq!(faces[0].depth, 10.0);
//! ```
//!
//! Transforms compose child first: a child's vertices go through its own
//! scale/rotation/translation, then its parent's, and so on up the chain, then
//! through the camera's view.

mod node;
#[allow(clippy::module_inception)]
mod scene;

pub use node::{DecalTemplate, FaceTemplate, SceneNode};
pub use scene::{Parent, Scene, SceneError};

//! Asynchronous model loading.
//!
//! A node is spawned before its geometry arrives; until then it is unpopulated
//! and draws nothing. [`load_node`] resolves a resource into a finished node, and
//! a resource that fails to load leaves the node empty rather than failing the
//! whole scene.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::description::SceneDescription;
use crate::geometry::{GeometryError, PendingGeometry};
use crate::scene::SceneNode;

/// Errors raised while fetching or decoding a model.
#[derive(Debug)]
pub enum LoadError {
    Io { resource: String, source: std::io::Error },
    Json { resource: String, source: serde_json::Error },
    Geometry { resource: String, source: GeometryError },
    /// No decoder for this resource.
    UnknownFormat(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io { resource, source } => write!(f, "reading '{}': {}", resource, source),
            LoadError::Json { resource, source } => {
                write!(f, "malformed model '{}': {}", resource, source)
            }
            LoadError::Geometry { resource, source } => {
                write!(f, "importing '{}': {}", resource, source)
            }
            LoadError::UnknownFormat(resource) => write!(f, "no loader for '{}'", resource),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Json { source, .. } => Some(source),
            LoadError::Geometry { source, .. } => Some(source),
            LoadError::UnknownFormat(_) => None,
        }
    }
}

/// Source of model descriptions.
pub trait SceneLoader {
    fn load(&self, resource: &str) -> impl Future<Output = Result<SceneDescription, LoadError>>;
}

/// Loads models from disk, relative to a root directory.
///
/// `.json` files are parsed as scene descriptions; `.stl` files are imported as
/// unstyled triangle meshes.
#[derive(Clone, Debug)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_sync(&self, resource: &str) -> Result<SceneDescription, LoadError> {
        let path = self.root.join(resource);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => {
                let text = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
                    resource: resource.to_string(),
                    source,
                })?;
                SceneDescription::from_json(&text).map_err(|source| LoadError::Json {
                    resource: resource.to_string(),
                    source,
                })
            }
            "stl" => {
                let bytes = std::fs::read(&path).map_err(|source| LoadError::Io {
                    resource: resource.to_string(),
                    source,
                })?;
                PendingGeometry::from_stl_bytes(&bytes)
                    .build()
                    .map_err(|source| LoadError::Geometry {
                        resource: resource.to_string(),
                        source,
                    })
            }
            _ => Err(LoadError::UnknownFormat(resource.to_string())),
        }
    }
}

impl SceneLoader for FileLoader {
    fn load(&self, resource: &str) -> impl Future<Output = Result<SceneDescription, LoadError>> {
        async move { self.load_sync(resource) }
    }
}

/// Serves JSON models from memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    models: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resource: impl Into<String>, json: impl Into<String>) -> Self {
        self.insert(resource, json);
        self
    }

    pub fn insert(&mut self, resource: impl Into<String>, json: impl Into<String>) {
        self.models.insert(resource.into(), json.into());
    }
}

impl SceneLoader for MemoryLoader {
    fn load(&self, resource: &str) -> impl Future<Output = Result<SceneDescription, LoadError>> {
        async move {
            let text = self.models.get(resource).ok_or_else(|| LoadError::Io {
                resource: resource.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory"),
            })?;
            SceneDescription::from_json(text).map_err(|source| LoadError::Json {
                resource: resource.to_string(),
                source,
            })
        }
    }
}

/// Loads `resource` and builds a node from it.
///
/// A failed load is logged and yields an unpopulated node, so the rest of the
/// scene still renders.
pub async fn load_node<L: SceneLoader>(
    loader: &L,
    name: &str,
    resource: &str,
) -> SceneNode {
    match loader.load(resource).await {
        Ok(desc) => {
            log::debug!(
                "loaded '{}' from '{}': {} vertices",
                name,
                resource,
                desc.vertices.len()
            );
            SceneNode::from_description(name, &desc)
        }
        Err(e) => {
            log::error!("node '{}' left empty: {}", name, e);
            SceneNode::new(name)
        }
    }
}

/// [`load_node`] driven to completion on the current thread.
pub fn load_node_blocking<L: SceneLoader>(loader: &L, name: &str, resource: &str) -> SceneNode {
    pollster::block_on(load_node(loader, name, resource))
}

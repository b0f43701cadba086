//! The scene container: node storage plus parent topology.

use hecs::{Entity, Ref, RefMut, World};

use super::node::SceneNode;
use crate::camera::Camera;
use crate::matrix::Matrix;
use crate::polygon::Polygon;

/// Non-owning link from a node to the node it is attached to.
///
/// Lives as its own component next to [`SceneNode`]; a root node simply has none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Errors raised by scene graph operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The entity is not (or no longer) part of this scene.
    UnknownNode(Entity),
    /// Attaching `child` under `parent` would close a loop.
    CyclicHierarchy { child: Entity, parent: Entity },
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::UnknownNode(e) => write!(f, "unknown scene node {:?}", e),
            SceneError::CyclicHierarchy { child, parent } => write!(
                f,
                "parenting {:?} under {:?} would create a cycle",
                child, parent
            ),
        }
    }
}

impl std::error::Error for SceneError {}

/// Owns every [`SceneNode`] and the parent links between them.
///
/// Nodes are drawn in spawn order, each one independently; a parent only
/// affects its children's transforms, never which nodes get drawn.
#[derive(Default)]
pub struct Scene {
    world: World,
    order: Vec<Entity>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root node.
    pub fn spawn(&mut self, node: SceneNode) -> Entity {
        let entity = self.world.spawn((node,));
        self.order.push(entity);
        entity
    }

    /// Adds a node attached under `parent`.
    pub fn spawn_child(&mut self, node: SceneNode, parent: Entity) -> Result<Entity, SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        let entity = self.spawn(node);
        self.set_parent(entity, Some(parent))?;
        Ok(entity)
    }

    /// Removes a node and hands it back. Its children become roots.
    pub fn despawn(&mut self, entity: Entity) -> Result<SceneNode, SceneError> {
        let node = self
            .world
            .remove_one::<SceneNode>(entity)
            .map_err(|_| SceneError::UnknownNode(entity))?;
        let _ = self.world.despawn(entity);
        self.order.retain(|&e| e != entity);

        let orphans: Vec<Entity> = self
            .order
            .iter()
            .copied()
            .filter(|&e| self.parent(e) == Some(entity))
            .collect();
        for orphan in orphans {
            log::warn!(
                "node {:?} lost its parent '{}' and is now a root",
                orphan,
                node.name
            );
            let _ = self.world.remove_one::<Parent>(orphan);
        }
        Ok(node)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All nodes, in spawn order.
    pub fn nodes(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    /// The first node with the given name.
    pub fn find(&self, name: &str) -> Option<Entity> {
        self.nodes()
            .find(|&e| self.node(e).map(|n| n.name == name).unwrap_or(false))
    }

    pub fn node(&self, entity: Entity) -> Result<Ref<'_, SceneNode>, SceneError> {
        self.world
            .get::<&SceneNode>(entity)
            .map_err(|_| SceneError::UnknownNode(entity))
    }

    pub fn node_mut(&mut self, entity: Entity) -> Result<RefMut<'_, SceneNode>, SceneError> {
        self.world
            .get::<&mut SceneNode>(entity)
            .map_err(|_| SceneError::UnknownNode(entity))
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&Parent>(entity).ok().map(|p| p.0)
    }

    /// Attaches `child` under `parent`, or detaches it with `None`.
    ///
    /// Fails with [`SceneError::CyclicHierarchy`] when `parent` is `child` itself or
    /// one of its descendants; nothing changes in that case.
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> Result<(), SceneError> {
        if !self.contains(child) {
            return Err(SceneError::UnknownNode(child));
        }
        let Some(parent) = parent else {
            let _ = self.world.remove_one::<Parent>(child);
            return Ok(());
        };
        if !self.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        if self.chain_reaches(parent, child) {
            return Err(SceneError::CyclicHierarchy { child, parent });
        }
        self.world
            .insert_one(child, Parent(parent))
            .map_err(|_| SceneError::UnknownNode(child))
    }

    // Whether walking up from `start` hits `target`. A walk longer than the node
    // count can only mean a loop, which counts as a hit.
    fn chain_reaches(&self, start: Entity, target: Entity) -> bool {
        let mut current = Some(start);
        let mut steps = 0;
        while let Some(e) = current {
            if e == target || steps > self.order.len() {
                return true;
            }
            steps += 1;
            current = self.parent(e);
        }
        false
    }

    /// The node's transform composed with every ancestor's, child first.
    pub fn local_matrix(&self, entity: Entity) -> Result<Matrix, SceneError> {
        let mut m = self.node(entity)?.own_matrix();
        let mut current = self.parent(entity);
        let mut steps = 0;
        while let Some(ancestor) = current {
            steps += 1;
            if steps > self.order.len() {
                return Err(SceneError::CyclicHierarchy {
                    child: entity,
                    parent: ancestor,
                });
            }
            m.multiply(&self.node(ancestor)?.own_matrix());
            current = self.parent(ancestor);
        }
        Ok(m)
    }

    /// Camera-space polygons for one node, built fresh for this frame.
    pub fn transformed_faces(
        &self,
        entity: Entity,
        camera: &Camera,
    ) -> Result<Vec<Polygon>, SceneError> {
        let m = self.local_matrix(entity)? * camera.view_matrix();
        Ok(self.node(entity)?.build_polygons(&m))
    }
}

//! # Entity Arena and Scene Graph
//!
//! Positioned, drawable nodes arranged in a tree under a single root
//! sentinel. Entities live in one contiguous arena owned by [`SceneGraph`];
//! parent/child relations are [`EntityId`] indices into that arena, so there
//! are no owning back-pointers to dangle at teardown. Entities are appended
//! for the lifetime of the graph and destroyed only when the graph is.
//!
//! The parent/child relation is expected to be a tree. Cycles are not
//! detected; re-parenting an entity under one of its own descendants is a
//! caller error.

use log::warn;

use crate::gfx::transform::Transform;

/// Index-based handle to an entity in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(u32);

/// The root sentinel. Always present, always parentless.
pub const ROOT: EntityId = EntityId(0);

/// What an entity is, replacing a subclass hierarchy with a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A plain positioned node.
    Node,
    /// A registered light; the payload is its light-registry handle.
    Light(u8),
}

/// A node in the scene graph.
#[derive(Debug)]
pub struct Entity {
    pub transform: Transform,
    pub kind: EntityKind,
    /// Handle of an attached model, drawn at this entity's pose.
    pub model: Option<u8>,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

impl Entity {
    fn new(kind: EntityKind, parent: Option<EntityId>) -> Self {
        Self {
            transform: Transform::new(),
            kind,
            model: None,
            parent,
            children: Vec::new(),
        }
    }

    /// `None` only for the root sentinel, or for an entity explicitly
    /// detached via `set_parent(id, None)`.
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }
}

/// Arena of entities rooted at [`ROOT`].
pub struct SceneGraph {
    entities: Vec<Entity>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a graph containing only the root sentinel.
    pub fn new() -> Self {
        Self {
            entities: vec![Entity::new(EntityKind::Node, None)],
        }
    }

    /// Number of entities in the arena, root included. Never zero.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Creates a new entity of the given kind under `parent`.
    pub fn spawn_kind(&mut self, parent: EntityId, kind: EntityKind) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(Entity::new(kind, None));
        self.set_parent(id, Some(parent));
        id
    }

    /// Creates a plain node under `parent`.
    pub fn spawn(&mut self, parent: EntityId) -> EntityId {
        self.spawn_kind(parent, EntityKind::Node)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        let entity = self.entities.get(id.0 as usize);
        if entity.is_none() {
            warn!("entity lookup out of range: {:?}", id);
        }
        entity
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let entity = self.entities.get_mut(id.0 as usize);
        if entity.is_none() {
            warn!("entity lookup out of range: {:?}", id);
        }
        entity
    }

    /// Appends `child` to `parent`'s child sequence and updates the child's
    /// back-reference, detaching it from any previous parent first.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) {
        self.set_parent(child, Some(parent));
    }

    /// Removes `child` from `parent`'s child sequence (linear scan by
    /// identity). The child's own back-reference is cleared only when the
    /// scan actually removed it; naming the wrong parent leaves both sides
    /// untouched.
    pub fn remove_child(&mut self, parent: EntityId, child: EntityId) {
        let mut removed = false;
        if let Some(entity) = self.entity_mut(parent) {
            let before = entity.children.len();
            entity.children.retain(|&c| c != child);
            removed = entity.children.len() != before;
        }
        if !removed {
            warn!("remove_child: {:?} is not a child of {:?}", child, parent);
            return;
        }
        if let Some(entity) = self.entity_mut(child) {
            entity.parent = None;
        }
    }

    /// Re-parents `child`. `None` leaves the entity parentless: it still
    /// lives in the arena but is unreachable from the root until re-attached.
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) {
        if child == ROOT {
            warn!("the root entity cannot be re-parented");
            return;
        }
        if self.entities.get(child.0 as usize).is_none() {
            warn!("set_parent on out-of-range entity {:?}", child);
            return;
        }

        // Detach from the old parent, if any.
        if let Some(old) = self.entities[child.0 as usize].parent {
            if let Some(old_parent) = self.entities.get_mut(old.0 as usize) {
                old_parent.children.retain(|&c| c != child);
            }
        }

        match parent {
            Some(parent) => {
                if self.entities.get(parent.0 as usize).is_none() {
                    warn!("set_parent to out-of-range parent {:?}", parent);
                    self.entities[child.0 as usize].parent = None;
                    return;
                }
                self.entities[parent.0 as usize].children.push(child);
                self.entities[child.0 as usize].parent = Some(parent);
            }
            None => {
                warn!(
                    "entity {:?} detached from the graph; it is unreachable until re-parented",
                    child
                );
                self.entities[child.0 as usize].parent = None;
            }
        }
    }

    /// World-space matrix of an entity: the product of its ancestor chain's
    /// local transforms, root first. Out-of-range ids yield identity.
    pub fn world_matrix(&self, id: EntityId) -> cgmath::Matrix4<f32> {
        use cgmath::SquareMatrix;
        let Some(entity) = self.entity(id) else {
            return cgmath::Matrix4::identity();
        };
        let local = entity.transform.matrix();
        match entity.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// Iterates every entity with its id, root included.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i as u32), e))
    }
}

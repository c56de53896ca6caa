//! Composed scene trees
//!
//! A [`SceneTree`] owns the root [`Entity`] of one composed game object and
//! offers the lookups registrars and tools need.

use super::entity::{ComponentKind, Entity};

/// A composed game object
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTree {
    root: Entity,
}

impl SceneTree {
    pub(crate) fn new(root: Entity) -> Self {
        Self { root }
    }

    /// The root entity
    pub fn root(&self) -> &Entity {
        &self.root
    }

    /// Take ownership of the root entity
    pub fn into_root(self) -> Entity {
        self.root
    }

    /// Total number of entities, root included
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// A tree always has a root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Entities in pre-order: root first, then children in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.iter_with_parent().map(|(_, entity)| entity)
    }

    /// Entities in pre-order, each paired with its parent (`None` for the root)
    pub fn iter_with_parent(&self) -> impl Iterator<Item = (Option<&Entity>, &Entity)> {
        let mut stack: Vec<(Option<&Entity>, &Entity)> = vec![(None, &self.root)];
        std::iter::from_fn(move || {
            let (parent, entity) = stack.pop()?;
            stack.extend(entity.children().iter().rev().map(|child| (Some(entity), child)));
            Some((parent, entity))
        })
    }

    /// First entity with the given id, searching in pre-order
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.iter().find(|entity| entity.id() == id)
    }

    /// Entities of one kind, in pre-order
    pub fn entities_of_kind<'a>(&'a self, kind: &'a ComponentKind) -> impl Iterator<Item = &'a Entity> + 'a {
        self.iter().filter(move |entity| entity.kind() == kind)
    }
}

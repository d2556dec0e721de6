//! Handle types for the scene graph arenas

pub use slotmap::{Key, SlotMap};

slotmap::new_key_type! {
    /// Stable handle of a node stored in a [`crate::scene::SceneGraph`]
    pub struct NodeId;

    /// Stable handle of a drawable stored in a [`crate::scene::SceneGraph`]
    pub struct DrawableId;
}

/// Arena of nodes addressed by [`NodeId`]
pub type NodeArena<T> = SlotMap<NodeId, T>;

/// Arena of drawables addressed by [`DrawableId`]
pub type DrawableArena<T> = SlotMap<DrawableId, T>;

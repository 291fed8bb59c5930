//! Scene-graph module.
//!
//! - [`SpatialNode`]: node data (local transform, rest pose, inheritance
//!   flags, hierarchy links, cached derived state)
//! - [`SceneGraph`]: node storage and every hierarchy/transform operation
//! - [`NodeMut`]: chainable mutation wrapper
//! - [`Skeleton`]: ordered, named joint array built on the graph
//!
//! Nodes are addressed by [`NodeId`], a generational key: handles to removed
//! nodes go stale instead of dangling.

pub mod event;
pub mod graph;
pub mod node;
pub mod skeleton;
pub mod wrapper;

pub use event::{NodeEvent, ObserverId};
pub use graph::SceneGraph;
pub use node::{Inherit, Invalidation, SpatialNode};
pub use skeleton::Skeleton;
pub use wrapper::NodeMut;

use slotmap::new_key_type;

new_key_type! {
    /// Generational handle to a node stored in a [`SceneGraph`].
    pub struct NodeId;
}

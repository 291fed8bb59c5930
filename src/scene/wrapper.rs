//! Chainable node operation wrapper.
//!
//! [`NodeMut`] borrows a [`SceneGraph`] mutably and provides a fluent API
//! for the common mutation paths without threading an [`Invalidation`]
//! argument through every call; everything here invalidates recursively.
//!
//! All methods silently no-op when the handle is stale, so users never
//! encounter panics from dangling handles.
//!
//! # Example
//!
//! ```rust,ignore
//! graph.node(handle)
//!     .set_position(Vec3::new(0.0, 3.0, 0.0))
//!     .set_scale_uniform(2.0)
//!     .look_at(Vec3::ZERO);
//! ```
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::must_use_candidate)]
use glam::{Quat, Vec3};

use crate::scene::NodeId;
use crate::scene::graph::SceneGraph;
use crate::scene::node::{Invalidation, SpatialNode};

/// Temporary mutable borrow of a graph node for chainable operations.
pub struct NodeMut<'a> {
    graph: &'a mut SceneGraph,
    id: NodeId,
}

impl<'a> NodeMut<'a> {
    #[inline]
    pub(crate) fn new(graph: &'a mut SceneGraph, id: NodeId) -> Self {
        Self { graph, id }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    fn live(&self) -> bool {
        self.graph.contains(self.id)
    }

    // -- Local transform (chainable) --

    pub fn set_position(self, position: Vec3) -> Self {
        if self.live() {
            self.graph
                .set_position(self.id, position, Invalidation::Recursive);
        }
        self
    }

    pub fn set_rotation(self, rotation: Quat) -> Self {
        if self.live() {
            self.graph
                .set_rotation(self.id, rotation, Invalidation::Recursive);
        }
        self
    }

    /// Sets rotation from Euler angles (XYZ intrinsic order, radians).
    pub fn set_rotation_euler(self, x: f32, y: f32, z: f32) -> Self {
        if self.live() {
            self.graph
                .set_rotation_euler(self.id, x, y, z, Invalidation::Recursive);
        }
        self
    }

    pub fn set_scale(self, scale: Vec3) -> Self {
        if self.live() {
            self.graph.set_scale(self.id, scale, Invalidation::Recursive);
        }
        self
    }

    pub fn set_scale_uniform(self, scale: f32) -> Self {
        self.set_scale(Vec3::splat(scale))
    }

    pub fn translate(self, delta: Vec3) -> Self {
        if self.live() {
            self.graph.translate(self.id, delta, Invalidation::Recursive);
        }
        self
    }

    pub fn rotate(self, delta: Quat) -> Self {
        if self.live() {
            self.graph.rotate(self.id, delta, Invalidation::Recursive);
        }
        self
    }

    pub fn scale_by(self, factor: Vec3) -> Self {
        if self.live() {
            self.graph.scale_by(self.id, factor, Invalidation::Recursive);
        }
        self
    }

    /// Orients the node to face `target` (in the parent's coordinate
    /// system), keeping `up` as the up reference.
    pub fn look_at_with_up(self, target: Vec3, up: Vec3) -> Self {
        if self.live() {
            self.graph
                .look_at(self.id, target, up, Invalidation::Recursive);
        }
        self
    }

    pub fn look_at(self, target: Vec3) -> Self {
        self.look_at_with_up(target, SpatialNode::UP)
    }

    // -- World-space transform (chainable) --

    pub fn set_global_position(self, position: Vec3) -> Self {
        if self.live() {
            self.graph
                .set_global_position(self.id, position, Invalidation::Recursive);
        }
        self
    }

    pub fn set_global_rotation(self, rotation: Quat) -> Self {
        if self.live() {
            self.graph
                .set_global_rotation(self.id, rotation, Invalidation::Recursive);
        }
        self
    }

    pub fn set_global_scale(self, scale: Vec3) -> Self {
        if self.live() {
            self.graph
                .set_global_scale(self.id, scale, Invalidation::Recursive);
        }
        self
    }

    pub fn translate_global(self, delta: Vec3) -> Self {
        if self.live() {
            self.graph
                .translate_global(self.id, delta, Invalidation::Recursive);
        }
        self
    }

    pub fn rotate_global(self, delta: Quat) -> Self {
        if self.live() {
            self.graph
                .rotate_global(self.id, delta, Invalidation::Recursive);
        }
        self
    }

    // -- Rest pose (chainable) --

    pub fn set_initial_position(self, position: Vec3) -> Self {
        if self.live() {
            self.graph
                .set_initial_position(self.id, position, Invalidation::Recursive);
        }
        self
    }

    pub fn set_initial_rotation(self, rotation: Quat) -> Self {
        if self.live() {
            self.graph
                .set_initial_rotation(self.id, rotation, Invalidation::Recursive);
        }
        self
    }

    pub fn set_initial_scale(self, scale: Vec3) -> Self {
        if self.live() {
            self.graph
                .set_initial_scale(self.id, scale, Invalidation::Recursive);
        }
        self
    }

    // -- Inheritance flags (chainable) --

    pub fn set_inherit_position(self, inherit: bool) -> Self {
        if self.live() {
            self.graph
                .set_inherit_position(self.id, inherit, Invalidation::Recursive);
        }
        self
    }

    pub fn set_inherit_rotation(self, inherit: bool) -> Self {
        if self.live() {
            self.graph
                .set_inherit_rotation(self.id, inherit, Invalidation::Recursive);
        }
        self
    }

    pub fn set_inherit_scale(self, inherit: bool) -> Self {
        if self.live() {
            self.graph
                .set_inherit_scale(self.id, inherit, Invalidation::Recursive);
        }
        self
    }
}

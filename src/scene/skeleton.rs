//! Skeletons: ordered, named joint arrays over a private scene graph.
//!
//! A joint *is* a [`SpatialNode`]; the skeleton owns the actual storage (its
//! own [`SceneGraph`]) together with the joint order, names and name lookup.
//! Bind poses live in the nodes' initial transforms, animation poses in the
//! local transforms, so blending two skeleton poses is a per-joint local
//! interpolation.

use std::cell::Cell;

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::bounds::Aabb;
use crate::errors::{Result, SylvaError};
use crate::scene::NodeId;
use crate::scene::graph::SceneGraph;
use crate::scene::node::{Invalidation, SpatialNode};
use crate::scene::wrapper::NodeMut;

/// An ordered joint hierarchy with name lookup and a lazily cached
/// world-space bounding box.
pub struct Skeleton {
    name: String,
    graph: SceneGraph,
    joints: Vec<NodeId>,
    joint_names: Vec<String>,
    // First registration wins; later same-name joints stay index-only.
    name_map: FxHashMap<String, usize>,
    // None doubles as "stale"; recomputing an empty skeleton is free.
    aabb: Cell<Option<Aabb>>,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            graph: SceneGraph::new(),
            joints: Vec::new(),
            joint_names: Vec::new(),
            name_map: FxHashMap::default(),
            aabb: Cell::new(None),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Appends a joint, optionally parented to an existing joint, and
    /// returns its index. Parents must be added before their children.
    pub fn add_joint(&mut self, name: &str, parent: Option<usize>) -> Result<usize> {
        let parent_id = match parent {
            Some(index) => Some(self.joint_id(index).map_err(|_| SylvaError::OutOfRange {
                context: "joint parent",
                index,
            })?),
            None => None,
        };

        let id = self.graph.create_node();
        if let Some(pid) = parent_id {
            // A fresh leaf can never form a cycle.
            let _ = self.graph.set_parent(id, Some(pid), false, Invalidation::Recursive);
        }

        let index = self.joints.len();
        self.joints.push(id);
        self.joint_names.push(name.to_string());
        self.name_map.entry(name.to_string()).or_insert(index);
        self.aabb.set(None);
        Ok(index)
    }

    /// Writes a joint's bind (rest-pose) transform.
    pub fn set_bind_transform(
        &mut self,
        index: usize,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> Result<()> {
        let id = self.joint_id(index)?;
        self.graph
            .set_initial_position(id, position, Invalidation::Skip);
        self.graph
            .set_initial_rotation(id, rotation, Invalidation::Skip);
        self.graph.set_initial_scale(id, scale, Invalidation::Skip);
        self.graph.invalidate(id, Invalidation::Recursive);
        self.aabb.set(None);
        Ok(())
    }

    /// Builds an independent skeleton with the same topology, names, bind
    /// poses and current pose.
    #[must_use]
    pub fn duplicate(&self) -> Skeleton {
        let mut copy = Skeleton::new(&self.name);
        for (index, &id) in self.joints.iter().enumerate() {
            let node = self.graph.get(id).expect("joint handles are never stale");
            let parent_index = node
                .parent()
                .and_then(|pid| self.joints.iter().position(|&j| j == pid));
            // Parents precede children, so the index is always valid here.
            let new_index = copy
                .add_joint(&self.joint_names[index], parent_index)
                .expect("topology is valid by construction");
            let new_id = copy.joints[new_index];
            copy.graph
                .set_initial_position(new_id, node.initial_position(), Invalidation::Skip);
            copy.graph
                .set_initial_rotation(new_id, node.initial_rotation(), Invalidation::Skip);
            copy.graph
                .set_initial_scale(new_id, node.initial_scale(), Invalidation::Skip);
            copy.graph.set_transform(
                new_id,
                node.position(),
                node.rotation(),
                node.scale(),
                Invalidation::Skip,
            );
        }
        copy.invalidate_roots();
        copy
    }

    // ========================================================================
    // Joint Access
    // ========================================================================

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Handle of the joint at `index`.
    pub fn joint_id(&self, index: usize) -> Result<NodeId> {
        self.joints
            .get(index)
            .copied()
            .ok_or(SylvaError::OutOfRange {
                context: "joint",
                index,
            })
    }

    /// Read access to the joint at `index`.
    pub fn joint(&self, index: usize) -> Result<&SpatialNode> {
        let id = self.joint_id(index)?;
        Ok(self.graph.get(id).expect("joint handles are never stale"))
    }

    /// Index of the first joint registered under `name`.
    pub fn joint_index(&self, name: &str) -> Result<usize> {
        self.name_map
            .get(name)
            .copied()
            .ok_or_else(|| SylvaError::JointNotFound(name.to_string()))
    }

    pub fn joint_id_by_name(&self, name: &str) -> Result<NodeId> {
        let index = self.joint_index(name)?;
        self.joint_id(index)
    }

    /// Chainable mutation of the joint at `index`. The cached bounding box
    /// is conservatively marked stale.
    pub fn joint_mut(&mut self, index: usize) -> Result<NodeMut<'_>> {
        let id = self.joint_id(index)?;
        self.aabb.set(None);
        Ok(self.graph.node(id))
    }

    pub fn joint_mut_by_name(&mut self, name: &str) -> Result<NodeMut<'_>> {
        let index = self.joint_index(name)?;
        self.joint_mut(index)
    }

    /// Indices of all parentless joints.
    pub fn root_joints(&self) -> impl Iterator<Item = usize> + '_ {
        self.joints.iter().enumerate().filter_map(|(index, &id)| {
            self.graph
                .get(id)
                .and_then(|node| node.parent().is_none().then_some(index))
        })
    }

    /// The joint storage, for world-space queries
    /// (e.g. `skeleton.graph().global_position(id)`).
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    // ========================================================================
    // Pose Operations
    // ========================================================================

    /// Copies `source`'s current pose (local transforms) joint-for-joint.
    /// Both skeletons must have the same joint count.
    pub fn copy_pose(&mut self, source: &Skeleton) -> Result<()> {
        self.check_joint_count(source)?;

        for (index, &id) in self.joints.iter().enumerate() {
            let src = source.joint(index)?;
            self.graph.set_transform(
                id,
                src.position(),
                src.rotation(),
                src.scale(),
                Invalidation::Skip,
            );
        }

        self.invalidate_roots();
        self.aabb.set(None);
        Ok(())
    }

    /// Writes this skeleton's pose as the blend of two other skeletons'
    /// poses at `t`: Lerp for position and scale, shortest-path Slerp for
    /// rotation, per joint. All three skeletons must have the same joint
    /// count.
    pub fn interpolate_poses(&mut self, a: &Skeleton, b: &Skeleton, t: f32) -> Result<()> {
        self.check_joint_count(a)?;
        self.check_joint_count(b)?;

        for index in 0..self.joints.len() {
            self.blend_joint(a, b, t, index)?;
        }

        self.invalidate_roots();
        self.aabb.set(None);
        Ok(())
    }

    /// Partial-blend variant for masked animation (e.g. upper-body only):
    /// only the listed joint indices are written.
    pub fn interpolate_joints(
        &mut self,
        a: &Skeleton,
        b: &Skeleton,
        t: f32,
        indices: &[usize],
    ) -> Result<()> {
        self.check_joint_count(a)?;
        self.check_joint_count(b)?;

        for &index in indices {
            if index >= self.joints.len() {
                return Err(SylvaError::OutOfRange {
                    context: "joint",
                    index,
                });
            }
            self.blend_joint(a, b, t, index)?;
        }

        self.invalidate_roots();
        self.aabb.set(None);
        Ok(())
    }

    fn blend_joint(&mut self, a: &Skeleton, b: &Skeleton, t: f32, index: usize) -> Result<()> {
        let ja = a.joint(index)?;
        let jb = b.joint(index)?;
        let position = ja.position().lerp(jb.position(), t);
        let rotation = ja.rotation().slerp(jb.rotation(), t);
        let scale = ja.scale().lerp(jb.scale(), t);

        let id = self.joints[index];
        self.graph
            .set_transform(id, position, rotation, scale, Invalidation::Skip);
        Ok(())
    }

    // ========================================================================
    // Bounds
    // ========================================================================

    /// Axis-aligned box spanned by the joints' world positions, recomputed
    /// lazily after any pose mutation. `None` for an empty skeleton.
    #[must_use]
    pub fn aabb(&self) -> Option<Aabb> {
        if let Some(aabb) = self.aabb.get() {
            return Some(aabb);
        }

        let mut joints = self.joints.iter();
        let first = *joints.next()?;
        let mut aabb = Aabb::from_point(self.graph.global_position(first));
        for &id in joints {
            aabb.extend(self.graph.global_position(id));
        }

        self.aabb.set(Some(aabb));
        Some(aabb)
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn check_joint_count(&self, other: &Skeleton) -> Result<()> {
        if self.joints.len() == other.joint_count() {
            Ok(())
        } else {
            Err(SylvaError::OutOfRange {
                context: "pose (joint counts differ)",
                index: other.joint_count(),
            })
        }
    }

    /// One recursive invalidation per root closes out a batch of
    /// `Invalidation::Skip` joint writes.
    fn invalidate_roots(&mut self) {
        let roots: Vec<NodeId> = self
            .joints
            .iter()
            .copied()
            .filter(|&id| self.graph.get(id).is_some_and(|n| n.parent().is_none()))
            .collect();
        for id in roots {
            self.graph.invalidate(id, Invalidation::Recursive);
        }
    }
}

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};
use slotmap::SlotMap;

use crate::errors::{Result, SylvaError};
use crate::scene::event::{NodeEvent, ObserverId, Observers};
use crate::scene::node::{Inherit, Invalidation, SpatialNode};
use crate::scene::wrapper::NodeMut;
use crate::scene::NodeId;

/// Determinant magnitude below which a matrix is rejected as degenerate.
const DEGENERATE_DET_EPSILON: f32 = 1e-12;

/// Owner of node storage and every hierarchy/transform operation.
///
/// # Ownership
///
/// Nodes live in a generational slot map; parent/child links are [`NodeId`]
/// relations, never ownership. [`remove`](Self::remove) detaches the node
/// from its parent and turns its children into roots, so a stale handle can
/// be detected but never dereferences freed memory.
///
/// # Laziness
///
/// Mutations only mark caches stale (per their [`Invalidation`] policy).
/// World-space state is recomputed on read by the two ensure entry points,
/// walking up to the nearest ancestor with a valid cache. Queries therefore
/// take `&self`; the caches sit behind `Cell`s.
///
/// # Handles
///
/// Operations index nodes directly and panic on a stale [`NodeId`]; use
/// [`get`](Self::get)/[`contains`](Self::contains) for checked access, or
/// the [`node`](Self::node) wrapper which no-ops on stale handles.
#[derive(Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SpatialNode>,
    observers: Observers,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Storage
    // ========================================================================

    /// Inserts a node and returns its handle. The node keeps whatever local
    /// transform it carries; hierarchy links on the value are ignored (a
    /// freshly inserted node is always a root).
    pub fn insert(&mut self, mut node: SpatialNode) -> NodeId {
        node.parent = None;
        node.children.clear();
        self.nodes.insert(node)
    }

    /// Inserts a default (identity) node.
    pub fn create_node(&mut self) -> NodeId {
        self.nodes.insert(SpatialNode::new())
    }

    /// Inserts a copy of `id`: local and initial transform plus inheritance
    /// flags, parentless and with dirty caches.
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        let copy = self.nodes[id].clone();
        self.nodes.insert(copy)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&SpatialNode> {
        self.nodes.get(id)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SpatialNode)> {
        self.nodes.iter()
    }

    /// Iterates over all parentless nodes.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Chainable mutation wrapper for `id`. All wrapper operations use
    /// [`Invalidation::Recursive`] and silently no-op on a stale handle.
    pub fn node(&mut self, id: NodeId) -> NodeMut<'_> {
        NodeMut::new(self, id)
    }

    /// Removes a node, detaching it from its parent and orphaning its
    /// children (their parent link is cleared and their subtrees are
    /// invalidated). Observers receive one `Reparented { parent: None }` per
    /// orphan followed by `Removed`. Returns `None` for a stale handle.
    pub fn remove(&mut self, id: NodeId) -> Option<SpatialNode> {
        if !self.nodes.contains_key(id) {
            return None;
        }

        if let Some(pid) = self.nodes[id].parent
            && let Some(parent) = self.nodes.get_mut(pid)
            && let Some(pos) = parent.children.iter().position(|&c| c == id)
        {
            parent.children.remove(pos);
        }

        let node = self.nodes.remove(id)?;

        for &child in &node.children {
            if let Some(c) = self.nodes.get_mut(child) {
                c.parent = None;
            }
            self.invalidate(child, Invalidation::Recursive);
            self.observers.emit(NodeEvent::Reparented {
                node: child,
                parent: None,
            });
        }

        self.observers.emit(NodeEvent::Removed(id));
        Some(node)
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Returns true when `ancestor` appears on `node`'s parent chain.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes[node].parent;
        while let Some(nid) = current {
            if nid == ancestor {
                return true;
            }
            current = self.nodes[nid].parent;
        }
        false
    }

    /// Reparents `id` under `parent` (`None` makes it a root).
    ///
    /// With `keep_derived` the current world pose is captured first and the
    /// new local transform is back-solved against the new parent, so the
    /// world pose is preserved across the reparent. Without it the local
    /// values are left untouched and the world pose jumps.
    ///
    /// Fails with [`SylvaError::InvalidHierarchy`] when the new parent is the
    /// node itself or one of its descendants; the hierarchy is left exactly
    /// as it was.
    pub fn set_parent(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        keep_derived: bool,
        invalidation: Invalidation,
    ) -> Result<()> {
        if self.nodes[id].parent == parent {
            return Ok(());
        }

        if let Some(pid) = parent
            && (pid == id || self.is_ancestor_of(id, pid))
        {
            log::warn!("rejecting reparent of {id:?} under {pid:?}: cycle");
            return Err(SylvaError::InvalidHierarchy {
                node: id,
                parent: pid,
            });
        }

        self.apply_parent(id, parent, keep_derived, invalidation);
        Ok(())
    }

    /// Detaches `id` from its parent, making it a root. No-op for roots.
    pub fn detach(&mut self, id: NodeId, keep_derived: bool, invalidation: Invalidation) {
        if self.nodes[id].parent.is_none() {
            return;
        }
        self.apply_parent(id, None, keep_derived, invalidation);
    }

    /// Relink + back-solve, after validation. Infallible.
    fn apply_parent(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        keep_derived: bool,
        invalidation: Invalidation,
    ) {
        if keep_derived {
            self.ensure_derived(id);
            let (gp, gr, gs) = self.nodes[id].cache.derived_trs();
            self.relink(id, parent);
            self.set_global_position(id, gp, Invalidation::Skip);
            self.set_global_rotation(id, gr, Invalidation::Skip);
            self.set_global_scale(id, gs, Invalidation::Skip);
        } else {
            self.relink(id, parent);
        }

        self.invalidate(id, invalidation);
        self.observers.emit(NodeEvent::Reparented { node: id, parent });
    }

    fn relink(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(old) = self.nodes[id].parent
            && let Some(old_parent) = self.nodes.get_mut(old)
            && let Some(pos) = old_parent.children.iter().position(|&c| c == id)
        {
            old_parent.children.remove(pos);
        }

        if let Some(pid) = parent {
            self.nodes[pid].children.push(id);
        }
        self.nodes[id].parent = parent;
    }

    // ========================================================================
    // Invalidation & Lazy Recomputation
    // ========================================================================

    /// Marks cached derived state stale per `invalidation`. Recomputation
    /// only ever happens on the next read.
    pub fn invalidate(&mut self, id: NodeId, invalidation: Invalidation) {
        match invalidation {
            Invalidation::Skip => {}
            Invalidation::NodeOnly => {
                self.nodes[id].cache.mark_dirty();
                self.observers.emit(NodeEvent::Invalidated(id));
            }
            Invalidation::Recursive => {
                let notify = !self.observers.is_empty();
                let mut touched = Vec::new();
                let mut stack = vec![id];
                while let Some(nid) = stack.pop() {
                    let node = &self.nodes[nid];
                    node.cache.mark_dirty();
                    stack.extend(node.children.iter().copied());
                    if notify {
                        touched.push(nid);
                    }
                }
                for nid in touched {
                    self.observers.emit(NodeEvent::Invalidated(nid));
                }
            }
        }
    }

    /// Recomputes the derived (world-space) TRS of `id` if stale, updating
    /// stale ancestors first. Idempotent.
    pub fn ensure_derived(&self, id: NodeId) {
        let mut chain: Vec<NodeId> = Vec::new();
        let mut current = Some(id);
        while let Some(nid) = current {
            let node = &self.nodes[nid];
            if node.cache.derived_valid() {
                break;
            }
            chain.push(nid);
            current = node.parent;
        }

        // Stale ancestors first, then back down toward `id`.
        for &nid in chain.iter().rev() {
            self.update_derived(nid);
        }
    }

    /// Recomputes the cached 4x4 transform matrix of `id` if stale
    /// (ensuring the derived TRS first). Idempotent.
    pub fn ensure_transform_matrix(&self, id: NodeId) {
        let node = &self.nodes[id];
        if node.cache.matrix_valid() {
            return;
        }
        self.ensure_derived(id);
        let (position, rotation, scale) = node.cache.derived_trs();
        node.cache
            .store_matrix(Mat4::from_scale_rotation_translation(scale, rotation, position));
    }

    /// Composes one node's derived TRS from its parent's (already valid)
    /// derived state and the inheritance flags.
    fn update_derived(&self, id: NodeId) {
        let node = &self.nodes[id];
        let (position, rotation, scale) = match node.parent {
            Some(pid) => {
                let (pp, pr, ps) = self.nodes[pid].cache.derived_trs();

                let position = if node.inherits_position() {
                    pr * (ps * (node.initial_position + node.position)) + pp
                } else {
                    node.initial_position + node.position
                };

                let rotation = if node.inherits_rotation() {
                    (node.initial_rotation * pr * node.rotation).normalize()
                } else {
                    (node.initial_rotation * node.rotation).normalize()
                };

                let mut scale = node.initial_scale * node.scale;
                if node.inherits_scale() {
                    scale *= ps;
                }

                (position, rotation, scale)
            }
            None => (
                node.initial_position + node.position,
                (node.initial_rotation * node.rotation).normalize(),
                node.initial_scale * node.scale,
            ),
        };

        node.cache.store_derived(position, rotation, scale);
    }

    // ========================================================================
    // Global Queries
    // ========================================================================

    #[must_use]
    pub fn global_position(&self, id: NodeId) -> Vec3 {
        self.ensure_derived(id);
        self.nodes[id].cache.derived_trs().0
    }

    #[must_use]
    pub fn global_rotation(&self, id: NodeId) -> Quat {
        self.ensure_derived(id);
        self.nodes[id].cache.derived_trs().1
    }

    #[must_use]
    pub fn global_scale(&self, id: NodeId) -> Vec3 {
        self.ensure_derived(id);
        self.nodes[id].cache.derived_trs().2
    }

    /// World transform matrix, rebuilt lazily from the derived TRS.
    #[must_use]
    pub fn transform_matrix(&self, id: NodeId) -> Mat4 {
        self.ensure_transform_matrix(id);
        self.nodes[id].cache.matrix()
    }

    #[must_use]
    pub fn forward(&self, id: NodeId) -> Vec3 {
        self.global_rotation(id) * SpatialNode::FORWARD
    }

    #[must_use]
    pub fn backward(&self, id: NodeId) -> Vec3 {
        self.global_rotation(id) * SpatialNode::BACKWARD
    }

    #[must_use]
    pub fn up(&self, id: NodeId) -> Vec3 {
        self.global_rotation(id) * SpatialNode::UP
    }

    #[must_use]
    pub fn down(&self, id: NodeId) -> Vec3 {
        self.global_rotation(id) * SpatialNode::DOWN
    }

    #[must_use]
    pub fn right(&self, id: NodeId) -> Vec3 {
        self.global_rotation(id) * SpatialNode::RIGHT
    }

    #[must_use]
    pub fn left(&self, id: NodeId) -> Vec3 {
        self.global_rotation(id) * SpatialNode::LEFT
    }

    // ========================================================================
    // Coordinate Conversions (one-shot, never mutate the node)
    // ========================================================================

    /// Converts a point in `id`'s local space to world space.
    #[must_use]
    pub fn to_global_position(&self, id: NodeId, local: Vec3) -> Vec3 {
        self.ensure_derived(id);
        let (dp, dr, ds) = self.nodes[id].cache.derived_trs();
        dr * (ds * local) + dp
    }

    #[must_use]
    pub fn to_global_rotation(&self, id: NodeId, local: Quat) -> Quat {
        (self.global_rotation(id) * local).normalize()
    }

    #[must_use]
    pub fn to_global_scale(&self, id: NodeId, local: Vec3) -> Vec3 {
        self.global_scale(id) * local
    }

    /// Converts a world-space point into `id`'s local space.
    #[must_use]
    pub fn to_local_position(&self, id: NodeId, global: Vec3) -> Vec3 {
        self.ensure_derived(id);
        let (dp, dr, ds) = self.nodes[id].cache.derived_trs();
        dr.conjugate() * (global - dp) / ds
    }

    #[must_use]
    pub fn to_local_rotation(&self, id: NodeId, global: Quat) -> Quat {
        (self.global_rotation(id).conjugate() * global).normalize()
    }

    #[must_use]
    pub fn to_local_scale(&self, id: NodeId, global: Vec3) -> Vec3 {
        global / self.global_scale(id)
    }

    // ========================================================================
    // Local Mutations
    // ========================================================================

    /// Moves the node in its own local frame: the delta is rotated by the
    /// local rotation and added to the local position.
    pub fn translate(&mut self, id: NodeId, delta: Vec3, invalidation: Invalidation) {
        let node = &mut self.nodes[id];
        node.position += node.rotation * delta;
        self.invalidate(id, invalidation);
    }

    /// Moves the node by a world-space delta, compensating for the parent's
    /// derived rotation and scale where the corresponding category is
    /// inherited. Plain addition for roots.
    pub fn translate_global(&mut self, id: NodeId, delta: Vec3, invalidation: Invalidation) {
        let delta_local = {
            let node = &self.nodes[id];
            match node.parent {
                Some(pid) => {
                    self.ensure_derived(pid);
                    let (_, pr, ps) = self.nodes[pid].cache.derived_trs();
                    let mut d = delta;
                    if node.inherits_rotation() {
                        d = pr.conjugate() * d;
                    }
                    if node.inherits_scale() {
                        d /= ps;
                    }
                    d
                }
                None => delta,
            }
        };
        self.nodes[id].position += delta_local;
        self.invalidate(id, invalidation);
    }

    /// Post-multiplies the local rotation and renormalizes.
    pub fn rotate(&mut self, id: NodeId, delta: Quat, invalidation: Invalidation) {
        let q = delta.normalize();
        let node = &mut self.nodes[id];
        node.rotation = (node.rotation * q).normalize();
        self.invalidate(id, invalidation);
    }

    /// Applies a world-space rotation delta by conjugating it into local
    /// space through this node's derived rotation.
    pub fn rotate_global(&mut self, id: NodeId, delta: Quat, invalidation: Invalidation) {
        self.ensure_derived(id);
        let q = delta.normalize();
        let (_, dr, _) = self.nodes[id].cache.derived_trs();
        let node = &mut self.nodes[id];
        node.rotation = (node.rotation * dr.conjugate() * q * dr).normalize();
        self.invalidate(id, invalidation);
    }

    /// Componentwise multiplicative scaling. Scale mutation is local-only:
    /// there is no meaningful global-space scale delta under rotation.
    pub fn scale_by(&mut self, id: NodeId, factor: Vec3, invalidation: Invalidation) {
        self.nodes[id].scale *= factor;
        self.invalidate(id, invalidation);
    }

    pub fn scale_uniform(&mut self, id: NodeId, factor: f32, invalidation: Invalidation) {
        self.scale_by(id, Vec3::splat(factor), invalidation);
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3, invalidation: Invalidation) {
        self.nodes[id].position = position;
        self.invalidate(id, invalidation);
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat, invalidation: Invalidation) {
        self.nodes[id].rotation = rotation.normalize();
        self.invalidate(id, invalidation);
    }

    /// Sets the local rotation from Euler angles (XYZ intrinsic order,
    /// radians).
    pub fn set_rotation_euler(
        &mut self,
        id: NodeId,
        x: f32,
        y: f32,
        z: f32,
        invalidation: Invalidation,
    ) {
        self.set_rotation(id, Quat::from_euler(EulerRot::XYZ, x, y, z), invalidation);
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec3, invalidation: Invalidation) {
        self.nodes[id].scale = scale;
        self.invalidate(id, invalidation);
    }

    /// Assigns the whole local transform at once.
    pub fn set_transform(
        &mut self,
        id: NodeId,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
        invalidation: Invalidation,
    ) {
        let node = &mut self.nodes[id];
        node.position = position;
        node.rotation = rotation.normalize();
        node.scale = scale;
        self.invalidate(id, invalidation);
    }

    /// Position-and-rotation form of [`set_transform`](Self::set_transform)
    /// for callers that leave scale alone.
    pub fn set_pose(
        &mut self,
        id: NodeId,
        position: Vec3,
        rotation: Quat,
        invalidation: Invalidation,
    ) {
        let node = &mut self.nodes[id];
        node.position = position;
        node.rotation = rotation.normalize();
        self.invalidate(id, invalidation);
    }

    /// Orients the node so its forward axis points at `target` (both in the
    /// parent's coordinate system). No-op when target and up are collinear
    /// or the target coincides with the node.
    pub fn look_at(&mut self, id: NodeId, target: Vec3, up: Vec3, invalidation: Invalidation) {
        let node = &self.nodes[id];
        let forward = (target - node.position).normalize_or_zero();
        if forward.cross(up).length_squared() < 1e-4 {
            return;
        }

        let right = forward.cross(up).normalize();
        let new_up = right.cross(forward).normalize();
        let rotation = Quat::from_mat3(&Mat3::from_cols(right, new_up, -forward));

        self.nodes[id].rotation = rotation;
        self.invalidate(id, invalidation);
    }

    // ========================================================================
    // Rest-Pose Mutations
    // ========================================================================

    pub fn set_initial_position(&mut self, id: NodeId, position: Vec3, invalidation: Invalidation) {
        self.nodes[id].initial_position = position;
        self.invalidate(id, invalidation);
    }

    pub fn set_initial_rotation(&mut self, id: NodeId, rotation: Quat, invalidation: Invalidation) {
        self.nodes[id].initial_rotation = rotation.normalize();
        self.invalidate(id, invalidation);
    }

    pub fn set_initial_scale(&mut self, id: NodeId, scale: Vec3, invalidation: Invalidation) {
        self.nodes[id].initial_scale = scale;
        self.invalidate(id, invalidation);
    }

    // ========================================================================
    // Inheritance Flags
    // ========================================================================

    /// Redundant calls are no-ops and do not invalidate.
    pub fn set_inherit_position(&mut self, id: NodeId, inherit: bool, invalidation: Invalidation) {
        let node = &mut self.nodes[id];
        if node.inherits_position() == inherit {
            return;
        }
        node.inherit.set(Inherit::POSITION, inherit);
        self.invalidate(id, invalidation);
    }

    /// Redundant calls are no-ops and do not invalidate.
    pub fn set_inherit_rotation(&mut self, id: NodeId, inherit: bool, invalidation: Invalidation) {
        let node = &mut self.nodes[id];
        if node.inherits_rotation() == inherit {
            return;
        }
        node.inherit.set(Inherit::ROTATION, inherit);
        self.invalidate(id, invalidation);
    }

    /// Redundant calls are no-ops and do not invalidate.
    pub fn set_inherit_scale(&mut self, id: NodeId, inherit: bool, invalidation: Invalidation) {
        let node = &mut self.nodes[id];
        if node.inherits_scale() == inherit {
            return;
        }
        node.inherit.set(Inherit::SCALE, inherit);
        self.invalidate(id, invalidation);
    }

    // ========================================================================
    // Global Mutations (back-solve through the parent)
    // ========================================================================

    /// Sets the world-space position by back-solving the local value against
    /// the parent's derived transform. With position inheritance off the
    /// parent does not contribute and only the rest-pose offset is removed.
    pub fn set_global_position(&mut self, id: NodeId, position: Vec3, invalidation: Invalidation) {
        let local = {
            let node = &self.nodes[id];
            match node.parent {
                Some(pid) if node.inherits_position() => {
                    self.ensure_derived(pid);
                    let (pp, pr, ps) = self.nodes[pid].cache.derived_trs();
                    pr.conjugate() * (position - pp) / ps - node.initial_position
                }
                _ => position - node.initial_position,
            }
        };
        self.nodes[id].position = local;
        self.invalidate(id, invalidation);
    }

    /// Sets the world-space rotation; exact inverse of the derivation
    /// formula, including the rest pose.
    pub fn set_global_rotation(&mut self, id: NodeId, rotation: Quat, invalidation: Invalidation) {
        let local = {
            let node = &self.nodes[id];
            match node.parent {
                Some(pid) if node.inherits_rotation() => {
                    self.ensure_derived(pid);
                    let (_, pr, _) = self.nodes[pid].cache.derived_trs();
                    ((node.initial_rotation * pr).conjugate() * rotation).normalize()
                }
                _ => (node.initial_rotation.conjugate() * rotation).normalize(),
            }
        };
        self.nodes[id].rotation = local;
        self.invalidate(id, invalidation);
    }

    /// Sets the world-space scale (componentwise division through the
    /// parent's derived scale where inherited).
    pub fn set_global_scale(&mut self, id: NodeId, scale: Vec3, invalidation: Invalidation) {
        let local = {
            let node = &self.nodes[id];
            match node.parent {
                Some(pid) if node.inherits_scale() => {
                    self.ensure_derived(pid);
                    let (_, _, ps) = self.nodes[pid].cache.derived_trs();
                    scale / (node.initial_scale * ps)
                }
                _ => scale / node.initial_scale,
            }
        };
        self.nodes[id].scale = local;
        self.invalidate(id, invalidation);
    }

    /// Position-and-rotation form of
    /// [`set_global_transform`](Self::set_global_transform) for callers that
    /// leave scale alone (the common shape of a physics-body sync).
    pub fn set_global_pose(
        &mut self,
        id: NodeId,
        position: Vec3,
        rotation: Quat,
        invalidation: Invalidation,
    ) {
        self.set_global_position(id, position, Invalidation::Skip);
        self.set_global_rotation(id, rotation, Invalidation::Skip);
        self.invalidate(id, invalidation);
    }

    /// Stamps a full world pose: the same per-category back-solves as the
    /// individual setters, applied in order: position, rotation, scale.
    pub fn set_global_transform(
        &mut self,
        id: NodeId,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
        invalidation: Invalidation,
    ) {
        self.set_global_position(id, position, Invalidation::Skip);
        self.set_global_rotation(id, rotation, Invalidation::Skip);
        self.set_global_scale(id, scale, Invalidation::Skip);
        self.invalidate(id, invalidation);
    }

    /// Decomposes `matrix` and stamps it as the world pose, then adopts the
    /// matrix itself as the valid matrix cache.
    ///
    /// Non-finite or non-invertible input is rejected with
    /// [`SylvaError::DegenerateTransform`] before anything is written. Shear
    /// does not survive TRS decomposition.
    pub fn set_transform_matrix(
        &mut self,
        id: NodeId,
        matrix: Mat4,
        invalidation: Invalidation,
    ) -> Result<()> {
        let determinant = matrix.determinant();
        if !determinant.is_finite() || determinant.abs() < DEGENERATE_DET_EPSILON {
            log::warn!("rejecting degenerate transform matrix for {id:?} (det {determinant})");
            return Err(SylvaError::DegenerateTransform { determinant });
        }

        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        if !scale.is_finite() || !rotation.is_finite() || !translation.is_finite() {
            log::warn!("rejecting non-finite transform decomposition for {id:?}");
            return Err(SylvaError::DegenerateTransform { determinant });
        }

        self.set_global_transform(id, translation, rotation, scale, invalidation);
        self.nodes[id].cache.store_matrix(matrix);
        Ok(())
    }

    // ========================================================================
    // Interpolation
    // ========================================================================

    /// Writes this node's local transform as the blend of two other nodes'
    /// local transforms at `t`: Lerp for position and scale, shortest-path
    /// Slerp for rotation.
    pub fn interpolate(
        &mut self,
        id: NodeId,
        a: NodeId,
        b: NodeId,
        t: f32,
        invalidation: Invalidation,
    ) {
        let (ap, ar, asc) = {
            let n = &self.nodes[a];
            (n.position, n.rotation, n.scale)
        };
        let (bp, br, bsc) = {
            let n = &self.nodes[b];
            (n.position, n.rotation, n.scale)
        };

        let node = &mut self.nodes[id];
        node.position = ap.lerp(bp, t);
        node.rotation = ar.slerp(br, t);
        node.scale = asc.lerp(bsc, t);
        self.invalidate(id, invalidation);
    }

    /// Blends the world-space transforms of `a` and `b` at `t` and
    /// back-solves the result into this node's local transform.
    pub fn interpolate_global(
        &mut self,
        id: NodeId,
        a: NodeId,
        b: NodeId,
        t: f32,
        invalidation: Invalidation,
    ) {
        self.ensure_derived(a);
        self.ensure_derived(b);
        let (ap, ar, asc) = self.nodes[a].cache.derived_trs();
        let (bp, br, bsc) = self.nodes[b].cache.derived_trs();

        self.set_global_transform(
            id,
            ap.lerp(bp, t),
            ar.slerp(br, t).normalize(),
            asc.lerp(bsc, t),
            invalidation,
        );
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Registers an observer for hierarchy notifications. Handlers run
    /// synchronously inside the mutating call, after graph state is updated.
    pub fn observe(&mut self, handler: impl FnMut(NodeEvent) + 'static) -> ObserverId {
        self.observers.register(Box::new(handler))
    }

    /// Removes a previously registered observer. Returns false for an
    /// unknown id.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }
}

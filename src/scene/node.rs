use std::cell::Cell;

use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};

use crate::scene::NodeId;

bitflags! {
    /// Per-category inheritance switches.
    ///
    /// A cleared bit makes the derived value for that category ignore the
    /// parent and use only the node's own (initial + local) values. Useful
    /// for billboards, camera rigs and screen-anchored elements.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Inherit: u8 {
        const POSITION = 1 << 0;
        const ROTATION = 1 << 1;
        const SCALE    = 1 << 2;
    }
}

impl Default for Inherit {
    fn default() -> Self {
        Self::all()
    }
}

/// Cache-invalidation policy accepted by every mutating operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Invalidation {
    /// Mark this node and its whole subtree dirty. Re-marking an already
    /// dirty node is idempotent, so the walk never needs a visited set.
    #[default]
    Recursive,
    /// Mark only this node dirty. Children keep whatever cached state they
    /// had; callers using this must refresh the subtree separately or accept
    /// stale descendants.
    NodeOnly,
    /// Leave all caches untouched. For batching a sequence of mutations that
    /// ends in one explicit [`SceneGraph::invalidate`] call.
    ///
    /// [`SceneGraph::invalidate`]: crate::scene::SceneGraph::invalidate
    Skip,
}

/// Lazily recomputed world-space state.
///
/// Two independent validity bits: `derived_valid` covers the world TRS,
/// `matrix_valid` covers the 4x4 matrix built from it. The matrix rebuild can
/// be deferred past the TRS recomputation, never the other way around.
///
/// `Cell` keeps queries `&self`; every cached value is `Copy`.
#[derive(Debug, Clone)]
pub(crate) struct DerivedCache {
    position: Cell<Vec3>,
    rotation: Cell<Quat>,
    scale: Cell<Vec3>,
    matrix: Cell<Mat4>,
    derived_valid: Cell<bool>,
    matrix_valid: Cell<bool>,
}

impl DerivedCache {
    fn new() -> Self {
        Self {
            position: Cell::new(Vec3::ZERO),
            rotation: Cell::new(Quat::IDENTITY),
            scale: Cell::new(Vec3::ONE),
            matrix: Cell::new(Mat4::IDENTITY),
            derived_valid: Cell::new(false),
            matrix_valid: Cell::new(false),
        }
    }

    #[inline]
    pub(crate) fn derived_valid(&self) -> bool {
        self.derived_valid.get()
    }

    #[inline]
    pub(crate) fn matrix_valid(&self) -> bool {
        self.matrix_valid.get()
    }

    #[inline]
    pub(crate) fn derived_trs(&self) -> (Vec3, Quat, Vec3) {
        (self.position.get(), self.rotation.get(), self.scale.get())
    }

    #[inline]
    pub(crate) fn matrix(&self) -> Mat4 {
        self.matrix.get()
    }

    pub(crate) fn store_derived(&self, position: Vec3, rotation: Quat, scale: Vec3) {
        self.position.set(position);
        self.rotation.set(rotation);
        self.scale.set(scale);
        self.derived_valid.set(true);
    }

    pub(crate) fn store_matrix(&self, matrix: Mat4) {
        self.matrix.set(matrix);
        self.matrix_valid.set(true);
    }

    /// Marks both the derived TRS and the matrix stale.
    pub(crate) fn mark_dirty(&self) {
        self.derived_valid.set(false);
        self.matrix_valid.set(false);
    }
}

/// A node in the spatial hierarchy.
///
/// # Design Principles
///
/// - Only holds transform data and hierarchy links; names, meshes, cameras
///   and other attributes belong to the owning container
/// - The local transform is authoritative; world-space state is derived
///   lazily on first read after an invalidation
/// - An optional rest pose (`initial_*`) composes in front of the mutable
///   local transform; skeletal joints store their bind pose there, general
///   nodes leave it at identity
///
/// # Hierarchy
///
/// `parent` and `children` are [`NodeId`] links, relations only: a node's
/// lifetime never depends on its parent, and removing a node from a
/// [`SceneGraph`] turns its children into roots.
///
/// [`SceneGraph`]: crate::scene::SceneGraph
#[derive(Debug)]
pub struct SpatialNode {
    // === Core Hierarchy ===
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,

    // === Local Transform (authoritative) ===
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) scale: Vec3,

    // === Rest Pose ===
    pub(crate) initial_position: Vec3,
    pub(crate) initial_rotation: Quat,
    pub(crate) initial_scale: Vec3,

    pub(crate) inherit: Inherit,

    // === Derived State ===
    pub(crate) cache: DerivedCache,
}

impl SpatialNode {
    /// Unit axes of the engine's orientation convention.
    ///
    /// Forward is -Z, matching the right-handed camera convention. The
    /// negation pairs (backward = -forward, left = -right, down = -up) are
    /// relied upon by direction queries and must stay exact.
    pub const FORWARD: Vec3 = Vec3::NEG_Z;
    pub const BACKWARD: Vec3 = Vec3::Z;
    pub const UP: Vec3 = Vec3::Y;
    pub const DOWN: Vec3 = Vec3::NEG_Y;
    pub const RIGHT: Vec3 = Vec3::X;
    pub const LEFT: Vec3 = Vec3::NEG_X;

    /// Creates a node with an identity local transform, no parent and all
    /// inheritance flags set.
    #[must_use]
    pub fn new() -> Self {
        Self::from_transform(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }

    /// Creates a node with the given local transform.
    #[must_use]
    pub fn from_transform(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            position,
            rotation,
            scale,
            initial_position: Vec3::ZERO,
            initial_rotation: Quat::IDENTITY,
            initial_scale: Vec3::ONE,
            inherit: Inherit::all(),
            cache: DerivedCache::new(),
        }
    }

    // ========================================================================
    // Local Queries (no computation)
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    #[inline]
    #[must_use]
    pub fn initial_position(&self) -> Vec3 {
        self.initial_position
    }

    #[inline]
    #[must_use]
    pub fn initial_rotation(&self) -> Quat {
        self.initial_rotation
    }

    #[inline]
    #[must_use]
    pub fn initial_scale(&self) -> Vec3 {
        self.initial_scale
    }

    #[inline]
    #[must_use]
    pub fn inherits_position(&self) -> bool {
        self.inherit.contains(Inherit::POSITION)
    }

    #[inline]
    #[must_use]
    pub fn inherits_rotation(&self) -> bool {
        self.inherit.contains(Inherit::ROTATION)
    }

    #[inline]
    #[must_use]
    pub fn inherits_scale(&self) -> bool {
        self.inherit.contains(Inherit::SCALE)
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl Default for SpatialNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Value semantics for transform data: the clone carries the local and
/// initial transforms and the inheritance flags, starts parentless and
/// childless, and has dirty caches. Hierarchy relationships are reference
/// semantics owned by the graph and are never duplicated.
impl Clone for SpatialNode {
    fn clone(&self) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            position: self.position,
            rotation: self.rotation,
            scale: self.scale,
            initial_position: self.initial_position,
            initial_rotation: self.initial_rotation,
            initial_scale: self.initial_scale,
            inherit: self.inherit,
            cache: DerivedCache::new(),
        }
    }
}

//! Sylva is the spatial core of a 3D engine: a scene-graph transform
//! hierarchy with lazy derived-state caching, selective inheritance and
//! generational node handles.
//!
//! The crate is deliberately a leaf. Renderers, physics wrappers and
//! animation systems consume [`SceneGraph`] and [`Skeleton`]; nothing here
//! touches a GPU, a file format or a window.

pub mod bounds;
pub mod errors;
pub mod scene;

pub use bounds::Aabb;
pub use errors::{Result, SylvaError};
pub use scene::{
    Inherit, Invalidation, NodeEvent, NodeId, NodeMut, ObserverId, SceneGraph, Skeleton,
    SpatialNode,
};

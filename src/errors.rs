//! Error Types
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, SylvaError>`. Operations that fail leave the
//! hierarchy exactly as it was; nothing is applied half-way.

use thiserror::Error;

use crate::scene::NodeId;

/// The error type for scene-graph and skeleton operations.
#[derive(Error, Debug)]
pub enum SylvaError {
    // ========================================================================
    // Hierarchy Errors
    // ========================================================================
    /// Reparenting would make a node its own ancestor.
    #[error("Reparenting {node:?} under {parent:?} would create a cycle")]
    InvalidHierarchy {
        /// Node that was being reparented
        node: NodeId,
        /// Rejected parent candidate
        parent: NodeId,
    },

    // ========================================================================
    // Transform Errors
    // ========================================================================
    /// Matrix decomposition encountered non-invertible or non-finite input.
    #[error("Degenerate transform matrix (determinant: {determinant})")]
    DegenerateTransform {
        /// Determinant of the rejected matrix
        determinant: f32,
    },

    // ========================================================================
    // Container Errors
    // ========================================================================
    /// Index out of bounds in an owning container (e.g. a skeleton's joints).
    #[error("Index out of bounds: {context} (index: {index})")]
    OutOfRange {
        /// Description of what was being accessed
        context: &'static str,
        /// The invalid index
        index: usize,
    },

    /// No joint with the given name exists in the skeleton.
    #[error("Joint not found: {0}")]
    JointNotFound(String),
}

/// Alias for `Result<T, SylvaError>`.
pub type Result<T> = std::result::Result<T, SylvaError>;

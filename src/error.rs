//! Error types for hemesh.
//!
//! Lookups that can simply miss (id lookups, edge/half-edge queries, rotations)
//! return `Option`. Everything that mutates the mesh, or needs a well-formed
//! mesh to succeed, returns [`Result`] with one of the variants below.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A handle does not refer to a live mesh element.
    #[error("{kind} handle {index} does not refer to a live element")]
    InvalidHandle {
        /// Element kind ("vertex", "edge", "face", "half-edge").
        kind: &'static str,
        /// Raw slot index of the handle.
        index: usize,
    },

    /// A vertex with this id already exists.
    #[error("vertex id {id} is already in use")]
    DuplicateVertexId {
        /// The duplicated id.
        id: usize,
    },

    /// A face with this id already exists.
    #[error("face id {id} is already in use")]
    DuplicateFaceId {
        /// The duplicated id.
        id: usize,
    },

    /// A face has fewer than three corners or repeats a vertex.
    #[error("face {face} is degenerate (fewer than 3 corners or duplicate vertices)")]
    DegenerateFace {
        /// The face id.
        face: usize,
    },

    /// An edge would get more than two incident faces.
    #[error("edge ({v0}, {v1}) has more than two incident faces")]
    NonManifoldEdge {
        /// Id of the first vertex of the edge.
        v0: usize,
        /// Id of the second vertex of the edge.
        v1: usize,
    },

    /// Two faces traverse a shared edge in the same direction.
    #[error("edge ({v0}, {v1}) is traversed twice in the same direction")]
    InconsistentOrientation {
        /// Id of the source vertex.
        v0: usize,
        /// Id of the target vertex.
        v1: usize,
    },

    /// The operation requires an interior edge.
    #[error("edge ({v0}, {v1}) is on the boundary")]
    BoundaryEdge {
        /// Id of the first vertex of the edge.
        v0: usize,
        /// Id of the second vertex of the edge.
        v1: usize,
    },

    /// Swapping the edge would connect two vertices that already share an edge.
    #[error("swapping edge ({v0}, {v1}) would duplicate the existing edge ({w0}, {w1})")]
    SwapCreatesDuplicateEdge {
        /// Id of the first vertex of the swapped edge.
        v0: usize,
        /// Id of the second vertex of the swapped edge.
        v1: usize,
        /// Id of the first vertex of the would-be diagonal.
        w0: usize,
        /// Id of the second vertex of the would-be diagonal.
        w1: usize,
    },

    /// Deleting the face would leave a boundary vertex with two separate fans.
    #[error("deleting face {face} would pinch boundary vertex {vertex}")]
    NonManifoldVertex {
        /// The face id.
        face: usize,
        /// Id of the vertex that would be pinched.
        vertex: usize,
    },

    /// The index type cannot address the elements an operation would add.
    #[error("{kind} storage is full: {needed} more slot(s) do not fit the index type")]
    CapacityExceeded {
        /// Element kind ("vertex", "edge", "face", "half-edge", "vertex id", "face id").
        kind: &'static str,
        /// Number of slots the operation needed.
        needed: usize,
    },

    /// The operation only works on triangles.
    #[error("face {face} has {corners} corners, expected a triangle")]
    NotATriangle {
        /// The face id.
        face: usize,
        /// The number of corners found.
        corners: usize,
    },

    /// A marker vertex was not encountered while walking a boundary loop.
    #[error("marker vertex {vertex} not found on the boundary loop")]
    MarkerNotFound {
        /// Id of the missing marker vertex.
        vertex: usize,
    },

    /// A quadrilateral boundary needs exactly four corners.
    #[error("expected 4 corners on the boundary, found {found}")]
    CornerCount {
        /// Number of corners found.
        found: usize,
    },

    /// The mesh does not have the expected number of boundary loops.
    #[error("expected {expected} boundary loop(s), found {found}")]
    BoundaryLoopCount {
        /// Number of loops expected.
        expected: usize,
        /// Number of loops found.
        found: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading data from a file.
    #[error("failed to load {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

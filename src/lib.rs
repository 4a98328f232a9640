//! # hemesh
//!
//! A half-edge mesh kernel for manifold triangle meshes, with local editing
//! operators and boundary loop tracing.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency steps with type-safe handles
//! - **Flexible indexing**: Support for 16-bit, 32-bit, and 64-bit indices
//! - **User payloads**: Per-element attribute types chosen at compile time
//! - **Local editing**: Face split, edge split and edge swap that keep every
//!   connectivity invariant intact
//! - **Boundary tracing**: Closed boundary loops, segmentation at markers and
//!   quadrilateral patches
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use hemesh::prelude::*;
//! use nalgebra::Point3;
//!
//! // Define vertices and faces
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! // Build the mesh
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_edges(), 6);
//! assert_eq!(mesh.num_faces(), 4);
//! ```
//!
//! The same mesh can be assembled element by element, the way a file loader
//! would:
//!
//! ```
//! use hemesh::prelude::*;
//!
//! let mut mesh: HalfEdgeMesh = HalfEdgeMesh::new();
//! let v: Vec<VertexId> = (1..=4)
//!     .map(|id| mesh.create_vertex(id))
//!     .collect::<Result<_>>()
//!     .unwrap();
//! mesh.create_face(&[v[0], v[1], v[2]], 1).unwrap();
//! mesh.create_face(&[v[0], v[2], v[3]], 2).unwrap();
//! mesh.label_boundary();
//!
//! assert!(mesh.is_valid());
//! assert_eq!(mesh.vertex_with_id(3), Some(v[2]));
//! ```
//!
//! ## Mesh Traversal and Editing
//!
//! ```
//! use hemesh::prelude::*;
//! use nalgebra::Point3;
//!
//! # let vertices = vec![
//! #     Point3::new(0.0, 0.0, 0.0),
//! #     Point3::new(1.0, 0.0, 0.0),
//! #     Point3::new(1.0, 1.0, 0.0),
//! #     Point3::new(0.0, 1.0, 0.0),
//! # ];
//! # let faces = vec![[0, 1, 2], [0, 2, 3]];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! // Iterate over neighbors of a vertex
//! let v = mesh.vertex_with_id(1).unwrap();
//! for neighbor in mesh.vertex_neighbors(v) {
//!     println!("Neighbor: {}", mesh.vertex_id(neighbor));
//! }
//!
//! // Flip the shared diagonal
//! let diagonal = mesh
//!     .edge_ids()
//!     .find(|&e| !mesh.is_boundary_edge(e))
//!     .unwrap();
//! assert!(mesh.swapable(diagonal));
//! mesh.swap_edge(diagonal).unwrap();
//! assert!(mesh.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use hemesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::boundary::{Boundary, BoundaryLoop, LoopSegment, QuadrilateralBoundary};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, Attribute, Attributes, Edge, EdgeId, Face, FaceId,
        HalfEdge, HalfEdgeId, HalfEdgeMesh, MeshIndex, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

//! Core mesh data structures.
//!
//! This module provides the half-edge mesh representation and related types
//! for representing and editing manifold triangle meshes.
//!
//! # Overview
//!
//! The primary type is [`HalfEdgeMesh`], which represents a mesh using a
//! half-edge data structure. Adjacency queries are O(1) per step, and the
//! local editing operators ([`HalfEdgeMesh::split_face`],
//! [`HalfEdgeMesh::split_edge`], [`HalfEdgeMesh::swap_edge`]) rewire a
//! constant number of elements.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe handles:
//! - [`VertexId`] - Identifies a vertex
//! - [`HalfEdgeId`] - Identifies a half-edge
//! - [`FaceId`] - Identifies a face
//! - [`EdgeId`] - Identifies a full edge
//!
//! These handles are generic over the underlying integer type ([`MeshIndex`] trait),
//! allowing you to choose `u16`, `u32`, or `u64` based on mesh size. Vertices
//! and faces additionally carry a user-visible integer id.
//!
//! # Construction
//!
//! ```
//! use hemesh::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert!(mesh.is_valid());
//! ```

mod attributes;
mod builder;
mod dynamic;
mod halfedge;
mod index;

#[cfg(test)]
pub(crate) mod fixtures;

pub use attributes::{Attribute, Attributes};
pub use builder::{build_from_triangles, to_face_vertex};
pub use halfedge::{Edge, Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

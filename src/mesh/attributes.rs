//! User attribute payloads attached to mesh elements.
//!
//! Each element carries a payload of a user-chosen type next to its topology.
//! The payload types are grouped by an [`Attributes`] implementation, which is
//! the second type parameter of [`HalfEdgeMesh`](super::HalfEdgeMesh):
//!
//! ```
//! use hemesh::mesh::{Attribute, Attributes, HalfEdgeMesh};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Curvature(f64);
//!
//! impl Attribute for Curvature {
//!     fn to_trait_string(&self, traits: &mut String) {
//!         *traits = format!("curvature=({})", self.0);
//!     }
//! }
//!
//! #[derive(Debug, Clone)]
//! struct MyAttributes;
//!
//! impl Attributes for MyAttributes {
//!     type Vertex = Curvature;
//!     type Edge = ();
//!     type Face = ();
//!     type HalfEdge = ();
//! }
//!
//! let mesh: HalfEdgeMesh<u32, MyAttributes> = HalfEdgeMesh::new();
//! assert_eq!(mesh.num_vertices(), 0);
//! ```

use std::fmt::Debug;

use crate::error::Result;

/// A payload stored on a single mesh element.
///
/// The two hooks serialize the payload into the element's free-form trait
/// string and back. Both default to doing nothing, so payloads that never touch
/// a file need no code at all.
pub trait Attribute: Default + Clone + Debug {
    /// Write this payload into the element's trait string.
    fn to_trait_string(&self, _traits: &mut String) {}

    /// Restore this payload from the element's trait string.
    fn from_trait_string(&mut self, _traits: &str) -> Result<()> {
        Ok(())
    }
}

impl Attribute for () {}

/// The set of payload types used by a mesh.
pub trait Attributes: Clone + Debug + 'static {
    /// Payload stored on every vertex.
    type Vertex: Attribute;
    /// Payload stored on every edge.
    type Edge: Attribute;
    /// Payload stored on every face.
    type Face: Attribute;
    /// Payload stored on every half-edge (corner).
    type HalfEdge: Attribute;
}

impl Attributes for () {
    type Vertex = ();
    type Edge = ();
    type Face = ();
    type HalfEdge = ();
}

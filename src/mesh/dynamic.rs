//! Local editing operators for triangle meshes.
//!
//! Each operator rewires a constant number of elements and leaves every
//! connectivity invariant intact: face cycles, edge slots and duals, canonical
//! edge orientation, the per-vertex edge lookup, boundary flags, vertex
//! representatives and cached edge lengths.
//!
//! Preconditions are checked before anything is touched, so an operator that
//! returns an error leaves the mesh exactly as it was.

use super::attributes::Attributes;
use super::halfedge::HalfEdgeMesh;
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

impl<I: MeshIndex, A: Attributes> HalfEdgeMesh<I, A> {
    /// The half-edges of a live triangle, or an error naming the problem.
    fn checked_triangle(&self, f: FaceId<I>) -> Result<[HalfEdgeId<I>; 3]> {
        if !self.contains_face(f) {
            return Err(f.stale());
        }
        let corners = self.face_degree(f);
        if corners != 3 {
            let face = self.face_id(f);
            log::warn!("face {} has {} corners, expected a triangle", face, corners);
            return Err(MeshError::NotATriangle { face, corners });
        }
        Ok(self.face_halfedge_triple(f))
    }

    /// The half-edges of the triangle owning `he`, starting at `he`.
    fn checked_triangle_at(&self, he: HalfEdgeId<I>) -> Result<[HalfEdgeId<I>; 3]> {
        self.checked_triangle(self.face_of(he))?;
        let next = self.next(he);
        Ok([he, next, self.next(next)])
    }

    /// Close three half-edges into the cycle of `f`, which starts at `cycle[0]`.
    fn link_triangle(&mut self, f: FaceId<I>, cycle: [HalfEdgeId<I>; 3]) {
        for i in 0..3 {
            let he = self.halfedge_mut(cycle[i]);
            he.face = f;
            he.next = cycle[(i + 1) % 3];
            he.prev = cycle[(i + 2) % 3];
        }
        self.face_mut(f).halfedge = cycle[0];
    }

    /// Fill the slots of `e` and point the half-edges back at it.
    fn attach(&mut self, e: EdgeId<I>, halfedges: [HalfEdgeId<I>; 2]) {
        self.edge_mut(e).halfedges = halfedges;
        for he in halfedges.into_iter().filter(|he| he.is_valid()) {
            self.halfedge_mut(he).edge = e;
        }
        self.canonicalize_edge(e);
        self.update_edge_length(e);
    }

    fn new_face(&mut self) -> FaceId<I> {
        let id = self.next_face_id;
        self.alloc_face(id)
    }

    fn new_halfedge(&mut self, target: VertexId<I>) -> HalfEdgeId<I> {
        let he = self.alloc_halfedge();
        self.halfedge_mut(he).vertex = target;
        he
    }

    /// Replace the representative of `v` if it currently is `old`.
    fn replace_representative(&mut self, v: VertexId<I>, old: HalfEdgeId<I>, new: HalfEdgeId<I>) {
        let vertex = self.vertex_mut(v);
        if vertex.halfedge == old {
            vertex.halfedge = new;
        }
    }

    /// Split a triangle into three around a new vertex at its centroid.
    ///
    /// The face keeps its handle and becomes one of the three triangles; two
    /// faces and three edges are added. Returns the new vertex, which has
    /// valence 3.
    ///
    /// ```
    /// use hemesh::mesh::{build_from_triangles, HalfEdgeMesh};
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// ];
    /// let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
    /// let f = mesh.face_with_id(1).unwrap();
    ///
    /// let center = mesh.split_face(f).unwrap();
    /// assert_eq!(mesh.num_faces(), 3);
    /// assert_eq!(mesh.valence(center), 3);
    /// assert!(mesh.is_valid());
    /// ```
    pub fn split_face(&mut self, f: FaceId<I>) -> Result<VertexId<I>> {
        let [h0, h1, h2] = self.checked_triangle(f)?;
        let (v0, v1, v2) = (self.target(h0), self.target(h1), self.target(h2));
        self.check_capacity(1, 3, 2, 6)?;
        self.check_auto_ids(1, 2)?;

        let c = self.add_vertex(self.face_centroid(f))?;
        let f1 = self.new_face();
        let f2 = self.new_face();

        // h0: v2 -> v0, h1: v0 -> v1, h2: v1 -> v2
        let a = self.new_halfedge(c);
        let b = self.new_halfedge(v0);
        let c1 = self.new_halfedge(c);
        let d1 = self.new_halfedge(v1);
        let c2 = self.new_halfedge(c);
        let d2 = self.new_halfedge(v2);

        self.link_triangle(f, [h1, a, b]);
        self.link_triangle(f1, [h2, c1, d1]);
        self.link_triangle(f2, [h0, c2, d2]);

        let e1 = self.alloc_edge(v1, c);
        self.attach(e1, [a, d1]);
        let e2 = self.alloc_edge(v2, c);
        self.attach(e2, [c1, d2]);
        let e0 = self.alloc_edge(v0, c);
        self.attach(e0, [c2, b]);

        self.vertex_mut(c).halfedge = a;

        log::trace!(
            "split face {} at new vertex {}",
            self.face_id(f),
            self.vertex_id(c)
        );
        Ok(c)
    }

    /// Split an edge at its midpoint.
    ///
    /// Each triangle on the edge is cut in two by a new edge from the midpoint
    /// to its opposite corner. The edge keeps its handle and becomes the half
    /// next to the source of its slot-0 half-edge. Interior edges add two faces
    /// and three edges; boundary edges add one face and two edges, and the new
    /// vertex is a boundary vertex. Returns the new vertex.
    pub fn split_edge(&mut self, e: EdgeId<I>) -> Result<VertexId<I>> {
        if !self.contains_edge(e) {
            return Err(e.stale());
        }
        let [h, s] = self.edge(e).halfedges;
        let Some(h) = h.valid() else {
            return Err(MeshError::InvalidState(format!("{:?} has no half-edges", e)));
        };
        let s = s.valid();

        // h: a -> b in f, followed by h1: b -> c and h2: c -> a
        let [_, h1, h2] = self.checked_triangle_at(h)?;
        let other = match s {
            Some(s) => Some(self.checked_triangle_at(s)?),
            None => None,
        };

        let f = self.face_of(h);
        let (a, b, c) = (self.source(h), self.target(h), self.target(h1));
        self.check_capacity(1, 3, 2, 6)?;
        self.check_auto_ids(1, 2)?;

        let m = self.add_vertex(self.edge_midpoint(e))?;
        let f_new = self.new_face();

        let h_new = self.new_halfedge(b);
        let x1 = self.new_halfedge(c);
        let y1 = self.new_halfedge(m);

        self.halfedge_mut(h).vertex = m;
        self.link_triangle(f, [h, x1, h2]);
        self.link_triangle(f_new, [h_new, h1, y1]);

        let right = self.alloc_edge(m, b);
        let spoke_c = self.alloc_edge(m, c);
        self.attach(spoke_c, [x1, y1]);
        self.rebind_edge(e, a, m);

        self.replace_representative(b, h, h_new);
        self.vertex_mut(m).halfedge = h;

        match (s, other) {
            (Some(s), Some([_, s1, s2])) => {
                // s: b -> a in g, followed by s1: a -> d and s2: d -> b
                let g = self.face_of(s);
                let d = self.target(s1);
                let g_new = self.new_face();

                let s_new = self.new_halfedge(a);
                let z1 = self.new_halfedge(d);
                let w1 = self.new_halfedge(m);

                self.halfedge_mut(s).vertex = m;
                self.link_triangle(g, [s, z1, s2]);
                self.link_triangle(g_new, [s_new, s1, w1]);

                let spoke_d = self.alloc_edge(m, d);
                self.attach(spoke_d, [z1, w1]);
                self.attach(e, [h, s_new]);
                self.attach(right, [h_new, s]);

                self.replace_representative(a, s, s_new);
            }
            _ => {
                self.attach(e, [h, HalfEdgeId::invalid()]);
                self.attach(right, [h_new, HalfEdgeId::invalid()]);
                self.vertex_mut(m).boundary = true;
            }
        }

        log::trace!(
            "split edge ({}, {}) at new vertex {}",
            self.vertex_id(a),
            self.vertex_id(b),
            self.vertex_id(m)
        );
        Ok(m)
    }

    /// The two corners opposite an interior edge: `(c, d)` where `c` closes
    /// the triangle of slot 0 and `d` the triangle of slot 1.
    fn opposite_corners(&self, e: EdgeId<I>) -> Option<(VertexId<I>, VertexId<I>)> {
        let [h, s] = self.edge(e).halfedges;
        let (h, s) = (h.valid()?, s.valid()?);
        Some((self.target(self.next(h)), self.target(self.next(s))))
    }

    /// Whether [`swap_edge`](Self::swap_edge) would succeed on `e`.
    ///
    /// False for boundary edges, for edges next to a non-triangular face, and
    /// when the other diagonal already exists.
    pub fn swapable(&self, e: EdgeId<I>) -> bool {
        if !self.contains_edge(e) {
            return false;
        }
        let [h, s] = self.edge(e).halfedges;
        if !h.is_valid() || !s.is_valid() {
            return false;
        }
        if self.face_degree(self.face_of(h)) != 3 || self.face_degree(self.face_of(s)) != 3 {
            return false;
        }
        match self.opposite_corners(e) {
            Some((c, d)) => c != d && self.edge_between(c, d).is_none(),
            None => false,
        }
    }

    /// Replace an interior edge by the other diagonal of its two triangles.
    ///
    /// Vertex, edge and face counts are unchanged and `e` keeps its handle.
    /// Fails on boundary edges and when the other diagonal already exists.
    pub fn swap_edge(&mut self, e: EdgeId<I>) -> Result<()> {
        if !self.contains_edge(e) {
            return Err(e.stale());
        }
        let [h, s] = self.edge(e).halfedges;
        let [a, b] = self.edge(e).vertices;
        let (Some(h), Some(s)) = (h.valid(), s.valid()) else {
            let (v0, v1) = (self.vertex_id(a), self.vertex_id(b));
            log::warn!("cannot swap boundary edge ({}, {})", v0, v1);
            return Err(MeshError::BoundaryEdge { v0, v1 });
        };

        // h: a -> b in f, followed by h1: b -> c and h2: c -> a
        // s: b -> a in g, followed by s1: a -> d and s2: d -> b
        let [_, h1, h2] = self.checked_triangle_at(h)?;
        let [_, s1, s2] = self.checked_triangle_at(s)?;
        let (c, d) = (self.target(h1), self.target(s1));

        if c == d || self.edge_between(c, d).is_some() {
            let (v0, v1) = (self.vertex_id(a), self.vertex_id(b));
            let (w0, w1) = (self.vertex_id(c), self.vertex_id(d));
            log::warn!(
                "swapping edge ({}, {}) would duplicate edge ({}, {})",
                v0,
                v1,
                w0,
                w1
            );
            return Err(MeshError::SwapCreatesDuplicateEdge { v0, v1, w0, w1 });
        }

        let f = self.face_of(h);
        let g = self.face_of(s);

        // f: h (d -> c), h2 (c -> a), s1 (a -> d)
        // g: s (c -> d), s2 (d -> b), h1 (b -> c)
        self.halfedge_mut(h).vertex = c;
        self.halfedge_mut(s).vertex = d;
        self.link_triangle(f, [h, h2, s1]);
        self.link_triangle(g, [s, s2, h1]);

        self.replace_representative(b, h, s2);
        self.replace_representative(a, s, h2);

        self.rebind_edge(e, d, c);
        self.canonicalize_edge(e);
        self.update_edge_length(e);

        log::trace!(
            "swapped edge ({}, {}) to ({}, {})",
            self.vertex_id(a),
            self.vertex_id(b),
            self.vertex_id(c),
            self.vertex_id(d)
        );
        Ok(())
    }
}

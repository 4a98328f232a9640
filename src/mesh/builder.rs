//! Mesh construction and incremental editing of the element sets.
//!
//! Meshes are assembled one vertex and one face at a time through
//! [`HalfEdgeMesh::create_vertex`] and [`HalfEdgeMesh::create_face`], then
//! finalized with [`HalfEdgeMesh::label_boundary`]. [`build_from_triangles`]
//! wraps the whole sequence for face-vertex lists as commonly found in mesh
//! file formats.

use nalgebra::Point3;

use super::attributes::{Attribute, Attributes};
use super::halfedge::{Edge, Face, HalfEdge, HalfEdgeMesh, Vertex};
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

impl<I: MeshIndex, A: Attributes> HalfEdgeMesh<I, A> {
    // ==================== Storage ====================

    fn insert_vertex(&mut self, id: usize, position: Point3<f64>) -> VertexId<I> {
        let v = VertexId::new(self.vertices.len());
        let mut vertex = Vertex::new(id);
        vertex.position = position;
        self.vertices.push(Some(vertex));
        self.vertex_lookup.insert(id, v);
        self.num_vertices += 1;
        v
    }

    pub(crate) fn alloc_halfedge(&mut self) -> HalfEdgeId<I> {
        let he = HalfEdgeId::new(self.halfedges.len());
        self.halfedges.push(Some(HalfEdge::new()));
        self.num_halfedges += 1;
        he
    }

    pub(crate) fn alloc_face(&mut self, id: usize) -> FaceId<I> {
        let f = FaceId::new(self.faces.len());
        self.faces.push(Some(Face::new(id)));
        self.face_lookup.insert(id, f);
        self.next_face_id = self.next_face_id.max(id.saturating_add(1));
        self.num_faces += 1;
        f
    }

    pub(crate) fn alloc_edge(&mut self, v0: VertexId<I>, v1: VertexId<I>) -> EdgeId<I> {
        let e = EdgeId::new(self.edges.len());
        self.edges.push(Some(Edge::new(v0, v1)));
        self.num_edges += 1;
        self.register_edge(e);
        e
    }

    fn free_halfedge(&mut self, he: HalfEdgeId<I>) {
        if self.halfedges[he.index()].take().is_some() {
            self.num_halfedges -= 1;
        }
    }

    fn free_face(&mut self, f: FaceId<I>) {
        if let Some(face) = self.faces[f.index()].take() {
            self.face_lookup.remove(&face.id);
            self.num_faces -= 1;
        }
    }

    fn free_edge(&mut self, e: EdgeId<I>) {
        self.unregister_edge(e);
        if self.edges[e.index()].take().is_some() {
            self.num_edges -= 1;
        }
    }

    fn free_vertex(&mut self, v: VertexId<I>) {
        if let Some(vertex) = self.vertices[v.index()].take() {
            self.vertex_lookup.remove(&vertex.id);
            self.num_vertices -= 1;
        }
    }

    /// Fail unless the given numbers of new elements fit the index type.
    ///
    /// Slots are never reused, so the slot vectors only grow.
    pub(crate) fn check_capacity(
        &self,
        vertices: usize,
        edges: usize,
        faces: usize,
        halfedges: usize,
    ) -> Result<()> {
        let limit = I::MAX.to_usize().saturating_add(1);
        let slots = [
            ("vertex", self.vertices.len(), vertices),
            ("edge", self.edges.len(), edges),
            ("face", self.faces.len(), faces),
            ("half-edge", self.halfedges.len(), halfedges),
        ];
        for (kind, len, needed) in slots {
            if len.saturating_add(needed) > limit {
                log::warn!("{} storage is full at {} slots", kind, len);
                return Err(MeshError::CapacityExceeded { kind, needed });
            }
        }
        Ok(())
    }

    /// Fail unless the id counters can hand out this many automatic ids.
    pub(crate) fn check_auto_ids(&self, vertices: usize, faces: usize) -> Result<()> {
        let counters = [
            ("vertex id", self.next_vertex_id, vertices),
            ("face id", self.next_face_id, faces),
        ];
        for (kind, next, needed) in counters {
            if next.checked_add(needed).is_none() {
                log::warn!("{} counter is exhausted", kind);
                return Err(MeshError::CapacityExceeded { kind, needed });
            }
        }
        Ok(())
    }

    /// The counter value following an explicit user id.
    fn id_successor(name: &'static str, id: usize) -> Result<usize> {
        id.checked_add(1)
            .ok_or_else(|| MeshError::invalid_param(name, id, "no id is left after it"))
    }

    /// The endpoint whose adjacency list holds the edge: the lower user id.
    fn edge_key(&self, v0: VertexId<I>, v1: VertexId<I>) -> VertexId<I> {
        if self.vertex_id(v0) <= self.vertex_id(v1) {
            v0
        } else {
            v1
        }
    }

    fn register_edge(&mut self, e: EdgeId<I>) {
        let [v0, v1] = self.edge(e).vertices;
        let key = self.edge_key(v0, v1);
        self.vertex_mut(key).edges.push(e);
    }

    fn unregister_edge(&mut self, e: EdgeId<I>) {
        let [v0, v1] = self.edge(e).vertices;
        let key = self.edge_key(v0, v1);
        if let Some(vertex) = self.vertices[key.index()].as_mut() {
            vertex.edges.retain(|&other| other != e);
        }
    }

    /// Move an edge to new endpoints, keeping the lookup lists in step.
    pub(crate) fn rebind_edge(&mut self, e: EdgeId<I>, v0: VertexId<I>, v1: VertexId<I>) {
        self.unregister_edge(e);
        self.edge_mut(e).vertices = [v0, v1];
        self.register_edge(e);
    }

    /// Put an edge's half-edges in canonical slot order.
    ///
    /// A single half-edge always sits in slot 0. With two half-edges, slot 0
    /// runs from the lower user id to the higher one. The stored endpoints are
    /// refreshed from slot 0.
    pub(crate) fn canonicalize_edge(&mut self, e: EdgeId<I>) {
        let [mut h0, mut h1] = self.edge(e).halfedges;
        if !h0.is_valid() {
            std::mem::swap(&mut h0, &mut h1);
        }
        if h0.is_valid()
            && h1.is_valid()
            && self.vertex_id(self.source(h0)) > self.vertex_id(self.target(h0))
        {
            std::mem::swap(&mut h0, &mut h1);
        }
        let vertices = if h0.is_valid() {
            [self.source(h0), self.target(h0)]
        } else {
            self.edge(e).vertices
        };
        let edge = self.edge_mut(e);
        edge.halfedges = [h0, h1];
        edge.vertices = vertices;
    }

    // ==================== Construction ====================

    /// Create an isolated vertex with the given user id.
    ///
    /// An id of `0` asks the mesh to pick the next free id. Ids only ever grow:
    /// after this call every automatically assigned id is larger than `id`.
    pub fn create_vertex(&mut self, id: usize) -> Result<VertexId<I>> {
        self.check_capacity(1, 0, 0, 0)?;
        let id = if id == 0 {
            self.check_auto_ids(1, 0)?;
            self.next_vertex_id
        } else {
            id
        };
        if self.vertex_lookup.contains_key(&id) {
            return Err(MeshError::DuplicateVertexId { id });
        }
        let successor = Self::id_successor("id", id)?;
        self.next_vertex_id = self.next_vertex_id.max(successor);
        Ok(self.insert_vertex(id, Point3::origin()))
    }

    /// Create a vertex at `position` with the next free id.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> Result<VertexId<I>> {
        self.check_capacity(1, 0, 0, 0)?;
        self.check_auto_ids(1, 0)?;
        let id = self.next_vertex_id;
        self.next_vertex_id += 1;
        Ok(self.insert_vertex(id, position))
    }

    /// The edge joining two vertices, in either direction.
    pub fn edge_between(&self, v0: VertexId<I>, v1: VertexId<I>) -> Option<EdgeId<I>> {
        if !self.contains_vertex(v0) || !self.contains_vertex(v1) {
            return None;
        }
        let key = self.edge_key(v0, v1);
        self.vertex(key).edges.iter().copied().find(|&e| {
            let [a, b] = self.edge(e).vertices;
            (a == v0 && b == v1) || (a == v1 && b == v0)
        })
    }

    /// The half-edge running from `source` to `target`.
    pub fn halfedge_between(
        &self,
        source: VertexId<I>,
        target: VertexId<I>,
    ) -> Option<HalfEdgeId<I>> {
        let e = self.edge_between(source, target)?;
        self.edge(e)
            .halfedges
            .iter()
            .copied()
            .filter(|he| he.is_valid())
            .find(|&he| self.target(he) == target && self.source(he) == source)
    }

    /// The half-edge of face `f` whose target is `v`.
    pub fn corner(&self, v: VertexId<I>, f: FaceId<I>) -> Option<HalfEdgeId<I>> {
        if !self.contains_face(f) {
            return None;
        }
        self.face_halfedges(f).find(|&he| self.target(he) == v)
    }

    /// Look up the edge between two vertices, creating it if missing.
    ///
    /// A freshly created edge has no half-edges until a face uses it.
    pub fn create_edge(&mut self, v0: VertexId<I>, v1: VertexId<I>) -> Result<EdgeId<I>> {
        for v in [v0, v1] {
            if !self.contains_vertex(v) {
                return Err(v.stale());
            }
        }
        if v0 == v1 {
            return Err(MeshError::invalid_param(
                "v1",
                self.vertex_id(v1),
                "edge endpoints must differ",
            ));
        }
        if let Some(e) = self.edge_between(v0, v1) {
            return Ok(e);
        }
        self.check_capacity(0, 1, 0, 0)?;
        let e = self.alloc_edge(v0, v1);
        self.update_edge_length(e);
        Ok(e)
    }

    /// Create a face from its corners in counter-clockwise order.
    ///
    /// The `i`-th half-edge of the face targets `corners[i]`, so walking the
    /// face from its representative visits the corners in the given order. An
    /// id of `0` picks the next free face id.
    ///
    /// Everything is checked before the mesh is touched: on error the mesh is
    /// unchanged.
    pub fn create_face(&mut self, corners: &[VertexId<I>], id: usize) -> Result<FaceId<I>> {
        let n = corners.len();
        let id = if id == 0 {
            self.check_auto_ids(0, 1)?;
            self.next_face_id
        } else {
            id
        };

        if self.face_lookup.contains_key(&id) {
            return Err(MeshError::DuplicateFaceId { id });
        }
        Self::id_successor("id", id)?;
        self.check_capacity(0, n, 1, n)?;
        for &v in corners {
            if !self.contains_vertex(v) {
                return Err(v.stale());
            }
        }
        if n < 3 {
            return Err(MeshError::DegenerateFace { face: id });
        }
        for i in 0..n {
            if corners[i + 1..].contains(&corners[i]) {
                return Err(MeshError::DegenerateFace { face: id });
            }
        }
        for i in 0..n {
            let source = corners[(i + n - 1) % n];
            let target = corners[i];
            let Some(e) = self.edge_between(source, target) else {
                continue;
            };
            let (v0, v1) = (self.vertex_id(source), self.vertex_id(target));
            let edge = self.edge(e);
            if edge.halfedges[0].is_valid() && edge.halfedges[1].is_valid() {
                log::warn!("face {}: edge ({}, {}) already has two faces", id, v0, v1);
                return Err(MeshError::NonManifoldEdge { v0, v1 });
            }
            if self.halfedge_between(source, target).is_some() {
                log::warn!("face {}: edge ({}, {}) is already used in this direction", id, v0, v1);
                return Err(MeshError::InconsistentOrientation { v0, v1 });
            }
        }

        let f = self.alloc_face(id);
        let hes: Vec<HalfEdgeId<I>> = (0..n).map(|_| self.alloc_halfedge()).collect();
        self.face_mut(f).halfedge = hes[0];

        for i in 0..n {
            let he = self.halfedge_mut(hes[i]);
            he.vertex = corners[i];
            he.face = f;
            he.next = hes[(i + 1) % n];
            he.prev = hes[(i + n - 1) % n];
        }

        for i in 0..n {
            let source = corners[(i + n - 1) % n];
            let target = corners[i];
            let e = match self.edge_between(source, target) {
                Some(e) => e,
                None => self.alloc_edge(source, target),
            };
            let edge = self.edge_mut(e);
            if edge.halfedges[0].is_valid() {
                edge.halfedges[1] = hes[i];
            } else {
                edge.halfedges[0] = hes[i];
            }
            self.halfedge_mut(hes[i]).edge = e;
            self.canonicalize_edge(e);
            self.update_edge_length(e);
            self.vertex_mut(target).halfedge = hes[i];
        }

        log::trace!("created face {} with {} corners", id, n);
        Ok(f)
    }

    /// Remove a face, detaching its half-edges from their edges.
    ///
    /// Edges left without half-edges are removed; the remaining ones become
    /// boundary edges. Every corner of the face becomes a boundary vertex
    /// whose representative is its most counter-clockwise incoming half-edge,
    /// or an isolated vertex if nothing else touches it.
    ///
    /// A face with faces on both sides of a boundary corner is refused: taking
    /// it out would split that corner's fan in two.
    pub fn delete_face(&mut self, f: FaceId<I>) -> Result<()> {
        if !self.contains_face(f) {
            return Err(f.stale());
        }
        let hes: Vec<HalfEdgeId<I>> = self.face_halfedges(f).collect();

        for &he in &hes {
            let v = self.target(he);
            if self.vertex(v).boundary
                && self.ccw_rotate_about_target(he).is_some()
                && self.clw_rotate_about_target(he).is_some()
            {
                let (face, vertex) = (self.face_id(f), self.vertex_id(v));
                log::warn!("deleting face {} would pinch boundary vertex {}", face, vertex);
                return Err(MeshError::NonManifoldVertex { face, vertex });
            }
        }

        // Any incoming half-edge outside this face seeds the new representative.
        let seeds: Vec<(VertexId<I>, Option<HalfEdgeId<I>>)> = hes
            .iter()
            .map(|&he| {
                let seed = self
                    .ccw_rotate_about_target(he)
                    .or_else(|| self.clw_rotate_about_target(he));
                (self.target(he), seed)
            })
            .collect();

        for &he in &hes {
            let e = self.edge_of(he);
            let other = self.edge(e).other(he);
            if other.is_valid() {
                self.edge_mut(e).halfedges = [other, HalfEdgeId::invalid()];
                self.canonicalize_edge(e);
            } else {
                self.free_edge(e);
            }
        }
        for &he in &hes {
            self.free_halfedge(he);
        }
        self.free_face(f);

        for (v, seed) in seeds {
            let vertex = self.vertex_mut(v);
            match seed {
                Some(seed) => {
                    vertex.boundary = true;
                    let rep = self.rotate_to_end(seed, Self::ccw_rotate_about_target);
                    self.vertex_mut(v).halfedge = rep;
                }
                None => {
                    vertex.boundary = false;
                    vertex.halfedge = HalfEdgeId::invalid();
                }
            }
        }
        Ok(())
    }

    /// Finalize the mesh after construction or face deletion.
    ///
    /// Orients every interior edge canonically, recomputes the boundary flag
    /// of every vertex, removes vertices and edges no face uses, points every
    /// boundary vertex at its most counter-clockwise incoming half-edge and
    /// refreshes all cached edge lengths.
    pub fn label_boundary(&mut self) {
        let mut incoming: Vec<Option<HalfEdgeId<I>>> = vec![None; self.vertices.len()];
        for (he, halfedge) in self.halfedges() {
            incoming[halfedge.vertex.index()] = Some(he);
        }

        let unused_edges: Vec<EdgeId<I>> = self
            .edges()
            .filter(|(_, e)| !e.halfedges[0].is_valid() && !e.halfedges[1].is_valid())
            .map(|(e, _)| e)
            .collect();
        for &e in &unused_edges {
            self.free_edge(e);
        }

        let dangling: Vec<VertexId<I>> = self
            .vertex_ids()
            .filter(|v| incoming[v.index()].is_none())
            .collect();
        for &v in &dangling {
            self.free_vertex(v);
        }

        let edges: Vec<EdgeId<I>> = self.edge_ids().collect();
        for &e in &edges {
            self.canonicalize_edge(e);
        }

        let vertices: Vec<VertexId<I>> = self.vertex_ids().collect();
        for &v in &vertices {
            let rep = self.vertex(v).halfedge;
            let rep_ok = self.contains_halfedge(rep) && self.target(rep) == v;
            let vertex = self.vertex_mut(v);
            vertex.boundary = false;
            if !rep_ok {
                if let Some(he) = incoming[v.index()] {
                    vertex.halfedge = he;
                }
            }
        }

        for &e in &edges {
            if self.edge(e).is_boundary() {
                let [v0, v1] = self.edge(e).vertices;
                self.vertex_mut(v0).boundary = true;
                self.vertex_mut(v1).boundary = true;
            }
        }

        let mut num_boundary = 0;
        for &v in &vertices {
            if self.vertex(v).boundary {
                num_boundary += 1;
                let rep = self.vertex(v).halfedge;
                let rep = self.rotate_to_end(rep, Self::ccw_rotate_about_target);
                self.vertex_mut(v).halfedge = rep;
            }
        }

        self.refresh_edge_lengths();

        log::debug!(
            "labeled boundary: {} boundary vertices, removed {} dangling vertices and {} unused edges",
            num_boundary,
            dangling.len(),
            unused_edges.len()
        );
    }

    // ==================== Traits ====================

    /// Serialize every element payload into its trait string.
    pub fn encode_traits(&mut self) {
        for v in self.vertices.iter_mut().flatten() {
            v.data.to_trait_string(&mut v.traits);
        }
        for e in self.edges.iter_mut().flatten() {
            e.data.to_trait_string(&mut e.traits);
        }
        for f in self.faces.iter_mut().flatten() {
            f.data.to_trait_string(&mut f.traits);
        }
        for he in self.halfedges.iter_mut().flatten() {
            he.data.to_trait_string(&mut he.traits);
        }
    }

    /// Restore every element payload from its trait string.
    pub fn decode_traits(&mut self) -> Result<()> {
        for v in self.vertices.iter_mut().flatten() {
            v.data.from_trait_string(&v.traits)?;
        }
        for e in self.edges.iter_mut().flatten() {
            e.data.from_trait_string(&e.traits)?;
        }
        for f in self.faces.iter_mut().flatten() {
            f.data.from_trait_string(&f.traits)?;
        }
        for he in self.halfedges.iter_mut().flatten() {
            he.data.from_trait_string(&he.traits)?;
        }
        Ok(())
    }
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Vertex `i` gets user id `i + 1`, face `j` gets user id `j + 1`. The result
/// has already been through [`HalfEdgeMesh::label_boundary`].
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangle faces, each as [v0, v1, v2] indices
///
/// # Returns
/// A half-edge mesh, or an error if the input is invalid.
///
/// # Example
/// ```
/// use hemesh::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_edges(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex, A: Attributes>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I, A>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    // Validate vertex indices
    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        // Check for degenerate faces
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices
        .iter()
        .map(|&pos| mesh.add_vertex(pos))
        .collect::<Result<_>>()?;

    for (fi, face) in faces.iter().enumerate() {
        let corners = [
            vertex_ids[face[0]],
            vertex_ids[face[1]],
            vertex_ids[face[2]],
        ];
        mesh.create_face(&corners, fi + 1)?;
    }

    mesh.label_boundary();
    Ok(mesh)
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Live vertices are numbered densely in handle order. Returns a
/// (vertices, faces) tuple.
pub fn to_face_vertex<I: MeshIndex, A: Attributes>(
    mesh: &HalfEdgeMesh<I, A>,
) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut dense = vec![usize::MAX; mesh.vertices.len()];
    let mut vertices = Vec::with_capacity(mesh.num_vertices());
    for (v, vertex) in mesh.vertices() {
        dense[v.index()] = vertices.len();
        vertices.push(vertex.position);
    }

    let faces: Vec<[usize; 3]> = mesh
        .face_ids()
        .map(|f| {
            let [v0, v1, v2] = mesh.face_triangle(f);
            [dense[v0.index()], dense[v1.index()], dense[v2.index()]]
        })
        .collect();

    (vertices, faces)
}

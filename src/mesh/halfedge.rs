//! Half-edge mesh data structure.
//!
//! This module provides the half-edge representation of a manifold triangle
//! mesh. Every face is a cycle of half-edges; every undirected edge owns up to
//! two of them.
//!
//! # Structure
//!
//! - A **half-edge** points at its **target** vertex and knows its face, its
//!   `next`/`prev` in the face cycle and the edge it lies on
//! - An **edge** owns one half-edge (boundary) or two (interior); the other
//!   half-edge of an edge is the **dual**
//! - Each vertex stores one incoming half-edge, its **representative**. For a
//!   boundary vertex this is always the most counter-clockwise incoming
//!   half-edge, which has no dual
//! - Each face stores one half-edge of its cycle
//!
//! # Boundary Handling
//!
//! There are no boundary half-edges. A boundary edge simply has a single
//! half-edge, and rotating across it yields `None`.

use std::collections::HashMap;

use nalgebra::{Point2, Point3, Vector3};

use super::attributes::Attributes;
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32, D = ()> {
    pub(crate) id: usize,
    pub(crate) position: Point3<f64>,
    pub(crate) boundary: bool,
    /// An incoming half-edge (target is this vertex).
    pub(crate) halfedge: HalfEdgeId<I>,
    /// Edges whose lower-id endpoint is this vertex.
    pub(crate) edges: Vec<EdgeId<I>>,

    /// Vertex normal.
    pub normal: Vector3<f64>,
    /// Texture coordinates.
    pub uv: Point2<f64>,
    /// Free-form trait string, kept for file round-trips.
    pub traits: String,
    /// User payload.
    pub data: D,
}

impl<I: MeshIndex, D: Default> Vertex<I, D> {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            position: Point3::origin(),
            boundary: false,
            halfedge: HalfEdgeId::invalid(),
            edges: Vec::new(),
            normal: Vector3::zeros(),
            uv: Point2::origin(),
            traits: String::new(),
            data: D::default(),
        }
    }
}

impl<I: MeshIndex, D> Vertex<I, D> {
    /// The user-visible id of this vertex.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The position of this vertex.
    #[inline]
    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    /// Whether the vertex touches a boundary edge.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.boundary
    }

    /// The representative incoming half-edge, `None` for an isolated vertex.
    #[inline]
    pub fn halfedge(&self) -> Option<HalfEdgeId<I>> {
        self.halfedge.valid()
    }
}

/// An undirected edge.
#[derive(Debug, Clone)]
pub struct Edge<I: MeshIndex = u32, D = ()> {
    pub(crate) halfedges: [HalfEdgeId<I>; 2],
    /// Endpoints, `[source, target]` of slot 0 once a half-edge is attached.
    pub(crate) vertices: [VertexId<I>; 2],
    pub(crate) length: f64,

    /// Free-form trait string, kept for file round-trips.
    pub traits: String,
    /// User payload.
    pub data: D,
}

impl<I: MeshIndex, D: Default> Edge<I, D> {
    pub(crate) fn new(v0: VertexId<I>, v1: VertexId<I>) -> Self {
        Self {
            halfedges: [HalfEdgeId::invalid(); 2],
            vertices: [v0, v1],
            length: 0.0,
            traits: String::new(),
            data: D::default(),
        }
    }
}

impl<I: MeshIndex, D> Edge<I, D> {
    /// The half-edge in slot `i` (0 or 1).
    #[inline]
    pub fn halfedge(&self, i: usize) -> Option<HalfEdgeId<I>> {
        self.halfedges[i].valid()
    }

    /// The two endpoints. For an edge with half-edges these are the source
    /// and target of slot 0.
    #[inline]
    pub fn vertices(&self) -> [VertexId<I>; 2] {
        self.vertices
    }

    /// Whether the edge has fewer than two half-edges.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.halfedges[0].is_valid() || !self.halfedges[1].is_valid()
    }

    /// Cached length.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    pub(crate) fn other(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        if self.halfedges[0] == he {
            self.halfedges[1]
        } else {
            self.halfedges[0]
        }
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Face<I: MeshIndex = u32, D = ()> {
    pub(crate) id: usize,
    pub(crate) halfedge: HalfEdgeId<I>,

    /// Free-form trait string, kept for file round-trips.
    pub traits: String,
    /// User payload.
    pub data: D,
}

impl<I: MeshIndex, D: Default> Face<I, D> {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            halfedge: HalfEdgeId::invalid(),
            traits: String::new(),
            data: D::default(),
        }
    }
}

impl<I: MeshIndex, D> Face<I, D> {
    /// The user-visible id of this face.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The representative half-edge of this face.
    #[inline]
    pub fn halfedge(&self) -> HalfEdgeId<I> {
        self.halfedge
    }
}

/// A half-edge: one directed side of an edge, bound to one face.
#[derive(Debug, Clone)]
pub struct HalfEdge<I: MeshIndex = u32, D = ()> {
    pub(crate) vertex: VertexId<I>,
    pub(crate) face: FaceId<I>,
    pub(crate) next: HalfEdgeId<I>,
    pub(crate) prev: HalfEdgeId<I>,
    pub(crate) edge: EdgeId<I>,

    /// Free-form trait string, kept for file round-trips.
    pub traits: String,
    /// User payload.
    pub data: D,
}

impl<I: MeshIndex, D: Default> HalfEdge<I, D> {
    pub(crate) fn new() -> Self {
        Self {
            vertex: VertexId::invalid(),
            face: FaceId::invalid(),
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            edge: EdgeId::invalid(),
            traits: String::new(),
            data: D::default(),
        }
    }
}

impl<I: MeshIndex, D> HalfEdge<I, D> {
    /// Target vertex.
    #[inline]
    pub fn target(&self) -> VertexId<I> {
        self.vertex
    }

    /// Owning face.
    #[inline]
    pub fn face(&self) -> FaceId<I> {
        self.face
    }

    /// Next half-edge in the face cycle.
    #[inline]
    pub fn next(&self) -> HalfEdgeId<I> {
        self.next
    }

    /// Previous half-edge in the face cycle.
    #[inline]
    pub fn prev(&self) -> HalfEdgeId<I> {
        self.prev
    }

    /// Owning edge.
    #[inline]
    pub fn edge(&self) -> EdgeId<I> {
        self.edge
    }
}

pub(crate) type VertexOf<I, A> = Vertex<I, <A as Attributes>::Vertex>;
pub(crate) type EdgeOf<I, A> = Edge<I, <A as Attributes>::Edge>;
pub(crate) type FaceOf<I, A> = Face<I, <A as Attributes>::Face>;
pub(crate) type HalfEdgeOf<I, A> = HalfEdge<I, <A as Attributes>::HalfEdge>;

/// A half-edge mesh data structure for manifold triangle meshes.
///
/// Elements live in slot vectors addressed by typed handles. Deleting an
/// element leaves a tombstone; slots are never reused, so an old handle can
/// never silently refer to a newer element.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32, A: Attributes = ()> {
    pub(crate) vertices: Vec<Option<VertexOf<I, A>>>,
    pub(crate) edges: Vec<Option<EdgeOf<I, A>>>,
    pub(crate) faces: Vec<Option<FaceOf<I, A>>>,
    pub(crate) halfedges: Vec<Option<HalfEdgeOf<I, A>>>,

    pub(crate) num_vertices: usize,
    pub(crate) num_edges: usize,
    pub(crate) num_faces: usize,
    pub(crate) num_halfedges: usize,

    pub(crate) vertex_lookup: HashMap<usize, VertexId<I>>,
    pub(crate) face_lookup: HashMap<usize, FaceId<I>>,
    /// Smallest id that is larger than every vertex id seen so far.
    pub(crate) next_vertex_id: usize,
    /// Smallest id that is larger than every face id seen so far.
    pub(crate) next_face_id: usize,
}

impl<I: MeshIndex, A: Attributes> Default for HalfEdgeMesh<I, A> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! live {
    ($slots:expr, $id:expr) => {
        match $slots.get($id.index()).and_then(|slot| slot.as_ref()) {
            Some(element) => element,
            None => panic!("{:?} is not a live element", $id),
        }
    };
}

macro_rules! live_mut {
    ($slots:expr, $id:expr) => {
        match $slots.get_mut($id.index()).and_then(|slot| slot.as_mut()) {
            Some(element) => element,
            None => panic!("{:?} is not a live element", $id),
        }
    };
}

impl<I: MeshIndex, A: Attributes> HalfEdgeMesh<I, A> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            halfedges: Vec::new(),
            num_vertices: 0,
            num_edges: 0,
            num_faces: 0,
            num_halfedges: 0,
            vertex_lookup: HashMap::new(),
            face_lookup: HashMap::new(),
            next_vertex_id: 1,
            next_face_id: 1,
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // Closed triangle mesh: E = 3F/2, H = 3F. Boundaries add a few edges.
        let num_edges = num_faces * 3 / 2 + num_faces / 4;
        let mut mesh = Self::new();
        mesh.vertices.reserve(num_vertices);
        mesh.edges.reserve(num_edges);
        mesh.faces.reserve(num_faces);
        mesh.halfedges.reserve(num_faces * 3);
        mesh.vertex_lookup.reserve(num_vertices);
        mesh.face_lookup.reserve(num_faces);
        mesh
    }

    // ==================== Accessors ====================

    /// Number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Number of live edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.num_faces
    }

    /// Number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.num_halfedges
    }

    /// Whether `v` refers to a live vertex.
    #[inline]
    pub fn contains_vertex(&self, v: VertexId<I>) -> bool {
        matches!(self.vertices.get(v.index()), Some(Some(_)))
    }

    /// Whether `e` refers to a live edge.
    #[inline]
    pub fn contains_edge(&self, e: EdgeId<I>) -> bool {
        matches!(self.edges.get(e.index()), Some(Some(_)))
    }

    /// Whether `f` refers to a live face.
    #[inline]
    pub fn contains_face(&self, f: FaceId<I>) -> bool {
        matches!(self.faces.get(f.index()), Some(Some(_)))
    }

    /// Whether `he` refers to a live half-edge.
    #[inline]
    pub fn contains_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        matches!(self.halfedges.get(he.index()), Some(Some(_)))
    }

    /// Get a vertex by handle.
    ///
    /// # Panics
    /// Panics if the handle is not live.
    #[inline]
    pub fn vertex(&self, v: VertexId<I>) -> &VertexOf<I, A> {
        live!(self.vertices, v)
    }

    /// Get a mutable vertex by handle.
    #[inline]
    pub fn vertex_mut(&mut self, v: VertexId<I>) -> &mut VertexOf<I, A> {
        live_mut!(self.vertices, v)
    }

    /// Get an edge by handle.
    #[inline]
    pub fn edge(&self, e: EdgeId<I>) -> &EdgeOf<I, A> {
        live!(self.edges, e)
    }

    /// Get a mutable edge by handle.
    #[inline]
    pub fn edge_mut(&mut self, e: EdgeId<I>) -> &mut EdgeOf<I, A> {
        live_mut!(self.edges, e)
    }

    /// Get a face by handle.
    #[inline]
    pub fn face(&self, f: FaceId<I>) -> &FaceOf<I, A> {
        live!(self.faces, f)
    }

    /// Get a mutable face by handle.
    #[inline]
    pub fn face_mut(&mut self, f: FaceId<I>) -> &mut FaceOf<I, A> {
        live_mut!(self.faces, f)
    }

    /// Get a half-edge by handle.
    #[inline]
    pub fn halfedge(&self, he: HalfEdgeId<I>) -> &HalfEdgeOf<I, A> {
        live!(self.halfedges, he)
    }

    /// Get a mutable half-edge by handle.
    #[inline]
    pub fn halfedge_mut(&mut self, he: HalfEdgeId<I>) -> &mut HalfEdgeOf<I, A> {
        live_mut!(self.halfedges, he)
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex and refresh the cached lengths of its edges.
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
        let edges: Vec<EdgeId<I>> = self.vertex_edges(v).collect();
        for e in edges {
            self.update_edge_length(e);
        }
    }

    /// The user-visible id of a vertex.
    #[inline]
    pub fn vertex_id(&self, v: VertexId<I>) -> usize {
        self.vertex(v).id
    }

    /// The user-visible id of a face.
    #[inline]
    pub fn face_id(&self, f: FaceId<I>) -> usize {
        self.face(f).id
    }

    /// Find a vertex by its user-visible id.
    #[inline]
    pub fn vertex_with_id(&self, id: usize) -> Option<VertexId<I>> {
        self.vertex_lookup.get(&id).copied()
    }

    /// Find a face by its user-visible id.
    #[inline]
    pub fn face_with_id(&self, id: usize) -> Option<FaceId<I>> {
        self.face_lookup.get(&id).copied()
    }

    // ==================== Topology Queries ====================

    /// Target vertex of a half-edge.
    #[inline]
    pub fn target(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).vertex
    }

    /// Source vertex of a half-edge (the target of its predecessor).
    #[inline]
    pub fn source(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.target(self.prev(he))
    }

    /// Next half-edge in the face cycle.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Previous half-edge in the face cycle.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Face owning a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// Edge owning a half-edge.
    #[inline]
    pub fn edge_of(&self, he: HalfEdgeId<I>) -> EdgeId<I> {
        self.halfedge(he).edge
    }

    /// The other half-edge on the same edge, `None` on the boundary.
    #[inline]
    pub fn dual(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.edge(self.edge_of(he)).other(he).valid()
    }

    /// Whether a half-edge lies on a boundary edge.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.dual(he).is_none()
    }

    /// Whether an edge has fewer than two half-edges.
    #[inline]
    pub fn is_boundary_edge(&self, e: EdgeId<I>) -> bool {
        self.edge(e).is_boundary()
    }

    /// Whether a vertex is labeled as a boundary vertex.
    #[inline]
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        self.vertex(v).boundary
    }

    /// The endpoints of an edge, `[source, target]` of its slot-0 half-edge.
    #[inline]
    pub fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        self.edge(e).vertices
    }

    // ==================== Rotation ====================

    /// Rotate counter-clockwise about the target vertex.
    ///
    /// `None` if `he` is the most counter-clockwise incoming half-edge of a
    /// boundary vertex.
    #[inline]
    pub fn ccw_rotate_about_target(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.dual(he).map(|d| self.prev(d))
    }

    /// Rotate clockwise about the target vertex.
    #[inline]
    pub fn clw_rotate_about_target(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.dual(self.next(he))
    }

    /// Rotate counter-clockwise about the source vertex.
    #[inline]
    pub fn ccw_rotate_about_source(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.dual(self.prev(he))
    }

    /// Rotate clockwise about the source vertex.
    #[inline]
    pub fn clw_rotate_about_source(&self, he: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        self.dual(he).map(|d| self.next(d))
    }

    /// Apply `step` until it hits the boundary or comes back to `start`.
    pub(crate) fn rotate_to_end(
        &self,
        start: HalfEdgeId<I>,
        step: fn(&Self, HalfEdgeId<I>) -> Option<HalfEdgeId<I>>,
    ) -> HalfEdgeId<I> {
        let mut he = start;
        while let Some(next) = step(self, he) {
            if next == start {
                break;
            }
            he = next;
        }
        he
    }

    /// The most counter-clockwise incoming half-edge of a vertex.
    ///
    /// For an interior vertex every incoming half-edge qualifies and the
    /// representative is returned directly.
    pub fn most_ccw_in_halfedge(&self, v: VertexId<I>) -> Option<HalfEdgeId<I>> {
        let vertex = self.vertex(v);
        let rep = vertex.halfedge.valid()?;
        if !vertex.boundary {
            return Some(rep);
        }
        Some(self.rotate_to_end(rep, Self::ccw_rotate_about_target))
    }

    /// The most clockwise incoming half-edge of a vertex.
    pub fn most_clw_in_halfedge(&self, v: VertexId<I>) -> Option<HalfEdgeId<I>> {
        let vertex = self.vertex(v);
        let rep = vertex.halfedge.valid()?;
        if !vertex.boundary {
            return self.ccw_rotate_about_target(rep);
        }
        Some(self.rotate_to_end(rep, Self::clw_rotate_about_target))
    }

    /// The most counter-clockwise outgoing half-edge of a vertex.
    pub fn most_ccw_out_halfedge(&self, v: VertexId<I>) -> Option<HalfEdgeId<I>> {
        let vertex = self.vertex(v);
        let rep = vertex.halfedge.valid()?;
        if !vertex.boundary {
            return self.dual(rep);
        }
        Some(self.rotate_to_end(self.next(rep), Self::ccw_rotate_about_source))
    }

    /// The most clockwise outgoing half-edge of a vertex.
    pub fn most_clw_out_halfedge(&self, v: VertexId<I>) -> Option<HalfEdgeId<I>> {
        let vertex = self.vertex(v);
        let rep = vertex.halfedge.valid()?;
        if !vertex.boundary {
            return self
                .most_ccw_out_halfedge(v)
                .and_then(|he| self.ccw_rotate_about_source(he));
        }
        Some(self.rotate_to_end(self.next(rep), Self::clw_rotate_about_source))
    }

    // ==================== Iteration ====================

    /// Iterate over all live vertex handles.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over all live vertices with their handles.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId<I>, &VertexOf<I, A>)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (VertexId::new(i), v)))
    }

    /// Iterate over all live edge handles.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| EdgeId::new(i))
    }

    /// Iterate over all live edges with their handles.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId<I>, &EdgeOf<I, A>)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (EdgeId::new(i), e)))
    }

    /// Iterate over all live face handles.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over all live faces with their handles.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId<I>, &FaceOf<I, A>)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|f| (FaceId::new(i), f)))
    }

    /// Iterate over all live half-edge handles.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| HalfEdgeId::new(i))
    }

    /// Iterate over all live half-edges with their handles.
    pub fn halfedges(&self) -> impl Iterator<Item = (HalfEdgeId<I>, &HalfEdgeOf<I, A>)> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|he| (HalfEdgeId::new(i), he)))
    }

    /// Incoming half-edges of a vertex, starting at the most counter-clockwise
    /// one and rotating clockwise.
    pub fn vertex_in_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I, A> {
        VertexHalfEdgeIter::new(
            self,
            self.most_ccw_in_halfedge(v),
            Self::clw_rotate_about_target,
        )
    }

    /// Outgoing half-edges of a vertex, starting at the most clockwise one and
    /// rotating counter-clockwise.
    pub fn vertex_out_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I, A> {
        VertexHalfEdgeIter::new(
            self,
            self.most_clw_out_halfedge(v),
            Self::ccw_rotate_about_source,
        )
    }

    /// The incoming boundary half-edge of a boundary vertex; its edge has no
    /// outgoing half-edge at `v`.
    fn trailing_in_halfedge(&self, v: VertexId<I>) -> Option<HalfEdgeId<I>> {
        if self.vertex(v).boundary {
            self.most_ccw_in_halfedge(v)
        } else {
            None
        }
    }

    /// Vertices adjacent to a vertex, counter-clockwise.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_out_halfedges(v)
            .map(move |he| self.target(he))
            .chain(self.trailing_in_halfedge(v).map(|he| self.source(he)))
    }

    /// Edges incident to a vertex, counter-clockwise.
    pub fn vertex_edges(&self, v: VertexId<I>) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.vertex_out_halfedges(v)
            .map(move |he| self.edge_of(he))
            .chain(self.trailing_in_halfedge(v).map(|he| self.edge_of(he)))
    }

    /// Faces incident to a vertex, counter-clockwise.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_out_halfedges(v).map(move |he| self.face_of(he))
    }

    /// Number of edges incident to a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_edges(v).count()
    }

    /// Half-edges of a face, starting at its representative.
    pub fn face_halfedges(&self, f: FaceId<I>) -> FaceHalfEdgeIter<'_, I, A> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Vertices of a face (the targets of its half-edges).
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(move |he| self.target(he))
    }

    /// Edges of a face.
    pub fn face_edges(&self, f: FaceId<I>) -> impl Iterator<Item = EdgeId<I>> + '_ {
        self.face_halfedges(f).map(move |he| self.edge_of(he))
    }

    /// Number of corners of a face.
    pub fn face_degree(&self, f: FaceId<I>) -> usize {
        self.face_halfedges(f).count()
    }

    /// The three half-edges of a triangular face, starting at its representative.
    pub fn face_halfedge_triple(&self, f: FaceId<I>) -> [HalfEdgeId<I>; 3] {
        let h0 = self.face(f).halfedge;
        let h1 = self.next(h0);
        let h2 = self.next(h1);
        [h0, h1, h2]
    }

    /// The three vertices of a triangular face.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let [h0, h1, h2] = self.face_halfedge_triple(f);
        [self.target(h0), self.target(h1), self.target(h2)]
    }

    // ==================== Geometry ====================

    /// Cached length of an edge.
    #[inline]
    pub fn edge_length(&self, e: EdgeId<I>) -> f64 {
        self.edge(e).length
    }

    /// Distance between the endpoints of an edge, computed from positions.
    pub fn compute_edge_length(&self, e: EdgeId<I>) -> f64 {
        let [v0, v1] = self.edge(e).vertices;
        (self.position(v1) - self.position(v0)).norm()
    }

    pub(crate) fn update_edge_length(&mut self, e: EdgeId<I>) {
        let length = self.compute_edge_length(e);
        self.edge_mut(e).length = length;
    }

    /// Recompute every cached edge length from the vertex positions.
    pub fn refresh_edge_lengths(&mut self) {
        let edges: Vec<EdgeId<I>> = self.edge_ids().collect();
        for e in edges {
            self.update_edge_length(e);
        }
    }

    /// The vector from the source to the target of a half-edge.
    pub fn halfedge_vector(&self, he: HalfEdgeId<I>) -> Vector3<f64> {
        self.position(self.target(he)) - self.position(self.source(he))
    }

    /// The midpoint of an edge.
    pub fn edge_midpoint(&self, e: EdgeId<I>) -> Point3<f64> {
        let [v0, v1] = self.edge(e).vertices;
        Point3::from((self.position(v0).coords + self.position(v1).coords) * 0.5)
    }

    /// The centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let mut sum = Vector3::zeros();
        let mut n = 0usize;
        for v in self.face_vertices(f) {
            sum += self.position(v).coords;
            n += 1;
        }
        Point3::from(sum / n.max(1) as f64)
    }

    /// The unit normal of a triangular face.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [v0, v1, v2] = self.face_triangle(f);
        let e1 = self.position(v1) - self.position(v0);
        let e2 = self.position(v2) - self.position(v0);
        e1.cross(&e2).normalize()
    }

    /// The area of a triangular face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [v0, v1, v2] = self.face_triangle(f);
        let e1 = self.position(v1) - self.position(v0);
        let e2 = self.position(v2) - self.position(v0);
        0.5 * e1.cross(&e2).norm()
    }

    /// The total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // ==================== Validation ====================

    /// Check every connectivity invariant, reporting the first violation.
    ///
    /// Boundary flags and representatives are only guaranteed after
    /// [`label_boundary`](Self::label_boundary) has run once.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(MeshError::InvalidState(msg));

        for (fid, f) in self.faces() {
            let start = f.halfedge;
            if !self.contains_halfedge(start) {
                return fail(format!("{:?} has no live half-edge", fid));
            }
            let mut he = start;
            let mut corners = 0;
            loop {
                if !self.contains_halfedge(he) || self.face_of(he) != fid {
                    return fail(format!("{:?} in the cycle of {:?} points elsewhere", he, fid));
                }
                corners += 1;
                if corners > self.num_halfedges {
                    return fail(format!("cycle of {:?} does not close", fid));
                }
                he = self.next(he);
                if he == start {
                    break;
                }
            }
            if corners < 3 {
                return fail(format!("{:?} has only {} corners", fid, corners));
            }
        }

        for (hid, he) in self.halfedges() {
            if !self.contains_halfedge(he.next) || !self.contains_halfedge(he.prev) {
                return fail(format!("{:?} links to a dead half-edge", hid));
            }
            if !self.contains_edge(he.edge) {
                return fail(format!("{:?} lies on a dead edge", hid));
            }
            if self.prev(he.next) != hid || self.next(he.prev) != hid {
                return fail(format!("next/prev of {:?} are inconsistent", hid));
            }
            if !self.contains_face(he.face) || !self.contains_vertex(he.vertex) {
                return fail(format!("{:?} refers to a dead face or vertex", hid));
            }
            let edge = self.edge(he.edge);
            if !edge.halfedges.contains(&hid) {
                return fail(format!("{:?} is not attached to its edge", hid));
            }
            if let Some(dual) = self.dual(hid) {
                if self.target(dual) != self.source(hid) || self.source(dual) != self.target(hid) {
                    return fail(format!("{:?} and its dual are not reversed", hid));
                }
            }
        }

        for (eid, e) in self.edges() {
            let [h0, h1] = e.halfedges;
            if !h0.is_valid() && h1.is_valid() {
                return fail(format!("{:?} has an empty slot 0", eid));
            }
            if [h0, h1].iter().any(|&he| he.is_valid() && !self.contains_halfedge(he)) {
                return fail(format!("{:?} holds a dead half-edge", eid));
            }
            if h0.is_valid() {
                if self.edge_of(h0) != eid {
                    return fail(format!("slot 0 of {:?} belongs to another edge", eid));
                }
                let (s, t) = (self.source(h0), self.target(h0));
                if e.vertices != [s, t] {
                    return fail(format!("endpoints of {:?} are stale", eid));
                }
                if h1.is_valid() && self.vertex_id(s) >= self.vertex_id(t) {
                    return fail(format!("{:?} is not canonically oriented", eid));
                }
            }
            if h1.is_valid() && self.edge_of(h1) != eid {
                return fail(format!("slot 1 of {:?} belongs to another edge", eid));
            }
            let [v0, v1] = e.vertices;
            if self.edge_between(v0, v1) != Some(eid) {
                return fail(format!("{:?} is not reachable through vertex lookup", eid));
            }
        }

        let mut incoming = vec![0usize; self.vertices.len()];
        for (_, he) in self.halfedges() {
            incoming[he.vertex.index()] += 1;
        }

        for (vid, v) in self.vertices() {
            if self.vertex_lookup.get(&v.id) != Some(&vid) {
                return fail(format!("{:?} is missing from the id lookup", vid));
            }
            let Some(rep) = v.halfedge.valid() else {
                if incoming[vid.index()] > 0 {
                    return fail(format!("{:?} has half-edges but no representative", vid));
                }
                continue;
            };
            if !self.contains_halfedge(rep) || self.target(rep) != vid {
                return fail(format!("representative of {:?} does not target it", vid));
            }
            let touches_boundary = self
                .vertex_out_halfedges(vid)
                .chain(self.vertex_in_halfedges(vid))
                .any(|he| self.is_boundary_halfedge(he));
            if touches_boundary != v.boundary {
                return fail(format!("boundary flag of {:?} is stale", vid));
            }
            if v.boundary && !self.is_boundary_halfedge(rep) {
                return fail(format!("representative of boundary {:?} has a dual", vid));
            }
            // Every incoming half-edge must lie in the one fan around the vertex.
            let fan = self.vertex_in_halfedges(vid).count();
            if fan != incoming[vid.index()] {
                return fail(format!(
                    "{:?} is not manifold: its fan holds {} of {} incoming half-edges",
                    vid,
                    fan,
                    incoming[vid.index()]
                ));
            }
        }

        Ok(())
    }

    /// Check if the mesh is valid (all connectivity is consistent).
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Iterator over the half-edges around a vertex, driven by one rotation.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32, A: Attributes = ()> {
    mesh: &'a HalfEdgeMesh<I, A>,
    start: Option<HalfEdgeId<I>>,
    current: Option<HalfEdgeId<I>>,
    step: fn(&HalfEdgeMesh<I, A>, HalfEdgeId<I>) -> Option<HalfEdgeId<I>>,
    remaining: usize,
}

impl<'a, I: MeshIndex, A: Attributes> VertexHalfEdgeIter<'a, I, A> {
    fn new(
        mesh: &'a HalfEdgeMesh<I, A>,
        start: Option<HalfEdgeId<I>>,
        step: fn(&HalfEdgeMesh<I, A>, HalfEdgeId<I>) -> Option<HalfEdgeId<I>>,
    ) -> Self {
        Self {
            mesh,
            start,
            current: start,
            step,
            remaining: mesh.num_halfedges,
        }
    }
}

impl<'a, I: MeshIndex, A: Attributes> Iterator for VertexHalfEdgeIter<'a, I, A> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;
        // Bounded walk: a corrupted fan must not spin forever.
        self.remaining = self.remaining.checked_sub(1)?;
        self.current = (self.step)(self.mesh, result).filter(|&he| Some(he) != self.start);
        Some(result)
    }
}

/// Iterator over the half-edges of a face.
pub struct FaceHalfEdgeIter<'a, I: MeshIndex = u32, A: Attributes = ()> {
    mesh: &'a HalfEdgeMesh<I, A>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex, A: Attributes> FaceHalfEdgeIter<'a, I, A> {
    fn new(mesh: &'a HalfEdgeMesh<I, A>, f: FaceId<I>) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex, A: Attributes> Iterator for FaceHalfEdgeIter<'a, I, A> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures;

    #[test]
    fn test_empty_mesh() {
        let mesh = HalfEdgeMesh::<u32>::new();
        assert_eq!(mesh.num_vertices(), 0);
        assert_eq!(mesh.num_edges(), 0);
        assert_eq!(mesh.num_halfedges(), 0);
        assert_eq!(mesh.num_faces(), 0);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_rotations_on_quad() {
        // 4 -- 3      faces: (1, 2, 3) and (1, 3, 4)
        // |  / |
        // 1 -- 2
        let mesh = fixtures::quad();
        let v1 = mesh.vertex_with_id(1).unwrap();
        let v3 = mesh.vertex_with_id(3).unwrap();
        let diag = mesh.halfedge_between(v1, v3).unwrap();

        assert_eq!(mesh.source(diag), v1);
        assert_eq!(mesh.target(diag), v3);
        let dual = mesh.dual(diag).unwrap();
        assert_eq!(mesh.source(dual), v3);
        assert_eq!(mesh.target(dual), v1);

        // Rotating about the target keeps the target.
        for he in [
            mesh.ccw_rotate_about_target(diag),
            mesh.clw_rotate_about_target(diag),
        ]
        .into_iter()
        .flatten()
        {
            assert_eq!(mesh.target(he), v3);
        }
        // Rotating about the source keeps the source.
        for he in [
            mesh.ccw_rotate_about_source(diag),
            mesh.clw_rotate_about_source(diag),
        ]
        .into_iter()
        .flatten()
        {
            assert_eq!(mesh.source(he), v1);
        }
    }

    #[test]
    fn test_rotation_stops_at_boundary() {
        let mesh = fixtures::quad();
        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
            let in_he = mesh.most_ccw_in_halfedge(v).unwrap();
            assert!(mesh.ccw_rotate_about_target(in_he).is_none());
            let out_he = mesh.most_clw_out_halfedge(v).unwrap();
            assert!(mesh.clw_rotate_about_source(out_he).is_none());
            let out_he = mesh.most_ccw_out_halfedge(v).unwrap();
            assert!(mesh.ccw_rotate_about_source(out_he).is_none());
            let in_he = mesh.most_clw_in_halfedge(v).unwrap();
            assert!(mesh.clw_rotate_about_target(in_he).is_none());
        }
    }

    #[test]
    fn test_interior_vertex_star() {
        // Center of a 2x2 grid has six neighbours and six faces.
        let mesh = fixtures::grid(2);
        let center = mesh.vertex_with_id(5).unwrap();
        assert!(!mesh.is_boundary_vertex(center));
        assert_eq!(mesh.valence(center), 6);
        assert_eq!(mesh.vertex_faces(center).count(), 6);
        assert_eq!(mesh.vertex_in_halfedges(center).count(), 6);

        let mut neighbors: Vec<usize> = mesh
            .vertex_neighbors(center)
            .map(|v| mesh.vertex_id(v))
            .collect();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![1, 2, 4, 6, 8, 9]);
    }

    #[test]
    fn test_boundary_vertex_star() {
        // Corner 1 of the quad touches both faces.
        let mesh = fixtures::quad();
        let v1 = mesh.vertex_with_id(1).unwrap();
        assert_eq!(mesh.vertex_faces(v1).count(), 2);
        assert_eq!(mesh.valence(v1), 3);

        let mut neighbors: Vec<usize> = mesh
            .vertex_neighbors(v1)
            .map(|v| mesh.vertex_id(v))
            .collect();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![2, 3, 4]);

        let v2 = mesh.vertex_with_id(2).unwrap();
        assert_eq!(mesh.valence(v2), 2);
        assert_eq!(mesh.vertex_faces(v2).count(), 1);
    }

    #[test]
    fn test_face_queries() {
        let mesh = fixtures::quad();
        let f = mesh.face_with_id(1).unwrap();
        assert_eq!(mesh.face_degree(f), 3);
        assert_eq!(mesh.face_edges(f).count(), 3);

        let mut ids: Vec<usize> = mesh.face_vertices(f).map(|v| mesh.vertex_id(v)).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);

        assert!((mesh.face_area(f) - 0.5).abs() < 1e-12);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
        assert!((mesh.face_normal(f).z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_edge_lengths_follow_positions() {
        let mut mesh = fixtures::quad();
        let v1 = mesh.vertex_with_id(1).unwrap();
        let v2 = mesh.vertex_with_id(2).unwrap();
        let e = mesh.edge_between(v1, v2).unwrap();
        assert!((mesh.edge_length(e) - 1.0).abs() < 1e-12);

        mesh.set_position(v2, Point3::new(3.0, 0.0, 0.0));
        assert!((mesh.edge_length(e) - 3.0).abs() < 1e-12);
        assert!((mesh.compute_edge_length(e) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_catches_broken_cycle() {
        let mut mesh = fixtures::quad();
        let f = mesh.face_ids().next().unwrap();
        let he = mesh.face(f).halfedge();
        let next = mesh.next(he);
        mesh.halfedge_mut(he).next = he;
        assert!(!mesh.is_valid());
        mesh.halfedge_mut(he).next = next;
        assert!(mesh.is_valid());
    }

    #[test]
    #[should_panic]
    fn test_stale_handle_panics() {
        let mesh = fixtures::quad();
        let _ = mesh.vertex(VertexId::new(99));
    }
}

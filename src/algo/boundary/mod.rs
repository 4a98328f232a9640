//! Boundary loop tracing.
//!
//! A boundary edge has a single half-edge. Chaining those half-edges target to
//! source yields closed loops, one per hole (or outer rim) of the surface.
//! [`Boundary`] collects every loop of a mesh, longest first. A loop can be cut
//! into [`LoopSegment`]s at marker vertices, and written to or read from a
//! plain text file with one `source target` vertex id pair per line.
//!
//! # Example
//!
//! ```
//! use hemesh::prelude::*;
//! use hemesh::algo::boundary::Boundary;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let boundary = Boundary::new(&mesh).unwrap();
//! assert_eq!(boundary.len(), 1);
//! assert_eq!(boundary.loops()[0].len(), 4);
//! assert!((boundary.loops()[0].length() - 4.0).abs() < 1e-12);
//! ```

mod quad;

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub use quad::QuadrilateralBoundary;

use crate::error::{MeshError, Result};
use crate::mesh::{Attributes, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// A contiguous run of boundary half-edges between two markers.
#[derive(Debug, Clone)]
pub struct LoopSegment<I: MeshIndex = u32> {
    halfedges: Vec<HalfEdgeId<I>>,
    start: VertexId<I>,
    end: VertexId<I>,
    length: f64,
}

impl<I: MeshIndex> LoopSegment<I> {
    fn new<A: Attributes>(mesh: &HalfEdgeMesh<I, A>, halfedges: Vec<HalfEdgeId<I>>) -> Self {
        let start = halfedges
            .first()
            .map_or_else(VertexId::invalid, |&he| mesh.source(he));
        let end = halfedges
            .last()
            .map_or_else(VertexId::invalid, |&he| mesh.target(he));
        let length = chain_length(mesh, &halfedges);
        Self {
            halfedges,
            start,
            end,
            length,
        }
    }

    /// The half-edges of this segment, in loop order.
    #[inline]
    pub fn halfedges(&self) -> &[HalfEdgeId<I>] {
        &self.halfedges
    }

    /// The marker this segment starts at.
    #[inline]
    pub fn start(&self) -> VertexId<I> {
        self.start
    }

    /// The marker this segment ends at.
    #[inline]
    pub fn end(&self) -> VertexId<I> {
        self.end
    }

    /// Sum of the edge lengths.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Number of half-edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.halfedges.len()
    }

    /// Whether the segment has no half-edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.halfedges.is_empty()
    }
}

/// A closed loop of boundary half-edges.
///
/// Consecutive half-edges chain target to source, and the last one ends where
/// the first one starts.
#[derive(Debug, Clone)]
pub struct BoundaryLoop<I: MeshIndex = u32> {
    halfedges: Vec<HalfEdgeId<I>>,
    length: f64,
    segments: Vec<LoopSegment<I>>,
}

fn chain_length<I: MeshIndex, A: Attributes>(
    mesh: &HalfEdgeMesh<I, A>,
    halfedges: &[HalfEdgeId<I>],
) -> f64 {
    halfedges
        .iter()
        .map(|&he| mesh.edge_length(mesh.edge_of(he)))
        .sum()
}

impl<I: MeshIndex> BoundaryLoop<I> {
    fn from_halfedges<A: Attributes>(
        mesh: &HalfEdgeMesh<I, A>,
        halfedges: Vec<HalfEdgeId<I>>,
    ) -> Self {
        let length = chain_length(mesh, &halfedges);
        Self {
            halfedges,
            length,
            segments: Vec::new(),
        }
    }

    /// Walk the loop through `start`, which must be a boundary half-edge.
    ///
    /// From each half-edge the walk continues with the most clockwise outgoing
    /// half-edge of its target, which is the boundary half-edge leaving it.
    fn trace<A: Attributes>(
        mesh: &HalfEdgeMesh<I, A>,
        start: HalfEdgeId<I>,
        pending: &mut BTreeSet<HalfEdgeId<I>>,
    ) -> Result<Self> {
        let mut halfedges = vec![start];
        let mut he = start;

        loop {
            let v = mesh.target(he);
            let next = mesh
                .most_clw_out_halfedge(v)
                .filter(|&next| mesh.is_boundary_halfedge(next))
                .ok_or_else(|| {
                    MeshError::InvalidState(format!(
                        "vertex {} has no outgoing boundary half-edge; run label_boundary first",
                        mesh.vertex_id(v)
                    ))
                })?;
            if next == start {
                break;
            }
            if !pending.remove(&next) || halfedges.len() > mesh.num_halfedges() {
                return Err(MeshError::InvalidState(format!(
                    "boundary through vertex {} does not close; the vertex is not manifold",
                    mesh.vertex_id(v)
                )));
            }
            halfedges.push(next);
            he = next;
        }

        Ok(Self::from_halfedges(mesh, halfedges))
    }

    /// The half-edges of the loop, in order.
    #[inline]
    pub fn halfedges(&self) -> &[HalfEdgeId<I>] {
        &self.halfedges
    }

    /// Total length of the loop.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Segments produced by the last successful [`divide`](Self::divide).
    #[inline]
    pub fn segments(&self) -> &[LoopSegment<I>] {
        &self.segments
    }

    /// Number of half-edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.halfedges.len()
    }

    /// Whether the loop has no half-edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.halfedges.is_empty()
    }

    /// The vertices of the loop in order: the source of every half-edge.
    pub fn vertices<A: Attributes>(&self, mesh: &HalfEdgeMesh<I, A>) -> Vec<VertexId<I>> {
        self.halfedges.iter().map(|&he| mesh.source(he)).collect()
    }

    /// Cut the loop into one segment per marker.
    ///
    /// The loop is first rotated to start at `markers[0]`. Segment `i` then
    /// runs from `markers[i]` to `markers[(i + 1) % n]`, so the markers must
    /// appear in loop order. On failure the loop and its segments are left
    /// unchanged.
    pub fn divide<A: Attributes>(
        &mut self,
        mesh: &HalfEdgeMesh<I, A>,
        markers: &[VertexId<I>],
    ) -> Result<()> {
        let Some(&first) = markers.first() else {
            return Err(MeshError::invalid_param(
                "markers",
                0,
                "at least one marker is required",
            ));
        };
        let not_found = |v: VertexId<I>| {
            let vertex = mesh.vertex_id(v);
            log::warn!("marker vertex {} not found on the boundary loop", vertex);
            MeshError::MarkerNotFound { vertex }
        };

        let offset = self
            .halfedges
            .iter()
            .position(|&he| mesh.source(he) == first)
            .ok_or_else(|| not_found(first))?;
        let mut halfedges = self.halfedges.clone();
        halfedges.rotate_left(offset);

        let mut runs: Vec<Vec<HalfEdgeId<I>>> = vec![Vec::new()];
        let mut k = 1;
        for &he in &halfedges {
            if k < markers.len() && mesh.source(he) == markers[k] {
                runs.push(Vec::new());
                k += 1;
            }
            if let Some(run) = runs.last_mut() {
                run.push(he);
            }
        }
        if k < markers.len() {
            return Err(not_found(markers[k]));
        }

        self.segments = runs
            .into_iter()
            .map(|run| LoopSegment::new(mesh, run))
            .collect();
        self.halfedges = halfedges;
        log::debug!(
            "divided boundary loop of {} half-edges into {} segments",
            self.halfedges.len(),
            self.segments.len()
        );
        Ok(())
    }

    /// Write the loop as one `source target` vertex id pair per line.
    pub fn write_to<A: Attributes, W: Write>(
        &self,
        mesh: &HalfEdgeMesh<I, A>,
        mut writer: W,
    ) -> Result<()> {
        for &he in &self.halfedges {
            writeln!(
                writer,
                "{} {}",
                mesh.vertex_id(mesh.source(he)),
                mesh.vertex_id(mesh.target(he))
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Save the loop to a file.
    pub fn save<A: Attributes, P: AsRef<Path>>(
        &self,
        mesh: &HalfEdgeMesh<I, A>,
        path: P,
    ) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_to(mesh, BufWriter::new(file))
    }

    /// Read a loop written by [`write_to`](Self::write_to).
    ///
    /// Every pair is resolved to the half-edge between the two vertices; the
    /// half-edges must chain into a closed loop.
    pub fn read_from<A: Attributes, R: BufRead>(
        mesh: &HalfEdgeMesh<I, A>,
        reader: R,
    ) -> Result<Self> {
        let mut halfedges = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let he = parse_pair(mesh, line)
                .map_err(|msg| MeshError::InvalidState(format!("line {}: {}", i + 1, msg)))?;
            halfedges.push(he);
        }

        if halfedges.is_empty() {
            return Err(MeshError::InvalidState("boundary loop is empty".to_string()));
        }
        for (i, &he) in halfedges.iter().enumerate() {
            let next = halfedges[(i + 1) % halfedges.len()];
            if mesh.target(he) != mesh.source(next) {
                return Err(MeshError::InvalidState(format!(
                    "half-edges {} and {} do not chain",
                    i + 1,
                    (i + 1) % halfedges.len() + 1
                )));
            }
        }

        Ok(Self::from_halfedges(mesh, halfedges))
    }

    /// Load a loop from a file.
    pub fn load<A: Attributes, P: AsRef<Path>>(mesh: &HalfEdgeMesh<I, A>, path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::read_from(mesh, BufReader::new(file)).map_err(|err| match err {
            MeshError::InvalidState(message) => MeshError::LoadError {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }
}

fn parse_pair<I: MeshIndex, A: Attributes>(
    mesh: &HalfEdgeMesh<I, A>,
    line: &str,
) -> std::result::Result<HalfEdgeId<I>, String> {
    let mut ids = line.split_whitespace().map(|tok| {
        tok.parse::<usize>()
            .map_err(|_| format!("'{}' is not a vertex id", tok))
    });
    let (Some(source), Some(target), None) = (ids.next(), ids.next(), ids.next()) else {
        return Err(format!("expected two vertex ids, got '{}'", line));
    };
    let (source, target) = (source?, target?);
    let lookup = |id: usize| {
        mesh.vertex_with_id(id)
            .ok_or_else(|| format!("no vertex with id {}", id))
    };
    mesh.halfedge_between(lookup(source)?, lookup(target)?)
        .ok_or_else(|| format!("no half-edge from {} to {}", source, target))
}

/// All boundary loops of a mesh, longest first.
#[derive(Debug, Clone)]
pub struct Boundary<I: MeshIndex = u32> {
    loops: Vec<BoundaryLoop<I>>,
}

impl<I: MeshIndex> Boundary<I> {
    /// Trace every boundary loop of a mesh.
    ///
    /// The mesh must have been through
    /// [`label_boundary`](HalfEdgeMesh::label_boundary) (or only edited by the
    /// kernel operators since). A closed mesh has no loops.
    pub fn new<A: Attributes>(mesh: &HalfEdgeMesh<I, A>) -> Result<Self> {
        let mut pending: BTreeSet<HalfEdgeId<I>> = mesh
            .edges()
            .filter(|(_, e)| e.is_boundary())
            .filter_map(|(_, e)| e.halfedge(0))
            .collect();

        let mut loops = Vec::new();
        while let Some(start) = pending.pop_first() {
            loops.push(BoundaryLoop::trace(mesh, start, &mut pending)?);
        }
        loops.sort_by(|a, b| b.length.total_cmp(&a.length));

        log::debug!(
            "traced {} boundary loops ({} half-edges)",
            loops.len(),
            loops.iter().map(BoundaryLoop::len).sum::<usize>()
        );
        Ok(Self { loops })
    }

    /// The loops, longest first.
    #[inline]
    pub fn loops(&self) -> &[BoundaryLoop<I>] {
        &self.loops
    }

    /// Mutable access to the loops, e.g. to [`divide`](BoundaryLoop::divide) them.
    #[inline]
    pub fn loops_mut(&mut self) -> &mut [BoundaryLoop<I>] {
        &mut self.loops
    }

    /// Take ownership of the loops.
    pub fn into_loops(self) -> Vec<BoundaryLoop<I>> {
        self.loops
    }

    /// Number of loops.
    #[inline]
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Whether the mesh is closed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{fixtures, EdgeId};

    fn assert_closed(mesh: &HalfEdgeMesh, l: &BoundaryLoop) {
        let hes = l.halfedges();
        for (i, &he) in hes.iter().enumerate() {
            assert!(mesh.is_boundary_halfedge(he));
            let next = hes[(i + 1) % hes.len()];
            assert_eq!(mesh.target(he), mesh.source(next));
        }
    }

    fn id(mesh: &HalfEdgeMesh, id: usize) -> VertexId {
        mesh.vertex_with_id(id).unwrap()
    }

    #[test]
    fn test_closed_mesh_has_no_loops() {
        let mesh = fixtures::tetrahedron();
        let boundary = Boundary::new(&mesh).unwrap();
        assert!(boundary.is_empty());
    }

    #[test]
    fn test_single_loop() {
        let mesh = fixtures::grid(2);
        let boundary = Boundary::new(&mesh).unwrap();
        assert_eq!(boundary.len(), 1);

        let l = &boundary.loops()[0];
        assert_eq!(l.len(), 8);
        assert!((l.length() - 8.0).abs() < 1e-12);
        assert_closed(&mesh, l);

        let mut ids: Vec<usize> = l.vertices(&mesh).iter().map(|&v| mesh.vertex_id(v)).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 6, 7, 8, 9]);
    }

    #[test]
    fn test_annulus_loops_sorted_by_length() {
        let mesh = fixtures::annulus();
        let boundary = Boundary::new(&mesh).unwrap();
        assert_eq!(boundary.len(), 2);

        let outer = &boundary.loops()[0];
        let inner = &boundary.loops()[1];
        assert_eq!(outer.len(), 12);
        assert_eq!(inner.len(), 4);
        assert!(outer.length() > inner.length());
        assert_closed(&mesh, outer);
        assert_closed(&mesh, inner);

        let num_boundary_edges = mesh
            .edge_ids()
            .filter(|&e| mesh.is_boundary_edge(e))
            .count();
        let traced: usize = boundary.loops().iter().map(BoundaryLoop::len).sum();
        assert_eq!(traced, num_boundary_edges);
    }

    #[test]
    fn test_loop_follows_edits() {
        let mut mesh = fixtures::grid(2);
        let bottom: EdgeId = mesh.edge_between(id(&mesh, 1), id(&mesh, 2)).unwrap();
        mesh.split_edge(bottom).unwrap();

        let boundary = Boundary::new(&mesh).unwrap();
        assert_eq!(boundary.loops()[0].len(), 9);
        assert!((boundary.loops()[0].length() - 8.0).abs() < 1e-12);
        assert_closed(&mesh, &boundary.loops()[0]);
    }

    #[test]
    fn test_divide() {
        let mesh = fixtures::quad();
        let mut boundary = Boundary::new(&mesh).unwrap();
        let l = &mut boundary.loops_mut()[0];

        l.divide(&mesh, &[id(&mesh, 3), id(&mesh, 1)]).unwrap();
        assert_eq!(mesh.source(l.halfedges()[0]), id(&mesh, 3));

        let segments = l.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start(), id(&mesh, 3));
        assert_eq!(segments[0].end(), id(&mesh, 1));
        assert_eq!(segments[1].start(), id(&mesh, 1));
        assert_eq!(segments[1].end(), id(&mesh, 3));
        for s in segments {
            assert_eq!(s.len(), 2);
            assert!((s.length() - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_divide_single_marker() {
        let mesh = fixtures::quad();
        let mut boundary = Boundary::new(&mesh).unwrap();
        let l = &mut boundary.loops_mut()[0];
        l.divide(&mesh, &[id(&mesh, 2)]).unwrap();
        assert_eq!(l.segments().len(), 1);
        assert_eq!(l.segments()[0].len(), 4);
        assert_eq!(l.segments()[0].start(), l.segments()[0].end());
    }

    #[test]
    fn test_divide_failures_leave_loop_unchanged() {
        let mesh = fixtures::grid(2);
        let mut boundary = Boundary::new(&mesh).unwrap();
        let l = &mut boundary.loops_mut()[0];
        let before = l.halfedges().to_vec();

        assert!(l.divide(&mesh, &[]).is_err());
        // Center vertex is not on the loop.
        assert!(matches!(
            l.divide(&mesh, &[id(&mesh, 5)]),
            Err(MeshError::MarkerNotFound { vertex: 5 })
        ));
        // Markers out of loop order: 1 -> 3 -> 9 runs counter-clockwise.
        assert!(matches!(
            l.divide(&mesh, &[id(&mesh, 1), id(&mesh, 9), id(&mesh, 3)]),
            Err(MeshError::MarkerNotFound { vertex: 3 })
        ));
        assert!(l.segments().is_empty());
        assert_eq!(l.halfedges(), before.as_slice());
    }

    #[test]
    fn test_save_and_load() {
        let mesh = fixtures::annulus();
        let boundary = Boundary::new(&mesh).unwrap();
        let inner = &boundary.loops()[1];

        let path = std::env::temp_dir().join(format!("hemesh_loop_{}.txt", std::process::id()));
        inner.save(&mesh, &path).unwrap();
        let loaded = BoundaryLoop::load(&mesh, &path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.halfedges(), inner.halfedges());
        assert!((loaded.length() - inner.length()).abs() < 1e-12);
    }

    #[test]
    fn test_write_format() {
        let mesh = fixtures::quad();
        let boundary = Boundary::new(&mesh).unwrap();
        let mut out = Vec::new();
        boundary.loops()[0].write_to(&mesh, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines: Vec<&str> = text.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["1 2", "2 3", "3 4", "4 1"]);
    }

    #[test]
    fn test_read_rejects_bad_input() {
        let mesh = fixtures::quad();
        let read = |text: &str| BoundaryLoop::read_from(&mesh, text.as_bytes());

        assert!(read("1 2\n2 3\n3 4\n4 1\n").is_ok());
        assert!(read("").is_err());
        assert!(read("1 x\n").is_err());
        assert!(read("1 2 3\n").is_err());
        // Reversed direction: no half-edge runs from 2 to 1.
        assert!(read("2 1\n").is_err());
        assert!(read("1 99\n").is_err());
        // Not closed.
        assert!(read("1 2\n2 3\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let mesh = fixtures::quad();
        let path = std::env::temp_dir().join("hemesh_definitely_missing_loop.txt");
        assert!(matches!(
            BoundaryLoop::load(&mesh, &path),
            Err(MeshError::Io(_))
        ));
    }
}

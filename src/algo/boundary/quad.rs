//! Boundary of a disk-like patch with four marked corners.

use super::{Boundary, BoundaryLoop, LoopSegment};
use crate::error::{MeshError, Result};
use crate::mesh::{Attributes, HalfEdgeMesh, MeshIndex, VertexId};

/// The single boundary loop of a mesh, cut into four sides at its corners.
///
/// The first side starts at the corner with the smallest x coordinate (ties
/// broken by the smallest y coordinate); the rest follow in loop order. The
/// comparison uses the 3D [`position`](HalfEdgeMesh::position), not the uv
/// coordinate, so a mesh laid out in a parameter domain should carry that
/// layout in its positions.
#[derive(Debug, Clone)]
pub struct QuadrilateralBoundary<I: MeshIndex = u32> {
    boundary_loop: BoundaryLoop<I>,
    corners: Vec<VertexId<I>>,
}

impl<I: MeshIndex> QuadrilateralBoundary<I> {
    /// Trace the boundary and split it at the vertices `is_corner` accepts.
    ///
    /// Fails unless the mesh has exactly one boundary loop carrying exactly
    /// four corners.
    ///
    /// ```
    /// use hemesh::prelude::*;
    /// use hemesh::algo::boundary::QuadrilateralBoundary;
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(1.0, 1.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// ];
    /// let faces = vec![[0, 1, 2], [0, 2, 3]];
    /// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
    ///
    /// let quad = QuadrilateralBoundary::new(&mesh, |_| true).unwrap();
    /// assert_eq!(quad.segments().len(), 4);
    /// assert_eq!(mesh.vertex_id(quad.corners()[0]), 1);
    /// ```
    pub fn new<A: Attributes, F>(mesh: &HalfEdgeMesh<I, A>, is_corner: F) -> Result<Self>
    where
        F: Fn(VertexId<I>) -> bool,
    {
        let mut loops = Boundary::new(mesh)?.into_loops();
        if loops.len() != 1 {
            log::warn!("expected a single boundary loop, found {}", loops.len());
            return Err(MeshError::BoundaryLoopCount {
                expected: 1,
                found: loops.len(),
            });
        }
        let mut boundary_loop = loops.remove(0);

        let mut corners: Vec<VertexId<I>> = boundary_loop
            .vertices(mesh)
            .into_iter()
            .filter(|&v| is_corner(v))
            .collect();
        if corners.len() != 4 {
            log::warn!("expected 4 boundary corners, found {}", corners.len());
            return Err(MeshError::CornerCount {
                found: corners.len(),
            });
        }

        let lowest = (0..corners.len())
            .min_by(|&i, &j| {
                let (p, q) = (mesh.position(corners[i]), mesh.position(corners[j]));
                p.x.total_cmp(&q.x).then_with(|| p.y.total_cmp(&q.y))
            })
            .unwrap_or(0);
        corners.rotate_left(lowest);

        boundary_loop.divide(mesh, &corners)?;
        log::debug!(
            "quadrilateral boundary: corners {:?}",
            corners.iter().map(|&v| mesh.vertex_id(v)).collect::<Vec<_>>()
        );

        Ok(Self {
            boundary_loop,
            corners,
        })
    }

    /// The four corners, in loop order starting at the lowest one.
    #[inline]
    pub fn corners(&self) -> &[VertexId<I>] {
        &self.corners
    }

    /// The four sides; side `i` runs from corner `i` to corner `i + 1`.
    #[inline]
    pub fn segments(&self) -> &[LoopSegment<I>] {
        self.boundary_loop.segments()
    }

    /// The underlying loop, rotated to start at the first corner.
    #[inline]
    pub fn boundary_loop(&self) -> &BoundaryLoop<I> {
        &self.boundary_loop
    }

    /// Sides ordered by length, longest first.
    pub fn sides_by_length(&self) -> Vec<&LoopSegment<I>> {
        let mut sides: Vec<&LoopSegment<I>> = self.segments().iter().collect();
        sides.sort_by(|a, b| b.length().total_cmp(&a.length()));
        sides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures;

    fn corner_predicate<'a>(
        mesh: &'a HalfEdgeMesh,
        ids: &'static [usize],
    ) -> impl Fn(VertexId) -> bool + 'a {
        move |v| ids.contains(&mesh.vertex_id(v))
    }

    #[test]
    fn test_four_corners() {
        let mesh = fixtures::grid(2);
        let quad = QuadrilateralBoundary::new(&mesh, corner_predicate(&mesh, &[1, 3, 7, 9])).unwrap();

        let corner_ids: Vec<usize> = quad.corners().iter().map(|&v| mesh.vertex_id(v)).collect();
        assert_eq!(corner_ids, vec![1, 3, 9, 7]);

        let segments = quad.segments();
        assert_eq!(segments.len(), 4);
        for (i, s) in segments.iter().enumerate() {
            assert_eq!(s.len(), 2);
            assert!((s.length() - 2.0).abs() < 1e-12);
            assert_eq!(s.start(), quad.corners()[i]);
            assert_eq!(s.end(), quad.corners()[(i + 1) % 4]);
        }
        assert_eq!(
            mesh.source(quad.boundary_loop().halfedges()[0]),
            quad.corners()[0]
        );
    }

    #[test]
    fn test_uneven_sides() {
        // Corners 1, 2, 9, 7: sides of length 1, 3, 2, 2.
        let mesh = fixtures::grid(2);
        let quad = QuadrilateralBoundary::new(&mesh, corner_predicate(&mesh, &[1, 2, 9, 7])).unwrap();
        let lengths: Vec<f64> = quad.segments().iter().map(LoopSegment::length).collect();
        assert!((lengths[0] - 1.0).abs() < 1e-12);
        assert!((lengths[1] - 3.0).abs() < 1e-12);
        assert!((quad.sides_by_length()[0].length() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_corner_count() {
        let mesh = fixtures::grid(2);
        let cases: [&'static [usize]; 2] = [&[1, 3, 9], &[1, 2, 3, 9, 7]];
        for ids in cases {
            let result = QuadrilateralBoundary::new(&mesh, corner_predicate(&mesh, ids));
            assert!(matches!(result, Err(MeshError::CornerCount { found }) if found == ids.len()));
        }
        // Interior vertices do not count as corners.
        let result = QuadrilateralBoundary::new(&mesh, corner_predicate(&mesh, &[1, 3, 5, 9]));
        assert!(matches!(result, Err(MeshError::CornerCount { found: 3 })));
    }

    #[test]
    fn test_requires_single_loop() {
        let mesh = fixtures::annulus();
        let result = QuadrilateralBoundary::new(&mesh, |_| true);
        assert!(matches!(
            result,
            Err(MeshError::BoundaryLoopCount {
                expected: 1,
                found: 2
            })
        ));

        let closed = fixtures::tetrahedron();
        assert!(matches!(
            QuadrilateralBoundary::new(&closed, |_| true),
            Err(MeshError::BoundaryLoopCount { found: 0, .. })
        ));
    }
}

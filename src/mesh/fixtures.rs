//! Small meshes shared by the unit tests.

use nalgebra::Point3;

use super::{build_from_triangles, HalfEdgeMesh};

/// Unit square split along the 1-3 diagonal.
///
/// ```text
/// 4 -- 3
/// |  / |
/// 1 -- 2
/// ```
pub(crate) fn quad() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let faces = vec![[0, 1, 2], [0, 2, 3]];
    build_from_triangles(&vertices, &faces).unwrap()
}

/// Triangulated `n x n` grid of unit cells in the xy-plane.
///
/// Vertex `(i, j)` sits at `(i, j, 0)` with id `j * (n + 1) + i + 1`. Every
/// cell is split along its lower-left to upper-right diagonal.
pub(crate) fn grid(n: usize) -> HalfEdgeMesh {
    grid_with_hole(n, None)
}

/// A 3x3 grid with the middle cell removed: two boundary loops.
pub(crate) fn annulus() -> HalfEdgeMesh {
    grid_with_hole(3, Some((1, 1)))
}

/// Closed tetrahedron with outward-facing triangles.
pub(crate) fn tetrahedron() -> HalfEdgeMesh {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ];
    let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
    build_from_triangles(&vertices, &faces).unwrap()
}

fn grid_with_hole(n: usize, hole: Option<(usize, usize)>) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    let mut faces = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            if hole == Some((i, j)) {
                continue;
            }
            let a = j * (n + 1) + i;
            let b = a + 1;
            let c = b + n + 1;
            let d = a + n + 1;
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

//! Benchmarks for mesh operations.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use hemesh::prelude::*;
use nalgebra::Point3;

fn grid_input(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    // Create grid vertices
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    // Create triangles
    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    (vertices, faces)
}

fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
    let (vertices, faces) = grid_input(n);
    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_mesh_construction(c: &mut Criterion) {
    let (vertices, faces) = grid_input(10);
    c.bench_function("build_grid_10x10", |b| {
        b.iter(|| {
            let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
            mesh
        });
    });
}

fn bench_mesh_traversal(c: &mut Criterion) {
    let mesh = create_grid_mesh(50);

    c.bench_function("vertex_neighbors_all", |b| {
        b.iter(|| {
            let mut count = 0;
            for v in mesh.vertex_ids() {
                count += mesh.vertex_neighbors(v).count();
            }
            count
        });
    });

    c.bench_function("edge_lookup_all", |b| {
        b.iter(|| {
            let mut found = 0;
            for e in mesh.edge_ids() {
                let [v0, v1] = mesh.edge_vertices(e);
                found += mesh.halfedge_between(v0, v1).is_some() as usize;
            }
            found
        });
    });
}

fn bench_mesh_editing(c: &mut Criterion) {
    let mesh = create_grid_mesh(20);

    c.bench_function("split_all_faces_20x20", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut mesh| {
                let faces: Vec<FaceId> = mesh.face_ids().collect();
                for f in faces {
                    mesh.split_face(f).unwrap();
                }
                mesh
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("split_all_edges_20x20", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut mesh| {
                let edges: Vec<EdgeId> = mesh.edge_ids().collect();
                for e in edges {
                    mesh.split_edge(e).unwrap();
                }
                mesh
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("swap_all_edges_20x20", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut mesh| {
                let edges: Vec<EdgeId> = mesh.edge_ids().collect();
                for e in edges {
                    if mesh.swapable(e) {
                        mesh.swap_edge(e).unwrap();
                    }
                }
                mesh
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_boundary(c: &mut Criterion) {
    let mesh = create_grid_mesh(50);
    let n = 50;
    let corners = [1, n + 1, (n + 1) * n + 1, (n + 1) * (n + 1)];

    c.bench_function("trace_boundary_50x50", |b| {
        b.iter(|| Boundary::new(&mesh).unwrap());
    });

    c.bench_function("quad_boundary_50x50", |b| {
        b.iter(|| {
            QuadrilateralBoundary::new(&mesh, |v| corners.contains(&mesh.vertex_id(v))).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_mesh_traversal,
    bench_mesh_editing,
    bench_boundary
);
criterion_main!(benches);

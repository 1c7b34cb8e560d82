//! Benchmarks for the coordinate pipeline stages.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Point3;

use atrium::algo::harmonic::{harmonic_extension, HarmonicOptions, LaplacianWeights};
use atrium::algo::region::{extract_region, submesh_from_faces};
use atrium::algo::route::{constrained_shortest_path, Admissibility, RouteOptions};
use atrium::artifact::SubmeshBoundary;
use atrium::prelude::*;

fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

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

    build_from_triangles(&vertices, &faces).unwrap()
}

/// Counter-clockwise loop around the square `[lo, hi]^2` of grid vertices.
fn square_loop(n: usize, lo: usize, hi: usize) -> Vec<VertexId> {
    let id = |i: usize, j: usize| VertexId::new(j * (n + 1) + i);
    let mut cycle = Vec::new();
    cycle.extend((lo..hi).map(|i| id(i, lo)));
    cycle.extend((lo..hi).map(|j| id(hi, j)));
    cycle.extend((lo + 1..=hi).rev().map(|i| id(i, hi)));
    cycle.extend((lo + 1..=hi).rev().map(|j| id(lo, j)));
    cycle
}

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("shortest_path");
    for n in [20, 50] {
        let mesh = create_grid_mesh(n);
        let left: Vec<VertexId> = (0..=n).map(|j| VertexId::new(j * (n + 1))).collect();
        let right: Vec<VertexId> = (0..=n).map(|j| VertexId::new(j * (n + 1) + n)).collect();
        let admissibility = Admissibility::new();

        for parallel in [false, true] {
            let options = RouteOptions::default().with_parallel(parallel);
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter(|| constrained_shortest_path(&mesh, &left, &right, &admissibility, &options).unwrap());
            });
        }
    }
    group.finish();
}

fn bench_region(c: &mut Criterion) {
    let n = 100;
    let mesh = create_grid_mesh(n);
    let cycle = square_loop(n, 10, 90);
    let outside = VertexId::new(0);

    c.bench_function("extract_region_100", |b| {
        b.iter(|| extract_region(&mesh, &cycle, outside).unwrap());
    });
}

fn bench_harmonic(c: &mut Criterion) {
    let n = 40;
    let mesh = create_grid_mesh(n);
    let cycle = square_loop(n, 0, n);
    // The loop is the mesh rim, so the region is the whole grid.
    let submesh = submesh_from_faces(&mesh, mesh.face_ids().collect());
    let boundary = SubmeshBoundary {
        alpha: cycle.iter().map(|&v| mesh.position(v).x / n as f64).collect(),
        beta: cycle.iter().map(|&v| mesh.position(v).y / n as f64).collect(),
        vertices: cycle,
    };

    let mut group = c.benchmark_group("harmonic_extension");
    for (label, weights) in [("cotangent", LaplacianWeights::Cotangent), ("uniform", LaplacianWeights::Uniform)] {
        let options = HarmonicOptions::default().with_weights(weights);
        group.bench_function(label, |b| {
            b.iter(|| harmonic_extension(&mesh, &submesh, &boundary, &options).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_routing, bench_region, bench_harmonic);
criterion_main!(benches);

//! Benchmarks for linear solvers.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use nalgebra::{DMatrix, DVector};
use nodal_solver::linear::{solve_complex, solve_dense};
use num_complex::Complex;

fn bench_solve_dense(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_dense");

    for size in [10, 50, 100, 200] {
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &size,
            |bencher, &size| {
                // Create a diagonally dominant matrix (guaranteed non-singular)
                let a = DMatrix::from_fn(size, size, |i, j| {
                    if i == j {
                        (size as f64) + 1.0
                    } else {
                        1.0 / ((i as f64 - j as f64).abs() + 1.0)
                    }
                });
                let rhs = DVector::from_fn(size, |i, _| (i + 1) as f64);

                bencher.iter(|| solve_dense(black_box(&a), black_box(&rhs)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_solve_complex(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_complex");

    for size in [10, 50, 100, 200] {
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &size,
            |bencher, &size| {
                // Band-structured admittance matrix, as a ladder network produces
                let a = DMatrix::from_fn(size, size, |i, j| {
                    if i == j {
                        Complex::new(2.0 + size as f64, 0.5)
                    } else if i.abs_diff(j) == 1 {
                        Complex::new(-1.0, -0.25)
                    } else {
                        Complex::new(0.0, 0.0)
                    }
                });
                let rhs = DVector::from_fn(size, |i, _| Complex::new((i + 1) as f64, 0.0));

                bencher.iter(|| solve_complex(black_box(&a), black_box(&rhs)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_solve_dense, bench_solve_complex);
criterion_main!(benches);

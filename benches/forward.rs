use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tangent::{hvp, jacobian, jacobian_batched, Dual, DualVec, Scalar};

fn rosenbrock_f64(x: &[f64]) -> f64 {
    let mut sum = 0.0;
    for i in 0..x.len() - 1 {
        let t1 = 1.0 - x[i];
        let t2 = x[i + 1] - x[i] * x[i];
        sum += t1 * t1 + 100.0 * t2 * t2;
    }
    sum
}

fn rosenbrock_generic<T: Scalar>(x: &[T]) -> T {
    let hundred = T::from_int(100);
    let mut sum = T::zero();
    for i in 0..x.len() - 1 {
        let t1 = T::one() - x[i];
        let t2 = x[i + 1] - x[i] * x[i];
        sum = sum + t1 * t1 + hundred * t2 * t2;
    }
    sum
}

/// Quadratic-element residual shape: three unknowns, three outputs.
fn element<T: Scalar>(u: &[T]) -> Vec<T> {
    let kappa = |v: T| T::one() + v * v;
    vec![
        kappa(u[0]) * (u[0] - u[1]) + u[0] * u[0] * u[0],
        kappa(u[1]) * (T::from_int(2) * u[1] - u[0] - u[2]) + u[1].sin(),
        kappa(u[2]) * (u[2] - u[1]) + u[2].exp(),
    ]
}

fn forward_gradient(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut grad = vec![0.0; n];
    for i in 0..n {
        let inputs: Vec<Dual<f64>> = x
            .iter()
            .enumerate()
            .map(|(k, &xi)| {
                if k == i {
                    Dual::variable(xi)
                } else {
                    Dual::constant(xi)
                }
            })
            .collect();
        grad[i] = rosenbrock_generic(&inputs).eps;
    }
    grad
}

fn finite_diff_gradient(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h = 1e-7;
    let mut grad = vec![0.0; n];
    for i in 0..n {
        let mut xp = x.to_vec();
        let mut xm = x.to_vec();
        xp[i] += h;
        xm[i] -= h;
        grad[i] = (rosenbrock_f64(&xp) - rosenbrock_f64(&xm)) / (2.0 * h);
    }
    grad
}

fn bench_forward_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_gradient");
    for n in [2, 10, 100] {
        let x: Vec<f64> = (0..n).map(|i| 0.5 + 0.01 * i as f64).collect();

        group.bench_with_input(BenchmarkId::new("forward_mode", n), &x, |b, x| {
            b.iter(|| black_box(forward_gradient(black_box(x))))
        });

        group.bench_with_input(BenchmarkId::new("finite_diff", n), &x, |b, x| {
            b.iter(|| black_box(finite_diff_gradient(black_box(x))))
        });
    }
    group.finish();
}

fn bench_element_jacobian(c: &mut Criterion) {
    let mut group = c.benchmark_group("element_jacobian");
    let x = [0.3, -0.2, 0.7];

    group.bench_function("dual_per_input", |b| {
        b.iter(|| black_box(jacobian(|v| element(v), black_box(&x[..]))))
    });
    group.bench_function("dual_vec_lanes", |b| {
        b.iter(|| black_box(jacobian_batched::<f64, 3>(|v| element(v), black_box(&x[..]))))
    });
    group.bench_function("nested_lanes", |b| {
        let v = [1.0, 0.5, -0.25];
        b.iter(|| {
            let inputs: Vec<DualVec<Dual<f64>, 3>> = (0..3)
                .map(|k| DualVec::with_tangent(Dual::new(x[k], v[k]), k))
                .collect();
            black_box(element(black_box(&inputs)))
        })
    });
    group.finish();
}

fn bench_hvp(c: &mut Criterion) {
    let mut group = c.benchmark_group("hvp");
    for n in [2, 10, 100] {
        let x: Vec<f64> = (0..n).map(|i| 0.5 + 0.01 * i as f64).collect();
        let v = vec![1.0; n];
        group.bench_with_input(BenchmarkId::new("forward_over_forward", n), &x, |b, x| {
            b.iter(|| {
                black_box(hvp(
                    |d| rosenbrock_generic(d),
                    black_box(x.as_slice()),
                    v.as_slice(),
                ))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_forward_gradient, bench_element_jacobian, bench_hvp);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hlsc::affine::AffineMap;
use hlsc::builder::ModuleBuilder;
use hlsc::emit::{emit_with_options, EmitOptions};
use hlsc::ir::{BinaryOp, ElemType, MemoryKind, Module, OpAttrs, ReductionKind, UnaryOp, ValueInfo};
use hlsc::pipeline;

// Emission benchmark scenarios, built in memory so no I/O is measured.

/// Pipelined vector add over DRAM ports.
fn vadd_program(len: i64) -> Module {
    let mut mb = ModuleBuilder::new();
    let a = mb.add_value(ValueInfo::array(ElemType::F32, &[len]).in_memory(MemoryKind::Dram));
    let b = mb.add_value(ValueInfo::array(ElemType::F32, &[len]).in_memory(MemoryKind::Dram));
    let c = mb.add_value(ValueInfo::array(ElemType::F32, &[len]).in_memory(MemoryKind::Dram));
    let mut f = mb.function("vadd", &[a, b, c], |body| {
        let op = body.affine_for(0, len, 1, |inner, i| {
            let x = inner.affine_load(a, AffineMap::identity(1), &[i]);
            let y = inner.affine_load(b, AffineMap::identity(1), &[i]);
            let s = inner.binary(BinaryOp::Add, x, y);
            inner.affine_store(s, c, AffineMap::identity(1), &[i]);
        });
        op.attrs = OpAttrs {
            pipeline: true,
            target_ii: Some(1),
            ..OpAttrs::default()
        };
        body.ret(&[]);
    });
    f.attrs.top_function = true;
    mb.finish_with(vec![f])
}

/// Triple loop nest `C[i][j] += A[i][k] * B[k][j]`.
fn gemm_program(n: i64) -> Module {
    let mut mb = ModuleBuilder::new();
    let a = mb.array(ElemType::F32, &[n, n]);
    let b = mb.array(ElemType::F32, &[n, n]);
    let c = mb.array(ElemType::F32, &[n, n]);
    let f = mb.function("gemm", &[a, b, c], |body| {
        body.affine_for(0, n, 1, |bi, i| {
            bi.affine_for(0, n, 1, |bj, j| {
                let op = bj.affine_for(0, n, 1, |bk, k| {
                    let x = bk.affine_load(a, AffineMap::identity(2), &[i, k]);
                    let y = bk.affine_load(b, AffineMap::identity(2), &[k, j]);
                    let acc = bk.affine_load(c, AffineMap::identity(2), &[i, j]);
                    let p = bk.binary(BinaryOp::Mul, x, y);
                    let s = bk.binary(BinaryOp::Add, acc, p);
                    bk.affine_store(s, c, AffineMap::identity(2), &[i, j]);
                });
                op.attrs.pipeline = true;
            });
        });
        body.ret(&[]);
    });
    mb.finish_with(vec![f])
}

/// Sum reduction over a 2-D array.
fn reduction_program(n: i64) -> Module {
    let mut mb = ModuleBuilder::new();
    let a = mb.array(ElemType::F32, &[n, n]);
    let f = mb.function("total", &[a], |body| {
        let sum = body.parallel(&[n, n], ElemType::F32, &[ReductionKind::Add], |inner, ivs| {
            let x = inner.affine_load(a, AffineMap::identity(2), ivs);
            inner.yield_values(&[x]);
        });
        body.ret(&[sum]);
    });
    mb.finish_with(vec![f])
}

/// `n_functions` functions, each an elementwise chain of `chain` operations.
fn generate_scaling_program(n_functions: usize, chain: usize) -> Module {
    let mut mb = ModuleBuilder::new();
    let mut functions = Vec::with_capacity(n_functions);
    for f in 0..n_functions {
        let x = mb.array(ElemType::F32, &[8, 8]);
        let y = mb.array(ElemType::F32, &[8, 8]);
        functions.push(mb.function(&format!("stage_{}", f), &[x, y], |body| {
            let mut last = x;
            for step in 0..chain {
                last = if step % 2 == 0 {
                    body.binary(BinaryOp::Mul, last, y)
                } else {
                    body.unary(UnaryOp::Exp, last)
                };
            }
            body.ret(&[last]);
        }));
    }
    mb.finish_with(functions)
}

fn scenarios() -> [(&'static str, Module); 3] {
    [
        ("vadd", vadd_program(1024)),
        ("gemm", gemm_program(32)),
        ("reduction", reduction_program(16)),
    ]
}

fn bench_emit_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_latency");
    let options = EmitOptions::default();

    for (name, module) in scenarios() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &module, |b, module| {
            b.iter(|| {
                let result = emit_with_options(black_box(module), &options);
                assert!(!result.has_errors());
                black_box(result);
            });
        });
    }

    group.finish();
}

fn bench_emit_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_scaling");
    let options = EmitOptions::default();

    for n_functions in [1_usize, 10, 50, 200] {
        let module = generate_scaling_program(n_functions, 8);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}functions", n_functions)),
            &module,
            |b, module| {
                b.iter(|| black_box(emit_with_options(black_box(module), &options)));
            },
        );
    }

    group.finish();
}

fn bench_provenance(c: &mut Criterion) {
    let mut group = c.benchmark_group("provenance");
    let module = generate_scaling_program(50, 8);

    group.bench_function("canonical_json", |b| {
        b.iter(|| black_box(pipeline::canonical_json(black_box(&module))));
    });
    group.bench_function("compute", |b| {
        b.iter(|| black_box(pipeline::compute_provenance(black_box(&module))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_emit_latency,
    bench_emit_scaling,
    bench_provenance
);
criterion_main!(benches);

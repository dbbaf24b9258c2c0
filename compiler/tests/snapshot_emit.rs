// Snapshot tests: lock generated HLS C++ to detect unintended behavior changes.
//
// Programs are built with the library's `ModuleBuilder` and emitted through
// `emit_with_options`. Snapshots hold the text after the fixed prologue, are
// managed by `insta`, and live under `compiler/tests/snapshots/`.
//
// Run `cargo insta review` after intentional output changes to update baselines.

use hlsc::affine::AffineMap;
use hlsc::builder::ModuleBuilder;
use hlsc::emit::{emit_with_options, EmitOptions, PROLOGUE};
use hlsc::ir::{
    BinaryOp, CmpFPredicate, DimPartition, ElemType, MemoryKind, Module, OpAttrs,
    PartitionLayout, UnaryOp, ValueInfo,
};

fn emitted(module: &Module) -> String {
    let result = emit_with_options(module, &EmitOptions::default());
    assert!(
        !result.has_errors(),
        "emission errors: {:?}",
        result.diagnostics
    );
    result.generated.cpp_source[PROLOGUE.len()..].to_string()
}

/// Pipelined vector add on a top function with DRAM and BRAM ports.
#[test]
fn snapshot_vadd_top() {
    let mut mb = ModuleBuilder::new();
    let a = mb.add_value(ValueInfo::array(ElemType::F32, &[16]).in_memory(MemoryKind::Dram));
    let b = mb.add_value(
        ValueInfo::array(ElemType::F32, &[16])
            .in_memory(MemoryKind::BramS2p)
            .partitioned(PartitionLayout::new(vec![DimPartition::cyclic(4)])),
    );
    let c = mb.add_value(ValueInfo::array(ElemType::F32, &[16]).in_memory(MemoryKind::Bram1p));
    let mut f = mb.function("vadd", &[a, b, c], |body| {
        let op = body.affine_for(0, 16, 1, |inner, i| {
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
    let module = mb.finish_with(vec![f]);

    insta::assert_snapshot!("vadd_top", emitted(&module));
}

/// Conditional whose yielded value is assigned in both branches.
#[test]
fn snapshot_select_max() {
    let mut mb = ModuleBuilder::new();
    let x = mb.value(ElemType::F32);
    let y = mb.value(ElemType::F32);
    let f = mb.function("pick", &[x, y], |body| {
        let cond = body.cmpf(CmpFPredicate::Ogt, x, y);
        let results = body.scf_if(
            cond,
            vec![ValueInfo::scalar(ElemType::F32)],
            |then| then.yield_values(&[x]),
            |otherwise| otherwise.yield_values(&[y]),
        );
        body.ret(&results);
    });
    let module = mb.finish_with(vec![f]);

    insta::assert_snapshot!("select_max", emitted(&module));
}

/// Elementwise unary over a 2-D array, a partitioned local buffer, and the
/// informational function comments.
#[test]
fn snapshot_vexp_with_estimates() {
    let mut mb = ModuleBuilder::new();
    let a = mb.array(ElemType::F32, &[2, 4]);
    let mut f = mb.function("vexp", &[a], |body| {
        body.alloc(
            ValueInfo::array(ElemType::F32, &[2, 4])
                .in_memory(MemoryKind::BramT2p)
                .partitioned(PartitionLayout::new(vec![
                    DimPartition::block(2),
                    DimPartition::none(),
                ])),
        );
        let e = body.unary(UnaryOp::Exp, a);
        body.ret(&[e]);
    });
    f.attrs.latency = Some(120);
    f.attrs.ii = Some(4);
    f.attrs.dsp = Some(8);
    let module = mb.finish_with(vec![f]);

    insta::assert_snapshot!("vexp_with_estimates", emitted(&module));
}

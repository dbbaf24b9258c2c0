// builder.rs — Programmatic construction of program models
//
// Upstream tools hand the emitter a finished `Module` (usually as JSON).
// `ModuleBuilder` builds the same structure in code: values are allocated in
// the arena in call order, and `BodyBuilder` appends operations to a block,
// opening nested builders for loop and conditional regions.
//
// Preconditions: operands passed to a `BodyBuilder` were allocated by the
//                same `ModuleBuilder`.
// Postconditions: `finish_with` yields a module with a dense value arena.
// Failure modes: none; malformed structure is diagnosed at emission time.
// Side effects: none.

use crate::affine::{AffineBound, AffineExpr, AffineMap, IntegerSet};
use crate::id::{IdAllocator, ValueId};
use crate::ir::{
    BinaryOp, Block, CastKind, CmpFPredicate, CmpIPredicate, ElemType, FuncAttrs, Function,
    IpKind, Literal, Module, Op, OpAttrs, OpKind, ReductionKind, Shape, UnaryOp, ValueInfo,
};

#[derive(Debug, Default)]
pub struct ModuleBuilder {
    ids: IdAllocator,
    values: Vec<ValueInfo>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(&mut self, info: ValueInfo) -> ValueId {
        let id = self.ids.alloc_value();
        self.values.push(info);
        id
    }

    pub fn value(&mut self, elem: ElemType) -> ValueId {
        self.add_value(ValueInfo::scalar(elem))
    }

    pub fn array(&mut self, elem: ElemType, dims: &[i64]) -> ValueId {
        self.add_value(ValueInfo::array(elem, dims))
    }

    pub fn value_with_shape(&mut self, elem: ElemType, shape: Shape) -> ValueId {
        self.add_value(ValueInfo::with_shape(elem, shape))
    }

    pub fn info(&self, id: ValueId) -> Option<&ValueInfo> {
        self.values.get(id.index())
    }

    /// Result type of an elementwise operation over `like`: same element
    /// type and shape, no memory placement, no payload.
    fn derived(&mut self, like: ValueId, elem: Option<ElemType>) -> ValueId {
        let info = match self.info(like) {
            Some(src) => ValueInfo::with_shape(elem.unwrap_or(src.elem), src.shape.clone()),
            None => ValueInfo::scalar(elem.unwrap_or(ElemType::F32)),
        };
        self.add_value(info)
    }

    /// Build one function. The body closure receives a builder for the
    /// function's single block; end it with `BodyBuilder::ret`.
    pub fn function(
        &mut self,
        name: &str,
        args: &[ValueId],
        build: impl FnOnce(&mut BodyBuilder<'_>),
    ) -> Function {
        let mut body = BodyBuilder::new(self);
        build(&mut body);
        Function {
            name: name.to_string(),
            args: args.to_vec(),
            attrs: FuncAttrs::default(),
            blocks: vec![Block {
                args: Vec::new(),
                ops: body.ops,
            }],
            line: None,
        }
    }

    pub fn finish_with(self, functions: Vec<Function>) -> Module {
        Module {
            values: self.values,
            functions,
        }
    }
}

/// Appends operations to one block.
#[derive(Debug)]
pub struct BodyBuilder<'b> {
    module: &'b mut ModuleBuilder,
    ops: Vec<Op>,
}

impl<'b> BodyBuilder<'b> {
    fn new(module: &'b mut ModuleBuilder) -> Self {
        Self {
            module,
            ops: Vec::new(),
        }
    }

    /// Allocate a value in the enclosing module.
    pub fn value(&mut self, info: ValueInfo) -> ValueId {
        self.module.add_value(info)
    }

    /// Append `op`, returning it so callers can set attributes or a line.
    pub fn push(&mut self, op: Op) -> &mut Op {
        let idx = self.ops.len();
        self.ops.push(op);
        &mut self.ops[idx]
    }

    fn region(&mut self, args: Vec<ValueId>, build: impl FnOnce(&mut BodyBuilder<'_>)) -> Block {
        let mut inner = BodyBuilder::new(&mut *self.module);
        build(&mut inner);
        Block {
            args,
            ops: inner.ops,
        }
    }

    // ── Values and arithmetic ───────────────────────────────────────────

    /// Scalar constant; its literal replaces the name at every use.
    pub fn constant(&mut self, elem: ElemType, literal: Literal) -> ValueId {
        let id = self.value(ValueInfo::scalar(elem).with_constant(literal));
        self.push(Op::new(OpKind::Constant, vec![], vec![id]));
        id
    }

    pub fn index(&mut self, value: i64) -> ValueId {
        self.constant(ElemType::Index, Literal::Int(value))
    }

    pub fn constant_array(&mut self, elem: ElemType, dims: &[i64], elements: Vec<Literal>) -> ValueId {
        let id = self.value(ValueInfo::array(elem, dims).with_constant(Literal::Dense(elements)));
        self.push(Op::new(OpKind::Constant, vec![], vec![id]));
        id
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let result = self.module.derived(lhs, None);
        self.push(Op::new(OpKind::Binary { op }, vec![lhs, rhs], vec![result]));
        result
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ValueId) -> ValueId {
        let result = self.module.derived(operand, None);
        self.push(Op::new(OpKind::Unary { op }, vec![operand], vec![result]));
        result
    }

    pub fn cmpf(&mut self, predicate: CmpFPredicate, lhs: ValueId, rhs: ValueId) -> ValueId {
        let result = self.module.derived(lhs, Some(ElemType::Bool));
        self.push(Op::new(OpKind::CmpF { predicate }, vec![lhs, rhs], vec![result]));
        result
    }

    pub fn cmpi(&mut self, predicate: CmpIPredicate, lhs: ValueId, rhs: ValueId) -> ValueId {
        let result = self.module.derived(lhs, Some(ElemType::Bool));
        self.push(Op::new(OpKind::CmpI { predicate }, vec![lhs, rhs], vec![result]));
        result
    }

    pub fn select(&mut self, condition: ValueId, on_true: ValueId, on_false: ValueId) -> ValueId {
        let result = self.module.derived(on_true, None);
        self.push(Op::new(
            OpKind::Select,
            vec![condition, on_true, on_false],
            vec![result],
        ));
        result
    }

    pub fn cast(&mut self, kind: CastKind, operand: ValueId, to: ElemType) -> ValueId {
        let result = self.value(ValueInfo::scalar(to));
        self.push(Op::new(OpKind::Cast { kind }, vec![operand], vec![result]));
        result
    }

    pub fn dim(&mut self, source: ValueId, index: i64) -> ValueId {
        let index = self.index(index);
        let result = self.value(ValueInfo::scalar(ElemType::Index));
        self.push(Op::new(OpKind::Dim, vec![source, index], vec![result]));
        result
    }

    pub fn rank(&mut self, source: ValueId) -> ValueId {
        let result = self.value(ValueInfo::scalar(ElemType::Index));
        self.push(Op::new(OpKind::Rank, vec![source], vec![result]));
        result
    }

    // ── Memory ──────────────────────────────────────────────────────────

    pub fn alloc(&mut self, info: ValueInfo) -> ValueId {
        let result = self.value(info);
        self.push(Op::new(OpKind::Alloc, vec![], vec![result]));
        result
    }

    fn element_of(&mut self, memref: ValueId) -> ValueId {
        let elem = self
            .module
            .info(memref)
            .map_or(ElemType::F32, |info| info.elem);
        self.value(ValueInfo::scalar(elem))
    }

    pub fn load(&mut self, memref: ValueId, indices: &[ValueId]) -> ValueId {
        let result = self.element_of(memref);
        let mut operands = vec![memref];
        operands.extend_from_slice(indices);
        self.push(Op::new(OpKind::Load, operands, vec![result]));
        result
    }

    pub fn store(&mut self, value: ValueId, memref: ValueId, indices: &[ValueId]) {
        let mut operands = vec![value, memref];
        operands.extend_from_slice(indices);
        self.push(Op::new(OpKind::Store, operands, vec![]));
    }

    pub fn affine_load(&mut self, memref: ValueId, map: AffineMap, operands: &[ValueId]) -> ValueId {
        let result = self.element_of(memref);
        let mut all = vec![memref];
        all.extend_from_slice(operands);
        self.push(Op::new(OpKind::AffineLoad { map }, all, vec![result]));
        result
    }

    pub fn affine_store(&mut self, value: ValueId, memref: ValueId, map: AffineMap, operands: &[ValueId]) {
        let mut all = vec![value, memref];
        all.extend_from_slice(operands);
        self.push(Op::new(OpKind::AffineStore { map }, all, vec![]));
    }

    pub fn affine_apply(&mut self, map: AffineMap, operands: &[ValueId]) -> ValueId {
        let result = self.value(ValueInfo::scalar(ElemType::Index));
        self.push(Op::new(OpKind::AffineApply { map }, operands.to_vec(), vec![result]));
        result
    }

    /// Whole-array copy `target = source`.
    pub fn assign(&mut self, source: ValueId) -> ValueId {
        let result = self.module.derived(source, None);
        self.push(Op::new(OpKind::Assign, vec![source], vec![result]));
        result
    }

    pub fn tensor_to_memref(&mut self, source: ValueId, info: ValueInfo) -> ValueId {
        let result = self.value(info);
        self.push(Op::new(OpKind::TensorToMemref, vec![source], vec![result]));
        result
    }

    // ── Control flow ────────────────────────────────────────────────────

    pub fn scf_for(
        &mut self,
        lower: ValueId,
        upper: ValueId,
        step: ValueId,
        build: impl FnOnce(&mut BodyBuilder<'_>, ValueId),
    ) -> &mut Op {
        let iv = self.value(ValueInfo::scalar(ElemType::Index));
        let body = self.region(vec![iv], |inner| build(inner, iv));
        let mut op = Op::new(OpKind::ScfFor, vec![lower, upper, step], vec![]);
        op.regions.push(body);
        self.push(op)
    }

    /// Loop with constant bounds `lower..upper`.
    pub fn affine_for(
        &mut self,
        lower: i64,
        upper: i64,
        step: i64,
        build: impl FnOnce(&mut BodyBuilder<'_>, ValueId),
    ) -> &mut Op {
        self.affine_for_bounds(AffineBound::constant(lower), AffineBound::constant(upper), step, build)
    }

    pub fn affine_for_bounds(
        &mut self,
        lower: AffineBound,
        upper: AffineBound,
        step: i64,
        build: impl FnOnce(&mut BodyBuilder<'_>, ValueId),
    ) -> &mut Op {
        let iv = self.value(ValueInfo::scalar(ElemType::Index));
        let body = self.region(vec![iv], |inner| build(inner, iv));
        let mut op = Op::new(OpKind::AffineFor { lower, upper, step }, vec![], vec![]);
        op.regions.push(body);
        self.push(op)
    }

    /// `scf.if` yielding one value per entry of `results`.
    pub fn scf_if(
        &mut self,
        condition: ValueId,
        results: Vec<ValueInfo>,
        then: impl FnOnce(&mut BodyBuilder<'_>),
        otherwise: impl FnOnce(&mut BodyBuilder<'_>),
    ) -> Vec<ValueId> {
        let results: Vec<ValueId> = results.into_iter().map(|info| self.value(info)).collect();
        let then_block = self.region(Vec::new(), then);
        let else_block = self.region(Vec::new(), otherwise);
        let mut op = Op::new(OpKind::ScfIf, vec![condition], results.clone());
        op.regions.push(then_block);
        if !else_block.ops.is_empty() {
            op.regions.push(else_block);
        }
        self.push(op);
        results
    }

    pub fn affine_if(
        &mut self,
        set: IntegerSet,
        operands: &[ValueId],
        then: impl FnOnce(&mut BodyBuilder<'_>),
    ) -> &mut Op {
        let then_block = self.region(Vec::new(), then);
        let mut op = Op::new(OpKind::AffineIf { set }, operands.to_vec(), vec![]);
        op.regions.push(then_block);
        self.push(op)
    }

    /// Parallel reduction nest over `0..extent` per dimension with a single
    /// scalar result combined by `reductions`.
    pub fn parallel(
        &mut self,
        extents: &[i64],
        elem: ElemType,
        reductions: &[ReductionKind],
        build: impl FnOnce(&mut BodyBuilder<'_>, &[ValueId]),
    ) -> ValueId {
        let ivs: Vec<ValueId> = extents
            .iter()
            .map(|_| self.value(ValueInfo::scalar(ElemType::Index)))
            .collect();
        let result = self.value(ValueInfo::scalar(elem));
        let body = self.region(ivs.clone(), |inner| build(inner, &ivs));

        let lower = AffineBound::new(
            AffineMap::new(0, 0, extents.iter().map(|_| AffineExpr::constant(0)).collect()),
            vec![],
        );
        let upper = AffineBound::new(
            AffineMap::new(0, 0, extents.iter().map(|&e| AffineExpr::constant(e)).collect()),
            vec![],
        );
        let mut op = Op::new(
            OpKind::AffineParallel {
                lower,
                upper,
                steps: vec![1; extents.len()],
            },
            vec![],
            vec![result],
        );
        op.attrs = OpAttrs {
            reductions: reductions.to_vec(),
            ..OpAttrs::default()
        };
        op.regions.push(body);
        self.push(op);
        result
    }

    pub fn yield_values(&mut self, values: &[ValueId]) {
        self.push(Op::new(OpKind::AffineYield, values.to_vec(), vec![]));
    }

    // ── Calls ───────────────────────────────────────────────────────────

    pub fn call(&mut self, callee: &str, args: &[ValueId], results: Vec<ValueInfo>) -> Vec<ValueId> {
        let results: Vec<ValueId> = results.into_iter().map(|info| self.value(info)).collect();
        self.push(Op::new(
            OpKind::Call {
                callee: callee.to_string(),
            },
            args.to_vec(),
            results.clone(),
        ));
        results
    }

    pub fn ip(&mut self, kind: IpKind, operands: &[ValueId]) {
        self.push(Op::new(OpKind::Ip { kind }, operands.to_vec(), vec![]));
    }

    pub fn ret(&mut self, values: &[ValueId]) {
        self.push(Op::new(OpKind::Return, values.to_vec(), vec![]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_allocated_in_call_order() {
        let mut mb = ModuleBuilder::new();
        let a = mb.array(ElemType::F32, &[4]);
        let f = mb.function("f", &[a], |body| {
            let b = body.unary(UnaryOp::Exp, a);
            body.ret(&[b]);
        });
        let module = mb.finish_with(vec![f]);
        assert_eq!(module.values.len(), 2);
        assert_eq!(module.values[1].shape, Shape::fixed(&[4]));
        assert_eq!(module.functions[0].blocks[0].ops.len(), 2);
        assert!(module.dangling_values().is_empty());
    }

    #[test]
    fn loop_regions_carry_the_induction_variable() {
        let mut mb = ModuleBuilder::new();
        let f = mb.function("f", &[], |body| {
            body.affine_for(0, 8, 2, |inner, iv| {
                inner.cast(CastKind::IndexCast, iv, ElemType::signed(32));
            })
            .attrs
            .pipeline = true;
            body.ret(&[]);
        });
        let op = &f.blocks[0].ops[0];
        assert!(op.attrs.pipeline);
        assert_eq!(op.regions[0].args, vec![ValueId(0)]);
        assert_eq!(op.regions[0].ops.len(), 1);
    }
}

// stmt.rs — Statement and expression emission rules
//
// One rule per operation kind, dispatched from `EmitCtx::emit_op`. Control
// constructs (loops, conditionals, parallel reductions) nest through the
// indent guard; whole-array operations go through `EmitCtx::elementwise`.
// Every rendered statement line ends with the trailing info comment.
//
// Preconditions: operand/result/region counts were checked by dispatch.
// Postconditions: each non-constant value is declared at most once.
// Failure modes: shape, type, and structural problems are reported as
//                diagnostics and the offending statement is skipped.
// Side effects: none.

use std::fmt::Write as _;

use crate::affine::{AffineBound, AffineMap, AffineRenderer, IntegerSet};
use crate::diag::codes;
use crate::emit::{EmitCtx, Parent};
use crate::id::ValueId;
use crate::ir::{Block, ElemType, Literal, Op, OpKind, ReductionKind};

impl<'m> EmitCtx<'m> {
    // ── Loops ───────────────────────────────────────────────────────────

    fn loop_induction_var(&mut self, op: &Op, body: &Block) -> Option<ValueId> {
        let iv = body.args.first().copied();
        if iv.is_none() {
            self.error(Some(op), codes::E0105, "loop body has no induction variable");
        }
        iv
    }

    /// Body of a loop whose header line was just written: loop pragmas,
    /// nested statements, closing brace.
    fn emit_loop_body(&mut self, op: &'m Op, body: &'m Block) {
        {
            let mut inner = self.nest(1);
            inner.emit_loop_pragmas(&op.attrs);
            inner.emit_block(body, Parent::Op(op));
        }
        self.indent();
        self.out.push_str("}\n");
    }

    pub(crate) fn emit_scf_for(&mut self, op: &'m Op) {
        let body = &op.regions[0];
        let Some(iv) = self.loop_induction_var(op, body) else {
            return;
        };
        self.indent();
        self.out.push_str("for (");
        self.emit_value(iv, 0, Some(op));
        self.out.push_str(" = ");
        self.emit_value(op.operands[0], 0, Some(op));
        self.out.push_str("; ");
        self.emit_value(iv, 0, Some(op));
        self.out.push_str(" < ");
        self.emit_value(op.operands[1], 0, Some(op));
        self.out.push_str("; ");
        self.emit_value(iv, 0, Some(op));
        self.out.push_str(" += ");
        self.emit_value(op.operands[2], 0, Some(op));
        self.out.push_str(") {");
        self.emit_op_info(op);
        self.emit_loop_body(op, body);
    }

    fn check_bound(&mut self, op: &Op, bound: &AffineBound, min_results: usize) -> bool {
        if !bound.map.accepts(bound.operands.len()) || bound.map.results.len() < min_results {
            self.error(
                Some(op),
                codes::E0104,
                format!(
                    "bound map takes {} input(s) and yields {} result(s); given {} operand(s), need {} result(s)",
                    bound.map.num_inputs(),
                    bound.map.results.len(),
                    bound.operands.len(),
                    min_results
                ),
            );
            return false;
        }
        true
    }

    fn render_bound(&self, bound: &AffineBound, func: &str) -> String {
        AffineRenderer::for_map(&self.names, &bound.map, &bound.operands)
            .render_chain(&bound.map.results, func)
    }

    pub(crate) fn emit_affine_for(
        &mut self,
        op: &'m Op,
        lower: &AffineBound,
        upper: &AffineBound,
        step: i64,
    ) {
        let body = &op.regions[0];
        if !self.check_bound(op, lower, 1) || !self.check_bound(op, upper, 1) {
            return;
        }
        let Some(iv) = self.loop_induction_var(op, body) else {
            return;
        };
        self.indent();
        self.out.push_str("for (");
        self.emit_value(iv, 0, Some(op));
        let lb = self.render_bound(lower, "max");
        let _ = write!(self.out, " = {}; ", lb);
        self.emit_value(iv, 0, Some(op));
        let ub = self.render_bound(upper, "min");
        let _ = write!(self.out, " < {}; ", ub);
        self.emit_value(iv, 0, Some(op));
        let _ = write!(self.out, " += {}) {{", step);
        self.emit_op_info(op);
        self.emit_loop_body(op, body);
    }

    // ── Conditionals ────────────────────────────────────────────────────

    /// `scf.if` (condition operand) and `affine.if` (integer set over the
    /// operands). Yielded results are declared before the branches.
    pub(crate) fn emit_if(&mut self, op: &'m Op, set: Option<&IntegerSet>) {
        let condition = match set {
            Some(set) => {
                if set.num_inputs() != op.operands.len() {
                    self.error(
                        Some(op),
                        codes::E0104,
                        format!(
                            "integer set takes {} input(s); given {} operand(s)",
                            set.num_inputs(),
                            op.operands.len()
                        ),
                    );
                    return;
                }
                Some(AffineRenderer::new(&self.names, set.num_dims, &op.operands).render_set(set))
            }
            None => None,
        };

        self.predeclare_results(op);
        self.indent();
        self.out.push_str("if (");
        match condition {
            Some(text) => self.out.push_str(&text),
            None => self.emit_value(op.operands[0], 0, Some(op)),
        }
        self.out.push_str(") {");
        self.emit_op_info(op);

        self.nest(1).emit_block(&op.regions[0], Parent::Op(op));
        if let Some(else_block) = op.regions.get(1) {
            self.indent();
            self.out.push_str("} else {\n");
            self.nest(1).emit_block(else_block, Parent::Op(op));
        }
        self.indent();
        self.out.push_str("}\n");
    }

    // ── Yields and parallel reductions ──────────────────────────────────

    pub(crate) fn emit_yield(&mut self, op: &'m Op, parent: Parent<'m>) {
        if op.operands.is_empty() {
            return;
        }
        match parent {
            Parent::Op(owner) => match &owner.kind {
                OpKind::ScfIf | OpKind::AffineIf { .. } => self.emit_yield_assign(op, owner),
                OpKind::AffineParallel { .. } => self.emit_reduction(op, owner),
                other => self.error(
                    Some(op),
                    codes::E0401,
                    format!("values yielded to `{}` have no rendering", other.mnemonic()),
                ),
            },
            Parent::Function => self.error(
                Some(op),
                codes::E0401,
                "values yielded at function level have no rendering",
            ),
        }
    }

    /// Pairs each result of `owner` with the yield operand at the same
    /// position, reporting a short operand list.
    fn yielded_pairs(&mut self, op: &Op, owner: &Op) -> Vec<(ValueId, ValueId)> {
        if op.operands.len() < owner.results.len() {
            self.error(
                Some(op),
                codes::E0105,
                format!(
                    "yield carries {} value(s) for {} result(s)",
                    op.operands.len(),
                    owner.results.len()
                ),
            );
        }
        owner
            .results
            .iter()
            .copied()
            .zip(op.operands.iter().copied())
            .collect()
    }

    fn emit_assign_line(&mut self, op: &Op, target: ValueId, source: ValueId, rank: usize) {
        self.indent();
        self.emit_value(target, rank, Some(op));
        self.out.push_str(" = ");
        self.emit_value(source, rank, Some(op));
        self.out.push(';');
        self.emit_op_info(op);
    }

    fn emit_yield_assign(&mut self, op: &'m Op, owner: &'m Op) {
        for (result, source) in self.yielded_pairs(op, owner) {
            self.elementwise(result, op, |ctx, rank| {
                ctx.emit_assign_line(op, result, source, rank)
            });
        }
    }

    pub(crate) fn emit_affine_parallel(
        &mut self,
        op: &'m Op,
        lower: &AffineBound,
        upper: &AffineBound,
        steps: &[i64],
    ) {
        let body = &op.regions[0];
        let dims = body.args.len();
        if dims == 0 {
            self.error(
                Some(op),
                codes::E0104,
                "parallel nest has no induction variables",
            );
            return;
        }
        if !self.check_bound(op, lower, dims) || !self.check_bound(op, upper, dims) {
            return;
        }
        if steps.len() < dims {
            self.error(
                Some(op),
                codes::E0104,
                format!("{} step(s) given for {} dimension(s)", steps.len(), dims),
            );
            return;
        }

        self.predeclare_results(op);
        let base = self.depth();
        for (i, &iv) in body.args.iter().enumerate() {
            let lb = AffineRenderer::for_map(&self.names, &lower.map, &lower.operands)
                .render(&lower.map.results[i]);
            let ub = AffineRenderer::for_map(&self.names, &upper.map, &upper.operands)
                .render(&upper.map.results[i]);
            self.indent_at(base + i);
            self.out.push_str("for (");
            self.emit_value(iv, 0, Some(op));
            let _ = write!(self.out, " = {}; ", lb);
            self.emit_value(iv, 0, Some(op));
            let _ = write!(self.out, " < {}; ", ub);
            self.emit_value(iv, 0, Some(op));
            let _ = writeln!(self.out, " += {}) {{", steps[i]);
        }

        self.nest(dims).emit_block(body, Parent::Op(op));

        for i in (0..dims).rev() {
            self.indent_at(base + i);
            if i == 0 {
                self.out.push('}');
                self.emit_op_info(op);
            } else {
                self.out.push_str("}\n");
            }
        }
    }

    /// The yield closing a parallel nest: the first iteration initializes
    /// each result, later iterations combine into it.
    fn emit_reduction(&mut self, op: &'m Op, owner: &'m Op) {
        let pairs = self.yielded_pairs(op, owner);
        let ivs = &owner.regions[0].args;

        self.indent();
        self.out.push_str("if (");
        for (i, &iv) in ivs.iter().enumerate() {
            if i > 0 {
                self.out.push_str(" && ");
            }
            self.emit_value(iv, 0, Some(op));
            self.out.push_str(" == 0");
        }
        self.out.push_str(") {\n");
        {
            let mut inner = self.nest(1);
            for &(result, source) in &pairs {
                inner.elementwise(result, op, |ctx, rank| {
                    ctx.emit_assign_line(op, result, source, rank)
                });
            }
        }

        self.indent();
        self.out.push_str("} else {\n");
        {
            let mut inner = self.nest(1);
            for (idx, &(result, source)) in pairs.iter().enumerate() {
                let Some(&kind) = owner.attrs.reductions.get(idx) else {
                    inner.error_with_hint(
                        Some(owner),
                        codes::E0304,
                        format!("result {} of the parallel nest has no reduction kind", idx),
                        "give the nest one reduction kind per yielded value",
                    );
                    continue;
                };
                inner.elementwise(result, op, |ctx, rank| {
                    ctx.indent();
                    ctx.emit_value(result, rank, Some(op));
                    match kind {
                        ReductionKind::Add => {
                            ctx.out.push_str(" += ");
                            ctx.emit_value(source, rank, Some(op));
                        }
                        ReductionKind::Assign => {
                            ctx.out.push_str(" = ");
                            ctx.emit_value(source, rank, Some(op));
                        }
                        ReductionKind::Max | ReductionKind::Min => {
                            let func = if kind == ReductionKind::Max { "max" } else { "min" };
                            let _ = write!(ctx.out, " = {}(", func);
                            ctx.emit_value(result, rank, Some(op));
                            ctx.out.push_str(", ");
                            ctx.emit_value(source, rank, Some(op));
                            ctx.out.push(')');
                        }
                        ReductionKind::Multiply => {
                            ctx.out.push_str(" *= ");
                            ctx.emit_value(source, rank, Some(op));
                        }
                    }
                    ctx.out.push(';');
                    ctx.emit_op_info(op);
                });
            }
        }
        self.indent();
        self.out.push_str("}\n");
    }

    // ── Affine expressions and accesses ─────────────────────────────────

    fn check_map(&mut self, op: &Op, map: &AffineMap, operands: usize) -> bool {
        if !map.accepts(operands) || map.results.is_empty() {
            self.error(
                Some(op),
                codes::E0104,
                format!(
                    "map takes {} input(s) and yields {} result(s); given {} operand(s)",
                    map.num_inputs(),
                    map.results.len(),
                    operands
                ),
            );
            return false;
        }
        true
    }

    pub(crate) fn emit_affine_apply(&mut self, op: &'m Op, map: &AffineMap) {
        if !self.check_map(op, map, op.operands.len()) {
            return;
        }
        let expr = AffineRenderer::for_map(&self.names, map, &op.operands).render(&map.results[0]);
        self.indent();
        self.emit_value(op.results[0], 0, Some(op));
        let _ = write!(self.out, " = {};", expr);
        self.emit_op_info(op);
    }

    /// `affine.max` / `affine.min` over every map result.
    pub(crate) fn emit_affine_chain(&mut self, op: &'m Op, map: &AffineMap, func: &str) {
        if !self.check_map(op, map, op.operands.len()) {
            return;
        }
        let expr =
            AffineRenderer::for_map(&self.names, map, &op.operands).render_chain(&map.results, func);
        self.indent();
        self.emit_value(op.results[0], 0, Some(op));
        let _ = write!(self.out, " = {};", expr);
        self.emit_op_info(op);
    }

    fn render_subscripts(&self, map: &AffineMap, operands: &[ValueId]) -> String {
        let renderer = AffineRenderer::for_map(&self.names, map, operands);
        map.results
            .iter()
            .map(|expr| format!("[{}]", renderer.render(expr)))
            .collect()
    }

    pub(crate) fn emit_affine_load(&mut self, op: &'m Op, map: &AffineMap) {
        let indices = &op.operands[1..];
        if !self.check_map(op, map, indices.len()) {
            return;
        }
        let subscripts = self.render_subscripts(map, indices);
        self.indent();
        self.emit_value(op.results[0], 0, Some(op));
        self.out.push_str(" = ");
        self.emit_value(op.operands[0], 0, Some(op));
        let _ = write!(self.out, "{};", subscripts);
        self.emit_op_info(op);
    }

    pub(crate) fn emit_affine_store(&mut self, op: &'m Op, map: &AffineMap) {
        let indices = &op.operands[2..];
        if !self.check_map(op, map, indices.len()) {
            return;
        }
        let subscripts = self.render_subscripts(map, indices);
        self.indent();
        self.emit_value(op.operands[1], 0, Some(op));
        let _ = write!(self.out, "{} = ", subscripts);
        self.emit_value(op.operands[0], 0, Some(op));
        self.out.push(';');
        self.emit_op_info(op);
    }

    // ── Memory ──────────────────────────────────────────────────────────

    /// Arrays already declared as function outputs are left alone.
    pub(crate) fn emit_alloc(&mut self, op: &'m Op) {
        let result = op.results[0];
        if self.is_bound(result) {
            return;
        }
        self.indent();
        self.emit_array_decl(result, Some(op));
        self.out.push(';');
        self.emit_op_info(op);
        self.emit_array_pragmas(result, Some(op));
    }

    fn emit_indices(&mut self, op: &Op, indices: &[ValueId]) {
        for &index in indices {
            self.out.push('[');
            self.emit_value(index, 0, Some(op));
            self.out.push(']');
        }
    }

    pub(crate) fn emit_load(&mut self, op: &'m Op) {
        self.indent();
        self.emit_value(op.results[0], 0, Some(op));
        self.out.push_str(" = ");
        self.emit_value(op.operands[0], 0, Some(op));
        self.emit_indices(op, &op.operands[1..]);
        self.out.push(';');
        self.emit_op_info(op);
    }

    pub(crate) fn emit_store(&mut self, op: &'m Op) {
        self.indent();
        self.emit_value(op.operands[1], 0, Some(op));
        self.emit_indices(op, &op.operands[2..]);
        self.out.push_str(" = ");
        self.emit_value(op.operands[0], 0, Some(op));
        self.out.push(';');
        self.emit_op_info(op);
    }

    /// Whole-value copy `target = source`, element by element.
    pub(crate) fn emit_copy(&mut self, op: &'m Op, target: ValueId, source: ValueId) {
        self.elementwise(target, op, |ctx, rank| {
            ctx.emit_assign_line(op, target, source, rank)
        });
    }

    /// Copies into an already-declared result (a function output); otherwise
    /// the result becomes an alias of the source and gets its own pragmas.
    pub(crate) fn emit_tensor_to_memref(&mut self, op: &'m Op) {
        let source = op.operands[0];
        let result = op.results[0];
        if self.is_bound(result) {
            self.emit_copy(op, result, source);
            return;
        }
        if let Err(err) = self.names.alias(source, result) {
            self.report_name_error(Some(op), err);
        }
        self.emit_array_pragmas(result, Some(op));
    }

    pub(crate) fn emit_dim(&mut self, op: &'m Op) {
        let source = self.info(op.operands[0]);
        let index = match &self.info(op.operands[1]).constant {
            Some(Literal::Int(index)) => *index,
            _ => {
                self.error(Some(op), codes::E0202, "dimension index is not a constant");
                return;
            }
        };
        let dims = if source.is_shaped() {
            source.shape.static_dims()
        } else {
            None
        };
        let Some(dims) = dims else {
            self.error(
                Some(op),
                codes::E0200,
                format!("value %{} is unranked or has a dynamic shape", op.operands[0].0),
            );
            return;
        };
        let Some(extent) = usize::try_from(index).ok().and_then(|i| dims.get(i).copied()) else {
            self.error(
                Some(op),
                codes::E0201,
                format!("dimension index {} is out of range for rank {}", index, dims.len()),
            );
            return;
        };
        self.indent();
        self.emit_value(op.results[0], 0, Some(op));
        let _ = write!(self.out, " = {};", extent);
        self.emit_op_info(op);
    }

    pub(crate) fn emit_rank(&mut self, op: &'m Op) {
        let Some(rank) = self.info(op.operands[0]).shape.rank() else {
            self.error(
                Some(op),
                codes::E0203,
                format!("value %{} is unranked", op.operands[0].0),
            );
            return;
        };
        self.indent();
        self.emit_value(op.results[0], 0, Some(op));
        let _ = write!(self.out, " = {};", rank);
        self.emit_op_info(op);
    }

    // ── Arithmetic ──────────────────────────────────────────────────────

    pub(crate) fn emit_binary(&mut self, op: &'m Op, syntax: &str) {
        let (result, lhs, rhs) = (op.results[0], op.operands[0], op.operands[1]);
        self.elementwise(result, op, |ctx, rank| {
            ctx.indent();
            ctx.emit_value(result, rank, Some(op));
            ctx.out.push_str(" = ");
            ctx.emit_value(lhs, rank, Some(op));
            let _ = write!(ctx.out, " {} ", syntax);
            ctx.emit_value(rhs, rank, Some(op));
            ctx.out.push(';');
            ctx.emit_op_info(op);
        });
    }

    pub(crate) fn emit_unary(&mut self, op: &'m Op, syntax: &str) {
        let (result, operand) = (op.results[0], op.operands[0]);
        self.elementwise(result, op, |ctx, rank| {
            ctx.indent();
            ctx.emit_value(result, rank, Some(op));
            let _ = write!(ctx.out, " = {}(", syntax);
            ctx.emit_value(operand, rank, Some(op));
            ctx.out.push_str(");");
            ctx.emit_op_info(op);
        });
    }

    /// A scalar condition is shared by every element.
    pub(crate) fn emit_select(&mut self, op: &'m Op) {
        let result = op.results[0];
        let [condition, on_true, on_false] = [op.operands[0], op.operands[1], op.operands[2]];
        let scalar_condition = !self.info(condition).is_shaped();
        self.elementwise(result, op, |ctx, rank| {
            let condition_rank = if scalar_condition { 0 } else { rank };
            ctx.indent();
            ctx.emit_value(result, rank, Some(op));
            ctx.out.push_str(" = ");
            ctx.emit_value(condition, condition_rank, Some(op));
            ctx.out.push_str(" ? ");
            ctx.emit_value(on_true, rank, Some(op));
            ctx.out.push_str(" : ");
            ctx.emit_value(on_false, rank, Some(op));
            ctx.out.push(';');
            ctx.emit_op_info(op);
        });
    }

    pub(crate) fn emit_cast(&mut self, op: &'m Op) {
        self.indent();
        self.emit_value(op.results[0], 0, Some(op));
        self.out.push_str(" = ");
        self.emit_value(op.operands[0], 0, Some(op));
        self.out.push(';');
        self.emit_op_info(op);
    }

    // ── Constants and calls ─────────────────────────────────────────────

    /// Scalar constants render at their uses; dense arrays become an
    /// initialized declaration.
    pub(crate) fn emit_constant(&mut self, op: &'m Op) {
        let result = op.results[0];
        if self.is_bound(result) {
            return;
        }
        let info = self.info(result);
        let elements = match &info.constant {
            Some(Literal::Dense(elements)) if info.is_shaped() => elements,
            _ => {
                self.error(
                    Some(op),
                    codes::E0301,
                    format!("constant %{} carries an unsupported payload", result.0),
                );
                return;
            }
        };
        let supported = matches!(
            info.elem,
            ElemType::F32 | ElemType::F64 | ElemType::Bool | ElemType::Index | ElemType::Int { .. }
        );
        if !supported {
            self.error(
                Some(op),
                codes::E0303,
                format!("dense constant element type {:?} is unsupported", info.elem),
            );
            return;
        }
        let Some(texts) = elements
            .iter()
            .map(Literal::scalar_text)
            .collect::<Option<Vec<String>>>()
        else {
            self.error(
                Some(op),
                codes::E0301,
                format!("dense constant %{} has a non-scalar element", result.0),
            );
            return;
        };

        self.indent();
        self.emit_array_decl(result, Some(op));
        let _ = write!(self.out, " = {{{}}};", texts.join(", "));
        self.emit_op_info(op);
    }

    /// `callee(args.., &scalar_result, array_result);`
    pub(crate) fn emit_call(&mut self, op: &'m Op, callee: &str) {
        self.predeclare_results(op);
        self.indent();
        let _ = write!(self.out, "{}(", callee);
        let mut first = true;
        for &arg in &op.operands {
            if !first {
                self.out.push_str(", ");
            }
            first = false;
            self.emit_value(arg, 0, Some(op));
        }
        for &result in &op.results {
            if !first {
                self.out.push_str(", ");
            }
            first = false;
            if !self.info(result).is_shaped() {
                self.out.push('&');
            }
            self.emit_value(result, 0, Some(op));
        }
        self.out.push_str(");");
        self.emit_op_info(op);
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::ModuleBuilder;
    use crate::diag::codes;
    use crate::emit::{emit_with_options, EmitOptions, PROLOGUE};
    use crate::ir::{BinaryOp, ElemType, Literal, ReductionKind, Shape};

    fn body_of(module: &crate::ir::Module) -> (String, Vec<crate::diag::Diagnostic>) {
        let result = emit_with_options(module, &EmitOptions::default());
        let cpp = result.generated.cpp_source[PROLOGUE.len()..].to_string();
        (cpp, result.diagnostics)
    }

    #[test]
    fn scalar_binary_declares_inline() {
        let mut mb = ModuleBuilder::new();
        let a = mb.value(ElemType::F32);
        let b = mb.value(ElemType::F32);
        let f = mb.function("add", &[a, b], |body| {
            let c = body.binary(BinaryOp::Add, a, b);
            body.ret(&[c]);
        });
        let module = mb.finish_with(vec![f]);
        let (cpp, diags) = body_of(&module);
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(
            cpp,
            "void add(\n  float val0,\n  float val1,\n  float *val2\n) {\t//\n  *val2 = val0 + val1;\t//\n}\n\n"
        );
    }

    #[test]
    fn dense_constant_initializer() {
        let mut mb = ModuleBuilder::new();
        let f = mb.function("init", &[], |body| {
            let c = body.constant_array(
                ElemType::F32,
                &[2],
                vec![Literal::Float(1.5), Literal::Float(f64::NEG_INFINITY)],
            );
            let d = body.binary(BinaryOp::Mul, c, c);
            body.ret(&[d]);
        });
        let module = mb.finish_with(vec![f]);
        let (cpp, diags) = body_of(&module);
        assert!(diags.is_empty(), "{:?}", diags);
        assert!(cpp.contains("  float val1[2] = {1.5, -INFINITY};\t//\n"), "{}", cpp);
        assert!(cpp.contains("val0[idx0] = val1[idx0] * val1[idx0];"), "{}", cpp);
    }

    #[test]
    fn dim_reports_out_of_range_index() {
        let mut mb = ModuleBuilder::new();
        let arr = mb.array(ElemType::F32, &[4, 8]);
        let f = mb.function("dims", &[arr], |body| {
            let ok = body.dim(arr, 1);
            let bad = body.dim(arr, 2);
            body.ret(&[ok, bad]);
        });
        let module = mb.finish_with(vec![f]);
        let (cpp, diags) = body_of(&module);
        assert!(cpp.contains("  *val1 = 8;\t//\n"), "{}", cpp);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, Some(codes::E0201));
    }

    #[test]
    fn rank_of_unranked_value_fails() {
        let mut mb = ModuleBuilder::new();
        let arr = mb.value_with_shape(ElemType::F32, Shape::Unranked);
        let f = mb.function("r", &[], |body| {
            body.rank(arr);
            body.ret(&[]);
        });
        let module = mb.finish_with(vec![f]);
        let (_, diags) = body_of(&module);
        assert!(diags.iter().any(|d| d.code == Some(codes::E0203)));
    }

    #[test]
    fn missing_reduction_kind_is_reported() {
        let mut mb = ModuleBuilder::new();
        let x = mb.value(ElemType::F32);
        let f = mb.function("red", &[x], |body| {
            let acc = body.parallel(&[2], ElemType::F32, &[], |inner, _ivs| {
                inner.yield_values(&[x]);
            });
            body.ret(&[acc]);
        });
        let module = mb.finish_with(vec![f]);
        let (_, diags) = body_of(&module);
        let missing = diags
            .iter()
            .find(|d| d.code == Some(codes::E0304))
            .expect("E0304");
        assert!(missing.hint.is_some());
    }

    #[test]
    fn parallel_nest_without_dimensions_is_reported() {
        let mut mb = ModuleBuilder::new();
        let x = mb.value(ElemType::F32);
        let f = mb.function("red", &[x], |body| {
            let acc = body.parallel(&[], ElemType::F32, &[ReductionKind::Add], |inner, _ivs| {
                inner.yield_values(&[x]);
            });
            body.ret(&[acc]);
        });
        let module = mb.finish_with(vec![f]);
        let (cpp, diags) = body_of(&module);
        assert_eq!(diags.len(), 1, "{:?}", diags);
        assert_eq!(diags[0].code, Some(codes::E0104));
        assert!(!cpp.contains("if ("), "{}", cpp);
    }

    #[test]
    fn max_reduction_renders_combiner() {
        let mut mb = ModuleBuilder::new();
        let x = mb.value(ElemType::F32);
        let f = mb.function("red", &[x], |body| {
            let acc = body.parallel(&[4], ElemType::F32, &[ReductionKind::Max], |inner, _ivs| {
                inner.yield_values(&[x]);
            });
            body.ret(&[acc]);
        });
        let module = mb.finish_with(vec![f]);
        let (cpp, diags) = body_of(&module);
        assert!(diags.is_empty(), "{:?}", diags);
        assert!(cpp.contains("*val1 = max(*val1, val0);"), "{}", cpp);
    }
}
